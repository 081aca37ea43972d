//! Variable store for the expression language
//!
//! Names map to [`Value`]s. The result of the last statement lives under
//! `ans`; intermediate operator results live under names starting with
//! [`AUX_PREFIX`] and are purged after every statement.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::expr::OperatorError;
use crate::pair::TreePair;
use crate::Result;

/// Name under which the last statement's result is stored
pub const LAST_RESULT: &str = "ans";

/// Prefix of auxiliary names owned by the expression engine
pub const AUX_PREFIX: &str = "__aux";

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+$").expect("word regex"));
static DIGIT_PREFIXED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\w*$").expect("digit-prefixed regex"));

/// Variable name errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Lookup of a name that holds nothing
    #[error("undefined variable `{name}`")]
    Undefined {
        /// Requested name
        name: String,
    },

    /// Name does not match `\w+` or starts with a digit
    #[error("invalid variable name `{name}`")]
    Invalid {
        /// Offending name
        name: String,
    },

    /// Name owned by the engine itself
    #[error("`{name}` is reserved")]
    Reserved {
        /// Offending name
        name: String,
    },
}

/// True for names made of word characters that do not start with a digit
pub fn is_valid_name(name: &str) -> bool {
    let word = WORD.is_match(name);
    let numeric = DIGIT_PREFIXED.is_match(name);
    word && !numeric
}

/// Value of a variable or of an evaluated sub-expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Group element
    Pair(TreePair),
    /// Integer constant (exponents)
    Integer(i64),
}

impl Value {
    /// Human-readable kind, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Pair(_) => "tree pair",
            Value::Integer(_) => "integer",
        }
    }

    /// The tree pair, if this is one
    pub fn as_pair(&self) -> Option<&TreePair> {
        match self {
            Value::Pair(pair) => Some(pair),
            Value::Integer(_) => None,
        }
    }
}

impl From<TreePair> for Value {
    fn from(pair: TreePair) -> Self {
        Value::Pair(pair)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Pair(pair) => write!(f, "{}", pair.to_literal()),
            Value::Integer(n) => write!(f, "{}", n),
        }
    }
}

/// Name → value map shared by all statements of a session
#[derive(Debug, Clone, Default)]
pub struct VariableEnvironment {
    vars: HashMap<String, Value>,
}

impl VariableEnvironment {
    /// Empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored under `name`
    pub fn get(&self, name: &str) -> std::result::Result<&Value, NameError> {
        self.vars.get(name).ok_or_else(|| NameError::Undefined {
            name: name.to_string(),
        })
    }

    /// Tree pair stored under `name`; an integer there is an operator error
    pub fn get_pair(&self, name: &str) -> Result<&TreePair> {
        let value = self.get(name)?;
        value.as_pair().ok_or_else(|| {
            OperatorError::NotATreePair {
                kind: value.kind(),
            }
            .into()
        })
    }

    /// Store `value` under `name`, returning the previous value
    pub fn insert(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> std::result::Result<Option<Value>, NameError> {
        if !is_valid_name(name) {
            return Err(NameError::Invalid {
                name: name.to_string(),
            });
        }
        Ok(self.vars.insert(name.to_string(), value.into()))
    }

    /// Drop `name`, returning what it held
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    /// Drop every variable, `ans` included
    pub fn clear(&mut self) {
        self.vars.clear();
    }

    /// True if `name` holds a value
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Number of stored variables
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// All names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.vars.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// User-visible tree-pair variables (no `ans`, no auxiliaries), sorted
    /// by name
    pub fn pairs(&self) -> Vec<(&str, &TreePair)> {
        let mut pairs: Vec<(&str, &TreePair)> = self
            .vars
            .iter()
            .filter(|(name, _)| name.as_str() != LAST_RESULT && !name.starts_with(AUX_PREFIX))
            .filter_map(|(name, value)| value.as_pair().map(|pair| (name.as_str(), pair)))
            .collect();
        pairs.sort_unstable_by_key(|(name, _)| *name);
        pairs
    }

    /// Remove every auxiliary name; returns how many were dropped
    pub fn purge_auxiliary(&mut self) -> usize {
        let before = self.vars.len();
        self.vars.retain(|name, _| !name.starts_with(AUX_PREFIX));
        before - self.vars.len()
    }

    /// Result of the last successful statement
    pub fn last_result(&self) -> Option<&TreePair> {
        self.vars.get(LAST_RESULT).and_then(Value::as_pair)
    }

    pub(crate) fn set_last_result(&mut self, pair: TreePair) {
        self.vars.insert(LAST_RESULT.to_string(), Value::Pair(pair));
    }
}
