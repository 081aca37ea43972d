//! Line-oriented front end
//!
//! A [`Session`] owns an expression engine, a variable environment and the
//! history of executed lines. Lines starting with `\` are system commands:
//!
//! | Command                    | Effect                                      |
//! |----------------------------|---------------------------------------------|
//! | `\growth g1 g2 ... gk, n`  | growth function of the named generators     |
//! | `\order name, max`         | least power of `name` that is the identity  |
//! | `\reset`                   | forget variables and history                |
//! | `\vars`                    | list variables                              |
//!
//! Anything else is split on `;` and evaluated statement by statement.

use std::fmt;

use tracing::{debug, info, warn};

use crate::env::VariableEnvironment;
use crate::expr::{ExpressionEngine, OperatorTable};
use crate::pair::{growth, TreePair};
use crate::tree::StructureError;
use crate::Result;

const HISTORY_KEY: &str = "history_data_";
const ASSIGNMENT_KEY: &str = "variable_assignment_";

/// Bounds and operator table for a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Largest word length accepted by `\growth`
    pub max_growth_length: usize,
    /// Largest bound accepted by `\order`
    pub max_order: i64,
    /// Largest exponent magnitude accepted by `A^n`
    pub max_power: i64,
    /// Operators and literal formats
    pub table: OperatorTable,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_growth_length: 12,
            max_order: 64,
            max_power: 1024,
            table: OperatorTable::default(),
        }
    }
}

/// Result of one statement or command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Value of an evaluated statement
    Pair(TreePair),
    /// Cumulative element counts for word lengths `0..=n`
    Growth(Vec<usize>),
    /// Result of an order search
    Order {
        /// Variable searched
        name: String,
        /// Search bound
        max: i64,
        /// Order, if found within the bound
        order: Option<usize>,
    },
    /// Variable names with their values
    Variables(Vec<(String, String)>),
    /// Session was cleared
    Reset,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pair(pair) => write!(f, "{}", pair.to_literal()),
            Outcome::Growth(counts) => write!(f, "{:?}", counts),
            Outcome::Order {
                name,
                order: Some(n),
                ..
            } => write!(f, "order of {} is {}", name, n),
            Outcome::Order {
                name,
                max,
                order: None,
            } => write!(f, "order of {} exceeds {}", name, max),
            Outcome::Variables(vars) => {
                let lines: Vec<String> = vars
                    .iter()
                    .map(|(name, value)| format!("{} = {}", name, value))
                    .collect();
                write!(f, "{}", lines.join("\n"))
            }
            Outcome::Reset => write!(f, "session reset"),
        }
    }
}

/// Persisted form of a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Executed lines, oldest first
    pub history: Vec<String>,
    /// `name={left,right,perm}` statements recreating every variable
    pub assignments: Vec<String>,
}

impl Snapshot {
    /// Keyed entries `history_data_<i>` and `variable_assignment_<i>`
    pub fn entries(&self) -> Vec<(String, String)> {
        let history = self
            .history
            .iter()
            .enumerate()
            .map(|(i, line)| (format!("{}{}", HISTORY_KEY, i), line.clone()));
        let assignments = self
            .assignments
            .iter()
            .enumerate()
            .map(|(i, line)| (format!("{}{}", ASSIGNMENT_KEY, i), line.clone()));
        history.chain(assignments).collect()
    }

    /// Inverse of [`entries`](Self::entries); unknown keys are skipped and
    /// entries are ordered by index
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut history = Vec::new();
        let mut assignments = Vec::new();
        for (key, value) in entries {
            let key = key.as_ref();
            let indexed = |prefix: &str| key.strip_prefix(prefix)?.parse::<usize>().ok();
            if let Some(i) = indexed(HISTORY_KEY) {
                history.push((i, value.into()));
            } else if let Some(i) = indexed(ASSIGNMENT_KEY) {
                assignments.push((i, value.into()));
            }
        }
        history.sort_by_key(|(i, _)| *i);
        assignments.sort_by_key(|(i, _)| *i);
        Self {
            history: history.into_iter().map(|(_, line)| line).collect(),
            assignments: assignments.into_iter().map(|(_, line)| line).collect(),
        }
    }
}

/// Interactive session state
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    engine: ExpressionEngine,
    env: VariableEnvironment,
    history: Vec<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    /// Empty session
    pub fn new(config: SessionConfig) -> Self {
        let engine = ExpressionEngine::new(config.table.clone()).with_max_power(config.max_power);
        Self {
            config,
            engine,
            env: VariableEnvironment::new(),
            history: Vec::new(),
        }
    }

    /// Bounds in use
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Variables
    pub fn env(&self) -> &VariableEnvironment {
        &self.env
    }

    /// Lines executed so far
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Execute one input line. A failing statement aborts the rest of the
    /// line; statements before it keep their effect.
    pub fn execute(&mut self, line: &str) -> Result<Vec<Outcome>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Vec::new());
        }
        self.history.push(line.to_string());

        if let Some(command) = line.strip_prefix('\\') {
            return self.command(command).map(|outcome| vec![outcome]);
        }

        let mut outcomes = Vec::new();
        for statement in line.split(';').filter(|s| !s.trim().is_empty()) {
            match self.engine.evaluate(statement, &mut self.env) {
                Ok(pair) => outcomes.push(Outcome::Pair(pair)),
                Err(err) => {
                    warn!(statement = statement.trim(), %err, "statement failed");
                    return Err(err);
                }
            }
        }
        Ok(outcomes)
    }

    fn command(&mut self, command: &str) -> Result<Outcome> {
        let (keyword, args) = command
            .trim()
            .split_once(char::is_whitespace)
            .unwrap_or((command.trim(), ""));
        debug!(keyword, args, "system command");
        match keyword {
            "growth" => {
                let (names, n) = split_bound(command, args)?;
                let n = usize::try_from(n).map_err(|_| malformed(command))?;
                let limit = self.config.max_growth_length;
                if n > limit {
                    return Err(out_of_bounds("growth length", n as i64, limit as i64));
                }
                let generators = names
                    .split_whitespace()
                    .map(|name| self.env.get_pair(name).cloned())
                    .collect::<Result<Vec<_>>>()?;
                if generators.is_empty() {
                    return Err(malformed(command));
                }
                Ok(Outcome::Growth(growth(&generators, n)?))
            }
            "order" => {
                let (name, max) = split_bound(command, args)?;
                let name = name.trim();
                if max > self.config.max_order {
                    return Err(out_of_bounds("order bound", max, self.config.max_order));
                }
                let order = self.env.get_pair(name)?.order(max)?;
                Ok(Outcome::Order {
                    name: name.to_string(),
                    max,
                    order,
                })
            }
            "reset" => {
                self.env.clear();
                self.history.clear();
                info!("session reset");
                Ok(Outcome::Reset)
            }
            "vars" => {
                let vars = self
                    .env
                    .names()
                    .into_iter()
                    .filter_map(|name| {
                        let value = self.env.get(name).ok()?;
                        Some((name.to_string(), value.to_string()))
                    })
                    .collect();
                Ok(Outcome::Variables(vars))
            }
            _ => Err(malformed(command)),
        }
    }

    /// Persisted form: history plus one assignment per variable
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            history: self.history.clone(),
            assignments: self
                .env
                .pairs()
                .into_iter()
                .map(|(name, pair)| format!("{}={}", name, pair.to_literal()))
                .collect(),
        }
    }

    /// Replace the session state. `quick` loads the history verbatim and
    /// evaluates the assignments; otherwise the history is re-run, and lines
    /// that fail again are skipped.
    pub fn restore(&mut self, history: &[String], assignments: &[String], quick: bool) -> Result<()> {
        self.env.clear();
        self.history.clear();
        if quick {
            for assignment in assignments {
                self.engine.evaluate(assignment, &mut self.env)?;
            }
            self.history = history.to_vec();
        } else {
            for line in history {
                if let Err(err) = self.execute(line) {
                    debug!(line = line.as_str(), %err, "replayed line failed");
                }
            }
        }
        info!(
            lines = self.history.len(),
            variables = self.env.len(),
            quick,
            "session restored"
        );
        Ok(())
    }
}

/// Split `"<head>, <integer>"`
fn split_bound<'a>(command: &str, args: &'a str) -> Result<(&'a str, i64)> {
    let (head, bound) = args.split_once(',').ok_or_else(|| malformed(command))?;
    let bound = bound.trim().parse::<i64>().map_err(|_| malformed(command))?;
    Ok((head, bound))
}

fn malformed(command: &str) -> crate::NvError {
    StructureError::MalformedCommand {
        text: format!("\\{}", command.trim()),
    }
    .into()
}

fn out_of_bounds(what: &'static str, value: i64, max: i64) -> crate::NvError {
    StructureError::OutOfBounds {
        what,
        value,
        min: 0,
        max,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NvError;

    fn run(session: &mut Session, line: &str) -> Vec<Outcome> {
        session.execute(line).unwrap()
    }

    #[test]
    fn test_statements_and_history() {
        let mut session = Session::default();
        let out = run(&mut session, "S = {100,100,2 1}; T = S*S");
        assert_eq!(out.len(), 2);
        assert!(session.env().contains("T"));
        assert_eq!(session.history(), ["S = {100,100,2 1}; T = S*S"]);
        assert!(run(&mut session, "  ").is_empty());
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_failure_keeps_earlier_statements() {
        let mut session = Session::default();
        let err = session.execute("A = {100,100}; B = z*A; C = A").unwrap_err();
        assert!(matches!(err, NvError::Name(_)));
        assert!(session.env().contains("A"));
        assert!(!session.env().contains("B"));
        assert!(!session.env().contains("C"));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_growth_and_order_commands() {
        let mut session = Session::default();
        run(&mut session, "S = {100,100,2 1}");
        let out = run(&mut session, "\\growth S, 3");
        assert_eq!(out, vec![Outcome::Growth(vec![1, 2, 2, 2])]);
        let out = run(&mut session, "\\order S, 5");
        assert_eq!(out[0].to_string(), "order of S is 2");
        assert!(matches!(
            session.execute("\\growth S, 13"),
            Err(NvError::Structure(StructureError::OutOfBounds { .. }))
        ));
        assert!(matches!(
            session.execute("\\order S, 65"),
            Err(NvError::Structure(StructureError::OutOfBounds { .. }))
        ));
        assert!(matches!(
            session.execute("\\growth S"),
            Err(NvError::Structure(StructureError::MalformedCommand { .. }))
        ));
        assert!(matches!(
            session.execute("\\frobnicate"),
            Err(NvError::Structure(StructureError::MalformedCommand { .. }))
        ));
    }

    #[test]
    fn test_power_is_bounded() {
        let mut session = Session::default();
        assert_eq!(session.config().max_power, 1024);
        run(&mut session, "S = {100,100,2 1}");
        assert_eq!(run(&mut session, "S^64").len(), 1);
        let err = session.execute("S^99999999").unwrap_err();
        assert_eq!(
            err,
            NvError::Structure(StructureError::OutOfBounds {
                what: "power",
                value: 99_999_999,
                min: -1024,
                max: 1024,
            })
        );
        assert!(!session.env().names().iter().any(|n| n.starts_with("__aux")));
    }

    #[test]
    fn test_vars_and_reset() {
        let mut session = Session::default();
        run(&mut session, "A = {100,100}");
        let out = run(&mut session, "\\vars");
        let Outcome::Variables(vars) = &out[0] else {
            panic!("expected variable listing, got {:?}", out);
        };
        let names: Vec<&str> = vars.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["A", "ans"]);
        assert_eq!(vars[0].1, "{100,100,1 2}");
        run(&mut session, "\\reset");
        assert!(session.env().is_empty());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_snapshot_restore() {
        let mut session = Session::default();
        run(&mut session, "S = {100,100,2 1}");
        run(&mut session, "X = {11000,10100}; Y = X*S");
        let snapshot = session.snapshot();
        assert_eq!(snapshot.assignments.len(), 3);
        assert_eq!(snapshot.assignments[0], "S={100,100,2 1}");

        let entries = snapshot.entries();
        assert_eq!(entries[0].0, "history_data_0");
        assert_eq!(Snapshot::from_entries(entries.into_iter().rev()), snapshot);

        for quick in [true, false] {
            let mut restored = Session::default();
            restored
                .restore(&snapshot.history, &snapshot.assignments, quick)
                .unwrap();
            assert_eq!(restored.history(), snapshot.history.as_slice());
            assert_eq!(
                restored.env().get_pair("Y").unwrap(),
                session.env().get_pair("Y").unwrap()
            );
        }
    }
}
