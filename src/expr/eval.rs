//! Statement evaluation
//!
//! A statement is `name = expression` or a bare expression. The expression
//! is parsed once into an [`ExprNode`] and evaluated by a post-order walk;
//! every operator result is also stored under a fresh auxiliary name, and
//! all auxiliary names are purged once the statement finishes, whether it
//! succeeded or not.

use thiserror::Error;
use tracing::{debug, trace};

use super::node::ExprNode;
use super::operators::{BinaryOp, ConstantKind, OperatorTable, UnaryOp};
use super::parser::{ParseError, ParseErrorKind, Parser};
use crate::env::{is_valid_name, NameError, Value, VariableEnvironment, AUX_PREFIX, LAST_RESULT};
use crate::pair::TreePair;
use crate::tree::StructureError;
use crate::Result;

/// Operator applied to values of the wrong kind
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperatorError {
    /// Unary operator on a non-pair
    #[error("operator `{symbol}` cannot be applied to a {kind}")]
    UnaryOperand {
        /// Operator symbol, trimmed
        symbol: String,
        /// Operand kind
        kind: &'static str,
    },

    /// Binary operator on an unsupported combination
    #[error("operator `{symbol}` cannot be applied to a {left} and a {right}")]
    BinaryOperands {
        /// Operator symbol, trimmed
        symbol: String,
        /// Left operand kind
        left: &'static str,
        /// Right operand kind
        right: &'static str,
    },

    /// Statement result that is not a tree pair
    #[error("result is a {kind}, not a tree pair")]
    NotATreePair {
        /// Actual kind
        kind: &'static str,
    },
}

/// Evaluates statements against a [`VariableEnvironment`]
#[derive(Debug, Clone, Default)]
pub struct ExpressionEngine {
    table: OperatorTable,
    aux_counter: u64,
    max_power: Option<i64>,
}

impl ExpressionEngine {
    /// Engine over a custom operator table
    pub fn new(table: OperatorTable) -> Self {
        Self {
            table,
            aux_counter: 0,
            max_power: None,
        }
    }

    /// Reject integer powers whose magnitude exceeds `limit`
    pub fn with_max_power(mut self, limit: i64) -> Self {
        self.max_power = Some(limit);
        self
    }

    /// Largest accepted power magnitude, if bounded
    pub fn max_power(&self) -> Option<i64> {
        self.max_power
    }

    /// Operator table in use
    pub fn table(&self) -> &OperatorTable {
        &self.table
    }

    /// Parse an expression (no assignment) without evaluating it
    pub fn parse(&self, expression: &str) -> std::result::Result<ExprNode, ParseError> {
        Parser::new(&self.table, expression).parse(expression, 0)
    }

    /// Evaluate one statement. The result is stored in `ans` and, for an
    /// assignment, under the target name as well.
    pub fn evaluate(&mut self, statement: &str, env: &mut VariableEnvironment) -> Result<TreePair> {
        let result = self.evaluate_statement(statement, env);
        let purged = env.purge_auxiliary();
        trace!(purged, "purged auxiliary variables");
        result
    }

    fn evaluate_statement(
        &mut self,
        statement: &str,
        env: &mut VariableEnvironment,
    ) -> Result<TreePair> {
        let text = statement.trim();
        let (target, expression, offset) = split_assignment(text)?;

        let tree = Parser::new(&self.table, text).parse(expression, offset)?;
        debug!(%tree, target = target.unwrap_or(LAST_RESULT), "evaluating statement");
        let pair = match self.eval_node(&tree, env, text)? {
            Value::Pair(pair) => pair,
            other => {
                return Err(OperatorError::NotATreePair { kind: other.kind() }.into());
            }
        };

        if let Some(name) = target {
            env.insert(name, pair.clone())?;
        }
        env.set_last_result(pair.clone());
        Ok(pair)
    }

    fn eval_node(
        &mut self,
        node: &ExprNode,
        env: &mut VariableEnvironment,
        source: &str,
    ) -> Result<Value> {
        match node {
            ExprNode::Atom { text, position } => self.resolve_atom(text, *position, env, source),
            ExprNode::Unary {
                op,
                symbol,
                operand,
            } => {
                let value = self.eval_node(operand, env, source)?;
                let Value::Pair(pair) = &value else {
                    return Err(OperatorError::UnaryOperand {
                        symbol: symbol.trim().to_string(),
                        kind: value.kind(),
                    }
                    .into());
                };
                let result = match op {
                    UnaryOp::Inverse => pair.inverse(),
                    UnaryOp::Reduce => pair.reduce()?,
                    UnaryOp::GridReduce => pair.reduce_with(false)?,
                };
                self.store(result, env)
            }
            ExprNode::Binary {
                op,
                symbol,
                left,
                right,
            } => {
                let left = self.eval_node(left, env, source)?;
                let right = self.eval_node(right, env, source)?;
                let result = match (op, &left, &right) {
                    (BinaryOp::Power, Value::Pair(a), Value::Integer(n)) => {
                        self.check_power(*n)?;
                        a.power(*n)?
                    }
                    (BinaryOp::Power, Value::Pair(a), Value::Pair(b)) => a.conjugate(b)?,
                    (BinaryOp::Compose, Value::Pair(a), Value::Pair(b)) => a.compose(b)?,
                    (BinaryOp::Commutator, Value::Pair(a), Value::Pair(b)) => a.commutator(b)?,
                    (BinaryOp::RefineLeft, Value::Pair(a), Value::Pair(b)) => {
                        b.refine_to(a.right())?
                    }
                    (BinaryOp::RefineRight, Value::Pair(a), Value::Pair(b)) => {
                        a.inverse().refine_to(b.left())?.inverse()
                    }
                    _ => {
                        return Err(OperatorError::BinaryOperands {
                            symbol: symbol.trim().to_string(),
                            left: left.kind(),
                            right: right.kind(),
                        }
                        .into());
                    }
                };
                self.store(result, env)
            }
        }
    }

    fn resolve_atom(
        &self,
        text: &str,
        position: usize,
        env: &VariableEnvironment,
        source: &str,
    ) -> Result<Value> {
        match self.table.constant_kind(text) {
            Some(ConstantKind::Integer) => text.parse::<i64>().map(Value::Integer).map_err(|_| {
                statement_error(source, ParseErrorKind::InvalidConstant, position).into()
            }),
            Some(ConstantKind::TreePair) => Ok(Value::Pair(text.parse()?)),
            None => Ok(env.get(text)?.clone()),
        }
    }

    fn check_power(&self, n: i64) -> Result<()> {
        match self.max_power {
            Some(max) if n.checked_abs().map_or(true, |abs| abs > max) => {
                Err(StructureError::OutOfBounds {
                    what: "power",
                    value: n,
                    min: -max,
                    max,
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    fn store(&mut self, pair: TreePair, env: &mut VariableEnvironment) -> Result<Value> {
        self.aux_counter += 1;
        let name = format!("{}{}", AUX_PREFIX, self.aux_counter);
        trace!(%name, blocks = pair.num_blocks(), "stored intermediate result");
        env.insert(&name, pair.clone())?;
        Ok(Value::Pair(pair))
    }
}

/// Split `name = expression`; returns the target, the expression text and
/// its char offset in `text`.
fn split_assignment(text: &str) -> Result<(Option<&str>, &str, usize)> {
    let parts: Vec<&str> = text.split('=').collect();
    match parts.as_slice() {
        [expression] => Ok((None, *expression, 0)),
        [target, expression] => {
            let name = target.trim();
            if !is_valid_name(name) {
                return Err(NameError::Invalid {
                    name: name.to_string(),
                }
                .into());
            }
            if name == LAST_RESULT || name.starts_with(AUX_PREFIX) {
                return Err(NameError::Reserved {
                    name: name.to_string(),
                }
                .into());
            }
            Ok((Some(name), *expression, target.chars().count() + 1))
        }
        _ => {
            let position = text
                .chars()
                .enumerate()
                .filter(|(_, c)| *c == '=')
                .nth(1)
                .map_or(0, |(i, _)| i);
            Err(statement_error(text, ParseErrorKind::InvalidAssignment, position).into())
        }
    }
}

fn statement_error(source: &str, kind: ParseErrorKind, position: usize) -> ParseError {
    ParseError {
        kind,
        position,
        expression: source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NvError;

    fn setup() -> (ExpressionEngine, VariableEnvironment) {
        let mut env = VariableEnvironment::new();
        env.insert("S", "100,100,2 1".parse::<TreePair>().unwrap()).unwrap();
        env.insert("X", "11000,10100".parse::<TreePair>().unwrap()).unwrap();
        (ExpressionEngine::default(), env)
    }

    #[test]
    fn test_assignment_stores_target_and_ans() {
        let (mut engine, mut env) = setup();
        let result = engine.evaluate("T = S*S", &mut env).unwrap();
        assert!(result.reduce().unwrap().is_identity());
        assert_eq!(env.get_pair("T").unwrap(), &result);
        assert_eq!(env.last_result(), Some(&result));
        assert_eq!(env.names(), vec!["S", "T", "X", "ans"]);
    }

    #[test]
    fn test_auxiliaries_are_purged() {
        let (mut engine, mut env) = setup();
        engine.evaluate("$(X*!X)^2", &mut env).unwrap();
        assert_eq!(env.names(), vec!["S", "X", "ans"]);
        assert!(engine.evaluate("X*(S*Q)", &mut env).is_err());
        assert_eq!(env.names(), vec!["S", "X", "ans"]);
    }

    #[test]
    fn test_operator_kinds() {
        let (mut engine, mut env) = setup();
        assert_eq!(
            engine.evaluate("!2", &mut env),
            Err(NvError::Operator(OperatorError::UnaryOperand {
                symbol: "!".into(),
                kind: "integer",
            }))
        );
        assert_eq!(
            engine.evaluate("2*X", &mut env),
            Err(NvError::Operator(OperatorError::BinaryOperands {
                symbol: "*".into(),
                left: "integer",
                right: "tree pair",
            }))
        );
        assert_eq!(
            engine.evaluate("5", &mut env),
            Err(NvError::Operator(OperatorError::NotATreePair { kind: "integer" }))
        );
    }

    #[test]
    fn test_assignment_targets() {
        let (mut engine, mut env) = setup();
        assert!(matches!(
            engine.evaluate("ans = S", &mut env),
            Err(NvError::Name(NameError::Reserved { .. }))
        ));
        assert!(matches!(
            engine.evaluate("__aux9 = S", &mut env),
            Err(NvError::Name(NameError::Reserved { .. }))
        ));
        assert!(matches!(
            engine.evaluate("1x = S", &mut env),
            Err(NvError::Name(NameError::Invalid { .. }))
        ));
        let err = engine.evaluate("A = B = S", &mut env).unwrap_err();
        let NvError::Parse(err) = err else {
            panic!("expected parse error, got {:?}", err);
        };
        assert_eq!(err.kind, ParseErrorKind::InvalidAssignment);
        assert_eq!(err.position, 6);
    }

    #[test]
    fn test_word_operators() {
        let (mut engine, mut env) = setup();
        let a = engine.evaluate("A = inverse X", &mut env).unwrap();
        let b = engine.evaluate("B = !X", &mut env).unwrap();
        assert_eq!(a, b);
        let c = engine.evaluate("X times S", &mut env).unwrap();
        let d = engine.evaluate("X*S", &mut env).unwrap();
        assert_eq!(c, d);
    }

    #[test]
    fn test_refine_operators() {
        let (mut engine, mut env) = setup();
        let refined = engine.evaluate("S>X", &mut env).unwrap();
        assert_eq!(refined.left().to_string(), "11000");
        assert!(TreePair::same_element(&refined, env.get_pair("X").unwrap()).unwrap());
        let refined = engine.evaluate("X<S", &mut env).unwrap();
        assert!(TreePair::same_element(&refined, env.get_pair("X").unwrap()).unwrap());
    }

    #[test]
    fn test_integer_overflow() {
        let (mut engine, mut env) = setup();
        let err = engine.evaluate("S^99999999999999999999", &mut env).unwrap_err();
        assert!(matches!(
            err,
            NvError::Parse(ParseError {
                kind: ParseErrorKind::InvalidConstant,
                position: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_constant_points_at_its_token() {
        let (mut engine, mut env) = setup();
        let digits = "9".repeat(20);
        let statement = format!("A{digits} = S^{digits}");
        let err = engine.evaluate(&statement, &mut env).unwrap_err();
        assert!(matches!(
            err,
            NvError::Parse(ParseError {
                kind: ParseErrorKind::InvalidConstant,
                position: 26,
                ..
            })
        ));
    }

    #[test]
    fn test_power_bound() {
        let (engine, mut env) = setup();
        let mut engine = engine.with_max_power(8);
        assert_eq!(engine.max_power(), Some(8));
        assert!(engine.evaluate("S^8", &mut env).is_ok());
        assert!(engine.evaluate("S^-8", &mut env).is_ok());
        let err = engine.evaluate("S^9", &mut env).unwrap_err();
        assert_eq!(
            err,
            NvError::Structure(StructureError::OutOfBounds {
                what: "power",
                value: 9,
                min: -8,
                max: 8,
            })
        );
        assert!(engine.evaluate("S^-9223372036854775808", &mut env).is_err());
        // conjugation is not bounded
        assert!(engine.evaluate("S^X", &mut env).is_ok());
        assert_eq!(env.names(), vec!["S", "X", "ans"]);
    }
}
