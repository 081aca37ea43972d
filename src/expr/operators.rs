//! Operator configuration
//!
//! Operators are data: a symbol, the operation it stands for, and a rank
//! given by its position in the table (earlier = binds tighter). Several
//! symbols may share one operation. Symbols must not contain one another.

use std::fmt;

use regex::Regex;

/// Operation applied to a single operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Group inverse
    Inverse,
    /// Full reduction to canonical form
    Reduce,
    /// Reduction to the smallest grid only
    GridReduce,
}

/// Operation applied to two operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `A^n` power, or `A^B` conjugation of A by B
    Power,
    /// `A` followed by `B`
    Compose,
    /// Commutator of `A` and `B`
    Commutator,
    /// Refine the right tree of `A` to the left tree of `B`
    RefineRight,
    /// Refine the left tree of `B` to the right tree of `A`
    RefineLeft,
}

/// What a constant literal evaluates to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantKind {
    /// `{left,right,perm}`
    TreePair,
    /// Signed integer
    Integer,
}

/// Regex recognising a constant literal
#[derive(Debug, Clone)]
pub struct ConstantFormat {
    pattern: Regex,
    kind: ConstantKind,
}

impl ConstantFormat {
    /// Format from a regex; anchor it if whole atoms should match
    pub fn new(pattern: &str, kind: ConstantKind) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            kind,
        })
    }

    /// True if `atom` is written in this format
    pub fn matches(&self, atom: &str) -> bool {
        self.pattern.is_match(atom)
    }

    /// Kind of value the literal denotes
    pub fn kind(&self) -> ConstantKind {
        self.kind
    }
}

/// Either kind of operator found in expression text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Prefix operator
    Unary(UnaryOp),
    /// Infix operator with its rank
    Binary(BinaryOp, usize),
}

/// Ordered operator lists plus constant formats
#[derive(Debug, Clone)]
pub struct OperatorTable {
    unary: Vec<(String, UnaryOp)>,
    binary: Vec<(String, BinaryOp)>,
    constants: Vec<ConstantFormat>,
}

impl OperatorTable {
    /// Table with no operators and no constants
    pub fn empty() -> Self {
        Self {
            unary: Vec::new(),
            binary: Vec::new(),
            constants: Vec::new(),
        }
    }

    /// Append a unary operator at the lowest priority so far
    pub fn with_unary(mut self, symbol: &str, op: UnaryOp) -> Self {
        self.unary.push((symbol.to_string(), op));
        self
    }

    /// Append a binary operator at the lowest priority so far
    pub fn with_binary(mut self, symbol: &str, op: BinaryOp) -> Self {
        self.binary.push((symbol.to_string(), op));
        self
    }

    /// Add a constant format
    pub fn with_constant(mut self, format: ConstantFormat) -> Self {
        self.constants.push(format);
        self
    }

    /// Unary symbols in priority order
    pub fn unary(&self) -> &[(String, UnaryOp)] {
        &self.unary
    }

    /// Binary symbols in priority order
    pub fn binary(&self) -> &[(String, BinaryOp)] {
        &self.binary
    }

    /// Operator whose symbol starts at `chars[0]`, with its symbol length.
    /// Unary symbols are tried before binary ones.
    pub fn operator_at(&self, chars: &[Option<char>]) -> Option<(Operator, &str)> {
        let starts = |symbol: &str| {
            symbol.chars().count() <= chars.len()
                && symbol.chars().zip(chars).all(|(s, c)| *c == Some(s))
        };
        if let Some((symbol, op)) = self.unary.iter().find(|(s, _)| starts(s)) {
            return Some((Operator::Unary(*op), symbol.as_str()));
        }
        self.binary
            .iter()
            .enumerate()
            .find(|(_, (s, _))| starts(s))
            .map(|(rank, (symbol, op))| (Operator::Binary(*op, rank), symbol.as_str()))
    }

    /// Kind of constant `atom` is written as, if any
    pub fn constant_kind(&self, atom: &str) -> Option<ConstantKind> {
        self.constants
            .iter()
            .find(|format| format.matches(atom))
            .map(ConstantFormat::kind)
    }
}

impl Default for OperatorTable {
    /// Standard table: `! $ @ " inverse "` and `^ * # < > " times "`
    fn default() -> Self {
        let constants = [
            (r"^\{(\w|\s|,)+\}$", ConstantKind::TreePair),
            (r"^\d+$", ConstantKind::Integer),
            (r"^-\d+$", ConstantKind::Integer),
        ]
        .into_iter()
        .map(|(pattern, kind)| {
            ConstantFormat::new(pattern, kind).expect("built-in constant format")
        });

        let mut table = Self::empty()
            .with_unary("!", UnaryOp::Inverse)
            .with_unary("$", UnaryOp::Reduce)
            .with_unary("@", UnaryOp::GridReduce)
            .with_binary("^", BinaryOp::Power)
            .with_binary("*", BinaryOp::Compose)
            .with_binary("#", BinaryOp::Commutator)
            .with_binary("<", BinaryOp::RefineRight)
            .with_binary(">", BinaryOp::RefineLeft)
            .with_unary(" inverse ", UnaryOp::Inverse)
            .with_binary(" times ", BinaryOp::Compose);
        table.constants.extend(constants);
        table
    }
}

impl fmt::Display for OperatorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quote = |s: &String| format!("'{}'", s);
        let unary: Vec<String> = self.unary.iter().map(|(s, _)| quote(s)).collect();
        let binary: Vec<String> = self.binary.iter().map(|(s, _)| quote(s)).collect();
        write!(f, "unary [{}], binary [{}]", unary.join(" "), binary.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<Option<char>> {
        s.chars().map(Some).collect()
    }

    #[test]
    fn test_standard_ranks() {
        let table = OperatorTable::default();
        assert_eq!(
            table.operator_at(&chars("^B")),
            Some((Operator::Binary(BinaryOp::Power, 0), "^"))
        );
        assert_eq!(
            table.operator_at(&chars("*B")).map(|(op, _)| op),
            Some(Operator::Binary(BinaryOp::Compose, 1))
        );
        assert_eq!(
            table.operator_at(&chars(" times B")).map(|(op, _)| op),
            Some(Operator::Binary(BinaryOp::Compose, 5))
        );
        assert_eq!(
            table.operator_at(&chars(" inverse A")).map(|(op, _)| op),
            Some(Operator::Unary(UnaryOp::Inverse))
        );
        assert_eq!(table.operator_at(&chars(" time")), None);
        assert_eq!(table.operator_at(&[None, Some('*')]), None);
    }

    #[test]
    fn test_constant_formats() {
        let table = OperatorTable::default();
        assert_eq!(table.constant_kind("{100,100,2 1}"), Some(ConstantKind::TreePair));
        assert_eq!(table.constant_kind("{random 4 2}"), Some(ConstantKind::TreePair));
        assert_eq!(table.constant_kind("17"), Some(ConstantKind::Integer));
        assert_eq!(table.constant_kind("-3"), Some(ConstantKind::Integer));
        assert_eq!(table.constant_kind("A1"), None);
        assert_eq!(table.constant_kind("{}"), None);
    }

    #[test]
    fn test_custom_table() {
        let table = OperatorTable::empty()
            .with_unary("~", UnaryOp::Reduce)
            .with_binary("+", BinaryOp::Compose);
        assert_eq!(table.unary().len(), 1);
        assert_eq!(
            table.operator_at(&chars("+")),
            Some((Operator::Binary(BinaryOp::Compose, 0), "+"))
        );
        assert_eq!(table.constant_kind("12"), None);
        assert_eq!(table.to_string(), "unary ['~'], binary ['+']");
    }
}
