//! Priority scanner
//!
//! Builds an [`ExprNode`] by repeatedly rewriting a sequence of characters
//! and already-parsed nodes:
//!
//! 1. the last `(` and the first `)` after it are parsed as a group and
//!    replaced by the resulting node, until no parenthesis is left;
//! 2. the rightmost unary operator is applied to the atom on its right;
//! 3. among the binary operators of the best (lowest) rank the rightmost
//!    one is applied to its neighbouring atoms.
//!
//! Operators are located by a greedy left-to-right scan, so overlapping
//! matches are impossible.

use std::fmt;

use thiserror::Error;

use super::node::ExprNode;
use super::operators::{Operator, OperatorTable};

/// What went wrong while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// `(` without `)` or the other way round
    Unbalanced,
    /// Operator directly followed or preceded by another operator
    ConsecutiveOperators,
    /// Operator with nothing to apply to
    DanglingOperator,
    /// Operand mixing a sub-expression with other text
    MalformedAtom,
    /// Nothing to evaluate
    EmptyExpression,
    /// Assignment with more than one `=`
    InvalidAssignment,
    /// Constant literal that cannot be represented
    InvalidConstant,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ParseErrorKind::Unbalanced => "unbalanced parentheses",
            ParseErrorKind::ConsecutiveOperators => "consecutive operators",
            ParseErrorKind::DanglingOperator => "operator without operand",
            ParseErrorKind::MalformedAtom => "malformed operand",
            ParseErrorKind::EmptyExpression => "empty expression",
            ParseErrorKind::InvalidAssignment => "invalid assignment",
            ParseErrorKind::InvalidConstant => "invalid constant",
        };
        f.write_str(text)
    }
}

/// Malformed expression text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at position {position} in `{expression}`")]
pub struct ParseError {
    /// Failure class
    pub kind: ParseErrorKind,
    /// Character offset into `expression`
    pub position: usize,
    /// Statement being parsed
    pub expression: String,
}

/// Scanner state: a source character or an already-parsed node, each with
/// its source offset
#[derive(Debug)]
enum Item {
    Char(char, usize),
    Node(ExprNode, usize),
}

impl Item {
    fn position(&self) -> usize {
        match self {
            Item::Char(_, pos) | Item::Node(_, pos) => *pos,
        }
    }

    fn as_char(&self) -> Option<char> {
        match self {
            Item::Char(c, _) => Some(*c),
            Item::Node(..) => None,
        }
    }

    fn is_blank(&self) -> bool {
        self.as_char().is_some_and(char::is_whitespace)
    }
}

#[derive(Debug)]
struct Occurrence {
    start: usize,
    end: usize,
    op: Operator,
    symbol: String,
}

impl Occurrence {
    fn rank(&self) -> Option<usize> {
        match self.op {
            Operator::Binary(_, rank) => Some(rank),
            Operator::Unary(_) => None,
        }
    }
}

/// Parser bound to an operator table and the statement being parsed
#[derive(Debug)]
pub(crate) struct Parser<'a> {
    table: &'a OperatorTable,
    source: &'a str,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(table: &'a OperatorTable, source: &'a str) -> Self {
        Self { table, source }
    }

    pub(crate) fn error(&self, kind: ParseErrorKind, position: usize) -> ParseError {
        ParseError {
            kind,
            position,
            expression: self.source.to_string(),
        }
    }

    /// Parse `text`, which starts at char offset `offset` of the source
    pub(crate) fn parse(&self, text: &str, offset: usize) -> Result<ExprNode, ParseError> {
        let items: Vec<Item> = text
            .chars()
            .enumerate()
            .map(|(i, c)| Item::Char(c, offset + i))
            .collect();
        let end = offset + items.len();
        self.parse_items(items, end)
    }

    fn parse_items(&self, mut items: Vec<Item>, end: usize) -> Result<ExprNode, ParseError> {
        while let Some(open) = items.iter().rposition(|it| it.as_char() == Some('(')) {
            let close = items[open..]
                .iter()
                .position(|it| it.as_char() == Some(')'))
                .map(|i| open + i)
                .ok_or_else(|| self.error(ParseErrorKind::Unbalanced, items[open].position()))?;
            let close_pos = items[close].position();
            let mut group: Vec<Item> = items.drain(open..=close).collect();
            group.pop();
            let pos = group.remove(0).position();
            let node = self.parse_items(group, close_pos)?;
            items.insert(open, Item::Node(node, pos));
        }
        if let Some(stray) = items.iter().find(|it| it.as_char() == Some(')')) {
            return Err(self.error(ParseErrorKind::Unbalanced, stray.position()));
        }

        self.apply_unary(&mut items)?;
        self.apply_binary(&mut items)?;
        self.atom(items, (ParseErrorKind::EmptyExpression, end))
    }

    fn scan(&self, items: &[Item]) -> Vec<Occurrence> {
        let chars: Vec<Option<char>> = items.iter().map(Item::as_char).collect();
        let mut found = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            match self.table.operator_at(&chars[i..]) {
                Some((op, symbol)) => {
                    let len = symbol.chars().count().max(1);
                    found.push(Occurrence {
                        start: i,
                        end: i + len,
                        op,
                        symbol: symbol.to_string(),
                    });
                    i += len;
                }
                None => i += 1,
            }
        }
        found
    }

    fn apply_unary(&self, items: &mut Vec<Item>) -> Result<(), ParseError> {
        loop {
            let ops = self.scan(items);
            let Some(i) = ops.iter().rposition(|o| o.rank().is_none()) else {
                return Ok(());
            };
            let occ = &ops[i];
            let Operator::Unary(op) = occ.op else {
                return Ok(());
            };
            let hi = match ops.get(i + 1) {
                Some(next) if next.start == occ.end => {
                    return Err(self.error(
                        ParseErrorKind::ConsecutiveOperators,
                        items[next.start].position(),
                    ));
                }
                Some(next) => next.start,
                None => items.len(),
            };
            let pos = items[occ.start].position();
            let mut span: Vec<Item> = items.drain(occ.start..hi).collect();
            let operand = span.split_off(occ.end - occ.start);
            let operand = self.atom(operand, (ParseErrorKind::DanglingOperator, pos))?;
            let node = ExprNode::Unary {
                op,
                symbol: occ.symbol.clone(),
                operand: Box::new(operand),
            };
            items.insert(occ.start, Item::Node(node, pos));
        }
    }

    fn apply_binary(&self, items: &mut Vec<Item>) -> Result<(), ParseError> {
        loop {
            let ops = self.scan(items);
            let mut best: Option<(usize, usize)> = None;
            for (i, occ) in ops.iter().enumerate() {
                if let Some(rank) = occ.rank() {
                    if best.map_or(true, |(_, r)| rank <= r) {
                        best = Some((i, rank));
                    }
                }
            }
            let Some((i, _)) = best else {
                return Ok(());
            };
            let occ = &ops[i];
            let Operator::Binary(op, _) = occ.op else {
                return Ok(());
            };
            let pos = items[occ.start].position();

            let lo = match i.checked_sub(1).map(|p| &ops[p]) {
                Some(prev) if prev.end == occ.start => {
                    return Err(self.error(ParseErrorKind::ConsecutiveOperators, pos));
                }
                Some(prev) => prev.end,
                None => 0,
            };
            let hi = match ops.get(i + 1) {
                Some(next) if next.start == occ.end => {
                    return Err(self.error(
                        ParseErrorKind::ConsecutiveOperators,
                        items[next.start].position(),
                    ));
                }
                Some(next) => next.start,
                None => items.len(),
            };

            let mut left: Vec<Item> = items.drain(lo..hi).collect();
            let right = left.split_off(occ.end - lo);
            left.truncate(occ.start - lo);
            let left = self.atom(left, (ParseErrorKind::DanglingOperator, pos))?;
            let right = self.atom(right, (ParseErrorKind::DanglingOperator, pos))?;
            let node = ExprNode::Binary {
                op,
                symbol: occ.symbol.clone(),
                left: Box::new(left),
                right: Box::new(right),
            };
            items.insert(lo, Item::Node(node, pos));
        }
    }

    /// Operand from an operator-free run: either one node or plain text,
    /// trimmed. `empty` is the error raised when nothing is left.
    fn atom(
        &self,
        mut items: Vec<Item>,
        empty: (ParseErrorKind, usize),
    ) -> Result<ExprNode, ParseError> {
        while items.last().is_some_and(Item::is_blank) {
            items.pop();
        }
        let start = items.iter().position(|it| !it.is_blank()).unwrap_or(items.len());
        items.drain(..start);

        if items.is_empty() {
            return Err(self.error(empty.0, empty.1));
        }
        if items.len() == 1 {
            if let Some(Item::Node(..)) = items.first() {
                if let Some(Item::Node(node, _)) = items.pop() {
                    return Ok(node);
                }
            }
        }
        let position = items[0].position();
        let text: Option<String> = items.iter().map(Item::as_char).collect();
        text.map(|text| ExprNode::Atom { text, position })
            .ok_or_else(|| self.error(ParseErrorKind::MalformedAtom, position))
    }
}
