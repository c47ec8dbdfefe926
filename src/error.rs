use crate::token::{Tag, Token};
use crate::types::TypeKind;
use std::fmt;
use thiserror::Error;

/// Token snapshot carried inside error variants.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub tag: Tag,
    pub text: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for TokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' at {}:{}",
            self.tag, self.text, self.line, self.column
        )
    }
}

impl From<&Token> for TokenInfo {
    fn from(token: &Token) -> Self {
        TokenInfo {
            tag: token.tag,
            text: token.text.clone(),
            line: token.pos.line,
            column: token.pos.column,
        }
    }
}

/// Coarse grouping of the error variants. Every detected violation is fatal;
/// translation stops at the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Name,
    Type,
    Range,
}

/// Unified error type for the translator.
#[derive(Debug, Error)]
pub enum Error {
    // Syntax errors
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: Tag, found: TokenInfo },

    #[error("unexpected end of token stream")]
    UnexpectedEof,

    #[error("expected a type name, found {0}")]
    ExpectedType(TokenInfo),

    #[error("expected a factor, found {0}")]
    ExpectedFactor(TokenInfo),

    #[error("array bound must be an ordinal literal, found {0}")]
    ExpectedBound(TokenInfo),

    #[error("expected ',' or ')' in writeln arguments, found {0}")]
    WritelnSeparator(TokenInfo),

    #[error("malformed literal: {0}")]
    InvalidLiteral(String),

    // Name errors
    #[error("undeclared identifier: {0}")]
    Undeclared(String),

    #[error("not a label: {0}")]
    NotALabel(String),

    #[error("goto target never defined: {0}")]
    UnresolvedLabel(String),

    // Type errors
    #[error("cannot assign {found} to {expected}")]
    AssignMismatch { expected: TypeKind, found: TypeKind },

    #[error("operator {op} cannot combine {lhs} and {rhs}")]
    InvalidOperands { op: Tag, lhs: TypeKind, rhs: TypeKind },

    #[error("incompatible index type: expected {expected}, found {found}")]
    IndexTypeMismatch { expected: TypeKind, found: TypeKind },

    #[error("array bound types differ: {low} and {high}")]
    BoundTypeMismatch { low: TypeKind, high: TypeKind },

    #[error("invalid array index type: {0}")]
    InvalidIndexKind(TypeKind),

    #[error("case selector must not be real")]
    RealCaseSelector,

    #[error("cannot write value of type {0}")]
    Unprintable(TypeKind),

    #[error("{0} is not a value")]
    NotAValue(String),

    // Range errors
    #[error("array range is invalid: {low}..{high}")]
    InvalidRange { low: i32, high: i32 },

    #[error("index {index} is not within range {low}..{high}")]
    IndexOutOfRange { index: i32, low: i32, high: i32 },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnexpectedToken { .. }
            | Error::UnexpectedEof
            | Error::ExpectedType(_)
            | Error::ExpectedFactor(_)
            | Error::ExpectedBound(_)
            | Error::WritelnSeparator(_)
            | Error::InvalidLiteral(_) => ErrorKind::Syntax,

            Error::Undeclared(_) | Error::NotALabel(_) | Error::UnresolvedLabel(_) => {
                ErrorKind::Name
            }

            Error::AssignMismatch { .. }
            | Error::InvalidOperands { .. }
            | Error::IndexTypeMismatch { .. }
            | Error::BoundTypeMismatch { .. }
            | Error::InvalidIndexKind(_)
            | Error::RealCaseSelector
            | Error::Unprintable(_)
            | Error::NotAValue(_) => ErrorKind::Type,

            Error::InvalidRange { .. } | Error::IndexOutOfRange { .. } => ErrorKind::Range,
        }
    }
}
