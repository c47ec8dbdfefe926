// token.rs

use strum::Display;

/// One lexical token as delivered by the scanner. The tag is deliberately
/// left mutable: the translator reclassifies an `Ident` into one of the
/// `Decl*` tags once the identifier's declaration is known.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tag: Tag,
    pub text: String,
    pub pos: Pos,
}

impl Token {
    pub fn new(tag: Tag, text: impl Into<String>, pos: Pos) -> Self {
        Token {
            tag,
            text: text.into(),
            pos,
        }
    }

    /// Placeholder the translator holds before the first `advance`.
    pub fn eof() -> Self {
        Token::new(Tag::Eof, "", Pos { line: 0, column: 0 })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Tag {
    // Keywords
    KwProgram,   // "program"
    KwVar,       // "var"
    KwLabel,     // "label"
    KwProcedure, // "procedure"
    KwBegin,     // "begin"
    KwEnd,       // "end"
    KwIf,        // "if"
    KwThen,      // "then"
    KwElse,      // "else"
    KwWhile,     // "while"
    KwDo,        // "do"
    KwRepeat,    // "repeat"
    KwUntil,     // "until"
    KwFor,       // "for"
    KwTo,        // "to"
    KwCase,      // "case"
    KwOf,        // "of"
    KwGoto,      // "goto"
    KwWriteln,   // "writeln"
    KwNot,       // "not"
    KwDiv,       // "div"

    // Type names
    KwInteger, // "integer"
    KwReal,    // "real"
    KwBoolean, // "boolean"
    KwChar,    // "char"
    KwString,  // "string"
    KwArray,   // "array"

    // Double character tokens
    Assign,       // ':='
    Range,        // '..'
    LessEqual,    // '<='
    GreaterEqual, // '>='
    NotEqual,     // '<>'

    // Single character tokens
    Plus,      // '+'
    Minus,     // '-'
    Star,      // '*'
    Slash,     // '/'
    Equal,     // '='
    Less,      // '<'
    Greater,   // '>'
    Colon,     // ':'
    Semicolon, // ';'
    Comma,     // ','
    Dot,       // '.'
    LParen,    // '('
    RParen,    // ')'
    LBracket,  // '['
    RBracket,  // ']'

    // Literals
    IntLit,  // 42
    RealLit, // 4.2
    BoolLit, // true | false
    CharLit, // 'a'
    StrLit,  // 'abc'

    // Identifier, before resolution
    Ident,

    // Resolved identifier classifications
    DeclVar,   // a declared scalar variable
    DeclArray, // a declared array
    DeclProc,  // a declared procedure
    DeclLabel, // a declared label

    // End of the token stream
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}
