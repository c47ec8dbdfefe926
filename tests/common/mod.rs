// Minimal tokenizer for test sources. The crate under test starts from a
// token stream; real scanning is a separate concern, so this only covers
// the subset the tests exercise.

use pasc::{Pos, Tag, Token};

pub fn lex(src: &str) -> Vec<Token> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line: u32 = 1;
    let mut column: u32 = 1;

    while i < chars.len() {
        let c = chars[i];

        if c == '\n' {
            line += 1;
            column = 1;
            i += 1;
            continue;
        }
        if c.is_whitespace() {
            column += 1;
            i += 1;
            continue;
        }

        let pos = Pos { line, column };

        // Identifiers and keywords
        if c.is_ascii_alphabetic() {
            let mut j = i;
            while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '_') {
                j += 1;
            }
            let word: String = chars[i..j].iter().collect();
            tokens.push(Token::new(keyword_tag(&word), word, pos));
            column += (j - i) as u32;
            i = j;
            continue;
        }

        // Numeric literals; a '.' starts a real part only when a digit
        // follows, so `1..5` stays an integer plus a range token.
        if c.is_ascii_digit() {
            let mut j = i;
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            let mut tag = Tag::IntLit;
            if j + 1 < chars.len() && chars[j] == '.' && chars[j + 1].is_ascii_digit() {
                tag = Tag::RealLit;
                j += 1;
                while j < chars.len() && chars[j].is_ascii_digit() {
                    j += 1;
                }
            }
            let text: String = chars[i..j].iter().collect();
            tokens.push(Token::new(tag, text, pos));
            column += (j - i) as u32;
            i = j;
            continue;
        }

        // Quoted literals: single char or string
        if c == '\'' {
            let mut j = i + 1;
            while j < chars.len() && chars[j] != '\'' {
                j += 1;
            }
            let text: String = chars[i + 1..j].iter().collect();
            let tag = if text.chars().count() == 1 {
                Tag::CharLit
            } else {
                Tag::StrLit
            };
            tokens.push(Token::new(tag, text, pos));
            column += (j + 1 - i) as u32;
            i = j + 1;
            continue;
        }

        // Two-character punctuation
        if i + 1 < chars.len() {
            let pair = (c, chars[i + 1]);
            let tag = match pair {
                (':', '=') => Some(Tag::Assign),
                ('.', '.') => Some(Tag::Range),
                ('<', '=') => Some(Tag::LessEqual),
                ('>', '=') => Some(Tag::GreaterEqual),
                ('<', '>') => Some(Tag::NotEqual),
                _ => None,
            };
            if let Some(tag) = tag {
                tokens.push(Token::new(tag, format!("{}{}", pair.0, pair.1), pos));
                column += 2;
                i += 2;
                continue;
            }
        }

        let tag = match c {
            '+' => Tag::Plus,
            '-' => Tag::Minus,
            '*' => Tag::Star,
            '/' => Tag::Slash,
            '=' => Tag::Equal,
            '<' => Tag::Less,
            '>' => Tag::Greater,
            ':' => Tag::Colon,
            ';' => Tag::Semicolon,
            ',' => Tag::Comma,
            '.' => Tag::Dot,
            '(' => Tag::LParen,
            ')' => Tag::RParen,
            '[' => Tag::LBracket,
            ']' => Tag::RBracket,
            other => panic!("test source has an unexpected character: {other:?}"),
        };
        tokens.push(Token::new(tag, c.to_string(), pos));
        column += 1;
        i += 1;
    }

    tokens.push(Token::new(Tag::Eof, "", Pos { line, column }));
    tokens
}

fn keyword_tag(word: &str) -> Tag {
    match word {
        "program" => Tag::KwProgram,
        "var" => Tag::KwVar,
        "label" => Tag::KwLabel,
        "procedure" => Tag::KwProcedure,
        "begin" => Tag::KwBegin,
        "end" => Tag::KwEnd,
        "if" => Tag::KwIf,
        "then" => Tag::KwThen,
        "else" => Tag::KwElse,
        "while" => Tag::KwWhile,
        "do" => Tag::KwDo,
        "repeat" => Tag::KwRepeat,
        "until" => Tag::KwUntil,
        "for" => Tag::KwFor,
        "to" => Tag::KwTo,
        "case" => Tag::KwCase,
        "of" => Tag::KwOf,
        "goto" => Tag::KwGoto,
        "writeln" => Tag::KwWriteln,
        "not" => Tag::KwNot,
        "div" => Tag::KwDiv,
        "integer" => Tag::KwInteger,
        "real" => Tag::KwReal,
        "boolean" => Tag::KwBoolean,
        "char" => Tag::KwChar,
        "string" => Tag::KwString,
        "array" => Tag::KwArray,
        "true" | "false" => Tag::BoolLit,
        _ => Tag::Ident,
    }
}
