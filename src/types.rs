use crate::token::Tag;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use strum::Display;

/// Static type of a declared symbol or of a translated expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TypeKind {
    Integer,
    Real,
    Boolean,
    Char,
    String,
    Procedure,
    Label,
    Array,
}

/// Declaration type names as they arrive from the scanner, mapped to the
/// type they declare.
pub static DECL_TYPE: Lazy<HashMap<Tag, TypeKind>> = Lazy::new(|| {
    HashMap::from([
        (Tag::KwInteger, TypeKind::Integer),
        (Tag::KwReal, TypeKind::Real),
        (Tag::KwBoolean, TypeKind::Boolean),
        (Tag::KwChar, TypeKind::Char),
        (Tag::KwString, TypeKind::String),
        (Tag::KwArray, TypeKind::Array),
    ])
});

/// Type of a literal token, or `None` if the tag is not a literal.
pub fn literal_type(tag: Tag) -> Option<TypeKind> {
    match tag {
        Tag::IntLit => Some(TypeKind::Integer),
        Tag::RealLit => Some(TypeKind::Real),
        Tag::CharLit => Some(TypeKind::Char),
        Tag::BoolLit => Some(TypeKind::Boolean),
        _ => None,
    }
}
