use crate::token::Tag;
use crate::types::TypeKind;
use indexmap::IndexMap;

/// One entry in the program-wide namespace. Scalars use `address` only;
/// procedures additionally fill `return_address` (the offset of the body's
/// single return-jump operand); arrays fill the bounds and element typing
/// once their range clause is parsed. Char bounds are stored as ordinals.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: Tag,
    pub typ: TypeKind,
    pub address: i32,
    pub return_address: i32,
    pub low: i32,
    pub high: i32,
    pub index_type: TypeKind,
    pub value_type: TypeKind,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: Tag, typ: TypeKind, address: i32) -> Self {
        Symbol {
            name: name.into(),
            kind,
            typ,
            address,
            return_address: 0,
            low: 0,
            high: 0,
            index_type: typ,
            value_type: typ,
        }
    }
}

/// Flat, program-wide symbol directory. There is no scoping and no removal:
/// a name resolves to the same entry for the whole translation, and the
/// first declaration of a name wins.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.entries.get(name)
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.entries.get_mut(name)
    }

    /// Insert only if the name is not yet declared; a re-declaration is a
    /// silent no-op. Returns whether the symbol was actually inserted.
    pub fn insert(&mut self, symbol: Symbol) -> bool {
        if self.entries.contains_key(&symbol.name) {
            return false;
        }
        self.entries.insert(symbol.name.clone(), symbol);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.values()
    }
}
