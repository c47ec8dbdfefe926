// translator.rs

use crate::error::Error;
use crate::image::Image;
use crate::opcode::OpCode;
use crate::symbol::{Symbol, SymbolTable};
use crate::token::{Tag, Token};
use crate::types::{literal_type, TypeKind, DECL_TYPE};
use indexmap::IndexMap;

/// Syntax-directed translator: one pass over the token stream that parses,
/// resolves names, checks types and emits bytecode as each production is
/// reduced. There is no syntax tree; forward control-flow references are
/// resolved by backpatching holes in the image.
pub struct Translator<I: Iterator<Item = Token>> {
    tokens: I,
    current: Token,
    symbols: SymbolTable,
    image: Image,
    /// Offsets of goto jump operands still waiting for their label, keyed
    /// by label name. Every hole must be patched before translation ends.
    label_holes: IndexMap<String, Vec<usize>>,
    /// Data segment allocator; monotone, addresses are never reused.
    dp: i32,
}

impl<I: Iterator<Item = Token>> Translator<I> {
    pub fn new(tokens: I) -> Self {
        Translator {
            tokens,
            current: Token::eof(),
            symbols: SymbolTable::new(),
            image: Image::new(),
            label_holes: IndexMap::new(),
            dp: 0,
        }
    }

    /// Translate the whole program and return the finished bytecode image.
    ///
    /// `program <ident> ; <declarations> <begin-block> . <eof>`
    pub fn translate(mut self) -> Result<Vec<u8>, Error> {
        self.advance();

        self.expect(Tag::KwProgram)?;
        self.expect(Tag::Ident)?;
        self.expect(Tag::Semicolon)?;

        self.declarations()?;
        self.begin_block()?;
        self.check_unresolved()?;

        Ok(self.image.into_bytes())
    }
}

// ------------------------------------------------------------------------
// Token cursor
// ------------------------------------------------------------------------

impl<I: Iterator<Item = Token>> Translator<I> {
    /// Consume the current token and expose the next one. At the end of the
    /// stream the `Eof` token stays in place.
    fn advance(&mut self) {
        if let Some(next) = self.tokens.next() {
            self.current = next;
        }
    }

    /// The current token must carry `expected`, else the translation aborts.
    fn expect(&mut self, expected: Tag) -> Result<(), Error> {
        if self.current.tag == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: Tag) -> Error {
        Error::UnexpectedToken {
            expected,
            found: (&self.current).into(),
        }
    }

    fn parse_int(&self) -> Result<i32, Error> {
        self.current
            .text
            .parse::<i32>()
            .map_err(|_| Error::InvalidLiteral(self.current.text.clone()))
    }

    fn parse_real(&self) -> Result<f32, Error> {
        self.current
            .text
            .parse::<f32>()
            .map_err(|_| Error::InvalidLiteral(self.current.text.clone()))
    }

    fn char_ord(&self) -> Result<i32, Error> {
        match self.current.text.chars().next() {
            Some(c) => Ok(c as i32),
            None => Err(Error::InvalidLiteral(self.current.text.clone())),
        }
    }
}

// ------------------------------------------------------------------------
// Declarations
// ------------------------------------------------------------------------

impl<I: Iterator<Item = Token>> Translator<I> {
    /// `<declarations> -> { <var decl> | <label decl> | <procedure decl> }`
    /// until the program's `begin` is seen.
    fn declarations(&mut self) -> Result<(), Error> {
        loop {
            match self.current.tag {
                Tag::KwVar => self.var_declarations()?,
                Tag::KwProcedure => self.proc_declaration()?,
                Tag::KwLabel => self.label_declarations()?,
                Tag::KwBegin => return Ok(()),
                _ => return Err(self.unexpected(Tag::KwBegin)),
            }
        }
    }

    /// `var <name> {, <name>} : <type> ;`
    ///
    /// Every name of a group gets a fresh 4-byte slot; an `array` group is
    /// re-based and re-sized by the range clause that must follow.
    fn var_declarations(&mut self) -> Result<(), Error> {
        while self.current.tag == Tag::KwVar {
            self.expect(Tag::KwVar)?;

            let mut names = Vec::new();
            while self.current.tag == Tag::Ident {
                self.current.tag = Tag::DeclVar;
                names.push(self.current.text.clone());
                self.expect(Tag::DeclVar)?;
                if self.current.tag == Tag::Comma {
                    self.expect(Tag::Comma)?;
                }
            }
            self.expect(Tag::Colon)?;

            let typ = match DECL_TYPE.get(&self.current.tag) {
                Some(typ) => *typ,
                None => return Err(Error::ExpectedType((&self.current).into())),
            };
            self.advance();

            // First declaration wins; the allocator still moves for every
            // name so re-declarations never alias a live address.
            let mut group = Vec::new();
            for name in names {
                let fresh = self
                    .symbols
                    .insert(Symbol::new(&name, Tag::DeclVar, typ, self.dp));
                self.dp += 4;
                group.push((name, fresh));
            }

            if typ == TypeKind::Array {
                self.array_declaration(&group)?;
            }

            self.expect(Tag::Semicolon)?;
        }
        Ok(())
    }

    /// `[ <low> .. <high> ] of <type>`
    ///
    /// Bounds must be ordinal literals of the same kind; integer-indexed
    /// arrays use 4-byte elements, char-indexed arrays 1-byte elements.
    fn array_declaration(&mut self, group: &[(String, bool)]) -> Result<(), Error> {
        self.expect(Tag::LBracket)?;
        let low_tok = self.current.clone();
        let low_type = match literal_type(low_tok.tag) {
            Some(t) => t,
            None => return Err(Error::ExpectedBound((&self.current).into())),
        };
        self.advance();
        self.expect(Tag::Range)?;
        let high_tok = self.current.clone();
        let high_type = match literal_type(high_tok.tag) {
            Some(t) => t,
            None => return Err(Error::ExpectedBound((&self.current).into())),
        };
        self.advance();
        self.expect(Tag::RBracket)?;
        self.expect(Tag::KwOf)?;

        let value_type = match DECL_TYPE.get(&self.current.tag) {
            Some(typ) => *typ,
            None => return Err(Error::ExpectedType((&self.current).into())),
        };
        self.advance();

        if low_type != high_type {
            return Err(Error::BoundTypeMismatch {
                low: low_type,
                high: high_type,
            });
        }

        let (low, high, element_size) = match low_type {
            TypeKind::Integer => {
                let low = low_tok
                    .text
                    .parse::<i32>()
                    .map_err(|_| Error::InvalidLiteral(low_tok.text.clone()))?;
                let high = high_tok
                    .text
                    .parse::<i32>()
                    .map_err(|_| Error::InvalidLiteral(high_tok.text.clone()))?;
                (low, high, 4)
            }
            TypeKind::Char => {
                let low = match low_tok.text.chars().next() {
                    Some(c) => c as i32,
                    None => return Err(Error::InvalidLiteral(low_tok.text.clone())),
                };
                let high = match high_tok.text.chars().next() {
                    Some(c) => c as i32,
                    None => return Err(Error::InvalidLiteral(high_tok.text.clone())),
                };
                (low, high, 1)
            }
            other => return Err(Error::InvalidIndexKind(other)),
        };

        if low > high {
            return Err(Error::InvalidRange { low, high });
        }

        // The group shares one contiguous block starting at the first
        // freshly declared name's scalar slot.
        if let Some((first, _)) = group.iter().find(|(_, fresh)| *fresh) {
            if let Some(sym) = self.symbols.lookup(first) {
                self.dp = sym.address;
            }
        }

        let size = element_size * (high - low + 1);
        for (name, fresh) in group {
            if !*fresh {
                continue;
            }
            if let Some(sym) = self.symbols.lookup_mut(name) {
                sym.address = self.dp;
                sym.low = low;
                sym.high = high;
                sym.kind = Tag::DeclArray;
                sym.index_type = low_type;
                sym.value_type = value_type;
                self.dp += size;
            }
        }

        Ok(())
    }

    /// `label <name> {, <name>} ;`
    fn label_declarations(&mut self) -> Result<(), Error> {
        while self.current.tag == Tag::KwLabel {
            self.expect(Tag::KwLabel)?;

            while self.current.tag == Tag::Ident {
                self.current.tag = Tag::DeclLabel;
                let name = self.current.text.clone();
                self.expect(Tag::DeclLabel)?;
                if self.current.tag == Tag::Comma {
                    self.expect(Tag::Comma)?;
                }
                self.symbols
                    .insert(Symbol::new(name, Tag::DeclLabel, TypeKind::Label, 0));
            }

            self.expect(Tag::Semicolon)?;
        }
        Ok(())
    }

    /// `procedure <name> ; begin <statements> end ;`
    ///
    /// The declaration site emits a jump over the body. The body ends in a
    /// single return jump whose operand offset is recorded on the symbol;
    /// each call site re-patches that one hole, which is exactly why calls
    /// are neither recursive nor re-entrant.
    fn proc_declaration(&mut self) -> Result<(), Error> {
        self.expect(Tag::KwProcedure)?;
        self.current.tag = Tag::DeclProc;
        let name = self.current.text.clone();
        self.expect(Tag::DeclProc)?;
        self.expect(Tag::Semicolon)?;

        self.image.emit_op(OpCode::Jmp);
        let skip_hole = self.image.hole();

        let body = self.image.mark() as i32;
        self.expect(Tag::KwBegin)?;
        self.statements()?;
        self.expect(Tag::KwEnd)?;
        self.expect(Tag::Semicolon)?;

        self.image.emit_op(OpCode::Jmp);
        let mut symbol = Symbol::new(name, Tag::DeclProc, TypeKind::Procedure, body);
        symbol.return_address = self.image.hole() as i32;
        self.symbols.insert(symbol);

        let after = self.image.mark() as i32;
        self.image.patch_int(skip_hole, after);
        Ok(())
    }
}

// ------------------------------------------------------------------------
// Statements
// ------------------------------------------------------------------------

impl<I: Iterator<Item = Token>> Translator<I> {
    /// `begin <statements> end . <eof>` followed by the final `HALT`.
    fn begin_block(&mut self) -> Result<(), Error> {
        self.expect(Tag::KwBegin)?;
        self.statements()?;
        self.expect(Tag::KwEnd)?;
        self.expect(Tag::Dot)?;
        if self.current.tag != Tag::Eof {
            return Err(self.unexpected(Tag::Eof));
        }
        self.image.emit_op(OpCode::Halt);
        Ok(())
    }

    /// Statement list, dispatched on the leading tag. A leading identifier
    /// is first resolved through the symbol directory and retagged; a tag
    /// that opens no statement ends the list.
    fn statements(&mut self) -> Result<(), Error> {
        loop {
            match self.current.tag {
                Tag::KwEnd => return Ok(()),
                Tag::KwCase => self.case_stat()?,
                Tag::KwGoto => self.goto_stat()?,
                Tag::KwWhile => self.while_stat()?,
                Tag::KwRepeat => self.repeat_stat()?,
                Tag::KwIf => self.if_stat()?,
                Tag::KwFor => self.for_stat()?,
                Tag::KwWriteln => self.write_stat()?,
                Tag::Ident => match self.symbols.lookup(&self.current.text) {
                    Some(symbol) => self.current.tag = symbol.kind,
                    None => return Err(Error::Undeclared(self.current.text.clone())),
                },
                Tag::DeclVar => self.assignment_stat()?,
                Tag::DeclProc => self.procedure_stat()?,
                Tag::DeclLabel => self.label_stat()?,
                Tag::DeclArray => self.array_assignment_stat()?,
                Tag::Semicolon => self.expect(Tag::Semicolon)?,
                _ => return Ok(()),
            }
        }
    }

    /// `<var> := <expr>` — the inferred type must equal the declared type,
    /// with no widening across the assignment.
    fn assignment_stat(&mut self) -> Result<(), Error> {
        let name = self.current.text.clone();
        let symbol = match self.symbols.lookup(&name) {
            Some(symbol) => symbol.clone(),
            None => return Err(Error::Undeclared(name)),
        };
        self.expect(Tag::DeclVar)?;
        self.expect(Tag::Assign)?;

        let rhs = self.expression()?;
        if symbol.typ != rhs {
            return Err(Error::AssignMismatch {
                expected: symbol.typ,
                found: rhs,
            });
        }
        self.image.emit_op(OpCode::Pop);
        self.image.emit_int(symbol.address);
        Ok(())
    }

    /// `<arr> [ <index> ] := <expr>` — pushes the element address, then the
    /// value, then stores indirectly.
    fn array_assignment_stat(&mut self) -> Result<(), Error> {
        let symbol = match self.symbols.lookup(&self.current.text) {
            Some(symbol) => symbol.clone(),
            None => return Err(Error::Undeclared(self.current.text.clone())),
        };
        self.array_access(&symbol)?;
        self.expect(Tag::Assign)?;

        let rhs = self.expression()?;
        if symbol.value_type != rhs {
            return Err(Error::AssignMismatch {
                expected: symbol.value_type,
                found: rhs,
            });
        }
        self.image.emit_op(OpCode::Put);
        Ok(())
    }

    /// `<proc> ;` — jump to the body, then patch the body's return jump to
    /// land right after this call site.
    fn procedure_stat(&mut self) -> Result<(), Error> {
        let symbol = match self.symbols.lookup(&self.current.text) {
            Some(symbol) => symbol.clone(),
            None => return Err(Error::Undeclared(self.current.text.clone())),
        };
        self.expect(Tag::DeclProc)?;
        self.expect(Tag::Semicolon)?;

        self.image.emit_op(OpCode::Jmp);
        self.image.emit_int(symbol.address);

        let restore = self.image.mark() as i32;
        self.image.patch_int(symbol.return_address as usize, restore);
        Ok(())
    }

    /// `<label> : <statements>` — patches every goto hole recorded for the
    /// label so far.
    fn label_stat(&mut self) -> Result<(), Error> {
        let name = self.current.text.clone();
        self.expect(Tag::DeclLabel)?;
        self.expect(Tag::Colon)?;

        let at = self.image.mark() as i32;
        if let Some(holes) = self.label_holes.get_mut(&name) {
            for hole in holes.drain(..) {
                self.image.patch_int(hole, at);
            }
        }

        self.statements()
    }

    /// `goto <label> ;` — emits a jump hole to be patched by a later
    /// definition of the label.
    fn goto_stat(&mut self) -> Result<(), Error> {
        self.expect(Tag::KwGoto)?;
        let name = self.current.text.clone();
        match self.symbols.lookup(&name) {
            Some(symbol) if symbol.kind == Tag::DeclLabel => {}
            Some(_) => return Err(Error::NotALabel(name)),
            None => return Err(Error::Undeclared(name)),
        }
        self.current.tag = Tag::DeclLabel;
        self.expect(Tag::DeclLabel)?;

        self.image.emit_op(OpCode::Jmp);
        let hole = self.image.hole();
        if let Some(symbol) = self.symbols.lookup_mut(&name) {
            symbol.address = hole as i32;
        }
        self.label_holes.entry(name).or_default().push(hole);

        self.expect(Tag::Semicolon)
    }

    /// `if <cond> then <statements> [ else <statements> ]`
    fn if_stat(&mut self) -> Result<(), Error> {
        self.expect(Tag::KwIf)?;
        self.condition()?;
        self.expect(Tag::KwThen)?;

        self.image.emit_op(OpCode::Jfalse);
        let mut hole = self.image.hole();

        self.statements()?;

        if self.current.tag == Tag::KwElse {
            self.image.emit_op(OpCode::Jmp);
            let skip_else = self.image.hole();
            self.expect(Tag::KwElse)?;

            let else_start = self.image.mark() as i32;
            self.image.patch_int(hole, else_start);
            hole = skip_else;

            self.statements()?;
        }

        let after = self.image.mark() as i32;
        self.image.patch_int(hole, after);
        Ok(())
    }

    /// `while <cond> do begin <statements> end ;`
    fn while_stat(&mut self) -> Result<(), Error> {
        self.expect(Tag::KwWhile)?;
        let target = self.image.mark() as i32;
        self.condition()?;
        self.expect(Tag::KwDo)?;

        self.image.emit_op(OpCode::Jfalse);
        let hole = self.image.hole();

        self.expect(Tag::KwBegin)?;
        self.statements()?;
        self.expect(Tag::KwEnd)?;
        self.expect(Tag::Semicolon)?;

        self.image.emit_op(OpCode::Jmp);
        self.image.emit_int(target);

        let after = self.image.mark() as i32;
        self.image.patch_int(hole, after);
        Ok(())
    }

    /// `repeat <statements> until <cond>` — loops while the condition is
    /// still false.
    fn repeat_stat(&mut self) -> Result<(), Error> {
        self.expect(Tag::KwRepeat)?;
        let target = self.image.mark() as i32;
        self.statements()?;
        self.expect(Tag::KwUntil)?;
        self.condition()?;

        self.image.emit_op(OpCode::Jfalse);
        self.image.emit_int(target);
        Ok(())
    }

    /// `for <var> := <init> to <bound> do begin <statements> end ;`
    ///
    /// The bound must be an integer literal; the loop re-tests
    /// `var <= bound` at the top and increments by one at the bottom.
    fn for_stat(&mut self) -> Result<(), Error> {
        self.expect(Tag::KwFor)?;
        let var_name = self.current.text.clone();
        self.current.tag = Tag::DeclVar;
        self.assignment_stat()?;

        let target = self.image.mark() as i32;
        let address = match self.symbols.lookup(&var_name) {
            Some(symbol) => symbol.address,
            None => return Err(Error::Undeclared(var_name)),
        };

        self.expect(Tag::KwTo)?;
        if self.current.tag != Tag::IntLit {
            return Err(self.unexpected(Tag::IntLit));
        }
        let bound = self.parse_int()?;
        self.image.emit_op(OpCode::Push);
        self.image.emit_int(address);
        self.image.emit_op(OpCode::Pushi);
        self.image.emit_int(bound);
        self.image.emit_op(OpCode::Leq);
        self.expect(Tag::IntLit)?;
        self.expect(Tag::KwDo)?;

        self.image.emit_op(OpCode::Jfalse);
        let hole = self.image.hole();

        self.expect(Tag::KwBegin)?;
        self.statements()?;
        self.expect(Tag::KwEnd)?;
        self.expect(Tag::Semicolon)?;

        // var := var + 1
        self.image.emit_op(OpCode::Push);
        self.image.emit_int(address);
        self.image.emit_op(OpCode::Pushi);
        self.image.emit_int(1);
        self.image.emit_op(OpCode::Add);
        self.image.emit_op(OpCode::Pop);
        self.image.emit_int(address);

        self.image.emit_op(OpCode::Jmp);
        self.image.emit_int(target);

        let after = self.image.mark() as i32;
        self.image.patch_int(hole, after);
        Ok(())
    }

    /// `case ( <expr> ) of [ <tag> : <statements> ; ]+ end ;`
    ///
    /// The selector is translated once; between arms the selector variable
    /// is pushed again because each equality test consumes it.
    fn case_stat(&mut self) -> Result<(), Error> {
        self.expect(Tag::KwCase)?;
        self.expect(Tag::LParen)?;
        let selector = self.current.text.clone();
        let selector_type = self.expression()?;
        if selector_type == TypeKind::Real {
            return Err(Error::RealCaseSelector);
        }
        self.expect(Tag::RParen)?;
        self.expect(Tag::KwOf)?;

        let mut end_holes = Vec::new();
        while matches!(self.current.tag, Tag::IntLit | Tag::CharLit | Tag::BoolLit) {
            let arm_type = self.expression()?;
            self.emit_binary(Tag::Equal, selector_type, arm_type)?;
            self.expect(Tag::Colon)?;

            self.image.emit_op(OpCode::Jfalse);
            let skip_arm = self.image.hole();

            self.statements()?;

            self.image.emit_op(OpCode::Jmp);
            end_holes.push(self.image.hole());

            let after_arm = self.image.mark() as i32;
            self.image.patch_int(skip_arm, after_arm);

            if self.current.tag != Tag::KwEnd {
                if let Some(symbol) = self.symbols.lookup(&selector) {
                    self.image.emit_op(OpCode::Push);
                    self.image.emit_int(symbol.address);
                }
            }
        }

        self.expect(Tag::KwEnd)?;
        self.expect(Tag::Semicolon)?;

        let after = self.image.mark() as i32;
        for hole in end_holes {
            self.image.patch_int(hole, after);
        }
        Ok(())
    }

    /// `writeln ( <arg> {, <arg>} )` — each argument is a variable load, an
    /// array element load or a literal push, followed by the print
    /// instruction for its type; one newline closes the list.
    fn write_stat(&mut self) -> Result<(), Error> {
        self.expect(Tag::KwWriteln)?;
        self.expect(Tag::LParen)?;

        loop {
            let typ = match self.current.tag {
                Tag::Ident => {
                    let symbol = match self.symbols.lookup(&self.current.text) {
                        Some(symbol) => symbol.clone(),
                        None => return Err(Error::Undeclared(self.current.text.clone())),
                    };
                    if symbol.typ == TypeKind::Array {
                        self.current.tag = Tag::DeclArray;
                        self.array_access(&symbol)?;
                        self.image.emit_op(OpCode::Get);
                        symbol.value_type
                    } else {
                        self.current.tag = Tag::DeclVar;
                        self.image.emit_op(OpCode::Push);
                        self.image.emit_int(symbol.address);
                        self.expect(Tag::DeclVar)?;
                        symbol.typ
                    }
                }
                Tag::IntLit => {
                    let value = self.parse_int()?;
                    self.image.emit_op(OpCode::Pushi);
                    self.image.emit_int(value);
                    self.advance();
                    TypeKind::Integer
                }
                Tag::RealLit => {
                    let value = self.parse_real()?;
                    self.image.emit_op(OpCode::Pushf);
                    self.image.emit_real(value);
                    self.advance();
                    TypeKind::Real
                }
                Tag::BoolLit => {
                    let value = if self.current.text == "true" { 1 } else { 0 };
                    self.image.emit_op(OpCode::Pushi);
                    self.image.emit_int(value);
                    self.advance();
                    TypeKind::Boolean
                }
                Tag::CharLit => {
                    let value = self.char_ord()?;
                    self.image.emit_op(OpCode::Pushi);
                    self.image.emit_int(value);
                    self.advance();
                    TypeKind::Char
                }
                _ => return Err(Error::ExpectedFactor((&self.current).into())),
            };

            match typ {
                TypeKind::Integer => self.image.emit_op(OpCode::PrintInt),
                TypeKind::Char => self.image.emit_op(OpCode::PrintChar),
                TypeKind::Real => self.image.emit_op(OpCode::PrintReal),
                TypeKind::Boolean => self.image.emit_op(OpCode::PrintBool),
                other => return Err(Error::Unprintable(other)),
            }

            match self.current.tag {
                Tag::Comma => self.expect(Tag::Comma)?,
                Tag::RParen => {
                    self.expect(Tag::RParen)?;
                    self.image.emit_op(OpCode::PrintNewline);
                    return Ok(());
                }
                _ => return Err(Error::WritelnSeparator((&self.current).into())),
            }
        }
    }
}

// ------------------------------------------------------------------------
// Array element addressing
// ------------------------------------------------------------------------

impl<I: Iterator<Item = Token>> Translator<I> {
    /// `<arr> [ <index> ]` — leaves the element's data address on the
    /// stack: push the index value, subtract the low bound, scale by the
    /// element size, add the array base. A literal index is range-checked
    /// here at translate time; a variable index is not checked at all.
    fn array_access(&mut self, symbol: &Symbol) -> Result<(), Error> {
        self.expect(Tag::DeclArray)?;
        self.expect(Tag::LBracket)?;

        let index_var = if self.current.tag == Tag::Ident {
            self.symbols.lookup(&self.current.text).cloned()
        } else {
            None
        };

        let index_type = if let Some(var) = index_var {
            if var.typ != symbol.index_type {
                return Err(Error::IndexTypeMismatch {
                    expected: symbol.index_type,
                    found: var.typ,
                });
            }
            self.current.tag = Tag::DeclVar;
            self.image.emit_op(OpCode::Push);
            self.image.emit_int(var.address);
            self.expect(Tag::DeclVar)?;
            self.expect(Tag::RBracket)?;
            var.typ
        } else {
            let literal = match self.current.tag {
                Tag::IntLit => Some(self.parse_int()?),
                Tag::CharLit => Some(self.char_ord()?),
                _ => None,
            };
            let typ = self.expression()?;
            if typ != symbol.index_type {
                return Err(Error::IndexTypeMismatch {
                    expected: symbol.index_type,
                    found: typ,
                });
            }
            self.expect(Tag::RBracket)?;

            if let Some(index) = literal {
                if index < symbol.low || index > symbol.high {
                    return Err(Error::IndexOutOfRange {
                        index,
                        low: symbol.low,
                        high: symbol.high,
                    });
                }
            }
            typ
        };

        self.image.emit_op(OpCode::Pushi);
        self.image.emit_int(symbol.low);
        self.image.emit_op(OpCode::Xchg);
        self.image.emit_op(OpCode::Sub);
        if index_type == TypeKind::Integer {
            self.image.emit_op(OpCode::Pushi);
            self.image.emit_int(4);
            self.image.emit_op(OpCode::Mult);
        }
        self.image.emit_op(OpCode::Pushi);
        self.image.emit_int(symbol.address);
        self.image.emit_op(OpCode::Add);
        Ok(())
    }
}

// ------------------------------------------------------------------------
// Expressions
// ------------------------------------------------------------------------

fn is_relop(tag: Tag) -> bool {
    matches!(
        tag,
        Tag::Equal
            | Tag::NotEqual
            | Tag::Less
            | Tag::Greater
            | Tag::LessEqual
            | Tag::GreaterEqual
    )
}

impl<I: Iterator<Item = Token>> Translator<I> {
    /// `C -> E [ relop E ]` — comparisons always produce Boolean.
    fn condition(&mut self) -> Result<TypeKind, Error> {
        let lhs = self.expression()?;
        if is_relop(self.current.tag) {
            let op = self.current.tag;
            self.advance();
            let rhs = self.expression()?;
            return self.emit_binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    /// `E -> T { (+|-) T }`
    fn expression(&mut self) -> Result<TypeKind, Error> {
        let mut lhs = self.term()?;
        while matches!(self.current.tag, Tag::Plus | Tag::Minus) {
            let op = self.current.tag;
            self.advance();
            let rhs = self.term()?;
            lhs = self.emit_binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    /// `T -> F { (*|/|div) F }`
    fn term(&mut self) -> Result<TypeKind, Error> {
        let mut lhs = self.factor()?;
        while matches!(self.current.tag, Tag::Star | Tag::Slash | Tag::KwDiv) {
            let op = self.current.tag;
            self.advance();
            let rhs = self.factor()?;
            lhs = self.emit_binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    /// `F -> id | lit | ( E ) | not F`
    fn factor(&mut self) -> Result<TypeKind, Error> {
        match self.current.tag {
            Tag::Ident => {
                let symbol = match self.symbols.lookup(&self.current.text) {
                    Some(symbol) => symbol.clone(),
                    None => return Err(Error::Undeclared(self.current.text.clone())),
                };
                match symbol.kind {
                    Tag::DeclVar => {
                        self.current.tag = Tag::DeclVar;
                        self.image.emit_op(OpCode::Push);
                        self.image.emit_int(symbol.address);
                        self.expect(Tag::DeclVar)?;
                        Ok(symbol.typ)
                    }
                    Tag::DeclArray => {
                        self.current.tag = Tag::DeclArray;
                        self.array_access(&symbol)?;
                        self.image.emit_op(OpCode::Get);
                        Ok(symbol.value_type)
                    }
                    _ => Err(Error::NotAValue(symbol.name)),
                }
            }
            Tag::IntLit => {
                let value = self.parse_int()?;
                self.image.emit_op(OpCode::Pushi);
                self.image.emit_int(value);
                self.advance();
                Ok(TypeKind::Integer)
            }
            Tag::RealLit => {
                let value = self.parse_real()?;
                self.image.emit_op(OpCode::Pushf);
                self.image.emit_real(value);
                self.advance();
                Ok(TypeKind::Real)
            }
            Tag::BoolLit => {
                let value = if self.current.text == "true" { 1 } else { 0 };
                self.image.emit_op(OpCode::Pushi);
                self.image.emit_int(value);
                self.advance();
                Ok(TypeKind::Boolean)
            }
            Tag::CharLit => {
                let value = self.char_ord()?;
                self.image.emit_op(OpCode::Pushi);
                self.image.emit_int(value);
                self.advance();
                Ok(TypeKind::Char)
            }
            Tag::StrLit => {
                // One push per character; the instruction set has no
                // dedicated string representation.
                let text = self.current.text.clone();
                for c in text.chars() {
                    self.image.emit_op(OpCode::Pushi);
                    self.image.emit_int(c as i32);
                }
                self.advance();
                Ok(TypeKind::String)
            }
            Tag::KwNot => {
                // No logical-not opcode exists; the operand's code stands.
                self.expect(Tag::KwNot)?;
                self.factor()
            }
            Tag::LParen => {
                self.expect(Tag::LParen)?;
                let typ = self.expression()?;
                self.expect(Tag::RParen)?;
                Ok(typ)
            }
            _ => Err(Error::ExpectedFactor((&self.current).into())),
        }
    }
}

// ------------------------------------------------------------------------
// Operator emission and numeric widening
// ------------------------------------------------------------------------

impl<I: Iterator<Item = Token>> Translator<I> {
    /// Emit the instruction(s) for a binary operator applied to operand
    /// types `lhs` and `rhs`, widening an integer side to real when the
    /// kinds are mixed, and return the result type. Operand combinations
    /// outside the table are a fatal type error.
    fn emit_binary(&mut self, op: Tag, lhs: TypeKind, rhs: TypeKind) -> Result<TypeKind, Error> {
        use TypeKind::{Integer, Real};

        match op {
            Tag::Plus | Tag::Minus | Tag::Star => {
                let (int_op, real_op) = match op {
                    Tag::Plus => (OpCode::Add, OpCode::Fadd),
                    Tag::Minus => (OpCode::Sub, OpCode::Fsub),
                    _ => (OpCode::Mult, OpCode::Fmult),
                };
                match (lhs, rhs) {
                    (Integer, Integer) => {
                        self.image.emit_op(int_op);
                        Ok(Integer)
                    }
                    (Integer, Real) => {
                        self.image.emit_op(OpCode::Xchg);
                        self.image.emit_op(OpCode::Cvr);
                        self.image.emit_op(real_op);
                        Ok(Real)
                    }
                    (Real, Integer) => {
                        self.image.emit_op(OpCode::Cvr);
                        self.image.emit_op(real_op);
                        Ok(Real)
                    }
                    (Real, Real) => {
                        self.image.emit_op(real_op);
                        Ok(Real)
                    }
                    _ => Err(Error::InvalidOperands { op, lhs, rhs }),
                }
            }

            // True division always divides reals, widening both sides.
            Tag::Slash => {
                match (lhs, rhs) {
                    (Integer, Integer) => {
                        self.image.emit_op(OpCode::Cvr);
                        self.image.emit_op(OpCode::Xchg);
                        self.image.emit_op(OpCode::Cvr);
                        self.image.emit_op(OpCode::Xchg);
                    }
                    (Integer, Real) => {
                        self.image.emit_op(OpCode::Xchg);
                        self.image.emit_op(OpCode::Cvr);
                    }
                    (Real, Integer) => {
                        self.image.emit_op(OpCode::Cvr);
                    }
                    (Real, Real) => {}
                    _ => return Err(Error::InvalidOperands { op, lhs, rhs }),
                }
                self.image.emit_op(OpCode::Fdiv);
                Ok(Real)
            }

            Tag::KwDiv => match (lhs, rhs) {
                (Integer, Integer) => {
                    self.image.emit_op(OpCode::Div);
                    Ok(Integer)
                }
                _ => Err(Error::InvalidOperands { op, lhs, rhs }),
            },

            Tag::Less => self.emit_compare(OpCode::Lss, op, lhs, rhs),
            Tag::Greater => self.emit_compare(OpCode::Gtr, op, lhs, rhs),
            Tag::LessEqual => self.emit_compare(OpCode::Leq, op, lhs, rhs),
            Tag::GreaterEqual => self.emit_compare(OpCode::Geq, op, lhs, rhs),
            Tag::Equal => self.emit_compare(OpCode::Eql, op, lhs, rhs),
            Tag::NotEqual => self.emit_compare(OpCode::Neql, op, lhs, rhs),

            _ => Err(Error::InvalidOperands { op, lhs, rhs }),
        }
    }

    /// Comparison of equal kinds compares directly; mixed numeric kinds
    /// widen the integer side first. The result is always Boolean.
    fn emit_compare(
        &mut self,
        pred: OpCode,
        op: Tag,
        lhs: TypeKind,
        rhs: TypeKind,
    ) -> Result<TypeKind, Error> {
        use TypeKind::{Integer, Real};

        if lhs == rhs {
            self.image.emit_op(pred);
        } else if lhs == Integer && rhs == Real {
            self.image.emit_op(OpCode::Xchg);
            self.image.emit_op(OpCode::Cvr);
            self.image.emit_op(pred);
        } else if lhs == Real && rhs == Integer {
            self.image.emit_op(OpCode::Cvr);
            self.image.emit_op(pred);
        } else {
            return Err(Error::InvalidOperands { op, lhs, rhs });
        }
        Ok(TypeKind::Boolean)
    }
}

// ------------------------------------------------------------------------
// Final consistency check
// ------------------------------------------------------------------------

impl<I: Iterator<Item = Token>> Translator<I> {
    /// A jump hole that survived the whole translation would point nowhere
    /// valid at run time, so it is rejected here instead.
    fn check_unresolved(&self) -> Result<(), Error> {
        for (name, holes) in &self.label_holes {
            if !holes.is_empty() {
                return Err(Error::UnresolvedLabel(name.clone()));
            }
        }
        Ok(())
    }
}
