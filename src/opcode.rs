use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Instruction set of the target stack machine. The ordinal of each variant
/// is the opcode byte in the emitted image, so the order here is a
/// compatibility contract with the executor and must never change.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Default,
    FromPrimitive,
    IntoPrimitive,
    Display,
)]
#[repr(u8)]
pub enum OpCode {
    #[default]
    Pushi, // push immediate i32
    Push,  // push word at address
    Pop,   // pop into address
    Pushf, // push immediate f32
    Jmp,
    Jfalse,
    Jtrue,
    Cvr, // int -> real on top of stack
    Cvi, // real -> int on top of stack
    Dup,
    Xchg,
    Remove,
    Add,
    Sub,
    Mult,
    Div,
    Neg,
    Or,
    And,
    Fadd,
    Fsub,
    Fmult,
    Fdiv,
    Fneg,
    Eql,
    Neql,
    Geq,
    Leq,
    Gtr,
    Lss,
    Fgtr,
    Flss,
    Halt,
    PrintInt,
    PrintChar,
    PrintBool,
    PrintReal,
    PrintNewline,
    Get, // indirect load: pop address, push word
    Put, // indirect store: pop value, pop address, store
}

#[test]
fn ordinals_are_stable() {
    assert_eq!(u8::from(OpCode::Pushi), 0);
    assert_eq!(u8::from(OpCode::Jmp), 4);
    assert_eq!(u8::from(OpCode::Add), 12);
    assert_eq!(u8::from(OpCode::Halt), 32);
    assert_eq!(u8::from(OpCode::Put), 39);
    assert_eq!(OpCode::from_primitive(39), OpCode::Put);
}
