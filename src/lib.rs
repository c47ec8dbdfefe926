mod error;
mod image;
mod opcode;
mod symbol;
mod token;
mod translator;
mod types;

pub use error::{Error, ErrorKind, TokenInfo};
pub use image::Image;
pub use opcode::OpCode;
pub use symbol::{Symbol, SymbolTable};
pub use token::{Pos, Tag, Token};
pub use translator::Translator;
pub use types::TypeKind;
