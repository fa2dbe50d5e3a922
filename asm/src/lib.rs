pub mod assembler;
pub mod dump;
pub mod error;
pub mod expr;
pub mod listing;
pub mod literal;
pub mod location;
pub mod msg;
pub mod object;
pub mod parser;
pub mod pass1;
pub mod pass2;
pub mod stmt;
pub mod symbol;

pub use assembler::{assemble, Assembler, Output};
