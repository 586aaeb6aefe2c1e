//! A small register-based 16 bit virtual CPU: fixed 6 byte instructions, 64K bytes of memory in
//! three fixed regions, and a fetch-decode-execute loop, plus an assembler and a program loader.

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod address;
pub mod bytecode;
pub mod diagnostics;
pub mod error;
pub mod loader;
pub mod machine;
pub mod memory;
pub mod registers;
pub mod symboltable;

pub use crate::bytecode::{assemble, Assembler, Instruction, Opcode, Program};
pub use crate::diagnostics::Diagnostics;
pub use crate::error::{AssemblyError, ErrorKind, LoadError, Status};
pub use crate::machine::{Machine, State};
