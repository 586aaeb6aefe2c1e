//! Error kinds. `ErrorKind` is what a single instruction can fail with, and doubles as the
//! status code recorded in the register file when execution stops. The loader and the assembler
//! live outside the execution core and have their own error types.

use std::fmt::{Display, Formatter};

use num_enum::IntoPrimitive;
use thiserror::Error;

use crate::address::AddressType;

/// Status code reported for a clean halt.
pub const HALT_CODE: u8 = 0xFF;
/// Status code reported while no error has occurred.
pub const NO_ERROR_CODE: u8 = 0x00;

/// Everything that can stop the machine abnormally. The discriminant is the one byte status
/// code shown in diagnostics.
#[derive(Error, IntoPrimitive, Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u8)]
pub enum ErrorKind {
  #[error("unrecognized register")]
  RegisterUnrecognized     = 0x01,
  #[error("register not allowed as a destination")]
  RegisterNotAllowed       = 0x02,
  #[error("unrecognized opcode")]
  UnrecognizedOpcode       = 0x03,
  #[error("comparison flag consumed before a compare")]
  ComparisonNotInitialized = 0x04,
  #[error("stack overflow")]
  StackOverflow            = 0x05,
  #[error("stack underflow")]
  StackUnderflow           = 0x06,
  #[error("memory access out of bounds")]
  MemoryAccessOutOfBounds  = 0x07,
  #[error("invalid address multiplier")]
  InvalidAddressMultiplier = 0x08,
  #[error("execution target outside the code block")]
  ExecuteOutOfCodeBlock    = 0x09,
  #[error("decrement of zero")]
  DecrementZero            = 0x0A,
  #[error("arithmetic overflow")]
  ArithmeticOverflow       = 0x0B,
  #[error("arithmetic underflow")]
  ArithmeticUnderflow      = 0x0C,
  #[error("division by zero")]
  DivisionByZero           = 0x0D,
}

impl ErrorKind {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }
}

/// The status register. Execution continues only while this is `NoError`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Status {
  NoError,
  Halt,
  Error(ErrorKind)
}

impl Status {
  pub fn code(&self) -> u8 {
    match self {
      Status::NoError     => NO_ERROR_CODE,
      Status::Halt        => HALT_CODE,
      Status::Error(kind) => kind.code()
    }
  }

  pub fn is_terminal(&self) -> bool {
    *self != Status::NoError
  }
}

impl Default for Status {
  fn default() -> Self {
    Status::NoError
  }
}

impl Display for Status {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Status::NoError     => write!(f, "0x{:02X} (no error)", self.code()),
      Status::Halt        => write!(f, "0x{:02X} (halt)", self.code()),
      Status::Error(kind) => write!(f, "0x{:02X} ({})", self.code(), kind)
    }
  }
}

/// Failures while copying a binary image into memory.
#[derive(Error, Debug)]
pub enum LoadError {
  #[error("image is {0} bytes, too short for the 2 byte instruction count")]
  MissingHeader(usize),
  #[error("image declares {expected} instructions but only holds {found} bytes of them")]
  Truncated { expected: u16, found: usize },
  #[error("{len} bytes do not fit in memory at 0x{base:04X}")]
  DoesNotFit { base: AddressType, len: usize },
  #[error("could not read program image: {0}")]
  Io(#[from] std::io::Error),
}

/// Failures while assembling source text. Line numbers are 1-based.
#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum AssemblyError {
  #[error("line {line}: syntax error near `{text}`")]
  Syntax { line: usize, text: String },
  #[error("line {line}: `{name}` is not an operation")]
  NotAnOperation { line: usize, name: String },
  #[error("line {line}: {mnemonic} requires {expected} operands but was given {found}")]
  WrongArity { line: usize, mnemonic: String, expected: usize, found: usize },
  #[error("line {line}: `{name}` is not a {expected} register")]
  BadRegister { line: usize, name: String, expected: &'static str },
  #[error("line {line}: `{text}` is not a valid {expected}")]
  BadNumber { line: usize, text: String, expected: &'static str },
  #[error("line {line}: label `{name}` is defined twice")]
  DuplicateLabel { line: usize, name: String },
  #[error("line {line}: label `{name}` names an address that already has a label")]
  AliasedLabel { line: usize, name: String },
  #[error("line {line}: label `{name}` is never defined")]
  UndefinedLabel { line: usize, name: String },
  #[error("line {line}: program does not fit in the code block")]
  CodeBlockFull { line: usize },
}
