//! The memory map. Addresses are 16 bits and address bytes. The space is split into three fixed
//! regions:
//!
//! ```text
//!   0x0000          RW_MIN                               RW_MAX         0xFFFF
//!     [ code (read only) | read-write block                 ] [ stack --> ]
//! ```
//!
//! The stack pointer starts at `RW_MAX` and grows toward higher addresses.

use std::fmt::{Display, Formatter};

pub type AddressType = u16;

/// Size of the whole address space in bytes.
pub const MEMORY_SIZE: usize = 0x1_0000;
/// Highest addressable byte.
pub const MAX_ADDRESS: AddressType = 0xFFFF;
/// First byte of the read-write block. Everything below is code.
pub const RW_MIN: AddressType = 0x4000;
/// Last byte of the read-write block. Everything above is stack.
pub const RW_MAX: AddressType = 0xEFFF;
/// Initial value of `sp` and `bp`.
pub const STACK_BASE: AddressType = RW_MAX;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Region {
  Code,
  ReadWrite,
  Stack
}

impl Region {
  /// The region a single byte address falls in.
  pub fn of(address: AddressType) -> Region {
    match address {
      a if a < RW_MIN  => Region::Code,
      a if a <= RW_MAX => Region::ReadWrite,
      _                => Region::Stack
    }
  }
}

impl Display for Region {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Region::Code      => write!(f, "code"),
      Region::ReadWrite => write!(f, "read-write"),
      Region::Stack     => write!(f, "stack")
    }
  }
}

/// Call and jump targets must lie in the code block.
pub fn is_code_address(address: AddressType) -> bool {
  Region::of(address) == Region::Code
}

/**
  Whether a `size` byte load or store at `address` lies in the window general memory instructions
  may touch, `[RW_MIN, RW_MAX - size + 1)`. The last byte of the read-write block is shared with
  the initial stack pointer and is never reachable this way.
*/
pub fn in_read_write_window(address: AddressType, size: u16) -> bool {
  let end = address as u32 + size as u32;
  address >= RW_MIN && end <= RW_MAX as u32
}
