//! System memory: 64K bytes, each location holding a single byte.
//!
//! Word and float accessors read or write the 2 or 4 bytes starting at an address in
//! little-endian order. This module enforces no region policy; which window an access must fall
//! in depends on the instruction and is checked by the machine. Multi-byte accesses that run past
//! `0xFFFF` wrap to `0x0000`.

use crate::address::{AddressType, MEMORY_SIZE};
use crate::error::LoadError;

pub struct Memory {
  bytes: Box<[u8]>
}

impl Memory {

  pub fn new() -> Memory {
    Memory {
      bytes: vec![0u8; MEMORY_SIZE].into_boxed_slice()
    }
  }

  // region Typed accessors

  pub fn read_u8(&self, address: AddressType) -> u8 {
    self.bytes[address as usize]
  }

  pub fn write_u8(&mut self, address: AddressType, value: u8) {
    self.bytes[address as usize] = value;
  }

  pub fn read_u16(&self, address: AddressType) -> u16 {
    u16::from_le_bytes(self.read_array::<2>(address))
  }

  pub fn write_u16(&mut self, address: AddressType, value: u16) {
    self.write_array(address, value.to_le_bytes());
  }

  pub fn read_f32(&self, address: AddressType) -> f32 {
    f32::from_le_bytes(self.read_array::<4>(address))
  }

  pub fn write_f32(&mut self, address: AddressType, value: f32) {
    self.write_array(address, value.to_le_bytes());
  }

  fn read_array<const N: usize>(&self, address: AddressType) -> [u8; N] {
    let mut out = [0u8; N];
    for (i, byte) in out.iter_mut().enumerate() {
      *byte = self.read_u8(address.wrapping_add(i as u16));
    }
    out
  }

  fn write_array<const N: usize>(&mut self, address: AddressType, bytes: [u8; N]) {
    for (i, byte) in bytes.iter().enumerate() {
      self.write_u8(address.wrapping_add(i as u16), *byte);
    }
  }

  // endregion

  // region Block accessors

  /// Copies `len` bytes starting at `address`, wrapping at the top of memory.
  pub fn read_block(&self, address: AddressType, len: usize) -> Vec<u8> {
    (0..len)
      .map(|i| self.read_u8(address.wrapping_add(i as u16)))
      .collect()
  }

  /// Copies `data` verbatim to `address`. Unlike the typed accessors this does not wrap: the
  /// whole block must fit below the top of memory.
  pub fn write_block(&mut self, address: AddressType, data: &[u8]) -> Result<(), LoadError> {
    let start = address as usize;
    let end   = start + data.len();
    if end > MEMORY_SIZE {
      return Err(LoadError::DoesNotFit { base: address, len: data.len() });
    }
    self.bytes[start..end].copy_from_slice(data);
    Ok(())
  }

  // endregion
}

impl Default for Memory {
  fn default() -> Self {
    Memory::new()
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::address::{MAX_ADDRESS, RW_MIN};

  #[test]
  fn starts_zeroed(){
    let memory = Memory::new();
    assert_eq!(memory.read_u8(0), 0);
    assert_eq!(memory.read_u16(RW_MIN), 0);
    assert_eq!(memory.read_u8(MAX_ADDRESS), 0);
  }

  #[test]
  fn words_are_little_endian(){
    let mut memory = Memory::new();
    memory.write_u16(RW_MIN, 0xBEEF);
    assert_eq!(memory.read_u8(RW_MIN), 0xEF);
    assert_eq!(memory.read_u8(RW_MIN + 1), 0xBE);
    assert_eq!(memory.read_u16(RW_MIN), 0xBEEF);
  }

  #[test]
  fn floats_reinterpret_bytes(){
    let mut memory = Memory::new();
    memory.write_f32(RW_MIN, 1.5);
    assert_eq!(memory.read_block(RW_MIN, 4), 1.5f32.to_le_bytes().to_vec());
    assert_eq!(memory.read_f32(RW_MIN), 1.5);
  }

  #[test]
  fn word_access_wraps_at_top(){
    let mut memory = Memory::new();
    memory.write_u16(MAX_ADDRESS, 0x1234);
    assert_eq!(memory.read_u8(MAX_ADDRESS), 0x34);
    assert_eq!(memory.read_u8(0), 0x12);
    assert_eq!(memory.read_u16(MAX_ADDRESS), 0x1234);
  }

  #[test]
  fn block_must_fit(){
    let mut memory = Memory::new();
    assert!(memory.write_block(MAX_ADDRESS - 1, &[1, 2]).is_ok());
    assert!(memory.write_block(MAX_ADDRESS - 1, &[1, 2, 3]).is_err());
    assert_eq!(memory.read_block(MAX_ADDRESS - 1, 2), vec![1, 2]);
  }
}
