//! Program images. An image is a 2 byte little-endian instruction count followed by that many
//! 6 byte instruction records. Loading copies the records verbatim to a base address; nothing
//! about the records is validated until they execute.

use std::path::Path;

use log::debug;

use crate::address::AddressType;
use crate::bytecode::{encode, Instruction, INSTRUCTION_SIZE};
use crate::error::LoadError;
use crate::memory::Memory;

/// Size of the instruction count header.
pub const HEADER_SIZE: usize = 2;

/// Builds an image holding `instructions`.
pub fn build_image(instructions: &[Instruction]) -> Vec<u8> {
  let mut image = Vec::with_capacity(HEADER_SIZE + instructions.len() * INSTRUCTION_SIZE);
  image.extend_from_slice(&(instructions.len() as u16).to_le_bytes());
  for instruction in instructions {
    image.extend_from_slice(&encode(instruction));
  }
  image
}

/**
  Returns the instruction records of `image`, checking the header and length. Bytes past the
  last declared record are ignored.
*/
pub fn image_records(image: &[u8]) -> Result<&[u8], LoadError> {
  if image.len() < HEADER_SIZE {
    return Err(LoadError::MissingHeader(image.len()));
  }
  let count = u16::from_le_bytes([image[0], image[1]]);
  let body  = &image[HEADER_SIZE..];
  let size  = count as usize * INSTRUCTION_SIZE;
  if body.len() < size {
    return Err(LoadError::Truncated { expected: count, found: body.len() });
  }
  Ok(&body[..size])
}

/// Copies the records of `image` to `base`. Returns the number of instructions loaded.
pub fn load_image(memory: &mut Memory, base: AddressType, image: &[u8])
  -> Result<u16, LoadError>
{
  let records = image_records(image)?;
  memory.write_block(base, records)?;
  let count = (records.len() / INSTRUCTION_SIZE) as u16;
  debug!("loaded {} instructions at 0x{:04X}", count, base);
  Ok(count)
}

pub fn read_image<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, LoadError> {
  Ok(std::fs::read(path)?)
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::address::MAX_ADDRESS;

  #[test]
  fn image_layout(){
    let image = build_image(&[Instruction::SetInt { reg: 3, value: 5 }, Instruction::Halt]);
    assert_eq!(image.len(), 2 + 12);
    assert_eq!(&image[..2], &[0x02, 0x00]);
    assert_eq!(&image[2..8], &[0x0B, 0x03, 0x05, 0x00, 0x00, 0x00]);
    assert_eq!(image[8], 0x01);
  }

  #[test]
  fn loads_at_base(){
    let mut memory = Memory::new();
    let image = build_image(&[Instruction::Noop, Instruction::Halt]);
    assert_eq!(load_image(&mut memory, 0x0010, &image).unwrap(), 2);
    assert_eq!(memory.read_u8(0x0010), 0x00);
    assert_eq!(memory.read_u8(0x0016), 0x01);
  }

  #[test]
  fn trailing_bytes_ignored(){
    let mut memory = Memory::new();
    let mut image = build_image(&[Instruction::Halt]);
    image.extend_from_slice(&[0xAA; 5]);
    assert_eq!(load_image(&mut memory, 0, &image).unwrap(), 1);
    assert_eq!(memory.read_u8(6), 0x00);
  }

  #[test]
  fn header_errors(){
    let mut memory = Memory::new();
    assert!(matches!(load_image(&mut memory, 0, &[]), Err(LoadError::MissingHeader(0))));
    assert!(matches!(load_image(&mut memory, 0, &[0x01]), Err(LoadError::MissingHeader(1))));
    assert!(matches!(
      load_image(&mut memory, 0, &[0x02, 0x00, 0x01, 0, 0, 0, 0, 0]),
      Err(LoadError::Truncated { expected: 2, found: 6 })
    ));
  }

  #[test]
  fn empty_program(){
    let mut memory = Memory::new();
    assert_eq!(load_image(&mut memory, 0, &[0x00, 0x00]).unwrap(), 0);
  }

  #[test]
  fn must_fit_in_memory(){
    let mut memory = Memory::new();
    let image = build_image(&[Instruction::Halt]);
    assert!(matches!(
      load_image(&mut memory, MAX_ADDRESS - 2, &image),
      Err(LoadError::DoesNotFit { len: 6, .. })
    ));
  }

  #[test]
  fn missing_file(){
    assert!(matches!(read_image("/definitely/not/a/program.b"), Err(LoadError::Io(_))));
  }
}
