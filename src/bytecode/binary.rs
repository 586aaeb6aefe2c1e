/*!
  This module is responsible for the encoding and decoding of binary instructions.

  Byte offsets of each field follow the format table in the module above. If you change an
  offset here you must change it in both `read_operands` and `write_operands`.
*/
use std::convert::TryFrom;

use super::{Format, Instruction, Opcode, Operands};
use crate::error::ErrorKind;

/// Size in bytes of every instruction.
pub const INSTRUCTION_SIZE: usize = 6;

pub type EncodedInstruction = [u8; INSTRUCTION_SIZE];

/**
  Decodes a single instruction. The opcode byte is read first and selects the operand format;
  an unknown opcode is reported as `ErrorKind::UnrecognizedOpcode`. Register ids are not
  validated here.
*/
pub fn decode(bytes: &EncodedInstruction) -> Result<Instruction, ErrorKind> {
  let opcode = Opcode::try_from(bytes[0]).map_err(|_| ErrorKind::UnrecognizedOpcode)?;
  let operands = read_operands(opcode.format(), bytes);
  // `operands` has `opcode`'s format by construction.
  Instruction::from_parts(opcode, operands).ok_or(ErrorKind::UnrecognizedOpcode)
}

/// Encodes an instruction into its 6 byte record. Unused bytes are zero.
pub fn encode(instruction: &Instruction) -> EncodedInstruction {
  let mut bytes = [0u8; INSTRUCTION_SIZE];
  bytes[0] = instruction.opcode().code();
  write_operands(&instruction.operands(), &mut bytes);
  bytes
}

fn short_at(bytes: &EncodedInstruction, offset: usize) -> u16 {
  u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn float_at(bytes: &EncodedInstruction, offset: usize) -> f32 {
  f32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

/// Pulls the operand fields out of an instruction record according to `format`.
pub fn read_operands(format: Format, bytes: &EncodedInstruction) -> Operands {
  match format {
    // [OpCode:8][Reserved:40]
    Format::None => Operands::None,

    // [OpCode:8][Reg:8][Reserved:32]
    Format::Register => Operands::Register(bytes[1]),

    // [OpCode:8][Address:16][Reserved:24]
    Format::Address => Operands::Address(short_at(bytes, 1)),

    // [OpCode:8][Reg:8][Value:16][Reserved:16]
    Format::RegisterValue => Operands::RegisterValue(bytes[1], short_at(bytes, 2)),

    // [OpCode:8][Reg:8][Reg:8][Reserved:24]
    Format::RegisterPair => Operands::RegisterPair(bytes[1], bytes[2]),

    // [OpCode:8][Reg:8][Reg:8][Address:16][Reserved:8]
    Format::RegisterPairAddress =>
      Operands::RegisterPairAddress(bytes[1], bytes[2], short_at(bytes, 3)),

    // [OpCode:8][Reg:8][Float:32]
    Format::RegisterFloat => Operands::RegisterFloat(bytes[1], float_at(bytes, 2)),

    // [OpCode:8][Reg:8][Reg:8][Reg:8][Reg:8][Reserved:8]
    Format::RegisterQuad => Operands::RegisterQuad([bytes[1], bytes[2], bytes[3], bytes[4]]),
  }
}

/// Writes operand fields into bytes 1-5 of an instruction record.
pub fn write_operands(operands: &Operands, bytes: &mut EncodedInstruction) {
  match *operands {
    Operands::None => {}

    Operands::Register(reg) => {
      bytes[1] = reg;
    }

    Operands::Address(address) => {
      bytes[1..3].copy_from_slice(&address.to_le_bytes());
    }

    Operands::RegisterValue(reg, value) => {
      bytes[1] = reg;
      bytes[2..4].copy_from_slice(&value.to_le_bytes());
    }

    Operands::RegisterPair(a, b) => {
      bytes[1] = a;
      bytes[2] = b;
    }

    Operands::RegisterPairAddress(a, b, address) => {
      bytes[1] = a;
      bytes[2] = b;
      bytes[3..5].copy_from_slice(&address.to_le_bytes());
    }

    Operands::RegisterFloat(reg, value) => {
      bytes[1] = reg;
      bytes[2..6].copy_from_slice(&value.to_le_bytes());
    }

    Operands::RegisterQuad(regs) => {
      bytes[1..5].copy_from_slice(&regs);
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::{Condition, IntOp, RegisterKind};

  #[test]
  fn decode_add(){
    let bytes = [0x16, 0x03, 0x04, 0x00, 0x00, 0x00];
    assert_eq!(
      decode(&bytes),
      Ok(Instruction::IntArithmetic { op: IntOp::Add, src: 3, dst: 4 })
    );
  }

  #[test]
  fn decode_set_int_immediate(){
    // SETI ir0 0x1234
    let bytes = [0x0B, 0x03, 0x34, 0x12, 0x00, 0x00];
    assert_eq!(decode(&bytes), Ok(Instruction::SetInt { reg: 3, value: 0x1234 }));
  }

  #[test]
  fn decode_address_at_offset_one(){
    // CALL 0x0102
    let bytes = [0x2E, 0x02, 0x01, 0x00, 0x00, 0x00];
    assert_eq!(decode(&bytes), Ok(Instruction::Call { target: 0x0102 }));
  }

  #[test]
  fn decode_branch_address_at_offset_three(){
    // JLTI ir0 ir1 0x0030
    let bytes = [0x2C, 0x03, 0x04, 0x30, 0x00, 0x00];
    assert_eq!(
      decode(&bytes),
      Ok(Instruction::Branch { condition: Condition::Less, first: 3, second: 4, target: 0x0030 })
    );
  }

  #[test]
  fn decode_float_at_offset_two(){
    let mut bytes = [0x0C, 0x02, 0, 0, 0, 0];
    bytes[2..6].copy_from_slice(&(-0.75f32).to_le_bytes());
    assert_eq!(decode(&bytes), Ok(Instruction::SetFloat { reg: 2, value: -0.75 }));
  }

  #[test]
  fn decode_ignores_reserved_bytes(){
    let bytes = [0x01, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE];
    assert_eq!(decode(&bytes), Ok(Instruction::Halt));
    let bytes = [0x02, 0x07, 0xBB, 0xCC, 0xDD, 0xEE];
    assert_eq!(decode(&bytes), Ok(Instruction::Push { kind: RegisterKind::Int, reg: 7 }));
  }

  #[test]
  fn unrecognized_opcodes(){
    for opcode in [0x30u8, 0x7F, 0xAA, 0xFF].iter() {
      let bytes = [*opcode, 0, 0, 0, 0, 0];
      assert_eq!(decode(&bytes), Err(ErrorKind::UnrecognizedOpcode));
    }
  }

  #[test]
  fn encode_zero_pads(){
    let bytes = encode(&Instruction::Unary { op: crate::bytecode::UnaryOp::Decrement, reg: 3 });
    assert_eq!(bytes, [0x1C, 0x03, 0x00, 0x00, 0x00, 0x00]);
    let bytes = encode(&Instruction::LoadEffectiveAddress { base: 3, offset: 4, multiplier: 2, dest: 7 });
    assert_eq!(bytes, [0x0A, 0x03, 0x04, 0x02, 0x07, 0x00]);
  }
}
