/*!

  Every instruction is exactly 6 bytes: a one byte opcode followed by 5 bytes of operands. The
  opcode alone determines how the operand bytes are read, through a static table mapping each
  opcode to an operand `Format`. Register ids are single bytes, addresses and 16 bit immediates
  are two byte little-endian values, float immediates are four byte little-endian IEEE-754
  values. Unused trailing bytes are zero.

    [op][r0]                        Register
    [op][s0----]                    Address
    [op][r0][s1----]                RegisterValue
    [op][r0][r1]                    RegisterPair
    [op][r0][r1][s2----]            RegisterPairAddress
    [op][r0][f-------------]        RegisterFloat
    [op][r0][r1][r2][r3]            RegisterQuad

  Decoding goes in two steps. The operand bytes are first pulled out according to the opcode's
  format into `Operands`, which is just the untyped shape of the instruction. `Operands` is then
  combined with the opcode into an `Instruction`, a closed enum the machine matches exhaustively.

*/

mod assembly;
mod binary;

pub use assembly::{assemble, Assembler, Program};
pub use binary::{decode, encode, read_operands, write_operands, INSTRUCTION_SIZE};

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

use crate::address::AddressType;
use crate::registers::{FloatRegister, IntRegister, RegisterId};

/// Opcodes of the virtual machine. The discriminant is the opcode byte.
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq, Debug,           Hash
)]
#[repr(u8)]
pub enum Opcode {
  #[strum(serialize = "NOOP")] Noop = 0x00,
  #[strum(serialize = "HALT")] Halt,
  // Stack
  #[strum(serialize = "PSHI")] PushInt,
  #[strum(serialize = "POPI")] PopInt,
  #[strum(serialize = "PSHF")] PushFloat,
  #[strum(serialize = "POPF")] PopFloat,
  // General memory
  #[strum(serialize = "LODI")] LoadInt,
  #[strum(serialize = "STOI")] StoreInt,
  #[strum(serialize = "LODF")] LoadFloat,
  #[strum(serialize = "STOF")] StoreFloat,
  #[strum(serialize = "LEAI")] LoadEffectiveAddress,
  // Immediates and moves
  #[strum(serialize = "SETI")] SetInt,
  #[strum(serialize = "SETF")] SetFloat,
  #[strum(serialize = "MOVI")] MoveInt,
  #[strum(serialize = "MOVF")] MoveFloat,
  // Compare and conditional move
  #[strum(serialize = "CMPI")] CompareInt,
  #[strum(serialize = "MEQI")] MoveIfEqual,
  #[strum(serialize = "MNEI")] MoveIfNotEqual,
  #[strum(serialize = "MGTI")] MoveIfGreater,
  #[strum(serialize = "MGEI")] MoveIfGreaterOrEqual,
  #[strum(serialize = "MLTI")] MoveIfLess,
  #[strum(serialize = "MLEI")] MoveIfLessOrEqual,
  // Integer arithmetic
  #[strum(serialize = "ADDI")] AddInt,
  #[strum(serialize = "SUBI")] SubInt,
  #[strum(serialize = "MULI")] MulInt,
  #[strum(serialize = "DIVI")] DivInt,
  #[strum(serialize = "MODI")] ModInt,
  #[strum(serialize = "INCI")] IncInt,
  #[strum(serialize = "DECI")] DecInt,
  // Bitwise
  #[strum(serialize = "ANDI")] And,
  #[strum(serialize = "ORRI")] Or,
  #[strum(serialize = "XORI")] Xor,
  #[strum(serialize = "NOTI")] Not,
  #[strum(serialize = "SHRI")] ShiftRight,
  #[strum(serialize = "SHLI")] ShiftLeft,
  // Float arithmetic
  #[strum(serialize = "ADDF")] AddFloat,
  #[strum(serialize = "SUBF")] SubFloat,
  #[strum(serialize = "MULF")] MulFloat,
  #[strum(serialize = "DIVF")] DivFloat,
  // Control flow
  #[strum(serialize = "JUMP")] Jump,
  #[strum(serialize = "JEQI")] JumpIfEqual,
  #[strum(serialize = "JNEI")] JumpIfNotEqual,
  #[strum(serialize = "JGTI")] JumpIfGreater,
  #[strum(serialize = "JGEI")] JumpIfGreaterOrEqual,
  #[strum(serialize = "JLTI")] JumpIfLess,
  #[strum(serialize = "JLEI")] JumpIfLessOrEqual,
  #[strum(serialize = "CALL")] Call,
  #[strum(serialize = "RETN")] Return,
}

/// How the 5 operand bytes following an opcode are laid out.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum Format {
  None,
  Register,
  Address,
  RegisterValue,
  RegisterPair,
  RegisterPairAddress,
  RegisterFloat,
  RegisterQuad,
}

impl Opcode {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// The static operand schema for this opcode.
  pub fn format(&self) -> Format {
    use Opcode::*;
    match self {
      Noop | Halt | Return => Format::None,

      PushInt | PopInt | PushFloat | PopFloat
      | IncInt | DecInt | Not => Format::Register,

      Jump | Call => Format::Address,

      LoadInt | StoreInt | LoadFloat | StoreFloat
      | SetInt | ShiftRight | ShiftLeft => Format::RegisterValue,

      MoveInt | MoveFloat | CompareInt
      | MoveIfEqual | MoveIfNotEqual | MoveIfGreater
      | MoveIfGreaterOrEqual | MoveIfLess | MoveIfLessOrEqual
      | AddInt | SubInt | MulInt | DivInt | ModInt
      | And | Or | Xor
      | AddFloat | SubFloat | MulFloat | DivFloat => Format::RegisterPair,

      JumpIfEqual | JumpIfNotEqual | JumpIfGreater
      | JumpIfGreaterOrEqual | JumpIfLess | JumpIfLessOrEqual => Format::RegisterPairAddress,

      SetFloat => Format::RegisterFloat,

      LoadEffectiveAddress => Format::RegisterQuad,
    }
  }

  /// Whether register operands name float registers rather than integer registers.
  pub fn uses_float_registers(&self) -> bool {
    use Opcode::*;
    matches!(
      self,
      PushFloat | PopFloat | LoadFloat | StoreFloat | SetFloat | MoveFloat
      | AddFloat | SubFloat | MulFloat | DivFloat
    )
  }
}

/// The untyped operand fields of an instruction, one variant per `Format`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Operands {
  None,
  Register(RegisterId),
  Address(AddressType),
  RegisterValue(RegisterId, u16),
  RegisterPair(RegisterId, RegisterId),
  RegisterPairAddress(RegisterId, RegisterId, AddressType),
  RegisterFloat(RegisterId, f32),
  RegisterQuad([u8; 4]),
}

impl Operands {
  pub fn format(&self) -> Format {
    match self {
      Operands::None                        => Format::None,
      Operands::Register(_)                 => Format::Register,
      Operands::Address(_)                  => Format::Address,
      Operands::RegisterValue(_, _)         => Format::RegisterValue,
      Operands::RegisterPair(_, _)          => Format::RegisterPair,
      Operands::RegisterPairAddress(_, _, _) => Format::RegisterPairAddress,
      Operands::RegisterFloat(_, _)         => Format::RegisterFloat,
      Operands::RegisterQuad(_)             => Format::RegisterQuad,
    }
  }
}

// region Operation families

/// Which register bank a stack or memory instruction works on.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum RegisterKind {
  Int,
  Float
}

impl RegisterKind {
  /// Bytes occupied in memory by one value.
  pub fn size(&self) -> u16 {
    match self {
      RegisterKind::Int   => 2,
      RegisterKind::Float => 4
    }
  }
}

/// Predicate shared by conditional moves and compare-and-jump instructions.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum Condition {
  Equal,
  NotEqual,
  Greater,
  GreaterOrEqual,
  Less,
  LessOrEqual
}

impl Condition {
  pub fn holds(&self, ordering: Ordering) -> bool {
    match self {
      Condition::Equal          => ordering == Ordering::Equal,
      Condition::NotEqual       => ordering != Ordering::Equal,
      Condition::Greater        => ordering == Ordering::Greater,
      Condition::GreaterOrEqual => ordering != Ordering::Less,
      Condition::Less           => ordering == Ordering::Less,
      Condition::LessOrEqual    => ordering != Ordering::Greater,
    }
  }
}

/// Two-operand integer operations. The result is written to the second operand.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum IntOp {
  Add,
  Sub,
  Mul,
  Div,
  Mod,
  And,
  Or,
  Xor
}

/// Single-register integer operations.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum UnaryOp {
  Increment,
  Decrement,
  Not
}

#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum ShiftDirection {
  Left,
  Right
}

/// Two-operand float operations. The result is written to the second operand.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum FloatOp {
  Add,
  Sub,
  Mul,
  Div
}

// endregion

/// A decoded instruction. Register operands are still raw ids: whether an id names a register,
/// and whether that register may be written, is decided when the instruction executes.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Instruction {
  Noop,
  Halt,
  Push { kind: RegisterKind, reg: RegisterId },
  Pop { kind: RegisterKind, reg: RegisterId },
  Load { kind: RegisterKind, reg: RegisterId, address: AddressType },
  Store { kind: RegisterKind, reg: RegisterId, address: AddressType },
  LoadEffectiveAddress { base: RegisterId, offset: RegisterId, multiplier: u8, dest: RegisterId },
  SetInt { reg: RegisterId, value: u16 },
  SetFloat { reg: RegisterId, value: f32 },
  Move { kind: RegisterKind, src: RegisterId, dst: RegisterId },
  Compare { first: RegisterId, second: RegisterId },
  ConditionalMove { condition: Condition, src: RegisterId, dst: RegisterId },
  IntArithmetic { op: IntOp, src: RegisterId, dst: RegisterId },
  Unary { op: UnaryOp, reg: RegisterId },
  Shift { direction: ShiftDirection, reg: RegisterId, amount: u16 },
  FloatArithmetic { op: FloatOp, src: RegisterId, dst: RegisterId },
  Jump { target: AddressType },
  Branch { condition: Condition, first: RegisterId, second: RegisterId, target: AddressType },
  Call { target: AddressType },
  Return,
}

impl Instruction {

  /**
    Builds the typed instruction for `opcode` from its operand fields. Returns `None` if the
    operands do not have the opcode's format, which cannot happen for operands produced by
    `read_operands(opcode.format(), ..)`.
  */
  pub fn from_parts(opcode: Opcode, operands: Operands) -> Option<Instruction> {
    use Opcode as Op;
    use Operands as O;

    let instruction = match (opcode, operands) {
      (Op::Noop,   O::None) => Instruction::Noop,
      (Op::Halt,   O::None) => Instruction::Halt,
      (Op::Return, O::None) => Instruction::Return,

      (Op::PushInt,   O::Register(reg)) => Instruction::Push { kind: RegisterKind::Int, reg },
      (Op::PopInt,    O::Register(reg)) => Instruction::Pop { kind: RegisterKind::Int, reg },
      (Op::PushFloat, O::Register(reg)) => Instruction::Push { kind: RegisterKind::Float, reg },
      (Op::PopFloat,  O::Register(reg)) => Instruction::Pop { kind: RegisterKind::Float, reg },
      (Op::IncInt,    O::Register(reg)) => Instruction::Unary { op: UnaryOp::Increment, reg },
      (Op::DecInt,    O::Register(reg)) => Instruction::Unary { op: UnaryOp::Decrement, reg },
      (Op::Not,       O::Register(reg)) => Instruction::Unary { op: UnaryOp::Not, reg },

      (Op::Jump, O::Address(target)) => Instruction::Jump { target },
      (Op::Call, O::Address(target)) => Instruction::Call { target },

      (Op::LoadInt, O::RegisterValue(reg, address)) =>
        Instruction::Load { kind: RegisterKind::Int, reg, address },
      (Op::StoreInt, O::RegisterValue(reg, address)) =>
        Instruction::Store { kind: RegisterKind::Int, reg, address },
      (Op::LoadFloat, O::RegisterValue(reg, address)) =>
        Instruction::Load { kind: RegisterKind::Float, reg, address },
      (Op::StoreFloat, O::RegisterValue(reg, address)) =>
        Instruction::Store { kind: RegisterKind::Float, reg, address },
      (Op::SetInt, O::RegisterValue(reg, value)) => Instruction::SetInt { reg, value },
      (Op::ShiftRight, O::RegisterValue(reg, amount)) =>
        Instruction::Shift { direction: ShiftDirection::Right, reg, amount },
      (Op::ShiftLeft, O::RegisterValue(reg, amount)) =>
        Instruction::Shift { direction: ShiftDirection::Left, reg, amount },

      (Op::SetFloat, O::RegisterFloat(reg, value)) => Instruction::SetFloat { reg, value },

      (Op::LoadEffectiveAddress, O::RegisterQuad([base, offset, multiplier, dest])) =>
        Instruction::LoadEffectiveAddress { base, offset, multiplier, dest },

      (op, O::RegisterPair(a, b)) => Instruction::from_pair(op, a, b)?,

      (op, O::RegisterPairAddress(first, second, target)) =>
        Instruction::Branch { condition: op.branch_condition()?, first, second, target },

      _ => return None
    };
    Some(instruction)
  }

  fn from_pair(opcode: Opcode, src: RegisterId, dst: RegisterId) -> Option<Instruction> {
    use Opcode as Op;

    let arithmetic = |op| Some(Instruction::IntArithmetic { op, src, dst });
    let float      = |op| Some(Instruction::FloatArithmetic { op, src, dst });
    let cmove      = |condition| Some(Instruction::ConditionalMove { condition, src, dst });

    match opcode {
      Op::MoveInt    => Some(Instruction::Move { kind: RegisterKind::Int, src, dst }),
      Op::MoveFloat  => Some(Instruction::Move { kind: RegisterKind::Float, src, dst }),
      Op::CompareInt => Some(Instruction::Compare { first: src, second: dst }),

      Op::MoveIfEqual          => cmove(Condition::Equal),
      Op::MoveIfNotEqual       => cmove(Condition::NotEqual),
      Op::MoveIfGreater        => cmove(Condition::Greater),
      Op::MoveIfGreaterOrEqual => cmove(Condition::GreaterOrEqual),
      Op::MoveIfLess           => cmove(Condition::Less),
      Op::MoveIfLessOrEqual    => cmove(Condition::LessOrEqual),

      Op::AddInt => arithmetic(IntOp::Add),
      Op::SubInt => arithmetic(IntOp::Sub),
      Op::MulInt => arithmetic(IntOp::Mul),
      Op::DivInt => arithmetic(IntOp::Div),
      Op::ModInt => arithmetic(IntOp::Mod),
      Op::And    => arithmetic(IntOp::And),
      Op::Or     => arithmetic(IntOp::Or),
      Op::Xor    => arithmetic(IntOp::Xor),

      Op::AddFloat => float(FloatOp::Add),
      Op::SubFloat => float(FloatOp::Sub),
      Op::MulFloat => float(FloatOp::Mul),
      Op::DivFloat => float(FloatOp::Div),

      _ => None
    }
  }

  /// The opcode this instruction encodes to.
  pub fn opcode(&self) -> Opcode {
    use Opcode as Op;

    match self {
      Instruction::Noop   => Op::Noop,
      Instruction::Halt   => Op::Halt,
      Instruction::Return => Op::Return,

      Instruction::Push { kind: RegisterKind::Int, .. }    => Op::PushInt,
      Instruction::Push { kind: RegisterKind::Float, .. }  => Op::PushFloat,
      Instruction::Pop { kind: RegisterKind::Int, .. }     => Op::PopInt,
      Instruction::Pop { kind: RegisterKind::Float, .. }   => Op::PopFloat,
      Instruction::Load { kind: RegisterKind::Int, .. }    => Op::LoadInt,
      Instruction::Load { kind: RegisterKind::Float, .. }  => Op::LoadFloat,
      Instruction::Store { kind: RegisterKind::Int, .. }   => Op::StoreInt,
      Instruction::Store { kind: RegisterKind::Float, .. } => Op::StoreFloat,
      Instruction::Move { kind: RegisterKind::Int, .. }    => Op::MoveInt,
      Instruction::Move { kind: RegisterKind::Float, .. }  => Op::MoveFloat,

      Instruction::LoadEffectiveAddress { .. } => Op::LoadEffectiveAddress,
      Instruction::SetInt { .. }               => Op::SetInt,
      Instruction::SetFloat { .. }             => Op::SetFloat,
      Instruction::Compare { .. }              => Op::CompareInt,

      Instruction::ConditionalMove { condition, .. } => match condition {
        Condition::Equal          => Op::MoveIfEqual,
        Condition::NotEqual       => Op::MoveIfNotEqual,
        Condition::Greater        => Op::MoveIfGreater,
        Condition::GreaterOrEqual => Op::MoveIfGreaterOrEqual,
        Condition::Less           => Op::MoveIfLess,
        Condition::LessOrEqual    => Op::MoveIfLessOrEqual,
      },

      Instruction::IntArithmetic { op, .. } => match op {
        IntOp::Add => Op::AddInt,
        IntOp::Sub => Op::SubInt,
        IntOp::Mul => Op::MulInt,
        IntOp::Div => Op::DivInt,
        IntOp::Mod => Op::ModInt,
        IntOp::And => Op::And,
        IntOp::Or  => Op::Or,
        IntOp::Xor => Op::Xor,
      },

      Instruction::Unary { op, .. } => match op {
        UnaryOp::Increment => Op::IncInt,
        UnaryOp::Decrement => Op::DecInt,
        UnaryOp::Not       => Op::Not,
      },

      Instruction::Shift { direction: ShiftDirection::Left, .. }  => Op::ShiftLeft,
      Instruction::Shift { direction: ShiftDirection::Right, .. } => Op::ShiftRight,

      Instruction::FloatArithmetic { op, .. } => match op {
        FloatOp::Add => Op::AddFloat,
        FloatOp::Sub => Op::SubFloat,
        FloatOp::Mul => Op::MulFloat,
        FloatOp::Div => Op::DivFloat,
      },

      Instruction::Jump { .. } => Op::Jump,
      Instruction::Call { .. } => Op::Call,

      Instruction::Branch { condition, .. } => match condition {
        Condition::Equal          => Op::JumpIfEqual,
        Condition::NotEqual       => Op::JumpIfNotEqual,
        Condition::Greater        => Op::JumpIfGreater,
        Condition::GreaterOrEqual => Op::JumpIfGreaterOrEqual,
        Condition::Less           => Op::JumpIfLess,
        Condition::LessOrEqual    => Op::JumpIfLessOrEqual,
      },
    }
  }

  /// The operand fields of this instruction, in the opcode's format.
  pub fn operands(&self) -> Operands {
    match *self {
      Instruction::Noop | Instruction::Halt | Instruction::Return => Operands::None,

      Instruction::Push { reg, .. }
      | Instruction::Pop { reg, .. }
      | Instruction::Unary { reg, .. } => Operands::Register(reg),

      Instruction::Jump { target }
      | Instruction::Call { target } => Operands::Address(target),

      Instruction::Load { reg, address, .. }
      | Instruction::Store { reg, address, .. } => Operands::RegisterValue(reg, address),
      Instruction::SetInt { reg, value }        => Operands::RegisterValue(reg, value),
      Instruction::Shift { reg, amount, .. }    => Operands::RegisterValue(reg, amount),

      Instruction::SetFloat { reg, value } => Operands::RegisterFloat(reg, value),

      Instruction::LoadEffectiveAddress { base, offset, multiplier, dest } =>
        Operands::RegisterQuad([base, offset, multiplier, dest]),

      Instruction::Move { src, dst, .. }
      | Instruction::ConditionalMove { src, dst, .. }
      | Instruction::IntArithmetic { src, dst, .. }
      | Instruction::FloatArithmetic { src, dst, .. } => Operands::RegisterPair(src, dst),
      Instruction::Compare { first, second }            => Operands::RegisterPair(first, second),

      Instruction::Branch { first, second, target, .. } =>
        Operands::RegisterPairAddress(first, second, target),
    }
  }
}

impl Opcode {
  fn branch_condition(&self) -> Option<Condition> {
    match self {
      Opcode::JumpIfEqual          => Some(Condition::Equal),
      Opcode::JumpIfNotEqual       => Some(Condition::NotEqual),
      Opcode::JumpIfGreater        => Some(Condition::Greater),
      Opcode::JumpIfGreaterOrEqual => Some(Condition::GreaterOrEqual),
      Opcode::JumpIfLess           => Some(Condition::Less),
      Opcode::JumpIfLessOrEqual    => Some(Condition::LessOrEqual),
      _                            => None
    }
  }
}

// region Display

/// Name of an integer register id, or `#id` if there is no such register.
fn int_name(id: RegisterId) -> String {
  match IntRegister::from_id(id) {
    Ok(register) => register.to_string(),
    Err(_)       => format!("#{}", id)
  }
}

fn float_name(id: RegisterId) -> String {
  match FloatRegister::from_id(id) {
    Ok(register) => register.to_string(),
    Err(_)       => format!("#{}", id)
  }
}

/// Prints the instruction in assembly syntax, e.g. `ADDI ir0 ir1`.
impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let opcode = self.opcode();
    let name = |id: RegisterId| match opcode.uses_float_registers() {
      true  => float_name(id),
      false => int_name(id)
    };

    match self.operands() {
      Operands::None => {
        write!(f, "{}", opcode)
      }

      Operands::Register(reg) => {
        write!(f, "{} {}", opcode, name(reg))
      }

      Operands::Address(address) => {
        write!(f, "{} 0x{:04X}", opcode, address)
      }

      Operands::RegisterValue(reg, value) => {
        write!(f, "{} {} 0x{:04X}", opcode, name(reg), value)
      }

      Operands::RegisterPair(a, b) => {
        write!(f, "{} {} {}", opcode, name(a), name(b))
      }

      Operands::RegisterPairAddress(a, b, address) => {
        write!(f, "{} {} {} 0x{:04X}", opcode, name(a), name(b), address)
      }

      Operands::RegisterFloat(reg, value) => {
        write!(f, "{} {} {:?}", opcode, name(reg), value)
      }

      Operands::RegisterQuad([base, offset, multiplier, dest]) => {
        write!(f, "{} {} {} {} {}", opcode, name(base), name(offset), multiplier, name(dest))
      }
    }
  }
}

// endregion


#[cfg(test)]
mod tests {
  use super::*;
  use std::convert::TryFrom;
  use std::str::FromStr;
  use strum::IntoEnumIterator;

  #[test]
  fn opcode_bytes(){
    assert_eq!(Opcode::Noop.code(), 0x00);
    assert_eq!(Opcode::Halt.code(), 0x01);
    assert_eq!(Opcode::LoadEffectiveAddress.code(), 0x0A);
    assert_eq!(Opcode::AddInt.code(), 0x16);
    assert_eq!(Opcode::Call.code(), 0x2E);
    assert_eq!(Opcode::Return.code(), 0x2F);
    assert!(Opcode::try_from(0x30u8).is_err());
  }

  #[test]
  fn mnemonics(){
    assert_eq!(Opcode::from_str("MEQI"), Ok(Opcode::MoveIfEqual));
    assert_eq!(Opcode::from_str("RETN"), Ok(Opcode::Return));
    assert_eq!(Opcode::SubInt.to_string(), "SUBI");
  }

  #[test]
  fn every_opcode_builds_from_its_format(){
    for opcode in Opcode::iter() {
      let operands = match opcode.format() {
        Format::None                => Operands::None,
        Format::Register            => Operands::Register(3),
        Format::Address             => Operands::Address(0x0012),
        Format::RegisterValue       => Operands::RegisterValue(3, 0x4000),
        Format::RegisterPair        => Operands::RegisterPair(3, 4),
        Format::RegisterPairAddress => Operands::RegisterPairAddress(3, 4, 0x0018),
        Format::RegisterFloat       => Operands::RegisterFloat(1, 2.5),
        Format::RegisterQuad        => Operands::RegisterQuad([3, 4, 1, 5]),
      };
      let instruction = Instruction::from_parts(opcode, operands);
      assert!(instruction.is_some(), "{} did not build", opcode);
      let instruction = instruction.unwrap();
      assert_eq!(instruction.opcode(), opcode);
      assert_eq!(instruction.operands(), operands);
    }
  }

  #[test]
  fn mismatched_operands_rejected(){
    assert_eq!(Instruction::from_parts(Opcode::Halt, Operands::Register(3)), None);
    assert_eq!(Instruction::from_parts(Opcode::Jump, Operands::RegisterPair(3, 4)), None);
  }

  #[test]
  fn conditions(){
    assert!(Condition::GreaterOrEqual.holds(Ordering::Equal));
    assert!(!Condition::Greater.holds(Ordering::Equal));
    assert!(Condition::NotEqual.holds(Ordering::Less));
    assert!(Condition::LessOrEqual.holds(Ordering::Less));
    assert!(!Condition::LessOrEqual.holds(Ordering::Greater));
  }

  #[test]
  fn display(){
    let add = Instruction::IntArithmetic { op: IntOp::Add, src: 3, dst: 4 };
    assert_eq!(add.to_string(), "ADDI ir0 ir1");
    let set = Instruction::SetFloat { reg: 4, value: 1.5 };
    assert_eq!(set.to_string(), "SETF frv 1.5");
    let lea = Instruction::LoadEffectiveAddress { base: 3, offset: 4, multiplier: 1, dest: 7 };
    assert_eq!(lea.to_string(), "LEAI ir0 ir1 1 irv");
    let bad = Instruction::Push { kind: RegisterKind::Int, reg: 9 };
    assert_eq!(bad.to_string(), "PSHI #9");
  }
}
