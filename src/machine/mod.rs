/*!
  The execution engine: a single core running the fetch-decode-execute loop over its own memory
  and register file.

  Each cycle fetches the 6 byte record at `pc`, advances `pc` past it, decodes it, and executes
  it. Every handler returns `Result<Flow, ErrorKind>`. The first error or a `HALT` ends the run;
  the outcome is recorded in the status register and in the machine's `State`.
*/

mod stack;

use std::fmt::{Display, Formatter};

use log::{debug, trace, warn};

use crate::address::{in_read_write_window, is_code_address, AddressType};
use crate::bytecode::{
  decode, Condition, FloatOp, Instruction, IntOp, RegisterKind, ShiftDirection, UnaryOp,
  INSTRUCTION_SIZE
};
use crate::diagnostics::Diagnostics;
use crate::error::{ErrorKind, LoadError, Status};
use crate::loader;
use crate::memory::Memory;
use crate::registers::{RegisterFile, RegisterId};

/// Shifts by this many bits or more clear the register.
const SHIFT_LIMIT: u16 = 16;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum State {
  Running,
  Halted,
  Errored(ErrorKind)
}

impl State {
  pub fn is_running(&self) -> bool {
    *self == State::Running
  }
}

impl Display for State {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      State::Running       => write!(f, "running"),
      State::Halted        => write!(f, "halted"),
      State::Errored(kind) => write!(f, "errored ({})", kind)
    }
  }
}

/// What the loop does after an instruction completes without error.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Flow {
  Continue,
  Halt
}

pub struct Machine {
  registers        : RegisterFile,
  memory           : Memory,
  cycles           : u64,
  state            : State,
  last_instruction : Option<Instruction>,
  last_fetched     : [u8; INSTRUCTION_SIZE],
}

impl Machine {

  pub fn new() -> Machine {
    Machine::with_core_id(0)
  }

  pub fn with_core_id(core_id: u8) -> Machine {
    Machine {
      registers        : RegisterFile::new(core_id),
      memory           : Memory::new(),
      cycles           : 0,
      state            : State::Running,
      last_instruction : None,
      last_fetched     : [0; INSTRUCTION_SIZE],
    }
  }

  // region Loading

  /// Loads a program image at `base` and points `pc` at its first instruction. Returns the
  /// number of instructions loaded.
  pub fn load(&mut self, base: AddressType, image: &[u8]) -> Result<u16, LoadError> {
    let count = loader::load_image(&mut self.memory, base, image)?;
    self.registers.set_pc(base);
    Ok(count)
  }

  /// Copies raw bytes into memory, for example to seed the read-write block with data.
  pub fn load_raw(&mut self, base: AddressType, bytes: &[u8]) -> Result<(), LoadError> {
    self.memory.write_block(base, bytes)
  }

  // endregion

  // region Read-only views

  pub fn state(&self) -> State {
    self.state
  }

  pub fn cycles(&self) -> u64 {
    self.cycles
  }

  pub fn registers(&self) -> &RegisterFile {
    &self.registers
  }

  pub fn memory(&self) -> &Memory {
    &self.memory
  }

  /// The most recently decoded instruction, whether or not it executed successfully.
  pub fn last_instruction(&self) -> Option<Instruction> {
    self.last_instruction
  }

  /// The raw record read by the most recent fetch, including one that failed to decode.
  pub fn last_fetched(&self) -> [u8; INSTRUCTION_SIZE] {
    self.last_fetched
  }

  pub fn diagnostics(&self) -> Diagnostics {
    Diagnostics::capture(self)
  }

  // endregion

  // region Run loop

  /// Runs until the machine halts or errors.
  pub fn run(&mut self) -> State {
    while self.step().is_running() {}
    self.state
  }

  /// Runs at most `max_cycles` cycles. The result is still `Running` if the bound was hit.
  pub fn run_bounded(&mut self, max_cycles: u64) -> State {
    for _ in 0..max_cycles {
      if !self.step().is_running() {
        break;
      }
    }
    self.state
  }

  /// Executes exactly one cycle. Does nothing once the machine has stopped.
  pub fn step(&mut self) -> State {
    if !self.state.is_running() {
      return self.state;
    }

    let address = self.registers.pc();
    let bytes   = self.fetch(address);
    self.last_fetched = bytes;
    self.registers.set_pc(address.wrapping_add(INSTRUCTION_SIZE as AddressType));
    self.cycles += 1;

    let outcome = match decode(&bytes) {
      Ok(instruction) => {
        trace!("0x{:04X}: {}", address, instruction);
        self.last_instruction = Some(instruction);
        self.execute(instruction)
      }
      Err(kind) => {
        trace!("0x{:04X}: undecodable opcode 0x{:02X}", address, bytes[0]);
        Err(kind)
      }
    };

    match outcome {
      Ok(Flow::Continue) => {}

      Ok(Flow::Halt) => {
        self.registers.status = Status::Halt;
        self.state = State::Halted;
        debug!("core {} halted at 0x{:04X} after {} cycles", self.registers.core_id, address, self.cycles);
      }

      Err(kind) => {
        self.registers.status = Status::Error(kind);
        self.state = State::Errored(kind);
        warn!(
          "core {} stopped at 0x{:04X} after {} cycles: {}",
          self.registers.core_id, address, self.cycles, kind
        );
      }
    }

    #[cfg(feature = "trace_computation")] println!("{}", self.diagnostics());

    self.state
  }

  fn fetch(&self, address: AddressType) -> [u8; INSTRUCTION_SIZE] {
    let mut bytes = [0u8; INSTRUCTION_SIZE];
    for (i, byte) in bytes.iter_mut().enumerate() {
      *byte = self.memory.read_u8(address.wrapping_add(i as AddressType));
    }
    bytes
  }

  // endregion

  // region Instruction handlers

  fn execute(&mut self, instruction: Instruction) -> Result<Flow, ErrorKind> {
    match instruction {
      Instruction::Noop => {}

      Instruction::Halt => return Ok(Flow::Halt),

      Instruction::Push { kind, reg } => self.push_register(kind, reg)?,

      Instruction::Pop { kind, reg } => self.pop_register(kind, reg)?,

      Instruction::Load { kind, reg, address } => self.load_register(kind, reg, address)?,

      Instruction::Store { kind, reg, address } => self.store_register(kind, reg, address)?,

      Instruction::LoadEffectiveAddress { base, offset, multiplier, dest } => {
        self.load_effective_address(base, offset, multiplier, dest)?
      }

      Instruction::SetInt { reg, value } => self.registers.set_int_general(reg, value)?,

      Instruction::SetFloat { reg, value } => self.registers.set_float(reg, value)?,

      Instruction::Move { kind: RegisterKind::Int, src, dst } => {
        let value = self.registers.get_int(src)?;
        self.registers.set_int_any(dst, value)?;
      }

      Instruction::Move { kind: RegisterKind::Float, src, dst } => {
        let value = self.registers.get_float(src)?;
        self.registers.set_float(dst, value)?;
      }

      Instruction::Compare { first, second } => self.registers.compare(first, second)?,

      Instruction::ConditionalMove { condition, src, dst } => {
        self.conditional_move(condition, src, dst)?
      }

      Instruction::IntArithmetic { op, src, dst } => self.int_arithmetic(op, src, dst)?,

      Instruction::Unary { op, reg } => self.unary(op, reg)?,

      Instruction::Shift { direction, reg, amount } => self.shift(direction, reg, amount)?,

      Instruction::FloatArithmetic { op, src, dst } => self.float_arithmetic(op, src, dst)?,

      Instruction::Jump { target } => self.jump(target)?,

      Instruction::Branch { condition, first, second, target } => {
        let a = self.registers.get_int(first)?;
        let b = self.registers.get_int(second)?;
        if condition.holds(a.cmp(&b)) {
          self.jump(target)?;
        }
      }

      Instruction::Call { target } => self.call(target)?,

      Instruction::Return => self.ret()?,
    }
    Ok(Flow::Continue)
  }

  fn load_register(&mut self, kind: RegisterKind, reg: RegisterId, address: AddressType)
    -> Result<(), ErrorKind>
  {
    if !in_read_write_window(address, kind.size()) {
      return Err(ErrorKind::MemoryAccessOutOfBounds);
    }
    match kind {
      RegisterKind::Int   => self.registers.set_int_any(reg, self.memory.read_u16(address)),
      RegisterKind::Float => self.registers.set_float(reg, self.memory.read_f32(address)),
    }
  }

  fn store_register(&mut self, kind: RegisterKind, reg: RegisterId, address: AddressType)
    -> Result<(), ErrorKind>
  {
    if !in_read_write_window(address, kind.size()) {
      return Err(ErrorKind::MemoryAccessOutOfBounds);
    }
    match kind {
      RegisterKind::Int   => self.memory.write_u16(address, self.registers.get_int(reg)?),
      RegisterKind::Float => self.memory.write_f32(address, self.registers.get_float(reg)?),
    }
    Ok(())
  }

  /// `dest <- base + (offset << multiplier)`, wrapping. The multiplier is at most 2.
  fn load_effective_address(
    &mut self,
    base       : RegisterId,
    offset     : RegisterId,
    multiplier : u8,
    dest       : RegisterId
  ) -> Result<(), ErrorKind>
  {
    if multiplier > 2 {
      return Err(ErrorKind::InvalidAddressMultiplier);
    }
    let base   = self.registers.get_int(base)?;
    let offset = self.registers.get_int(offset)?;
    self.registers.set_int_any(dest, base.wrapping_add(offset << multiplier))
  }

  /// Consumes the comparison flag whether or not the move happens.
  fn conditional_move(&mut self, condition: Condition, src: RegisterId, dst: RegisterId)
    -> Result<(), ErrorKind>
  {
    let ordering = self.registers
      .take_comparison()
      .ordering()
      .ok_or(ErrorKind::ComparisonNotInitialized)?;
    if condition.holds(ordering) {
      let value = self.registers.get_int(src)?;
      self.registers.set_int_any(dst, value)?;
    }
    Ok(())
  }

  /**
    Two-operand integer arithmetic, `dst <- dst op src`. Overflow and underflow still store the
    wrapped result before reporting. Division and remainder by zero store nothing.
  */
  fn int_arithmetic(&mut self, op: IntOp, src: RegisterId, dst: RegisterId)
    -> Result<(), ErrorKind>
  {
    let a = self.registers.get_int(src)?;
    let b = self.registers.get_int(dst)?;
    self.registers.check_general(dst)?;

    let (result, flag) = match op {
      IntOp::Add => {
        let sum = a.wrapping_add(b);
        (sum, Some(ErrorKind::ArithmeticOverflow).filter(|_| sum < a.max(b)))
      }
      IntOp::Sub => {
        let difference = b.wrapping_sub(a);
        (difference, Some(ErrorKind::ArithmeticUnderflow).filter(|_| difference > b))
      }
      IntOp::Mul => {
        let (product, overflowed) = a.overflowing_mul(b);
        (product, Some(ErrorKind::ArithmeticOverflow).filter(|_| overflowed))
      }
      IntOp::Div => (b.checked_div(a).ok_or(ErrorKind::DivisionByZero)?, None),
      IntOp::Mod => (b.checked_rem(a).ok_or(ErrorKind::DivisionByZero)?, None),
      IntOp::And => (a & b, None),
      IntOp::Or  => (a | b, None),
      IntOp::Xor => (a ^ b, None),
    };

    self.registers.set_int_general(dst, result)?;
    match flag {
      Some(kind) => Err(kind),
      None       => Ok(())
    }
  }

  fn unary(&mut self, op: UnaryOp, reg: RegisterId) -> Result<(), ErrorKind> {
    let value = self.registers.get_int(reg)?;
    self.registers.check_general(reg)?;
    let result = match op {
      UnaryOp::Increment => value.wrapping_add(1),
      UnaryOp::Decrement => value.checked_sub(1).ok_or(ErrorKind::DecrementZero)?,
      UnaryOp::Not       => !value,
    };
    self.registers.set_int_general(reg, result)
  }

  fn shift(&mut self, direction: ShiftDirection, reg: RegisterId, amount: u16)
    -> Result<(), ErrorKind>
  {
    let value = self.registers.get_int(reg)?;
    let result = match (direction, amount >= SHIFT_LIMIT) {
      (_, true)                      => 0,
      (ShiftDirection::Left, false)  => value << amount,
      (ShiftDirection::Right, false) => value >> amount,
    };
    self.registers.set_int_general(reg, result)
  }

  /// IEEE-754 arithmetic, `dst <- dst op src`. Never reports an error for NaN or infinity.
  fn float_arithmetic(&mut self, op: FloatOp, src: RegisterId, dst: RegisterId)
    -> Result<(), ErrorKind>
  {
    let a = self.registers.get_float(src)?;
    let b = self.registers.get_float(dst)?;
    let result = match op {
      FloatOp::Add => b + a,
      FloatOp::Sub => b - a,
      FloatOp::Mul => b * a,
      FloatOp::Div => b / a,
    };
    self.registers.set_float(dst, result)
  }

  fn jump(&mut self, target: AddressType) -> Result<(), ErrorKind> {
    if !is_code_address(target) {
      return Err(ErrorKind::ExecuteOutOfCodeBlock);
    }
    self.registers.set_pc(target);
    Ok(())
  }

  // endregion
}

impl Default for Machine {
  fn default() -> Self {
    Machine::new()
  }
}
