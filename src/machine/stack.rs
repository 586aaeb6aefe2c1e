//! Push, pop, call and return. The stack starts at `RW_MAX` and grows toward `MAX_ADDRESS`:
//! a push writes at `sp` then advances it, a pop retreats `sp` then reads.

use super::Machine;
use crate::address::{AddressType, MAX_ADDRESS, RW_MAX};
use crate::bytecode::RegisterKind;
use crate::error::ErrorKind;
use crate::registers::{FloatRegister, IntRegister, RegisterId};

/// Integer registers saved by `CALL`, in push order. `RETN` pops them in reverse.
const SAVED_INT_REGISTERS: [IntRegister; 6] = [
  IntRegister::Pc,  IntRegister::Bp,
  IntRegister::Ir0, IntRegister::Ir1, IntRegister::Ir2, IntRegister::Ir3
];

/// Float registers saved by `CALL` after the integer registers.
const SAVED_FLOAT_REGISTERS: [FloatRegister; 4] = [
  FloatRegister::Fr0, FloatRegister::Fr1, FloatRegister::Fr2, FloatRegister::Fr3
];

const INT_SIZE   : AddressType = 2;
const FLOAT_SIZE : AddressType = 4;

/// Bytes pushed by one `CALL`.
pub const FRAME_SIZE: AddressType =
  SAVED_INT_REGISTERS.len() as AddressType * INT_SIZE
  + SAVED_FLOAT_REGISTERS.len() as AddressType * FLOAT_SIZE;

impl Machine {

  // region Raw stack access

  /// Fails unless `size` more bytes fit on the stack.
  fn check_push(&self, size: AddressType) -> Result<AddressType, ErrorKind> {
    let sp = self.registers.sp();
    match sp > MAX_ADDRESS - size {
      true  => Err(ErrorKind::StackOverflow),
      false => Ok(sp)
    }
  }

  /// Fails unless `sp` is above the stack base. Returns where the popped value starts.
  fn check_pop(&self, size: AddressType) -> Result<AddressType, ErrorKind> {
    let sp = self.registers.sp();
    match sp > RW_MAX {
      true  => Ok(sp - size),
      false => Err(ErrorKind::StackUnderflow)
    }
  }

  fn push_u16(&mut self, value: u16) -> Result<(), ErrorKind> {
    let sp = self.check_push(INT_SIZE)?;
    self.memory.write_u16(sp, value);
    self.registers.set_sp(sp + INT_SIZE);
    Ok(())
  }

  fn push_f32(&mut self, value: f32) -> Result<(), ErrorKind> {
    let sp = self.check_push(FLOAT_SIZE)?;
    self.memory.write_f32(sp, value);
    self.registers.set_sp(sp + FLOAT_SIZE);
    Ok(())
  }

  fn pop_u16(&mut self) -> Result<u16, ErrorKind> {
    let sp = self.check_pop(INT_SIZE)?;
    self.registers.set_sp(sp);
    Ok(self.memory.read_u16(sp))
  }

  fn pop_f32(&mut self) -> Result<f32, ErrorKind> {
    let sp = self.check_pop(FLOAT_SIZE)?;
    self.registers.set_sp(sp);
    Ok(self.memory.read_f32(sp))
  }

  // endregion

  // region Instructions

  pub(super) fn push_register(&mut self, kind: RegisterKind, reg: RegisterId)
    -> Result<(), ErrorKind>
  {
    match kind {
      RegisterKind::Int   => {
        let value = self.registers.get_int(reg)?;
        self.push_u16(value)
      }
      RegisterKind::Float => {
        let value = self.registers.get_float(reg)?;
        self.push_f32(value)
      }
    }
  }

  /// The destination is validated before `sp` moves, so a rejected pop changes nothing.
  pub(super) fn pop_register(&mut self, kind: RegisterKind, reg: RegisterId)
    -> Result<(), ErrorKind>
  {
    match kind {
      RegisterKind::Int   => {
        self.registers.check_any(reg)?;
        let value = self.pop_u16()?;
        self.registers.set_int_any(reg, value)
      }
      RegisterKind::Float => {
        FloatRegister::from_id(reg)?;
        let value = self.pop_f32()?;
        self.registers.set_float(reg, value)
      }
    }
  }

  /**
    Saves the caller's frame and transfers control to `target`. `pc` already points at the
    instruction after the call, so that is the return address saved. The frame is pushed even
    when the target turns out to lie outside the code block; `pc` is then left alone.
  */
  pub(super) fn call(&mut self, target: AddressType) -> Result<(), ErrorKind> {
    self.check_push(FRAME_SIZE)?;
    for register in SAVED_INT_REGISTERS.iter() {
      let value = self.registers.int(*register);
      self.push_u16(value)?;
    }
    for register in SAVED_FLOAT_REGISTERS.iter() {
      let value = self.registers.float(*register);
      self.push_f32(value)?;
    }
    self.jump(target)
  }

  /// Restores the frame saved by `call`, `pc` last.
  pub(super) fn ret(&mut self) -> Result<(), ErrorKind> {
    // Every pop must start above the base; the last one, `pc`, starts this far below `sp`.
    if self.registers.sp() <= RW_MAX + (FRAME_SIZE - INT_SIZE) {
      return Err(ErrorKind::StackUnderflow);
    }
    for register in SAVED_FLOAT_REGISTERS.iter().rev() {
      let value = self.pop_f32()?;
      self.registers.set_float(register.id(), value)?;
    }
    for register in SAVED_INT_REGISTERS.iter().rev() {
      let value = self.pop_u16()?;
      self.registers.set_int_any(register.id(), value)?;
    }
    Ok(())
  }

  // endregion
}
