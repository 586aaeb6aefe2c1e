//! The register file of a single CPU core.
//!
//! Registers are addressed in bytecode by a one byte id. Integer and float registers have
//! separate id spaces:
//!
//! ```text
//!   integer:  pc=0 sp=1 bp=2 ir0=3 ir1=4 ir2=5 ir3=6 irv=7
//!   float:    fr0=0 fr1=1 fr2=2 fr3=3 frv=4
//! ```
//!
//! `bp`, `ir0`-`ir3` and `fr0`-`fr3` are callee-saved (see `CALL`/`RETN`); `irv` and `frv` hold
//! return values and are caller-saved.

use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};

use crate::address::{AddressType, STACK_BASE};
use crate::error::{ErrorKind, Status};

/// Raw register id as it appears in an instruction.
pub type RegisterId = u8;

#[derive(
  StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq,        Debug,        Hash
)]
#[repr(u8)]
pub enum IntRegister {
  #[strum(serialize = "pc")]  Pc,
  #[strum(serialize = "sp")]  Sp,
  #[strum(serialize = "bp")]  Bp,
  #[strum(serialize = "ir0")] Ir0,
  #[strum(serialize = "ir1")] Ir1,
  #[strum(serialize = "ir2")] Ir2,
  #[strum(serialize = "ir3")] Ir3,
  #[strum(serialize = "irv")] Irv,
}

#[derive(
  StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq,        Debug,        Hash
)]
#[repr(u8)]
pub enum FloatRegister {
  #[strum(serialize = "fr0")] Fr0,
  #[strum(serialize = "fr1")] Fr1,
  #[strum(serialize = "fr2")] Fr2,
  #[strum(serialize = "fr3")] Fr3,
  #[strum(serialize = "frv")] Frv,
}

impl IntRegister {
  pub fn id(&self) -> RegisterId {
    Into::<u8>::into(*self)
  }

  pub fn from_id(id: RegisterId) -> Result<IntRegister, ErrorKind> {
    IntRegister::try_from(id).map_err(|_| ErrorKind::RegisterUnrecognized)
  }

  /// Only `ir0`-`ir3` are writable by instructions that compute a value.
  pub fn is_general(&self) -> bool {
    matches!(self, IntRegister::Ir0 | IntRegister::Ir1 | IntRegister::Ir2 | IntRegister::Ir3)
  }
}

impl FloatRegister {
  pub fn id(&self) -> RegisterId {
    Into::<u8>::into(*self)
  }

  pub fn from_id(id: RegisterId) -> Result<FloatRegister, ErrorKind> {
    FloatRegister::try_from(id).map_err(|_| ErrorKind::RegisterUnrecognized)
  }
}

/// The one-shot comparison flag.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Comparison {
  Uninitialized,
  Equal,
  Greater,
  Less
}

impl From<Ordering> for Comparison {
  fn from(ordering: Ordering) -> Self {
    match ordering {
      Ordering::Equal   => Comparison::Equal,
      Ordering::Greater => Comparison::Greater,
      Ordering::Less    => Comparison::Less
    }
  }
}

impl Comparison {
  /// The ordering recorded by the last compare, if there is one.
  pub fn ordering(&self) -> Option<Ordering> {
    match self {
      Comparison::Uninitialized => None,
      Comparison::Equal         => Some(Ordering::Equal),
      Comparison::Greater       => Some(Ordering::Greater),
      Comparison::Less          => Some(Ordering::Less)
    }
  }
}

impl Display for Comparison {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Comparison::Uninitialized => write!(f, "uninitialized"),
      Comparison::Equal         => write!(f, "equal"),
      Comparison::Greater       => write!(f, "greater"),
      Comparison::Less          => write!(f, "less")
    }
  }
}

#[derive(Clone, PartialEq, Debug)]
pub struct RegisterFile {
  /// Core identifier. Only one core ever runs.
  pub core_id : u8,
  pub status  : Status,
  cmp         : Comparison,

  pc          : AddressType,
  sp          : AddressType,
  bp          : AddressType,
  ir          : [u16; 4],
  irv         : u16,
  fr          : [f32; 4],
  frv         : f32,
}

impl RegisterFile {

  pub fn new(core_id: u8) -> RegisterFile {
    RegisterFile {
      core_id,
      status : Status::NoError,
      cmp    : Comparison::Uninitialized,
      pc     : 0,
      sp     : STACK_BASE,
      bp     : STACK_BASE,
      ir     : [0; 4],
      irv    : 0,
      fr     : [0.0; 4],
      frv    : 0.0,
    }
  }

  // region Integer registers

  pub fn get_int(&self, id: RegisterId) -> Result<u16, ErrorKind> {
    Ok(self.int(IntRegister::from_id(id)?))
  }

  /// Writes one of `ir0`-`ir3`.
  pub fn set_int_general(&mut self, id: RegisterId, value: u16) -> Result<(), ErrorKind> {
    let register = IntRegister::from_id(id)?;
    if !register.is_general() {
      return Err(ErrorKind::RegisterNotAllowed);
    }
    self.set_int(register, value);
    Ok(())
  }

  /// Fails exactly when `set_int_general(id, _)` would, without writing anything.
  pub fn check_general(&self, id: RegisterId) -> Result<(), ErrorKind> {
    match IntRegister::from_id(id)?.is_general() {
      true  => Ok(()),
      false => Err(ErrorKind::RegisterNotAllowed)
    }
  }

  /// Fails exactly when `set_int_any(id, _)` would.
  pub fn check_any(&self, id: RegisterId) -> Result<(), ErrorKind> {
    match IntRegister::from_id(id)? {
      IntRegister::Sp => Err(ErrorKind::RegisterNotAllowed),
      _               => Ok(())
    }
  }

  /// Writes any integer register except `sp`, which only moves through push and pop.
  pub fn set_int_any(&mut self, id: RegisterId, value: u16) -> Result<(), ErrorKind> {
    let register = IntRegister::from_id(id)?;
    if register == IntRegister::Sp {
      return Err(ErrorKind::RegisterNotAllowed);
    }
    self.set_int(register, value);
    Ok(())
  }

  /// Unchecked read by name.
  pub fn int(&self, register: IntRegister) -> u16 {
    match register {
      IntRegister::Pc  => self.pc,
      IntRegister::Sp  => self.sp,
      IntRegister::Bp  => self.bp,
      IntRegister::Ir0 => self.ir[0],
      IntRegister::Ir1 => self.ir[1],
      IntRegister::Ir2 => self.ir[2],
      IntRegister::Ir3 => self.ir[3],
      IntRegister::Irv => self.irv,
    }
  }

  fn set_int(&mut self, register: IntRegister, value: u16) {
    match register {
      IntRegister::Pc  => self.pc    = value,
      IntRegister::Sp  => self.sp    = value,
      IntRegister::Bp  => self.bp    = value,
      IntRegister::Ir0 => self.ir[0] = value,
      IntRegister::Ir1 => self.ir[1] = value,
      IntRegister::Ir2 => self.ir[2] = value,
      IntRegister::Ir3 => self.ir[3] = value,
      IntRegister::Irv => self.irv   = value,
    }
  }

  // endregion

  // region Float registers

  pub fn get_float(&self, id: RegisterId) -> Result<f32, ErrorKind> {
    Ok(self.float(FloatRegister::from_id(id)?))
  }

  pub fn set_float(&mut self, id: RegisterId, value: f32) -> Result<(), ErrorKind> {
    match FloatRegister::from_id(id)? {
      FloatRegister::Fr0 => self.fr[0] = value,
      FloatRegister::Fr1 => self.fr[1] = value,
      FloatRegister::Fr2 => self.fr[2] = value,
      FloatRegister::Fr3 => self.fr[3] = value,
      FloatRegister::Frv => self.frv   = value,
    }
    Ok(())
  }

  /// Unchecked read by name.
  pub fn float(&self, register: FloatRegister) -> f32 {
    match register {
      FloatRegister::Fr0 => self.fr[0],
      FloatRegister::Fr1 => self.fr[1],
      FloatRegister::Fr2 => self.fr[2],
      FloatRegister::Fr3 => self.fr[3],
      FloatRegister::Frv => self.frv,
    }
  }

  // endregion

  // region Comparison flag

  /// Compares the unsigned values of two integer registers. A register may be compared with
  /// itself.
  pub fn compare(&mut self, first: RegisterId, second: RegisterId) -> Result<(), ErrorKind> {
    let a = self.get_int(first)?;
    let b = self.get_int(second)?;
    self.cmp = a.cmp(&b).into();
    Ok(())
  }

  pub fn comparison(&self) -> Comparison {
    self.cmp
  }

  /// Consumes the comparison flag, leaving it uninitialized.
  pub fn take_comparison(&mut self) -> Comparison {
    std::mem::replace(&mut self.cmp, Comparison::Uninitialized)
  }

  // endregion

  // region Dedicated pointer registers

  pub fn pc(&self) -> AddressType { self.pc }
  pub fn sp(&self) -> AddressType { self.sp }
  pub fn bp(&self) -> AddressType { self.bp }

  pub(crate) fn set_pc(&mut self, address: AddressType) {
    self.pc = address;
  }

  pub(crate) fn set_sp(&mut self, address: AddressType) {
    self.sp = address;
  }

  // endregion
}

impl Default for RegisterFile {
  fn default() -> Self {
    RegisterFile::new(0)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;

  const ALL_INT: [IntRegister; 8] = [
    IntRegister::Pc,  IntRegister::Sp,  IntRegister::Bp,  IntRegister::Ir0,
    IntRegister::Ir1, IntRegister::Ir2, IntRegister::Ir3, IntRegister::Irv
  ];

  #[test]
  fn initial_state(){
    let registers = RegisterFile::new(0);
    assert_eq!(registers.pc(), 0);
    assert_eq!(registers.sp(), STACK_BASE);
    assert_eq!(registers.bp(), STACK_BASE);
    assert_eq!(registers.comparison(), Comparison::Uninitialized);
    assert_eq!(registers.status, Status::NoError);
    for id in 3..=7 {
      assert_eq!(registers.get_int(id), Ok(0));
    }
    for id in 0..=4 {
      assert_eq!(registers.get_float(id), Ok(0.0));
    }
  }

  #[test]
  fn general_setter_round_trips(){
    let mut registers = RegisterFile::new(0);
    for register in ALL_INT.iter().filter(|r| r.is_general()) {
      for value in [0u16, 1, 0x7FFF, 0xFFFF].iter() {
        assert_eq!(registers.set_int_general(register.id(), *value), Ok(()));
        assert_eq!(registers.get_int(register.id()), Ok(*value));
      }
    }
  }

  #[test]
  fn general_setter_rejects_pointers_and_return(){
    let mut registers = RegisterFile::new(0);
    let before = registers.clone();
    for register in [IntRegister::Pc, IntRegister::Sp, IntRegister::Bp, IntRegister::Irv].iter() {
      assert_eq!(
        registers.set_int_general(register.id(), 0x1234),
        Err(ErrorKind::RegisterNotAllowed)
      );
    }
    assert_eq!(registers, before);
  }

  #[test]
  fn any_setter_rejects_only_sp(){
    let mut registers = RegisterFile::new(0);
    assert_eq!(registers.set_int_any(IntRegister::Sp.id(), 1), Err(ErrorKind::RegisterNotAllowed));
    assert_eq!(registers.sp(), STACK_BASE);
    assert_eq!(registers.set_int_any(IntRegister::Pc.id(), 0x0030), Ok(()));
    assert_eq!(registers.pc(), 0x0030);
    assert_eq!(registers.set_int_any(IntRegister::Bp.id(), 0xF010), Ok(()));
    assert_eq!(registers.bp(), 0xF010);
    assert_eq!(registers.set_int_any(IntRegister::Irv.id(), 7), Ok(()));
    assert_eq!(registers.get_int(IntRegister::Irv.id()), Ok(7));
  }

  #[test]
  fn unrecognized_ids(){
    let mut registers = RegisterFile::new(0);
    assert_eq!(registers.get_int(8), Err(ErrorKind::RegisterUnrecognized));
    assert_eq!(registers.set_int_general(200, 1), Err(ErrorKind::RegisterUnrecognized));
    assert_eq!(registers.set_int_any(8, 1), Err(ErrorKind::RegisterUnrecognized));
    assert_eq!(registers.get_float(5), Err(ErrorKind::RegisterUnrecognized));
    assert_eq!(registers.set_float(5, 1.0), Err(ErrorKind::RegisterUnrecognized));
  }

  #[test]
  fn floats(){
    let mut registers = RegisterFile::new(0);
    registers.set_float(FloatRegister::Fr2.id(), -3.25).unwrap();
    registers.set_float(FloatRegister::Frv.id(), 8.5).unwrap();
    assert_eq!(registers.get_float(2), Ok(-3.25));
    assert_eq!(registers.float(FloatRegister::Frv), 8.5);
  }

  #[test]
  fn compare_is_unsigned(){
    let mut registers = RegisterFile::new(0);
    registers.set_int_general(IntRegister::Ir0.id(), 0xFFFF).unwrap();
    registers.set_int_general(IntRegister::Ir1.id(), 1).unwrap();
    registers.compare(IntRegister::Ir0.id(), IntRegister::Ir1.id()).unwrap();
    assert_eq!(registers.comparison(), Comparison::Greater);
    registers.compare(IntRegister::Ir1.id(), IntRegister::Ir0.id()).unwrap();
    assert_eq!(registers.comparison(), Comparison::Less);
    registers.compare(IntRegister::Ir1.id(), IntRegister::Ir1.id()).unwrap();
    assert_eq!(registers.take_comparison(), Comparison::Equal);
    assert_eq!(registers.comparison(), Comparison::Uninitialized);
  }

  #[test]
  fn checks_match_setters(){
    let registers = RegisterFile::new(0);
    assert_eq!(registers.check_general(IntRegister::Ir3.id()), Ok(()));
    assert_eq!(registers.check_general(IntRegister::Irv.id()), Err(ErrorKind::RegisterNotAllowed));
    assert_eq!(registers.check_any(IntRegister::Irv.id()), Ok(()));
    assert_eq!(registers.check_any(IntRegister::Sp.id()), Err(ErrorKind::RegisterNotAllowed));
    assert_eq!(registers.check_any(9), Err(ErrorKind::RegisterUnrecognized));
    assert_eq!(Comparison::Uninitialized.ordering(), None);
    assert_eq!(Comparison::Less.ordering(), Some(Ordering::Less));
  }

  #[test]
  fn register_names(){
    assert_eq!(IntRegister::from_str("ir2"), Ok(IntRegister::Ir2));
    assert_eq!(FloatRegister::from_str("frv"), Ok(FloatRegister::Frv));
    assert_eq!(format!("{}", IntRegister::Bp), "bp");
    assert!(IntRegister::from_str("fr0").is_err());
  }
}
