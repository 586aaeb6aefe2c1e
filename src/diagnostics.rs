//! A read-only snapshot of a core and its rendering as tables. The engine never prints on its
//! own; callers capture a `Diagnostics` and display it.

use std::fmt::{Display, Formatter};

use prettytable::{format as TableFormat, Table};

use crate::address::{AddressType, RW_MAX};
use crate::bytecode::{Instruction, INSTRUCTION_SIZE};
use crate::error::Status;
use crate::machine::{Machine, State};
use crate::registers::{FloatRegister, IntRegister, RegisterFile};

/// Bytes of memory shown starting at `pc`.
pub const WINDOW_SIZE: usize = 16;
/// Bytes shown per table row.
const ROW_WIDTH: usize = 4;

#[derive(Clone, Debug)]
pub struct Diagnostics {
  pub core_id          : u8,
  pub state            : State,
  pub status           : Status,
  pub cycles           : u64,
  pub registers        : RegisterFile,
  pub last_instruction : Option<Instruction>,
  /// The raw record behind the most recent fetch.
  pub last_fetched     : [u8; INSTRUCTION_SIZE],
  /// Bytes `[RW_MAX, sp)`, oldest first.
  pub stack            : Vec<u8>,
  /// `WINDOW_SIZE` bytes starting at `pc`.
  pub window           : Vec<u8>,
}

impl Diagnostics {

  pub fn capture(machine: &Machine) -> Diagnostics {
    let registers = machine.registers().clone();
    let sp = registers.sp();
    let stack = match sp > RW_MAX {
      true  => machine.memory().read_block(RW_MAX, (sp - RW_MAX) as usize),
      false => vec![]
    };
    let window = machine.memory().read_block(registers.pc(), WINDOW_SIZE);

    Diagnostics {
      core_id          : registers.core_id,
      state            : machine.state(),
      status           : registers.status,
      cycles           : machine.cycles(),
      last_instruction : machine.last_instruction(),
      last_fetched     : machine.last_fetched(),
      registers,
      stack,
      window,
    }
  }

  pub fn status_code(&self) -> u8 {
    self.status.code()
  }

  // region Tables

  fn register_table(&self) -> Table {
    let mut table = Table::new();
    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Register", ubl->"Value"]);

    for register in INT_REGISTERS.iter() {
      let value = self.registers.int(*register);
      table.add_row(row![r->format!("{} =", register), format!("0x{:04X} ({})", value, value)]);
    }
    for register in FLOAT_REGISTERS.iter() {
      table.add_row(row![r->format!("{} =", register), format!("{:?}", self.registers.float(*register))]);
    }
    table.add_row(row![r->"cmp =", self.registers.comparison()]);
    table
  }

  /// One row per `ROW_WIDTH` bytes. The row starting at `highlight` is marked.
  fn byte_table(start: AddressType, bytes: &[u8], highlight: Option<AddressType>) -> Table {
    let mut table = Table::new();
    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Contents"]);

    for (i, chunk) in bytes.chunks(ROW_WIDTH).enumerate() {
      let address = start.wrapping_add((i * ROW_WIDTH) as AddressType);
      let contents = chunk
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<String>>()
        .join(" ");
      match highlight == Some(address) {
        true  => table.add_row(row![r->format!("* --> 0x{:04X}", address), contents]),
        false => table.add_row(row![r->format!("0x{:04X}", address), contents]),
      };
    }
    table
  }

  // endregion
}

const INT_REGISTERS: [IntRegister; 8] = [
  IntRegister::Pc,  IntRegister::Sp,  IntRegister::Bp,  IntRegister::Ir0,
  IntRegister::Ir1, IntRegister::Ir2, IntRegister::Ir3, IntRegister::Irv
];

const FLOAT_REGISTERS: [FloatRegister; 5] = [
  FloatRegister::Fr0, FloatRegister::Fr1, FloatRegister::Fr2, FloatRegister::Fr3, FloatRegister::Frv
];

lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl Display for Diagnostics {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let pc = self.registers.pc();
    let register_table = self.register_table();
    let stack_table    = Diagnostics::byte_table(RW_MAX, &self.stack, None);
    let window_table   = Diagnostics::byte_table(pc, &self.window, Some(pc));

    let mut combined_table = table!([register_table, stack_table, window_table]);
    combined_table.set_titles(row![ub->"Registers", ub->"Stack", ub->"Memory at pc"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    let last = match &self.last_instruction {
      Some(instruction) => instruction.to_string(),
      None              => "none".to_string()
    };

    let fetched = self.last_fetched
      .iter()
      .map(|b| format!("{:02X}", b))
      .collect::<Vec<String>>()
      .join(" ");

    write!(
      f,
      "Core {}: {}\tStatus: {}\tCycles: {}\nLast instruction: {}\tLast fetched: {}\n{}",
      self.core_id, self.state, self.status, self.cycles, last, fetched, combined_table
    )
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::assemble;

  fn run(source: &str) -> Machine {
    let program = assemble(source).unwrap();
    let mut machine = Machine::new();
    machine.load(0, &program.to_image()).unwrap();
    machine.run_bounded(100);
    machine
  }

  #[test]
  fn stack_holds_pushed_bytes(){
    let machine = run("SETI ir0 0x1234\nPSHI ir0\nSETF fr1 1.5\nPSHF fr1\nHALT");
    let diagnostics = machine.diagnostics();
    let mut expected = vec![0x34, 0x12];
    expected.extend_from_slice(&1.5f32.to_le_bytes());
    assert_eq!(diagnostics.stack, expected);
    assert_eq!(diagnostics.status_code(), 0xFF);
    assert_eq!(diagnostics.state, State::Halted);
    assert_eq!(diagnostics.cycles, 5);
  }

  #[test]
  fn window_starts_at_pc(){
    let machine = run("NOOP\nHALT\nSETI ir0 7");
    let diagnostics = machine.diagnostics();
    // pc has moved past the HALT.
    assert_eq!(diagnostics.registers.pc(), 12);
    assert_eq!(diagnostics.window.len(), WINDOW_SIZE);
    assert_eq!(&diagnostics.window[..3], &[0x0B, 0x03, 0x07]);
    assert!(diagnostics.stack.is_empty());
  }

  #[test]
  fn error_status_code(){
    let machine = run("SETI ir0 0\nDECI ir0");
    let diagnostics = machine.diagnostics();
    assert_eq!(diagnostics.status_code(), 0x0A);
    assert_eq!(diagnostics.last_instruction.map(|i| i.to_string()), Some("DECI ir0".to_string()));
  }

  #[test]
  fn renders_tables(){
    let machine = run("SETI ir2 42\nPSHI ir2\nHALT");
    let text = machine.diagnostics().to_string();
    assert!(text.contains("Core 0: halted"));
    assert!(text.contains("Last instruction: HALT"));
    assert!(text.contains("ir2 ="));
    assert!(text.contains("0x002A (42)"));
    assert!(text.contains("* --> 0x0012"));
    assert!(text.contains("2A 00"));
    assert!(text.contains("Last fetched: 01 00 00 00 00 00"));
  }

  #[test]
  fn undecodable_record_is_shown(){
    let mut image = vec![2, 0];
    image.extend_from_slice(&[0x00, 0, 0, 0, 0, 0]);
    image.extend_from_slice(&[0x30, 0xAB, 0xCD, 0, 0, 0]);
    let mut machine = Machine::new();
    machine.load(0, &image).unwrap();
    assert_eq!(machine.run(), State::Errored(crate::error::ErrorKind::UnrecognizedOpcode));

    let diagnostics = machine.diagnostics();
    assert_eq!(diagnostics.last_fetched, [0x30, 0xAB, 0xCD, 0, 0, 0]);
    assert_eq!(diagnostics.last_instruction, Some(Instruction::Noop));
    let text = diagnostics.to_string();
    assert!(text.contains("Last instruction: NOOP"));
    assert!(text.contains("Last fetched: 30 AB CD 00 00 00"));
  }
}
