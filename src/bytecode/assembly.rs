/*!
  The human readable textual form of bytecode is called assembly. This module parses assembly
  into `Instruction`s, leveraging the `strum` derives of the opcode and register enums for the
  mnemonic and register names.

  ```text
  # Comments start with '#' or ';'.
  main:   SETI ir0 5          # label, mnemonic, operands separated by spaces or commas
          SETI ir1, 0x0003
          CALL add
          HALT
  add:    ADDI ir0 ir1
          RETN
  ```

  Assembly takes two passes. The first parses every line and assigns each instruction its
  address, recording labels in a `SymbolTable`. The second converts operands, resolving label
  references. Address and value operands accept either a number or a label.
*/

use std::fmt::Write as FmtWrite;
use std::str::FromStr;

use nom::{
  branch::alt,
  bytes::complete::{tag, take_while1},
  character::complete::{alpha1, alphanumeric1, char as one_char, space0, space1},
  combinator::{opt, recognize, rest},
  multi::many0,
  sequence::{delimited, pair, preceded, terminated},
  IResult
};
use log::debug;

use super::binary::{encode, INSTRUCTION_SIZE};
use super::{Format, Instruction, Opcode, Operands};
use crate::address::{is_code_address, AddressType, RW_MIN};
use crate::error::AssemblyError;
use crate::loader;
use crate::registers::{FloatRegister, IntRegister, RegisterId};
use crate::symboltable::SymbolTable;

/// The result of assembling a source text: instructions laid out contiguously from `origin`.
#[derive(Clone, Debug)]
pub struct Program {
  pub origin       : AddressType,
  pub instructions : Vec<Instruction>,
  pub symbols      : SymbolTable,
}

impl Program {

  pub fn len(&self) -> usize {
    self.instructions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.instructions.is_empty()
  }

  /// The encoded instruction records, without a header.
  pub fn to_bytes(&self) -> Vec<u8> {
    self.instructions.iter().flat_map(|i| encode(i).to_vec()).collect()
  }

  /// A loader image: instruction count followed by the records.
  pub fn to_image(&self) -> Vec<u8> {
    loader::build_image(&self.instructions)
  }

  /// Address, raw bytes, label and disassembly of every instruction, one per line.
  pub fn listing(&self) -> String {
    let mut text = String::new();
    for (i, instruction) in self.instructions.iter().enumerate() {
      let address = self.origin + (i * INSTRUCTION_SIZE) as AddressType;
      if let Some(label) = self.symbols.get_symbol(address) {
        let _ = writeln!(text, "{}:", label);
      }
      let bytes = encode(instruction)
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<String>>()
        .join(" ");
      let _ = writeln!(text, "  0x{:04X}  [{}]  {}", address, bytes, instruction);
    }
    text
  }
}

// region Line parsing

/// The syntactic pieces of one source line. Every piece is optional.
#[derive(Debug, Eq, PartialEq)]
struct ParsedLine<'a> {
  label    : Option<&'a str>,
  mnemonic : Option<&'a str>,
  operands : Vec<&'a str>,
}

fn identifier(input: &str) -> IResult<&str, &str> {
  recognize(pair(
    alt((alpha1, tag("_"))),
    many0(alt((alphanumeric1, tag("_"), tag("."))))
  ))(input)
}

/// A register name, number, or label. Interpretation depends on the operand's position.
fn operand(input: &str) -> IResult<&str, &str> {
  take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '.' || c == '-' || c == '+')(input)
}

fn separator(input: &str) -> IResult<&str, &str> {
  alt((recognize(delimited(space0, one_char(','), space0)), space1))(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
  preceded(alt((one_char('#'), one_char(';'))), rest)(input)
}

fn parse_line(input: &str) -> IResult<&str, ParsedLine> {
  let (input, _)     = space0(input)?;
  let (input, label) = opt(terminated(identifier, preceded(space0, one_char(':'))))(input)?;
  let (input, _)     = space0(input)?;
  let (input, instr) = opt(pair(identifier, many0(preceded(separator, operand))))(input)?;
  let (input, _)     = space0(input)?;
  let (input, _)     = opt(comment)(input)?;

  let (mnemonic, operands) = match instr {
    Some((mnemonic, operands)) => (Some(mnemonic), operands),
    None                       => (None, vec![])
  };
  Ok((input, ParsedLine { label, mnemonic, operands }))
}

// endregion

// region Operand conversion

fn parse_integer(text: &str) -> Option<i64> {
  let (negative, digits) = match text.strip_prefix('-') {
    Some(digits) => (true, digits),
    None         => (false, text.strip_prefix('+').unwrap_or(text))
  };
  let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
    Some(hex) => i64::from_str_radix(hex, 16).ok()?,
    None      => digits.parse::<i64>().ok()?
  };
  match negative {
    true  => Some(-magnitude),
    false => Some(magnitude)
  }
}

fn starts_like_number(text: &str) -> bool {
  text.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+')
}

/// A pending instruction from the first pass.
struct Statement<'a> {
  line     : usize,
  opcode   : Opcode,
  operands : Vec<&'a str>,
}

struct OperandReader<'a, 'b> {
  line    : usize,
  opcode  : Opcode,
  symbols : &'b SymbolTable,
  texts   : std::slice::Iter<'b, &'a str>,
}

impl<'a, 'b> OperandReader<'a, 'b> {

  fn next_text(&mut self) -> &'a str {
    // Operand counts are checked before reading.
    self.texts.next().copied().unwrap_or("")
  }

  fn int_register(&mut self) -> Result<RegisterId, AssemblyError> {
    let text = self.next_text();
    IntRegister::from_str(&text.to_ascii_lowercase())
      .map(|r| r.id())
      .map_err(|_| AssemblyError::BadRegister {
        line: self.line, name: text.to_string(), expected: "integer"
      })
  }

  fn float_register(&mut self) -> Result<RegisterId, AssemblyError> {
    let text = self.next_text();
    FloatRegister::from_str(&text.to_ascii_lowercase())
      .map(|r| r.id())
      .map_err(|_| AssemblyError::BadRegister {
        line: self.line, name: text.to_string(), expected: "float"
      })
  }

  /// A register from the bank the opcode works on.
  fn register(&mut self) -> Result<RegisterId, AssemblyError> {
    match self.opcode.uses_float_registers() {
      true  => self.float_register(),
      false => self.int_register()
    }
  }

  fn byte(&mut self) -> Result<u8, AssemblyError> {
    let text = self.next_text();
    match parse_integer(text) {
      Some(value) if (0..=0xFF).contains(&value) => Ok(value as u8),
      _ => Err(AssemblyError::BadNumber { line: self.line, text: text.to_string(), expected: "byte" })
    }
  }

  /// A 16 bit value or address, given as a number or a label. Negative numbers down to
  /// -32768 are stored in two's complement.
  fn value(&mut self) -> Result<u16, AssemblyError> {
    let text = self.next_text();
    if !starts_like_number(text) {
      return self.symbols.get_address(text).ok_or_else(|| AssemblyError::UndefinedLabel {
        line: self.line, name: text.to_string()
      });
    }
    match parse_integer(text) {
      Some(value) if (-0x8000..=0xFFFF).contains(&value) => Ok(value as u16),
      _ => Err(AssemblyError::BadNumber { line: self.line, text: text.to_string(), expected: "16 bit value" })
    }
  }

  fn float(&mut self) -> Result<f32, AssemblyError> {
    let text = self.next_text();
    text.parse::<f32>().map_err(|_| AssemblyError::BadNumber {
      line: self.line, text: text.to_string(), expected: "float"
    })
  }

  fn read(&mut self) -> Result<Operands, AssemblyError> {
    let operands = match self.opcode.format() {
      Format::None                => Operands::None,
      Format::Register            => Operands::Register(self.register()?),
      Format::Address             => Operands::Address(self.value()?),
      Format::RegisterValue       => Operands::RegisterValue(self.register()?, self.value()?),
      Format::RegisterPair        => Operands::RegisterPair(self.register()?, self.register()?),
      Format::RegisterPairAddress =>
        Operands::RegisterPairAddress(self.int_register()?, self.int_register()?, self.value()?),
      Format::RegisterFloat       => Operands::RegisterFloat(self.float_register()?, self.float()?),
      Format::RegisterQuad        => Operands::RegisterQuad([
        self.int_register()?, self.int_register()?, self.byte()?, self.int_register()?
      ]),
    };
    Ok(operands)
  }
}

/// Number of operands written in assembly for each format.
fn arity(format: Format) -> usize {
  match format {
    Format::None                => 0,
    Format::Register            => 1,
    Format::Address             => 1,
    Format::RegisterValue       => 2,
    Format::RegisterPair        => 2,
    Format::RegisterPairAddress => 3,
    Format::RegisterFloat       => 2,
    Format::RegisterQuad        => 4,
  }
}

// endregion

/// Assembles source text into a `Program` placed at a fixed origin in the code block.
#[derive(Clone, Copy, Debug)]
pub struct Assembler {
  origin: AddressType
}

impl Assembler {

  pub fn new() -> Assembler {
    Assembler { origin: 0x0000 }
  }

  pub fn with_origin(origin: AddressType) -> Assembler {
    Assembler { origin }
  }

  pub fn assemble(&self, source: &str) -> Result<Program, AssemblyError> {
    let mut symbols    = SymbolTable::new();
    let mut statements = Vec::new();

    // First pass: syntax, mnemonics, arity, label addresses.
    for (index, text) in source.lines().enumerate() {
      let line = index + 1;
      let (remaining, parsed) = parse_line(text)
        .map_err(|_| AssemblyError::Syntax { line, text: text.trim().to_string() })?;
      if !remaining.is_empty() {
        return Err(AssemblyError::Syntax { line, text: remaining.trim().to_string() });
      }

      let address = self.address_of(statements.len(), line)?;

      if let Some(label) = parsed.label {
        if symbols.contains(label) {
          return Err(AssemblyError::DuplicateLabel { line, name: label.to_string() });
        }
        if symbols.insert(label, address).is_err() {
          return Err(match is_code_address(address) {
            true  => AssemblyError::AliasedLabel { line, name: label.to_string() },
            false => AssemblyError::CodeBlockFull { line }
          });
        }
      }

      if let Some(mnemonic) = parsed.mnemonic {
        let opcode = Opcode::from_str(&mnemonic.to_ascii_uppercase())
          .map_err(|_| AssemblyError::NotAnOperation { line, name: mnemonic.to_string() })?;
        let expected = arity(opcode.format());
        if parsed.operands.len() != expected {
          return Err(AssemblyError::WrongArity {
            line,
            mnemonic : opcode.to_string(),
            expected,
            found    : parsed.operands.len()
          });
        }
        // The instruction must end inside the code block.
        self.address_of(statements.len() + 1, line)?;
        statements.push(Statement { line, opcode, operands: parsed.operands });
      }
    }

    // Second pass: operands and label references.
    let mut instructions = Vec::with_capacity(statements.len());
    for statement in statements.iter() {
      let mut reader = OperandReader {
        line    : statement.line,
        opcode  : statement.opcode,
        symbols : &symbols,
        texts   : statement.operands.iter(),
      };
      let operands = reader.read()?;
      let instruction = Instruction::from_parts(statement.opcode, operands)
        .ok_or(AssemblyError::Syntax { line: statement.line, text: statement.opcode.to_string() })?;
      instructions.push(instruction);
    }

    debug!(
      "assembled {} instructions and {} labels at 0x{:04X}",
      instructions.len(), symbols.len(), self.origin
    );

    Ok(Program { origin: self.origin, instructions, symbols })
  }

  /// Address of the instruction at `index`, which must not reach past the code block.
  fn address_of(&self, index: usize, line: usize) -> Result<AddressType, AssemblyError> {
    let address = self.origin as usize + index * INSTRUCTION_SIZE;
    match address <= RW_MIN as usize {
      true  => Ok(address as AddressType),
      false => Err(AssemblyError::CodeBlockFull { line })
    }
  }
}

impl Default for Assembler {
  fn default() -> Self {
    Assembler::new()
  }
}

/// Assembles `source` at origin `0x0000`.
pub fn assemble(source: &str) -> Result<Program, AssemblyError> {
  Assembler::new().assemble(source)
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::{Condition, IntOp, RegisterKind};

  #[test]
  fn parse_full_line(){
    let (rest, line) = parse_line("  loop:  ADDI ir0, ir1   # add").unwrap();
    assert_eq!(rest, "");
    assert_eq!(line, ParsedLine { label: Some("loop"), mnemonic: Some("ADDI"), operands: vec!["ir0", "ir1"] });
  }

  #[test]
  fn parse_blank_and_comment_lines(){
    let (rest, line) = parse_line("   ; nothing here").unwrap();
    assert_eq!(rest, "");
    assert_eq!(line, ParsedLine { label: None, mnemonic: None, operands: vec![] });
    let (rest, line) = parse_line("").unwrap();
    assert_eq!(rest, "");
    assert_eq!(line.mnemonic, None);
  }

  #[test]
  fn parse_label_only(){
    let (_, line) = parse_line("done:").unwrap();
    assert_eq!(line.label, Some("done"));
    assert_eq!(line.mnemonic, None);
  }

  #[test]
  fn integers(){
    assert_eq!(parse_integer("42"), Some(42));
    assert_eq!(parse_integer("0x4000"), Some(0x4000));
    assert_eq!(parse_integer("-1"), Some(-1));
    assert_eq!(parse_integer("0xZZ"), None);
  }

  #[test]
  fn assemble_straight_line(){
    let program = assemble("SETI ir0 5\nSETI ir1 3\nADDI ir0 ir1\nHALT\n").unwrap();
    assert_eq!(program.instructions, vec![
      Instruction::SetInt { reg: 3, value: 5 },
      Instruction::SetInt { reg: 4, value: 3 },
      Instruction::IntArithmetic { op: IntOp::Add, src: 3, dst: 4 },
      Instruction::Halt,
    ]);
    assert_eq!(&program.to_bytes()[0..6], &[0x0B, 0x03, 0x05, 0x00, 0x00, 0x00]);
  }

  #[test]
  fn forward_and_backward_labels(){
    let source = "
      start:  JUMP end
      back:   NOOP
      end:    JLTI ir0 ir1 back
              CALL start
    ";
    let program = assemble(source).unwrap();
    assert_eq!(program.symbols.get_address("start"), Some(0x0000));
    assert_eq!(program.symbols.get_address("back"), Some(0x0006));
    assert_eq!(program.symbols.get_address("end"), Some(0x000C));
    assert_eq!(program.instructions[0], Instruction::Jump { target: 0x000C });
    assert_eq!(
      program.instructions[2],
      Instruction::Branch { condition: Condition::Less, first: 3, second: 4, target: 0x0006 }
    );
    assert_eq!(program.instructions[3], Instruction::Call { target: 0x0000 });
  }

  #[test]
  fn float_operands_and_case(){
    let program = assemble("setf FR1 -2.5\npshf fr1\nlodf frv 0x4000").unwrap();
    assert_eq!(program.instructions, vec![
      Instruction::SetFloat { reg: 1, value: -2.5 },
      Instruction::Push { kind: RegisterKind::Float, reg: 1 },
      Instruction::Load { kind: RegisterKind::Float, reg: 4, address: 0x4000 },
    ]);
  }

  #[test]
  fn negative_immediates_wrap(){
    let program = assemble("SETI ir2 -1").unwrap();
    assert_eq!(program.instructions[0], Instruction::SetInt { reg: 5, value: 0xFFFF });
  }

  #[test]
  fn origin_offsets_labels(){
    let program = Assembler::with_origin(0x0100).assemble("x: NOOP\ny: JUMP x").unwrap();
    assert_eq!(program.symbols.get_address("y"), Some(0x0106));
    assert_eq!(program.instructions[1], Instruction::Jump { target: 0x0100 });
  }

  #[test]
  fn errors_carry_line_numbers(){
    assert_eq!(
      assemble("NOOP\nFROB ir0").unwrap_err(),
      AssemblyError::NotAnOperation { line: 2, name: "FROB".to_string() }
    );
    assert_eq!(
      assemble("ADDI ir0").unwrap_err(),
      AssemblyError::WrongArity { line: 1, mnemonic: "ADDI".to_string(), expected: 2, found: 1 }
    );
    assert_eq!(
      assemble("\n\nPSHI fr0").unwrap_err(),
      AssemblyError::BadRegister { line: 3, name: "fr0".to_string(), expected: "integer" }
    );
    assert_eq!(
      assemble("JUMP nowhere").unwrap_err(),
      AssemblyError::UndefinedLabel { line: 1, name: "nowhere".to_string() }
    );
    assert_eq!(
      assemble("a: NOOP\na: NOOP").unwrap_err(),
      AssemblyError::DuplicateLabel { line: 2, name: "a".to_string() }
    );
    assert_eq!(
      assemble("SETI ir0 0x10000").unwrap_err(),
      AssemblyError::BadNumber { line: 1, text: "0x10000".to_string(), expected: "16 bit value" }
    );
    assert_eq!(
      assemble("a: b: NOOP").unwrap_err(),
      AssemblyError::Syntax { line: 1, text: ": NOOP".to_string() }
    );
    assert_eq!(
      assemble("x: NOOP\ny:\nz: HALT").unwrap_err(),
      AssemblyError::AliasedLabel { line: 3, name: "z".to_string() }
    );
    assert!(matches!(assemble("ADDI ir0 ir1 )"), Err(AssemblyError::Syntax { line: 1, .. })));
  }

  #[test]
  fn code_block_limit(){
    let fits = "NOOP\n".repeat(RW_MIN as usize / INSTRUCTION_SIZE);
    assert!(assemble(&fits).is_ok());
    let too_many = "NOOP\n".repeat(RW_MIN as usize / INSTRUCTION_SIZE + 1);
    assert!(matches!(assemble(&too_many), Err(AssemblyError::CodeBlockFull { .. })));
  }

  #[test]
  fn listing_shows_labels_and_bytes(){
    let program = assemble("main: SETI ir0 1\n      HALT").unwrap();
    let listing = program.listing();
    assert!(listing.contains("main:"));
    assert!(listing.contains("0x0000  [0B 03 01 00 00 00]  SETI ir0 0x0001"));
    assert!(listing.contains("0x0006  [01 00 00 00 00 00]  HALT"));
  }
}
