use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use env_logger::Env;
use log::{debug, info};

use c16vm::address::AddressType;
use c16vm::loader::read_image;
use c16vm::{Assembler, Machine, State};

const USAGE: &str = "\
usage:
  c16vm asm  <source> [-o <output>] [--listing]
  c16vm run  <binary> [--base <address>] [--max-cycles <n>]
  c16vm exec <source> [--max-cycles <n>]";

/// Options shared by the subcommands. Each subcommand ignores the ones it has no use for.
struct Options {
  input      : PathBuf,
  output     : Option<PathBuf>,
  base       : AddressType,
  max_cycles : Option<u64>,
  listing    : bool,
}

fn parse_number(text: &str) -> Result<u64> {
  let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
    Some(hex) => u64::from_str_radix(hex, 16),
    None      => text.parse::<u64>()
  };
  value.with_context(|| format!("`{}` is not a number", text))
}

fn parse_options(args: &[String]) -> Result<Options> {
  let mut input      = None;
  let mut output     = None;
  let mut base       = 0;
  let mut max_cycles = None;
  let mut listing    = false;

  let mut args = args.iter();
  while let Some(arg) = args.next() {
    match arg.as_str() {
      "-o" | "--output" => {
        let path = args.next().context("-o needs a path")?;
        output = Some(PathBuf::from(path));
      }
      "--base" => {
        let value = parse_number(args.next().context("--base needs an address")?)?;
        if value > AddressType::MAX as u64 {
          bail!("base address 0x{:X} is outside memory", value);
        }
        base = value as AddressType;
      }
      "--max-cycles" => {
        max_cycles = Some(parse_number(args.next().context("--max-cycles needs a count")?)?);
      }
      "--listing" => listing = true,
      other if other.starts_with('-') => bail!("unknown option `{}`\n{}", other, USAGE),
      other => {
        if input.is_some() {
          bail!("unexpected argument `{}`\n{}", other, USAGE);
        }
        input = Some(PathBuf::from(other));
      }
    }
  }

  Ok(Options {
    input: input.context(USAGE)?,
    output,
    base,
    max_cycles,
    listing,
  })
}

fn assemble_file(path: &Path) -> Result<c16vm::Program> {
  let source = std::fs::read_to_string(path)
    .with_context(|| format!("could not read {}", path.display()))?;
  let program = Assembler::new()
    .assemble(&source)
    .with_context(|| format!("could not assemble {}", path.display()))?;
  debug!("{}: {} instructions, {} labels", path.display(), program.len(), program.symbols.len());
  Ok(program)
}

fn assemble_command(options: &Options) -> Result<()> {
  let program = assemble_file(&options.input)?;
  let output = options.output.clone().unwrap_or_else(|| options.input.with_extension("b"));
  std::fs::write(&output, program.to_image())
    .with_context(|| format!("could not write {}", output.display()))?;
  if options.listing {
    print!("{}", program.listing());
  }
  info!("wrote {} instructions to {}", program.len(), output.display());
  Ok(())
}

/// Runs a loaded machine and reports how it stopped. Returns whether it halted cleanly.
fn execute(mut machine: Machine, max_cycles: Option<u64>) -> bool {
  let state = match max_cycles {
    Some(limit) => machine.run_bounded(limit),
    None        => machine.run()
  };

  match state {
    State::Halted => {
      println!(
        "Halted after {} cycles. irv = 0x{:04X}",
        machine.cycles(),
        machine.registers().int(c16vm::registers::IntRegister::Irv)
      );
      true
    }
    State::Running => {
      println!("Stopped after reaching the limit of {} cycles.", machine.cycles());
      println!("{}", machine.diagnostics());
      false
    }
    State::Errored(kind) => {
      println!("Error: {}", kind);
      println!("{}", machine.diagnostics());
      false
    }
  }
}

fn run_command(options: &Options) -> Result<bool> {
  let image = read_image(&options.input)
    .with_context(|| format!("could not read {}", options.input.display()))?;
  let mut machine = Machine::new();
  let count = machine.load(options.base, &image)
    .with_context(|| format!("could not load {}", options.input.display()))?;
  info!("loaded {} instructions at 0x{:04X}", count, options.base);
  Ok(execute(machine, options.max_cycles))
}

fn exec_command(options: &Options) -> Result<bool> {
  let program = assemble_file(&options.input)?;
  let mut machine = Machine::new();
  machine.load(program.origin, &program.to_image())?;
  Ok(execute(machine, options.max_cycles))
}

fn dispatch(args: &[String]) -> Result<bool> {
  let (command, rest) = match args.split_first() {
    Some(split) => split,
    None        => bail!("{}", USAGE)
  };
  let options = parse_options(rest)?;
  match command.as_str() {
    "asm"  => assemble_command(&options).map(|_| true),
    "run"  => run_command(&options),
    "exec" => exec_command(&options),
    other  => bail!("unknown command `{}`\n{}", other, USAGE)
  }
}

fn main() {
  // RUST_LOG=debug c16vm exec program.s
  env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

  #[cfg(feature = "trace_computation")]
  info!("Computation tracing enabled");

  let args: Vec<String> = std::env::args().skip(1).collect();
  match dispatch(&args) {
    Ok(true)  => {}
    Ok(false) => process::exit(1),
    Err(error) => {
      eprintln!("Error: {:#}", error);
      process::exit(1);
    }
  }
}
