use std::fs::File;
use std::io::LineWriter;
use std::process::ExitCode;

use clap::Parser;
use clap_num::maybe_hex;
use log::{error, info};

use rv32sim::hart::memory::Wordsize;
use rv32sim::hart::Hart;
use rv32sim::loader::load_image_file;
use rv32sim::sim::run_to_halt;

/// Simulate a 32-bit RISC-V processor (RV32IM)
///
/// Loads a hex-record program image into simulated memory, executes it
/// from the reset address until ebreak, and writes one trace line per
/// executed instruction to the output file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Path to the input hex image
    input: String,

    /// Path to the output trace file
    output: String,

    /// Stop with an error if no ebreak occurs within this many
    /// instructions
    #[arg(short, long)]
    max_steps: Option<u64>,

    /// Print the 8-word memory region starting from this address after
    /// halt (use 0x prefix for hexadecimal)
    #[arg(short, long, value_parser=maybe_hex::<u32>)]
    dump: Option<u32>,
}

fn print_memory(hart: &Hart, base: u32) {
    for n in 0..8 {
        let addr = base.wrapping_add(4 * n);
        match hart.memory.read(addr, Wordsize::Word) {
            Ok(word) => println!("{addr:08x}: {word:08x}"),
            Err(_) => println!("{addr:08x}: (outside memory)"),
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut hart = Hart::new();

    match load_image_file(&args.input, &mut hart.memory) {
        Ok(bytes) => info!("loaded {bytes} bytes from {}", args.input),
        Err(e) => {
            error!("error loading {}: {e}", args.input);
            return ExitCode::FAILURE;
        }
    }

    let trace_file = match File::create(&args.output) {
        Ok(file) => file,
        Err(e) => {
            error!("error opening {} for writing: {e}", args.output);
            return ExitCode::FAILURE;
        }
    };
    let mut trace = LineWriter::new(trace_file);

    match run_to_halt(&mut hart, &mut trace, args.max_steps) {
        Ok(summary) => {
            info!(
                "halted normally after {} instructions, pc=0x{:08x}",
                summary.instructions, hart.pc
            );
        }
        Err(e) => {
            error!("simulation failed: {e}");
            return ExitCode::FAILURE;
        }
    }

    if let Some(base) = args.dump {
        println!("Memory:");
        print_memory(&hart, base);
    }

    ExitCode::SUCCESS
}
