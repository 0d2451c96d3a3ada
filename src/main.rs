//! mips-emu: assemble, run and schedule MIPS I code

use std::env;

use anyhow::{bail, Context};
use mips_emu::config::Config;
use mips_emu::interpreter::{run, CpuState, InstructionWindow};

/// Upper bound on executed instructions, in case the program loops.
const MAX_STEPS: u64 = 1_000_000;

const SAMPLE_PROGRAM: &str = "\
# Sum 10..1 into v0, then exercise memory and the accumulator.
        addi  t0, zero, 10
        add   v0, zero, zero
loop:   add   v0, v0, t0
        addi  t0, t0, -1
        bne   t0, zero, -12
        lui   s0, 0x1234
        ori   s0, s0, 0x5678
        lui   s1, 0x1000
        sw    s0, 0(s1)
        lw    s2, 0(s1)
        lb    s3, 0(s1)
        lb    s4, 3(s1)
        sh    s1, 2(s1)
        lw    s5, (s1)
        li    k0, 0x101
        lui   k1, 0x8000
        ori   k1, k1, 0x5a
        mult  k0, k1
        mflo  v1
        mfhi  a0
";

#[derive(Debug, Default)]
struct Options {
    analyze: bool,
    forwarding: bool,
    reorder: Option<Vec<bool>>,
    numeric: bool,
    path: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let options = parse_args(env::args().skip(1))?;
    let config = Config::get();

    let source = match &options.path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?,
        None => SAMPLE_PROGRAM.to_string(),
    };

    let mut window = InstructionWindow::with_model(config.pipeline_model());
    for (number, line) in source.lines().enumerate() {
        window
            .push_text(line)
            .with_context(|| format!("line {}: {}", number + 1, line.trim()))?;
    }
    log::info!("Assembled {} instructions", window.len());

    if let Some(bits) = &options.reorder {
        let swaps = window.reorder(bits);
        println!("Reorder: {} swaps at {:?}", swaps.len(), swaps);
    }

    if options.analyze {
        let cycles = window.analyze();
        print_listing(&window, "Stall analysis", cycles);
    }
    if options.forwarding {
        let cycles = window.analyze_with_forwarding();
        print_listing(&window, "Stall analysis with forwarding", cycles);
    }
    if options.analyze || options.forwarding {
        return Ok(());
    }

    let mut cpu = CpuState::from_config(config);
    let steps = run(&mut cpu, window.instructions(), 0, MAX_STEPS)?;
    if steps == MAX_STEPS {
        log::warn!("Stopped after {} steps", MAX_STEPS);
    }

    println!("Executed {} instructions", steps);
    println!();
    let symbolic = config.symbolic_registers() && !options.numeric;
    for line in cpu.register_dump(symbolic) {
        println!("{}", line);
    }
    let cells = cpu.memory().cells();
    if !cells.is_empty() {
        println!();
        for (address, value) in cells {
            println!("{:08x}: {:08x}", address, value);
        }
    }

    Ok(())
}

fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<Options> {
    let mut options = Options::default();
    let mut args = args.peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--analyze" | "-a" => options.analyze = true,
            "--forwarding" | "-f" => options.forwarding = true,
            "--numeric" | "-n" => options.numeric = true,
            "--reorder" | "-r" => {
                let bits = args.next().context("--reorder needs a string of 0/1 bits")?;
                options.reorder = Some(parse_bits(&bits)?);
            }
            "--sample-config" => {
                print!("{}", Config::sample_config());
                std::process::exit(0);
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => bail!("unknown option {}", flag),
            path => {
                if options.path.is_some() {
                    bail!("only one input file is supported");
                }
                options.path = Some(path.to_string());
            }
        }
    }

    Ok(options)
}

fn parse_bits(text: &str) -> anyhow::Result<Vec<bool>> {
    text.chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            other => bail!("bad reorder bit '{}'", other),
        })
        .collect()
}

fn print_listing(window: &InstructionWindow, title: &str, cycles: u64) {
    println!("{}", title);
    println!("{}", "=".repeat(title.len()));
    for (index, line) in window.listing().iter().enumerate() {
        println!("{:3}  {}", index, line);
    }
    println!("Total cycles: {}", cycles);
    println!();
}

fn print_usage() {
    println!("Usage: mips-emu [OPTIONS] [FILE]");
    println!();
    println!("Assembles FILE (or a built-in sample) and runs it, printing the registers.");
    println!();
    println!("Options:");
    println!("  -a, --analyze         Print stall analysis instead of running");
    println!("  -f, --forwarding      Print stall analysis with forwarding");
    println!("  -r, --reorder BITS    Reorder hazard-free pairs first (BITS like 0110)");
    println!("  -n, --numeric         Show register numbers instead of names");
    println!("      --sample-config   Print a sample configuration file");
    println!("  -h, --help            Show this help");
    println!();
    if let Some(path) = Config::user_config_path() {
        println!("User config: {}", path.display());
    }
}
