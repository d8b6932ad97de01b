use std::fs::{self, File};
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, Result};

use scisa::runtime::{Cpu, MemoryIo};
use scisa::sce::{self, Image};
use scisa::{disasm, linker, Assembler};

/// Scisa is an assembler, linker and virtual machine toolchain for the
/// SCISA instruction set.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a linked `.sce` image until the CPU halts
    Run {
        /// `.sce` file to execute
        name: PathBuf,
    },
    /// Single-step a `.sce` image, dumping CPU state per line of stdin
    Dbg {
        /// `.sce` file to debug
        name: PathBuf,
    },
    /// Assemble and link source into a `.sce` image
    Asm {
        /// Source file; stdin when omitted
        infile: Option<PathBuf>,
        /// Destination file; stdout when omitted
        outfile: Option<PathBuf>,
    },
    /// Print a disassembly listing of a `.sce` image
    Dis {
        /// `.sce` file to list
        name: PathBuf,
    },
}

/// RAM available to programs under the CLI drivers.
const RAM_SIZE: usize = 256;
/// The terminal device overlaps the top RAM byte; devices win on byte
/// access, so stores there print instead of landing in RAM.
const TTY_ADDR: u8 = 255;

/// Terminal output device: stored bytes go to stderr, loads read 0.
struct TextIo;

impl MemoryIo for TextIo {
    fn store(&mut self, _offset: usize, val: u8) {
        let _ = io::stderr().write_all(&[val]);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Run { name } => run(&name),
        Command::Dbg { name } => dbg(&name),
        Command::Asm { infile, outfile } => asm(infile, outfile),
        Command::Dis { name } => dis(&name),
    }
}

fn load_image(path: &Path) -> Result<Image> {
    let bytes = fs::read(path).into_diagnostic()?;
    sce::read(&mut bytes.as_slice()).into_diagnostic()
}

/// Wire up a fresh 8-bit machine: TEXT as program memory, DATA at the
/// bottom of RAM, the terminal device on top.
fn boot(image: Image) -> Result<Cpu<u8>> {
    if image.data.len() > RAM_SIZE {
        bail!("Data section does not fit in {RAM_SIZE} bytes of memory");
    }
    let mut ram = vec![0; RAM_SIZE];
    ram[..image.data.len()].copy_from_slice(&image.data);

    let mut cpu = Cpu::new(image.text);
    cpu.map_mem(0, ram);
    cpu.map_io(TTY_ADDR, 1, Box::new(TextIo));
    Ok(cpu)
}

fn run(name: &Path) -> Result<()> {
    let mut cpu = boot(load_image(name)?)?;

    // Every program ends in a halt condition; even running off the end
    // of the program is "PC out of bounds".
    loop {
        cpu.step(1024);
        if let Some(error) = cpu.error() {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    }
}

fn dbg(name: &Path) -> Result<()> {
    let mut cpu = boot(load_image(name)?)?;

    dump(&cpu);
    for line in io::stdin().lock().lines() {
        line.into_diagnostic()?;
        cpu.step(1);
        if let Some(error) = cpu.error() {
            println!("Error: {error}");
            std::process::exit(1);
        }
        dump(&cpu);
    }
    Ok(())
}

fn dump(cpu: &Cpu<u8>) {
    println!("PC {}; SP {}", cpu.pc, cpu.sp);
    println!("ACC {}; X {}; Y {}", cpu.acc, cpu.x, cpu.y);
    println!(
        "Z{} C{} N{} V{}",
        cpu.flags.zero() as u8,
        cpu.flags.carry() as u8,
        cpu.flags.negative() as u8,
        cpu.flags.overflow() as u8,
    );
    let ahead = cpu.pmem().get(cpu.pc as usize..).unwrap_or(&[]);
    let (text, _) = disasm::disasm(ahead);
    println!("{text}");
}

fn asm(infile: Option<PathBuf>, outfile: Option<PathBuf>) -> Result<()> {
    // Available until end of program
    let src: &'static str = match &infile {
        Some(path) => Box::leak(Box::new(fs::read_to_string(path).into_diagnostic()?)),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).into_diagnostic()?;
            Box::leak(Box::new(buf))
        }
    };

    let mut assembly = Assembler::new(src).assemble()?;
    linker::link(&mut assembly, src)?;

    let image = Image {
        text: assembly.text.content,
        data: assembly.data.content,
    };

    match outfile {
        Some(path) => {
            let mut file = File::create(&path).into_diagnostic()?;
            sce::write(&mut file, &image).into_diagnostic()?;
            println!(
                "{:>12} {}",
                "Saved to".green().bold(),
                path.to_string_lossy()
            );
        }
        // Binary on stdout, so no status lines
        None => sce::write(&mut io::stdout().lock(), &image).into_diagnostic()?,
    }
    Ok(())
}

fn dis(name: &Path) -> Result<()> {
    let image = load_image(name)?;

    let mut at = 0;
    while at < image.text.len() {
        let (text, len) = disasm::disasm(&image.text[at..]);
        println!("{at:4}  {text}");
        at += len;
    }
    Ok(())
}
