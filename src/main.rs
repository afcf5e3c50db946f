//! # ncc CLI
//!
//! The command-line driver: reads a source file, runs it through the
//! library pipeline, and writes either assembly text or (with
//! `--dump-ast`) a JSON rendering of the AST. Assembling and linking the
//! emitted assembly into a native binary is an optional convenience layered
//! on top by shelling out to `cc`; it is skipped entirely with `-S`, and
//! only makes sense when `--target`/`--os` agree with the host running this
//! driver.

mod ast;
mod codegen;
mod compiler;
mod debug;

use clap::Parser;
use compiler::{CompileOptions, Compiler};
use std::path::PathBuf;
use std::process;

use codegen::{Arch, Os};

/// A small-C-subset compiler targeting AArch64 and x86-64 assembly.
#[derive(Parser)]
#[command(name = "ncc", version, about)]
struct Cli {
    /// Source file to compile.
    input: PathBuf,

    /// Where to write the result. Defaults to `a.s` (or `a.json` with `--dump-ast`).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop after emitting assembly; don't assemble and link.
    #[arg(short = 'S')]
    assembly_only: bool,

    /// Emit the parsed AST as JSON instead of assembly.
    #[arg(long)]
    dump_ast: bool,

    /// Target architecture: `aarch64` or `x86-64`. Defaults to the host's.
    #[arg(long)]
    target: Option<String>,

    /// Target OS convention: `macos` or `linux`. Defaults to the host's.
    #[arg(long)]
    os: Option<String>,
}

fn parse_arch(s: &str) -> Result<Arch, String> {
    match s {
        "aarch64" | "arm64" => Ok(Arch::Aarch64),
        "x86-64" | "x86_64" | "amd64" => Ok(Arch::X86_64),
        other => Err(format!("unknown --target '{}' (expected aarch64 or x86-64)", other)),
    }
}

fn parse_os(s: &str) -> Result<Os, String> {
    match s {
        "macos" | "darwin" => Ok(Os::MacOs),
        "linux" => Ok(Os::Linux),
        other => Err(format!("unknown --os '{}' (expected macos or linux)", other)),
    }
}

fn main() {
    let cli = Cli::parse();

    let arch = match cli.target.as_deref().map(parse_arch).transpose() {
        Ok(arch) => arch.unwrap_or_else(Arch::host),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    let os = match cli.os.as_deref().map(parse_os).transpose() {
        Ok(os) => os.unwrap_or_else(Os::host),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let output_path = cli.output.unwrap_or_else(|| PathBuf::from(if cli.dump_ast { "a.json" } else { "a.s" }));

    let nc = Compiler::new(cli.input, output_path.clone(), CompileOptions { arch, os }, cli.dump_ast);

    if let Err(e) = nc.build() {
        eprintln!("{}", e);
        process::exit(1);
    }

    if !cli.dump_ast && !cli.assembly_only {
        let binary_path = output_path.with_extension("");
        if let Err(e) = nc.assemble_and_link(&binary_path) {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}
