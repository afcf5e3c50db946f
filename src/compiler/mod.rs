//! # Compiler Orchestration
//!
//! Aggregates the phases under one roof — lexer, parser, symbol table,
//! code generators, AST serializer, error type — and exposes the small set
//! of pipeline entry points the CLI driver calls: source text in, either
//! assembly text or an AST JSON dump out. Assembling and linking that
//! output into a binary is a separate, optional convenience
//! ([`Compiler::assemble_and_link`]) built on a shell-out to `cc`, not part
//! of the core translation pipeline.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod serializer;
pub mod symtab;

pub use lexer::tokenize;
pub use parser::parse;

use crate::ast::nodes::Program;
use crate::codegen::{self, Arch, Os};
use crate::debug;
use error::CompileError;

use std::path::{Path, PathBuf};
use std::process::Command;

/// The architecture/platform pair a compilation targets.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    pub arch: Arch,
    pub os: Os,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions { arch: Arch::host(), os: Os::host() }
    }
}

/// Runs the front end only (lexer + parser), producing an AST.
pub fn parse_source(source: &str) -> Result<Program, CompileError> {
    let timer = debug::PerfTimer::new("lex+parse");
    let tokens = tokenize(source)?;
    let program = parse(tokens)?;
    timer.finish();
    Ok(program)
}

/// The full pipeline: source text to target assembly text.
pub fn compile_to_assembly(source: &str, options: CompileOptions) -> Result<String, CompileError> {
    let program = parse_source(source)?;
    debug::log_codegen(&format!("generating {:?}/{:?} assembly", options.arch, options.os));
    codegen::generate(&program, options.arch, options.os)
}

/// The AST-dump pipeline: source text to a pretty-printed JSON tree,
/// bypassing code generation entirely.
pub fn compile_to_ast_json(source: &str) -> Result<String, CompileError> {
    let program = parse_source(source)?;
    serializer::to_pretty_string(&program).map_err(CompileError::from)
}

/// Drives a single source file through the pipeline and writes its output
/// to disk, matching the shape of the CLI driver in SPEC_FULL.md §10.5.
pub struct Compiler {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub options: CompileOptions,
    pub dump_ast: bool,
}

impl Compiler {
    pub fn new(source_path: PathBuf, output_path: PathBuf, options: CompileOptions, dump_ast: bool) -> Self {
        Compiler { source_path, output_path, options, dump_ast }
    }

    /// Reads the source file and writes either assembly text or an AST
    /// JSON dump to [`Self::output_path`].
    pub fn build(&self) -> Result<(), CompileError> {
        debug::log_compiler(&format!("reading {:?}", self.source_path));
        let source = std::fs::read_to_string(&self.source_path)?;

        let output = if self.dump_ast {
            compile_to_ast_json(&source)?
        } else {
            compile_to_assembly(&source, self.options)?
        };

        std::fs::write(&self.output_path, output)?;
        debug::log_compiler(&format!("wrote {:?}", self.output_path));
        Ok(())
    }

    /// Assembles and links the previously written assembly file into a
    /// native executable by shelling out to the system `cc`. This is a
    /// driver convenience, not part of the core translation pipeline, and
    /// is only meaningful when the compiler targeted the host's own
    /// architecture and OS.
    pub fn assemble_and_link(&self, binary_path: &Path) -> Result<(), CompileError> {
        debug::log_compiler(&format!("assembling and linking {:?}", binary_path));
        let status = Command::new("cc")
            .arg(&self.output_path)
            .arg("-o")
            .arg(binary_path)
            .status()?;
        if !status.success() {
            return Err(CompileError::Tooling(format!("cc exited with status {}", status)));
        }
        Ok(())
    }
}
