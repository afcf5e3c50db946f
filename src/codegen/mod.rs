//! # Code Generation
//!
//! This module orchestrates translating the AST into target assembly text.
//! Two independent back-ends exist, one per architecture; there is no
//! shared IR between them, matching the one-pass, direct-to-text style of
//! each individual generator.
//!
//! - [`aarch64`]: AArch64 (Apple silicon / `arm64` Linux) assembly.
//! - [`x86_64`]: x86-64 (SysV ABI) assembly.
//!
//! [`common`] holds everything both back-ends share: the generation
//! context, global-variable collection, and section/label text that does
//! not depend on the instruction set.

pub mod aarch64;
pub mod common;
pub mod x86_64;

use crate::ast::nodes::Program;
use crate::compiler::error::CompileError;

/// The two instruction sets this compiler targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Aarch64,
    X86_64,
}

/// The two platform conventions this compiler targets: section directive
/// spelling, symbol mangling (leading underscore or not), and PIC addressing
/// form all vary by `Os`, never by `Arch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    MacOs,
    Linux,
}

impl Arch {
    /// The architecture of the machine running the compiler, used as the
    /// CLI driver's default `--target` when none is given.
    pub fn host() -> Arch {
        match target_lexicon::Triple::host().architecture {
            target_lexicon::Architecture::Aarch64(_) => Arch::Aarch64,
            _ => Arch::X86_64,
        }
    }
}

impl Os {
    /// The operating system of the machine running the compiler, used as
    /// the CLI driver's default `--os` when none is given.
    pub fn host() -> Os {
        let triple = target_lexicon::Triple::host().to_string();
        if triple.contains("darwin") || triple.contains("apple") {
            Os::MacOs
        } else {
            Os::Linux
        }
    }
}

/// Generates assembly text for `program` targeting `arch`/`os`. The two
/// back-ends are otherwise unaware of each other.
pub fn generate(program: &Program, arch: Arch, os: Os) -> Result<String, CompileError> {
    match arch {
        Arch::Aarch64 => aarch64::generate(program, os),
        Arch::X86_64 => x86_64::generate(program, os),
    }
}
