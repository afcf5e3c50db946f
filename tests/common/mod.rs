//! Shared helpers for the end-to-end assembly-shape tests in this directory.
//!
//! None of these tests invoke a system assembler or linker: per
//! SPEC_FULL.md §10.4, they drive the pipeline from source text through to
//! generated assembly text and assert on structural properties of that
//! text instead of on runtime program behavior.

use ncc::codegen::{Arch, Os};
use ncc::{compile_to_assembly, CompileOptions};

pub const ALL_TARGETS: [(Arch, Os); 4] =
    [(Arch::Aarch64, Os::MacOs), (Arch::Aarch64, Os::Linux), (Arch::X86_64, Os::MacOs), (Arch::X86_64, Os::Linux)];

/// Compiles `source` for every {architecture} x {OS} combination and
/// returns the resulting assembly text alongside the target that produced
/// it, panicking on the first compilation failure (these sources are all
/// expected to be accepted).
pub fn assemble_everywhere(source: &str) -> Vec<((Arch, Os), String)> {
    ALL_TARGETS
        .iter()
        .map(|&(arch, os)| {
            let asm = compile_to_assembly(source, CompileOptions { arch, os })
                .unwrap_or_else(|e| panic!("compilation failed for {:?}/{:?}: {}", arch, os, e));
            ((arch, os), asm)
        })
        .collect()
}

/// Asserts the three sections from §4.7 appear, in order: text, then data,
/// then the read-only string section. Section directive spelling differs by
/// OS, so the caller passes in the OS to pick the right needles.
pub fn assert_section_order(asm: &str, os: Os) {
    let (text_marker, data_marker, cstring_marker) = match os {
        Os::MacOs => ("__TEXT,__text", "__DATA,__data", "__TEXT,__cstring"),
        Os::Linux => (".text", ".data", ".rodata"),
    };
    let text_pos = asm.find(text_marker).unwrap_or_else(|| panic!("missing text section marker in:\n{}", asm));
    let data_pos = asm.find(data_marker).unwrap_or_else(|| panic!("missing data section marker in:\n{}", asm));
    let cstring_pos = asm.find(cstring_marker).unwrap_or_else(|| panic!("missing cstring section marker in:\n{}", asm));
    assert!(text_pos < data_pos, "text section must precede data section");
    assert!(data_pos < cstring_pos, "data section must precede the string section");
}

/// The function-body epilogue instruction each back-end always emits at
/// least once per function, regardless of explicit `return` statements.
pub fn epilogue_marker(arch: Arch) -> &'static str {
    match arch {
        Arch::Aarch64 => "ldp x29, x30, [sp], #16",
        Arch::X86_64 => "popq %rbp",
    }
}

/// The mangled form of a symbol name for a given OS: a leading underscore on
/// macOS, bare on Linux (§4.7).
pub fn mangled(os: Os, name: &str) -> String {
    match os {
        Os::MacOs => format!("_{}", name),
        Os::Linux => name.to_string(),
    }
}
