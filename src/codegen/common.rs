//! # Shared Code Generation Support
//!
//! Everything the AArch64 and x86-64 back-ends have in common: the mutable
//! per-function generation context (symbol table, string pool, label
//! counter), global-variable collection, and section-directive text. String
//! literals are decoded here, eagerly, before either back-end ever sees
//! them — resolving Open Question (d) in favor of explicit decoding at
//! codegen time rather than leaving raw backslash pairs for the assembler.

use crate::ast::nodes::*;
use crate::compiler::error::CompileError;
use crate::compiler::symtab::{Symbol, SymbolTable};

use super::{Arch, Os};

/// A global variable collected in one pass before any function is emitted,
/// so every function's codegen sees the complete global set.
pub struct GlobalInfo {
    pub name: String,
    pub is_array: bool,
    pub array_len: usize,
    pub init_value: i64,
}

/// Global initializers are literal (optionally negated) integers; anything
/// else is treated as zero-initialized.
pub fn collect_globals(program: &Program) -> Vec<GlobalInfo> {
    program
        .declarations
        .iter()
        .filter_map(|decl| match decl {
            TopLevel::Variable(v) => {
                let init_value = match &v.initializer {
                    Some(Expression::Number(n)) => *n,
                    Some(Expression::Unary { op: UnaryOp::Neg, operand }) => match **operand {
                        Expression::Number(n) => -n,
                        _ => 0,
                    },
                    _ => 0,
                };
                Some(GlobalInfo { name: v.name.clone(), is_array: v.is_array, array_len: v.array_size, init_value })
            }
            TopLevel::Function(_) => None,
        })
        .collect()
}

/// Decodes the standard backslash escapes; an unrecognized escape passes
/// the following character through unchanged.
pub fn decode_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Re-escapes a decoded string so a GNU-as `.asciz` directive can carry it
/// literally in the generated assembly text.
pub fn escape_for_asm(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            _ => out.push(c),
        }
    }
    out
}

/// macOS symbols (functions, globals, string labels) carry a leading
/// underscore; Linux symbols do not.
pub fn mangled(os: Os, name: &str) -> String {
    match os {
        Os::MacOs => format!("_{}", name),
        Os::Linux => name.to_string(),
    }
}

pub enum Section {
    Text,
    Data,
    Cstring,
}

pub fn section_directive(os: Os, section: Section) -> &'static str {
    match (os, section) {
        (Os::MacOs, Section::Text) => ".section __TEXT,__text\n",
        (Os::MacOs, Section::Data) => ".section __DATA,__data\n",
        (Os::MacOs, Section::Cstring) => ".section __TEXT,__cstring\n",
        (Os::Linux, Section::Text) => ".text\n",
        (Os::Linux, Section::Data) => ".data\n",
        (Os::Linux, Section::Cstring) => ".section .rodata\n",
    }
}

pub fn render_data_section(os: Os, globals: &[GlobalInfo]) -> String {
    let mut out = String::from(section_directive(os, Section::Data));
    for g in globals {
        let label = mangled(os, &g.name);
        out.push_str(&format!(".globl {}\n", label));
        if g.is_array {
            let bytes = 4 * g.array_len.max(1);
            out.push_str(&format!("{}:\n    .zero {}\n", label, bytes));
        } else {
            out.push_str(&format!("{}:\n    .long {}\n", label, g.init_value));
        }
    }
    out
}

pub fn render_string_section(os: Os, strings: &[String]) -> String {
    let mut out = String::from(section_directive(os, Section::Cstring));
    for (i, s) in strings.iter().enumerate() {
        let label = mangled(os, &format!("str{}", i));
        out.push_str(&format!("{}:\n    .asciz \"{}\"\n", label, escape_for_asm(s)));
    }
    out
}

/// Per-function mutable state threaded through a single back-end's codegen.
/// Each call to [`super::generate`] builds its own context; it is never
/// shared between the two back-ends.
pub struct CodegenContext {
    pub symtab: SymbolTable,
    pub strings: Vec<String>,
    pub label_counter: usize,
    pub os: Os,
    pub arch: Arch,
}

impl CodegenContext {
    pub fn new(arch: Arch, os: Os) -> Self {
        CodegenContext { symtab: SymbolTable::new(), strings: Vec::new(), label_counter: 0, os, arch }
    }

    /// `L<n>` control-flow labels, numbered from a counter reset at the
    /// start of every function.
    pub fn next_label(&mut self) -> String {
        let n = self.label_counter;
        self.label_counter += 1;
        format!("L{}", n)
    }

    /// Interns a string literal's decoded contents in encounter order and
    /// returns the index that becomes its label's numeric suffix.
    pub fn intern_string(&mut self, raw: &str) -> usize {
        let index = self.strings.len();
        self.strings.push(decode_escapes(raw));
        index
    }

    pub fn mangled(&self, name: &str) -> String {
        mangled(self.os, name)
    }

    pub fn string_label(&self, index: usize) -> String {
        self.mangled(&format!("str{}", index))
    }

    /// Resolves a name to its symbol, or raises the one semantic error this
    /// language has: reference to an undefined variable or array.
    pub fn lookup(&self, name: &str, line: usize, col: usize) -> Result<Symbol, CompileError> {
        self.symtab.find(name).cloned().ok_or_else(|| CompileError::undefined_variable(line, col, name))
    }
}
