//! # ncc
//!
//! A small-C-subset compiler: hand-written lexer and recursive-descent
//! parser, a tagged-variant AST, and two independent code generators
//! (AArch64 and x86-64) under macOS or Linux platform conventions. The
//! pipeline is a single batch pass: source text → tokens → AST → target
//! assembly text (or, with `--dump-ast`, a JSON rendering of the AST
//! instead of assembly).

pub mod ast;
pub mod codegen;
pub mod compiler;
pub mod debug;

pub use compiler::{compile_to_ast_json, compile_to_assembly, parse_source, CompileOptions, Compiler};
pub use compiler::{parse, tokenize};
