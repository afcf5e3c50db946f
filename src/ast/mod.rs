//! # Abstract Syntax Tree
//!
//! This module defines the tagged-variant tree produced by the parser and
//! consumed by the code generators and the JSON serializer. The tree is
//! built once per compilation and never mutated afterward.

pub mod nodes;

pub use nodes::*;
