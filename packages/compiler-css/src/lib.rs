//! Compiles an already built rule tree to CSS text.

pub mod ast;
pub mod compiler;
pub mod options;

pub use ast::*;
pub use compiler::{compile_to_css, StylesheetCompiler};
pub use options::*;
