//! # Sheen Evaluator
//!
//! Function calls and the built-in function table, plus the variable and
//! list nodes built-ins operate on.
//!
//! ```text
//! FunctionExpression ──► built-in table ──► sheen-color
//!        │                      │
//!        └── passthrough ◄──────┘ (unknown name, unfit arguments)
//! ```

pub mod encoding;
pub mod function;
pub mod nodes;
pub mod units;

mod strings;
mod svg;

#[cfg(test)]
mod tests_builtins;
#[cfg(test)]
mod tests_text_builtins;

pub use function::FunctionExpression;
pub use nodes::{ListExpression, Separator, VariableExpression};
pub use units::unit_factor;
