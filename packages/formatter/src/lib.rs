//! # Sheen Formatter
//!
//! Evaluation context and CSS output engine of the sheen stylesheet
//! compiler. Expressions of the rule tree implement [`Expression`] and are
//! evaluated against a [`CssFormatter`], which resolves variables through
//! its scope stack and assembles the emitted rule blocks.

pub mod expression;
pub mod extend;
pub mod formatter;
pub mod output;
pub mod scope;

pub use expression::{DataType, ExprRef, Expression, Value, ValueExpression};
pub use extend::ExtendMap;
pub use formatter::{format_number, remove_quote, CssFormatter, FormatterOptions, StackId};
pub use output::{BufferId, BufferPool, OutputSegment};
pub use scope::{same_rule, Bindings, MixinScope, RuleRef, ScopeStack};
