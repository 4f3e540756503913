use crate::span::Span;
use thiserror::Error;

/// Errors raised while evaluating and emitting a stylesheet.
///
/// Every variant is fatal to the current compile pass. Recoverable
/// conditions (a built-in called with an unexpected arity) never surface
/// as a `LessError`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LessError {
    #[error("{message}{}", location(span))]
    Compile { message: String, span: Option<Span> },

    #[error("Variable '{name}' is undefined{}", location(span))]
    UndefinedVariable { name: String, span: Option<Span> },

    #[error("Incompatible units: '{from}' and '{to}'")]
    IncompatibleUnits { from: String, to: String },

    #[error("Mixin '{name}' cannot include itself")]
    RecursiveMixin { name: String },

    #[error("Cannot load resource '{path}': {message}")]
    Resource { path: String, message: String },

    #[error("Invalid regular expression: {0}")]
    Regex(String),
}

fn location(span: &Option<Span>) -> String {
    span.as_ref()
        .map(|span| format!(" at {}", span))
        .unwrap_or_default()
}

impl LessError {
    pub fn compile(message: impl Into<String>) -> Self {
        Self::Compile {
            message: message.into(),
            span: None,
        }
    }

    pub fn undefined_variable(name: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            name: name.into(),
            span: None,
        }
    }

    pub fn incompatible_units(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::IncompatibleUnits {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn resource(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resource {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Attach a source location if the error does not carry one yet.
    /// Faults from nested expressions keep their innermost location.
    pub fn with_span(self, at: Option<&Span>) -> Self {
        let Some(at) = at else {
            return self;
        };
        match self {
            Self::Compile { message, span: None } => Self::Compile {
                message,
                span: Some(at.clone()),
            },
            Self::UndefinedVariable { name, span: None } => Self::UndefinedVariable {
                name,
                span: Some(at.clone()),
            },
            Self::Compile { .. } | Self::UndefinedVariable { .. } => self,
            other => Self::Compile {
                message: other.to_string(),
                span: Some(at.clone()),
            },
        }
    }

    pub fn span(&self) -> Option<&Span> {
        match self {
            Self::Compile { span, .. } | Self::UndefinedVariable { span, .. } => span.as_ref(),
            _ => None,
        }
    }
}

impl From<String> for LessError {
    fn from(s: String) -> Self {
        LessError::compile(s)
    }
}

impl From<&str> for LessError {
    fn from(s: &str) -> Self {
        LessError::compile(s)
    }
}
