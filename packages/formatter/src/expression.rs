//! The expression capability every value node implements, and the typed
//! scalar produced by evaluating one.

use crate::formatter::CssFormatter;
use sheen_color::Color;
use sheen_common::{LessError, LessResult, Span};
use std::fmt;
use std::rc::Rc;

pub type ExprRef = Rc<dyn Expression>;

/// Type tag of an evaluated expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Unknown,
    Number,
    Percent,
    String,
    Boolean,
    Color,
    /// A color whose alpha channel is significant
    Rgba,
}

impl DataType {
    pub fn is_color(self) -> bool {
        matches!(self, DataType::Color | DataType::Rgba)
    }
}

/// Result of evaluating an expression.
///
/// `Percent` holds the raw 0-100 number; dividing by 100 is always an
/// explicit step at the use site. `String` carries no payload: string
/// valued expressions produce their text through `Expression::append_to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Unknown,
    Number(f64),
    Percent(f64),
    Color(Color),
    Rgba(Color),
    Boolean(bool),
    String,
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Unknown => DataType::Unknown,
            Value::Number(_) => DataType::Number,
            Value::Percent(_) => DataType::Percent,
            Value::Color(_) => DataType::Color,
            Value::Rgba(_) => DataType::Rgba,
            Value::Boolean(_) => DataType::Boolean,
            Value::String => DataType::String,
        }
    }

    /// Numeric payload of a number or percentage
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) | Value::Percent(v) => Some(*v),
            _ => None,
        }
    }

    /// Number with percentages converted to a fraction
    pub fn as_fraction(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Percent(v) => Some(*v / 100.0),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(c) | Value::Rgba(c) => Some(*c),
            _ => None,
        }
    }

    /// Tag a computed color, keeping the alpha-aware variant only when needed
    pub fn color(color: Color) -> Value {
        if color.is_opaque() {
            Value::Color(color)
        } else {
            Value::Rgba(color)
        }
    }

    /// Write the value in CSS notation. String and unknown values write nothing.
    pub fn append_to(&self, unit: &str, formatter: &mut CssFormatter) {
        match self {
            Value::Number(v) => {
                formatter.append_value(*v, unit);
            }
            Value::Percent(v) => {
                formatter.append_value(*v, "%");
            }
            Value::Color(c) => {
                formatter.append_color(*c, None);
            }
            Value::Rgba(c) => {
                if c.is_opaque() {
                    formatter.append_color(*c, None);
                } else {
                    formatter.append_rgba(*c);
                }
            }
            Value::Boolean(b) => {
                formatter.append(if *b { "true" } else { "false" });
            }
            Value::String | Value::Unknown => {}
        }
    }
}

/// Capability implemented by every node that can appear as a value.
///
/// All methods take the formatter because evaluation may resolve variables
/// through the scope stack or render text through the output stack.
pub trait Expression: fmt::Debug {
    fn value(&self, formatter: &mut CssFormatter) -> LessResult<Value>;

    fn unit(&self, formatter: &mut CssFormatter) -> LessResult<String>;

    fn append_to(&self, formatter: &mut CssFormatter) -> LessResult<()>;

    fn data_type(&self, formatter: &mut CssFormatter) -> LessResult<DataType> {
        Ok(self.value(formatter)?.data_type())
    }

    fn double_value(&self, formatter: &mut CssFormatter) -> LessResult<f64> {
        match self.value(formatter)? {
            Value::Number(v) | Value::Percent(v) => Ok(v),
            Value::Boolean(b) => Ok(if b { 1.0 } else { 0.0 }),
            other => Err(LessError::compile(format!(
                "Expected a number but found {:?}",
                other.data_type()
            ))
            .with_span(self.span())),
        }
    }

    fn boolean_value(&self, formatter: &mut CssFormatter) -> LessResult<bool> {
        match self.value(formatter)? {
            Value::Boolean(b) => Ok(b),
            Value::Number(v) | Value::Percent(v) => Ok(v != 0.0),
            Value::String | Value::Unknown => Ok(!self.string_value(formatter)?.is_empty()),
            Value::Color(_) | Value::Rgba(_) => Ok(true),
        }
    }

    /// Text of the expression, rendered into a scratch buffer
    fn string_value(&self, formatter: &mut CssFormatter) -> LessResult<String> {
        formatter.push_buffer();
        let result = self.append_to(formatter);
        let text = formatter.capture_and_pop();
        result.map(|_| text)
    }

    /// Items of a list value. `None` for anything that is not a list.
    fn list_operands(&self, _formatter: &mut CssFormatter) -> LessResult<Option<Vec<ExprRef>>> {
        Ok(None)
    }

    /// Evaluated copy of a structured value, such as a list, that keeps its
    /// parts. `None` when the expression freezes to a single value.
    fn freeze(&self, _formatter: &mut CssFormatter) -> LessResult<Option<ExprRef>> {
        Ok(None)
    }

    fn span(&self) -> Option<&Span> {
        None
    }
}

/// An already evaluated value: literals from the source and the results of
/// eager evaluation (exported variables).
#[derive(Debug, Clone, PartialEq)]
pub struct ValueExpression {
    value: Value,
    unit: String,
    /// Source text for strings, and the original spelling of color literals
    text: Option<String>,
    span: Option<Span>,
}

impl ValueExpression {
    pub fn number(value: f64, unit: impl Into<String>) -> Self {
        Self::new(Value::Number(value), unit.into(), None)
    }

    pub fn percent(value: f64) -> Self {
        Self::new(Value::Percent(value), "%".to_string(), None)
    }

    pub fn color(color: Color) -> Self {
        Self::new(Value::color(color), String::new(), None)
    }

    /// A color literal that renders as written, e.g. `red` or `#FFF`
    pub fn color_literal(color: Color, source: impl Into<String>) -> Self {
        Self::new(Value::color(color), String::new(), Some(source.into()))
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self::new(Value::String, String::new(), Some(text.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(Value::Boolean(value), String::new(), None)
    }

    fn new(value: Value, unit: String, text: Option<String>) -> Self {
        Self {
            value,
            unit,
            text,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn into_ref(self) -> ExprRef {
        Rc::new(self)
    }

    /// Evaluate `expression` eagerly and freeze the result, so it stays
    /// valid after the scope it was computed in is gone.
    pub fn eval(formatter: &mut CssFormatter, expression: &dyn Expression) -> LessResult<ExprRef> {
        if let Some(frozen) = expression.freeze(formatter)? {
            return Ok(frozen);
        }
        let frozen = match expression.value(formatter)? {
            Value::String | Value::Unknown => {
                ValueExpression::string(expression.string_value(formatter)?)
            }
            value => ValueExpression::new(value, expression.unit(formatter)?, None),
        };
        let frozen = match expression.span() {
            Some(span) => frozen.with_span(span.clone()),
            None => frozen,
        };
        Ok(frozen.into_ref())
    }
}

impl Expression for ValueExpression {
    fn value(&self, _formatter: &mut CssFormatter) -> LessResult<Value> {
        Ok(self.value)
    }

    fn unit(&self, _formatter: &mut CssFormatter) -> LessResult<String> {
        Ok(self.unit.clone())
    }

    fn append_to(&self, formatter: &mut CssFormatter) -> LessResult<()> {
        match (&self.value, &self.text) {
            (Value::String | Value::Unknown, Some(text)) => {
                formatter.append(text);
            }
            (Value::Color(c), hint) => {
                formatter.append_color(*c, hint.as_deref());
            }
            (Value::Rgba(_), Some(hint)) if !formatter.inline_mode() => {
                formatter.append(hint);
            }
            (value, _) => value.append_to(&self.unit, formatter),
        }
        Ok(())
    }

    fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }
}
