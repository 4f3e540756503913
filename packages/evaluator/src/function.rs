//! Function call expressions and the built-in function table.
//!
//! A call evaluates to one of three outcomes: a typed value, another
//! expression it renders as (parentheses, `extract`), or passthrough. A
//! passthrough call is written back unchanged, as `name(arg, arg)`, which is
//! how CSS functions the compiler does not know (and built-ins called with a
//! shape they cannot handle) survive compilation.

use crate::strings::{append_text_builtin, is_text_builtin};
use crate::units::unit_factor;
use sheen_color::{
    color_digit, contrast, luma, luminance, mix, multiply, round_half_up, screen, Color, Hsl, Hsv,
};
use sheen_common::{LessError, LessResult, Span};
use sheen_formatter::{remove_quote, CssFormatter, DataType, ExprRef, Expression, StackId, Value};
use std::cell::RefCell;
use std::f64::consts::PI;
use std::rc::Rc;
use tracing::{debug, trace};

/// Why a built-in could not produce a result
#[derive(Debug)]
pub(crate) enum CallError {
    /// The arguments do not fit the built-in (missing argument, operand of
    /// the wrong kind, incompatible units). The call is written through.
    Arity,
    /// A real error, fatal to the compile pass
    Fault(LessError),
}

impl From<LessError> for CallError {
    fn from(err: LessError) -> Self {
        match err {
            LessError::IncompatibleUnits { .. } => CallError::Arity,
            other => CallError::Fault(other),
        }
    }
}

pub(crate) type CallResult<T> = Result<T, CallError>;

#[derive(Debug, Clone)]
enum Outcome {
    Value(Value),
    /// Renders exactly as the wrapped expression
    Forward(ExprRef),
    Passthrough,
}

#[derive(Debug)]
pub struct FunctionExpression {
    name: String,
    key: String,
    parameters: Vec<ExprRef>,
    span: Option<Span>,
    /// Last outcome and the scope stack id it was computed under
    memo: RefCell<Option<(StackId, Outcome)>>,
}

impl FunctionExpression {
    pub fn new(name: impl Into<String>, parameters: Vec<ExprRef>) -> Self {
        let name = name.into();
        Self {
            key: name.to_ascii_lowercase(),
            name,
            parameters,
            span: None,
            memo: RefCell::new(None),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn into_ref(self) -> ExprRef {
        Rc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[ExprRef] {
        &self.parameters
    }

    /// Lower case name used for dispatch
    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub(crate) fn arg(&self, idx: usize) -> CallResult<&ExprRef> {
        self.parameters.get(idx).ok_or(CallError::Arity)
    }

    pub(crate) fn number(&self, idx: usize, f: &mut CssFormatter) -> CallResult<f64> {
        match self.arg(idx)?.value(f)? {
            Value::Number(v) | Value::Percent(v) => Ok(v),
            Value::Boolean(b) => Ok(if b { 1.0 } else { 0.0 }),
            _ => Err(CallError::Arity),
        }
    }

    fn int(&self, idx: usize, f: &mut CssFormatter) -> CallResult<i64> {
        Ok(self.number(idx, f)?.trunc() as i64)
    }

    fn int_or(&self, idx: usize, default: i64, f: &mut CssFormatter) -> CallResult<i64> {
        if idx >= self.arity() {
            return Ok(default);
        }
        self.int(idx, f)
    }

    /// Fraction in [0, 1] for percentages, the plain number otherwise
    pub(crate) fn percent(&self, idx: usize, f: &mut CssFormatter) -> CallResult<f64> {
        self.arg(idx)?
            .value(f)?
            .as_fraction()
            .ok_or(CallError::Arity)
    }

    fn percent_or(&self, idx: usize, default: f64, f: &mut CssFormatter) -> CallResult<f64> {
        if idx >= self.arity() {
            return Ok(default);
        }
        self.percent(idx, f)
    }

    /// 8-bit channel; percentages are scaled by 2.55
    fn color_digit(&self, idx: usize, f: &mut CssFormatter) -> CallResult<f64> {
        let digit = match self.arg(idx)?.value(f)? {
            Value::Percent(v) => v * 2.55,
            Value::Number(v) => v,
            _ => return Err(CallError::Arity),
        };
        Ok(color_digit(digit) as f64)
    }

    /// A color argument together with its value, so results can keep the
    /// input's alpha awareness
    pub(crate) fn color(&self, idx: usize, f: &mut CssFormatter) -> CallResult<(Color, Value)> {
        let value = self.arg(idx)?.value(f)?;
        let color = value.as_color().ok_or(CallError::Arity)?;
        Ok((color, value))
    }

    fn color_or(&self, idx: usize, default: Color, f: &mut CssFormatter) -> CallResult<Color> {
        if idx >= self.arity() {
            return Ok(default);
        }
        Ok(self.color(idx, f)?.0)
    }

    /// Text of an argument with surrounding quotes removed
    pub(crate) fn unquoted(&self, idx: usize, f: &mut CssFormatter) -> CallResult<String> {
        let text = self.arg(idx)?.string_value(f)?;
        Ok(remove_quote(&text).to_string())
    }

    /// First argument converted to radians
    fn radians(&self, f: &mut CssFormatter) -> CallResult<f64> {
        let unit = self.arg(0)?.unit(f)?;
        Ok(self.number(0, f)? * unit_factor(&unit, "rad")?)
    }

    /// Items of a list argument. Anything else is a list of one.
    fn list(&self, idx: usize, f: &mut CssFormatter) -> CallResult<Vec<ExprRef>> {
        let arg = self.arg(idx)?;
        Ok(arg.list_operands(f)?.unwrap_or_else(|| vec![arg.clone()]))
    }

    /// Number or percentage, following the type of the first argument
    fn numeric_like_first(&self, value: f64, f: &mut CssFormatter) -> CallResult<Value> {
        Ok(match self.arg(0)?.data_type(f)? {
            DataType::Percent => Value::Percent(value),
            _ => Value::Number(value),
        })
    }

    fn outcome(&self, f: &mut CssFormatter) -> LessResult<Outcome> {
        let stack_id = f.stack_id();
        if let Some((id, outcome)) = self.memo.borrow().as_ref() {
            if *id == stack_id {
                return Ok(outcome.clone());
            }
        }

        let outcome = match self.evaluate(f) {
            Ok(outcome) => outcome,
            Err(CallError::Arity) => {
                debug!(function = %self.name, "Arguments do not fit built-in, writing call through");
                Outcome::Passthrough
            }
            Err(CallError::Fault(err)) => return Err(err.with_span(self.span.as_ref())),
        };
        *self.memo.borrow_mut() = Some((stack_id, outcome.clone()));
        Ok(outcome)
    }

    fn evaluate(&self, f: &mut CssFormatter) -> CallResult<Outcome> {
        trace!(function = %self.name, args = self.arity(), "Evaluating built-in");

        let value = match self.key.as_str() {
            "" => {
                if self.arity() > 1 {
                    let at = self.parameters[0].span().or(self.span.as_ref());
                    return Err(CallError::Fault(
                        LessError::compile("Unrecognised input").with_span(at),
                    ));
                }
                return Ok(Outcome::Forward(self.arg(0)?.clone()));
            }

            // math
            "percentage" => Value::Percent(self.number(0, f)? * 100.0),
            "convert" => {
                let target = self.unquoted(1, f)?;
                let param = self.arg(0)?;
                let from = param.unit(f)?;
                Value::Number(self.number(0, f)? * unit_factor(&from, &target)?)
            }
            "abs" => self.numeric_like_first(self.number(0, f)?.abs(), f)?,
            "ceil" => self.numeric_like_first(self.number(0, f)?.ceil(), f)?,
            "floor" => self.numeric_like_first(self.number(0, f)?.floor(), f)?,
            "mod" => Value::Number(self.number(0, f)? % self.number(1, f)?),
            "pi" => Value::Number(PI),
            "round" => {
                let places = self.int_or(1, 0, f)?.clamp(0, 15) as i32;
                let scale = 10f64.powi(places);
                let rounded = round_half_up(self.number(0, f)? * scale) / scale;
                self.numeric_like_first(rounded, f)?
            }
            "min" | "max" => Value::Number(self.extremum(self.key == "min", f)?),
            "sqrt" => Value::Number(self.number(0, f)?.sqrt()),
            "pow" => Value::Number(self.number(0, f)?.powf(self.number(1, f)?)),
            "sin" => Value::Number(self.radians(f)?.sin()),
            "cos" => Value::Number(self.radians(f)?.cos()),
            "tan" => Value::Number(self.radians(f)?.tan()),
            "asin" => Value::Number(self.radians(f)?.asin()),
            "acos" => Value::Number(self.radians(f)?.acos()),
            "atan" => Value::Number(self.radians(f)?.atan()),
            "increment" => Value::Number(self.number(0, f)? + 1.0),
            "add" => Value::Number(self.number(0, f)? + self.number(1, f)?),

            // lists
            "length" => Value::Number(self.list(0, f)?.len() as f64),
            "extract" => {
                let items = self.list(0, f)?;
                let idx = self.int(1, f)?;
                if idx <= 0 || idx as usize > items.len() {
                    return Ok(Outcome::Passthrough);
                }
                return Ok(Outcome::Forward(items[idx as usize - 1].clone()));
            }

            // color channels
            "alpha" => match self.arg(0)?.value(f)? {
                Value::Rgba(color) => Value::Number(color.alpha()),
                Value::Color(_) => Value::Number(1.0),
                _ => return Ok(Outcome::Passthrough),
            },
            "red" => Value::Number(self.color(0, f)?.0.red() as f64),
            "green" => Value::Number(self.color(0, f)?.0.green() as f64),
            "blue" => Value::Number(self.color(0, f)?.0.blue() as f64),
            "hue" => Value::Number(self.color(0, f)?.0.to_hsl().h),
            "saturation" => Value::Percent(self.color(0, f)?.0.to_hsl().s * 100.0),
            "lightness" => Value::Percent(self.color(0, f)?.0.to_hsl().l * 100.0),
            "hsvhue" => Value::Number(self.color(0, f)?.0.to_hsv().h),
            "hsvsaturation" => Value::Percent(self.color(0, f)?.0.to_hsv().s * 100.0),
            "hsvvalue" => Value::Percent(self.color(0, f)?.0.to_hsv().v * 100.0),
            "luma" => Value::Percent(luma(self.color(0, f)?.0) * 100.0),
            "luminance" => Value::Percent(luminance(self.color(0, f)?.0) * 100.0),

            // color construction
            "rgb" => Value::Color(Color::from_rgba(
                self.color_digit(0, f)?,
                self.color_digit(1, f)?,
                self.color_digit(2, f)?,
                1.0,
            )),
            "rgba" => Value::Rgba(Color::from_rgba(
                self.color_digit(0, f)?,
                self.color_digit(1, f)?,
                self.color_digit(2, f)?,
                self.percent(3, f)?,
            )),
            "hsl" => Value::Color(
                Hsl::new(
                    self.number(0, f)?,
                    self.percent(1, f)?,
                    self.percent(2, f)?,
                    1.0,
                )
                .to_color(),
            ),
            "hsla" => Value::Rgba(
                Hsl::new(
                    self.number(0, f)?,
                    self.percent(1, f)?,
                    self.percent(2, f)?,
                    self.percent(3, f)?,
                )
                .to_color(),
            ),
            "hsv" => Value::Color(
                Hsv::new(
                    self.percent(0, f)?,
                    self.percent(1, f)?,
                    self.percent(2, f)?,
                    1.0,
                )
                .to_color(),
            ),
            "hsva" => Value::Rgba(
                Hsv::new(
                    self.percent(0, f)?,
                    self.percent(1, f)?,
                    self.percent(2, f)?,
                    self.percent(3, f)?,
                )
                .to_color(),
            ),

            // color operations
            "saturate" => self.adjust_hsl(f, |hsl, amount| hsl.s += amount)?,
            "desaturate" => self.adjust_hsl(f, |hsl, amount| hsl.s -= amount)?,
            "lighten" => self.adjust_hsl(f, |hsl, amount| hsl.l += amount)?,
            "darken" => self.adjust_hsl(f, |hsl, amount| hsl.l -= amount)?,
            "fadein" => Value::Rgba(self.adjusted(f, |hsl, amount| hsl.a += amount)?.0),
            "fadeout" => Value::Rgba(self.adjusted(f, |hsl, amount| hsl.a -= amount)?.0),
            "fade" => Value::Rgba(self.adjusted(f, |hsl, amount| hsl.a = amount)?.0),
            "spin" => {
                let (color, input) = self.color(0, f)?;
                let mut hsl = color.to_hsl();
                hsl.h += self.number(1, f)?;
                same_kind(&input, hsl.to_color())
            }
            "greyscale" => {
                let (color, input) = self.color(0, f)?;
                let mut hsl = color.to_hsl();
                hsl.s = 0.0;
                same_kind(&input, hsl.to_color())
            }
            "mix" => {
                let (c1, input) = self.color(0, f)?;
                let (c2, _) = self.color(1, f)?;
                let weight = self.percent_or(2, 0.5, f)?;
                same_kind(&input, mix(c1, c2, weight))
            }
            "multiply" => {
                let (c1, input) = self.color(0, f)?;
                let (c2, _) = self.color(1, f)?;
                same_kind(&input, multiply(c1, c2))
            }
            "screen" => {
                let (c1, input) = self.color(0, f)?;
                let (c2, _) = self.color(1, f)?;
                same_kind(&input, screen(c1, c2))
            }
            "contrast" => {
                let (color, input) = self.color(0, f)?;
                let dark = self.color_or(1, Color::BLACK, f)?;
                let light = self.color_or(2, Color::WHITE, f)?;
                let threshold = self.percent_or(3, 0.43, f)?;
                same_kind(&input, contrast(color, dark, light, threshold))
            }

            // misc
            "unit" => Value::Number(self.number(0, f)?),
            "isnumber" => Value::Boolean(self.arg(0)?.data_type(f)? == DataType::Number),
            "-" => match self.arg(0)?.value(f)? {
                Value::Number(v) => Value::Number(-v),
                Value::Percent(v) => Value::Percent(-v),
                _ => return Ok(Outcome::Passthrough),
            },
            key if is_text_builtin(key) => Value::String,
            _ => return Ok(Outcome::Passthrough),
        };
        Ok(Outcome::Value(value))
    }

    /// Apply `adjust` to the HSL form of the first argument, with the
    /// second argument as a fraction. Returns the result and the input.
    fn adjusted(
        &self,
        f: &mut CssFormatter,
        adjust: impl FnOnce(&mut Hsl, f64),
    ) -> CallResult<(Color, Value)> {
        let (color, input) = self.color(0, f)?;
        let amount = self.percent(1, f)?;
        let mut hsl = color.to_hsl();
        adjust(&mut hsl, amount);
        Ok((hsl.to_color(), input))
    }

    fn adjust_hsl(
        &self,
        f: &mut CssFormatter,
        adjust: impl FnOnce(&mut Hsl, f64),
    ) -> CallResult<Value> {
        let (color, input) = self.adjusted(f, adjust)?;
        Ok(same_kind(&input, color))
    }

    /// `min` / `max` in the unit of the call
    fn extremum(&self, min: bool, f: &mut CssFormatter) -> CallResult<f64> {
        let unit = self.unit(f)?;
        let mut result = self.number(0, f)?;
        for idx in 1..self.arity() {
            let param_unit = self.arg(idx)?.unit(f)?;
            let value = self.number(idx, f)? / unit_factor(&unit, &param_unit)?;
            result = if min { result.min(value) } else { result.max(value) };
        }
        Ok(result)
    }

    /// First non-empty unit among the arguments
    fn first_unit(&self, f: &mut CssFormatter) -> LessResult<String> {
        for param in &self.parameters {
            let unit = param.unit(f)?;
            if !unit.is_empty() {
                return Ok(unit);
            }
        }
        Ok(String::new())
    }

    /// Write the call unchanged
    fn append_passthrough(&self, f: &mut CssFormatter) -> LessResult<()> {
        f.append(&self.name).append_char('(');
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.append_char(',').space();
            }
            param.append_to(f)?;
        }
        f.append_char(')');
        Ok(())
    }
}

/// Tag a computed color like the input it was derived from
fn same_kind(input: &Value, color: Color) -> Value {
    match input {
        Value::Rgba(_) => Value::Rgba(color),
        _ => Value::color(color),
    }
}

impl Expression for FunctionExpression {
    fn value(&self, f: &mut CssFormatter) -> LessResult<Value> {
        if is_text_builtin(&self.key) {
            return Ok(Value::String);
        }
        match self.outcome(f)? {
            Outcome::Value(value) => Ok(value),
            Outcome::Forward(expr) => expr.value(f),
            Outcome::Passthrough => Ok(Value::String),
        }
    }

    fn unit(&self, f: &mut CssFormatter) -> LessResult<String> {
        match self.key.as_str() {
            "unit" => match self.parameters.get(1) {
                Some(param) => Ok(remove_quote(&param.string_value(f)?).to_string()),
                None => Ok(String::new()),
            },
            "convert" => match self.parameters.get(1) {
                Some(param) => Ok(remove_quote(&param.string_value(f)?).to_string()),
                None => Ok(String::new()),
            },
            "sin" | "cos" | "tan" => Ok(String::new()),
            "asin" | "acos" | "atan" => Ok("rad".to_string()),
            "pow" => match self.parameters.first() {
                Some(param) => param.unit(f),
                None => Ok(String::new()),
            },
            "" | "extract" => match self.outcome(f)? {
                Outcome::Forward(expr) => expr.unit(f),
                _ => Ok(String::new()),
            },
            "length" | "isnumber" | "alpha" | "red" | "green" | "blue" | "hue" | "hsvhue" => {
                Ok(String::new())
            }
            _ => self.first_unit(f),
        }
    }

    fn append_to(&self, f: &mut CssFormatter) -> LessResult<()> {
        if is_text_builtin(&self.key) {
            f.push_buffer();
            return match append_text_builtin(self, f) {
                Ok(()) => {
                    f.flush_and_pop();
                    Ok(())
                }
                Err(CallError::Arity) => {
                    f.pop_buffer();
                    debug!(function = %self.name, "Arguments do not fit built-in, writing call through");
                    self.append_passthrough(f)
                }
                Err(CallError::Fault(err)) => {
                    f.pop_buffer();
                    Err(err.with_span(self.span.as_ref()))
                }
            };
        }

        match self.outcome(f)? {
            Outcome::Forward(expr) => expr.append_to(f),
            Outcome::Passthrough | Outcome::Value(Value::String | Value::Unknown) => {
                self.append_passthrough(f)
            }
            Outcome::Value(value) => {
                let unit = self.unit(f)?;
                value.append_to(&unit, f);
                Ok(())
            }
        }
    }

    fn list_operands(&self, f: &mut CssFormatter) -> LessResult<Option<Vec<ExprRef>>> {
        match self.outcome(f)? {
            Outcome::Forward(expr) => expr.list_operands(f),
            _ => Ok(None),
        }
    }

    fn freeze(&self, f: &mut CssFormatter) -> LessResult<Option<ExprRef>> {
        if is_text_builtin(&self.key) {
            return Ok(None);
        }
        match self.outcome(f)? {
            Outcome::Forward(expr) => expr.freeze(f),
            _ => Ok(None),
        }
    }

    fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }
}
