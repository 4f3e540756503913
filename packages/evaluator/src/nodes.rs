//! Variable references and value lists.

use sheen_common::{LessError, LessResult, Span};
use sheen_formatter::{CssFormatter, ExprRef, Expression, Value, ValueExpression};
use std::cell::Cell;
use std::rc::Rc;

/// `@name`, resolved through the scope stack on every access
#[derive(Debug)]
pub struct VariableExpression {
    name: String,
    span: Option<Span>,
    resolving: Cell<bool>,
}

impl VariableExpression {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            span: None,
            resolving: Cell::new(false),
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

    /// Run `body` on the bound expression. A variable whose value refers
    /// back to itself is an error.
    fn with_value<T>(
        &self,
        f: &mut CssFormatter,
        body: impl FnOnce(&ExprRef, &mut CssFormatter) -> LessResult<T>,
    ) -> LessResult<T> {
        let expr = f.lookup_variable(&self.name).ok_or_else(|| {
            LessError::undefined_variable(self.name.clone()).with_span(self.span.as_ref())
        })?;
        if self.resolving.replace(true) {
            return Err(LessError::compile(format!(
                "Recursive variable definition for {}",
                self.name
            ))
            .with_span(self.span.as_ref()));
        }
        let result = body(&expr, f);
        self.resolving.set(false);
        result
    }
}

impl Expression for VariableExpression {
    fn value(&self, f: &mut CssFormatter) -> LessResult<Value> {
        self.with_value(f, |expr, f| expr.value(f))
    }

    fn unit(&self, f: &mut CssFormatter) -> LessResult<String> {
        self.with_value(f, |expr, f| expr.unit(f))
    }

    fn append_to(&self, f: &mut CssFormatter) -> LessResult<()> {
        self.with_value(f, |expr, f| expr.append_to(f))
    }

    fn list_operands(&self, f: &mut CssFormatter) -> LessResult<Option<Vec<ExprRef>>> {
        self.with_value(f, |expr, f| expr.list_operands(f))
    }

    fn freeze(&self, f: &mut CssFormatter) -> LessResult<Option<ExprRef>> {
        self.with_value(f, |expr, f| expr.freeze(f))
    }

    fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Comma,
    Space,
}

impl Separator {
    fn as_str(self) -> &'static str {
        match self {
            Separator::Comma => ", ",
            Separator::Space => " ",
        }
    }
}

/// A comma or space separated list of values, e.g. `1px solid red`
#[derive(Debug)]
pub struct ListExpression {
    items: Vec<ExprRef>,
    separator: Separator,
}

impl ListExpression {
    pub fn new(items: Vec<ExprRef>, separator: Separator) -> Self {
        Self { items, separator }
    }

    pub fn space(items: Vec<ExprRef>) -> Self {
        Self::new(items, Separator::Space)
    }

    pub fn comma(items: Vec<ExprRef>) -> Self {
        Self::new(items, Separator::Comma)
    }

    pub fn into_ref(self) -> ExprRef {
        Rc::new(self)
    }

    pub fn items(&self) -> &[ExprRef] {
        &self.items
    }
}

impl Expression for ListExpression {
    fn value(&self, f: &mut CssFormatter) -> LessResult<Value> {
        match self.items.as_slice() {
            [single] => single.value(f),
            _ => Ok(Value::String),
        }
    }

    fn unit(&self, f: &mut CssFormatter) -> LessResult<String> {
        match self.items.as_slice() {
            [single] => single.unit(f),
            _ => Ok(String::new()),
        }
    }

    fn append_to(&self, f: &mut CssFormatter) -> LessResult<()> {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.append(self.separator.as_str());
            }
            item.append_to(f)?;
        }
        Ok(())
    }

    fn list_operands(&self, _f: &mut CssFormatter) -> LessResult<Option<Vec<ExprRef>>> {
        Ok(Some(self.items.clone()))
    }

    fn freeze(&self, f: &mut CssFormatter) -> LessResult<Option<ExprRef>> {
        let items = self
            .items
            .iter()
            .map(|item| ValueExpression::eval(f, item.as_ref()))
            .collect::<LessResult<Vec<_>>>()?;
        Ok(Some(ListExpression::new(items, self.separator).into_ref()))
    }
}
