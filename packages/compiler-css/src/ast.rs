//! Rule tree consumed by the compiler.
//!
//! Values are already parsed into expressions; selectors and property
//! names are kept as text and may contain `@{name}` placeholders.

use sheen_common::Span;
use sheen_formatter::{Bindings, ExprRef, MixinScope, RuleRef};
use std::any::Any;
use std::rc::Rc;

const MEDIA_PREFIX: &str = "@media";

#[derive(Debug)]
pub struct Stylesheet {
    root: Rc<Rule>,
}

impl Stylesheet {
    /// Wrap the top-level rule. Its selectors are ignored.
    pub fn new(root: Rule) -> Self {
        Self {
            root: Rc::new(root),
        }
    }

    pub fn root(&self) -> &Rc<Rule> {
        &self.root
    }
}

/// A ruleset, `@media` block or mixin definition
#[derive(Debug, Default)]
pub struct Rule {
    pub selectors: Vec<String>,
    /// `Some` for a parametric mixin, which produces no output of its own
    pub parameters: Option<Vec<Parameter>>,
    pub variables: Bindings,
    pub body: Vec<Node>,
    pub span: Option<Span>,
}

#[derive(Debug)]
pub enum Node {
    Declaration(Declaration),
    Rule(Rc<Rule>),
    MixinCall(MixinCall),
    Extend(Extend),
    Comment(String),
    /// Top-level at-rule such as `@charset` or `@import`, copied verbatim
    Directive(String),
}

#[derive(Debug)]
pub struct Declaration {
    pub name: String,
    pub value: ExprRef,
    pub important: bool,
}

#[derive(Debug)]
pub struct MixinCall {
    pub name: String,
    pub arguments: Vec<ExprRef>,
    pub important: bool,
    pub span: Option<Span>,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub default: Option<ExprRef>,
}

/// `&:extend(target)` or `&:extend(target all)`
#[derive(Debug, Clone, PartialEq)]
pub struct Extend {
    pub target: String,
    pub all: bool,
}

impl Rule {
    pub fn new<S: Into<String>>(selectors: impl IntoIterator<Item = S>) -> Self {
        Self {
            selectors: selectors.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// The unnamed top-level rule
    pub fn root() -> Self {
        Self::default()
    }

    /// A parametric mixin definition, e.g. `.border(@width; @style: solid)`
    pub fn mixin(name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            selectors: vec![name.into()],
            parameters: Some(parameters),
            ..Self::default()
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: ExprRef) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    pub fn declaration(mut self, name: impl Into<String>, value: ExprRef) -> Self {
        self.body.push(Node::Declaration(Declaration {
            name: name.into(),
            value,
            important: false,
        }));
        self
    }

    pub fn important_declaration(mut self, name: impl Into<String>, value: ExprRef) -> Self {
        self.body.push(Node::Declaration(Declaration {
            name: name.into(),
            value,
            important: true,
        }));
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.body.push(Node::Rule(Rc::new(rule)));
        self
    }

    pub fn call(mut self, call: MixinCall) -> Self {
        self.body.push(Node::MixinCall(call));
        self
    }

    pub fn extend(mut self, target: impl Into<String>, all: bool) -> Self {
        self.body.push(Node::Extend(Extend {
            target: target.into(),
            all,
        }));
        self
    }

    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.body.push(Node::Comment(text.into()));
        self
    }

    pub fn directive(mut self, text: impl Into<String>) -> Self {
        self.body.push(Node::Directive(text.into()));
        self
    }

    pub fn is_mixin_definition(&self) -> bool {
        self.parameters.is_some()
    }

    pub fn is_media(&self) -> bool {
        self.selectors
            .first()
            .is_some_and(|s| s.starts_with(MEDIA_PREFIX))
    }

    /// Whether a call with `count` arguments can use this rule.
    /// A plain ruleset only accepts calls without arguments.
    pub fn accepts(&self, count: usize) -> bool {
        match &self.parameters {
            None => count == 0,
            Some(params) => {
                count <= params.len() && params[count..].iter().all(|p| p.default.is_some())
            }
        }
    }
}

impl MixinScope for Rule {
    fn name(&self) -> &str {
        self.selectors.first().map(String::as_str).unwrap_or("")
    }

    fn nested_mixins(&self, name: &str) -> Option<Vec<RuleRef>> {
        let found: Vec<RuleRef> = self
            .body
            .iter()
            .filter_map(|node| match node {
                Node::Rule(rule) if rule.selectors.iter().any(|s| s == name) => {
                    Some(rule.clone() as RuleRef)
                }
                _ => None,
            })
            .collect();
        (!found.is_empty()).then_some(found)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MixinCall {
    pub fn new(name: impl Into<String>, arguments: Vec<ExprRef>) -> Self {
        Self {
            name: name.into(),
            arguments,
            important: false,
            span: None,
        }
    }

    pub fn important(mut self) -> Self {
        self.important = true;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default: ExprRef) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
    }
}
