//! Walks a rule tree and drives the formatter.
//!
//! A ruleset is written in two phases: first its own block with the
//! declarations (including those of expanded mixins), then its nested
//! rules, each as a block of its own. Both phases run with the ruleset's
//! scope pushed, so variables resolve the same way in both.

use crate::ast::{Declaration, MixinCall, Node, Rule, Stylesheet};
use crate::options::CompileOptions;
use sheen_common::{LessError, LessResult, RealResourceLoader, ResourceLoader};
use sheen_evaluator::ListExpression;
use sheen_formatter::{Bindings, CssFormatter, RuleRef, ValueExpression};
use std::rc::Rc;
use tracing::{debug, instrument};

const CHARSET: &str = "@charset";
const ARGUMENTS: &str = "@arguments";

/// Compile `sheet` with `options`
#[instrument(skip(sheet, options), fields(nodes = sheet.root().body.len()))]
pub fn compile_to_css(sheet: &Stylesheet, options: &CompileOptions) -> LessResult<String> {
    StylesheetCompiler::new(options).compile(sheet)
}

pub struct StylesheetCompiler {
    formatter: CssFormatter,
    base_url: Option<String>,
}

impl StylesheetCompiler {
    pub fn new(options: &CompileOptions) -> Self {
        let mut formatter = CssFormatter::with_options(options.formatter_options());
        if let Some(dir) = &options.resource_dir {
            formatter = formatter.with_resources(Rc::new(RealResourceLoader::new(dir)));
        }
        Self {
            formatter,
            base_url: options.base_url.clone(),
        }
    }

    /// Replace the resource loader set up from the options
    pub fn with_resources(mut self, resources: Rc<dyn ResourceLoader>) -> Self {
        self.formatter = self.formatter.with_resources(resources);
        self
    }

    pub fn compile(mut self, sheet: &Stylesheet) -> LessResult<String> {
        self.formatter.begin_pass(self.base_url.as_deref());

        let root = sheet.root();
        let root_ref: RuleRef = root.clone();
        self.formatter
            .push_mixin_scope(Some(root_ref), None, Some(root.variables.clone()));
        let result = self.top_level(&root.body);
        let popped = self.formatter.pop_mixin_scope();
        result.and(popped)?;

        Ok(self.formatter.finalize())
    }

    fn top_level(&mut self, body: &[Node]) -> LessResult<()> {
        for node in body {
            match node {
                Node::Directive(text) => self.directive(text),
                Node::Rule(rule) => self.rule(rule, &[])?,
                Node::MixinCall(call) => self.expand(call, |this, mixin| this.nested(&mixin.body, &[]))?,
                Node::Comment(text) => {
                    self.formatter.comment(text);
                }
                Node::Declaration(declaration) => {
                    return Err(LessError::compile(format!(
                        "Declaration '{}' outside of a rule",
                        declaration.name
                    )))
                }
                Node::Extend(extend) => {
                    return Err(LessError::compile(format!(
                        "Extend of '{}' outside of a rule",
                        extend.target
                    )))
                }
            }
        }
        Ok(())
    }

    fn directive(&mut self, text: &str) {
        if text.starts_with(CHARSET) {
            if self.formatter.is_charset_directive() {
                debug!(directive = text, "Dropping repeated charset");
                return;
            }
            self.formatter.set_charset_directive();
        }
        self.formatter.append_header(text);
        self.formatter.append_header("\n");
    }

    fn rule(&mut self, rule: &Rc<Rule>, parents: &[String]) -> LessResult<()> {
        if rule.is_mixin_definition() {
            return Ok(());
        }

        let rule_ref: RuleRef = rule.clone();
        self.formatter
            .push_mixin_scope(Some(rule_ref), None, Some(rule.variables.clone()));

        let result = if rule.is_media() {
            self.media(rule, parents)
        } else {
            self.ruleset(rule, parents)
        };

        let popped = self.formatter.pop_mixin_scope();
        result.and(popped)
    }

    fn ruleset(&mut self, rule: &Rule, parents: &[String]) -> LessResult<()> {
        let selectors = self.selectors(rule, parents)?;
        self.block(&selectors, &rule.body)?;
        self.nested(&rule.body, &selectors)
    }

    /// `@media` block. Declarations inside it belong to the enclosing
    /// ruleset, which is repeated inside the query.
    fn media(&mut self, rule: &Rule, parents: &[String]) -> LessResult<()> {
        let query = self.interpolate(&rule.selectors.join(", "))?;
        self.formatter.open_block(&[query]);
        let result = if parents.is_empty() {
            self.properties(&rule.body, parents)
        } else {
            self.block(parents, &rule.body)
        };
        let result = result.and_then(|_| self.nested(&rule.body, parents));
        self.formatter.close_block();
        result
    }

    /// Write one block holding the declarations of `body`. An inline
    /// block that ends up empty is removed again.
    fn block(&mut self, selectors: &[String], body: &[Node]) -> LessResult<()> {
        let mark = self.formatter.output_len();
        self.formatter.open_block(selectors);
        let inline = self.formatter.block_deep() > 1;
        let start = self.formatter.output_len();

        let result = self.properties(body, selectors);

        let written = self.formatter.output_len() != start;
        self.formatter.close_block();
        result?;
        if inline && !written {
            if let Some(mark) = mark {
                self.formatter.truncate_output(mark);
            }
        }
        Ok(())
    }

    fn properties(&mut self, body: &[Node], selectors: &[String]) -> LessResult<()> {
        for node in body {
            match node {
                Node::Declaration(declaration) => self.declaration(declaration)?,
                Node::MixinCall(call) => {
                    self.expand(call, |this, mixin| this.properties(&mixin.body, selectors))?
                }
                Node::Extend(extend) => {
                    let target = self.interpolate(&extend.target)?;
                    self.formatter.add_extend_for(&target, extend.all, selectors);
                }
                Node::Comment(text) => {
                    self.formatter.comment(text);
                }
                Node::Directive(text) => {
                    return Err(LessError::compile(format!(
                        "Directive '{}' is only allowed at top level",
                        text
                    )))
                }
                Node::Rule(_) => {}
            }
        }
        Ok(())
    }

    fn nested(&mut self, body: &[Node], parents: &[String]) -> LessResult<()> {
        for node in body {
            match node {
                Node::Rule(rule) => self.rule(rule, parents)?,
                Node::MixinCall(call) => {
                    self.expand(call, |this, mixin| this.nested(&mixin.body, parents))?
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn declaration(&mut self, declaration: &Declaration) -> LessResult<()> {
        if !declaration.important || self.formatter.important() {
            return self
                .formatter
                .append_declaration(&declaration.name, declaration.value.as_ref());
        }
        self.formatter.set_important(true);
        let result = self
            .formatter
            .append_declaration(&declaration.name, declaration.value.as_ref());
        self.formatter.set_important(false);
        result
    }

    /// Run `body` once for every definition matching `call`, each with its
    /// own scope holding the bound arguments
    fn expand(
        &mut self,
        call: &MixinCall,
        mut body: impl FnMut(&mut Self, &Rule) -> LessResult<()>,
    ) -> LessResult<()> {
        let candidates = match self.formatter.pending_mixins(&call.name) {
            Some(candidates) => candidates,
            None => return Err(self.missing_mixin(call)),
        };

        let mut matched = false;
        for candidate in candidates {
            let Some(mixin) = candidate.as_any().downcast_ref::<Rule>() else {
                continue;
            };
            if !mixin.accepts(call.arguments.len()) {
                continue;
            }
            matched = true;

            let parameters = self.bind_arguments(mixin, call)?;
            debug!(mixin = %call.name, arguments = call.arguments.len(), "Expanding mixin");
            self.formatter.push_mixin_scope(
                Some(candidate.clone()),
                parameters,
                Some(mixin.variables.clone()),
            );

            let important = self.formatter.important();
            if call.important {
                self.formatter.set_important(true);
            }
            let result = body(self, mixin);
            self.formatter.set_important(important);
            let popped = self.formatter.pop_mixin_scope();
            result.and(popped)?;
        }

        if !matched {
            return Err(LessError::compile(format!(
                "No matching definition for mixin {} with {} argument(s)",
                call.name,
                call.arguments.len()
            ))
            .with_span(call.span.as_ref()));
        }
        Ok(())
    }

    fn missing_mixin(&self, call: &MixinCall) -> LessError {
        if self.formatter.declares_mixin(&call.name) {
            LessError::RecursiveMixin {
                name: call.name.clone(),
            }
        } else {
            LessError::compile(format!("Undefined mixin {}", call.name))
                .with_span(call.span.as_ref())
        }
    }

    /// Arguments are evaluated in the caller's scope before the mixin scope
    /// is pushed; defaults stay lazy and see the other parameters.
    fn bind_arguments(&mut self, mixin: &Rule, call: &MixinCall) -> LessResult<Option<Bindings>> {
        let Some(parameters) = &mixin.parameters else {
            return Ok(None);
        };

        let mut bindings = Bindings::new();
        let mut values = Vec::with_capacity(parameters.len());
        for (idx, parameter) in parameters.iter().enumerate() {
            let value = match (call.arguments.get(idx), &parameter.default) {
                (Some(argument), _) => ValueExpression::eval(&mut self.formatter, argument.as_ref())?,
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    return Err(LessError::compile(format!(
                        "Missing argument {} for mixin {}",
                        parameter.name, call.name
                    ))
                    .with_span(call.span.as_ref()))
                }
            };
            values.push(value.clone());
            bindings.insert(parameter.name.clone(), value);
        }
        bindings.insert(ARGUMENTS.to_string(), ListExpression::space(values).into_ref());
        Ok(Some(bindings))
    }

    /// Selectors of `rule` nested in `parents`. `&` stands for the parent
    /// selector; without one the parent becomes the ancestor.
    fn selectors(&mut self, rule: &Rule, parents: &[String]) -> LessResult<Vec<String>> {
        let own = rule
            .selectors
            .iter()
            .map(|selector| self.interpolate(selector))
            .collect::<LessResult<Vec<_>>>()?;
        Ok(combine_selectors(parents, &own))
    }

    fn interpolate(&mut self, text: &str) -> LessResult<String> {
        if !text.contains("@{") {
            return Ok(text.to_string());
        }
        self.formatter.push_buffer();
        let result = self.formatter.append_with_placeholders(text);
        let interpolated = self.formatter.capture_and_pop();
        result.map(|_| interpolated)
    }
}

fn combine_selectors(parents: &[String], own: &[String]) -> Vec<String> {
    if parents.is_empty() {
        return own.to_vec();
    }
    let mut combined = Vec::with_capacity(parents.len() * own.len());
    for parent in parents {
        for selector in own {
            if selector.contains('&') {
                combined.push(selector.replace('&', parent));
            } else {
                combined.push(format!("{} {}", parent, selector));
            }
        }
    }
    combined
}
