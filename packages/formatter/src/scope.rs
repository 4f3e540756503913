//! Variable scopes of nested rule and mixin invocations.
//!
//! Frames are kept in a growable vector that is never shrunk: popping only
//! lowers the logical depth, and the next push at that depth reuses the
//! frame object. Deeply recursive mixin expansion therefore allocates its
//! frames once.

use crate::expression::ExprRef;
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Name to expression bindings, in declaration order
pub type Bindings = IndexMap<String, ExprRef>;

/// A rule that can own a scope frame and contain nested mixins
pub trait MixinScope: fmt::Debug {
    fn name(&self) -> &str;

    /// Mixins with the given name declared directly inside this rule
    fn nested_mixins(&self, name: &str) -> Option<Vec<RuleRef>>;

    fn as_any(&self) -> &dyn Any;
}

pub type RuleRef = Rc<dyn MixinScope>;

/// Rule identity. Compares data addresses only; vtable pointers of the same
/// type may differ between codegen units.
pub fn same_rule(a: &RuleRef, b: &RuleRef) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

#[derive(Debug, Default)]
struct Scope {
    mixin: Option<RuleRef>,
    parameters: Option<Bindings>,
    variables: Option<Bindings>,
    /// Variables exported by popped child frames
    returns: Bindings,
}

impl Scope {
    /// Parameters shadow local variables, which shadow exported returns
    fn get(&self, name: &str) -> Option<&ExprRef> {
        self.parameters
            .as_ref()
            .and_then(|p| p.get(name))
            .or_else(|| self.variables.as_ref().and_then(|v| v.get(name)))
            .or_else(|| self.returns.get(name))
    }
}

#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Scope>,
    depth: usize,
    mod_count: u64,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Incremented on every push and pop. Values computed under one id are
    /// stale once it changes.
    pub fn mod_count(&self) -> u64 {
        self.mod_count
    }

    pub fn push(
        &mut self,
        mixin: Option<RuleRef>,
        parameters: Option<Bindings>,
        variables: Option<Bindings>,
    ) {
        let idx = self.depth;
        if self.frames.len() <= idx {
            self.frames.push(Scope::default());
        }
        let scope = &mut self.frames[idx];
        scope.returns.clear();
        scope.mixin = mixin;
        scope.parameters = parameters;
        scope.variables = variables;

        self.depth += 1;
        self.mod_count += 1;
    }

    /// Bindings of the top frame that the parent frame cannot resolve.
    /// Local variables come first, then the frame's own returns; each name
    /// is listed once.
    pub fn export_candidates(&self) -> Vec<(String, ExprRef)> {
        if self.depth < 2 {
            return Vec::new();
        }
        let current = &self.frames[self.depth - 1];
        let parent = &self.frames[self.depth - 2];

        let mut candidates: Vec<(String, ExprRef)> = Vec::new();
        let locals = current.variables.iter().flat_map(|vars| vars.iter());
        for (name, expr) in locals.chain(current.returns.iter()) {
            if parent.get(name).is_none() && !candidates.iter().any(|(n, _)| n == name) {
                candidates.push((name.clone(), expr.clone()));
            }
        }
        candidates
    }

    /// Publish evaluated exports into the parent frame's returns
    pub fn export(&mut self, exports: Vec<(String, ExprRef)>) {
        if self.depth < 2 {
            return;
        }
        let parent = &mut self.frames[self.depth - 2];
        for (name, value) in exports {
            parent.returns.entry(name).or_insert(value);
        }
    }

    pub fn pop(&mut self) {
        debug_assert!(self.depth > 0, "scope stack underflow");
        if self.depth == 0 {
            return;
        }
        self.depth -= 1;
        let scope = &mut self.frames[self.depth];
        scope.mixin = None;
        scope.parameters = None;
        scope.variables = None;
        self.mod_count += 1;
    }

    /// Nearest binding for `name`, scanning from the innermost frame outwards
    pub fn resolve(&self, name: &str) -> Option<ExprRef> {
        self.active()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
    }

    /// Whether `rule` owns one of the pushed frames
    pub fn is_active(&self, rule: &RuleRef) -> bool {
        self.active()
            .rev()
            .any(|scope| scope.mixin.as_ref().is_some_and(|m| same_rule(m, rule)))
    }

    /// Nested mixins named `name` of the nearest owning rule that has at
    /// least one candidate not currently being expanded
    pub fn pending_mixins(&self, name: &str) -> Option<Vec<RuleRef>> {
        for scope in self.active().rev() {
            let Some(mixin) = &scope.mixin else {
                continue;
            };
            let Some(rules) = mixin.nested_mixins(name) else {
                continue;
            };
            let available: Vec<RuleRef> = rules
                .into_iter()
                .filter(|rule| !self.is_active(rule))
                .collect();
            if !available.is_empty() {
                return Some(available);
            }
        }
        None
    }

    /// Whether a pushed frame's rule declares a mixin named `name`, including
    /// mixins that are currently being expanded
    pub fn declares_mixin(&self, name: &str) -> bool {
        self.active().any(|scope| {
            scope
                .mixin
                .as_ref()
                .is_some_and(|m| m.nested_mixins(name).is_some())
        })
    }

    fn active(&self) -> std::slice::Iter<'_, Scope> {
        self.frames[..self.depth].iter()
    }
}
