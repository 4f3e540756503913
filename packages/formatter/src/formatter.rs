//! The CSS output engine.
//!
//! A [`CssFormatter`] owns the state shared by one compile pass (buffer
//! pool, scope stack, emitted segments, extends) and a stack of cursors.
//! The active cursor carries what is local to the block currently being
//! written: its output buffer and redirection stack, indentation and flags.
//! Opening a top-level block (or hoisting a nested `@media`) suspends the
//! current cursor and activates a fresh one; closing that block restores it.

use crate::expression::{ExprRef, Expression, ValueExpression};
use crate::extend::ExtendMap;
use crate::output::{BufferId, BufferPool, OutputSegment};
use crate::scope::{Bindings, RuleRef, ScopeStack};
use serde::{Deserialize, Serialize};
use sheen_color::{push_hex, Color};
use sheen_common::{LessError, LessResult, ResourceLoader};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, instrument, trace};

const GUARD_PREFIX: &str = "@media";

static NEXT_PASS: AtomicU64 = AtomicU64::new(0);

/// Identifies the scope state of one formatter. Equal ids mean the same
/// frames are pushed with the same bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackId {
    pass: u64,
    modification: u64,
}

/// Formatting options of the output engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatterOptions {
    /// One indentation step
    #[serde(default = "default_indent")]
    pub indent: String,
}

fn default_indent() -> String {
    "  ".to_string()
}

impl Default for FormatterOptions {
    fn default() -> Self {
        Self {
            indent: default_indent(),
        }
    }
}

/// Render a number the way CSS expects: integral values without a decimal
/// point, everything else with at most 8 fractional digits.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return (value as i64).to_string();
    }
    let text = format!("{:.8}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Conditional group selectors combine with an enclosing one instead of nesting
fn is_guard(selector: &str) -> bool {
    selector.starts_with(GUARD_PREFIX)
}

/// Remove one pair of matching surrounding quotes
pub fn remove_quote(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// State shared by every cursor of one compile pass
struct SharedContext {
    pass: u64,
    pool: BufferPool,
    base_url: Option<String>,
    scopes: ScopeStack,
    extends: ExtendMap,
    segments: Vec<OutputSegment>,
    header: BufferId,
    charset_directive: bool,
    resources: Option<Rc<dyn ResourceLoader>>,
    options: FormatterOptions,
}

/// Writing position of one block
#[derive(Debug, Default)]
struct Cursor {
    /// Selectors of the top-level block this cursor writes into
    selectors: Vec<String>,
    output: Option<BufferId>,
    /// Outputs suspended by `push_buffer`
    outputs: Vec<Option<BufferId>>,
    insets: String,
    important: bool,
    inline_mode: bool,
    block_deep: usize,
}

pub struct CssFormatter {
    shared: SharedContext,
    cursor: Cursor,
    /// Cursors suspended by an open top-level block
    views: Vec<Cursor>,
}

impl Default for CssFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CssFormatter {
    pub fn new() -> Self {
        Self::with_options(FormatterOptions::default())
    }

    pub fn with_options(options: FormatterOptions) -> Self {
        let mut pool = BufferPool::new();
        let header = pool.acquire();
        Self {
            shared: SharedContext {
                pass: NEXT_PASS.fetch_add(1, Ordering::Relaxed),
                pool,
                base_url: None,
                scopes: ScopeStack::new(),
                extends: ExtendMap::new(),
                segments: vec![OutputSegment::Plain { buffer: header }],
                header,
                charset_directive: false,
                resources: None,
                options,
            },
            cursor: Cursor::default(),
            views: Vec::new(),
        }
    }

    /// Loader used by built-ins that inline external resources
    pub fn with_resources(mut self, resources: Rc<dyn ResourceLoader>) -> Self {
        self.shared.resources = Some(resources);
        self
    }

    pub fn resources(&self) -> Option<Rc<dyn ResourceLoader>> {
        self.shared.resources.clone()
    }

    pub fn begin_pass(&mut self, base_url: Option<&str>) {
        debug!(base_url = ?base_url, "Beginning formatting pass");
        self.shared.base_url = base_url.map(str::to_string);
    }

    pub fn base_url(&self) -> Option<&str> {
        self.shared.base_url.as_deref()
    }

    // ----- scopes -------------------------------------------------------

    pub fn push_mixin_scope(
        &mut self,
        rule: Option<RuleRef>,
        parameters: Option<Bindings>,
        variables: Option<Bindings>,
    ) {
        trace!(
            rule = rule.as_ref().map(|r| r.name()),
            depth = self.shared.scopes.depth(),
            "Pushing scope"
        );
        self.shared.scopes.push(rule, parameters, variables);
    }

    /// Pop the innermost scope. Its variables that the caller has no binding
    /// for are evaluated first and become visible in the caller.
    pub fn pop_mixin_scope(&mut self) -> LessResult<()> {
        let candidates = self.shared.scopes.export_candidates();
        let mut exports = Vec::with_capacity(candidates.len());
        let mut result = Ok(());
        for (name, expr) in candidates {
            match ValueExpression::eval(self, expr.as_ref()) {
                Ok(value) => exports.push((name, value)),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        if !exports.is_empty() {
            debug!(
                names = ?exports.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
                "Exporting variables to caller scope"
            );
        }
        self.shared.scopes.export(exports);
        self.shared.scopes.pop();
        trace!(depth = self.shared.scopes.depth(), "Popped scope");
        result
    }

    /// Root level variables; popped with `pop_mixin_scope`
    pub fn push_variables(&mut self, variables: Option<Bindings>) {
        self.push_mixin_scope(None, None, variables);
    }

    pub fn lookup_variable(&self, name: &str) -> Option<ExprRef> {
        self.shared.scopes.resolve(name)
    }

    pub fn is_active(&self, rule: &RuleRef) -> bool {
        self.shared.scopes.is_active(rule)
    }

    pub fn pending_mixins(&self, name: &str) -> Option<Vec<RuleRef>> {
        self.shared.scopes.pending_mixins(name)
    }

    /// Whether a mixin named `name` is declared by an enclosing rule, even
    /// if it is currently being expanded
    pub fn declares_mixin(&self, name: &str) -> bool {
        self.shared.scopes.declares_mixin(name)
    }

    pub fn scope_depth(&self) -> usize {
        self.shared.scopes.depth()
    }

    /// Changes whenever a scope is pushed or popped, and differs between
    /// formatters
    pub fn stack_id(&self) -> StackId {
        StackId {
            pass: self.shared.pass,
            modification: self.shared.scopes.mod_count(),
        }
    }

    // ----- extends ------------------------------------------------------

    /// Register that the selectors of the current block extend `target`
    pub fn add_extend(&mut self, target: &str, all: bool) {
        let selectors = self.cursor.selectors.clone();
        self.add_extend_for(target, all, &selectors);
    }

    pub fn add_extend_for(&mut self, target: &str, all: bool, selectors: &[String]) {
        debug!(target, all, selectors = ?selectors, "Registering extend");
        self.shared.extends.add(target, all, selectors);
    }

    // ----- output redirection --------------------------------------------

    /// Redirect output into a fresh buffer
    pub fn push_buffer(&mut self) {
        let buffer = self.shared.pool.acquire();
        let previous = self.cursor.output.replace(buffer);
        self.cursor.outputs.push(previous);
    }

    /// Drop the current buffer and restore the previous output
    pub fn pop_buffer(&mut self) {
        debug_assert!(!self.cursor.outputs.is_empty(), "pop_buffer without push_buffer");
        if let Some(current) = self.cursor.output.take() {
            self.shared.pool.release(current);
        }
        self.cursor.output = self.cursor.outputs.pop().flatten();
    }

    /// Drop the current buffer, returning its text
    pub fn capture_and_pop(&mut self) -> String {
        let text = match self.cursor.output {
            Some(current) => self.shared.pool.get(current).to_string(),
            None => String::new(),
        };
        self.pop_buffer();
        text
    }

    /// Drop the current buffer and append its text to the previous output
    pub fn flush_and_pop(&mut self) {
        let text = self.capture_and_pop();
        self.output().push_str(&text);
    }

    /// Length of the current output, `None` if nothing is bound yet
    pub fn output_len(&self) -> Option<usize> {
        self.cursor.output.map(|id| self.shared.pool.get(id).len())
    }

    pub fn truncate_output(&mut self, len: usize) {
        if let Some(id) = self.cursor.output {
            self.shared.pool.get_mut(id).truncate(len);
        }
    }

    /// Current output buffer. At top level with nothing bound, a new plain
    /// segment is started.
    fn output(&mut self) -> &mut String {
        let id = match self.cursor.output {
            Some(id) => id,
            None => {
                let id = self.shared.pool.acquire();
                self.shared.segments.push(OutputSegment::Plain { buffer: id });
                self.cursor.output = Some(id);
                id
            }
        };
        self.shared.pool.get_mut(id)
    }

    // ----- header -------------------------------------------------------

    /// Text emitted before every rule, e.g. `@charset` and `@import`
    pub fn append_header(&mut self, text: &str) {
        let header = self.shared.header;
        self.shared.pool.get_mut(header).push_str(text);
    }

    pub fn is_charset_directive(&self) -> bool {
        self.shared.charset_directive
    }

    pub fn set_charset_directive(&mut self) {
        self.shared.charset_directive = true;
    }

    // ----- text ---------------------------------------------------------

    pub fn set_inline_mode(&mut self, mode: bool) {
        self.cursor.inline_mode = mode;
    }

    pub fn inline_mode(&self) -> bool {
        self.cursor.inline_mode
    }

    pub fn set_important(&mut self, important: bool) {
        self.cursor.important = important;
    }

    pub fn important(&self) -> bool {
        self.cursor.important
    }

    /// Append text. Inline mode strips one pair of surrounding quotes.
    pub fn append(&mut self, text: &str) -> &mut Self {
        let text = if self.cursor.inline_mode {
            remove_quote(text)
        } else {
            text
        };
        self.output().push_str(text);
        self
    }

    pub fn append_char(&mut self, ch: char) -> &mut Self {
        self.output().push(ch);
        self
    }

    pub fn append_number(&mut self, value: f64) -> &mut Self {
        let text = format_number(value);
        self.output().push_str(&text);
        self
    }

    pub fn append_value(&mut self, value: f64, unit: &str) -> &mut Self {
        self.append_number(value);
        self.output().push_str(unit);
        self
    }

    /// `#rrggbb`, or the source spelling when one is known and not inlining
    pub fn append_color(&mut self, color: Color, hint: Option<&str>) -> &mut Self {
        match hint {
            Some(hint) if !self.cursor.inline_mode => {
                self.output().push_str(hint);
            }
            _ => {
                let hex = color.to_hex();
                self.output().push_str(&hex);
            }
        }
        self
    }

    /// `rgba(r, g, b, a)` with 8-bit channels
    pub fn append_rgba(&mut self, color: Color) -> &mut Self {
        let text = format!(
            "rgba({}, {}, {}, {})",
            color.red(),
            color.green(),
            color.blue(),
            format_number(color.alpha())
        );
        self.output().push_str(&text);
        self
    }

    /// Lowest `digits` hex digits of `value`
    pub fn append_hex(&mut self, value: u32, digits: u32) -> &mut Self {
        push_hex(self.output(), value, digits);
        self
    }

    pub fn space(&mut self) -> &mut Self {
        self.append_char(' ')
    }

    pub fn newline(&mut self) -> &mut Self {
        self.append_char('\n')
    }

    pub fn semicolon(&mut self) -> &mut Self {
        self.append_char(';')
    }

    pub fn insets(&mut self) -> &mut Self {
        let insets = self.cursor.insets.clone();
        self.output().push_str(&insets);
        self
    }

    pub fn inc_insets(&mut self) {
        let indent = &self.shared.options.indent;
        self.cursor.insets.push_str(indent);
    }

    pub fn dec_insets(&mut self) {
        let step = self.shared.options.indent.len();
        debug_assert!(self.cursor.insets.len() >= step, "insets underflow");
        let len = self.cursor.insets.len().saturating_sub(step);
        self.cursor.insets.truncate(len);
    }

    pub fn comment(&mut self, message: &str) -> &mut Self {
        self.insets();
        self.output().push_str(message);
        self.newline()
    }

    // ----- blocks -------------------------------------------------------

    pub fn block_deep(&self) -> usize {
        self.cursor.block_deep
    }

    /// Selectors of the top-level block currently written
    pub fn selectors(&self) -> &[String] {
        &self.cursor.selectors
    }

    /// Open a rule block.
    ///
    /// At top level, a block whose selector list equals the one of the
    /// immediately preceding rule segment continues that segment. A
    /// conditional group nested in another one is hoisted to a new top level
    /// segment with both conditions joined by `and`. Any other nested block
    /// is written inline.
    pub fn open_block(&mut self, selectors: &[String]) {
        if self.cursor.block_deep == 0 {
            self.cursor.output = None;
            let merged = match self.shared.segments.last() {
                Some(OutputSegment::Rule {
                    selectors: previous,
                    buffer,
                }) if previous.as_slice() == selectors => Some(*buffer),
                _ => None,
            };
            let buffer = match merged {
                Some(buffer) => {
                    debug!(selectors = ?selectors, "Merging into previous block");
                    buffer
                }
                None => self.new_rule_segment(selectors.to_vec()),
            };
            self.enter_block(selectors.to_vec(), buffer);
            return;
        }

        let outer = self.cursor.selectors.first().filter(|s| is_guard(s));
        let inner = selectors.first().filter(|s| is_guard(s));
        if let (Some(outer), Some(inner)) = (outer, inner) {
            let condition = inner[GUARD_PREFIX.len()..].trim();
            let combined = vec![format!("{} and {}", outer, condition)];
            debug!(selector = %combined[0], "Hoisting nested conditional group");
            let buffer = self.new_rule_segment(combined.clone());
            self.enter_block(combined, buffer);
            return;
        }

        self.cursor.block_deep += 1;
        self.start_block_impl(selectors);
    }

    fn new_rule_segment(&mut self, selectors: Vec<String>) -> BufferId {
        let buffer = self.shared.pool.acquire();
        self.shared
            .segments
            .push(OutputSegment::Rule { selectors, buffer });
        buffer
    }

    fn enter_block(&mut self, selectors: Vec<String>, buffer: BufferId) {
        let block = Cursor {
            selectors,
            output: Some(buffer),
            outputs: Vec::new(),
            insets: String::new(),
            important: self.cursor.important,
            inline_mode: self.cursor.inline_mode,
            block_deep: 1,
        };
        let outer = std::mem::replace(&mut self.cursor, block);
        self.views.push(outer);
        self.inc_insets();
    }

    fn start_block_impl(&mut self, selectors: &[String]) {
        for (i, selector) in selectors.iter().enumerate() {
            if i > 0 {
                self.append_char(',');
                self.newline();
            }
            self.insets();
            self.append(selector);
        }
        self.space();
        self.append_char('{');
        self.newline();
        self.inc_insets();
    }

    pub fn close_block(&mut self) {
        debug_assert!(self.cursor.block_deep > 0, "close_block without open block");
        if self.cursor.block_deep == 0 {
            return;
        }
        self.cursor.block_deep -= 1;
        if self.cursor.block_deep == 0 {
            debug_assert!(
                self.cursor.outputs.is_empty(),
                "block closed with pushed output buffers"
            );
            self.cursor.insets.clear();
            self.cursor.inline_mode = false;
            if let Some(outer) = self.views.pop() {
                self.cursor = outer;
            }
        } else {
            self.end_block_impl();
        }
    }

    fn end_block_impl(&mut self) {
        self.dec_insets();
        self.insets();
        self.append_char('}');
        self.newline();
    }

    /// `name: value;` with placeholders in the name substituted
    pub fn append_declaration(&mut self, name: &str, value: &dyn Expression) -> LessResult<()> {
        self.insets();
        self.append_with_placeholders(name)?;
        self.append_char(':');
        self.space();
        value.append_to(self)?;
        if self.cursor.important {
            self.append(" !important");
        }
        self.semicolon();
        self.newline();
        Ok(())
    }

    /// Append `text`, replacing every `@{name}` by the value of `@name`
    pub fn append_with_placeholders(&mut self, text: &str) -> LessResult<()> {
        let mut rest = text;
        while let Some(start) = rest.find("@{") {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            self.output().push_str(&rest[..start]);
            let name = format!("@{}", &rest[start + 2..start + len]);
            let value = self
                .lookup_variable(&name)
                .ok_or_else(|| LessError::undefined_variable(name.clone()))?;
            let inline = self.cursor.inline_mode;
            self.cursor.inline_mode = true;
            let result = value.append_to(self);
            self.cursor.inline_mode = inline;
            result?;
            rest = &rest[start + len + 1..];
        }
        self.output().push_str(rest);
        Ok(())
    }

    // ----- finalization ---------------------------------------------------

    /// Assemble all segments in emission order, applying extends
    #[instrument(skip(self), fields(segments = self.shared.segments.len()))]
    pub fn finalize(self) -> String {
        debug_assert!(
            self.views.is_empty() && self.cursor.block_deep == 0,
            "finalize with open blocks"
        );
        debug_assert_eq!(self.shared.scopes.depth(), 0, "finalize with pushed scopes");

        let mut target = String::new();
        for segment in &self.shared.segments {
            match segment {
                OutputSegment::Plain { buffer } => {
                    target.push_str(self.shared.pool.get(*buffer));
                }
                OutputSegment::Rule { selectors, buffer } => {
                    let body = self.shared.pool.get(*buffer);
                    if body.is_empty() {
                        continue;
                    }
                    let selectors = self.shared.extends.resolve(selectors);
                    target.push_str(&selectors.join(",\n"));
                    target.push_str(" {\n");
                    target.push_str(body);
                    target.push_str("}\n");
                }
            }
        }
        debug!(bytes = target.len(), "Formatting pass finalized");
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn keyword(text: &str) -> ValueExpression {
        ValueExpression::string(text)
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(1.0 / 3.0), "0.33333333");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1e10), "10000000000");
        assert_eq!(format_number(-0.000000001), "0");
    }

    #[test]
    fn test_consecutive_blocks_merge() {
        let mut f = CssFormatter::new();
        f.open_block(&sel(&[".a"]));
        f.append_declaration("color", &keyword("red")).unwrap();
        f.close_block();
        f.open_block(&sel(&[".a"]));
        f.append_declaration("width", &ValueExpression::number(10.0, "px")).unwrap();
        f.close_block();

        assert_eq!(f.finalize(), ".a {\n  color: red;\n  width: 10px;\n}\n");
    }

    #[test]
    fn test_different_selector_order_does_not_merge() {
        let mut f = CssFormatter::new();
        f.open_block(&sel(&[".a", ".b"]));
        f.append_declaration("color", &keyword("red")).unwrap();
        f.close_block();
        f.open_block(&sel(&[".b", ".a"]));
        f.append_declaration("color", &keyword("blue")).unwrap();
        f.close_block();

        assert_eq!(
            f.finalize(),
            ".a,\n.b {\n  color: red;\n}\n.b,\n.a {\n  color: blue;\n}\n"
        );
    }

    #[test]
    fn test_interleaved_blocks_do_not_merge() {
        let mut f = CssFormatter::new();
        for selector in [".a", ".b", ".a"] {
            f.open_block(&sel(&[selector]));
            f.append_declaration("x", &keyword("1")).unwrap();
            f.close_block();
        }

        assert_eq!(f.finalize().matches(".a {").count(), 2);
    }

    #[test]
    fn test_nested_block_written_inline() {
        let mut f = CssFormatter::new();
        f.open_block(&sel(&["@keyframes spin"]));
        f.open_block(&sel(&["from"]));
        f.append_declaration("opacity", &ValueExpression::number(0.0, "")).unwrap();
        f.close_block();
        f.close_block();

        assert_eq!(
            f.finalize(),
            "@keyframes spin {\n  from {\n    opacity: 0;\n  }\n}\n"
        );
    }

    #[test]
    fn test_nested_media_is_hoisted_and_combined() {
        let mut f = CssFormatter::new();
        f.open_block(&sel(&["@media screen"]));
        f.open_block(&sel(&["@media (min-width: 768px)"]));
        f.append_declaration("color", &keyword("red")).unwrap();
        f.close_block();
        assert_eq!(f.block_deep(), 1);
        f.close_block();
        assert_eq!(f.block_deep(), 0);

        assert_eq!(
            f.finalize(),
            "@media screen and (min-width: 768px) {\n  color: red;\n}\n"
        );
    }

    #[test]
    fn test_block_without_selectors_stays_paired() {
        let mut f = CssFormatter::new();
        f.open_block(&sel(&["@media screen"]));
        f.open_block(&[]);
        f.append_declaration("color", &keyword("red")).unwrap();
        f.close_block();
        assert_eq!(f.block_deep(), 1);
        f.close_block();
        assert_eq!(f.block_deep(), 0);

        let css = f.finalize();
        assert!(css.starts_with("@media screen {\n"));
        assert!(css.contains("color: red;"));
    }

    #[test]
    fn test_important_flag() {
        let mut f = CssFormatter::new();
        f.open_block(&sel(&[".a"]));
        f.set_important(true);
        f.append_declaration("color", &keyword("red")).unwrap();
        f.set_important(false);
        f.close_block();

        assert_eq!(f.finalize(), ".a {\n  color: red !important;\n}\n");
    }

    #[test]
    fn test_output_redirection() {
        let mut f = CssFormatter::new();
        f.open_block(&sel(&[".a"]));
        f.append("before");

        f.push_buffer();
        f.append("scratch");
        assert_eq!(f.capture_and_pop(), "scratch");

        f.push_buffer();
        f.append("discarded");
        f.pop_buffer();

        f.push_buffer();
        f.append("-kept");
        f.flush_and_pop();

        assert_eq!(f.output_len(), Some("before-kept".len()));
        f.truncate_output(0);
        f.close_block();
    }

    #[test]
    fn test_inline_mode_strips_quotes() {
        let mut f = CssFormatter::new();
        f.push_buffer();
        f.set_inline_mode(true);
        f.append("\"quoted\"");
        f.set_inline_mode(false);
        f.append("'kept'");
        assert_eq!(f.capture_and_pop(), "quoted'kept'");
    }

    #[test]
    fn test_close_resets_inline_mode() {
        let mut f = CssFormatter::new();
        f.open_block(&sel(&[".a"]));
        f.set_inline_mode(true);
        f.close_block();
        assert!(!f.inline_mode());
    }

    #[test]
    fn test_header_precedes_rules() {
        let mut f = CssFormatter::new();
        f.open_block(&sel(&[".a"]));
        f.append_declaration("color", &keyword("red")).unwrap();
        f.close_block();
        f.append_header("@charset \"UTF-8\";\n");
        f.set_charset_directive();
        assert!(f.is_charset_directive());

        assert_eq!(
            f.finalize(),
            "@charset \"UTF-8\";\n.a {\n  color: red;\n}\n"
        );
    }

    #[test]
    fn test_top_level_text_keeps_position() {
        let mut f = CssFormatter::new();
        f.open_block(&sel(&[".a"]));
        f.append_declaration("color", &keyword("red")).unwrap();
        f.close_block();
        f.comment("/* between */");
        f.open_block(&sel(&[".a"]));
        f.append_declaration("width", &keyword("0")).unwrap();
        f.close_block();

        assert_eq!(
            f.finalize(),
            ".a {\n  color: red;\n}\n/* between */\n.a {\n  width: 0;\n}\n"
        );
    }

    #[test]
    fn test_empty_blocks_are_dropped() {
        let mut f = CssFormatter::new();
        f.open_block(&sel(&[".empty"]));
        f.close_block();
        assert_eq!(f.finalize(), "");
    }

    #[test]
    fn test_extend_resolved_at_finalize() {
        let mut f = CssFormatter::new();
        f.open_block(&sel(&[".a"]));
        f.append_declaration("color", &keyword("red")).unwrap();
        f.close_block();
        f.open_block(&sel(&[".b"]));
        f.add_extend(".a", false);
        f.append_declaration("width", &keyword("0")).unwrap();
        f.close_block();

        assert_eq!(
            f.finalize(),
            ".a,\n.b {\n  color: red;\n}\n.b {\n  width: 0;\n}\n"
        );
    }

    #[test]
    fn test_placeholders_in_property_names() {
        let mut f = CssFormatter::new();
        let mut vars = Bindings::new();
        vars.insert("@side".to_string(), keyword("\"left\"").into_ref());
        f.push_variables(Some(vars));
        f.open_block(&sel(&[".a"]));
        f.append_declaration("margin-@{side}", &ValueExpression::number(4.0, "px"))
            .unwrap();
        let missing = f.append_declaration("padding-@{nope}", &keyword("0"));
        assert!(matches!(missing, Err(LessError::UndefinedVariable { .. })));
        f.truncate_output("  margin-left: 4px;\n".len());
        f.close_block();
        f.pop_mixin_scope().unwrap();

        assert_eq!(f.finalize(), ".a {\n  margin-left: 4px;\n}\n");
    }

    #[test]
    fn test_scope_export_on_pop() {
        let mut f = CssFormatter::new();
        f.push_variables(Some(Bindings::new()));
        let mut inner = Bindings::new();
        inner.insert("@x".to_string(), ValueExpression::number(5.0, "").into_ref());
        f.push_mixin_scope(None, None, Some(inner));
        f.pop_mixin_scope().unwrap();

        let x = f.lookup_variable("@x").unwrap();
        assert_eq!(x.double_value(&mut f).unwrap(), 5.0);
        assert_eq!(f.scope_depth(), 1);
        f.pop_mixin_scope().unwrap();
    }

    #[test]
    fn test_scope_export_never_overwrites_caller() {
        let mut f = CssFormatter::new();
        let mut outer = Bindings::new();
        outer.insert("@x".to_string(), ValueExpression::number(1.0, "").into_ref());
        f.push_variables(Some(outer));
        let mut inner = Bindings::new();
        inner.insert("@x".to_string(), ValueExpression::number(5.0, "").into_ref());
        f.push_mixin_scope(None, None, Some(inner));
        f.pop_mixin_scope().unwrap();

        let x = f.lookup_variable("@x").unwrap();
        assert_eq!(x.double_value(&mut f).unwrap(), 1.0);
        f.pop_mixin_scope().unwrap();
    }

    #[test]
    fn test_stack_id() {
        let mut f = CssFormatter::new();
        let start = f.stack_id();
        assert_eq!(f.stack_id(), start);
        f.push_variables(None);
        let pushed = f.stack_id();
        assert_ne!(pushed, start);
        f.pop_mixin_scope().unwrap();
        assert_ne!(f.stack_id(), pushed);

        assert_ne!(CssFormatter::new().stack_id(), start);
    }

    #[test]
    fn test_options_from_json() {
        let options: FormatterOptions = serde_json::from_str(r#"{"indent": "    "}"#).unwrap();
        let mut f = CssFormatter::with_options(options);
        f.open_block(&sel(&[".a"]));
        f.append_declaration("color", &keyword("red")).unwrap();
        f.close_block();
        assert_eq!(f.finalize(), ".a {\n    color: red;\n}\n");

        let defaults: FormatterOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, FormatterOptions::default());
    }
}
