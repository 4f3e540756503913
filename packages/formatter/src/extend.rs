//! Deferred `:extend` resolution.
//!
//! Extends are registered while rules are emitted but only applied when
//! the output is assembled, so a rule may extend a selector whose block was
//! emitted earlier or later in the source.

use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct ExtendMap {
    /// target selector -> selectors extending it exactly
    exact: IndexMap<String, Vec<String>>,
    /// `all` extends, applied to every selector containing the target
    partial: IndexMap<String, Vec<String>>,
}

fn push_unique(list: &mut Vec<String>, selector: &str) {
    if !list.iter().any(|s| s == selector) {
        list.push(selector.to_string());
    }
}

impl ExtendMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `selectors` extend `target`
    pub fn add(&mut self, target: &str, all: bool, selectors: &[String]) {
        let map = if all { &mut self.partial } else { &mut self.exact };
        let extenders = map.entry(target.trim().to_string()).or_default();
        for selector in selectors {
            push_unique(extenders, selector);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.partial.is_empty()
    }

    /// Selector list of a rule block with all extending selectors appended.
    /// Exact extends chain (`.c` extends `.b` extends `.a`); `all` extends
    /// are applied once over the result.
    pub fn resolve(&self, selectors: &[String]) -> Vec<String> {
        let mut result: Vec<String> = selectors.to_vec();
        if self.is_empty() {
            return result;
        }

        let mut idx = 0;
        while idx < result.len() {
            if let Some(extenders) = self.exact.get(result[idx].as_str()) {
                for extender in extenders {
                    push_unique(&mut result, extender);
                }
            }
            idx += 1;
        }

        let exact_count = result.len();
        for i in 0..exact_count {
            for (target, extenders) in &self.partial {
                if !result[i].contains(target.as_str()) {
                    continue;
                }
                for extender in extenders {
                    let replaced = result[i].replace(target.as_str(), extender);
                    push_unique(&mut result, &replaced);
                }
            }
        }
        result
    }
}
