//! Shell variables used to format prompts.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::PromptConfig;

/// A property evaluated each time it is read.
pub type Computed = fn() -> String;

/// String-keyed variable store with computed properties.
///
/// Stored values shadow computed properties of the same name.
#[derive(Debug, Clone)]
pub struct Environment {
    values: BTreeMap<String, String>,
    computed: BTreeMap<String, Computed>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

fn current_dir() -> String {
    std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

impl Environment {
    /// An environment holding only the `cwd` computed property.
    pub fn new() -> Self {
        let mut env = Self {
            values: BTreeMap::new(),
            computed: BTreeMap::new(),
        };
        env.define_computed("cwd", current_dir);
        env
    }

    /// `new()` plus `prompt` and `prompt2` from configuration.
    pub fn with_prompts(prompts: &PromptConfig) -> Self {
        let mut env = Self::new();
        env.set("prompt", &prompts.primary);
        env.set("prompt2", &prompts.continuation);
        env
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.values.get(key) {
            return Some(value.clone());
        }
        self.computed.get(key).map(|compute| compute())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Remove a stored value or computed property; returns whether anything was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let stored = self.values.remove(key).is_some();
        let computed = self.computed.remove(key).is_some();
        stored || computed
    }

    pub fn define_computed(&mut self, key: impl Into<String>, compute: Computed) {
        self.computed.insert(key.into(), compute);
    }

    /// All names, stored and computed, in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let keys: BTreeSet<&str> = self
            .values
            .keys()
            .chain(self.computed.keys())
            .map(String::as_str)
            .collect();
        keys.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.computed.is_empty()
    }

    /// Replace each `{name}` in `template` with the value of `name`.
    ///
    /// Unknown names are left as written. `{{` and `}}` produce literal braces.
    pub fn format(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix("{{") {
                out.push('{');
                rest = after;
            } else if let Some(after) = tail.strip_prefix("}}") {
                out.push('}');
                rest = after;
            } else if tail.starts_with('{')
                && let Some(end) = tail.find('}')
            {
                match self.get(&tail[1..end]) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&tail[..=end]),
                }
                rest = &tail[end + 1..];
            } else {
                out.push_str(&tail[..1]);
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}
