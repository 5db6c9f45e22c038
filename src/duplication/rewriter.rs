//! Identifier rewriting over schema-less task data.
//!
//! Task payloads are arbitrary JSON, and old task ids can show up anywhere
//! inside them (an image reference naming the task that built it, a URL to an
//! artifact of a sibling task). The rewriter walks the whole tree and replaces
//! every occurrence of an old id inside any string value, not only exact
//! matches.
//!
//! Replacement is a single left-to-right pass per string over a leftmost-longest
//! automaton built once per mapping: at each position the longest matching
//! old id wins, its new id is emitted, and scanning resumes after the match.
//! Emitted text is never scanned again, so a new id that happens to contain
//! another old id is left intact. Object keys are not rewritten.

use aho_corasick::{AhoCorasick, MatchKind};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::Result;
use crate::models::TaskDefinition;

pub struct IdentifierRewriter {
    /// `None` when there is nothing to replace
    matcher: Option<AhoCorasick>,
    /// New ids, indexed by pattern id
    replacements: Vec<String>,
}

impl IdentifierRewriter {
    pub fn new(mapping: &HashMap<String, String>) -> Result<Self> {
        let (patterns, replacements): (Vec<&str>, Vec<String>) = mapping
            .iter()
            .filter(|(old, _)| !old.is_empty())
            .map(|(old, new)| (old.as_str(), new.clone()))
            .unzip();

        let matcher = if patterns.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .match_kind(MatchKind::LeftmostLongest)
                    .build(&patterns)?,
            )
        };

        Ok(Self {
            matcher,
            replacements,
        })
    }

    /// Structurally identical copy of `value` with identifiers replaced
    pub fn rewrite(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.rewrite_str(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.rewrite(v)).collect()),
            Value::Object(map) => Value::Object(self.rewrite_map(map)),
            other => other.clone(),
        }
    }

    pub fn rewrite_task(&self, task: &TaskDefinition) -> TaskDefinition {
        TaskDefinition::from(self.rewrite_map(task.as_map()))
    }

    fn rewrite_map(&self, map: &Map<String, Value>) -> Map<String, Value> {
        map.iter()
            .map(|(key, value)| (key.clone(), self.rewrite(value)))
            .collect()
    }

    pub fn rewrite_str(&self, input: &str) -> String {
        match &self.matcher {
            Some(matcher) => matcher.replace_all(input, &self.replacements),
            None => input.to_string(),
        }
    }
}

/// Rewrite every old identifier in `value` using `mapping` (old → new)
pub fn rewrite_identifiers(value: &Value, mapping: &HashMap<String, String>) -> Result<Value> {
    Ok(IdentifierRewriter::new(mapping)?.rewrite(value))
}
