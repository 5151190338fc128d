//! A single entry of the package index.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tag carried by packages whose upstream repository no longer exists
pub const TAG_DELETED: &str = "deleted";
/// Tag carried by packages whose upstream repository is read-only
pub const TAG_ARCHIVED: &str = "archived";

/// A package record, kept as the raw JSON object so fields this tool does not
/// know about, and their order, survive a rewrite.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Package {
    fields: Map<String, Value>,
}

impl Package {
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Declared source location: `url`, falling back to `web`
    pub fn source_url(&self) -> Option<&str> {
        self.str_field("url").or_else(|| self.str_field("web"))
    }

    pub fn method(&self) -> Option<&str> {
        self.str_field("method")
    }

    pub fn license(&self) -> Option<&str> {
        self.str_field("license")
    }

    pub fn description(&self) -> Option<&str> {
        self.str_field("description")
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Tag set; an absent `tags` field and an empty one are the same thing
    pub fn tags(&self) -> BTreeSet<String> {
        match self.fields.get("tags") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => BTreeSet::new(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().contains(tag)
    }

    /// Add `tag`, persisting the set sorted. Returns false if it was already there.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let mut tags = self.tags();
        if !tags.insert(tag.to_string()) {
            return false;
        }
        self.set_tags(tags);
        true
    }

    /// Rewrite an existing `tags` field sorted and deduplicated
    pub fn normalize_tags(&mut self) {
        if self.fields.contains_key("tags") {
            let tags = self.tags();
            self.set_tags(tags);
        }
    }

    fn set_tags(&mut self, tags: BTreeSet<String>) {
        let tags = tags.into_iter().map(Value::String).collect();
        self.fields.insert("tags".to_string(), Value::Array(tags));
    }

    /// Name for diagnostics, or the whole record when it has none
    pub fn display_name(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => Value::Object(self.fields.clone()).to_string(),
        }
    }
}

impl From<Map<String, Value>> for Package {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(fields)
    }
}
