//! Build-tool configuration touched by the server-target setup hook
//!
//! Only the fields the adapter reads or writes are typed; everything else in
//! the host's configuration is carried through `extra` untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Module specifier rewritten for server bundles
pub const REACT_DOM_SERVER: &str = "react-dom/server";
/// Browser build used in place of [`REACT_DOM_SERVER`]
pub const REACT_DOM_SERVER_BROWSER: &str = "react-dom/server.browser";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub resolve: ResolveConfig,
    #[serde(default)]
    pub build: ToolBuildConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolveConfig {
    #[serde(default)]
    pub alias: Aliases,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Module aliases, either as an ordered list of rules or a specifier map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Aliases {
    List(Vec<Alias>),
    Map(BTreeMap<String, String>),
}

impl Default for Aliases {
    fn default() -> Self {
        Self::Map(BTreeMap::new())
    }
}

impl Aliases {
    /// Add a rule, keeping whichever form the host chose
    pub fn push(&mut self, alias: Alias) {
        match self {
            Self::List(list) => list.push(alias),
            Self::Map(map) => {
                map.insert(alias.find, alias.replacement);
            }
        }
    }

    #[cfg(test)]
    fn resolve(&self, specifier: &str) -> Option<&str> {
        match self {
            Self::List(list) => list
                .iter()
                .rev()
                .find(|a| a.find == specifier)
                .map(|a| a.replacement.as_str()),
            Self::Map(map) => map.get(specifier).map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub find: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolBuildConfig {
    #[serde(default, rename = "rollupOptions")]
    pub chunking: ChunkingOptions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkingOptions {
    #[serde(default, deserialize_with = "one_or_many")]
    pub external: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub output: Vec<OutputOptions>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One output descriptor of the server build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    /// Chunk naming template. Non-string values (naming functions) are kept
    /// but ignored by cleanup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_file_names: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OutputOptions {
    pub fn with_chunk_file_names(template: &str) -> Self {
        Self {
            chunk_file_names: Some(Value::String(template.to_string())),
            extra: Map::new(),
        }
    }

    /// The chunk template when it is a plain string
    pub fn chunk_template(&self) -> Option<&str> {
        self.chunk_file_names.as_ref().and_then(Value::as_str)
    }
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
        None(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
        OneOrMany::None(()) => Vec::new(),
    })
}

/// Server-target setup: alias React's server renderer to its browser build.
///
/// `external` is already a list after deserialization.
pub fn apply_server_setup(config: &mut ToolConfig) {
    config.resolve.alias.push(Alias {
        find: REACT_DOM_SERVER.to_string(),
        replacement: REACT_DOM_SERVER_BROWSER.to_string(),
    });
}
