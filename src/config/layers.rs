//! Configuration layers.
//!
//! # Responsibilities
//! - Hold one source's values as a hierarchical JSON tree
//! - Map prefixed environment variables onto colon-delimited keys
//! - Provide the built-in defaults
//!
//! # Design Decisions
//! - Layers are pure data; precedence lives in the resolver
//! - Keys are colon-delimited paths (`mounts:0:provider`)
//! - A `null` value still counts as "defined" by its layer

use serde_json::{json, Map, Value};

/// Prefix selecting the environment variables that feed configuration.
pub const ENV_PREFIX: &str = "STASHBOX__";

/// Separator between segments of an environment variable name.
pub const ENV_SEGMENT_SEPARATOR: &str = "__";

/// Separator between segments of a configuration key.
pub const KEY_SEPARATOR: char = ':';

/// Largest array index an environment key may address.
const MAX_ARRAY_INDEX: usize = 1024;

/// A single source of configuration values.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    name: &'static str,
    tree: Value,
}

impl ConfigLayer {
    /// Create a layer from an already-built tree.
    ///
    /// Non-object trees are replaced by an empty object.
    pub fn new(name: &'static str, tree: Value) -> Self {
        let tree = match tree {
            Value::Object(_) => tree,
            _ => Value::Object(Map::new()),
        };
        Self { name, tree }
    }

    /// Create an empty layer.
    pub fn empty(name: &'static str) -> Self {
        Self::new(name, Value::Object(Map::new()))
    }

    /// Layer holding values derived from command-line flags.
    pub fn overrides(values: Map<String, Value>) -> Self {
        Self::new("overrides", Value::Object(values))
    }

    /// Layer built from `STASHBOX__`-prefixed environment variables.
    ///
    /// `STASHBOX__mounts__0__provider=file` becomes the key
    /// `mounts:0:provider`. When any variable addresses a key below
    /// `mounts`, the `mounts` collection is first initialised to an empty
    /// array so numeric segments build array entries.
    pub fn environment<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entries: Vec<(String, Value)> = vars
            .into_iter()
            .filter_map(|(name, value)| {
                let key = env_key(name.as_ref())?;
                Some((key, coerce_env_value(value.as_ref())))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut layer = Self::empty("environment");
        let mut mounts_created = false;
        for (key, value) in entries {
            if !mounts_created && key.starts_with("mounts:") {
                layer.set("mounts", Value::Array(Vec::new()));
                mounts_created = true;
            }
            layer.set(&key, value);
        }
        layer
    }

    /// Built-in defaults, the lowest-precedence layer.
    pub fn defaults() -> Self {
        Self::new(
            "defaults",
            json!({
                "PORT": 80,
                "LOGGING": {
                    "level": "info",
                    "format": "pretty"
                },
                "MAX_BODY_SIZE": 2 * 1024 * 1024,
                "mounts": [
                    { "mount": "/", "provider": "file", "basePath": "stash" }
                ]
            }),
        )
    }

    /// Name of this layer, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The whole tree held by this layer.
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Look up a colon-delimited key.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        key.split(KEY_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .try_fold(&self.tree, |node, segment| match node {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }

    /// Colon-delimited keys of every leaf value, in tree order.
    ///
    /// Empty objects and arrays count as leaves.
    pub fn leaf_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_leaf_keys(&self.tree, &mut String::new(), &mut keys);
        keys
    }

    /// Set a colon-delimited key, creating intermediate objects as needed.
    pub fn set(&mut self, key: &str, value: Value) {
        let segments: Vec<&str> = key
            .split(KEY_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .collect();
        if segments.is_empty() {
            return;
        }
        insert_path(&mut self.tree, &segments, value);
    }
}

/// Convert an environment variable name into a configuration key.
///
/// Returns `None` for variables outside the prefix.
pub fn env_key(name: &str) -> Option<String> {
    let rest = name.strip_prefix(ENV_PREFIX)?;
    let segments: Vec<&str> = rest
        .split(ENV_SEGMENT_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(segments.join(&KEY_SEPARATOR.to_string()))
}

/// Coerce the literal strings `true`, `false` and `null`.
pub fn coerce_env_value(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        other => Value::String(other.to_owned()),
    }
}

fn collect_leaf_keys(node: &Value, prefix: &mut String, keys: &mut Vec<String>) {
    let children: Vec<(String, &Value)> = match node {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items.iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect(),
        _ => Vec::new(),
    };
    if children.is_empty() {
        if !prefix.is_empty() {
            keys.push(prefix.clone());
        }
        return;
    }

    for (segment, child) in children {
        let len = prefix.len();
        if !prefix.is_empty() {
            prefix.push(KEY_SEPARATOR);
        }
        prefix.push_str(&segment);
        collect_leaf_keys(child, prefix, keys);
        prefix.truncate(len);
    }
}

fn insert_path(node: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    let index = head.parse::<usize>().ok();
    let child = match (node, index) {
        (Value::Array(items), Some(index)) => {
            if index > MAX_ARRAY_INDEX {
                tracing::warn!(index, "Ignoring configuration key with oversized array index");
                return;
            }
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            &mut items[index]
        }
        (node, _) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let Value::Object(map) = node else {
                return;
            };
            map.entry(head.to_string()).or_insert(Value::Null)
        }
    };
    insert_path(child, rest, value);
}
