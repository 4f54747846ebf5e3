//! The JSON-like configuration tree (`vp_component`, `vp_comps`, `vp_ports`,
//! `vp_bindings` and friends) that parameterizes a component hierarchy.
//!
//! Parsing is delegated to `serde_json` rather than hand-rolled: the
//! `preserve_order` feature keeps object keys in declaration order (backed by
//! `indexmap`), which matters because binding/port declaration order is
//! observable in fan-out delivery order (see [`crate::port`]).

use crate::error::{VpError, VpResult};
use indexmap::IndexMap;
use serde_json::Value;

/// Node of the parsed config tree. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    Object(IndexMap<String, ConfigNode>),
    Array(Vec<ConfigNode>),
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl ConfigNode {
    /// Parses a JSON document into a config tree.
    pub fn parse(text: &str) -> VpResult<ConfigNode> {
        let value: Value = serde_json::from_str(text)?;
        Ok(ConfigNode::from(value))
    }

    pub fn as_str(&self) -> VpResult<&str> {
        match self {
            ConfigNode::String(s) => Ok(s.as_str()),
            other => Err(VpError::ConfigLookup {
                path: String::new(),
                reason: format!("expected string, found {}", other.kind()),
            }),
        }
    }

    pub fn as_i64(&self) -> VpResult<i64> {
        self.as_f64().map(|f| f as i64)
    }

    pub fn as_f64(&self) -> VpResult<f64> {
        match self {
            ConfigNode::Number(n) => Ok(*n),
            other => Err(VpError::ConfigLookup {
                path: String::new(),
                reason: format!("expected number, found {}", other.kind()),
            }),
        }
    }

    pub fn as_bool(&self) -> VpResult<bool> {
        match self {
            ConfigNode::Bool(b) => Ok(*b),
            other => Err(VpError::ConfigLookup {
                path: String::new(),
                reason: format!("expected bool, found {}", other.kind()),
            }),
        }
    }

    pub fn elements(&self) -> VpResult<&[ConfigNode]> {
        match self {
            ConfigNode::Array(items) => Ok(items.as_slice()),
            other => Err(VpError::ConfigLookup {
                path: String::new(),
                reason: format!("expected array, found {}", other.kind()),
            }),
        }
    }

    /// Direct child lookup on an object node; `None` on missing key or
    /// non-object node.
    pub fn child(&self, name: &str) -> Option<&ConfigNode> {
        match self {
            ConfigNode::Object(map) => map.get(name),
            _ => None,
        }
    }

    /// Path lookup supporting `*` (exactly one level) and `**` (zero or more
    /// levels) segments, first pre-order match wins.
    pub fn get(&self, path: &str) -> Option<&ConfigNode> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.get_segments(&segments)
    }

    fn get_segments(&self, segments: &[&str]) -> Option<&ConfigNode> {
        match segments.first() {
            None => Some(self),
            Some(&"**") => {
                // Zero-or-more: try matching the rest here first (zero
                // levels consumed), then recurse into every child.
                if let Some(found) = self.get_segments(&segments[1..]) {
                    return Some(found);
                }
                if let ConfigNode::Object(map) = self {
                    for child in map.values() {
                        if let Some(found) = child.get_segments(segments) {
                            return Some(found);
                        }
                    }
                }
                None
            }
            Some(&"*") => {
                if let ConfigNode::Object(map) = self {
                    for child in map.values() {
                        if let Some(found) = child.get_segments(&segments[1..]) {
                            return Some(found);
                        }
                    }
                }
                None
            }
            Some(name) => self.child(name)?.get_segments(&segments[1..]),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ConfigNode::Object(_) => "object",
            ConfigNode::Array(_) => "array",
            ConfigNode::String(_) => "string",
            ConfigNode::Number(_) => "number",
            ConfigNode::Bool(_) => "bool",
            ConfigNode::Null => "null",
        }
    }
}

impl From<Value> for ConfigNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                ConfigNode::Object(map.into_iter().map(|(k, v)| (k, ConfigNode::from(v))).collect())
            }
            Value::Array(items) => ConfigNode::Array(items.into_iter().map(ConfigNode::from).collect()),
            Value::String(s) => ConfigNode::String(s),
            Value::Number(n) => ConfigNode::Number(n.as_f64().unwrap_or(0.0)),
            Value::Bool(b) => ConfigNode::Bool(b),
            Value::Null => ConfigNode::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_single_level() {
        let cfg = ConfigNode::parse(r#"{"x":{"y":{"z":{"v":42}}}}"#).unwrap();
        assert_eq!(cfg.get("x/**/v").unwrap().as_i64().unwrap(), 42);
        assert!(cfg.get("x/*/v").is_none());
        assert_eq!(cfg.get("x/*/z/v").unwrap().as_i64().unwrap(), 42);
    }

    #[test]
    fn object_preserves_declaration_order() {
        let cfg = ConfigNode::parse(r#"{"b":1,"a":2,"c":3}"#).unwrap();
        if let ConfigNode::Object(map) = cfg {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["b", "a", "c"]);
        } else {
            panic!("expected object");
        }
    }

    #[test]
    fn missing_path_is_none() {
        let cfg = ConfigNode::parse(r#"{"a":1}"#).unwrap();
        assert!(cfg.get("b/c").is_none());
    }

    #[test]
    fn type_mismatch_errors_without_panicking() {
        let cfg = ConfigNode::parse(r#"{"a":"not a number"}"#).unwrap();
        let node = cfg.child("a").unwrap();
        assert!(node.as_i64().is_err());
    }

    proptest::proptest! {
        /// A path built entirely of the segments actually present from root
        /// to leaf, interspersed with `**`, must still resolve to the leaf:
        /// `**` can always collapse to zero levels.
        #[test]
        fn dotted_path_with_double_star_always_reaches_a_known_leaf(
            segments in proptest::collection::vec("[a-z]{1,6}", 1..5),
        ) {
            let mut cfg = ConfigNode::Number(7.0);
            for seg in segments.iter().rev() {
                let mut map = IndexMap::new();
                map.insert(seg.clone(), cfg);
                cfg = ConfigNode::Object(map);
            }
            let direct_path = segments.join("/");
            proptest::prop_assert_eq!(cfg.get(&direct_path).and_then(|n| n.as_i64().ok()), Some(7));

            let starred = format!("**/{}", segments.last().unwrap());
            proptest::prop_assert!(cfg.get(&starred).is_some());
        }
    }
}
