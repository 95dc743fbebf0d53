//! Graph node/edge vocabulary materialized by the Graph Materializer (§3, §6).
//! The Graph Store itself is backend-agnostic (key-value-labelled-property
//! graph); these types are the fixed vocabulary of labels and edge kinds the
//! Materializer is allowed to assert.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeLabel {
    Project,
    Folder,
    File,
    Class,
    Function,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Project => "Project",
            NodeLabel::Folder => "Folder",
            NodeLabel::File => "File",
            NodeLabel::Class => "Class",
            NodeLabel::Function => "Function",
        }
    }
}

impl std::fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Contains,
    Inherits,
    Implements,
    Calls,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Contains => "CONTAINS",
            EdgeType::Inherits => "INHERITS",
            EdgeType::Implements => "IMPLEMENTS",
            EdgeType::Calls => "CALLS",
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Property bag carried by every node; `key_props` values are also indexed
/// for node identity (a node's key is `(label, key_props)`).
pub type PropertyMap = HashMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub label: NodeLabel,
    pub key_props: PropertyMap,
    pub set_props: PropertyMap,
    pub created_at: i64,
    pub updated_at: i64,
}

impl GraphNode {
    pub fn new(label: NodeLabel, key_props: PropertyMap, set_props: PropertyMap, now: i64) -> Self {
        Self {
            label,
            key_props,
            set_props,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key_value(&self, key: &str) -> Option<&str> {
        self.key_props.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub edge_type: EdgeType,
    pub from_label: NodeLabel,
    pub from_key: PropertyMap,
    pub to_label: NodeLabel,
    pub to_key: PropertyMap,
}

impl GraphEdge {
    pub fn new(
        edge_type: EdgeType,
        from_label: NodeLabel,
        from_key: PropertyMap,
        to_label: NodeLabel,
        to_key: PropertyMap,
    ) -> Self {
        Self {
            edge_type,
            from_label,
            from_key,
            to_label,
            to_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_label_round_trips_through_str() {
        assert_eq!(NodeLabel::Function.as_str(), "Function");
    }

    #[test]
    fn key_value_looks_up_key_props_only() {
        let mut key_props = PropertyMap::new();
        key_props.insert("full_name".to_string(), "pkg.mod.f".to_string());
        let node = GraphNode::new(NodeLabel::Function, key_props, PropertyMap::new(), 0);
        assert_eq!(node.key_value("full_name"), Some("pkg.mod.f"));
        assert_eq!(node.key_value("missing"), None);
    }
}
