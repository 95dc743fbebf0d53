use async_trait::async_trait;

use crate::domain::{DomainError, EdgeType, GraphNode, NodeLabel, PropertyMap};

/// Abstract key-value-labelled-property graph with transactional upsert and
/// detach-delete (§6). The Graph Materializer is the only caller; queries
/// that need traversal (impact analysis, call graphs) go through the
/// Materializer's own read methods, not this trait directly.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Creates or updates a node keyed by `(label, key_props)`. `set_props`
    /// always overwrite; `set_on_create_props` apply only the first time the
    /// node is created (stamps `created_at` without ever rewriting it).
    async fn upsert_node(
        &self,
        label: NodeLabel,
        key_props: PropertyMap,
        set_props: PropertyMap,
        set_on_create_props: PropertyMap,
    ) -> Result<(), DomainError>;

    async fn upsert_edge(
        &self,
        edge_type: EdgeType,
        from_label: NodeLabel,
        from_key: PropertyMap,
        to_label: NodeLabel,
        to_key: PropertyMap,
    ) -> Result<(), DomainError>;

    /// Deletes every node matching `(label, key_props)` along with every
    /// edge touching it.
    async fn detach_delete_by_match(
        &self,
        label: NodeLabel,
        key_props: PropertyMap,
    ) -> Result<u64, DomainError>;

    /// Returns every node matching `(label, key_props)` — a partial key
    /// (e.g. just `project_id`) matches every node sharing that prefix.
    async fn query_nodes(
        &self,
        label: NodeLabel,
        key_props: PropertyMap,
    ) -> Result<Vec<GraphNode>, DomainError>;

    /// Returns the keys of nodes reachable from `from_key` via `edge_type`,
    /// one hop, in the `to_label` namespace.
    async fn query_neighbors(
        &self,
        edge_type: EdgeType,
        from_label: NodeLabel,
        from_key: PropertyMap,
        to_label: NodeLabel,
    ) -> Result<Vec<GraphNode>, DomainError>;
}
