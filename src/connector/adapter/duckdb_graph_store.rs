use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::GraphStore;
use crate::domain::{DomainError, EdgeType, GraphNode, NodeLabel, PropertyMap};

/// DuckDB-backed labelled-property graph. Call-graph edges are stored here
/// as ordinary `CALLS` rows rather than in a dedicated symbol-reference
/// table — the Graph Materializer is the only writer, and every consumer
/// (impact analysis, symbol context) walks the same `graph_edges` table.
///
/// Node identity is `(label, key_props)`; `key_props` is serialized to a
/// canonical string for the primary key and kept as JSON for readback.
/// Partial-key lookups (`query_nodes` with e.g. only `project_id` set) are
/// resolved in Rust by containment-matching the decoded property map,
/// since DuckDB has no native support for "is-subset-of" predicates.
pub struct DuckdbGraphStore {
    conn: Arc<Mutex<Connection>>,
}

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn canonical_key(props: &PropertyMap) -> String {
    let mut pairs: Vec<(&String, &String)> = props.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}\u{1}{v}"))
        .collect::<Vec<_>>()
        .join("\u{2}")
}

fn matches(stored: &PropertyMap, filter: &PropertyMap) -> bool {
    filter
        .iter()
        .all(|(k, v)| stored.get(k).is_some_and(|sv| sv == v))
}

impl DuckdbGraphStore {
    pub fn with_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, DomainError> {
        Ok(Self { conn })
    }

    pub async fn initialize(&self) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS graph_nodes (
                label TEXT NOT NULL,
                key_canon TEXT NOT NULL,
                key_props TEXT NOT NULL,
                set_props TEXT NOT NULL,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL,
                PRIMARY KEY (label, key_canon)
            );

            CREATE TABLE IF NOT EXISTS graph_edges (
                edge_type TEXT NOT NULL,
                from_label TEXT NOT NULL,
                from_key_canon TEXT NOT NULL,
                to_label TEXT NOT NULL,
                to_key_canon TEXT NOT NULL,
                PRIMARY KEY (edge_type, from_label, from_key_canon, to_label, to_key_canon)
            );

            CREATE INDEX IF NOT EXISTS idx_graph_edges_from
            ON graph_edges(from_label, from_key_canon, edge_type);
            "#,
        )
        .map_err(|e| DomainError::storage(format!("Failed to initialize graph schema: {}", e)))?;

        debug!("DuckDB graph schema initialized");
        Ok(())
    }

    fn load_nodes(
        conn: &Connection,
        label: NodeLabel,
    ) -> Result<Vec<(String, PropertyMap, PropertyMap, i64, i64)>, DomainError> {
        let mut stmt = conn
            .prepare("SELECT key_canon, key_props, set_props, created_at, updated_at FROM graph_nodes WHERE label = ?")
            .map_err(|e| DomainError::storage(format!("Failed to prepare node query: {}", e)))?;

        let rows = stmt
            .query_map(params![label.as_str()], |row| {
                let key_canon: String = row.get(0)?;
                let key_json: String = row.get(1)?;
                let set_json: String = row.get(2)?;
                let created_at: i64 = row.get(3)?;
                let updated_at: i64 = row.get(4)?;
                Ok((key_canon, key_json, set_json, created_at, updated_at))
            })
            .map_err(|e| DomainError::storage(format!("Failed to query nodes: {}", e)))?;

        let mut out = Vec::new();
        for row in rows {
            let (key_canon, key_json, set_json, created_at, updated_at) =
                row.map_err(|e| DomainError::storage(format!("Failed to read node row: {}", e)))?;
            let key_props: PropertyMap = serde_json::from_str(&key_json).unwrap_or_default();
            let set_props: PropertyMap = serde_json::from_str(&set_json).unwrap_or_default();
            out.push((key_canon, key_props, set_props, created_at, updated_at));
        }
        Ok(out)
    }
}

#[async_trait]
impl GraphStore for DuckdbGraphStore {
    async fn upsert_node(
        &self,
        label: NodeLabel,
        key_props: PropertyMap,
        set_props: PropertyMap,
        set_on_create_props: PropertyMap,
    ) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        let key_canon = canonical_key(&key_props);
        let key_json = serde_json::to_string(&key_props)
            .map_err(|e| DomainError::schema_violation(format!("Failed to encode key: {}", e)))?;

        let existing: Option<String> = conn
            .query_row(
                "SELECT set_props FROM graph_nodes WHERE label = ? AND key_canon = ?",
                params![label.as_str(), key_canon],
                |row| row.get(0),
            )
            .ok();

        let now_ts = now();
        let (merged_props, created_at): (PropertyMap, i64) = if let Some(existing_json) = existing {
            let mut merged: PropertyMap =
                serde_json::from_str(&existing_json).unwrap_or_default();
            merged.extend(set_props);
            let created_at: i64 = conn
                .query_row(
                    "SELECT created_at FROM graph_nodes WHERE label = ? AND key_canon = ?",
                    params![label.as_str(), key_canon],
                    |row| row.get(0),
                )
                .unwrap_or(now_ts);
            (merged, created_at)
        } else {
            let mut merged = set_on_create_props;
            merged.extend(set_props);
            (merged, now_ts)
        };

        let set_json = serde_json::to_string(&merged_props)
            .map_err(|e| DomainError::schema_violation(format!("Failed to encode props: {}", e)))?;

        conn.execute(
            r#"
            INSERT INTO graph_nodes (label, key_canon, key_props, set_props, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (label, key_canon) DO UPDATE SET
                set_props = excluded.set_props,
                updated_at = excluded.updated_at
            "#,
            params![label.as_str(), key_canon, key_json, set_json, created_at, now_ts],
        )
        .map_err(|e| DomainError::storage(format!("Failed to upsert node: {}", e)))?;

        Ok(())
    }

    async fn upsert_edge(
        &self,
        edge_type: EdgeType,
        from_label: NodeLabel,
        from_key: PropertyMap,
        to_label: NodeLabel,
        to_key: PropertyMap,
    ) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        let from_canon = canonical_key(&from_key);
        let to_canon = canonical_key(&to_key);

        conn.execute(
            "INSERT OR REPLACE INTO graph_edges (edge_type, from_label, from_key_canon, to_label, to_key_canon) \
             VALUES (?, ?, ?, ?, ?)",
            params![
                edge_type.as_str(),
                from_label.as_str(),
                from_canon,
                to_label.as_str(),
                to_canon,
            ],
        )
        .map_err(|e| DomainError::storage(format!("Failed to upsert edge: {}", e)))?;

        Ok(())
    }

    async fn detach_delete_by_match(
        &self,
        label: NodeLabel,
        key_props: PropertyMap,
    ) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let candidates = Self::load_nodes(&conn, label)?;
        let mut deleted = 0u64;

        for (key_canon, stored_key, _, _, _) in candidates {
            if !matches(&stored_key, &key_props) {
                continue;
            }
            conn.execute(
                "DELETE FROM graph_edges WHERE (from_label = ? AND from_key_canon = ?) OR (to_label = ? AND to_key_canon = ?)",
                params![label.as_str(), key_canon, label.as_str(), key_canon],
            )
            .map_err(|e| DomainError::storage(format!("Failed to detach edges: {}", e)))?;
            conn.execute(
                "DELETE FROM graph_nodes WHERE label = ? AND key_canon = ?",
                params![label.as_str(), key_canon],
            )
            .map_err(|e| DomainError::storage(format!("Failed to delete node: {}", e)))?;
            deleted += 1;
        }

        Ok(deleted)
    }

    async fn query_nodes(
        &self,
        label: NodeLabel,
        key_props: PropertyMap,
    ) -> Result<Vec<GraphNode>, DomainError> {
        let conn = self.conn.lock().await;
        let candidates = Self::load_nodes(&conn, label)?;

        Ok(candidates
            .into_iter()
            .filter(|(_, stored_key, _, _, _)| matches(stored_key, &key_props))
            .map(|(_, stored_key, set_props, created_at, updated_at)| GraphNode {
                label,
                key_props: stored_key,
                set_props,
                created_at,
                updated_at,
            })
            .collect())
    }

    async fn query_neighbors(
        &self,
        edge_type: EdgeType,
        from_label: NodeLabel,
        from_key: PropertyMap,
        to_label: NodeLabel,
    ) -> Result<Vec<GraphNode>, DomainError> {
        let conn = self.conn.lock().await;
        let from_canon = canonical_key(&from_key);

        let mut stmt = conn
            .prepare(
                "SELECT to_key_canon FROM graph_edges \
                 WHERE edge_type = ? AND from_label = ? AND from_key_canon = ? AND to_label = ?",
            )
            .map_err(|e| DomainError::storage(format!("Failed to prepare neighbor query: {}", e)))?;

        let rows = stmt
            .query_map(
                params![edge_type.as_str(), from_label.as_str(), from_canon, to_label.as_str()],
                |row| row.get::<_, String>(0),
            )
            .map_err(|e| DomainError::storage(format!("Failed to query edges: {}", e)))?;

        let mut to_keys: Vec<String> = Vec::new();
        for row in rows {
            to_keys.push(row.map_err(|e| DomainError::storage(format!("Failed to read edge row: {}", e)))?);
        }

        let all_nodes = Self::load_nodes(&conn, to_label)?;
        let wanted: HashMap<&str, ()> = to_keys.iter().map(|k| (k.as_str(), ())).collect();

        Ok(all_nodes
            .into_iter()
            .filter(|(key_canon, ..)| wanted.contains_key(key_canon.as_str()))
            .map(|(_, key_props, set_props, created_at, updated_at)| GraphNode {
                label: to_label,
                key_props,
                set_props,
                created_at,
                updated_at,
            })
            .collect())
    }
}
