//! Serialized writer path over a copy-on-write graph
//!
//! Readers take an `Arc<GraphStore>` snapshot and keep it for the whole
//! operation. Writers are serialized through one mutex and publish their change
//! by swapping the `Arc`; a store still referenced by a reader is cloned before
//! mutation, so a snapshot never changes underneath its holder.

use super::edge::EdgeInput;
use super::node::NodeInput;
use super::store::{GraphError, GraphResult, GraphStore};
use super::types::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::debug;

/// One upsert in a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphMutation {
    Node(NodeInput),
    Edge(EdgeInput),
}

/// Shared handle to one tenant graph
#[derive(Debug, Default)]
pub struct SharedGraph {
    current: RwLock<Arc<GraphStore>>,
    writer: Mutex<()>,
}

impl SharedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_store(store: GraphStore) -> Self {
        Self {
            current: RwLock::new(Arc::new(store)),
            writer: Mutex::new(()),
        }
    }

    /// Consistent, immutable view of the graph as of now
    pub fn snapshot(&self) -> Arc<GraphStore> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn upsert_node(&self, input: NodeInput) -> GraphResult<NodeId> {
        self.write(|store| store.upsert_node(input))
    }

    pub fn upsert_edge(&self, input: EdgeInput) -> GraphResult<EdgeId> {
        self.write(|store| store.upsert_edge(input))
    }

    /// Apply several upserts atomically: either all become visible or none.
    pub fn apply_batch(&self, mutations: Vec<GraphMutation>) -> GraphResult<usize> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut draft = (*self.snapshot()).clone();
        let count = mutations.len();
        for mutation in mutations {
            match mutation {
                GraphMutation::Node(input) => {
                    draft.upsert_node(input)?;
                }
                GraphMutation::Edge(input) => {
                    draft.upsert_edge(input)?;
                }
            }
        }

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(draft);
        debug!(count, version = current.version(), "applied graph batch");
        Ok(count)
    }

    /// Run a single mutation under the writer lock.
    ///
    /// Store mutations validate before touching state, so a failed call leaves
    /// the graph unchanged. An unshared store is mutated in place; otherwise the
    /// copy is made with only the writer lock held, and readers are blocked just
    /// for the swap.
    pub fn write<R>(&self, f: impl FnOnce(&mut GraphStore) -> GraphResult<R>) -> GraphResult<R> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(store) = Arc::get_mut(&mut *current) {
                return f(store);
            }
        }

        let mut draft = (*self.snapshot()).clone();
        let result = f(&mut draft)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(draft);
        Ok(result)
    }

    /// Run a consistency check on the current snapshot
    pub fn verify(&self) -> GraphResult<()> {
        self.snapshot().consistency_check().map_err(|e| match e {
            GraphError::EdgeNotFound(id) => GraphError::Inconsistent(format!("missing {}", id)),
            other => other,
        })
    }
}
