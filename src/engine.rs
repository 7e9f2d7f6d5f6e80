//! Discovery engine
//!
//! One [`Engine`] owns one tenant graph together with its derived state: the
//! landmark index and the latest network report. Queries read an immutable
//! snapshot of each; rebuilds publish a new `Arc` when done, so a running
//! query never sees a half-built index.

use crate::algo::SearchBudget;
use crate::analytics::{analyze, NetworkReport};
use crate::config::EngineConfig;
use crate::discovery::{self, DiscoveryContext, DiscoveryRequest, DiscoveryResponse};
use crate::error::{EngineError, EngineResult};
use crate::graph::{EdgeId, EdgeInput, GraphMutation, GraphStore, NodeId, NodeInput, SharedGraph};
use crate::landmark::LandmarkIndex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Point-in-time counters for health endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub graph_version: u64,
    pub landmark_count: usize,
    pub landmarks_stale: bool,
    /// Graph version the cached network report was computed for
    pub network_report_version: Option<u64>,
}

/// Clears the rebuild flag when a rebuild ends, however it ends
struct RebuildGuard<'a>(&'a AtomicBool);

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Path discovery over one tenant graph
#[derive(Debug)]
pub struct Engine {
    graph: SharedGraph,
    landmarks: RwLock<Arc<LandmarkIndex>>,
    network: RwLock<Option<Arc<NetworkReport>>>,
    rebuilding: AtomicBool,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        Self::with_graph(config, GraphStore::new())
    }

    pub fn with_graph(config: EngineConfig, store: GraphStore) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            graph: SharedGraph::from_store(store),
            landmarks: RwLock::new(Arc::new(LandmarkIndex::empty())),
            network: RwLock::new(None),
            rebuilding: AtomicBool::new(false),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub fn snapshot(&self) -> Arc<GraphStore> {
        self.graph.snapshot()
    }

    pub fn upsert_node(&self, input: NodeInput) -> EngineResult<NodeId> {
        Ok(self.graph.upsert_node(input)?)
    }

    pub fn upsert_edge(&self, input: EdgeInput) -> EngineResult<EdgeId> {
        Ok(self.graph.upsert_edge(input)?)
    }

    pub fn apply_batch(&self, mutations: Vec<GraphMutation>) -> EngineResult<usize> {
        Ok(self.graph.apply_batch(mutations)?)
    }

    /// Current landmark index, possibly stale
    pub fn landmarks(&self) -> Arc<LandmarkIndex> {
        let guard = self.landmarks.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn landmarks_stale(&self) -> bool {
        self.landmarks()
            .is_stale(&self.snapshot(), self.config.landmarks.staleness_delta)
    }

    /// Rebuild the landmark index from the current snapshot.
    ///
    /// Queries keep the previous index until the new one is swapped in. When a
    /// rebuild is already running this returns the current index untouched.
    pub fn rebuild_landmarks(&self, budget: &SearchBudget) -> EngineResult<Arc<LandmarkIndex>> {
        if self.rebuilding.swap(true, Ordering::AcqRel) {
            debug!("landmark rebuild already in progress");
            return Ok(self.landmarks());
        }
        let _guard = RebuildGuard(&self.rebuilding);

        let started = Instant::now();
        let store = self.snapshot();
        let index = Arc::new(LandmarkIndex::build(&store, self.config.landmarks.count, budget)?);

        let keys = index.landmark_keys();
        self.graph.write(|store| {
            store.mark_landmarks(&keys);
            Ok(())
        })?;

        *self.landmarks.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&index);
        info!(
            landmarks = keys.len(),
            version = store.version(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "landmark index swapped in"
        );
        Ok(index)
    }

    /// Rebuild only when the graph drifted past the staleness delta
    pub fn refresh_landmarks_if_stale(&self) -> EngineResult<bool> {
        if !self.landmarks_stale() {
            return Ok(false);
        }
        self.rebuild_landmarks(&SearchBudget::unlimited())?;
        Ok(true)
    }

    pub fn cached_network_report(&self) -> Option<Arc<NetworkReport>> {
        self.network
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recompute network metrics and write centrality and influence back to
    /// the graph.
    pub fn refresh_scores(&self) -> EngineResult<Arc<NetworkReport>> {
        let store = self.snapshot();
        let landmarks = self.landmarks().landmark_keys();
        let report = Arc::new(analyze(&store, &landmarks, &self.config.analytics));

        self.graph.write(|store| {
            store.apply_derived_scores(&report.scores);
            Ok(())
        })?;

        *self.network.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&report));
        Ok(report)
    }

    /// Network report for the current graph version, computed if missing
    pub fn network_report(&self) -> EngineResult<Arc<NetworkReport>> {
        let version = self.snapshot().version();
        match self.cached_network_report() {
            Some(report) if report.graph_version == version => Ok(report),
            _ => self.refresh_scores(),
        }
    }

    /// Budget for one search under the configured limits
    pub fn search_budget(&self, cancel: Option<Arc<AtomicBool>>) -> SearchBudget {
        let budget = SearchBudget::unlimited()
            .with_timeout(self.config.search.timeout())
            .with_max_expansions(self.config.search.max_expansions);
        match cancel {
            Some(flag) => budget.with_cancel_flag(flag),
            None => budget,
        }
    }

    /// Run one discovery against the current snapshot.
    ///
    /// Uses whatever network report is cached; it never computes one.
    pub fn discover(&self, request: &DiscoveryRequest, budget: &SearchBudget) -> EngineResult<DiscoveryResponse> {
        let started = Instant::now();
        let store = self.snapshot();
        let landmarks = self.landmarks();
        let network = self.cached_network_report();

        let ctx = DiscoveryContext {
            store: &store,
            landmarks: &landmarks,
            network: network.as_deref(),
            config: &self.config,
        };

        match discovery::discover(ctx, request, budget) {
            Ok(response) => {
                info!(
                    source = %request.source_id,
                    target = %request.target_id,
                    algorithm = %request.resolved_algorithm(),
                    paths = response.paths.len(),
                    status = ?response.status,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "discovery completed"
                );
                Ok(response)
            }
            Err(err @ EngineError::GraphInconsistency(_)) => {
                error!(source = %request.source_id, target = %request.target_id, "discovery failed: {}", err);
                Err(err)
            }
            Err(err) => {
                debug!(source = %request.source_id, target = %request.target_id, "discovery rejected: {}", err);
                Err(err)
            }
        }
    }

    /// Check arena invariants of the current snapshot
    pub fn verify(&self) -> EngineResult<()> {
        self.graph.verify().map_err(|err| {
            let err = EngineError::from(err);
            error!("graph verification failed: {}", err);
            err
        })
    }

    pub fn stats(&self) -> EngineStats {
        let store = self.snapshot();
        let landmarks = self.landmarks();
        EngineStats {
            node_count: store.node_count(),
            edge_count: store.edge_count(),
            graph_version: store.version(),
            landmark_count: landmarks.landmarks().len(),
            landmarks_stale: landmarks.is_stale(&store, self.config.landmarks.staleness_delta),
            network_report_version: self.cached_network_report().map(|r| r.graph_version),
        }
    }
}

/// Periodically refresh derived state in the background.
///
/// Each tick recomputes network scores when the graph changed and rebuilds
/// landmarks when they drifted. Work runs on the blocking pool.
pub fn spawn_maintenance(engine: Arc<Engine>) -> JoinHandle<()> {
    let period = Duration::from_secs(engine.config().landmarks.refresh_interval_secs.max(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;

            let worker = Arc::clone(&engine);
            let outcome = tokio::task::spawn_blocking(move || -> EngineResult<()> {
                let version = worker.snapshot().version();
                let scored = worker.cached_network_report().map(|r| r.graph_version);
                if scored != Some(version) {
                    worker.refresh_scores()?;
                }
                worker.refresh_landmarks_if_stale()?;
                Ok(())
            })
            .await;

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!("background maintenance failed: {}", err),
                Err(join_err) => error!("background maintenance panicked: {}", join_err),
            }
        }
    })
}
