//! Distribution graph
//!
//! Directed graph of distribution actors connected by percentage-weighted,
//! loss-attenuating edges. Built in two passes over the classified ledger:
//! an edge cannot be created until both endpoints exist, and endpoints may
//! be declared in either order relative to the edges referencing them.
//!
//! Nodes live in an arena (`Vec`) addressed by stable `usize` indices; a
//! `BTreeMap` search index over identifiers accelerates construction and
//! resolves the propagation entry point. Raw sources and end-users never
//! become nodes.
//!
//! # Determinism
//!
//! - The search index is a balanced ordered tree, iteration is sorted
//! - Edge order within a node follows ledger order
//! - Construction is deterministic for a given row sequence

pub mod propagate;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::RowClassifier;
use crate::models::{LedgerRow, RowKind};

pub use propagate::{PropagationError, PropagationOutcome};

/// Errors raised during graph construction
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    /// Pass 1 guarantees every non-source upstream has a node; its absence
    /// at Pass 2 is a construction bug, not bad input
    #[error("internal graph inconsistency: upstream node '{id}' missing at edge creation")]
    MissingUpstream { id: String },
}

/// One outgoing edge of a distribution node
///
/// A terminal edge (`downstream == None`) leads to an end-user: the water
/// that survives the segment is fully consumed there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildEdge {
    /// Leak percentage for the segment, clamped to 0-100
    pub leak_percent: f64,

    /// Arena index of the downstream node; `None` marks a terminal edge
    pub downstream: Option<usize>,
}

/// One distribution actor in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionNode {
    /// Actor identifier
    pub id: String,

    /// Nearest enclosing processing actor responsible for water flowing
    /// through this node (the row's declared actor, falling back to the
    /// node's own identifier)
    pub owner_id: String,

    /// Outgoing edges in ledger order
    pub edges: Vec<ChildEdge>,
}

/// Directed distribution graph with arena-owned nodes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistributionGraph {
    /// Arena: exclusive owner of every node
    nodes: Vec<DistributionNode>,

    /// Identifier → arena index (balanced ordered tree)
    by_id: BTreeMap<String, usize>,
}

impl DistributionGraph {
    /// Build the graph from classified rows in two passes
    ///
    /// Pass 1 discovers nodes, Pass 2 attaches edges. Returns an error only
    /// on an internal invariant violation (see [`GraphError`]).
    pub fn build(
        rows: &[LedgerRow],
        classifier: &dyn RowClassifier,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::default();
        graph.discover_nodes(rows, classifier);
        graph.create_edges(rows, classifier)?;
        Ok(graph)
    }

    /// Pass 1: allocate a node for every identifier that denotes a
    /// distribution actor and is not yet registered
    fn discover_nodes(&mut self, rows: &[LedgerRow], classifier: &dyn RowClassifier) {
        for row in rows {
            let kind = classifier.classify(row);
            if kind == RowKind::Unknown {
                continue;
            }
            let owner = row.actor_id();

            if let Some(id) = row.actor_id() {
                self.register(id, owner);
            }
            // The upstream of a source row is a raw source, never a node
            if kind != RowKind::SourceToActor {
                if let Some(id) = row.upstream_id() {
                    self.register(id, owner);
                }
            }
            // The downstream of a user row is an end-user, never a node
            if kind != RowKind::ActorToUser {
                if let Some(id) = row.downstream_id() {
                    self.register(id, owner);
                }
            }
        }
    }

    fn register(&mut self, id: &str, owner: Option<&str>) {
        if self.by_id.contains_key(id) {
            return;
        }
        let index = self.nodes.len();
        self.nodes.push(DistributionNode {
            id: id.to_string(),
            owner_id: owner.unwrap_or(id).to_string(),
            edges: Vec::new(),
        });
        self.by_id.insert(id.to_string(), index);
    }

    /// Pass 2: attach one edge per row whose upstream is a distribution actor
    fn create_edges(
        &mut self,
        rows: &[LedgerRow],
        classifier: &dyn RowClassifier,
    ) -> Result<(), GraphError> {
        for row in rows {
            let kind = classifier.classify(row);
            let terminal = match kind {
                RowKind::ActorToActor => false,
                RowKind::ActorToUser => true,
                // Source rows have no upstream node; declarations carry no edge
                RowKind::SourceToActor | RowKind::ActorDeclaration | RowKind::Unknown => continue,
            };

            let Some(upstream_id) = row.upstream_id() else {
                tracing::warn!(?kind, "link row without upstream identifier skipped");
                continue;
            };
            let upstream = *self.by_id.get(upstream_id).ok_or_else(|| {
                GraphError::MissingUpstream {
                    id: upstream_id.to_string(),
                }
            })?;

            let downstream = if terminal {
                None
            } else {
                let Some(downstream_id) = row.downstream_id() else {
                    tracing::warn!(upstream = upstream_id, "link row without downstream identifier skipped");
                    continue;
                };
                match self.by_id.get(downstream_id) {
                    Some(&index) => Some(index),
                    None => {
                        // The original dropped this silently; keep the row
                        // out of the graph but make the drop visible.
                        tracing::warn!(
                            upstream = upstream_id,
                            downstream = downstream_id,
                            "unresolvable downstream, edge skipped"
                        );
                        continue;
                    }
                }
            };

            self.nodes[upstream].edges.push(ChildEdge {
                leak_percent: row.leak_percent_clamped(),
                downstream,
            });
        }
        Ok(())
    }

    /// Resolve an identifier to its arena index
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Borrow a node by arena index
    pub fn node(&self, index: usize) -> Option<&DistributionNode> {
        self.nodes.get(index)
    }

    /// Number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of edges across all nodes
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.edges.len()).sum()
    }

    /// Node identifiers in sorted order
    pub fn ids_sorted(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    pub(crate) fn nodes(&self) -> &[DistributionNode] {
        &self.nodes
    }
}
