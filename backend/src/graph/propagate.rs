//! Leak propagation engine
//!
//! Pushes a starting volume into a graph node and accumulates the total
//! leaked volume across all downstream segments. The traversal is an
//! explicit work stack (no call-stack recursion) with a path-based cycle
//! guard and a hard depth bound: the ledger is untrusted input and a
//! cyclic network must terminate with an error instead of spinning.
//!
//! # Critical Invariants
//!
//! 1. **Equal split**: a node with k outgoing edges gives each edge exactly
//!    `volume_in / k` before attenuation. This is the load-distribution
//!    model of the whole system (topology fan-out only) and must be
//!    preserved exactly for compatibility.
//! 2. **Per-edge conservation**: `share == segment_leak + volume_out` up to
//!    floating-point rounding.
//! 3. **Global conservation**: leaked + delivered == seed volume.

use thiserror::Error;

use super::DistributionGraph;

/// Upper bound on the propagation path length
///
/// Real distribution networks are shallow; hitting this bound means the
/// input is malformed in a way the cycle guard did not catch.
pub const MAX_DEPTH: usize = 4096;

/// Errors raised during propagation
#[derive(Debug, Error, PartialEq)]
pub enum PropagationError {
    /// The ledger describes a cycle (actor A feeds B feeds A)
    #[error("cycle detected in distribution graph at '{id}'")]
    CycleDetected { id: String },

    /// Path length exceeded [`MAX_DEPTH`]
    #[error("propagation depth exceeded {max} levels")]
    DepthExceeded { max: usize },

    /// The starting node is not in the graph
    #[error("start node '{id}' not present in distribution graph")]
    UnknownStart { id: String },
}

/// Result of one propagation run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PropagationOutcome {
    /// Total volume lost across all visited segments
    pub leaked: f64,

    /// Total volume delivered at terminal edges and dead-end nodes
    pub delivered: f64,
}

impl PropagationOutcome {
    /// leaked + delivered; equals the seed volume up to rounding
    pub fn total(&self) -> f64 {
        self.leaked + self.delivered
    }
}

/// One in-flight node on the propagation path
struct Frame {
    node: usize,
    volume_in: f64,
    next_edge: usize,
}

impl DistributionGraph {
    /// Propagate `seed` volume downstream from the node named `start_id`
    ///
    /// Splits the incoming volume equally across outgoing edges, attenuates
    /// each share by the edge's leak percentage, recurses into downstream
    /// nodes and consumes the remainder at terminal edges. A node with no
    /// outgoing edges delivers its full incoming volume.
    pub fn propagate(
        &self,
        start_id: &str,
        seed: f64,
    ) -> Result<PropagationOutcome, PropagationError> {
        let start = self
            .node_index(start_id)
            .ok_or_else(|| PropagationError::UnknownStart {
                id: start_id.to_string(),
            })?;

        let mut outcome = PropagationOutcome::default();
        let mut on_path = vec![false; self.node_count()];
        let mut stack = vec![Frame {
            node: start,
            volume_in: seed,
            next_edge: 0,
        }];
        on_path[start] = true;

        while let Some(top) = stack.last_mut() {
            let node_index = top.node;
            let edges = &self.nodes()[node_index].edges;

            // Dead end: water fully delivered, nothing further to account
            if edges.is_empty() {
                outcome.delivered += top.volume_in;
                on_path[node_index] = false;
                stack.pop();
                continue;
            }
            if top.next_edge == edges.len() {
                on_path[node_index] = false;
                stack.pop();
                continue;
            }

            let edge = &edges[top.next_edge];
            top.next_edge += 1;

            let share = top.volume_in / edges.len() as f64;
            let segment_leak = share * (edge.leak_percent / 100.0);
            let volume_out = share - segment_leak;
            outcome.leaked += segment_leak;

            match edge.downstream {
                // Terminal edge: the remainder is consumed at the user
                None => outcome.delivered += volume_out,
                Some(next) => {
                    if on_path[next] {
                        return Err(PropagationError::CycleDetected {
                            id: self.nodes()[next].id.clone(),
                        });
                    }
                    if stack.len() >= MAX_DEPTH {
                        return Err(PropagationError::DepthExceeded { max: MAX_DEPTH });
                    }
                    on_path[next] = true;
                    stack.push(Frame {
                        node: next,
                        volume_in: volume_out,
                        next_edge: 0,
                    });
                }
            }
        }

        Ok(outcome)
    }
}
