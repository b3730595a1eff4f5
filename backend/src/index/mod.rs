//! Aggregation index (AVL tree)
//!
//! Height-balanced binary search tree keyed by actor identifier, filled by
//! one streaming pass over the ledger and discarded at the end of the run.
//!
//! # Critical Invariants
//!
//! 1. **Balance**: after every insertion, every node's balance factor
//!    (right height minus left height) is in {-1, 0, +1}
//! 2. **Stable keys**: an identifier is never re-keyed; an existing entry
//!    is mutated in place, a new entry is created otherwise
//! 3. **Exclusive ownership**: the index owns every [`ActorRecord`]; lookups
//!    hand out borrows, never copies of ownership
//!
//! # Example
//!
//! ```rust
//! use water_network_core_rs::AggregationIndex;
//!
//! let mut index = AggregationIndex::new();
//! index.insert("Plant Alpha");
//! index.add_captured("Plant Alpha", 100.0);
//! assert_eq!(index.get("Plant Alpha").unwrap().captured_volume(), 100.0);
//! assert!(index.get("Plant Beta").is_none());
//! ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::ActorRecord;

/// Metric selected when exporting the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// Declared maximum capacity
    MaxCapacity,
    /// Total captured volume
    Captured,
    /// Total treated volume
    Treated,
}

impl Metric {
    /// Extract the selected metric from a record
    pub fn select(&self, record: &ActorRecord) -> f64 {
        match self {
            Metric::MaxCapacity => record.max_capacity(),
            Metric::Captured => record.captured_volume(),
            Metric::Treated => record.treated_volume(),
        }
    }

    /// Report-header label for the metric
    pub fn header_label(&self) -> &'static str {
        match self {
            Metric::MaxCapacity => "max volume",
            Metric::Captured => "source volume",
            Metric::Treated => "real volume",
        }
    }
}

/// One tree node: identifier, aggregate record, cached subtree height
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AvlNode {
    id: String,
    record: ActorRecord,
    height: u32,
    left: Option<Box<AvlNode>>,
    right: Option<Box<AvlNode>>,
}

impl AvlNode {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            record: ActorRecord::new(),
            height: 1,
            left: None,
            right: None,
        }
    }
}

fn height(node: &Option<Box<AvlNode>>) -> u32 {
    node.as_ref().map_or(0, |n| n.height)
}

fn update_height(node: &mut AvlNode) {
    node.height = 1 + height(&node.left).max(height(&node.right));
}

/// Balance factor convention: right height minus left height
fn balance_factor(node: &AvlNode) -> i32 {
    height(&node.right) as i32 - height(&node.left) as i32
}

fn rotate_left(mut a: Box<AvlNode>) -> Box<AvlNode> {
    let Some(mut b) = a.right.take() else { return a };
    a.right = b.left.take();
    update_height(&mut a);
    b.left = Some(a);
    update_height(&mut b);
    b
}

fn rotate_right(mut a: Box<AvlNode>) -> Box<AvlNode> {
    let Some(mut b) = a.left.take() else { return a };
    a.left = b.right.take();
    update_height(&mut a);
    b.right = Some(a);
    update_height(&mut b);
    b
}

/// Classical AVL rebalancing: single rotation when the offending child
/// leans the same way as the parent, double rotation otherwise.
fn rebalance(mut node: Box<AvlNode>) -> Box<AvlNode> {
    update_height(&mut node);
    let factor = balance_factor(&node);

    if factor >= 2 {
        if node.right.as_deref().map_or(0, balance_factor) < 0 {
            node.right = node.right.take().map(rotate_right);
            update_height(&mut node);
        }
        return rotate_left(node);
    }
    if factor <= -2 {
        if node.left.as_deref().map_or(0, balance_factor) > 0 {
            node.left = node.left.take().map(rotate_left);
            update_height(&mut node);
        }
        return rotate_right(node);
    }
    node
}

fn insert_node(node: Option<Box<AvlNode>>, id: &str, created: &mut bool) -> Box<AvlNode> {
    match node {
        None => {
            *created = true;
            Box::new(AvlNode::new(id))
        }
        Some(mut n) => {
            match id.cmp(n.id.as_str()) {
                Ordering::Less => n.left = Some(insert_node(n.left.take(), id, created)),
                Ordering::Greater => n.right = Some(insert_node(n.right.take(), id, created)),
                Ordering::Equal => return n,
            }
            rebalance(n)
        }
    }
}

/// Height-balanced ordered map from actor identifier to [`ActorRecord`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationIndex {
    root: Option<Box<AvlNode>>,
    len: usize,
}

impl AggregationIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a zero-initialized record exists for `id`
    ///
    /// Idempotent: inserting an existing identifier leaves its record
    /// untouched. Returns true iff a new record was created.
    pub fn insert(&mut self, id: &str) -> bool {
        let mut created = false;
        self.root = Some(insert_node(self.root.take(), id, &mut created));
        if created {
            self.len += 1;
        }
        created
    }

    /// Look up a record: O(log n), absence is a normal outcome
    pub fn get(&self, id: &str) -> Option<&ActorRecord> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match id.cmp(node.id.as_str()) {
                Ordering::Equal => return Some(&node.record),
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => current = node.right.as_deref(),
            }
        }
        None
    }

    /// Mutable lookup; field mutation never triggers rebalancing
    pub fn get_mut(&mut self, id: &str) -> Option<&mut ActorRecord> {
        let mut current = self.root.as_deref_mut();
        while let Some(node) = current {
            match id.cmp(node.id.as_str()) {
                Ordering::Equal => return Some(&mut node.record),
                Ordering::Less => current = node.left.as_deref_mut(),
                Ordering::Greater => current = node.right.as_deref_mut(),
            }
        }
        None
    }

    /// Accumulate captured volume for an existing entry
    ///
    /// No-op when the identifier is absent or the value is not finite.
    pub fn add_captured(&mut self, id: &str, v: f64) {
        if let Some(record) = self.get_mut(id) {
            record.add_captured(v);
        }
    }

    /// Accumulate treated volume for an existing entry
    pub fn add_treated(&mut self, id: &str, v: f64) {
        if let Some(record) = self.get_mut(id) {
            record.add_treated(v);
        }
    }

    /// Overwrite max capacity for an existing entry (positive values only)
    pub fn set_max_capacity(&mut self, id: &str, v: f64) {
        if let Some(record) = self.get_mut(id) {
            record.set_max_capacity(v);
        }
    }

    /// Number of records in the index
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the index holds no records
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// In-order traversal (ascending identifier), iterative
    pub fn for_each_ascending<F: FnMut(&str, &ActorRecord)>(&self, mut f: F) {
        let mut stack: Vec<&AvlNode> = Vec::new();
        let mut current = self.root.as_deref();
        while current.is_some() || !stack.is_empty() {
            while let Some(node) = current {
                stack.push(node);
                current = node.left.as_deref();
            }
            let Some(node) = stack.pop() else { break };
            f(&node.id, &node.record);
            current = node.right.as_deref();
        }
    }

    /// Reverse in-order traversal (descending identifier), iterative
    pub fn for_each_descending<F: FnMut(&str, &ActorRecord)>(&self, mut f: F) {
        let mut stack: Vec<&AvlNode> = Vec::new();
        let mut current = self.root.as_deref();
        while current.is_some() || !stack.is_empty() {
            while let Some(node) = current {
                stack.push(node);
                current = node.right.as_deref();
            }
            let Some(node) = stack.pop() else { break };
            f(&node.id, &node.record);
            current = node.left.as_deref();
        }
    }

    /// Walk the tree and check every balance factor (test support)
    ///
    /// Returns the worst absolute balance factor observed, 0 for an empty
    /// tree. A balanced tree never exceeds 1.
    pub fn max_abs_balance_factor(&self) -> i32 {
        fn walk(node: &Option<Box<AvlNode>>, worst: &mut i32) -> u32 {
            let Some(n) = node.as_deref() else { return 0 };
            let lh = walk(&n.left, worst);
            let rh = walk(&n.right, worst);
            let factor = rh as i32 - lh as i32;
            *worst = (*worst).max(factor.abs());
            1 + lh.max(rh)
        }
        let mut worst = 0;
        walk(&self.root, &mut worst);
        worst
    }
}

// ============================================================================
// Tests (module-level)
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_index() {
        let index = AggregationIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert!(index.get("anything").is_none());
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut index = AggregationIndex::new();
        assert!(index.insert("Plant Alpha"));
        assert!(!index.insert("Plant Alpha"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_insert_preserves_existing_record() {
        let mut index = AggregationIndex::new();
        index.insert("Plant Alpha");
        index.add_captured("Plant Alpha", 42.0);
        index.insert("Plant Alpha");
        assert_eq!(index.get("Plant Alpha").unwrap().captured_volume(), 42.0);
    }

    #[test]
    fn test_mutation_on_absent_id_is_noop() {
        let mut index = AggregationIndex::new();
        index.add_captured("ghost", 10.0);
        index.add_treated("ghost", 10.0);
        index.set_max_capacity("ghost", 10.0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_ascending_insert_stays_balanced() {
        // Worst case for an unbalanced BST: sorted insertion order
        let mut index = AggregationIndex::new();
        for i in 0..128 {
            index.insert(&format!("actor_{i:04}"));
            assert!(index.max_abs_balance_factor() <= 1);
        }
        assert_eq!(index.len(), 128);
    }

    #[test]
    fn test_descending_insert_stays_balanced() {
        let mut index = AggregationIndex::new();
        for i in (0..128).rev() {
            index.insert(&format!("actor_{i:04}"));
            assert!(index.max_abs_balance_factor() <= 1);
        }
        assert_eq!(index.len(), 128);
    }

    #[test]
    fn test_traversal_orders() {
        let mut index = AggregationIndex::new();
        for id in ["delta", "alpha", "echo", "bravo", "charlie"] {
            index.insert(id);
        }

        let mut ascending = Vec::new();
        index.for_each_ascending(|id, _| ascending.push(id.to_string()));
        assert_eq!(ascending, ["alpha", "bravo", "charlie", "delta", "echo"]);

        let mut descending = Vec::new();
        index.for_each_descending(|id, _| descending.push(id.to_string()));
        assert_eq!(descending, ["echo", "delta", "charlie", "bravo", "alpha"]);
    }

    #[test]
    fn test_metric_selection() {
        let mut record = ActorRecord::new();
        record.set_max_capacity(500.0);
        record.add_captured(100.0);
        record.add_treated(90.0);

        assert_eq!(Metric::MaxCapacity.select(&record), 500.0);
        assert_eq!(Metric::Captured.select(&record), 100.0);
        assert_eq!(Metric::Treated.select(&record), 90.0);
    }
}
