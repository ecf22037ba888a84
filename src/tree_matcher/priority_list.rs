use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use itertools::Itertools;

use crate::tree::Tree;

/// A priority queue which indexes subtrees by their height.
/// This follows the "indexed priority list" of
/// [Fine-grained and accurate source code differencing](https://hal.science/hal-01054552), Falleri et al. 2014.
#[derive(Debug, Default)]
pub struct PriorityList {
    heap: BinaryHeap<Entry>,
}

#[derive(Debug, PartialEq, Eq)]
struct Entry {
    height: i32,
    post_id: usize,
}

impl PriorityList {
    /// Creates an empty priority list
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new subtree to the priority list
    pub fn push(&mut self, tree: &Tree, id: usize) {
        self.heap.push(Entry {
            height: tree.node(id).height,
            post_id: id,
        });
    }

    /// Returns the maximum height of the subtrees in the list
    pub fn peek_max(&self) -> Option<i32> {
        self.heap.peek().map(|entry| entry.height)
    }

    /// Removes all subtrees of maximum height and returns them,
    /// sorted by pre-order id so that batches are processed in a
    /// reproducible order
    pub fn pop(&mut self, tree: &Tree) -> Vec<usize> {
        let desired_height = self.peek_max();
        let mut results = Vec::new();
        while desired_height.is_some() && desired_height == self.peek_max() {
            results.push(self.heap.pop().expect("peeked entry must exist").post_id);
        }
        results
            .into_iter()
            .sorted_by_key(|&id| tree.node(id).pre_id)
            .collect()
    }

    /// Adds all of the direct children of a node into the queue
    pub fn open(&mut self, tree: &Tree, id: usize) {
        for &child in &tree.node(id).children {
            self.push(tree, child);
        }
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.height, Reverse(self.post_id)).cmp(&(other.height, Reverse(other.post_id)))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
