//! Structural diffing of syntax trees
//!
//! ## Overview
//!
//! Gumdiff computes a node-to-node mapping between two syntax trees parsed
//! from source files, and derives an edit script (updates, insertions,
//! deletions and moves) that turns the first tree into the second. The
//! matching follows the classic GumTree algorithm: a top-down pass anchors
//! large isomorphic subtrees, and a bottom-up pass matches the surrounding
//! containers by similarity, falling back on an optimal tree-edit-distance
//! matching for small subtrees.
//!
//! Parsing is not part of this crate: trees are read from a JSON format
//! produced by an external parser, and diffs are emitted either as GumTree
//! text output or as a dual-tree JSON document for a browser viewer.
//!
//! It is primarily designed to be used as a CLI; the Rust API is not meant
//! to be stable.

pub mod edit_script;
pub mod mapping;
pub mod output;
pub(crate) mod similarity;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod tree;
pub mod tree_builder;
pub mod tree_matcher;

use mapping::Mapping;
use tree::Tree;
use tree_matcher::TreeMatcher;

pub(crate) fn fxhasher() -> rustc_hash::FxHasher {
    rustc_hash::FxHasher::default()
}

/// Match two trees and label every node of both with its change.
/// This is the common stem of all diff outputs.
pub fn match_and_annotate(matcher: &TreeMatcher, src: &mut Tree, dst: &mut Tree) -> Mapping {
    let mapping = matcher.match_trees(src, dst);
    edit_script::annotate_changes(src, dst, &mapping);
    mapping
}
