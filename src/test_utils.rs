//! Terse tree builders and pipeline shortcuts to help write concise tests.

use crate::edit_script::{self, Action, annotate_changes};
use crate::mapping::Mapping;
use crate::output;
use crate::tree::Tree;
use crate::tree_builder::SourceNode;
use crate::tree_matcher::TreeMatcher;

pub(crate) fn valued_node(kind: &str, value: &str, children: Vec<SourceNode>) -> SourceNode {
    SourceNode {
        kind: kind.to_owned(),
        value: Some(value.to_owned()),
        begin: 0,
        end: 0,
        children,
    }
}

pub(crate) fn node(kind: &str, children: Vec<SourceNode>) -> SourceNode {
    SourceNode {
        kind: kind.to_owned(),
        value: None,
        begin: 0,
        end: 0,
        children,
    }
}

pub(crate) fn leaf(kind: &str) -> SourceNode {
    node(kind, Vec::new())
}

pub(crate) fn valued_leaf(kind: &str, value: &str) -> SourceNode {
    valued_node(kind, value, Vec::new())
}

pub(crate) fn tree(root: SourceNode) -> Tree {
    Tree::new(String::new(), &root)
}

/// Run the full pipeline with default parameters, returning the final
/// mapping (including phantom links) and the edit script.
pub(crate) fn diff(src: &mut Tree, dst: &mut Tree) -> (Mapping, Vec<Action>) {
    let matcher = TreeMatcher::default();
    let mut mapping = matcher.match_trees(src, dst);
    annotate_changes(src, dst, &mapping);
    let actions = edit_script::generate(src, dst, &mut mapping);
    (mapping, actions)
}

/// Run the full pipeline with default parameters and render the text diff.
pub(crate) fn diff_text(src: &mut Tree, dst: &mut Tree) -> String {
    let matcher = TreeMatcher::default();
    let mut mapping = matcher.match_trees(src, dst);
    annotate_changes(src, dst, &mapping);
    output::text_diff(src, dst, &mut mapping)
}
