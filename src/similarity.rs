use std::sync::LazyLock;

use regex::Regex;

use crate::mapping::Mapping;
use crate::tree::{Node, Tree};

// Qualified name of a C++ method, up to the opening parenthesis. The leading
// `.` absorbs the `(` of `(anonymous namespace)` prefixes.
static QUALIFIED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.[^(]+\(").expect("the pattern is valid"));

// Unqualified name: the last `::`-free run before the parameter list.
static UNQUALIFIED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^(:]+\(").expect("the pattern is valid"));

static FUNCTION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z_][^\s(]*\(").expect("the pattern is valid"));

/// The ratio of descendants of `s` (including `s` itself) that are mapped
/// into the subtree of `d`, over the union of both subtrees.
pub fn jaccard(src: &Tree, dst: &Tree, s: usize, d: usize, mapping: &Mapping) -> f32 {
    let common = src
        .subtree(s)
        .filter(|&t| mapping.has_src(t) && dst.is_in_subtree(mapping.dst(t), d))
        .count();
    let union = src.subtree_size(s) + dst.subtree_size(d) - common;
    common as f32 / union as f32
}

/// Whether both nodes are roots, or their parents are mapped to each other.
pub fn same_parents(src: &Tree, dst: &Tree, s: usize, d: usize, mapping: &Mapping) -> bool {
    match (src.node(s).parent, dst.node(d).parent) {
        (None, None) => true,
        (Some(ps), Some(pd)) => mapping.has_src(ps) && mapping.dst(ps) == pd,
        _ => false,
    }
}

/// Whether linking `s` to `d` would keep the mapping well-formed: the nodes
/// have the same kind, and so do their parents (or both are roots).
pub fn is_allowed(src: &Tree, dst: &Tree, s: usize, d: usize) -> bool {
    src.node(s).kind == dst.node(d).kind
        && match (src.node(s).parent, dst.node(d).parent) {
            (None, None) => true,
            (Some(ps), Some(pd)) => src.node(ps).kind == dst.node(pd).kind,
            _ => false,
        }
}

/// Score name agreement between two declarations of the same kind.
///
/// Restricted to the few clang declaration kinds whose value starts with a
/// signature; applying it generically would change similarity ranking for
/// unrelated nodes. Returns 1 for a qualified match, 0.5 for an unqualified
/// one, 0 otherwise.
pub fn identifier_score(a: &Node, b: &Node) -> f32 {
    match a.kind.as_str() {
        "CXXMethodDecl" | "CXXConstructorDecl" => prefix_score(
            a,
            b,
            &[(&*QUALIFIED_NAME, 1.0), (&*UNQUALIFIED_NAME, 0.5)],
        ),
        "FunctionDecl" => prefix_score(a, b, &[(&*FUNCTION_NAME, 1.0)]),
        _ => 0.0,
    }
}

fn prefix_score(a: &Node, b: &Node, patterns: &[(&Regex, f32)]) -> f32 {
    let (Some(value_a), Some(value_b)) = (&a.value, &b.value) else {
        return 0.0;
    };
    for &(pattern, score) in patterns {
        let (Some(match_a), Some(match_b)) = (pattern.find(value_a), pattern.find(value_b))
        else {
            continue;
        };
        if match_a.as_str() == match_b.as_str() {
            return score;
        }
    }
    0.0
}
