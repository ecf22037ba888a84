use std::cmp::{Ordering, min};
use std::time::Instant;

use itertools::Itertools;
use log::debug;

use crate::mapping::Mapping;
use crate::similarity::{identifier_score, is_allowed, jaccard, same_parents};
use crate::tree::Tree;

mod priority_list;
mod zhang_shasha;

use priority_list::PriorityList;
use zhang_shasha::ZsMatcher;

/// The GumTree classic matching algorithm: a top-down search for large
/// isomorphic subtrees, followed by a bottom-up pass which matches the
/// surrounding containers by similarity and recovers further pairs with an
/// optimal tree-edit-distance matching on small subtrees.
#[derive(Debug, Clone, Copy)]
pub struct TreeMatcher {
    /// The minimum height of subtrees to match in the top-down phase
    pub min_height: i32,
    /// The minimum similarity to match containers in the bottom-up phase
    pub min_similarity: f32,
    /// The maximum size of subtrees to match with tree edit distance
    pub max_size: usize,
}

impl Default for TreeMatcher {
    fn default() -> Self {
        Self {
            min_height: 2,
            min_similarity: 0.5,
            max_size: 100,
        }
    }
}

impl TreeMatcher {
    /// Match the nodes of two trees. The result is a partial bijection
    /// between post-order ids.
    pub fn match_trees(&self, src: &Tree, dst: &Tree) -> Mapping {
        let start = Instant::now();
        let mut mapping = self.top_down(src, dst);
        debug!("top-down phase yielded {} matches", mapping.len());
        self.bottom_up(src, dst, &mut mapping);
        debug!("matching took {:?}", start.elapsed());
        mapping
    }

    /// First pass: anchor pairs of isomorphic subtrees taller than
    /// `min_height`, processing both trees from the tallest subtrees down.
    pub(crate) fn top_down(&self, src: &Tree, dst: &Tree) -> Mapping {
        let mut candidates = Mapping::new(src.len().max(dst.len()));
        let mut l1 = PriorityList::new();
        let mut l2 = PriorityList::new();
        l1.push(src, src.root());
        l2.push(dst, dst.root());

        loop {
            let max1 = l1.peek_max().unwrap_or(0);
            let max2 = l2.peek_max().unwrap_or(0);
            if min(max1, max2) <= self.min_height {
                break;
            }
            match max1.cmp(&max2) {
                Ordering::Greater => {
                    for id in l1.pop(src) {
                        l1.open(src, id);
                    }
                }
                Ordering::Less => {
                    for id in l2.pop(dst) {
                        l2.open(dst, id);
                    }
                }
                Ordering::Equal => {
                    let h1 = l1.pop(src);
                    let h2 = l2.pop(dst);
                    for &t1 in &h1 {
                        for &t2 in &h2 {
                            // a source may collect several candidates here,
                            // to be resolved below
                            if src.isomorphic_to(t1, dst, t2) {
                                candidates.link(t1, t2);
                            }
                        }
                    }
                    // descend into whatever found no partner at this height
                    for &t1 in &h1 {
                        if !candidates.has_src(t1) {
                            l1.open(src, t1);
                        }
                    }
                    for &t2 in &h2 {
                        if !candidates.has_dst(t2) {
                            l2.open(dst, t2);
                        }
                    }
                }
            }
        }

        self.resolve_anchors(src, dst, &candidates)
    }

    /// Turn the multi-valued candidate relation of the top-down loop into a
    /// partial bijection: unambiguous pairs first, then ambiguous sources go
    /// to their most similar candidate, and finally the descendants of every
    /// accepted pair are mapped in lockstep.
    fn resolve_anchors(&self, src: &Tree, dst: &Tree, candidates: &Mapping) -> Mapping {
        let mut mapping = Mapping::new(src.len().max(dst.len()));
        let mut anchors = Vec::new();

        for t1 in src.postorder() {
            if let &[t2] = candidates.dsts(t1) {
                if !mapping.has_src(t1) && !mapping.has_dst(t2) {
                    mapping.link(t1, t2);
                    anchors.push((t1, t2));
                }
            }
        }

        for t1 in src.postorder() {
            let dsts = candidates.dsts(t1);
            if dsts.len() < 2 {
                continue;
            }
            // strict comparison over candidates in ascending post id:
            // ties break towards the smallest id
            let mut best: Option<(usize, f32)> = None;
            for t2 in dsts.iter().copied().sorted() {
                let sim = self.similarity(src, dst, t1, t2, &mapping);
                if best.is_none_or(|(_, best_sim)| sim > best_sim) {
                    best = Some((t2, sim));
                }
            }
            if let Some((t2, _)) = best {
                if !mapping.has_src(t1) && !mapping.has_dst(t2) {
                    mapping.link(t1, t2);
                    anchors.push((t1, t2));
                }
            }
        }

        // anchors are isomorphic, so their pre-order traversals correspond
        for (t1, t2) in anchors {
            for (a, b) in src.subtree(t1).zip(dst.subtree(t2)) {
                if !mapping.has_src(a) && !mapping.has_dst(b) {
                    mapping.link(a, b);
                }
            }
        }
        mapping
    }

    /// Second pass: traverse the source tree bottom-up and match containers
    /// with at least one matched child to the most similar destination node,
    /// displacing earlier matches when a strictly better one appears.
    fn bottom_up(&self, src: &Tree, dst: &Tree, mapping: &mut Mapping) {
        for t1 in src.postorder() {
            if t1 == src.root() {
                let t2 = dst.root();
                if !mapping.has_src(t1) && !mapping.has_dst(t2) && is_allowed(src, dst, t1, t2)
                {
                    mapping.link(t1, t2);
                    self.add_optimal_mapping(src, dst, t1, t2, mapping);
                }
                break;
            }
            let matched = mapping.has_src(t1);
            let matched_children = src
                .node(t1)
                .children
                .iter()
                .any(|&child| mapping.has_src(child));
            if !matched && matched_children {
                let mut current = Some(t1);
                while let Some(node) = current {
                    current = self.map_to_best_candidate(src, dst, node, mapping, None);
                }
            }
        }

        // fix-up pass: nodes whose parent found a partner can look for
        // their own among that partner's descendants
        for t1 in src.preorder() {
            let mut current = Some(t1);
            while let Some(node) = current {
                let Some(parent) = src.node(node).parent else {
                    break;
                };
                if !mapping.has_src(parent) || mapping.has_src(node) {
                    break;
                }
                let p2 = mapping.dst(parent);
                current = self.map_to_best_candidate(src, dst, node, mapping, Some(p2));
            }
        }
    }

    /// `min_similarity`-weighted local similarity plus the ratio of common
    /// mapped descendants.
    fn similarity(&self, src: &Tree, dst: &Tree, t1: usize, t2: usize, mapping: &Mapping) -> f32 {
        let a = src.node(t1);
        let b = dst.node(t2);
        debug_assert_eq!(a.kind, b.kind, "similarity is only defined within a kind");
        let mut node_sim = identifier_score(a, b);
        if same_parents(src, dst, t1, t2, mapping) {
            node_sim += 0.5;
        }
        if a.value == b.value {
            node_sim += 0.5;
        }
        self.min_similarity * node_sim + jaccard(src, dst, t1, t2, mapping)
    }

    /// The most similar allowed destination for `t1` among `scope` (a
    /// destination subtree, or the whole destination tree), ignoring
    /// destinations whose current partner is at least as similar.
    fn candidate(
        &self,
        src: &Tree,
        dst: &Tree,
        t1: usize,
        mapping: &Mapping,
        scope: Option<usize>,
    ) -> Option<usize> {
        let choices: Box<dyn Iterator<Item = usize> + '_> = match scope {
            None => Box::new(dst.preorder()),
            Some(p2) => Box::new(dst.subtree(p2)),
        };
        let mut best = None;
        let mut max_sim = -1.0_f32;
        for c in choices {
            if !is_allowed(src, dst, t1, c) {
                continue;
            }
            let sim = self.similarity(src, dst, t1, c, mapping);
            if sim >= self.min_similarity && sim > max_sim {
                if mapping.has_dst(c)
                    && sim <= self.similarity(src, dst, mapping.src(c), c, mapping)
                {
                    continue;
                }
                max_sim = sim;
                best = Some(c);
            } else if sim > self.min_similarity * 0.75 && sim < self.min_similarity {
                debug!(
                    "discarding candidate with similarity {sim}, close to threshold {}",
                    self.min_similarity
                );
            }
        }
        best
    }

    /// Map `t1` to its best candidate, unlinking a previous owner of the
    /// candidate when `t1` is strictly more similar. Returns the displaced
    /// source so that the caller can look for a new home for it.
    fn map_to_best_candidate(
        &self,
        src: &Tree,
        dst: &Tree,
        t1: usize,
        mapping: &mut Mapping,
        scope: Option<usize>,
    ) -> Option<usize> {
        let t2 = self.candidate(src, dst, t1, mapping, scope)?;
        let sim = self.similarity(src, dst, t1, t2, mapping);
        if sim < self.min_similarity {
            return None;
        }
        debug_assert!(is_allowed(src, dst, t1, t2));
        assert!(
            !mapping.has_src(t1),
            "bottom-up must only process unmatched nodes"
        );
        let mut displaced = None;
        if mapping.has_dst(t2) {
            let old = mapping.src(t2);
            if sim > self.similarity(src, dst, old, t2, mapping) {
                mapping.unlink(old, t2);
                displaced = Some(old);
            }
        }
        if !mapping.has_dst(t2) {
            mapping.link(t1, t2);
            self.add_optimal_mapping(src, dst, t1, t2, mapping);
        }
        displaced
    }

    /// Recover matches between two paired subtrees with an optimal
    /// tree-edit-distance run, when both are small enough.
    fn add_optimal_mapping(
        &self,
        src: &Tree,
        dst: &Tree,
        t1: usize,
        t2: usize,
        mapping: &mut Mapping,
    ) {
        let size1 = src.subtree_size(t1);
        let size2 = dst.subtree_size(t2);
        if size1.max(size2) >= self.max_size {
            debug!(
                "skipping optimal matching under {}: subtree sizes are {size1}, {size2}",
                src.node(t1).kind
            );
            return;
        }
        let src_start = t1 + 1 - size1;
        let dst_start = t2 + 1 - size2;
        let mut matcher = ZsMatcher::new(src, t1, dst, t2);
        for (a, b) in matcher.matched_pairs() {
            let (a, b) = (src_start + a, dst_start + b);
            if !mapping.has_src(a) && !mapping.has_dst(b) && is_allowed(src, dst, a, b) {
                mapping.link(a, b);
            }
        }
    }
}
