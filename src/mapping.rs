use rustc_hash::FxHashMap;

/// A bidirectional relation between the post-order ids of two trees.
///
/// The top-down phase may temporarily record several destination candidates
/// for a single source (and vice versa); its resolution step and everything
/// after it keep the relation a partial bijection, so the singular accessors
/// [`dst`](Self::dst) and [`src`](Self::src) become safe to use.
#[derive(Debug, Default)]
pub struct Mapping {
    src_to_dst: FxHashMap<usize, Vec<usize>>,
    dst_to_src: FxHashMap<usize, Vec<usize>>,
    /// The size of the larger of the two trees being matched
    pub maxsize: usize,
}

impl Mapping {
    pub fn new(maxsize: usize) -> Self {
        Self {
            maxsize,
            ..Self::default()
        }
    }

    /// Record an edge. Appends to any existing candidates rather than
    /// overwriting them.
    pub fn link(&mut self, src: usize, dst: usize) {
        self.src_to_dst.entry(src).or_default().push(dst);
        self.dst_to_src.entry(dst).or_default().push(src);
    }

    /// Remove one edge.
    pub fn unlink(&mut self, src: usize, dst: usize) {
        if let Some(dsts) = self.src_to_dst.get_mut(&src) {
            dsts.retain(|&d| d != dst);
            if dsts.is_empty() {
                self.src_to_dst.remove(&src);
            }
        }
        if let Some(srcs) = self.dst_to_src.get_mut(&dst) {
            srcs.retain(|&s| s != src);
            if srcs.is_empty() {
                self.dst_to_src.remove(&dst);
            }
        }
    }

    /// All destinations currently linked to `src`, in insertion order
    pub fn dsts(&self, src: usize) -> &[usize] {
        self.src_to_dst.get(&src).map_or(&[], Vec::as_slice)
    }

    /// All sources currently linked to `dst`, in insertion order
    pub fn srcs(&self, dst: usize) -> &[usize] {
        self.dst_to_src.get(&dst).map_or(&[], Vec::as_slice)
    }

    /// The unique destination of `src`. Only meaningful once the relation
    /// is a partial bijection.
    pub fn dst(&self, src: usize) -> usize {
        *self
            .dsts(src)
            .first()
            .expect("source node has no destination partner")
    }

    /// The unique source of `dst`. Only meaningful once the relation is a
    /// partial bijection.
    pub fn src(&self, dst: usize) -> usize {
        *self
            .srcs(dst)
            .first()
            .expect("destination node has no source partner")
    }

    pub fn has_src(&self, src: usize) -> bool {
        !self.dsts(src).is_empty()
    }

    pub fn has_dst(&self, dst: usize) -> bool {
        !self.srcs(dst).is_empty()
    }

    /// The number of linked source nodes
    pub fn len(&self) -> usize {
        self.src_to_dst.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src_to_dst.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_and_retrieve() {
        let mut mapping = Mapping::new(10);

        assert!(!mapping.has_src(3));
        assert!(mapping.is_empty());

        mapping.link(3, 7);
        assert!(mapping.has_src(3));
        assert!(mapping.has_dst(7));
        assert_eq!(mapping.dst(3), 7);
        assert_eq!(mapping.src(7), 3);
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn multiple_candidates_are_kept_in_order() {
        let mut mapping = Mapping::new(10);

        mapping.link(3, 7);
        mapping.link(3, 5);
        mapping.link(2, 5);

        assert_eq!(mapping.dsts(3), &[7, 5]);
        assert_eq!(mapping.srcs(5), &[3, 2]);
        // the singular accessor reports the first candidate
        assert_eq!(mapping.dst(3), 7);
    }

    #[test]
    fn unlink_removes_a_single_edge() {
        let mut mapping = Mapping::new(10);

        mapping.link(3, 7);
        mapping.link(3, 5);
        mapping.unlink(3, 7);

        assert_eq!(mapping.dsts(3), &[5]);
        assert!(!mapping.has_dst(7));

        mapping.unlink(3, 5);
        assert!(!mapping.has_src(3));
        assert!(mapping.is_empty());
    }
}
