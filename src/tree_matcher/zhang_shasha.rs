use crate::tree::{Node, Tree};

// Update cost for nodes of differing kinds. Large enough to never win a
// minimum, small enough to never overflow when a unit cost is added.
const FORBIDDEN: u64 = u64::MAX / 2;

/// A view of a subtree in its local post-order numbering, with the
/// leftmost-descendant table and key-roots of the Zhang–Shasha algorithm.
///
/// Local index `i` corresponds to the node with post-order id `start + i`:
/// the post-order ids of a subtree form a contiguous interval ending at the
/// subtree root.
struct ZsTree<'a> {
    tree: &'a Tree,
    start: usize,
    node_count: usize,
    /// `lmds[i]` is the local post-order index of the leftmost leaf
    /// under the node with local index `i`
    lmds: Vec<usize>,
    /// Local indices (1-based, as used by the distance matrices) of the
    /// nodes whose leftmost descendant is not shared with any
    /// higher-indexed node
    keyroots: Vec<usize>,
}

impl<'a> ZsTree<'a> {
    fn new(tree: &'a Tree, root: usize) -> Self {
        let node_count = tree.subtree_size(root);
        let start = root + 1 - node_count;

        let mut lmds = vec![0; node_count];
        let mut leaf_count = 0;
        for i in 0..node_count {
            let id = start + i;
            lmds[i] = Self::first_leaf(tree, id) - start;
            if tree.node(id).is_leaf() {
                leaf_count += 1;
            }
        }

        // one key-root per leaf, found by scanning from the right and
        // keeping the first node to visit each leftmost descendant
        let mut keyroots = vec![0; leaf_count];
        let mut visited = vec![false; node_count + 1];
        let mut next = leaf_count;
        for i in (1..=node_count).rev() {
            if !visited[lmds[i - 1]] {
                next -= 1;
                keyroots[next] = i;
                visited[lmds[i - 1]] = true;
            }
        }

        Self {
            tree,
            start,
            node_count,
            lmds,
            keyroots,
        }
    }

    fn first_leaf(tree: &Tree, id: usize) -> usize {
        let mut current = id;
        while let Some(&first) = tree.node(current).children.first() {
            current = first;
        }
        current
    }

    fn node(&self, local: usize) -> &Node {
        self.tree.node(self.start + local)
    }
}

/// Classical tree-edit-distance matcher between two subtrees, with unit
/// insertion and deletion costs. Produces the node pairs that an optimal
/// edit script keeps (the "update" pairs), in local post-order indices.
///
/// The caller is responsible for only invoking this on small subtrees:
/// the distance matrices take `(|S1|+1) × (|S2|+1)` cells.
pub struct ZsMatcher<'a> {
    src: ZsTree<'a>,
    dst: ZsTree<'a>,
    tree_dist: Vec<Vec<u64>>,
    forest_dist: Vec<Vec<u64>>,
}

impl<'a> ZsMatcher<'a> {
    pub fn new(src: &'a Tree, src_root: usize, dst: &'a Tree, dst_root: usize) -> Self {
        let src = ZsTree::new(src, src_root);
        let dst = ZsTree::new(dst, dst_root);
        let tree_dist = vec![vec![0; dst.node_count + 1]; src.node_count + 1];
        let forest_dist = vec![vec![0; dst.node_count + 1]; src.node_count + 1];
        Self {
            src,
            dst,
            tree_dist,
            forest_dist,
        }
    }

    fn update_cost(&self, i: usize, j: usize) -> u64 {
        let a = self.src.node(i);
        let b = self.dst.node(j);
        if a.kind != b.kind {
            FORBIDDEN
        } else if a.value == b.value {
            0
        } else {
            1
        }
    }

    fn compute_tree_dist(&mut self) {
        for ki in 0..self.src.keyroots.len() {
            for kj in 0..self.dst.keyroots.len() {
                let i = self.src.keyroots[ki];
                let j = self.dst.keyroots[kj];
                self.compute_forest_dist(i, j);
            }
        }
    }

    /// The classical recurrence over the forests rooted at the key-roots
    /// `i` and `j` (both 1-based).
    fn compute_forest_dist(&mut self, i: usize, j: usize) {
        assert!(i > 0 && j > 0, "forest distances are 1-indexed");
        let lmd_i = self.src.lmds[i - 1];
        let lmd_j = self.dst.lmds[j - 1];
        self.forest_dist[lmd_i][lmd_j] = 0;
        for di in (lmd_i + 1)..=i {
            self.forest_dist[di][lmd_j] = self.forest_dist[di - 1][lmd_j] + 1;
        }
        for dj in (lmd_j + 1)..=j {
            self.forest_dist[lmd_i][dj] = self.forest_dist[lmd_i][dj - 1] + 1;
        }
        for di in (lmd_i + 1)..=i {
            for dj in (lmd_j + 1)..=j {
                let lmd_di = self.src.lmds[di - 1];
                let lmd_dj = self.dst.lmds[dj - 1];
                let delete = self.forest_dist[di - 1][dj] + 1;
                let insert = self.forest_dist[di][dj - 1] + 1;
                if lmd_di == lmd_i && lmd_dj == lmd_j {
                    // both prefixes are whole trees: the update move applies
                    let update = self.update_cost(di - 1, dj - 1);
                    let dist = delete
                        .min(insert)
                        .min(self.forest_dist[di - 1][dj - 1].saturating_add(update));
                    self.forest_dist[di][dj] = dist;
                    self.tree_dist[di][dj] = dist;
                } else {
                    // jump back to the forests preceding both subtrees
                    self.forest_dist[di][dj] = delete
                        .min(insert)
                        .min(self.forest_dist[lmd_di][lmd_dj] + self.tree_dist[di][dj]);
                }
            }
        }
    }

    /// Compute the distance matrices and walk them back from the root pair,
    /// collecting every pair the optimal script matched. Pairs of differing
    /// kinds are not emitted.
    pub fn matched_pairs(&mut self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        if self.src.node_count == 0 || self.dst.node_count == 0 {
            return pairs;
        }
        self.compute_tree_dist();

        let mut root_pair = true;
        let mut tree_pairs = vec![(self.src.node_count, self.dst.node_count)];

        while let Some((last_row, last_col)) = tree_pairs.pop() {
            if !root_pair {
                self.compute_forest_dist(last_row, last_col);
            }
            root_pair = false;

            let first_row = self.src.lmds[last_row - 1];
            let first_col = self.dst.lmds[last_col - 1];
            let mut row = last_row;
            let mut col = last_col;

            while row > first_row || col > first_col {
                if row > first_row
                    && self.forest_dist[row - 1][col] + 1 == self.forest_dist[row][col]
                {
                    row -= 1;
                } else if col > first_col
                    && self.forest_dist[row][col - 1] + 1 == self.forest_dist[row][col]
                {
                    col -= 1;
                } else {
                    let lmd_row = self.src.lmds[row - 1];
                    let lmd_col = self.dst.lmds[col - 1];
                    if lmd_row == self.src.lmds[last_row - 1]
                        && lmd_col == self.dst.lmds[last_col - 1]
                    {
                        if self.src.node(row - 1).kind == self.dst.node(col - 1).kind {
                            pairs.push((row - 1, col - 1));
                        }
                        row -= 1;
                        col -= 1;
                    } else {
                        tree_pairs.push((row, col));
                        row = lmd_row;
                        col = lmd_col;
                    }
                }
            }
        }
        pairs
    }
}
