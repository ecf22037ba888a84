use std::collections::VecDeque;
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};

use itertools::Itertools;

use crate::tree_builder::SourceNode;

/// The change label assigned to a node by the annotator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Change {
    /// The node is matched and sits at a consistent position
    #[default]
    None,
    /// The node only exists in the destination tree
    Inserted,
    /// The node only exists in the source tree
    Deleted,
    /// The node is matched but its value changed
    Updated,
    /// The node is matched but was reordered or reparented
    Moved,
    /// The node was both updated and moved
    UpdatedAndMoved,
}

impl Change {
    /// The wire representation, as consumed by the browser viewer.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Inserted => "i",
            Self::Deleted => "d",
            Self::Updated => "u",
            Self::Moved => "m",
            Self::UpdatedAndMoved => "u m",
        }
    }

    pub fn is_move(self) -> bool {
        matches!(self, Self::Moved | Self::UpdatedAndMoved)
    }

    /// Upgrade the label after detecting a value change.
    pub fn with_update(self) -> Self {
        match self {
            Self::Moved | Self::UpdatedAndMoved => Self::UpdatedAndMoved,
            _ => Self::Updated,
        }
    }
}

/// A node of a syntax tree, stored in the arena of its [`Tree`]
/// and referred to by its post-order index.
#[derive(Debug, Clone)]
pub struct Node {
    /// The syntactic category assigned by the parser
    pub kind: String,
    /// The textual value (identifier, literal), if the node carries one
    pub value: Option<String>,
    /// Byte offset of the start of the node in the source file
    pub begin: usize,
    /// Byte offset of the end of the node in the source file
    pub end: usize,
    /// Post-order indices of the children, in source order
    pub children: Vec<usize>,
    /// Post-order index of the parent (`None` for the root)
    pub parent: Option<usize>,
    /// Pre-order index of this node
    pub pre_id: usize,
    /// The largest pre-order index in this node's subtree. Together with
    /// `pre_id` it encodes descendancy as an interval test.
    pub rmd: usize,
    /// Height of the subtree rooted here (1 for a leaf)
    pub height: i32,
    /// A hash of the subtree rooted here, equal for isomorphic subtrees
    pub hash: u64,
    /// Change label, assigned once matching has completed
    pub change: Change,
    /// Position-correction counter used when detecting moves
    pub shift: i32,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A syntax tree produced by an external parser.
///
/// All nodes are owned by the tree and indexed by their post-order number,
/// so that a node id can double as a key in the mapping between two trees.
/// The structure is frozen during matching; only the `change` and `shift`
/// attributes are written afterwards, and the edit-script generator may
/// graft phantom nodes past the original arena length.
#[derive(Debug)]
pub struct Tree {
    /// The name of the file this tree was parsed from
    pub filename: String,
    nodes: Vec<Node>,
    /// `preorder[pre_id]` is the post-order id of the node visited at that
    /// point of a depth-first traversal. Phantom nodes are not listed.
    preorder: Vec<usize>,
    root: usize,
}

impl Tree {
    /// Build a tree from the parser output, assigning all derived
    /// attributes (`post_id` as arena index, `pre_id`, `rmd`, `height`,
    /// `parent` and the isomorphism hash).
    pub fn new(filename: String, source: &SourceNode) -> Self {
        let mut nodes = Vec::new();
        let root = Self::build(source, &mut nodes);

        let mut preorder = Vec::with_capacity(nodes.len());
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            nodes[id].pre_id = preorder.len();
            preorder.push(id);
            stack.extend(nodes[id].children.iter().rev());
        }

        // children come before their parent in post order
        for id in 0..nodes.len() {
            nodes[id].rmd = match nodes[id].children.last() {
                Some(&last) => nodes[last].rmd,
                None => nodes[id].pre_id,
            };
        }

        Self {
            filename,
            nodes,
            preorder,
            root,
        }
    }

    fn build(source: &SourceNode, nodes: &mut Vec<Node>) -> usize {
        let children = source
            .children
            .iter()
            .map(|child| Self::build(child, nodes))
            .collect_vec();
        let height = 1 + children
            .iter()
            .map(|&child| nodes[child].height)
            .max()
            .unwrap_or(0);

        // a hash value that is invariant under isomorphism
        let mut hasher = crate::fxhasher();
        source.kind.hash(&mut hasher);
        source.value.hash(&mut hasher);
        children
            .iter()
            .map(|&child| nodes[child].hash)
            .collect_vec()
            .hash(&mut hasher);

        let id = nodes.len();
        for &child in &children {
            nodes[child].parent = Some(id);
        }
        nodes.push(Node {
            kind: source.kind.clone(),
            value: source.value.clone(),
            begin: source.begin,
            end: source.end,
            children,
            parent: None,
            pre_id: 0,
            rmd: 0,
            height,
            hash: hasher.finish(),
            change: Change::None,
            shift: 0,
        });
        id
    }

    /// The number of nodes, including any grafted phantoms
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The post-order id of the root
    pub fn root(&self) -> usize {
        self.root
    }

    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: usize) -> &mut Node {
        &mut self.nodes[id]
    }

    /// All original node ids in pre-order (phantoms excluded)
    pub fn preorder(&self) -> impl Iterator<Item = usize> + '_ {
        self.preorder.iter().copied()
    }

    /// All node ids in post-order. Grafted phantoms come last, in the
    /// order they were added.
    pub fn postorder(&self) -> impl Iterator<Item = usize> + use<> {
        0..self.nodes.len()
    }

    /// The ids of the subtree rooted at `id`, in pre-order, including `id`
    pub fn subtree(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        let node = self.node(id);
        self.preorder[node.pre_id..=node.rmd].iter().copied()
    }

    /// The number of nodes in the subtree rooted at `id`, including `id`
    pub fn subtree_size(&self, id: usize) -> usize {
        let node = self.node(id);
        node.rmd - node.pre_id + 1
    }

    /// Breadth-first traversal of the subtree rooted at `id`
    pub fn bfs(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        BfsIterator {
            tree: self,
            fringe: VecDeque::from([id]),
        }
    }

    /// Whether `id` lies in the subtree rooted at `ancestor` (including
    /// `ancestor` itself), decided by pre-order interval containment
    pub fn is_in_subtree(&self, id: usize, ancestor: usize) -> bool {
        let node = self.node(id);
        let root = self.node(ancestor);
        node.pre_id >= root.pre_id && node.pre_id <= root.rmd
    }

    /// The position of a node in its parent's child list (0 for the root)
    pub fn position(&self, id: usize) -> usize {
        match self.node(id).parent {
            None => 0,
            Some(parent) => self
                .node(parent)
                .children
                .iter()
                .position(|&child| child == id)
                .expect("node is missing from its parent's child list"),
        }
    }

    /// The sum of the `shift` counters of the preceding siblings of `id`,
    /// and of `id` itself (0 for the root)
    pub fn total_shift(&self, id: usize) -> i32 {
        let Some(parent) = self.node(id).parent else {
            return 0;
        };
        let mut total = 0;
        for &sibling in &self.node(parent).children {
            total += self.node(sibling).shift;
            if sibling == id {
                break;
            }
        }
        total
    }

    /// Whether the subtree at `id` is isomorphic to the subtree at `other_id`
    /// in `other`: same kinds, values and arities throughout. The
    /// precomputed hashes serve as a fast negative; equality of hashes alone
    /// is not trusted.
    pub fn isomorphic_to(&self, id: usize, other: &Self, other_id: usize) -> bool {
        self.node(id).hash == other.node(other_id).hash
            && self.subtree_size(id) == other.subtree_size(other_id)
            && self
                .subtree(id)
                .zip(other.subtree(other_id))
                .all(|(a, b)| {
                    let na = self.node(a);
                    let nb = other.node(b);
                    na.kind == nb.kind
                        && na.value == nb.value
                        && na.children.len() == nb.children.len()
                })
    }

    /// Remove `id` from its parent's child list. The node stays in the
    /// arena so that its id remains valid.
    pub fn detach(&mut self, id: usize) {
        if let Some(parent) = self.node(id).parent {
            let position = self.position(id);
            self.node_mut(parent).children.remove(position);
        }
    }

    /// Add a phantom node to the arena, as the child of `parent` at
    /// `position`. Returns the fresh post-order id.
    pub fn graft(&mut self, mut node: Node, parent: usize, position: usize) -> usize {
        let id = self.nodes.len();
        node.parent = Some(parent);
        node.children = Vec::new();
        self.nodes.push(node);
        self.node_mut(parent).children.insert(position, id);
        id
    }

    fn depth(&self, id: usize) -> usize {
        let mut depth = 0;
        let mut cursor = id;
        while let Some(parent) = self.node(cursor).parent {
            depth += 1;
            cursor = parent;
        }
        depth
    }

    /// Render the tree as indented lines, one node per line, for debug
    /// logging: `pre_id kind: value [change]`
    pub fn ascii_tree(&self) -> String {
        let mut output = String::new();
        for id in self.preorder() {
            let node = self.node(id);
            writeln!(
                output,
                "{}{:02} {}:{} [{}]",
                " ".repeat(self.depth(id)),
                node.pre_id,
                node.kind,
                node.value.as_deref().unwrap_or(""),
                node.change.as_str(),
            )
            .expect("writing to a string cannot fail");
        }
        output
    }
}

struct BfsIterator<'tree> {
    tree: &'tree Tree,
    fringe: VecDeque<usize>,
}

impl Iterator for BfsIterator<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.fringe.pop_front()?;
        self.fringe.extend(&self.tree.node(id).children);
        Some(id)
    }
}
