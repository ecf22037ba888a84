use crate::mapping::Mapping;
use crate::similarity::same_parents;
use crate::tree::{Change, Tree};

/// One step of the edit script that turns the source tree into the
/// destination tree. Node references are post-order ids; `Update`, `Delete`
/// and `Move` name source-side nodes, `Insert` names destination-side ones,
/// and the parents of `Insert` and `Move` live in the destination tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Replace the value of `src` with the value of `dst`
    Update { src: usize, dst: usize },
    /// Insert a copy of `dst` under `parent` at `position`
    Insert {
        dst: usize,
        parent: usize,
        position: usize,
    },
    /// Remove the source node
    Delete { src: usize },
    /// Move `src` under `parent`, after the position its partner occupies
    Move {
        src: usize,
        parent: usize,
        position: usize,
    },
}

/// Label every node of both trees with its change, once matching is frozen.
///
/// Unmatched nodes become deletions and insertions. Matched pairs are then
/// compared in source BFS order: a pair whose parents are not mapped to each
/// other, or whose shift-corrected positions disagree, counts as moved, and
/// its shift counters absorb the displacement so that siblings further right
/// are not dragged along. A value mismatch upgrades the label to an update.
pub fn annotate_changes(src: &mut Tree, dst: &mut Tree, mapping: &Mapping) {
    for t1 in src.postorder() {
        if !mapping.has_src(t1) {
            let node = src.node_mut(t1);
            node.change = Change::Deleted;
            node.shift -= 1;
        }
    }
    for t2 in dst.postorder() {
        if !mapping.has_dst(t2) {
            let node = dst.node_mut(t2);
            node.change = Change::Inserted;
            node.shift += 1;
        }
    }

    let pairs = src
        .bfs(src.root())
        .filter(|&t1| mapping.has_src(t1))
        .collect::<Vec<_>>();
    for t1 in pairs {
        let t2 = mapping.dst(t1);
        let displaced = !same_parents(src, dst, t1, t2, mapping)
            || src.position(t1) as i32 + src.total_shift(t1)
                != dst.position(t2) as i32 - dst.total_shift(t2);
        if displaced {
            src.node_mut(t1).shift -= 1;
            dst.node_mut(t2).shift += 1;
            src.node_mut(t1).change = Change::Moved;
            dst.node_mut(t2).change = Change::Moved;
        }
        if src.node(t1).value != dst.node(t2).value {
            let change = src.node(t1).change.with_update();
            src.node_mut(t1).change = change;
            dst.node_mut(t2).change = change;
        }
    }
}

/// Derive the edit script from the mapping and the change labels.
///
/// Inserted nodes are grafted into the source tree as phantoms and linked to
/// their destination originals, so that later insertions can hang off them;
/// deleted nodes are detached. Requires [`annotate_changes`] to have run.
pub fn generate(src: &mut Tree, dst: &Tree, mapping: &mut Mapping) -> Vec<Action> {
    let mut actions = Vec::new();

    // updates and insertions, parents before children
    let dst_bfs = dst.bfs(dst.root()).collect::<Vec<_>>();
    for t2 in dst_bfs {
        if mapping.has_dst(t2) {
            let t1 = mapping.src(t2);
            if src.node(t1).value != dst.node(t2).value {
                actions.push(Action::Update { src: t1, dst: t2 });
            }
        } else {
            let p2 = dst
                .node(t2)
                .parent
                .expect("an unmatched destination root cannot be inserted");
            assert!(
                mapping.has_dst(p2),
                "parent is not mapped, nowhere to insert"
            );
            let p1 = mapping.src(p2);
            let position = dst.position(t2).min(src.node(p1).children.len());
            actions.push(Action::Insert {
                dst: t2,
                parent: p2,
                position,
            });
            let phantom = dst.node(t2).clone();
            let id = src.graft(phantom, p1, position);
            mapping.link(id, t2);
        }
    }

    // deletions, children before parents
    for t1 in src.postorder() {
        if !mapping.has_src(t1) {
            src.detach(t1);
            actions.push(Action::Delete { src: t1 });
        }
    }

    // moves, in source post-order
    for t1 in src.postorder() {
        if src.node(t1).change.is_move() {
            let t2 = mapping.dst(t1);
            let parent = dst
                .node(t2)
                .parent
                .expect("a moved node cannot be mapped to the destination root");
            actions.push(Action::Move {
                src: t1,
                parent,
                position: dst.position(t2) + 1,
            });
        }
    }
    actions
}
