use std::fmt::Write as _;

use serde_json::{Map, Value, json};

use crate::edit_script::{self, Action};
use crate::mapping::Mapping;
use crate::tree::{Change, Tree};

/// Render a node as `kind: value(pre_id)`, without the value part when the
/// node does not carry one.
fn render(tree: &Tree, id: usize) -> String {
    let node = tree.node(id);
    match &node.value {
        Some(value) => format!("{}: {value}({})", node.kind, node.pre_id),
        None => format!("{}({})", node.kind, node.pre_id),
    }
}

/// The GumTree text format: one `Match` line per mapped pair in source
/// pre-order, followed by the edit script.
///
/// The `Match` lines are rendered before the edit script is derived, as the
/// derivation links phantom nodes into the mapping.
pub fn text_diff(src: &mut Tree, dst: &Tree, mapping: &mut Mapping) -> String {
    let mut output = String::new();
    for t1 in src.preorder() {
        if mapping.has_src(t1) {
            let line = format!(
                "Match {} to {}",
                render(src, t1),
                render(dst, mapping.dst(t1))
            );
            output.push_str(&line);
            output.push('\n');
        }
    }
    for action in edit_script::generate(src, dst, mapping) {
        match action {
            Action::Update { src: t1, dst: t2 } => writeln!(
                output,
                "Update {} to {}",
                render(src, t1),
                dst.node(t2).value.as_deref().unwrap_or_default()
            ),
            Action::Insert {
                dst: t2,
                parent,
                position,
            } => writeln!(
                output,
                "Insert {} into {} at {position}",
                render(dst, t2),
                render(dst, parent)
            ),
            Action::Delete { src: t1 } => writeln!(output, "Delete {}", render(src, t1)),
            Action::Move {
                src: t1,
                parent,
                position,
            } => writeln!(
                output,
                "Move {} into {} at {position}",
                render(src, t1),
                render(dst, parent)
            ),
        }
        .expect("writing to a string cannot fail");
    }
    output
}

fn diff_node(this: &Tree, other: &Tree, mapping: &Mapping, is_src: bool, id: usize) -> Value {
    let node = this.node(id);
    let mut object = Map::new();
    object.insert("id".to_owned(), json!(node.pre_id));
    object.insert("type".to_owned(), json!(node.kind));
    object.insert("begin".to_owned(), json!(node.begin));
    object.insert("end".to_owned(), json!(node.end));
    if node.change != Change::None {
        object.insert("change".to_owned(), json!(node.change.as_str()));
    }
    if let Some(value) = &node.value {
        object.insert("value".to_owned(), json!(value));
    }
    let partner = if is_src {
        mapping.has_src(id).then(|| mapping.dst(id))
    } else {
        mapping.has_dst(id).then(|| mapping.src(id))
    };
    if let Some(partner) = partner {
        object.insert("tid".to_owned(), json!(other.node(partner).pre_id));
    }
    let children = node
        .children
        .iter()
        .map(|&child| diff_node(this, other, mapping, is_src, child))
        .collect();
    object.insert("children".to_owned(), Value::Array(children));
    Value::Object(object)
}

/// The dual-tree JSON diff consumed by the browser viewer: both annotated
/// trees, with `tid` cross-references between matched nodes (given as the
/// partner's pre-order id).
pub fn json_diff(src: &Tree, dst: &Tree, mapping: &Mapping) -> String {
    json!({
        "src": {
            "filename": src.filename,
            "root": diff_node(src, dst, mapping, true, src.root()),
        },
        "dst": {
            "filename": dst.filename,
            "root": diff_node(dst, src, mapping, false, dst.root()),
        },
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::edit_script::annotate_changes;
    use crate::test_utils::{diff_text, leaf, node, tree, valued_leaf};
    use crate::tree_matcher::TreeMatcher;

    use super::*;

    #[test]
    fn identical_trees_print_matches_only() {
        let mut src = tree(node("X", vec![leaf("A"), leaf("B")]));
        let mut dst = tree(node("X", vec![leaf("A"), leaf("B")]));

        assert_eq!(
            diff_text(&mut src, &mut dst),
            "Match X(0) to X(0)\n\
             Match A(1) to A(1)\n\
             Match B(2) to B(2)\n"
        );
    }

    #[test]
    fn update_line_carries_the_new_value() {
        let mut src = tree(node("X", vec![valued_leaf("A", "x")]));
        let mut dst = tree(node("X", vec![valued_leaf("A", "y")]));

        assert_eq!(
            diff_text(&mut src, &mut dst),
            "Match X(0) to X(0)\n\
             Match A: x(1) to A: y(1)\n\
             Update A: x(1) to y\n"
        );
    }

    #[test]
    fn insert_line_names_the_destination_parent() {
        let mut src = tree(node("X", vec![leaf("A"), leaf("B")]));
        let mut dst = tree(node("X", vec![leaf("A"), leaf("B"), leaf("C")]));

        assert_eq!(
            diff_text(&mut src, &mut dst),
            "Match X(0) to X(0)\n\
             Match A(1) to A(1)\n\
             Match B(2) to B(2)\n\
             Insert C(3) into X(0) at 2\n"
        );
    }

    #[test]
    fn delete_line_names_the_source_node() {
        let mut src = tree(node("X", vec![leaf("A"), leaf("B")]));
        let mut dst = tree(node("X", vec![leaf("A")]));

        assert_eq!(
            diff_text(&mut src, &mut dst),
            "Match X(0) to X(0)\n\
             Match A(1) to A(1)\n\
             Delete B(2)\n"
        );
    }

    #[test]
    fn json_diff_lists_both_annotated_trees() {
        let mut src = tree(node("X", vec![valued_leaf("A", "x")]));
        let mut dst = tree(node("X", vec![valued_leaf("A", "y")]));

        let matcher = TreeMatcher::default();
        let mapping = matcher.match_trees(&src, &dst);
        annotate_changes(&mut src, &mut dst, &mapping);

        assert_eq!(
            json_diff(&src, &dst, &mapping),
            r#"{"src":{"filename":"","root":{"id":0,"type":"X","begin":0,"end":0,"tid":0,"children":[{"id":1,"type":"A","begin":0,"end":0,"change":"u","value":"x","tid":1,"children":[]}]}},"dst":{"filename":"","root":{"id":0,"type":"X","begin":0,"end":0,"tid":0,"children":[{"id":1,"type":"A","begin":0,"end":0,"change":"u","value":"y","tid":1,"children":[]}]}}}"#
        );
    }

    #[test]
    fn unmatched_nodes_have_no_tid() {
        let mut src = tree(leaf("X"));
        let mut dst = tree(node("X", vec![leaf("A")]));

        let matcher = TreeMatcher::default();
        let mapping = matcher.match_trees(&src, &dst);
        annotate_changes(&mut src, &mut dst, &mapping);

        let rendered = json_diff(&src, &dst, &mapping);
        assert_eq!(
            rendered,
            r#"{"src":{"filename":"","root":{"id":0,"type":"X","begin":0,"end":0,"tid":0,"children":[]}},"dst":{"filename":"","root":{"id":0,"type":"X","begin":0,"end":0,"tid":0,"children":[{"id":1,"type":"A","begin":0,"end":0,"change":"i","children":[]}]}}}"#
        );
    }

    #[test]
    fn output_is_deterministic() {
        let build_src = || {
            tree(node(
                "X",
                vec![
                    node("F", vec![valued_leaf("a", "1"), leaf("b")]),
                    valued_leaf("c", "3"),
                ],
            ))
        };
        let build_dst = || {
            tree(node(
                "X",
                vec![
                    valued_leaf("c", "4"),
                    node("F", vec![valued_leaf("a", "1"), leaf("b"), leaf("e")]),
                ],
            ))
        };

        let run = || {
            let mut src = build_src();
            let mut dst = build_dst();
            let matcher = TreeMatcher::default();
            let mut mapping = matcher.match_trees(&src, &dst);
            annotate_changes(&mut src, &mut dst, &mapping);
            let json = json_diff(&src, &dst, &mapping);
            let text = text_diff(&mut src, &dst, &mut mapping);
            (text, json)
        };

        assert_eq!(run(), run());
    }
}
