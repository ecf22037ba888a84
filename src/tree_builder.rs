use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::tree::Tree;

/// Failure to obtain a syntax tree from a parser-produced JSON file.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The JSON does not follow the documented tree shape (missing `root`,
    /// non-integer offsets, `children` not a list, ...). The underlying
    /// error pinpoints the offending line and column.
    #[error("{}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The document produced by the external parser:
/// a filename and a rooted tree.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceFile {
    #[serde(default)]
    pub filename: String,
    pub root: SourceNode,
}

/// A node of the parser output. Only `type` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub begin: usize,
    #[serde(default)]
    pub end: usize,
    #[serde(default)]
    pub children: Vec<SourceNode>,
}

impl SourceFile {
    /// Build the in-memory tree, assigning all derived node attributes.
    pub fn into_tree(self) -> Tree {
        Tree::new(self.filename, &self.root)
    }
}

/// Read and validate a parser-produced JSON file.
pub fn read_tree(path: &Path) -> Result<Tree, InputError> {
    let contents = fs::read_to_string(path).map_err(|source| InputError::Unreadable {
        path: path.to_owned(),
        source,
    })?;
    let file: SourceFile =
        serde_json::from_str(&contents).map_err(|source| InputError::Malformed {
            path: path.to_owned(),
            source,
        })?;
    Ok(file.into_tree())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_document() {
        let file: SourceFile =
            serde_json::from_str(r#"{"root": {"type": "Unit"}}"#).expect("valid document");

        assert_eq!(file.filename, "");
        assert_eq!(file.root.kind, "Unit");
        assert_eq!(file.root.value, None);
        assert_eq!(file.root.begin, 0);
        assert_eq!(file.root.end, 0);
        assert!(file.root.children.is_empty());
    }

    #[test]
    fn full_document() {
        let file: SourceFile = serde_json::from_str(
            r#"{"filename": "a.cpp",
                "root": {"type": "TranslationUnitDecl", "begin": 0, "end": 10,
                         "children": [{"type": "VarDecl", "value": "x",
                                       "begin": 2, "end": 7, "children": []}]}}"#,
        )
        .expect("valid document");

        let tree = file.into_tree();
        assert_eq!(tree.filename, "a.cpp");
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.node(0).kind, "VarDecl");
        assert_eq!(tree.node(0).value.as_deref(), Some("x"));
        assert_eq!(tree.node(tree.root()).kind, "TranslationUnitDecl");
    }

    #[test]
    fn missing_root_is_rejected() {
        let result = serde_json::from_str::<SourceFile>(r#"{"filename": "a.cpp"}"#);

        let error = result.expect_err("document without a root");
        assert!(error.to_string().contains("root"));
    }

    #[test]
    fn non_integer_offset_is_rejected() {
        let result =
            serde_json::from_str::<SourceFile>(r#"{"root": {"type": "X", "begin": "zero"}}"#);

        assert!(result.is_err());
    }

    #[test]
    fn non_list_children_are_rejected() {
        let result =
            serde_json::from_str::<SourceFile>(r#"{"root": {"type": "X", "children": 3}}"#);

        assert!(result.is_err());
    }
}
