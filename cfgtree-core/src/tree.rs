use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// A single configuration line placed in the command tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigNode {
    /// Sequence id, unique and increasing in source order.
    pub id: usize,
    /// 1-based line number in the source file.
    pub line: usize,
    /// Sequence id of the enclosing node, `None` for roots.
    pub parent_id: Option<usize>,
    /// Leading whitespace width (indentation dialects) or block depth.
    pub indentation: usize,
    /// Raw line text without the trailing newline.
    pub text: String,
    /// Whitespace-separated words after hazard stripping.
    pub tokens: Vec<String>,
    /// Child nodes in source order.
    pub children: Vec<ConfigNode>,
}

impl ConfigNode {
    /// Create a detached node with no children.
    pub fn new(
        id: usize,
        line: usize,
        indentation: usize,
        text: impl Into<String>,
        tokens: Vec<String>,
    ) -> Self {
        Self {
            id,
            line,
            parent_id: None,
            indentation,
            text: text.into(),
            tokens,
            children: Vec::new(),
        }
    }

    /// Return the word at `pos`, or an empty string when the line is shorter.
    pub fn word(&self, pos: usize) -> &str {
        self.tokens.get(pos).map(String::as_str).unwrap_or("")
    }

    /// Return the first word of the line.
    pub fn first_word(&self) -> &str {
        self.word(0)
    }

    /// Return every word from `pos` onward.
    pub fn words_from(&self, pos: usize) -> &[String] {
        self.tokens.get(pos..).unwrap_or(&[])
    }

    /// Return the position of the first word equal to `word`.
    pub fn position_of(&self, word: &str) -> Option<usize> {
        self.tokens.iter().position(|token| token == word)
    }

    /// Return the line text after the first `skip` words, trimmed.
    pub fn rest_after(&self, skip: usize) -> String {
        self.words_from(skip).join(" ")
    }

    /// Return the first child whose first word matches.
    pub fn get_child(&self, first_word: &str) -> Option<&ConfigNode> {
        self.children
            .iter()
            .find(|child| child.first_word() == first_word)
    }

    /// Return all children whose first word matches.
    pub fn get_children(&self, first_word: &str) -> Vec<&ConfigNode> {
        self.children
            .iter()
            .filter(|child| child.first_word() == first_word)
            .collect()
    }

    /// Pre-order traversal: this node first, then each subtree in order.
    pub fn flatten(&self) -> Vec<&ConfigNode> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.flatten());
        }
        out
    }

    /// Number of levels in this subtree, counting this node.
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(ConfigNode::depth)
            .max()
            .unwrap_or(0)
    }
}

impl Display for ConfigNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_indented(f, self, 0)
    }
}

fn write_indented(f: &mut Formatter<'_>, node: &ConfigNode, level: usize) -> fmt::Result {
    writeln!(f, "{}{}", "  ".repeat(level), node.tokens.join(" "))?;
    for child in &node.children {
        write_indented(f, child, level + 1)?;
    }
    Ok(())
}

/// Pre-order traversal over a forest of roots.
pub fn flatten_all(roots: &[ConfigNode]) -> Vec<&ConfigNode> {
    roots.iter().flat_map(ConfigNode::flatten).collect()
}

/// Assemble a flat, source-ordered node list into a forest using `parent_id`.
///
/// Nodes whose parent id does not name an earlier node are promoted to roots.
pub fn assemble(flat: Vec<ConfigNode>) -> Vec<ConfigNode> {
    let known: HashSet<usize> = flat.iter().map(|node| node.id).collect();
    let mut by_parent: HashMap<Option<usize>, Vec<ConfigNode>> = HashMap::new();

    for mut node in flat {
        if let Some(parent) = node.parent_id {
            if !known.contains(&parent) {
                node.parent_id = None;
            }
        }
        by_parent.entry(node.parent_id).or_default().push(node);
    }

    let mut roots = by_parent.remove(&None).unwrap_or_default();
    for root in &mut roots {
        attach_children(root, &mut by_parent);
    }
    roots
}

fn attach_children(node: &mut ConfigNode, by_parent: &mut HashMap<Option<usize>, Vec<ConfigNode>>) {
    if let Some(mut children) = by_parent.remove(&Some(node.id)) {
        for child in &mut children {
            attach_children(child, by_parent);
        }
        node.children = children;
    }
}
