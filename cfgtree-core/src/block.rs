//! Block-stack tree builder.
//!
//! Opener keywords push a frame; closer keywords pop frames until the frame
//! opened by their matching keyword has been popped, attaching each completed
//! frame to whichever frame remains on top (or to the root list). Closer lines
//! produce no node.

use serde::Serialize;

use crate::sanitize::{indentation, split_quoted};
use crate::tree::ConfigNode;

/// An opener keyword and the closer keyword that ends its block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPair {
    pub opener: String,
    pub closer: String,
}

impl BlockPair {
    pub fn new(opener: impl Into<String>, closer: impl Into<String>) -> Self {
        Self {
            opener: opener.into(),
            closer: closer.into(),
        }
    }
}

/// Keyword grammar for a block dialect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockGrammar {
    pub pairs: Vec<BlockPair>,
    /// Lines whose trimmed text starts with any of these are skipped.
    pub skip_prefixes: Vec<String>,
}

impl BlockGrammar {
    fn opens(&self, keyword: &str) -> bool {
        self.pairs.iter().any(|pair| pair.opener == keyword)
    }

    fn closed_opener(&self, keyword: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|pair| pair.closer == keyword)
            .map(|pair| pair.opener.as_str())
    }

    fn skips(&self, trimmed: &str) -> bool {
        self.skip_prefixes
            .iter()
            .any(|prefix| trimmed.starts_with(prefix.as_str()))
    }
}

/// Structural problem found while building a block tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockWarning {
    /// A closer with no matching open frame; the line was ignored.
    UnmatchedClose { line: usize, keyword: String },
    /// A frame still open at end of input; it was closed implicitly.
    Unclosed { line: usize, text: String },
}

/// Result of building a block-nested configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockTree {
    pub roots: Vec<ConfigNode>,
    pub warnings: Vec<BlockWarning>,
}

struct Frame {
    opener: String,
    node: ConfigNode,
}

/// Build the command forest for a block-nested configuration.
pub fn build_tree<S: AsRef<str>>(lines: &[S], grammar: &BlockGrammar) -> BlockTree {
    let mut tree = BlockTree::default();
    let mut stack: Vec<Frame> = Vec::new();
    let mut next_id = 1;

    for (index, raw) in lines.iter().enumerate() {
        let raw = raw.as_ref();
        let trimmed = raw.trim();
        if trimmed.is_empty() || grammar.skips(trimmed) {
            continue;
        }

        let tokens = split_quoted(trimmed);
        let keyword = tokens.first().map(String::as_str).unwrap_or("");

        if let Some(opener) = grammar.closed_opener(keyword) {
            if !stack.iter().any(|frame| frame.opener == opener) {
                tree.warnings.push(BlockWarning::UnmatchedClose {
                    line: index + 1,
                    keyword: keyword.to_string(),
                });
                continue;
            }
            while let Some(frame) = stack.pop() {
                let done = frame.opener == opener;
                attach(&mut stack, &mut tree.roots, frame.node);
                if done {
                    break;
                }
            }
            continue;
        }

        let opens = grammar.opens(keyword);
        let keyword = keyword.to_string();
        let mut node = ConfigNode::new(next_id, index + 1, indentation(raw), raw.trim_end(), tokens);
        node.parent_id = stack.last().map(|frame| frame.node.id);
        next_id += 1;

        if opens {
            stack.push(Frame {
                opener: keyword,
                node,
            });
        } else {
            attach(&mut stack, &mut tree.roots, node);
        }
    }

    while let Some(frame) = stack.pop() {
        tree.warnings.push(BlockWarning::Unclosed {
            line: frame.node.line,
            text: frame.node.text.trim().to_string(),
        });
        attach(&mut stack, &mut tree.roots, frame.node);
    }

    tree
}

fn attach(stack: &mut [Frame], roots: &mut Vec<ConfigNode>, node: ConfigNode) {
    match stack.last_mut() {
        Some(parent) => parent.node.children.push(node),
        None => roots.push(node),
    }
}
