//! FortiGate dialect: block-nested `config`/`edit` sections.
//!
//! A file with a top-level `config vdom` block holds one context per virtual
//! domain; every other file is a single `root` context.

pub mod entries;

use cfgtree_core::block::build_tree;
use cfgtree_core::{BlockGrammar, BlockPair, BlockWarning, ConfigNode};

pub use entries::{entries, section, Entry};

const VERSION_PREFIX: &str = "#config-version=";
const DEFAULT_VDOM: &str = "root";

/// Block keywords for FortiOS configurations.
pub fn block_grammar() -> BlockGrammar {
    BlockGrammar {
        pairs: vec![BlockPair::new("config", "end"), BlockPair::new("edit", "next")],
        skip_prefixes: vec!["#".to_string()],
    }
}

/// The sections of one virtual domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VdomContext {
    pub name: String,
    pub sections: Vec<ConfigNode>,
}

/// A parsed FortiOS configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FortiConfig {
    pub version: Option<String>,
    pub roots: Vec<ConfigNode>,
    pub contexts: Vec<VdomContext>,
    pub warnings: Vec<BlockWarning>,
    pub line_count: usize,
}

impl FortiConfig {
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Self {
        let tree = build_tree(lines, &block_grammar());
        let contexts = split_vdoms(&tree.roots);
        Self {
            version: version_from(lines),
            roots: tree.roots,
            contexts,
            warnings: tree.warnings,
            line_count: lines.len(),
        }
    }

    /// True when the file declares virtual domains.
    pub fn is_multi_vdom(&self) -> bool {
        self.roots.iter().any(is_vdom_block)
    }
}

/// Firmware version from the `#config-version=<model>-<version>-...:` header.
pub fn version_from<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    lines.iter().find_map(|line| {
        let header = line.as_ref().trim().strip_prefix(VERSION_PREFIX)?;
        let header = header.split(':').next().unwrap_or(header);
        Some(header.to_string())
    })
}

fn is_vdom_block(node: &ConfigNode) -> bool {
    node.tokens.len() == 2 && node.word(0) == "config" && node.word(1) == "vdom"
}

fn split_vdoms(roots: &[ConfigNode]) -> Vec<VdomContext> {
    if !roots.iter().any(is_vdom_block) {
        return vec![VdomContext {
            name: DEFAULT_VDOM.to_string(),
            sections: roots.to_vec(),
        }];
    }

    let mut contexts: Vec<VdomContext> = Vec::new();
    for vdom in roots.iter().filter(|node| is_vdom_block(node)) {
        for edit in vdom.get_children("edit") {
            if edit.children.is_empty() {
                continue;
            }
            let name = edit.word(1).to_string();
            match contexts.iter_mut().find(|ctx| ctx.name == name) {
                Some(existing) => existing.sections.extend(edit.children.iter().cloned()),
                None => contexts.push(VdomContext {
                    name,
                    sections: edit.children.clone(),
                }),
            }
        }
    }
    contexts
}
