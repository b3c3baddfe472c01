//! Indentation-stack tree builder.
//!
//! Each line's parent is the nearest preceding line with strictly smaller
//! indentation. A stack of `(id, indentation)` ancestors is maintained while
//! scanning; a shallower or equal line pops until the top is strictly
//! shallower than the line itself.

use crate::sanitize::{indentation, split_words, strip_chars};
use crate::tree::{assemble, ConfigNode};

/// Line filtering and hazard-stripping rules for an indentation dialect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndentOptions {
    /// Lines whose trimmed text starts with any of these are skipped.
    pub skip_prefixes: Vec<String>,
    /// Lines whose trimmed text starts with any of these have `hazard_chars` removed.
    pub hazard_prefixes: Vec<String>,
    /// Characters removed from hazard lines before tokenizing.
    pub hazard_chars: Vec<char>,
}

impl IndentOptions {
    fn skips(&self, trimmed: &str) -> bool {
        self.skip_prefixes
            .iter()
            .any(|prefix| trimmed.starts_with(prefix.as_str()))
    }

    fn is_hazard(&self, trimmed: &str) -> bool {
        self.hazard_prefixes
            .iter()
            .any(|prefix| trimmed.starts_with(prefix.as_str()))
    }
}

/// Build a flat, source-ordered node list with `parent_id` set.
///
/// Blank and skipped lines do not consume a sequence id; `line` still
/// records the 1-based source line number.
pub fn build_flat<S: AsRef<str>>(lines: &[S], options: &IndentOptions) -> Vec<ConfigNode> {
    let mut flat = Vec::new();
    let mut ancestors: Vec<(usize, usize)> = Vec::new();
    let mut next_id = 1;

    for (index, raw) in lines.iter().enumerate() {
        let raw = raw.as_ref();
        let trimmed = raw.trim();
        if trimmed.is_empty() || options.skips(trimmed) {
            continue;
        }

        let depth = indentation(raw);
        let tokens = if options.is_hazard(trimmed) {
            split_words(&strip_chars(trimmed, &options.hazard_chars))
        } else {
            split_words(trimmed)
        };

        while ancestors.last().is_some_and(|&(_, spaces)| spaces >= depth) {
            ancestors.pop();
        }

        let mut node = ConfigNode::new(next_id, index + 1, depth, raw.trim_end(), tokens);
        node.parent_id = ancestors.last().map(|&(id, _)| id);
        ancestors.push((next_id, depth));
        next_id += 1;
        flat.push(node);
    }

    flat
}

/// Build the command forest for an indentation-nested configuration.
pub fn build_tree<S: AsRef<str>>(lines: &[S], options: &IndentOptions) -> Vec<ConfigNode> {
    assemble(build_flat(lines, options))
}
