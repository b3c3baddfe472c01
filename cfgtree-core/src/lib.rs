//! Line-oriented configuration tree builders.
//!
//! Vendor configurations nest commands either by indentation (Cisco style) or
//! with explicit open/close keywords (FortiGate style). Both builders produce the
//! same [`ConfigNode`] forest: sequence ids in source order, parent ids, raw text
//! and tokens. Dialect semantics live in the crates that consume the tree.

pub mod block;
pub mod format;
pub mod indent;
pub mod reader;
pub mod sanitize;
pub mod tree;

pub use block::{BlockGrammar, BlockPair, BlockTree, BlockWarning};
pub use format::{format_json, format_text};
pub use indent::IndentOptions;
pub use reader::{lines_from_str, read_lines, ReadError};
pub use tree::{flatten_all, ConfigNode};
