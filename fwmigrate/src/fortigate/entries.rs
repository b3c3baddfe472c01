//! `config <path>` sections and their `edit <name>` entries.

use cfgtree_core::ConfigNode;

/// One `edit <name>` entry with its `set` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub id: usize,
    pub line: usize,
    settings: Vec<(String, Vec<String>)>,
}

impl Entry {
    /// Values of `set <key> ...`; the last `set` wins and `unset` clears.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.settings
            .iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, values)| values.as_slice())
    }

    /// First value of `set <key> ...`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key)?.first().map(String::as_str)
    }

    /// Values of `set <key> ...`, or an empty list.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key).map(<[String]>::to_vec).unwrap_or_default()
    }
}

/// Find the top-level `config <path>` section, e.g. `firewall address`.
pub fn section<'a>(sections: &'a [ConfigNode], path: &str) -> Option<&'a ConfigNode> {
    sections
        .iter()
        .find(|node| node.first_word() == "config" && node.rest_after(1) == path)
}

/// The `edit` entries of a section in source order.
pub fn entries(section: &ConfigNode) -> Vec<Entry> {
    section
        .get_children("edit")
        .into_iter()
        .map(|edit| {
            let mut settings: Vec<(String, Vec<String>)> = Vec::new();
            for child in &edit.children {
                match child.first_word() {
                    "set" => settings.push((child.word(1).to_string(), child.words_from(2).to_vec())),
                    "unset" => settings.retain(|(name, _)| name != child.word(1)),
                    _ => {}
                }
            }
            Entry {
                name: edit.word(1).to_string(),
                id: edit.id,
                line: edit.line,
                settings,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use cfgtree_core::block::build_tree;

    use super::{entries, section};
    use crate::fortigate::block_grammar;

    #[test]
    fn entries_expose_set_values() {
        let tree = build_tree(
            &[
                "config firewall address",
                "    edit \"dhcp pool\"",
                "        set type iprange",
                "        set start-ip 10.0.0.100",
                "        set comment \"old\"",
                "        unset comment",
                "    next",
                "end",
            ],
            &block_grammar(),
        );
        let section = section(&tree.roots, "firewall address").expect("section");
        let entries = entries(section);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "dhcp pool");
        assert_eq!(entries[0].first("type"), Some("iprange"));
        assert_eq!(entries[0].list("start-ip"), vec!["10.0.0.100"]);
        assert_eq!(entries[0].get("comment"), None);
        assert_eq!(entries[0].line, 2);
    }

    #[test]
    fn missing_section_is_none() {
        let tree = build_tree(&["config system global", "end"], &block_grammar());
        assert!(section(&tree.roots, "firewall policy").is_none());
    }
}
