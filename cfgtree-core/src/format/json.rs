use crate::tree::ConfigNode;

/// Format a command forest as pretty JSON.
pub fn format_json(roots: &[ConfigNode]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(roots)
}

#[cfg(test)]
mod tests {
    use super::format_json;
    use crate::indent::{build_tree, IndentOptions};

    #[test]
    fn json_includes_ids_and_children() {
        let roots = build_tree(&["interface Vlan10", " nameif inside"], &IndentOptions::default());
        let value: serde_json::Value =
            serde_json::from_str(&format_json(&roots).expect("format")).expect("valid json");
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["children"][0]["parent_id"], 1);
        assert_eq!(value[0]["children"][0]["tokens"][1], "inside");
    }
}
