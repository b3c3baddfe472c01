use crate::tree::ConfigNode;

/// Format a command forest as an indented outline, `max_depth` levels deep.
///
/// Each line is prefixed with its sequence id and source line number.
pub fn format_text(roots: &[ConfigNode], max_depth: usize) -> String {
    let mut out = String::new();
    for root in roots {
        render_node(root, 0, max_depth, &mut out);
    }
    out
}

fn render_node(node: &ConfigNode, level: usize, max_depth: usize, out: &mut String) {
    if level >= max_depth {
        return;
    }
    out.push_str(&format!(
        "{}#{} L{} {}\n",
        "  ".repeat(level),
        node.id,
        node.line,
        node.tokens.join(" ")
    ));
    for child in &node.children {
        render_node(child, level + 1, max_depth, out);
    }
}
