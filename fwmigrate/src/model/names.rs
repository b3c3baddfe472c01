//! Name and comment sanitizing for model entities.

/// The wildcard object name.
pub const ANY: &str = "any";

/// Replace characters not allowed in object names with `_`.
pub fn safe_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Replace characters not allowed in comments with `_`.
pub fn safe_comments(comments: &str) -> String {
    comments
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || " @#*$(){}[]_.-=:,/".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect()
}
