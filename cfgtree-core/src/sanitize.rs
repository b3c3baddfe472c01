//! Line clean-up applied before tree building.

/// Drop every non-ASCII character from `line`.
pub fn ascii_only(line: &str) -> String {
    line.chars().filter(char::is_ascii).collect()
}

/// Remove every character in `hazards` from `line`.
pub fn strip_chars(line: &str, hazards: &[char]) -> String {
    line.chars().filter(|c| !hazards.contains(c)).collect()
}

/// Number of leading whitespace characters.
pub fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Split on runs of spaces and tabs.
pub fn split_words(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Split on whitespace, keeping double-quoted runs together and dropping the quotes.
///
/// `set member "web servers" "db"` yields `set`, `member`, `web servers`, `db`.
/// An unterminated quote runs to the end of the line.
pub fn split_quoted(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    words.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() || quoted {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::{ascii_only, indentation, split_quoted, split_words, strip_chars};

    #[test]
    fn ascii_only_drops_multibyte_characters() {
        assert_eq!(ascii_only("description caf\u{e9} r\u{f6}om"), "description caf rom");
    }

    #[test]
    fn strip_chars_removes_hazards() {
        assert_eq!(
            strip_chars("interface GigabitEthernet0/1 \"(outside)\"", &['(', ')', '"']),
            "interface GigabitEthernet0/1 outside"
        );
    }

    #[test]
    fn indentation_counts_leading_whitespace() {
        assert_eq!(indentation("   host 1.1.1.1"), 3);
        assert_eq!(indentation("route outside"), 0);
    }

    #[test]
    fn split_words_collapses_runs() {
        assert_eq!(split_words("  name \t 10.0.0.1   web "), vec!["name", "10.0.0.1", "web"]);
    }

    #[test]
    fn split_quoted_keeps_quoted_runs() {
        assert_eq!(
            split_quoted(r#"set member "web servers" "db" """#),
            vec!["set", "member", "web servers", "db", ""]
        );
        assert_eq!(split_quoted(r#"set comment "open"#), vec!["set", "comment", "open"]);
    }
}
