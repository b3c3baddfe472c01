use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::sanitize::ascii_only;

/// Errors that can occur while reading a configuration file.
#[derive(Debug, Error)]
pub enum ReadError {
    /// Failed to read input file.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Split text into lines with non-ASCII characters dropped.
pub fn lines_from_str(text: &str) -> Vec<String> {
    text.lines().map(ascii_only).collect()
}

/// Read a configuration file into ASCII-only lines.
///
/// Invalid UTF-8 sequences are dropped along with every other non-ASCII byte.
pub fn read_lines(path: &Path) -> Result<Vec<String>, ReadError> {
    let bytes = fs::read(path).map_err(|source| ReadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(lines_from_str(&String::from_utf8_lossy(&bytes)))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{lines_from_str, read_lines};

    #[test]
    fn read_lines_drops_non_ascii_bytes() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"hostname fw\xff1\r\nname 10.0.0.1 caf\xc3\xa9\n")
            .expect("write");

        let lines = read_lines(file.path()).expect("read should succeed");
        assert_eq!(lines, vec!["hostname fw1", "name 10.0.0.1 caf"]);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_lines(std::path::Path::new("/nonexistent/asa.cfg")).expect_err("missing");
        assert!(err.to_string().contains("/nonexistent/asa.cfg"));
    }

    #[test]
    fn lines_from_str_keeps_blank_lines() {
        assert_eq!(lines_from_str("a\n\nb").len(), 3);
    }
}
