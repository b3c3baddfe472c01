use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Refuse an output path that resolves to the source configuration.
pub fn ensure_output_differs(output: &Path, input: &Path) -> Result<()> {
    let output_abs = comparable(output)
        .with_context(|| format!("failed to resolve output path {}", output.display()))?;
    let input_abs = comparable(input)
        .with_context(|| format!("failed to resolve input path {}", input.display()))?;
    if output_abs == input_abs {
        bail!(
            "refusing to overwrite source configuration: output {} is the input file",
            output.display()
        );
    }
    Ok(())
}

fn comparable(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return path
            .canonicalize()
            .with_context(|| format!("canonicalize {}", path.display()));
    }
    // Not on disk yet: anchor relative paths at the working directory.
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("current_dir")?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::ensure_output_differs;

    #[test]
    fn same_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("asa.cfg");
        std::fs::write(&input, "hostname fw\n").expect("write");

        let err = ensure_output_differs(&input, &input).expect_err("same path");
        assert!(err.to_string().contains("refusing to overwrite"));
        assert!(ensure_output_differs(&dir.path().join("model.json"), &input).is_ok());
    }
}
