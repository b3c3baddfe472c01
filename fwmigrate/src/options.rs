use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Source dialect of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Asa,
    Fortigate,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Asa => "asa",
            Dialect::Fortigate => "fortigate",
        }
    }

    /// Guess the dialect from the file contents.
    pub fn detect<S: AsRef<str>>(lines: &[S]) -> Dialect {
        let fortigate = lines.iter().any(|line| {
            let line = line.as_ref().trim_start();
            line.starts_with("#config-version=") || line.starts_with("config firewall ")
        });
        if fortigate {
            Dialect::Fortigate
        } else {
            Dialect::Asa
        }
    }
}

/// Conversion settings read from an optional TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Merge equivalent rules in every converted layer.
    pub optimize: bool,
    /// Policy package name; defaults to the configured hostname.
    pub package_name: Option<String>,
    /// Carry an ACL remark onto every later entry of the same ACL.
    pub spread_acl_remarks: bool,
    /// Skip dialect detection.
    pub dialect: Option<Dialect>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            optimize: true,
            package_name: None,
            spread_acl_remarks: false,
            dialect: None,
        }
    }
}

/// Errors returned when loading an options file.
#[derive(Debug, Error)]
pub enum OptionsLoadError {
    #[error("failed to read options file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse options file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Load conversion options from a TOML file. Missing fields take defaults.
pub fn load_options(path: &Path) -> Result<ConvertOptions, OptionsLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| OptionsLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| OptionsLoadError::Parse {
        path: path.display().to_string(),
        source,
    })
}
