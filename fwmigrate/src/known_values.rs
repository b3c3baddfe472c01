//! Static lookup tables for vendor service, protocol, and ICMP names.
//!
//! The tables ship embedded in the binary (`data/known_values.toml`) and may be
//! replaced with a file of the same shape. They are loaded once at startup and
//! shared read-only by every configuration context.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Raw table file contents: ordered `[name, value]` pairs per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KnownValueTables {
    #[serde(default)]
    pub cisco: CiscoTables,
    #[serde(default)]
    pub predefined: PredefinedTables,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CiscoTables {
    #[serde(default)]
    pub ports: Vec<(String, String)>,
    #[serde(default)]
    pub protocols: Vec<(String, String)>,
    #[serde(default)]
    pub icmp_types: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PredefinedTables {
    #[serde(default)]
    pub tcp: Vec<(String, String)>,
    #[serde(default)]
    pub udp: Vec<(String, String)>,
    #[serde(default)]
    pub sctp: Vec<(String, String)>,
    #[serde(default)]
    pub other: Vec<(String, String)>,
    #[serde(default)]
    pub icmp: Vec<(String, String)>,
    #[serde(default)]
    pub service_groups: Vec<String>,
}

/// Errors returned when loading a table file.
#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("failed to read known-value tables {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse known-value tables {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Indexed known-value tables.
#[derive(Debug, Clone, Default)]
pub struct KnownValues {
    tables: KnownValueTables,
    cisco_ports: HashMap<String, String>,
    cisco_protocols: HashMap<String, String>,
    cisco_protocol_names: HashMap<String, String>,
    cisco_icmp: HashMap<String, String>,
    services_by_key: HashMap<String, String>,
}

impl KnownValues {
    /// Index raw tables. Where a name or key repeats, the first entry wins.
    pub fn from_tables(tables: KnownValueTables) -> Self {
        let cisco_ports = first_wins(tables.cisco.ports.iter().map(|(n, v)| (n.clone(), v.clone())));
        let cisco_protocols =
            first_wins(tables.cisco.protocols.iter().map(|(n, v)| (n.clone(), v.clone())));
        let cisco_protocol_names =
            first_wins(tables.cisco.protocols.iter().map(|(n, v)| (v.clone(), n.clone())));
        let cisco_icmp =
            first_wins(tables.cisco.icmp_types.iter().map(|(n, v)| (n.clone(), v.clone())));

        let keyed = [
            ("TCP", &tables.predefined.tcp),
            ("UDP", &tables.predefined.udp),
            ("SCTP", &tables.predefined.sctp),
            ("OTHER", &tables.predefined.other),
            ("ICMP", &tables.predefined.icmp),
        ];
        let services_by_key = first_wins(keyed.iter().flat_map(|(proto, pairs)| {
            pairs
                .iter()
                .map(move |(name, value)| (service_key(proto, value), name.clone()))
        }));

        Self {
            tables,
            cisco_ports,
            cisco_protocols,
            cisco_protocol_names,
            cisco_icmp,
            services_by_key,
        }
    }

    pub fn tables(&self) -> &KnownValueTables {
        &self.tables
    }

    /// Translate a Cisco port keyword to its number; anything else is returned unchanged.
    pub fn cisco_port(&self, name_or_number: &str) -> String {
        self.cisco_ports
            .get(name_or_number)
            .cloned()
            .unwrap_or_else(|| name_or_number.to_string())
    }

    /// Translate a Cisco ICMP keyword to its type number; anything else is returned unchanged.
    pub fn cisco_icmp_type(&self, name_or_type: &str) -> String {
        self.cisco_icmp
            .get(name_or_type)
            .cloned()
            .unwrap_or_else(|| name_or_type.to_string())
    }

    pub fn is_cisco_icmp_name(&self, name: &str) -> bool {
        self.cisco_icmp.contains_key(name)
    }

    /// Protocol number for a Cisco IP protocol keyword.
    pub fn cisco_protocol_number(&self, name: &str) -> Option<&str> {
        self.cisco_protocols.get(name).map(String::as_str)
    }

    /// Cisco IP protocol keyword for a protocol number.
    pub fn cisco_protocol_name(&self, number: &str) -> Option<&str> {
        self.cisco_protocol_names.get(number).map(String::as_str)
    }

    /// Predefined service name for a `<PROTO>_<port-or-type>` key.
    pub fn service_name(&self, key: &str) -> Option<&str> {
        self.services_by_key.get(key).map(String::as_str)
    }

    pub(crate) fn services_by_key(&self) -> &HashMap<String, String> {
        &self.services_by_key
    }

    /// Every predefined service and service-group name, in table order.
    pub fn predefined_names(&self) -> impl Iterator<Item = &str> {
        let p = &self.tables.predefined;
        p.tcp
            .iter()
            .chain(&p.udp)
            .chain(&p.sctp)
            .chain(&p.other)
            .chain(&p.icmp)
            .map(|(name, _)| name.as_str())
            .chain(p.service_groups.iter().map(String::as_str))
    }
}

/// Build a `<PROTO>_<value>` lookup key.
pub fn service_key(proto: &str, value: &str) -> String {
    format!("{proto}_{value}")
}

fn first_wins(pairs: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (key, value) in pairs {
        map.entry(key).or_insert(value);
    }
    map
}

/// Load tables from a TOML file.
pub fn load_known_values(path: &Path) -> Result<KnownValues, TableLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| TableLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_tables(&raw, path.display().to_string()).map(KnownValues::from_tables)
}

/// Built-in tables.
pub fn default_known_values() -> KnownValues {
    let embedded = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/data/known_values.toml"
    ));
    match parse_tables(embedded, "embedded tables".to_string()) {
        Ok(tables) if !tables.predefined.tcp.is_empty() => KnownValues::from_tables(tables),
        _ => KnownValues::from_tables(fallback_tables()),
    }
}

fn parse_tables(raw: &str, path: String) -> Result<KnownValueTables, TableLoadError> {
    toml::from_str(raw).map_err(|source| TableLoadError::Parse { path, source })
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn fallback_tables() -> KnownValueTables {
    KnownValueTables {
        cisco: CiscoTables {
            ports: pairs(&[("www", "80"), ("https", "443"), ("ssh", "22"), ("domain", "53")]),
            protocols: pairs(&[("gre", "47"), ("esp", "50"), ("ah", "51")]),
            icmp_types: pairs(&[("echo-reply", "0"), ("unreachable", "3"), ("echo", "8")]),
        },
        predefined: PredefinedTables {
            tcp: pairs(&[("ssh", "22"), ("http", "80"), ("https", "443")]),
            udp: pairs(&[("domain-udp", "53")]),
            sctp: Vec::new(),
            other: pairs(&[("gre", "47")]),
            icmp: pairs(&[("echo-reply", "0"), ("echo-request", "8")]),
            service_groups: Vec::new(),
        },
    }
}
