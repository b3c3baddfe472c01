//! Command registry and dispatch by leading words.
//!
//! Each command family submits its prefixes with [`inventory::submit!`]; the
//! registry is collected into a map on first use. Classification tries the
//! longest prefix first, then the deny-list of administrative commands.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::cisco::command::CommandKind;

/// A registered command prefix, one or more space-separated words.
#[derive(Debug)]
pub struct Registration {
    pub prefix: &'static str,
    pub kind: CommandKind,
}

impl Registration {
    pub const fn new(prefix: &'static str, kind: CommandKind) -> Self {
        Self { prefix, kind }
    }
}

inventory::collect!(Registration);

/// Leading words of administrative or cosmetic commands that are never translated.
pub const NOT_INTERESTING: &[&str] = &[
    "!",
    ":",
    "speed",
    "dns-guard",
    "domain-name",
    "duplex",
    "passwd",
    "banner",
    "boot",
    "dns",
    "failover",
    "asdm",
    "arp",
    "clock",
    "mtu",
    "timeout",
];

struct Registry {
    prefixes: HashMap<&'static str, CommandKind>,
    longest: usize,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut prefixes = HashMap::new();
        let mut longest = 1;
        for registration in inventory::iter::<Registration> {
            longest = longest.max(registration.prefix.split(' ').count());
            prefixes.entry(registration.prefix).or_insert(registration.kind);
        }
        Registry { prefixes, longest }
    })
}

/// Classify a tokenized line.
pub fn classify(tokens: &[String]) -> CommandKind {
    let registry = registry();
    let max = registry.longest.min(tokens.len());
    for words in (1..=max).rev() {
        let prefix = tokens[..words].join(" ");
        if let Some(kind) = registry.prefixes.get(prefix.as_str()) {
            return *kind;
        }
    }

    match tokens.first() {
        Some(first) if NOT_INTERESTING.contains(&first.as_str()) => CommandKind::NotInteresting,
        _ => CommandKind::Unrecognized,
    }
}

/// Every registered prefix, sorted.
pub fn registered_prefixes() -> Vec<&'static str> {
    let mut prefixes: Vec<&'static str> = registry().prefixes.keys().copied().collect();
    prefixes.sort_unstable();
    prefixes
}
