//! Firewall configuration migration: Cisco ASA and FortiGate to a normalized
//! policy model.
//!
//! A source configuration is read as lines, built into a tree, and parsed into
//! typed commands or entries. Translation then fills a repository of
//! vendor-neutral objects and a policy package (a parent layer jumping into
//! sub-policy layers, plus NAT rules). Anything that cannot be converted
//! faithfully is recorded as an incident tied to its source line.
//!
//! # Architecture
//!
//! ## Dialects
//!
//! - [`cisco`]: ASA indentation tree, command registry, per-family parse routines
//! - [`fortigate`]: FortiOS `config`/`edit` blocks and virtual domains
//!
//! ## Model
//!
//! - [`model`]: Objects, rules, layers, packages, and the name-keyed repository
//! - [`symbols`]: Declared names and aliases, cycle-safe group expansion
//! - [`known_values`]: Port, protocol, and predefined-service tables
//! - [`netaddr`]: IPv4 address and netmask helpers
//!
//! ## Translation
//!
//! - [`translate`]: Per-dialect translation into a [`translate::Conversion`]
//! - [`optimizer`]: Fixed-point merging of equivalent rules within a layer
//! - [`incident`]: Conversion incidents and their severities
//!
//! ## Reporting
//!
//! - [`summary`]: Post-conversion counts
//! - [`report`]: Terminal-friendly colored output
//! - [`options`]: Conversion options and dialect detection
//!
//! # Workflow
//!
//! 1. **Read** the configuration and detect its dialect
//! 2. **Parse** it into commands (ASA) or sections (FortiGate)
//! 3. **Translate** each context into objects and a policy package
//! 4. **Optimize** every converted layer until no rule merges remain
//! 5. **Report** the package, the incidents, and a summary
//!
//! # Examples
//!
//! ```ignore
//! use fwmigrate::known_values::default_known_values;
//! use fwmigrate::options::ConvertOptions;
//! use fwmigrate::translate::convert_lines;
//!
//! let lines = cfgtree_core::read_lines("asa.cfg".as_ref())?;
//! let known = default_known_values();
//! for conversion in convert_lines(&lines, &known, &ConvertOptions::default()) {
//!     println!("{}: {} rules", conversion.context, conversion.rules_after());
//! }
//! ```

pub mod cisco;
pub mod fortigate;
pub mod incident;
pub mod known_values;
pub mod model;
pub mod netaddr;
pub mod optimizer;
pub mod options;
pub mod report;
pub mod summary;
pub mod symbols;
pub mod translate;
