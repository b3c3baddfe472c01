//! Cisco ASA dialect: indentation-nested command tree to typed commands.
//!
//! Lines are built into a tree with the indentation-stack builder, every node
//! is classified through the registry, and parse routines run post-order so a
//! block sees its parsed children. Declared names go into the context's symbol
//! table as they are parsed; references to names declared later stay
//! unresolved.

pub mod command;
pub mod commands;
pub mod registry;

use cfgtree_core::indent::build_tree;
use cfgtree_core::{ConfigNode, IndentOptions};

use crate::cisco::command::{Command, CommandData, CommandKind};
use crate::cisco::commands::{parse_command, ParseContext, Symbol};
use crate::cisco::registry::classify;
use crate::incident::{ConversionIncident, Severity};
use crate::known_values::KnownValues;
use crate::symbols::SymbolTable;

/// Tree-builder settings for ASA configurations.
pub fn indent_options() -> IndentOptions {
    IndentOptions {
        skip_prefixes: vec!["#".to_string(), "<-".to_string()],
        hazard_prefixes: vec![
            "interface".to_string(),
            "ip verify reverse-path".to_string(),
            "mtu".to_string(),
        ],
        hazard_chars: vec!['(', ')', '{', '}', '"'],
    }
}

/// A parsed ASA configuration context.
#[derive(Debug, Clone)]
pub struct CiscoConfig {
    pub commands: Vec<Command>,
    pub symbols: SymbolTable<Symbol>,
    pub version: Option<String>,
    pub hostname: Option<String>,
    /// Source lines read, including skipped ones.
    pub line_count: usize,
}

impl CiscoConfig {
    /// Parse configuration lines.
    pub fn parse<S: AsRef<str>>(lines: &[S], known: &KnownValues, spread_acl_remarks: bool) -> Self {
        let roots = build_tree(lines, &indent_options());
        let mut ctx = ParseContext::new(known, spread_acl_remarks);
        let commands = parse_forest(roots, &mut ctx);

        let mut config = Self {
            commands,
            symbols: ctx.symbols,
            version: None,
            hostname: None,
            line_count: lines.len(),
        };
        config.symbols.prune_shadowed_aliases();
        config.attach_routes();
        config.version = config.first_data(|data| match data {
            CommandData::Version { version } => Some(version.clone()),
            _ => None,
        });
        config.hostname = config.first_data(|data| match data {
            CommandData::Hostname { name } => Some(name.clone()),
            _ => None,
        });
        config
    }

    fn first_data<F>(&self, pick: F) -> Option<String>
    where
        F: Fn(&CommandData) -> Option<String>,
    {
        self.commands.iter().find_map(|cmd| pick(&cmd.data))
    }

    /// Every command in pre-order.
    pub fn flatten(&self) -> Vec<&Command> {
        self.commands.iter().flat_map(Command::flatten).collect()
    }

    /// Every command of `kind`, in pre-order.
    pub fn filter(&self, kind: CommandKind) -> Vec<&Command> {
        self.flatten()
            .into_iter()
            .filter(|cmd| cmd.kind == kind)
            .collect()
    }

    /// The first command declaring `name`.
    pub fn command_by_declared_id(&self, name: &str) -> Option<&Command> {
        self.flatten()
            .into_iter()
            .find(|cmd| cmd.declared_id.as_deref() == Some(name))
    }

    /// Incidents raised while parsing, each reported once at its origin.
    pub fn incidents(&self) -> Vec<ConversionIncident> {
        self.flatten()
            .into_iter()
            .filter(|cmd| !cmd.inherited_incident)
            .filter_map(|cmd| {
                let incident = cmd.incident.as_ref()?;
                (incident.severity != Severity::None).then(|| ConversionIncident {
                    line: cmd.line,
                    command_id: cmd.id,
                    title: incident.message.clone(),
                    severity: incident.severity,
                })
            })
            .collect()
    }

    /// Add route destinations to the topology of the interface they leave through.
    fn attach_routes(&mut self) {
        let routes: Vec<_> = self
            .commands
            .iter()
            .filter_map(|cmd| match &cmd.data {
                CommandData::Route(route) => Some((route.clone(), cmd.incident.clone())),
                _ => None,
            })
            .collect();

        for (route, incident) in routes {
            let target = format!("Interface_{}", route.interface);
            let Some(iface) = self
                .commands
                .iter_mut()
                .find(|cmd| cmd.declared_id.as_deref() == Some(target.as_str()))
            else {
                continue;
            };
            if let CommandData::Interface(def) = &mut iface.data {
                if route.is_default {
                    def.leads_to_internet = true;
                } else {
                    def.topology.push((route.destination.clone(), route.mask.clone()));
                }
            }
            if iface.incident.is_none() {
                if let Some(incident) = incident {
                    iface.incident = Some(incident);
                    iface.inherited_incident = true;
                }
            }
        }
    }
}

fn parse_forest(nodes: Vec<ConfigNode>, ctx: &mut ParseContext<'_>) -> Vec<Command> {
    let mut out: Vec<Command> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let cmd = parse_node(node, out.last(), ctx);
        out.push(cmd);
    }
    out
}

fn parse_node(mut node: ConfigNode, prev: Option<&Command>, ctx: &mut ParseContext<'_>) -> Command {
    let children = parse_forest(std::mem::take(&mut node.children), ctx);
    let kind = classify(&node.tokens);
    let mut cmd = Command::new(node, kind, children);

    parse_command(&mut cmd, prev, ctx);
    cmd.inherit_child_incident();
    if let Some(name) = cmd.declared_id.as_deref() {
        ctx.symbols.declare(name, Symbol::from_command(&cmd));
    }
    cmd
}
