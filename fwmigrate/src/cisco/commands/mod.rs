//! Per-family parse routines and the operand parsers they share.
//!
//! Routines run post-order: when a block command is parsed its children
//! already carry their payloads. A routine sees the command, its preceding
//! sibling, and the symbols declared so far.

mod access;
mod groups;
mod interfaces;
mod nat;
mod objects;
mod system;
mod time;

use crate::cisco::command::{Address, Command, CommandData, CommandKind, GroupType, ObjectType, PortMatch, Protocol};
use crate::known_values::KnownValues;
use crate::netaddr::{is_valid_ipv4, is_valid_netmask};
use crate::symbols::SymbolTable;

pub use time::expand_periodic;

pub const PLACEHOLDER_HOST: &str = "1.1.1.1";
pub const PLACEHOLDER_SUBNET: &str = "1.1.1.0";
pub const PLACEHOLDER_MASK: &str = "255.255.255.0";
pub const PLACEHOLDER_RANGE_FROM: &str = "0.0.0.0";
pub const PLACEHOLDER_RANGE_TO: &str = "255.255.255.255";

/// A declared name and the payload of the command that declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub command_id: usize,
    pub kind: CommandKind,
    pub data: CommandData,
}

impl Symbol {
    pub fn from_command(cmd: &Command) -> Self {
        Self {
            command_id: cmd.id,
            kind: cmd.kind,
            data: cmd.data.clone(),
        }
    }

    pub fn is_service_object(&self) -> bool {
        matches!(&self.data, CommandData::Object(def) if def.object_type == ObjectType::Service)
    }

    pub fn is_service_group(&self) -> bool {
        matches!(
            &self.data,
            CommandData::ObjectGroup(def)
                if matches!(def.group_type, GroupType::Service { .. } | GroupType::IcmpType)
        )
    }
}

/// State shared by parse routines within one configuration context.
pub struct ParseContext<'a> {
    pub symbols: SymbolTable<Symbol>,
    pub known: &'a KnownValues,
    pub spread_acl_remarks: bool,
}

impl<'a> ParseContext<'a> {
    pub fn new(known: &'a KnownValues, spread_acl_remarks: bool) -> Self {
        Self {
            symbols: SymbolTable::new(),
            known,
            spread_acl_remarks,
        }
    }
}

/// Run the parse routine registered for the command's kind.
pub fn parse_command(cmd: &mut Command, prev: Option<&Command>, ctx: &mut ParseContext<'_>) {
    match cmd.kind {
        CommandKind::AsaVersion
        | CommandKind::Hostname
        | CommandKind::Name
        | CommandKind::Description
        | CommandKind::Ssh
        | CommandKind::SameSecurityTraffic
        | CommandKind::IpVerifyReversePath => system::parse(cmd, ctx),
        CommandKind::Object
        | CommandKind::Host
        | CommandKind::Subnet
        | CommandKind::Range
        | CommandKind::Fqdn
        | CommandKind::Service => objects::parse(cmd, ctx),
        CommandKind::ObjectGroup
        | CommandKind::NetworkObject
        | CommandKind::ServiceObject
        | CommandKind::PortObject
        | CommandKind::ProtocolObject
        | CommandKind::IcmpObject
        | CommandKind::GroupObject => groups::parse(cmd, ctx),
        CommandKind::Interface
        | CommandKind::Nameif
        | CommandKind::SecurityLevel
        | CommandKind::Vlan
        | CommandKind::IpAddress
        | CommandKind::Shutdown
        | CommandKind::ManagementOnly
        | CommandKind::Route => interfaces::parse(cmd, ctx),
        CommandKind::AccessList
        | CommandKind::AccessGroup
        | CommandKind::ClassMap
        | CommandKind::Match => access::parse(cmd, prev, ctx),
        CommandKind::TimeRange | CommandKind::Periodic | CommandKind::Absolute => {
            time::parse(cmd)
        }
        CommandKind::Nat => nat::parse(cmd, ctx),
        CommandKind::NotInteresting | CommandKind::Unrecognized => {}
    }
}

/// Host operand, resolving aliases. Invalid addresses fall back to a placeholder.
pub(crate) fn host_address(cmd: &mut Command, text: &str, ctx: &ParseContext<'_>) -> Address {
    let alias = ctx.symbols.alias(text).map(|_| text.to_string());
    let ip = ctx.symbols.dealias(text).to_string();
    if is_valid_ipv4(&ip) {
        return Address::Host { ip, alias };
    }
    cmd.manual(format!(
        "Invalid host IP address ({text}). Using IP {PLACEHOLDER_HOST}."
    ));
    Address::Host {
        ip: PLACEHOLDER_HOST.to_string(),
        alias,
    }
}

/// Subnet operand, resolving an aliased network address.
pub(crate) fn subnet_address(
    cmd: &mut Command,
    ip: &str,
    mask: &str,
    ctx: &ParseContext<'_>,
) -> Address {
    let resolved = ctx.symbols.dealias(ip).to_string();
    if is_valid_ipv4(&resolved) && is_valid_netmask(mask) {
        return Address::Subnet {
            ip: resolved,
            mask: mask.to_string(),
        };
    }
    cmd.manual(format!(
        "Invalid IP subnet ({ip}/{mask}). Using IP subnet {PLACEHOLDER_SUBNET}/{PLACEHOLDER_MASK}."
    ));
    Address::Subnet {
        ip: PLACEHOLDER_SUBNET.to_string(),
        mask: PLACEHOLDER_MASK.to_string(),
    }
}

/// Parse an address operand at `pos`. Returns the address and the words consumed.
pub(crate) fn parse_address(
    cmd: &mut Command,
    pos: usize,
    ctx: &ParseContext<'_>,
) -> (Address, usize) {
    let keyword = cmd.word(pos).to_string();
    let operand = cmd.word(pos + 1).to_string();
    match keyword.as_str() {
        "any" | "any4" => (Address::Any, 1),
        "any6" => (Address::Any6, 1),
        "host" => (host_address(cmd, &operand, ctx), 2),
        "object" | "object-group" => (Address::Ref { name: operand }, 2),
        "interface" => (
            Address::Ref {
                name: format!("Interface_{operand}"),
            },
            2,
        ),
        _ => (subnet_address(cmd, &keyword, &operand, ctx), 2),
    }
}

/// Parse a port operand at `pos`; no operand yields `(PortMatch::Any, 0)`.
pub(crate) fn parse_port(cmd: &Command, pos: usize, ctx: &ParseContext<'_>) -> (PortMatch, usize) {
    let port = |word: &str| ctx.known.cisco_port(word);
    match cmd.word(pos) {
        "eq" => (PortMatch::Eq(port(cmd.word(pos + 1))), 2),
        "neq" => (PortMatch::Neq(port(cmd.word(pos + 1))), 2),
        "lt" => (PortMatch::Lt(port(cmd.word(pos + 1))), 2),
        "gt" => (PortMatch::Gt(port(cmd.word(pos + 1))), 2),
        "range" => (
            PortMatch::Range(port(cmd.word(pos + 1)), port(cmd.word(pos + 2))),
            3,
        ),
        keyword @ ("object" | "object-group") => {
            let name = cmd.word(pos + 1);
            let is_service = match ctx.symbols.get(name) {
                Some(symbol) if keyword == "object" => symbol.is_service_object(),
                Some(symbol) => symbol.is_service_group(),
                // Not declared yet: a service only if an address operand still follows.
                None => starts_address(cmd.word(pos + 2)),
            };
            if is_service {
                (PortMatch::Ref(name.to_string()), 2)
            } else {
                (PortMatch::Any, 0)
            }
        }
        _ => (PortMatch::Any, 0),
    }
}

/// Port operand after the destination address, where an `object` or
/// `object-group` reference can only name a service, declared yet or not.
pub(crate) fn parse_destination_port(
    cmd: &Command,
    pos: usize,
    ctx: &ParseContext<'_>,
) -> (PortMatch, usize) {
    match cmd.word(pos) {
        "object" | "object-group" if !cmd.word(pos + 1).is_empty() => {
            (PortMatch::Ref(cmd.word(pos + 1).to_string()), 2)
        }
        _ => parse_port(cmd, pos, ctx),
    }
}

fn starts_address(word: &str) -> bool {
    matches!(
        word,
        "any" | "any4" | "any6" | "host" | "object" | "object-group" | "interface"
    ) || is_valid_ipv4(word)
}

/// Map a protocol keyword or number to a [`Protocol`].
pub(crate) fn parse_protocol(word: &str, known: &KnownValues) -> Option<Protocol> {
    let protocol = match word {
        "ip" => Protocol::Ip,
        "icmp" => Protocol::Icmp,
        "icmp6" => Protocol::Icmp6,
        "tcp" => Protocol::Tcp,
        "udp" => Protocol::Udp,
        "tcp-udp" => Protocol::TcpUdp,
        "sctp" => Protocol::Sctp,
        _ => {
            if let Some(number) = known.cisco_protocol_number(word) {
                Protocol::Other {
                    name: word.to_string(),
                    number: number.to_string(),
                }
            } else if word.parse::<u8>().is_ok() {
                Protocol::Other {
                    name: known.cisco_protocol_name(word).unwrap_or(word).to_string(),
                    number: word.to_string(),
                }
            } else {
                return None;
            }
        }
    };
    Some(protocol)
}


#[cfg(test)]
mod tests {
    use super::test_support::command;
    use super::{parse_address, parse_destination_port, parse_port, parse_protocol, ParseContext};
    use crate::cisco::command::{Address, PortMatch, Protocol};
    use crate::incident::Severity;
    use crate::known_values::default_known_values;

    #[test]
    fn address_operands() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        ctx.symbols.add_alias("web-srv", "10.1.1.10");

        let mut cmd = command("x any host web-srv interface outside 10.0.0.0 255.0.0.0");
        assert_eq!(parse_address(&mut cmd, 1, &ctx), (Address::Any, 1));
        assert_eq!(
            parse_address(&mut cmd, 2, &ctx),
            (
                Address::Host {
                    ip: "10.1.1.10".to_string(),
                    alias: Some("web-srv".to_string())
                },
                2
            )
        );
        assert_eq!(
            parse_address(&mut cmd, 4, &ctx).0,
            Address::Ref {
                name: "Interface_outside".to_string()
            }
        );
        assert_eq!(
            parse_address(&mut cmd, 6, &ctx).0,
            Address::Subnet {
                ip: "10.0.0.0".to_string(),
                mask: "255.0.0.0".to_string()
            }
        );
        assert!(cmd.incident.is_none());
    }

    #[test]
    fn invalid_host_falls_back_to_placeholder() {
        let known = default_known_values();
        let ctx = ParseContext::new(&known, false);
        let mut cmd = command("x host mail-srv");

        let (address, _) = parse_address(&mut cmd, 1, &ctx);
        assert_eq!(
            address,
            Address::Host {
                ip: "1.1.1.1".to_string(),
                alias: None
            }
        );
        let incident = cmd.incident.expect("incident");
        assert_eq!(incident.severity, Severity::ManualActionRequired);
        assert_eq!(incident.message, "Invalid host IP address (mail-srv). Using IP 1.1.1.1.");
    }

    #[test]
    fn port_operands_translate_keywords() {
        let known = default_known_values();
        let ctx = ParseContext::new(&known, false);
        let cmd = command("x eq www range ftp-data ftp object svc");

        assert_eq!(parse_port(&cmd, 1, &ctx), (PortMatch::Eq("80".to_string()), 2));
        assert_eq!(
            parse_port(&cmd, 3, &ctx),
            (PortMatch::Range("20".to_string(), "21".to_string()), 3)
        );
        assert_eq!(parse_port(&cmd, 6, &ctx), (PortMatch::Any, 0));
    }

    #[test]
    fn undeclared_port_objects_are_told_apart_by_what_follows() {
        let known = default_known_values();
        let ctx = ParseContext::new(&known, false);
        let cmd = command("x object later object dst eq www object svc");

        assert_eq!(
            parse_port(&cmd, 1, &ctx),
            (PortMatch::Ref("later".to_string()), 2)
        );
        assert_eq!(parse_port(&cmd, 3, &ctx), (PortMatch::Any, 0));
        assert_eq!(
            parse_destination_port(&cmd, 7, &ctx),
            (PortMatch::Ref("svc".to_string()), 2)
        );
        assert_eq!(
            parse_destination_port(&cmd, 5, &ctx),
            (PortMatch::Eq("80".to_string()), 2)
        );
    }

    #[test]
    fn protocols_by_name_and_number() {
        let known = default_known_values();
        assert_eq!(parse_protocol("tcp", &known), Some(Protocol::Tcp));
        assert_eq!(
            parse_protocol("47", &known),
            Some(Protocol::Other {
                name: "gre".to_string(),
                number: "47".to_string()
            })
        );
        assert_eq!(parse_protocol("bogus", &known), None);
    }
}
