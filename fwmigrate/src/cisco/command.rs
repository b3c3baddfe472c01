//! Typed Cisco ASA commands.
//!
//! A [`Command`] wraps one configuration line with its kind, the name it
//! declares (if any), its parsed payload, and an optional incident.

use cfgtree_core::ConfigNode;
use serde::Serialize;

use crate::incident::Incident;
use crate::model::DayWindow;

/// Every command the dialect registry knows, plus the two catch-all kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    AsaVersion,
    Hostname,
    Name,
    Description,
    Ssh,
    Object,
    Host,
    Subnet,
    Range,
    Fqdn,
    Service,
    ObjectGroup,
    NetworkObject,
    ServiceObject,
    PortObject,
    ProtocolObject,
    IcmpObject,
    GroupObject,
    Interface,
    Nameif,
    SecurityLevel,
    Vlan,
    IpAddress,
    Shutdown,
    ManagementOnly,
    Route,
    IpVerifyReversePath,
    SameSecurityTraffic,
    AccessList,
    AccessGroup,
    TimeRange,
    Periodic,
    Absolute,
    ClassMap,
    Match,
    Nat,
    NotInteresting,
    Unrecognized,
}

impl CommandKind {
    /// The leading words that introduce this command.
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::AsaVersion => "ASA",
            CommandKind::Hostname => "hostname",
            CommandKind::Name => "name",
            CommandKind::Description => "description",
            CommandKind::Ssh => "ssh",
            CommandKind::Object => "object",
            CommandKind::Host => "host",
            CommandKind::Subnet => "subnet",
            CommandKind::Range => "range",
            CommandKind::Fqdn => "fqdn",
            CommandKind::Service => "service",
            CommandKind::ObjectGroup => "object-group",
            CommandKind::NetworkObject => "network-object",
            CommandKind::ServiceObject => "service-object",
            CommandKind::PortObject => "port-object",
            CommandKind::ProtocolObject => "protocol-object",
            CommandKind::IcmpObject => "icmp-object",
            CommandKind::GroupObject => "group-object",
            CommandKind::Interface => "interface",
            CommandKind::Nameif => "nameif",
            CommandKind::SecurityLevel => "security-level",
            CommandKind::Vlan => "vlan",
            CommandKind::IpAddress => "ip address",
            CommandKind::Shutdown => "shutdown",
            CommandKind::ManagementOnly => "management-only",
            CommandKind::Route => "route",
            CommandKind::IpVerifyReversePath => "ip verify reverse-path interface",
            CommandKind::SameSecurityTraffic => "same-security-traffic",
            CommandKind::AccessList => "access-list",
            CommandKind::AccessGroup => "access-group",
            CommandKind::TimeRange => "time-range",
            CommandKind::Periodic => "periodic",
            CommandKind::Absolute => "absolute",
            CommandKind::ClassMap => "class-map",
            CommandKind::Match => "match",
            CommandKind::Nat => "nat",
            CommandKind::NotInteresting => "not-interesting",
            CommandKind::Unrecognized => "unrecognized",
        }
    }

    /// Parse a kind from its leading words, as accepted by `inspect --kind`.
    pub fn from_name(name: &str) -> Option<CommandKind> {
        ALL_KINDS.iter().copied().find(|kind| kind.as_str() == name)
    }
}

const ALL_KINDS: [CommandKind; 38] = [
    CommandKind::AsaVersion,
    CommandKind::Hostname,
    CommandKind::Name,
    CommandKind::Description,
    CommandKind::Ssh,
    CommandKind::Object,
    CommandKind::Host,
    CommandKind::Subnet,
    CommandKind::Range,
    CommandKind::Fqdn,
    CommandKind::Service,
    CommandKind::ObjectGroup,
    CommandKind::NetworkObject,
    CommandKind::ServiceObject,
    CommandKind::PortObject,
    CommandKind::ProtocolObject,
    CommandKind::IcmpObject,
    CommandKind::GroupObject,
    CommandKind::Interface,
    CommandKind::Nameif,
    CommandKind::SecurityLevel,
    CommandKind::Vlan,
    CommandKind::IpAddress,
    CommandKind::Shutdown,
    CommandKind::ManagementOnly,
    CommandKind::Route,
    CommandKind::IpVerifyReversePath,
    CommandKind::SameSecurityTraffic,
    CommandKind::AccessList,
    CommandKind::AccessGroup,
    CommandKind::TimeRange,
    CommandKind::Periodic,
    CommandKind::Absolute,
    CommandKind::ClassMap,
    CommandKind::Match,
    CommandKind::Nat,
    CommandKind::NotInteresting,
    CommandKind::Unrecognized,
];

/// A network address operand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Address {
    Any,
    Any6,
    /// `alias` is set when the address was written as a `name` alias.
    Host {
        ip: String,
        alias: Option<String>,
    },
    Subnet {
        ip: String,
        mask: String,
    },
    Range {
        from: String,
        to: String,
    },
    Fqdn {
        fqdn: String,
    },
    /// A named object, group, or interface.
    Ref {
        name: String,
    },
}

/// A port operand. Values are numeric after keyword translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum PortMatch {
    Any,
    Eq(String),
    Neq(String),
    Lt(String),
    Gt(String),
    Range(String, String),
    /// A service object or service group.
    Ref(String),
}

impl PortMatch {
    pub fn is_any(&self) -> bool {
        matches!(self, PortMatch::Any)
    }
}

/// The protocol column of an ACL entry or service definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Protocol {
    Ip,
    Icmp,
    Icmp6,
    Tcp,
    Udp,
    TcpUdp,
    Sctp,
    /// A protocol group or service object used in the protocol position.
    Ref(String),
    /// A named or numbered IP protocol.
    Other { name: String, number: String },
}

/// A protocol with its port or ICMP operands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceSpec {
    pub protocol: Protocol,
    pub source: PortMatch,
    pub destination: PortMatch,
    pub icmp_type: Option<String>,
}

impl ServiceSpec {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            source: PortMatch::Any,
            destination: PortMatch::Any,
            icmp_type: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Network,
    Service,
}

/// An `object network|service NAME` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectDef {
    pub object_type: ObjectType,
    pub address: Option<Address>,
    pub service: Option<ServiceSpec>,
    pub nat: Option<NatDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    Network,
    /// `protocol` is the port-object protocol of a `service NAME tcp|udp|tcp-udp` group.
    Service { protocol: Option<String> },
    Protocol,
    IcmpType,
}

/// One member line of an object group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum GroupMember {
    Address(Address),
    Object(String),
    Group(String),
    Port(PortMatch),
    Service(ServiceSpec),
    Protocol(String),
    IcmpType(String),
}

/// An `object-group TYPE NAME` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupDef {
    pub group_type: GroupType,
    pub members: Vec<GroupMember>,
}

/// An `interface` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceDef {
    pub hardware: String,
    pub name: Option<String>,
    pub security_level: Option<u8>,
    pub vlan: Option<String>,
    pub ip: Option<String>,
    pub mask: Option<String>,
    pub shutdown: bool,
    pub management_only: bool,
    /// Networks reachable through the interface as `(network, mask)`.
    pub topology: Vec<(String, String)>,
    pub leads_to_internet: bool,
}

/// A static `route` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDef {
    pub interface: String,
    pub destination: String,
    pub mask: String,
    pub gateway: String,
    pub distance: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AclAction {
    Permit,
    Deny,
}

/// One `access-list NAME extended|standard` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AclEntry {
    pub acl: String,
    pub action: AclAction,
    pub service: ServiceSpec,
    pub source: Address,
    pub destination: Address,
    pub time_range: Option<String>,
    pub inactive: bool,
    /// Aggregated remarks preceding the entry.
    pub remarks: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    In,
    Out,
    Global,
}

/// An `access-group ACL in|out interface NAME` or `access-group ACL global` binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessGroupDef {
    pub acl: String,
    pub direction: Direction,
    pub interface: Option<String>,
}

/// A `time-range NAME` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimeRangeDef {
    pub windows: Vec<DayWindow>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NatMode {
    Static,
    Dynamic,
}

/// Translated side of a twice-NAT clause: `real` and `mapped` operands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NatPair {
    pub mode: NatMode,
    pub real: String,
    pub mapped: String,
}

/// An object NAT child line or a twice-NAT top-level line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NatDef {
    pub real_interface: Option<String>,
    pub mapped_interface: Option<String>,
    /// Object NAT: the owning object's mapped address. Twice NAT: the source clause.
    pub mode: NatMode,
    pub mapped: String,
    pub source: Option<NatPair>,
    pub destination: Option<NatPair>,
    /// `(protocol, real port, mapped port)` for object NAT, or service names for twice NAT.
    pub service: Option<(String, String, String)>,
    pub twice: bool,
    pub after_auto: bool,
    pub unidirectional: bool,
    pub inactive: bool,
    pub interface_fallback: bool,
}

/// Parsed payload of a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandData {
    #[default]
    None,
    Version {
        version: String,
    },
    Hostname {
        name: String,
    },
    Alias {
        literal: String,
        alias: String,
        description: String,
    },
    Description {
        text: String,
    },
    Ssh {
        address: Address,
        interface: String,
    },
    Object(ObjectDef),
    ObjectGroup(GroupDef),
    Address(Address),
    Service(ServiceSpec),
    Member(GroupMember),
    Interface(InterfaceDef),
    Nameif {
        name: String,
    },
    SecurityLevel {
        level: u8,
    },
    Vlan {
        id: String,
    },
    IpAddress {
        ip: String,
        mask: String,
    },
    Flag,
    Route(RouteDef),
    ReversePath {
        interface: String,
    },
    SameSecurity {
        scope: String,
    },
    AccessList(AclEntry),
    Remark {
        acl: String,
        text: String,
    },
    AccessGroup(AccessGroupDef),
    TimeRange(TimeRangeDef),
    Periodic {
        windows: Vec<DayWindow>,
    },
    Absolute {
        start: Option<String>,
        end: Option<String>,
    },
    ClassMap {
        name: String,
        matched_acls: Vec<String>,
    },
    Match {
        criterion: String,
        value: String,
    },
    Nat(NatDef),
}

/// A configuration line with its parsed meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub id: usize,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<usize>,
    pub text: String,
    #[serde(skip)]
    pub tokens: Vec<String>,
    pub kind: CommandKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_id: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident: Option<Incident>,
    /// True when `incident` was copied from a child.
    #[serde(skip)]
    pub inherited_incident: bool,
    #[serde(skip_serializing_if = "is_none_data")]
    pub data: CommandData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Command>,
}

fn is_none_data(data: &CommandData) -> bool {
    matches!(data, CommandData::None)
}

impl Command {
    /// Wrap a detached tree node. Its children must already be taken out.
    pub fn new(node: ConfigNode, kind: CommandKind, children: Vec<Command>) -> Self {
        Self {
            id: node.id,
            line: node.line,
            parent_id: node.parent_id,
            text: node.text,
            tokens: node.tokens,
            kind,
            declared_id: None,
            description: String::new(),
            incident: None,
            inherited_incident: false,
            data: CommandData::None,
            children,
        }
    }

    pub fn word(&self, pos: usize) -> &str {
        self.tokens.get(pos).map(String::as_str).unwrap_or("")
    }

    pub fn words_from(&self, pos: usize) -> &[String] {
        self.tokens.get(pos..).unwrap_or(&[])
    }

    pub fn position_of(&self, word: &str) -> Option<usize> {
        self.tokens.iter().position(|token| token == word)
    }

    pub fn word_count(&self) -> usize {
        self.tokens.len()
    }

    /// Set a manual-action incident unless a heavier one is already present.
    pub fn manual(&mut self, message: impl Into<String>) {
        self.set_incident(Incident::manual(message));
    }

    /// Set an informative incident unless one is already present.
    pub fn informative(&mut self, message: impl Into<String>) {
        self.set_incident(Incident::informative(message));
    }

    fn set_incident(&mut self, incident: Incident) {
        let replace = match &self.incident {
            Some(existing) => incident.severity > existing.severity,
            None => true,
        };
        if replace {
            self.incident = Some(incident);
            self.inherited_incident = false;
        }
    }

    /// Copy the first child incident onto this command when it has none.
    pub fn inherit_child_incident(&mut self) {
        if self.incident.is_some() {
            return;
        }
        if let Some(incident) = self.children.iter().find_map(|child| child.incident.clone()) {
            self.incident = Some(incident);
            self.inherited_incident = true;
        }
    }

    /// First child of `kind`.
    pub fn child(&self, kind: CommandKind) -> Option<&Command> {
        self.children.iter().find(|child| child.kind == kind)
    }

    /// Pre-order traversal of this command and its descendants.
    pub fn flatten(&self) -> Vec<&Command> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.flatten());
        }
        out
    }
}
