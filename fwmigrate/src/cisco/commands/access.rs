use crate::cisco::command::{
    AccessGroupDef, AclAction, AclEntry, Address, Command, CommandData, CommandKind, Direction,
    PortMatch, Protocol, ServiceSpec,
};
use crate::cisco::commands::{
    parse_address, parse_destination_port, parse_port, parse_protocol, ParseContext, Symbol,
};
use crate::cisco::registry::Registration;

inventory::submit! { Registration::new("access-list", CommandKind::AccessList) }
inventory::submit! { Registration::new("access-group", CommandKind::AccessGroup) }
inventory::submit! { Registration::new("class-map", CommandKind::ClassMap) }
inventory::submit! { Registration::new("match", CommandKind::Match) }

/// Separator between aggregated ACL remarks.
const REMARK_JOIN: &str = ",  ";

pub(super) fn parse(cmd: &mut Command, prev: Option<&Command>, ctx: &mut ParseContext<'_>) {
    match cmd.kind {
        CommandKind::AccessList => parse_access_list(cmd, prev, ctx),
        CommandKind::AccessGroup => parse_access_group(cmd),
        CommandKind::ClassMap => {
            let matched_acls = cmd
                .children
                .iter()
                .filter_map(|child| match &child.data {
                    CommandData::Match { criterion, value } if criterion == "access-list" => {
                        Some(value.clone())
                    }
                    _ => None,
                })
                .collect();
            cmd.declared_id = Some(cmd.word(1).to_string());
            cmd.data = CommandData::ClassMap {
                name: cmd.word(1).to_string(),
                matched_acls,
            };
        }
        CommandKind::Match => {
            cmd.data = CommandData::Match {
                criterion: cmd.word(1).to_string(),
                value: cmd.words_from(2).join(" "),
            };
        }
        _ => {}
    }
}

/// Remarks carried from the previous line of the same ACL.
fn carried_remarks(acl: &str, prev: Option<&Command>, spread: bool) -> String {
    match prev.map(|prev| &prev.data) {
        Some(CommandData::Remark { acl: prev_acl, text }) if prev_acl == acl => text.clone(),
        Some(CommandData::AccessList(entry)) if spread && entry.acl == acl => entry.remarks.clone(),
        _ => String::new(),
    }
}

fn parse_access_list(cmd: &mut Command, prev: Option<&Command>, ctx: &ParseContext<'_>) {
    let acl = cmd.word(1).to_string();
    let remarks = carried_remarks(&acl, prev, ctx.spread_acl_remarks);

    if cmd.word(2) == "remark" {
        let own = cmd.words_from(3).join(" ");
        let text = match prev.map(|prev| &prev.data) {
            Some(CommandData::Remark { acl: prev_acl, .. }) if *prev_acl == acl => {
                format!("{remarks}{REMARK_JOIN}{own}")
            }
            _ => own,
        };
        cmd.data = CommandData::Remark { acl, text };
        return;
    }

    let action_pos = match (cmd.position_of("permit"), cmd.position_of("deny")) {
        (None, None) => {
            let message = format!("Unsupported access-list entry ({})", cmd.words_from(2).join(" "));
            cmd.manual(message);
            return;
        }
        (permit, deny) => permit.max(deny).unwrap_or_default(),
    };
    let action = if cmd.word(action_pos) == "deny" {
        AclAction::Deny
    } else {
        AclAction::Permit
    };

    let entry = if cmd.word(2) == "standard" {
        parse_standard(cmd, action_pos + 1, ctx)
    } else {
        parse_extended(cmd, action_pos + 1, ctx)
    };
    let Some((service, source, destination, mut pos)) = entry else {
        return;
    };

    let mut time_range = None;
    let mut inactive = false;
    while pos < cmd.word_count() {
        match cmd.word(pos) {
            "time-range" => {
                time_range = Some(cmd.word(pos + 1).to_string());
                pos += 2;
            }
            "inactive" => {
                inactive = true;
                pos += 1;
            }
            _ => pos += 1,
        }
    }

    cmd.data = CommandData::AccessList(AclEntry {
        acl,
        action,
        service,
        source,
        destination,
        time_range,
        inactive,
        remarks,
    });
}

type Parsed = (ServiceSpec, Address, Address, usize);

// access-list <name> standard permit|deny <destination>
fn parse_standard(cmd: &mut Command, pos: usize, ctx: &ParseContext<'_>) -> Option<Parsed> {
    let (destination, used) = parse_address(cmd, pos, ctx);
    Some((ServiceSpec::new(Protocol::Ip), Address::Any, destination, pos + used))
}

// access-list <name> extended permit|deny <protocol> <source> [port] <destination> [port|icmp]
fn parse_extended(cmd: &mut Command, pos: usize, ctx: &ParseContext<'_>) -> Option<Parsed> {
    let (protocol, mut pos) = match cmd.word(pos) {
        "object" | "object-group" => (Protocol::Ref(cmd.word(pos + 1).to_string()), pos + 2),
        word => {
            let word = word.to_string();
            match parse_protocol(&word, ctx.known) {
                Some(protocol) => (protocol, pos + 1),
                None => {
                    cmd.manual(format!("Unrecognized service protocol ({word})"));
                    return None;
                }
            }
        }
    };
    let has_ports = matches!(
        protocol,
        Protocol::Ip
            | Protocol::Tcp
            | Protocol::Udp
            | Protocol::TcpUdp
            | Protocol::Sctp
            | Protocol::Ref(_)
    );

    let mut service = ServiceSpec::new(protocol);
    let (source, used) = parse_address(cmd, pos, ctx);
    pos += used;
    if has_ports {
        let (port, used) = parse_port(cmd, pos, ctx);
        service.source = port;
        pos += used;
    }

    let (destination, used) = parse_address(cmd, pos, ctx);
    pos += used;
    let port_protocol = matches!(
        service.protocol,
        Protocol::Tcp | Protocol::Udp | Protocol::TcpUdp | Protocol::Sctp
    );
    if port_protocol {
        let (port, used) = parse_destination_port(cmd, pos, ctx);
        service.destination = port;
        pos += used;
    } else if has_ports {
        let (port, used) = parse_port(cmd, pos, ctx);
        service.destination = port;
        pos += used;
    } else if matches!(service.protocol, Protocol::Icmp | Protocol::Icmp6) {
        let word = cmd.word(pos);
        let group = cmd.word(pos + 1);
        if word == "object-group"
            && !group.is_empty()
            && ctx.symbols.get(group).map_or(true, Symbol::is_service_group)
        {
            service.destination = PortMatch::Ref(cmd.word(pos + 1).to_string());
            pos += 2;
        } else if ctx.known.is_cisco_icmp_name(word) {
            service.icmp_type = Some(ctx.known.cisco_icmp_type(word));
            pos += 1;
        }
    }

    if !service.source.is_any() && !service.destination.is_any() {
        cmd.informative(
            "Cannot convert a service defined as both source service and destination service. Ignoring source service.",
        );
        service.source = PortMatch::Any;
    }
    Some((service, source, destination, pos))
}

// access-group <acl> in|out interface <name> | access-group <acl> global
fn parse_access_group(cmd: &mut Command) {
    let acl = cmd.word(1).to_string();
    let (direction, interface) = match cmd.word(2) {
        "in" => (Direction::In, Some(cmd.word(4).to_string())),
        "out" => (Direction::Out, Some(cmd.word(4).to_string())),
        "global" => (Direction::Global, None),
        other => {
            let message = format!("Unrecognized access-group direction ({other})");
            cmd.manual(message);
            return;
        }
    };
    if direction == Direction::Out {
        cmd.informative("Outbound ACLs will not be converted");
    }
    cmd.data = CommandData::AccessGroup(AccessGroupDef {
        acl,
        direction,
        interface,
    });
}
