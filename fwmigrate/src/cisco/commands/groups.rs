use crate::cisco::command::{Command, CommandData, CommandKind, GroupDef, GroupMember, GroupType};
use crate::cisco::commands::objects::parse_service_spec;
use crate::cisco::commands::{host_address, parse_port, subnet_address, ParseContext};
use crate::cisco::registry::Registration;

inventory::submit! { Registration::new("object-group", CommandKind::ObjectGroup) }
inventory::submit! { Registration::new("network-object", CommandKind::NetworkObject) }
inventory::submit! { Registration::new("service-object", CommandKind::ServiceObject) }
inventory::submit! { Registration::new("port-object", CommandKind::PortObject) }
inventory::submit! { Registration::new("protocol-object", CommandKind::ProtocolObject) }
inventory::submit! { Registration::new("icmp-object", CommandKind::IcmpObject) }
inventory::submit! { Registration::new("group-object", CommandKind::GroupObject) }

pub(super) fn parse(cmd: &mut Command, ctx: &mut ParseContext<'_>) {
    let member = match cmd.kind {
        CommandKind::ObjectGroup => {
            parse_group(cmd);
            return;
        }
        CommandKind::NetworkObject => parse_network_member(cmd, ctx),
        CommandKind::ServiceObject => {
            if cmd.word(1) == "object" {
                Some(GroupMember::Object(cmd.word(2).to_string()))
            } else {
                parse_service_spec(cmd, 1, ctx).map(GroupMember::Service)
            }
        }
        CommandKind::PortObject => {
            let (port, used) = parse_port(cmd, 1, ctx);
            (used > 0).then_some(GroupMember::Port(port))
        }
        CommandKind::ProtocolObject => Some(GroupMember::Protocol(cmd.word(1).to_string())),
        CommandKind::IcmpObject => Some(GroupMember::IcmpType(
            ctx.known.cisco_icmp_type(cmd.word(1)),
        )),
        CommandKind::GroupObject => Some(GroupMember::Group(cmd.word(1).to_string())),
        _ => None,
    };
    if let Some(member) = member {
        cmd.data = CommandData::Member(member);
    }
}

// object-group network|service|protocol|icmp-type <name> [tcp|udp|tcp-udp]
fn parse_group(cmd: &mut Command) {
    cmd.declared_id = Some(cmd.word(2).to_string());
    let group_type = match cmd.word(1) {
        "network" => GroupType::Network,
        "service" => GroupType::Service {
            protocol: Some(cmd.word(3))
                .filter(|proto| !proto.is_empty())
                .map(str::to_string),
        },
        "protocol" => GroupType::Protocol,
        "icmp-type" => GroupType::IcmpType,
        other => {
            let message = format!("Unrecognized group type ({other})");
            cmd.manual(message);
            return;
        }
    };

    let mut members = Vec::new();
    let mut description = String::new();
    for child in &cmd.children {
        match &child.data {
            CommandData::Member(member) => members.push(member.clone()),
            CommandData::Description { text } => description = text.clone(),
            _ => {}
        }
    }
    cmd.description = description;
    cmd.data = CommandData::ObjectGroup(GroupDef {
        group_type,
        members,
    });
}

// network-object host <ip> | object <name> | <ip> <mask>
fn parse_network_member(cmd: &mut Command, ctx: &ParseContext<'_>) -> Option<GroupMember> {
    let first = cmd.word(1).to_string();
    let second = cmd.word(2).to_string();
    let member = match first.as_str() {
        "host" => GroupMember::Address(host_address(cmd, &second, ctx)),
        "object" => GroupMember::Object(second),
        _ if first.contains(':') => {
            cmd.informative(format!("IPv6 network ({first}) is not converted"));
            return None;
        }
        _ => GroupMember::Address(subnet_address(cmd, &first, &second, ctx)),
    };
    Some(member)
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::cisco::command::{Address, Command, CommandData, GroupMember, GroupType, PortMatch};
    use crate::cisco::commands::test_support::command;
    use crate::cisco::commands::ParseContext;
    use crate::known_values::default_known_values;

    fn parsed(ctx: &mut ParseContext<'_>, line: &str) -> Command {
        let mut cmd = command(line);
        parse(&mut cmd, ctx);
        cmd
    }

    #[test]
    fn network_group_collects_members() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        ctx.symbols.add_alias("mail-srv", "10.1.1.20");

        let mut group = command("object-group network grp-servers");
        group.children = vec![
            parsed(&mut ctx, "network-object object obj-web"),
            parsed(&mut ctx, "network-object host mail-srv"),
            parsed(&mut ctx, "network-object 10.1.3.0 255.255.255.0"),
            parsed(&mut ctx, "group-object grp-other"),
        ];
        parse(&mut group, &mut ctx);

        assert_eq!(group.declared_id.as_deref(), Some("grp-servers"));
        let CommandData::ObjectGroup(def) = &group.data else {
            panic!("unexpected {:?}", group.data);
        };
        assert_eq!(def.group_type, GroupType::Network);
        assert_eq!(
            def.members,
            vec![
                GroupMember::Object("obj-web".to_string()),
                GroupMember::Address(Address::Host {
                    ip: "10.1.1.20".to_string(),
                    alias: Some("mail-srv".to_string())
                }),
                GroupMember::Address(Address::Subnet {
                    ip: "10.1.3.0".to_string(),
                    mask: "255.255.255.0".to_string()
                }),
                GroupMember::Group("grp-other".to_string()),
            ]
        );
    }

    #[test]
    fn service_group_keeps_port_protocol() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        let mut group = command("object-group service grp-web-ports tcp");
        group.children = vec![
            parsed(&mut ctx, "port-object eq www"),
            parsed(&mut ctx, "port-object range 8000 8100"),
        ];
        parse(&mut group, &mut ctx);

        let CommandData::ObjectGroup(def) = &group.data else {
            panic!("unexpected {:?}", group.data);
        };
        assert_eq!(
            def.group_type,
            GroupType::Service {
                protocol: Some("tcp".to_string())
            }
        );
        assert_eq!(def.members[0], GroupMember::Port(PortMatch::Eq("80".to_string())));
        assert_eq!(
            def.members[1],
            GroupMember::Port(PortMatch::Range("8000".to_string(), "8100".to_string()))
        );
    }

    #[test]
    fn icmp_members_use_type_numbers() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        let cmd = parsed(&mut ctx, "icmp-object echo-reply");
        assert_eq!(cmd.data, CommandData::Member(GroupMember::IcmpType("0".to_string())));
    }

    #[test]
    fn unknown_group_type_is_manual() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        let cmd = parsed(&mut ctx, "object-group user admins");
        assert_eq!(
            cmd.incident.expect("incident").message,
            "Unrecognized group type (user)"
        );
    }
}
