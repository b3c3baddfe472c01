use crate::cisco::command::{
    Address, Command, CommandData, CommandKind, ObjectDef, ObjectType, PortMatch, Protocol,
    ServiceSpec,
};
use crate::cisco::commands::{
    host_address, parse_port, parse_protocol, subnet_address, ParseContext,
    PLACEHOLDER_RANGE_FROM, PLACEHOLDER_RANGE_TO,
};
use crate::cisco::registry::Registration;
use crate::netaddr::is_valid_ipv4;

inventory::submit! { Registration::new("object", CommandKind::Object) }
inventory::submit! { Registration::new("host", CommandKind::Host) }
inventory::submit! { Registration::new("subnet", CommandKind::Subnet) }
inventory::submit! { Registration::new("range", CommandKind::Range) }
inventory::submit! { Registration::new("fqdn", CommandKind::Fqdn) }
inventory::submit! { Registration::new("service", CommandKind::Service) }

pub(super) fn parse(cmd: &mut Command, ctx: &mut ParseContext<'_>) {
    match cmd.kind {
        CommandKind::Object => parse_object(cmd),
        CommandKind::Host => {
            let text = cmd.word(1).to_string();
            cmd.data = CommandData::Address(host_address(cmd, &text, ctx));
        }
        CommandKind::Subnet => {
            let ip = cmd.word(1).to_string();
            let mask = cmd.word(2).to_string();
            cmd.data = CommandData::Address(subnet_address(cmd, &ip, &mask, ctx));
        }
        CommandKind::Range => parse_range(cmd, ctx),
        CommandKind::Fqdn => {
            let fqdn = match cmd.word(1) {
                "v4" | "v6" => cmd.word(2),
                other => other,
            };
            cmd.data = CommandData::Address(Address::Fqdn {
                fqdn: fqdn.to_string(),
            });
        }
        CommandKind::Service => {
            if let Some(spec) = parse_service_spec(cmd, 1, ctx) {
                cmd.data = CommandData::Service(spec);
            }
        }
        _ => {}
    }
}

// object network|service <name>
fn parse_object(cmd: &mut Command) {
    cmd.declared_id = Some(cmd.word(2).to_string());
    let object_type = match cmd.word(1) {
        "network" => ObjectType::Network,
        "service" => ObjectType::Service,
        other => {
            let message = format!("Unrecognized object type ({other})");
            cmd.manual(message);
            return;
        }
    };

    let mut def = ObjectDef {
        object_type,
        address: None,
        service: None,
        nat: None,
    };
    let mut extra_address = false;
    let mut description = String::new();
    for child in &cmd.children {
        match &child.data {
            CommandData::Address(address) => {
                if def.address.is_none() {
                    def.address = Some(address.clone());
                } else {
                    extra_address = true;
                }
            }
            CommandData::Service(spec) => def.service = Some(spec.clone()),
            CommandData::Nat(nat) => def.nat = Some(nat.clone()),
            CommandData::Description { text } => description = text.clone(),
            _ => {}
        }
    }

    if extra_address {
        cmd.manual("An Object (network) can only hold one fqdn, host, range or subnet");
    }
    cmd.description = description;
    cmd.data = CommandData::Object(def);
}

fn parse_range(cmd: &mut Command, ctx: &ParseContext<'_>) {
    let from = ctx.symbols.dealias(cmd.word(1)).to_string();
    let to = ctx.symbols.dealias(cmd.word(2)).to_string();
    let address = if is_valid_ipv4(&from) && is_valid_ipv4(&to) {
        Address::Range { from, to }
    } else {
        cmd.manual(format!(
            "Invalid IP range ({}-{}). Using IP range {PLACEHOLDER_RANGE_FROM}-{PLACEHOLDER_RANGE_TO}.",
            cmd.word(1),
            cmd.word(2)
        ));
        Address::Range {
            from: PLACEHOLDER_RANGE_FROM.to_string(),
            to: PLACEHOLDER_RANGE_TO.to_string(),
        }
    };
    cmd.data = CommandData::Address(address);
}

/// Parse `<protocol> [source <port>] [destination <port>]`, `<protocol> <port>`,
/// or `icmp <type>` starting at `pos`.
pub(super) fn parse_service_spec(
    cmd: &mut Command,
    pos: usize,
    ctx: &ParseContext<'_>,
) -> Option<ServiceSpec> {
    let word = cmd.word(pos).to_string();
    let Some(protocol) = parse_protocol(&word, ctx.known) else {
        cmd.manual(format!("Unrecognized service protocol ({word})"));
        return None;
    };

    let mut spec = ServiceSpec::new(protocol);
    match spec.protocol {
        Protocol::Icmp | Protocol::Icmp6 => {
            let icmp = cmd.word(pos + 1);
            if !icmp.is_empty() {
                spec.icmp_type = Some(ctx.known.cisco_icmp_type(icmp));
            }
        }
        Protocol::Tcp | Protocol::Udp | Protocol::TcpUdp | Protocol::Sctp => {
            let mut at = pos + 1;
            while at < cmd.word_count() {
                match cmd.word(at) {
                    "source" => {
                        let (port, used) = parse_port(cmd, at + 1, ctx);
                        spec.source = port;
                        at += used + 1;
                    }
                    "destination" => {
                        let (port, used) = parse_port(cmd, at + 1, ctx);
                        spec.destination = port;
                        at += used + 1;
                    }
                    _ => {
                        let (port, used) = parse_port(cmd, at, ctx);
                        if used == 0 {
                            break;
                        }
                        spec.destination = port;
                        at += used;
                    }
                }
            }
        }
        _ => {}
    }

    if !spec.source.is_any() && !spec.destination.is_any() {
        cmd.informative(
            "Cannot convert a service defined as both source service and destination service. Ignoring source service.",
        );
        spec.source = PortMatch::Any;
    }
    Some(spec)
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::cisco::command::{
        Address, Command, CommandData, ObjectType, PortMatch, Protocol,
    };
    use crate::cisco::commands::test_support::command;
    use crate::cisco::commands::ParseContext;
    use crate::known_values::default_known_values;

    fn parsed(ctx: &mut ParseContext<'_>, line: &str) -> Command {
        let mut cmd = command(line);
        parse(&mut cmd, ctx);
        cmd
    }

    #[test]
    fn object_collects_child_address_and_description() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        let mut object = command("object network obj-web");
        object.children = vec![
            parsed(&mut ctx, "host 10.1.1.10"),
            parsed(&mut ctx, "description web frontend"),
        ];
        object.children[1].data = CommandData::Description {
            text: "web frontend".to_string(),
        };
        parse(&mut object, &mut ctx);

        assert_eq!(object.declared_id.as_deref(), Some("obj-web"));
        assert_eq!(object.description, "web frontend");
        match &object.data {
            CommandData::Object(def) => {
                assert_eq!(def.object_type, ObjectType::Network);
                assert_eq!(
                    def.address,
                    Some(Address::Host {
                        ip: "10.1.1.10".to_string(),
                        alias: None
                    })
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn second_address_is_flagged() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        let mut object = command("object network obj-two");
        object.children = vec![
            parsed(&mut ctx, "host 10.1.1.10"),
            parsed(&mut ctx, "subnet 10.1.1.0 255.255.255.0"),
        ];
        parse(&mut object, &mut ctx);
        assert_eq!(
            object.incident.expect("incident").message,
            "An Object (network) can only hold one fqdn, host, range or subnet"
        );
    }

    #[test]
    fn service_with_destination_port() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        let cmd = parsed(&mut ctx, "service tcp destination eq 8080");
        match cmd.data {
            CommandData::Service(spec) => {
                assert_eq!(spec.protocol, Protocol::Tcp);
                assert_eq!(spec.destination, PortMatch::Eq("8080".to_string()));
                assert!(spec.source.is_any());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn service_with_both_ports_keeps_destination() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        let cmd = parsed(&mut ctx, "service udp source eq 53 destination eq domain");
        match &cmd.data {
            CommandData::Service(spec) => {
                assert!(spec.source.is_any());
                assert_eq!(spec.destination, PortMatch::Eq("53".to_string()));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(cmd.incident.is_some());
    }

    #[test]
    fn unknown_protocol_is_manual() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        let cmd = parsed(&mut ctx, "service carrier-pigeon");
        assert_eq!(cmd.data, CommandData::None);
        assert_eq!(
            cmd.incident.expect("incident").message,
            "Unrecognized service protocol (carrier-pigeon)"
        );
    }

    #[test]
    fn invalid_range_uses_placeholder() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        let cmd = parsed(&mut ctx, "range 10.1.2.20 nowhere");
        assert_eq!(
            cmd.data,
            CommandData::Address(Address::Range {
                from: "0.0.0.0".to_string(),
                to: "255.255.255.255".to_string()
            })
        );
    }
}
