use crate::cisco::command::{
    Address, Command, CommandData, CommandKind, InterfaceDef, ObjectDef, RouteDef,
};
use crate::cisco::commands::{ParseContext, PLACEHOLDER_HOST};
use crate::cisco::registry::Registration;
use crate::netaddr::{is_valid_ipv4, is_valid_netmask, network_of};
use crate::symbols::Resolved;

inventory::submit! { Registration::new("interface", CommandKind::Interface) }
inventory::submit! { Registration::new("nameif", CommandKind::Nameif) }
inventory::submit! { Registration::new("security-level", CommandKind::SecurityLevel) }
inventory::submit! { Registration::new("vlan", CommandKind::Vlan) }
inventory::submit! { Registration::new("ip address", CommandKind::IpAddress) }
inventory::submit! { Registration::new("shutdown", CommandKind::Shutdown) }
inventory::submit! { Registration::new("management-only", CommandKind::ManagementOnly) }
inventory::submit! { Registration::new("route", CommandKind::Route) }

const HOST_MASK: &str = "255.255.255.255";
const DEFAULT_ROUTE: &str = "0.0.0.0";

pub(super) fn parse(cmd: &mut Command, ctx: &mut ParseContext<'_>) {
    match cmd.kind {
        CommandKind::Interface => parse_interface(cmd),
        CommandKind::Nameif => {
            cmd.data = CommandData::Nameif {
                name: cmd.word(1).to_string(),
            };
        }
        CommandKind::SecurityLevel => match cmd.word(1).parse::<u8>() {
            Ok(level) if level <= 100 => cmd.data = CommandData::SecurityLevel { level },
            _ => {
                let message = format!("Invalid security level ({})", cmd.word(1));
                cmd.manual(message);
            }
        },
        CommandKind::Vlan => {
            cmd.data = CommandData::Vlan {
                id: cmd.word(1).to_string(),
            };
        }
        CommandKind::IpAddress => parse_ip_address(cmd),
        CommandKind::Shutdown | CommandKind::ManagementOnly => cmd.data = CommandData::Flag,
        CommandKind::Route => parse_route(cmd, ctx),
        _ => {}
    }
}

// ip address <ip> <mask> [standby <ip>]
fn parse_ip_address(cmd: &mut Command) {
    let ip = cmd.word(2).to_string();
    let mask = cmd.word(3).to_string();
    if ip == "dhcp" {
        cmd.informative("Interface address is assigned by DHCP");
        return;
    }
    if is_valid_ipv4(&ip) && is_valid_netmask(&mask) {
        cmd.data = CommandData::IpAddress { ip, mask };
    } else {
        cmd.manual(format!("Invalid IP subnet ({ip}/{mask})."));
    }
}

fn parse_interface(cmd: &mut Command) {
    let mut def = InterfaceDef {
        hardware: cmd.word(1).to_string(),
        ..InterfaceDef::default()
    };
    let mut description = String::new();
    for child in &cmd.children {
        match &child.data {
            CommandData::Nameif { name } => def.name = Some(name.clone()),
            CommandData::SecurityLevel { level } => def.security_level = Some(*level),
            CommandData::Vlan { id } => def.vlan = Some(id.clone()),
            CommandData::IpAddress { ip, mask } => {
                def.ip = Some(ip.clone());
                def.mask = Some(mask.clone());
                if let Some(network) = network_of(ip, mask) {
                    def.topology.push((network, mask.clone()));
                }
            }
            CommandData::Description { text } => description = text.clone(),
            CommandData::Flag => match child.kind {
                CommandKind::Shutdown => def.shutdown = true,
                CommandKind::ManagementOnly => def.management_only = true,
                _ => {}
            },
            _ => {}
        }
    }

    cmd.declared_id = def.name.as_ref().map(|name| format!("Interface_{name}"));
    cmd.description = description;
    cmd.data = CommandData::Interface(def);
}

// route <interface> <destination> <mask> <gateway> [distance]
fn parse_route(cmd: &mut Command, ctx: &ParseContext<'_>) {
    let interface = cmd.word(1).to_string();
    let dest_text = cmd.word(2).to_string();
    let mut mask = cmd.word(3).to_string();
    let gateway_text = cmd.word(4).to_string();

    let mut destination = match ctx.symbols.resolve(&dest_text) {
        Resolved::Id(symbol) => match &symbol.data {
            CommandData::Object(ObjectDef {
                address: Some(Address::Host { ip, .. }),
                ..
            }) => {
                mask = HOST_MASK.to_string();
                ip.clone()
            }
            CommandData::Object(ObjectDef {
                address: Some(Address::Subnet { ip, mask: net_mask }),
                ..
            }) => {
                mask = net_mask.clone();
                ip.clone()
            }
            _ => dest_text.clone(),
        },
        Resolved::Literal(literal) => literal,
        Resolved::Unresolved => dest_text.clone(),
    };
    if !is_valid_ipv4(&destination) || !is_valid_netmask(&mask) {
        cmd.manual(format!(
            "Cannot resolve route destination IP address ({dest_text}). Using IP {PLACEHOLDER_HOST}."
        ));
        destination = PLACEHOLDER_HOST.to_string();
        mask = HOST_MASK.to_string();
    }

    let mut gateway = ctx.symbols.dealias(&gateway_text).to_string();
    if !is_valid_ipv4(&gateway) {
        cmd.manual(format!(
            "Invalid IP address ({gateway_text}). Using IP {PLACEHOLDER_HOST}."
        ));
        gateway = PLACEHOLDER_HOST.to_string();
    }

    let distance = Some(cmd.word(5))
        .filter(|word| !word.is_empty())
        .map(str::to_string);
    let is_default = destination == DEFAULT_ROUTE && mask == DEFAULT_ROUTE;
    cmd.data = CommandData::Route(RouteDef {
        interface,
        destination,
        mask,
        gateway,
        distance,
        is_default,
    });
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::cisco::command::{Command, CommandData, InterfaceDef, RouteDef};
    use crate::cisco::commands::test_support::command;
    use crate::cisco::commands::ParseContext;
    use crate::incident::Severity;
    use crate::known_values::default_known_values;

    fn parsed(ctx: &mut ParseContext<'_>, line: &str) -> Command {
        let mut cmd = command(line);
        parse(&mut cmd, ctx);
        cmd
    }

    fn route(cmd: &Command) -> &RouteDef {
        match &cmd.data {
            CommandData::Route(def) => def,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn interface_reads_children() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        let mut iface = command("interface GigabitEthernet0/1");
        iface.children = vec![
            parsed(&mut ctx, "nameif inside"),
            parsed(&mut ctx, "security-level 100"),
            parsed(&mut ctx, "ip address 10.1.1.1 255.255.255.0"),
            parsed(&mut ctx, "management-only"),
        ];
        parse(&mut iface, &mut ctx);

        assert_eq!(iface.declared_id.as_deref(), Some("Interface_inside"));
        let CommandData::Interface(def) = &iface.data else {
            panic!("unexpected {:?}", iface.data);
        };
        assert_eq!(
            def,
            &InterfaceDef {
                hardware: "GigabitEthernet0/1".to_string(),
                name: Some("inside".to_string()),
                security_level: Some(100),
                ip: Some("10.1.1.1".to_string()),
                mask: Some("255.255.255.0".to_string()),
                management_only: true,
                topology: vec![("10.1.1.0".to_string(), "255.255.255.0".to_string())],
                ..InterfaceDef::default()
            }
        );
    }

    #[test]
    fn invalid_interface_address_is_manual() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        let cmd = parsed(&mut ctx, "ip address 10.1.1.300 255.255.255.0");
        assert_eq!(cmd.data, CommandData::None);
        assert_eq!(
            cmd.incident.expect("incident").message,
            "Invalid IP subnet (10.1.1.300/255.255.255.0)."
        );
    }

    #[test]
    fn default_route_is_detected() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        let cmd = parsed(&mut ctx, "route outside 0.0.0.0 0.0.0.0 203.0.113.1 1");
        let def = route(&cmd);
        assert!(def.is_default);
        assert_eq!(def.distance.as_deref(), Some("1"));
        assert!(cmd.incident.is_none());
    }

    #[test]
    fn unresolvable_route_destination_uses_placeholder() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        let cmd = parsed(&mut ctx, "route inside unknown-net 255.255.255.0 10.1.1.254 1");
        let def = route(&cmd);
        assert_eq!(def.destination, "1.1.1.1");
        assert_eq!(def.mask, "255.255.255.255");
        assert!(!def.is_default);

        let incident = cmd.incident.expect("incident");
        assert_eq!(incident.severity, Severity::ManualActionRequired);
        assert_eq!(
            incident.message,
            "Cannot resolve route destination IP address (unknown-net). Using IP 1.1.1.1."
        );
    }

    #[test]
    fn aliased_route_destination_resolves() {
        let known = default_known_values();
        let mut ctx = ParseContext::new(&known, false);
        ctx.symbols.add_alias("branch", "10.50.0.0");
        let cmd = parsed(&mut ctx, "route inside branch 255.255.0.0 10.1.1.254");
        assert_eq!(route(&cmd).destination, "10.50.0.0");
        assert!(cmd.incident.is_none());
    }
}
