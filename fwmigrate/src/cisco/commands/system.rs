use crate::cisco::command::{Command, CommandData, CommandKind};
use crate::cisco::commands::{subnet_address, ParseContext, PLACEHOLDER_HOST};
use crate::cisco::registry::Registration;
use crate::netaddr::is_valid_ipv4;

inventory::submit! { Registration::new("ASA", CommandKind::AsaVersion) }
inventory::submit! { Registration::new("hostname", CommandKind::Hostname) }
inventory::submit! { Registration::new("name", CommandKind::Name) }
inventory::submit! { Registration::new("description", CommandKind::Description) }
inventory::submit! { Registration::new("ssh", CommandKind::Ssh) }
inventory::submit! { Registration::new("same-security-traffic", CommandKind::SameSecurityTraffic) }
inventory::submit! { Registration::new("ip verify reverse-path interface", CommandKind::IpVerifyReversePath) }

pub(super) fn parse(cmd: &mut Command, ctx: &mut ParseContext<'_>) {
    match cmd.kind {
        CommandKind::AsaVersion => {
            cmd.data = CommandData::Version {
                version: cmd.words_from(2).join(" "),
            };
        }
        CommandKind::Hostname => {
            cmd.data = CommandData::Hostname {
                name: cmd.word(1).to_string(),
            };
        }
        CommandKind::Name => parse_alias(cmd, ctx),
        CommandKind::Description => {
            cmd.data = CommandData::Description {
                text: cmd.words_from(1).join(" "),
            };
        }
        CommandKind::Ssh => parse_ssh(cmd, ctx),
        CommandKind::SameSecurityTraffic => {
            cmd.data = CommandData::SameSecurity {
                scope: cmd.word(2).to_string(),
            };
        }
        CommandKind::IpVerifyReversePath => {
            cmd.data = CommandData::ReversePath {
                interface: cmd.word(4).to_string(),
            };
        }
        _ => {}
    }
}

// name <ip> <alias> [description <text>]
fn parse_alias(cmd: &mut Command, ctx: &mut ParseContext<'_>) {
    let mut literal = cmd.word(1).to_string();
    let alias = cmd.word(2).to_string();
    let description = cmd
        .position_of("description")
        .map(|pos| cmd.words_from(pos + 1).join(" "))
        .unwrap_or_default();

    if !is_valid_ipv4(&literal) {
        cmd.manual(format!(
            "Invalid IP address ({literal}). Using IP {PLACEHOLDER_HOST}."
        ));
        literal = PLACEHOLDER_HOST.to_string();
    }
    ctx.symbols.add_alias(&alias, &literal);
    cmd.data = CommandData::Alias {
        literal,
        alias,
        description,
    };
}

// ssh <ip> <mask> <interface>; other ssh settings carry no address.
fn parse_ssh(cmd: &mut Command, ctx: &ParseContext<'_>) {
    if cmd.word_count() != 4 {
        return;
    }
    let ip = cmd.word(1).to_string();
    let mask = cmd.word(2).to_string();
    let address = subnet_address(cmd, &ip, &mask, ctx);
    cmd.data = CommandData::Ssh {
        address,
        interface: cmd.word(3).to_string(),
    };
}
