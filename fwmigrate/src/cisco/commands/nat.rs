use crate::cisco::command::{Command, CommandData, CommandKind, NatDef, NatMode, NatPair};
use crate::cisco::commands::ParseContext;
use crate::cisco::registry::Registration;
use crate::netaddr::is_valid_ipv4;

inventory::submit! { Registration::new("nat", CommandKind::Nat) }

pub(super) fn parse(cmd: &mut Command, ctx: &mut ParseContext<'_>) {
    if cmd.parent_id.is_some() {
        parse_object_nat(cmd, ctx);
    } else {
        parse_twice_nat(cmd);
    }
}

/// Split `(real,mapped)` into its interface names.
fn interfaces(word: &str) -> (Option<String>, Option<String>) {
    let inner = word.trim_start_matches('(').trim_end_matches(')');
    let mut parts = inner.splitn(2, ',');
    let pick = |part: Option<&str>| {
        part.map(str::trim)
            .filter(|name| !name.is_empty() && *name != "any")
            .map(str::to_string)
    };
    let real = pick(parts.next());
    let mapped = pick(parts.next());
    (real, mapped)
}

fn mode(word: &str) -> Option<NatMode> {
    match word {
        "static" => Some(NatMode::Static),
        "dynamic" => Some(NatMode::Dynamic),
        _ => None,
    }
}

fn empty_nat(real_interface: Option<String>, mapped_interface: Option<String>, mode: NatMode) -> NatDef {
    NatDef {
        real_interface,
        mapped_interface,
        mode,
        mapped: String::new(),
        source: None,
        destination: None,
        service: None,
        twice: false,
        after_auto: false,
        unidirectional: false,
        inactive: false,
        interface_fallback: false,
    }
}

// nat (real,mapped) static <ip|object|interface> [service tcp|udp <real> <mapped>]
// nat (real,mapped) dynamic <ip|object|interface> [interface]
fn parse_object_nat(cmd: &mut Command, ctx: &ParseContext<'_>) {
    let (real_interface, mapped_interface) = interfaces(cmd.word(1));
    let Some(nat_mode) = mode(cmd.word(2)) else {
        let message = format!("Unrecognized NAT type ({})", cmd.word(2));
        cmd.manual(message);
        return;
    };

    let mut def = empty_nat(real_interface, mapped_interface, nat_mode);
    let mapped = cmd.word(3).to_string();
    def.mapped = ctx.symbols.dealias(&mapped).to_string();
    if def.mapped != "interface" && !is_valid_ipv4(&def.mapped) && !ctx.symbols.contains(&mapped) {
        cmd.manual(format!(
            "IPv4 address was expected, but '{mapped}' was found."
        ));
    }

    match nat_mode {
        NatMode::Static => {
            if let Some(pos) = cmd.position_of("service") {
                def.service = Some((
                    cmd.word(pos + 1).to_string(),
                    ctx.known.cisco_port(cmd.word(pos + 2)),
                    ctx.known.cisco_port(cmd.word(pos + 3)),
                ));
            }
        }
        NatMode::Dynamic => {
            if mapped != "interface" && cmd.words_from(4).iter().any(|word| word == "interface") {
                def.interface_fallback = true;
                cmd.informative("Interface fall-back for dynamic object NAT is not supported");
            }
        }
    }
    cmd.data = CommandData::Nat(def);
}

// nat (real,mapped) [after-auto|after-object] source static|dynamic <real> <mapped>
//     [destination static <mapped> <real>] [service <real> <mapped>] [unidirectional] [inactive]
fn parse_twice_nat(cmd: &mut Command) {
    let (real_interface, mapped_interface) = interfaces(cmd.word(1));
    let Some(source_pos) = cmd.position_of("source") else {
        let message = format!("Unrecognized NAT command ({})", cmd.words_from(1).join(" "));
        cmd.manual(message);
        return;
    };
    let Some(source_mode) = mode(cmd.word(source_pos + 1)) else {
        let message = format!("Unrecognized NAT type ({})", cmd.word(source_pos + 1));
        cmd.manual(message);
        return;
    };

    let mut def = empty_nat(real_interface, mapped_interface, source_mode);
    def.twice = true;
    def.after_auto = matches!(cmd.word(2), "after-auto" | "after-object");
    def.source = Some(NatPair {
        mode: source_mode,
        real: cmd.word(source_pos + 2).to_string(),
        mapped: cmd.word(source_pos + 3).to_string(),
    });
    def.mapped = cmd.word(source_pos + 3).to_string();

    if let Some(pos) = cmd.position_of("destination") {
        match mode(cmd.word(pos + 1)) {
            Some(NatMode::Static) => {
                def.destination = Some(NatPair {
                    mode: NatMode::Static,
                    real: cmd.word(pos + 2).to_string(),
                    mapped: cmd.word(pos + 3).to_string(),
                });
            }
            _ => cmd.manual("Not handling NAT with dynamic destination"),
        }
    }
    if let Some(pos) = cmd.position_of("service") {
        def.service = Some((
            String::new(),
            cmd.word(pos + 1).to_string(),
            cmd.word(pos + 2).to_string(),
        ));
    }
    def.unidirectional = cmd.position_of("unidirectional").is_some();
    def.inactive = cmd.position_of("inactive").is_some();
    cmd.data = CommandData::Nat(def);
}
