//! ASA commands to repository objects, access layers, and NAT rules.
//!
//! Every access-list bound inbound (or globally) becomes one sub-policy layer;
//! the parent layer jumps into it from the zone of the bound interface.
//! Operands written inline in an ACE become inline objects named after their
//! value, and inline services collapse onto predefined services when the
//! known-value tables list them.

use std::collections::HashMap;

use crate::cisco::command::{
    AccessGroupDef, AclAction, AclEntry, Address, Command, CommandData, CommandKind, Direction,
    GroupDef, GroupMember, GroupType, NatDef, NatMode, ObjectDef, ObjectType, PortMatch,
    Protocol, ServiceSpec,
};
use crate::cisco::commands::parse_protocol;
use crate::cisco::CiscoConfig;
use crate::incident::{heavier, Incident, Severity};
use crate::known_values::KnownValues;
use crate::model::{
    safe_comments, safe_name, Action, CpObject, Layer, NatMethod, NatRule, ObjectKind, Package,
    Rule, ANY,
};
use crate::model::repository::ICMP_PROTO;
use crate::netaddr::{is_valid_ipv4, mask_length};
use crate::options::{ConvertOptions, Dialect};
use crate::symbols::{expand_group, Member};
use crate::translate::context::TranslationContext;
use crate::translate::{finish_layer, push_unique, Conversion};

const DEFAULT_PACKAGE: &str = "fwmigrate";
const ALL_PORTS: &str = "1-65535";

/// Translate a parsed ASA configuration.
pub fn translate(config: &CiscoConfig, known: &KnownValues, options: &ConvertOptions) -> Conversion {
    let mut translator = Translator {
        config,
        ctx: TranslationContext::new(known),
        groups: HashMap::new(),
    };
    translator.ctx.extend_incidents(config.incidents());

    translator.interfaces();
    translator.objects();
    translator.time_ranges();
    translator.groups();

    let name = options
        .package_name
        .clone()
        .or_else(|| config.hostname.clone())
        .unwrap_or_else(|| DEFAULT_PACKAGE.to_string());
    let mut package = Package::new(safe_name(&name));
    let rules_before = translator.access_policy(&mut package, options);
    translator.nat(&mut package);

    let (repository, incidents) = translator.ctx.into_parts();
    tracing::info!(
        package = %package.name,
        objects = repository.user_objects().len(),
        rules = package.total_rules(),
        "translated ASA configuration"
    );
    Conversion {
        context: config.hostname.clone().unwrap_or_else(|| name.clone()),
        dialect: Dialect::Asa,
        version: config.version.clone(),
        repository,
        package,
        incidents,
        rules_before,
    }
}

/// One service operand, either a name to reference or an inline service.
enum ServicePart {
    Named(String),
    Inline {
        proto: &'static str,
        value: String,
        kind: ObjectKind,
    },
}

struct Translator<'c, 'k> {
    config: &'c CiscoConfig,
    ctx: TranslationContext<'k>,
    /// Object groups by declared name; the first declaration wins.
    groups: HashMap<String, (&'c Command, &'c GroupDef)>,
}

impl<'c, 'k> Translator<'c, 'k> {
    fn interfaces(&mut self) {
        for cmd in self.config.filter(CommandKind::Interface) {
            let CommandData::Interface(def) = &cmd.data else {
                continue;
            };
            let (Some(name), Some(declared)) = (def.name.as_deref(), cmd.declared_id.as_deref())
            else {
                continue;
            };
            let zone = self.ctx.claim_as(declared, name, cmd.line, cmd.id);
            let object = CpObject::new(zone, ObjectKind::Zone)
                .with_comments(safe_comments(&cmd.description))
                .with_origin(cmd.id, None);
            self.ctx.add(object);
        }
    }

    fn objects(&mut self) {
        let config = self.config;
        for cmd in config.commands.iter().filter(|cmd| cmd.kind == CommandKind::Object) {
            let (CommandData::Object(def), Some(name)) = (&cmd.data, cmd.declared_id.as_deref())
            else {
                continue;
            };
            if self.ctx.name_of(name).is_some() {
                continue;
            }
            match def.object_type {
                ObjectType::Network => self.network_object(cmd, name, def),
                ObjectType::Service => self.service_object(cmd, name, def),
            }
        }
    }

    fn network_object(&mut self, cmd: &Command, name: &str, def: &ObjectDef) {
        let kind = match &def.address {
            Some(Address::Host { ip, .. }) => ObjectKind::Host { ip: ip.clone() },
            Some(Address::Subnet { ip, mask }) => ObjectKind::Network {
                subnet: ip.clone(),
                netmask: mask.clone(),
            },
            Some(Address::Range { from, to }) => ObjectKind::Range {
                from: from.clone(),
                to: to.clone(),
            },
            Some(Address::Fqdn { fqdn }) => ObjectKind::Domain { fqdn: fqdn.clone() },
            Some(Address::Any | Address::Any6) => {
                self.ctx.alias_name(name, ANY);
                return;
            }
            Some(Address::Ref { .. }) | None => return,
        };
        let model = self.ctx.claim_name(name, cmd.line, cmd.id);
        let object = CpObject::new(model, kind)
            .with_comments(safe_comments(&cmd.description))
            .with_origin(cmd.id, cmd.incident.clone());
        self.ctx.add(object);
    }

    fn service_object(&mut self, cmd: &Command, name: &str, def: &ObjectDef) {
        let Some(spec) = &def.service else {
            return;
        };
        let mut parts = self.service_parts(spec, cmd);
        let object_kind = match parts.len() {
            0 => return,
            1 => match parts.remove(0) {
                ServicePart::Named(existing) => {
                    self.ctx.alias_name(name, &existing);
                    return;
                }
                ServicePart::Inline { kind, .. } => kind,
            },
            _ => {
                let members = self.materialize(parts);
                ObjectKind::ServiceGroup { members }
            }
        };
        let model = self.ctx.claim_name(name, cmd.line, cmd.id);
        let object = CpObject::new(model, object_kind)
            .with_comments(safe_comments(&cmd.description))
            .with_origin(cmd.id, cmd.incident.clone());
        self.ctx.add(object);
    }

    fn time_ranges(&mut self) {
        for cmd in self.config.filter(CommandKind::TimeRange) {
            let (CommandData::TimeRange(def), Some(name)) = (&cmd.data, cmd.declared_id.as_deref())
            else {
                continue;
            };
            if self.ctx.name_of(name).is_some() {
                continue;
            }
            let mut kind = ObjectKind::TimeWindow {
                start: def.start.clone(),
                end: def.end.clone(),
                recurrence: def.windows.clone(),
            };
            if def.windows.is_empty() && def.start.is_none() && def.end.is_none() {
                self.ctx.record(
                    cmd.line,
                    cmd.id,
                    &Incident::manual(format!(
                        "Time range {name} has no usable schedule. Using a one-day window."
                    )),
                );
                kind = ObjectKind::TimeWindow {
                    start: Some("01-Jan-2000 00:00".to_string()),
                    end: Some("02-Jan-2000 00:00".to_string()),
                    recurrence: Vec::new(),
                };
            }
            let model = self.ctx.claim_name(name, cmd.line, cmd.id);
            self.ctx
                .add(CpObject::new(model, kind).with_origin(cmd.id, cmd.incident.clone()));
        }
    }

    fn groups(&mut self) {
        let config = self.config;
        let mut ordered: Vec<(&Command, &GroupDef)> = Vec::new();
        for cmd in config.commands.iter().filter(|cmd| cmd.kind == CommandKind::ObjectGroup) {
            let (CommandData::ObjectGroup(def), Some(name)) = (&cmd.data, cmd.declared_id.as_deref())
            else {
                continue;
            };
            if self.groups.contains_key(name) || self.ctx.name_of(name).is_some() {
                continue;
            }
            self.groups.insert(name.to_string(), (cmd, def));
            ordered.push((cmd, def));
        }
        for (cmd, _) in &ordered {
            if let Some(name) = cmd.declared_id.as_deref() {
                self.ctx.claim_name(name, cmd.line, cmd.id);
            }
        }
        for (cmd, def) in ordered {
            self.group(cmd, def);
        }
    }

    /// Validate a group against every group it reaches, then add it with its direct members.
    fn group(&mut self, cmd: &Command, def: &GroupDef) {
        let Some(name) = cmd.declared_id.as_deref() else {
            return;
        };
        let expansion = expand_group(name, |member| {
            if let Some((_, group)) = self.groups.get(member) {
                return Some(Member::Group(referenced_names(group)));
            }
            self.ctx.existing(member).map(|_| Member::Leaf)
        });
        if !expansion.is_ok() {
            self.ctx.record(
                cmd.line,
                cmd.id,
                &Incident::manual(format!(
                    "Object group {name} was not converted: {}",
                    expansion.errors.join("; ")
                )),
            );
            return;
        }

        let mut members: Vec<String> = Vec::new();
        for member in &def.members {
            for model in self.group_member(cmd, &def.group_type, member) {
                push_unique(&mut members, model);
            }
        }
        let kind = match def.group_type {
            GroupType::Network => ObjectKind::NetworkGroup { members },
            _ => ObjectKind::ServiceGroup { members },
        };
        let model = self.ctx.claim_name(name, cmd.line, cmd.id);
        let object = CpObject::new(model, kind)
            .with_comments(safe_comments(&cmd.description))
            .with_origin(cmd.id, cmd.incident.clone());
        self.ctx.add(object);
    }

    fn group_member(&mut self, cmd: &Command, group_type: &GroupType, member: &GroupMember) -> Vec<String> {
        match member {
            GroupMember::Address(address) => vec![self.address_name(address, cmd)],
            GroupMember::Object(name) | GroupMember::Group(name) => self
                .ctx
                .name_of(name)
                .map(|model| vec![model.to_string()])
                .unwrap_or_default(),
            GroupMember::Port(port) => {
                let protocol = match group_type {
                    GroupType::Service { protocol: Some(p) } => p.as_str(),
                    _ => "tcp",
                };
                let protocol = match protocol {
                    "udp" => Protocol::Udp,
                    "tcp-udp" => Protocol::TcpUdp,
                    _ => Protocol::Tcp,
                };
                let spec = ServiceSpec {
                    destination: port.clone(),
                    ..ServiceSpec::new(protocol)
                };
                self.service_names(&spec, cmd)
            }
            GroupMember::Service(spec) => self.service_names(spec, cmd),
            GroupMember::Protocol(word) => {
                match parse_protocol(word, self.ctx.known) {
                    Some(protocol) => self.service_names(&ServiceSpec::new(protocol), cmd),
                    None => vec![self.ctx.unresolved_service(word, cmd.line, cmd.id)],
                }
            }
            GroupMember::IcmpType(icmp_type) => {
                let spec = ServiceSpec {
                    icmp_type: Some(icmp_type.clone()),
                    ..ServiceSpec::new(Protocol::Icmp)
                };
                self.service_names(&spec, cmd)
            }
        }
    }

    /// Model name for an address operand, creating inline objects as needed.
    fn address_name(&mut self, address: &Address, cmd: &Command) -> String {
        match address {
            Address::Any => ANY.to_string(),
            Address::Any6 => {
                self.ctx.record(
                    cmd.line,
                    cmd.id,
                    &Incident::informative("IPv6 address any6 was converted to any"),
                );
                ANY.to_string()
            }
            Address::Host { ip, alias: Some(alias) } => {
                self.ctx.alias_host(ip, alias, cmd.line, cmd.id)
            }
            Address::Host { ip, alias: None } => self.ctx.host(ip),
            Address::Subnet { ip, mask } => match mask_length(mask) {
                Some(32) => self.ctx.host(ip),
                Some(length) => self.ctx.ensure(CpObject::new(
                    format!("Net_{ip}_{length}"),
                    ObjectKind::Network {
                        subnet: ip.clone(),
                        netmask: mask.clone(),
                    },
                )),
                None => self.ctx.unresolved_network(&format!("{ip}/{mask}"), cmd.line, cmd.id),
            },
            Address::Range { from, to } => self.ctx.ensure(CpObject::new(
                format!("Range_{from}_{to}"),
                ObjectKind::Range {
                    from: from.clone(),
                    to: to.clone(),
                },
            )),
            Address::Fqdn { fqdn } => self.ctx.ensure(CpObject::new(
                safe_name(&format!("Domain_{fqdn}")),
                ObjectKind::Domain { fqdn: fqdn.clone() },
            )),
            Address::Ref { name } => match self.ctx.existing(name) {
                Some(model) => model.to_string(),
                None => self.ctx.unresolved_network(name, cmd.line, cmd.id),
            },
        }
    }

    fn service_names(&mut self, spec: &ServiceSpec, cmd: &Command) -> Vec<String> {
        let parts = self.service_parts(spec, cmd);
        self.materialize(parts)
    }

    fn materialize(&mut self, parts: Vec<ServicePart>) -> Vec<String> {
        let mut names = Vec::new();
        for part in parts {
            let name = match part {
                ServicePart::Named(name) => name,
                ServicePart::Inline { proto, value, kind } => match &kind {
                    ObjectKind::TcpService { source_port, .. }
                    | ObjectKind::UdpService { source_port, .. }
                        if !source_port.is_empty() =>
                    {
                        let name = safe_name(&format!("{proto}_{value}_src_{source_port}"));
                        self.ctx.ensure(CpObject::new(name, kind))
                    }
                    _ => self.ctx.service(proto, &value, kind),
                },
            };
            push_unique(&mut names, name);
        }
        if names.len() > 1 {
            names.retain(|name| name != ANY);
        }
        names
    }

    fn service_parts(&mut self, spec: &ServiceSpec, cmd: &Command) -> Vec<ServicePart> {
        match &spec.protocol {
            Protocol::Ip => vec![ServicePart::Named(ANY.to_string())],
            Protocol::Icmp | Protocol::Icmp6 => {
                if spec.protocol == Protocol::Icmp6 {
                    self.ctx.record(
                        cmd.line,
                        cmd.id,
                        &Incident::informative("ICMPv6 services were converted to icmp-proto"),
                    );
                    return vec![ServicePart::Named(ICMP_PROTO.to_string())];
                }
                if let PortMatch::Ref(name) = &spec.destination {
                    return vec![ServicePart::Named(self.resolve_service(name, cmd))];
                }
                match &spec.icmp_type {
                    Some(icmp_type) => vec![ServicePart::Inline {
                        proto: "ICMP",
                        value: icmp_type.clone(),
                        kind: ObjectKind::IcmpService {
                            icmp_type: icmp_type.clone(),
                            code: String::new(),
                        },
                    }],
                    None => vec![ServicePart::Named(ICMP_PROTO.to_string())],
                }
            }
            Protocol::Tcp => self.port_parts("TCP", spec, cmd),
            Protocol::Udp => self.port_parts("UDP", spec, cmd),
            Protocol::TcpUdp => {
                let mut parts = self.port_parts("TCP", spec, cmd);
                parts.extend(self.port_parts("UDP", spec, cmd));
                parts
            }
            Protocol::Sctp => self.port_parts("SCTP", spec, cmd),
            Protocol::Other { number, .. } => vec![ServicePart::Inline {
                proto: "OTHER",
                value: number.clone(),
                kind: ObjectKind::OtherService {
                    ip_protocol: number.clone(),
                },
            }],
            Protocol::Ref(name) => vec![ServicePart::Named(self.resolve_service(name, cmd))],
        }
    }

    fn port_parts(&mut self, proto: &'static str, spec: &ServiceSpec, cmd: &Command) -> Vec<ServicePart> {
        if let PortMatch::Ref(name) = &spec.destination {
            return vec![ServicePart::Named(self.resolve_service(name, cmd))];
        }
        let port = self
            .port_value(&spec.destination, cmd)
            .unwrap_or_else(|| ALL_PORTS.to_string());
        let source_port = self.port_value(&spec.source, cmd).unwrap_or_default();
        let kind = match proto {
            "UDP" => ObjectKind::UdpService {
                port: port.clone(),
                source_port,
            },
            "SCTP" => ObjectKind::SctpService { port: port.clone() },
            _ => ObjectKind::TcpService {
                port: port.clone(),
                source_port,
            },
        };
        vec![ServicePart::Inline {
            proto,
            value: port,
            kind,
        }]
    }

    /// Port string for a port operand; `None` means every port.
    fn port_value(&mut self, port: &PortMatch, cmd: &Command) -> Option<String> {
        match port {
            PortMatch::Any | PortMatch::Ref(_) => None,
            PortMatch::Eq(p) => Some(p.clone()),
            PortMatch::Lt(p) => Some(format!("<{p}")),
            PortMatch::Gt(p) => Some(format!(">{p}")),
            PortMatch::Range(from, to) if from == to => Some(from.clone()),
            PortMatch::Range(from, to) => Some(format!("{from}-{to}")),
            PortMatch::Neq(p) => {
                self.ctx.record(
                    cmd.line,
                    cmd.id,
                    &Incident::manual(format!(
                        "Port operator neq ({p}) cannot be converted. Using all ports."
                    )),
                );
                None
            }
        }
    }

    fn resolve_service(&mut self, name: &str, cmd: &Command) -> String {
        match self.ctx.existing(name) {
            Some(model) => model.to_string(),
            None => self.ctx.unresolved_service(name, cmd.line, cmd.id),
        }
    }

    fn time_name(&mut self, name: &str, cmd: &Command) -> Option<String> {
        if let Some(model) = self.ctx.existing(name) {
            return Some(model.to_string());
        }
        self.ctx.record(
            cmd.line,
            cmd.id,
            &Incident::manual(format!(
                "Cannot resolve time range ({name}). The rule is not time restricted."
            )),
        );
        None
    }

    /// Build the parent layer and one sub-policy per bound access-list.
    ///
    /// Returns the access rule count before optimization.
    fn access_policy(&mut self, package: &mut Package, options: &ConvertOptions) -> usize {
        let config = self.config;
        let mut built: HashMap<String, String> = HashMap::new();
        let mut rules_before = 0;

        for cmd in config.filter(CommandKind::AccessGroup) {
            let CommandData::AccessGroup(binding) = &cmd.data else {
                continue;
            };
            if binding.direction == Direction::Out {
                continue;
            }
            let layer_name = match built.get(&binding.acl) {
                Some(name) => name.clone(),
                None => {
                    let entries: Vec<(&Command, &AclEntry)> = config
                        .commands
                        .iter()
                        .filter_map(|entry_cmd| match &entry_cmd.data {
                            CommandData::AccessList(entry) if entry.acl == binding.acl => {
                                Some((entry_cmd, entry))
                            }
                            _ => None,
                        })
                        .collect();
                    if entries.is_empty() {
                        self.ctx.record(
                            cmd.line,
                            cmd.id,
                            &Incident::manual(format!(
                                "access-group references undefined access-list {}",
                                binding.acl
                            )),
                        );
                        continue;
                    }
                    let mut layer = Layer::new(safe_name(&binding.acl));
                    for (index, (entry_cmd, entry)) in entries.into_iter().enumerate() {
                        let rule = self.acl_rule(entry_cmd, entry, index + 1);
                        layer.push(rule);
                    }
                    let (layer, before) = finish_layer(layer, options);
                    rules_before += before;
                    tracing::debug!(layer = %layer.name, before, after = layer.rules.len(), "converted access-list");
                    let name = layer.name.clone();
                    package.sub_policies.push(layer);
                    built.insert(binding.acl.clone(), name.clone());
                    name
                }
            };
            let rule = self.binding_rule(cmd, binding, &layer_name);
            package.parent_layer.push(rule);
        }

        let parent_cleanup = Rule::cleanup(package.parent_layer.name.clone());
        package.parent_layer.push(parent_cleanup);
        rules_before + package.parent_layer.rules.len()
    }

    fn binding_rule(&mut self, cmd: &Command, binding: &AccessGroupDef, layer: &str) -> Rule {
        let mut rule = Rule::sub_policy(
            match &binding.interface {
                Some(iface) => format!("{} {iface}", binding.acl),
                None => format!("{} global", binding.acl),
            },
            layer,
        );
        if let Some(iface) = &binding.interface {
            let key = format!("Interface_{iface}");
            match self.ctx.existing(&key) {
                Some(zone) => rule.source = vec![zone.to_string()],
                None => {
                    self.ctx.record(
                        cmd.line,
                        cmd.id,
                        &Incident::manual(format!(
                            "access-group is bound to unknown interface {iface}"
                        )),
                    );
                }
            }
        }
        rule.converted_command_id = Some(cmd.id);
        rule
    }

    fn acl_rule(&mut self, cmd: &Command, entry: &AclEntry, number: usize) -> Rule {
        self.ctx.begin_entity();
        if let PortMatch::Ref(name) = &entry.service.source {
            self.ctx.record(
                cmd.line,
                cmd.id,
                &Incident::manual(format!(
                    "Cannot convert service object ({name}) used as source port. Using all source ports."
                )),
            );
        }
        let source = self.address_name(&entry.source, cmd);
        let destination = self.address_name(&entry.destination, cmd);
        let service = self.service_names(&entry.service, cmd);
        let time = entry
            .time_range
            .as_deref()
            .and_then(|name| self.time_name(name, cmd))
            .into_iter()
            .collect();
        let parsed = cmd
            .incident
            .clone()
            .filter(|incident| incident.severity != Severity::None);
        let incident = heavier(parsed, self.ctx.finish_entity());
        Rule {
            comments: safe_comments(&entry.remarks),
            conversion_comments: format!("access-list {} rule {number})", entry.acl),
            source: vec![source],
            destination: vec![destination],
            service,
            time,
            action: match entry.action {
                AclAction::Permit => Action::Accept,
                AclAction::Deny => Action::Drop,
            },
            enabled: !entry.inactive,
            incident,
            converted_command_id: Some(cmd.id),
            ..Rule::default()
        }
    }

    fn nat(&mut self, package: &mut Package) {
        let config = self.config;
        for cmd in &config.commands {
            match (&cmd.kind, &cmd.data) {
                (CommandKind::Object, CommandData::Object(def)) => {
                    let (Some(nat), Some(nat_cmd), Some(name)) = (
                        def.nat.as_ref(),
                        cmd.child(CommandKind::Nat),
                        cmd.declared_id.as_deref(),
                    ) else {
                        continue;
                    };
                    self.ctx.begin_entity();
                    let rule = self.object_nat(nat_cmd, name, nat);
                    let incident = self.ctx.finish_entity();
                    if let Some(mut rule) = rule {
                        rule.incident = heavier(rule.incident.take(), incident);
                        package.nat_rules.push(rule);
                    }
                }
                (CommandKind::Nat, CommandData::Nat(def)) if def.twice => {
                    self.ctx.record(
                        cmd.line,
                        cmd.id,
                        &Incident::manual("Twice NAT rules are not converted"),
                    );
                }
                _ => {}
            }
        }
    }

    fn object_nat(&mut self, cmd: &Command, object: &str, nat: &NatDef) -> Option<NatRule> {
        let Some(original) = self.ctx.existing(object).map(str::to_string) else {
            self.ctx.record(
                cmd.line,
                cmd.id,
                &Incident::manual(format!(
                    "NAT of object {object} was not converted because the object has no address"
                )),
            );
            return None;
        };
        let translated = if nat.mapped == "interface" {
            match self.interface_ip(nat.mapped_interface.as_deref()) {
                Some(ip) => self.ctx.host(&ip),
                None => self.ctx.unresolved_network("interface", cmd.line, cmd.id),
            }
        } else if is_valid_ipv4(&nat.mapped) {
            self.ctx.host(&nat.mapped)
        } else {
            match self.ctx.existing(&nat.mapped) {
                Some(model) => model.to_string(),
                None => self.ctx.unresolved_network(&nat.mapped, cmd.line, cmd.id),
            }
        };
        let method = match nat.mode {
            NatMode::Static => NatMethod::Static,
            NatMode::Dynamic => NatMethod::Hide,
        };

        let mut rule = NatRule::source_nat(method, &original, &translated);
        rule.name = format!("{original} {}", method_name(nat.mode));
        rule.comments = safe_comments(&format!(
            "({},{})",
            nat.real_interface.as_deref().unwrap_or(ANY),
            nat.mapped_interface.as_deref().unwrap_or(ANY)
        ));
        if let Some((proto, real, mapped)) = &nat.service {
            let spec = |port: &str| ServiceSpec {
                destination: PortMatch::Eq(port.to_string()),
                ..ServiceSpec::new(if proto == "udp" { Protocol::Udp } else { Protocol::Tcp })
            };
            rule.service = self.service_names(&spec(real), cmd).join(",");
            rule.translated_service = self.service_names(&spec(mapped), cmd).join(",");
        }
        rule.enabled = !nat.inactive;
        rule.incident = cmd
            .incident
            .clone()
            .filter(|incident| incident.severity != Severity::None);
        rule.converted_command_id = Some(cmd.id);
        Some(rule)
    }

    fn interface_ip(&self, name: Option<&str>) -> Option<String> {
        let name = name?;
        self.config
            .filter(CommandKind::Interface)
            .into_iter()
            .find_map(|cmd| match &cmd.data {
                CommandData::Interface(def) if def.name.as_deref() == Some(name) => def.ip.clone(),
                _ => None,
            })
    }
}

fn method_name(mode: NatMode) -> &'static str {
    match mode {
        NatMode::Static => "static",
        NatMode::Dynamic => "hide",
    }
}

/// Names a group refers to by reference; inline operands are not listed.
fn referenced_names(group: &GroupDef) -> Vec<String> {
    group
        .members
        .iter()
        .filter_map(|member| match member {
            GroupMember::Object(name) | GroupMember::Group(name) => Some(name.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use cfgtree_core::lines_from_str;
    use pretty_assertions::assert_eq;

    use super::translate;
    use crate::cisco::CiscoConfig;
    use crate::incident::Severity;
    use crate::known_values::default_known_values;
    use crate::model::{Action, NatMethod, ObjectKind};
    use crate::options::ConvertOptions;
    use crate::translate::Conversion;

    fn convert(text: &str, options: &ConvertOptions) -> Conversion {
        let known = default_known_values();
        let config = CiscoConfig::parse(&lines_from_str(text), &known, options.spread_acl_remarks);
        translate(&config, &known, options)
    }

    const BASE: &str = "\
hostname edge
interface GigabitEthernet0/0
 nameif outside
 ip address 203.0.113.2 255.255.255.0
object network web
 host 10.1.1.10
";

    #[test]
    fn bound_acl_becomes_sub_policy_with_merged_rules() {
        let text = format!(
            "{BASE}\
access-list outside_in extended permit tcp any host 10.1.1.10 eq www
access-list outside_in extended permit tcp any host 10.1.1.11 eq www
access-list outside_in extended deny ip any any
access-group outside_in in interface outside
"
        );
        let conversion = convert(&text, &ConvertOptions::default());
        let package = &conversion.package;

        assert_eq!(package.name, "edge");
        assert_eq!(package.parent_layer.rules.len(), 2);
        assert_eq!(package.parent_layer.rules[0].source, vec!["outside"]);
        assert_eq!(package.parent_layer.rules[0].sub_policy.as_deref(), Some("outside_in"));

        let layer = &package.sub_policies[0];
        assert_eq!(layer.rules.len(), 3);
        assert_eq!(layer.rules[0].destination, vec!["Host_10.1.1.10", "Host_10.1.1.11"]);
        assert_eq!(layer.rules[0].service, vec!["http"]);
        assert_eq!(layer.rules[0].conversion_comments, "optimized of access-list 1 2");
        assert_eq!(layer.rules[1].action, Action::Drop);
        assert!(layer.rules[2].is_cleanup_rule());
        assert_eq!(conversion.rules_before, 6);
        assert_eq!(conversion.rules_after(), 5);
    }

    #[test]
    fn host_operand_uses_object_name_when_declared_by_alias() {
        let text = "name 10.1.1.20 mail\naccess-list a extended permit tcp any host mail eq smtp\naccess-group a global\n";
        let conversion = convert(text, &ConvertOptions::default());
        let rule = &conversion.package.sub_policies[0].rules[0];
        assert_eq!(rule.destination, vec!["mail"]);
        assert_eq!(
            conversion.repository.get("mail").map(|o| o.kind.clone()),
            Some(ObjectKind::Host {
                ip: "10.1.1.20".to_string()
            })
        );
    }

    #[test]
    fn group_with_missing_member_is_not_created() {
        let text = format!(
            "{BASE}\
object-group network good
 network-object object web
object-group network bad
 network-object object ghost
object-group network outer
 group-object bad
access-list a extended permit ip object-group outer any
access-group a global
"
        );
        let conversion = convert(&text, &ConvertOptions::default());

        assert!(conversion.repository.has("good"));
        assert!(!conversion.repository.has("bad"));
        assert!(!conversion.repository.has("outer"));
        let manual: Vec<_> = conversion
            .incidents
            .iter()
            .filter(|incident| incident.severity == Severity::ManualActionRequired)
            .map(|incident| incident.title.as_str())
            .collect();
        assert!(manual.iter().any(|t| t.contains("bad contains non-existing member ghost")));
        assert!(manual.iter().any(|t| t.starts_with("Object group outer was not converted")));
        assert!(manual.iter().any(|t| t.contains("Cannot resolve network object (outer)")));
        assert_eq!(conversion.package.sub_policies[0].rules[0].source, vec!["Host_1.1.1.1"]);
    }

    #[test]
    fn group_cycle_is_reported() {
        let text = "object-group network a\n group-object b\nobject-group network b\n group-object a\n";
        let conversion = convert(text, &ConvertOptions::default());
        assert!(conversion
            .incidents
            .iter()
            .any(|incident| incident.title.contains("reference cycle: a -> b -> a")));
    }

    #[test]
    fn outbound_bindings_are_skipped() {
        let text = format!(
            "{BASE}access-list o extended permit ip any any\naccess-group o out interface outside\n"
        );
        let conversion = convert(&text, &ConvertOptions::default());
        assert!(conversion.package.sub_policies.is_empty());
        assert!(conversion
            .incidents
            .iter()
            .any(|incident| incident.severity == Severity::Informative));
    }

    #[test]
    fn unresolved_operands_mark_the_rule_and_survive_merging() {
        let text = format!(
            "{BASE}\
access-list a extended permit tcp any host 10.0.0.1 eq www
access-list a extended permit tcp any object ghost eq www
access-list b extended permit tcp any any eq www time-range nights
access-group a in interface outside
access-group b global
"
        );
        let conversion = convert(&text, &ConvertOptions::default());

        let merged = &conversion.package.sub_policies[0].rules[0];
        assert_eq!(merged.destination, vec!["Host_10.0.0.1", "Host_1.1.1.1"]);
        let incident = merged.incident.as_ref().expect("merged incident");
        assert_eq!(incident.severity, Severity::ManualActionRequired);
        assert_eq!(
            incident.message,
            "Cannot resolve network object (ghost). Using IP 1.1.1.1."
        );

        let timed = &conversion.package.sub_policies[1].rules[0];
        assert!(timed.time.is_empty());
        assert_eq!(
            timed.incident.as_ref().map(|incident| incident.message.as_str()),
            Some("Cannot resolve time range (nights). The rule is not time restricted.")
        );
    }

    #[test]
    fn service_objects_resolve_after_the_access_list() {
        let text = format!(
            "{BASE}\
access-list a extended permit tcp any object web object svc-web
access-list a extended deny tcp any object web object svc-missing
access-group a global
object service svc-web
 service tcp destination eq 8080
"
        );
        let options = ConvertOptions {
            optimize: false,
            ..ConvertOptions::default()
        };
        let conversion = convert(&text, &options);
        let rules = &conversion.package.sub_policies[0].rules;

        assert_eq!(rules[0].destination, vec!["web"]);
        assert_eq!(rules[0].service, vec!["svc-web"]);
        assert!(rules[0].incident.is_none());

        assert_eq!(rules[1].service, vec!["any"]);
        let incident = rules[1].incident.as_ref().expect("unresolved service");
        assert_eq!(incident.severity, Severity::ManualActionRequired);
        assert!(incident.message.contains("Cannot resolve service object (svc-missing)"));
    }

    #[test]
    fn source_service_object_needs_attention() {
        let text = format!(
            "{BASE}\
object service high-ports
 service tcp destination range 1024 65535
access-list a extended permit tcp any object high-ports object web
access-group a global
"
        );
        let conversion = convert(&text, &ConvertOptions::default());
        let rule = &conversion.package.sub_policies[0].rules[0];
        assert_eq!(rule.destination, vec!["web"]);
        assert!(!rule.service.contains(&"high-ports".to_string()));
        assert_eq!(
            rule.incident.as_ref().map(|incident| incident.message.as_str()),
            Some("Cannot convert service object (high-ports) used as source port. Using all source ports.")
        );
    }

    #[test]
    fn alias_host_never_reuses_a_zone() {
        let text = format!(
            "{BASE}\
name 10.9.9.9 outside
access-list a extended permit ip any host outside
access-group a global
"
        );
        let conversion = convert(&text, &ConvertOptions::default());
        let rule = &conversion.package.sub_policies[0].rules[0];

        assert_eq!(rule.destination, vec!["outside_1"]);
        assert_eq!(
            conversion.repository.get("outside").map(|o| o.kind.clone()),
            Some(ObjectKind::Zone)
        );
        assert_eq!(
            conversion.repository.get("outside_1").map(|o| o.kind.clone()),
            Some(ObjectKind::Host {
                ip: "10.9.9.9".to_string()
            })
        );
        assert_eq!(
            rule.incident.as_ref().map(|incident| incident.severity),
            Some(Severity::Informative)
        );
    }

    #[test]
    fn object_nat_becomes_nat_rules() {
        let text = format!(
            "{BASE}\
interface GigabitEthernet0/1
 nameif inside
 ip address 10.1.1.1 255.255.255.0
object network lan
 subnet 10.1.1.0 255.255.255.0
object network web
 nat (inside,outside) static 203.0.113.10
object network lan
 nat (inside,outside) dynamic interface
"
        );
        let conversion = convert(&text, &ConvertOptions::default());
        let nat = &conversion.package.nat_rules;

        assert_eq!(nat.len(), 2);
        assert_eq!(nat[0].method, NatMethod::Static);
        assert_eq!(nat[0].source, "web");
        assert_eq!(nat[0].translated_source, "Host_203.0.113.10");
        assert_eq!(nat[1].method, NatMethod::Hide);
        assert_eq!(nat[1].translated_source, "Host_203.0.113.2");
    }

    #[test]
    fn optimization_can_be_disabled() {
        let text = "access-list a extended permit tcp any host 10.0.0.1 eq www\naccess-list a extended permit tcp any host 10.0.0.2 eq www\naccess-group a global\n";
        let options = ConvertOptions {
            optimize: false,
            package_name: Some("lab".to_string()),
            ..ConvertOptions::default()
        };
        let conversion = convert(text, &options);
        assert_eq!(conversion.package.name, "lab");
        assert_eq!(conversion.package.sub_policies[0].rules.len(), 3);
        assert_eq!(
            conversion.package.sub_policies[0].rules[1].conversion_comments,
            "access-list a rule 2)"
        );
    }
}
