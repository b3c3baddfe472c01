//! FortiGate `config firewall ...` sections to the normalized model.
//!
//! Each virtual domain is translated on its own. Policies are grouped into
//! one sub-policy layer per source and destination interface pair, in
//! first-seen order, so the relative order of policies sharing a path is kept.
//! Once any policy matches interface `any` the pairs no longer partition the
//! traffic, and every policy goes into the parent layer instead.

use std::collections::HashMap;

use crate::fortigate::{entries, section, Entry, FortiConfig, VdomContext};
use crate::incident::{heavier, Incident};
use crate::known_values::{service_key, KnownValues};
use crate::model::repository::ICMP_PROTO;
use crate::model::{
    safe_comments, safe_name, Action, CpObject, DayWindow, Layer, NatMethod, NatRule, ObjectKind,
    Package, Rule, Track, Weekday, ANY,
};
use crate::netaddr::{is_valid_ipv4, mask_length, split_prefix};
use crate::options::{ConvertOptions, Dialect};
use crate::symbols::{expand_group, Member};
use crate::translate::context::TranslationContext;
use crate::translate::{finish_layer, push_unique, Conversion};

const ALWAYS: &str = "always";
const ALL_SERVICES: &str = "ALL";
const ALL_ADDRESSES: &str = "all";
const ANY_INTERFACE: &str = "any";

/// Translate every virtual domain of a FortiOS configuration.
pub fn translate(
    config: &FortiConfig,
    known: &KnownValues,
    options: &ConvertOptions,
) -> Vec<Conversion> {
    config
        .contexts
        .iter()
        .map(|vdom| translate_vdom(vdom, config.version.clone(), known, options))
        .collect()
}

/// Translate one virtual domain with its own repository and package.
pub fn translate_vdom(
    vdom: &VdomContext,
    version: Option<String>,
    known: &KnownValues,
    options: &ConvertOptions,
) -> Conversion {
    let mut translator = Translator {
        sections: &vdom.sections,
        ctx: TranslationContext::new(known),
        vips: HashMap::new(),
    };
    translator.interfaces();
    translator.addresses();
    translator.address_groups();
    translator.services();
    translator.service_groups();
    translator.schedules();
    translator.ip_pools();

    let name = options
        .package_name
        .clone()
        .unwrap_or_else(|| vdom.name.clone());
    let mut package = Package::new(safe_name(&name));
    translator.vips(&mut package);
    let rules_before = translator.policies(&mut package, options);

    let (repository, incidents) = translator.ctx.into_parts();
    tracing::info!(
        vdom = %vdom.name,
        objects = repository.user_objects().len(),
        rules = package.total_rules(),
        "translated FortiGate virtual domain"
    );
    Conversion {
        context: vdom.name.clone(),
        dialect: Dialect::Fortigate,
        version,
        repository,
        package,
        incidents,
        rules_before,
    }
}

struct Translator<'s, 'k> {
    sections: &'s [cfgtree_core::ConfigNode],
    ctx: TranslationContext<'k>,
    /// VIP name to its external and mapped address objects.
    vips: HashMap<String, Vec<String>>,
}

impl<'s, 'k> Translator<'s, 'k> {
    fn entries(&self, path: &str) -> Vec<Entry> {
        section(self.sections, path).map(entries).unwrap_or_default()
    }

    fn interfaces(&mut self) {
        for entry in self.entries("system interface") {
            let zone = self.ctx.claim_as(&zone_key(&entry.name), &entry.name, entry.line, entry.id);
            let comments = entry.first("description").unwrap_or_default().to_string();
            self.ctx.add(
                CpObject::new(zone, ObjectKind::Zone)
                    .with_comments(safe_comments(&comments))
                    .with_origin(entry.id, None),
            );
        }
        for entry in self.entries("system zone") {
            let zone = self.ctx.claim_as(&zone_key(&entry.name), &entry.name, entry.line, entry.id);
            self.ctx
                .add(CpObject::new(zone, ObjectKind::Zone).with_origin(entry.id, None));
        }
    }

    fn addresses(&mut self) {
        for entry in self.entries("firewall address") {
            let kind = match entry.first("type").unwrap_or("ipmask") {
                "ipmask" => {
                    let subnet = entry.list("subnet");
                    let (ip, mask) = match subnet.as_slice() {
                        [ip, mask, ..] => (ip.clone(), mask.clone()),
                        [prefix] => split_prefix(prefix)
                            .unwrap_or_else(|| (prefix.clone(), "255.255.255.255".to_string())),
                        [] => ("0.0.0.0".to_string(), "0.0.0.0".to_string()),
                    };
                    if ip == "0.0.0.0" && mask == "0.0.0.0" {
                        self.ctx.alias_name(&entry.name, ANY);
                        continue;
                    }
                    match (is_valid_ipv4(&ip), mask_length(&mask)) {
                        (true, Some(32)) => ObjectKind::Host { ip },
                        (true, Some(_)) => ObjectKind::Network {
                            subnet: ip,
                            netmask: mask,
                        },
                        _ => {
                            self.ctx.record(
                                entry.line,
                                entry.id,
                                &Incident::manual(format!(
                                    "Invalid address {} ({}). The address was not converted.",
                                    entry.name,
                                    subnet.join(" ")
                                )),
                            );
                            continue;
                        }
                    }
                }
                "iprange" => ObjectKind::Range {
                    from: entry.first("start-ip").unwrap_or("0.0.0.0").to_string(),
                    to: entry.first("end-ip").unwrap_or("0.0.0.0").to_string(),
                },
                "fqdn" => ObjectKind::Domain {
                    fqdn: entry.first("fqdn").unwrap_or_default().to_string(),
                },
                other => {
                    self.ctx.record(
                        entry.line,
                        entry.id,
                        &Incident::manual(format!(
                            "Address type {other} of {} is not supported",
                            entry.name
                        )),
                    );
                    continue;
                }
            };
            self.add_entry_object(&entry, kind);
        }
    }

    fn add_entry_object(&mut self, entry: &Entry, kind: ObjectKind) {
        let model = self.ctx.claim_name(&entry.name, entry.line, entry.id);
        let comments = entry.first("comment").unwrap_or_default().to_string();
        self.ctx.add(
            CpObject::new(model, kind)
                .with_comments(safe_comments(&comments))
                .with_origin(entry.id, None),
        );
    }

    fn address_groups(&mut self) {
        self.groups("firewall addrgrp", "address group", |members| {
            ObjectKind::NetworkGroup { members }
        });
    }

    fn service_groups(&mut self) {
        self.groups("firewall service group", "service group", |members| {
            ObjectKind::ServiceGroup { members }
        });
    }

    /// Validate and add every group of a section. A group fails as a whole.
    fn groups<F>(&mut self, path: &str, label: &str, make: F)
    where
        F: Fn(Vec<String>) -> ObjectKind,
    {
        let groups = self.entries(path);
        let members: HashMap<String, Vec<String>> = groups
            .iter()
            .map(|entry| (entry.name.clone(), entry.list("member")))
            .collect();
        for entry in &groups {
            if self.ctx.name_of(&entry.name).is_none() {
                self.ctx.claim_name(&entry.name, entry.line, entry.id);
            }
        }

        for entry in &groups {
            let direct = entry.list("member");
            let missing: Vec<&str> = direct
                .iter()
                .filter(|member| !members.contains_key(*member) && self.ctx.existing(member).is_none())
                .map(String::as_str)
                .collect();
            if !missing.is_empty() {
                self.ctx.record(
                    entry.line,
                    entry.id,
                    &Incident::manual(format!(
                        "{} {label} can not been converted becuase it contains non-existing member: {}",
                        entry.name,
                        missing.join(", ")
                    )),
                );
                continue;
            }
            let expansion = expand_group(&entry.name, |name| {
                if let Some(list) = members.get(name) {
                    return Some(Member::Group(list.clone()));
                }
                self.ctx.existing(name).map(|_| Member::Leaf)
            });
            if !expansion.is_ok() {
                self.ctx.record(
                    entry.line,
                    entry.id,
                    &Incident::manual(format!(
                        "{} {label} can not been converted: {}",
                        entry.name,
                        expansion.errors.join("; ")
                    )),
                );
                continue;
            }

            let mut names = Vec::new();
            for member in &direct {
                if let Some(model) = self.ctx.name_of(member) {
                    push_unique(&mut names, model.to_string());
                }
            }
            let model = self.ctx.claim_name(&entry.name, entry.line, entry.id);
            let comments = entry.first("comment").unwrap_or_default().to_string();
            self.ctx.add(
                CpObject::new(model, make(names))
                    .with_comments(safe_comments(&comments))
                    .with_origin(entry.id, None),
            );
        }
    }

    fn services(&mut self) {
        for entry in self.entries("firewall service custom") {
            let protocol = entry.first("protocol").unwrap_or("TCP/UDP/SCTP").to_ascii_uppercase();
            let mut parts: Vec<(&'static str, String, ObjectKind)> = Vec::new();
            match protocol.as_str() {
                "ICMP" | "ICMP6" => match entry.first("icmptype") {
                    Some(icmp_type) => parts.push((
                        "ICMP",
                        icmp_type.to_string(),
                        ObjectKind::IcmpService {
                            icmp_type: icmp_type.to_string(),
                            code: entry.first("icmpcode").unwrap_or_default().to_string(),
                        },
                    )),
                    None => {
                        self.ctx.alias_name(&entry.name, ICMP_PROTO);
                        continue;
                    }
                },
                "IP" => match entry.first("protocol-number") {
                    Some(number) if number != "0" => parts.push((
                        "OTHER",
                        number.to_string(),
                        ObjectKind::OtherService {
                            ip_protocol: number.to_string(),
                        },
                    )),
                    _ => {
                        self.ctx.alias_name(&entry.name, ANY);
                        continue;
                    }
                },
                _ => {
                    for (key, proto) in [
                        ("tcp-portrange", "TCP"),
                        ("udp-portrange", "UDP"),
                        ("sctp-portrange", "SCTP"),
                    ] {
                        for range in entry.list(key) {
                            let (port, source_port) = split_port_range(&range);
                            let kind = port_kind(proto, &port, source_port);
                            parts.push((proto, port, kind));
                        }
                    }
                }
            }

            match parts.len() {
                0 => self.ctx.record(
                    entry.line,
                    entry.id,
                    &Incident::manual(format!(
                        "Service {} defines no ports and was not converted",
                        entry.name
                    )),
                ),
                1 => {
                    let (proto, value, kind) = parts.remove(0);
                    let (name, known) = self
                        .ctx
                        .repository
                        .known_service_name(&service_key(proto, &value));
                    if known && !has_source_port(&kind) {
                        self.ctx.alias_name(&entry.name, &name);
                    } else {
                        self.add_entry_object(&entry, kind);
                    }
                }
                _ => {
                    let mut members = Vec::new();
                    for (proto, value, kind) in parts {
                        let name = if has_source_port(&kind) {
                            let name = safe_name(&format!("{}_{proto}_{value}", entry.name));
                            self.ctx.ensure(CpObject::new(name, kind))
                        } else {
                            self.ctx.service(proto, &value, kind)
                        };
                        push_unique(&mut members, name);
                    }
                    self.add_entry_object(&entry, ObjectKind::ServiceGroup { members });
                }
            }
        }
    }

    fn schedules(&mut self) {
        for entry in self.entries("firewall schedule recurring") {
            let days: Vec<Weekday> = entry
                .list("day")
                .iter()
                .filter_map(|day| Weekday::parse(day))
                .collect();
            let days = if days.is_empty() { Weekday::ALL.to_vec() } else { days };
            let window = DayWindow {
                days,
                from: entry.first("start").unwrap_or("00:00").to_string(),
                to: entry.first("end").unwrap_or("00:00").to_string(),
            };
            self.add_entry_object(
                &entry,
                ObjectKind::TimeWindow {
                    start: None,
                    end: None,
                    recurrence: vec![window],
                },
            );
        }
        for entry in self.entries("firewall schedule onetime") {
            let stamp = |key: &str| {
                let values = entry.list(key);
                (!values.is_empty()).then(|| values.join(" "))
            };
            let kind = ObjectKind::TimeWindow {
                start: stamp("start"),
                end: stamp("end"),
                recurrence: Vec::new(),
            };
            self.add_entry_object(&entry, kind);
        }
        for entry in self.entries("firewall schedule group") {
            let members = entry
                .list("member")
                .iter()
                .filter_map(|member| self.ctx.existing(member).map(str::to_string))
                .collect();
            self.add_entry_object(&entry, ObjectKind::TimeGroup { members });
        }
    }

    /// `firewall ippool` entries become ranges, or hosts for single addresses.
    fn ip_pools(&mut self) {
        for entry in self.entries("firewall ippool") {
            let start = entry.first("startip").unwrap_or_default().to_string();
            let end = entry.first("endip").map_or_else(|| start.clone(), str::to_string);
            if !is_valid_ipv4(&start) || !is_valid_ipv4(&end) {
                self.ctx.record(
                    entry.line,
                    entry.id,
                    &Incident::manual(format!(
                        "IP pool {} has an invalid address range ({start}-{end}) and was not converted",
                        entry.name
                    )),
                );
                continue;
            }
            let kind = if start == end {
                ObjectKind::Host { ip: start }
            } else {
                ObjectKind::Range { from: start, to: end }
            };
            self.add_entry_object(&entry, kind);
        }
    }

    /// `firewall vip` entries become static NAT rules.
    fn vips(&mut self, package: &mut Package) {
        for entry in self.entries("firewall vip") {
            self.ctx.begin_entity();
            let rule = self.vip_rule(&entry);
            let incident = self.ctx.finish_entity();
            if let Some(mut rule) = rule {
                rule.incident = heavier(rule.incident.take(), incident);
                package.nat_rules.push(rule);
            }
        }
        for entry in self.entries("firewall vipgrp") {
            let members: Vec<String> = entry
                .list("member")
                .iter()
                .filter_map(|member| self.vips.get(member))
                .flatten()
                .cloned()
                .collect();
            if members.is_empty() {
                self.ctx.record(
                    entry.line,
                    entry.id,
                    &Incident::manual(format!(
                        "VIP group {} has no converted members and was not converted",
                        entry.name
                    )),
                );
                continue;
            }
            self.vips.insert(entry.name.clone(), members);
        }
    }

    fn vip_rule(&mut self, entry: &Entry) -> Option<NatRule> {
        if let Some(kind) = entry.first("type").filter(|kind| *kind != "static-nat") {
            self.ctx.record(
                entry.line,
                entry.id,
                &Incident::manual(format!(
                    "VIP {} of type {kind} is not converted",
                    entry.name
                )),
            );
            return None;
        }
        let external = self.vip_address(entry, "extip");
        let mapped = self.vip_address(entry, "mappedip");
        let (Some(external), Some(mapped)) = (external, mapped) else {
            self.ctx.record(
                entry.line,
                entry.id,
                &Incident::manual(format!(
                    "VIP {} has no valid external or mapped address and was not converted",
                    entry.name
                )),
            );
            return None;
        };
        self.vips
            .insert(entry.name.clone(), vec![external.clone(), mapped.clone()]);

        let mut rule = NatRule::source_nat(NatMethod::Static, ANY, "original");
        rule.name = safe_name(&entry.name);
        rule.comments = safe_comments(entry.first("comment").unwrap_or_default());
        rule.destination = external;
        rule.translated_destination = mapped;
        if entry.first("portforward") == Some("enable") {
            let proto = match entry.first("protocol").unwrap_or("tcp") {
                "udp" => "UDP",
                "sctp" => "SCTP",
                "tcp" => "TCP",
                other => {
                    self.ctx.record(
                        entry.line,
                        entry.id,
                        &Incident::informative(format!(
                            "Port forwarding of VIP {} over {other} is not converted. Using service {ANY}.",
                            entry.name
                        )),
                    );
                    ""
                }
            };
            if !proto.is_empty() {
                let external_port = entry.first("extport").unwrap_or_default();
                let mapped_port = entry.first("mappedport").unwrap_or(external_port);
                rule.service = self.port_service(proto, external_port);
                if mapped_port != external_port {
                    rule.translated_service = self.port_service(proto, mapped_port);
                }
            }
        }
        rule.converted_command_id = Some(entry.id);
        Some(rule)
    }

    /// Host or range object for a VIP address, named `<vip>_vip_<key>`.
    fn vip_address(&mut self, entry: &Entry, key: &str) -> Option<String> {
        let value = entry.first(key)?;
        let (from, to) = value.split_once('-').unwrap_or((value, value));
        if !is_valid_ipv4(from) || !is_valid_ipv4(to) {
            return None;
        }
        let kind = if from == to {
            ObjectKind::Host { ip: from.to_string() }
        } else {
            ObjectKind::Range {
                from: from.to_string(),
                to: to.to_string(),
            }
        };
        let name = self.ctx.claim_as(
            &format!("vip {key} {}", entry.name),
            &format!("{}_vip_{key}", entry.name),
            entry.line,
            entry.id,
        );
        Some(self.ctx.ensure(CpObject::new(name, kind).with_origin(entry.id, None)))
    }

    fn port_service(&mut self, proto: &str, ports: &str) -> String {
        let (port, _) = split_port_range(ports);
        if port.is_empty() {
            return ANY.to_string();
        }
        let kind = port_kind(proto, &port, String::new());
        self.ctx.service(proto, &port, kind)
    }

    /// Convert `firewall policy` entries into sub-policy layers.
    ///
    /// Returns the access rule count before optimization.
    fn policies(&mut self, package: &mut Package, options: &ConvertOptions) -> usize {
        let policies = self.entries("firewall policy");
        let mut rules = Vec::with_capacity(policies.len());
        for entry in &policies {
            let rule = self.policy_rule(entry);
            self.policy_nat(entry, &rule, package);
            rules.push(rule);
        }

        if let Some(entry) = policies.iter().find(|entry| {
            matches_any_interface(&entry.list("srcintf"))
                || matches_any_interface(&entry.list("dstintf"))
        }) {
            self.ctx.record(
                entry.line,
                entry.id,
                &Incident::informative(format!(
                    "Policy {} matches interface {ANY_INTERFACE}. Policies are converted into one layer without interface matching.",
                    entry.name
                )),
            );
            let mut layer = Layer::new(package.parent_layer.name.clone());
            for rule in rules {
                layer.push(rule);
            }
            let (layer, before) = finish_layer(layer, options);
            package.parent_layer = layer;
            return before;
        }

        let mut layers: Vec<((Vec<String>, Vec<String>), &Entry, Layer)> = Vec::new();
        for (entry, rule) in policies.iter().zip(rules) {
            let key = (entry.list("srcintf"), entry.list("dstintf"));
            match layers.iter_mut().find(|(existing, _, _)| *existing == key) {
                Some((_, _, layer)) => layer.push(rule),
                None => {
                    let name = safe_name(&format!("{}_{}", key.0.join("_"), key.1.join("_")));
                    let mut layer = Layer::new(name);
                    layer.push(rule);
                    layers.push((key, entry, layer));
                }
            }
        }

        let mut rules_before = 0;
        for ((sources, destinations), entry, layer) in layers {
            let (layer, before) = finish_layer(layer, options);
            rules_before += before;
            let mut jump = Rule::sub_policy(layer.name.clone(), layer.name.clone());
            jump.source = sources
                .iter()
                .map(|iface| self.zone(iface, entry.line, entry.id))
                .collect();
            jump.destination = destinations
                .iter()
                .map(|iface| self.zone(iface, entry.line, entry.id))
                .collect();
            package.parent_layer.push(jump);
            package.sub_policies.push(layer);
        }
        let cleanup = Rule::cleanup(package.parent_layer.name.clone());
        package.parent_layer.push(cleanup);
        rules_before + package.parent_layer.rules.len()
    }

    fn zone(&mut self, iface: &str, line: usize, command_id: usize) -> String {
        let key = zone_key(iface);
        if let Some(zone) = self.ctx.existing(&key) {
            return zone.to_string();
        }
        let zone = self.ctx.claim_as(&key, iface, line, command_id);
        self.ctx.ensure(CpObject::new(zone, ObjectKind::Zone))
    }

    fn policy_rule(&mut self, entry: &Entry) -> Rule {
        self.ctx.begin_entity();
        let source = self.network_names(entry, "srcaddr");
        let destination = self.network_names(entry, "dstaddr");
        let service = self.service_names(entry);
        let time = match entry.first("schedule") {
            None | Some(ALWAYS) => Vec::new(),
            Some(schedule) => match self.ctx.existing(schedule) {
                Some(model) => vec![model.to_string()],
                None => {
                    self.ctx.record(
                        entry.line,
                        entry.id,
                        &Incident::manual(format!(
                            "Cannot resolve schedule ({schedule}). The rule is not time restricted."
                        )),
                    );
                    Vec::new()
                }
            },
        };
        let action = match entry.first("action") {
            Some("accept") => Action::Accept,
            Some("deny") | None => Action::Drop,
            Some(other) => {
                self.ctx.record(
                    entry.line,
                    entry.id,
                    &Incident::manual(format!(
                        "Policy action {other} is not supported. Using drop."
                    )),
                );
                Action::Drop
            }
        };
        Rule {
            name: safe_name(entry.first("name").unwrap_or_default()),
            comments: safe_comments(entry.first("comments").unwrap_or_default()),
            conversion_comments: format!("policy {}", entry.name),
            source,
            destination,
            service,
            time,
            action,
            track: match entry.first("logtraffic") {
                Some("disable") => Track::None,
                _ => Track::Log,
            },
            enabled: entry.first("status") != Some("disable"),
            source_negated: entry.first("srcaddr-negate") == Some("enable"),
            destination_negated: entry.first("dstaddr-negate") == Some("enable"),
            incident: self.ctx.finish_entity(),
            converted_command_id: Some(entry.id),
            ..Rule::default()
        }
    }

    /// Hide NAT rules for a policy with `set nat enable`, over the columns of
    /// its access rule.
    ///
    /// Traffic hides behind the policy's IP pool, or else behind the address
    /// of its egress interface. VIP destinations are covered by the VIP's own
    /// static rule.
    fn policy_nat(&mut self, entry: &Entry, rule: &Rule, package: &mut Package) {
        if entry.first("nat") != Some("enable") {
            return;
        }
        let references = entry.list("dstaddr");
        if references.iter().all(|reference| self.vips.contains_key(reference)) {
            return;
        }
        let vip_addresses: Vec<String> = references
            .iter()
            .filter_map(|reference| self.vips.get(reference))
            .flatten()
            .cloned()
            .collect();

        let translated = if entry.first("ippool") == Some("enable") {
            let pool = entry.first("poolname").unwrap_or_default();
            self.ctx.existing(pool).map(str::to_string).ok_or_else(|| {
                format!(
                    "Cannot resolve IP pool ({pool}). NAT of policy {} was not converted.",
                    entry.name
                )
            })
        } else {
            let egress = entry.list("dstintf");
            match egress.first().and_then(|iface| self.interface_ip(iface)) {
                Some(ip) => Ok(self.ctx.host(&ip)),
                None => Err(format!(
                    "Egress interface address of policy {} is unknown. NAT was not converted.",
                    entry.name
                )),
            }
        };
        let translated = match translated {
            Ok(name) => name,
            Err(message) => {
                self.ctx
                    .record(entry.line, entry.id, &Incident::manual(message));
                return;
            }
        };

        for source in &rule.source {
            for destination in rule
                .destination
                .iter()
                .filter(|name| !vip_addresses.contains(name))
            {
                for service in &rule.service {
                    let mut nat = NatRule::source_nat(NatMethod::Hide, source, &translated);
                    nat.name = format!("policy {} hide", entry.name);
                    nat.destination = destination.clone();
                    nat.service = service.clone();
                    nat.enabled = rule.enabled;
                    nat.incident = rule.incident.clone();
                    nat.converted_command_id = Some(entry.id);
                    package.nat_rules.push(nat);
                }
            }
        }
    }

    /// Address of a `system interface` entry, from `set ip <address> <mask>`.
    fn interface_ip(&self, iface: &str) -> Option<String> {
        self.entries("system interface")
            .into_iter()
            .find(|entry| entry.name == iface)
            .and_then(|entry| entry.first("ip").map(str::to_string))
            .filter(|ip| is_valid_ipv4(ip) && ip != "0.0.0.0")
    }

    fn network_names(&mut self, entry: &Entry, key: &str) -> Vec<String> {
        let mut names = Vec::new();
        for reference in entry.list(key) {
            if let Some(addresses) = self.vips.get(&reference) {
                for address in addresses {
                    push_unique(&mut names, address.clone());
                }
                continue;
            }
            let name = match self.ctx.existing(&reference) {
                Some(model) => model.to_string(),
                None if reference == ALL_ADDRESSES => ANY.to_string(),
                None => self.ctx.unresolved_network(&reference, entry.line, entry.id),
            };
            push_unique(&mut names, name);
        }
        any_if_empty(names)
    }

    fn service_names(&mut self, entry: &Entry) -> Vec<String> {
        let mut names = Vec::new();
        for reference in entry.list("service") {
            let name = match self.ctx.existing(&reference) {
                Some(model) => model.to_string(),
                None if reference == ALL_SERVICES => ANY.to_string(),
                None => self.ctx.unresolved_service(&reference, entry.line, entry.id),
            };
            push_unique(&mut names, name);
        }
        any_if_empty(names)
    }
}

fn zone_key(iface: &str) -> String {
    format!("Interface_{iface}")
}

/// A missing interface list matches every interface, like `any`.
fn matches_any_interface(interfaces: &[String]) -> bool {
    interfaces.is_empty()
        || interfaces
            .iter()
            .any(|iface| iface.eq_ignore_ascii_case(ANY_INTERFACE))
}

fn port_kind(proto: &str, port: &str, source_port: String) -> ObjectKind {
    let port = port.to_string();
    match proto {
        "UDP" => ObjectKind::UdpService { port, source_port },
        "SCTP" => ObjectKind::SctpService { port },
        _ => ObjectKind::TcpService { port, source_port },
    }
}

fn any_if_empty(mut names: Vec<String>) -> Vec<String> {
    if names.len() > 1 {
        names.retain(|name| name != ANY);
    }
    if names.is_empty() {
        names.push(ANY.to_string());
    }
    names
}

fn has_source_port(kind: &ObjectKind) -> bool {
    matches!(
        kind,
        ObjectKind::TcpService { source_port, .. } | ObjectKind::UdpService { source_port, .. }
            if !source_port.is_empty()
    )
}

/// Split `dst[:src]` where either side may be `low-high`.
fn split_port_range(range: &str) -> (String, String) {
    let (destination, source) = range.split_once(':').unwrap_or((range, ""));
    let normalize = |ports: &str| match ports.split_once('-') {
        Some((low, high)) if low == high => low.to_string(),
        _ => ports.to_string(),
    };
    (normalize(destination), normalize(source))
}

#[cfg(test)]
mod tests {
    use cfgtree_core::lines_from_str;
    use pretty_assertions::assert_eq;

    use super::{split_port_range, translate};
    use crate::fortigate::FortiConfig;
    use crate::incident::Severity;
    use crate::known_values::default_known_values;
    use crate::model::{Action, NatMethod, ObjectKind};
    use crate::options::ConvertOptions;
    use crate::translate::Conversion;

    fn convert(text: &str) -> Vec<Conversion> {
        convert_with(text, &ConvertOptions::default())
    }

    fn convert_with(text: &str, options: &ConvertOptions) -> Vec<Conversion> {
        let known = default_known_values();
        translate(&FortiConfig::parse(&lines_from_str(text)), &known, options)
    }

    const POLICIES: &str = "\
config firewall address
    edit \"web-01\"
        set subnet 10.0.0.10 255.255.255.255
    next
    edit \"web-02\"
        set subnet 10.0.0.11 255.255.255.255
    next
end
config firewall service custom
    edit \"HTTP-8080\"
        set tcp-portrange 8080
    next
    edit \"APP\"
        set tcp-portrange 9000-9010
    next
end
config firewall policy
    edit 1
        set srcintf \"wan1\"
        set dstintf \"internal\"
        set srcaddr \"all\"
        set dstaddr \"web-01\"
        set action accept
        set service \"HTTP-8080\"
    next
    edit 2
        set srcintf \"wan1\"
        set dstintf \"internal\"
        set srcaddr \"all\"
        set dstaddr \"web-02\"
        set action accept
        set service \"HTTP-8080\"
    next
    edit 3
        set srcintf \"wan1\"
        set dstintf \"internal\"
        set srcaddr \"all\"
        set dstaddr \"web-02\"
        set action accept
        set service \"APP\"
        set status disable
    next
end
";

    #[test]
    fn policies_merge_and_services_collapse() {
        let conversions = convert(POLICIES);
        assert_eq!(conversions.len(), 1);
        let conversion = &conversions[0];

        assert_eq!(conversion.context, "root");
        assert!(!conversion.repository.has("HTTP-8080"));
        assert_eq!(
            conversion.repository.get("APP").map(|o| o.kind.clone()),
            Some(ObjectKind::TcpService {
                port: "9000-9010".to_string(),
                source_port: String::new()
            })
        );

        let layer = &conversion.package.sub_policies[0];
        assert_eq!(layer.name, "wan1_internal");
        assert_eq!(layer.rules.len(), 3);
        assert_eq!(layer.rules[0].destination, vec!["web-01", "web-02"]);
        assert_eq!(layer.rules[0].service, vec!["http_proxy"]);
        assert_eq!(layer.rules[0].action, Action::Accept);
        assert!(!layer.rules[1].enabled);
        assert!(layer.rules[2].is_cleanup_rule());

        let parent = &conversion.package.parent_layer;
        assert_eq!(parent.rules[0].source, vec!["wan1"]);
        assert_eq!(parent.rules[0].destination, vec!["internal"]);
        assert_eq!(parent.rules[0].sub_policy.as_deref(), Some("wan1_internal"));
        assert!(parent.rules[1].is_cleanup_rule());
    }

    #[test]
    fn interface_pairs_get_their_own_layers() {
        let text = "\
config firewall policy
    edit 1
        set srcintf \"port1\"
        set dstintf \"port2\"
        set action accept
    next
    edit 2
        set srcintf \"port1\"
        set dstintf \"port3\"
        set action accept
    next
end
";
        let package = &convert(text)[0].package;
        let names: Vec<&str> = package.sub_policies.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["port1_port2", "port1_port3"]);
        assert_eq!(package.parent_layer.rules[1].source, vec!["port1"]);
        assert_eq!(package.parent_layer.rules[1].destination, vec!["port3"]);
    }

    #[test]
    fn any_interface_keeps_policies_in_the_parent_layer() {
        let text = "\
config firewall address
    edit \"web\"
        set subnet 10.0.0.10 255.255.255.255
    next
end
config firewall policy
    edit 1
        set srcintf \"any\"
        set dstintf \"port2\"
        set srcaddr \"all\"
        set dstaddr \"web\"
        set action deny
        set service \"ALL\"
    next
    edit 2
        set srcintf \"port1\"
        set dstintf \"port2\"
        set srcaddr \"all\"
        set dstaddr \"web\"
        set action accept
        set service \"ALL\"
    next
end
";
        let conversion = &convert(text)[0];
        let package = &conversion.package;
        assert!(package.sub_policies.is_empty());

        let rules = &package.parent_layer.rules;
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].action, Action::Drop);
        assert_eq!(rules[0].destination, vec!["web"]);
        assert_eq!(rules[0].layer, "root Network");
        assert_eq!(rules[1].action, Action::Accept);
        assert!(rules[2].is_cleanup_rule());
        assert_eq!(conversion.rules_before, 3);
        assert!(conversion.incidents.iter().any(|incident| {
            incident.severity == Severity::Informative
                && incident.title.contains("Policy 1 matches interface any")
        }));
    }

    #[test]
    fn unresolved_references_mark_the_policy_rule() {
        let text = "\
config firewall policy
    edit 1
        set srcintf \"port1\"
        set dstintf \"port2\"
        set srcaddr \"ghost\"
        set dstaddr \"all\"
        set action accept
        set service \"ALL\"
    next
    edit 2
        set srcintf \"port1\"
        set dstintf \"port2\"
        set srcaddr \"all\"
        set dstaddr \"all\"
        set action ipsec
        set service \"ALL\"
    next
end
";
        let options = ConvertOptions {
            optimize: false,
            ..ConvertOptions::default()
        };
        let conversion = &convert_with(text, &options)[0];
        let rules = &conversion.package.sub_policies[0].rules;

        let unresolved = rules[0].incident.as_ref().expect("unresolved source");
        assert_eq!(unresolved.severity, Severity::ManualActionRequired);
        assert!(unresolved.message.contains("Cannot resolve network object (ghost)"));
        assert_eq!(rules[0].source, vec!["Host_1.1.1.1"]);

        let action = rules[1].incident.as_ref().expect("unsupported action");
        assert_eq!(action.message, "Policy action ipsec is not supported. Using drop.");
        assert_eq!(rules[1].action, Action::Drop);
    }

    #[test]
    fn zone_renames_point_at_the_policy() {
        let text = "\
config firewall address
    edit \"dmz\"
        set subnet 172.16.0.0 255.255.255.0
    next
end
config firewall policy
    edit 7
        set srcintf \"dmz\"
        set dstintf \"port2\"
        set action accept
    next
end
";
        let conversion = &convert(text)[0];
        assert_eq!(conversion.package.parent_layer.rules[0].source, vec!["dmz_1"]);

        let policy_line = text
            .lines()
            .position(|line| line.trim() == "edit 7")
            .map(|index| index + 1)
            .expect("policy line");
        let renamed = conversion
            .incidents
            .iter()
            .find(|incident| incident.title.contains("renamed to dmz_1"))
            .expect("rename incident");
        assert_eq!(renamed.line, policy_line);
    }

    const NAT: &str = "\
config system interface
    edit \"wan1\"
        set ip 198.51.100.2 255.255.255.0
    next
end
config firewall address
    edit \"lan\"
        set subnet 10.10.0.0 255.255.255.0
    next
end
config firewall ippool
    edit \"pool-out\"
        set startip 198.51.100.20
        set endip 198.51.100.21
    next
end
config firewall vip
    edit \"vip-web\"
        set extip 198.51.100.10
        set extintf \"wan1\"
        set mappedip \"10.10.0.10\"
    next
    edit \"vip-ssh\"
        set extip 198.51.100.11
        set extintf \"wan1\"
        set portforward enable
        set extport 2222
        set mappedip \"10.10.0.11\"
        set mappedport 22
    next
    edit \"vip-lb\"
        set type server-load-balance
        set extip 198.51.100.12
    next
end
config firewall policy
    edit 1
        set srcintf \"wan1\"
        set dstintf \"internal\"
        set srcaddr \"all\"
        set dstaddr \"vip-web\"
        set action accept
        set service \"ALL\"
        set nat enable
    next
    edit 2
        set srcintf \"internal\"
        set dstintf \"wan1\"
        set srcaddr \"lan\"
        set dstaddr \"all\"
        set action accept
        set service \"ALL\"
        set nat enable
        set ippool enable
        set poolname \"pool-out\"
    next
    edit 3
        set srcintf \"internal\"
        set dstintf \"wan1\"
        set srcaddr \"lan\"
        set dstaddr \"all\"
        set action accept
        set service \"ALL\"
        set nat enable
    next
end
";

    #[test]
    fn vips_become_static_nat_rules() {
        let conversion = &convert(NAT)[0];
        let nat = &conversion.package.nat_rules;
        let statics: Vec<_> = nat
            .iter()
            .filter(|rule| rule.method == NatMethod::Static)
            .collect();
        assert_eq!(statics.len(), 2);

        assert_eq!(statics[0].name, "vip-web");
        assert_eq!(statics[0].source, "any");
        assert_eq!(statics[0].destination, "vip-web_vip_extip");
        assert_eq!(statics[0].translated_destination, "vip-web_vip_mappedip");
        assert_eq!(statics[0].translated_source, "original");
        assert_eq!(statics[0].service, "any");
        assert_eq!(
            conversion.repository.get("vip-web_vip_mappedip").map(|o| o.kind.clone()),
            Some(ObjectKind::Host {
                ip: "10.10.0.10".to_string()
            })
        );

        assert_eq!(statics[1].name, "vip-ssh");
        assert_eq!(statics[1].service, "TCP_2222");
        assert_eq!(statics[1].translated_service, "ssh");

        assert!(conversion.incidents.iter().any(|incident| {
            incident.severity == Severity::ManualActionRequired
                && incident.title == "VIP vip-lb of type server-load-balance is not converted"
        }));

        let inbound = &conversion.package.sub_policies[0];
        assert_eq!(
            inbound.rules[0].destination,
            vec!["vip-web_vip_extip", "vip-web_vip_mappedip"]
        );
        assert!(inbound.rules[0].incident.is_none());
    }

    #[test]
    fn vip_groups_expand_to_member_addresses() {
        let groups = "\
config firewall vipgrp
    edit \"published\"
        set member \"vip-web\" \"vip-ssh\"
    next
    edit \"empty\"
        set member \"vip-lb\"
    next
end
config firewall policy
    edit 9
        set srcintf \"wan1\"
        set dstintf \"internal\"
        set srcaddr \"all\"
        set dstaddr \"published\"
        set action accept
    next
";
        let text = NAT.replacen("config firewall policy\n", groups, 1);
        let options = ConvertOptions {
            optimize: false,
            ..ConvertOptions::default()
        };
        let conversion = &convert_with(&text, &options)[0];
        let policy = &conversion.package.sub_policies[0].rules[0];
        assert_eq!(policy.conversion_comments, "policy 9");
        assert_eq!(
            policy.destination,
            vec![
                "vip-web_vip_extip",
                "vip-web_vip_mappedip",
                "vip-ssh_vip_extip",
                "vip-ssh_vip_mappedip"
            ]
        );
        assert!(conversion
            .incidents
            .iter()
            .any(|incident| incident.title == "VIP group empty has no converted members and was not converted"));
    }

    #[test]
    fn policy_nat_hides_behind_pool_or_egress_interface() {
        let conversion = &convert(NAT)[0];
        let hides: Vec<_> = conversion
            .package
            .nat_rules
            .iter()
            .filter(|rule| rule.method == NatMethod::Hide)
            .collect();
        assert_eq!(hides.len(), 2);

        assert_eq!(hides[0].name, "policy 2 hide");
        assert_eq!(hides[0].source, "lan");
        assert_eq!(hides[0].destination, "any");
        assert_eq!(hides[0].translated_source, "pool-out");
        assert_eq!(
            conversion.repository.get("pool-out").map(|o| o.kind.clone()),
            Some(ObjectKind::Range {
                from: "198.51.100.20".to_string(),
                to: "198.51.100.21".to_string()
            })
        );

        assert_eq!(hides[1].name, "policy 3 hide");
        assert_eq!(hides[1].translated_source, "Host_198.51.100.2");
    }

    #[test]
    fn policy_nat_without_egress_address_needs_attention() {
        let text = "\
config firewall policy
    edit 4
        set srcintf \"internal\"
        set dstintf \"wan2\"
        set srcaddr \"all\"
        set dstaddr \"all\"
        set action accept
        set nat enable
    next
end
";
        let conversion = &convert(text)[0];
        assert!(conversion.package.nat_rules.is_empty());
        assert!(conversion.incidents.iter().any(|incident| {
            incident.severity == Severity::ManualActionRequired
                && incident.title == "Egress interface address of policy 4 is unknown. NAT was not converted."
        }));
    }

    #[test]
    fn broken_groups_fail_as_a_whole() {
        let text = "\
config firewall address
    edit \"a\"
        set subnet 10.0.0.1 255.255.255.255
    next
end
config firewall addrgrp
    edit \"loop-a\"
        set member \"loop-b\"
    next
    edit \"loop-b\"
        set member \"loop-a\"
    next
    edit \"broken\"
        set member \"a\" \"ghost\"
    next
    edit \"fine\"
        set member \"a\"
    next
end
";
        let conversion = &convert(text)[0];
        assert!(conversion.repository.has("fine"));
        assert!(!conversion.repository.has("broken"));
        assert!(!conversion.repository.has("loop-a"));

        let titles: Vec<&str> = conversion
            .incidents
            .iter()
            .filter(|incident| incident.severity == Severity::ManualActionRequired)
            .map(|incident| incident.title.as_str())
            .collect();
        assert!(titles.contains(
            &"broken address group can not been converted becuase it contains non-existing member: ghost"
        ));
        assert!(titles
            .iter()
            .any(|title| title.contains("reference cycle: loop-a -> loop-b -> loop-a")));
    }

    #[test]
    fn each_vdom_is_its_own_context() {
        let text = "\
config vdom
edit root
config firewall address
    edit \"srv\"
        set subnet 10.0.0.5 255.255.255.255
    next
end
next
edit dmz
config firewall address
    edit \"srv\"
        set subnet 172.16.0.5 255.255.255.255
    next
end
next
end
";
        let conversions = convert(text);
        assert_eq!(conversions.len(), 2);
        assert_eq!(conversions[1].context, "dmz");
        assert_eq!(
            conversions[1].repository.get("srv").map(|o| o.kind.clone()),
            Some(ObjectKind::Host {
                ip: "172.16.0.5".to_string()
            })
        );
    }

    #[test]
    fn port_ranges_split_destination_and_source() {
        assert_eq!(split_port_range("80"), ("80".to_string(), String::new()));
        assert_eq!(split_port_range("80-80"), ("80".to_string(), String::new()));
        assert_eq!(
            split_port_range("1000-2000:1024-65535"),
            ("1000-2000".to_string(), "1024-65535".to_string())
        );
    }
}
