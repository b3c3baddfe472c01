use std::collections::{HashMap, HashSet};

use crate::incident::{heavier, ConversionIncident, Incident, Severity};
use crate::known_values::{service_key, KnownValues};
use crate::model::{safe_name, CpObject, ObjectKind, Repository, ANY};

/// Placeholder host used when a network reference cannot be resolved.
pub const PLACEHOLDER_HOST: &str = "1.1.1.1";

/// Per-context translation state: the repository being filled, the map from
/// source names to model names, and the incidents raised so far.
pub struct TranslationContext<'a> {
    pub known: &'a KnownValues,
    pub repository: Repository,
    names: HashMap<String, String>,
    claimed: HashSet<String>,
    incidents: Vec<ConversionIncident>,
    /// Heaviest incident recorded since [`TranslationContext::begin_entity`].
    entity: Option<Option<Incident>>,
}

impl<'a> TranslationContext<'a> {
    pub fn new(known: &'a KnownValues) -> Self {
        Self {
            known,
            repository: Repository::new(known),
            names: HashMap::new(),
            claimed: HashSet::new(),
            incidents: Vec::new(),
            entity: None,
        }
    }

    /// Start collecting the incidents raised while one rule is built.
    pub fn begin_entity(&mut self) {
        self.entity = Some(None);
    }

    /// Stop collecting and return the heaviest incident seen since `begin_entity`.
    pub fn finish_entity(&mut self) -> Option<Incident> {
        self.entity.take().flatten()
    }

    /// Reserve a model name for `source`. A taken name gets a `_<n>` suffix.
    pub fn claim_name(&mut self, source: &str, line: usize, command_id: usize) -> String {
        self.claim_as(source, source, line, command_id)
    }

    /// Reserve a model name derived from `preferred` under the key `source`.
    pub fn claim_as(
        &mut self,
        source: &str,
        preferred: &str,
        line: usize,
        command_id: usize,
    ) -> String {
        if let Some(existing) = self.names.get(source) {
            return existing.clone();
        }
        let base = safe_name(preferred);
        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.repository.has(&candidate) || self.claimed.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        if candidate != base {
            self.record(
                line,
                command_id,
                &Incident::informative(format!(
                    "Object {preferred} was renamed to {candidate} to avoid a name collision"
                )),
            );
        }
        self.claimed.insert(candidate.clone());
        self.names.insert(source.to_string(), candidate.clone());
        candidate
    }

    /// Map `source` onto an existing model name without creating an object.
    pub fn alias_name(&mut self, source: &str, model: &str) {
        self.names
            .entry(source.to_string())
            .or_insert_with(|| model.to_string());
    }

    /// Model name previously claimed for `source`.
    pub fn name_of(&self, source: &str) -> Option<&str> {
        self.names.get(source).map(String::as_str)
    }

    /// Model name for `source` when its object exists in the repository.
    pub fn existing(&self, source: &str) -> Option<&str> {
        self.name_of(source)
            .filter(|name| self.repository.has(name))
    }

    pub fn add(&mut self, object: CpObject) -> bool {
        self.repository.add(object)
    }

    /// Add an inline object unless one with the same name exists; return its name.
    pub fn ensure(&mut self, object: CpObject) -> String {
        let name = object.name.clone();
        if !self.repository.has(&name) {
            self.repository.add(object);
        }
        name
    }

    /// Name of the predefined service for `<proto>_<value>`, or of a new inline service.
    pub fn service(&mut self, proto: &str, value: &str, kind: ObjectKind) -> String {
        let key = service_key(proto, value);
        match self.repository.known_service_name(&key) {
            (name, true) => name,
            (name, false) => self.ensure(CpObject::new(safe_name(&name), kind)),
        }
    }

    /// Inline host object named after its address.
    pub fn host(&mut self, ip: &str) -> String {
        self.ensure(CpObject::new(
            format!("Host_{ip}"),
            ObjectKind::Host { ip: ip.to_string() },
        ))
    }

    /// Inline host object named after the `name` alias it came from.
    ///
    /// An existing host with the same address is reused; any other object
    /// holding the name forces a renamed host.
    pub fn alias_host(&mut self, ip: &str, alias: &str, line: usize, command_id: usize) -> String {
        let key = format!("name {alias}");
        if self.name_of(&key).is_none() {
            let preferred = safe_name(alias);
            let same_host = self.repository.get(&preferred).is_some_and(|object| {
                matches!(&object.kind, ObjectKind::Host { ip: existing } if existing == ip)
            });
            if same_host {
                self.names.insert(key, preferred.clone());
                return preferred;
            }
        }
        let name = self.claim_as(&key, alias, line, command_id);
        self.ensure(CpObject::new(name, ObjectKind::Host { ip: ip.to_string() }))
    }

    /// Record an unresolved network reference and return the placeholder host.
    pub fn unresolved_network(&mut self, reference: &str, line: usize, command_id: usize) -> String {
        self.record(
            line,
            command_id,
            &Incident::manual(format!(
                "Cannot resolve network object ({reference}). Using IP {PLACEHOLDER_HOST}."
            )),
        );
        self.host(PLACEHOLDER_HOST)
    }

    /// Record an unresolved service reference and return `any`.
    pub fn unresolved_service(&mut self, reference: &str, line: usize, command_id: usize) -> String {
        self.record(
            line,
            command_id,
            &Incident::manual(format!(
                "Cannot resolve service object ({reference}). Using service {ANY}."
            )),
        );
        ANY.to_string()
    }

    /// Log an incident for the context, and for the rule being built if any.
    pub fn record(&mut self, line: usize, command_id: usize, incident: &Incident) {
        if incident.severity == Severity::None {
            return;
        }
        if let Some(entity) = self.entity.as_mut() {
            *entity = heavier(entity.take(), Some(incident.clone()));
        }
        self.incidents.push(ConversionIncident {
            line,
            command_id,
            title: incident.message.clone(),
            severity: incident.severity,
        });
    }

    pub fn extend_incidents(&mut self, incidents: Vec<ConversionIncident>) {
        self.incidents.extend(incidents);
    }

    pub fn into_parts(self) -> (Repository, Vec<ConversionIncident>) {
        let mut incidents = self.incidents;
        incidents.sort_by_key(|incident| (incident.line, incident.command_id));
        (self.repository, incidents)
    }
}
