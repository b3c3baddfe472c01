use std::collections::HashMap;

use crate::known_values::KnownValues;
use crate::model::names::ANY;
use crate::model::objects::{CpObject, ObjectKind};

/// The predefined ICMP protocol object name.
pub const ICMP_PROTO: &str = "icmp-proto";

#[derive(Debug, Clone)]
struct Entry {
    object: CpObject,
    predefined: bool,
}

/// Name-keyed object store with at most one object per name.
///
/// Seeded with the predefined services from the known-value tables; user
/// objects keep insertion order for output.
#[derive(Debug, Clone)]
pub struct Repository {
    entries: HashMap<String, Entry>,
    order: Vec<String>,
    known_services: HashMap<String, String>,
}

impl Repository {
    pub fn new(known: &KnownValues) -> Self {
        let mut repo = Self {
            entries: HashMap::new(),
            order: Vec::new(),
            known_services: known.services_by_key().clone(),
        };
        for name in [ANY, ICMP_PROTO] {
            repo.insert(CpObject::new(name, ObjectKind::Predefined), true);
        }
        for name in known.predefined_names() {
            repo.insert(CpObject::new(name, ObjectKind::Predefined), true);
        }
        repo
    }

    fn insert(&mut self, object: CpObject, predefined: bool) -> bool {
        if object.name.is_empty() || self.entries.contains_key(&object.name) {
            return false;
        }
        self.order.push(object.name.clone());
        self.entries
            .insert(object.name.clone(), Entry { object, predefined });
        true
    }

    /// Add a user object. No-op returning false when the name is empty or taken.
    pub fn add(&mut self, object: CpObject) -> bool {
        self.insert(object, false)
    }

    pub fn has(&self, name: &str) -> bool {
        !name.is_empty() && self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CpObject> {
        self.entries.get(name).map(|entry| &entry.object)
    }

    /// Remove an object by name, predefined or not.
    pub fn remove(&mut self, name: &str) -> Option<CpObject> {
        if name.is_empty() {
            return None;
        }
        let entry = self.entries.remove(name)?;
        self.order.retain(|existing| existing != name);
        Some(entry.object)
    }

    pub fn is_predefined(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|entry| entry.predefined)
    }

    pub fn predefined_objects(&self) -> Vec<&CpObject> {
        self.ordered(true)
    }

    /// User objects in insertion order.
    pub fn user_objects(&self) -> Vec<&CpObject> {
        self.ordered(false)
    }

    fn ordered(&self, predefined: bool) -> Vec<&CpObject> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name))
            .filter(|entry| entry.predefined == predefined)
            .map(|entry| &entry.object)
            .collect()
    }

    /// Predefined service name for a `<PROTO>_<port-or-type>` key.
    ///
    /// Returns `(name, true)` when known, otherwise `(key, false)`.
    pub fn known_service_name(&self, key: &str) -> (String, bool) {
        match self.known_services.get(key) {
            Some(name) => (name.clone(), true),
            None => (key.to_string(), false),
        }
    }

    /// True for `any`, `icmp-proto`, and every predefined service.
    pub fn is_known_service(&self, name: &str) -> bool {
        name == ANY || name == ICMP_PROTO || self.known_services.values().any(|v| v == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
