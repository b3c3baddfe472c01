//! Symbol table and reference resolution.
//!
//! A table holds the named objects declared so far (`ids`) and literal aliases
//! (`name 10.0.0.1 web` style). Both maps are first-writer-wins. An alias whose
//! key is also an object id is shadowed by the id. Tables are scoped to one
//! configuration context.

use std::collections::{HashMap, HashSet};

/// Declared ids and aliases for one configuration context.
#[derive(Debug, Clone)]
pub struct SymbolTable<T> {
    ids: HashMap<String, T>,
    aliases: HashMap<String, String>,
}

impl<T> Default for SymbolTable<T> {
    fn default() -> Self {
        Self {
            ids: HashMap::new(),
            aliases: HashMap::new(),
        }
    }
}

/// Outcome of resolving a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<'a, T> {
    /// The name (or the alias literal it points at) is a declared id.
    Id(&'a T),
    /// The name is an alias for a literal value.
    Literal(String),
    /// Neither an id nor an alias.
    Unresolved,
}

impl<T> SymbolTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an id. Returns false for an empty name or an existing id.
    pub fn declare(&mut self, name: &str, value: T) -> bool {
        if name.is_empty() || self.ids.contains_key(name) {
            return false;
        }
        self.ids.insert(name.to_string(), value);
        true
    }

    /// Record `alias -> literal`. Returns false when either side is empty or the alias exists.
    pub fn add_alias(&mut self, alias: &str, literal: &str) -> bool {
        if alias.is_empty() || literal.is_empty() || self.aliases.contains_key(alias) {
            return false;
        }
        self.aliases.insert(alias.to_string(), literal.to_string());
        true
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.ids.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    /// Substitute an alias with its literal, or return the name unchanged.
    pub fn dealias<'a>(&'a self, name: &'a str) -> &'a str {
        self.alias(name).unwrap_or(name)
    }

    /// Drop aliases whose key is also a declared id. Returns how many were dropped.
    pub fn prune_shadowed_aliases(&mut self) -> usize {
        let before = self.aliases.len();
        let ids = &self.ids;
        self.aliases.retain(|alias, _| !ids.contains_key(alias));
        before - self.aliases.len()
    }

    /// Resolve `name`: declared id first, then one alias hop retried as an id.
    pub fn resolve(&self, name: &str) -> Resolved<'_, T> {
        if let Some(value) = self.ids.get(name) {
            return Resolved::Id(value);
        }
        match self.aliases.get(name) {
            Some(literal) => match self.ids.get(literal) {
                Some(value) => Resolved::Id(value),
                None => Resolved::Literal(literal.clone()),
            },
            None => Resolved::Unresolved,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = (&str, &T)> {
        self.ids.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.aliases.clear();
    }
}

/// What a name refers to during group expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    /// A terminal object.
    Leaf,
    /// A group with the listed member names.
    Group(Vec<String>),
}

/// Flattened membership of a group and every problem found on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupExpansion {
    /// Leaf names in first-seen order, each at most once.
    pub leaves: Vec<String>,
    /// Group names visited, including the root.
    pub groups: Vec<String>,
    pub errors: Vec<String>,
}

impl GroupExpansion {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Expand `root` recursively using `lookup`, visiting every name at most once.
///
/// Unknown members and reference cycles are collected as errors; expansion
/// keeps going so that every reason is reported.
pub fn expand_group<F>(root: &str, lookup: F) -> GroupExpansion
where
    F: Fn(&str) -> Option<Member>,
{
    let mut state = Expansion {
        lookup,
        visited: HashSet::new(),
        path: Vec::new(),
        out: GroupExpansion::default(),
    };
    state.visit(root, None);
    state.out
}

struct Expansion<F> {
    lookup: F,
    visited: HashSet<String>,
    path: Vec<String>,
    out: GroupExpansion,
}

impl<F> Expansion<F>
where
    F: Fn(&str) -> Option<Member>,
{
    fn visit(&mut self, name: &str, parent: Option<&str>) {
        if self.path.iter().any(|open| open == name) {
            let chain = self.path.join(" -> ");
            self.out
                .errors
                .push(format!("reference cycle: {chain} -> {name}"));
            return;
        }
        if !self.visited.insert(name.to_string()) {
            return;
        }

        match (self.lookup)(name) {
            None => {
                let message = match parent {
                    Some(group) => format!("{group} contains non-existing member {name}"),
                    None => format!("{name} is not defined"),
                };
                self.out.errors.push(message);
            }
            Some(Member::Leaf) => self.out.leaves.push(name.to_string()),
            Some(Member::Group(members)) => {
                self.out.groups.push(name.to_string());
                self.path.push(name.to_string());
                for member in &members {
                    self.visit(member, Some(name));
                }
                self.path.pop();
            }
        }
    }
}
