use serde::Serialize;

use crate::incident::Incident;
use crate::model::names::ANY;

/// Name given to the closing rule of every sub-policy layer.
pub const SUB_POLICY_CLEANUP_RULE: &str = "Sub-Policy Cleanup rule";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Accept,
    #[default]
    Drop,
    Reject,
    SubPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    None,
    #[default]
    Log,
}

/// An access rule. `applications` is set only for application-aware rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comments: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub conversion_comments: String,
    pub layer: String,
    pub source: Vec<String>,
    pub destination: Vec<String>,
    pub service: Vec<String>,
    pub time: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applications: Option<Vec<String>>,
    pub action: Action,
    pub track: Track,
    pub enabled: bool,
    pub source_negated: bool,
    pub destination_negated: bool,
    /// Target layer when `action` is [`Action::SubPolicy`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident: Option<Incident>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_command_id: Option<usize>,
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            name: String::new(),
            comments: String::new(),
            conversion_comments: String::new(),
            layer: String::new(),
            source: vec![ANY.to_string()],
            destination: vec![ANY.to_string()],
            service: vec![ANY.to_string()],
            time: Vec::new(),
            applications: None,
            action: Action::Drop,
            track: Track::Log,
            enabled: true,
            source_negated: false,
            destination_negated: false,
            sub_policy: None,
            incident: None,
            converted_command_id: None,
        }
    }
}

impl Rule {
    /// Rule jumping from a parent layer into `layer`.
    pub fn sub_policy(name: impl Into<String>, layer: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: Action::SubPolicy,
            sub_policy: Some(layer.into()),
            ..Self::default()
        }
    }

    /// Any/any/any drop rule closing a sub-policy layer.
    pub fn cleanup(layer: impl Into<String>) -> Self {
        Self {
            name: SUB_POLICY_CLEANUP_RULE.to_string(),
            layer: layer.into(),
            ..Self::default()
        }
    }

    /// Copy for `layer`, keeping conversion comments and dropping user comments.
    pub fn clone_for_layer(&self, layer: &str) -> Self {
        Self {
            layer: layer.to_string(),
            comments: String::new(),
            ..self.clone()
        }
    }

    pub fn is_cleanup_rule(&self) -> bool {
        if self.name == SUB_POLICY_CLEANUP_RULE {
            return true;
        }
        let is_any = |list: &[String]| list.len() == 1 && list[0] == ANY;
        self.action == Action::Drop
            && is_any(&self.source)
            && is_any(&self.destination)
            && is_any(&self.service)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NatMethod {
    Static,
    Hide,
}

/// An address translation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NatRule {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comments: String,
    pub method: NatMethod,
    pub source: String,
    pub destination: String,
    pub service: String,
    pub translated_source: String,
    pub translated_destination: String,
    pub translated_service: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident: Option<Incident>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_command_id: Option<usize>,
}

impl NatRule {
    /// Translation of `source` only; the other columns stay original.
    pub fn source_nat(method: NatMethod, source: &str, translated: &str) -> Self {
        Self {
            name: String::new(),
            comments: String::new(),
            method,
            source: source.to_string(),
            destination: ANY.to_string(),
            service: ANY.to_string(),
            translated_source: translated.to_string(),
            translated_destination: "original".to_string(),
            translated_service: "original".to_string(),
            enabled: true,
            incident: None,
            converted_command_id: None,
        }
    }
}

/// An ordered rule base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Layer {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comments: String,
    pub rules: Vec<Rule>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comments: String::new(),
            rules: Vec::new(),
        }
    }

    /// Append a rule, stamping it with this layer's name.
    pub fn push(&mut self, mut rule: Rule) {
        rule.layer = self.name.clone();
        self.rules.push(rule);
    }
}

/// A policy package: a parent layer, its sub-policy layers, and NAT rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Package {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comments: String,
    pub parent_layer: Layer,
    pub sub_policies: Vec<Layer>,
    pub nat_rules: Vec<NatRule>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            parent_layer: Layer::new(format!("{name} Network")),
            name,
            comments: String::new(),
            sub_policies: Vec::new(),
            nat_rules: Vec::new(),
        }
    }

    /// Name of the package's access layer.
    pub fn access_layer_name(&self) -> &str {
        &self.parent_layer.name
    }

    /// Access rules across the parent layer and every sub-policy.
    pub fn total_rules(&self) -> usize {
        self.parent_layer.rules.len()
            + self
                .sub_policies
                .iter()
                .map(|layer| layer.rules.len())
                .sum::<usize>()
    }
}
