//! Conversion incidents.
//!
//! Every fallback taken while parsing or translating leaves an [`Incident`] on
//! the command, object, or rule it affects. Parse and translate routines never
//! log; once a context is finished its incidents are collected into
//! [`ConversionIncident`] records and handed to [`report_incidents`].

use serde::Serialize;
use tracing::{info, warn};

/// How much operator attention an incident needs. Ordered by weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    None,
    Informative,
    ManualActionRequired,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Informative => "informative",
            Severity::ManualActionRequired => "manual_action_required",
        }
    }
}

/// A severity and message attached to one converted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Incident {
    pub severity: Severity,
    pub message: String,
}

impl Incident {
    pub fn informative(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Informative,
            message: message.into(),
        }
    }

    pub fn manual(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::ManualActionRequired,
            message: message.into(),
        }
    }
}

/// Pick the heavier of two optional incidents; on a tie the first wins.
pub fn heavier(first: Option<Incident>, second: Option<Incident>) -> Option<Incident> {
    match (first, second) {
        (Some(a), Some(b)) => {
            if b.severity > a.severity {
                Some(b)
            } else {
                Some(a)
            }
        }
        (a, b) => a.or(b),
    }
}

/// An incident tied to a source location, ready for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionIncident {
    /// 1-based source line number.
    pub line: usize,
    /// Sequence id of the command that produced the incident.
    pub command_id: usize,
    pub title: String,
    pub severity: Severity,
}

/// Count incidents per severity as `(informative, manual_action_required)`.
pub fn count_by_severity(incidents: &[ConversionIncident]) -> (usize, usize) {
    incidents.iter().fold((0, 0), |(info, manual), incident| {
        match incident.severity {
            Severity::Informative => (info + 1, manual),
            Severity::ManualActionRequired => (info, manual + 1),
            Severity::None => (info, manual),
        }
    })
}

/// Emit one log event per incident.
pub fn report_incidents(context: &str, incidents: &[ConversionIncident]) {
    for incident in incidents {
        match incident.severity {
            Severity::ManualActionRequired => warn!(
                context,
                line = incident.line,
                command = incident.command_id,
                "{}",
                incident.title
            ),
            Severity::Informative => info!(
                context,
                line = incident.line,
                command = incident.command_id,
                "{}",
                incident.title
            ),
            Severity::None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{count_by_severity, heavier, ConversionIncident, Incident, Severity};

    #[test]
    fn heavier_keeps_the_stronger_incident() {
        let info = Incident::informative("info");
        let manual = Incident::manual("manual");
        assert_eq!(heavier(Some(info.clone()), Some(manual.clone())), Some(manual.clone()));
        assert_eq!(heavier(Some(manual.clone()), Some(info.clone())), Some(manual));
        assert_eq!(heavier(None, Some(info.clone())), Some(info));
        assert_eq!(heavier(None, None), None);
    }

    #[test]
    fn heavier_tie_keeps_first_operand() {
        let first = Incident::manual("first");
        let second = Incident::manual("second");
        assert_eq!(heavier(Some(first.clone()), Some(second)), Some(first));
    }

    #[test]
    fn severities_are_ordered() {
        assert!(Severity::None < Severity::Informative);
        assert!(Severity::Informative < Severity::ManualActionRequired);
    }

    #[test]
    fn counts_split_by_severity() {
        let incidents = vec![
            ConversionIncident {
                line: 1,
                command_id: 1,
                title: "a".to_string(),
                severity: Severity::Informative,
            },
            ConversionIncident {
                line: 2,
                command_id: 2,
                title: "b".to_string(),
                severity: Severity::ManualActionRequired,
            },
            ConversionIncident {
                line: 3,
                command_id: 3,
                title: "c".to_string(),
                severity: Severity::ManualActionRequired,
            },
        ];
        assert_eq!(count_by_severity(&incidents), (1, 2));
    }
}
