use serde::Serialize;

use crate::incident::Incident;

/// Day of the week, Sunday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    /// Parse a full or three-letter day name, case-insensitively.
    pub fn parse(text: &str) -> Option<Weekday> {
        let lower = text.to_ascii_lowercase();
        Weekday::ALL.into_iter().find(|day| {
            let full = day.as_str().to_ascii_lowercase();
            lower == full || (lower.len() == 3 && full.starts_with(&lower))
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sunday",
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A recurring window on a set of days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayWindow {
    pub days: Vec<Weekday>,
    pub from: String,
    pub to: String,
}

/// Vendor-neutral object kinds stored in a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    /// Seeded from the known-value tables.
    Predefined,
    Host {
        ip: String,
    },
    Network {
        subnet: String,
        netmask: String,
    },
    Range {
        from: String,
        to: String,
    },
    Domain {
        fqdn: String,
    },
    Zone,
    TcpService {
        port: String,
        source_port: String,
    },
    UdpService {
        port: String,
        source_port: String,
    },
    SctpService {
        port: String,
    },
    IcmpService {
        icmp_type: String,
        code: String,
    },
    OtherService {
        ip_protocol: String,
    },
    NetworkGroup {
        members: Vec<String>,
    },
    ServiceGroup {
        members: Vec<String>,
    },
    TimeWindow {
        start: Option<String>,
        end: Option<String>,
        recurrence: Vec<DayWindow>,
    },
    TimeGroup {
        members: Vec<String>,
    },
    AccessRole {
        networks: Vec<String>,
        users: Vec<String>,
    },
}

/// A named entity in the normalized model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpObject {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comments: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident: Option<Incident>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_command_id: Option<usize>,
    #[serde(flatten)]
    pub kind: ObjectKind,
}

impl CpObject {
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            comments: String::new(),
            incident: None,
            converted_command_id: None,
            kind,
        }
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = comments.into();
        self
    }

    pub fn with_origin(mut self, command_id: usize, incident: Option<Incident>) -> Self {
        self.converted_command_id = Some(command_id);
        self.incident = incident;
        self
    }

    pub fn is_service(&self) -> bool {
        matches!(
            self.kind,
            ObjectKind::TcpService { .. }
                | ObjectKind::UdpService { .. }
                | ObjectKind::SctpService { .. }
                | ObjectKind::IcmpService { .. }
                | ObjectKind::OtherService { .. }
                | ObjectKind::ServiceGroup { .. }
        )
    }

    pub fn is_network(&self) -> bool {
        matches!(
            self.kind,
            ObjectKind::Host { .. }
                | ObjectKind::Network { .. }
                | ObjectKind::Range { .. }
                | ObjectKind::Domain { .. }
                | ObjectKind::NetworkGroup { .. }
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Predefined => "predefined",
            ObjectKind::Host { .. } => "host",
            ObjectKind::Network { .. } => "network",
            ObjectKind::Range { .. } => "range",
            ObjectKind::Domain { .. } => "domain",
            ObjectKind::Zone => "zone",
            ObjectKind::TcpService { .. } => "tcp_service",
            ObjectKind::UdpService { .. } => "udp_service",
            ObjectKind::SctpService { .. } => "sctp_service",
            ObjectKind::IcmpService { .. } => "icmp_service",
            ObjectKind::OtherService { .. } => "other_service",
            ObjectKind::NetworkGroup { .. } => "network_group",
            ObjectKind::ServiceGroup { .. } => "service_group",
            ObjectKind::TimeWindow { .. } => "time_window",
            ObjectKind::TimeGroup { .. } => "time_group",
            ObjectKind::AccessRole { .. } => "access_role",
        }
    }
}
