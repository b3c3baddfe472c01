use colored::Colorize;

use crate::incident::{ConversionIncident, Severity};
use crate::model::{Action, Layer, Package};

/// Render incidents, one line each, in source order.
pub fn render_incidents(incidents: &[ConversionIncident]) -> String {
    let mut out = Vec::new();
    for incident in incidents {
        let line = format!(
            "{} line={} command={} {}",
            label(incident.severity),
            incident.line,
            incident.command_id,
            incident.title
        );
        let colored = match incident.severity {
            Severity::ManualActionRequired => line.red().to_string(),
            Severity::Informative => line.yellow().to_string(),
            Severity::None => line,
        };
        out.push(colored);
    }
    out.join("\n")
}

fn label(severity: Severity) -> &'static str {
    match severity {
        Severity::ManualActionRequired => "MANUAL",
        Severity::Informative => "INFO",
        Severity::None => "NONE",
    }
}

/// Render the summary line.
pub fn render_summary(line: &str) -> String {
    line.cyan().to_string()
}

/// Render a package as an indented rule listing.
pub fn render_package(package: &Package) -> String {
    let mut out = vec![format!("package {}", package.name).bold().to_string()];
    render_layer(&mut out, &package.parent_layer);
    for layer in &package.sub_policies {
        render_layer(&mut out, layer);
    }
    for nat in &package.nat_rules {
        out.push(format!(
            "nat {:?} {} -> {} service={} -> {}",
            nat.method, nat.source, nat.translated_source, nat.service, nat.translated_service
        ));
    }
    out.join("\n")
}

fn render_layer(out: &mut Vec<String>, layer: &Layer) {
    out.push(format!("layer {}", layer.name));
    for (index, rule) in layer.rules.iter().enumerate() {
        let action = match rule.action {
            Action::Accept => "accept".green().to_string(),
            Action::Drop | Action::Reject => format!("{:?}", rule.action).to_lowercase().red().to_string(),
            Action::SubPolicy => format!(
                "sub-policy {}",
                rule.sub_policy.as_deref().unwrap_or_default()
            ),
        };
        let mut line = format!(
            "  {:>3} {} src={} dst={} svc={}",
            index + 1,
            action,
            rule.source.join(","),
            rule.destination.join(","),
            rule.service.join(",")
        );
        if !rule.time.is_empty() {
            line.push_str(&format!(" time={}", rule.time.join(",")));
        }
        if !rule.enabled {
            line.push_str(" disabled");
        }
        if !rule.conversion_comments.is_empty() {
            line.push_str(&format!(" # {}", rule.conversion_comments));
        }
        out.push(line);
    }
}
