//! Rule-base optimizer.
//!
//! Merges rules of one layer into fewer rules without changing which traffic
//! is matched. Two rules are similar when they agree on action, enabled state,
//! both negation flags, and time objects, and when two of the three columns
//! source, destination, and service hold the same name set. Merging takes the
//! distinct union of every column.
//!
//! A pass only looks for a merge target inside the trailing run of rules that
//! share the incoming rule's action, so rule order across actions is kept.
//! Passes repeat until one produces no reduction.

use std::collections::HashSet;

use crate::incident::heavier;
use crate::model::{Layer, Rule, ANY};

/// Optimize `layer` into a new layer called `new_name`.
pub fn optimize_layer(layer: &Layer, new_name: &str) -> Layer {
    let mut current = layer.rules.clone();

    loop {
        let mut next: Vec<Rule> = Vec::with_capacity(current.len());
        for rule in &current {
            add_rule(&mut next, rule, new_name);
        }
        let reduced = next.len() < current.len();
        current = next;
        if !reduced {
            break;
        }
    }

    for rule in &mut current {
        rule.conversion_comments = summarize_comments(&rule.conversion_comments);
    }

    Layer {
        name: new_name.to_string(),
        comments: layer.comments.clone(),
        rules: current,
    }
}

fn add_rule(rules: &mut Vec<Rule>, incoming: &Rule, layer: &str) {
    if let Some(start) = same_action_tail(rules, incoming) {
        if let Some(pos) = (start..rules.len()).find(|&i| is_similar(&rules[i], incoming)) {
            rules[pos] = merge_rules(&rules[pos], incoming);
            return;
        }
    }
    rules.push(incoming.clone_for_layer(layer));
}

/// Start of the trailing run of rules sharing the incoming rule's action.
fn same_action_tail(rules: &[Rule], incoming: &Rule) -> Option<usize> {
    let run = rules
        .iter()
        .rev()
        .take_while(|rule| rule.action == incoming.action)
        .count();
    (run > 0).then(|| rules.len() - run)
}

/// Whether two rules can be merged without changing what they match.
pub fn is_similar(a: &Rule, b: &Rule) -> bool {
    if a.action != b.action
        || a.enabled != b.enabled
        || a.source_negated != b.source_negated
        || a.destination_negated != b.destination_negated
    {
        return false;
    }
    if a.time.len() != b.time.len() || a.time.first() != b.time.first() {
        return false;
    }

    let source = same_names(&a.source, &b.source);
    let destination = same_names(&a.destination, &b.destination);
    let service = same_names(&a.service, &b.service);
    (source && destination) || (destination && service) || (source && service)
}

fn same_names(a: &[String], b: &[String]) -> bool {
    let left: HashSet<&str> = a.iter().map(String::as_str).collect();
    let right: HashSet<&str> = b.iter().map(String::as_str).collect();
    left == right
}

/// Merge two similar rules. Identity columns come from `first`.
pub fn merge_rules(first: &Rule, second: &Rule) -> Rule {
    let second_wins = match (&first.incident, &second.incident) {
        (Some(a), Some(b)) => b.severity > a.severity,
        (None, Some(_)) => true,
        _ => false,
    };
    let converted_command_id = if second_wins {
        second.converted_command_id
    } else {
        first.converted_command_id
    };
    let incident = heavier(first.incident.clone(), second.incident.clone());

    Rule {
        name: first.name.clone(),
        comments: String::new(),
        conversion_comments: format!(
            "{} | {}",
            first.conversion_comments, second.conversion_comments
        ),
        layer: first.layer.clone(),
        source: union(&first.source, &second.source),
        destination: union(&first.destination, &second.destination),
        service: union(&first.service, &second.service),
        time: union(&first.time, &second.time),
        applications: match (&first.applications, &second.applications) {
            (None, None) => None,
            (a, b) => Some(union(
                a.as_deref().unwrap_or_default(),
                b.as_deref().unwrap_or_default(),
            )),
        },
        action: first.action,
        track: first.track,
        enabled: first.enabled && second.enabled,
        source_negated: first.source_negated,
        destination_negated: first.destination_negated,
        sub_policy: first.sub_policy.clone(),
        incident,
        converted_command_id,
    }
}

/// Distinct union in first-seen order, dropping one `any` when more than one name remains.
fn union(a: &[String], b: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out: Vec<String> = a
        .iter()
        .chain(b)
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect();
    if out.len() > 1 {
        if let Some(pos) = out.iter().position(|name| name == ANY) {
            out.remove(pos);
        }
    }
    out
}

/// Rewrite numbered conversion comments as `optimized of access-list <n1> <n2> ...`.
///
/// Tokens containing a digit immediately followed by `)` are kept without
/// their last character; comments without such tokens are returned unchanged.
pub fn summarize_comments(comments: &str) -> String {
    let numbers: Vec<&str> = comments
        .split(' ')
        .filter(|part| is_numbered(part))
        .map(|part| &part[..part.len() - 1])
        .collect();
    if numbers.is_empty() {
        return comments.to_string();
    }
    format!("optimized of access-list {}", numbers.join(" "))
}

fn is_numbered(part: &str) -> bool {
    part.as_bytes()
        .windows(2)
        .any(|pair| pair[0].is_ascii_digit() && pair[1] == b')')
}
