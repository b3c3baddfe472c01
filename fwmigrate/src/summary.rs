use serde::Serialize;

use crate::incident::count_by_severity;
use crate::translate::Conversion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub objects: usize,
    pub layers: usize,
    pub rules_before: usize,
    pub rules_after: usize,
    pub nat_rules: usize,
    pub informative: usize,
    pub manual: usize,
}

pub fn summarize(conversion: &Conversion) -> ConversionSummary {
    let (informative, manual) = count_by_severity(&conversion.incidents);
    ConversionSummary {
        objects: conversion.repository.user_objects().len(),
        layers: conversion.package.sub_policies.len() + 1,
        rules_before: conversion.rules_before,
        rules_after: conversion.rules_after(),
        nat_rules: conversion.package.nat_rules.len(),
        informative,
        manual,
    }
}

pub fn render(context: &str, summary: ConversionSummary) -> String {
    format!(
        "convert_summary context={} objects={} layers={} rules_before={} rules_after={} nat_rules={} informative={} manual={}",
        context,
        summary.objects,
        summary.layers,
        summary.rules_before,
        summary.rules_after,
        summary.nat_rules,
        summary.informative,
        summary.manual
    )
}
