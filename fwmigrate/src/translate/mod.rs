//! Translation of parsed dialect configurations into the normalized model.
//!
//! Each configuration context (an ASA file, or one FortiGate virtual domain)
//! becomes one [`Conversion`]: a repository of objects, a policy package, and
//! the incidents raised on the way.

pub mod cisco;
pub mod context;
pub mod fortigate;

use serde::Serialize;

use crate::cisco::CiscoConfig;
use crate::fortigate::FortiConfig;
use crate::incident::ConversionIncident;
use crate::known_values::KnownValues;
use crate::model::{CpObject, Layer, Package, Repository, Rule};
use crate::optimizer::optimize_layer;
use crate::options::{ConvertOptions, Dialect};

pub use context::TranslationContext;

/// Result of translating one configuration context.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub context: String,
    pub dialect: Dialect,
    pub version: Option<String>,
    pub repository: Repository,
    pub package: Package,
    pub incidents: Vec<ConversionIncident>,
    /// Access rules before optimization, cleanup rules included.
    pub rules_before: usize,
}

impl Conversion {
    pub fn rules_after(&self) -> usize {
        self.package.total_rules()
    }

    /// Serializable view with user objects only.
    pub fn view(&self) -> ConversionView<'_> {
        ConversionView {
            context: &self.context,
            dialect: self.dialect,
            version: self.version.as_deref(),
            objects: self.repository.user_objects(),
            package: &self.package,
            incidents: &self.incidents,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversionView<'a> {
    pub context: &'a str,
    pub dialect: Dialect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'a str>,
    pub objects: Vec<&'a CpObject>,
    pub package: &'a Package,
    pub incidents: &'a [ConversionIncident],
}

/// Translate configuration lines in the given or detected dialect.
pub fn convert_lines<S: AsRef<str>>(
    lines: &[S],
    known: &KnownValues,
    options: &ConvertOptions,
) -> Vec<Conversion> {
    let dialect = options.dialect.unwrap_or_else(|| Dialect::detect(lines));
    tracing::debug!(dialect = dialect.as_str(), lines = lines.len(), "translating configuration");
    match dialect {
        Dialect::Asa => {
            let config = CiscoConfig::parse(lines, known, options.spread_acl_remarks);
            vec![cisco::translate(&config, known, options)]
        }
        Dialect::Fortigate => {
            let config = FortiConfig::parse(lines);
            fortigate::translate(&config, known, options)
        }
    }
}

/// Optimize a converted layer when enabled and close it with a cleanup rule.
///
/// Returns the layer and its rule count before optimization, cleanup included.
pub(crate) fn finish_layer(layer: Layer, options: &ConvertOptions) -> (Layer, usize) {
    let before = layer.rules.len() + 1;
    let mut layer = if options.optimize {
        optimize_layer(&layer, &layer.name)
    } else {
        layer
    };
    let cleanup = Rule::cleanup(layer.name.clone());
    layer.push(cleanup);
    (layer, before)
}

/// Union of names in first-seen order.
pub(crate) fn push_unique(list: &mut Vec<String>, name: String) {
    if !list.contains(&name) {
        list.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::finish_layer;
    use crate::model::{Action, Layer, Rule};
    use crate::options::ConvertOptions;

    fn accept(dst: &str) -> Rule {
        Rule {
            destination: vec![dst.to_string()],
            action: Action::Accept,
            ..Rule::default()
        }
    }

    #[test]
    fn finished_layer_ends_with_cleanup() {
        let mut layer = Layer::new("outside_in");
        layer.push(accept("web-01"));
        layer.push(accept("web-02"));

        let (optimized, before) = finish_layer(layer.clone(), &ConvertOptions::default());
        assert_eq!(before, 3);
        assert_eq!(optimized.rules.len(), 2);
        assert!(optimized.rules[1].is_cleanup_rule());
        assert_eq!(optimized.rules[1].layer, "outside_in");

        let options = ConvertOptions {
            optimize: false,
            ..ConvertOptions::default()
        };
        let (kept, _) = finish_layer(layer, &options);
        assert_eq!(kept.rules.len(), 3);
    }
}
