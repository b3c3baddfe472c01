//! The `convert` subcommand: read, translate, report, and write the model.
//!
//! Options come from an optional TOML file and are then overridden by flags.
//! Every configuration context (one per FortiGate virtual domain) is reported
//! on its own; the JSON model is an array with one entry per context.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cfgtree_core::read_lines;
use fwmigrate::incident::report_incidents;
use fwmigrate::known_values::{default_known_values, load_known_values, KnownValues};
use fwmigrate::options::{load_options, ConvertOptions};
use fwmigrate::report::{render_incidents, render_package, render_summary};
use fwmigrate::summary::{render, summarize};
use fwmigrate::translate::{convert_lines, Conversion};

use crate::cli::{ConvertArgs, OutputFormat};
use crate::path_guard::ensure_output_differs;

pub fn run_convert(args: ConvertArgs) -> Result<()> {
    if let Some(output) = &args.output {
        ensure_output_differs(output, &args.input)?;
    }

    let lines = read_lines(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let options = resolve_options(&args)?;
    let known = resolve_tables(args.tables.as_deref());

    let conversions = convert_lines(&lines, &known, &options);
    for conversion in &conversions {
        report_incidents(&conversion.context, &conversion.incidents);
    }

    if let Some(path) = &args.output {
        fs::write(path, model_json(&conversions)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), contexts = conversions.len(), "wrote model");
        for conversion in &conversions {
            println!("{}", summary_line(conversion));
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Json => println!("{}", model_json(&conversions)?),
        OutputFormat::Text => {
            for conversion in &conversions {
                println!(
                    "context={} dialect={} version={}",
                    conversion.context,
                    conversion.dialect.as_str(),
                    conversion.version.as_deref().unwrap_or("unknown")
                );
                println!("{}", render_package(&conversion.package));
                if !conversion.incidents.is_empty() {
                    println!("{}", render_incidents(&conversion.incidents));
                }
                println!("{}", render_summary(&summary_line(conversion)));
            }
        }
    }
    Ok(())
}

fn resolve_options(args: &ConvertArgs) -> Result<ConvertOptions> {
    let mut options = match &args.options {
        Some(path) => load_options(path)
            .with_context(|| format!("failed to load options {}", path.display()))?,
        None => ConvertOptions::default(),
    };
    if args.dialect.is_some() {
        options.dialect = args.dialect;
    }
    if args.package_name.is_some() {
        options.package_name = args.package_name.clone();
    }
    if args.no_optimize {
        options.optimize = false;
    }
    if args.spread_remarks {
        options.spread_acl_remarks = true;
    }
    Ok(options)
}

fn resolve_tables(path: Option<&Path>) -> KnownValues {
    let Some(path) = path else {
        return default_known_values();
    };
    match load_known_values(path) {
        Ok(known) => known,
        Err(err) => {
            tracing::warn!("{err}; using embedded tables");
            default_known_values()
        }
    }
}

fn model_json(conversions: &[Conversion]) -> Result<String> {
    let views: Vec<_> = conversions.iter().map(Conversion::view).collect();
    serde_json::to_string_pretty(&views).context("failed to serialize model")
}

fn summary_line(conversion: &Conversion) -> String {
    render(&conversion.context, summarize(conversion))
}
