use anyhow::{bail, Context, Result};
use cfgtree_core::indent::build_tree;
use cfgtree_core::{format_json, format_text, read_lines, BlockWarning};
use fwmigrate::cisco::command::CommandKind;
use fwmigrate::cisco::{indent_options, CiscoConfig};
use fwmigrate::fortigate::FortiConfig;
use fwmigrate::known_values::default_known_values;
use fwmigrate::options::Dialect;

use crate::cli::{InspectArgs, OutputFormat};

/// Print the configuration tree, or the ASA commands of one kind.
pub fn run_inspect(args: InspectArgs) -> Result<()> {
    let lines = read_lines(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let dialect = args.dialect.unwrap_or_else(|| Dialect::detect(&lines));
    tracing::debug!(dialect = dialect.as_str(), lines = lines.len(), "inspecting configuration");

    if let Some(kind_name) = &args.kind {
        if dialect != Dialect::Asa {
            bail!("--kind is only supported for asa configurations");
        }
        let kind = CommandKind::from_name(kind_name)
            .with_context(|| format!("unknown command kind '{kind_name}'"))?;
        return print_commands(&lines, kind, args.format);
    }

    match dialect {
        Dialect::Asa => {
            let roots = build_tree(&lines, &indent_options());
            if args.format == OutputFormat::Json {
                println!("{}", format_json(&roots)?);
                return Ok(());
            }
            println!("dialect=asa lines={} roots={}", lines.len(), roots.len());
            print!("{}", format_text(&roots, args.depth));
        }
        Dialect::Fortigate => {
            let config = FortiConfig::parse(&lines);
            if args.format == OutputFormat::Json {
                println!("{}", format_json(&config.roots)?);
                return Ok(());
            }
            let vdoms: Vec<&str> = config.contexts.iter().map(|ctx| ctx.name.as_str()).collect();
            println!(
                "dialect=fortigate version={} lines={} vdoms={}",
                config.version.as_deref().unwrap_or("unknown"),
                config.line_count,
                vdoms.join(",")
            );
            for warning in &config.warnings {
                match warning {
                    BlockWarning::UnmatchedClose { line, keyword } => {
                        println!("warning line={line} unmatched {keyword}")
                    }
                    BlockWarning::Unclosed { line, text } => {
                        println!("warning line={line} unclosed {text}")
                    }
                }
            }
            print!("{}", format_text(&config.roots, args.depth));
        }
    }
    Ok(())
}

fn print_commands(lines: &[String], kind: CommandKind, format: OutputFormat) -> Result<()> {
    let known = default_known_values();
    let config = CiscoConfig::parse(lines, &known, false);
    let commands = config.filter(kind);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&commands)?),
        OutputFormat::Text => {
            println!("kind={} count={}", kind.as_str(), commands.len());
            for cmd in commands {
                let incident = cmd
                    .incident
                    .as_ref()
                    .map(|incident| format!(" [{}: {}]", incident.severity.as_str(), incident.message))
                    .unwrap_or_default();
                println!("#{} L{} {}{}", cmd.id, cmd.line, cmd.text, incident);
            }
        }
    }
    Ok(())
}
