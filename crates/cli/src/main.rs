use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use stepcall_engine::{HttpStep, InputResolver, ResolvedStepInput, RuntimeParams, parse_runtime_params_file, parse_step_file};
use stepcall_util::redact_sensitive;
use tracing::debug;

/// Run HTTP workflow steps outside a workflow engine.
#[derive(Debug, Parser)]
#[command(name = "stepcall", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a step definition and perform its HTTP call.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Step definition (YAML or JSON).
    step_file: PathBuf,
    /// Runtime parameters (YAML or JSON mapping), layered over the step file's defaults.
    #[arg(long, value_name = "FILE")]
    params: Option<PathBuf>,
    /// Set one runtime parameter; the value is parsed as JSON, falling back to a plain string.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    set: Vec<(String, Value)>,
    /// Print the resolved request instead of sending it.
    #[arg(long)]
    dry_run: bool,
    /// Print JSON on a single line.
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run_step(&args),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_step(args: &RunArgs) -> Result<()> {
    let step_file = parse_step_file(&args.step_file)?;
    let file_params = match &args.params {
        Some(path) => Some(parse_runtime_params_file(path)?),
        None => None,
    };
    let params = merge_params(step_file.params, file_params, &args.set);
    debug!(parameter_count = params.len(), dry_run = args.dry_run, "running step");

    let output = if args.dry_run {
        let resolved = InputResolver::default().resolve(&step_file.step, &params)?;
        dry_run_summary(&resolved)
    } else {
        let step = HttpStep::from_env().context("could not configure the HTTP client")?;
        let response = step.run(&step_file.step, &params)?;
        serde_json::to_value(&response)?
    };

    let rendered = if args.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{rendered}");
    Ok(())
}

/// Layer parameters: step defaults, then the parameter file, then `--set` pairs.
fn merge_params(defaults: RuntimeParams, file_params: Option<RuntimeParams>, overrides: &[(String, Value)]) -> RuntimeParams {
    let mut merged = defaults;
    if let Some(file_params) = file_params {
        merged.extend(file_params);
    }
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn parse_key_value(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing parameter name in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn dry_run_summary(resolved: &ResolvedStepInput) -> Value {
    let headers: Map<String, Value> = resolved
        .headers
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(redact_header_value(name, value))))
        .collect();

    let mut summary = Map::new();
    summary.insert("method".into(), Value::String(resolved.method.clone()));
    summary.insert("url".into(), Value::String(redact_sensitive(&resolved.url)));
    summary.insert("headers".into(), Value::Object(headers));
    summary.insert("accept".into(), Value::String(resolved.accept.clone()));
    summary.insert("body".into(), resolved.body.clone());
    Value::Object(summary)
}

fn redact_header_value(name: &str, value: &str) -> String {
    let lowered = name.to_ascii_lowercase();
    let sensitive = matches!(lowered.as_str(), "authorization" | "proxy-authorization" | "cookie")
        || ["key", "token", "secret", "password"].iter().any(|marker| lowered.contains(marker));
    if sensitive { "<redacted>".to_string() } else { redact_sensitive(value) }
}
