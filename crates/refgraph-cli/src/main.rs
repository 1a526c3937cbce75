//! refgraph command line.
//!
//! Follows the external and remote `$ref` graph of OpenAPI specs and plans
//! where referenced entities would land under `components`.

mod report;

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info_span, Instrument};

use refgraph::{
    load_spec_node, parse_document, plan_component_slots, resolve_many_with_options,
    resolve_one_with_options, RefScope, ResolveOptions, SpecNode,
};
use refgraph_fetch::{FetcherConfig, SourceFetcher};
use refgraph_telemetry::{
    log_reference_missing, log_resolution_completed, log_resolution_failed,
    log_resolution_started, log_slots_planned, LogFormat, TelemetryConfig,
};

use report::{plan_text, ResolveReport};

#[derive(Parser, Debug)]
#[command(name = "refgraph", about = "Resolve multi-file OpenAPI $ref graphs", version)]
struct Cli {
    /// Log level (overridden by RUST_LOG).
    #[arg(long, global = true, env = "REFGRAPH_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log format (json or pretty).
    #[arg(long, global = true, env = "REFGRAPH_LOG_FORMAT", default_value = "pretty")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch every document reachable from the given root spec(s).
    Resolve {
        /// Root spec file(s) (YAML or JSON).
        #[arg(short, long, required = true, num_args = 1..)]
        spec: Vec<String>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Also follow relative file references, not only URLs.
        #[arg(long)]
        follow_external: bool,

        /// Exit with an error when any reference is missing.
        #[arg(long)]
        strict: bool,

        /// Origin tag sent along with every fetch.
        #[arg(long, default_value = "cli")]
        origin: String,

        /// Per-request timeout in seconds.
        #[arg(long, env = "REFGRAPH_TIMEOUT_SECS", default_value = "30")]
        timeout_secs: u64,

        /// Connection timeout in seconds.
        #[arg(long, default_value = "10")]
        connect_timeout_secs: u64,

        /// Allow plaintext http:// URLs.
        #[arg(long)]
        allow_plaintext: bool,
    },

    /// Show where each external reference would be placed under `components`.
    Plan {
        /// Spec file (YAML or JSON).
        #[arg(short, long)]
        spec: String,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

/// Settings for one `resolve` run.
struct ResolveArgs<'a> {
    specs: &'a [String],
    format: OutputFormat,
    follow_external: bool,
    strict: bool,
    origin: &'a str,
    timeout: Duration,
    connect_timeout: Duration,
    allow_plaintext: bool,
}

/// Run the resolve command.
async fn run_resolve(args: ResolveArgs<'_>) -> ExitCode {
    let fetcher = match SourceFetcher::new(
        FetcherConfig::new()
            .with_request_timeout(args.timeout)
            .with_connect_timeout(args.connect_timeout)
            .with_allow_plaintext(args.allow_plaintext),
    ) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let scope = if args.follow_external {
        RefScope::RemoteAndExternal
    } else {
        RefScope::Remote
    };
    let options = ResolveOptions::new().with_scope(scope);

    let mut report = ResolveReport::default();
    let mut roots = Vec::with_capacity(args.specs.len());
    for spec_path in args.specs {
        match load_spec_node(Path::new(spec_path)) {
            Ok(node) => roots.push(node),
            Err(e) => {
                log_resolution_failed!(root = %spec_path, error = %e, "cannot read root spec");
                report.fail(spec_path.clone(), format!("cannot read file: {}", e));
            }
        }
    }

    log_resolution_started!(roots = roots.len(), origin = %args.origin, "resolving");

    // A single root is resolved strictly: an empty file is an error. With
    // several roots, empty ones are skipped.
    let outcome = if args.specs.len() == 1 {
        match roots.pop() {
            Some(root) => resolve_one_with_options(root, args.origin, &fetcher, &options)
                .await
                .map(|resolution| vec![resolution]),
            None => Ok(Vec::new()),
        }
    } else {
        for root in roots.iter().filter(|root| root.is_empty()) {
            report.skip(root.file_name.clone());
        }
        resolve_many_with_options(roots, args.origin, &fetcher, &options).await
    };

    match outcome {
        Ok(resolutions) => {
            for resolution in &resolutions {
                for missing in &resolution.missing_remote_refs {
                    log_reference_missing!(
                        root = %resolution.spec_root.file_name,
                        reference = %missing.path,
                        "reference could not be fetched"
                    );
                }
                log_resolution_completed!(
                    root = %resolution.spec_root.file_name,
                    resolved = resolution.remote_refs.len(),
                    missing = resolution.missing_remote_refs.len(),
                    "resolved"
                );
                report.push(resolution);
            }
        }
        Err(e) => {
            log_resolution_failed!(error = %e, "resolution aborted");
            report.fail(args.specs.join(", "), e.to_string());
        }
    }

    if let Err(e) = emit_resolve(&report, args.format) {
        eprintln!("error: {:#}", e);
        return ExitCode::from(1);
    }

    if !report.failures.is_empty() || (args.strict && report.has_missing()) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn emit_resolve(report: &ResolveReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let output = serde_json::to_string_pretty(&report.to_json())
                .context("failed to serialize report")?;
            println!("{}", output);
        }
        OutputFormat::Text => {
            for line in report.to_text() {
                eprintln!("{}", line);
            }
        }
    }
    Ok(())
}

/// Run the plan command.
fn run_plan(spec_path: &str, format: OutputFormat) -> ExitCode {
    match plan(spec_path, format) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_resolution_failed!(root = %spec_path, error = %e, "planning failed");
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn plan(spec_path: &str, format: OutputFormat) -> anyhow::Result<()> {
    let node: SpecNode = load_spec_node(Path::new(spec_path))
        .with_context(|| format!("cannot read {}", spec_path))?;
    let document = parse_document(&node.file_name, &node.content)?;
    let slots = plan_component_slots(&document);
    log_slots_planned!(root = %spec_path, slots = slots.len(), "planned component slots");

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "file": spec_path,
                "slots": slots,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&output).context("failed to serialize plan")?
            );
        }
        OutputFormat::Text => {
            for line in plan_text(spec_path, &slots) {
                eprintln!("{}", line);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_format = match LogFormat::parse(&cli.log_format) {
        Some(format) => format,
        None => {
            eprintln!("error: unknown log format '{}' (expected json or pretty)", cli.log_format);
            return ExitCode::from(1);
        }
    };
    let telemetry = TelemetryConfig::new()
        .with_log_level(cli.log_level.as_str())
        .with_log_format(log_format);
    if let Err(e) = refgraph_telemetry::init(&telemetry) {
        eprintln!("error: {}", e);
        return ExitCode::from(1);
    }

    let span = info_span!("refgraph", service = %telemetry.service_name);

    match cli.command {
        Commands::Resolve {
            spec,
            format,
            follow_external,
            strict,
            origin,
            timeout_secs,
            connect_timeout_secs,
            allow_plaintext,
        } => {
            run_resolve(ResolveArgs {
                specs: &spec,
                format,
                follow_external,
                strict,
                origin: &origin,
                timeout: Duration::from_secs(timeout_secs),
                connect_timeout: Duration::from_secs(connect_timeout_secs),
                allow_plaintext,
            })
            .instrument(span)
            .await
        }
        Commands::Plan { spec, format } => span.in_scope(|| run_plan(&spec, format)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn resolve_accepts_several_specs() {
        let cli = Cli::try_parse_from([
            "refgraph", "resolve", "--spec", "a.yaml", "b.yaml", "--format", "json", "--strict",
        ])
        .unwrap();
        match cli.command {
            Commands::Resolve {
                spec,
                format,
                strict,
                origin,
                ..
            } => {
                assert_eq!(spec, vec!["a.yaml", "b.yaml"]);
                assert_eq!(format, OutputFormat::Json);
                assert!(strict);
                assert_eq!(origin, "cli");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn resolve_timeouts_default_and_override() {
        let cli = Cli::try_parse_from(["refgraph", "resolve", "--spec", "a.yaml"]).unwrap();
        match cli.command {
            Commands::Resolve {
                connect_timeout_secs,
                ..
            } => assert_eq!(connect_timeout_secs, 10),
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from([
            "refgraph", "resolve", "--spec", "a.yaml", "--connect-timeout-secs", "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Resolve {
                connect_timeout_secs,
                ..
            } => assert_eq!(connect_timeout_secs, 3),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn resolve_requires_a_spec() {
        assert!(Cli::try_parse_from(["refgraph", "resolve"]).is_err());
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["refgraph", "plan", "--spec", "a.yaml", "--format", "xml"]).is_err());
    }
}
