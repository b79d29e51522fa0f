use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use ticket_triage::config::{AnalyzerConfig, parse_reference_time};
use ticket_triage::pipeline::processor::TicketProcessor;
use ticket_triage::report::render_text;
use ticket_triage::sources::ExportFileSource;

/// Classify helpdesk tickets from a JSON message export.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Message export (JSON)
    #[arg(env = "TICKETS_INPUT")]
    input: PathBuf,

    /// Where to write the JSON summary
    #[arg(long, short, env = "TICKETS_OUTPUT", default_value = "ticket_analysis_results.json")]
    output: PathBuf,

    /// Reference time, YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS" (overrides TICKETS_NOW)
    #[arg(long)]
    now: Option<String>,

    /// Customer-facing sender alias (overrides TICKETS_CUSTOMER_ALIAS)
    #[arg(long)]
    alias: Option<String>,

    /// Skip the console report
    #[arg(long, short)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = AnalyzerConfig::from_env().context("reading configuration")?;
    if let Some(now) = &args.now {
        config = config.with_reference_time(parse_reference_time("--now", now)?);
    }
    if let Some(alias) = args.alias {
        config = config.with_customer_alias(alias);
    }

    tracing::info!(
        reference_time = %config.reference_time,
        alias = %config.customer_alias,
        "Starting ticket analysis"
    );

    let source = ExportFileSource::new(&args.input);
    let processor = TicketProcessor::with_default_rules(config);
    let report = ticket_triage::run(&processor, &source, &args.output)
        .await
        .with_context(|| {
            format!(
                "analyzing {} into {}",
                args.input.display(),
                args.output.display()
            )
        })?;

    if !args.quiet {
        println!("{}", render_text(&report));
    }

    eprintln!("\nDetailed results saved to {}", args.output.display());
    Ok(())
}
