//! CiteScout CLI
//!
//! Reads a document from a file argument or stdin, runs the citation
//! pipeline against Semantic Scholar, and streams one NDJSON event per
//! sentence to stdout. Ctrl-C cancels the run cleanly.

use anyhow::{bail, Context};
use citescout_common::config::PipelineConfig;
use citescout_common::metrics::register_metrics;
use citescout_common::model::{CitationStyle, FilterSet};
use citescout_common::VERSION;
use citescout_pipeline::CitationPipeline;
use citescout_provider::SemanticScholarClient;
use std::io::Read;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct CliArgs {
    input_path: Option<String>,
    styles: Vec<CitationStyle>,
    filters: FilterSet,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<CliArgs> {
    let mut input_path = None;
    let mut styles = vec![CitationStyle::Apa];
    let mut filters = FilterSet::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--styles" => {
                let value = args
                    .next()
                    .context("--styles requires a comma-separated list")?;
                styles = value
                    .split(',')
                    .map(|name| {
                        CitationStyle::parse(name.trim())
                            .with_context(|| format!("unknown citation style '{}'", name.trim()))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()?;
            }
            "--year-range" => {
                let value = args.next().context("--year-range requires MIN-MAX")?;
                let (min, max) = value
                    .split_once('-')
                    .context("--year-range expects MIN-MAX, e.g. 2015-2024")?;
                filters.year_range = Some((
                    min.trim().parse().context("invalid minimum year")?,
                    max.trim().parse().context("invalid maximum year")?,
                ));
            }
            "--venue" => {
                filters
                    .venues
                    .insert(args.next().context("--venue requires a venue name")?);
            }
            "--field-of-study" => {
                filters.fields_of_study.insert(
                    args.next()
                        .context("--field-of-study requires a field name")?,
                );
            }
            "--min-citations" => {
                let value = args.next().context("--min-citations requires a count")?;
                filters.min_citation_count =
                    Some(value.parse().context("invalid citation count")?);
            }
            "--open-access-only" => filters.open_access_only = true,
            "--help" | "-h" => {
                eprintln!("usage: citescout [OPTIONS] [FILE]");
                eprintln!("reads FILE (or stdin) and streams citation events as NDJSON");
                eprintln!();
                eprintln!("options:");
                eprintln!("  --styles apa,mla,...     citation styles to render (default: apa)");
                eprintln!("  --year-range MIN-MAX     only papers published in this range");
                eprintln!("  --venue NAME             restrict to a venue (repeatable)");
                eprintln!("  --field-of-study NAME    restrict to a field (repeatable)");
                eprintln!("  --min-citations N        minimum citation count");
                eprintln!("  --open-access-only       only open-access papers");
                std::process::exit(0);
            }
            _ if arg.starts_with('-') => bail!("unknown flag '{}'", arg),
            _ => input_path = Some(arg),
        }
    }
    Ok(CliArgs {
        input_path,
        styles,
        filters,
    })
}

fn read_document(path: Option<&str>) -> anyhow::Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))
        }
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = PipelineConfig::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.observability.log_level.clone()));
    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
    register_metrics();

    info!("CiteScout v{}", VERSION);
    let args = parse_args(std::env::args().skip(1))?;
    let document = read_document(args.input_path.as_deref())?;

    let provider = Arc::new(
        SemanticScholarClient::new(&config.provider, config.ranker.fetch_limit)
            .context("failed to build search client")?,
    );
    let pipeline = CitationPipeline::new(provider, config);

    let mut run = pipeline.start(&document, args.filters, args.styles)?;
    let handle = run.handle();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, cancelling run");
                handle.cancel();
                break;
            }
            event = run.next_event() => {
                let Some(event) = event else { break };
                println!("{}", serde_json::to_string(&event)?);
            }
        }
    }

    let state = handle.wait_until_terminal().await;
    info!(state = ?state, "run finished");
    Ok(())
}
