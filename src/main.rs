#![deny(warnings)]

use anyhow::{Context, anyhow};
use clap::{
    Arg, ArgAction, ArgGroup, ArgMatches, Command, crate_authors, crate_description,
    crate_version,
};
use csp_collector::{
    capture::{CaptureOutcome, CapturedReport, ProbePolicy, ReportCapture},
    collector::{CSP_HEADER_NAME, RuleCollector, format_policy_details},
    config::{Config, RawConfig},
    sources::InterpretBlank,
};
use serde_json::Value;
use std::{
    env,
    fs::File,
    io::{self, BufRead, BufReader},
    sync::Arc,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Format of the JSON-lines input file.
#[derive(Debug, Copy, Clone)]
enum InputFormat {
    /// Raw `{"csp-report": {...}}` bodies produced by the probe for the given interpretation.
    Raw(InterpretBlank),
    /// `CapturedReport` envelopes.
    Captured,
}

#[derive(Debug, Default)]
struct IngestStats {
    added: usize,
    duplicate: usize,
    rejected: usize,
    ignored: usize,
}

impl IngestStats {
    fn record(&mut self, outcome: CaptureOutcome) {
        match outcome {
            CaptureOutcome::Added => self.added += 1,
            CaptureOutcome::Duplicate => self.duplicate += 1,
            CaptureOutcome::Rejected(_) => self.rejected += 1,
            CaptureOutcome::Disabled | CaptureOutcome::NotAReport => self.ignored += 1,
        }
    }
}

fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    let matches = Command::new("CSP collector")
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .arg(
            Arg::new("CONFIG")
                .env("CSP_COLLECTOR_CONFIG")
                .short('c')
                .long("config")
                .default_value("csp-collector.toml")
                .help("Path to the application configuration file."),
        )
        .arg(
            Arg::new("INLINE")
                .long("inline")
                .value_name("FILE")
                .num_args(1..)
                .action(ArgAction::Append)
                .help("JSON-lines file(s) with reports sent by the inline probe (`-` for stdin)."),
        )
        .arg(
            Arg::new("EVAL")
                .long("eval")
                .value_name("FILE")
                .num_args(1..)
                .action(ArgAction::Append)
                .help("JSON-lines file(s) with reports sent by the eval probe (`-` for stdin)."),
        )
        .arg(
            Arg::new("CAPTURED")
                .long("captured")
                .value_name("FILE")
                .num_args(1..)
                .action(ArgAction::Append)
                .help("JSON-lines file(s) with captured `{endpoint, body}` reports (`-` for stdin)."),
        )
        .arg(
            Arg::new("PROBE")
                .long("probe")
                .action(ArgAction::SetTrue)
                .help("Prints probe policies for the configured report endpoint and exits."),
        )
        .arg(
            Arg::new("DETAILED")
                .long("detailed")
                .action(ArgAction::SetTrue)
                .help("Prints every directive and source on a separate line."),
        )
        .arg(
            Arg::new("VERBOSE")
                .env("CSP_COLLECTOR_VERBOSE")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Logs every processed report and policy change."),
        )
        .group(
            ArgGroup::new("INPUT")
                .args(["INLINE", "EVAL", "CAPTURED", "PROBE"])
                .required(true)
                .multiple(true),
        )
        .get_matches();

    let mut raw_config = RawConfig::read_from_file(
        matches
            .get_one::<String>("CONFIG")
            .ok_or_else(|| anyhow!("<CONFIG> argument is not provided."))?,
    )?;

    // CLI argument takes precedence.
    if matches.get_flag("VERBOSE") {
        raw_config.verbose = true;
    }

    init_tracing(raw_config.verbose);
    debug!("CSP collector raw configuration: {raw_config:?}.");

    let config = Config::from(raw_config);
    if matches.get_flag("PROBE") {
        let probe = ProbePolicy::new(&config.report_endpoint)?;
        for blank in [InterpretBlank::UnsafeInline, InterpretBlank::UnsafeEval] {
            println!("{CSP_HEADER_NAME}: {}", probe.header_value(blank));
        }
        return Ok(());
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(config, inputs(&matches), matches.get_flag("DETAILED")))
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if env::var("RUST_LOG_FORMAT").is_ok_and(|format| format == "json") {
        subscriber.json().flatten_event(true).init();
    } else {
        subscriber.init();
    }
}

fn inputs(matches: &ArgMatches) -> Vec<(InputFormat, String)> {
    [
        ("INLINE", InputFormat::Raw(InterpretBlank::UnsafeInline)),
        ("EVAL", InputFormat::Raw(InterpretBlank::UnsafeEval)),
        ("CAPTURED", InputFormat::Captured),
    ]
    .into_iter()
    .flat_map(|(id, format)| {
        matches
            .get_many::<String>(id)
            .into_iter()
            .flatten()
            .map(move |path| (format, path.clone()))
    })
    .collect()
}

async fn run(
    config: Config,
    inputs: Vec<(InputFormat, String)>,
    detailed: bool,
) -> anyhow::Result<()> {
    let collector = Arc::new(RuleCollector::new());

    let mut subscription = collector.subscribe();
    let subscription_id = subscription.id();
    let notifications = tokio::spawn(async move {
        let mut changes = 0;
        while let Some(change) = subscription.recv().await {
            debug!(
                document_uri = %change.document_uri,
                "Received policy change notification: {}", change.policy
            );
            changes += 1;
        }
        changes
    });

    let capture = ReportCapture::new(collector.clone(), &config);
    let stats = tokio::task::spawn_blocking(move || ingest(&capture, &config, &inputs)).await??;

    collector.unsubscribe(subscription_id);
    let changes: usize = notifications.await?;
    info!(
        added = stats.added,
        duplicate = stats.duplicate,
        rejected = stats.rejected,
        ignored = stats.ignored,
        changes,
        "Processed violation reports."
    );

    for (document_uri, policy) in collector.snapshot() {
        if detailed {
            println!("{document_uri}\n\n{}\n", format_policy_details(&policy));
        } else {
            println!("{document_uri}\n{policy}\n");
        }
    }

    Ok(())
}

fn ingest(
    capture: &ReportCapture,
    config: &Config,
    inputs: &[(InputFormat, String)],
) -> anyhow::Result<IngestStats> {
    let mut stats = IngestStats::default();
    for (format, path) in inputs {
        let reader: Box<dyn BufRead> = if path == "-" {
            Box::new(io::stdin().lock())
        } else {
            Box::new(BufReader::new(
                File::open(path).with_context(|| format!("Cannot open reports file ({path})."))?,
            ))
        };

        for (index, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Cannot read reports file ({path})."))?;
            if line.trim().is_empty() {
                continue;
            }

            let captured = match format {
                InputFormat::Raw(blank) => CapturedReport {
                    endpoint: ProbePolicy::report_uri(&config.report_endpoint, *blank)?,
                    body: Value::String(line),
                },
                InputFormat::Captured => match serde_json::from_str::<CapturedReport>(&line) {
                    Ok(captured) => captured,
                    Err(err) => {
                        warn!("Ignored malformed captured report ({path}:{}): {err}", index + 1);
                        stats.rejected += 1;
                        continue;
                    }
                },
            };

            stats.record(capture.process(&captured));
        }
    }

    Ok(stats)
}
