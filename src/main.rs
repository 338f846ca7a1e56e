//! Postgrab - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use postgrab::{
    cli::Args,
    config::{validate_config, Config},
    download::DownloadOptions,
    error::{exit_codes, Error, Result},
    extractors::{registry, ExtractorRegistry},
    fetch::HttpClient,
    output::{print_error, print_hint, print_run_report},
    pipeline::RunCoordinator,
};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);
    let verbose = args.verbose;

    match run(args).await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&e.to_string());
            if matches!(e, Error::InvalidArgument(_)) {
                print_hint("run with --help to see usage");
            }
            if verbose && !e.is_user_error() {
                print_error(&format!("{:?}", e));
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_logging(args: &Args) {
    let log_level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<()> {
    // Load configuration, then let CLI flags override it
    let mut config = Config::load_or_default(args.config.as_deref())?;
    args.merge_into_config(&mut config);
    validate_config(&config)?;

    let registry = registry::init(ExtractorRegistry::with_builtin(&config.extractors));
    let client = HttpClient::new(&config)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping downloads");
            interrupt.cancel();
        }
    });

    let destination = config.output_dir();
    let mut coordinator =
        RunCoordinator::new(registry, client, DownloadOptions::from_config(&config))
            .with_cancellation(cancel);
    let report = coordinator.run(&args.url, &destination).await?;

    print_run_report(&report, args.verbose);
    Ok(())
}
