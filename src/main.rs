use clap::Parser;
use std::error::Error as _;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use dropbox_revisions::cli::{self, Cli};
use dropbox_revisions::{describe_summary, RevisionsError};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli::run(cli).await {
        Ok(summary) => {
            println!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    // -v wins over RUST_LOG
    let filter = if verbose {
        EnvFilter::new("warn,dropbox_revisions=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn report(e: &RevisionsError) {
    eprintln!("Error: {}", e);

    let mut source = e.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }

    if let RevisionsError::Api { summary, .. } = e {
        if let Some(hint) = describe_summary(summary) {
            eprintln!("  hint: {}", hint);
        }
    }
}
