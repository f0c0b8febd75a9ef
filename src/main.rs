use anyhow::Context;
use clap::Parser;
use syncskipper::config::Args;
use syncskipper::engine::SkipperEngine;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Exit status for a scan stopped with Ctrl-C.
const EXIT_CANCELLED: i32 = 130;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    // Results go to stdout; keep logs on stderr so they can be piped.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let engine = SkipperEngine::new(args);

    let coordinator = engine.coordinator().clone();
    // Only a running scan is interruptible. A batch always runs to the end so
    // every outcome gets reported.
    ctrlc::set_handler(move || {
        if coordinator.cancel() {
            info!("Interrupt received, cancelling search...");
        } else {
            info!("Interrupt ignored, no search is running");
        }
    })
    .context("Failed to set signal handler")?;

    if let Err(e) = engine.run() {
        if e.is_cancelled() {
            println!("Search canceled");
            std::process::exit(EXIT_CANCELLED);
        }
        error!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
