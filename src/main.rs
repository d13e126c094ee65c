//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `frame_check` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::Result;
use clap::Parser;
use std::process;

use frame_check::initialization::init_logger;
use frame_check::{run_audit, server, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    init_logger(config.log_level.clone().into());

    if let Some(port) = config.serve_port {
        // Server mode: the batch runs on demand via the trigger endpoint
        if let Err(e) = server::serve(port, config).await {
            eprintln!("frame_check server error: {e:#}");
            process::exit(1);
        }
        return Ok(());
    }

    match run_audit(config.clone()).await {
        Ok(report) => {
            println!(
                "✅ Checked {} site{} ({} frameable, {} not frameable) in {:.1}s",
                report.total(),
                if report.total() == 1 { "" } else { "s" },
                report.frameable,
                report.not_frameable,
                report.elapsed_seconds
            );
            println!("Report written to {}", config.out_dir.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("frame_check error: {e:#}");
            process::exit(1);
        }
    }
}
