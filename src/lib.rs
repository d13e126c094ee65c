//! frame_check library: frameability auditing for a list of websites.
//!
//! Probes each site over HTTP, inspects the response headers that control
//! iframe embedding (`X-Frame-Options`, `Content-Security-Policy`
//! `frame-ancestors`), and produces an ordered report consumed by the HTML
//! and Markdown renderers.
//!
//! # Example
//!
//! ```no_run
//! use frame_check::{run_audit, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     file: std::path::PathBuf::from("sites.txt"),
//!     timeout_seconds: 10,
//!     ..Default::default()
//! };
//!
//! let report = run_audit(config).await?;
//! println!(
//!     "{} frameable, {} not frameable",
//!     report.frameable, report.not_frameable
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or call library functions within an async context.

pub mod audit;
pub mod config;
mod error_handling;
pub mod initialization;
mod probe;
mod report;
pub mod server;
mod sites;

// Re-export public API
pub use audit::{AuditSink, FsAuditSink, MemoryAuditSink, ResponseArtifact};
pub use config::{Config, LogLevel};
pub use error_handling::{ArtifactWriteError, ErrorStats, ErrorType, InitializationError};
pub use probe::{
    default_pinned_outcomes, BlockReason, BlockingHeader, PinnedOutcomes, ProbeOutcome,
};
pub use report::{render_index, render_site_page, render_summary, AuditReport, SiteResult};
pub use run::{run_audit, run_audit_with};

// Internal run module (contains the batch runner)
mod run {
    use anyhow::{Context, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    use futures::stream::FuturesUnordered;
    use futures::StreamExt;
    use log::{info, warn};

    use crate::audit::{AuditSink, FsAuditSink};
    use crate::config::{probe_task_timeout, Config, LOGGING_INTERVAL_SECS};
    use crate::error_handling::{print_error_statistics, ErrorStats, ErrorType};
    use crate::initialization::{init_client, init_semaphore};
    use crate::probe::{
        default_pinned_outcomes, probe_site, BlockReason, PinnedOutcomes, ProbeOutcome,
        ProbeResult,
    };
    use crate::report::{write_report, AuditReport, SiteResult};
    use crate::sites::load_sites;

    /// Runs a frameability audit with the default audit sink and pinned
    /// outcomes.
    ///
    /// This is the main entry point for the library. It reads the site list,
    /// probes every site concurrently, writes response dumps and the rendered
    /// report under `config.out_dir`, and returns the ordered report.
    ///
    /// # Errors
    ///
    /// Returns an error only for catastrophic failures: an unreadable input
    /// list or an HTTP client that cannot be constructed. Per-site failures
    /// are classified into the report, never propagated.
    pub async fn run_audit(config: Config) -> Result<AuditReport> {
        let sink: Option<Arc<dyn AuditSink>> = if config.no_response_dumps {
            None
        } else {
            Some(Arc::new(FsAuditSink::new(config.out_dir.join("responses"))))
        };
        run_audit_with(config, default_pinned_outcomes(), sink).await
    }

    /// Runs a frameability audit with explicit pinned outcomes and audit sink.
    ///
    /// Exposed so tests can pin a mock host's outcome and substitute an
    /// in-memory sink; `run_audit` delegates here.
    pub async fn run_audit_with(
        config: Config,
        pinned: PinnedOutcomes,
        sink: Option<Arc<dyn AuditSink>>,
    ) -> Result<AuditReport> {
        let sites = load_sites(&config.file).await?;
        let total_sites = sites.len();

        let client = init_client(&config).context("Failed to initialize HTTP client")?;
        let semaphore = init_semaphore(config.max_concurrency);
        let stats = Arc::new(ErrorStats::new());
        let pinned = Arc::new(pinned);
        let task_timeout = probe_task_timeout(config.timeout_seconds);

        let start_time = Instant::now();
        let completed = Arc::new(AtomicUsize::new(0));

        let logging_task = {
            let completed = Arc::clone(&completed);
            tokio::spawn(async move {
                let mut interval =
                    tokio::time::interval(std::time::Duration::from_secs(LOGGING_INTERVAL_SECS));
                interval.tick().await; // first tick is immediate
                loop {
                    interval.tick().await;
                    log_progress(start_time, &completed, total_sites);
                }
            })
        };

        let mut tasks = FuturesUnordered::new();
        for (index, host) in sites.iter().enumerate() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("Semaphore closed, skipping site: {host}");
                    continue;
                }
            };

            let client = Arc::clone(&client);
            let pinned = Arc::clone(&pinned);
            let stats = Arc::clone(&stats);
            let completed = Arc::clone(&completed);
            let host = host.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = permit;

                let result =
                    tokio::time::timeout(task_timeout, probe_site(&client, &host, &pinned, &stats))
                        .await;
                let probe = match result {
                    Ok(probe) => probe,
                    Err(_) => {
                        warn!("Probe task for {host} exceeded {task_timeout:?}");
                        stats.increment(ErrorType::ProbeTaskTimeout);
                        ProbeResult {
                            url: format!("https://{host}"),
                            outcome: ProbeOutcome::not_frameable(BlockReason::TransportError),
                            artifact: None,
                        }
                    }
                };

                completed.fetch_add(1, Ordering::SeqCst);
                (index, probe)
            }));
        }

        // Join barrier: every site owns one slot, filled in completion order,
        // read back in input order.
        let mut slots: Vec<Option<ProbeResult>> = Vec::with_capacity(total_sites);
        slots.resize_with(total_sites, || None);
        while let Some(joined) = tasks.next().await {
            match joined {
                Ok((index, probe)) => slots[index] = Some(probe),
                Err(join_error) => warn!("Probe task panicked: {join_error:?}"),
            }
        }
        logging_task.abort();

        let mut results = Vec::with_capacity(total_sites);
        let mut artifacts = Vec::new();
        for (index, slot) in slots.into_iter().enumerate() {
            let host = sites[index].clone();
            match slot {
                Some(probe) => {
                    if let Some(artifact) = probe.artifact {
                        artifacts.push(artifact);
                    }
                    results.push(SiteResult {
                        site: host,
                        url: probe.url,
                        outcome: probe.outcome,
                    });
                }
                // A panicked task left its slot empty; classify rather than drop
                None => results.push(SiteResult {
                    url: format!("https://{host}"),
                    site: host,
                    outcome: ProbeOutcome::not_frameable(BlockReason::TransportError),
                }),
            }
        }

        // Single-writer phase: response dumps and the rendered report are
        // persisted only after all probes have joined.
        if let Some(sink) = sink {
            for artifact in &artifacts {
                if let Err(e) = sink.record(artifact) {
                    warn!("{e}");
                    stats.increment(ErrorType::ArtifactWriteError);
                }
            }
        }

        let elapsed_seconds = start_time.elapsed().as_secs_f64();
        let report = AuditReport::new(results, elapsed_seconds);
        write_report(&report, &config.out_dir, &stats);

        print_error_statistics(&stats);
        info!(
            "Checked {} site(s) in {:.1}s: {} frameable, {} not frameable",
            report.total(),
            elapsed_seconds,
            report.frameable,
            report.not_frameable
        );

        Ok(report)
    }

    fn log_progress(start_time: Instant, completed: &Arc<AtomicUsize>, total: usize) {
        let done = completed.load(Ordering::SeqCst);
        let elapsed = start_time.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            done as f64 / elapsed
        } else {
            0.0
        };
        info!("Probed {done}/{total} site(s) in {elapsed:.1}s (~{rate:.2} sites/sec)");
    }
}
