use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

// constants (used as defaults)
pub const LOGGING_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_MAX_CONCURRENCY: usize = 20;
pub const DEFAULT_TIMEOUT_SECS: u64 = 50;
pub const DEFAULT_OUT_DIR: &str = "./report";

/// Maximum number of redirect hops the HTTP client follows transparently.
/// A chain exceeding this ceiling classifies the site as not frameable.
pub const REDIRECT_CEILING: usize = 5;

/// Default User-Agent string for HTTP requests.
///
/// A browser-like string so sites that gate on header presence behave as they
/// would for a real browser. Users can override this via the `--user-agent` flag.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default Accept header, matching what a browser sends for a top-level navigation.
pub const ACCEPT_HEADER: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Default Accept-Language header.
pub const ACCEPT_LANGUAGE_HEADER: &str = "en-US,en;q=0.5";

// Headers that block framing
pub const HEADER_X_FRAME_OPTIONS: &str = "X-Frame-Options";
pub const HEADER_CONTENT_SECURITY_POLICY: &str = "Content-Security-Policy";

/// CSP directive token that restricts which origins may embed the resource.
pub const FRAME_ANCESTORS_TOKEN: &str = "frame-ancestors";

/// Number of body characters captured in a response dump.
pub const BODY_SNIPPET_LEN: usize = 500;

/// Hosts pinned to a redirect-loop outcome without dispatching a network call.
/// britannica.com historically redirected in a loop and is resolved statically.
pub const PINNED_REDIRECT_LOOP_HOSTS: &[&str] = &["britannica.com"];

/// Outer bound for a single probe task.
///
/// Covers both scheme attempts plus slack, so a site that stalls inside the
/// client timeout twice still cannot hold the batch open indefinitely.
pub fn probe_task_timeout(timeout_seconds: u64) -> Duration {
    Duration::from_secs(timeout_seconds.saturating_mul(2).saturating_add(10))
}

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace). Used with the `--log-level` CLI option.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Command-line options and configuration.
///
/// This struct is automatically generated by `clap` from the field attributes.
/// All options have sensible defaults and can be overridden via command-line flags.
///
/// # Examples
///
/// ```bash
/// # Probe the sites listed in sites.txt and write the report to ./report
/// frame_check sites.txt
///
/// # Faster timeout, custom output directory
/// frame_check sites.txt --timeout-seconds 10 --out-dir ./audit
///
/// # Run as a server with a trigger endpoint instead of a one-shot batch
/// frame_check sites.txt --serve-port 4000
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "frame_check",
    about = "Checks a list of websites for iframe embeddability and renders a report."
)]
pub struct Config {
    /// File with one hostname per line (blank lines and # comments ignored)
    #[arg(value_parser)]
    pub file: PathBuf,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Directory for the rendered report and response dumps
    #[arg(long, value_parser, default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,

    /// Maximum concurrent probes
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Serve the report over HTTP on this port instead of running one batch
    #[arg(long)]
    pub serve_port: Option<u16>,

    /// Skip writing per-host raw-response dumps
    #[arg(long, default_value_t = false)]
    pub no_response_dumps: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file: PathBuf::from("sites.txt"),
            log_level: LogLevel::Info,
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            serve_port: None,
            no_response_dumps: false,
        }
    }
}
