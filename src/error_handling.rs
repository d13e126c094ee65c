use log::info;
use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Error type for failed artifact writes (response dumps, rendered report pages).
///
/// Artifact writes are best-effort side effects: callers log these and carry on.
/// A failed write never changes a probe outcome and never aborts the run.
#[derive(Error, Debug)]
pub enum ArtifactWriteError {
    /// Error creating the output directory.
    #[error("Failed to create artifact directory {dir}: {source}")]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing an artifact file.
    #[error("Failed to write artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Types of errors that can occur while probing a site.
///
/// This enum categorizes failure modes in the frameability pipeline for tracking
/// and reporting purposes. Header-based blocks are classifications, not errors,
/// and are intentionally absent here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    HttpRequestTimeoutError,
    HttpRequestConnectError,
    HttpRequestDnsError,
    HttpRequestTlsError,
    HttpRequestRedirectLimitError,
    HttpRequestOtherError,
    ProbeTaskTimeout,
    ArtifactWriteError,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::HttpRequestTimeoutError => "HTTP request timeout error",
            ErrorType::HttpRequestConnectError => "HTTP request connect error",
            ErrorType::HttpRequestDnsError => "DNS resolution error",
            ErrorType::HttpRequestTlsError => "TLS error",
            ErrorType::HttpRequestRedirectLimitError => "Redirect limit exceeded",
            ErrorType::HttpRequestOtherError => "HTTP request other error",
            ErrorType::ProbeTaskTimeout => "Probe task timeout",
            ErrorType::ArtifactWriteError => "Artifact write error",
        }
    }
}

/// Thread-safe error statistics tracker.
///
/// Tracks the count of each error type using atomic counters, allowing concurrent
/// access from multiple probe tasks. All error types are initialized to zero on
/// creation, so lookups in `increment`/`get_count` cannot miss.
pub struct ErrorStats {
    errors: HashMap<ErrorType, AtomicUsize>,
}

impl ErrorStats {
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for error in ErrorType::iter() {
            errors.insert(error, AtomicUsize::new(0));
        }
        ErrorStats { errors }
    }

    pub fn increment(&self, error: ErrorType) {
        // All ErrorType variants are initialized in new(), so unwrap() is safe
        self.errors
            .get(&error)
            .unwrap()
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_count(&self, error: ErrorType) -> usize {
        // All ErrorType variants are initialized in new(), so unwrap() is safe
        self.errors.get(&error).unwrap().load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        ErrorType::iter().map(|e| self.get_count(e)).sum()
    }
}

impl Default for ErrorStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Updates error statistics based on a `reqwest::Error`.
///
/// Analyzes the error and increments the appropriate `ErrorType` counter.
/// reqwest does not expose DNS or TLS failures as distinct kinds, so those are
/// recognized from the error message of the underlying cause chain.
pub fn update_error_stats(error_stats: &ErrorStats, error: &reqwest::Error) {
    let error_string = error.to_string().to_lowercase();

    let error_type = if error.is_timeout() {
        ErrorType::HttpRequestTimeoutError
    } else if error.is_redirect() {
        ErrorType::HttpRequestRedirectLimitError
    } else if error.is_connect() {
        if error_string.contains("dns") {
            ErrorType::HttpRequestDnsError
        } else if error_string.contains("certificate") || error_string.contains("tls") {
            ErrorType::HttpRequestTlsError
        } else {
            ErrorType::HttpRequestConnectError
        }
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        ErrorType::HttpRequestTlsError
    } else {
        ErrorType::HttpRequestOtherError
    };

    error_stats.increment(error_type);
}

/// Prints error statistics to the log.
///
/// Only error types with a non-zero count are listed; a run with no transport
/// trouble stays quiet.
pub fn print_error_statistics(error_stats: &ErrorStats) {
    let total_errors = error_stats.total();
    if total_errors == 0 {
        return;
    }

    info!("Error Counts ({} total):", total_errors);
    for error_type in ErrorType::iter() {
        let count = error_stats.get_count(error_type);
        if count > 0 {
            info!("   {}: {}", error_type.as_str(), count);
        }
    }
}
