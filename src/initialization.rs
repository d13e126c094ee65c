use log::LevelFilter;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::ClientBuilder;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::config::{Config, ACCEPT_HEADER, ACCEPT_LANGUAGE_HEADER, REDIRECT_CEILING};
use crate::error_handling::InitializationError;

/// Initializes the logger at the given level.
///
/// Honors `RUST_LOG` when set; `try_init` keeps repeated calls (tests) from
/// failing the run.
pub fn init_logger(level: LevelFilter) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .try_init();
}

pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count))
}

/// Builds the probing HTTP client.
///
/// Browser-like default headers so sites that gate on header presence behave
/// as they would for a real browser; redirects followed transparently up to
/// the ceiling; per-request timeout from config.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, InitializationError> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
    default_headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE_HEADER),
    );

    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(config.user_agent.clone())
        .default_headers(default_headers)
        .redirect(reqwest::redirect::Policy::limited(REDIRECT_CEILING))
        .build()?;
    Ok(Arc::new(client))
}
