//! Frameability probing.
//!
//! A probe issues a browser-like GET against a site, lets the client follow
//! redirects up to the configured ceiling, and classifies the final response
//! headers. Every failure path terminates in a classified outcome; a probe
//! never surfaces an error to its caller.

use log::debug;
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::collections::HashMap;

use crate::audit::ResponseArtifact;
use crate::config::{FRAME_ANCESTORS_TOKEN, HEADER_CONTENT_SECURITY_POLICY, HEADER_X_FRAME_OPTIONS};
use crate::error_handling::{update_error_stats, ErrorStats};

/// The response header responsible for a framing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingHeader {
    XFrameOptions,
    ContentSecurityPolicy,
}

impl BlockingHeader {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockingHeader::XFrameOptions => HEADER_X_FRAME_OPTIONS,
            BlockingHeader::ContentSecurityPolicy => HEADER_CONTENT_SECURITY_POLICY,
        }
    }
}

/// Why a site was classified as not frameable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum BlockReason {
    /// A blocking response header was present.
    HeaderBlock { header: BlockingHeader },
    /// The site redirected beyond the configured ceiling.
    RedirectLimitExceeded,
    /// DNS, connection, timeout, or TLS failure.
    TransportError,
}

impl BlockReason {
    /// Human-readable reason, as shown in the report.
    pub fn describe(&self) -> &'static str {
        match self {
            BlockReason::HeaderBlock {
                header: BlockingHeader::XFrameOptions,
            } => HEADER_X_FRAME_OPTIONS,
            BlockReason::HeaderBlock {
                header: BlockingHeader::ContentSecurityPolicy,
            } => HEADER_CONTENT_SECURITY_POLICY,
            BlockReason::RedirectLimitExceeded => "Too many redirects",
            BlockReason::TransportError => "Transport error",
        }
    }
}

/// Classification of a single site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// No blocking header present; the site can be embedded.
    Frameable,
    /// The site cannot be embedded, with the reason.
    NotFrameable {
        #[serde(flatten)]
        reason: BlockReason,
    },
}

impl ProbeOutcome {
    pub fn is_frameable(&self) -> bool {
        matches!(self, ProbeOutcome::Frameable)
    }

    pub fn not_frameable(reason: BlockReason) -> Self {
        ProbeOutcome::NotFrameable { reason }
    }
}

/// The outcome of probing one site, with the URL of the attempt that
/// produced it and the captured response artifact, if any.
#[derive(Debug)]
pub struct ProbeResult {
    pub url: String,
    pub outcome: ProbeOutcome,
    pub artifact: Option<ResponseArtifact>,
}

/// Pinned outcomes consulted before any network dispatch.
pub type PinnedOutcomes = HashMap<String, ProbeOutcome>;

/// Builds the default pinned-outcome map from the configured host list.
pub fn default_pinned_outcomes() -> PinnedOutcomes {
    crate::config::PINNED_REDIRECT_LOOP_HOSTS
        .iter()
        .map(|host| {
            (
                host.to_string(),
                ProbeOutcome::not_frameable(BlockReason::RedirectLimitExceeded),
            )
        })
        .collect()
}

/// Classifies response headers for frameability.
///
/// Precedence is fixed: any `X-Frame-Options` value blocks; otherwise a
/// `Content-Security-Policy` value containing the `frame-ancestors` directive
/// token blocks; otherwise the site is frameable. Header name lookup is
/// case-insensitive (HeaderMap semantics), and every repeated CSP value is
/// checked.
pub fn classify_headers(headers: &HeaderMap) -> ProbeOutcome {
    if headers.contains_key(HEADER_X_FRAME_OPTIONS) {
        return ProbeOutcome::not_frameable(BlockReason::HeaderBlock {
            header: BlockingHeader::XFrameOptions,
        });
    }

    let csp_blocks = headers
        .get_all(HEADER_CONTENT_SECURITY_POLICY)
        .iter()
        .any(|value| {
            value
                .to_str()
                .map(|v| v.contains(FRAME_ANCESTORS_TOKEN))
                .unwrap_or(false)
        });
    if csp_blocks {
        return ProbeOutcome::not_frameable(BlockReason::HeaderBlock {
            header: BlockingHeader::ContentSecurityPolicy,
        });
    }

    ProbeOutcome::Frameable
}

/// Converts a transport-level `reqwest::Error` into a block reason.
///
/// A redirect-policy error means the chain exceeded the ceiling; everything
/// else (DNS, connect, timeout, TLS) is a transport error.
pub fn classify_error(error: &reqwest::Error) -> BlockReason {
    if error.is_redirect() {
        BlockReason::RedirectLimitExceeded
    } else {
        BlockReason::TransportError
    }
}

/// Probes a single fully-qualified URL.
///
/// On a response, classifies the final headers and captures a response
/// artifact (headers cloned before the body is consumed; a body read failure
/// leaves the snippet empty and never changes the outcome). On a transport
/// failure, records the error in the statistics and returns the classified
/// outcome with no artifact.
pub async fn probe_url(
    client: &reqwest::Client,
    host: &str,
    url: &str,
    stats: &ErrorStats,
) -> (ProbeOutcome, Option<ResponseArtifact>) {
    debug!("Probing {url}");
    match client.get(url).send().await {
        Ok(response) => {
            let final_url = response.url().to_string();
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let outcome = classify_headers(&headers);

            let body_snippet = match response.text().await {
                Ok(body) => body
                    .chars()
                    .take(crate::config::BODY_SNIPPET_LEN)
                    .collect(),
                Err(_) => String::new(),
            };

            debug!("Classified {url} as {outcome:?} (final URL {final_url})");
            let artifact =
                ResponseArtifact::new(host, url, &final_url, status, &headers, body_snippet);
            (outcome, Some(artifact))
        }
        Err(e) => {
            debug!("Probe of {url} failed: {e}");
            update_error_stats(stats, &e);
            (ProbeOutcome::not_frameable(classify_error(&e)), None)
        }
    }
}

/// Probes a site by host name, applying the scheme-fallback policy.
///
/// Pinned hosts resolve immediately without a network call. Otherwise HTTPS is
/// attempted first; only a connection-level failure (no HTTP response seen)
/// triggers a single HTTP retry. Any outcome derived from a response,
/// including a redirect-limit failure, is final.
pub async fn probe_site(
    client: &reqwest::Client,
    host: &str,
    pinned: &PinnedOutcomes,
    stats: &ErrorStats,
) -> ProbeResult {
    let https_url = format!("https://{host}");

    if let Some(&outcome) = pinned.get(host) {
        debug!("Using pinned outcome for {host}: {outcome:?}");
        return ProbeResult {
            url: https_url,
            outcome,
            artifact: None,
        };
    }

    let (outcome, artifact) = probe_url(client, host, &https_url, stats).await;
    if !matches!(
        outcome,
        ProbeOutcome::NotFrameable {
            reason: BlockReason::TransportError
        }
    ) {
        return ProbeResult {
            url: https_url,
            outcome,
            artifact,
        };
    }

    let http_url = format!("http://{host}");
    debug!("HTTPS attempt for {host} failed at transport level, retrying over HTTP");
    let (outcome, artifact) = probe_url(client, host, &http_url, stats).await;
    ProbeResult {
        url: http_url,
        outcome,
        artifact,
    }
}
