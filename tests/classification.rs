//! End-to-end classification tests against mocked HTTP servers.
//!
//! Sites point at local wiremock instances by `127.0.0.1:port`; the HTTPS
//! attempt fails at the transport level against the plain-HTTP listener, so
//! these tests also exercise the scheme-fallback path before each
//! classification.

mod helpers;

use std::sync::Arc;

use frame_check::{
    default_pinned_outcomes, run_audit_with, AuditSink, BlockReason, BlockingHeader,
    MemoryAuditSink, PinnedOutcomes, ProbeOutcome,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{mock_host, test_config, write_sites_file};

fn header_block(header: BlockingHeader) -> ProbeOutcome {
    ProbeOutcome::not_frameable(BlockReason::HeaderBlock { header })
}

#[tokio::test]
async fn x_frame_options_header_blocks_framing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Frame-Options", "SAMEORIGIN")
                .set_body_string("<html></html>"),
        )
        .mount(&server)
        .await;

    let (file, _dir) = write_sites_file(&[&mock_host(&server)]);
    let report = run_audit_with(test_config(&file), PinnedOutcomes::new(), None)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(
        report.results[0].outcome,
        header_block(BlockingHeader::XFrameOptions)
    );
    assert_eq!(report.frameable, 0);
    assert_eq!(report.not_frameable, 1);
}

#[tokio::test]
async fn csp_frame_ancestors_blocks_framing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).insert_header(
            "Content-Security-Policy",
            "default-src 'self'; frame-ancestors 'none'",
        ))
        .mount(&server)
        .await;

    let (file, _dir) = write_sites_file(&[&mock_host(&server)]);
    let report = run_audit_with(test_config(&file), PinnedOutcomes::new(), None)
        .await
        .unwrap();

    assert_eq!(
        report.results[0].outcome,
        header_block(BlockingHeader::ContentSecurityPolicy)
    );
}

#[tokio::test]
async fn csp_without_frame_ancestors_is_frameable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("Content-Security-Policy", "default-src 'self'"),
        )
        .mount(&server)
        .await;

    let (file, _dir) = write_sites_file(&[&mock_host(&server)]);
    let report = run_audit_with(test_config(&file), PinnedOutcomes::new(), None)
        .await
        .unwrap();

    assert_eq!(report.results[0].outcome, ProbeOutcome::Frameable);
    assert_eq!(report.frameable, 1);
}

#[tokio::test]
async fn redirect_chain_beyond_ceiling_is_classified() {
    let server = MockServer::start().await;

    // Six redirect responses against a ceiling of five
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/hop/1"))
        .mount(&server)
        .await;
    for hop in 1..=5 {
        Mock::given(method("GET"))
            .and(path(format!("/hop/{hop}")))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", format!("/hop/{}", hop + 1)),
            )
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/hop/6"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (file, _dir) = write_sites_file(&[&mock_host(&server)]);
    let report = run_audit_with(test_config(&file), PinnedOutcomes::new(), None)
        .await
        .unwrap();

    assert_eq!(
        report.results[0].outcome,
        ProbeOutcome::not_frameable(BlockReason::RedirectLimitExceeded)
    );
}

#[tokio::test]
async fn connection_refused_on_both_schemes_is_transport_error() {
    // Bind then drop a listener so the port is very likely closed
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let host = format!("127.0.0.1:{port}");
    let (file, _dir) = write_sites_file(&[&host]);
    let report = run_audit_with(test_config(&file), PinnedOutcomes::new(), None)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(
        report.results[0].outcome,
        ProbeOutcome::not_frameable(BlockReason::TransportError)
    );
    // The HTTP fallback was the final attempt
    assert!(report.results[0].url.starts_with("http://"));
}

#[tokio::test]
async fn one_failing_site_does_not_poison_the_batch() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead_port = listener.local_addr().unwrap().port();
    drop(listener);
    let dead_host = format!("127.0.0.1:{dead_port}");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (file, _dir) = write_sites_file(&[&dead_host, &mock_host(&server)]);
    let report = run_audit_with(test_config(&file), PinnedOutcomes::new(), None)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 2);
    assert_eq!(
        report.results[0].outcome,
        ProbeOutcome::not_frameable(BlockReason::TransportError)
    );
    assert_eq!(report.results[1].outcome, ProbeOutcome::Frameable);
}

#[tokio::test]
async fn report_order_matches_input_order_despite_completion_order() {
    let slow = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(800)),
        )
        .mount(&slow)
        .await;

    let blocked = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Frame-Options", "DENY"))
        .mount(&blocked)
        .await;

    let fast = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&fast)
        .await;

    let hosts = [mock_host(&slow), mock_host(&blocked), mock_host(&fast)];
    let host_refs: Vec<&str> = hosts.iter().map(String::as_str).collect();
    let (file, _dir) = write_sites_file(&host_refs);

    let report = run_audit_with(test_config(&file), PinnedOutcomes::new(), None)
        .await
        .unwrap();

    // The slow site finishes last but still reports first
    let reported: Vec<&str> = report.results.iter().map(|r| r.site.as_str()).collect();
    assert_eq!(reported, host_refs);
    assert_eq!(report.results[0].outcome, ProbeOutcome::Frameable);
    assert_eq!(
        report.results[1].outcome,
        header_block(BlockingHeader::XFrameOptions)
    );
    assert_eq!(report.results[2].outcome, ProbeOutcome::Frameable);
}

#[tokio::test]
async fn pinned_site_bypasses_live_probing() {
    let server = MockServer::start().await;
    // The transport would succeed and classify as frameable...
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let host = mock_host(&server);
    let mut pinned = PinnedOutcomes::new();
    pinned.insert(
        host.clone(),
        ProbeOutcome::not_frameable(BlockReason::RedirectLimitExceeded),
    );

    let (file, _dir) = write_sites_file(&[&host]);
    let report = run_audit_with(test_config(&file), pinned, None)
        .await
        .unwrap();

    // ...but the pinned outcome wins, without any network dispatch
    assert_eq!(
        report.results[0].outcome,
        ProbeOutcome::not_frameable(BlockReason::RedirectLimitExceeded)
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn default_pinned_outcomes_cover_known_redirect_loop() {
    let pinned = default_pinned_outcomes();
    assert_eq!(
        pinned.get("britannica.com"),
        Some(&ProbeOutcome::not_frameable(
            BlockReason::RedirectLimitExceeded
        ))
    );
}

#[tokio::test]
async fn every_input_site_is_reported_under_total_network_failure() {
    let mut dead_hosts = Vec::new();
    for _ in 0..3 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        dead_hosts.push(format!("127.0.0.1:{port}"));
    }
    let host_refs: Vec<&str> = dead_hosts.iter().map(String::as_str).collect();
    let (file, _dir) = write_sites_file(&host_refs);

    let report = run_audit_with(test_config(&file), PinnedOutcomes::new(), None)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 3);
    assert!(report.results.iter().all(|r| r.outcome
        == ProbeOutcome::not_frameable(BlockReason::TransportError)));
    assert_eq!(report.frameable + report.not_frameable, 3);
}

#[tokio::test]
async fn audit_sink_receives_captured_responses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Frame-Options", "DENY")
                .set_body_string("<html>blocked</html>"),
        )
        .mount(&server)
        .await;

    let host = mock_host(&server);
    let (file, _dir) = write_sites_file(&[&host]);

    let sink = Arc::new(MemoryAuditSink::new());
    let report = run_audit_with(
        test_config(&file),
        PinnedOutcomes::new(),
        Some(sink.clone() as Arc<dyn AuditSink>),
    )
    .await
    .unwrap();

    // A blocked site still yields an artifact: the block is a classification,
    // not a transport failure
    assert_eq!(
        report.results[0].outcome,
        header_block(BlockingHeader::XFrameOptions)
    );
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].host, host);
    assert_eq!(records[0].status, 200);
    assert!(records[0].body_snippet.contains("blocked"));
}

#[tokio::test]
async fn failing_audit_sink_does_not_change_outcomes() {
    struct FailingSink;
    impl AuditSink for FailingSink {
        fn record(
            &self,
            artifact: &frame_check::ResponseArtifact,
        ) -> Result<(), frame_check::ArtifactWriteError> {
            Err(frame_check::ArtifactWriteError::Io {
                path: std::path::PathBuf::from(artifact.file_name()),
                source: std::io::Error::other("sink unavailable"),
            })
        }
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (file, _dir) = write_sites_file(&[&mock_host(&server)]);
    let report = run_audit_with(
        test_config(&file),
        PinnedOutcomes::new(),
        Some(Arc::new(FailingSink)),
    )
    .await
    .unwrap();

    assert_eq!(report.results[0].outcome, ProbeOutcome::Frameable);
}
