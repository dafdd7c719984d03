//! Publisher behavior against a throwaway HTTP server on localhost.

use evidra_evidence::{EvidencePublisher, PublishError};
use evidra_types::{Activity, ActivityKind, Report};
use evidra_test_util::sink::MockSink;
use std::net::TcpListener;
use std::time::{Duration, Instant};

fn activity() -> Activity {
    let report: Report = serde_json::from_str(
        r#"{
            "success": false,
            "ec-version": "v0.6.0",
            "effective-time": "2025-03-01T12:00:00Z",
            "policy": {"name": "baseline", "sources": []},
            "filepaths": [{"filepath": "deploy/app.yaml", "success": false}]
        }"#,
    )
    .expect("report");
    evidra_domain::report_to_activity(&report, ActivityKind::Api)
}

fn publisher(url: &str) -> EvidencePublisher {
    EvidencePublisher::new(url, Duration::from_secs(5)).expect("publisher")
}

#[test]
fn no_content_is_success_and_payload_is_the_activity() {
    let sink = MockSink::serve(vec![(204, "")]);

    publisher(sink.url()).publish(&activity()).expect("publish");

    let requests = sink.finish();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/v1/evidence");
    assert_eq!(req.header("content-type"), Some("application/json"));

    let sent = req.json();
    assert_eq!(sent["class_uid"], 6003);
    assert_eq!(sent["status"], "failure");
    assert_eq!(sent["resources"][0]["name"], "deploy/app.yaml");
}

#[test]
fn server_error_is_rejected_with_status_and_body() {
    let sink = MockSink::serve(vec![(500, "bad request")]);

    let err = publisher(sink.url()).publish(&activity()).expect_err("should fail");
    sink.finish();

    match &err {
        PublishError::Rejected { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "bad request");
        }
        other => panic!("unexpected error: {other}"),
    }
    let msg = err.to_string();
    assert!(msg.contains("500"), "{msg}");
    assert!(msg.contains("bad request"), "{msg}");
}

#[test]
fn ok_with_body_is_not_success() {
    let sink = MockSink::serve(vec![(200, "{\"accepted\":true}")]);

    let err = publisher(sink.url()).publish(&activity()).expect_err("should fail");
    sink.finish();
    assert!(matches!(err, PublishError::Rejected { status, .. } if status.as_u16() == 200));
}

#[test]
fn connection_refused_is_a_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let url = format!("http://127.0.0.1:{port}/");

    let err = publisher(&url).publish(&activity()).expect_err("should fail");
    assert!(matches!(err, PublishError::Transport { .. }), "{err}");
}

#[test]
fn expired_deadline_sends_nothing() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.set_nonblocking(true).expect("nonblocking");
    let url = format!("http://{}/", listener.local_addr().expect("addr"));

    let err = publisher(&url)
        .publish_until(&activity(), Some(Instant::now()))
        .expect_err("should fail");
    assert!(matches!(err, PublishError::DeadlineExceeded { .. }), "{err}");
    assert!(listener.accept().is_err(), "no connection expected");
}

#[test]
fn slow_sink_hits_the_deadline() {
    let sink = MockSink::serve_with_delay(Duration::from_secs(1), vec![(204, "")]);

    let deadline = Instant::now() + Duration::from_millis(200);
    let err = publisher(sink.url())
        .publish_until(&activity(), Some(deadline))
        .expect_err("should fail");
    assert!(matches!(err, PublishError::DeadlineExceeded { .. }), "{err}");
    assert_eq!(sink.finish().len(), 1);
}
