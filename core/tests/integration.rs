//! Full tutoring lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every dispatcher
//! operation over real HTTP through `UreqTransport`. Validates that request
//! building, status classification and hydration agree with the backend.

use std::io::{Read, Write};
use std::thread::JoinHandle;

use chrono::{TimeZone, Utc};
use tutoring_core::{
    AccountKind, ApiError, Dispatcher, EndpointConfig, EngagementState, HttpMethod,
    InstructorRegistration, LearnerRegistration, Principal, Transport, UreqTransport,
};

const KEY: &str = "integration-key";

/// Start the mock server on its own runtime thread and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, KEY).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn alice() -> LearnerRegistration {
    LearnerRegistration {
        username: "alice".to_string(),
        display_name: "Alice".to_string(),
        password: "pw".to_string(),
        locality: "NY".to_string(),
    }
}

fn bob() -> InstructorRegistration {
    InstructorRegistration {
        username: "bob".to_string(),
        display_name: "Bob".to_string(),
        password: "secret".to_string(),
        locality: "NY".to_string(),
        expertise_tags: "math,physics".to_string(),
        available_weekdays_mask: "023".to_string(),
    }
}

#[test]
fn tutoring_lifecycle() {
    // Step 1: start mock server on a random port.
    let base_url = start_server();
    let config = EndpointConfig::new(&base_url, KEY).unwrap();
    let d = Dispatcher::new(config, UreqTransport::new());

    // Step 2: liveness and configuration.
    d.ping().unwrap();
    let server_config = d.server_configuration().unwrap();
    assert_eq!(server_config["name"], "tutoring-mock");

    // Step 3: register both accounts; a second registration conflicts.
    d.register_learner(&alice()).unwrap();
    d.register_instructor(&bob()).unwrap();
    let err = d.register_learner(&alice()).unwrap_err();
    assert!(matches!(err, ApiError::ConflictAlreadyExists(_)));

    // Step 4: bad password is rejected.
    let err = d.login("alice", "wrong").unwrap_err();
    assert!(matches!(err, ApiError::AuthorizationFailure(_)));

    // Step 5: log in as the learner.
    let account = d.login("alice", "pw").unwrap();
    assert_eq!(account.kind(), AccountKind::Learner);
    assert_eq!(account.identity().display_name, "Alice");
    assert!(account.session_token().is_some());

    // Step 6: log in as the instructor.
    let instructor = d.login("bob", "secret").unwrap();
    let details = instructor.as_instructor().unwrap();
    assert_eq!(details.expertise_tags, "math,physics");
    assert_eq!(details.available_weekdays_mask, "023");

    // Step 7: look up another user without a token.
    let looked_up = d.lookup_account("bob").unwrap();
    assert_eq!(looked_up.kind(), AccountKind::Instructor);
    assert!(looked_up.session_token().is_none());
    let profile = d.user_profile(Principal::Username("alice")).unwrap();
    assert_eq!(profile.locality, "NY");

    // Step 8: search.
    let found = d.find_instructors(&account, "NY", "").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].identity.username, "bob");
    assert!(found[0].identity.session_token().is_none());

    let err = d.find_instructors(&account, "", "chemistry").unwrap_err();
    assert!(matches!(err, ApiError::UnsatisfiableCriteria(_)));

    let err = d.find_instructors(&account, "", "").unwrap_err();
    assert!(matches!(err, ApiError::InvalidFilter));

    // Step 9: no engagements yet.
    assert!(d.list_engagements(&account).unwrap().is_empty());

    // Step 10: request an engagement on a Tuesday.
    let learner = account.as_learner().unwrap();
    let tuesday = Utc.with_ymd_and_hms(2024, 1, 9, 10, 0, 0).unwrap();
    d.request_engagement(learner, "bob", tuesday).unwrap();

    // Step 11: the same slot is gone, Monday is outside the mask.
    let err = d.request_engagement(learner, "bob", tuesday).unwrap_err();
    assert!(matches!(err, ApiError::UnsatisfiableCriteria(_)));
    let monday = Utc.with_ymd_and_hms(2024, 1, 8, 10, 0, 0).unwrap();
    let err = d.request_engagement(learner, "bob", monday).unwrap_err();
    assert!(matches!(err, ApiError::UnsatisfiableCriteria(_)));

    // Step 12: both sides see the engagement.
    let mut engagements = d.list_engagements(&account).unwrap();
    assert_eq!(engagements.len(), 1);
    assert_eq!(engagements[0].instructor_name(), "bob");
    assert_eq!(engagements[0].learner_name(), "alice");
    assert_eq!(engagements[0].state(), EngagementState::Requested);
    assert_eq!(
        engagements[0].scheduled_at(),
        Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap()
    );
    assert_eq!(d.list_engagements(&instructor).unwrap().len(), 1);

    // Step 13: local confirmation.
    engagements[0].confirm();
    assert_eq!(engagements[0].state(), EngagementState::Confirmed);

    // Step 14: tokenless callers are rejected by the backend.
    let err = d.list_engagements(&looked_up).unwrap_err();
    assert!(matches!(err, ApiError::InvalidSession(_)));
}

#[test]
fn wrong_api_key_is_authorization_failure() {
    let base_url = start_server();
    let config = EndpointConfig::new(&base_url, "not-the-key").unwrap();
    let d = Dispatcher::new(config, UreqTransport::new());
    assert!(matches!(d.ping(), Err(ApiError::AuthorizationFailure(_))));
}

#[test]
fn unreachable_backend_is_transport_failure() {
    // Bind then drop to get a port with nothing listening.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let config = EndpointConfig::new(&format!("http://{addr}"), KEY).unwrap();
    let d = Dispatcher::new(config, UreqTransport::new());
    assert!(matches!(d.ping(), Err(ApiError::TransportFailure(_))));
}

#[test]
fn dispatcher_from_process_wide_configuration() {
    let base_url = start_server();
    tutoring_core::configure(&base_url, KEY).unwrap();
    let d = Dispatcher::from_current(UreqTransport::new()).unwrap();
    d.ping().unwrap();
}

/// Accept a single connection, answer 200 with a non-ASCII header value, and
/// hand back the raw request head and body.
fn capture_one_request() -> (String, JoinHandle<(String, String)>) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 1024];
        let head_end = loop {
            let n = stream.read(&mut buf).unwrap();
            assert!(n > 0, "connection closed before end of headers");
            raw.extend_from_slice(&buf[..n]);
            if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&raw[..head_end]).to_string();
        let lower = head.to_ascii_lowercase();
        let content_length = lower
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .map(|v| v.trim().parse::<usize>().unwrap())
            .unwrap_or(0);
        while raw.len() < head_end + content_length {
            let n = stream.read(&mut buf).unwrap();
            assert!(n > 0, "connection closed before end of body");
            raw.extend_from_slice(&buf[..n]);
        }
        let body = String::from_utf8_lossy(&raw[head_end..head_end + content_length]).to_string();

        stream
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nx-note: caf\xc3\xa9\r\nconnection: close\r\n\r\n{}",
            )
            .unwrap();
        (head, body)
    });

    (format!("http://{addr}"), handle)
}

#[test]
fn get_with_body_transmits_the_body() {
    let (base_url, server) = capture_one_request();
    let d = Dispatcher::new(EndpointConfig::new(&base_url, "k").unwrap(), UreqTransport::new());

    let response = d
        .send("/api/x", HttpMethod::Get, None, Some(r#"{"a":1}"#.to_string()))
        .unwrap();
    assert_eq!(response.status, 200);

    let (head, body) = server.join().unwrap();
    assert!(head.starts_with("GET /api/x/k HTTP/1.1"), "{head}");
    assert!(head.to_ascii_lowercase().contains("content-type: application/json"), "{head}");
    assert_eq!(body, r#"{"a":1}"#);
}

#[test]
fn delete_with_body_transmits_the_body() {
    let (base_url, server) = capture_one_request();
    let d = Dispatcher::new(EndpointConfig::new(&base_url, "k").unwrap(), UreqTransport::new());

    d.send("/api/y", HttpMethod::Delete, Some("T"), Some(r#"{"id":7}"#.to_string()))
        .unwrap();

    let (head, body) = server.join().unwrap();
    assert!(head.starts_with("DELETE /api/y/k HTTP/1.1"), "{head}");
    assert!(head.to_ascii_lowercase().contains("authorization: bearer t"), "{head}");
    assert_eq!(body, r#"{"id":7}"#);
}

#[test]
fn non_ascii_response_header_is_kept() {
    let (base_url, server) = capture_one_request();
    let client = tutoring_core::TutoringClient::new(EndpointConfig::new(&base_url, "k").unwrap());

    let response = UreqTransport::new().execute(&client.build_ping()).unwrap();
    server.join().unwrap();

    let note = response
        .headers
        .iter()
        .find(|(k, _)| k == "x-note")
        .map(|(_, v)| v.as_str());
    assert_eq!(note, Some("café"));
}
