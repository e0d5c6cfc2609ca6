// crates/octane-sdk/tests/transport.rs
// ============================================================================
// Module: Reqwest Transport Tests
// Description: Sign-in, session cookies, re-authentication, and size limits.
// Purpose: Exercise the blocking reqwest transport against a local server.
// ============================================================================

//! ## Overview
//! Runs [`ReqwestHttpClient`] against a `tiny_http` server on loopback and
//! checks the wire behaviour: sign-in payloads and headers, cookie reuse, the
//! single re-authentication on `401`, and response size enforcement.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;

use octane_sdk::Authentication;
use octane_sdk::HttpClientConfig;
use octane_sdk::NO_ENTITY;
use octane_sdk::OctaneConnection;
use octane_sdk::OctaneError;
use octane_sdk::OctaneHttpClient;
use octane_sdk::OctaneHttpRequest;
use octane_sdk::ReqwestHttpClient;
use octane_sdk::auth::DEFAULT_CLIENT_TYPE;
use serde_json::Value;
use serde_json::json;

use crate::common::json_reply;
use crate::common::spawn_raw_server;
use crate::common::spawn_server;
use crate::common::with_header;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn config(max_response_bytes: usize) -> HttpClientConfig {
    HttpClientConfig {
        timeout_ms: 5_000,
        max_response_bytes,
        ..HttpClientConfig::default()
    }
}

fn user_auth() -> Authentication {
    Authentication::user("sa@nga", "Welcome1")
        .with_client_type(Some(DEFAULT_CLIENT_TYPE.to_string()))
}

// ============================================================================
// SECTION: Sign-In
// ============================================================================

#[test]
fn connect_signs_in_and_reuses_session_cookie() {
    let server = spawn_server(vec![
        with_header(json_reply(200, "{}"), "Set-Cookie", "LWSSO_COOKIE_KEY=token-1; Path=/"),
        json_reply(200, r#"{"data":[],"total_count":0}"#),
    ]);
    let connection = OctaneConnection::connect(&server.url, user_auth(), config(1024)).unwrap();
    let octane = connection.builder().shared_space("1001").workspace(1002).build();
    let page = octane.entity_list("defects").get().execute().unwrap();
    assert!(page.is_empty());

    let requests = server.finish();
    assert_eq!(requests.len(), 2);
    let sign_in = &requests[0];
    assert_eq!(sign_in.method, "POST");
    assert_eq!(sign_in.url, "/authentication/sign_in");
    assert_eq!(sign_in.header("HPECLIENTTYPE"), Some(DEFAULT_CLIENT_TYPE));
    let payload: Value = serde_json::from_slice(&sign_in.body).unwrap();
    assert_eq!(payload, json!({"user": "sa@nga", "password": "Welcome1"}));

    let read = &requests[1];
    assert_eq!(read.method, "GET");
    assert_eq!(read.url, "/api/shared_spaces/1001/workspaces/1002/defects");
    assert!(read.header("Cookie").unwrap_or_default().contains("LWSSO_COOKIE_KEY=token-1"));
    assert_eq!(read.header("Accept"), Some("application/json"));
}

#[test]
fn rejected_sign_in_is_an_authentication_error() {
    let server = spawn_server(vec![json_reply(
        401,
        r#"{"error_code":"platform.authentication_failed","description":"bad credentials"}"#,
    )]);
    let err = OctaneConnection::connect(&server.url, user_auth(), config(1024)).unwrap_err();
    match err {
        OctaneError::Authentication(message) => assert!(message.contains("bad credentials")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(server.finish().len(), 1);
}

#[test]
fn sign_out_posts_to_sign_out_endpoint() {
    let server = spawn_server(vec![json_reply(200, "")]);
    let client = ReqwestHttpClient::new(&server.url, user_auth(), config(1024)).unwrap();
    client.sign_out().unwrap();
    let requests = server.finish();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/authentication/sign_out");
    assert!(requests[0].body.is_empty());
}

// ============================================================================
// SECTION: Re-Authentication
// ============================================================================

#[test]
fn unauthorized_request_signs_in_again_once() {
    let server = spawn_server(vec![
        json_reply(401, r#"{"description":"session expired"}"#),
        json_reply(200, "{}"),
        json_reply(200, r#"{"id":"42"}"#),
    ]);
    let client = ReqwestHttpClient::new(&server.url, user_auth(), config(1024)).unwrap();
    let url = format!("{}/api/shared_spaces/1001/workspaces/1002/defects/42", server.url);
    let response = client.execute(&OctaneHttpRequest::get(url)).unwrap();
    assert_eq!(response.status, 200);
    let paths: Vec<_> = server.finish().into_iter().map(|request| request.url).collect();
    assert_eq!(
        paths,
        vec![
            "/api/shared_spaces/1001/workspaces/1002/defects/42",
            "/authentication/sign_in",
            "/api/shared_spaces/1001/workspaces/1002/defects/42",
        ]
    );
}

#[test]
fn second_unauthorized_response_is_returned() {
    let server = spawn_server(vec![
        json_reply(401, r#"{"description":"session expired"}"#),
        json_reply(200, "{}"),
        json_reply(401, r#"{"description":"still expired"}"#),
    ]);
    let client: Arc<dyn OctaneHttpClient> =
        Arc::new(ReqwestHttpClient::new(&server.url, user_auth(), config(1024)).unwrap());
    let connection = OctaneConnection::with_client(&server.url, client);
    let octane = connection.builder().build();
    let err = octane.entity_list(NO_ENTITY).get().execute().unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(server.finish().len(), 3);
}

// ============================================================================
// SECTION: Response Limits
// ============================================================================

#[test]
fn oversized_response_is_rejected() {
    let body = format!(r#"{{"data":[],"padding":"{}"}}"#, "x".repeat(4096));
    let server = spawn_server(vec![json_reply(200, &body)]);
    let client = ReqwestHttpClient::new(&server.url, user_auth(), config(1024)).unwrap();
    let err = client.execute(&OctaneHttpRequest::get(format!("{}/api/shared_spaces", server.url)));
    match err {
        Err(OctaneError::ResponseTooLarge {
            limit, ..
        }) => assert_eq!(limit, 1024),
        other => panic!("unexpected result: {other:?}"),
    }
    server.finish();
}

#[test]
fn oversized_response_without_length_is_rejected() {
    let mut raw =
        b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n".to_vec();
    raw.extend(std::iter::repeat_n(b'x', 4096));
    let (url, handle) = spawn_raw_server(raw);
    let client = ReqwestHttpClient::new(&url, user_auth(), config(1024)).unwrap();
    let err = client.execute(&OctaneHttpRequest::get(format!("{url}/api/shared_spaces")));
    match err {
        Err(OctaneError::ResponseTooLarge {
            actual,
            limit,
        }) => {
            assert_eq!(limit, 1024);
            assert_eq!(actual, 1025);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    handle.join().unwrap();
}

#[test]
fn body_shorter_than_declared_length_is_a_protocol_error() {
    let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: \
                64\r\nConnection: close\r\n\r\n{}"
        .to_vec();
    let (url, handle) = spawn_raw_server(raw);
    let client = ReqwestHttpClient::new(&url, user_auth(), config(1024)).unwrap();
    let err = client.execute(&OctaneHttpRequest::get(format!("{url}/api/shared_spaces")));
    match err {
        Err(OctaneError::Protocol(message)) => assert!(message.contains("truncated"), "{message}"),
        other => panic!("unexpected result: {other:?}"),
    }
    handle.join().unwrap();
}

#[test]
fn non_json_error_body_becomes_description() {
    let server = spawn_server(vec![json_reply(502, "bad gateway")]);
    let client = ReqwestHttpClient::new(&server.url, user_auth(), config(1024)).unwrap();
    let response = client
        .execute(&OctaneHttpRequest::get(format!("{}/api/shared_spaces", server.url)))
        .unwrap();
    let err = response.into_success().unwrap_err();
    assert_eq!(err.to_string(), "octane server error (http 502): bad gateway");
    server.finish();
}
