// crates/octane-sdk/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared transports and local servers for SDK tests.
// Purpose: Record outbound requests without a real Octane server.
// Dependencies: octane-sdk, tiny_http
// ============================================================================

//! ## Overview
//! [`RecordingClient`] is an in-memory [`OctaneHttpClient`] that records every
//! request and replies from a queue. [`spawn_server`] starts a `tiny_http`
//! server on an ephemeral port for tests that exercise the reqwest transport.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;
use std::io::Cursor;
use std::io::Read;
use std::io::Write;
use std::net::Shutdown;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use octane_sdk::Octane;
use octane_sdk::OctaneBuilder;
use octane_sdk::OctaneError;
use octane_sdk::OctaneHttpClient;
use octane_sdk::OctaneHttpRequest;
use octane_sdk::OctaneHttpResponse;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: In-Memory Transport
// ============================================================================

/// Domain used by in-memory contexts.
pub const TEST_DOMAIN: &str = "http://octane.test";

/// Transport that records requests and replies from a queue.
///
/// An empty queue answers `200 {}`.
#[derive(Default)]
pub struct RecordingClient {
    /// Requests in send order.
    requests: Mutex<Vec<OctaneHttpRequest>>,
    /// Pending replies.
    responses: Mutex<VecDeque<OctaneHttpResponse>>,
    /// Sign-in calls.
    sign_ins: AtomicUsize,
    /// Sign-out calls.
    sign_outs: AtomicUsize,
}

impl RecordingClient {
    /// Creates a client that replies with `responses` in order.
    pub fn with_responses(responses: Vec<OctaneHttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        })
    }

    /// Returns the recorded requests.
    pub fn requests(&self) -> Vec<OctaneHttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Returns the only recorded request.
    pub fn single_request(&self) -> OctaneHttpRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request: {requests:?}");
        requests.into_iter().next().unwrap()
    }

    /// Returns the number of sign-in calls.
    pub fn sign_ins(&self) -> usize {
        self.sign_ins.load(Ordering::SeqCst)
    }

    /// Returns the number of sign-out calls.
    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

impl OctaneHttpClient for RecordingClient {
    fn authenticate(&self) -> Result<(), OctaneError> {
        self.sign_ins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn execute(&self, request: &OctaneHttpRequest) -> Result<OctaneHttpResponse, OctaneError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| OctaneHttpResponse::json(200, "{}")))
    }

    fn sign_out(&self) -> Result<(), OctaneError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Returns a builder bound to `client` and [`TEST_DOMAIN`].
pub fn builder(client: &Arc<RecordingClient>) -> OctaneBuilder {
    let transport: Arc<dyn OctaneHttpClient> = client.clone();
    OctaneBuilder::new(transport, TEST_DOMAIN)
}

/// Returns a workspace context (shared space 1001, workspace 1002).
pub fn workspace_context(client: &Arc<RecordingClient>) -> Octane {
    builder(client).shared_space(1001_i64).workspace(1002).build()
}

// ============================================================================
// SECTION: Local HTTP Server
// ============================================================================

/// A request captured by [`spawn_server`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Path and query.
    pub url: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// Returns the first header value with the given (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the body as UTF-8 text.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Canned server reply.
pub type Reply = Response<Cursor<Vec<u8>>>;

/// Builds a JSON reply.
pub fn json_reply(status: u16, body: &str) -> Reply {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap())
}

/// Builds a reply carrying an extra header.
pub fn with_header(reply: Reply, name: &str, value: &str) -> Reply {
    reply.with_header(Header::from_bytes(name.as_bytes(), value.as_bytes()).unwrap())
}

/// Running local server.
pub struct TestServer {
    /// Base URL, e.g. `http://127.0.0.1:4711`.
    pub url: String,
    /// Server thread returning the captured requests.
    handle: thread::JoinHandle<Vec<RecordedRequest>>,
}

impl TestServer {
    /// Waits for the server thread and returns the captured requests.
    pub fn finish(self) -> Vec<RecordedRequest> {
        self.handle.join().unwrap()
    }
}

/// Serves `replies` in order, one per request, then stops.
///
/// The server also stops after five idle seconds so a failing test cannot hang.
pub fn spawn_server(replies: Vec<Reply>) -> TestServer {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        let mut recorded = Vec::new();
        for reply in replies {
            let Ok(Some(mut request)) = server.recv_timeout(Duration::from_secs(5)) else {
                break;
            };
            let mut body = Vec::new();
            let _ = request.as_reader().read_to_end(&mut body);
            recorded.push(RecordedRequest {
                method: request.method().to_string(),
                url: request.url().to_string(),
                headers: request
                    .headers()
                    .iter()
                    .map(|header| (header.field.to_string(), header.value.to_string()))
                    .collect(),
                body,
            });
            let _ = request.respond(reply);
        }
        recorded
    });
    TestServer {
        url: format!("http://{addr}"),
        handle,
    }
}

/// Answers one request with `raw` bytes written verbatim, then closes the socket.
///
/// Used for responses `tiny_http` cannot produce, such as a body shorter than
/// its declared `Content-Length`.
pub fn spawn_raw_server(raw: Vec<u8>) -> (String, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let mut head = Vec::new();
        let mut chunk = [0_u8; 1024];
        while !head.windows(4).any(|window| window == b"\r\n\r\n") {
            match stream.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(read) => head.extend_from_slice(&chunk[..read]),
            }
        }
        let _ = stream.write_all(&raw);
        let _ = stream.flush();
        let _ = stream.shutdown(Shutdown::Write);
    });
    (format!("http://{addr}"), handle)
}
