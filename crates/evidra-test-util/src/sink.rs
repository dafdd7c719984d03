//! A throwaway evidence sink on localhost, served by axum.
//!
//! Answers requests with a scripted list of responses, in order, and records what it received.
//! Requests past the end of the script get `500 unexpected request`.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[derive(Clone, Debug)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

struct SinkState {
    responses: Mutex<VecDeque<(u16, &'static str)>>,
    captured: Mutex<Vec<CapturedRequest>>,
    delay: Duration,
}

pub struct MockSink {
    url: String,
    state: Arc<SinkState>,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl MockSink {
    /// Answer requests with `responses` in order, e.g. `(204, "")` or `(500, "bad request")`.
    pub fn serve(responses: Vec<(u16, &'static str)>) -> Self {
        Self::serve_with_delay(Duration::ZERO, responses)
    }

    /// Like [`MockSink::serve`], but every response is held back for `delay`.
    pub fn serve_with_delay(delay: Duration, responses: Vec<(u16, &'static str)>) -> Self {
        let state = Arc::new(SinkState {
            responses: Mutex::new(responses.into()),
            captured: Mutex::new(Vec::new()),
            delay,
        });

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("mock sink runtime");
        let listener = runtime
            .block_on(TcpListener::bind("127.0.0.1:0"))
            .expect("bind mock sink");
        let url = format!(
            "http://{}/v1/evidence",
            listener.local_addr().expect("mock sink addr")
        );

        let app = Router::new().fallback(capture).with_state(state.clone());
        let (shutdown, stop) = oneshot::channel::<()>();
        let handle = std::thread::spawn(move || {
            runtime.block_on(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = stop.await;
                    })
                    .await
                    .expect("mock sink server");
            });
        });

        Self {
            url,
            state,
            shutdown,
            handle,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stop the server and return every request it received, in arrival order.
    pub fn finish(self) -> Vec<CapturedRequest> {
        let _ = self.shutdown.send(());
        self.handle.join().expect("mock sink thread");
        self.state
            .captured
            .lock()
            .expect("captured requests")
            .clone()
    }
}

async fn capture(
    State(state): State<Arc<SinkState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state
        .captured
        .lock()
        .expect("captured requests")
        .push(CapturedRequest {
            method: method.to_string(),
            path: uri.path().to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| {
                    (
                        k.as_str().to_string(),
                        String::from_utf8_lossy(v.as_bytes()).into_owned(),
                    )
                })
                .collect(),
            body: body.to_vec(),
        });

    let next = state.responses.lock().expect("scripted responses").pop_front();
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    match next {
        Some((status, body)) => {
            let status = StatusCode::from_u16(status).expect("scripted status code");
            (status, body).into_response()
        }
        None => (StatusCode::INTERNAL_SERVER_ERROR, "unexpected request").into_response(),
    }
}
