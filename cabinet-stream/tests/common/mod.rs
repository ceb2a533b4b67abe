//! Test helpers: scripted in-process event-stream endpoint and event recorder

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use cabinet_stream::{handler, Handler, LifecycleEvent, ReconnectPolicy, StreamEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the endpoint answers for the n-th request (0-based)
#[derive(Debug, Clone)]
pub enum Reply {
    /// Bare status code, empty body
    Status(u16),
    /// 200 with `text/event-stream`; chunks are written with a short pause
    /// between them; the body stays open afterwards when `keep_open`
    Stream { chunks: Vec<String>, keep_open: bool },
}

/// Request as observed by the endpoint
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub user_id: String,
    pub authorization: Option<String>,
    pub accept: Option<String>,
}

type Script = Arc<dyn Fn(usize) -> Reply + Send + Sync>;

#[derive(Clone)]
struct ServerState {
    script: Script,
    requests: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

pub struct TestServer {
    pub base_url: String,
    requests: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl TestServer {
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

/// Start an endpoint serving `GET /stream/:user_id` according to `script`
pub async fn spawn_server<F>(script: F) -> TestServer
where
    F: Fn(usize) -> Reply + Send + Sync + 'static,
{
    let state = ServerState {
        script: Arc::new(script),
        requests: Arc::new(AtomicUsize::new(0)),
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let requests = Arc::clone(&state.requests);
    let seen = Arc::clone(&state.seen);

    let app = Router::new()
        .route("/stream/:user_id", get(stream_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind test listener");
    let addr = listener.local_addr().expect("Should have local address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        requests,
        seen,
    }
}

async fn stream_handler(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let index = state.requests.fetch_add(1, Ordering::SeqCst);
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.seen.lock().unwrap().push(SeenRequest {
        user_id,
        authorization: header_value(header::AUTHORIZATION),
        accept: header_value(header::ACCEPT),
    });

    match (state.script)(index) {
        Reply::Status(code) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        Reply::Stream { chunks, keep_open } => {
            let body = async_stream::stream! {
                for chunk in chunks {
                    yield Ok::<_, std::io::Error>(chunk);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                if keep_open {
                    std::future::pending::<()>().await;
                }
            };
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from_stream(body),
            )
                .into_response()
        }
    }
}

/// Collects every event delivered to its handler
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<StreamEvent>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(&self) -> Handler {
        let events = Arc::clone(&self.events);
        handler(move |event| events.lock().unwrap().push(event.clone()))
    }

    pub fn events(&self) -> Vec<StreamEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.event == name).count()
    }

    pub fn lifecycle(&self) -> Vec<LifecycleEvent> {
        self.events()
            .iter()
            .filter_map(LifecycleEvent::from_stream_event)
            .collect()
    }
}

/// Poll `condition` every 10ms until it holds or `timeout` elapses
pub async fn wait_until<F>(timeout: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Short delays so retry tests finish quickly: 20, 40, 80, 80, 80 ms
pub fn fast_policy() -> ReconnectPolicy {
    ReconnectPolicy::new(Duration::from_millis(20), Duration::from_millis(80), 5)
}
