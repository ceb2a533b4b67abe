//! Reconnecting event-stream transport
//!
//! One [`StreamTransport`] per authenticated user session. It owns the
//! in-flight request (a [`CancellationToken`] per attempt) and the pending
//! reconnect timer (a [`JoinHandle`]); callers only ever connect, disconnect,
//! reset, and (un)register handlers.
//!
//! **Connection lifecycle:**
//! ```text
//! Idle ──connect──▶ Connecting ──2xx──▶ Connected ──stream ends──┐
//!                      │                                          │
//!                      └──failure──▶ Disconnected ◀───────────────┘
//!                                       │  attempts < max: retry after backoff
//!                                       └─ attempts = max: GaveUp (terminal until reset)
//! ```
//!
//! Every attempt is stamped with a generation number. `connect()` and
//! `disconnect()` bump the generation, which turns any older attempt or timer
//! inert even if it is still mid-flight.

use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use cabinet_common::config::StreamSettings;

use crate::error::StreamError;
use crate::events::{LifecycleEvent, StreamEvent};
use crate::parser::{parse_buffer, TextDecoder};
use crate::policy::ReconnectPolicy;
use crate::registry::{Handler, HandlerRegistry};

/// Connection state, one per transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Disconnected,
    GaveUp,
}

/// Endpoint, identity and reconnect tuning for one session
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL; the stream is `<base_url>/stream/<user_id>`
    pub base_url: String,
    pub user_id: String,
    /// Bearer credential sent on every attempt
    pub credential: String,
    pub policy: ReconnectPolicy,
    pub connect_timeout: Duration,
    /// Undelimited text tolerated before the attempt is failed
    pub max_pending_bytes: usize,
}

/// Default cap on buffered text without a blank-line terminator
pub const DEFAULT_MAX_PENDING_BYTES: usize = 1024 * 1024;

impl TransportConfig {
    pub fn new(
        base_url: impl Into<String>,
        user_id: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        let defaults = StreamSettings::default();
        Self {
            base_url: base_url.into(),
            user_id: user_id.into(),
            credential: credential.into(),
            policy: ReconnectPolicy::default(),
            connect_timeout: Duration::from_millis(defaults.connect_timeout_ms),
            max_pending_bytes: DEFAULT_MAX_PENDING_BYTES,
        }
    }

    /// Apply reconnect and timeout settings from the `[stream]` config section
    pub fn with_settings(mut self, settings: &StreamSettings) -> Self {
        self.policy = ReconnectPolicy::from_settings(settings);
        self.connect_timeout = Duration::from_millis(settings.connect_timeout_ms);
        self
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_pending_bytes(mut self, max_pending_bytes: usize) -> Self {
        self.max_pending_bytes = max_pending_bytes;
        self
    }

    /// `<base_url>/stream/<user_id>`
    pub fn stream_url(&self) -> String {
        format!("{}/stream/{}", self.base_url.trim_end_matches('/'), self.user_id)
    }
}

/// Mutable connection bookkeeping, guarded by one mutex
struct Shared {
    state: ConnectionState,
    reconnect_attempts: u32,
    intentional_disconnect: bool,
    generation: u64,
    abort: Option<CancellationToken>,
    reconnect_timer: Option<JoinHandle<()>>,
    /// Set after the first failure of a burst has been logged at warn
    failure_logged: bool,
}

struct Inner {
    config: TransportConfig,
    client: Result<reqwest::Client, StreamError>,
    registry: HandlerRegistry,
    shared: Mutex<Shared>,
}

/// What a failed attempt turns into once the lock is released
enum FailureOutcome {
    Retry(LifecycleEvent),
    GaveUp(LifecycleEvent),
}

/// Resilient publish/subscribe surface over one event stream
///
/// Cloning is cheap and yields a handle to the same connection.
///
/// `connect()` spawns Tokio tasks and must be called from within a Tokio
/// runtime. Tasks keep the transport alive until `disconnect()` is called or
/// the attempt budget runs out.
#[derive(Clone)]
pub struct StreamTransport {
    inner: Arc<Inner>,
}

impl StreamTransport {
    pub fn new(config: TransportConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| StreamError::Client(e.to_string()));

        Self {
            inner: Arc::new(Inner {
                config,
                client,
                registry: HandlerRegistry::new(),
                shared: Mutex::new(Shared {
                    state: ConnectionState::Idle,
                    reconnect_attempts: 0,
                    intentional_disconnect: false,
                    generation: 0,
                    abort: None,
                    reconnect_timer: None,
                    failure_logged: false,
                }),
            }),
        }
    }

    /// Open the stream, replacing any in-flight attempt
    ///
    /// No-op once the transport has given up; call [`reset`](Self::reset)
    /// first to try again.
    pub fn connect(&self) {
        self.inner.connect();
    }

    /// Stop the stream and the retry loop; handlers stay registered
    pub fn disconnect(&self) {
        let mut shared = self.inner.lock();
        shared.intentional_disconnect = true;
        shared.generation += 1;

        if let Some(timer) = shared.reconnect_timer.take() {
            timer.abort();
        }
        if let Some(abort) = shared.abort.take() {
            abort.cancel();
        }
        if shared.state != ConnectionState::GaveUp {
            shared.state = ConnectionState::Disconnected;
        }

        info!(user_id = %self.inner.config.user_id, "Event stream disconnected by caller");
    }

    /// Clear the given-up state and attempt counter so `connect()` works again
    pub fn reset(&self) {
        let mut shared = self.inner.lock();
        if shared.state == ConnectionState::GaveUp {
            shared.state = ConnectionState::Idle;
        }
        shared.reconnect_attempts = 0;
        shared.failure_logged = false;
    }

    /// Register `handler` for `event_name` (`"*"` for every event)
    pub fn on(&self, event_name: &str, handler: Handler) -> bool {
        self.inner.registry.on(event_name, handler)
    }

    /// Unregister `handler` from `event_name`
    pub fn off(&self, event_name: &str, handler: &Handler) -> bool {
        self.inner.registry.off(event_name, handler)
    }

    /// Deliver `event` to subscribers exactly as if it had arrived on the stream
    pub fn emit(&self, event: &StreamEvent) {
        self.inner.registry.emit(event);
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    /// Consecutive failures since the last successful connection
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.lock().reconnect_attempts
    }

    pub fn user_id(&self) -> &str {
        &self.inner.config.user_id
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.inner.registry
    }
}

impl std::fmt::Debug for StreamTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("user_id", &self.inner.config.user_id)
            .field("state", &self.state())
            .finish()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn connect(self: &Arc<Self>) {
        self.start_attempt(None);
    }

    /// Start a new attempt, superseding any previous one
    ///
    /// A reconnect timer passes the generation it was scheduled under. Its
    /// attempt only starts if that generation is still current and no
    /// disconnect was requested, checked under the lock that starts it.
    fn start_attempt(self: &Arc<Self>, scheduled_under: Option<u64>) -> bool {
        let (generation, cancel) = {
            let mut shared = self.lock();
            if let Some(expected) = scheduled_under {
                if shared.generation != expected || shared.intentional_disconnect {
                    trace!(generation = expected, "Reconnect timer superseded");
                    return false;
                }
                // The running timer is this task: drop its handle, do not abort it
                shared.reconnect_timer = None;
            }
            if shared.state == ConnectionState::GaveUp {
                debug!(user_id = %self.config.user_id, "connect() ignored: transport has given up");
                return false;
            }

            if let Some(previous) = shared.abort.take() {
                previous.cancel();
            }
            if let Some(timer) = shared.reconnect_timer.take() {
                timer.abort();
            }

            shared.intentional_disconnect = false;
            shared.generation += 1;
            shared.state = ConnectionState::Connecting;

            let cancel = CancellationToken::new();
            shared.abort = Some(cancel.clone());
            (shared.generation, cancel)
        };

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.run_attempt(generation, cancel).await;
        });
        true
    }

    async fn run_attempt(self: Arc<Self>, generation: u64, cancel: CancellationToken) {
        let failure = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                trace!(generation, "Stream attempt aborted");
                return;
            }
            failure = self.consume(generation) => failure,
        };

        self.handle_failure(generation, failure);
    }

    /// Open the stream and pump it until it fails; always returns the failure
    async fn consume(&self, generation: u64) -> StreamError {
        let client = match &self.client {
            Ok(client) => client,
            Err(e) => return e.clone(),
        };

        let url = self.config.stream_url();
        debug!(url = %url, generation, "Opening event stream");

        let response = match client
            .get(&url)
            .bearer_auth(&self.config.credential)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return e.into(),
        };

        let status = response.status();
        if !status.is_success() {
            return StreamError::HttpStatus(status.as_u16());
        }
        if status == StatusCode::NO_CONTENT {
            return StreamError::NoBody;
        }

        if !self.mark_connected(generation) {
            // Superseded between send() and now; the cancel branch wins next poll
            return StreamError::StreamEnded;
        }

        let mut body = response.bytes_stream();
        let mut decoder = TextDecoder::new();
        let mut buffer = String::new();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => return e.into(),
            };

            let text = decoder.decode(&chunk);
            // Without a newline in this chunk no new block can have completed
            let may_complete_block = text.contains('\n');
            buffer.push_str(&text);

            if may_complete_block {
                let output = parse_buffer(&buffer);
                buffer = output.remainder;

                for parsed in output.events {
                    if parsed.is_heartbeat() {
                        trace!("Heartbeat received");
                        continue;
                    }
                    let event = StreamEvent::new(parsed.channel(), parsed.decode_payload());
                    self.registry.emit(&event);
                }
            }

            if buffer.len() > self.config.max_pending_bytes {
                warn!(
                    user_id = %self.config.user_id,
                    pending = buffer.len(),
                    limit = self.config.max_pending_bytes,
                    "Unterminated event block exceeds buffer limit"
                );
                return StreamError::BufferOverflow(buffer.len());
            }
        }

        StreamError::StreamEnded
    }

    /// Transition to Connected; false if this attempt has been superseded
    fn mark_connected(&self, generation: u64) -> bool {
        {
            let mut shared = self.lock();
            if shared.generation != generation || shared.intentional_disconnect {
                return false;
            }
            shared.state = ConnectionState::Connected;
            shared.reconnect_attempts = 0;
            shared.failure_logged = false;
        }

        info!(user_id = %self.config.user_id, "Event stream connected");
        self.registry.emit(
            &LifecycleEvent::Connected {
                user_id: self.config.user_id.clone(),
            }
            .to_stream_event(),
        );
        true
    }

    fn handle_failure(self: &Arc<Self>, generation: u64, failure: StreamError) {
        let outcome = {
            let mut shared = self.lock();
            if shared.generation != generation || shared.intentional_disconnect {
                trace!(generation, "Ignoring failure of superseded attempt");
                return;
            }

            shared.abort = None;
            shared.state = ConnectionState::Disconnected;

            if shared.failure_logged {
                debug!(user_id = %self.config.user_id, error = %failure, "Event stream attempt failed");
            } else {
                warn!(user_id = %self.config.user_id, error = %failure, "Event stream attempt failed");
                shared.failure_logged = true;
            }

            let attempts = shared.reconnect_attempts;
            if self.config.policy.is_exhausted(attempts) {
                shared.state = ConnectionState::GaveUp;
                FailureOutcome::GaveUp(LifecycleEvent::GaveUp {
                    user_id: self.config.user_id.clone(),
                    attempts,
                })
            } else {
                shared.reconnect_attempts = attempts + 1;
                let delay = self.config.policy.delay_for_attempt(attempts + 1);
                shared.reconnect_timer = Some(self.schedule_reconnect(generation, delay));

                FailureOutcome::Retry(LifecycleEvent::Disconnected {
                    reason: failure.reason(),
                    attempts,
                    retry_in_ms: delay.as_millis() as u64,
                    status: failure.status(),
                })
            }
        };

        match outcome {
            FailureOutcome::Retry(event) => {
                self.registry.emit(&event.to_stream_event());
            }
            FailureOutcome::GaveUp(event) => {
                warn!(
                    user_id = %self.config.user_id,
                    attempts = self.config.policy.max_attempts,
                    "Event stream gave up after repeated failures"
                );
                self.registry.emit(&event.to_stream_event());
            }
        }
    }

    fn schedule_reconnect(self: &Arc<Self>, generation: u64, delay: Duration) -> JoinHandle<()> {
        debug!(delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
        let inner = Arc::clone(self);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.start_attempt(Some(generation));
        })
    }
}
