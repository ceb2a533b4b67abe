//! Integration tests for the notification fanout and unread counter
//!
//! Tests cover:
//! - Generic and shaped events rendered through display, audio and push
//! - Fault isolation: failing or panicking effects never block the counter
//! - Attach/detach symmetry and idempotence
//! - Role-sensitive labels, unknown-role fallback, malformed payloads
//! - End to end: events served over HTTP reach the console effects

use axum::{body::Body, http::header, response::IntoResponse, routing::get, Router};
use cabinet_common::sse::SseFrame;
use cabinet_common::CabinetRole;
use cabinet_notify::{
    AudioCuePlayer, EffectError, EventCallback, Notice, NoticeIcon, NoticeSink,
    NotificationEffects, NotificationFanout, PushNotifier, SoundCue, UnreadCounter,
};
use cabinet_stream::{handler, Payload, StreamEvent, StreamTransport, TransportConfig};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Test effects
// =============================================================================

#[derive(Default)]
struct RecordingSink {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl NoticeSink for RecordingSink {
    fn show(&self, notice: &Notice) -> Result<(), EffectError> {
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingAudio {
    cues: Mutex<Vec<SoundCue>>,
}

impl AudioCuePlayer for RecordingAudio {
    fn play(&self, cue: SoundCue) -> Result<(), EffectError> {
        self.cues.lock().unwrap().push(cue);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingPush {
    pushed: AtomicUsize,
}

impl PushNotifier for RecordingPush {
    fn push(&self, _notice: &Notice) -> Result<(), EffectError> {
        self.pushed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FailingAudio;

impl AudioCuePlayer for FailingAudio {
    fn play(&self, _cue: SoundCue) -> Result<(), EffectError> {
        Err(EffectError::Unavailable("no output device".to_string()))
    }
}

struct PanickingAudio;

impl AudioCuePlayer for PanickingAudio {
    fn play(&self, _cue: SoundCue) -> Result<(), EffectError> {
        panic!("audio backend crashed")
    }
}

struct PanickingSink;

impl NoticeSink for PanickingSink {
    fn show(&self, _notice: &Notice) -> Result<(), EffectError> {
        panic!("display torn down")
    }
}

struct DeniedPush;

impl PushNotifier for DeniedPush {
    fn push(&self, _notice: &Notice) -> Result<(), EffectError> {
        Err(EffectError::PermissionDenied("notifications blocked".to_string()))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn offline_transport() -> StreamTransport {
    StreamTransport::new(TransportConfig::new("http://127.0.0.1:9", "user-1", "token"))
}

/// Callback counting how many events the fanout handled
fn counting_callback() -> (EventCallback, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&count);
    let callback: EventCallback = Arc::new(move |_event: &StreamEvent| {
        counted.fetch_add(1, Ordering::SeqCst);
    });
    (callback, count)
}

fn emit_json(transport: &StreamTransport, event: &str, data: serde_json::Value) {
    transport.emit(&StreamEvent::json(event, data));
}

// =============================================================================
// Effects pipeline
// =============================================================================

#[test]
fn test_generic_event_runs_every_effect_once() {
    let transport = offline_transport();
    let sink = Arc::new(RecordingSink::default());
    let audio = Arc::new(RecordingAudio::default());
    let push = Arc::new(RecordingPush::default());
    let effects = NotificationEffects::new(sink.clone())
        .with_audio(audio.clone())
        .with_push(push.clone());
    let fanout = NotificationFanout::new(transport.clone(), effects);
    let (callback, handled) = counting_callback();

    fanout.attach(CabinetRole::Artist, Some(callback));
    emit_json(
        &transport,
        "order_status_changed",
        json!({"title": "Order #12", "message": "Mastering done", "newStatus": "completed", "orderId": 12}),
    );

    let notices = sink.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].event, "order_status_changed");
    assert_eq!(notices[0].icon, NoticeIcon::Status);
    assert_eq!(notices[0].title, "Order #12");
    assert_eq!(notices[0].message, "Mastering done");
    assert_eq!(*audio.cues.lock().unwrap(), vec![SoundCue::Success]);
    assert_eq!(push.pushed.load(Ordering::SeqCst), 1);
    assert_eq!(handled.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shaped_event_uses_message_cue() {
    let transport = offline_transport();
    let sink = Arc::new(RecordingSink::default());
    let audio = Arc::new(RecordingAudio::default());
    let fanout = NotificationFanout::new(
        transport.clone(),
        NotificationEffects::new(sink.clone()).with_audio(audio.clone()),
    );

    fanout.attach(CabinetRole::Dj, None);
    emit_json(
        &transport,
        "direct_message",
        json!({"senderName": "Noor", "text": "sent you the stems"}),
    );

    let notices = sink.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Noor");
    assert_eq!(notices[0].message, "sent you the stems");
    assert_eq!(*audio.cues.lock().unwrap(), vec![SoundCue::Message]);
}

#[test]
fn test_ignores_lifecycle_and_unrecognised_events() {
    let transport = offline_transport();
    let sink = Arc::new(RecordingSink::default());
    let fanout = NotificationFanout::new(transport.clone(), NotificationEffects::new(sink.clone()));
    let (callback, handled) = counting_callback();

    fanout.attach(CabinetRole::Artist, Some(callback));
    emit_json(&transport, "connected", json!({"userId": "user-1"}));
    emit_json(&transport, "typing_indicator", json!({"conversationId": "c-1"}));
    emit_json(&transport, "new_follower", json!({"followerName": "Ana"}));

    assert!(sink.notices().is_empty());
    assert_eq!(handled.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Fault isolation
// =============================================================================

#[test]
fn test_failing_audio_still_shows_notice_and_counts_once() {
    let transport = offline_transport();
    let sink = Arc::new(RecordingSink::default());
    let fanout = NotificationFanout::new(
        transport.clone(),
        NotificationEffects::new(sink.clone()).with_audio(Arc::new(FailingAudio)),
    );
    let unread = UnreadCounter::new(transport.clone());
    let (callback, handled) = counting_callback();

    unread.attach();
    fanout.attach(CabinetRole::Artist, Some(callback));
    emit_json(&transport, "payment_failed", json!({"status": "failed"}));

    assert_eq!(sink.notices().len(), 1);
    assert_eq!(handled.load(Ordering::SeqCst), 1);
    assert_eq!(unread.count(), 1);
}

#[test]
fn test_panicking_effects_do_not_block_counter_or_later_events() {
    let transport = offline_transport();
    let push = Arc::new(RecordingPush::default());
    let effects = NotificationEffects::new(Arc::new(PanickingSink))
        .with_audio(Arc::new(PanickingAudio))
        .with_push(push.clone());
    let fanout = NotificationFanout::new(transport.clone(), effects);
    let unread = UnreadCounter::new(transport.clone());
    let (callback, handled) = counting_callback();

    unread.attach();
    fanout.attach(CabinetRole::Venue, Some(callback));
    emit_json(&transport, "system_alert", json!({"message": "maintenance at 02:00"}));
    emit_json(&transport, "booking_request", json!({}));

    assert_eq!(push.pushed.load(Ordering::SeqCst), 2);
    assert_eq!(handled.load(Ordering::SeqCst), 2);
    assert_eq!(unread.count(), 2);
}

#[test]
fn test_denied_push_is_swallowed() {
    let transport = offline_transport();
    let sink = Arc::new(RecordingSink::default());
    let fanout = NotificationFanout::new(
        transport.clone(),
        NotificationEffects::new(sink.clone()).with_push(Arc::new(DeniedPush)),
    );
    let (callback, handled) = counting_callback();

    fanout.attach(CabinetRole::Producer, Some(callback));
    emit_json(&transport, "content_published", json!({}));

    assert_eq!(sink.notices().len(), 1);
    assert_eq!(handled.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Attach / detach
// =============================================================================

#[test]
fn test_repeated_attach_detach_leaves_no_registrations() {
    let transport = offline_transport();
    let sink = Arc::new(RecordingSink::default());
    let fanout = NotificationFanout::new(transport.clone(), NotificationEffects::new(sink.clone()));
    let (callback, handled) = counting_callback();

    fanout.attach(CabinetRole::Artist, Some(callback.clone()));
    fanout.detach();
    fanout.attach(CabinetRole::Artist, Some(callback));
    fanout.detach();

    assert_eq!(transport.registry().total_handlers(), 0);
    assert!(!fanout.is_attached());

    emit_json(&transport, "system_alert", json!({}));
    emit_json(&transport, "chat_message", json!({"text": "hello?"}));

    assert!(sink.notices().is_empty());
    assert_eq!(handled.load(Ordering::SeqCst), 0);
}

#[test]
fn test_double_attach_does_not_duplicate_handlers() {
    let transport = offline_transport();
    let sink = Arc::new(RecordingSink::default());
    let fanout = NotificationFanout::new(transport.clone(), NotificationEffects::new(sink.clone()));

    fanout.attach(CabinetRole::Artist, None);
    fanout.attach(CabinetRole::Artist, None);

    let subscribed = fanout.event_names().count();
    assert_eq!(transport.registry().total_handlers(), subscribed);
    assert_eq!(transport.registry().handler_count("payment_received"), 1);

    emit_json(&transport, "payment_received", json!({"status": "paid"}));
    assert_eq!(sink.notices().len(), 1);
}

#[test]
fn test_detach_leaves_other_subscribers() {
    let transport = offline_transport();
    let fanout = NotificationFanout::new(
        transport.clone(),
        NotificationEffects::new(Arc::new(RecordingSink::default())),
    );
    let seen = Arc::new(AtomicUsize::new(0));
    let other = {
        let seen = Arc::clone(&seen);
        handler(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
    };

    transport.on("system_alert", other.clone());
    fanout.attach(CabinetRole::Admin, None);
    fanout.detach();

    emit_json(&transport, "system_alert", json!({}));

    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(transport.registry().total_handlers(), 1);
}

#[test]
fn test_dropping_fanout_detaches() {
    let transport = offline_transport();
    {
        let fanout = NotificationFanout::new(
            transport.clone(),
            NotificationEffects::new(Arc::new(RecordingSink::default())),
        );
        fanout.attach(CabinetRole::Radio, None);
        assert!(transport.registry().total_handlers() > 0);
    }
    assert_eq!(transport.registry().total_handlers(), 0);
}

// =============================================================================
// Roles and payload shapes
// =============================================================================

#[test]
fn test_reattach_switches_role_labels() {
    let transport = offline_transport();
    let sink = Arc::new(RecordingSink::default());
    let fanout = NotificationFanout::new(transport.clone(), NotificationEffects::new(sink.clone()));

    fanout.attach(CabinetRole::Artist, None);
    emit_json(&transport, "collaboration_offer", json!({"senderName": "Rui"}));

    fanout.attach(CabinetRole::Producer, None);
    emit_json(&transport, "collaboration_offer", json!({"senderName": "Rui"}));

    let titles: Vec<String> = sink.notices().into_iter().map(|n| n.title).collect();
    assert_eq!(
        titles,
        vec![
            "Collaboration offer from Producer Rui".to_string(),
            "Collaboration offer from Artist Rui".to_string(),
        ]
    );
    assert_eq!(fanout.role(), CabinetRole::Producer);
}

#[test]
fn test_unknown_role_falls_back_to_generic_label() {
    let transport = offline_transport();
    let sink = Arc::new(RecordingSink::default());
    let fanout = NotificationFanout::new(transport.clone(), NotificationEffects::new(sink.clone()));

    fanout.attach(CabinetRole::parse("label_manager"), None);
    emit_json(&transport, "collaboration_response", json!({"accepted": false}));

    let notices = sink.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Collaborator declined your offer");
}

#[test]
fn test_malformed_payloads_degrade_to_default_copy() {
    let transport = offline_transport();
    let sink = Arc::new(RecordingSink::default());
    let fanout = NotificationFanout::new(transport.clone(), NotificationEffects::new(sink.clone()));
    let (callback, handled) = counting_callback();

    fanout.attach(CabinetRole::Artist, Some(callback));
    emit_json(&transport, "subscription_expiring", json!([1, 2, 3]));
    emit_json(&transport, "chat_message", json!({"text": 42, "senderName": null}));
    transport.emit(&StreamEvent::new("new_notification", Payload::Text("{broken".into())));

    let notices = sink.notices();
    assert_eq!(notices.len(), 3);

    assert_eq!(notices[0].title, "Subscription expiring soon");
    assert_eq!(notices[0].message, "You have a new notification");

    assert_eq!(notices[1].title, "Chat");
    assert_eq!(notices[1].message, "42");

    assert_eq!(notices[2].icon, NoticeIcon::Bell);
    assert_eq!(notices[2].title, "Notification");
    assert_eq!(notices[2].message, "{broken");

    assert_eq!(handled.load(Ordering::SeqCst), 3);
}

// =============================================================================
// End to end
// =============================================================================

#[tokio::test]
async fn test_served_events_reach_effects_and_counter() {
    let frames = [
        SseFrame::heartbeat("keepalive"),
        SseFrame::named("chat_message", r#"{"senderName":"Ivo","text":"line check","source":"support"}"#),
        SseFrame::named("new_follower", r#"{"followerName":"Sam"}"#),
        SseFrame::named("payment_received", r#"{"status":"paid"}"#),
    ];
    let body: String = frames.iter().map(SseFrame::to_wire).collect();

    let app = Router::new().route(
        "/stream/:user_id",
        get(move || {
            let body = body.clone();
            async move {
                let stream = async_stream::stream! {
                    yield Ok::<_, std::io::Error>(body);
                    std::future::pending::<()>().await;
                };
                ([(header::CONTENT_TYPE, "text/event-stream")], Body::from_stream(stream))
                    .into_response()
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind test listener");
    let addr = listener.local_addr().expect("Should have local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    let transport = StreamTransport::new(TransportConfig::new(
        format!("http://{}", addr),
        "user-9",
        "token",
    ));
    let sink = Arc::new(RecordingSink::default());
    let fanout = NotificationFanout::new(transport.clone(), NotificationEffects::new(sink.clone()));
    let unread = UnreadCounter::new(transport.clone());

    unread.attach();
    fanout.attach(CabinetRole::Venue, None);
    transport.connect();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while unread.count() < 3 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    transport.disconnect();

    assert_eq!(unread.count(), 3);
    let titles: Vec<String> = sink.notices().into_iter().map(|n| n.title).collect();
    assert_eq!(titles, vec!["Support: Ivo".to_string(), "Payment received".to_string()]);
}
