//! Side-effect seams invoked for every notice
//!
//! Display, audio and OS push are supplied by the host. Each call goes through
//! [`best_effort`]: an `Err` or a panic from one effect is logged at debug level
//! and never reaches the next effect or the unread counter.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::notice::{Notice, SoundCue};

#[derive(Debug, Error)]
pub enum EffectError {
    #[error("Effect unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Effect failed: {0}")]
    Failed(String),
}

/// Shows transient notices
pub trait NoticeSink: Send + Sync {
    fn show(&self, notice: &Notice) -> Result<(), EffectError>;
}

/// Plays a short audio cue
pub trait AudioCuePlayer: Send + Sync {
    fn play(&self, cue: SoundCue) -> Result<(), EffectError>;
}

/// Requests an OS-level push notification
pub trait PushNotifier: Send + Sync {
    fn push(&self, notice: &Notice) -> Result<(), EffectError>;
}

/// The effects a fanout drives; audio and push are optional
#[derive(Clone)]
pub struct NotificationEffects {
    notices: Arc<dyn NoticeSink>,
    audio: Option<Arc<dyn AudioCuePlayer>>,
    push: Option<Arc<dyn PushNotifier>>,
}

impl NotificationEffects {
    pub fn new(notices: Arc<dyn NoticeSink>) -> Self {
        Self {
            notices,
            audio: None,
            push: None,
        }
    }

    pub fn with_audio(mut self, audio: Arc<dyn AudioCuePlayer>) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_push(mut self, push: Arc<dyn PushNotifier>) -> Self {
        self.push = Some(push);
        self
    }

    /// Run display, audio and push for one notice, each isolated from the others
    pub fn deliver(&self, notice: &Notice, cue: SoundCue) {
        best_effort("display", &notice.event, || self.notices.show(notice));

        if let Some(audio) = &self.audio {
            best_effort("audio", &notice.event, || audio.play(cue));
        }

        if let Some(push) = &self.push {
            best_effort("push", &notice.event, || push.push(notice));
        }
    }
}

impl std::fmt::Debug for NotificationEffects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationEffects")
            .field("audio", &self.audio.is_some())
            .field("push", &self.push.is_some())
            .finish()
    }
}

/// Run `effect`, swallowing both errors and panics; returns whether it succeeded
pub fn best_effort<F>(effect: &str, event: &str, f: F) -> bool
where
    F: FnOnce() -> Result<(), EffectError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            debug!(effect, event, error = %e, "Notification effect failed");
            false
        }
        Err(_) => {
            debug!(effect, event, "Notification effect panicked");
            false
        }
    }
}
