//! Terminal implementations of the notification effects

use std::io::Write;
use tracing::info;

use crate::effects::{AudioCuePlayer, EffectError, NoticeSink, PushNotifier};
use crate::notice::{Notice, SoundCue};

/// Prints each notice as one line on stdout
#[derive(Debug, Default)]
pub struct ConsoleNoticeSink;

impl NoticeSink for ConsoleNoticeSink {
    fn show(&self, notice: &Notice) -> Result<(), EffectError> {
        let line = format!(
            "[{}] {:?} {}: {}\n",
            notice.received_at.format("%H:%M:%S"),
            notice.icon,
            notice.title,
            notice.message
        );
        std::io::stdout()
            .lock()
            .write_all(line.as_bytes())
            .map_err(|e| EffectError::Failed(e.to_string()))
    }
}

/// Rings the terminal bell; silent cues are skipped
#[derive(Debug, Default)]
pub struct TerminalBell {
    pub muted: bool,
}

impl AudioCuePlayer for TerminalBell {
    fn play(&self, cue: SoundCue) -> Result<(), EffectError> {
        if self.muted {
            return Err(EffectError::Unavailable("terminal bell muted".to_string()));
        }
        let rings = match cue {
            SoundCue::Error => 2,
            _ => 1,
        };
        let mut stderr = std::io::stderr().lock();
        for _ in 0..rings {
            stderr
                .write_all(b"\x07")
                .map_err(|e| EffectError::Failed(e.to_string()))?;
        }
        stderr.flush().map_err(|e| EffectError::Failed(e.to_string()))
    }
}

/// Stands in for an OS push service by logging the request
#[derive(Debug, Default)]
pub struct LogPushNotifier;

impl PushNotifier for LogPushNotifier {
    fn push(&self, notice: &Notice) -> Result<(), EffectError> {
        info!(
            notice_id = %notice.id,
            event = %notice.event,
            title = %notice.title,
            "Push notification requested"
        );
        Ok(())
    }
}
