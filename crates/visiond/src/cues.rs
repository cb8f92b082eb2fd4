//! Host-side sound and notification outputs for the daemon.
//!
//! The daemon has no audio device of its own: tones are forwarded to the
//! display client inside the next `State` response, and optionally echoed as a
//! terminal bell.

use std::collections::VecDeque;
use std::io::Write as _;

use tracing::info;
use vision_games::cues::{Tone, ToneEmitter};
use vision_games::reminder::Notifier;
use vision_games::CapabilityError;

/// Bound on undelivered tones when no client is polling.
const MAX_QUEUED_TONES: usize = 16;

/// Queues tones for the client and rings the terminal bell if asked to.
#[derive(Debug, Default)]
pub struct ClientTones {
    queue: VecDeque<Tone>,
    bell: bool,
}

impl ClientTones {
    pub fn new(bell: bool) -> Self {
        Self {
            queue: VecDeque::new(),
            bell,
        }
    }

    /// Tones emitted since the last call, oldest first.
    pub fn drain(&mut self) -> Vec<Tone> {
        self.queue.drain(..).collect()
    }
}

impl ToneEmitter for ClientTones {
    fn emit(&mut self, tone: Tone) -> Result<(), CapabilityError> {
        if self.queue.len() == MAX_QUEUED_TONES {
            self.queue.pop_front();
        }
        self.queue.push_back(tone);
        if self.bell {
            let mut err = std::io::stderr();
            err.write_all(b"\x07")
                .and_then(|_| err.flush())
                .map_err(|e| CapabilityError::Audio(e.to_string()))?;
        }
        Ok(())
    }
}

/// Break reminders as log lines plus a message for the client to show.
#[derive(Debug, Default)]
pub struct LogNotifier {
    pending: Option<String>,
}

impl LogNotifier {
    pub fn take(&mut self) -> Option<String> {
        self.pending.take()
    }
}

impl Notifier for LogNotifier {
    fn notify(&mut self, title: &str, body: &str, tag: &str) -> Result<(), CapabilityError> {
        info!(tag, "{}: {}", title, body);
        self.pending = Some(format!("{title}\n{body}"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vision_games::cues::CuePlayer;

    #[test]
    fn queue_is_bounded() {
        let mut player = CuePlayer::new(ClientTones::new(false), true);
        for i in 0..40 {
            player.play(Tone::beep(100.0 + i as f32));
        }
        let tones = player.emitter_mut().drain();
        assert_eq!(tones.len(), MAX_QUEUED_TONES);
        assert_eq!(tones.last().map(|t| t.freq_hz), Some(139.0));
        assert!(player.emitter_mut().drain().is_empty());
    }

    #[test]
    fn notifier_keeps_latest_message() {
        let mut n = LogNotifier::default();
        n.notify("t", "b", "tag").unwrap();
        assert_eq!(n.take().as_deref(), Some("t\nb"));
        assert_eq!(n.take(), None);
    }
}
