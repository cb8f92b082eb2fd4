use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CapabilityError;

/// Default beep frequency (correct answer).
pub const TICK_FREQ_DEFAULT: f32 = 880.0;
/// Beep length in seconds.
pub const TICK_DURATION_S: f32 = 0.1;
/// Start gain; the envelope ramps exponentially down to [`TICK_GAIN_END`].
pub const TICK_GAIN_START: f32 = 0.1;
pub const TICK_GAIN_END: f32 = 0.001;

/// A short sine beep with an exponential gain ramp from `gain_start` to
/// `gain_end` over `duration_s`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub freq_hz: f32,
    pub duration_s: f32,
    pub gain_start: f32,
    pub gain_end: f32,
}

impl Tone {
    pub const fn beep(freq_hz: f32) -> Self {
        Self {
            freq_hz,
            duration_s: TICK_DURATION_S,
            gain_start: TICK_GAIN_START,
            gain_end: TICK_GAIN_END,
        }
    }
}

impl Default for Tone {
    fn default() -> Self {
        Self::beep(TICK_FREQ_DEFAULT)
    }
}

/// Platform audio output. Must return promptly; playback is fire-and-forget.
pub trait ToneEmitter {
    fn emit(&mut self, tone: Tone) -> Result<(), CapabilityError>;
}

/// Gates tones on the sound setting and swallows platform failures.
#[derive(Debug)]
pub struct CuePlayer<E> {
    emitter: E,
    enabled: bool,
    failure_reported: bool,
}

impl<E: ToneEmitter> CuePlayer<E> {
    pub fn new(emitter: E, enabled: bool) -> Self {
        Self {
            emitter,
            enabled,
            failure_reported: false,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    pub fn emitter_mut(&mut self) -> &mut E {
        &mut self.emitter
    }

    /// Play if enabled. Returns whether the tone reached the emitter successfully.
    pub fn play(&mut self, tone: Tone) -> bool {
        if !self.enabled {
            return false;
        }
        match self.emitter.emit(tone) {
            Ok(()) => true,
            Err(e) => {
                if !self.failure_reported {
                    warn!("sound cue failed, continuing without audio: {e}");
                    self.failure_reported = true;
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        played: Vec<Tone>,
        fail: bool,
    }

    impl ToneEmitter for Recorder {
        fn emit(&mut self, tone: Tone) -> Result<(), CapabilityError> {
            if self.fail {
                return Err(CapabilityError::Audio("no device".to_string()));
            }
            self.played.push(tone);
            Ok(())
        }
    }

    #[test]
    fn disabled_player_is_silent() {
        let mut p = CuePlayer::new(Recorder::default(), false);
        assert!(!p.play(Tone::default()));
        assert!(p.emitter().played.is_empty());
        p.set_enabled(true);
        assert!(p.play(Tone::beep(660.0)));
        assert_eq!(p.emitter().played, vec![Tone::beep(660.0)]);
    }

    #[test]
    fn failures_do_not_propagate() {
        let mut p = CuePlayer::new(
            Recorder {
                fail: true,
                ..Recorder::default()
            },
            true,
        );
        assert!(!p.play(Tone::default()));
        assert!(!p.play(Tone::default()));
        assert!(p.enabled());
    }

    #[test]
    fn beep_carries_envelope() {
        let t = Tone::default();
        assert_eq!(t.freq_hz, TICK_FREQ_DEFAULT);
        assert_eq!(t.duration_s, TICK_DURATION_S);
        assert!(t.gain_start > t.gain_end);
    }
}
