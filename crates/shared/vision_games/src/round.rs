//! Explicit round lifecycle shared by every game.
//!
//! ```text
//! Idle --start--> AwaitingInput --accept_input--> Evaluating --present/resume--> AwaitingInput
//!                       \                              \
//!                        +----------finish-------------+--> Finished
//! ```
//!
//! All input and timer events go through the gate. Input outside
//! `AwaitingInput` is dropped, and only the first `finish` succeeds, so a late
//! click or a late timer can neither double-score a stimulus nor emit a second
//! summary.

use serde::{Deserialize, Serialize};

use crate::history::RoundSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    #[default]
    Idle,
    AwaitingInput,
    Evaluating,
    Finished,
}

#[derive(Debug, Clone, Default)]
pub struct RoundGate {
    phase: RoundPhase,
    trial: u32,
}

impl RoundGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// 1-based index of the stimulus currently presented; 0 before start.
    pub fn trial(&self) -> u32 {
        self.trial
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.phase,
            RoundPhase::AwaitingInput | RoundPhase::Evaluating
        )
    }

    pub fn is_finished(&self) -> bool {
        self.phase == RoundPhase::Finished
    }

    /// `Idle | Finished -> AwaitingInput`, presenting trial 1.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.phase = RoundPhase::AwaitingInput;
        self.trial = 1;
        true
    }

    /// `AwaitingInput -> Evaluating`. Returns false when the input must be ignored.
    pub fn accept_input(&mut self) -> bool {
        if self.phase != RoundPhase::AwaitingInput {
            return false;
        }
        self.phase = RoundPhase::Evaluating;
        true
    }

    /// `Evaluating -> AwaitingInput` with a fresh stimulus.
    pub fn present(&mut self) -> bool {
        if self.phase != RoundPhase::Evaluating {
            return false;
        }
        self.phase = RoundPhase::AwaitingInput;
        self.trial += 1;
        true
    }

    /// `Evaluating -> AwaitingInput` keeping the same stimulus.
    pub fn resume(&mut self) -> bool {
        if self.phase != RoundPhase::Evaluating {
            return false;
        }
        self.phase = RoundPhase::AwaitingInput;
        true
    }

    /// Enter `Finished`. Only the first call on a running round returns true.
    pub fn finish(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.phase = RoundPhase::Finished;
        true
    }
}

/// What a single event did to a round.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent<S> {
    /// Nothing observable changed.
    None,
    /// Input arrived outside `AwaitingInput` or did not parse; no state change.
    Ignored,
    /// A new stimulus replaced the previous one.
    Presented(S),
    /// A response was judged. `next` is the stimulus shown in its place, if any.
    Judged { correct: bool, next: Option<S> },
    /// The round ended; the summary is produced exactly once.
    Finished(RoundSummary),
}

impl<S> RoundEvent<S> {
    pub fn summary(&self) -> Option<&RoundSummary> {
        match self {
            RoundEvent::Finished(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_summary(self) -> Option<RoundSummary> {
        match self {
            RoundEvent::Finished(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, RoundEvent::Ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_only_accepted_while_awaiting() {
        let mut g = RoundGate::new();
        assert!(!g.accept_input());

        assert!(g.start());
        assert_eq!(g.trial(), 1);
        assert!(g.accept_input());
        // Second input for the same stimulus is dropped.
        assert!(!g.accept_input());

        assert!(g.present());
        assert_eq!(g.trial(), 2);
        assert!(g.accept_input());
        assert!(g.resume());
        assert_eq!(g.trial(), 2);
    }

    #[test]
    fn finish_wins_once() {
        let mut g = RoundGate::new();
        assert!(!g.finish(), "idle round has nothing to finish");
        g.start();
        assert!(g.finish());
        assert!(!g.finish());
        assert!(!g.accept_input());
        assert!(!g.present());
        assert_eq!(g.phase(), RoundPhase::Finished);
    }

    #[test]
    fn restart_after_finish() {
        let mut g = RoundGate::new();
        g.start();
        assert!(!g.start(), "already running");
        g.finish();
        assert!(g.start());
        assert_eq!(g.trial(), 1);
    }
}
