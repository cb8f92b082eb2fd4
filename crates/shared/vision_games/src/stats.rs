use serde::{Deserialize, Serialize};

use crate::time::Duration;

/// Counters for one round. Converted into a summary when the round ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundStats {
    pub attempted: u32,
    pub correct: u32,
    pub combo: u32,
    pub best_combo: u32,
    pub score: u32,
    pub elapsed_s: f64,
}

impl RoundStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_trial(&mut self, is_correct: bool) {
        self.attempted += 1;
        if is_correct {
            self.correct += 1;
            self.combo += 1;
            self.best_combo = self.best_combo.max(self.combo);
        } else {
            self.combo = 0;
        }
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    pub fn advance(&mut self, dt: Duration) {
        self.elapsed_s += dt.as_secs_f64();
    }

    pub fn incorrect(&self) -> u32 {
        self.attempted - self.correct
    }

    /// Fraction correct so far; 1.0 before the first trial.
    pub fn accuracy(&self) -> f64 {
        if self.attempted == 0 {
            1.0
        } else {
            self.correct as f64 / self.attempted as f64
        }
    }

    /// Accuracy as a whole percentage for display; 0 before the first trial.
    pub fn accuracy_percent(&self) -> u32 {
        if self.attempted == 0 {
            0
        } else {
            (self.accuracy() * 100.0).round() as u32
        }
    }

    pub fn elapsed_whole_s(&self) -> u64 {
        self.elapsed_s.max(0.0).floor() as u64
    }
}
