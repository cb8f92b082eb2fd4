//! Odd-tile-out color discrimination against a countdown.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{sanitize_extent, Viewport};
use crate::history::{ResultPayload, RoundSummary};
use crate::kind::GameKind;
use crate::prng::Prng;
use crate::round::{RoundEvent, RoundGate};
use crate::stats::RoundStats;
use crate::time::{Countdown, Duration};

pub const INITIAL_TIME_S: f64 = 15.0;
pub const TIME_BONUS_S: f64 = 1.5;
pub const TIME_PENALTY_S: f64 = 2.0;
pub const GRID_MAX_SIZE: u32 = 7;
pub const SATURATION_MIN: u32 = 40;
pub const SATURATION_RANGE: u32 = 40;
pub const LIGHTNESS_MIN: u32 = 30;
pub const LIGHTNESS_RANGE: u32 = 40;
pub const DIFF_BASE: u32 = 20;
pub const DIFF_MIN: u32 = 2;
/// Gap between tiles in the rendered grid (px).
pub const TILE_GAP_PX: f64 = 4.0;

pub fn grid_size(level: u32) -> u32 {
    (level / 3 + 2).min(GRID_MAX_SIZE)
}

/// Lightness offset of the odd tile.
pub fn lightness_diff(level: u32) -> u32 {
    DIFF_BASE.saturating_sub(level / 2).max(DIFF_MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Beginner,
    Normal,
    Pro,
    God,
}

impl Rank {
    pub fn for_level(level: u32) -> Self {
        if level > 30 {
            Rank::God
        } else if level > 20 {
            Rank::Pro
        } else if level > 10 {
            Rank::Normal
        } else {
            Rank::Beginner
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Rank::Beginner => "Beginner",
            Rank::Normal => "Normal",
            Rank::Pro => "Pro",
            Rank::God => "God",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Rank::God => "God tier (superhuman color sense)",
            Rank::Pro => "Pro (designer or artist level)",
            Rank::Normal => "Normal (healthy color vision)",
            Rank::Beginner => "Beginner (keep training your eyes)",
        }
    }
}

/// One board: every tile shares `hue`/`saturation`; one tile differs in lightness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorBoard {
    pub level: u32,
    pub size: u32,
    pub hue: u32,
    pub saturation: u32,
    pub lightness: u32,
    pub target_lightness: u32,
    pub target_index: u32,
}

impl ColorBoard {
    pub fn generate(level: u32, rng: &mut Prng) -> Self {
        let size = grid_size(level);
        let hue = rng.gen_range_u32(0, 360);
        let saturation = rng.gen_range_u32(0, SATURATION_RANGE) + SATURATION_MIN;
        let lightness = rng.gen_range_u32(0, LIGHTNESS_RANGE) + LIGHTNESS_MIN;
        let diff = lightness_diff(level);
        // Move away from mid-gray so the offset never clips at 0% or 100%.
        let target_lightness = if lightness > 50 {
            lightness - diff
        } else {
            lightness + diff
        };
        let target_index = rng.gen_range_u32(0, size * size);
        Self {
            level,
            size,
            hue,
            saturation,
            lightness,
            target_lightness,
            target_index,
        }
    }

    pub fn tile_count(&self) -> u32 {
        self.size * self.size
    }

    pub fn diff(&self) -> u32 {
        self.lightness.abs_diff(self.target_lightness)
    }

    pub fn tile_css(&self, index: u32) -> String {
        let l = if index == self.target_index {
            self.target_lightness
        } else {
            self.lightness
        };
        format!("hsl({}, {}%, {}%)", self.hue, self.saturation, l)
    }

    /// Side length of a square tile filling `viewport` width with gaps.
    pub fn tile_side_px(&self, viewport: Viewport) -> f64 {
        let v = viewport.sanitized();
        let n = self.size.max(1) as f64;
        let side = (v.width.min(v.height) - TILE_GAP_PX * (n - 1.0)) / n;
        sanitize_extent(side)
    }
}

#[derive(Debug, Clone)]
pub struct ColorRound {
    gate: RoundGate,
    level: u32,
    countdown: Option<Countdown>,
    board: Option<ColorBoard>,
    stats: RoundStats,
    viewport: Viewport,
}

impl ColorRound {
    pub fn new() -> Self {
        Self {
            gate: RoundGate::new(),
            level: 1,
            countdown: None,
            board: None,
            stats: RoundStats::new(),
            viewport: Viewport::default(),
        }
    }

    /// Board area the tiles are laid out in.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport.sanitized();
    }

    pub fn gate(&self) -> &RoundGate {
        &self.gate
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn stats(&self) -> &RoundStats {
        &self.stats
    }

    pub fn stimulus(&self) -> Option<&ColorBoard> {
        self.board.as_ref()
    }

    pub fn remaining_s(&self) -> f64 {
        self.countdown.as_ref().map_or(0.0, |c| c.remaining_s().max(0.0))
    }

    pub fn start(&mut self, rng: &mut Prng) -> RoundEvent<ColorBoard> {
        if !self.gate.start() {
            return RoundEvent::Ignored;
        }
        self.level = 1;
        self.stats = RoundStats::new();
        self.countdown = Some(Countdown::new(INITIAL_TIME_S));
        debug!("color round started");
        let board = ColorBoard::generate(self.level, rng);
        self.board = Some(board.clone());
        RoundEvent::Presented(board)
    }

    /// Click on tile `index`. Out-of-range indices are ignored.
    pub fn click(&mut self, index: u32, rng: &mut Prng) -> RoundEvent<ColorBoard> {
        let Some(board) = self.board.as_ref() else {
            return RoundEvent::Ignored;
        };
        if index >= board.tile_count() {
            return RoundEvent::Ignored;
        }
        let is_target = index == board.target_index;
        if !self.gate.accept_input() {
            return RoundEvent::Ignored;
        }

        self.stats.record_trial(is_target);
        if is_target {
            self.level += 1;
            self.stats.add_score(1);
            if let Some(c) = self.countdown.as_mut() {
                c.adjust(TIME_BONUS_S);
            }
            let next = ColorBoard::generate(self.level, rng);
            self.board = Some(next.clone());
            self.gate.present();
            RoundEvent::Judged {
                correct: true,
                next: Some(next),
            }
        } else {
            // Wrong tiles cost time only; the board and level stay.
            if let Some(c) = self.countdown.as_mut() {
                c.adjust(-TIME_PENALTY_S);
            }
            self.gate.resume();
            RoundEvent::Judged {
                correct: false,
                next: None,
            }
        }
    }

    pub fn tick(&mut self, dt: Duration) -> RoundEvent<ColorBoard> {
        if !self.gate.is_running() {
            return RoundEvent::None;
        }
        self.stats.advance(dt);
        let expired = self.countdown.as_mut().is_some_and(|c| c.advance(dt));
        if expired {
            self.finish()
        } else {
            RoundEvent::None
        }
    }

    pub fn stop(&mut self) -> RoundEvent<ColorBoard> {
        self.finish()
    }

    fn finish(&mut self) -> RoundEvent<ColorBoard> {
        if !self.gate.finish() {
            return RoundEvent::Ignored;
        }
        self.countdown = None;
        self.board = None;
        let rank = Rank::for_level(self.level);
        debug!(level = self.level, ?rank, "color round finished");
        RoundEvent::Finished(RoundSummary::new(
            GameKind::Color,
            ResultPayload::Level {
                level: self.level,
                rank,
            },
        ))
    }
}

impl Default for ColorRound {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_seven_board() {
        assert_eq!(grid_size(7), 4);
        assert_eq!(lightness_diff(7), 17);
        let b = ColorBoard::generate(7, &mut Prng::new(1));
        assert_eq!(b.size, 4);
        assert_eq!(b.diff(), 17);
        assert!(b.target_index < 16);
    }

    #[test]
    fn grid_and_diff_saturate() {
        assert_eq!(grid_size(1), 2);
        assert_eq!(grid_size(100), GRID_MAX_SIZE);
        assert_eq!(lightness_diff(1), 20);
        assert_eq!(lightness_diff(36), DIFF_MIN);
        assert_eq!(lightness_diff(500), DIFF_MIN);
    }

    #[test]
    fn channels_in_documented_ranges() {
        let mut rng = Prng::new(77);
        for level in 1..60 {
            let b = ColorBoard::generate(level, &mut rng);
            assert!(b.hue < 360);
            assert!((40..80).contains(&b.saturation));
            assert!((30..70).contains(&b.lightness));
            assert!(b.diff() >= DIFF_MIN);
            assert!(b.target_lightness <= 100);
        }
    }

    #[test]
    fn css_marks_only_the_target() {
        let b = ColorBoard {
            level: 1,
            size: 2,
            hue: 120,
            saturation: 50,
            lightness: 60,
            target_lightness: 40,
            target_index: 3,
        };
        assert_eq!(b.tile_css(0), "hsl(120, 50%, 60%)");
        assert_eq!(b.tile_css(3), "hsl(120, 50%, 40%)");
        assert!(b.tile_side_px(Viewport::new(0.0, 0.0)) >= 1.0);
        assert_eq!(b.tile_side_px(Viewport::new(204.0, 300.0)), 100.0);
    }

    #[test]
    fn correct_raises_level_and_adds_time() {
        let mut rng = Prng::new(3);
        let mut round = ColorRound::new();
        round.start(&mut rng);
        let target = round.stimulus().unwrap().target_index;
        match round.click(target, &mut rng) {
            RoundEvent::Judged { correct: true, next: Some(b) } => assert_eq!(b.level, 2),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(round.level(), 2);
        assert!((round.remaining_s() - (INITIAL_TIME_S + TIME_BONUS_S)).abs() < 1e-9);
    }

    #[test]
    fn wrong_tile_costs_time_not_level() {
        let mut rng = Prng::new(4);
        let mut round = ColorRound::new();
        round.start(&mut rng);
        let board = round.stimulus().unwrap().clone();
        let wrong = (board.target_index + 1) % board.tile_count();
        let ev = round.click(wrong, &mut rng);
        assert_eq!(
            ev,
            RoundEvent::Judged {
                correct: false,
                next: None
            }
        );
        assert_eq!(round.level(), 1);
        assert_eq!(round.stimulus(), Some(&board));
        assert!((round.remaining_s() - (INITIAL_TIME_S - TIME_PENALTY_S)).abs() < 1e-9);
        assert!(round.click(99, &mut rng).is_ignored());
    }

    #[test]
    fn countdown_ends_round_once() {
        let mut rng = Prng::new(8);
        let mut round = ColorRound::new();
        round.start(&mut rng);
        let mut summaries = 0;
        for _ in 0..200 {
            if round.tick(Duration::from_millis(100)).summary().is_some() {
                summaries += 1;
            }
        }
        assert_eq!(summaries, 1);
        assert!(round.click(0, &mut rng).is_ignored());
        assert!(round.stop().is_ignored());
    }

    #[test]
    fn ranks() {
        assert_eq!(Rank::for_level(10), Rank::Beginner);
        assert_eq!(Rank::for_level(11), Rank::Normal);
        assert_eq!(Rank::for_level(21), Rank::Pro);
        assert_eq!(Rank::for_level(31), Rank::God);
    }
}
