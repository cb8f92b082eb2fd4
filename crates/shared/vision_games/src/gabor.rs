//! Gabor-patch search: find every patch matching the sample orientation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ParseError;
use crate::geometry::{free_span, Point, Viewport};
use crate::history::{ResultPayload, RoundSummary};
use crate::kind::GameKind;
use crate::prng::Prng;
use crate::round::{RoundEvent, RoundGate};
use crate::stats::RoundStats;
use crate::time::Duration;

pub const NUM_TARGETS: usize = 3;
pub const PATCH_AREA_FACTOR: f64 = 1.5;
pub const PATCH_COUNT_MIN: usize = 10;
pub const PATCH_COUNT_MAX: usize = 50;
/// Grid boards stop growing here; extra rows or columns are not filled.
pub const GRID_PATCH_MAX: usize = 4096;
pub const ROTATION_STEP_DEG: f64 = 22.5;
pub const ROTATION_STEPS: u32 = 8;
pub const HINT_DURATION: Duration = Duration::from_millis(1000);
pub const NEXT_BOARD_DELAY: Duration = Duration::from_millis(500);
pub const SCORE_PER_CLEAR: u32 = 10;
/// Patch opacity.
pub const CONTRAST: f64 = 0.5;
pub const FOUND_OPACITY: f64 = 0.3;
pub const DIMMED_OPACITY: f64 = 0.1;

pub const PATCH_SIZE_DEFAULT_PX: f64 = 60.0;
pub const PATCH_SIZE_MIN_PX: f64 = 30.0;
pub const PATCH_SIZE_MAX_PX: f64 = 120.0;

pub fn rotation_deg(step: u32) -> f64 {
    (step % ROTATION_STEPS) as f64 * ROTATION_STEP_DEG
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Grid,
    #[default]
    Random,
}

impl Layout {
    pub fn label(self) -> &'static str {
        match self {
            Layout::Grid => "grid",
            Layout::Random => "random",
        }
    }

    pub fn parse(v: &str) -> Result<Self, ParseError> {
        match v.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(Layout::Grid),
            "random" => Ok(Layout::Random),
            other => Err(ParseError::Layout(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchState {
    Idle,
    Found,
    Dimmed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub pos: Point,
    pub rotation_step: u32,
    pub is_target: bool,
    pub state: PatchState,
}

impl Patch {
    pub fn rotation_deg(&self) -> f64 {
        rotation_deg(self.rotation_step)
    }

    pub fn opacity(&self) -> f64 {
        match self.state {
            PatchState::Idle => CONTRAST,
            PatchState::Found => FOUND_OPACITY,
            PatchState::Dimmed => DIMMED_OPACITY,
        }
    }
}

/// Number of patches a board of `size` px patches holds.
pub fn patch_count(viewport: Viewport, size: f64, layout: Layout) -> usize {
    let v = viewport.sanitized();
    let size = clamp_patch_size(size);
    match layout {
        Layout::Grid => {
            let cols = ((v.width / size).floor() as usize).max(1);
            let rows = ((v.height / size).floor() as usize).max(1);
            cols.saturating_mul(rows).min(GRID_PATCH_MAX)
        }
        Layout::Random => {
            let area_count = (v.area() / (size * size * PATCH_AREA_FACTOR)).floor() as usize;
            area_count.clamp(PATCH_COUNT_MIN, PATCH_COUNT_MAX)
        }
    }
}

pub fn clamp_patch_size(size: f64) -> f64 {
    if size.is_finite() {
        size.clamp(PATCH_SIZE_MIN_PX, PATCH_SIZE_MAX_PX)
    } else {
        PATCH_SIZE_DEFAULT_PX
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaborBoard {
    pub size: f64,
    pub layout: Layout,
    pub target_step: u32,
    pub patches: Vec<Patch>,
}

impl GaborBoard {
    pub fn generate(viewport: Viewport, size: f64, layout: Layout, rng: &mut Prng) -> Self {
        let v = viewport.sanitized();
        let size = clamp_patch_size(size);
        let total = patch_count(v, size, layout);
        let targets = NUM_TARGETS.min(total);
        let target_step = rng.gen_range_u32(0, ROTATION_STEPS);

        let mut kinds: Vec<bool> = (0..total).map(|i| i < targets).collect();
        rng.shuffle(&mut kinds);

        let cols = ((v.width / size).floor() as usize).max(1);
        let rows_used = total.div_ceil(cols).max(1);
        let cell_w = v.width / cols as f64;
        let cell_h = v.height / rows_used as f64;

        let patches = kinds
            .into_iter()
            .enumerate()
            .map(|(i, is_target)| {
                let pos = match layout {
                    Layout::Grid => Point::new(
                        (i % cols) as f64 * cell_w + (cell_w - size) / 2.0,
                        (i / cols) as f64 * cell_h + (cell_h - size) / 2.0,
                    ),
                    Layout::Random => Point::new(
                        rng.next_f64_01() * free_span(v.width, size),
                        rng.next_f64_01() * free_span(v.height, size),
                    ),
                };
                let rotation_step = if is_target {
                    target_step
                } else {
                    // Uniform over the other seven orientations.
                    (target_step + 1 + rng.gen_range_u32(0, ROTATION_STEPS - 1)) % ROTATION_STEPS
                };
                Patch {
                    pos,
                    rotation_step,
                    is_target,
                    state: PatchState::Idle,
                }
            })
            .collect();

        Self {
            size,
            layout,
            target_step,
            patches,
        }
    }

    pub fn target_rotation_deg(&self) -> f64 {
        rotation_deg(self.target_step)
    }

    pub fn remaining(&self) -> usize {
        self.patches
            .iter()
            .filter(|p| p.is_target && p.state != PatchState::Found)
            .count()
    }

    /// Indices of targets not yet found.
    pub fn unfound_targets(&self) -> Vec<usize> {
        self.patches
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_target && p.state != PatchState::Found)
            .map(|(i, _)| i)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    Found { remaining: usize },
    Cleared { boards: u32 },
    Miss,
}

#[derive(Debug, Clone)]
pub struct GaborRound {
    gate: RoundGate,
    viewport: Viewport,
    size: f64,
    layout: Layout,
    board: Option<GaborBoard>,
    boards_cleared: u32,
    stats: RoundStats,
    next_board_in: Option<Duration>,
    hint_left: Option<Duration>,
}

impl GaborRound {
    pub fn new(viewport: Viewport, size: f64, layout: Layout) -> Self {
        Self {
            gate: RoundGate::new(),
            viewport,
            size: clamp_patch_size(size),
            layout,
            board: None,
            boards_cleared: 0,
            stats: RoundStats::new(),
            next_board_in: None,
            hint_left: None,
        }
    }

    pub fn gate(&self) -> &RoundGate {
        &self.gate
    }

    pub fn stimulus(&self) -> Option<&GaborBoard> {
        self.board.as_ref()
    }

    pub fn boards_cleared(&self) -> u32 {
        self.boards_cleared
    }

    pub fn score(&self) -> u32 {
        self.stats.score
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Targets currently highlighted by a hint.
    pub fn hinted(&self) -> Vec<usize> {
        match (&self.board, self.hint_left) {
            (Some(board), Some(_)) => board.unfound_targets(),
            _ => Vec::new(),
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Change patch size. A running round gets a fresh board immediately.
    pub fn set_size(&mut self, size: f64, rng: &mut Prng) -> RoundEvent<GaborBoard> {
        self.size = clamp_patch_size(size);
        self.regenerate(rng)
    }

    pub fn set_layout(&mut self, layout: Layout, rng: &mut Prng) -> RoundEvent<GaborBoard> {
        self.layout = layout;
        self.regenerate(rng)
    }

    pub fn start(&mut self, rng: &mut Prng) -> RoundEvent<GaborBoard> {
        if !self.gate.start() {
            return RoundEvent::Ignored;
        }
        self.boards_cleared = 0;
        self.stats = RoundStats::new();
        debug!(size = self.size, layout = self.layout.label(), "gabor round started");
        RoundEvent::Presented(self.new_board(rng))
    }

    /// Click on patch `index`.
    ///
    /// After a board is cleared the gate stays in `Evaluating` until the next
    /// board is presented, so clicks in between are ignored.
    pub fn click(&mut self, index: usize) -> (RoundEvent<GaborBoard>, Option<ClickOutcome>) {
        let Some(patch) = self.board.as_ref().and_then(|b| b.patches.get(index)) else {
            return (RoundEvent::Ignored, None);
        };
        if patch.is_target && patch.state == PatchState::Found {
            return (RoundEvent::Ignored, None);
        }
        let is_target = patch.is_target;
        if !self.gate.accept_input() {
            return (RoundEvent::Ignored, None);
        }

        self.stats.record_trial(is_target);
        let Some(board) = self.board.as_mut() else {
            return (RoundEvent::Ignored, None);
        };
        board.patches[index].state = if is_target {
            PatchState::Found
        } else {
            PatchState::Dimmed
        };

        let outcome = if !is_target {
            ClickOutcome::Miss
        } else if board.remaining() == 0 {
            self.boards_cleared += 1;
            self.stats.add_score(SCORE_PER_CLEAR);
            self.next_board_in = Some(NEXT_BOARD_DELAY);
            debug!(boards = self.boards_cleared, "gabor board cleared");
            ClickOutcome::Cleared {
                boards: self.boards_cleared,
            }
        } else {
            ClickOutcome::Found {
                remaining: board.remaining(),
            }
        };
        if self.next_board_in.is_none() {
            self.gate.resume();
        }
        (
            RoundEvent::Judged {
                correct: is_target,
                next: None,
            },
            Some(outcome),
        )
    }

    /// Highlight unfound targets for [`HINT_DURATION`].
    pub fn hint(&mut self) -> Vec<usize> {
        if !self.gate.is_running() {
            return Vec::new();
        }
        self.hint_left = Some(HINT_DURATION);
        self.hinted()
    }

    pub fn tick(&mut self, dt: Duration, rng: &mut Prng) -> RoundEvent<GaborBoard> {
        if !self.gate.is_running() {
            return RoundEvent::None;
        }
        self.stats.advance(dt);
        if let Some(left) = self.hint_left {
            self.hint_left = left.checked_sub(dt).filter(|d| !d.is_zero());
        }
        match self.next_board_in {
            Some(left) if left > dt => {
                self.next_board_in = Some(left - dt);
                RoundEvent::None
            }
            Some(_) => {
                self.next_board_in = None;
                self.gate.present();
                RoundEvent::Presented(self.new_board(rng))
            }
            None => RoundEvent::None,
        }
    }

    pub fn stop(&mut self) -> RoundEvent<GaborBoard> {
        if !self.gate.finish() {
            return RoundEvent::Ignored;
        }
        self.board = None;
        self.next_board_in = None;
        self.hint_left = None;
        debug!(boards = self.boards_cleared, score = self.stats.score, "gabor round finished");
        RoundEvent::Finished(RoundSummary::new(
            GameKind::Gabor,
            ResultPayload::Cleared {
                boards: self.boards_cleared,
                score: self.stats.score,
            },
        ))
    }

    fn regenerate(&mut self, rng: &mut Prng) -> RoundEvent<GaborBoard> {
        if !self.gate.is_running() {
            return RoundEvent::None;
        }
        if self.next_board_in.take().is_some() {
            self.gate.present();
        }
        RoundEvent::Presented(self.new_board(rng))
    }

    fn new_board(&mut self, rng: &mut Prng) -> GaborBoard {
        let board = GaborBoard::generate(self.viewport, self.size, self.layout, rng);
        self.hint_left = None;
        self.board = Some(board.clone());
        board
    }
}

impl Default for GaborRound {
    fn default() -> Self {
        Self::new(Viewport::default(), PATCH_SIZE_DEFAULT_PX, Layout::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MAX_EXTENT_PX;

    fn find_target(round: &GaborRound) -> usize {
        round.stimulus().unwrap().unfound_targets()[0]
    }

    fn find_distractor(round: &GaborRound) -> usize {
        round
            .stimulus()
            .unwrap()
            .patches
            .iter()
            .position(|p| !p.is_target)
            .unwrap()
    }

    #[test]
    fn counts_per_layout() {
        let vp = Viewport::new(400.0, 400.0);
        assert_eq!(patch_count(vp, 60.0, Layout::Grid), 36);
        // 160000 / 5400 = 29.6
        assert_eq!(patch_count(vp, 60.0, Layout::Random), 29);
        assert_eq!(patch_count(vp, 120.0, Layout::Random), PATCH_COUNT_MIN);
        assert_eq!(patch_count(Viewport::new(2000.0, 2000.0), 30.0, Layout::Random), PATCH_COUNT_MAX);
        assert_eq!(patch_count(Viewport::new(0.0, 0.0), 60.0, Layout::Grid), 1);
    }

    #[test]
    fn grid_count_is_bounded_for_huge_viewports() {
        assert_eq!(patch_count(Viewport::new(1.0e6, 1.0e6), 30.0, Layout::Grid), GRID_PATCH_MAX);
        assert_eq!(patch_count(Viewport::new(f64::MAX, f64::MAX), 30.0, Layout::Grid), GRID_PATCH_MAX);

        let board = GaborBoard::generate(Viewport::new(f64::MAX, 1.0e9), 30.0, Layout::Grid, &mut Prng::new(5));
        assert_eq!(board.patches.len(), GRID_PATCH_MAX);
        assert!(board
            .patches
            .iter()
            .all(|p| p.pos.x < MAX_EXTENT_PX && p.pos.y < MAX_EXTENT_PX));
    }

    #[test]
    fn board_has_three_targets_and_distinct_distractors() {
        let mut rng = Prng::new(12);
        for layout in [Layout::Grid, Layout::Random] {
            for _ in 0..50 {
                let b = GaborBoard::generate(Viewport::new(500.0, 380.0), 50.0, layout, &mut rng);
                assert_eq!(b.remaining(), NUM_TARGETS);
                for p in &b.patches {
                    assert!(p.rotation_step < ROTATION_STEPS);
                    assert_eq!(p.is_target, p.rotation_step == b.target_step);
                    assert!(p.pos.x >= -1e-9 && p.pos.x + b.size <= 500.0 + 1e-9);
                    assert!(p.pos.y >= -1e-9 && p.pos.y + b.size <= 380.0 + 1e-9);
                }
            }
        }
    }

    #[test]
    fn rotations_are_multiples_of_step() {
        assert_eq!(rotation_deg(0), 0.0);
        assert_eq!(rotation_deg(7), 157.5);
        assert_eq!(rotation_deg(8), 0.0);
    }

    #[test]
    fn layout_parse() {
        assert_eq!(Layout::parse("Grid").unwrap(), Layout::Grid);
        assert!(matches!(Layout::parse("hex"), Err(ParseError::Layout(_))));
    }

    #[test]
    fn clearing_scores_and_schedules_next_board() {
        let mut rng = Prng::new(5);
        let mut round = GaborRound::default();
        round.start(&mut rng);
        let first = round.stimulus().unwrap().clone();

        let miss = find_distractor(&round);
        let (_, outcome) = round.click(miss);
        assert_eq!(outcome, Some(ClickOutcome::Miss));
        assert_eq!(round.stimulus().unwrap().patches[miss].opacity(), DIMMED_OPACITY);

        let t = find_target(&round);
        assert_eq!(round.click(t).1, Some(ClickOutcome::Found { remaining: 2 }));
        assert!(round.click(t).0.is_ignored(), "found target is ignored");
        round.click(find_target(&round));
        let (_, outcome) = round.click(find_target(&round));
        assert_eq!(outcome, Some(ClickOutcome::Cleared { boards: 1 }));
        assert_eq!(round.score(), SCORE_PER_CLEAR);

        // Board stays frozen until the delay passes.
        assert!(round.click(0).0.is_ignored());
        assert_eq!(round.tick(Duration::from_millis(300), &mut rng), RoundEvent::None);
        let ev = round.tick(Duration::from_millis(200), &mut rng);
        assert!(matches!(ev, RoundEvent::Presented(_)));
        assert_ne!(round.stimulus(), Some(&first));
        assert_eq!(round.stimulus().unwrap().remaining(), NUM_TARGETS);

        let s = round.stop().into_summary().unwrap();
        assert_eq!(s.payload, ResultPayload::Cleared { boards: 1, score: 10 });
        assert!(round.stop().is_ignored());
    }

    #[test]
    fn hint_expires() {
        let mut rng = Prng::new(6);
        let mut round = GaborRound::default();
        assert!(round.hint().is_empty());
        round.start(&mut rng);
        round.click(find_target(&round));
        assert_eq!(round.hint().len(), 2);
        round.tick(Duration::from_millis(999), &mut rng);
        assert_eq!(round.hinted().len(), 2);
        round.tick(Duration::from_millis(1), &mut rng);
        assert!(round.hinted().is_empty());
    }

    #[test]
    fn settings_change_regenerates_running_board() {
        let mut rng = Prng::new(7);
        let mut round = GaborRound::default();
        assert_eq!(round.set_layout(Layout::Grid, &mut rng), RoundEvent::None);
        round.start(&mut rng);
        match round.set_size(400.0, &mut rng) {
            RoundEvent::Presented(b) => {
                assert_eq!(b.size, PATCH_SIZE_MAX_PX);
                assert_eq!(b.layout, Layout::Grid);
                assert_eq!(b.patches.len(), 9);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
