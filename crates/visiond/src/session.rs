//! The single live round, dispatched over the seven game types.

use serde::{Deserialize, Serialize};
use vision_games::acuity::{AcuityRound, RingGeometry};
use vision_games::color::{ColorBoard, ColorRound};
use vision_games::cues::Tone;
use vision_games::dynamic::{DynamicRound, MovingNumber};
use vision_games::follow::{Ball, FollowRound};
use vision_games::gabor::{GaborBoard, GaborRound};
use vision_games::saccade::{SaccadeDot, SaccadeRound};
use vision_games::stretch::{FocusTarget, StretchRound};
use vision_games::time::Duration;
use vision_games::{GameKind, Point, Prng, RoundEvent, RoundPhase, RoundSummary, Viewport};

use crate::settings::Settings;

/// What the display should draw right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stimulus {
    Ring {
        ring: RingGeometry,
        /// Notch centre inside the ring box, each axis in `[0, 1]`.
        notch: Point,
    },
    Tiles {
        board: ColorBoard,
        /// CSS color per tile, row-major.
        colors: Vec<String>,
        tile_side_px: f64,
    },
    Number { number: MovingNumber, x: Option<f64> },
    Ball { ball: Ball },
    Dot { dot: SaccadeDot },
    Patches {
        board: GaborBoard,
        hinted: Vec<usize>,
        target_rotation_deg: f64,
    },
    Focus {
        target: FocusTarget,
        remaining_s: u64,
        instruction: String,
    },
}

/// Per-game counters shown next to the stimulus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub remaining_s: Option<f64>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub estimated_age: Option<u32>,
    #[serde(default)]
    pub accuracy_percent: Option<u32>,
}

/// Round-type-independent view of a [`RoundEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Quiet,
    Ignored,
    Presented,
    Judged { correct: bool },
    Finished(RoundSummary),
}

impl Outcome {
    pub fn into_summary(self) -> Option<RoundSummary> {
        match self {
            Outcome::Finished(s) => Some(s),
            _ => None,
        }
    }
}

impl<S> From<RoundEvent<S>> for Outcome {
    fn from(ev: RoundEvent<S>) -> Self {
        match ev {
            RoundEvent::None => Outcome::Quiet,
            RoundEvent::Ignored => Outcome::Ignored,
            RoundEvent::Presented(_) => Outcome::Presented,
            RoundEvent::Judged { correct, .. } => Outcome::Judged { correct },
            RoundEvent::Finished(s) => Outcome::Finished(s),
        }
    }
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug)]
pub enum ActiveGame {
    Acuity(AcuityRound),
    Color(ColorRound),
    Dynamic(DynamicRound),
    Follow(FollowRound),
    Saccade(SaccadeRound),
    Gabor(GaborRound),
    Stretch(StretchRound),
}

impl ActiveGame {
    pub fn new(kind: GameKind, settings: &Settings, viewport: Viewport) -> Self {
        match kind {
            GameKind::Acuity => ActiveGame::Acuity(AcuityRound::new(
                settings.view_distance_mm,
                settings.calibration(),
            )),
            GameKind::Color => {
                let mut round = ColorRound::new();
                round.set_viewport(viewport);
                ActiveGame::Color(round)
            }
            GameKind::Dynamic => ActiveGame::Dynamic(DynamicRound::new(
                settings.speed_tier,
                settings.dynamic_mode,
                viewport,
            )),
            GameKind::Follow => ActiveGame::Follow(FollowRound::new(viewport)),
            GameKind::Saccade => {
                let round = SaccadeRound::new(viewport, settings.saccade_interval());
                ActiveGame::Saccade(match settings.session_limit() {
                    Some(limit) => round.with_limit(limit),
                    None => round,
                })
            }
            GameKind::Gabor => ActiveGame::Gabor(GaborRound::new(
                viewport,
                settings.gabor_size_px,
                settings.gabor_layout,
            )),
            GameKind::Stretch => {
                let round = StretchRound::new(settings.stretch_font_px);
                ActiveGame::Stretch(match settings.session_limit() {
                    Some(limit) => round.with_limit(limit),
                    None => round,
                })
            }
        }
    }

    pub fn kind(&self) -> GameKind {
        match self {
            ActiveGame::Acuity(_) => GameKind::Acuity,
            ActiveGame::Color(_) => GameKind::Color,
            ActiveGame::Dynamic(_) => GameKind::Dynamic,
            ActiveGame::Follow(_) => GameKind::Follow,
            ActiveGame::Saccade(_) => GameKind::Saccade,
            ActiveGame::Gabor(_) => GameKind::Gabor,
            ActiveGame::Stretch(_) => GameKind::Stretch,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        match self {
            ActiveGame::Acuity(g) => g.gate().phase(),
            ActiveGame::Color(g) => g.gate().phase(),
            ActiveGame::Dynamic(g) => g.gate().phase(),
            ActiveGame::Follow(g) => g.gate().phase(),
            ActiveGame::Saccade(g) => g.gate().phase(),
            ActiveGame::Gabor(g) => g.gate().phase(),
            ActiveGame::Stretch(g) => g.gate().phase(),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.phase(),
            RoundPhase::AwaitingInput | RoundPhase::Evaluating
        )
    }

    pub fn start(&mut self, rng: &mut Prng) -> Outcome {
        match self {
            ActiveGame::Acuity(g) => g.start(rng).into(),
            ActiveGame::Color(g) => g.start(rng).into(),
            ActiveGame::Dynamic(g) => g.start(rng).into(),
            ActiveGame::Follow(g) => g.start().into(),
            ActiveGame::Saccade(g) => g.start(rng).into(),
            ActiveGame::Gabor(g) => g.start(rng).into(),
            ActiveGame::Stretch(g) => g.start(rng).into(),
        }
    }

    /// Forward raw client input. Text that does not parse for the current
    /// game is ignored without touching the round.
    pub fn respond(&mut self, input: &str, rng: &mut Prng) -> Outcome {
        let input = input.trim();
        match self {
            ActiveGame::Acuity(g) => g.respond_label(input, rng).into(),
            ActiveGame::Color(g) => match input.parse::<u32>() {
                Ok(i) => g.click(i, rng).into(),
                Err(_) => Outcome::Ignored,
            },
            ActiveGame::Dynamic(g) => g.respond(input).into(),
            ActiveGame::Gabor(g) => match input.parse::<usize>() {
                Ok(i) => g.click(i).0.into(),
                Err(_) => Outcome::Ignored,
            },
            ActiveGame::Follow(_) | ActiveGame::Saccade(_) | ActiveGame::Stretch(_) => {
                Outcome::Ignored
            }
        }
    }

    /// Advance timers by one daemon frame.
    pub fn tick(&mut self, dt: Duration, rng: &mut Prng) -> Outcome {
        match self {
            ActiveGame::Acuity(_) => Outcome::Quiet,
            ActiveGame::Color(g) => g.tick(dt).into(),
            ActiveGame::Dynamic(g) => g.tick(dt, rng).into(),
            ActiveGame::Follow(g) => match g.frame(dt) {
                Some(_) => Outcome::Presented,
                None => Outcome::Quiet,
            },
            ActiveGame::Saccade(g) => g.tick(dt, rng).into(),
            ActiveGame::Gabor(g) => g.tick(dt, rng).into(),
            ActiveGame::Stretch(g) => g.tick(dt, rng).into(),
        }
    }

    pub fn stop(&mut self) -> Outcome {
        match self {
            ActiveGame::Acuity(g) => g.stop().into(),
            ActiveGame::Color(g) => g.stop().into(),
            ActiveGame::Dynamic(g) => g.stop().into(),
            ActiveGame::Follow(g) => g.stop().into(),
            ActiveGame::Saccade(g) => g.stop().into(),
            ActiveGame::Gabor(g) => g.stop().into(),
            ActiveGame::Stretch(g) => g.stop().into(),
        }
    }

    /// Unfound gabor targets; other games have no hint.
    pub fn hint(&mut self) -> Option<Vec<usize>> {
        match self {
            ActiveGame::Gabor(g) => Some(g.hint()),
            _ => None,
        }
    }

    pub fn take_cue(&mut self) -> Option<Tone> {
        match self {
            ActiveGame::Acuity(g) => g.take_cue(),
            ActiveGame::Dynamic(g) => g.take_cue(),
            _ => None,
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        match self {
            ActiveGame::Dynamic(g) => g.set_viewport(viewport),
            ActiveGame::Follow(g) => g.set_viewport(viewport),
            ActiveGame::Saccade(g) => g.set_viewport(viewport),
            ActiveGame::Gabor(g) => g.set_viewport(viewport),
            ActiveGame::Color(g) => g.set_viewport(viewport),
            ActiveGame::Acuity(_) | ActiveGame::Stretch(_) => {}
        }
    }

    /// Push the per-game knobs of `settings` into a live round.
    pub fn apply_settings(&mut self, settings: &Settings, rng: &mut Prng) -> Outcome {
        match self {
            ActiveGame::Saccade(g) if g.interval() != settings.saccade_interval() => {
                g.set_interval(settings.saccade_interval(), rng).into()
            }
            ActiveGame::Gabor(g) => {
                let mut out = Outcome::Quiet;
                if g.layout() != settings.gabor_layout {
                    out = g.set_layout(settings.gabor_layout, rng).into();
                }
                if g.size() != settings.gabor_size_px {
                    out = g.set_size(settings.gabor_size_px, rng).into();
                }
                out
            }
            ActiveGame::Stretch(g) => {
                g.set_font_px(settings.stretch_font_px);
                Outcome::Quiet
            }
            _ => Outcome::Quiet,
        }
    }

    pub fn stimulus(&self) -> Option<Stimulus> {
        match self {
            ActiveGame::Acuity(g) => g.stimulus().map(|r| Stimulus::Ring {
                ring: r.clone(),
                notch: r.direction.anchor(),
            }),
            ActiveGame::Color(g) => g.stimulus().map(|b| Stimulus::Tiles {
                board: b.clone(),
                colors: (0..b.tile_count()).map(|i| b.tile_css(i)).collect(),
                tile_side_px: b.tile_side_px(g.viewport()),
            }),
            ActiveGame::Dynamic(g) => g.stimulus().map(|n| Stimulus::Number {
                number: n.clone(),
                x: g.number_x(),
            }),
            ActiveGame::Follow(g) => g.stimulus().map(|b| Stimulus::Ball { ball: *b }),
            ActiveGame::Saccade(g) => g.stimulus().map(|d| Stimulus::Dot { dot: *d }),
            ActiveGame::Gabor(g) => g.stimulus().map(|b| Stimulus::Patches {
                board: b.clone(),
                hinted: g.hinted(),
                target_rotation_deg: b.target_rotation_deg(),
            }),
            ActiveGame::Stretch(g) => g.stimulus().map(|t| Stimulus::Focus {
                target: *t,
                remaining_s: g.phase_remaining_s(),
                instruction: t.phase.instruction().to_string(),
            }),
        }
    }

    pub fn hud(&self) -> Hud {
        match self {
            ActiveGame::Acuity(g) => Hud {
                score: Some(g.correct_count()),
                ..Hud::default()
            },
            ActiveGame::Color(g) => Hud {
                score: Some(g.stats().score),
                level: Some(g.level()),
                remaining_s: Some(g.remaining_s()),
                accuracy_percent: Some(g.stats().accuracy_percent()),
                ..Hud::default()
            },
            ActiveGame::Dynamic(g) => Hud {
                score: Some(g.stats().score),
                remaining_s: Some(g.remaining_s()),
                estimated_age: Some(g.age().rounded()),
                accuracy_percent: Some(g.stats().accuracy_percent()),
                ..Hud::default()
            },
            ActiveGame::Follow(g) => Hud {
                count: Some(g.elapsed_s()),
                ..Hud::default()
            },
            ActiveGame::Saccade(g) => Hud {
                count: Some(u64::from(g.count())),
                ..Hud::default()
            },
            ActiveGame::Gabor(g) => Hud {
                score: Some(g.score()),
                level: Some(g.boards_cleared()),
                count: g.stimulus().map(|b| b.remaining() as u64),
                ..Hud::default()
            },
            ActiveGame::Stretch(g) => Hud {
                count: Some(g.practiced_s()),
                ..Hud::default()
            },
        }
    }
}
