//! Landolt-ring acuity check.
//!
//! The ring is sized from viewing distance with the standard optotype relation
//! (gap of 1.4544 mm at 5 m for decimal acuity 1.0) and walks a fixed ascending
//! acuity list until the first wrong answer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cues::Tone;
use crate::error::ParseError;
use crate::geometry::{sanitize_extent, Point};
use crate::history::{ResultPayload, RoundSummary};
use crate::kind::GameKind;
use crate::prng::Prng;
use crate::round::{RoundEvent, RoundGate};

/// Width of an ISO/IEC 7810 ID-1 card, used to calibrate pixels per millimetre.
pub const CARD_WIDTH_MM: f64 = 85.6;
/// Card height / width.
pub const CARD_ASPECT: f64 = 0.63;
pub const DEFAULT_DISTANCE_MM: f64 = 500.0;
pub const MIN_DISTANCE_MM: f64 = 1.0;
pub const GAP_SCALE_FACTOR: f64 = 1.4544;
/// Ring outer diameter = gap * 5.
pub const RING_SIZE_MULT: f64 = 5.0;
/// The notch is drawn slightly wider than the stroke so it fully cuts the ring.
pub const GAP_WIDTH_MULT: f64 = 1.2;
/// Reported when not even the first entry was passed.
pub const FALLBACK_VISION: f64 = 0.05;
pub const TICK_FREQ_RING: f32 = 660.0;

pub const VISION_LIST: [f64; 13] = [
    0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0, 1.2, 1.5, 2.0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Top,
    Right,
    Bottom,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Top,
        Direction::Right,
        Direction::Bottom,
        Direction::Left,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Direction::Top => "top",
            Direction::Right => "right",
            Direction::Bottom => "bottom",
            Direction::Left => "left",
        }
    }

    pub fn parse(v: &str) -> Result<Self, ParseError> {
        match v.trim().to_ascii_lowercase().as_str() {
            "top" | "up" => Ok(Direction::Top),
            "right" => Ok(Direction::Right),
            "bottom" | "down" => Ok(Direction::Bottom),
            "left" => Ok(Direction::Left),
            other => Err(ParseError::Direction(other.to_string())),
        }
    }

    fn is_vertical(self) -> bool {
        matches!(self, Direction::Top | Direction::Bottom)
    }

    /// Notch centre relative to the ring box, each axis in `[0, 1]`.
    pub fn anchor(self) -> Point {
        match self {
            Direction::Top => Point::new(0.5, 0.0),
            Direction::Right => Point::new(1.0, 0.5),
            Direction::Bottom => Point::new(0.5, 1.0),
            Direction::Left => Point::new(0.0, 0.5),
        }
    }
}

/// Screen calibration from the on-screen card the user matched to a real one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub card_width_px: f64,
}

impl Calibration {
    pub fn new(card_width_px: f64) -> Self {
        Self {
            card_width_px: sanitize_extent(card_width_px),
        }
    }

    pub fn px_per_mm(&self) -> f64 {
        sanitize_extent(self.card_width_px) / CARD_WIDTH_MM
    }

    /// Preview box the user resizes: `(width, height)` in px.
    pub fn card_box_px(&self) -> (f64, f64) {
        let w = sanitize_extent(self.card_width_px);
        (w, w * CARD_ASPECT)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        // Roughly a 96 dpi display.
        Self::new(323.0)
    }
}

/// Everything the display needs to draw one ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingGeometry {
    pub vision: f64,
    pub gap_mm: f64,
    pub ring_mm: f64,
    pub border_mm: f64,
    pub ring_px: f64,
    pub border_px: f64,
    pub notch_width_px: f64,
    pub notch_height_px: f64,
    pub direction: Direction,
}

pub fn gap_mm(distance_mm: f64, vision: f64) -> f64 {
    let distance_mm = if distance_mm.is_finite() {
        distance_mm.max(MIN_DISTANCE_MM)
    } else {
        DEFAULT_DISTANCE_MM
    };
    let vision = if vision.is_finite() && vision > 0.0 {
        vision
    } else {
        FALLBACK_VISION
    };
    (GAP_SCALE_FACTOR * distance_mm) / (vision * 1000.0)
}

pub fn ring_geometry(
    distance_mm: f64,
    vision: f64,
    px_per_mm: f64,
    direction: Direction,
) -> RingGeometry {
    let gap = gap_mm(distance_mm, vision);
    let ring = gap * RING_SIZE_MULT;
    let border = gap;
    let px_per_mm = if px_per_mm.is_finite() && px_per_mm > 0.0 {
        px_per_mm
    } else {
        Calibration::default().px_per_mm()
    };
    let border_px = border * px_per_mm;

    let (notch_width_px, notch_height_px) = if direction.is_vertical() {
        (border_px * GAP_WIDTH_MULT, border_px)
    } else {
        (border_px, border_px * GAP_WIDTH_MULT)
    };

    RingGeometry {
        vision,
        gap_mm: gap,
        ring_mm: ring,
        border_mm: border,
        ring_px: ring * px_per_mm,
        border_px,
        notch_width_px,
        notch_height_px,
        direction,
    }
}

#[derive(Debug, Clone)]
pub struct AcuityRound {
    gate: RoundGate,
    distance_mm: f64,
    px_per_mm: f64,
    index: usize,
    correct_count: u32,
    current: Option<RingGeometry>,
    pending_cue: Option<Tone>,
}

impl AcuityRound {
    pub fn new(distance_mm: f64, calibration: Calibration) -> Self {
        Self {
            gate: RoundGate::new(),
            distance_mm,
            px_per_mm: calibration.px_per_mm(),
            index: 0,
            correct_count: 0,
            current: None,
            pending_cue: None,
        }
    }

    pub fn gate(&self) -> &RoundGate {
        &self.gate
    }

    pub fn stimulus(&self) -> Option<&RingGeometry> {
        self.current.as_ref()
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    /// Acuity currently being tested.
    pub fn current_vision(&self) -> Option<f64> {
        VISION_LIST.get(self.index).copied()
    }

    /// Last passed entry, or [`FALLBACK_VISION`].
    pub fn result_vision(&self) -> f64 {
        if self.index > 0 {
            VISION_LIST[self.index - 1]
        } else {
            FALLBACK_VISION
        }
    }

    pub fn take_cue(&mut self) -> Option<Tone> {
        self.pending_cue.take()
    }

    pub fn start(&mut self, rng: &mut Prng) -> RoundEvent<RingGeometry> {
        if !self.gate.start() {
            return RoundEvent::Ignored;
        }
        self.index = 0;
        self.correct_count = 0;
        debug!(distance_mm = self.distance_mm, "acuity round started");
        let ring = self.spawn(rng);
        RoundEvent::Presented(ring)
    }

    pub fn respond(&mut self, answer: Direction, rng: &mut Prng) -> RoundEvent<RingGeometry> {
        let Some(current) = self.current.as_ref() else {
            return RoundEvent::Ignored;
        };
        let expected = current.direction;
        if !self.gate.accept_input() {
            return RoundEvent::Ignored;
        }

        if answer != expected {
            return self.finish();
        }

        self.correct_count += 1;
        self.index += 1;
        if self.index >= VISION_LIST.len() {
            return self.finish();
        }

        let ring = self.spawn(rng);
        self.gate.present();
        RoundEvent::Judged {
            correct: true,
            next: Some(ring),
        }
    }

    /// Parse a direction label and respond; unknown labels are ignored.
    pub fn respond_label(&mut self, label: &str, rng: &mut Prng) -> RoundEvent<RingGeometry> {
        match Direction::parse(label) {
            Ok(d) => self.respond(d, rng),
            Err(_) => RoundEvent::Ignored,
        }
    }

    /// Abandon the check; the result is whatever was passed so far.
    pub fn stop(&mut self) -> RoundEvent<RingGeometry> {
        self.finish()
    }

    fn spawn(&mut self, rng: &mut Prng) -> RingGeometry {
        let vision = VISION_LIST[self.index];
        let direction = *rng.pick(&Direction::ALL).unwrap_or(&Direction::Top);
        let ring = ring_geometry(self.distance_mm, vision, self.px_per_mm, direction);
        self.current = Some(ring.clone());
        self.pending_cue = Some(Tone::beep(TICK_FREQ_RING));
        ring
    }

    fn finish(&mut self) -> RoundEvent<RingGeometry> {
        if !self.gate.finish() {
            return RoundEvent::Ignored;
        }
        self.current = None;
        let vision = self.result_vision();
        debug!(vision, "acuity round finished");
        RoundEvent::Finished(RoundSummary::new(
            GameKind::Acuity,
            ResultPayload::Vision { vision },
        ))
    }
}

impl Default for AcuityRound {
    fn default() -> Self {
        Self::new(DEFAULT_DISTANCE_MM, Calibration::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn ring_size_at_half_metre() {
        let g = ring_geometry(500.0, 1.0, 2.0, Direction::Left);
        assert!(approx(g.gap_mm, 0.7272));
        assert!(approx(g.ring_mm, 3.636));
        assert!(approx(g.ring_px, 7.272));
        assert!(approx(g.border_px, 1.4544));
        assert!(approx(g.notch_height_px, 1.4544 * GAP_WIDTH_MULT));
        assert!(approx(g.notch_width_px, 1.4544));
    }

    #[test]
    fn calibration_from_card_width() {
        let c = Calibration::new(171.2);
        assert!(approx(c.px_per_mm(), 2.0));
        let (w, h) = c.card_box_px();
        assert!(approx(w, 171.2));
        assert!(approx(h, 171.2 * CARD_ASPECT));

        let degenerate = Calibration::new(0.0);
        assert!(degenerate.px_per_mm() > 0.0);
    }

    #[test]
    fn degenerate_inputs_stay_finite() {
        let g = ring_geometry(0.0, 0.0, f64::NAN, Direction::Top);
        assert!(g.gap_mm.is_finite() && g.ring_px.is_finite() && g.border_px.is_finite());
    }

    #[test]
    fn walks_the_list_until_first_miss() {
        let mut rng = Prng::new(11);
        let mut round = AcuityRound::default();
        let RoundEvent::Presented(first) = round.start(&mut rng) else {
            panic!("expected first ring");
        };
        assert_eq!(first.vision, 0.1);
        assert_eq!(round.take_cue(), Some(Tone::beep(TICK_FREQ_RING)));

        let mut seen = vec![first.vision];
        for _ in 0..3 {
            let dir = round.stimulus().unwrap().direction;
            match round.respond(dir, &mut rng) {
                RoundEvent::Judged { correct: true, next: Some(r) } => seen.push(r.vision),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(seen, vec![0.1, 0.2, 0.3, 0.4]);

        let dir = round.stimulus().unwrap().direction;
        let wrong = Direction::ALL.into_iter().find(|d| *d != dir).unwrap();
        let summary = round.respond(wrong, &mut rng).into_summary().unwrap();
        assert_eq!(summary.payload, ResultPayload::Vision { vision: 0.3 });

        // Late input after the result is recorded changes nothing.
        assert!(round.respond(dir, &mut rng).is_ignored());
        assert!(round.stop().is_ignored());
    }

    #[test]
    fn perfect_run_ends_after_last_entry() {
        let mut rng = Prng::new(5);
        let mut round = AcuityRound::default();
        round.start(&mut rng);
        let mut visions = vec![round.current_vision().unwrap()];
        let summary = loop {
            let dir = round.stimulus().unwrap().direction;
            match round.respond(dir, &mut rng) {
                RoundEvent::Judged { next: Some(r), .. } => visions.push(r.vision),
                RoundEvent::Finished(s) => break s,
                other => panic!("unexpected {other:?}"),
            }
        };
        assert_eq!(visions, VISION_LIST.to_vec());
        assert_eq!(summary.payload, ResultPayload::Vision { vision: 2.0 });
        assert_eq!(round.correct_count(), VISION_LIST.len() as u32);
    }

    #[test]
    fn first_miss_reports_fallback() {
        let mut rng = Prng::new(9);
        let mut round = AcuityRound::default();
        round.start(&mut rng);
        let dir = round.stimulus().unwrap().direction;
        let wrong = Direction::ALL.into_iter().find(|d| *d != dir).unwrap();
        let s = round.respond(wrong, &mut rng).into_summary().unwrap();
        assert_eq!(s.payload, ResultPayload::Vision { vision: FALLBACK_VISION });
    }

    #[test]
    fn unknown_label_is_ignored() {
        let mut rng = Prng::new(1);
        let mut round = AcuityRound::default();
        round.start(&mut rng);
        assert!(round.respond_label("diagonal", &mut rng).is_ignored());
        assert_eq!(round.gate().trial(), 1);
    }
}
