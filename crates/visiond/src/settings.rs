//! User settings persisted as `settings.json`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;
use vision_games::acuity::{Calibration, DEFAULT_DISTANCE_MM};
use vision_games::dynamic::{DynamicMode, SpeedTier};
use vision_games::gabor::{clamp_patch_size, Layout, PATCH_SIZE_DEFAULT_PX};
use vision_games::saccade::{clamp_interval, DEFAULT_INTERVAL};
use vision_games::stretch::{clamp_font_size, FONT_SIZE_DEFAULT_PX};
use vision_games::time::Duration;

use crate::error::DaemonError;

const VIEW_DISTANCE_MIN_MM: f64 = 100.0;
const VIEW_DISTANCE_MAX_MM: f64 = 5_000.0;
const CARD_WIDTH_MIN_PX: f64 = 50.0;
const CARD_WIDTH_MAX_PX: f64 = 2_000.0;
const SESSION_LIMIT_MAX_S: u64 = 4 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Default,
    Medical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    /// Warm color filter to cut blue light.
    #[serde(default)]
    pub sepia: bool,
    #[serde(default)]
    pub sound: bool,
    #[serde(default)]
    pub break_reminders: bool,
    /// Stored on each history record; blank means anonymous.
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default = "default_view_distance_mm")]
    pub view_distance_mm: f64,
    #[serde(default = "default_card_width_px")]
    pub card_width_px: f64,
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,

    #[serde(default)]
    pub speed_tier: SpeedTier,
    #[serde(default)]
    pub dynamic_mode: DynamicMode,
    #[serde(default = "default_saccade_interval_ms")]
    pub saccade_interval_ms: u64,
    #[serde(default = "default_gabor_size_px")]
    pub gabor_size_px: f64,
    #[serde(default)]
    pub gabor_layout: Layout,
    #[serde(default = "default_stretch_font_px")]
    pub stretch_font_px: u32,
    /// Auto-stop for saccade and stretch rounds. `None` runs until stopped.
    #[serde(default)]
    pub session_limit_s: Option<u64>,
}

fn default_view_distance_mm() -> f64 {
    DEFAULT_DISTANCE_MM
}

fn default_card_width_px() -> f64 {
    Calibration::default().card_width_px
}

fn default_target_fps() -> u32 {
    60
}

fn default_saccade_interval_ms() -> u64 {
    DEFAULT_INTERVAL.as_millis() as u64
}

fn default_gabor_size_px() -> f64 {
    PATCH_SIZE_DEFAULT_PX
}

fn default_stretch_font_px() -> u32 {
    FONT_SIZE_DEFAULT_PX
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            sepia: false,
            sound: false,
            break_reminders: false,
            player_name: None,
            view_distance_mm: default_view_distance_mm(),
            card_width_px: default_card_width_px(),
            target_fps: default_target_fps(),
            speed_tier: SpeedTier::default(),
            dynamic_mode: DynamicMode::default(),
            saccade_interval_ms: default_saccade_interval_ms(),
            gabor_size_px: default_gabor_size_px(),
            gabor_layout: Layout::default(),
            stretch_font_px: default_stretch_font_px(),
            session_limit_s: None,
        }
    }
}

fn clamp_or(v: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v.clamp(lo, hi)
    } else {
        fallback
    }
}

impl Settings {
    /// Bring every value back into its supported range.
    pub fn sanitized(mut self) -> Self {
        self.view_distance_mm = clamp_or(
            self.view_distance_mm,
            VIEW_DISTANCE_MIN_MM,
            VIEW_DISTANCE_MAX_MM,
            DEFAULT_DISTANCE_MM,
        );
        self.card_width_px = clamp_or(
            self.card_width_px,
            CARD_WIDTH_MIN_PX,
            CARD_WIDTH_MAX_PX,
            default_card_width_px(),
        );
        self.target_fps = self.target_fps.clamp(1, 240);
        self.saccade_interval_ms = self.saccade_interval().as_millis() as u64;
        self.gabor_size_px = clamp_patch_size(self.gabor_size_px);
        self.stretch_font_px = clamp_font_size(self.stretch_font_px);
        self.session_limit_s = self
            .session_limit_s
            .filter(|s| *s > 0)
            .map(|s| s.min(SESSION_LIMIT_MAX_S));
        self.player_name = self
            .player_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self
    }

    pub fn saccade_interval(&self) -> Duration {
        clamp_interval(Duration::from_millis(self.saccade_interval_ms))
    }

    pub fn session_limit(&self) -> Option<Duration> {
        self.session_limit_s.map(Duration::from_secs)
    }

    pub fn calibration(&self) -> Calibration {
        Calibration::new(self.card_width_px)
    }

    /// Load from `path`. A missing file yields defaults; a corrupt one is
    /// logged and replaced by defaults.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(Some(s)) => s,
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("Ignoring settings file: {}", e);
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Option<Self>, DaemonError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DaemonError::io(path, e)),
        };
        let settings: Settings =
            serde_json::from_str(&raw).map_err(|e| DaemonError::json(path, e))?;
        Ok(Some(settings.sanitized()))
    }

    pub fn save(&self, path: &Path) -> Result<(), DaemonError> {
        let raw = serde_json::to_string_pretty(self).map_err(|e| DaemonError::json(path, e))?;
        fs::write(path, raw).map_err(|e| DaemonError::io(path, e))
    }
}
