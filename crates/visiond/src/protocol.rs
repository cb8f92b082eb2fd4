//! Line-delimited JSON messages exchanged with display clients.

use serde::{Deserialize, Serialize};
use vision_games::cues::Tone;
use vision_games::{GameKind, ResultRecord, RoundPhase, RoundSummary};

use crate::session::{Hud, Stimulus};
use crate::settings::Settings;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    GetState,
    /// Replace any live round with a fresh one of `game` and start it.
    Start {
        game: String,
    },
    /// Answer text: a direction for acuity, a tile or patch index for color
    /// and gabor, the number read for dynamic vision.
    Respond {
        input: String,
    },
    Stop,
    Hint,
    /// Drawable area of the client's canvas, in CSS pixels.
    Resize {
        width: f64,
        height: f64,
    },
    GetHistory {
        game: String,
    },
    ClearHistory {
        game: String,
    },
    GetSettings,
    SetSettings {
        settings: Settings,
    },
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
#[allow(clippy::large_enum_variant)]
pub enum Response {
    State(Box<StateSnapshot>),
    History {
        game: GameKind,
        rows: Vec<HistoryRow>,
    },
    Settings {
        settings: Settings,
        /// Calibration card preview `(width, height)` for these settings.
        card_box_px: (f64, f64),
    },
    Success {
        message: String,
    },
    Error {
        message: String,
    },
}

impl Response {
    pub fn success(message: impl Into<String>) -> Self {
        Response::Success {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }

    pub fn settings(settings: &Settings) -> Self {
        Response::Settings {
            card_box_px: settings.calibration().card_box_px(),
            settings: settings.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub frame: u64,
    #[serde(default)]
    pub game: Option<GameKind>,
    #[serde(default)]
    pub phase: RoundPhase,
    #[serde(default)]
    pub stimulus: Option<Stimulus>,
    #[serde(default)]
    pub hud: Hud,
    /// Tones to play, oldest first. Drained by this snapshot.
    #[serde(default)]
    pub tones: Vec<Tone>,
    /// Most recently recorded round.
    #[serde(default)]
    pub last_result: Option<RoundSummary>,
    /// Result-card text for `last_result`, such as the color rank.
    #[serde(default)]
    pub result_detail: Option<String>,
    /// Pending break reminder or capability advisory. Drained by this snapshot.
    #[serde(default)]
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    /// `MM/DD hh:mm (player)`.
    pub heading: String,
    pub result: String,
    #[serde(default)]
    pub detail: Option<String>,
    pub record: ResultRecord,
}

impl From<ResultRecord> for HistoryRow {
    fn from(record: ResultRecord) -> Self {
        let (heading, result) = record.display_row();
        Self {
            heading,
            result,
            detail: record.payload().detail().map(str::to_string),
            record,
        }
    }
}
