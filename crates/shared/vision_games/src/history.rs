//! Round summaries and the capped per-game result history.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::color::Rank;
use crate::kind::GameKind;

/// Game-specific outcome of one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultPayload {
    /// Best decimal acuity passed (0.05 when none passed).
    Vision { vision: f64 },
    /// Color level reached and its rank.
    Level { level: u32, rank: Rank },
    /// Rounded dynamic-vision age estimate.
    EstimatedAge { age: u32 },
    /// Whole seconds spent following the target.
    Elapsed { seconds: u64 },
    /// Number of saccade targets shown.
    Count { moves: u32 },
    /// Gabor boards fully cleared and the points they earned.
    Cleared { boards: u32, score: u32 },
    /// Whole seconds of near/far focus practice.
    Practice { seconds: u64 },
}

impl ResultPayload {
    /// Short text for a history list row.
    /// Longer explanation for the result card, for games that have one.
    pub fn detail(&self) -> Option<&'static str> {
        match self {
            ResultPayload::Level { rank, .. } => Some(rank.description()),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            ResultPayload::Vision { vision } => format!("Vision {vision}"),
            ResultPayload::Level { level, rank } => format!("Lv.{level} ({})", rank.short_label()),
            ResultPayload::EstimatedAge { age } => format!("Estimated age {age}"),
            ResultPayload::Elapsed { seconds } => format!("Time {seconds}s"),
            ResultPayload::Count { moves } => format!("Count {moves}"),
            ResultPayload::Cleared { boards, score } => {
                format!("Boards {boards} ({score} pts)")
            }
            ResultPayload::Practice { seconds } => {
                format!("Practice {}m{}s", seconds / 60, seconds % 60)
            }
        }
    }
}

/// What a round hands to the recorder when it finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub game: GameKind,
    pub payload: ResultPayload,
}

impl RoundSummary {
    pub fn new(game: GameKind, payload: ResultPayload) -> Self {
        Self { game, payload }
    }
}

/// Immutable history entry: one per completed round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    timestamp: DateTime<Local>,
    game: GameKind,
    #[serde(default)]
    player: Option<String>,
    payload: ResultPayload,
}

impl ResultRecord {
    pub fn new(summary: RoundSummary, player: Option<String>, timestamp: DateTime<Local>) -> Self {
        let player = player
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        Self {
            timestamp,
            game: summary.game,
            player,
            payload: summary.payload,
        }
    }

    /// Stamp a summary with the current local time.
    pub fn now(summary: RoundSummary, player: Option<String>) -> Self {
        Self::new(summary, player, Local::now())
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn game(&self) -> GameKind {
        self.game
    }

    pub fn player(&self) -> Option<&str> {
        self.player.as_deref()
    }

    pub fn payload(&self) -> &ResultPayload {
        &self.payload
    }

    /// `MM/DD HH:MM (player)` plus the payload label.
    pub fn display_row(&self) -> (String, String) {
        let when = self.timestamp.format("%m/%d %H:%M").to_string();
        let who = self.player.as_deref().unwrap_or("none");
        (format!("{when} ({who})"), self.payload.label())
    }
}

/// Persistent per-game result history, most recent first.
pub trait HistoryStore {
    /// Insert at the front, evicting the oldest entries beyond the game's cap.
    fn append(&mut self, record: ResultRecord);
    fn clear(&mut self, game: GameKind);
    fn list(&self, game: GameKind) -> Vec<ResultRecord>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryHistory {
    games: HashMap<GameKind, VecDeque<ResultRecord>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, game: GameKind) -> usize {
        self.games.get(&game).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.games.values().all(VecDeque::is_empty)
    }

    /// Re-apply caps, e.g. after loading a file written with a larger cap.
    pub fn enforce_caps(&mut self) {
        for (game, list) in self.games.iter_mut() {
            list.truncate(game.history_cap());
        }
    }
}

impl HistoryStore for MemoryHistory {
    fn append(&mut self, record: ResultRecord) {
        let game = record.game();
        let list = self.games.entry(game).or_default();
        list.push_front(record);
        list.truncate(game.history_cap());
    }

    fn clear(&mut self, game: GameKind) {
        self.games.remove(&game);
    }

    fn list(&self, game: GameKind) -> Vec<ResultRecord> {
        self.games
            .get(&game)
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(game: GameKind, n: u32) -> ResultRecord {
        let ts = Local
            .with_ymd_and_hms(2026, 1, 1, 9, 0, n % 60)
            .single()
            .unwrap();
        ResultRecord::new(
            RoundSummary::new(game, ResultPayload::Count { moves: n }),
            None,
            ts,
        )
    }

    #[test]
    fn eleventh_append_evicts_oldest() {
        let mut h = MemoryHistory::new();
        for n in 0..10 {
            h.append(record(GameKind::Saccade, n));
        }
        let before = h.list(GameKind::Saccade);
        assert_eq!(before.len(), 10);
        assert_eq!(before[9].payload(), &ResultPayload::Count { moves: 0 });

        h.append(record(GameKind::Saccade, 10));
        let after = h.list(GameKind::Saccade);
        assert_eq!(after.len(), 10);
        assert_eq!(after[0].payload(), &ResultPayload::Count { moves: 10 });
        assert_eq!(after[9].payload(), &ResultPayload::Count { moves: 1 });
    }

    #[test]
    fn color_is_capped_at_five() {
        let mut h = MemoryHistory::new();
        for n in 0..8 {
            h.append(record(GameKind::Color, n));
        }
        assert_eq!(h.len(GameKind::Color), 5);
    }

    #[test]
    fn clear_only_touches_one_game() {
        let mut h = MemoryHistory::new();
        h.append(record(GameKind::Follow, 1));
        h.append(record(GameKind::Stretch, 2));
        h.clear(GameKind::Follow);
        assert!(h.list(GameKind::Follow).is_empty());
        assert_eq!(h.len(GameKind::Stretch), 1);
    }

    #[test]
    fn blank_player_name_is_dropped() {
        let r = ResultRecord::now(
            RoundSummary::new(GameKind::Follow, ResultPayload::Elapsed { seconds: 3 }),
            Some("   ".to_string()),
        );
        assert_eq!(r.player(), None);
        assert!(r.display_row().0.ends_with("(none)"));
    }

    #[test]
    fn serializes_as_game_keyed_map() {
        let mut h = MemoryHistory::new();
        h.append(record(GameKind::Gabor, 4));
        let json = serde_json::to_string(&h).unwrap();
        assert!(json.starts_with("{\"gabor\":["));
        let back: MemoryHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn payload_labels() {
        assert_eq!(ResultPayload::Vision { vision: 1.2 }.label(), "Vision 1.2");
        assert_eq!(ResultPayload::Practice { seconds: 65 }.label(), "Practice 1m5s");
        assert_eq!(
            ResultPayload::Level {
                level: 12,
                rank: Rank::Normal
            }
            .label(),
            "Lv.12 (Normal)"
        );
        assert_eq!(
            ResultPayload::Level {
                level: 31,
                rank: Rank::God
            }
            .detail(),
            Some("God tier (superhuman color sense)")
        );
        assert_eq!(ResultPayload::Count { moves: 3 }.detail(), None);
    }
}
