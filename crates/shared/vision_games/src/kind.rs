use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Default number of history records kept per game.
pub const HISTORY_MAX_ITEMS: usize = 10;
/// The color game keeps a shorter list.
pub const COLOR_HISTORY_MAX_ITEMS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Acuity,
    Color,
    Dynamic,
    Follow,
    Saccade,
    Gabor,
    Stretch,
}

impl GameKind {
    pub const ALL: [GameKind; 7] = [
        GameKind::Acuity,
        GameKind::Color,
        GameKind::Dynamic,
        GameKind::Follow,
        GameKind::Saccade,
        GameKind::Gabor,
        GameKind::Stretch,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GameKind::Acuity => "acuity",
            GameKind::Color => "color",
            GameKind::Dynamic => "dynamic",
            GameKind::Follow => "follow",
            GameKind::Saccade => "saccade",
            GameKind::Gabor => "gabor",
            GameKind::Stretch => "stretch",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            GameKind::Acuity => "Acuity check",
            GameKind::Color => "Color discrimination",
            GameKind::Dynamic => "Dynamic vision",
            GameKind::Follow => "Target following",
            GameKind::Saccade => "Saccade training",
            GameKind::Gabor => "Gabor patches",
            GameKind::Stretch => "Focus stretch",
        }
    }

    pub fn history_cap(self) -> usize {
        match self {
            GameKind::Color => COLOR_HISTORY_MAX_ITEMS,
            _ => HISTORY_MAX_ITEMS,
        }
    }

    pub fn parse(v: &str) -> Result<Self, ParseError> {
        let v = v.trim().to_ascii_lowercase();
        GameKind::ALL
            .into_iter()
            .find(|k| k.label() == v)
            .ok_or(ParseError::Game(v))
    }
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_back() {
        for k in GameKind::ALL {
            assert_eq!(GameKind::parse(k.label()), Ok(k));
        }
        assert_eq!(GameKind::parse(" Color "), Ok(GameKind::Color));
        assert!(GameKind::parse("pong").is_err());
    }

    #[test]
    fn color_keeps_a_shorter_history() {
        assert_eq!(GameKind::Color.history_cap(), 5);
        assert_eq!(GameKind::Acuity.history_cap(), 10);
        assert_eq!(GameKind::Stretch.history_cap(), 10);
    }
}
