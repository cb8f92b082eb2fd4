use thiserror::Error;

/// A label sent by a client or read from settings did not name a known value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown game `{0}`")]
    Game(String),
    #[error("unknown direction `{0}`")]
    Direction(String),
    #[error("unknown speed tier `{0}`")]
    SpeedTier(String),
    #[error("unknown dynamic mode `{0}`")]
    DynamicMode(String),
    #[error("unknown gabor layout `{0}`")]
    Layout(String),
}

/// A platform feature (sound, notifications) could not be used.
///
/// Never fatal: the caller disables the feature and the round keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("audio output unavailable: {0}")]
    Audio(String),
    #[error("notification permission denied")]
    NotificationDenied,
    #[error("notifications unavailable: {0}")]
    Notification(String),
}
