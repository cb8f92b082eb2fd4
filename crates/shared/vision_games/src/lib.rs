//! Stimulus-and-scoring engine for the NeuroVision training games.
//!
//! Every game is an explicit round object: the host calls `start`, forwards
//! user input through `respond`/`click`, advances timers with `tick(dt)` and
//! ends it with `stop`. Rounds never read the wall clock themselves, so the
//! same code runs under the native daemon, in wasm, and in tests.

pub mod error;
pub mod geometry;
pub mod kind;
pub mod prng;
pub mod round;
pub mod stats;

// WASM-safe monotonic time shim for hosts that pace rounds from a real clock.
pub mod time;

pub mod cues;
pub mod history;
pub mod reminder;

pub mod acuity;
pub mod color;
pub mod dynamic;
pub mod follow;
pub mod gabor;
pub mod saccade;
pub mod stretch;

pub use error::{CapabilityError, ParseError};
pub use geometry::{Point, Viewport};
pub use history::{HistoryStore, MemoryHistory, ResultPayload, ResultRecord, RoundSummary};
pub use kind::GameKind;
pub use prng::Prng;
pub use round::{RoundEvent, RoundGate, RoundPhase};
pub use stats::RoundStats;
