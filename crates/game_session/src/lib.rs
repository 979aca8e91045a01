//! Game session orchestration.
//!
//! A [`GameSession`] owns the authoritative game, applies human moves,
//! schedules the built-in engine's replies on the tokio blocking pool, keeps
//! the capture ledgers, and persists through a [`MatchStore`]: a resumable
//! snapshot after every change and a [`MatchRecord`] when a game ends.
//! [`MatchReview`] replays archived matches with evaluations and move-quality
//! labels.

pub mod config;
pub mod error;
pub mod feedback;
pub mod record;
pub mod review;
pub mod session;
pub mod store;

pub use config::{Config, SessionConfig, StorageConfig};
pub use error::{ConfigError, SessionError, StoreError};
pub use feedback::{Feedback, NoFeedback, TracingFeedback};
pub use record::{GameMode, MatchRecord, MatchResult, SessionSnapshot};
pub use review::{load_library, review_match, LibraryEntry, MatchReview, ReviewedMove};
pub use session::{Captures, GameSession, Lifecycle};
pub use store::{JsonFileStore, MatchStore, MemoryStore};

pub use classical_engine::{Difficulty, QualityLabel};
