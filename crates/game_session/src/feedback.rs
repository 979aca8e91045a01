//! Fire-and-forget notifications for haptics, audio or UI layers.

use tracing::info;

use crate::record::MatchResult;

/// Receives game events. Every method defaults to doing nothing and must not
/// block; the session calls them while holding its state lock.
pub trait Feedback: Send + Sync {
    fn move_applied(&self, _capture: bool) {}

    fn check(&self) {}

    fn game_over(&self, _result: MatchResult) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeedback;

impl Feedback for NoFeedback {}

/// Reports events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFeedback;

impl Feedback for TracingFeedback {
    fn move_applied(&self, capture: bool) {
        info!(capture, "move applied");
    }

    fn check(&self) {
        info!("check");
    }

    fn game_over(&self, result: MatchResult) {
        info!(%result, "game over");
    }
}
