//! Post-hoc quality label for a single played move.

use std::fmt;

use chess_core::{Color, Position};
use serde::{Deserialize, Serialize};

use crate::eval::evaluate;

/// Quality of a move judged by the evaluation swing it caused for the mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLabel {
    Brilliant,
    Best,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl QualityLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            QualityLabel::Brilliant => "brilliant",
            QualityLabel::Best => "best",
            QualityLabel::Inaccuracy => "inaccuracy",
            QualityLabel::Mistake => "mistake",
            QualityLabel::Blunder => "blunder",
        }
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluation change caused by a move, from the mover's point of view.
pub fn mover_delta(before: &Position, after: &Position, mover: Color) -> i32 {
    mover.sign() * (evaluate(after) - evaluate(before))
}

/// Buckets a mover-relative evaluation change. Checked in order: worse than
/// -300 is a blunder, -100 a mistake, -50 an inaccuracy; a gain above 200 is
/// brilliant; anything else is best.
pub fn classify_delta(delta: i32) -> QualityLabel {
    if delta < -300 {
        QualityLabel::Blunder
    } else if delta < -100 {
        QualityLabel::Mistake
    } else if delta < -50 {
        QualityLabel::Inaccuracy
    } else if delta > 200 {
        QualityLabel::Brilliant
    } else {
        QualityLabel::Best
    }
}

pub fn classify(before: &Position, after: &Position, mover: Color) -> QualityLabel {
    classify_delta(mover_delta(before, after, mover))
}

#[cfg(test)]
#[path = "quality_tests.rs"]
mod quality_tests;
