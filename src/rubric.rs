//! Ten-point similarity rubric and the parser for scorer replies.
//!
//! The scorer answers with ten integers separated by commas or line breaks,
//! in a fixed order. Anything else is a [`ParseFailure`] and the identifier
//! is left out of aggregation; its raw record stays cached so a later run
//! can parse it again without another request.

use crate::cache::{EvaluationRecord, RecordMap};
use crate::error::JudgeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Lowest score a rubric field may hold.
pub const MIN_SCORE: i64 = 0;
/// Highest score a rubric field may hold.
pub const MAX_SCORE: i64 = 10;

/// Field names, in the order the scorer reports them.
pub const FIELD_NAMES: [&str; 10] = [
    "layout_consistency",
    "element_alignment",
    "proportional_accuracy",
    "visual_harmony",
    "color_scheme_match",
    "aesthetic_resemblance",
    "font_consistency",
    "textual_content_match",
    "numeric_accuracy",
    "ui_consistency",
];

/// Why a scorer reply is not a rubric.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("expected 10 scores, found {found}")]
    WrongFieldCount { found: usize },

    #[error("score #{position} is not an integer: {token:?}")]
    NotAnInteger { position: usize, token: String },

    #[error("{field} = {value} is outside 0-10")]
    OutOfRange { field: &'static str, value: i64 },
}

/// Per-pair similarity scores, each in 0..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    pub layout_consistency: u8,
    pub element_alignment: u8,
    pub proportional_accuracy: u8,
    pub visual_harmony: u8,
    pub color_scheme_match: u8,
    pub aesthetic_resemblance: u8,
    pub font_consistency: u8,
    pub textual_content_match: u8,
    pub numeric_accuracy: u8,
    pub ui_consistency: u8,
}

impl Rubric {
    /// Build a rubric from scores in field order, rejecting out-of-range values.
    pub fn from_scores(scores: [i64; 10]) -> Result<Self, ParseFailure> {
        let mut fields = [0u8; 10];
        for (i, (&value, slot)) in scores.iter().zip(fields.iter_mut()).enumerate() {
            if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
                return Err(ParseFailure::OutOfRange {
                    field: FIELD_NAMES[i],
                    value,
                });
            }
            *slot = value as u8;
        }

        let [
            layout_consistency,
            element_alignment,
            proportional_accuracy,
            visual_harmony,
            color_scheme_match,
            aesthetic_resemblance,
            font_consistency,
            textual_content_match,
            numeric_accuracy,
            ui_consistency,
        ] = fields;

        Ok(Self {
            layout_consistency,
            element_alignment,
            proportional_accuracy,
            visual_harmony,
            color_scheme_match,
            aesthetic_resemblance,
            font_consistency,
            textual_content_match,
            numeric_accuracy,
            ui_consistency,
        })
    }

    /// Scores in field order.
    pub fn scores(&self) -> [u8; 10] {
        [
            self.layout_consistency,
            self.element_alignment,
            self.proportional_accuracy,
            self.visual_harmony,
            self.color_scheme_match,
            self.aesthetic_resemblance,
            self.font_consistency,
            self.textual_content_match,
            self.numeric_accuracy,
            self.ui_consistency,
        ]
    }

    /// Every field set to `score`.
    #[cfg(test)]
    pub(crate) fn uniform(s: u8) -> Self {
        assert!(i64::from(s) <= MAX_SCORE);
        Self {
            layout_consistency: s,
            element_alignment: s,
            proportional_accuracy: s,
            visual_harmony: s,
            color_scheme_match: s,
            aesthetic_resemblance: s,
            font_consistency: s,
            textual_content_match: s,
            numeric_accuracy: s,
            ui_consistency: s,
        }
    }
}

impl FromStr for Rubric {
    type Err = ParseFailure;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.replace("\r\n", ",").replace(['\n', '\r'], ",");
        let trimmed = normalized.trim_matches(|c: char| c == ',' || c.is_whitespace());

        let tokens: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if tokens.len() != FIELD_NAMES.len() {
            return Err(ParseFailure::WrongFieldCount {
                found: tokens.len(),
            });
        }

        let mut scores = [0i64; 10];
        for (i, token) in tokens.iter().enumerate() {
            scores[i] = token.parse().map_err(|_| ParseFailure::NotAnInteger {
                position: i + 1,
                token: token.to_string(),
            })?;
        }

        Rubric::from_scores(scores)
    }
}

impl fmt::Display for Rubric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scores = self.scores();
        for (i, score) in scores.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", score)?;
        }
        Ok(())
    }
}

/// Parse one cached record.
pub fn parse(record: &EvaluationRecord) -> Result<Rubric, JudgeError> {
    record.output.parse().map_err(|source| JudgeError::Parse {
        image_id: record.image_id.clone(),
        source,
    })
}

/// Rubrics that parsed, plus the failures that were dropped.
#[derive(Debug, Default)]
pub struct ParsedScores {
    pub rubrics: BTreeMap<String, Rubric>,
    pub failures: Vec<JudgeError>,
}

/// Parse every record, logging and collecting the ones that fail.
pub fn parse_records(records: &RecordMap) -> ParsedScores {
    let mut parsed = ParsedScores::default();

    for (image_id, record) in records {
        match parse(record) {
            Ok(rubric) => {
                parsed.rubrics.insert(image_id.clone(), rubric);
            }
            Err(e) => {
                warn!(image_id = %image_id, error = %e, "dropping unparseable scores");
                parsed.failures.push(e);
            }
        }
    }

    parsed
}
