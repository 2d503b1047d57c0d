//! Aggregation of rubrics into category and overall similarity scores.

use crate::error::{JudgeError, Result};
use crate::rubric::Rubric;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default filename for the summary report.
pub const SUMMARY_FILENAME: &str = "vision_evaluation_summary.log";

/// Category averages over every parsed rubric, plus their mean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub overall_similarity: f64,
    pub visual_structure: f64,
    pub color_aesthetic: f64,
    pub textual_content: f64,
    pub user_interface: f64,
}

/// One rubric's contribution to each category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryScores {
    pub visual_structure: f64,
    pub color_aesthetic: f64,
    pub textual_content: f64,
    pub user_interface: f64,
}

impl CategoryScores {
    pub fn of(rubric: &Rubric) -> Self {
        Self {
            visual_structure: mean(&[
                rubric.layout_consistency,
                rubric.element_alignment,
                rubric.proportional_accuracy,
                rubric.visual_harmony,
            ]),
            color_aesthetic: mean(&[rubric.color_scheme_match, rubric.aesthetic_resemblance]),
            textual_content: mean(&[
                rubric.font_consistency,
                rubric.textual_content_match,
                rubric.numeric_accuracy,
            ]),
            user_interface: f64::from(rubric.ui_consistency),
        }
    }

    /// Unweighted mean of the four categories.
    pub fn overall(&self) -> f64 {
        (self.visual_structure + self.color_aesthetic + self.textual_content + self.user_interface)
            / 4.0
    }
}

fn mean(values: &[u8]) -> f64 {
    values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64
}

/// Average rubrics into a summary.
///
/// Categories are averaged per rubric first, then across rubrics; the
/// overall score is the mean of the four categories, so each category
/// weighs the same regardless of how many fields it has. An empty input
/// gives all zeros.
pub fn aggregate<'a>(rubrics: impl IntoIterator<Item = &'a Rubric>) -> MetricsSummary {
    let mut count = 0usize;
    let mut visual_structure = 0.0;
    let mut color_aesthetic = 0.0;
    let mut textual_content = 0.0;
    let mut user_interface = 0.0;

    for rubric in rubrics {
        let scores = CategoryScores::of(rubric);
        count += 1;
        visual_structure += scores.visual_structure;
        color_aesthetic += scores.color_aesthetic;
        textual_content += scores.textual_content;
        user_interface += scores.user_interface;
    }

    if count == 0 {
        return MetricsSummary::default();
    }

    let n = count as f64;
    let categories = CategoryScores {
        visual_structure: visual_structure / n,
        color_aesthetic: color_aesthetic / n,
        textual_content: textual_content / n,
        user_interface: user_interface / n,
    };

    MetricsSummary {
        overall_similarity: categories.overall(),
        visual_structure: categories.visual_structure,
        color_aesthetic: categories.color_aesthetic,
        textual_content: categories.textual_content,
        user_interface: categories.user_interface,
    }
}

impl MetricsSummary {
    /// Labelled values in report order.
    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("Overall Similarity Score", self.overall_similarity),
            ("Visual_Structure_and_Alignment", self.visual_structure),
            ("Color and Aesthetic Design", self.color_aesthetic),
            ("Textual and Content Consistency", self.textual_content),
            ("User Interface and Interactivity", self.user_interface),
        ]
    }

    /// One `<label>: <value>` line per field, four decimal places.
    pub fn to_report(&self) -> String {
        self.entries()
            .iter()
            .map(|(label, value)| format!("{}: {:.4}\n", label, value))
            .collect()
    }

    /// Write the report, replacing any previous one.
    pub fn save_report(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| JudgeError::io(parent, e))?;
            }
        }
        fs::write(path, self.to_report()).map_err(|e| JudgeError::io(path, e))
    }
}
