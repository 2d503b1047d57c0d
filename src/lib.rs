//! Screenshot Judge - visual similarity scoring for generated webpages.
//!
//! Compares each predicted webpage screenshot with its ground-truth
//! rendering by asking a multimodal LLM to fill in a ten-point rubric, then
//! averages the rubrics into category and overall similarity scores.
//!
//! # Quick Start
//!
//! ```no_run
//! use screenshot_judge::{
//!     config::Config,
//!     fetcher::ScoreFetcher,
//!     images::ImageSource,
//!     pipeline::run_evaluation,
//! };
//! use std::path::{Path, PathBuf};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     let fetcher = ScoreFetcher::from_config(&config)?;
//!     let report = run_evaluation(
//!         &fetcher,
//!         &ImageSource::Directory(PathBuf::from("screens/ground_truth")),
//!         &ImageSource::Directory(PathBuf::from("screens/predicted")),
//!         Path::new("results"),
//!     )
//!     .await?;
//!
//!     print!("{}", report.summary.to_report());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **ImageSource / ImageSet**: where screenshots come from, keyed by file stem
//! - **ResultCache**: JSONL store of raw scorer replies; makes runs resumable
//! - **ScoreFetcher**: retrying wrapper around a [`fetcher::ScoringService`]
//! - **PairwiseEvaluator**: visits every predicted screenshot once
//! - **Rubric**: parser for the scorer's ten comma-separated scores
//! - **metrics::aggregate**: category and overall averages

pub mod cache;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod fetcher;
pub mod images;
pub mod llm;
pub mod metrics;
pub mod pipeline;
pub mod rubric;

// Re-export commonly used types
pub use cache::{EvaluationRecord, RecordMap, ResultCache};
pub use config::{Config, RetryPolicy};
pub use error::{JudgeError, Result};
pub use evaluator::{Evaluation, PairwiseEvaluator, RunStats};
pub use fetcher::{ScoreFetcher, ScoringService, VisionScorer};
pub use images::{EncodedImage, ImageSet, ImageSource};
pub use llm::LlmClient;
pub use metrics::{MetricsSummary, aggregate};
pub use pipeline::{RunReport, run_evaluation, summarize};
pub use rubric::{ParseFailure, Rubric};
