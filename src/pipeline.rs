//! End-to-end runs: score, persist, parse, aggregate, report.

use crate::cache::{RecordMap, ResultCache};
use crate::error::{JudgeError, Result};
use crate::evaluator::{PairwiseEvaluator, RunStats};
use crate::fetcher::{ScoreFetcher, ScoringService};
use crate::images::ImageSource;
use crate::metrics::{MetricsSummary, SUMMARY_FILENAME, aggregate};
use crate::rubric::parse_records;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: MetricsSummary,
    /// Evaluation counters; `None` when only the cache was re-summarized.
    pub stats: Option<RunStats>,
    /// Records in the cache after the run.
    pub records: usize,
    /// Records whose scores parsed and were aggregated.
    pub scored: usize,
    /// Records dropped because their scores did not parse.
    pub parse_failures: usize,
    pub cache_path: PathBuf,
    pub summary_path: PathBuf,
}

/// Score every new pair, save the cache, then write the summary report.
///
/// The cache is rewritten once after all pairs were visited. A failure to
/// write it, or the summary, fails the run.
pub async fn run_evaluation<S: ScoringService>(
    fetcher: &ScoreFetcher<S>,
    ground_truth: &ImageSource,
    predicted: &ImageSource,
    output_dir: &Path,
) -> Result<RunReport> {
    fs::create_dir_all(output_dir).map_err(|e| JudgeError::io(output_dir, e))?;

    let cache = ResultCache::in_dir(output_dir);
    let cached = cache.load()?;
    info!(path = %cache.path().display(), records = cached.len(), "loaded cache");

    let predicted = predicted.resolve()?;
    let ground_truth = ground_truth.resolve()?;
    info!(
        predicted = predicted.len(),
        ground_truth = ground_truth.len(),
        "resolved screenshots"
    );

    let evaluation = PairwiseEvaluator::new(fetcher)
        .evaluate(&predicted, &ground_truth, cached)
        .await?;

    cache.save(&evaluation.records)?;

    let mut report = summarize_records(&evaluation.records, &cache, output_dir)?;
    report.stats = Some(evaluation.stats);
    Ok(report)
}

/// Re-parse and re-aggregate an existing cache without contacting the scorer.
pub fn summarize(output_dir: &Path) -> Result<RunReport> {
    let cache = ResultCache::in_dir(output_dir);
    let records = cache.load()?;
    summarize_records(&records, &cache, output_dir)
}

fn summarize_records(
    records: &RecordMap,
    cache: &ResultCache,
    output_dir: &Path,
) -> Result<RunReport> {
    let parsed = parse_records(records);
    let summary = aggregate(parsed.rubrics.values());

    let summary_path = output_dir.join(SUMMARY_FILENAME);
    summary.save_report(&summary_path)?;
    info!(
        path = %summary_path.display(),
        scored = parsed.rubrics.len(),
        parse_failures = parsed.failures.len(),
        overall = summary.overall_similarity,
        "wrote summary"
    );

    Ok(RunReport {
        summary,
        stats: None,
        records: records.len(),
        scored: parsed.rubrics.len(),
        parse_failures: parsed.failures.len(),
        cache_path: cache.path().to_path_buf(),
        summary_path,
    })
}
