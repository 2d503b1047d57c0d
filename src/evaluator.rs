//! Pairwise evaluation of predicted screenshots against ground truth.

use crate::cache::{EvaluationRecord, RecordMap};
use crate::error::{JudgeError, Result};
use crate::fetcher::{ScoreFetcher, ScoringService};
use crate::images::{ImageSet, encode_image};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Counters for one evaluation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Predicted screenshots seen.
    pub total: usize,
    /// Skipped because a record already existed.
    pub cached: usize,
    /// Newly scored.
    pub fetched: usize,
    pub missing_ground_truth: usize,
    pub encoding_failures: usize,
    pub fetch_failures: usize,
    /// Any other recoverable failure.
    pub other_failures: usize,
}

impl RunStats {
    /// Pairs that were neither cached nor scored.
    pub fn skipped(&self) -> usize {
        self.missing_ground_truth + self.encoding_failures + self.fetch_failures + self.other_failures
    }

    fn record_skip(&mut self, error: &JudgeError) {
        match error {
            JudgeError::MissingCounterpart(_) => self.missing_ground_truth += 1,
            JudgeError::Encoding { .. } => self.encoding_failures += 1,
            JudgeError::FetchExhausted { .. } => self.fetch_failures += 1,
            _ => self.other_failures += 1,
        }
    }
}

/// Records after a run: everything that was cached plus what was new.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub records: RecordMap,
    pub stats: RunStats,
}

/// Drives the scorer over every predicted screenshot.
pub struct PairwiseEvaluator<'a, S> {
    fetcher: &'a ScoreFetcher<S>,
}

impl<'a, S: ScoringService> PairwiseEvaluator<'a, S> {
    pub fn new(fetcher: &'a ScoreFetcher<S>) -> Self {
        Self { fetcher }
    }

    /// Score every predicted screenshot that has no cached record yet.
    ///
    /// Identifiers are visited one at a time in ascending order. A pair
    /// that cannot be scored (no ground truth, unreadable image, scorer
    /// unreachable) is logged and skipped without a record, so the next run
    /// tries it again. Only an error that is not tied to a single pair
    /// aborts the run.
    pub async fn evaluate(
        &self,
        predicted: &ImageSet,
        ground_truth: &ImageSet,
        cached: RecordMap,
    ) -> Result<Evaluation> {
        let started = Instant::now();
        let mut records = cached;
        let mut stats = RunStats::default();

        for (image_id, predicted_path) in predicted.iter() {
            stats.total += 1;

            if records.contains_key(image_id) {
                info!(image_id = %image_id, "already processed, skipping");
                stats.cached += 1;
                continue;
            }

            match self
                .evaluate_pair(image_id, ground_truth.get(image_id), predicted_path)
                .await
            {
                Ok(record) => {
                    info!(image_id = %image_id, "processed");
                    records.insert(image_id.to_string(), record);
                    stats.fetched += 1;
                }
                Err(e) if e.is_recoverable() => {
                    warn!(image_id = %image_id, error = %e, "skipping pair");
                    stats.record_skip(&e);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            total = stats.total,
            cached = stats.cached,
            fetched = stats.fetched,
            skipped = stats.skipped(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "evaluation finished"
        );

        Ok(Evaluation { records, stats })
    }

    async fn evaluate_pair(
        &self,
        image_id: &str,
        ground_truth_path: Option<&Path>,
        predicted_path: &Path,
    ) -> Result<EvaluationRecord> {
        let ground_truth_path =
            ground_truth_path.ok_or_else(|| JudgeError::MissingCounterpart(image_id.to_string()))?;

        info!(image_id = %image_id, "encoding pair");
        let predicted = encode_image(predicted_path)?;
        let ground_truth = encode_image(ground_truth_path)?;

        let output = self.fetcher.fetch(&ground_truth, &predicted).await?;
        Ok(EvaluationRecord::new(image_id, output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::images::EncodedImage;
    use crate::images::tests::write_png;
    use crate::rubric::ParseFailure;
    use std::fs;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Answers with a fixed reply and remembers the image pairs it saw.
    #[derive(Default)]
    struct RecordingService {
        calls: AtomicUsize,
        seen: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl ScoringService for RecordingService {
        async fn score_pair(
            &self,
            ground_truth: &EncodedImage,
            predicted: &EncodedImage,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push((
                ground_truth.as_base64().to_string(),
                predicted.as_base64().to_string(),
            ));
            if self.fail {
                Err(JudgeError::LlmApi("Request failed (503)".into()))
            } else {
                Ok("8,8,8,8,8,8,8,8,8,8".to_string())
            }
        }
    }

    fn fetcher(service: RecordingService) -> ScoreFetcher<RecordingService> {
        ScoreFetcher::new(service, RetryPolicy::new(2, Duration::ZERO))
    }

    struct Fixture {
        _dir: TempDir,
        predicted: ImageSet,
        ground_truth: ImageSet,
    }

    /// Predicted: about, contact, home. Ground truth: about, home.
    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let mut predicted = ImageSet::new();
        let mut ground_truth = ImageSet::new();

        for (i, id) in ["about", "contact", "home"].iter().enumerate() {
            let pred = dir.path().join(format!("pred_{id}.png"));
            write_png(&pred, i as u8 * 40);
            predicted.insert(*id, pred);
        }
        for id in ["about", "home"] {
            let gt = dir.path().join(format!("gt_{id}.png"));
            write_png(&gt, 200);
            ground_truth.insert(id, gt);
        }

        Fixture {
            _dir: dir,
            predicted,
            ground_truth,
        }
    }

    #[tokio::test]
    async fn test_missing_ground_truth_is_skipped() {
        let fx = fixture();
        let fetcher = fetcher(RecordingService::default());

        let evaluation = PairwiseEvaluator::new(&fetcher)
            .evaluate(&fx.predicted, &fx.ground_truth, RecordMap::new())
            .await
            .unwrap();

        let ids: Vec<_> = evaluation.records.keys().cloned().collect();
        assert_eq!(ids, vec!["about", "home"]);
        assert!(!evaluation.records.contains_key("contact"));
        assert_eq!(evaluation.stats.missing_ground_truth, 1);
        assert_eq!(evaluation.stats.fetched, 2);
        assert_eq!(fetcher.service().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ground_truth_is_sent_first() {
        let fx = fixture();
        let fetcher = fetcher(RecordingService::default());

        PairwiseEvaluator::new(&fetcher)
            .evaluate(&fx.predicted, &fx.ground_truth, RecordMap::new())
            .await
            .unwrap();

        let expected_gt = encode_image(fx.ground_truth.get("about").unwrap()).unwrap();
        let expected_pred = encode_image(fx.predicted.get("about").unwrap()).unwrap();
        let seen = fetcher.service().seen.lock().unwrap();
        assert_eq!(seen[0].0, expected_gt.as_base64());
        assert_eq!(seen[0].1, expected_pred.as_base64());
    }

    #[tokio::test]
    async fn test_second_run_with_full_cache_fetches_nothing() {
        let fx = fixture();

        let first_fetcher = fetcher(RecordingService::default());
        let first = PairwiseEvaluator::new(&first_fetcher)
            .evaluate(&fx.predicted, &fx.ground_truth, RecordMap::new())
            .await
            .unwrap();

        let second_fetcher = fetcher(RecordingService::default());
        let second = PairwiseEvaluator::new(&second_fetcher)
            .evaluate(&fx.predicted, &fx.ground_truth, first.records.clone())
            .await
            .unwrap();

        assert_eq!(second_fetcher.service().calls.load(Ordering::SeqCst), 0);
        assert_eq!(second.records, first.records);
        assert_eq!(second.stats.cached, 2);
        assert_eq!(second.stats.fetched, 0);
    }

    #[tokio::test]
    async fn test_cached_records_are_kept_and_not_overwritten() {
        let fx = fixture();
        let mut cached = RecordMap::new();
        cached.insert("about".into(), EvaluationRecord::new("about", "old reply"));
        cached.insert("retired".into(), EvaluationRecord::new("retired", "1,1,1,1,1,1,1,1,1,1"));

        let fetcher = fetcher(RecordingService::default());
        let evaluation = PairwiseEvaluator::new(&fetcher)
            .evaluate(&fx.predicted, &fx.ground_truth, cached)
            .await
            .unwrap();

        assert_eq!(evaluation.records["about"].output, "old reply");
        assert!(evaluation.records.contains_key("retired"));
        assert_eq!(evaluation.records["home"].output, "8,8,8,8,8,8,8,8,8,8");
        assert_eq!(fetcher.service().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_failures_do_not_abort_or_get_cached() {
        let fx = fixture();
        let fetcher = fetcher(RecordingService {
            fail: true,
            ..Default::default()
        });

        let evaluation = PairwiseEvaluator::new(&fetcher)
            .evaluate(&fx.predicted, &fx.ground_truth, RecordMap::new())
            .await
            .unwrap();

        assert!(evaluation.records.is_empty());
        assert_eq!(evaluation.stats.fetch_failures, 2);
        assert_eq!(evaluation.stats.missing_ground_truth, 1);
        // two pairs, two attempts each
        assert_eq!(fetcher.service().calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_unreadable_image_skips_only_that_pair() {
        let fx = fixture();
        fs::write(fx.predicted.get("about").unwrap(), b"garbage").unwrap();

        let fetcher = fetcher(RecordingService::default());
        let evaluation = PairwiseEvaluator::new(&fetcher)
            .evaluate(&fx.predicted, &fx.ground_truth, RecordMap::new())
            .await
            .unwrap();

        assert_eq!(evaluation.stats.encoding_failures, 1);
        assert!(!evaluation.records.contains_key("about"));
        assert!(evaluation.records.contains_key("home"));
    }

    #[test]
    fn test_skips_are_counted_by_cause() {
        let mut stats = RunStats::default();
        stats.record_skip(&JudgeError::MissingCounterpart("a".into()));
        stats.record_skip(&JudgeError::Encoding {
            path: "b.png".into(),
            message: "truncated".into(),
        });
        stats.record_skip(&JudgeError::FetchExhausted {
            attempts: 3,
            last_error: Box::new(JudgeError::Http("reset".into())),
        });
        stats.record_skip(&JudgeError::Parse {
            image_id: "c".into(),
            source: ParseFailure::WrongFieldCount { found: 2 },
        });

        assert_eq!(stats.missing_ground_truth, 1);
        assert_eq!(stats.encoding_failures, 1);
        assert_eq!(stats.fetch_failures, 1);
        assert_eq!(stats.other_failures, 1);
        assert_eq!(stats.skipped(), 4);
    }
}
