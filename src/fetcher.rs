//! Retrying comparison requests to the scoring service.
//!
//! [`ScoringService`] is one attempt at scoring a pair; [`ScoreFetcher`]
//! wraps a service with a fixed-delay retry policy. The production service
//! is [`VisionScorer`], which sends both screenshots to a multimodal chat
//! model together with the rubric prompt.

use crate::config::{Config, PromptConfig, RetryPolicy};
use crate::error::{JudgeError, Result};
use crate::images::EncodedImage;
use crate::llm::{ContentPart, LlmClient, Message};
use tracing::warn;

/// A single scoring attempt for one screenshot pair.
pub trait ScoringService {
    /// Return the scorer's raw reply for the pair.
    fn score_pair(
        &self,
        ground_truth: &EncodedImage,
        predicted: &EncodedImage,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Scores pairs with a vision-capable chat model.
#[derive(Clone)]
pub struct VisionScorer {
    client: LlmClient,
    prompts: PromptConfig,
}

impl VisionScorer {
    pub fn new(client: LlmClient, prompts: PromptConfig) -> Self {
        Self { client, prompts }
    }

    /// Build the request messages: system prompt, then the rubric prompt
    /// followed by the ground-truth and predicted images, in that order.
    pub fn messages(&self, ground_truth: &EncodedImage, predicted: &EncodedImage) -> Vec<Message> {
        vec![
            Message::system(self.prompts.system.clone()),
            Message::user_parts(vec![
                ContentPart::text(self.prompts.user.clone()),
                ContentPart::image(ground_truth.data_uri()),
                ContentPart::image(predicted.data_uri()),
            ]),
        ]
    }
}

impl ScoringService for VisionScorer {
    async fn score_pair(
        &self,
        ground_truth: &EncodedImage,
        predicted: &EncodedImage,
    ) -> Result<String> {
        let response = self
            .client
            .chat(self.messages(ground_truth, predicted))
            .await?;
        Ok(response.content)
    }
}

/// Fetches scores with bounded, fixed-delay retries.
pub struct ScoreFetcher<S> {
    service: S,
    policy: RetryPolicy,
}

impl ScoreFetcher<VisionScorer> {
    /// Fetcher for the configured model, prompts and retry settings.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = LlmClient::new(config.llm.clone())?;
        Ok(Self::new(
            VisionScorer::new(client, config.prompts.clone()),
            config.retry.policy(),
        ))
    }
}

impl<S: ScoringService> ScoreFetcher<S> {
    pub fn new(service: S, policy: RetryPolicy) -> Self {
        Self { service, policy }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Score one pair, retrying failed attempts after the configured delay.
    ///
    /// Every failure counts as an attempt. Once `max_attempts` have failed
    /// the last cause is returned inside [`JudgeError::FetchExhausted`].
    pub async fn fetch(
        &self,
        ground_truth: &EncodedImage,
        predicted: &EncodedImage,
    ) -> Result<String> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.service.score_pair(ground_truth, predicted).await {
                Ok(output) => return Ok(output),
                Err(e) => {
                    warn!(
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "scoring request failed"
                    );

                    if attempt >= max_attempts {
                        return Err(JudgeError::FetchExhausted {
                            attempts: attempt,
                            last_error: Box::new(e),
                        });
                    }

                    tokio::time::sleep(self.policy.delay).await;
                }
            }
        }
    }
}
