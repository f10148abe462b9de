use std::sync::Arc;

use futures::StreamExt;
use gs_core::{
    ArticleTransformer, FailedItem, FailurePolicy, FatalError, MessagePublisher, PipelineSummary,
    RawArticle, SearchClient, SearchQuery,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Fetching,
    Transforming,
    Publishing,
    Done,
}

/// A run that stopped early, together with what it managed before stopping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{error}")]
pub struct PipelineAbort {
    pub error: FatalError,
    pub summary: PipelineSummary,
}

/// What a single stream item did to the failure streak.
enum Step {
    Published,
    Skipped,
    Failed,
}

#[derive(Debug, Default)]
struct FailureStreak {
    current: u32,
}

impl FailureStreak {
    fn apply(&mut self, step: &Step) {
        match step {
            Step::Published => self.current = 0,
            Step::Failed => self.current += 1,
            Step::Skipped => {}
        }
    }

    fn exceeded(&self, policy: &FailurePolicy) -> bool {
        policy
            .max_consecutive_failures
            .map_or(false, |limit| self.current >= limit)
    }
}

/// Moves articles from a [`SearchClient`] to a [`MessagePublisher`], one at a time.
pub struct Pipeline {
    search: Arc<dyn SearchClient>,
    publisher: Arc<dyn MessagePublisher>,
    transformer: ArticleTransformer,
    policy: FailurePolicy,
}

impl Pipeline {
    pub fn new(search: Arc<dyn SearchClient>, publisher: Arc<dyn MessagePublisher>) -> Self {
        Self {
            search,
            publisher,
            transformer: ArticleTransformer::new(),
            policy: FailurePolicy::never_escalate(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn run(&self, query: &SearchQuery) -> Result<PipelineSummary, PipelineAbort> {
        let mut state = PipelineState::Idle;
        let mut summary = PipelineSummary::new();
        let mut streak = FailureStreak::default();

        info!(
            "🔎 Forwarding articles for {:?} (from: {:?}, to: {:?}) via {}",
            query.text(),
            query.date_from(),
            query.date_to(),
            self.publisher.name()
        );

        let mut articles = self.search.fetch(query);
        transition(&mut state, PipelineState::Fetching);

        while let Some(item) = articles.next().await {
            let step = match item {
                Ok(raw) => self.forward(&raw, &mut state, &mut summary).await,
                Err(err) if err.is_fatal() => {
                    error!("💥 Fatal search error, aborting run: {}", err);
                    return Err(PipelineAbort {
                        error: FatalError::Search(err),
                        summary,
                    });
                }
                Err(err) => {
                    warn!("⚠️ Dropping page: {}", err);
                    summary.record_failure(FailedItem::new(None, err.to_string()));
                    Step::Failed
                }
            };

            streak.apply(&step);
            if streak.exceeded(&self.policy) {
                error!("💥 {} consecutive failures, aborting run", streak.current);
                return Err(PipelineAbort {
                    error: FatalError::TooManyConsecutiveFailures(streak.current),
                    summary,
                });
            }
            transition(&mut state, PipelineState::Fetching);
        }

        transition(&mut state, PipelineState::Done);
        info!(
            "✅ Run finished: {} attempted, {} published, {} failed",
            summary.attempted(),
            summary.published(),
            summary.failed().len()
        );
        Ok(summary)
    }

    async fn forward(&self, raw: &RawArticle, state: &mut PipelineState, summary: &mut PipelineSummary) -> Step {
        transition(state, PipelineState::Transforming);
        let message = match self.transformer.transform(raw) {
            Ok(message) => message,
            Err(err) => {
                warn!("⚠️ Skipping {}: {}", raw.id().unwrap_or("<unknown>"), err);
                summary.record_failure(FailedItem::new(err.article_id(), err.to_string()));
                return Step::Skipped;
            }
        };

        transition(state, PipelineState::Publishing);
        match self.publisher.publish(&message).await {
            Ok(receipt) => {
                debug!("📨 Published {} as {}", message.id, receipt.message_id);
                summary.record_published();
                Step::Published
            }
            Err(err) => {
                warn!("⚠️ Failed to publish {}: {}", message.id, err);
                summary.record_failure(FailedItem::new(Some(&message.id), err.to_string()));
                Step::Failed
            }
        }
    }
}

fn transition(state: &mut PipelineState, next: PipelineState) {
    if *state != next {
        debug!("pipeline state {:?} -> {:?}", state, next);
        *state = next;
    }
}
