use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::core::criteria::{normalize, CriteriaError};
use crate::core::matcher::Matcher;
use crate::models::{PropertyRequest, ScoredCandidate};
use crate::services::queue::{JobQueue, QueueError};
use crate::services::repository::{
    ListingRepository, MatchRepository, RepositoryError, RequestRepository,
};
use crate::services::store::{MatchStore, StoreError, UpsertOutcome};

/// Orchestration-level failures. In single-request mode these propagate to
/// the caller; in batch mode everything is caught at the per-request
/// boundary and recorded in the summary instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("request {0} not found")]
    RequestNotFound(Uuid),

    #[error("request {0} is not active")]
    RequestNotActive(Uuid),

    #[error("invalid criteria: {0}")]
    InvalidCriteria(CriteriaError),

    #[error("candidate fetch failed: {0}")]
    CandidateFetch(RepositoryError),

    #[error("persistence conflict for pair ({request_id}, {listing_id})")]
    PersistenceConflict { request_id: Uuid, listing_id: Uuid },

    #[error("storage failure: {0}")]
    Storage(RepositoryError),

    #[error("queue failure: {0}")]
    Queue(#[from] QueueError),

    #[error("scoring request {request_id} timed out after {secs}s")]
    Timeout { request_id: Uuid, secs: u64 },
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict {
                request_id,
                listing_id,
            } => EngineError::PersistenceConflict {
                request_id,
                listing_id,
            },
            StoreError::Repository(e) => EngineError::Storage(e),
        }
    }
}

/// Tuning knobs for the orchestrator; see `config/default.toml`.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Per-request time budget in batch mode. `None` means unbounded.
    pub request_timeout_secs: Option<u64>,
    /// auto-check re-enqueues once the last scoring pass is older than this.
    pub cooldown_days: i64,
    /// auto-check also re-enqueues requests idle for longer than this.
    pub stale_after_hours: i64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            request_timeout_secs: None,
            cooldown_days: 7,
            stale_after_hours: 24,
        }
    }
}

/// Ranked output of a single-request scoring pass.
#[derive(Debug)]
pub struct RankedMatches {
    pub request_id: Uuid,
    /// Full ranked list, including sub-threshold pairs.
    pub ranked: Vec<ScoredCandidate>,
    pub total_candidates: usize,
    /// Pairs written (created or re-scored) when persisting.
    pub persisted: usize,
}

impl RankedMatches {
    pub fn top_score(&self) -> Option<f64> {
        self.ranked.first().map(|c| c.score())
    }
}

/// Per-request entry in a batch summary.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub request_id: Uuid,
    pub matches: usize,
    pub top_score: Option<f64>,
    pub error: Option<String>,
}

/// Result of one full-catalog batch pass.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub processed: usize,
    pub outcomes: Vec<RequestOutcome>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }

    pub fn total_matches(&self) -> usize {
        self.outcomes.iter().map(|o| o.matches).sum()
    }

    pub fn requests_with_matches(&self) -> usize {
        self.outcomes.iter().filter(|o| o.matches > 0).count()
    }

    pub fn mean_top_score(&self) -> f64 {
        let tops: Vec<f64> = self.outcomes.iter().filter_map(|o| o.top_score).collect();
        if tops.is_empty() {
            0.0
        } else {
            tops.iter().sum::<f64>() / tops.len() as f64
        }
    }
}

/// Result of an auto-check sweep.
#[derive(Debug, Clone)]
pub struct AutoCheckSummary {
    pub scanned: usize,
    pub enqueued: Vec<Uuid>,
}

/// Caller-supplied progress reporting for batch mode.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, processed: usize, total: usize);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn on_progress(&self, processed: usize, total: usize) {
        self(processed, total)
    }
}

/// Drives the scoring pipeline for one request or the whole catalog.
///
/// The engine itself is stateless per call; collaborators are injected at
/// construction and the catalog is read-only from its perspective. The
/// match table is the only thing it writes, plus the advisory
/// `last_matched_at` stamp on requests.
pub struct MatchEngine<RR, LR, MR> {
    requests: Arc<RR>,
    listings: Arc<LR>,
    store: MatchStore<MR>,
    matcher: Matcher,
    options: EngineOptions,
}

impl<RR, LR, MR> MatchEngine<RR, LR, MR>
where
    RR: RequestRepository,
    LR: ListingRepository,
    MR: MatchRepository,
{
    pub fn new(
        requests: Arc<RR>,
        listings: Arc<LR>,
        store: MatchStore<MR>,
        matcher: Matcher,
        options: EngineOptions,
    ) -> Self {
        Self {
            requests,
            listings,
            store,
            matcher,
            options,
        }
    }

    pub fn store(&self) -> &MatchStore<MR> {
        &self.store
    }

    /// Score one request synchronously: normalize, select candidates,
    /// rank, and (when `persist`) upsert every pair at or above the
    /// threshold and soft-deactivate matches that fell out of the
    /// candidate set.
    pub async fn score_request(
        &self,
        request_id: Uuid,
        persist: bool,
    ) -> Result<RankedMatches, EngineError> {
        let request = self
            .requests
            .find(request_id)
            .await
            .map_err(EngineError::Storage)?
            .ok_or(EngineError::RequestNotFound(request_id))?;

        let criteria = normalize(&request).map_err(|e| match e {
            CriteriaError::NotActive(id) => EngineError::RequestNotActive(id),
            other => EngineError::InvalidCriteria(other),
        })?;

        let candidates = self
            .listings
            .find_candidates(&criteria)
            .await
            .map_err(EngineError::CandidateFetch)?;

        tracing::debug!(%request_id, candidates = candidates.len(), "ranking candidates");

        let result = self.matcher.rank(&criteria, candidates);

        let mut persisted = 0;
        if persist {
            let feasible: HashSet<Uuid> = result.ranked.iter().map(|c| c.listing_id).collect();

            for candidate in &result.ranked {
                match self
                    .store
                    .upsert(request_id, candidate.listing_id, candidate.score())
                    .await?
                {
                    UpsertOutcome::Created | UpsertOutcome::Rescored => persisted += 1,
                    UpsertOutcome::BelowThreshold => {}
                }
            }

            self.store.deactivate_infeasible(request_id, &feasible).await?;

            // Advisory stamp for the auto-check cooldown; a failure here
            // must not fail an otherwise persisted pass.
            if let Err(e) = self.requests.mark_matched(request_id, Utc::now()).await {
                tracing::warn!(%request_id, error = %e, "failed to stamp last_matched_at");
            }
        }

        tracing::info!(
            %request_id,
            ranked = result.ranked.len(),
            persisted,
            top_score = result.ranked.first().map(|c| c.score()).unwrap_or(0.0),
            "scored request"
        );

        Ok(RankedMatches {
            request_id,
            ranked: result.ranked,
            total_candidates: result.total_candidates,
            persisted,
        })
    }

    /// Score every active request, isolating per-request failures.
    ///
    /// A failure (including a per-item timeout) is recorded in the summary
    /// and never aborts the batch; processing order is priority descending
    /// but not contractual.
    pub async fn score_all_active(
        &self,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<BatchSummary, EngineError> {
        let mut active = self
            .requests
            .find_active()
            .await
            .map_err(EngineError::Storage)?;

        active.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.last_activity_at.cmp(&a.last_activity_at))
        });

        let total = active.len();
        let mut summary = BatchSummary {
            processed: total,
            outcomes: Vec::with_capacity(total),
        };

        tracing::info!(total, "starting batch scoring pass");

        for (index, request) in active.into_iter().enumerate() {
            summary.outcomes.push(self.score_one_isolated(&request).await);

            if let Some(sink) = progress {
                sink.on_progress(index + 1, total);
            }
        }

        tracing::info!(
            processed = summary.processed,
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            total_matches = summary.total_matches(),
            "batch scoring pass finished"
        );

        Ok(summary)
    }

    async fn score_one_isolated(&self, request: &PropertyRequest) -> RequestOutcome {
        let result = match self.options.request_timeout_secs {
            Some(secs) => {
                match tokio::time::timeout(
                    Duration::from_secs(secs),
                    self.score_request(request.id, true),
                )
                .await
                {
                    Ok(inner) => inner,
                    Err(_) => Err(EngineError::Timeout {
                        request_id: request.id,
                        secs,
                    }),
                }
            }
            None => self.score_request(request.id, true).await,
        };

        match result {
            Ok(ranked) => RequestOutcome {
                request_id: request.id,
                matches: ranked.persisted,
                top_score: ranked.top_score(),
                error: None,
            },
            Err(e) => {
                tracing::warn!(request_id = %request.id, error = %e, "request skipped in batch");
                RequestOutcome {
                    request_id: request.id,
                    matches: 0,
                    top_score: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Re-enqueue stale active requests for asynchronous scoring instead
    /// of scoring them inline: requests whose last pass is older than the
    /// cooldown (or that never ran) and requests idle beyond the
    /// staleness window. At-least-once delivery is fine; upserts are
    /// idempotent.
    pub async fn auto_check(&self, queue: &dyn JobQueue) -> Result<AutoCheckSummary, EngineError> {
        let active = self
            .requests
            .find_active()
            .await
            .map_err(EngineError::Storage)?;

        let now = Utc::now();
        let cooldown = chrono::Duration::days(self.options.cooldown_days);
        let stale = chrono::Duration::hours(self.options.stale_after_hours);

        let mut enqueued = Vec::new();
        for request in &active {
            let cooled_down = request
                .last_matched_at
                .map_or(true, |at| now - at > cooldown);
            let idle = now - request.last_activity_at > stale;

            if cooled_down || idle {
                queue.enqueue(request.id).await?;
                enqueued.push(request.id);
            }
        }

        tracing::info!(scanned = active.len(), enqueued = enqueued.len(), "auto-check sweep");

        Ok(AutoCheckSummary {
            scanned: active.len(),
            enqueued,
        })
    }
}
