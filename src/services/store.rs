use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{MatchRecord, MatchStatus};
use crate::services::repository::{MatchRepository, RepositoryError};

/// Errors raised while persisting matches.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Both the insert and the conflict-retry update lost a race.
    #[error("persistent write conflict for pair ({request_id}, {listing_id})")]
    Conflict { request_id: Uuid, listing_id: Uuid },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No live record existed; a fresh `yeni` record was inserted.
    Created,
    /// An existing record had its score refreshed, status untouched.
    Rescored,
    /// Score under the persistence threshold and no record existed;
    /// nothing was written.
    BelowThreshold,
}

/// Persists match records with dedup-by-pair semantics.
///
/// Writes are idempotent: re-running the same scoring pass converges to
/// the same stored state. The threshold gates creation only; an already
/// persisted pair keeps its record (score refreshed) even if a later run
/// scores it lower.
pub struct MatchStore<R> {
    repo: Arc<R>,
    threshold: f64,
}

impl<R: MatchRepository> MatchStore<R> {
    pub fn new(repo: Arc<R>, threshold: f64) -> Self {
        Self { repo, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Insert or refresh the record for `(request_id, listing_id)`.
    ///
    /// An existing record is re-scored and reactivated with its status
    /// preserved; in particular a human decision (`sunuldu` and beyond)
    /// is never reverted to `yeni`. A lost insert race is retried once as
    /// an update before surfacing [`StoreError::Conflict`].
    pub async fn upsert(
        &self,
        request_id: Uuid,
        listing_id: Uuid,
        score: f64,
    ) -> Result<UpsertOutcome, StoreError> {
        if let Some(existing) = self.repo.find_pair(request_id, listing_id).await? {
            self.refresh(existing, score).await?;
            return Ok(UpsertOutcome::Rescored);
        }

        if score < self.threshold {
            return Ok(UpsertOutcome::BelowThreshold);
        }

        let now = Utc::now();
        let record = MatchRecord {
            request_id,
            listing_id,
            score,
            status: MatchStatus::Yeni,
            active: true,
            created_at: now,
            updated_at: now,
        };

        match self.repo.insert(record).await {
            Ok(()) => Ok(UpsertOutcome::Created),
            Err(RepositoryError::Conflict(_)) => {
                // A concurrent run created the pair between our read and
                // write; fold into its record instead.
                tracing::debug!(%request_id, %listing_id, "insert lost race, retrying as update");
                let existing = self
                    .repo
                    .find_pair(request_id, listing_id)
                    .await?
                    .ok_or(StoreError::Conflict {
                        request_id,
                        listing_id,
                    })?;
                self.refresh(existing, score).await?;
                Ok(UpsertOutcome::Rescored)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn refresh(&self, mut record: MatchRecord, score: f64) -> Result<(), StoreError> {
        record.score = score;
        record.active = true;
        record.updated_at = Utc::now();
        self.repo.update(record).await?;
        Ok(())
    }

    /// Soft-deactivate live matches whose listing left the candidate set.
    /// Returns how many records were deactivated.
    pub async fn deactivate_infeasible(
        &self,
        request_id: Uuid,
        feasible: &HashSet<Uuid>,
    ) -> Result<usize, StoreError> {
        let mut deactivated = 0;

        for mut record in self.repo.find_for_request(request_id).await? {
            if record.active && !feasible.contains(&record.listing_id) {
                record.active = false;
                record.updated_at = Utc::now();
                self.repo.update(record).await?;
                deactivated += 1;
            }
        }

        if deactivated > 0 {
            tracing::info!(%request_id, deactivated, "deactivated infeasible matches");
        }

        Ok(deactivated)
    }
}
