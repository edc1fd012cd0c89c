use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Listing, MatchRecord, PropertyRequest, RequestCriteria};

/// Errors surfaced by the persistence collaborators.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("conflicting write: {0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Read access to customer requests. The engine only writes the
/// `last_matched_at` stamp through [`mark_matched`].
///
/// [`mark_matched`]: RequestRepository::mark_matched
#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<PropertyRequest>, RepositoryError>;

    async fn find_active(&self) -> Result<Vec<PropertyRequest>, RepositoryError>;

    /// Record when a request last went through a persisted scoring pass.
    async fn mark_matched(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError>;
}

/// Read access to the listing catalog.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Listings passing the coarse candidate filter for the criteria:
    /// category (and sub-category when set), active status, and every set
    /// location field. See [`crate::core::selector::is_candidate`].
    async fn find_candidates(
        &self,
        criteria: &RequestCriteria,
    ) -> Result<Vec<Listing>, RepositoryError>;
}

/// The match table, the only resource the engine mutates. Implementations
/// must enforce uniqueness of the `(request_id, listing_id)` pair so
/// concurrent runs targeting the same pair cannot produce duplicate rows.
#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn find_pair(
        &self,
        request_id: Uuid,
        listing_id: Uuid,
    ) -> Result<Option<MatchRecord>, RepositoryError>;

    async fn find_for_request(&self, request_id: Uuid)
        -> Result<Vec<MatchRecord>, RepositoryError>;

    async fn find_all(&self) -> Result<Vec<MatchRecord>, RepositoryError>;

    /// Insert a new record. Fails with [`RepositoryError::Conflict`] when
    /// the pair already exists.
    async fn insert(&self, record: MatchRecord) -> Result<(), RepositoryError>;

    /// Overwrite the record for an existing pair. Fails with
    /// [`RepositoryError::NotFound`] when the pair is absent.
    async fn update(&self, record: MatchRecord) -> Result<(), RepositoryError>;
}
