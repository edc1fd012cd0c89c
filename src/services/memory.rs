use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::selector::is_candidate;
use crate::models::{Listing, MatchRecord, PropertyRequest, RequestCriteria};
use crate::services::repository::{
    ListingRepository, MatchRepository, RepositoryError, RequestRepository,
};

/// In-memory implementation of the three repositories.
///
/// Backs the integration tests and the JSON file catalog. The match table
/// is keyed by the `(request, listing)` pair, which makes the insert an
/// atomic check-and-set with the uniqueness guarantee the engine's upsert
/// contract requires.
#[derive(Debug, Default)]
pub struct MemoryStore {
    requests: RwLock<BTreeMap<Uuid, PropertyRequest>>,
    listings: RwLock<BTreeMap<Uuid, Listing>>,
    matches: RwLock<BTreeMap<(Uuid, Uuid), MatchRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_request(&self, request: PropertyRequest) {
        self.requests.write().await.insert(request.id, request);
    }

    pub async fn put_listing(&self, listing: Listing) {
        self.listings.write().await.insert(listing.id, listing);
    }

    /// Seed a match record directly, bypassing upsert semantics.
    pub async fn put_match(&self, record: MatchRecord) {
        self.matches.write().await.insert(record.pair(), record);
    }

    pub async fn requests_snapshot(&self) -> Vec<PropertyRequest> {
        self.requests.read().await.values().cloned().collect()
    }

    pub async fn listings_snapshot(&self) -> Vec<Listing> {
        self.listings.read().await.values().cloned().collect()
    }

    pub async fn matches_snapshot(&self) -> Vec<MatchRecord> {
        self.matches.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl RequestRepository for MemoryStore {
    async fn find(&self, id: Uuid) -> Result<Option<PropertyRequest>, RepositoryError> {
        Ok(self.requests.read().await.get(&id).cloned())
    }

    async fn find_active(&self) -> Result<Vec<PropertyRequest>, RepositoryError> {
        Ok(self
            .requests
            .read()
            .await
            .values()
            .filter(|r| r.is_active())
            .cloned()
            .collect())
    }

    async fn mark_matched(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut requests = self.requests.write().await;
        let request = requests
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("request {id}")))?;
        request.last_matched_at = Some(at);
        Ok(())
    }
}

#[async_trait]
impl ListingRepository for MemoryStore {
    async fn find_candidates(
        &self,
        criteria: &RequestCriteria,
    ) -> Result<Vec<Listing>, RepositoryError> {
        Ok(self
            .listings
            .read()
            .await
            .values()
            .filter(|l| is_candidate(criteria, l))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MatchRepository for MemoryStore {
    async fn find_pair(
        &self,
        request_id: Uuid,
        listing_id: Uuid,
    ) -> Result<Option<MatchRecord>, RepositoryError> {
        Ok(self
            .matches
            .read()
            .await
            .get(&(request_id, listing_id))
            .cloned())
    }

    async fn find_for_request(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<MatchRecord>, RepositoryError> {
        Ok(self
            .matches
            .read()
            .await
            .values()
            .filter(|m| m.request_id == request_id)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<MatchRecord>, RepositoryError> {
        Ok(self.matches.read().await.values().cloned().collect())
    }

    async fn insert(&self, record: MatchRecord) -> Result<(), RepositoryError> {
        let mut matches = self.matches.write().await;
        let key = record.pair();
        if matches.contains_key(&key) {
            return Err(RepositoryError::Conflict(format!(
                "match ({}, {})",
                key.0, key.1
            )));
        }
        matches.insert(key, record);
        Ok(())
    }

    async fn update(&self, record: MatchRecord) -> Result<(), RepositoryError> {
        let mut matches = self.matches.write().await;
        let key = record.pair();
        match matches.get_mut(&key) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound(format!(
                "match ({}, {})",
                key.0, key.1
            ))),
        }
    }
}
