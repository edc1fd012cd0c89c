use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::models::{validate_bag, Listing, MatchRecord, PropertyRequest};
use crate::services::memory::MemoryStore;

const REQUESTS_FILE: &str = "requests.json";
const LISTINGS_FILE: &str = "listings.json";
const MATCHES_FILE: &str = "matches.json";

/// Errors loading or flushing the file catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse {file}: {source}")]
    Parse {
        file: String,
        source: serde_json::Error,
    },
}

/// JSON-file-backed catalog for the CLI driver.
///
/// Loads `requests.json`, `listings.json` and `matches.json` from a data
/// directory into a [`MemoryStore`] and flushes engine-owned state back
/// after a run. This is a stand-in for the external persistence
/// collaborators; the engine itself only ever sees the repository
/// traits.
pub struct JsonCatalog {
    dir: PathBuf,
    store: Arc<MemoryStore>,
}

impl JsonCatalog {
    /// Load the catalog from `dir`. Request and listing files are
    /// required; a missing match file means no prior scoring pass.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let dir = dir.into();

        let requests: Vec<PropertyRequest> = read_json(&dir.join(REQUESTS_FILE)).await?;
        let listings: Vec<Listing> = read_json(&dir.join(LISTINGS_FILE)).await?;
        let matches: Vec<MatchRecord> = match read_json(&dir.join(MATCHES_FILE)).await {
            Ok(records) => records,
            Err(CatalogError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };

        tracing::info!(
            requests = requests.len(),
            listings = listings.len(),
            matches = matches.len(),
            dir = %dir.display(),
            "catalog loaded"
        );

        let store = Arc::new(MemoryStore::new());
        for request in requests {
            store.put_request(request).await;
        }
        for listing in listings {
            // Malformed attribute bags are surfaced but not fatal; the
            // scorer penalizes what it cannot evaluate.
            if let Err(violations) = validate_bag(listing.category, &listing.attributes) {
                for violation in &violations {
                    tracing::warn!(
                        listing_id = %listing.id,
                        category = %listing.category,
                        %violation,
                        "listing attribute schema violation"
                    );
                }
            }
            store.put_listing(listing).await;
        }
        for record in matches {
            store.put_match(record).await;
        }

        Ok(Self { dir, store })
    }

    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }

    /// Write engine-owned state back to disk: the match table, and the
    /// requests file for the `last_matched_at` stamps.
    pub async fn flush(&self) -> Result<(), CatalogError> {
        let matches = self.store.matches_snapshot().await;
        write_json(&self.dir.join(MATCHES_FILE), &matches).await?;

        let requests = self.store.requests_snapshot().await;
        write_json(&self.dir.join(REQUESTS_FILE), &requests).await?;

        tracing::debug!(matches = matches.len(), "catalog flushed");
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let raw = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
        file: path.display().to_string(),
        source,
    })
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), CatalogError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| CatalogError::Parse {
        file: path.display().to_string(),
        source,
    })?;
    tokio::fs::write(path, json).await?;
    Ok(())
}
