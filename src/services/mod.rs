// Service exports
pub mod catalog;
pub mod engine;
pub mod memory;
pub mod queue;
pub mod repository;
pub mod store;

pub use catalog::{CatalogError, JsonCatalog};
pub use engine::{
    AutoCheckSummary, BatchSummary, EngineError, EngineOptions, MatchEngine, ProgressSink,
    RankedMatches, RequestOutcome,
};
pub use memory::MemoryStore;
pub use queue::{InProcessQueue, JobQueue, QueueError, ScoringWorker};
pub use repository::{ListingRepository, MatchRepository, RepositoryError, RequestRepository};
pub use store::{MatchStore, StoreError, UpsertOutcome};
