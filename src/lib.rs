//! emlak-match - Property matching engine for the Emlak CRM
//!
//! Matches customer property requests against the listing catalog and
//! maintains ranked, deduplicated match records. The pipeline is
//! normalize -> select candidates -> score -> persist, with batch and
//! queued execution on top of the same single-request path.

pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use core::{aggregate, normalize, score_listing, MatchStatistics, Matcher};
pub use models::{
    AttributeBag, AttributeValue, Category, Listing, MatchRecord, MatchStatus, PropertyRequest,
    RequestCriteria, ScoreBreakdown, ScoredCandidate, ScoringWeights,
};
pub use services::{BatchSummary, EngineError, MatchEngine, MatchStore, RankedMatches};
