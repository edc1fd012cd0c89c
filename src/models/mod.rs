// Model exports
pub mod domain;
pub mod schema;

pub use domain::{
    AttributeBag, AttributeValue, BoundedRange, Category, Listing, ListingStatus, Location,
    LocationFilter, MatchRecord, MatchStatus, PropertyRequest, RequestCriteria, RequestStatus,
    ScoreBreakdown, ScoredCandidate, ScoringWeights,
};
pub use schema::{schema_for, validate_bag, AttributeKind, AttributeSpec, SchemaViolation};
