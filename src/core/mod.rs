// Core algorithm exports
pub mod criteria;
pub mod matcher;
pub mod scoring;
pub mod selector;
pub mod stats;

pub use criteria::{normalize, CriteriaError};
pub use matcher::{Matcher, RankResult};
pub use scoring::{feature_score, location_score, range_fit_score, score_listing, sub_category_score};
pub use selector::is_candidate;
pub use stats::{aggregate, MatchStatistics};
