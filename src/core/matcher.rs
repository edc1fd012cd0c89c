use crate::core::{scoring::score_listing, selector::is_candidate};
use crate::models::{Listing, RequestCriteria, ScoredCandidate, ScoringWeights};

/// Result of ranking one request against a candidate set.
#[derive(Debug)]
pub struct RankResult {
    pub ranked: Vec<ScoredCandidate>,
    pub total_candidates: usize,
}

/// Ranks candidate listings for one request.
///
/// Filtering (cheap) happens before scoring (expensive). The returned
/// list carries every scored candidate, including sub-threshold pairs:
/// the persistence threshold belongs to the match store, so a caller can
/// inspect the full ranked list in memory.
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
    tolerance: f64,
}

impl Matcher {
    pub fn new(weights: ScoringWeights, tolerance: f64) -> Self {
        Self { weights, tolerance }
    }

    pub fn with_default_weights() -> Self {
        Self::new(ScoringWeights::default(), 0.20)
    }

    /// Filter, score and rank candidates for the given criteria.
    ///
    /// Output order is total: score descending, ties broken by listing
    /// creation date newest first, then by id.
    pub fn rank(&self, criteria: &RequestCriteria, candidates: Vec<Listing>) -> RankResult {
        let total_candidates = candidates.len();

        let mut ranked: Vec<ScoredCandidate> = candidates
            .into_iter()
            .filter(|listing| is_candidate(criteria, listing))
            .map(|listing| {
                let breakdown = score_listing(criteria, &listing, &self.weights, self.tolerance);
                ScoredCandidate {
                    listing_id: listing.id,
                    title: listing.title,
                    category: listing.category,
                    sub_category: listing.sub_category,
                    price: listing.price,
                    area: listing.area,
                    created_at: listing.created_at,
                    breakdown,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.listing_id.cmp(&b.listing_id))
        });

        RankResult {
            ranked,
            total_candidates,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}
