use crate::models::{
    AttributeBag, AttributeValue, BoundedRange, Listing, LocationFilter, RequestCriteria,
    ScoreBreakdown, ScoringWeights,
};
use std::collections::BTreeMap;

/// Relative window for a numeric feature preference to count as matched.
const FEATURE_NUMERIC_WINDOW: f64 = 0.10;

/// Score one listing against normalized criteria.
///
/// Weighted sum of five independent sub-scores, each in [0, 1]:
///
/// total = price_fit    * weights.price
///       + area_fit     * weights.area
///       + location     * weights.location
///       + sub_category * weights.sub_category
///       + features     * weights.features
///
/// `tolerance` is the width of the linear-decay band beyond a price/area
/// bound, as a fraction of that bound. A listing that cannot be evaluated
/// on a dimension scores 0 on it, never skips it. Pure and deterministic;
/// persistence is not this function's business.
pub fn score_listing(
    criteria: &RequestCriteria,
    listing: &Listing,
    weights: &ScoringWeights,
    tolerance: f64,
) -> ScoreBreakdown {
    let price = range_fit_score(listing.price, &criteria.price_range, tolerance);
    let area = range_fit_score(listing.area, &criteria.area_range, tolerance);
    let location = location_score(&criteria.location, listing);
    let sub_category = sub_category_score(
        criteria.sub_category.as_deref(),
        listing.sub_category.as_deref(),
    );
    let features = feature_score(&criteria.feature_prefs, &listing.attributes);

    let total = (price * weights.price
        + area * weights.area
        + location * weights.location
        + sub_category * weights.sub_category
        + features * weights.features)
        .clamp(0.0, 1.0);

    ScoreBreakdown {
        price,
        area,
        location,
        sub_category,
        features,
        total,
    }
}

/// Fit of a value against an optional-bounded range.
///
/// 1.0 inside the range, linear decay to 0 across `tolerance * bound`
/// beyond the nearest bound, 0 past the band. Unset bounds impose no
/// constraint; an unevaluable value scores 0.
#[inline]
pub fn range_fit_score(value: f64, range: &BoundedRange, tolerance: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        return 0.0;
    }

    if range.contains(value) {
        return 1.0;
    }

    // Outside the range: decay against whichever bound was crossed.
    let (bound, distance) = match (range.min, range.max) {
        (Some(lo), _) if value < lo => (lo, lo - value),
        (_, Some(hi)) if value > hi => (hi, value - hi),
        _ => return 1.0,
    };

    let band = bound.abs() * tolerance;
    if band <= 0.0 || distance >= band {
        return 0.0;
    }

    1.0 - distance / band
}

/// Location sub-score ladder: 1.0 full match on every set field, 0.5 when
/// the set city matches but a set finer field mismatches, 0 otherwise.
#[inline]
pub fn location_score(filter: &LocationFilter, listing: &Listing) -> f64 {
    if filter.matches(&listing.location) {
        return 1.0;
    }

    match filter.city.as_deref() {
        Some(city) if city == listing.location.city => 0.5,
        _ => 0.0,
    }
}

/// Sub-category sub-score: exact 1.0, unspecified 0.5, mismatch 0.
#[inline]
pub fn sub_category_score(wanted: Option<&str>, actual: Option<&str>) -> f64 {
    match wanted {
        None => 0.5,
        Some(w) if actual == Some(w) => 1.0,
        Some(_) => 0.0,
    }
}

/// Share of requested features the listing satisfies.
///
/// Booleans and text must be equal; numbers count within a relative
/// window. A request without feature preferences scores 1.0.
#[inline]
pub fn feature_score(prefs: &BTreeMap<String, AttributeValue>, attributes: &AttributeBag) -> f64 {
    if prefs.is_empty() {
        return 1.0;
    }

    let matched = prefs
        .iter()
        .filter(|(key, wanted)| {
            attributes
                .get(key)
                .map_or(false, |actual| feature_matches(wanted, actual))
        })
        .count();

    matched as f64 / prefs.len() as f64
}

#[inline]
fn feature_matches(wanted: &AttributeValue, actual: &AttributeValue) -> bool {
    match (wanted, actual) {
        (AttributeValue::Bool(w), AttributeValue::Bool(a)) => w == a,
        (AttributeValue::Text(w), AttributeValue::Text(a)) => w == a,
        (AttributeValue::Number(w), AttributeValue::Number(a)) => {
            if *w == 0.0 {
                *a == 0.0
            } else {
                (a - w).abs() <= w.abs() * FEATURE_NUMERIC_WINDOW
            }
        }
        _ => false,
    }
}
