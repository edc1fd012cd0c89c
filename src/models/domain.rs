use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Property category. Each category carries its own attribute schema,
/// looked up through [`crate::models::schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Land,
    Commercial,
    Residence,
    Hospitality,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Land => "land",
            Category::Commercial => "commercial",
            Category::Residence => "residence",
            Category::Hospitality => "hospitality",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle of a customer request. Only `Active` requests are matchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Draft,
    Active,
    Paused,
    Fulfilled,
    Cancelled,
}

/// Lifecycle of a listing. Only `Active` listings participate in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Reserved,
    Sold,
    Inactive,
}

/// Match lifecycle. `Yeni` is the only legal creation state; the
/// presented-and-beyond states record a human decision the engine must
/// never revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Yeni,
    Incelendi,
    Sunuldu,
    KabulEdildi,
    Reddedildi,
}

impl MatchStatus {
    /// True once the match has been presented to the customer.
    pub fn is_decided(&self) -> bool {
        matches!(
            self,
            MatchStatus::Sunuldu | MatchStatus::KabulEdildi | MatchStatus::Reddedildi
        )
    }
}

/// A single typed value inside an [`AttributeBag`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

/// Category-specific key/value properties of a listing, and the free-form
/// feature preferences of a request. Keys are validated against the
/// category schema; values are a small tagged union instead of the source
/// system's untyped dynamic rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeBag(BTreeMap<String, AttributeValue>);

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style insert, convenient for seeding and tests.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<String, AttributeValue> {
        self.0
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeBag {
    fn from_iter<T: IntoIterator<Item = (String, AttributeValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Fully resolved location of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub district: String,
    pub neighbourhood: String,
}

/// Location constraint of a request. Unset fields impose no constraint;
/// a set finer field implies the set coarser fields must match too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFilter {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub neighbourhood: Option<String>,
}

impl LocationFilter {
    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.district.is_none() && self.neighbourhood.is_none()
    }

    /// True when every set field equals the listing's counterpart.
    pub fn matches(&self, location: &Location) -> bool {
        self.city.as_deref().map_or(true, |c| c == location.city)
            && self
                .district
                .as_deref()
                .map_or(true, |d| d == location.district)
            && self
                .neighbourhood
                .as_deref()
                .map_or(true, |n| n == location.neighbourhood)
    }
}

/// Numeric interval with optional bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundedRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl BoundedRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Both bounds present and crossed.
    pub fn is_inverted(&self) -> bool {
        matches!((self.min, self.max), (Some(lo), Some(hi)) if lo > hi)
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |lo| value >= lo) && self.max.map_or(true, |hi| value <= hi)
    }
}

/// A customer's stated property demand. Owned by the CRM; the engine only
/// reads it, apart from stamping `last_matched_at` after a persisted pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRequest {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub status: RequestStatus,
    pub category: Category,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    pub currency: String,
    #[serde(default)]
    pub min_area: Option<f64>,
    #[serde(default)]
    pub max_area: Option<f64>,
    #[serde(default)]
    pub location: LocationFilter,
    #[serde(default)]
    pub features: AttributeBag,
    pub priority: u8,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    #[serde(default)]
    pub last_matched_at: Option<DateTime<Utc>>,
}

impl PropertyRequest {
    pub fn is_active(&self) -> bool {
        self.status == RequestStatus::Active
    }
}

/// A property record available for matching. Owned by the portfolio
/// subsystem; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub category: Category,
    #[serde(default)]
    pub sub_category: Option<String>,
    pub status: ListingStatus,
    pub price: f64,
    pub currency: String,
    pub area: f64,
    pub location: Location,
    #[serde(default)]
    pub attributes: AttributeBag,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }
}

/// Normalized, comparable form of a request, produced by
/// [`crate::core::criteria::normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct RequestCriteria {
    pub request_id: Uuid,
    pub category: Category,
    pub sub_category: Option<String>,
    pub price_range: BoundedRange,
    pub area_range: BoundedRange,
    pub currency: String,
    pub location: LocationFilter,
    pub feature_prefs: BTreeMap<String, AttributeValue>,
    pub priority: u8,
}

/// Persisted match record, exclusively owned by the engine. At most one
/// record exists per `(request_id, listing_id)` pair; removal is the
/// `active` flag, never a delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub request_id: Uuid,
    pub listing_id: Uuid,
    pub score: f64,
    pub status: MatchStatus,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn pair(&self) -> (Uuid, Uuid) {
        (self.request_id, self.listing_id)
    }
}

/// Per-criterion sub-scores plus the weighted total, all in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub price: f64,
    pub area: f64,
    pub location: f64,
    pub sub_category: f64,
    pub features: f64,
    pub total: f64,
}

/// One ranked entry in a scoring result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub listing_id: Uuid,
    pub title: String,
    pub category: Category,
    pub sub_category: Option<String>,
    pub price: f64,
    pub area: f64,
    pub created_at: DateTime<Utc>,
    pub breakdown: ScoreBreakdown,
}

impl ScoredCandidate {
    pub fn score(&self) -> f64 {
        self.breakdown.total
    }
}

/// Relative weight of each scoring criterion. Kept summing to 1 so totals
/// stay in [0, 1]; the scoring engine clamps regardless.
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub price: f64,
    pub area: f64,
    pub location: f64,
    pub sub_category: f64,
    pub features: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            price: 0.30,
            area: 0.25,
            location: 0.20,
            sub_category: 0.10,
            features: 0.15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_range_contains() {
        let range = BoundedRange::new(Some(100.0), Some(200.0));
        assert!(range.contains(100.0));
        assert!(range.contains(150.0));
        assert!(range.contains(200.0));
        assert!(!range.contains(99.9));
        assert!(!range.contains(200.1));

        let open_low = BoundedRange::new(None, Some(200.0));
        assert!(open_low.contains(-5.0));
        assert!(!open_low.contains(201.0));

        assert!(BoundedRange::default().contains(1e12));
    }

    #[test]
    fn test_bounded_range_inverted() {
        assert!(BoundedRange::new(Some(5.0), Some(1.0)).is_inverted());
        assert!(!BoundedRange::new(Some(1.0), Some(5.0)).is_inverted());
        assert!(!BoundedRange::new(Some(5.0), None).is_inverted());
    }

    #[test]
    fn test_location_filter_matching() {
        let loc = Location {
            city: "Istanbul".to_string(),
            district: "Kadikoy".to_string(),
            neighbourhood: "Moda".to_string(),
        };

        let mut filter = LocationFilter::default();
        assert!(filter.matches(&loc));

        filter.city = Some("Istanbul".to_string());
        assert!(filter.matches(&loc));

        filter.neighbourhood = Some("Fenerbahce".to_string());
        assert!(!filter.matches(&loc));
    }

    #[test]
    fn test_attribute_value_untagged_serde() {
        let bag = AttributeBag::new()
            .with("oda_sayisi", 3.0)
            .with("havuz_var_mi", true)
            .with("imar_durumu", "konut");

        let json = serde_json::to_string(&bag).unwrap();
        let back: AttributeBag = serde_json::from_str(&json).unwrap();
        assert_eq!(bag, back);
        assert_eq!(back.get("oda_sayisi").and_then(|v| v.as_number()), Some(3.0));
        assert_eq!(back.get("havuz_var_mi").and_then(|v| v.as_bool()), Some(true));
        assert_eq!(back.get("imar_durumu").and_then(|v| v.as_text()), Some("konut"));
    }

    #[test]
    fn test_match_status_decided() {
        assert!(!MatchStatus::Yeni.is_decided());
        assert!(!MatchStatus::Incelendi.is_decided());
        assert!(MatchStatus::Sunuldu.is_decided());
        assert!(MatchStatus::KabulEdildi.is_decided());
        assert!(MatchStatus::Reddedildi.is_decided());
    }
}
