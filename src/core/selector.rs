use crate::models::{Listing, RequestCriteria};

/// Coarse feasibility filter applied before any scoring.
///
/// A listing is a candidate when the category matches (and the
/// sub-category, if the criteria sets one), the listing is active, and
/// every set location field equals the listing's. This predicate is also
/// the contract of `ListingRepository::find_candidates`; the matcher
/// re-applies it on whatever the repository returns.
#[inline]
pub fn is_candidate(criteria: &RequestCriteria, listing: &Listing) -> bool {
    if !listing.is_active() {
        return false;
    }

    if listing.category != criteria.category {
        return false;
    }

    if let Some(wanted) = criteria.sub_category.as_deref() {
        if listing.sub_category.as_deref() != Some(wanted) {
            return false;
        }
    }

    criteria.location.matches(&listing.location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AttributeBag, BoundedRange, Category, ListingStatus, Location, LocationFilter,
    };
    use chrono::Utc;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn criteria() -> RequestCriteria {
        RequestCriteria {
            request_id: Uuid::new_v4(),
            category: Category::Residence,
            sub_category: Some("daire".to_string()),
            price_range: BoundedRange::default(),
            area_range: BoundedRange::default(),
            currency: "TRY".to_string(),
            location: LocationFilter {
                city: Some("Istanbul".to_string()),
                district: Some("Kadikoy".to_string()),
                neighbourhood: None,
            },
            feature_prefs: BTreeMap::new(),
            priority: 5,
        }
    }

    fn listing() -> Listing {
        Listing {
            id: Uuid::new_v4(),
            title: "Moda 3+1".to_string(),
            category: Category::Residence,
            sub_category: Some("daire".to_string()),
            status: ListingStatus::Active,
            price: 500_000.0,
            currency: "TRY".to_string(),
            area: 120.0,
            location: Location {
                city: "Istanbul".to_string(),
                district: "Kadikoy".to_string(),
                neighbourhood: "Moda".to_string(),
            },
            attributes: AttributeBag::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_feasible_listing_passes() {
        assert!(is_candidate(&criteria(), &listing()));
    }

    #[test]
    fn test_category_mismatch_filtered() {
        let mut l = listing();
        l.category = Category::Land;
        assert!(!is_candidate(&criteria(), &l));
    }

    #[test]
    fn test_sub_category_mismatch_filtered() {
        let mut l = listing();
        l.sub_category = Some("villa".to_string());
        assert!(!is_candidate(&criteria(), &l));

        // Criteria without a sub-category accepts any.
        let mut c = criteria();
        c.sub_category = None;
        assert!(is_candidate(&c, &l));
    }

    #[test]
    fn test_missing_sub_category_filtered_when_required() {
        let mut l = listing();
        l.sub_category = None;
        assert!(!is_candidate(&criteria(), &l));
    }

    #[test]
    fn test_non_active_statuses_filtered() {
        for status in [ListingStatus::Reserved, ListingStatus::Sold, ListingStatus::Inactive] {
            let mut l = listing();
            l.status = status;
            assert!(!is_candidate(&criteria(), &l));
        }
    }

    #[test]
    fn test_location_constraint() {
        let mut l = listing();
        l.location.district = "Besiktas".to_string();
        assert!(!is_candidate(&criteria(), &l));

        // Unset location fields impose nothing.
        let mut c = criteria();
        c.location = LocationFilter::default();
        assert!(is_candidate(&c, &l));
    }
}
