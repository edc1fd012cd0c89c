use thiserror::Error;
use uuid::Uuid;

use crate::models::{BoundedRange, PropertyRequest, RequestCriteria};

/// Why a request could not be normalized into comparable criteria.
#[derive(Debug, Clone, Error)]
pub enum CriteriaError {
    #[error("request {0} is not active")]
    NotActive(Uuid),

    #[error("request {request_id}: {field} range has min {min} > max {max}")]
    InvertedRange {
        request_id: Uuid,
        field: &'static str,
        min: f64,
        max: f64,
    },
}

/// Convert a raw request into comparable [`RequestCriteria`].
///
/// Fails when the request is not active or a numeric range is inverted.
/// No side effects; the request itself is never mutated.
pub fn normalize(request: &PropertyRequest) -> Result<RequestCriteria, CriteriaError> {
    if !request.is_active() {
        return Err(CriteriaError::NotActive(request.id));
    }

    let price_range = checked_range(request.id, "price", request.min_price, request.max_price)?;
    let area_range = checked_range(request.id, "area", request.min_area, request.max_area)?;

    Ok(RequestCriteria {
        request_id: request.id,
        category: request.category,
        sub_category: request.sub_category.clone(),
        price_range,
        area_range,
        currency: request.currency.clone(),
        location: request.location.clone(),
        feature_prefs: request.features.clone().into_map(),
        priority: request.priority.clamp(1, 10),
    })
}

fn checked_range(
    request_id: Uuid,
    field: &'static str,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<BoundedRange, CriteriaError> {
    let range = BoundedRange::new(min, max);
    if range.is_inverted() {
        return Err(CriteriaError::InvertedRange {
            request_id,
            field,
            min: min.unwrap_or_default(),
            max: max.unwrap_or_default(),
        });
    }
    Ok(range)
}
