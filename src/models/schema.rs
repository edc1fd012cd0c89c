//! Per-category attribute schemas.
//!
//! The valid keys and value kinds of a listing's attribute bag are defined
//! here per [`Category`], replacing the source system's one-class-per-type
//! property lists with a static lookup table.

use thiserror::Error;

use crate::models::{AttributeBag, AttributeValue, Category};

/// Kind of value an attribute key accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Number,
    Bool,
    Text,
}

impl AttributeKind {
    pub fn of(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Number(_) => AttributeKind::Number,
            AttributeValue::Bool(_) => AttributeKind::Bool,
            AttributeValue::Text(_) => AttributeKind::Text,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttributeKind::Number => "number",
            AttributeKind::Bool => "bool",
            AttributeKind::Text => "text",
        }
    }
}

/// One legal key in a category's attribute bag.
#[derive(Debug, Clone, Copy)]
pub struct AttributeSpec {
    pub key: &'static str,
    pub kind: AttributeKind,
}

const fn spec(key: &'static str, kind: AttributeKind) -> AttributeSpec {
    AttributeSpec { key, kind }
}

const LAND_SCHEMA: &[AttributeSpec] = &[
    spec("ada_no", AttributeKind::Text),
    spec("parsel_no", AttributeKind::Text),
    spec("imar_durumu", AttributeKind::Text),
    spec("kaks", AttributeKind::Number),
    spec("gabari", AttributeKind::Number),
    spec("tapu_durumu", AttributeKind::Text),
];

const COMMERCIAL_SCHEMA: &[AttributeSpec] = &[
    spec("bolum_sayisi", AttributeKind::Number),
    spec("kat", AttributeKind::Number),
    spec("bina_yasi", AttributeKind::Number),
    spec("devren", AttributeKind::Bool),
    spec("asansor_var_mi", AttributeKind::Bool),
    spec("depo_var_mi", AttributeKind::Bool),
];

const RESIDENCE_SCHEMA: &[AttributeSpec] = &[
    spec("oda_sayisi", AttributeKind::Number),
    spec("banyo_sayisi", AttributeKind::Number),
    spec("kat", AttributeKind::Number),
    spec("bina_yasi", AttributeKind::Number),
    spec("balkon_var_mi", AttributeKind::Bool),
    spec("havuz_var_mi", AttributeKind::Bool),
    spec("esyali", AttributeKind::Bool),
    spec("site_icinde", AttributeKind::Bool),
    spec("isitma", AttributeKind::Text),
];

const HOSPITALITY_SCHEMA: &[AttributeSpec] = &[
    spec("oda_sayisi", AttributeKind::Number),
    spec("yatak_kapasitesi", AttributeKind::Number),
    spec("yildiz_sayisi", AttributeKind::Number),
    spec("havuz_var_mi", AttributeKind::Bool),
    spec("restoran_var_mi", AttributeKind::Bool),
    spec("ruhsat_turu", AttributeKind::Text),
];

/// Valid attribute keys and kinds for a category.
pub fn schema_for(category: Category) -> &'static [AttributeSpec] {
    match category {
        Category::Land => LAND_SCHEMA,
        Category::Commercial => COMMERCIAL_SCHEMA,
        Category::Residence => RESIDENCE_SCHEMA,
        Category::Hospitality => HOSPITALITY_SCHEMA,
    }
}

/// A bag entry that does not fit the category schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("unknown attribute key `{0}`")]
    UnknownKey(String),
    #[error("attribute `{key}` expects {expected} but holds {found}")]
    WrongKind {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Validate a bag against its category schema. Returns every violation
/// rather than stopping at the first.
pub fn validate_bag(category: Category, bag: &AttributeBag) -> Result<(), Vec<SchemaViolation>> {
    let schema = schema_for(category);
    let mut violations = Vec::new();

    for (key, value) in bag.iter() {
        match schema.iter().find(|s| s.key == key.as_str()) {
            None => violations.push(SchemaViolation::UnknownKey(key.clone())),
            Some(spec) if spec.kind != AttributeKind::of(value) => {
                violations.push(SchemaViolation::WrongKind {
                    key: key.clone(),
                    expected: spec.kind.label(),
                    found: AttributeKind::of(value).label(),
                });
            }
            Some(_) => {}
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
