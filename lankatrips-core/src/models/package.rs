use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::FieldError;
use crate::models::location::{Location, LocationSummary};
use crate::models::{split_commas, split_lines};

/// Package model mapping to the `packages` table.
///
/// `location_refs` are weak references: deleting a location leaves the
/// reference in place and it simply stops resolving.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: Uuid,
    pub title: String,

    /// Non-negative currency amount
    pub price: Decimal,

    pub duration_days: i32,

    /// Adventure, Beach, Culture, ...
    pub category: String,

    pub region: String,

    /// Ordered weak references into `locations`
    pub location_refs: Vec<Uuid>,

    /// Day-by-day free-text lines
    pub itinerary: Vec<String>,

    pub includes: Vec<String>,
    pub excludes: Vec<String>,

    /// Ordered image URLs
    pub images: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin request to create a package.
///
/// `locationRefs` arrives as comma-separated ids; `itinerary`, `includes`
/// and `excludes` arrive as newline-separated text areas.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackage {
    pub title: String,
    pub price: Decimal,
    pub duration_days: i32,
    pub category: String,
    pub region: String,
    pub location_refs: Option<String>,
    pub itinerary: Option<String>,
    pub includes: Option<String>,
    pub excludes: Option<String>,
    pub images: Option<Vec<String>>,
}

impl CreatePackage {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.title.trim().len() < 5 {
            errors.push(FieldError::new(
                "body.title",
                "Title must be at least 5 characters",
            ));
        }
        if self.price < Decimal::ZERO {
            errors.push(FieldError::new("body.price", "Price must be positive"));
        }
        if self.duration_days < 1 {
            errors.push(FieldError::new(
                "body.durationDays",
                "Duration must be at least 1 day",
            ));
        }
        if self.category.trim().len() < 2 {
            errors.push(FieldError::new("body.category", "Category is required"));
        }
        if self.region.trim().len() < 2 {
            errors.push(FieldError::new("body.region", "Region is required"));
        }
        if let Some(refs) = &self.location_refs {
            if parse_location_refs(refs).is_err() {
                errors.push(FieldError::new(
                    "body.locationRefs",
                    "Location references must be valid ids",
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn location_ref_list(&self) -> Vec<Uuid> {
        self.location_refs
            .as_deref()
            .and_then(|refs| parse_location_refs(refs).ok())
            .unwrap_or_default()
    }

    pub fn itinerary_list(&self) -> Vec<String> {
        self.itinerary.as_deref().map(split_lines).unwrap_or_default()
    }

    pub fn includes_list(&self) -> Vec<String> {
        self.includes.as_deref().map(split_lines).unwrap_or_default()
    }

    pub fn excludes_list(&self) -> Vec<String> {
        self.excludes.as_deref().map(split_lines).unwrap_or_default()
    }
}

/// Admin request to update a package. Unspecified fields stay unchanged;
/// newly supplied images are appended to the existing list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePackage {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub duration_days: Option<i32>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub location_refs: Option<String>,
    pub itinerary: Option<String>,
    pub includes: Option<String>,
    pub excludes: Option<String>,
    pub images: Option<Vec<String>>,
}

impl UpdatePackage {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(title) = &self.title {
            if title.trim().len() < 5 {
                errors.push(FieldError::new(
                    "body.title",
                    "Title must be at least 5 characters",
                ));
            }
        }
        if let Some(price) = self.price {
            if price < Decimal::ZERO {
                errors.push(FieldError::new("body.price", "Price must be positive"));
            }
        }
        if let Some(duration_days) = self.duration_days {
            if duration_days < 1 {
                errors.push(FieldError::new(
                    "body.durationDays",
                    "Duration must be at least 1 day",
                ));
            }
        }
        if let Some(category) = &self.category {
            if category.trim().len() < 2 {
                errors.push(FieldError::new("body.category", "Category is required"));
            }
        }
        if let Some(region) = &self.region {
            if region.trim().len() < 2 {
                errors.push(FieldError::new("body.region", "Region is required"));
            }
        }
        if let Some(refs) = &self.location_refs {
            if parse_location_refs(refs).is_err() {
                errors.push(FieldError::new(
                    "body.locationRefs",
                    "Location references must be valid ids",
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Parse a comma-separated list of location ids.
pub fn parse_location_refs(input: &str) -> Result<Vec<Uuid>, uuid::Error> {
    split_commas(input)
        .iter()
        .map(|s| Uuid::parse_str(s))
        .collect()
}

/// Package as returned by the list endpoint: references resolved to
/// (id, name, region) summaries only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageListItem {
    #[serde(flatten)]
    pub package: Package,
    pub locations: Vec<LocationSummary>,
}

/// Package as returned by the single-item endpoint: references fully
/// resolved. Stale references are silently dropped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDetail {
    #[serde(flatten)]
    pub package: Package,
    pub locations: Vec<Location>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_create() -> CreatePackage {
        CreatePackage {
            title: "Southern Coast Escape".to_string(),
            price: Decimal::new(45000, 2),
            duration_days: 4,
            category: "Beach".to_string(),
            region: "Southern".to_string(),
            location_refs: None,
            itinerary: Some("Day 1: Arrival\nDay 2: Whale watching".to_string()),
            includes: Some("Breakfast\nTransport".to_string()),
            excludes: None,
            images: None,
        }
    }

    #[test]
    fn create_splits_text_areas_into_lines() {
        let req = base_create();
        assert_eq!(
            req.itinerary_list(),
            vec!["Day 1: Arrival", "Day 2: Whale watching"]
        );
        assert_eq!(req.includes_list(), vec!["Breakfast", "Transport"]);
        assert!(req.excludes_list().is_empty());
    }

    #[test]
    fn create_rejects_negative_price_and_zero_duration() {
        let mut req = base_create();
        req.price = Decimal::new(-1, 0);
        req.duration_days = 0;
        let errors = req.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.path == "body.price"));
        assert!(errors.iter().any(|e| e.path == "body.durationDays"));
    }

    #[test]
    fn location_refs_parse_or_flag_invalid() {
        let id = Uuid::new_v4();
        let mut req = base_create();
        req.location_refs = Some(format!(" {id} , "));
        assert!(req.validate().is_ok());
        assert_eq!(req.location_ref_list(), vec![id]);

        req.location_refs = Some("not-an-id".to_string());
        let errors = req.validate().unwrap_err();
        assert_eq!(errors[0].path, "body.locationRefs");
    }
}
