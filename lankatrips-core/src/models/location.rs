use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::FieldError;
use crate::models::split_commas;

/// Location model mapping to the `locations` table.
///
/// Locations are points of interest referenced (never owned) by packages.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    pub name: String,

    /// Free-text region, e.g. Southern, Central
    pub region: String,

    pub description: String,

    /// Ordered image URLs
    pub images: Vec<String>,

    /// Optional external map link
    pub map_url: Option<String>,

    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin request to create a location.
///
/// `tags` arrives as comma-separated text and is parsed into an ordered list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocation {
    pub name: String,
    pub region: String,
    pub description: String,
    pub map_url: Option<String>,
    pub tags: Option<String>,
    pub images: Option<Vec<String>>,
}

impl CreateLocation {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.name.trim().len() < 2 {
            errors.push(FieldError::new(
                "body.name",
                "Name must be at least 2 characters",
            ));
        }
        if self.region.trim().len() < 2 {
            errors.push(FieldError::new("body.region", "Region is required"));
        }
        if self.description.trim().len() < 10 {
            errors.push(FieldError::new(
                "body.description",
                "Description must be at least 10 characters",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn tag_list(&self) -> Vec<String> {
        self.tags.as_deref().map(split_commas).unwrap_or_default()
    }
}

/// Admin request to update a location. Unspecified fields stay unchanged;
/// newly supplied images are appended to the existing list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocation {
    pub name: Option<String>,
    pub region: Option<String>,
    pub description: Option<String>,
    pub map_url: Option<String>,
    pub tags: Option<String>,
    pub images: Option<Vec<String>>,
}

impl UpdateLocation {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            if name.trim().len() < 2 {
                errors.push(FieldError::new(
                    "body.name",
                    "Name must be at least 2 characters",
                ));
            }
        }
        if let Some(region) = &self.region {
            if region.trim().len() < 2 {
                errors.push(FieldError::new("body.region", "Region is required"));
            }
        }
        if let Some(description) = &self.description {
            if description.trim().len() < 10 {
                errors.push(FieldError::new(
                    "body.description",
                    "Description must be at least 10 characters",
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

/// Slim projection used when resolving a package's location references
/// on list endpoints.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub id: Uuid,
    pub name: String,
    pub region: String,
}
