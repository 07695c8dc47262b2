//! Venue entity model and DTOs.

use boxoffice_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A venue row from the `venues` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Venue {
    pub id: DbId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub capacity: i32,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a venue.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVenue {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1, max = 255))]
    pub city: String,
    #[validate(range(min = 1))]
    pub capacity: i32,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// DTO for updating a venue. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateVenue {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub city: Option<String>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}
