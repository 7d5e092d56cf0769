//! Menu Profile Model

use serde::{Deserialize, Serialize};

/// Menu appearance settings (singleton row)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Profile {
    pub id: i64,
    /// Business name shown on the public menu header
    #[serde(default)]
    pub business_name: String,
    pub instagram_url: Option<String>,
    /// Cover image object key in the storage bucket
    pub cover_image_url: Option<String>,
    pub updated_at: Option<i64>,
}

/// Update profile payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfileUpdate {
    pub business_name: Option<String>,
    pub instagram_url: Option<String>,
    pub cover_image_url: Option<String>,
}
