use chrono::{DateTime, Utc};
use serde::Serialize;

use schoolmall_core::HeroBannerId;

/// A home page hero banner.
#[derive(Debug, Clone, Serialize)]
pub struct HeroBanner {
    pub id: HeroBannerId,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
