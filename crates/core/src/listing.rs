use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single job listing fetched from the remote source.
///
/// This is also the persisted snapshot record, so the serde shape doubles as
/// the store file schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Opaque source-assigned identifier, stable across fetches.
    /// The sole deduplication key.
    pub id: String,
    /// Raw title as returned by the source; may carry `H^`/`^H`
    /// highlight markers.
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub skills: Vec<Skill>,
    pub pricing: Pricing,
    /// Opaque token appended to the title slug to form the apply link.
    pub listing_ref: String,
    /// Publication timestamp, when the source provides one.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub label: String,
}

/// How a listing is paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Pricing {
    Hourly { min: f64, max: Option<f64> },
    Fixed,
}
