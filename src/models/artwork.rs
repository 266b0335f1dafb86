//! Artwork model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Artwork entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    /// Opaque identifier, usually the collection's own object number
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Image path or URL
    pub image: String,
    pub technique: String,
    pub production_date: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Input for creating an artwork (seed files use this shape)
#[derive(Debug, Clone, Deserialize)]
pub struct NewArtwork {
    /// Generated when absent
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub artist: String,
    pub image: String,
    #[serde(default)]
    pub technique: String,
    #[serde(default)]
    pub production_date: String,
}

impl NewArtwork {
    pub fn into_artwork(self) -> Artwork {
        Artwork {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            title: self.title,
            artist: self.artist,
            image: self.image,
            technique: self.technique,
            production_date: self.production_date,
            created_at: Utc::now(),
        }
    }
}
