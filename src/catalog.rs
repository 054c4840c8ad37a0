//! # Metadata Catalog
//!
//! Read-only view of a music metadata catalog. The classification
//! strategies only ever talk to a [`MetadataCatalog`], which keeps them
//! independent of the concrete web service and lets tests use canned data.
//!
//! The entity types mirror the MusicBrainz JSON schema closely enough to be
//! deserialized from it directly.

use serde::Deserialize;
use thiserror::Error;

/// Errors reported by a catalog query.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("network error: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),
}

/// One entry of an artist credit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ArtistCredit {
    /// Credited name, which may differ from the artist's canonical name
    pub name: String,
    /// Text joining this credit to the next one, e.g. `" & "`
    #[serde(default)]
    pub joinphrase: String,
}

/// Release group summary attached to a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReleaseGroup {
    #[serde(rename = "type", default)]
    pub legacy_type: Option<String>,
    #[serde(rename = "primary-type", default)]
    pub primary_type: Option<String>,
    #[serde(rename = "secondary-types", default)]
    pub secondary_types: Vec<String>,
}

impl ReleaseGroup {
    /// Single type label in the catalog's legacy convention.
    ///
    /// Secondary types ("Live", "Compilation") win over the primary type
    /// ("Album", "Single").
    pub fn group_type(&self) -> &str {
        self.legacy_type
            .as_deref()
            .or_else(|| self.secondary_types.first().map(String::as_str))
            .or(self.primary_type.as_deref())
            .unwrap_or("")
    }
}

/// A recording (a distinct audio performance).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Recording {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub disambiguation: Option<String>,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<ArtistCredit>,
}

impl Recording {
    /// Non-empty disambiguation annotation, if any.
    pub fn annotation(&self) -> Option<&str> {
        self.disambiguation.as_deref().filter(|d| !d.is_empty())
    }
}

/// A release (a concrete album, single or EP issue).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<ArtistCredit>,
    #[serde(rename = "release-group", default)]
    pub release_group: ReleaseGroup,
}

impl Release {
    pub fn group_type(&self) -> &str {
        self.release_group.group_type()
    }
}

/// Name of the first credited artist, or `""` if uncredited.
pub fn lead_artist(credits: &[ArtistCredit]) -> &str {
    credits.first().map(|c| c.name.as_str()).unwrap_or("")
}

/// Full credit as displayed, e.g. `"Simon & Garfunkel"`.
pub fn credit_phrase(credits: &[ArtistCredit]) -> String {
    credits
        .iter()
        .map(|c| format!("{}{}", c.name, c.joinphrase))
        .collect()
}

/// Read-only metadata lookups used by the classification strategies.
///
/// Implementations return an empty list for searches without hits and
/// reserve errors for failed or rejected queries.
pub trait MetadataCatalog {
    /// All recordings sharing an ISRC.
    fn recordings_by_isrc(&self, isrc: &str) -> Result<Vec<Recording>, CatalogError>;

    /// Free-text release search by artist and release title.
    fn search_releases(&self, artist: &str, release: &str) -> Result<Vec<Release>, CatalogError>;

    /// Free-text recording search by artist and recording title.
    fn search_recordings(&self, artist: &str, recording: &str) -> Result<Vec<Recording>, CatalogError>;
}
