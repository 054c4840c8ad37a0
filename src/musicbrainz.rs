//! # MusicBrainz Client
//!
//! Blocking [`MetadataCatalog`] backed by the MusicBrainz JSON web service.
//!
//! MusicBrainz asks clients to identify themselves with a contact address
//! and to stay at or below one request per second; both are handled here.
//! A skipper cycle makes at most three catalog requests, so the limiter
//! rarely has to wait.

use crate::catalog::{CatalogError, MetadataCatalog, Recording, Release};
use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

const MUSICBRAINZ_BASE_URL: &str = "https://musicbrainz.org/ws/2";
const RATE_LIMIT: Duration = Duration::from_millis(1000);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct IsrcResponse {
    #[serde(default)]
    recordings: Vec<Recording>,
}

#[derive(Debug, Deserialize)]
struct ReleaseSearchResponse {
    #[serde(default)]
    releases: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct RecordingSearchResponse {
    #[serde(default)]
    recordings: Vec<Recording>,
}

/// Keeps consecutive requests at least `min_interval` apart.
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    fn wait(&self) {
        let mut last = match self.last_request.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!("Rate limiting: waiting {wait_time:?}");
                thread::sleep(wait_time);
            }
        }

        *last = Some(Instant::now());
    }
}

/// User agent in the form MusicBrainz asks for.
pub fn user_agent(contact_email: &str) -> String {
    let version = env!("CARGO_PKG_VERSION");
    if contact_email.trim().is_empty() {
        format!("LiveSkipper/{version}")
    } else {
        format!("LiveSkipper/{version} ( {} )", contact_email.trim())
    }
}

/// Lucene query combining an artist and an entity field.
fn search_query(artist: &str, field: &str, value: &str) -> String {
    format!("artist:{artist} AND {field}:{value}")
}

pub struct MusicBrainzClient {
    http_client: Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl MusicBrainzClient {
    /// Builds a client identifying itself with `contact_email`.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed.
    pub fn new(contact_email: &str) -> Result<Self, CatalogError> {
        Self::with_base_url(contact_email, MUSICBRAINZ_BASE_URL)
    }

    /// Builds a client talking to a MusicBrainz mirror.
    pub fn with_base_url(contact_email: &str, base_url: &str) -> Result<Self, CatalogError> {
        let http_client = Client::builder()
            .user_agent(user_agent(contact_email))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::new(RATE_LIMIT),
        })
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)], what: &str) -> Result<T, CatalogError> {
        self.rate_limiter.wait();

        let url = format!("{}/{}", self.base_url, path);
        debug!("Querying MusicBrainz: {url} {query:?}");

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .query(&[("fmt", "json")])
            .send()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response.json().map_err(|e| CatalogError::Parse(e.to_string()))
    }
}

impl MetadataCatalog for MusicBrainzClient {
    fn recordings_by_isrc(&self, isrc: &str) -> Result<Vec<Recording>, CatalogError> {
        let path = format!("isrc/{isrc}");
        let response: IsrcResponse = self.get(&path, &[], &format!("ISRC {isrc}"))?;
        Ok(response.recordings)
    }

    fn search_releases(&self, artist: &str, release: &str) -> Result<Vec<Release>, CatalogError> {
        let query = search_query(artist, "release", release);
        let response: ReleaseSearchResponse = self.get("release/", &[("query", query.as_str())], &query)?;
        debug!("{} releases for {query}", response.releases.len());
        Ok(response.releases)
    }

    fn search_recordings(&self, artist: &str, recording: &str) -> Result<Vec<Recording>, CatalogError> {
        let query = search_query(artist, "recording", recording);
        let response: RecordingSearchResponse = self.get("recording/", &[("query", query.as_str())], &query)?;
        debug!("{} recordings for {query}", response.recordings.len());
        Ok(response.recordings)
    }
}
