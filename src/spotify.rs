//! # Spotify Client
//!
//! [`PlaybackSource`] backed by the Spotify Web API. Every request carries
//! a token from [`SpotifyAuth`]; a request rejected with 401 is retried once
//! with a freshly refreshed token before the failure counts as fatal.

use crate::auth::SpotifyAuth;
use crate::playback::{PlaybackError, PlaybackSource};
use crate::track::{NowPlaying, TrackSnapshot};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const API_BASE_URL: &str = "https://api.spotify.com/v1";

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    #[serde(default)]
    is_playing: bool,
    #[serde(default)]
    item: Option<ApiTrack>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiArtist {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiAlbum {
    #[serde(default)]
    name: String,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    artists: Vec<ApiArtist>,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalIds {
    #[serde(default)]
    isrc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    /// Null for local files
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    artists: Vec<ApiArtist>,
    #[serde(default)]
    album: ApiAlbum,
    #[serde(default)]
    external_ids: ExternalIds,
}

impl ApiTrack {
    fn into_snapshot(self) -> Option<TrackSnapshot> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let track_artist = self.artists.into_iter().next().map(|a| a.name).unwrap_or_default();
        let album_artist = self
            .album
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_else(|| track_artist.clone());

        Some(TrackSnapshot {
            id,
            artist: album_artist,
            display_artist: track_artist,
            title: self.name,
            album: self.album.name,
            release_date: self.album.release_date.unwrap_or_default(),
            isrc: self.external_ids.isrc,
        })
    }
}

/// Parses a currently-playing payload.
fn parse_currently_playing(body: &str) -> Result<Option<NowPlaying>, PlaybackError> {
    let current: CurrentlyPlaying =
        serde_json::from_str(body).map_err(|e| PlaybackError::Parse(e.to_string()))?;

    Ok(current
        .item
        .and_then(ApiTrack::into_snapshot)
        .map(|track| NowPlaying {
            is_playing: current.is_playing,
            track,
        }))
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    #[serde(default)]
    display_name: Option<String>,
    id: String,
}

pub struct SpotifyClient {
    http_client: Client,
    auth: SpotifyAuth,
}

impl SpotifyClient {
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed.
    pub fn new(auth: SpotifyAuth) -> Result<Self, PlaybackError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PlaybackError::Network(e.to_string()))?;
        Ok(Self { http_client, auth })
    }

    /// Sends a request, retrying once after a 401 with a refreshed token.
    fn send(
        &mut self,
        method: Method,
        path: &str,
        build: impl Fn(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response, PlaybackError> {
        let url = format!("{API_BASE_URL}{path}");
        let mut token = self.auth.access_token()?;

        for attempt in 0..2 {
            debug!("Spotify {method} {path}");
            let request = self.http_client.request(method.clone(), &url).bearer_auth(&token);
            let response = build(request)
                .send()
                .map_err(|e| PlaybackError::Network(e.to_string()))?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                if attempt == 0 {
                    token = self.auth.force_refresh()?;
                    continue;
                }
                return Err(PlaybackError::Unauthorized(response.text().unwrap_or_default()));
            }
            if !status.is_success() {
                return Err(PlaybackError::Api {
                    status: status.as_u16(),
                    message: response.text().unwrap_or_default(),
                });
            }
            return Ok(response);
        }

        Err(PlaybackError::Unauthorized("access token rejected".to_string()))
    }

    /// Display name of the authorized user, falling back to the user id.
    ///
    /// # Errors
    ///
    /// Any failure of the profile request.
    pub fn display_name(&mut self) -> Result<String, PlaybackError> {
        let response = self.send(Method::GET, "/me", |r| r)?;
        let profile: UserProfile = response.json().map_err(|e| PlaybackError::Parse(e.to_string()))?;
        Ok(profile.display_name.filter(|n| !n.is_empty()).unwrap_or(profile.id))
    }
}

impl PlaybackSource for SpotifyClient {
    fn currently_playing(&mut self) -> Result<Option<NowPlaying>, PlaybackError> {
        let response = self.send(Method::GET, "/me/player/currently-playing", |r| r)?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response.text().map_err(|e| PlaybackError::Network(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        parse_currently_playing(&body)
    }

    fn is_favorited(&mut self, track_id: &str) -> Result<bool, PlaybackError> {
        let ids = track_id.to_string();
        let response = self.send(Method::GET, "/me/tracks/contains", |r| r.query(&[("ids", ids.as_str())]))?;
        let contains: Vec<bool> = response.json().map_err(|e| PlaybackError::Parse(e.to_string()))?;
        Ok(contains.first().copied().unwrap_or(false))
    }

    fn skip_to_next(&mut self) -> Result<(), PlaybackError> {
        self.send(Method::POST, "/me/player/next", |r| r.header(reqwest::header::CONTENT_LENGTH, 0))?;
        Ok(())
    }
}
