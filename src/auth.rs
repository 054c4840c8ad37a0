//! # Spotify Authorization
//!
//! Authorization-code flow for the Spotify Web API.
//!
//! On first use the authorize URL is logged and opened in a browser; the
//! redirect is caught by a one-shot HTTP server listening on the redirect
//! URL's port on all interfaces, so the flow also works from inside a
//! container with the port published. Tokens are cached on disk and
//! refreshed shortly before they expire.

use crate::config::Settings;
use crate::playback::PlaybackError;
use log::{debug, info, warn};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Permissions needed to read playback, read the library and skip.
pub const SCOPES: &str = "user-modify-playback-state user-read-currently-playing user-library-read";

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN_SECS: u64 = 60;

/// A cached access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp after which the access token is invalid
    pub expires_at: u64,
    #[serde(default)]
    pub scope: String,
}

impl Token {
    /// Whether the token must be refreshed at `now` (unix seconds).
    pub fn is_expired_at(&self, now: u64) -> bool {
        now + EXPIRY_MARGIN_SECS >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now())
    }

    /// Whether every scope we need was granted.
    pub fn covers(&self, scopes: &str) -> bool {
        let granted: Vec<&str> = self.scope.split_whitespace().collect();
        scopes.split_whitespace().all(|s| granted.contains(&s))
    }
}

/// Response of the accounts token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: String,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// Client credentials plus the token cache.
pub struct SpotifyAuth {
    http_client: Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
    cache_path: Option<PathBuf>,
    token: Option<Token>,
}

impl SpotifyAuth {
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed.
    pub fn new(settings: &Settings, cache_path: Option<PathBuf>) -> Result<Self, PlaybackError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PlaybackError::Network(e.to_string()))?;

        let token = cache_path.as_deref().and_then(load_cached_token);

        Ok(Self {
            http_client,
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            redirect_url: settings.redirect_url.clone(),
            cache_path,
            token,
        })
    }

    /// URL the listener has to visit to grant access.
    pub fn authorize_url(&self, state: &str) -> Result<Url, PlaybackError> {
        Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_url.as_str()),
                ("scope", SCOPES),
                ("state", state),
            ],
        )
        .map_err(|e| PlaybackError::Parse(e.to_string()))
    }

    /// A valid access token, refreshing or re-authorizing as needed.
    ///
    /// # Errors
    ///
    /// `Unauthorized` if the token endpoint rejects our credentials.
    pub fn access_token(&mut self) -> Result<String, PlaybackError> {
        if let Some(token) = self.token.as_ref().filter(|t| t.covers(SCOPES)) {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
            if let Some(refresh_token) = token.refresh_token.clone() {
                debug!("Refreshing Spotify access token");
                return self.refresh(&refresh_token);
            }
        }

        self.authorize_interactively()
    }

    /// Forces a refresh, used after the API rejected a token early.
    pub fn force_refresh(&mut self) -> Result<String, PlaybackError> {
        match self.token.as_ref().and_then(|t| t.refresh_token.clone()) {
            Some(refresh_token) => self.refresh(&refresh_token),
            None => Err(PlaybackError::Unauthorized(
                "access token rejected and no refresh token available".to_string(),
            )),
        }
    }

    fn refresh(&mut self, refresh_token: &str) -> Result<String, PlaybackError> {
        let mut token = self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])?;
        // Spotify may omit the refresh token when it stays the same.
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }
        if token.scope.is_empty() {
            if let Some(previous) = &self.token {
                token.scope = previous.scope.clone();
            }
        }
        self.store(token)
    }

    fn authorize_interactively(&mut self) -> Result<String, PlaybackError> {
        let state: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        let url = self.authorize_url(&state)?;

        info!("Go to the following URL: {url}");
        if let Err(e) = webbrowser::open(url.as_str()) {
            warn!("Could not open a browser: {e}");
        }

        let code = wait_for_callback(&self.redirect_url, &state)?;
        let token = self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", self.redirect_url.as_str()),
        ])?;
        self.store(token)
    }

    fn request_token(&self, form: &[(&str, &str)]) -> Result<Token, PlaybackError> {
        let response = self
            .http_client
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .map_err(|e| PlaybackError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(token_error(status.as_u16(), text));
        }

        let body: TokenResponse = response.json().map_err(|e| PlaybackError::Parse(e.to_string()))?;
        Ok(Token {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            expires_at: unix_now() + body.expires_in,
            scope: body.scope,
        })
    }

    fn store(&mut self, token: Token) -> Result<String, PlaybackError> {
        if let Some(path) = &self.cache_path {
            if let Err(e) = save_cached_token(path, &token) {
                warn!("Could not cache Spotify token at {}: {e}", path.display());
            }
        }
        let access_token = token.access_token.clone();
        self.token = Some(token);
        Ok(access_token)
    }
}

/// Reads a cached token, ignoring missing or corrupt files.
pub fn load_cached_token(path: &Path) -> Option<Token> {
    let text = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(token) => Some(token),
        Err(e) => {
            warn!("Ignoring unreadable token cache {}: {e}", path.display());
            None
        }
    }
}

/// Writes `token` to the cache file.
pub fn save_cached_token(path: &Path, token: &Token) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(token)?;
    fs::write(path, json)
}

/// Extracts the authorization code from a redirect request target.
///
/// # Errors
///
/// `Unauthorized` if the listener denied access or the state does not
/// match, `Parse` if no code is present.
pub fn parse_callback(target: &str, expected_state: &str) -> Result<String, PlaybackError> {
    let url = Url::parse("http://localhost")
        .and_then(|base| base.join(target))
        .map_err(|e| PlaybackError::Parse(e.to_string()))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => return Err(PlaybackError::Unauthorized(value.into_owned())),
            _ => {}
        }
    }

    if state.as_deref() != Some(expected_state) {
        return Err(PlaybackError::Unauthorized("state mismatch in authorization callback".to_string()));
    }
    code.ok_or_else(|| PlaybackError::Parse("authorization callback without code".to_string()))
}

/// Port the callback server listens on.
fn callback_port(redirect_url: &str) -> Result<u16, PlaybackError> {
    let url = Url::parse(redirect_url).map_err(|e| PlaybackError::Parse(e.to_string()))?;
    url.port_or_known_default()
        .ok_or_else(|| PlaybackError::Parse(format!("redirect URL {redirect_url} has no port")))
}

/// Maps a failed token endpoint response to an error.
///
/// Only 400 and 401 mean the grant or the client credentials were rejected;
/// rate limiting and server trouble stay recoverable.
fn token_error(status: u16, body: String) -> PlaybackError {
    if status != 400 && status != 401 {
        return PlaybackError::Api { status, message: body };
    }

    let reason = match serde_json::from_str::<TokenErrorResponse>(&body) {
        Ok(err) => match err.error_description {
            Some(description) => format!("{}: {description}", err.error),
            None => err.error,
        },
        Err(_) => body,
    };
    PlaybackError::Unauthorized(reason)
}

/// Serves one redirect on `0.0.0.0:<port>` and returns its code.
fn wait_for_callback(redirect_url: &str, state: &str) -> Result<String, PlaybackError> {
    let port = callback_port(redirect_url)?;
    let server = tiny_http::Server::http(("0.0.0.0", port))
        .map_err(|e| PlaybackError::Network(format!("cannot listen on port {port}: {e}")))?;
    info!("Waiting for authorization callback on port {port}");

    for request in server.incoming_requests() {
        // Browsers also ask for a favicon; only the redirect carries a query.
        if !request.url().contains('?') {
            if let Err(e) = request.respond(tiny_http::Response::empty(404)) {
                debug!("Could not answer stray request: {e}");
            }
            continue;
        }

        let result = parse_callback(request.url(), state);
        let message = match &result {
            Ok(_) => "Authorization complete. You can close this window.".to_string(),
            Err(e) => format!("Authorization failed: {e}"),
        };
        if let Err(e) = request.respond(tiny_http::Response::from_string(message)) {
            debug!("Could not answer authorization callback: {e}");
        }
        return result;
    }

    Err(PlaybackError::Network("callback server stopped".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn token(expires_at: u64) -> Token {
        Token {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at,
            scope: SCOPES.to_string(),
        }
    }

    #[test]
    fn test_token_expiry_margin() {
        let token = token(1_000);
        assert!(!token.is_expired_at(900));
        assert!(token.is_expired_at(940));
        assert!(token.is_expired_at(2_000));
    }

    #[test]
    fn test_token_scope_coverage() {
        let mut token = token(0);
        assert!(token.covers(SCOPES));

        token.scope = "user-read-currently-playing".to_string();
        assert!(!token.covers(SCOPES));
    }

    #[test]
    fn test_token_cache_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("token.json");

        assert_eq!(load_cached_token(&path), None);
        save_cached_token(&path, &token(42)).expect("Failed to write token cache");
        assert_eq!(load_cached_token(&path), Some(token(42)));

        fs::write(&path, "garbage").expect("Failed to corrupt token cache");
        assert_eq!(load_cached_token(&path), None);
    }

    #[test]
    fn test_parse_callback() {
        let code = parse_callback("/?code=AQD123&state=abc", "abc").expect("code expected");
        assert_eq!(code, "AQD123");

        assert!(matches!(
            parse_callback("/?error=access_denied&state=abc", "abc"),
            Err(PlaybackError::Unauthorized(_))
        ));
        assert!(matches!(
            parse_callback("/?code=AQD123&state=other", "abc"),
            Err(PlaybackError::Unauthorized(_))
        ));
        assert!(matches!(parse_callback("/?state=abc", "abc"), Err(PlaybackError::Parse(_))));
    }

    #[test]
    fn test_token_error_only_rejections_are_fatal() {
        let rejected = token_error(400, r#"{"error": "invalid_grant", "error_description": "Refresh token revoked"}"#.to_string());
        match &rejected {
            PlaybackError::Unauthorized(reason) => assert_eq!(reason, "invalid_grant: Refresh token revoked"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(rejected.is_fatal());
        assert!(token_error(401, r#"{"error": "invalid_client"}"#.to_string()).is_fatal());

        let throttled = token_error(429, String::new());
        assert!(matches!(throttled, PlaybackError::Api { status: 429, .. }));
        assert!(!throttled.is_fatal());
        assert!(!token_error(403, "forbidden".to_string()).is_fatal());
        assert!(!token_error(503, "unavailable".to_string()).is_fatal());
    }

    #[test]
    fn test_callback_port() {
        assert_eq!(callback_port("http://localhost:9090").unwrap(), 9090);
        assert_eq!(callback_port("http://localhost/callback").unwrap(), 80);
        assert!(callback_port("not a url").is_err());
    }

    #[test]
    fn test_authorize_url_contains_scopes() {
        let settings = Settings {
            client_id: "my-client".to_string(),
            client_secret: "secret".to_string(),
            ..Settings::default()
        };
        let auth = SpotifyAuth::new(&settings, None).expect("auth client");
        let url = auth.authorize_url("xyz").expect("valid url");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".to_string(), "my-client".to_string())));
        assert!(pairs.contains(&("scope".to_string(), SCOPES.to_string())));
        assert!(pairs.contains(&("redirect_uri".to_string(), "http://localhost:9090".to_string())));
        assert!(pairs.contains(&("state".to_string(), "xyz".to_string())));
    }
}
