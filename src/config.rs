//! # Configuration Module
//!
//! Settings are read once at startup from a JSON file in the platform
//! configuration directory and then overridden by command-line flags or
//! environment variables:
//!
//! - Linux: `~/.config/liveskipper/config.json`
//! - macOS: `~/Library/Application Support/liveskipper/config.json`
//! - Windows: `%APPDATA%\liveskipper\config.json`
//!
//! ```json
//! {
//!   "client_id": "your-client-id",
//!   "client_secret": "your-client-secret",
//!   "redirect_url": "http://localhost:9090",
//!   "contact_email": "you@example.com"
//! }
//! ```
//!
//! The Spotify token cache lives next to other application data in the
//! platform data directory.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "liveskipper";

/// Redirect URL registered with the Spotify app. Changing it requires
/// changing the app registration too.
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:9090";

/// Seconds between two polls unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

/// Returns the default configuration file path.
///
/// # Errors
///
/// Fails if the platform has no configuration directory.
pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system config directory. Pass --config explicitly."
        )
    })?;
    Ok(config_dir.join(APP_DIR).join("config.json"))
}

/// Returns the data directory, creating it if necessary.
///
/// # Errors
///
/// Fails if the platform has no data directory or it cannot be created.
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        )
    })?;

    let app_dir = data_dir.join(APP_DIR);
    fs::create_dir_all(&app_dir).with_context(|| {
        format!(
            "Failed to create LiveSkipper data directory at {}. Please check file permissions.",
            app_dir.display()
        )
    })?;

    Ok(app_dir)
}

/// Path of the cached Spotify token.
pub fn get_token_cache_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("token.json"))
}

/// Everything LiveSkipper needs to know about its environment.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Spotify app client id
    pub client_id: String,
    /// Spotify app client secret
    pub client_secret: String,
    /// OAuth redirect URL; its port is where the callback server listens
    pub redirect_url: String,
    /// Contact address sent to MusicBrainz in the user agent
    pub contact_email: String,
    pub poll_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            contact_email: String::new(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("client_id", &self.client_id)
            .field("client_secret", &mask(&self.client_secret))
            .field("redirect_url", &self.redirect_url)
            .field("contact_email", &self.contact_email)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .finish()
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_url: Option<String>,
    pub contact_email: Option<String>,
    pub poll_interval_secs: Option<u64>,
}

impl Settings {
    /// Reads settings from `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Resolves settings: file first, then overrides.
    ///
    /// An explicit `path` must exist; the default path may be absent, in
    /// which case defaults are used.
    ///
    /// # Errors
    ///
    /// Fails on an unreadable or invalid file, or a missing explicit path.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut settings = match path {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file {} does not exist", path.display());
                }
                Self::from_file(path)?
            }
            None => {
                let default_path = get_config_path()?;
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    log::debug!("No config file at {}, using defaults", default_path.display());
                    Self::default()
                }
            }
        };

        settings.apply(overrides);
        Ok(settings)
    }

    /// Replaces every field for which an override is given.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(client_id) = &overrides.client_id {
            self.client_id = client_id.clone();
        }
        if let Some(client_secret) = &overrides.client_secret {
            self.client_secret = client_secret.clone();
        }
        if let Some(redirect_url) = &overrides.redirect_url {
            self.redirect_url = redirect_url.clone();
        }
        if let Some(contact_email) = &overrides.contact_email {
            self.contact_email = contact_email.clone();
        }
        if let Some(secs) = overrides.poll_interval_secs {
            self.poll_interval_secs = secs;
        }
    }

    /// Checks that the Spotify credentials are present.
    ///
    /// # Errors
    ///
    /// Names the first missing credential.
    pub fn require_playback(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            bail!("Missing Spotify client id. Set client_id in the config file or LIVESKIPPER_CLIENT_ID.");
        }
        if self.client_secret.trim().is_empty() {
            bail!("Missing Spotify client secret. Set client_secret in the config file or LIVESKIPPER_CLIENT_SECRET.");
        }
        if self.redirect_url.trim().is_empty() {
            bail!("Missing redirect URL.");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Writes a template config file to `path`, refusing to overwrite.
    ///
    /// # Errors
    ///
    /// Fails if the file exists or cannot be written.
    pub fn write_template(path: &Path) -> Result<()> {
        if path.exists() {
            bail!("Config file {} already exists", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let template = Self {
            client_id: "your-client-id".to_string(),
            client_secret: "your-client-secret".to_string(),
            contact_email: "your-email-address".to_string(),
            ..Self::default()
        };
        let json = serde_json::to_string_pretty(&template)?;
        fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }
}

/// Hides all but the last four characters of a secret.
pub fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{tail}", "*".repeat(count - 4))
}
