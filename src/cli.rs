//! # Command-Line Interface Module
//!
//! Defines the command-line interface for LiveSkipper using Clap derive macros.
//!
//! ## Commands
//!
//! - `run`: Watch Spotify and skip live tracks (default)
//! - `check`: Run a single poll cycle
//! - `classify`: Explain the live verdict for a track given on the command line
//! - `auth`: Authorize with Spotify and cache the token
//! - `config`: Show or initialize the configuration file
//! - `completion`: Generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! liveskipper
//! liveskipper classify --artist "Johnny Cash" --title "Folsom Prison Blues" --album "At Folsom Prison"
//! liveskipper --interval 5 run
//! ```

use crate::config::Overrides;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
///
/// Connection settings can come from the config file, the environment or
/// these flags; flags and environment win over the file.
#[derive(Parser, Debug)]
#[command(name = "liveskipper")]
#[command(about = "LiveSkipper: automatically skip live versions of songs on Spotify")]
#[command(version)]
pub struct Args {
    /// Path to the config file
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Spotify app client id
    #[arg(long, global = true, env = "LIVESKIPPER_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Spotify app client secret
    #[arg(long, global = true, env = "LIVESKIPPER_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// OAuth redirect URL registered with the Spotify app
    #[arg(long, global = true, env = "LIVESKIPPER_REDIRECT_URL")]
    pub redirect_url: Option<String>,

    /// Contact address sent to MusicBrainz
    #[arg(long, global = true, env = "LIVESKIPPER_EMAIL")]
    pub email: Option<String>,

    /// Seconds between two polls
    #[arg(long, global = true, env = "LIVESKIPPER_INTERVAL")]
    pub interval: Option<u64>,

    /// The subcommand to execute; `run` when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// Settings given through flags or the environment.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_url: self.redirect_url.clone(),
            contact_email: self.email.clone(),
            poll_interval_secs: self.interval,
        }
    }
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Watch the player and skip live tracks
    ///
    /// Polls Spotify every few seconds until interrupted. Favorited tracks
    /// and tracks played again right after being skipped are left alone.
    Run,

    /// Run a single poll cycle and report whether a skip happened
    Check,

    /// Classify a track without touching Spotify
    ///
    /// Prints the verdict of every strategy followed by the combined result.
    /// Useful to find out why a track was or was not skipped.
    Classify {
        /// Album artist
        #[arg(long)]
        artist: String,

        /// Track title
        #[arg(long)]
        title: String,

        /// Album title
        #[arg(long, default_value = "")]
        album: String,

        /// Album release date, e.g. 1968-05-01
        #[arg(long, default_value = "")]
        date: String,

        /// International Standard Recording Code
        #[arg(long)]
        isrc: Option<String>,
    },

    /// Authorize with Spotify and cache the access token
    Auth,

    /// Show the effective configuration
    Config {
        /// Write a template config file instead
        #[arg(long)]
        init: bool,
    },

    /// Generate shell completions
    ///
    /// Usage: liveskipper completion bash > ~/.local/share/bash-completion/completions/liveskipper
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}
