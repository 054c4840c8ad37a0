//! # LiveSkipper
//!
//! Watches what Spotify is playing and skips live recordings, using
//! MusicBrainz to tell live and studio recordings apart.
//!
//! ## Usage
//!
//! ```bash
//! # Write a config template, then fill in the Spotify app credentials
//! liveskipper config --init
//!
//! # Watch the player
//! liveskipper
//!
//! # Find out why a track counts as live
//! liveskipper classify --artist "Johnny Cash" --title "Folsom Prison Blues" --album "At Folsom Prison"
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser};
use liveskipper::auth::SpotifyAuth;
use liveskipper::cascade::Cascade;
use liveskipper::cli::{self, Command};
use liveskipper::completion;
use liveskipper::config::{self, Settings};
use liveskipper::musicbrainz::MusicBrainzClient;
use liveskipper::skipper::LiveSkipper;
use liveskipper::spotify::SpotifyClient;
use liveskipper::track::TrackSnapshot;
use log::{info, warn};

fn musicbrainz_client(settings: &Settings) -> Result<MusicBrainzClient> {
    if settings.contact_email.trim().is_empty() {
        warn!("No contact email configured; MusicBrainz may throttle anonymous clients");
    }
    MusicBrainzClient::new(&settings.contact_email).context("Failed to set up MusicBrainz client")
}

fn spotify_client(settings: &Settings) -> Result<SpotifyClient> {
    settings.require_playback()?;
    let cache_path = config::get_token_cache_path()?;
    let auth = SpotifyAuth::new(settings, Some(cache_path))?;
    Ok(SpotifyClient::new(auth)?)
}

/// Authorizes and greets the user, returning a ready skipper.
fn connect(settings: &Settings) -> Result<LiveSkipper<SpotifyClient, MusicBrainzClient>> {
    let mut spotify = spotify_client(settings)?;
    let name = spotify.display_name().context("Spotify authorization failed")?;
    info!("Authorized by {name}");

    let musicbrainz = musicbrainz_client(settings)?;
    Ok(LiveSkipper::new(spotify, musicbrainz).with_poll_interval(settings.poll_interval()))
}

fn show_config(path: &std::path::Path, settings: &Settings) {
    println!("Config file:   {}", path.display());
    println!("Client id:     {}", settings.client_id);
    println!("Client secret: {}", config::mask(&settings.client_secret));
    println!("Redirect URL:  {}", settings.redirect_url);
    println!("Contact email: {}", settings.contact_email);
    println!("Poll interval: {}s", settings.poll_interval_secs);
}

/// Main entry point for LiveSkipper.
///
/// Logging defaults to `info` and can be changed with `RUST_LOG`, e.g.
/// `RUST_LOG=liveskipper=debug liveskipper`.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();
    let overrides = args.overrides();
    let command = args.command.unwrap_or(Command::Run);

    match command {
        Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(&shell), &mut cmd);
        }
        Command::Config { init } => {
            let path = match &args.config {
                Some(path) => path.clone(),
                None => config::get_config_path()?,
            };
            if init {
                Settings::write_template(&path)?;
                println!("Wrote config template to {}", path.display());
            } else {
                let settings = Settings::load(args.config.as_deref(), &overrides)?;
                show_config(&path, &settings);
            }
        }
        Command::Auth => {
            let settings = Settings::load(args.config.as_deref(), &overrides)?;
            let mut spotify = spotify_client(&settings)?;
            let name = spotify.display_name().context("Spotify authorization failed")?;
            println!("Authorized by {name}");
        }
        Command::Classify { artist, title, album, date, isrc } => {
            let settings = Settings::load(args.config.as_deref(), &overrides)?;
            let cascade = Cascade::new(musicbrainz_client(&settings)?);

            let mut track = TrackSnapshot::new("", artist, title, album, date);
            if let Some(isrc) = isrc {
                track = track.with_isrc(isrc);
            }

            let verdicts = cascade.explain(&track);
            for (name, verdict) in &verdicts {
                println!("{name:>9}: {verdict}");
            }
            let live = verdicts
                .iter()
                .find_map(|(_, verdict)| verdict.decision())
                .unwrap_or(false);
            println!("{track} is {}", if live { "live" } else { "not live" });
        }
        Command::Check => {
            let settings = Settings::load(args.config.as_deref(), &overrides)?;
            let mut skipper = connect(&settings)?;
            if skipper.check()? {
                println!("Skipped");
            } else {
                println!("Nothing to skip");
            }
        }
        Command::Run => {
            let settings = Settings::load(args.config.as_deref(), &overrides)?;
            let mut skipper = connect(&settings)?;
            skipper
                .run_forever()
                .map_err(|e| anyhow!("LiveSkipper stopped: {e}"))?;
        }
    }

    Ok(())
}
