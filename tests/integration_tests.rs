//! # Integration Tests for LiveSkipper
//!
//! End-to-end behavior of the skip engine through the public API, with the
//! real classification cascade running against an in-memory catalog, plus
//! smoke tests of the command-line binary.

use liveskipper::catalog::{CatalogError, MetadataCatalog, Recording, Release};
use liveskipper::playback::{PlaybackError, PlaybackSource};
use liveskipper::skipper::{Decision, LiveSkipper};
use liveskipper::track::{NowPlaying, TrackSnapshot};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;

/// Observable state of the fake player, shared with the test body.
#[derive(Default)]
struct PlayerState {
    now: Option<NowPlaying>,
    script: VecDeque<Result<Option<NowPlaying>, PlaybackError>>,
    favorites: HashSet<String>,
    skips: Vec<String>,
    favorite_lookups: usize,
    skip_fails: bool,
}

#[derive(Clone, Default)]
struct FakePlayer(Rc<RefCell<PlayerState>>);

impl FakePlayer {
    fn play(&self, track: &TrackSnapshot) {
        self.0.borrow_mut().now = Some(NowPlaying {
            is_playing: true,
            track: track.clone(),
        });
    }

    fn pause(&self) {
        if let Some(now) = self.0.borrow_mut().now.as_mut() {
            now.is_playing = false;
        }
    }

    fn favorite(&self, track: &TrackSnapshot) {
        self.0.borrow_mut().favorites.insert(track.id.clone());
    }

    fn skips(&self) -> Vec<String> {
        self.0.borrow().skips.clone()
    }
}

impl PlaybackSource for FakePlayer {
    fn currently_playing(&mut self) -> Result<Option<NowPlaying>, PlaybackError> {
        let mut state = self.0.borrow_mut();
        match state.script.pop_front() {
            Some(result) => result,
            None => Ok(state.now.clone()),
        }
    }

    fn is_favorited(&mut self, track_id: &str) -> Result<bool, PlaybackError> {
        let mut state = self.0.borrow_mut();
        state.favorite_lookups += 1;
        Ok(state.favorites.contains(track_id))
    }

    fn skip_to_next(&mut self) -> Result<(), PlaybackError> {
        let mut state = self.0.borrow_mut();
        if state.skip_fails {
            return Err(PlaybackError::Api {
                status: 502,
                message: "Bad gateway".to_string(),
            });
        }
        let current = state.now.as_ref().map(|n| n.track.id.clone()).unwrap_or_default();
        state.skips.push(current);
        Ok(())
    }
}

/// Catalog that only knows recordings by ISRC and counts every query.
#[derive(Clone, Default)]
struct FakeCatalog {
    annotations: HashMap<String, String>,
    queries: Rc<Cell<usize>>,
}

impl FakeCatalog {
    fn with(mut self, isrc: &str, annotation: &str) -> Self {
        self.annotations.insert(isrc.to_string(), annotation.to_string());
        self
    }

    fn queries(&self) -> usize {
        self.queries.get()
    }
}

impl MetadataCatalog for FakeCatalog {
    fn recordings_by_isrc(&self, isrc: &str) -> Result<Vec<Recording>, CatalogError> {
        self.queries.set(self.queries.get() + 1);
        match self.annotations.get(isrc) {
            Some(annotation) => Ok(vec![Recording {
                id: format!("rec-{isrc}"),
                title: "Some Song".to_string(),
                disambiguation: Some(annotation.clone()),
                ..Default::default()
            }]),
            None => Err(CatalogError::NotFound(format!("ISRC {isrc}"))),
        }
    }

    fn search_releases(&self, _artist: &str, _release: &str) -> Result<Vec<Release>, CatalogError> {
        self.queries.set(self.queries.get() + 1);
        Ok(Vec::new())
    }

    fn search_recordings(&self, _artist: &str, _recording: &str) -> Result<Vec<Recording>, CatalogError> {
        self.queries.set(self.queries.get() + 1);
        Ok(Vec::new())
    }
}

fn live_track(id: &str) -> TrackSnapshot {
    TrackSnapshot::new(id, "Johnny Cash", format!("Song {id} - Live"), "At Folsom Prison", "1968")
        .with_isrc(format!("LIVE-{id}"))
}

fn studio_track(id: &str) -> TrackSnapshot {
    TrackSnapshot::new(id, "Johnny Cash", format!("Song {id}"), "With His Hot and Blue Guitar", "1957")
        .with_isrc(format!("STUDIO-{id}"))
}

/// Catalog marking every `live_track` and `studio_track` in `ids` as such.
fn catalog_for(ids: &[&str]) -> FakeCatalog {
    ids.iter().fold(FakeCatalog::default(), |catalog, id| {
        catalog
            .with(&format!("LIVE-{id}"), "live, 1968-01-13: Folsom State Prison")
            .with(&format!("STUDIO-{id}"), "album version")
    })
}

#[cfg(test)]
mod skip_scenarios {
    use super::*;

    #[test]
    fn test_skip_repoll_and_replay() {
        let player = FakePlayer::default();
        let mut skipper = LiveSkipper::new(player.clone(), catalog_for(&["t1", "t2"]));
        let t1 = live_track("t1");
        let t2 = studio_track("t2");

        player.play(&t1);
        assert_eq!(skipper.check().unwrap(), true);
        assert_eq!(player.skips(), vec!["t1"]);
        assert_eq!(skipper.recent_skips().iter().collect::<Vec<_>>(), vec!["t1"]);

        // Same track still reported: nothing changes
        assert_eq!(skipper.check().unwrap(), false);
        assert_eq!(player.skips().len(), 1);
        assert!(skipper.exceptions().is_empty());

        player.play(&t2);
        assert_eq!(skipper.check().unwrap(), false);

        // The listener went back to t1 on purpose
        player.play(&t1);
        assert_eq!(skipper.check().unwrap(), false);
        assert!(skipper.exceptions().contains("t1"));
        assert_eq!(player.skips().len(), 1);
    }

    #[test]
    fn test_sixth_skip_evicts_oldest() {
        let ids = ["t1", "t2", "t3", "t4", "t5", "t6"];
        let player = FakePlayer::default();
        let mut skipper = LiveSkipper::new(player.clone(), catalog_for(&ids));

        for id in ids {
            player.play(&live_track(id));
            assert!(skipper.check().unwrap(), "{id} should be skipped");
        }
        assert_eq!(skipper.recent_skips().len(), 5);
        assert!(!skipper.recent_skips().contains("t1"));

        // Out of the window, so t1 is skipped again rather than exempted
        player.play(&live_track("t1"));
        assert!(skipper.check().unwrap());
        assert!(skipper.exceptions().is_empty());
        assert_eq!(player.skips().len(), 7);
    }

    #[test]
    fn test_favorited_live_track_is_exempted_once() {
        let player = FakePlayer::default();
        let catalog = catalog_for(&["fav", "other"]);
        let mut skipper = LiveSkipper::new(player.clone(), catalog.clone());
        let favorite = live_track("fav");
        player.favorite(&favorite);

        player.play(&favorite);
        assert_eq!(skipper.check().unwrap(), false);
        assert!(skipper.exceptions().contains("fav"));
        assert_eq!(catalog.queries(), 1);

        player.play(&studio_track("other"));
        skipper.check().unwrap();

        let queries = catalog.queries();
        let lookups = player.0.borrow().favorite_lookups;
        player.play(&favorite);
        assert_eq!(skipper.check().unwrap(), false);
        assert_eq!(catalog.queries(), queries);
        assert_eq!(player.0.borrow().favorite_lookups, lookups);
        assert_eq!(skipper.exceptions().len(), 1);
        assert!(player.skips().is_empty());
    }

    #[test]
    fn test_evaluating_same_snapshot_twice_skips_once() {
        let player = FakePlayer::default();
        let mut skipper = LiveSkipper::new(player.clone(), catalog_for(&["t1"]));
        let t1 = live_track("t1");
        player.play(&t1);

        assert_eq!(skipper.evaluate(&t1).unwrap(), Decision::Skip);
        assert_eq!(skipper.evaluate(&t1).unwrap(), Decision::DoNotSkip);
        assert_eq!(player.skips().len(), 1);
    }

    #[test]
    fn test_paused_or_empty_player_is_ignored() {
        let player = FakePlayer::default();
        let catalog = catalog_for(&["t1"]);
        let mut skipper = LiveSkipper::new(player.clone(), catalog.clone());

        assert_eq!(skipper.check().unwrap(), false);

        player.play(&live_track("t1"));
        player.pause();
        assert_eq!(skipper.check().unwrap(), false);
        assert_eq!(catalog.queries(), 0);
        assert_eq!(skipper.last_seen(), None);
    }

    #[test]
    fn test_unknown_track_is_assumed_not_live() {
        let player = FakePlayer::default();
        let catalog = FakeCatalog::default();
        let mut skipper = LiveSkipper::new(player.clone(), catalog.clone());

        player.play(&TrackSnapshot::new("t1", "Nobody", "Unknown Song", "Unknown Album", "2020"));
        assert_eq!(skipper.check().unwrap(), false);
        // No ISRC: only the release and recording searches run
        assert_eq!(catalog.queries(), 2);
        assert!(player.skips().is_empty());
    }

    #[test]
    fn test_failed_skip_is_not_remembered() {
        let player = FakePlayer::default();
        player.0.borrow_mut().skip_fails = true;
        let mut skipper = LiveSkipper::new(player.clone(), catalog_for(&["t1"]));

        player.play(&live_track("t1"));
        let err = skipper.check().unwrap_err();
        assert!(!err.is_fatal());
        assert!(skipper.recent_skips().is_empty());
    }

    #[test]
    fn test_run_forever_survives_errors_until_unauthorized() {
        let player = FakePlayer::default();
        {
            let mut state = player.0.borrow_mut();
            state.script.push_back(Err(PlaybackError::Network("connection reset".to_string())));
            state.script.push_back(Ok(Some(NowPlaying {
                is_playing: true,
                track: live_track("t1"),
            })));
            state.script.push_back(Err(PlaybackError::Unauthorized("token revoked".to_string())));
        }
        let mut skipper =
            LiveSkipper::new(player.clone(), catalog_for(&["t1"])).with_poll_interval(Duration::ZERO);

        let err = skipper.run_forever().unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(skipper.recent_skips().len(), 1);
        assert!(player.0.borrow().script.is_empty());
    }
}

#[cfg(test)]
mod cli_tests {
    use std::process::Command;
    use tempfile::TempDir;

    const ENV_VARS: [&str; 5] = [
        "LIVESKIPPER_CLIENT_ID",
        "LIVESKIPPER_CLIENT_SECRET",
        "LIVESKIPPER_REDIRECT_URL",
        "LIVESKIPPER_EMAIL",
        "LIVESKIPPER_INTERVAL",
    ];

    fn liveskipper() -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_liveskipper"));
        for var in ENV_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    #[test]
    fn test_cli_help_displays_correctly() {
        let output = liveskipper().arg("--help").output().expect("Failed to run help command");

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("liveskipper"));
        assert!(stdout.contains("run"));
        assert!(stdout.contains("classify"));
        assert!(stdout.contains("completion"));
    }

    #[test]
    fn test_completion_generation() {
        let output = liveskipper()
            .args(["completion", "bash"])
            .output()
            .expect("Failed to run completion command");

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("_liveskipper"));
        assert!(stdout.contains("complete"));
    }

    #[test]
    fn test_classify_requires_artist_and_title() {
        let output = liveskipper()
            .args(["classify", "--title", "Folsom Prison Blues"])
            .output()
            .expect("Failed to run classify command");

        assert!(!output.status.success());
    }

    #[test]
    fn test_config_init_then_show_masks_secret() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("config.json");

        let init = liveskipper()
            .arg("--config")
            .arg(&path)
            .args(["config", "--init"])
            .output()
            .expect("Failed to run config --init");
        assert!(init.status.success());
        assert!(path.exists());

        let show = liveskipper()
            .arg("--config")
            .arg(&path)
            .arg("config")
            .output()
            .expect("Failed to run config");
        assert!(show.status.success());
        let stdout = String::from_utf8_lossy(&show.stdout);
        assert!(stdout.contains("your-client-id"));
        assert!(!stdout.contains("your-client-secret"));

        // A second init refuses to overwrite
        let again = liveskipper()
            .arg("--config")
            .arg(&path)
            .args(["config", "--init"])
            .output()
            .expect("Failed to run config --init");
        assert!(!again.status.success());
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let output = liveskipper()
            .arg("--config")
            .arg(temp_dir.path().join("missing.json"))
            .arg("config")
            .output()
            .expect("Failed to run config");

        assert!(!output.status.success());
    }
}
