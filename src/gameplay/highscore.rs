//! Best score, persisted as a small JSON file in the user's data directory.
use bevy::app::AppExit;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::state::AppState;
use crate::core::config::{GameConfig, HighScoreConfig};
use crate::core::system::system_order::GameSet;
use crate::gameplay::session::{GameSession, RoundEnded};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct HighScoreFile {
    best: u32,
}

#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct HighScore {
    pub best: u32,
    /// Raised since the last successful save.
    pub dirty: bool,
    path: Option<PathBuf>,
}

impl HighScore {
    /// Configured override, else `<data_local_dir>/bubble_shooter/highscore.json`.
    pub fn resolve_path(cfg: &HighScoreConfig) -> Option<PathBuf> {
        match &cfg.path {
            Some(p) => Some(PathBuf::from(p)),
            None => dirs::data_local_dir().map(|dir| dir.join("bubble_shooter").join("highscore.json")),
        }
    }

    /// Reads `path`; any failure falls back to a zero best score.
    pub fn load(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            warn!(target: "highscore", "Could not determine data directory for the high score");
            return Self::default();
        };
        let best = if !path.exists() {
            info!(target: "highscore", "No high score file at {:?}, starting fresh", path);
            0
        } else {
            match read_best(&path) {
                Ok(best) => {
                    info!(target: "highscore", "Loaded best score {best} from {:?}", path);
                    best
                }
                Err(e) => {
                    warn!(target: "highscore", "{e}; best score reset to 0");
                    0
                }
            }
        };
        Self {
            best,
            dirty: false,
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Raises the best score when `score` beats it. Returns true on a new record.
    pub fn observe(&mut self, score: u32) -> bool {
        if score > self.best {
            self.best = score;
            self.dirty = true;
            return true;
        }
        false
    }

    /// Writes the file when dirty. Failures are logged and leave the flag set.
    pub fn save(&mut self) {
        if !self.dirty {
            return;
        }
        let Some(path) = self.path.clone() else {
            warn!(target: "highscore", "No location to save the high score");
            return;
        };
        match write_best(&path, self.best) {
            Ok(()) => {
                self.dirty = false;
                info!(target: "highscore", "Saved best score {} to {:?}", self.best, path);
            }
            Err(e) => warn!(target: "highscore", "{e}"),
        }
    }

    /// Six-digit display form used by the HUD and menu.
    pub fn display(&self) -> String {
        format!("{:06}", self.best)
    }
}

fn read_best(path: &Path) -> Result<u32, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
    let file: HighScoreFile =
        serde_json::from_str(&text).map_err(|e| format!("parse {}: {e}", path.display()))?;
    Ok(file.best)
}

fn write_best(path: &Path, best: u32) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("create {}: {e}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&HighScoreFile { best })
        .map_err(|e| format!("serialize high score: {e}"))?;
    fs::write(path, json).map_err(|e| format!("write {}: {e}", path.display()))
}

pub struct HighScorePlugin;

impl Plugin for HighScorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HighScore>()
            .add_systems(Startup, load_high_score)
            .add_systems(
                Update,
                (observe_session_score, save_on_round_end)
                    .chain()
                    .in_set(GameSet::Session)
                    .run_if(in_state(AppState::InGame)),
            )
            .add_systems(OnExit(AppState::InGame), save_high_score)
            .add_systems(Last, save_on_exit);
    }
}

fn load_high_score(cfg: Res<GameConfig>, mut high: ResMut<HighScore>) {
    *high = HighScore::load(HighScore::resolve_path(&cfg.highscore));
}

fn observe_session_score(session: Res<GameSession>, mut high: ResMut<HighScore>) {
    if session.is_changed() && session.score > high.best {
        high.observe(session.score);
    }
}

fn save_on_round_end(mut events: EventReader<RoundEnded>, mut high: ResMut<HighScore>) {
    if events.read().count() > 0 {
        high.save();
    }
}

fn save_high_score(mut high: ResMut<HighScore>) {
    high.save();
}

fn save_on_exit(mut exits: EventReader<AppExit>, mut high: ResMut<HighScore>) {
    if exits.read().count() > 0 {
        high.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_only_raises() {
        let mut h = HighScore::default();
        assert!(h.observe(500));
        assert!(!h.observe(300));
        assert_eq!(h.best, 500);
        assert!(h.dirty);
        assert_eq!(h.display(), "000500");
    }

    #[test]
    fn save_then_load_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("highscore.json");
        let mut h = HighScore::load(Some(path.clone()));
        assert_eq!(h.best, 0);
        h.observe(1200);
        h.save();
        assert!(!h.dirty);
        assert_eq!(HighScore::load(Some(path)).best, 1200);
    }

    #[test]
    fn corrupt_file_falls_back_to_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("highscore.json");
        fs::write(&path, "{ not json").expect("write");
        let h = HighScore::load(Some(path));
        assert_eq!(h.best, 0);
        assert!(!h.dirty);
    }

    #[test]
    fn configured_path_wins() {
        let cfg = HighScoreConfig {
            path: Some("/tmp/custom/best.json".into()),
        };
        assert_eq!(
            HighScore::resolve_path(&cfg),
            Some(PathBuf::from("/tmp/custom/best.json"))
        );
    }
}
