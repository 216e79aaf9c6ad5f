use bevy::prelude::*;
use std::{collections::HashMap, path::PathBuf, time::SystemTime};

use crate::core::config::GameConfig;

#[derive(Resource, Debug, Clone)]
pub struct ConfigReloadSettings {
    pub paths: Vec<PathBuf>,
    pub interval_secs: f32,
}
impl Default for ConfigReloadSettings {
    fn default() -> Self {
        Self {
            paths: vec![
                PathBuf::from("assets/config/game.ron"),
                PathBuf::from("assets/config/game.local.ron"),
            ],
            interval_secs: 0.5,
        }
    }
}

#[derive(Resource, Debug)]
struct ConfigReloadState {
    last_mod: HashMap<PathBuf, SystemTime>,
    timer: Timer,
}
impl FromWorld for ConfigReloadState {
    fn from_world(_world: &mut World) -> Self {
        Self {
            last_mod: HashMap::new(),
            timer: Timer::from_seconds(0.5, TimerMode::Repeating),
        }
    }
}

pub struct ConfigHotReloadPlugin;
impl Plugin for ConfigHotReloadPlugin {
    fn build(&self, app: &mut App) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            if app.world().get_resource::<ConfigReloadSettings>().is_none() {
                app.init_resource::<ConfigReloadSettings>();
            }
            app.init_resource::<ConfigReloadState>()
                .add_systems(Update, poll_and_reload_config);
        }
    }
}

/// Copies the values that are safe to change mid-game. Layout, palette and physics scale
/// need a restart. Returns whether anything changed.
pub fn apply_tunables(current: &mut GameConfig, new: &GameConfig) -> bool {
    let before = current.clone();
    current.shooter = new.shooter.clone();
    current.aim_line = new.aim_line.clone();
    current.timing = new.timing.clone();
    current.scoring = new.scoring.clone();
    current.camera = new.camera.clone();
    current.hud = new.hud.clone();
    current.bubble.match_check_delay = new.bubble.match_check_delay;
    current.bubble.stuck_check_delay = new.bubble.stuck_check_delay;
    current.bubble.neighbor_radius = new.bubble.neighbor_radius;
    current.bubble.stuck_probe_radius = new.bubble.stuck_probe_radius;
    current.bubble.min_cluster_size = new.bubble.min_cluster_size;
    current.session = new.session.clone();
    current.window.title = new.window.title.clone();
    *current != before
}

fn poll_and_reload_config(
    time: Res<Time>,
    settings: Res<ConfigReloadSettings>,
    mut state: ResMut<ConfigReloadState>,
    mut cfg_res: ResMut<GameConfig>,
    mut windows: Query<&mut Window>,
) {
    if (state.timer.duration().as_secs_f32() - settings.interval_secs).abs() > f32::EPSILON {
        state
            .timer
            .set_duration(std::time::Duration::from_secs_f32(settings.interval_secs.max(0.05)));
    }
    if !state.timer.tick(time.delta()).finished() {
        return;
    }
    use std::fs;
    use std::time::UNIX_EPOCH;
    let mut dirty = false;
    for path in &settings.paths {
        let Ok(mod_time) = fs::metadata(path).and_then(|m| m.modified()) else {
            continue;
        };
        let first_seen = !state.last_mod.contains_key(path);
        let entry = state.last_mod.entry(path.clone()).or_insert(UNIX_EPOCH);
        if mod_time > *entry {
            *entry = mod_time;
            // the startup load already saw this version
            dirty |= !first_seen;
        }
    }
    if !dirty {
        return;
    }
    let (new_cfg, _used, errors) = GameConfig::load_layered(settings.paths.iter());
    for e in errors {
        warn!(target: "config", "CONFIG HOT-RELOAD issue: {e}");
    }
    for w in new_cfg.validate() {
        warn!(target: "config", "CONFIG HOT-RELOAD warning: {w}");
    }
    if apply_tunables(&mut cfg_res, &new_cfg) {
        info!(target: "config", "Config hot-reload applied");
        if let Ok(mut window) = windows.single_mut() {
            if window.title != cfg_res.window.title {
                window.title = cfg_res.window.title.clone();
            }
        }
    }
}
