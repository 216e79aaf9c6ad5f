use bevy::prelude::*;
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Resource, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
    #[serde(rename = "autoClose")]
    pub auto_close: f32,
}
impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            title: "Bubble Shooter".into(),
            auto_close: 0.0,
        }
    }
}

/// Rapier world scale & gravity. Gravity is in pixels/s² (Unity's 9.81 at 40 px per unit).
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub pixels_per_meter: f32,
    pub gravity_y: f32,
}
impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            pixels_per_meter: 40.0,
            gravity_y: -392.4,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BubbleConfig {
    pub radius: f32,
    pub alpha: f32,
    /// Delay between a same-colour contact and the cluster search.
    pub match_check_delay: f32,
    /// Delay between sticking and the neighbour probe.
    pub stuck_check_delay: f32,
    /// Overlap radius used when walking a cluster.
    pub neighbor_radius: f32,
    /// Overlap radius used by the post-stick probe.
    pub stuck_probe_radius: f32,
    pub min_cluster_size: usize,
}
impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            radius: 20.0,
            alpha: 0.85,
            match_check_delay: 0.05,
            stuck_check_delay: 0.1,
            neighbor_radius: 48.0,
            stuck_probe_radius: 60.0,
            min_cluster_size: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    pub spacing: f32,
    pub row_height_factor: f32,
    pub base_y: f32,
    pub wall_half_width: f32,
    pub ceiling_y: f32,
    pub death_zone_y: f32,
}
impl Default for GridConfig {
    fn default() -> Self {
        Self {
            spacing: 48.0,
            row_height_factor: 0.866,
            base_y: 20.0,
            wall_half_width: 240.0,
            ceiling_y: 320.0,
            death_zone_y: -420.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ShooterConfig {
    pub position: [f32; 2],
    /// Degrees per second at full axis deflection.
    pub rotation_speed: f32,
    /// Launch speed in pixels/s.
    pub shoot_power: f32,
    pub max_angle: f32,
    pub reload_delay: f32,
    pub bob_amplitude: f32,
    pub bob_frequency: f32,
}
impl Default for ShooterConfig {
    fn default() -> Self {
        Self {
            position: [0.0, -300.0],
            rotation_speed: 150.0,
            shoot_power: 1000.0,
            max_angle: 60.0,
            reload_delay: 0.5,
            bob_amplitude: 4.0,
            bob_frequency: 3.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AimLineConfig {
    pub enabled: bool,
    pub points: usize,
    pub horizon_secs: f32,
}
impl Default for AimLineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            points: 20,
            horizon_secs: 2.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub pop_stagger: f32,
    pub pop_duration: f32,
    pub level_advance_delay: f32,
    pub trail_secs: f32,
}
impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            pop_stagger: 0.05,
            pop_duration: 0.2,
            level_advance_delay: 2.0,
            trail_secs: 0.3,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub points_per_bubble: u32,
}
impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            points_per_bubble: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub time_limit: f32,
    pub shots: u32,
}
impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_limit: 60.0,
            shots: 25,
        }
    }
}

/// One level layout: offset rows of `cols` bubbles using the first `colors` palette entries.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct LevelSpec {
    pub rows: u32,
    pub cols: u32,
    pub colors: usize,
}
impl Default for LevelSpec {
    fn default() -> Self {
        Self {
            rows: 5,
            cols: 8,
            colors: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub follow_offset: [f32; 2],
    pub smooth_speed: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub shake_duration: f32,
    pub shake_magnitude: f32,
}
impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            follow_offset: [0.0, 250.0],
            smooth_speed: 5.0,
            min_y: -200.0,
            max_y: 400.0,
            shake_duration: 0.2,
            shake_magnitude: 4.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HudConfig {
    pub low_time_warning: f32,
}
impl Default for HudConfig {
    fn default() -> Self {
        Self {
            low_time_warning: 10.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct HighScoreConfig {
    /// Overrides the per-user data directory location.
    pub path: Option<String>,
}

pub const DEFAULT_PALETTE: [[f32; 4]; 5] = [
    [1.0, 0.2, 0.2, 0.85], // red
    [0.2, 0.4, 1.0, 0.85], // blue
    [0.2, 0.8, 0.2, 0.85], // green
    [1.0, 0.8, 0.2, 0.85], // yellow
    [0.8, 0.2, 0.8, 0.85], // purple
];

#[derive(Debug, Deserialize, Resource, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub physics: PhysicsConfig,
    pub bubble: BubbleConfig,
    pub grid: GridConfig,
    pub shooter: ShooterConfig,
    pub aim_line: AimLineConfig,
    pub timing: TimingConfig,
    pub scoring: ScoringConfig,
    pub session: SessionConfig,
    pub levels: Vec<LevelSpec>,
    pub palette: Vec<[f32; 4]>,
    pub camera: CameraConfig,
    pub hud: HudConfig,
    pub highscore: HighScoreConfig,
    pub rapier_debug: bool,
}
impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: Default::default(),
            physics: Default::default(),
            bubble: Default::default(),
            grid: Default::default(),
            shooter: Default::default(),
            aim_line: Default::default(),
            timing: Default::default(),
            scoring: Default::default(),
            session: Default::default(),
            levels: vec![
                LevelSpec {
                    rows: 5,
                    cols: 8,
                    colors: 3,
                },
                LevelSpec {
                    rows: 7,
                    cols: 8,
                    colors: 5,
                },
            ],
            palette: DEFAULT_PALETTE.to_vec(),
            camera: Default::default(),
            hud: Default::default(),
            highscore: Default::default(),
            rapier_debug: false,
        }
    }
}

fn merge_value(base: &mut ron::value::Value, overlay: ron::value::Value) {
    use ron::value::Value;
    match (base, overlay) {
        (Value::Map(bm), Value::Map(om)) => {
            for (k, v) in om.into_iter() {
                let existing = bm.iter_mut().find(|(ek, _)| **ek == k).map(|(_, ev)| ev);
                if let Some(ev) = existing {
                    merge_value(ev, v);
                } else {
                    bm.insert(k, v);
                }
            }
        }
        (b, o) => *b = o,
    }
}

impl GameConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let data = fs::read_to_string(&path).map_err(|e| format!("read config: {e}"))?;
        ron::from_str(&data).map_err(|e| format!("parse RON: {e}"))
    }

    /// Deep-merges every readable layer in order (later keys win). Missing or broken
    /// layers are reported in the error list and skipped.
    pub fn load_layered<P, I>(paths: I) -> (Self, Vec<String>, Vec<String>)
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = P>,
    {
        use ron::value::Value;
        let mut merged: Option<Value> = None;
        let mut used = Vec::new();
        let mut errors = Vec::new();
        for p in paths {
            let path_ref = p.as_ref();
            match fs::read_to_string(path_ref) {
                Ok(txt) => match ron::from_str::<Value>(&txt) {
                    Ok(val) => {
                        if let Some(cur) = &mut merged {
                            merge_value(cur, val);
                        } else {
                            merged = Some(val);
                        }
                        used.push(path_ref.as_os_str().to_string_lossy().to_string());
                    }
                    Err(e) => errors.push(format!("{}: parse error: {e}", path_ref.display())),
                },
                Err(e) => errors.push(format!("{}: read error: {e}", path_ref.display())),
            }
        }
        let Some(val) = merged else {
            return (GameConfig::default(), used, errors);
        };
        match val.into_rust::<GameConfig>() {
            Ok(cfg) => (cfg, used, errors),
            Err(e) => {
                errors.push(format!(
                    "failed to deserialize merged config; using defaults: {e}"
                ));
                (GameConfig::default(), used, errors)
            }
        }
    }

    /// Palette colour for `index`; white when out of range.
    pub fn color(&self, index: usize) -> Color {
        match self.palette.get(index) {
            Some([r, g, b, a]) => Color::srgba(*r, *g, *b, *a),
            None => Color::WHITE,
        }
    }

    /// 1-based level lookup.
    pub fn level(&self, level: u32) -> Option<&LevelSpec> {
        let idx = (level as usize).checked_sub(1)?;
        self.levels.get(idx)
    }

    pub fn shooter_position(&self) -> Vec2 {
        Vec2::from_array(self.shooter.position)
    }

    pub fn gravity(&self) -> Vec2 {
        Vec2::new(0.0, self.physics.gravity_y)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            w.push("window dimensions must be > 0".into());
        }
        if self.window.auto_close < 0.0 {
            w.push(format!(
                "window.autoClose {} negative -> treated as disabled (should be >= 0)",
                self.window.auto_close
            ));
        }
        if self.physics.pixels_per_meter <= 0.0 {
            w.push("physics.pixels_per_meter must be > 0".into());
        }
        if self.physics.gravity_y > 0.0 {
            w.push(format!(
                "physics.gravity_y is positive ({}); shots will curve upward",
                self.physics.gravity_y
            ));
        }
        if self.bubble.radius <= 0.0 {
            w.push("bubble.radius must be > 0".into());
        }
        if !(0.0..=1.0).contains(&self.bubble.alpha) {
            w.push(format!("bubble.alpha {} outside 0..1", self.bubble.alpha));
        }
        if self.bubble.min_cluster_size < 2 {
            w.push(format!(
                "bubble.min_cluster_size {} < 2; single contacts will pop",
                self.bubble.min_cluster_size
            ));
        }
        if self.grid.spacing <= 0.0 {
            w.push("grid.spacing must be > 0".into());
        } else if self.bubble.neighbor_radius + self.bubble.radius < self.grid.spacing {
            w.push(format!(
                "bubble.neighbor_radius {} + radius {} < grid.spacing {}; grid neighbours never connect",
                self.bubble.neighbor_radius, self.bubble.radius, self.grid.spacing
            ));
        }
        if self.shooter.shoot_power <= 0.0 {
            w.push("shooter.shoot_power must be > 0".into());
        }
        if self.shooter.reload_delay < 0.0 {
            w.push("shooter.reload_delay negative".into());
        }
        if !(0.0..=89.0).contains(&self.shooter.max_angle) {
            w.push(format!(
                "shooter.max_angle {} outside 0..89 degrees",
                self.shooter.max_angle
            ));
        }
        if self.grid.death_zone_y >= self.shooter.position[1] {
            w.push(format!(
                "grid.death_zone_y {} is not below the shooter (y={})",
                self.grid.death_zone_y, self.shooter.position[1]
            ));
        }
        if self.grid.ceiling_y <= self.grid.base_y {
            w.push("grid.ceiling_y must be above grid.base_y".into());
        }
        if self.palette.is_empty() {
            w.push("palette is empty; every bubble renders white".into());
        }
        if self.levels.is_empty() {
            w.push("levels is empty; nothing to play".into());
        }
        for (i, lvl) in self.levels.iter().enumerate() {
            if lvl.rows == 0 || lvl.cols == 0 {
                w.push(format!("levels[{i}] has zero rows or cols"));
            }
            if lvl.colors == 0 || lvl.colors > self.palette.len() {
                w.push(format!(
                    "levels[{i}].colors {} outside 1..={}",
                    lvl.colors,
                    self.palette.len()
                ));
            }
        }
        if self.session.time_limit <= 0.0 {
            w.push("session.time_limit must be > 0".into());
        }
        if self.session.shots == 0 {
            w.push("session.shots is 0; no bubble is ever loaded and only the timer can end the round".into());
        }
        if self.camera.min_y > self.camera.max_y {
            w.push(format!(
                "camera.min_y ({}) greater than max_y ({})",
                self.camera.min_y, self.camera.max_y
            ));
        }
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_clean() {
        let cfg = GameConfig::default();
        assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
    }

    #[test]
    fn level_lookup_is_one_based() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.level(1).map(|l| l.rows), Some(5));
        assert_eq!(cfg.level(2).map(|l| l.colors), Some(5));
        assert!(cfg.level(0).is_none());
        assert!(cfg.level(3).is_none());
    }

    #[test]
    fn color_out_of_range_is_white() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.color(99), Color::WHITE);
        assert_eq!(cfg.color(0), Color::srgba(1.0, 0.2, 0.2, 0.85));
    }

    #[test]
    fn validate_flags_level_colors_beyond_palette() {
        let mut cfg = GameConfig::default();
        cfg.levels[0].colors = 9;
        let w = cfg.validate();
        assert!(w.iter().any(|m| m.contains("levels[0].colors")), "{w:?}");
    }

    #[test]
    fn validate_flags_disconnected_neighbor_radius() {
        let mut cfg = GameConfig::default();
        cfg.bubble.neighbor_radius = 5.0;
        let w = cfg.validate();
        assert!(w.iter().any(|m| m.contains("never connect")), "{w:?}");
    }

    #[test]
    fn layered_overlay_overrides_nested_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("game.ron");
        let local = dir.path().join("game.local.ron");
        fs::write(&base, "(shooter: (shoot_power: 800.0, reload_delay: 0.25))").expect("write");
        fs::write(&local, "(shooter: (shoot_power: 1200.0))").expect("write");
        let (cfg, used, errors) = GameConfig::load_layered([&base, &local]);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(used.len(), 2);
        assert_eq!(cfg.shooter.shoot_power, 1200.0);
        assert_eq!(cfg.shooter.reload_delay, 0.25);
        assert_eq!(cfg.shooter.max_angle, 60.0);
    }

    #[test]
    fn layered_missing_file_reports_and_defaults() {
        let (cfg, used, errors) =
            GameConfig::load_layered(["/definitely/not/here/game.ron"]);
        assert!(used.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(cfg, GameConfig::default());
    }

    #[test]
    fn zero_shots_warns_that_only_the_timer_ends_the_round() {
        let mut cfg = GameConfig::default();
        cfg.session.shots = 0;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("only the timer")), "{warnings:?}");
    }
}
