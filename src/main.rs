use std::path::PathBuf;

use anyhow::Context;
use bevy::prelude::*;
use clap::Parser;

use bubble_shooter::gameplay::session::{BubbleRng, StartLevel};
use bubble_shooter::interaction::session::config_hot_reload::ConfigReloadSettings;
use bubble_shooter::{GameConfig, GamePlugin};

const DEFAULT_LAYERS: [&str; 2] = ["assets/config/game.ron", "assets/config/game.local.ron"];

#[derive(Parser, Debug)]
#[command(name = "bubble_shooter", version, about = "Physics-driven bubble shooter")]
struct Cli {
    /// Config layer; repeat to stack (later layers win). Replaces the default layers.
    #[arg(long = "config")]
    config: Vec<PathBuf>,
    /// Level to start on (1-based).
    #[arg(long)]
    level: Option<u32>,
    /// Seed for bubble colours.
    #[arg(long)]
    seed: Option<u64>,
    /// Exit after this many seconds.
    #[arg(long = "auto-close")]
    auto_close: Option<f32>,
}

fn main() -> anyhow::Result<()> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let cli = Cli::parse();
    let layers: Vec<PathBuf> = if cli.config.is_empty() {
        DEFAULT_LAYERS.iter().map(PathBuf::from).collect()
    } else {
        for p in &cli.config {
            std::fs::metadata(p).with_context(|| format!("config layer {}", p.display()))?;
        }
        cli.config.clone()
    };

    let (mut cfg, used, errors) = GameConfig::load_layered(&layers);
    if let Some(level) = cli.level {
        if cfg.level(level).is_none() {
            anyhow::bail!("--level {level} outside 1..={}", cfg.levels.len());
        }
    }
    if let Some(secs) = cli.auto_close {
        cfg.window.auto_close = secs;
    }

    // Reported once logging is up; the default local overlay is optional.
    let optional_missing = |e: &String| cli.config.is_empty() && e.contains("game.local.ron") && e.contains("read error");
    let mut notes: Vec<String> = errors.into_iter().filter(|e| !optional_missing(e)).collect();
    notes.extend(cfg.validate());

    let mut app = App::new();
    app.insert_resource(cfg.clone())
        .insert_resource(StartLevel(cli.level.unwrap_or(1)))
        .insert_resource(ConfigReloadSettings {
            paths: layers,
            ..default()
        });
    if let Some(seed) = cli.seed {
        app.insert_resource(BubbleRng::seeded(seed));
    }
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: cfg.window.title.clone(),
            resolution: (cfg.window.width, cfg.window.height).into(),
            resizable: true,
            ..default()
        }),
        ..default()
    }))
    .add_plugins(GamePlugin)
    .add_systems(Startup, move || {
        info!(target: "config", "Config layers used: {:?}", used);
        for n in &notes {
            warn!(target: "config", "{n}");
        }
    });

    match app.run() {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => anyhow::bail!("app exited with code {code}"),
    }
}
