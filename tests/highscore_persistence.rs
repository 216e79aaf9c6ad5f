use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use bubble_shooter::app::state::AppState;
use bubble_shooter::core::system::system_order::configure_game_sets;
use bubble_shooter::gameplay::highscore::{HighScore, HighScorePlugin};
use bubble_shooter::gameplay::session::{GameSession, RoundEnded, RoundOutcome};
use bubble_shooter::GameConfig;

fn app(path: &std::path::Path) -> App {
    let mut cfg = GameConfig::default();
    cfg.highscore.path = Some(path.to_string_lossy().into_owned());
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin));
    app.insert_resource(cfg);
    app.init_resource::<GameSession>();
    app.add_event::<RoundEnded>();
    configure_game_sets(&mut app);
    app.init_state::<AppState>();
    app.add_plugins(HighScorePlugin);
    app.world_mut()
        .resource_mut::<NextState<AppState>>()
        .set(AppState::InGame);
    app.update();
    app
}

#[test]
fn best_score_survives_a_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("best.json");

    let mut first = app(&path);
    assert_eq!(first.world().resource::<HighScore>().best, 0);
    first.world_mut().resource_mut::<GameSession>().score = 1500;
    first.update();
    assert_eq!(first.world().resource::<HighScore>().best, 1500);
    first.world_mut().send_event(RoundEnded(RoundOutcome::TimeUp));
    first.update();
    assert!(!first.world().resource::<HighScore>().dirty);
    assert!(path.exists());

    let second = app(&path);
    assert_eq!(second.world().resource::<HighScore>().best, 1500);
}

#[test]
fn lower_score_does_not_overwrite() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("best.json");
    std::fs::write(&path, r#"{"best": 900}"#).expect("seed file");

    let mut app = app(&path);
    app.world_mut().resource_mut::<GameSession>().score = 400;
    app.world_mut().send_event(RoundEnded(RoundOutcome::OutOfShots));
    app.update();
    let high = app.world().resource::<HighScore>();
    assert_eq!(high.best, 900);
    assert!(!high.dirty);
    assert!(std::fs::read_to_string(&path).expect("read").contains("900"));
}
