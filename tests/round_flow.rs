use std::time::Duration;

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use bubble_shooter::app::state::{AppState, RoundState};
use bubble_shooter::core::components::{Bubble, GridBubble};
use bubble_shooter::core::system::system_order::configure_game_sets;
use bubble_shooter::gameplay::grid::GridPlugin;
use bubble_shooter::gameplay::session::{
    level_cleared_outcome, BubbleRng, GameSession, LastRoundOutcome, LevelAdvanceTimer,
    RoundEnded, RoundOutcome, SessionPlugin, StartLevel,
};
use bubble_shooter::interaction::cluster_pop::ClusterPopPlugin;
use bubble_shooter::rendering::materials::materials::build_bubble_visuals;
use bubble_shooter::GameConfig;

fn game_app(cfg: GameConfig) -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)));
    app.init_resource::<Assets<Mesh>>();
    app.init_resource::<Assets<ColorMaterial>>();
    let visuals = {
        let world = app.world_mut();
        world.resource_scope(|world, mut meshes: Mut<Assets<Mesh>>| {
            let mut materials = world.resource_mut::<Assets<ColorMaterial>>();
            build_bubble_visuals(&cfg, &mut meshes, &mut materials)
        })
    };
    app.insert_resource(visuals);
    app.insert_resource(cfg);
    app.insert_resource(BubbleRng::seeded(11));
    configure_game_sets(&mut app);
    app.init_state::<AppState>().init_state::<RoundState>();
    app.add_plugins((SessionPlugin, GridPlugin, ClusterPopPlugin));
    app
}

fn enter_game(app: &mut App) {
    app.world_mut()
        .resource_mut::<NextState<AppState>>()
        .set(AppState::InGame);
    for _ in 0..3 {
        app.update();
    }
}

fn round_state(app: &App) -> RoundState {
    *app.world().resource::<State<RoundState>>().get()
}

fn grid_count(app: &mut App) -> usize {
    let world = app.world_mut();
    world
        .query_filtered::<(), (With<Bubble>, With<GridBubble>)>()
        .iter(world)
        .count()
}

#[test]
fn entering_the_game_builds_level_one() {
    let mut app = game_app(GameConfig::default());
    enter_game(&mut app);
    assert_eq!(round_state(&app), RoundState::Running);
    assert_eq!(grid_count(&mut app), 40);
    let session = app.world().resource::<GameSession>();
    assert_eq!(session.level, 1);
    assert_eq!(session.live_count(), 40);
    assert_eq!(session.shots_remaining, 25);
    assert!(session.time_remaining > 59.0);
}

#[test]
fn start_level_resource_picks_the_first_level() {
    let mut app = game_app(GameConfig::default());
    app.insert_resource(StartLevel(2));
    enter_game(&mut app);
    assert_eq!(app.world().resource::<GameSession>().level, 2);
    assert_eq!(grid_count(&mut app), 56);
}

#[test]
fn running_out_of_time_ends_the_game() {
    let mut cfg = GameConfig::default();
    cfg.session.time_limit = 0.5;
    let mut app = game_app(cfg);
    enter_game(&mut app);
    for _ in 0..8 {
        app.update();
    }
    assert_eq!(round_state(&app), RoundState::GameOver);
    assert_eq!(
        app.world().resource::<LastRoundOutcome>().0,
        Some(RoundOutcome::TimeUp)
    );
    assert_eq!(app.world().resource::<GameSession>().time_remaining, 0.0);
}

#[test]
fn first_outcome_wins() {
    let mut app = game_app(GameConfig::default());
    enter_game(&mut app);
    app.world_mut().send_event(RoundEnded(RoundOutcome::BubbleLost));
    app.world_mut().send_event(RoundEnded(RoundOutcome::TimeUp));
    app.update();
    app.update();
    assert_eq!(round_state(&app), RoundState::GameOver);
    assert_eq!(
        app.world().resource::<LastRoundOutcome>().0,
        Some(RoundOutcome::BubbleLost)
    );
}

#[test]
fn clearing_a_level_advances_and_keeps_the_score() {
    let mut cfg = GameConfig::default();
    cfg.timing.level_advance_delay = 0.15;
    let outcome = level_cleared_outcome(&cfg, 1);
    let mut app = game_app(cfg);
    enter_game(&mut app);
    app.world_mut().resource_mut::<GameSession>().score = 700;
    app.world_mut().send_event(RoundEnded(outcome));
    app.update();
    app.update();
    assert_eq!(round_state(&app), RoundState::LevelComplete);
    assert!(app.world().get_resource::<LevelAdvanceTimer>().is_some());
    for _ in 0..6 {
        app.update();
    }
    assert_eq!(round_state(&app), RoundState::Running);
    let session = app.world().resource::<GameSession>();
    assert_eq!(session.level, 2);
    assert_eq!(session.score, 700);
    assert_eq!(session.live_count(), 56);
    assert!(app.world().get_resource::<LevelAdvanceTimer>().is_none());
    assert_eq!(app.world().resource::<LastRoundOutcome>().0, None);
}

#[test]
fn clearing_the_last_level_is_victory() {
    let cfg = GameConfig::default();
    let outcome = level_cleared_outcome(&cfg, 2);
    let mut app = game_app(cfg);
    app.insert_resource(StartLevel(2));
    enter_game(&mut app);
    app.world_mut().send_event(RoundEnded(outcome));
    app.update();
    app.update();
    assert_eq!(round_state(&app), RoundState::Victory);
}
