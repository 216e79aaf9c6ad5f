//! In-game HUD: score, countdown, level, shots left, best score and the next-ball swatch.
use bevy::prelude::*;

use crate::app::state::AppState;
use crate::core::components::InGameEntity;
use crate::core::config::GameConfig;
use crate::core::system::system_order::GameSet;
use crate::gameplay::highscore::HighScore;
use crate::gameplay::session::GameSession;
use crate::rendering::palette::palette::{lerp_color, TEXT_ACCENT, TEXT_PRIMARY, TEXT_WARNING};

#[derive(Component)]
pub struct HudRoot;
#[derive(Component)]
pub struct ScoreText;
#[derive(Component)]
pub struct TimeText;
#[derive(Component)]
pub struct LevelText;
#[derive(Component)]
pub struct BallsText;
#[derive(Component)]
pub struct BestText;
#[derive(Component)]
pub struct NextBallSwatch;

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::InGame), spawn_hud).add_systems(
            Update,
            (update_hud_texts, flash_low_time, update_next_ball)
                .in_set(GameSet::Presentation)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

pub fn score_label(score: u32) -> String {
    format!("Score: {score}")
}

pub fn time_label(session: &GameSession) -> String {
    format!("Time: {}", session.time_display())
}

pub fn best_label(high: &HighScore) -> String {
    format!("BEST: {}", high.display())
}

/// 0 -> 1 -> 0 over two seconds at `rate` 1.
pub fn ping_pong(t: f32) -> f32 {
    let m = t.rem_euclid(2.0);
    if m > 1.0 {
        2.0 - m
    } else {
        m
    }
}

fn spawn_hud(mut commands: Commands) {
    let font = TextFont {
        font_size: 26.0,
        ..default()
    };
    commands
        .spawn((
            HudRoot,
            InGameEntity,
            Node {
                width: Val::Percent(100.0),
                justify_content: JustifyContent::SpaceBetween,
                padding: UiRect::all(Val::Px(12.0)),
                ..default()
            },
        ))
        .with_children(|root| {
            root.spawn(Node {
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(4.0),
                ..default()
            })
            .with_children(|col| {
                col.spawn((ScoreText, Text::new(score_label(0)), font.clone()));
                col.spawn((TimeText, Text::new("Time: 0"), font.clone(), TextColor(TEXT_PRIMARY)));
                col.spawn((LevelText, Text::new("Level: 1"), font.clone()));
                col.spawn((BallsText, Text::new("Balls: 0"), font.clone()));
            });
            root.spawn(Node {
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::FlexEnd,
                row_gap: Val::Px(6.0),
                ..default()
            })
            .with_children(|col| {
                col.spawn((BestText, Text::new("BEST: 000000"), font.clone(), TextColor(TEXT_ACCENT)));
                col.spawn((Text::new("Next"), font.clone()));
                col.spawn((
                    NextBallSwatch,
                    Node {
                        width: Val::Px(32.0),
                        height: Val::Px(32.0),
                        ..default()
                    },
                    BorderRadius::MAX,
                    BackgroundColor(Color::WHITE),
                ));
            });
        });
}

fn set_text(text: &mut Text, value: String) {
    if text.0 != value {
        text.0 = value;
    }
}

#[allow(clippy::type_complexity)]
fn update_hud_texts(
    session: Res<GameSession>,
    high: Res<HighScore>,
    mut q: ParamSet<(
        Query<&mut Text, With<ScoreText>>,
        Query<&mut Text, With<TimeText>>,
        Query<&mut Text, With<LevelText>>,
        Query<&mut Text, With<BallsText>>,
        Query<&mut Text, With<BestText>>,
    )>,
) {
    if !session.is_changed() && !high.is_changed() {
        return;
    }
    if let Ok(mut t) = q.p0().single_mut() {
        set_text(&mut t, score_label(session.score));
    }
    if let Ok(mut t) = q.p1().single_mut() {
        set_text(&mut t, time_label(&session));
    }
    if let Ok(mut t) = q.p2().single_mut() {
        set_text(&mut t, format!("Level: {}", session.level));
    }
    if let Ok(mut t) = q.p3().single_mut() {
        set_text(&mut t, format!("Balls: {}", session.shots_remaining));
    }
    if let Ok(mut t) = q.p4().single_mut() {
        set_text(&mut t, best_label(&high));
    }
}

fn flash_low_time(
    time: Res<Time>,
    cfg: Res<GameConfig>,
    session: Res<GameSession>,
    mut q: Query<&mut TextColor, With<TimeText>>,
) {
    let Ok(mut color) = q.single_mut() else {
        return;
    };
    let next = if session.time_remaining > 0.0 && session.time_remaining < cfg.hud.low_time_warning {
        lerp_color(TEXT_WARNING, TEXT_PRIMARY, ping_pong(time.elapsed_secs() * 2.0))
    } else if session.time_remaining <= 0.0 {
        TEXT_WARNING
    } else {
        TEXT_PRIMARY
    };
    if color.0 != next {
        color.0 = next;
    }
}

fn update_next_ball(
    cfg: Res<GameConfig>,
    session: Res<GameSession>,
    mut q: Query<&mut BackgroundColor, With<NextBallSwatch>>,
) {
    let Ok(mut bg) = q.single_mut() else {
        return;
    };
    let c = cfg.color(session.next_color);
    if bg.0 != c {
        bg.0 = c;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;

    #[test]
    fn ping_pong_bounces() {
        assert_eq!(ping_pong(0.0), 0.0);
        assert!((ping_pong(0.5) - 0.5).abs() < 1e-6);
        assert!((ping_pong(1.5) - 0.5).abs() < 1e-6);
        assert!((ping_pong(2.0)).abs() < 1e-6);
    }

    #[test]
    fn labels() {
        let mut s = GameSession::default();
        s.time_remaining = 9.2;
        assert_eq!(time_label(&s), "Time: 10");
        assert_eq!(score_label(1200), "Score: 1200");
        let mut h = HighScore::default();
        h.observe(42);
        assert_eq!(best_label(&h), "BEST: 000042");
    }

    #[test]
    fn hud_texts_track_the_session() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin));
        app.insert_resource(GameConfig::default());
        app.init_resource::<GameSession>();
        app.init_resource::<HighScore>();
        app.init_state::<AppState>();
        crate::core::system::system_order::configure_game_sets(&mut app);
        app.add_plugins(HudPlugin);
        app.world_mut()
            .resource_mut::<NextState<AppState>>()
            .set(AppState::InGame);
        app.update();
        {
            let mut s = app.world_mut().resource_mut::<GameSession>();
            s.score = 700;
            s.shots_remaining = 12;
        }
        app.update();
        let mut q = app.world_mut().query_filtered::<&Text, With<ScoreText>>();
        let score: Vec<String> = q.iter(app.world()).map(|t| t.0.clone()).collect();
        assert_eq!(score, vec!["Score: 700".to_string()]);
        let mut q = app.world_mut().query_filtered::<&Text, With<BallsText>>();
        let balls: Vec<String> = q.iter(app.world()).map(|t| t.0.clone()).collect();
        assert_eq!(balls, vec!["Balls: 12".to_string()]);
    }
}
