//! Overlay panels for pause, level complete, game over and victory, plus the shared
//! button widget the main menu also uses.
use bevy::ecs::hierarchy::ChildSpawnerCommands;
use bevy::prelude::*;
use bevy_rapier2d::prelude::RapierConfiguration;

use crate::app::state::{AppState, RoundState};
use crate::core::components::InGameEntity;
use crate::core::system::system_order::GameSet;
use crate::gameplay::session::{GameSession, LastRoundOutcome, StartLevel, StartRound};
use crate::interaction::input::input_interaction::ShooterInput;
use crate::physics::rapier::rapier_physics::set_physics_active;
use crate::rendering::palette::palette::{
    BUTTON_HOVERED, BUTTON_NORMAL, BUTTON_PRESSED, PANEL_BG, TEXT_ACCENT, TEXT_PRIMARY,
};

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Play,
    Resume,
    Restart,
    MainMenu,
    Quit,
}

impl ButtonAction {
    pub fn label(self) -> &'static str {
        match self {
            ButtonAction::Play => "Play",
            ButtonAction::Resume => "Resume",
            ButtonAction::Restart => "Restart",
            ButtonAction::MainMenu => "Main Menu",
            ButtonAction::Quit => "Quit",
        }
    }
}

/// Overlay spawned for one `RoundState`; removed when that state exits.
#[derive(Component, Debug, Clone, Copy)]
pub struct RoundPanel(pub RoundState);

pub struct PanelsPlugin;

impl Plugin for PanelsPlugin {
    fn build(&self, app: &mut App) {
        for state in [
            RoundState::Paused,
            RoundState::LevelComplete,
            RoundState::GameOver,
            RoundState::Victory,
        ] {
            app.add_systems(OnEnter(state), spawn_round_panel)
                .add_systems(OnExit(state), despawn_round_panels);
        }
        app.add_systems(
            Update,
            toggle_pause
                .in_set(GameSet::Input)
                .run_if(in_state(AppState::InGame)),
        )
        .add_systems(Update, (tint_buttons, handle_button_actions).chain());
    }
}

pub fn spawn_button(parent: &mut ChildSpawnerCommands, action: ButtonAction) {
    parent
        .spawn((
            Button,
            action,
            Node {
                width: Val::Px(200.0),
                height: Val::Px(48.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BorderRadius::all(Val::Px(6.0)),
            BackgroundColor(BUTTON_NORMAL),
        ))
        .with_children(|b| {
            b.spawn((
                Text::new(action.label()),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(TEXT_PRIMARY),
            ));
        });
}

/// Title, optional detail lines and buttons for each overlay.
pub fn panel_content(
    state: RoundState,
    outcome: Option<&LastRoundOutcome>,
    score: u32,
) -> (&'static str, Vec<String>, Vec<ButtonAction>) {
    use ButtonAction::*;
    match state {
        RoundState::Paused => ("PAUSED", vec![], vec![Resume, Restart, MainMenu]),
        RoundState::LevelComplete => ("LEVEL COMPLETE", vec![format!("Score: {score}")], vec![]),
        RoundState::GameOver => {
            let mut lines = Vec::new();
            if let Some(o) = outcome.and_then(|o| o.0) {
                lines.push(o.describe().to_string());
            }
            lines.push(format!("Final score: {score}"));
            ("GAME OVER", lines, vec![Restart, MainMenu, Quit])
        }
        RoundState::Victory => (
            "YOU WIN!",
            vec![format!("Final score: {score}")],
            vec![Restart, MainMenu],
        ),
        RoundState::Running => ("", vec![], vec![]),
    }
}

fn spawn_round_panel(
    mut commands: Commands,
    state: Res<State<RoundState>>,
    app_state: Res<State<AppState>>,
    last: Res<LastRoundOutcome>,
    session: Res<GameSession>,
) {
    if *app_state.get() != AppState::InGame {
        return;
    }
    let state = *state.get();
    let (title, lines, buttons) = panel_content(state, Some(&last), session.score);
    commands
        .spawn((
            RoundPanel(state),
            InGameEntity,
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(12.0),
                ..default()
            },
            BackgroundColor(PANEL_BG),
            GlobalZIndex(10),
        ))
        .with_children(|p| {
            p.spawn((
                Text::new(title),
                TextFont {
                    font_size: 56.0,
                    ..default()
                },
                TextColor(TEXT_ACCENT),
            ));
            for line in lines {
                p.spawn((Text::new(line), TextColor(TEXT_PRIMARY)));
            }
            for action in buttons {
                spawn_button(p, action);
            }
        });
    info!(target: "hud", "Showing {title:?} panel");
}

fn despawn_round_panels(mut commands: Commands, q: Query<Entity, With<RoundPanel>>) {
    for e in q.iter() {
        commands.entity(e).try_despawn();
    }
}

fn toggle_pause(
    input: Res<ShooterInput>,
    state: Res<State<RoundState>>,
    mut next: ResMut<NextState<RoundState>>,
    mut q_rapier: Query<&mut RapierConfiguration>,
) {
    if !input.toggle_pause {
        return;
    }
    match state.get() {
        RoundState::Running => {
            set_physics_active(&mut q_rapier, false);
            next.set(RoundState::Paused);
        }
        RoundState::Paused => {
            set_physics_active(&mut q_rapier, true);
            next.set(RoundState::Running);
        }
        _ => {}
    }
}

#[allow(clippy::type_complexity)]
fn tint_buttons(
    mut q: Query<(&Interaction, &mut BackgroundColor), (Changed<Interaction>, With<Button>)>,
) {
    for (interaction, mut bg) in q.iter_mut() {
        bg.0 = match interaction {
            Interaction::Pressed => BUTTON_PRESSED,
            Interaction::Hovered => BUTTON_HOVERED,
            Interaction::None => BUTTON_NORMAL,
        };
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_button_actions(
    q: Query<(&Interaction, &ButtonAction), Changed<Interaction>>,
    start: Res<StartLevel>,
    mut next_app: ResMut<NextState<AppState>>,
    mut next_round: ResMut<NextState<RoundState>>,
    mut ew_start: EventWriter<StartRound>,
    mut ew_exit: EventWriter<AppExit>,
    mut q_rapier: Query<&mut RapierConfiguration>,
) {
    for (interaction, action) in q.iter() {
        if *interaction != Interaction::Pressed {
            continue;
        }
        info!(target: "hud", "Button pressed: {}", action.label());
        match action {
            ButtonAction::Play => next_app.set(AppState::InGame),
            ButtonAction::Resume => {
                set_physics_active(&mut q_rapier, true);
                next_round.set(RoundState::Running);
            }
            ButtonAction::Restart => {
                ew_start.write(StartRound {
                    level: start.0,
                    keep_score: false,
                });
            }
            ButtonAction::MainMenu => next_app.set(AppState::MainMenu),
            ButtonAction::Quit => {
                ew_exit.write(AppExit::Success);
            }
        }
    }
}
