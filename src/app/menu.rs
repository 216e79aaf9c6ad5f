use bevy::prelude::*;
use bevy::ui::{AlignItems, FlexDirection, JustifyContent, Node};

use super::state::AppState;
use crate::gameplay::highscore::HighScore;
use crate::rendering::hud::panels::{spawn_button, ButtonAction};
use crate::rendering::palette::palette::{PANEL_BG, TEXT_ACCENT, TEXT_PRIMARY};

pub struct MenuPlugin;

impl Plugin for MenuPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::MainMenu), (show_menu_instructions, spawn_menu_ui))
            .add_systems(
                Update,
                (handle_menu_input, refresh_best_score).run_if(in_state(AppState::MainMenu)),
            )
            .add_systems(OnExit(AppState::MainMenu), despawn_menu_ui);
    }
}

#[derive(Component)]
struct MenuUiRoot;
#[derive(Component)]
struct MenuBestText;

fn show_menu_instructions(high: Res<HighScore>) {
    info!(target: "menu", "=== BUBBLE SHOOTER ===");
    info!(target: "menu", "Best score: {}", high.display());
    info!(target: "menu", "Press Enter/Space or click Play to start");
}

fn handle_menu_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let Some(keys) = keys else {
        return;
    };
    if keys.any_just_pressed([KeyCode::Enter, KeyCode::Space]) {
        info!(target: "menu", "Starting game");
        next_state.set(AppState::InGame);
    }
}

fn spawn_menu_ui(mut commands: Commands, high: Res<HighScore>) {
    commands
        .spawn((
            MenuUiRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(16.0),
                ..default()
            },
            BackgroundColor(PANEL_BG),
        ))
        .with_children(|p| {
            p.spawn((
                Text::new("BUBBLE SHOOTER"),
                TextFont {
                    font_size: 64.0,
                    ..default()
                },
                TextColor(TEXT_ACCENT),
            ));
            p.spawn((
                MenuBestText,
                Text::new(format!("BEST: {}", high.display())),
                TextColor(TEXT_PRIMARY),
            ));
            spawn_button(p, ButtonAction::Play);
            spawn_button(p, ButtonAction::Quit);
            p.spawn((
                Text::new("A/D or arrows to aim, Space or click to shoot, Esc to pause"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(TEXT_PRIMARY),
            ));
        });
}

fn refresh_best_score(high: Res<HighScore>, mut q: Query<&mut Text, With<MenuBestText>>) {
    if !high.is_changed() {
        return;
    }
    for mut text in q.iter_mut() {
        text.0 = format!("BEST: {}", high.display());
    }
}

fn despawn_menu_ui(mut commands: Commands, q_root: Query<Entity, With<MenuUiRoot>>) {
    for e in &q_root {
        commands.entity(e).despawn();
    }
}
