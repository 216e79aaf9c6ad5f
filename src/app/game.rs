use bevy::prelude::*;
use bevy_rapier2d::prelude::RapierConfiguration;

use crate::app::menu::MenuPlugin;
use crate::app::state::{AppState, RoundState};
use crate::core::components::InGameEntity;
use crate::core::system::system_order::configure_game_sets;
use crate::debug::DebugPlugin;
use crate::gameplay::bubble::BubblePlugin;
use crate::gameplay::death_zone::DeathZonePlugin;
use crate::gameplay::grid::GridPlugin;
use crate::gameplay::highscore::HighScorePlugin;
use crate::gameplay::session::SessionPlugin;
use crate::gameplay::shooter::ShooterPlugin;
use crate::interaction::cluster_pop::ClusterPopPlugin;
use crate::interaction::input::input_interaction::InputInteractionPlugin;
use crate::interaction::session::auto_close::AutoClosePlugin;
use crate::interaction::session::config_hot_reload::ConfigHotReloadPlugin;
use crate::physics::rapier::rapier_physics::{set_physics_active, PhysicsSetupPlugin};
use crate::rendering::aim::aim_line::AimLinePlugin;
use crate::rendering::camera::camera::CameraPlugin;
use crate::rendering::hud::hud::HudPlugin;
use crate::rendering::hud::panels::PanelsPlugin;
use crate::rendering::materials::materials::MaterialsPlugin;

/// Everything except windowing/rendering backends; expects `GameConfig` to be inserted first.
pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        configure_game_sets(app);
        app.init_state::<AppState>()
            .init_state::<RoundState>()
            .add_plugins((
                PhysicsSetupPlugin,
                MaterialsPlugin,
                CameraPlugin,
                MenuPlugin,
                SessionPlugin,
                GridPlugin,
                ShooterPlugin,
                BubblePlugin,
                DeathZonePlugin,
                ClusterPopPlugin,
                HighScorePlugin,
            ))
            .add_plugins((
                InputInteractionPlugin,
                AimLinePlugin,
                HudPlugin,
                PanelsPlugin,
                DebugPlugin,
                ConfigHotReloadPlugin,
                AutoClosePlugin,
            ))
            .add_systems(OnExit(AppState::InGame), cleanup_in_game);
    }
}

fn cleanup_in_game(
    mut commands: Commands,
    q: Query<Entity, With<InGameEntity>>,
    mut next_round: ResMut<NextState<RoundState>>,
    mut q_rapier: Query<&mut RapierConfiguration>,
) {
    let mut n = 0;
    for e in q.iter() {
        commands.entity(e).try_despawn();
        n += 1;
    }
    next_round.set(RoundState::Running);
    set_physics_active(&mut q_rapier, true);
    info!(target: "session", "Left the game; despawned {n} entities");
}
