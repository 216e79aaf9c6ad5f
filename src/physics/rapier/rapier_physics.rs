use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::core::config::GameConfig;

pub struct PhysicsSetupPlugin; // our wrapper to configure Rapier for the playfield

impl Plugin for PhysicsSetupPlugin {
    fn build(&self, app: &mut App) {
        let (ppm, debug) = app
            .world()
            .get_resource::<GameConfig>()
            .map(|c| (c.physics.pixels_per_meter.max(1.0), c.rapier_debug))
            .unwrap_or((40.0, false));
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(ppm))
            .add_systems(Startup, configure_gravity);
        // The debug build always installs the renderer so F1 can toggle it.
        if debug || cfg!(feature = "debug") {
            app.add_plugins(RapierDebugRenderPlugin {
                enabled: debug,
                ..default()
            });
        }
    }
}

fn configure_gravity(mut q_cfg: Query<&mut RapierConfiguration>, game_cfg: Res<GameConfig>) {
    // RapierConfiguration lives on the context entity (component, not resource).
    if let Ok(mut cfg) = q_cfg.single_mut() {
        cfg.gravity = game_cfg.gravity();
        info!(target: "physics", "Rapier gravity set to {:?}", cfg.gravity);
    } else {
        warn!(target: "physics", "RapierConfiguration missing; default gravity in effect");
    }
}

/// Freeze or resume the simulation (stand-in for a zero time scale).
pub fn set_physics_active(q_cfg: &mut Query<&mut RapierConfiguration>, active: bool) {
    for mut cfg in q_cfg.iter_mut() {
        if cfg.physics_pipeline_active != active {
            cfg.physics_pipeline_active = active;
            debug!(target: "physics", "physics pipeline active={active}");
        }
    }
}
