#[cfg(feature = "debug")]
use bevy::prelude::*;
#[cfg(feature = "debug")]
use bevy_rapier2d::render::DebugRenderContext;

/// F1 flips the Rapier wireframe.
#[cfg(feature = "debug")]
pub fn toggle_rapier_debug_system(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    ctx: Option<ResMut<DebugRenderContext>>,
) {
    let (Some(keys), Some(mut ctx)) = (keys, ctx) else {
        return;
    };
    if keys.just_pressed(KeyCode::F1) {
        ctx.enabled = !ctx.enabled;
        info!(target: "debug", "Rapier debug render: {}", ctx.enabled);
    }
}
