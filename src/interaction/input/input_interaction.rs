use bevy::prelude::*;

use crate::app::state::AppState;
use crate::core::system::system_order::GameSet;

/// Per-frame player intent, decoupled from the devices that produce it.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct ShooterInput {
    /// -1 (rotate right / clockwise) ..= 1 (rotate left).
    pub rotate: f32,
    pub fire: bool,
    pub toggle_pause: bool,
}

pub struct InputInteractionPlugin;

impl Plugin for InputInteractionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ShooterInput>().add_systems(
            Update,
            gather_shooter_input
                .in_set(GameSet::Input)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

/// A/D or arrows rotate; Space or left click fires; Esc pauses.
pub fn read_shooter_input(keys: &ButtonInput<KeyCode>, mouse: &ButtonInput<MouseButton>) -> ShooterInput {
    let mut rotate = 0.0;
    if keys.pressed(KeyCode::KeyA) || keys.pressed(KeyCode::ArrowLeft) {
        rotate += 1.0;
    }
    if keys.pressed(KeyCode::KeyD) || keys.pressed(KeyCode::ArrowRight) {
        rotate -= 1.0;
    }
    ShooterInput {
        rotate,
        fire: keys.just_pressed(KeyCode::Space) || mouse.just_pressed(MouseButton::Left),
        toggle_pause: keys.just_pressed(KeyCode::Escape),
    }
}

fn gather_shooter_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mouse: Option<Res<ButtonInput<MouseButton>>>,
    mut input: ResMut<ShooterInput>,
) {
    let (Some(keys), Some(mouse)) = (keys, mouse) else {
        return;
    };
    let next = read_shooter_input(&keys, &mouse);
    if *input != next {
        *input = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_keys_cancel() {
        let mut keys = ButtonInput::<KeyCode>::default();
        let mouse = ButtonInput::<MouseButton>::default();
        keys.press(KeyCode::KeyA);
        assert_eq!(read_shooter_input(&keys, &mouse).rotate, 1.0);
        keys.press(KeyCode::ArrowRight);
        assert_eq!(read_shooter_input(&keys, &mouse).rotate, 0.0);
    }

    #[test]
    fn fire_from_space_or_left_click() {
        let mut keys = ButtonInput::<KeyCode>::default();
        let mut mouse = ButtonInput::<MouseButton>::default();
        assert!(!read_shooter_input(&keys, &mouse).fire);
        mouse.press(MouseButton::Left);
        assert!(read_shooter_input(&keys, &mouse).fire);
        mouse.clear();
        mouse.release(MouseButton::Left);
        keys.press(KeyCode::Space);
        assert!(read_shooter_input(&keys, &mouse).fire);
    }

    #[test]
    fn escape_toggles_pause() {
        let mut keys = ButtonInput::<KeyCode>::default();
        let mouse = ButtonInput::<MouseButton>::default();
        keys.press(KeyCode::Escape);
        assert!(read_shooter_input(&keys, &mouse).toggle_pause);
    }
}
