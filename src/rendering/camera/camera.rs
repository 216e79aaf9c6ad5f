use bevy::prelude::*;
use rand::Rng;

use crate::core::config::{CameraConfig, GameConfig};
use crate::core::system::system_order::GameSet;
use crate::gameplay::session::{RoundEnded, RoundOutcome};
use crate::gameplay::shooter::Shooter;
use crate::interaction::cluster_pop::ClusterPopped;
use crate::rendering::palette::palette::CLEAR_COLOR;

/// Smoothed follow position plus a decaying shake on top.
#[derive(Component, Debug, Default, Clone)]
pub struct CameraFollow {
    pub base: Vec2,
    pub shake: Shake,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Shake {
    pub remaining: f32,
    pub duration: f32,
    pub magnitude: f32,
}

impl Shake {
    /// Restarts the shake; a stronger pending one is kept.
    pub fn trigger(&mut self, duration: f32, magnitude: f32) {
        if self.remaining > 0.0 && self.magnitude > magnitude {
            return;
        }
        self.duration = duration.max(0.0);
        self.remaining = self.duration;
        self.magnitude = magnitude.max(0.0);
    }

    /// Current amplitude, fading linearly to zero.
    pub fn amplitude(&self) -> f32 {
        if self.remaining <= 0.0 || self.duration <= 0.0 {
            return 0.0;
        }
        self.magnitude * (self.remaining / self.duration)
    }

    pub fn advance(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }
}

pub fn follow_target(cfg: &CameraConfig, shooter: Vec2) -> Vec2 {
    let t = shooter + Vec2::from_array(cfg.follow_offset);
    let (lo, hi) = if cfg.min_y <= cfg.max_y {
        (cfg.min_y, cfg.max_y)
    } else {
        (cfg.max_y, cfg.min_y)
    };
    Vec2::new(t.x, t.y.clamp(lo, hi))
}

pub fn smooth_follow(current: Vec2, target: Vec2, smooth_speed: f32, dt: f32) -> Vec2 {
    current.lerp(target, (smooth_speed * dt).clamp(0.0, 1.0))
}

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(CLEAR_COLOR))
            .add_systems(Startup, setup_camera)
            .add_systems(
                Update,
                (trigger_camera_shake, follow_shooter)
                    .chain()
                    .in_set(GameSet::Presentation),
            );
    }
}

fn setup_camera(mut commands: Commands, cfg: Res<GameConfig>) {
    let start = follow_target(&cfg.camera, cfg.shooter_position());
    // Bevy 0.16+: spawn Camera2d component directly; Required Components supply defaults.
    commands.spawn((
        Camera2d,
        CameraFollow {
            base: start,
            shake: Shake::default(),
        },
        Transform::from_xyz(start.x, start.y, 0.0),
    ));
}

fn trigger_camera_shake(
    cfg: Res<GameConfig>,
    mut popped: EventReader<ClusterPopped>,
    mut ended: EventReader<RoundEnded>,
    mut q_cam: Query<&mut CameraFollow>,
) {
    let mut strength = 0.0_f32;
    for ev in popped.read() {
        // bigger clusters kick harder
        strength = strength.max(1.0 + (ev.bubble_count.saturating_sub(3) as f32) * 0.25);
    }
    for RoundEnded(outcome) in ended.read() {
        if *outcome == RoundOutcome::BubbleLost {
            strength = strength.max(2.0);
        }
    }
    if strength <= 0.0 {
        return;
    }
    for mut follow in q_cam.iter_mut() {
        follow
            .shake
            .trigger(cfg.camera.shake_duration, cfg.camera.shake_magnitude * strength);
    }
}

fn follow_shooter(
    time: Res<Time>,
    cfg: Res<GameConfig>,
    q_shooter: Query<&GlobalTransform, With<Shooter>>,
    mut q_cam: Query<(&mut CameraFollow, &mut Transform)>,
) {
    let Ok((mut follow, mut tf)) = q_cam.single_mut() else {
        return;
    };
    let dt = time.delta_secs();
    if let Ok(shooter) = q_shooter.single() {
        let target = follow_target(&cfg.camera, shooter.translation().truncate());
        follow.base = smooth_follow(follow.base, target, cfg.camera.smooth_speed, dt);
    }
    let amp = follow.shake.amplitude();
    let offset = if amp > 0.0 {
        let mut rng = rand::thread_rng();
        Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)) * amp
    } else {
        Vec2::ZERO
    };
    follow.shake.advance(dt);
    tf.translation.x = follow.base.x + offset.x;
    tf.translation.y = follow.base.y + offset.y;
}
