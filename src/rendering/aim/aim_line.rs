use bevy::prelude::*;

use crate::app::state::{AppState, RoundState};
use crate::core::components::{Projectile, Trail};
use crate::core::config::GameConfig;
use crate::core::system::system_order::GameSet;
use crate::gameplay::shooter::{
    predict_for_aim, stuck_positions, AimHit, Shooter, StuckObstacleFilter,
};
use crate::rendering::palette::palette::{
    lerp_color, with_alpha, AIM_END, AIM_HIT_BOUNDARY, AIM_HIT_BUBBLE, AIM_START,
};

pub struct AimLinePlugin;

impl Plugin for AimLinePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                draw_aim_line.run_if(in_state(RoundState::Running)),
                record_trails,
                draw_trails,
            )
                .chain()
                .in_set(GameSet::Presentation)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

/// Colour at the start and end of the aim line.
pub fn aim_colors(hit: Option<AimHit>) -> (Color, Color) {
    match hit {
        None => (AIM_START, AIM_END),
        Some(AimHit::Bubble) => (AIM_HIT_BUBBLE, with_alpha(AIM_HIT_BUBBLE, 0.4)),
        Some(AimHit::Boundary) => (AIM_HIT_BOUNDARY, with_alpha(AIM_HIT_BOUNDARY, 0.4)),
    }
}

fn draw_aim_line(
    cfg: Res<GameConfig>,
    q_shooter: Query<&Shooter>,
    q_stuck: Query<&Transform, StuckObstacleFilter>,
    mut gizmos: Gizmos,
) {
    if !cfg.aim_line.enabled {
        return;
    }
    let Ok(shooter) = q_shooter.single() else {
        return;
    };
    if !shooter.can_shoot {
        return;
    }
    let stuck = stuck_positions(q_stuck.iter());
    let prediction = predict_for_aim(&cfg, shooter.angle_deg, &stuck);
    let n = prediction.points.len().max(2) - 1;
    let (start, end) = aim_colors(prediction.hit);
    gizmos.linestrip_gradient_2d(
        prediction
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| (*p, lerp_color(start, end, i as f32 / n as f32))),
    );
    if let (Some(hit), Some(last)) = (prediction.hit, prediction.points.last()) {
        gizmos.circle_2d(Isometry2d::from_translation(*last), cfg.bubble.radius, aim_colors(Some(hit)).0);
    }
}

/// Ages samples, records the head while the bubble still flies, drops samples past `trail_secs`.
pub fn update_trail(trail: &mut Trail, head: Option<Vec2>, dt: f32, trail_secs: f32) {
    for (_, age) in trail.samples.iter_mut() {
        *age += dt;
    }
    if let Some(p) = head {
        trail.samples.push_front((p, 0.0));
    }
    while trail.samples.back().is_some_and(|(_, age)| *age > trail_secs) {
        trail.samples.pop_back();
    }
}

/// Head keeps the bubble colour; older samples fade to transparent.
pub fn trail_gradient(trail: &Trail, trail_secs: f32) -> Vec<(Vec2, Color)> {
    let span = trail_secs.max(f32::EPSILON);
    let base = trail.color.to_srgba().alpha;
    trail
        .samples
        .iter()
        .map(|(p, age)| (*p, with_alpha(trail.color, base * (1.0 - age / span).clamp(0.0, 1.0))))
        .collect()
}

fn record_trails(
    mut commands: Commands,
    time: Res<Time>,
    cfg: Res<GameConfig>,
    mut q: Query<(Entity, &Transform, &mut Trail, Has<Projectile>)>,
) {
    let dt = time.delta_secs();
    for (e, tf, mut trail, flying) in q.iter_mut() {
        let head = flying.then(|| tf.translation.truncate());
        update_trail(&mut trail, head, dt, cfg.timing.trail_secs);
        if !flying && trail.samples.is_empty() {
            commands.entity(e).try_remove::<Trail>();
        }
    }
}

fn draw_trails(cfg: Res<GameConfig>, q: Query<&Trail>, mut gizmos: Gizmos) {
    for trail in q.iter() {
        if trail.samples.len() < 2 {
            continue;
        }
        gizmos.linestrip_gradient_2d(trail_gradient(trail, cfg.timing.trail_secs));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_follow_the_hit_kind() {
        assert_eq!(aim_colors(None).0, AIM_START);
        assert_eq!(aim_colors(Some(AimHit::Bubble)).0, AIM_HIT_BUBBLE);
        assert_eq!(aim_colors(Some(AimHit::Boundary)).0, AIM_HIT_BOUNDARY);
    }

    #[test]
    fn trail_keeps_only_recent_samples() {
        let mut t = Trail::new(Color::srgba(1.0, 0.0, 0.0, 0.8));
        for i in 0..10 {
            update_trail(&mut t, Some(Vec2::new(i as f32, 0.0)), 0.1, 0.35);
        }
        // ages 0.0, 0.1, 0.2, 0.3 survive
        assert_eq!(t.samples.len(), 4);
        assert_eq!(t.samples.front().map(|s| s.0.x), Some(9.0));
        for _ in 0..10 {
            update_trail(&mut t, None, 0.1, 0.35);
        }
        assert!(t.samples.is_empty());
    }

    #[test]
    fn gradient_fades_with_age() {
        let mut t = Trail::new(Color::srgba(1.0, 0.0, 0.0, 0.8));
        update_trail(&mut t, Some(Vec2::ZERO), 0.0, 0.3);
        update_trail(&mut t, Some(Vec2::X), 0.15, 0.3);
        let g = trail_gradient(&t, 0.3);
        let a0 = g[0].1.to_srgba().alpha;
        let a1 = g[1].1.to_srgba().alpha;
        assert!((a0 - 0.8).abs() < 1e-5);
        assert!((a1 - 0.4).abs() < 1e-5);
    }
}
