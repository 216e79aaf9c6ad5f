#[cfg(feature = "debug")]
use crate::core::components::{Bubble, Projectile, Stuck};
#[cfg(feature = "debug")]
use crate::gameplay::session::GameSession;
#[cfg(feature = "debug")]
use bevy::prelude::*;

#[cfg(feature = "debug")]
#[derive(Resource, Debug)]
pub struct DebugState {
    pub frame_counter: u64,
    pub time_accum: f32,
    pub log_interval: f32,
}
#[cfg(feature = "debug")]
impl Default for DebugState {
    fn default() -> Self {
        Self {
            frame_counter: 0,
            time_accum: 0.0,
            log_interval: 1.0,
        }
    }
}

#[cfg(feature = "debug")]
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct DebugStats {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub bubbles: usize,
    pub projectiles: usize,
    pub stuck: usize,
    pub live: usize,
    pub score: u32,
    pub time_left: u32,
}

/// Exponential moving average; the first sample seeds it.
#[cfg(feature = "debug")]
pub fn smooth(prev: f32, sample: f32) -> f32 {
    if prev == 0.0 {
        sample
    } else {
        prev * 0.9 + sample * 0.1
    }
}

#[cfg(feature = "debug")]
pub fn debug_stats_collect_system(
    time: Res<Time>,
    mut state: ResMut<DebugState>,
    mut stats: ResMut<DebugStats>,
    session: Res<GameSession>,
    q_bubbles: Query<(Has<Projectile>, Has<Stuck>), With<Bubble>>,
) {
    state.frame_counter += 1;
    let dt = time.delta_secs().max(1e-6);
    stats.fps = smooth(stats.fps, 1.0 / dt);
    stats.frame_time_ms = smooth(stats.frame_time_ms, dt * 1000.0);
    let (mut total, mut flying, mut stuck) = (0, 0, 0);
    for (p, s) in q_bubbles.iter() {
        total += 1;
        flying += p as usize;
        stuck += s as usize;
    }
    stats.bubbles = total;
    stats.projectiles = flying;
    stats.stuck = stuck;
    stats.live = session.live_count();
    stats.score = session.score;
    stats.time_left = session.time_display();
}

#[cfg(all(test, feature = "debug"))]
mod tests {
    use super::*;

    #[test]
    fn smoothing_seeds_then_averages() {
        assert_eq!(smooth(0.0, 60.0), 60.0);
        assert!((smooth(60.0, 30.0) - 57.0).abs() < 1e-4);
    }
}
