use bevy::prelude::*;
use std::collections::VecDeque;

/// Every bubble in play, whether loaded, flying, stuck or popping.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bubble {
    pub color_index: usize,
}

/// Immobile (kinematic) bubble; no longer reacts to contacts.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct Stuck;

/// A fired bubble that is still moving.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct Projectile;

/// Bubble resting at the fire point, waiting to be shot.
#[derive(Component, Debug, Clone, Copy)]
pub struct LoadedBubble {
    pub anchor: Vec2,
    pub elapsed: f32,
}

/// Bubble placed by the level layout; these make up the live set.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct GridBubble;

/// Static collider roles that make a bubble stick.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaBoundary {
    Wall,
    Ceiling,
}

/// Sensor below the shooter; any bubble touching it ends the round.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct DeathZone;

/// Delayed cluster search after a same-colour contact.
#[derive(Component, Debug, Clone, Deref, DerefMut)]
pub struct PendingMatchCheck(pub Timer);

/// Delayed neighbour probe after sticking.
#[derive(Component, Debug, Clone, Deref, DerefMut)]
pub struct PendingStuckCheck(pub Timer);

/// Reserved by a pop sequence; excluded from clusters and contact handling.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct QueuedForPop;

/// Shrink-out animation; the entity despawns when the timer finishes.
#[derive(Component, Debug, Clone)]
pub struct Popping {
    pub timer: Timer,
    pub base_scale: Vec3,
}

/// Fading trail behind a fired bubble.
#[derive(Component, Debug, Clone)]
pub struct Trail {
    pub color: Color,
    /// (position, age in seconds), newest first.
    pub samples: VecDeque<(Vec2, f32)>,
}
impl Trail {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            samples: VecDeque::new(),
        }
    }
}

/// Every entity owned by a running game (arena, bubbles, shooter); despawned on leaving `InGame`.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct InGameEntity;
