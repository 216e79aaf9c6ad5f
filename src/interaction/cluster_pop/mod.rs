use bevy::prelude::*;
use bevy_rapier2d::prelude::{ColliderDisabled, RigidBody, Velocity};
use std::collections::VecDeque;

use crate::app::state::RoundState;
use crate::core::components::{Bubble, InGameEntity, Popping, QueuedForPop};
use crate::core::config::GameConfig;
use crate::core::system::system_order::GameSet;
use crate::gameplay::session::{level_cleared_outcome, GameSession, RoundEnded};

/// Emitted once when a qualifying cluster is committed to popping.
#[derive(Event, Debug, Clone)]
pub struct ClusterPopped {
    pub color_index: usize,
    pub bubble_count: usize,
    pub centroid: Vec2,
}

/// Emitted for every bubble as it actually pops.
#[derive(Event, Debug, Clone, Copy)]
pub struct BubblePopped {
    pub entity: Entity,
    pub color_index: usize,
    pub position: Vec2,
}

/// Staggered pop: the first member pops on the next pass, then one per `timer` period.
#[derive(Component, Debug)]
pub struct PopSequence {
    pub pending: VecDeque<Entity>,
    pub timer: Timer,
    started: bool,
}

impl PopSequence {
    pub fn new(members: &[Entity], stagger: f32) -> Self {
        Self {
            pending: members.iter().copied().collect(),
            timer: Timer::from_seconds(stagger.max(0.0), TimerMode::Repeating),
            started: false,
        }
    }
}

/// Reserves `members` and spawns the sequence entity that pops them.
pub fn start_pop_sequence(commands: &mut Commands, members: &[Entity], stagger: f32) -> Entity {
    for &m in members {
        commands.entity(m).try_insert(QueuedForPop);
    }
    commands
        .spawn((PopSequence::new(members, stagger), InGameEntity, Name::new("PopSequence")))
        .id()
}

/// Applies one pop: score, live-set removal, collider off and the shrink animation.
/// Returns the event to publish and whether this emptied the live set.
pub fn pop_bubble(
    commands: &mut Commands,
    session: &mut GameSession,
    cfg: &GameConfig,
    entity: Entity,
    bubble: &Bubble,
    transform: &Transform,
) -> (BubblePopped, bool) {
    session.add_score(cfg.scoring.points_per_bubble);
    let cleared = session.bubble_destroyed(entity);
    commands.entity(entity).try_insert((
        ColliderDisabled,
        RigidBody::KinematicPositionBased,
        Velocity::zero(),
        Popping {
            timer: Timer::from_seconds(cfg.timing.pop_duration.max(0.0), TimerMode::Once),
            base_scale: transform.scale,
        },
    ));
    (
        BubblePopped {
            entity,
            color_index: bubble.color_index,
            position: transform.translation.truncate(),
        },
        cleared,
    )
}

pub struct ClusterPopPlugin;

impl Plugin for ClusterPopPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ClusterPopped>()
            .add_event::<BubblePopped>()
            .add_systems(
                Update,
                (advance_pop_sequences, animate_popping)
                    .chain()
                    .in_set(GameSet::Pop)
                    .run_if(in_state(RoundState::Running).or(in_state(RoundState::LevelComplete))),
            )
            .add_systems(Update, log_cluster_pops.in_set(GameSet::Presentation));
    }
}

#[allow(clippy::too_many_arguments)]
fn advance_pop_sequences(
    mut commands: Commands,
    time: Res<Time>,
    cfg: Res<GameConfig>,
    mut session: ResMut<GameSession>,
    mut q_seq: Query<(Entity, &mut PopSequence)>,
    q_bubbles: Query<(&Bubble, &Transform), Without<Popping>>,
    mut ew_popped: EventWriter<BubblePopped>,
    mut ew_round: EventWriter<RoundEnded>,
) {
    for (seq_entity, mut seq) in q_seq.iter_mut() {
        let mut due = if seq.started {
            seq.timer.tick(time.delta());
            seq.timer.times_finished_this_tick() as usize
        } else {
            seq.started = true;
            1
        };
        while due > 0 {
            let Some(next) = seq.pending.pop_front() else {
                break;
            };
            // despawned (death zone, restart) while waiting
            let Ok((bubble, tf)) = q_bubbles.get(next) else {
                continue;
            };
            let (ev, cleared) = pop_bubble(&mut commands, &mut session, &cfg, next, bubble, tf);
            ew_popped.write(ev);
            if cleared {
                info!(target: "pop", "Last bubble popped on level {}", session.level);
                ew_round.write(RoundEnded(level_cleared_outcome(&cfg, session.level)));
            }
            due -= 1;
        }
        if seq.pending.is_empty() {
            commands.entity(seq_entity).despawn();
        }
    }
}

fn animate_popping(
    mut commands: Commands,
    time: Res<Time>,
    mut q: Query<(Entity, &mut Popping, &mut Transform)>,
) {
    for (entity, mut popping, mut tf) in q.iter_mut() {
        popping.timer.tick(time.delta());
        let t = popping.timer.fraction();
        tf.scale = popping.base_scale.lerp(Vec3::ZERO, t);
        if popping.timer.finished() {
            commands.entity(entity).try_despawn();
        }
    }
}

fn log_cluster_pops(mut er: EventReader<ClusterPopped>) {
    for ev in er.read() {
        info!(
            target: "pop",
            "Cluster popped: {} x colour {} at ({:.0}, {:.0})",
            ev.bubble_count, ev.color_index, ev.centroid.x, ev.centroid.y
        );
    }
}
