//! Bubble spawning and contact handling: on first contact a fired bubble either sticks
//! (wall, ceiling, other colour) or schedules a cluster check (same colour).
use bevy::prelude::*;
use bevy::sprite::MeshMaterial2d;
use bevy_rapier2d::prelude::*;
use std::collections::HashSet;

use crate::app::state::{AppState, RoundState};
use crate::core::components::{
    ArenaBoundary, Bubble, GridBubble, InGameEntity, LoadedBubble, PendingMatchCheck,
    PendingStuckCheck, Popping, Projectile, QueuedForPop, Stuck,
};
use crate::core::config::GameConfig;
use crate::core::system::system_order::GameSet;
use crate::interaction::cluster_pop::{start_pop_sequence, ClusterPopped};
use crate::physics::clustering::cluster::{
    find_matching_cluster, has_same_color_neighbor, BubbleField, FieldEntry,
};
use crate::rendering::materials::materials::BubbleVisuals;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleRole {
    /// Part of the level layout: stuck from the start, counted in the live set.
    Grid,
    /// Waiting at the fire point.
    Loaded,
}

pub fn spawn_bubble(
    commands: &mut Commands,
    visuals: &BubbleVisuals,
    radius: f32,
    position: Vec2,
    color_index: usize,
    role: BubbleRole,
) -> Entity {
    let mut ec = commands.spawn((
        Bubble { color_index },
        Transform::from_xyz(position.x, position.y, 1.0),
        Visibility::default(),
        Mesh2d(visuals.mesh.clone()),
        MeshMaterial2d(visuals.body(color_index)),
        InGameEntity,
        (
            RigidBody::KinematicPositionBased,
            Collider::ball(radius),
            Velocity::zero(),
            GravityScale(0.0),
            LockedAxes::ROTATION_LOCKED,
            Restitution::coefficient(0.0),
            Friction::coefficient(0.0),
            ActiveEvents::COLLISION_EVENTS,
        ),
    ));
    match role {
        BubbleRole::Grid => {
            ec.insert((Stuck, GridBubble, Name::new("GridBubble")));
        }
        BubbleRole::Loaded => {
            ec.insert((
                LoadedBubble {
                    anchor: position,
                    elapsed: 0.0,
                },
                Name::new("LoadedBubble"),
            ));
        }
    }
    let halo_mesh = visuals.halo_mesh.clone();
    let halo_mat = visuals.halo(color_index);
    ec.with_children(|p| {
        p.spawn((
            Mesh2d(halo_mesh),
            MeshMaterial2d(halo_mat),
            Transform::from_xyz(0.0, 0.0, -0.1),
        ));
    });
    ec.id()
}

/// What a bubble is doing when a contact arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactSelf {
    pub color_index: usize,
    pub stuck: bool,
    /// Queued for or in the middle of a pop.
    pub reserved: bool,
    pub loaded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOther {
    Bubble { color_index: usize },
    Boundary(ArenaBoundary),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactResponse {
    Ignore,
    Stick,
    MatchCheck,
}

pub fn resolve_contact(me: ContactSelf, other: ContactOther) -> ContactResponse {
    if me.stuck || me.reserved || me.loaded {
        return ContactResponse::Ignore;
    }
    match other {
        ContactOther::Bubble { color_index } if color_index == me.color_index => {
            ContactResponse::MatchCheck
        }
        ContactOther::Bubble { .. } => ContactResponse::Stick,
        ContactOther::Boundary(ArenaBoundary::Wall | ArenaBoundary::Ceiling) => ContactResponse::Stick,
        ContactOther::Other => ContactResponse::Ignore,
    }
}

/// Freezes the bubble in place and schedules the neighbour probe.
pub fn stick_bubble(commands: &mut Commands, cfg: &GameConfig, entity: Entity) {
    commands
        .entity(entity)
        .try_insert((
            RigidBody::KinematicPositionBased,
            Velocity::zero(),
            GravityScale(0.0),
            Stuck,
            PendingStuckCheck(Timer::from_seconds(
                cfg.bubble.stuck_check_delay.max(0.0),
                TimerMode::Once,
            )),
        ))
        .try_remove::<Projectile>();
}

type BubbleContactQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static Bubble,
        Has<Stuck>,
        Has<QueuedForPop>,
        Has<Popping>,
        Has<LoadedBubble>,
        Has<PendingMatchCheck>,
    ),
>;

fn contact_self(q: &BubbleContactQuery, e: Entity) -> Option<(ContactSelf, bool)> {
    let (b, stuck, queued, popping, loaded, pending) = q.get(e).ok()?;
    Some((
        ContactSelf {
            color_index: b.color_index,
            stuck,
            reserved: queued || popping,
            loaded,
        },
        pending,
    ))
}

fn contact_other(q: &BubbleContactQuery, q_bounds: &Query<&ArenaBoundary>, e: Entity) -> ContactOther {
    if let Ok((b, _, _, _, loaded, _)) = q.get(e) {
        if loaded {
            return ContactOther::Other;
        }
        return ContactOther::Bubble {
            color_index: b.color_index,
        };
    }
    match q_bounds.get(e) {
        Ok(boundary) => ContactOther::Boundary(*boundary),
        Err(_) => ContactOther::Other,
    }
}

pub fn handle_bubble_contacts(
    mut commands: Commands,
    mut events: EventReader<CollisionEvent>,
    cfg: Res<GameConfig>,
    q_bubbles: BubbleContactQuery,
    q_bounds: Query<&ArenaBoundary>,
) {
    // one response per bubble per frame
    let mut handled: HashSet<Entity> = HashSet::new();
    for ev in events.read() {
        let CollisionEvent::Started(a, b, _) = ev else {
            continue;
        };
        for (me, other) in [(*a, *b), (*b, *a)] {
            if handled.contains(&me) {
                continue;
            }
            let Some((state, pending)) = contact_self(&q_bubbles, me) else {
                continue;
            };
            match resolve_contact(state, contact_other(&q_bubbles, &q_bounds, other)) {
                ContactResponse::Ignore => {}
                ContactResponse::Stick => {
                    debug!(target: "bubble", "{me:?} sticks on contact with {other:?}");
                    stick_bubble(&mut commands, &cfg, me);
                    handled.insert(me);
                }
                ContactResponse::MatchCheck => {
                    if !pending {
                        commands.entity(me).try_insert(PendingMatchCheck(Timer::from_seconds(
                            cfg.bubble.match_check_delay.max(0.0),
                            TimerMode::Once,
                        )));
                    }
                    handled.insert(me);
                }
            }
        }
    }
}

/// Bubbles eligible for clustering: everything except the loaded one and bubbles already popping.
pub type FieldFilter = (Without<LoadedBubble>, Without<QueuedForPop>, Without<Popping>);

pub fn build_field<'a>(
    cfg: &GameConfig,
    bubbles: impl IntoIterator<Item = (Entity, &'a Transform, &'a Bubble)>,
) -> BubbleField {
    BubbleField::from_entries(
        cfg.bubble.radius,
        cfg.bubble.neighbor_radius + cfg.bubble.radius,
        bubbles.into_iter().map(|(entity, tf, b)| FieldEntry {
            entity,
            position: tf.translation.truncate(),
            color_index: b.color_index,
        }),
    )
}

/// Pops the cluster around `start` when it is large enough. Members already claimed this
/// frame by another check are left to that sequence.
fn try_pop_cluster(
    commands: &mut Commands,
    cfg: &GameConfig,
    field: &BubbleField,
    start: Entity,
    claimed: &mut HashSet<Entity>,
    ew: &mut EventWriter<ClusterPopped>,
) -> bool {
    let cluster = find_matching_cluster(field, start, cfg.bubble.neighbor_radius);
    if cluster.len() < cfg.bubble.min_cluster_size {
        debug!(target: "cluster", "{start:?}: cluster of {} below threshold", cluster.len());
        return false;
    }
    if cluster.iter().any(|e| claimed.contains(e)) {
        return true;
    }
    claimed.extend(cluster.iter().copied());
    let color_index = field.get(start).map(|e| e.color_index).unwrap_or_default();
    let centroid = cluster
        .iter()
        .filter_map(|e| field.get(*e).map(|f| f.position))
        .sum::<Vec2>()
        / cluster.len() as f32;
    start_pop_sequence(commands, &cluster, cfg.timing.pop_stagger);
    ew.write(ClusterPopped {
        color_index,
        bubble_count: cluster.len(),
        centroid,
    });
    true
}

pub fn run_pending_match_checks(
    mut commands: Commands,
    time: Res<Time>,
    cfg: Res<GameConfig>,
    mut q_pending: Query<(Entity, &mut PendingMatchCheck, Has<Stuck>, Has<QueuedForPop>)>,
    q_field: Query<(Entity, &Transform, &Bubble), FieldFilter>,
    mut ew: EventWriter<ClusterPopped>,
) {
    let mut ready = Vec::new();
    for (e, mut pending, stuck, queued) in q_pending.iter_mut() {
        if pending.tick(time.delta()).finished() {
            commands.entity(e).try_remove::<PendingMatchCheck>();
            if !queued {
                ready.push((e, stuck));
            }
        }
    }
    if ready.is_empty() {
        return;
    }
    let field = build_field(&cfg, q_field.iter());
    let mut claimed = HashSet::new();
    for (e, stuck) in ready {
        if claimed.contains(&e) {
            continue;
        }
        let popped = try_pop_cluster(&mut commands, &cfg, &field, e, &mut claimed, &mut ew);
        if !popped && !stuck {
            stick_bubble(&mut commands, &cfg, e);
        }
    }
}

pub fn run_pending_stuck_checks(
    mut commands: Commands,
    time: Res<Time>,
    cfg: Res<GameConfig>,
    mut q_pending: Query<(Entity, &mut PendingStuckCheck, Has<QueuedForPop>)>,
    q_field: Query<(Entity, &Transform, &Bubble), FieldFilter>,
    mut ew: EventWriter<ClusterPopped>,
) {
    let mut ready = Vec::new();
    for (e, mut pending, queued) in q_pending.iter_mut() {
        if pending.tick(time.delta()).finished() {
            commands.entity(e).try_remove::<PendingStuckCheck>();
            if !queued {
                ready.push(e);
            }
        }
    }
    if ready.is_empty() {
        return;
    }
    let field = build_field(&cfg, q_field.iter());
    let mut claimed = HashSet::new();
    for e in ready {
        if claimed.contains(&e)
            || !has_same_color_neighbor(&field, e, cfg.bubble.stuck_probe_radius)
        {
            continue;
        }
        try_pop_cluster(&mut commands, &cfg, &field, e, &mut claimed, &mut ew);
    }
}

pub struct BubblePlugin;

impl Plugin for BubblePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, handle_bubble_contacts.in_set(GameSet::Contacts))
            .add_systems(
                Update,
                (run_pending_match_checks, run_pending_stuck_checks)
                    .chain()
                    .in_set(GameSet::Clusters)
                    .run_if(in_state(AppState::InGame).and(
                        in_state(RoundState::Running).or(in_state(RoundState::LevelComplete)),
                    )),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;
    use bevy::time::TimeUpdateStrategy;
    use bevy_rapier2d::rapier::geometry::CollisionEventFlags;
    use std::time::Duration;

    fn flying(color_index: usize) -> ContactSelf {
        ContactSelf {
            color_index,
            ..default()
        }
    }

    #[test]
    fn same_color_contact_schedules_match() {
        assert_eq!(
            resolve_contact(flying(1), ContactOther::Bubble { color_index: 1 }),
            ContactResponse::MatchCheck
        );
    }

    #[test]
    fn other_color_or_boundary_sticks() {
        assert_eq!(
            resolve_contact(flying(1), ContactOther::Bubble { color_index: 2 }),
            ContactResponse::Stick
        );
        assert_eq!(
            resolve_contact(flying(1), ContactOther::Boundary(ArenaBoundary::Wall)),
            ContactResponse::Stick
        );
        assert_eq!(
            resolve_contact(flying(1), ContactOther::Boundary(ArenaBoundary::Ceiling)),
            ContactResponse::Stick
        );
        assert_eq!(resolve_contact(flying(1), ContactOther::Other), ContactResponse::Ignore);
    }

    #[test]
    fn settled_bubbles_ignore_contacts() {
        let other = ContactOther::Bubble { color_index: 1 };
        for me in [
            ContactSelf { stuck: true, ..flying(1) },
            ContactSelf { reserved: true, ..flying(1) },
            ContactSelf { loaded: true, ..flying(1) },
        ] {
            assert_eq!(resolve_contact(me, other), ContactResponse::Ignore);
        }
    }

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin));
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(60)));
        app.insert_resource(GameConfig::default());
        app.add_event::<CollisionEvent>();
        app.add_event::<ClusterPopped>();
        app.insert_state(AppState::InGame).init_state::<RoundState>();
        crate::core::system::system_order::configure_game_sets(&mut app);
        app.add_plugins(BubblePlugin);
        app
    }

    fn spawn_stuck(app: &mut App, x: f32, color_index: usize) -> Entity {
        app.world_mut()
            .spawn((
                Bubble { color_index },
                Stuck,
                RigidBody::KinematicPositionBased,
                Transform::from_xyz(x, 0.0, 0.0),
            ))
            .id()
    }

    fn spawn_projectile(app: &mut App, pos: Vec2, color_index: usize) -> Entity {
        app.world_mut()
            .spawn((
                Bubble { color_index },
                Projectile,
                RigidBody::Dynamic,
                Velocity::linear(Vec2::new(0.0, 500.0)),
                Transform::from_xyz(pos.x, pos.y, 0.0),
            ))
            .id()
    }

    fn collide(app: &mut App, a: Entity, b: Entity) {
        app.world_mut()
            .send_event(CollisionEvent::Started(a, b, CollisionEventFlags::empty()));
    }

    #[test]
    fn matching_contact_pops_cluster_of_three() {
        let mut app = test_app();
        let a = spawn_stuck(&mut app, 0.0, 1);
        let b = spawn_stuck(&mut app, 48.0, 1);
        let shot = spawn_projectile(&mut app, Vec2::new(24.0, -41.0), 1);
        collide(&mut app, shot, b);
        for _ in 0..3 {
            app.update();
        }
        for e in [a, b, shot] {
            assert!(app.world().get::<QueuedForPop>(e).is_some(), "{e:?} queued");
        }
    }

    #[test]
    fn matching_contact_with_pair_only_sticks() {
        let mut app = test_app();
        let a = spawn_stuck(&mut app, 0.0, 1);
        let shot = spawn_projectile(&mut app, Vec2::new(0.0, -48.0), 1);
        collide(&mut app, a, shot);
        for _ in 0..3 {
            app.update();
        }
        assert!(app.world().get::<QueuedForPop>(shot).is_none());
        assert!(app.world().get::<Stuck>(shot).is_some());
        assert!(app.world().get::<Projectile>(shot).is_none());
        assert_eq!(
            app.world().get::<RigidBody>(shot),
            Some(&RigidBody::KinematicPositionBased)
        );
    }

    #[test]
    fn wall_contact_sticks_immediately() {
        let mut app = test_app();
        let wall = app
            .world_mut()
            .spawn((ArenaBoundary::Wall, Transform::default()))
            .id();
        let shot = spawn_projectile(&mut app, Vec2::new(220.0, 0.0), 0);
        collide(&mut app, shot, wall);
        app.update();
        assert!(app.world().get::<Stuck>(shot).is_some());
        assert!(app.world().get::<PendingStuckCheck>(shot).is_some());
        assert_eq!(app.world().get::<Velocity>(shot).map(|v| v.linvel), Some(Vec2::ZERO));
    }

    #[test]
    fn stuck_probe_pops_a_cluster_formed_by_a_mismatched_hit() {
        let mut app = test_app();
        // Shot hits the blue bubble but lands next to two reds.
        let blue = spawn_stuck(&mut app, 100.0, 4);
        let r1 = spawn_stuck(&mut app, 0.0, 0);
        let r2 = spawn_stuck(&mut app, 48.0, 0);
        let shot = spawn_projectile(&mut app, Vec2::new(72.0, -41.0), 0);
        collide(&mut app, shot, blue);
        for _ in 0..4 {
            app.update();
        }
        for e in [r1, r2, shot] {
            assert!(app.world().get::<QueuedForPop>(e).is_some(), "{e:?} queued");
        }
        assert!(app.world().get::<QueuedForPop>(blue).is_none());
    }

    #[test]
    fn cluster_checks_wait_while_paused() {
        let mut app = test_app();
        app.world_mut()
            .resource_mut::<NextState<RoundState>>()
            .set(RoundState::Paused);
        let a = spawn_stuck(&mut app, 0.0, 1);
        let b = spawn_stuck(&mut app, 48.0, 1);
        let shot = spawn_projectile(&mut app, Vec2::new(24.0, -41.0), 1);
        collide(&mut app, shot, b);
        for _ in 0..4 {
            app.update();
        }
        for e in [a, b, shot] {
            assert!(app.world().get::<QueuedForPop>(e).is_none(), "{e:?} popped while paused");
        }
        assert!(app.world().get::<PendingMatchCheck>(shot).is_some());

        app.world_mut()
            .resource_mut::<NextState<RoundState>>()
            .set(RoundState::Running);
        for _ in 0..3 {
            app.update();
        }
        for e in [a, b, shot] {
            assert!(app.world().get::<QueuedForPop>(e).is_some(), "{e:?} queued after resume");
        }
    }
}
