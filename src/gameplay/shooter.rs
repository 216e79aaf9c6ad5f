//! Cannon at the bottom of the arena: aim, fire the loaded bubble, reload.
use bevy::prelude::*;
use bevy::sprite::MeshMaterial2d;
use bevy_rapier2d::prelude::*;

use crate::app::state::{AppState, RoundState};
use crate::core::components::{Bubble, InGameEntity, LoadedBubble, Popping, Projectile, Stuck, Trail};
use crate::core::config::GameConfig;
use crate::core::system::system_order::GameSet;
use crate::gameplay::bubble::{spawn_bubble, BubbleRole};
use crate::gameplay::grid::load_round;
use crate::gameplay::session::{
    BubbleRng, GameSession, RoundEnded, RoundOutcome, ShotFired, ShotOutcome, StartRound,
};
use crate::interaction::input::input_interaction::ShooterInput;
use crate::rendering::materials::materials::BubbleVisuals;
use crate::rendering::palette::palette::ARENA_EDGE;

#[derive(Component, Debug, Clone)]
pub struct Shooter {
    /// 0 is straight up, positive turns toward -x.
    pub angle_deg: f32,
    pub can_shoot: bool,
    pub reload: Timer,
    pub loaded: Option<Entity>,
}

impl Shooter {
    pub fn new(reload_delay: f32) -> Self {
        let mut reload = Timer::from_seconds(reload_delay.max(0.0), TimerMode::Once);
        // first bubble loads right away
        reload.tick(reload.duration());
        Self {
            angle_deg: 0.0,
            can_shoot: false,
            reload,
            loaded: None,
        }
    }
}

#[derive(Component)]
struct ShooterBarrel;

pub fn aim_direction(angle_deg: f32) -> Vec2 {
    let t = angle_deg.to_radians();
    Vec2::new(-t.sin(), t.cos())
}

pub fn rotate_angle(angle_deg: f32, axis: f32, speed: f32, dt: f32, max_angle: f32) -> f32 {
    let max = max_angle.abs();
    (angle_deg + axis.clamp(-1.0, 1.0) * speed * dt).clamp(-max, max)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AimHit {
    Bubble,
    Boundary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPrediction {
    pub points: Vec<Vec2>,
    pub hit: Option<AimHit>,
}

/// Static geometry the aim line can run into.
#[derive(Debug, Clone, Copy)]
pub struct AimObstacles<'a> {
    /// Centres of settled bubbles.
    pub bubbles: &'a [Vec2],
    pub bubble_radius: f32,
    pub wall_half_width: f32,
    pub ceiling_y: f32,
}

/// Earliest hit along `p0 -> p1` as a segment parameter in `0..=1`.
fn segment_hit(p0: Vec2, p1: Vec2, obs: &AimObstacles) -> Option<(f32, AimHit)> {
    let r = obs.bubble_radius;
    let mut best: Option<(f32, AimHit)> = None;
    let mut consider = |t: f32, hit: AimHit| {
        if (0.0..=1.0).contains(&t) && best.is_none_or(|(bt, _)| t < bt) {
            best = Some((t, hit));
        }
    };

    let d = p1 - p0;
    let wall = obs.wall_half_width - r;
    if d.x > 0.0 && p1.x >= wall {
        consider(((wall - p0.x) / d.x).max(0.0), AimHit::Boundary);
    }
    if d.x < 0.0 && p1.x <= -wall {
        consider(((-wall - p0.x) / d.x).max(0.0), AimHit::Boundary);
    }
    let ceiling = obs.ceiling_y - r;
    if d.y > 0.0 && p1.y >= ceiling {
        consider(((ceiling - p0.y) / d.y).max(0.0), AimHit::Boundary);
    }

    // projectile circle vs bubble circle == point vs circle of summed radii
    let reach2 = (2.0 * r) * (2.0 * r);
    let a = d.length_squared();
    for &c in obs.bubbles {
        let f = p0 - c;
        let cc = f.length_squared() - reach2;
        if cc <= 0.0 {
            consider(0.0, AimHit::Bubble);
            continue;
        }
        if a <= f32::EPSILON {
            continue;
        }
        let b = 2.0 * f.dot(d);
        let disc = b * b - 4.0 * a * cc;
        if disc >= 0.0 {
            consider((-b - disc.sqrt()) / (2.0 * a), AimHit::Bubble);
        }
    }
    best
}

/// Samples `p(t) = start + v t + g t^2 / 2` over `[0, horizon]`, stopping at the first obstacle.
pub fn predict_trajectory(
    start: Vec2,
    velocity: Vec2,
    gravity: Vec2,
    points: usize,
    horizon: f32,
    obstacles: &AimObstacles,
) -> TrajectoryPrediction {
    let n = points.max(2);
    let step = horizon.max(0.0) / (n - 1) as f32;
    let at = |t: f32| start + velocity * t + gravity * (0.5 * t * t);
    let mut out = vec![start];
    let mut prev = start;
    for i in 1..n {
        let next = at(step * i as f32);
        if let Some((t, hit)) = segment_hit(prev, next, obstacles) {
            out.push(prev.lerp(next, t));
            return TrajectoryPrediction {
                points: out,
                hit: Some(hit),
            };
        }
        out.push(next);
        prev = next;
    }
    TrajectoryPrediction {
        points: out,
        hit: None,
    }
}

/// Prediction for the shooter's current aim, against the settled bubbles.
pub fn predict_for_aim(cfg: &GameConfig, angle_deg: f32, stuck: &[Vec2]) -> TrajectoryPrediction {
    let obstacles = AimObstacles {
        bubbles: stuck,
        bubble_radius: cfg.bubble.radius,
        wall_half_width: cfg.grid.wall_half_width,
        ceiling_y: cfg.grid.ceiling_y,
    };
    predict_trajectory(
        cfg.shooter_position(),
        aim_direction(angle_deg) * cfg.shooter.shoot_power,
        cfg.gravity(),
        cfg.aim_line.points,
        cfg.aim_line.horizon_secs,
        &obstacles,
    )
}

/// Settled bubble centres the aim line should collide with.
pub fn stuck_positions<'a>(q: impl IntoIterator<Item = &'a Transform>) -> Vec<Vec2> {
    q.into_iter().map(|tf| tf.translation.truncate()).collect()
}

pub type StuckObstacleFilter = (With<Bubble>, With<Stuck>, Without<Popping>);

pub struct ShooterPlugin;

impl Plugin for ShooterPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::InGame), spawn_shooter)
            .add_systems(
                Update,
                reset_shooter_on_round_start
                    .after(load_round)
                    .in_set(GameSet::Input)
                    .run_if(in_state(AppState::InGame)),
            )
            .add_systems(
                Update,
                (rotate_shooter, fire_shooter, reload_shooter, bob_loaded_bubble)
                    .chain()
                    .after(reset_shooter_on_round_start)
                    .in_set(GameSet::Input)
                    .run_if(in_state(AppState::InGame).and(in_state(RoundState::Running))),
            );
    }
}

pub fn spawn_shooter(
    mut commands: Commands,
    cfg: Res<GameConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let pos = cfg.shooter_position();
    let r = cfg.bubble.radius;
    let base_mat = materials.add(ARENA_EDGE);
    commands
        .spawn((
            Name::new("Shooter"),
            Shooter::new(cfg.shooter.reload_delay),
            InGameEntity,
            Transform::from_xyz(pos.x, pos.y, 0.5),
            Visibility::default(),
        ))
        .with_children(|p| {
            p.spawn((
                Mesh2d(meshes.add(Circle::new(r * 1.4))),
                MeshMaterial2d(base_mat.clone()),
                Transform::from_xyz(0.0, 0.0, -0.2),
            ));
            p.spawn((
                ShooterBarrel,
                Mesh2d(meshes.add(Rectangle::new(r * 0.8, r * 2.2))),
                MeshMaterial2d(base_mat),
                Transform::from_xyz(0.0, r * 1.4, -0.1),
            ));
        });
    info!(target: "shooter", "Shooter ready at ({:.0}, {:.0})", pos.x, pos.y);
}

fn reset_shooter_on_round_start(
    mut events: EventReader<StartRound>,
    mut q_shooter: Query<&mut Shooter>,
) {
    if events.read().last().is_none() {
        return;
    }
    for mut shooter in q_shooter.iter_mut() {
        shooter.loaded = None;
        shooter.can_shoot = false;
        let full = shooter.reload.duration();
        shooter.reload.reset();
        shooter.reload.tick(full);
    }
}

fn rotate_shooter(
    time: Res<Time>,
    input: Res<ShooterInput>,
    cfg: Res<GameConfig>,
    mut q_shooter: Query<(&mut Shooter, &mut Transform)>,
) {
    for (mut shooter, mut tf) in q_shooter.iter_mut() {
        if input.rotate != 0.0 {
            shooter.angle_deg = rotate_angle(
                shooter.angle_deg,
                input.rotate,
                cfg.shooter.rotation_speed,
                time.delta_secs(),
                cfg.shooter.max_angle,
            );
        }
        tf.rotation = Quat::from_rotation_z(shooter.angle_deg.to_radians());
    }
}

#[allow(clippy::too_many_arguments)]
pub fn fire_shooter(
    mut commands: Commands,
    input: Res<ShooterInput>,
    cfg: Res<GameConfig>,
    mut session: ResMut<GameSession>,
    mut rng: ResMut<BubbleRng>,
    mut q_shooter: Query<&mut Shooter>,
    q_loaded: Query<&Bubble, With<LoadedBubble>>,
    mut ew_shot: EventWriter<ShotFired>,
    mut ew_round: EventWriter<RoundEnded>,
) {
    if !input.fire {
        return;
    }
    for mut shooter in q_shooter.iter_mut() {
        if !shooter.can_shoot {
            continue;
        }
        let Some(loaded) = shooter.loaded else {
            continue;
        };
        let Ok(bubble) = q_loaded.get(loaded) else {
            shooter.loaded = None;
            continue;
        };
        let velocity = aim_direction(shooter.angle_deg) * cfg.shooter.shoot_power;
        commands
            .entity(loaded)
            .try_remove::<LoadedBubble>()
            .try_insert((
                RigidBody::Dynamic,
                GravityScale(1.0),
                Velocity::linear(velocity),
                Ccd::enabled(),
                Projectile,
                Trail::new(cfg.color(bubble.color_index)),
                Name::new("Projectile"),
            ));
        shooter.loaded = None;
        shooter.can_shoot = false;
        shooter.reload = Timer::from_seconds(cfg.shooter.reload_delay.max(0.0), TimerMode::Once);
        ew_shot.write(ShotFired {
            color_index: bubble.color_index,
        });
        let outcome = session.ball_shot(&mut rng.0, cfg.palette.len());
        debug!(
            target: "shooter",
            "Fired colour {} at {:.1} deg | {} shots left",
            bubble.color_index, shooter.angle_deg, session.shots_remaining
        );
        if outcome == ShotOutcome::OutOfShots {
            info!(target: "shooter", "Out of shots");
            ew_round.write(RoundEnded(RoundOutcome::OutOfShots));
        }
    }
}

fn reload_shooter(
    mut commands: Commands,
    time: Res<Time>,
    cfg: Res<GameConfig>,
    session: Res<GameSession>,
    visuals: Option<Res<BubbleVisuals>>,
    mut q_shooter: Query<&mut Shooter>,
) {
    let Some(visuals) = visuals else {
        return;
    };
    for mut shooter in q_shooter.iter_mut() {
        if shooter.can_shoot || session.shots_remaining == 0 {
            continue;
        }
        if !shooter.reload.tick(time.delta()).finished() {
            continue;
        }
        let e = spawn_bubble(
            &mut commands,
            &visuals,
            cfg.bubble.radius,
            cfg.shooter_position(),
            session.next_color,
            BubbleRole::Loaded,
        );
        shooter.loaded = Some(e);
        shooter.can_shoot = true;
    }
}

fn bob_loaded_bubble(
    time: Res<Time>,
    cfg: Res<GameConfig>,
    mut q: Query<(&mut LoadedBubble, &mut Transform)>,
) {
    for (mut loaded, mut tf) in q.iter_mut() {
        loaded.elapsed += time.delta_secs();
        tf.translation.x = loaded.anchor.x;
        tf.translation.y = loaded.anchor.y
            + (loaded.elapsed * cfg.shooter.bob_frequency).sin() * cfg.shooter.bob_amplitude;
    }
}
