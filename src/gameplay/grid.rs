use bevy::prelude::*;
use bevy::sprite::MeshMaterial2d;
use bevy_rapier2d::prelude::*;
use rand::Rng;

use crate::app::state::{AppState, RoundState};
use crate::core::components::{ArenaBoundary, Bubble, DeathZone, InGameEntity};
use crate::core::config::{GameConfig, GridConfig, LevelSpec};
use crate::core::system::system_order::GameSet;
use crate::gameplay::bubble::{spawn_bubble, BubbleRole};
use crate::gameplay::session::{
    BubbleRng, GameSession, LastRoundOutcome, LevelAdvanceTimer, StartRound,
};
use crate::interaction::cluster_pop::PopSequence;
use crate::physics::rapier::rapier_physics::set_physics_active;
use crate::rendering::materials::materials::BubbleVisuals;
use crate::rendering::palette::palette::{with_alpha, ARENA_EDGE};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSlot {
    pub row: u32,
    pub col: u32,
    pub position: Vec2,
}

/// Offset-row layout centred on x = 0; odd rows shift right by half a spacing.
pub fn grid_positions(spec: &LevelSpec, grid: &GridConfig) -> Vec<GridSlot> {
    let half_width = (spec.cols.saturating_sub(1)) as f32 * grid.spacing * 0.5;
    let mut out = Vec::with_capacity((spec.rows * spec.cols) as usize);
    for row in 0..spec.rows {
        let shift = if row % 2 == 1 { grid.spacing * 0.5 } else { 0.0 };
        let y = row as f32 * grid.spacing * grid.row_height_factor + grid.base_y;
        for col in 0..spec.cols {
            let x = col as f32 * grid.spacing + shift - half_width;
            out.push(GridSlot {
                row,
                col,
                position: Vec2::new(x, y),
            });
        }
    }
    out
}

/// Spawns the layout for `spec` and registers every bubble in the session's live set.
pub fn spawn_level_grid(
    commands: &mut Commands,
    cfg: &GameConfig,
    visuals: &BubbleVisuals,
    spec: &LevelSpec,
    session: &mut GameSession,
    rng: &mut impl Rng,
) -> usize {
    let colors = spec.colors.clamp(1, cfg.palette.len().max(1));
    let slots = grid_positions(spec, &cfg.grid);
    for slot in &slots {
        let color_index = rng.gen_range(0..colors);
        let e = spawn_bubble(
            commands,
            visuals,
            cfg.bubble.radius,
            slot.position,
            color_index,
            BubbleRole::Grid,
        );
        session.register_live(e);
    }
    info!(
        target: "level",
        "Level {}: spawned {} bubbles ({} rows x {} cols, {} colours)",
        session.level,
        slots.len(),
        spec.rows,
        spec.cols,
        colors
    );
    slots.len()
}

/// Removes every bubble left from a previous round (grid, loaded, flying, popping).
pub fn despawn_bubbles(commands: &mut Commands, q: &Query<Entity, With<Bubble>>) {
    for e in q.iter() {
        commands.entity(e).despawn();
    }
}

const WALL_THICKNESS: f32 = 20.0;

/// Side walls, ceiling and the death-zone sensor.
pub fn spawn_arena(
    mut commands: Commands,
    cfg: Res<GameConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let g = &cfg.grid;
    let half_t = WALL_THICKNESS * 0.5;
    let wall_half_h = (g.ceiling_y - g.death_zone_y) * 0.5 + WALL_THICKNESS;
    let mid_y = (g.ceiling_y + g.death_zone_y) * 0.5;
    let edge = materials.add(with_alpha(ARENA_EDGE, 0.6));
    let danger = materials.add(with_alpha(Color::srgb(1.0, 0.2, 0.2), 0.25));

    for (side, x) in [("WallLeft", -g.wall_half_width - half_t), ("WallRight", g.wall_half_width + half_t)] {
        commands.spawn((
            Name::new(side),
            ArenaBoundary::Wall,
            InGameEntity,
            RigidBody::Fixed,
            Collider::cuboid(half_t, wall_half_h),
            Transform::from_xyz(x, mid_y, 0.0),
            Visibility::default(),
            Mesh2d(meshes.add(Rectangle::new(WALL_THICKNESS, wall_half_h * 2.0))),
            MeshMaterial2d(edge.clone()),
        ));
    }

    let span = g.wall_half_width + WALL_THICKNESS;
    commands.spawn((
        Name::new("Ceiling"),
        ArenaBoundary::Ceiling,
        InGameEntity,
        RigidBody::Fixed,
        Collider::cuboid(span, half_t),
        Transform::from_xyz(0.0, g.ceiling_y + half_t, 0.0),
        Visibility::default(),
        Mesh2d(meshes.add(Rectangle::new(span * 2.0, WALL_THICKNESS))),
        MeshMaterial2d(edge),
    ));

    commands.spawn((
        Name::new("DeathZone"),
        DeathZone,
        InGameEntity,
        RigidBody::Fixed,
        Collider::cuboid(span * 2.0, half_t),
        Sensor,
        ActiveEvents::COLLISION_EVENTS,
        Transform::from_xyz(0.0, g.death_zone_y - half_t, 0.0),
        Visibility::default(),
        Mesh2d(meshes.add(Rectangle::new(g.wall_half_width * 2.0, 4.0))),
        MeshMaterial2d(danger),
    ));
    info!(
        target: "level",
        "Arena ready: walls at +/-{}, ceiling {}, death zone {}",
        g.wall_half_width, g.ceiling_y, g.death_zone_y
    );
}

pub struct GridPlugin;

impl Plugin for GridPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::InGame), spawn_arena).add_systems(
            Update,
            load_round
                .in_set(GameSet::Input)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

/// Rebuilds the playfield for the most recent `StartRound` request.
#[allow(clippy::too_many_arguments)]
pub fn load_round(
    mut commands: Commands,
    mut events: EventReader<StartRound>,
    cfg: Res<GameConfig>,
    visuals: Option<Res<BubbleVisuals>>,
    mut session: ResMut<GameSession>,
    mut rng: ResMut<BubbleRng>,
    q_bubbles: Query<Entity, With<Bubble>>,
    q_sequences: Query<Entity, With<PopSequence>>,
    mut next_round: ResMut<NextState<RoundState>>,
    mut last: ResMut<LastRoundOutcome>,
    mut q_rapier: Query<&mut RapierConfiguration>,
) {
    let Some(request) = events.read().last().copied() else {
        return;
    };
    let Some(visuals) = visuals else {
        warn!(target: "level", "Bubble visuals not ready; round start skipped");
        return;
    };
    let level = match cfg.level(request.level) {
        Some(_) => request.level,
        None if !cfg.levels.is_empty() => {
            warn!(
                target: "level",
                "Level {} not configured; starting level 1 instead",
                request.level
            );
            1
        }
        None => {
            error!(target: "level", "No levels configured");
            return;
        }
    };
    let Some(spec) = cfg.level(level).copied() else {
        return;
    };

    despawn_bubbles(&mut commands, &q_bubbles);
    for e in q_sequences.iter() {
        commands.entity(e).despawn();
    }
    if !request.keep_score {
        session.score = 0;
    }
    session.new_round(level, &cfg, &mut rng.0);
    spawn_level_grid(&mut commands, &cfg, &visuals, &spec, &mut session, &mut rng.0);
    last.0 = None;
    commands.remove_resource::<LevelAdvanceTimer>();
    set_physics_active(&mut q_rapier, true);
    next_round.set(RoundState::Running);
    info!(
        target: "level",
        "Round started: level {} | score {} | {} shots | {:.0}s",
        session.level, session.score, session.shots_remaining, session.time_remaining
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn positions_follow_offset_row_formula() {
        let grid = GridConfig::default();
        let spec = LevelSpec {
            rows: 2,
            cols: 8,
            colors: 3,
        };
        let slots = grid_positions(&spec, &grid);
        assert_eq!(slots.len(), 16);
        // row 0 is centred
        assert!((slots[0].position.x + 168.0).abs() < 1e-4);
        assert!((slots[7].position.x - 168.0).abs() < 1e-4);
        assert!((slots[0].position.y - 20.0).abs() < 1e-4);
        // row 1 shifts right by half a spacing and rises by spacing * 0.866
        let r1 = slots[8];
        assert_eq!((r1.row, r1.col), (1, 0));
        assert!((r1.position.x + 144.0).abs() < 1e-4);
        assert!((r1.position.y - (20.0 + 48.0 * 0.866)).abs() < 1e-4);
    }

    #[test]
    fn layout_fits_inside_the_walls() {
        let cfg = GameConfig::default();
        for spec in &cfg.levels {
            for slot in grid_positions(spec, &cfg.grid) {
                assert!(slot.position.x.abs() + cfg.bubble.radius <= cfg.grid.wall_half_width);
                assert!(slot.position.y + cfg.bubble.radius <= cfg.grid.ceiling_y);
            }
        }
    }

    #[test]
    fn spawn_registers_every_bubble_as_live() {
        let cfg = GameConfig::default();
        let mut world = World::new();
        let mut meshes = Assets::<Mesh>::default();
        let mut materials = Assets::<ColorMaterial>::default();
        let visuals = crate::rendering::materials::materials::build_bubble_visuals(
            &cfg,
            &mut meshes,
            &mut materials,
        );
        let mut session = GameSession::default();
        let mut rng = StdRng::seed_from_u64(3);
        session.new_round(1, &cfg, &mut rng);
        let spec = *cfg.level(1).expect("level 1");
        let mut queue = bevy::ecs::world::CommandQueue::default();
        let n = {
            let mut commands = Commands::new(&mut queue, &world);
            spawn_level_grid(&mut commands, &cfg, &visuals, &spec, &mut session, &mut rng)
        };
        queue.apply(&mut world);
        assert_eq!(n, 40);
        assert_eq!(session.live_count(), 40);
        let mut q = world.query::<&Bubble>();
        let colors: Vec<usize> = q.iter(&world).map(|b| b.color_index).collect();
        assert_eq!(colors.len(), 40);
        assert!(colors.iter().all(|&c| c < spec.colors));
    }
}
