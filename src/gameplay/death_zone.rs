use bevy::prelude::*;
use bevy_rapier2d::prelude::CollisionEvent;
use std::collections::HashSet;

use crate::app::state::{AppState, RoundState};
use crate::core::components::{Bubble, DeathZone, Popping, Stuck};
use crate::core::config::GameConfig;
use crate::core::system::system_order::GameSet;
use crate::gameplay::session::{GameSession, RoundEnded, RoundOutcome};

/// True when a free bubble has left the playfield without touching the sensor.
pub fn out_of_bounds(cfg: &GameConfig, position: Vec2) -> bool {
    let floor = cfg.grid.death_zone_y - 4.0 * cfg.bubble.radius;
    position.y < floor || position.x.abs() > 2.0 * cfg.grid.wall_half_width
}

fn lose_bubble(
    commands: &mut Commands,
    session: &mut GameSession,
    entity: Entity,
    ew: &mut EventWriter<RoundEnded>,
) {
    commands.entity(entity).try_despawn();
    session.bubble_destroyed(entity);
    info!(target: "session", "Bubble {entity:?} fell out of play");
    ew.write(RoundEnded(RoundOutcome::BubbleLost));
}

pub fn handle_death_zone(
    mut commands: Commands,
    mut events: EventReader<CollisionEvent>,
    mut session: ResMut<GameSession>,
    q_zone: Query<(), With<DeathZone>>,
    q_bubbles: Query<(), (With<Bubble>, Without<Popping>)>,
    mut ew: EventWriter<RoundEnded>,
) {
    let mut lost = HashSet::new();
    for ev in events.read() {
        let CollisionEvent::Started(a, b, _) = ev else {
            continue;
        };
        let bubble = if q_zone.contains(*a) {
            *b
        } else if q_zone.contains(*b) {
            *a
        } else {
            continue;
        };
        if q_bubbles.contains(bubble) && lost.insert(bubble) {
            lose_bubble(&mut commands, &mut session, bubble, &mut ew);
        }
    }
}

pub fn despawn_out_of_bounds(
    mut commands: Commands,
    cfg: Res<GameConfig>,
    mut session: ResMut<GameSession>,
    q: Query<(Entity, &Transform), (With<Bubble>, Without<Stuck>, Without<Popping>)>,
    mut ew: EventWriter<RoundEnded>,
) {
    for (e, tf) in q.iter() {
        if out_of_bounds(&cfg, tf.translation.truncate()) {
            lose_bubble(&mut commands, &mut session, e, &mut ew);
        }
    }
}

pub struct DeathZonePlugin;

impl Plugin for DeathZonePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (handle_death_zone, despawn_out_of_bounds)
                .chain()
                .in_set(GameSet::Contacts)
                .run_if(in_state(AppState::InGame).and(in_state(RoundState::Running))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_rapier2d::rapier::geometry::CollisionEventFlags;

    #[test]
    fn safety_net_bounds() {
        let cfg = GameConfig::default();
        assert!(!out_of_bounds(&cfg, Vec2::new(0.0, -400.0)));
        assert!(out_of_bounds(&cfg, Vec2::new(0.0, -501.0)));
        assert!(out_of_bounds(&cfg, Vec2::new(481.0, 0.0)));
    }

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(GameConfig::default());
        app.init_resource::<GameSession>();
        app.add_event::<CollisionEvent>();
        app.add_event::<RoundEnded>();
        app.add_systems(Update, (handle_death_zone, despawn_out_of_bounds).chain());
        app
    }

    fn round_outcomes(app: &App) -> Vec<RoundOutcome> {
        let events = app.world().resource::<Events<RoundEnded>>();
        let mut cursor = events.get_cursor();
        cursor.read(events).map(|e| e.0).collect()
    }

    #[test]
    fn bubble_entering_the_sensor_is_lost() {
        let mut app = app();
        let zone = app.world_mut().spawn(DeathZone).id();
        let bubble = app
            .world_mut()
            .spawn((Bubble { color_index: 0 }, Transform::from_xyz(0.0, -420.0, 0.0)))
            .id();
        app.world_mut()
            .send_event(CollisionEvent::Started(zone, bubble, CollisionEventFlags::SENSOR));
        app.update();
        assert!(app.world().get_entity(bubble).is_err());
        assert_eq!(round_outcomes(&app), vec![RoundOutcome::BubbleLost]);
    }

    #[test]
    fn stray_projectile_is_caught_by_the_safety_net() {
        let mut app = app();
        let bubble = app
            .world_mut()
            .spawn((Bubble { color_index: 0 }, Transform::from_xyz(0.0, -900.0, 0.0)))
            .id();
        app.update();
        assert!(app.world().get_entity(bubble).is_err());
        assert_eq!(round_outcomes(&app), vec![RoundOutcome::BubbleLost]);
    }

    #[test]
    fn stuck_bubbles_are_left_alone() {
        let mut app = app();
        app.world_mut().spawn((
            Bubble { color_index: 0 },
            Stuck,
            Transform::from_xyz(0.0, -900.0, 0.0),
        ));
        app.update();
        assert!(round_outcomes(&app).is_empty());
    }
}
