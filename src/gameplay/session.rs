//! Round bookkeeping: score, countdown, shots, next colour and the live bubble set,
//! plus the systems that move the round through its states.
use bevy::prelude::*;
use bevy_rapier2d::prelude::RapierConfiguration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

use crate::app::state::{AppState, RoundState};
use crate::core::config::GameConfig;
use crate::core::system::system_order::GameSet;
use crate::physics::rapier::rapier_physics::set_physics_active;

/// Colour RNG; seedable from the CLI so runs can be replayed.
#[derive(Resource, Deref, DerefMut)]
pub struct BubbleRng(pub StdRng);
impl BubbleRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}
impl Default for BubbleRng {
    fn default() -> Self {
        Self(StdRng::from_entropy())
    }
}

/// Level a new game starts on (1-based).
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartLevel(pub u32);
impl Default for StartLevel {
    fn default() -> Self {
        Self(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    Continue,
    OutOfShots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    TimeUp,
    OutOfShots,
    BubbleLost,
    LevelCleared { next_level: Option<u32> },
}
impl RoundOutcome {
    pub fn describe(self) -> &'static str {
        match self {
            RoundOutcome::TimeUp => "Time's up!",
            RoundOutcome::OutOfShots => "Out of balls!",
            RoundOutcome::BubbleLost => "A bubble fell through!",
            RoundOutcome::LevelCleared { next_level: Some(_) } => "Level complete!",
            RoundOutcome::LevelCleared { next_level: None } => "YOU WIN!",
        }
    }
}

#[derive(Event, Debug, Clone, Copy)]
pub struct ShotFired {
    pub color_index: usize,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct RoundEnded(pub RoundOutcome);

/// (Re)build the playfield for `level`. `keep_score` carries the score into the next level.
#[derive(Event, Debug, Clone, Copy)]
pub struct StartRound {
    pub level: u32,
    pub keep_score: bool,
}

/// Outcome of the round that left `RoundState::Running` (read by the panels).
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct LastRoundOutcome(pub Option<RoundOutcome>);

#[derive(Resource, Debug, Deref, DerefMut)]
pub struct LevelAdvanceTimer {
    #[deref]
    pub timer: Timer,
    pub next_level: u32,
}

#[derive(Resource, Debug, Clone)]
pub struct GameSession {
    pub score: u32,
    pub level: u32,
    pub time_remaining: f32,
    pub shots_remaining: u32,
    pub next_color: usize,
    live: HashSet<Entity>,
    populated: bool,
    cleared: bool,
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            score: 0,
            level: 1,
            time_remaining: 0.0,
            shots_remaining: 0,
            next_color: 0,
            live: HashSet::new(),
            populated: false,
            cleared: false,
        }
    }
}

impl GameSession {
    /// Fresh round on `level`; the score is left untouched.
    pub fn new_round(&mut self, level: u32, cfg: &GameConfig, rng: &mut impl Rng) {
        self.level = level.max(1);
        self.time_remaining = cfg.session.time_limit.max(0.0);
        self.shots_remaining = cfg.session.shots;
        self.next_color = pick_color(rng, cfg.palette.len());
        self.live.clear();
        self.populated = false;
        self.cleared = false;
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        debug!(target: "session", "Score added: {points} | Total: {}", self.score);
    }

    /// Counts down; returns `true` only on the frame the timer runs out.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.time_remaining <= 0.0 {
            return false;
        }
        self.time_remaining -= dt;
        if self.time_remaining <= 0.0 {
            self.time_remaining = 0.0;
            return true;
        }
        false
    }

    pub fn ball_shot(&mut self, rng: &mut impl Rng, palette_len: usize) -> ShotOutcome {
        self.shots_remaining = self.shots_remaining.saturating_sub(1);
        if self.shots_remaining == 0 {
            return ShotOutcome::OutOfShots;
        }
        self.next_color = pick_color(rng, palette_len);
        ShotOutcome::Continue
    }

    pub fn register_live(&mut self, entity: Entity) {
        self.live.insert(entity);
        self.populated = true;
    }

    /// Drops `entity` from the live set. Returns `true` once, when the set first empties.
    pub fn bubble_destroyed(&mut self, entity: Entity) -> bool {
        if self.live.remove(&entity) {
            debug!(target: "session", "Bubble destroyed. Remaining: {}", self.live.len());
        }
        if self.populated && !self.cleared && self.live.is_empty() {
            self.cleared = true;
            return true;
        }
        false
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Whole seconds left, rounded up.
    pub fn time_display(&self) -> u32 {
        self.time_remaining.max(0.0).ceil() as u32
    }
}

fn pick_color(rng: &mut impl Rng, palette_len: usize) -> usize {
    if palette_len == 0 {
        0
    } else {
        rng.gen_range(0..palette_len)
    }
}

/// Outcome for clearing the current level: advance if the config has another one.
pub fn level_cleared_outcome(cfg: &GameConfig, level: u32) -> RoundOutcome {
    let next = level + 1;
    RoundOutcome::LevelCleared {
        next_level: cfg.level(next).map(|_| next),
    }
}

pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameSession>()
            .init_resource::<StartLevel>()
            .init_resource::<LastRoundOutcome>()
            .add_event::<ShotFired>()
            .add_event::<RoundEnded>()
            .add_event::<StartRound>()
            .add_systems(OnEnter(AppState::InGame), request_first_round)
            .add_systems(
                Update,
                tick_round_timer
                    .in_set(GameSet::Session)
                    .run_if(in_state(AppState::InGame).and(in_state(RoundState::Running))),
            )
            .add_systems(
                Update,
                (handle_round_end, advance_level_after_delay)
                    .chain()
                    .after(tick_round_timer)
                    .in_set(GameSet::Session)
                    .run_if(in_state(AppState::InGame)),
            );
        if app.world().get_resource::<BubbleRng>().is_none() {
            app.init_resource::<BubbleRng>();
        }
    }
}

fn request_first_round(start: Res<StartLevel>, mut ew: EventWriter<StartRound>) {
    ew.write(StartRound {
        level: start.0,
        keep_score: false,
    });
}

fn tick_round_timer(
    time: Res<Time>,
    mut session: ResMut<GameSession>,
    mut ew: EventWriter<RoundEnded>,
) {
    if session.tick(time.delta_secs()) {
        info!(target: "session", "Timer expired at score {}", session.score);
        ew.write(RoundEnded(RoundOutcome::TimeUp));
    }
}

/// First outcome of a running round decides the next state; later ones in the same frame are dropped.
fn handle_round_end(
    mut commands: Commands,
    mut events: EventReader<RoundEnded>,
    round: Res<State<RoundState>>,
    mut next_round: ResMut<NextState<RoundState>>,
    mut last: ResMut<LastRoundOutcome>,
    cfg: Res<GameConfig>,
    session: Res<GameSession>,
    mut q_rapier: Query<&mut RapierConfiguration>,
) {
    let mut handled = *round.get() != RoundState::Running;
    for RoundEnded(outcome) in events.read() {
        if handled {
            continue;
        }
        handled = true;
        last.0 = Some(*outcome);
        match *outcome {
            RoundOutcome::LevelCleared {
                next_level: Some(next),
            } => {
                info!(target: "session", "LevelComplete: level {} cleared, next {}", session.level, next);
                commands.insert_resource(LevelAdvanceTimer {
                    timer: Timer::from_seconds(cfg.timing.level_advance_delay.max(0.0), TimerMode::Once),
                    next_level: next,
                });
                next_round.set(RoundState::LevelComplete);
            }
            RoundOutcome::LevelCleared { next_level: None } => {
                info!(target: "session", "Victory! Final score {}", session.score);
                set_physics_active(&mut q_rapier, false);
                next_round.set(RoundState::Victory);
            }
            other => {
                info!(target: "session", "GameOver ({other:?}) at score {}", session.score);
                set_physics_active(&mut q_rapier, false);
                next_round.set(RoundState::GameOver);
            }
        }
    }
}

fn advance_level_after_delay(
    mut commands: Commands,
    time: Res<Time>,
    timer: Option<ResMut<LevelAdvanceTimer>>,
    round: Res<State<RoundState>>,
    mut ew: EventWriter<StartRound>,
) {
    let Some(mut timer) = timer else {
        return;
    };
    if *round.get() != RoundState::LevelComplete {
        return;
    }
    if timer.tick(time.delta()).finished() {
        ew.write(StartRound {
            level: timer.next_level,
            keep_score: true,
        });
        commands.remove_resource::<LevelAdvanceTimer>();
    }
}
