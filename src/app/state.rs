use bevy::prelude::*;

/// High-level app lifecycle state.
/// MainMenu -> InGame -> (MainMenu via the end panels)
#[derive(States, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum AppState {
    /// Title screen with the best score.
    #[default]
    MainMenu,
    /// Arena, shooter and HUD are live.
    InGame,
}

/// Phase of the round while `AppState::InGame`.
#[derive(States, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum RoundState {
    #[default]
    Running,
    Paused,
    /// Short intermission before the next level loads.
    LevelComplete,
    GameOver,
    Victory,
}
