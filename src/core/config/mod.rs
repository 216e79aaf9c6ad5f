pub mod config;

pub use config::{
    AimLineConfig, BubbleConfig, CameraConfig, GameConfig, GridConfig, HighScoreConfig,
    HudConfig, LevelSpec, PhysicsConfig, ScoringConfig, SessionConfig, ShooterConfig,
    TimingConfig, WindowConfig,
};
