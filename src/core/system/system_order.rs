//! Central system ordering labels to make the per-frame sequence explicit.
//! Stages (high-level, all in `Update`):
//! 1. Input (aim, fire, reload, pause toggles)
//! 2. Contacts (Rapier collision events from the previous physics step -> stick / match check)
//! 3. Clusters (delayed match checks resolve into pop sequences)
//! 4. Pop (staggered pops, shrink animation)
//! 5. Session (timer, win / loss transitions)
//! 6. Presentation (camera, HUD, gizmos)
use bevy::prelude::*;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum GameSet {
    Input,
    Contacts,
    Clusters,
    Pop,
    Session,
    Presentation,
}

pub fn configure_game_sets(app: &mut App) {
    app.configure_sets(
        Update,
        (
            GameSet::Input,
            GameSet::Contacts,
            GameSet::Clusters,
            GameSet::Pop,
            GameSet::Session,
            GameSet::Presentation,
        )
            .chain(),
    );
}
