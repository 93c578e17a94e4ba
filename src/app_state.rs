use bevy::prelude::*;

/// Top-level screen. A round lives for the duration of `InGame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, States)]
pub enum AppState {
    #[default]
    InGame,
    GameOver,
}
