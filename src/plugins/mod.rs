pub mod camera;
pub mod collectibles;
pub mod collision;
pub mod combat;
pub mod game_over;
pub mod ghosts;
pub mod hud;
pub mod maze;
pub mod movement;
pub mod player;
pub mod presentation;
pub mod round;
pub mod telemetry;
