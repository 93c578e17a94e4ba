//! Mirror simulation state onto sprites: placement, facing, ghost tint and
//! visibility.

use bevy::prelude::*;
use micromegas_tracing::prelude::{span_fn, span_scope};

use crate::app_state::AppState;
use crate::components::*;
use crate::plugins::maze::MazeGrid;
use crate::plugins::telemetry::GameSet;
use crate::resources::SimClock;

/// Ghost tint while the player can eat them.
const FRIGHTENED_COLOR: Color = Color::srgb(0.2, 0.3, 1.0);

pub struct PresentationPlugin;

impl Plugin for PresentationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (sync_transforms, face_heading, tint_ghosts, sync_visibility)
                .in_set(GameSet::Presentation)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

fn visible(shown: bool) -> Visibility {
    if shown {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

#[span_fn]
fn sync_transforms(
    grid: Option<Res<MazeGrid>>,
    mut query: Query<(&Position, &mut Transform), Changed<Position>>,
) {
    let Some(grid) = grid else { return };
    for (pos, mut transform) in &mut query {
        let world = grid.sim_to_world(pos.0);
        transform.translation.x = world.x;
        transform.translation.y = world.y;
    }
}

/// Rotate the player sprite to its heading. Idle keeps the last facing.
fn face_heading(mut query: Query<(&Heading, &mut Transform), (With<Player>, Changed<Heading>)>) {
    for (heading, mut transform) in &mut query {
        if heading.0.is_none() {
            continue;
        }
        // Headings are measured y-down; the world is y-up.
        transform.rotation = Quat::from_rotation_z(-heading.0.angle().to_radians());
    }
}

fn tint_ghosts(
    clock: Option<Res<SimClock>>,
    player_query: Query<&Player>,
    mut ghost_query: Query<(&Ghost, &mut Sprite)>,
) {
    let (Some(clock), Ok(player)) = (clock, player_query.single()) else {
        return;
    };
    let frightened = player.is_invincible(clock.now_ms);
    for (ghost, mut sprite) in &mut ghost_query {
        let color = if frightened {
            FRIGHTENED_COLOR
        } else {
            ghost.color.color()
        };
        if sprite.color != color {
            sprite.color = color;
        }
    }
}

#[allow(clippy::type_complexity)]
fn sync_visibility(
    mut players: Query<(&Player, &mut Visibility), (Without<Ghost>, Without<Collectible>)>,
    mut ghosts: Query<(&Ghost, &mut Visibility), (Without<Player>, Without<Collectible>)>,
    mut items: Query<(&Collectible, &mut Visibility), (Without<Player>, Without<Ghost>)>,
) {
    for (player, mut vis) in &mut players {
        vis.set_if_neq(visible(!player.is_respawning()));
    }
    for (ghost, mut vis) in &mut ghosts {
        vis.set_if_neq(visible(ghost.active));
    }
    for (item, mut vis) in &mut items {
        vis.set_if_neq(visible(!item.consumed));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;

    fn setup_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(StatesPlugin);
        app.init_state::<AppState>();
        app.insert_resource(
            MazeGrid::parse("#####\n#P.G#\n#####", 40.0).unwrap(),
        );
        app.insert_resource(SimClock {
            now_ms: 1_000,
            tick_ms: 16,
            ticks: 0,
        });
        app.add_plugins(PresentationPlugin);
        app
    }

    #[test]
    fn transform_follows_position() {
        let mut app = setup_app();
        let e = app
            .world_mut()
            .spawn((Position(Vec2::new(60.0, 60.0)), Transform::default()))
            .id();
        app.update();
        // 200x120 maze centered on the origin.
        let t = app.world().entity(e).get::<Transform>().unwrap().translation;
        assert_eq!((t.x, t.y), (-40.0, 0.0));
    }

    #[test]
    fn player_faces_heading() {
        let mut app = setup_app();
        let e = app
            .world_mut()
            .spawn((Player::default(), Heading(Direction::Up), Transform::default()))
            .id();
        app.update();
        let rotation = app.world().entity(e).get::<Transform>().unwrap().rotation;
        let facing = rotation * Vec3::X;
        assert!((facing - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn ghosts_turn_blue_and_hide_when_defeated() {
        let mut app = setup_app();
        app.world_mut().spawn((
            Player {
                invincible_until_ms: 5_000,
                respawn_at_ms: None,
            },
            Visibility::default(),
        ));
        let mut defeated = Ghost::new(GhostColor::Cyan);
        defeated.active = false;
        let a = app
            .world_mut()
            .spawn((
                Ghost::new(GhostColor::Red),
                Sprite::default(),
                Visibility::default(),
            ))
            .id();
        let b = app
            .world_mut()
            .spawn((defeated, Sprite::default(), Visibility::default()))
            .id();

        app.update();

        let e = app.world().entity(a);
        assert_eq!(e.get::<Sprite>().unwrap().color, FRIGHTENED_COLOR);
        assert_eq!(*e.get::<Visibility>().unwrap(), Visibility::Inherited);
        assert_eq!(
            *app.world().entity(b).get::<Visibility>().unwrap(),
            Visibility::Hidden
        );

        app.world_mut().resource_mut::<SimClock>().now_ms = 5_000;
        app.update();
        assert_eq!(
            app.world().entity(a).get::<Sprite>().unwrap().color,
            GhostColor::Red.color()
        );
    }

    #[test]
    fn consumed_items_are_hidden() {
        let mut app = setup_app();
        let e = app
            .world_mut()
            .spawn((Collectible { consumed: true }, Visibility::Visible))
            .id();
        app.update();
        assert_eq!(
            *app.world().entity(e).get::<Visibility>().unwrap(),
            Visibility::Hidden
        );
    }
}
