//! Player-ghost contact: defeat the ghost while invincible, otherwise lose a
//! life and respawn after a delay.

use bevy::prelude::*;
use micromegas_tracing::prelude::{imetric, info};

use crate::components::*;
use crate::events::{GhostDefeated, GhostOverlap, PlayerCaught, RoundEnded};
use crate::plugins::collectibles::eat_power_ups;
use crate::plugins::telemetry::GameSet;
use crate::resources::{RoundConfig, RoundOutcome, RoundState, SimClock};

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            ghost_contact.after(eat_power_ups).in_set(GameSet::Rules),
        );
    }
}

#[allow(clippy::type_complexity)]
fn ghost_contact(
    mut overlaps: MessageReader<GhostOverlap>,
    mut player_query: Query<(&mut Player, &mut Velocity), Without<Ghost>>,
    mut ghost_query: Query<(&mut Ghost, &mut Velocity, &mut Heading), Without<Player>>,
    mut round: ResMut<RoundState>,
    clock: Res<SimClock>,
    config: Res<RoundConfig>,
    mut commands: Commands,
) {
    let now = clock.now_ms;
    for overlap in overlaps.read() {
        if !round.in_progress() {
            break;
        }
        let Ok((mut player, mut player_vel)) = player_query.single_mut() else {
            return;
        };
        if player.is_respawning() {
            continue;
        }
        let Ok((mut ghost, mut ghost_vel, mut ghost_heading)) = ghost_query.get_mut(overlap.ghost)
        else {
            continue;
        };
        if !ghost.active {
            continue;
        }

        if player.is_invincible(now) {
            ghost.active = false;
            ghost.respawn_at_ms = config.ghost_respawn_ms.map(|delay| now + delay);
            ghost_vel.0 = Vec2::ZERO;
            ghost_heading.0 = Direction::None;
            round.score += config.ghost_score;
            if config.ghost_defeat_extends_invincibility {
                player.invincible_until_ms += config.invincibility_ms;
            }
            info!("{:?} ghost defeated, score {}", ghost.color, round.score);
            commands.trigger(GhostDefeated {
                ghost: overlap.ghost,
                score: round.score,
            });
            continue;
        }

        round.lives = round.lives.saturating_sub(1);
        imetric!("deaths", "count", 1);
        commands.trigger(PlayerCaught { lives: round.lives });
        if round.lives == 0 {
            round.outcome = RoundOutcome::Lost;
            info!("caught with no lives left, final score {}", round.score);
            commands.trigger(RoundEnded {
                outcome: RoundOutcome::Lost,
                final_score: round.score,
            });
        } else {
            player.respawn_at_ms = Some(now + config.respawn_delay_ms);
            player_vel.0 = Vec2::ZERO;
            info!("caught by {:?} ghost, {} lives left", ghost.color, round.lives);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{PelletOverlap, PowerUpOverlap};
    use crate::plugins::collectibles::CollectiblePlugin;

    const NOW: u64 = 10_000;

    #[derive(Resource, Default)]
    struct Seen {
        caught: Vec<u32>,
        defeated: usize,
        ended: Vec<RoundEnded>,
    }

    fn setup_app(config: RoundConfig) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_message::<PelletOverlap>();
        app.add_message::<PowerUpOverlap>();
        app.add_message::<GhostOverlap>();
        app.insert_resource(RoundState::new(config.starting_lives, 10));
        app.insert_resource(config);
        app.insert_resource(SimClock {
            now_ms: NOW,
            tick_ms: 16,
            ticks: 0,
        });
        app.init_resource::<Seen>();
        app.add_observer(|e: On<PlayerCaught>, mut seen: ResMut<Seen>| seen.caught.push(e.lives));
        app.add_observer(|_: On<GhostDefeated>, mut seen: ResMut<Seen>| seen.defeated += 1);
        app.add_observer(|e: On<RoundEnded>, mut seen: ResMut<Seen>| seen.ended.push(*e));
        app.add_plugins((CollectiblePlugin, CombatPlugin));
        crate::step_ticks_manually(&mut app, 16);
        app
    }

    fn spawn_player(app: &mut App, invincible_until_ms: u64) -> Entity {
        app.world_mut()
            .spawn((
                Player {
                    invincible_until_ms,
                    respawn_at_ms: None,
                },
                Velocity(Vec2::new(150.0, 0.0)),
            ))
            .id()
    }

    fn spawn_ghost(app: &mut App) -> Entity {
        app.world_mut()
            .spawn((
                Ghost::new(GhostColor::Red),
                Velocity(Vec2::new(-100.0, 0.0)),
                Heading(Direction::Left),
            ))
            .id()
    }

    fn touch(app: &mut App, ghost: Entity) {
        app.world_mut().write_message(GhostOverlap { ghost });
        app.update();
    }

    #[test]
    fn caught_player_loses_a_life_and_respawns_later() {
        let mut app = setup_app(RoundConfig::default());
        let player = spawn_player(&mut app, 0);
        let ghost = spawn_ghost(&mut app);

        touch(&mut app, ghost);

        let round = app.world().resource::<RoundState>();
        assert_eq!(round.lives, 2);
        assert_eq!(round.outcome, RoundOutcome::InProgress);
        let e = app.world().entity(player);
        assert_eq!(e.get::<Player>().unwrap().respawn_at_ms, Some(NOW + 1_000));
        assert_eq!(e.get::<Velocity>().unwrap().0, Vec2::ZERO);
        assert!(app.world().entity(ghost).get::<Ghost>().unwrap().active);
        assert_eq!(app.world().resource::<Seen>().caught, vec![2]);
    }

    #[test]
    fn respawning_player_is_not_caught_again() {
        let mut app = setup_app(RoundConfig::default());
        spawn_player(&mut app, 0);
        let a = spawn_ghost(&mut app);
        let b = spawn_ghost(&mut app);

        app.world_mut().write_message(GhostOverlap { ghost: a });
        app.world_mut().write_message(GhostOverlap { ghost: b });
        app.update();
        touch(&mut app, a);

        assert_eq!(app.world().resource::<RoundState>().lives, 2);
    }

    #[test]
    fn last_life_loses_round() {
        let config = RoundConfig {
            starting_lives: 1,
            ..RoundConfig::default()
        };
        let mut app = setup_app(config);
        let player = spawn_player(&mut app, 0);
        let ghost = spawn_ghost(&mut app);

        touch(&mut app, ghost);
        touch(&mut app, ghost);

        let round = app.world().resource::<RoundState>();
        assert_eq!(round.lives, 0);
        assert_eq!(round.outcome, RoundOutcome::Lost);
        assert_eq!(app.world().entity(player).get::<Player>().unwrap().respawn_at_ms, None);
        let seen = app.world().resource::<Seen>();
        assert_eq!(seen.ended.len(), 1);
        assert_eq!(seen.ended[0].outcome, RoundOutcome::Lost);
    }

    #[test]
    fn invincible_contact_defeats_ghost() {
        let mut app = setup_app(RoundConfig::default());
        let until = NOW + 3_000;
        let player = spawn_player(&mut app, until);
        let ghost = spawn_ghost(&mut app);

        touch(&mut app, ghost);

        let g = app.world().entity(ghost);
        assert!(!g.get::<Ghost>().unwrap().active);
        assert_eq!(g.get::<Ghost>().unwrap().respawn_at_ms, None);
        assert_eq!(g.get::<Velocity>().unwrap().0, Vec2::ZERO);
        assert_eq!(g.get::<Heading>().unwrap().0, Direction::None);

        let round = app.world().resource::<RoundState>();
        assert_eq!(round.score, 100);
        assert_eq!(round.lives, 3);
        let p = app.world().entity(player).get::<Player>().unwrap();
        assert_eq!(p.invincible_until_ms, until + 7_000);

        // A defeated ghost is inert.
        touch(&mut app, ghost);
        assert_eq!(app.world().resource::<RoundState>().score, 100);
        assert_eq!(app.world().resource::<Seen>().defeated, 1);
    }

    #[test]
    fn chaining_can_be_disabled_and_respawn_delayed() {
        let config = RoundConfig {
            ghost_defeat_extends_invincibility: false,
            ghost_respawn_ms: Some(5_000),
            ..RoundConfig::default()
        };
        let mut app = setup_app(config);
        let until = NOW + 3_000;
        let player = spawn_player(&mut app, until);
        let ghost = spawn_ghost(&mut app);

        touch(&mut app, ghost);

        let p = app.world().entity(player).get::<Player>().unwrap();
        assert_eq!(p.invincible_until_ms, until);
        let g = app.world().entity(ghost).get::<Ghost>().unwrap();
        assert_eq!(g.respawn_at_ms, Some(NOW + 5_000));
    }

    #[test]
    fn expired_invincibility_does_not_protect() {
        let mut app = setup_app(RoundConfig::default());
        spawn_player(&mut app, NOW);
        let ghost = spawn_ghost(&mut app);

        touch(&mut app, ghost);

        assert_eq!(app.world().resource::<RoundState>().lives, 2);
        assert!(app.world().entity(ghost).get::<Ghost>().unwrap().active);
    }

    #[test]
    fn power_up_then_ghost_in_same_tick() {
        let mut app = setup_app(RoundConfig::default());
        let player = spawn_player(&mut app, 0);
        let ghost = spawn_ghost(&mut app);
        let power_up = app
            .world_mut()
            .spawn((PowerUp, Collectible::default()))
            .id();

        app.world_mut().write_message(PowerUpOverlap { power_up });
        app.world_mut().write_message(GhostOverlap { ghost });
        app.update();

        assert!(!app.world().entity(ghost).get::<Ghost>().unwrap().active);
        assert_eq!(app.world().resource::<RoundState>().lives, 3);
        let p = app.world().entity(player).get::<Player>().unwrap();
        assert_eq!(p.invincible_until_ms, NOW + 2 * 7_000);
    }
}
