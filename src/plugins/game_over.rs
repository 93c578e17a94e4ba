//! Round-over screen: outcome and final score, Enter starts a new round.

use bevy::prelude::*;

use crate::app_state::AppState;
use crate::plugins::round::RoundSummary;
use crate::resources::RoundOutcome;

pub struct GameOverPlugin;

impl Plugin for GameOverPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::GameOver), spawn_game_over);
        app.add_systems(OnExit(AppState::GameOver), despawn_game_over);
        app.add_systems(
            Update,
            game_over_input.run_if(in_state(AppState::GameOver)),
        );
    }
}

#[derive(Component)]
pub struct GameOverRoot;

fn headline(outcome: RoundOutcome) -> (&'static str, Color) {
    match outcome {
        RoundOutcome::Won => ("You Win!", Color::srgb(1.0, 0.85, 0.0)),
        _ => ("Game Over", Color::srgb(0.9, 0.2, 0.2)),
    }
}

fn spawn_game_over(mut commands: Commands, summary: Option<Res<RoundSummary>>) {
    let (outcome, score) = summary
        .map(|s| (s.outcome, s.final_score))
        .unwrap_or((RoundOutcome::Lost, 0));
    let (title, title_color) = headline(outcome);

    commands
        .spawn((
            GameOverRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(16.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.8)),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(title),
                TextColor(title_color),
                TextFont {
                    font_size: 48.0,
                    ..default()
                },
            ));
            parent.spawn((
                Text::new(format!("Final Score: {score}")),
                TextColor(Color::WHITE),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
            ));
            parent.spawn((
                Text::new("Press Enter to Play Again"),
                TextColor(Color::srgb(0.8, 0.8, 0.8)),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
            ));
        });
}

fn despawn_game_over(mut commands: Commands, query: Query<Entity, With<GameOverRoot>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
}

fn game_over_input(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if keyboard.is_some_and(|k| k.just_pressed(KeyCode::Enter)) {
        next_state.set(AppState::InGame);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
