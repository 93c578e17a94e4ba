//! HUD overlay: score and lives.

use bevy::prelude::*;
use micromegas_tracing::prelude::{span_fn, span_scope};

use crate::app_state::AppState;
use crate::plugins::telemetry::GameSet;
use crate::resources::RoundState;

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::InGame), spawn_hud);
        app.add_systems(OnExit(AppState::InGame), despawn_hud);
        app.add_systems(
            Update,
            update_hud
                .in_set(GameSet::Presentation)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

#[derive(Component)]
pub struct HudRoot;

#[derive(Component)]
pub struct ScoreText;

#[derive(Component)]
pub struct LivesText;

fn hud_text(marker: impl Bundle, text: &'static str) -> impl Bundle {
    (
        marker,
        Text::new(text),
        TextColor(Color::WHITE),
        TextFont {
            font_size: 24.0,
            ..default()
        },
    )
}

#[span_fn]
fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            HudRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Auto,
                justify_content: JustifyContent::SpaceBetween,
                padding: UiRect::all(Val::Px(12.0)),
                position_type: PositionType::Absolute,
                top: Val::Px(0.0),
                left: Val::Px(0.0),
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn(hud_text(ScoreText, "Score: 0"));
            parent.spawn(hud_text(LivesText, "Lives: 0"));
        });
}

#[span_fn]
fn despawn_hud(mut commands: Commands, query: Query<Entity, With<HudRoot>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
}

fn update_hud(
    round: Option<Res<RoundState>>,
    mut score_text: Query<&mut Text, (With<ScoreText>, Without<LivesText>)>,
    mut lives_text: Query<&mut Text, (With<LivesText>, Without<ScoreText>)>,
) {
    let Some(round) = round else { return };
    if let Ok(mut text) = score_text.single_mut() {
        **text = format!("Score: {}", round.score);
    }
    if let Ok(mut text) = lives_text.single_mut() {
        **text = format!("Lives: {}", round.lives);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
