//! Kickabout - a small team ball game built with Bevy
//!
//! Main entry point: window, scene visuals and system registration. Gameplay
//! lives in `KickaboutPlugin`; this binary only adds what a player sees.

use bevy::prelude::*;
use chrono::Local;
use kickabout::{
    Actor, ActorId, Ball, ControlMarker, EventLogger, KickaboutPlugin, MatchClock, MatchSettings,
    RosterSwitcher, Score, Team, constants::*, input, load_global_tuning, setup_match,
    write_bus_events,
};

/// Materials shared by every actor and ball
#[derive(Resource)]
struct SceneMaterials {
    home: Handle<StandardMaterial>,
    away: Handle<StandardMaterial>,
    active: Handle<StandardMaterial>,
    ball: Handle<StandardMaterial>,
    actor_mesh: Handle<Mesh>,
    ball_mesh: Handle<Mesh>,
}

/// Visible body of an actor, a child of the actor entity
#[derive(Component)]
struct ActorBody;

#[derive(Component)]
struct HudText;

fn main() {
    let tuning = load_global_tuning();
    let settings = MatchSettings::load();

    // Save settings on first run so the file exists for editing
    if let Err(e) = settings.save() {
        warn!("Failed to save initial settings: {}", e);
    }

    let mut logger = EventLogger::default();
    logger.start_session(&Local::now().format("%Y%m%d_%H%M%S").to_string());
    logger.log_config(&tuning);

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Kickabout".into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(BACKGROUND_COLOR))
        .insert_resource(Time::<Fixed>::from_hz(STEP_HZ))
        .insert_resource(tuning)
        .insert_resource(settings)
        .insert_resource(logger)
        .add_plugins(KickaboutPlugin)
        .add_systems(Startup, (setup_scene, setup_match))
        // Input is buffered every frame and consumed by the next fixed step
        .add_systems(
            Update,
            (
                input::capture_input,
                attach_visuals,
                tint_active_actor,
                update_hud,
            )
                .chain(),
        )
        .add_systems(FixedPostUpdate, write_bus_events)
        .run();
}

/// Camera, light, pitch and shared assets
fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Looking down the pitch from the south touchline; -Z is up on screen
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 28.0, 26.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(10.0, 20.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(PITCH_LENGTH, PITCH_WIDTH))),
        MeshMaterial3d(materials.add(PITCH_COLOR)),
    ));

    // Goal frames behind each goal line
    let goal_mesh = meshes.add(Cuboid::new(GOAL_DEPTH, GOAL_HEIGHT, GOAL_WIDTH));
    let goal_material = materials.add(StandardMaterial {
        base_color: GOAL_COLOR.with_alpha(0.35),
        alpha_mode: AlphaMode::Blend,
        ..default()
    });
    for side in [-1.0, 1.0] {
        commands.spawn((
            Mesh3d(goal_mesh.clone()),
            MeshMaterial3d(goal_material.clone()),
            Transform::from_xyz(
                side * (PITCH_LENGTH + GOAL_DEPTH) / 2.0,
                GOAL_HEIGHT / 2.0,
                0.0,
            ),
        ));
    }

    commands.spawn((
        Text::new(""),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
        HudText,
    ));

    commands.insert_resource(SceneMaterials {
        home: materials.add(Color::srgb(0.2, 0.4, 0.9)),
        away: materials.add(Color::srgb(0.9, 0.3, 0.2)),
        active: materials.add(Color::srgb(1.0, 0.85, 0.2)),
        ball: materials.add(Color::WHITE),
        actor_mesh: meshes.add(Capsule3d::new(
            ACTOR_RADIUS,
            ACTOR_HEIGHT - 2.0 * ACTOR_RADIUS,
        )),
        ball_mesh: meshes.add(Sphere::new(BALL_RADIUS)),
    });
}

/// Give newly spawned actors and balls something to render
fn attach_visuals(
    mut commands: Commands,
    scene: Res<SceneMaterials>,
    actors: Query<(Entity, &Actor), Added<Actor>>,
    balls: Query<Entity, Added<Ball>>,
) {
    for (entity, actor) in &actors {
        let material = match actor.team {
            Team::Home => scene.home.clone(),
            Team::Away => scene.away.clone(),
        };
        commands.entity(entity).insert(Visibility::default()).with_children(|parent| {
            parent.spawn((
                ActorBody,
                Mesh3d(scene.actor_mesh.clone()),
                MeshMaterial3d(material),
                Transform::from_xyz(0.0, ACTOR_HEIGHT / 2.0, 0.0),
            ));
        });
    }

    for entity in &balls {
        commands.entity(entity).insert((
            Mesh3d(scene.ball_mesh.clone()),
            MeshMaterial3d(scene.ball.clone()),
        ));
    }
}

/// Highlight the active actor; the marker is driven by the physics stage
fn tint_active_actor(
    scene: Res<SceneMaterials>,
    actors: Query<(&Actor, &ControlMarker, &Children), Changed<ControlMarker>>,
    mut bodies: Query<&mut MeshMaterial3d<StandardMaterial>, With<ActorBody>>,
) {
    for (actor, marker, children) in &actors {
        let material = match (marker.0, actor.team) {
            (true, _) => scene.active.clone(),
            (false, Team::Home) => scene.home.clone(),
            (false, Team::Away) => scene.away.clone(),
        };
        for child in children.iter() {
            if let Ok(mut body) = bodies.get_mut(child) {
                body.0 = material.clone();
            }
        }
    }
}

fn update_hud(
    match_clock: Res<MatchClock>,
    score: Res<Score>,
    switcher: Res<RosterSwitcher>,
    mut hud: Query<&mut Text, With<HudText>>,
) {
    let Ok(mut text) = hud.single_mut() else {
        return;
    };
    let active = switcher
        .active()
        .map(|a: ActorId| a.to_string())
        .unwrap_or_else(|| "-".to_string());
    let status = if match_clock.is_finished() {
        "FULL TIME"
    } else {
        ""
    };
    text.0 = format!(
        "{}  {}  active {}  {}",
        match_clock.display(),
        *score,
        active,
        status
    );
}
