use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::sleep;

use super::*;
use crate::animation::{ActiveAnimation, AnimationMode, CatalogSelection, LoopAnimation};
use crate::gesture::PointerEvent;
use crate::scene::{ImagePlacement, ImageRef, PixelDimensions, Point, SceneUpdate, SpriteId};
use crate::speech::testing::ScriptedProvider;
use crate::speech::{SessionState, SpeechError};

fn image() -> ImageRef {
    ImageRef::new(vec![0_u8; 16], PixelDimensions::new(100, 100))
}

fn at(x: f64, y: f64) -> ImagePlacement {
    ImagePlacement::DropPoint(Point::new(x, y))
}

async fn active(handle: &SceneHandle, id: SpriteId) -> ActiveAnimation {
    handle
        .sprite(id)
        .await
        .expect("runtime running")
        .expect("sprite exists")
        .active_animation
}

#[tokio::test(start_paused = true)]
async fn silence_timeout_stops_speech_gated_animation() {
    let provider = ScriptedProvider::default();
    let handle = SceneRuntime::spawn_seeded(SceneConfig::default(), provider.capability(), 11);
    let id = handle.add_sprite(image(), at(100.0, 100.0)).await.unwrap();
    handle
        .set_catalog_selection(id, LoopAnimation::Dance.into())
        .unwrap();

    provider.sink(id).result(false);
    assert_eq!(
        active(&handle, id).await,
        ActiveAnimation::Playing(LoopAnimation::Dance)
    );
    assert_eq!(
        handle.session_state(id).await.unwrap(),
        Some(SessionState::Speaking)
    );

    sleep(Duration::from_millis(999)).await;
    assert!(active(&handle, id).await.is_playing());

    sleep(Duration::from_millis(201)).await;
    assert_eq!(active(&handle, id).await, ActiveAnimation::None);
    assert_eq!(
        handle.session_state(id).await.unwrap(),
        Some(SessionState::Active)
    );
}

#[tokio::test(start_paused = true)]
async fn interim_results_keep_speaking_alive() {
    let provider = ScriptedProvider::default();
    let handle = SceneRuntime::spawn(SceneConfig::default(), provider.capability());
    let id = handle.add_sprite(image(), at(100.0, 100.0)).await.unwrap();
    let sink = provider.sink(id);

    for _ in 0..5 {
        sink.result(false);
        sleep(Duration::from_millis(600)).await;
    }
    assert_eq!(
        handle.session_state(id).await.unwrap(),
        Some(SessionState::Speaking)
    );

    sleep(Duration::from_millis(500)).await;
    assert_eq!(
        handle.session_state(id).await.unwrap(),
        Some(SessionState::Active)
    );
}

#[tokio::test(start_paused = true)]
async fn random_selection_rerolls_every_interval() {
    let handle = SceneRuntime::spawn_seeded(
        SceneConfig {
            auto_start_speech: false,
            ..SceneConfig::default()
        },
        crate::speech::RecognitionCapability::missing(),
        5,
    );
    let mut updates = handle.subscribe();
    let id = handle.add_sprite(image(), at(100.0, 100.0)).await.unwrap();
    handle
        .set_animation_mode(id, AnimationMode::Always)
        .unwrap();
    handle
        .set_catalog_selection(id, CatalogSelection::Random)
        .unwrap();

    for _ in 0..10 {
        match active(&handle, id).await {
            ActiveAnimation::Playing(animation) => {
                assert!(LoopAnimation::CATALOG.contains(&animation))
            }
            ActiveAnimation::None => panic!("random selection went idle"),
        }
        sleep(Duration::from_millis(2_000)).await;
    }

    let mut changes = 0;
    while let Ok(update) = updates.try_recv() {
        if matches!(update, SceneUpdate::Changed(state) if state.id == id) {
            changes += 1;
        }
    }
    assert!(changes > 0);
}

#[tokio::test(start_paused = true)]
async fn removed_sprite_receives_no_more_ticks() {
    let provider = ScriptedProvider::default();
    let handle = SceneRuntime::spawn(SceneConfig::default(), provider.capability());
    let id = handle.add_sprite(image(), at(100.0, 100.0)).await.unwrap();
    handle
        .set_animation_mode(id, AnimationMode::Always)
        .unwrap();
    handle
        .set_catalog_selection(id, CatalogSelection::Random)
        .unwrap();
    provider.sink(id).result(false);

    let mut updates = handle.subscribe();
    handle.remove_sprite(id).unwrap();
    assert!(handle.list_sprites().await.unwrap().is_empty());
    assert_eq!(provider.stop_calls(), 1);

    let mut removed = false;
    while let Ok(update) = updates.try_recv() {
        removed |= matches!(update, SceneUpdate::Removed(gone) if gone == id);
    }
    assert!(removed);

    sleep(Duration::from_millis(10_000)).await;
    assert!(handle.list_sprites().await.unwrap().is_empty());
    assert!(matches!(
        updates.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test(start_paused = true)]
async fn failed_restart_surfaces_in_menu_status() {
    let provider = ScriptedProvider::failing_after(1);
    let handle = SceneRuntime::spawn(SceneConfig::default(), provider.capability());
    let id = handle.add_sprite(image(), at(100.0, 100.0)).await.unwrap();

    provider.sink(id).ended();
    let status = handle.menu_status(id).await.unwrap().unwrap();

    assert_eq!(status.session, SessionState::Inactive);
    assert!(matches!(
        status.last_error,
        Some(SpeechError::SessionRestartFailure { .. })
    ));

    // a manual restart opens a fresh session
    assert_eq!(handle.start_speech(id).await.unwrap(), Ok(()));
    assert_eq!(
        handle.session_state(id).await.unwrap(),
        Some(SessionState::Active)
    );
}

#[tokio::test(start_paused = true)]
async fn pointer_drag_moves_sprite() {
    let handle = SceneRuntime::spawn(
        SceneConfig {
            auto_start_speech: false,
            ..SceneConfig::default()
        },
        crate::speech::RecognitionCapability::missing(),
    );
    let id = handle.add_sprite(image(), at(100.0, 100.0)).await.unwrap();

    handle.pointer(PointerEvent::down(100.0, 100.0)).unwrap();
    handle.pointer(PointerEvent::moved(160.0, 100.0)).unwrap();
    handle.pointer(PointerEvent::up(160.0, 100.0)).unwrap();

    let sprite = handle.sprite(id).await.unwrap().unwrap();
    assert_eq!(sprite.position, Point::new(110.0, 50.0));
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_sessions_and_worker() {
    let provider = ScriptedProvider::default();
    let handle = SceneRuntime::spawn(SceneConfig::default(), provider.capability());
    handle.add_sprite(image(), at(100.0, 100.0)).await.unwrap();
    handle.add_sprite(image(), at(300.0, 300.0)).await.unwrap();

    handle.shutdown().await.unwrap();
    assert_eq!(provider.stop_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_stops_sessions() {
    let provider = ScriptedProvider::default();
    let handle = SceneRuntime::spawn(SceneConfig::default(), provider.capability());
    handle.add_sprite(image(), at(100.0, 100.0)).await.unwrap();

    drop(handle);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(provider.stop_calls(), 1);
}

#[tokio::test]
async fn closed_runtime_reports_errors() {
    let (events, rx) = crate::scene::event_channel();
    drop(rx);
    let (updates, _) = broadcast::channel(4);
    let handle = SceneHandle::new(events, updates, tokio::spawn(async {}));

    assert_eq!(handle.toggle_menu(SpriteId(1)), Err(RuntimeError::Closed));
    assert_eq!(handle.list_sprites().await.unwrap_err(), RuntimeError::Closed);
}
