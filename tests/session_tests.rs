// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the session orchestrator

mod common;

use camera_session::app::{PhotoTimerSetting, PopupKind, RecordingSnapshot, TimelapseState};
use camera_session::backends::simulated::{
    CameraCall, CameraOperation, SimulatedCamera, SimulatedRig,
};
use camera_session::backends::types::{
    DetectedFace, DocumentBounds, DocumentEvent, ExposureRange, FaceEvent, FaceTrackingState,
    FlashMode, LensFacing, NormalizedPoint, NormalizedRect,
};
use camera_session::config::TimelapseConfig;
use camera_session::{CameraMode, Config, SessionEvent};
use common::{Harness, sleep_ms};
use std::time::Duration;

fn timer_config(timer: PhotoTimerSetting) -> Config {
    Config {
        photo_timer: timer,
        ..Config::default()
    }
}

fn face() -> DetectedFace {
    DetectedFace {
        bounds: NormalizedRect {
            x: 0.4,
            y: 0.3,
            width: 0.2,
            height: 0.3,
        },
        tracking_id: Some(1),
        confidence: 0.95,
    }
}

fn document() -> DocumentBounds {
    DocumentBounds {
        corners: [
            NormalizedPoint::clamped(0.1, 0.1),
            NormalizedPoint::clamped(0.9, 0.1),
            NormalizedPoint::clamped(0.9, 0.9),
            NormalizedPoint::clamped(0.1, 0.9),
        ],
        confidence: 0.8,
    }
}

fn photos(events: &[SessionEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, SessionEvent::PhotoCaptured(_)))
        .count()
}

// =========================================================================
// Capture workflow
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_countdown_three_two_one_then_capture() {
    let mut h = Harness::with_config(timer_config(PhotoTimerSetting::Seconds3));
    h.feed_frame(0);

    h.session.take_photo();
    let state = h.snapshot();
    assert_eq!(state.countdown, Some(3));
    assert!(!state.is_capturing);

    sleep_ms(500).await;
    assert_eq!(h.snapshot().countdown, Some(3));
    sleep_ms(1000).await;
    assert_eq!(h.snapshot().countdown, Some(2));
    sleep_ms(1000).await;
    assert_eq!(h.snapshot().countdown, Some(1));

    let capturing = h.wait_for(|s| s.is_capturing).await;
    assert_eq!(capturing.countdown, None, "no countdown during capture");

    let done = h.wait_for(|s| !s.is_capturing).await;
    assert_eq!(done.countdown, None);
    assert_eq!(h.rig.camera.capture_count(), 1);
    assert!(matches!(h.next_event().await, SessionEvent::PhotoCaptured(_)));
}

#[tokio::test(start_paused = true)]
async fn test_double_take_photo_captures_once() {
    let mut h = Harness::new();
    h.feed_frame(0);

    h.session.take_photo();
    h.session.take_photo();
    h.wait_for(|s| !s.is_capturing).await;
    sleep_ms(500).await;

    assert_eq!(h.rig.camera.capture_count(), 1);
    assert_eq!(photos(&h.drain_events()), 1);
}

#[tokio::test(start_paused = true)]
async fn test_take_photo_ignored_while_counting_down() {
    let mut h = Harness::with_config(timer_config(PhotoTimerSetting::Seconds3));

    h.session.take_photo();
    sleep_ms(1500).await;
    h.session.take_photo();
    assert_eq!(h.snapshot().countdown, Some(2));

    sleep_ms(5000).await;
    assert_eq!(h.rig.camera.capture_count(), 1);
    assert_eq!(photos(&h.drain_events()), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restarted_countdown_never_exceeds_new_duration() {
    let h = Harness::with_config(timer_config(PhotoTimerSetting::Seconds10));

    h.session.take_photo();
    sleep_ms(1500).await;
    assert_eq!(h.snapshot().countdown, Some(9));

    h.session.start_countdown(3);
    assert_eq!(h.snapshot().countdown, Some(3));
    for _ in 0..40 {
        sleep_ms(250).await;
        if let Some(remaining) = h.snapshot().countdown {
            assert!(remaining <= 3, "countdown showed {}", remaining);
        }
    }
    assert_eq!(h.rig.camera.capture_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_countdown_skips_capture() {
    let mut h = Harness::with_config(timer_config(PhotoTimerSetting::Seconds3));

    h.session.take_photo();
    sleep_ms(1500).await;
    assert!(h.session.cancel_countdown());
    assert!(!h.session.cancel_countdown());

    sleep_ms(5000).await;
    assert_eq!(h.snapshot().countdown, None);
    assert_eq!(h.rig.camera.capture_count(), 0);
    assert!(h.drain_events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_flash_overlay_clears_after_delay() {
    let h = Harness::new();

    h.session.take_photo();
    assert!(h.snapshot().flash_active);
    sleep_ms(150).await;
    assert!(!h.snapshot().flash_active);
}

#[tokio::test(start_paused = true)]
async fn test_capture_failure_reports_error_and_clears_flag() {
    let mut h = Harness::new();
    h.rig.camera.fail(CameraOperation::Capture);

    h.session.take_photo();
    let state = h.wait_for(|s| !s.is_capturing).await;
    assert!(state.last_error.is_some());
    assert!(matches!(h.next_event().await, SessionEvent::Error(_)));

    // Next shutter press works again once the camera recovers
    h.rig.camera.recover(CameraOperation::Capture);
    h.session.take_photo();
    h.wait_for(|s| !s.is_capturing).await;
    assert!(matches!(h.next_event().await, SessionEvent::PhotoCaptured(_)));
}

#[tokio::test(start_paused = true)]
async fn test_capture_dismisses_popups() {
    let h = Harness::new();
    h.session.show_popup(PopupKind::FilterPicker);

    h.session.take_photo();
    assert_eq!(h.snapshot().popups.active(), None);
}

#[tokio::test(start_paused = true)]
async fn test_capture_refreshes_thumbnail() {
    let mut h = Harness::new();
    assert!(h.session.gallery_thumbnail().is_none());
    h.feed_frame(7);

    h.session.take_photo();
    let state = h.wait_for(|s| s.thumbnail_generation == 1 && !s.is_capturing).await;
    assert_eq!(state.thumbnail_generation, 1);

    let thumbnail = h.session.gallery_thumbnail().unwrap();
    assert_eq!(thumbnail.source_sequence, 7);
}

#[tokio::test(start_paused = true)]
async fn test_capture_without_frame_skips_thumbnail() {
    let mut h = Harness::new();

    h.session.take_photo();
    h.wait_for(|s| !s.is_capturing).await;
    assert!(matches!(h.next_event().await, SessionEvent::PhotoCaptured(_)));
    assert_eq!(h.snapshot().thumbnail_generation, 0);
}

#[tokio::test(start_paused = true)]
async fn test_portrait_capture_uses_blurred_frame() {
    let mut h = Harness::new();
    h.session.select_mode(CameraMode::Portrait).await;
    h.feed_frame(1);

    h.session.take_photo();
    let state = h.wait_for(|s| !s.is_capturing).await;

    let blur = state.last_blur.unwrap();
    assert!(blur.success);
    assert!(blur.has_person);
    assert_eq!(h.rig.portrait_blur.processed_count(), 1);
    assert!(h.rig.camera.calls().contains(&CameraCall::Capture {
        mode: CameraMode::Portrait,
        flash: FlashMode::Off,
        with_processed_frame: true,
    }));
}

#[tokio::test(start_paused = true)]
async fn test_portrait_blur_failure_still_captures() {
    let mut h = Harness::new();
    h.rig.portrait_blur.set_failing(true);
    h.session.select_mode(CameraMode::Portrait).await;
    h.feed_frame(1);

    h.session.take_photo();
    let state = h.wait_for(|s| !s.is_capturing).await;

    assert!(!state.last_blur.unwrap().success);
    assert!(matches!(h.next_event().await, SessionEvent::PhotoCaptured(_)));
    assert!(h.rig.camera.calls().contains(&CameraCall::Capture {
        mode: CameraMode::Portrait,
        flash: FlashMode::Off,
        with_processed_frame: false,
    }));
}

// =========================================================================
// Focus
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_focus_indicator_expires() {
    let h = Harness::new();

    h.session.on_focus(0.3, 1.7);
    let state = h.snapshot();
    let focus = state.focus.unwrap();
    assert_eq!(focus.point, NormalizedPoint { x: 0.3, y: 1.0 });
    assert!(state.is_focusing);

    sleep_ms(100).await;
    assert!(!h.snapshot().is_focusing);
    assert!(h.snapshot().focus.is_some());

    sleep_ms(2800).await;
    assert!(h.snapshot().focus.is_some());
    sleep_ms(200).await;
    assert!(h.snapshot().focus.is_none());
    assert!(
        h.rig
            .camera
            .calls()
            .contains(&CameraCall::Focus(NormalizedPoint { x: 0.3, y: 1.0 }))
    );
}

#[tokio::test(start_paused = true)]
async fn test_newer_focus_restarts_expiry() {
    let h = Harness::new();

    h.session.on_focus(0.2, 0.2);
    let first = h.snapshot().focus.unwrap().sequence;
    sleep_ms(2000).await;
    h.session.on_focus(0.8, 0.8);
    let second = h.snapshot().focus.unwrap().sequence;
    assert!(second > first);

    sleep_ms(1500).await;
    let focus = h.snapshot().focus.unwrap();
    assert_eq!(focus.sequence, second);

    sleep_ms(2000).await;
    assert!(h.snapshot().focus.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_focus_failure_still_settles() {
    let h = Harness::new();
    h.rig.camera.fail(CameraOperation::Focus);

    h.session.on_focus(0.5, 0.5);
    sleep_ms(100).await;
    let state = h.snapshot();
    assert!(!state.is_focusing);
    assert!(state.focus.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_focus_dismisses_popups() {
    let h = Harness::new();
    h.session.show_popup(PopupKind::Settings);

    h.session.on_focus(0.5, 0.5);
    assert_eq!(h.snapshot().popups.active(), None);
}

// =========================================================================
// Analysis dispatch
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_frames_routed_by_mode() {
    let h = Harness::new();

    h.feed_frame(0);
    assert_eq!(h.rig.face_detector.frames_processed(), 0);
    assert_eq!(h.rig.document_detector.frames_processed(), 0);

    h.session.select_mode(CameraMode::Portrait).await;
    h.feed_frame(1);
    assert_eq!(h.rig.face_detector.frames_processed(), 1);
    assert!(!h.rig.face_detector.last_front_facing());

    h.session.select_mode(CameraMode::Document).await;
    h.feed_frame(2);
    assert_eq!(h.rig.face_detector.frames_processed(), 1);
    assert_eq!(h.rig.document_detector.frames_processed(), 1);

    assert_eq!(h.session.frames_received(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_front_lens_flag_forwarded_to_face_detector() {
    let h = Harness::new();
    h.session.switch_camera().await;
    h.session.select_mode(CameraMode::Portrait).await;

    h.feed_frame(0);
    assert!(h.rig.face_detector.last_front_facing());
}

#[tokio::test(start_paused = true)]
async fn test_leaving_portrait_resets_face_tracking() {
    let mut h = Harness::new();
    h.session.select_mode(CameraMode::Portrait).await;
    assert!(h.rig.face_detector.is_enabled());
    assert!(h.rig.face_detector.is_tracking_focus());

    h.rig.face_detector.emit(FaceEvent::Faces(vec![face()]));
    h.rig
        .face_detector
        .emit(FaceEvent::Tracking(FaceTrackingState::Tracking));
    h.wait_for(|s| s.faces.len() == 1 && s.face_tracking == FaceTrackingState::Tracking)
        .await;

    h.session.select_mode(CameraMode::Photo).await;
    let state = h.snapshot();
    assert!(state.faces.is_empty());
    assert_eq!(state.face_tracking, FaceTrackingState::Idle);
    assert!(!h.rig.face_detector.is_enabled());
    assert!(!h.rig.face_detector.is_tracking_focus());
}

#[tokio::test(start_paused = true)]
async fn test_face_events_ignored_outside_portrait() {
    let h = Harness::new();

    h.rig.face_detector.emit(FaceEvent::Faces(vec![face()]));
    h.rig
        .face_detector
        .emit(FaceEvent::FocusPoint(NormalizedPoint::clamped(0.5, 0.5)));
    sleep_ms(50).await;

    let state = h.snapshot();
    assert!(state.faces.is_empty());
    assert!(state.focus.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_face_focus_point_behaves_like_touch() {
    let mut h = Harness::new();
    h.session.select_mode(CameraMode::Portrait).await;

    h.rig
        .face_detector
        .emit(FaceEvent::FocusPoint(NormalizedPoint::clamped(0.25, 0.75)));
    let state = h.wait_for(|s| s.focus.is_some()).await;
    assert_eq!(
        state.focus.unwrap().point,
        NormalizedPoint { x: 0.25, y: 0.75 }
    );

    sleep_ms(3500).await;
    assert!(h.snapshot().focus.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_document_bounds_and_auto_capture() {
    let mut h = Harness::new();
    h.session.select_mode(CameraMode::Document).await;
    assert!(h.rig.document_detector.is_enabled());

    h.rig
        .document_detector
        .emit(DocumentEvent::Bounds(Some(document())));
    h.wait_for(|s| s.document_bounds.is_some()).await;

    h.rig.document_detector.emit(DocumentEvent::AutoCapture);
    h.wait_for(|s| s.is_capturing).await;
    h.wait_for(|s| !s.is_capturing).await;
    assert_eq!(h.rig.camera.capture_count(), 1);

    h.session.select_mode(CameraMode::Photo).await;
    assert!(h.snapshot().document_bounds.is_none());
    assert!(!h.rig.document_detector.is_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_histogram_computed_when_enabled() {
    let mut h = Harness::new();
    h.feed_frame(0);
    sleep_ms(50).await;
    assert!(h.snapshot().histogram.is_none());

    h.session.set_histogram_enabled(true);
    h.feed_frame(1);
    let state = h.wait_for(|s| s.histogram.is_some()).await;
    let histogram = state.histogram.unwrap();
    assert!(histogram.samples() > 0);
    assert_eq!(histogram.frame_sequence, 1);

    h.session.set_histogram_enabled(false);
    assert!(h.snapshot().histogram.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_night_progress_mirrored_only_in_night_mode() {
    let mut h = Harness::new();
    let progress = camera_session::backends::types::ProcessingProgress::new("fusing", 0.5);

    h.rig.night_processor.publish(Some(progress.clone()));
    sleep_ms(50).await;
    assert!(h.snapshot().night_progress.is_none());

    h.session.select_mode(CameraMode::Night).await;
    h.rig.night_processor.publish(None);
    h.rig.night_processor.publish(Some(progress.clone()));
    let state = h.wait_for(|s| s.night_progress.is_some()).await;
    assert!(state.is_night_processing());

    h.rig.night_processor.publish(None);
    h.wait_for(|s| s.night_progress.is_none()).await;
}

// =========================================================================
// Mode controller
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_night_mode_exposure_within_camera_range() {
    for (min, max) in [(-12, 12), (-3, 3), (-4, -1), (0, 0), (-2, 7)] {
        let camera = SimulatedCamera::new().with_exposure_range(ExposureRange::new(min, max, 0.5));
        let h = Harness::with_camera(camera);

        h.session.select_mode(CameraMode::Night).await;
        let state = h.snapshot();
        assert_eq!(state.mode, CameraMode::Night);
        assert!(
            (min..=max).contains(&state.exposure_compensation),
            "exposure {} outside [{}, {}]",
            state.exposure_compensation,
            min,
            max
        );
        assert!(state.hdr_enabled);
    }
}

#[tokio::test(start_paused = true)]
async fn test_night_mode_presets_applied_and_reverted() {
    let camera = SimulatedCamera::new().with_exposure_range(ExposureRange::new(-3, 3, 0.5));
    let h = Harness::with_camera(camera);

    h.session.select_mode(CameraMode::Night).await;
    assert_eq!(h.snapshot().exposure_compensation, 2);
    let calls = h.rig.camera.calls();
    assert!(calls.contains(&CameraCall::NightMode(true)));
    assert!(calls.contains(&CameraCall::Exposure(2)));
    assert!(calls.contains(&CameraCall::Hdr(true)));

    h.session.select_mode(CameraMode::Photo).await;
    let state = h.snapshot();
    assert_eq!(state.exposure_compensation, 0);
    assert!(!state.hdr_enabled);
    assert!(h.rig.camera.calls().contains(&CameraCall::NightMode(false)));
}

#[tokio::test(start_paused = true)]
async fn test_night_mode_camera_failure_is_not_fatal() {
    let mut h = Harness::new();
    h.rig.camera.fail(CameraOperation::Hdr);

    h.session.select_mode(CameraMode::Night).await;
    let state = h.snapshot();
    assert_eq!(state.mode, CameraMode::Night);
    assert!(!state.hdr_enabled);
    assert!(state.last_error.is_some());
    assert!(
        h.drain_events()
            .iter()
            .any(|event| matches!(event, SessionEvent::Error(_)))
    );
}

#[tokio::test(start_paused = true)]
async fn test_pro_reselect_toggles_settings_panel() {
    let h = Harness::new();

    h.session.select_mode(CameraMode::Pro).await;
    assert_eq!(h.snapshot().popups.active(), None);

    h.session.select_mode(CameraMode::Pro).await;
    assert_eq!(h.snapshot().popups.active(), Some(PopupKind::ProSettings));

    h.session.select_mode(CameraMode::Pro).await;
    assert_eq!(h.snapshot().popups.active(), None);
    assert_eq!(h.snapshot().mode, CameraMode::Pro);
}

#[tokio::test(start_paused = true)]
async fn test_reselecting_active_mode_is_noop() {
    let h = Harness::new();
    h.session.show_popup(PopupKind::Settings);

    h.session.select_mode(CameraMode::Photo).await;
    assert_eq!(h.snapshot().popups.active(), Some(PopupKind::Settings));
    assert!(h.rig.camera.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_pro_exposure_applied_in_pro_mode() {
    let camera = SimulatedCamera::new().with_exposure_range(ExposureRange::new(-6, 12, 1.0 / 3.0));
    let h = Harness::with_camera(camera);

    h.session.update_pro_settings(|pro| pro.exposure = 0.5).await;
    assert_eq!(h.snapshot().exposure_compensation, 0);

    h.session.select_mode(CameraMode::Pro).await;
    assert_eq!(h.snapshot().exposure_compensation, 6);

    h.session
        .update_pro_settings(|pro| {
            pro.exposure = -2.0;
            pro.iso = 1_000_000;
        })
        .await;
    let state = h.snapshot();
    assert_eq!(state.pro.exposure, -1.0);
    assert_eq!(state.pro.iso, camera_session::constants::pro::MAX_ISO);
    assert_eq!(state.exposure_compensation, -6);

    h.session.select_mode(CameraMode::Photo).await;
    assert_eq!(h.snapshot().exposure_compensation, 0);
}

#[tokio::test(start_paused = true)]
async fn test_mode_switch_cancels_countdown_and_popups() {
    let h = Harness::with_config(timer_config(PhotoTimerSetting::Seconds3));
    h.session.take_photo();
    h.session.show_popup(PopupKind::TimerPicker);

    h.session.select_mode(CameraMode::Video).await;
    let state = h.snapshot();
    assert_eq!(state.countdown, None);
    assert_eq!(state.popups.active(), None);

    sleep_ms(5000).await;
    assert_eq!(h.rig.camera.capture_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_no_capture_starts_while_mode_switches() {
    let camera = SimulatedCamera::new().with_control_delay(Duration::from_millis(200));
    let h = Harness::with_camera(camera);

    let switching = h.session.clone();
    let switch = tokio::spawn(async move { switching.select_mode(CameraMode::Night).await });
    sleep_ms(50).await;
    assert!(h.snapshot().switching_mode);

    h.session.take_photo();
    h.session.start_countdown(3);
    h.session.execute_capture();
    let state = h.snapshot();
    assert!(!state.is_capturing);
    assert_eq!(state.countdown, None);

    switch.await.unwrap();
    let state = h.snapshot();
    assert_eq!(state.mode, CameraMode::Night);
    assert!(!state.switching_mode);

    sleep_ms(5000).await;
    assert_eq!(h.rig.camera.capture_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_mode_switch_unblocks_capture() {
    let camera = SimulatedCamera::new().with_control_delay(Duration::from_millis(200));
    let h = Harness::with_camera(camera);

    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), h.session.select_mode(CameraMode::Night))
            .await;
    assert!(abandoned.is_err());
    let state = h.snapshot();
    assert_eq!(state.mode, CameraMode::Photo);
    assert!(!state.switching_mode);

    h.session.take_photo();
    assert!(h.snapshot().is_capturing);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_mode_menu_twice_returns_to_none() {
    let h = Harness::new();

    h.session.toggle_mode_menu();
    assert_eq!(h.snapshot().popups.active(), Some(PopupKind::ModeMenu));
    h.session.toggle_mode_menu();
    assert_eq!(h.snapshot().popups.active(), None);
}

#[tokio::test(start_paused = true)]
async fn test_popup_back_navigation() {
    let h = Harness::new();

    h.session.show_popup(PopupKind::Settings);
    h.session.show_popup(PopupKind::AspectRatioPicker);
    h.session.popup_back();
    assert_eq!(h.snapshot().popups.active(), Some(PopupKind::Settings));
    h.session.hide_popup();
    assert_eq!(h.snapshot().popups.active(), None);
}

// =========================================================================
// Settings
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_flash_not_updated_until_camera_accepts() {
    let mut h = Harness::new();
    h.rig.camera.fail(CameraOperation::Flash);

    h.session.set_flash(FlashMode::On).await;
    assert_eq!(h.snapshot().flash_mode, FlashMode::Off);
    assert!(matches!(h.next_event().await, SessionEvent::Error(_)));

    h.rig.camera.recover(CameraOperation::Flash);
    h.session.cycle_flash().await;
    assert_eq!(h.snapshot().flash_mode, FlashMode::On);
}

#[tokio::test(start_paused = true)]
async fn test_zoom_clamped_to_camera_range() {
    let h = Harness::with_camera(SimulatedCamera::new().with_max_zoom(4.0));

    h.session.set_zoom(10.0).await;
    assert_eq!(h.snapshot().zoom_level, 4.0);
    h.session.set_zoom(0.2).await;
    assert_eq!(h.snapshot().zoom_level, 1.0);
    h.session.set_zoom(f32::NAN).await;
    assert_eq!(h.snapshot().zoom_level, 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_exposure_compensation_clamped() {
    let camera = SimulatedCamera::new().with_exposure_range(ExposureRange::new(-4, 4, 0.5));
    let h = Harness::with_camera(camera);

    h.session.set_exposure_compensation(9).await;
    assert_eq!(h.snapshot().exposure_compensation, 4);
    assert!(h.rig.camera.calls().contains(&CameraCall::Exposure(4)));
}

#[tokio::test(start_paused = true)]
async fn test_switch_camera_emits_event_and_clears_faces() {
    let mut h = Harness::new();
    h.session.select_mode(CameraMode::Portrait).await;
    h.rig.face_detector.emit(FaceEvent::Faces(vec![face()]));
    h.wait_for(|s| !s.faces.is_empty()).await;

    h.session.switch_camera().await;
    let state = h.snapshot();
    assert_eq!(state.lens_facing, LensFacing::Front);
    assert!(state.faces.is_empty());
    assert_eq!(h.next_event().await, SessionEvent::CameraSwitched);
}

#[tokio::test(start_paused = true)]
async fn test_local_settings_clamped() {
    let h = Harness::new();

    h.session.set_filter_intensity(3.0);
    h.session.set_beauty_level(12);
    h.session.cycle_photo_timer();
    h.session.cycle_aspect_ratio();
    h.session.toggle_macro();

    let state = h.snapshot();
    assert_eq!(state.filter_intensity, 1.0);
    assert_eq!(state.beauty_level, 5);
    assert_eq!(state.photo_timer, PhotoTimerSetting::Seconds3);
    assert!(state.macro_enabled);
}

// =========================================================================
// Video recording and teardown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_video_recording_ticks_and_saves() {
    let mut h = Harness::new();

    h.session.toggle_recording().await;
    assert_eq!(h.snapshot().recording, RecordingSnapshot::Idle);

    h.session.select_mode(CameraMode::Video).await;
    h.session.toggle_recording().await;
    assert_eq!(
        h.snapshot().recording,
        RecordingSnapshot::Recording { elapsed_secs: 0 }
    );

    sleep_ms(2500).await;
    assert_eq!(
        h.snapshot().recording,
        RecordingSnapshot::Recording { elapsed_secs: 2 }
    );

    h.session.toggle_recording().await;
    assert_eq!(h.snapshot().recording, RecordingSnapshot::Idle);
    assert!(matches!(h.next_event().await, SessionEvent::VideoRecorded(_)));
}

#[tokio::test(start_paused = true)]
async fn test_leaving_video_mode_finalizes_recording() {
    let mut h = Harness::new();
    h.session.select_mode(CameraMode::Video).await;
    h.session.toggle_recording().await;

    h.session.select_mode(CameraMode::Photo).await;
    assert!(h.snapshot().recording.is_idle());
    assert!(matches!(h.next_event().await, SessionEvent::VideoRecorded(_)));
}

#[tokio::test(start_paused = true)]
async fn test_recording_started_during_mode_switch_is_finalized() {
    let camera = SimulatedCamera::new().with_control_delay(Duration::from_millis(200));
    let mut h = Harness::with_camera(camera);
    h.session.select_mode(CameraMode::Video).await;

    let starting = h.session.clone();
    let start = tokio::spawn(async move { starting.toggle_recording().await });
    sleep_ms(50).await;
    assert_eq!(h.snapshot().recording, RecordingSnapshot::Starting);

    h.session.select_mode(CameraMode::Photo).await;
    start.await.unwrap();

    let state = h.wait_for(|s| s.recording.is_idle()).await;
    assert_eq!(state.mode, CameraMode::Photo);
    assert!(matches!(h.next_event().await, SessionEvent::VideoRecorded(_)));
    assert!(h.rig.camera.calls().contains(&CameraCall::StopRecording));

    sleep_ms(1000).await;
    assert_eq!(h.snapshot().recording, RecordingSnapshot::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_recording_start_failure_rolls_back() {
    let mut h = Harness::new();
    h.rig.camera.fail(CameraOperation::StartRecording);
    h.session.select_mode(CameraMode::Video).await;

    h.session.toggle_recording().await;
    assert!(h.snapshot().recording.is_idle());
    assert!(matches!(h.next_event().await, SessionEvent::Error(_)));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_work() {
    let h = Harness::with_config(timer_config(PhotoTimerSetting::Seconds3));
    h.feed_frame(0);
    h.session.take_photo();
    h.session.on_focus(0.5, 0.5);

    h.session.shutdown();
    assert!(h.session.is_shut_down());
    let state = h.snapshot();
    assert_eq!(state.countdown, None);
    assert!(state.focus.is_none());

    sleep_ms(5000).await;
    assert_eq!(h.rig.camera.capture_count(), 0);
    assert!(h.session.gallery_thumbnail().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_operations_after_shutdown_are_ignored() {
    let mut h = Harness::new();
    h.feed_frame(0);
    h.session.shutdown();
    let frozen = h.snapshot();

    h.session.take_photo();
    h.session.start_countdown(3);
    h.session.execute_capture();
    h.session.on_focus(0.2, 0.8);
    h.feed_frame(1);
    h.session.select_mode(CameraMode::Timelapse).await;
    assert!(!h.session.start_timelapse(TimelapseConfig::new(1_000, 30)));
    h.session.toggle_recording().await;
    h.session.set_zoom(2.0).await;
    h.session.toggle_macro();

    sleep_ms(1000).await;
    let state = h.snapshot();
    assert_eq!(state, frozen);
    assert!(!state.is_capturing);
    assert!(!state.flash_active);
    assert_eq!(state.countdown, None);
    assert!(state.focus.is_none());
    assert_eq!(state.mode, CameraMode::Photo);
    assert_eq!(state.timelapse.state, TimelapseState::Idle);
    assert_eq!(h.session.frames_received(), 1);
    assert_eq!(h.rig.camera.capture_count(), 0);
    assert!(
        !h.rig
            .camera
            .calls()
            .iter()
            .any(|call| matches!(call, CameraCall::Zoom(_)))
    );
    assert!(h.drain_events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_mode_switch_keeps_state_frozen() {
    let camera = SimulatedCamera::new().with_control_delay(Duration::from_millis(200));
    let h = Harness::with_camera(camera);

    let switching = h.session.clone();
    let switch = tokio::spawn(async move { switching.select_mode(CameraMode::Night).await });
    sleep_ms(50).await;
    h.session.shutdown();

    switch.await.unwrap();
    let state = h.snapshot();
    assert_eq!(state.mode, CameraMode::Photo);
    assert!(!state.switching_mode);
    assert!(!state.hdr_enabled);
}

#[test]
fn test_session_requires_runtime_handle() {
    let rig = SimulatedRig::new();
    let result = std::thread::spawn(move || {
        camera_session::SessionOrchestrator::new(Config::default(), rig.backends()).is_err()
    })
    .join()
    .unwrap();
    assert!(result);
}
