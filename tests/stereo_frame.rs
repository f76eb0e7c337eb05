// tests/stereo_frame.rs
//
// End-to-end frame tests: a fixed tracker and a recording renderer driven
// through StereoController.

use glam::{Mat4, Quat};
use hmd_stereo::{
    DeviceParams, Distortion, EyeType, EyeView, FixedHeadTracker, FrameOutcome,
    HeadMountedDisplay, HeadTransform, ScreenParams, StereoConfig, StereoController, StereoError,
    StereoRendererDelegate, Viewport,
};

#[derive(Debug, PartialEq)]
enum Call {
    Prepare(Mat4),
    Draw(EyeType, Viewport),
    Finish(Viewport),
    Resized(i32, i32),
}

#[derive(Default)]
struct RecordingRenderer {
    calls: Vec<Call>,
    eyes: Vec<EyeView>,
}

impl StereoRendererDelegate for RecordingRenderer {
    fn prepare_new_frame(&mut self, head: &HeadTransform) {
        self.calls.push(Call::Prepare(head.head_view));
    }

    fn draw_eye(&mut self, eye: &EyeView) {
        self.calls.push(Call::Draw(eye.eye_type, eye.viewport));
        self.eyes.push(*eye);
    }

    fn finish_frame(&mut self, viewport: &Viewport) {
        self.calls.push(Call::Finish(*viewport));
    }

    fn renderer_did_change_size(&mut self, width: i32, height: i32) {
        self.calls.push(Call::Resized(width, height));
    }
}

fn fixture_hmd() -> HeadMountedDisplay {
    HeadMountedDisplay::new(
        ScreenParams {
            width: 1920,
            height: 1080,
            width_meters: 0.1,
            height_meters: 0.056,
            border_size_meters: 0.003,
        },
        DeviceParams {
            inter_lens_distance: 0.06,
            screen_to_lens_distance: 0.039,
            ..DeviceParams::default()
        },
    )
    .unwrap()
}

fn undistorted() -> StereoConfig {
    StereoConfig {
        distortion_correction_enabled: false,
        ..StereoConfig::default()
    }
}

#[test]
fn undistorted_frame_tiles_screen_and_draws_in_order() {
    let mut controller = StereoController::new(fixture_hmd(), undistorted());
    let tracker = FixedHeadTracker::default();
    let mut renderer = RecordingRenderer::default();

    let outcome = controller.render_frame(&tracker, &mut renderer).unwrap();
    assert_eq!(outcome, FrameOutcome::Drawn);

    let full = Viewport::new(0, 0, 1920, 1080).unwrap();
    let left = Viewport::new(0, 0, 960, 1080).unwrap();
    let right = Viewport::new(960, 0, 960, 1080).unwrap();
    assert_eq!(
        renderer.calls,
        vec![
            Call::Prepare(Mat4::IDENTITY),
            Call::Draw(EyeType::Left, left),
            Call::Draw(EyeType::Right, right),
            Call::Finish(full),
        ]
    );

    // no gap, no overlap, full width
    assert_eq!(left.right(), right.x);
    assert_eq!(right.right(), 1920);
    assert!(!left.overlaps(&right));

    let (l, r) = (&renderer.eyes[0], &renderer.eyes[1]);
    assert_eq!(l.fov.right, r.fov.left);
    assert_eq!(l.fov.left, r.fov.right);
    assert!((l.view.w_axis.x - 0.03).abs() < 1e-6);
    assert!((r.view.w_axis.x + 0.03).abs() < 1e-6);
}

#[test]
fn perspective_is_cached_across_frames() {
    let mut controller = StereoController::new(fixture_hmd(), StereoConfig::default());
    let mut tracker = FixedHeadTracker::default();
    let mut renderer = RecordingRenderer::default();

    controller.render_frame(&tracker, &mut renderer).unwrap();
    tracker.set_orientation(Quat::from_rotation_y(0.2));
    controller.render_frame(&tracker, &mut renderer).unwrap();

    assert_eq!(controller.left_eye().perspective_computations(), 1);
    assert_eq!(controller.right_eye().perspective_computations(), 1);
    assert_eq!(renderer.eyes[0].projection, renderer.eyes[2].projection);
    assert_ne!(renderer.eyes[0].view, renderer.eyes[2].view);
}

#[test]
fn distortion_mode_takes_viewports_from_layout() {
    let mut controller = StereoController::new(fixture_hmd(), StereoConfig::default());
    let mut renderer = RecordingRenderer::default();

    let outcome = controller
        .render_frame(&FixedHeadTracker::default(), &mut renderer)
        .unwrap();
    assert_eq!(outcome, FrameOutcome::Drawn);

    let left = controller.left_eye().viewport;
    let right = controller.right_eye().viewport;
    assert_eq!(left.x, 0);
    assert!((right.x - left.right()).abs() <= 1);
    let (tex_w, _) = controller.distortion_renderer().texture_size();
    assert!((right.right() - tex_w).abs() <= 1);

    let max = controller.hmd().device.max_fov;
    let fov = controller.left_eye().fov();
    assert!(fov.left <= max.left && fov.right <= max.right);
    assert_eq!(*controller.right_eye().fov(), fov.mirrored());
}

#[test]
fn nothing_happens_until_tracker_is_ready() {
    let mut controller = StereoController::new(fixture_hmd(), undistorted());
    let mut tracker = FixedHeadTracker::default();
    tracker.set_ready(false);
    let mut renderer = RecordingRenderer::default();

    let outcome = controller.render_frame(&tracker, &mut renderer).unwrap();
    assert_eq!(outcome, FrameOutcome::NotReady);
    assert!(renderer.calls.is_empty());
    assert!(controller.is_projection_changed());

    tracker.set_ready(true);
    assert_eq!(
        controller.render_frame(&tracker, &mut renderer).unwrap(),
        FrameOutcome::Drawn
    );
    assert!(!controller.is_projection_changed());
}

#[test]
fn paused_controller_draws_nothing() {
    let mut controller = StereoController::new(fixture_hmd(), undistorted());
    let mut renderer = RecordingRenderer::default();
    controller.set_paused(true);
    assert_eq!(
        controller
            .render_frame(&FixedHeadTracker::default(), &mut renderer)
            .unwrap(),
        FrameOutcome::NotReady
    );
    assert!(renderer.calls.is_empty());
}

#[test]
fn profile_change_invalidates_cached_projection() {
    let mut controller = StereoController::new(fixture_hmd(), StereoConfig::default());
    let tracker = FixedHeadTracker::default();
    let mut renderer = RecordingRenderer::default();
    controller.render_frame(&tracker, &mut renderer).unwrap();
    let before = *controller.left_eye().fov();

    let mut hmd = fixture_hmd();
    hmd.device = hmd_stereo::hmd::profile("cardboard-v2").unwrap();
    controller.set_hmd(hmd).unwrap();
    assert!(controller.is_projection_changed());

    controller.render_frame(&tracker, &mut renderer).unwrap();
    assert_ne!(*controller.left_eye().fov(), before);
    assert_eq!(controller.left_eye().perspective_computations(), 2);
    assert_ne!(renderer.eyes[0].projection, renderer.eyes[2].projection);
}

#[test]
fn invalid_profile_is_refused() {
    let mut controller = StereoController::new(fixture_hmd(), undistorted());
    let mut hmd = fixture_hmd();
    hmd.device.screen_to_lens_distance = 0.0;
    assert!(matches!(
        controller.set_hmd(hmd),
        Err(StereoError::Configuration(_))
    ));
    assert_eq!(controller.hmd().device.screen_to_lens_distance, 0.039);
}

#[test]
fn divergent_lens_drops_frames_until_mode_changes() {
    let mut hmd = fixture_hmd();
    hmd.device.distortion = Distortion::with_coefficients(&[1e300]).unwrap();
    let mut controller = StereoController::new(hmd, StereoConfig::default());
    let tracker = FixedHeadTracker::default();
    let mut renderer = RecordingRenderer::default();

    let err = controller.render_frame(&tracker, &mut renderer).unwrap_err();
    assert!(matches!(err, StereoError::NumericDivergence { .. }));
    assert_eq!(controller.draw_frame(&mut renderer), FrameOutcome::NotReady);
    assert!(renderer.calls.is_empty());

    controller.set_distortion_correction_enabled(false);
    assert_eq!(
        controller.render_frame(&tracker, &mut renderer).unwrap(),
        FrameOutcome::Drawn
    );
}

#[test]
fn monocular_mode_draws_single_full_screen_eye() {
    let config = StereoConfig {
        vr_mode_enabled: false,
        ..undistorted()
    };
    let mut controller = StereoController::new(fixture_hmd(), config);
    let mut renderer = RecordingRenderer::default();
    let head = Mat4::from_quat(Quat::from_rotation_x(0.3));

    controller
        .render_frame(&FixedHeadTracker::new(head), &mut renderer)
        .unwrap();

    let full = Viewport::new(0, 0, 1920, 1080).unwrap();
    assert_eq!(
        renderer.calls,
        vec![
            Call::Prepare(head),
            Call::Draw(EyeType::Monocular, full),
            Call::Finish(full),
        ]
    );
    assert_eq!(renderer.eyes[0].view, head);
}

#[test]
fn frame_in_flight_skips_new_frame() {
    let mut controller = StereoController::new(fixture_hmd(), undistorted());
    let mut renderer = RecordingRenderer::default();
    let gate = controller.frame_gate();

    let ticket = gate.try_begin().unwrap();
    assert_eq!(
        controller
            .render_frame(&FixedHeadTracker::default(), &mut renderer)
            .unwrap(),
        FrameOutcome::Skipped
    );
    assert!(renderer.calls.is_empty());

    drop(ticket);
    assert_eq!(
        controller
            .render_frame(&FixedHeadTracker::default(), &mut renderer)
            .unwrap(),
        FrameOutcome::Drawn
    );
}

#[test]
fn resize_resplits_viewports() {
    let mut controller = StereoController::new(fixture_hmd(), undistorted());
    let mut renderer = RecordingRenderer::default();
    controller.resize(1280, 720, &mut renderer).unwrap();
    assert!(controller.resize(0, 720, &mut renderer).is_err());

    controller
        .render_frame(&FixedHeadTracker::default(), &mut renderer)
        .unwrap();
    assert_eq!(renderer.calls[0], Call::Resized(1280, 720));
    assert_eq!(controller.left_eye().viewport.gl_viewport(), (0, 0, 640, 720));
    assert_eq!(controller.right_eye().viewport.gl_viewport(), (640, 0, 640, 720));
    assert_eq!(controller.monocular_eye().viewport.gl_viewport(), (0, 0, 1280, 720));
}

#[test]
fn json_profile_drives_controller() {
    let json = r#"{
        "screen": { "width": 2560, "height": 1440, "width_meters": 0.12, "height_meters": 0.0675 },
        "device": { "inter_lens_distance": 0.064, "screen_to_lens_distance": 0.039,
                    "distortion": { "coefficients": [0.34, 0.55] } }
    }"#;
    let hmd = HeadMountedDisplay::from_json(json).unwrap();
    let mut controller = StereoController::new(hmd, StereoConfig::default());
    assert!(controller.update(&FixedHeadTracker::default()).unwrap());
    assert!(controller.left_eye().fov().left > 0.0);
}
