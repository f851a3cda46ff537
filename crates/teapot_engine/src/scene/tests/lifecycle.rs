use super::Harness;
use crate::gpu::{CubeFace, GpuCommand, GpuDevice, ShaderStage, Viewport};
use crate::platform::{DeviceContext, HeadlessSurface, SurfaceStatus};
use crate::render::{ProjectionBranch, RenderError, Renderable};
use crate::scene::{DisplayState, EngineError, FrameOutcome};

#[test]
fn test_first_surface_loads_everything() {
    let harness = Harness::started(800, 600);
    let engine = &harness.engine;

    assert_eq!(engine.state(), DisplayState::DisplayActive);
    assert!(engine.is_ready());

    let teapot = engine.teapot().handles();
    let skybox = engine.skybox().handles();
    assert!(teapot.core_allocated() && teapot.cubemap.is_allocated());
    assert!(skybox.core_allocated() && skybox.cubemap.is_allocated());

    assert_eq!(engine.teapot().transforms().projection_branch(), ProjectionBranch::Landscape);
    assert_eq!(engine.context().recorder().viewport(), Viewport::from_size(800, 600));
    assert_eq!(engine.context().frames_presented(), 1);
    assert!(engine.context().input_active());

    let built = harness.ui.log.borrow().built.clone();
    assert_eq!(built, Some(("Gold".to_string(), "St Peters".to_string())));
}

#[test]
fn test_face_requests_follow_mip_then_face_order() {
    let harness = Harness::started(800, 600);
    let requests = harness.face_requests();

    // Teapot: 8 mip levels, then the skybox: 1 level
    assert_eq!(requests.len(), 6 * 8 + 6);
    for (i, request) in requests.iter().take(48).enumerate() {
        assert_eq!(request.level as usize, i / 6);
        assert_eq!(request.face, CubeFace::ALL[i % 6]);
    }
    assert_eq!(requests[0].name, "cubemaps/stpeters_phong_m00_c00.bmp");
    assert_eq!(requests[47].name, "cubemaps/stpeters_phong_m07_c05.bmp");
    assert!(requests[48..].iter().all(|r| r.level == 0));
    assert_eq!(harness.engine.last_environment().failed, 0);
}

#[test]
fn test_portrait_surface_selects_portrait_projection() {
    let harness = Harness::started(600, 800);
    assert_eq!(harness.engine.teapot().transforms().projection_branch(), ProjectionBranch::Portrait);
    assert_eq!(harness.engine.skybox().transforms().projection_branch(), ProjectionBranch::Portrait);
}

#[test]
fn test_suspend_and_clean_resume_keep_resources() {
    let mut harness = Harness::started(800, 600);
    let before = harness.engine.teapot().handles();

    harness.engine.on_surface_destroyed();
    assert_eq!(harness.engine.state(), DisplayState::Suspended);
    assert!(!harness.engine.is_ready());
    assert!(!harness.engine.context().input_active());
    assert_eq!(harness.engine.draw_frame_at(1.0).expect("frame"), FrameOutcome::Skipped);

    harness.engine.on_surface_available(HeadlessSurface::new(1024, 768)).expect("resume");
    assert_eq!(harness.engine.recoveries(), 0);
    assert_eq!(harness.engine.teapot().handles(), before);
    assert_eq!(harness.engine.context().recorder().viewport(), Viewport::from_size(1024, 768));

    let log = harness.ui.log.borrow();
    assert_eq!((log.suspended, log.resumed), (1, 1));
}

#[test]
fn test_low_memory_then_resume_rebuilds() {
    let mut harness = Harness::started(800, 600);
    let before = harness.engine.teapot().handles();

    harness.engine.on_low_memory();
    harness.engine.on_surface_destroyed();
    harness.engine.on_surface_available(HeadlessSurface::new(800, 600)).expect("resume");

    assert_eq!(harness.engine.recoveries(), 1);
    let after = harness.engine.teapot().handles();
    assert!(after.core_allocated() && after.cubemap.is_allocated());
    assert_ne!(after.program, before.program);

    let recorder = harness.engine.context().recorder();
    assert_eq!(recorder.live_buffer_count(), 4);
    assert_eq!(recorder.live_program_count(), 2);
    assert_eq!(recorder.live_texture_count(), 2);
    assert_eq!(recorder.invalid_deletes(), 0);
}

#[test]
fn test_scripted_lost_resume_rebuilds() {
    let mut harness = Harness::started(800, 600);
    harness.engine.on_surface_destroyed();
    harness.engine.context_mut().queue_resume_status(SurfaceStatus::Lost);
    harness.engine.on_surface_available(HeadlessSurface::new(800, 600)).expect("resume");
    assert_eq!(harness.engine.recoveries(), 1);
}

#[test]
fn test_reload_allocates_exactly_once_per_resource() {
    let mut harness = Harness::started(800, 600);
    let before = harness.engine.context().recorder().allocations();

    harness.engine.reload_resources().expect("reload");

    let after = harness.engine.context().recorder().allocations();
    assert_eq!(after.buffers - before.buffers, 4);
    assert_eq!(after.programs - before.programs, 2);
    assert_eq!(after.textures - before.textures, 2);
    assert_eq!(harness.engine.context().recorder().live_buffer_count(), 4);
}

#[test]
fn test_repeated_reloads_keep_uniform_table_bounded() {
    let mut harness = Harness::started(800, 600);
    let resolved = harness.engine.context().recorder().live_uniform_count();
    assert!(resolved > 0);

    for _ in 0..5 {
        harness.engine.reload_resources().expect("reload");
    }

    let recorder = harness.engine.context().recorder();
    assert_eq!(recorder.live_uniform_count(), resolved);
    assert_eq!(recorder.live_program_count(), 2);

    harness.engine.terminate();
    assert_eq!(harness.engine.context().recorder().live_uniform_count(), 0);
}

#[test]
fn test_terminate_releases_everything() {
    let mut harness = Harness::started(800, 600);
    harness.engine.terminate();
    harness.engine.terminate();

    assert_eq!(harness.engine.state(), DisplayState::Terminated);
    assert!(harness.engine.teapot().handles().none_allocated());
    assert!(harness.engine.skybox().handles().none_allocated());

    let recorder = harness.engine.context().recorder();
    assert_eq!(recorder.live_buffer_count(), 0);
    assert_eq!(recorder.live_texture_count(), 0);
    assert_eq!(recorder.live_program_count(), 0);
    assert_eq!(recorder.invalid_deletes(), 0);

    let err = harness.engine.on_surface_available(HeadlessSurface::new(800, 600)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[test]
fn test_shader_failure_is_reported_and_never_drawn() {
    let mut harness = Harness::new();
    harness.engine.context_mut().device().fail_shader_compile(Some(ShaderStage::Vertex));

    let err = harness.engine.on_surface_available(HeadlessSurface::new(800, 600)).unwrap_err();
    assert!(matches!(err, EngineError::Render(RenderError::ShaderCompileFailure(_))));
    assert!(!harness.engine.teapot().is_initialized());
    assert!(!harness.engine.skybox().is_initialized());

    harness.engine.on_focus_gained();
    assert_eq!(harness.engine.draw_frame_at(1.0).expect("frame"), FrameOutcome::Presented);
    let draws = harness
        .engine
        .context()
        .recorder()
        .commands()
        .iter()
        .filter(|c| matches!(c, GpuCommand::DrawIndexed { .. }))
        .count();
    assert_eq!(draws, 0);
}

#[test]
fn test_focus_loss_draws_one_final_frame() {
    let mut harness = Harness::started(800, 600);
    let presented = harness.engine.context().frames_presented();

    assert_eq!(harness.engine.on_focus_lost().expect("frame"), FrameOutcome::Presented);
    assert_eq!(harness.engine.context().frames_presented(), presented + 1);
    assert!(!harness.engine.is_ready());
    assert!(!harness.engine.context().input_active());

    assert_eq!(harness.engine.draw_frame_at(5.0).expect("frame"), FrameOutcome::Skipped);
    assert_eq!(harness.engine.context().frames_presented(), presented + 1);
}
