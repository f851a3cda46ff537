//! Teapot viewer
//!
//! Opens a window with the cube-map-lit teapot inside its skybox. Run with
//! `--headless [frames]` to drive the engine against the recording device
//! instead, which is handy on machines without a GL driver.
//!
//! ```text
//! teapot_viewer [--config <file>] [--headless [frames]]
//! ```

mod ui;
mod window;

use std::path::PathBuf;

use clap::{Arg, Command, value_parser};
use glfw::{Action, Key, MouseButton, WindowEvent};
use teapot_engine::prelude::*;

use ui::TitleUi;
use window::{Events, GlfwContext};

const WINDOW_TITLE: &str = "Teapot";
const ROUGHNESS_STEP: f32 = 0.1;
/// Finger spacing, in pixels, of the pinch one scroll notch simulates
const SCROLL_PINCH_SPREAD: f32 = 100.0;

const DEFAULT_HEADLESS_FRAMES: &str = "300";

#[derive(Debug, PartialEq, Eq)]
struct Options {
    config: Option<PathBuf>,
    headless_frames: Option<u32>,
}

fn command() -> Command {
    Command::new("teapot_viewer")
        .about("Cube-map-lit teapot inside a skybox, with switchable materials and environments")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (.toml or .ron)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("headless")
                .long("headless")
                .value_name("FRAMES")
                .help("Drive the engine against the recording device for FRAMES frames")
                .num_args(0..=1)
                .default_missing_value(DEFAULT_HEADLESS_FRAMES)
                .value_parser(value_parser!(u32)),
        )
}

fn parse_args<I, T>(args: I) -> Result<Options, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    Ok(Options {
        config: matches.get_one::<PathBuf>("config").cloned(),
        headless_frames: matches.get_one::<u32>("headless").copied(),
    })
}

/// Mouse state turned into touch-style gestures
#[derive(Debug, Default)]
struct Pointer {
    cursor: Vec2,
    dragging: bool,
}

impl Pointer {
    fn gestures(&mut self, event: &WindowEvent) -> Vec<GestureEvent> {
        match *event {
            WindowEvent::CursorPos(x, y) => {
                self.cursor = Vec2::new(x as f32, y as f32);
                if self.dragging {
                    vec![GestureEvent::DragMove(self.cursor)]
                } else {
                    Vec::new()
                }
            }
            WindowEvent::MouseButton(MouseButton::Button1, Action::Press, _) => {
                self.dragging = true;
                vec![GestureEvent::DragStart(self.cursor)]
            }
            WindowEvent::MouseButton(MouseButton::Button1, Action::Release, _) => {
                self.dragging = false;
                vec![GestureEvent::DragEnd]
            }
            WindowEvent::MouseButton(MouseButton::Button2, Action::Press, _) => vec![GestureEvent::DoubleTap],
            WindowEvent::Scroll(_, dy) => {
                let half = Vec2::new(SCROLL_PINCH_SPREAD * 0.5, 0.0);
                let scaled = half * (1.0 + 0.1 * dy as f32);
                vec![
                    GestureEvent::PinchStart(self.cursor - half, self.cursor + half),
                    GestureEvent::PinchMove(self.cursor - scaled, self.cursor + scaled),
                ]
            }
            _ => Vec::new(),
        }
    }
}

fn handle_key(engine: &mut Engine<GlfwContext>, requests: &RequestHandle, key: Key) {
    match key {
        Key::Escape => engine.context_mut().window_mut().set_should_close(true),
        Key::M => {
            requests.material.cycle();
        }
        Key::S => {
            requests.stage.cycle();
        }
        Key::Up => requests.roughness.request(engine.teapot().roughness() + ROUGHNESS_STEP),
        Key::Down => requests.roughness.request(engine.teapot().roughness() - ROUGHNESS_STEP),
        Key::R => requests.request_reload(),
        Key::L => engine.on_low_memory(),
        _ => {}
    }
}

fn handle_event(
    engine: &mut Engine<GlfwContext>,
    requests: &RequestHandle,
    pointer: &mut Pointer,
    event: WindowEvent,
) -> Result<(), EngineError> {
    match event {
        WindowEvent::Key(key, _, Action::Press, _) => handle_key(engine, requests, key),
        WindowEvent::Close => engine.context_mut().window_mut().set_should_close(true),
        WindowEvent::FramebufferSize(width, height) if width > 0 && height > 0 => {
            log::debug!("Framebuffer resized to {}x{}", width, height);
            engine.on_surface_available(window::FramebufferSize { width, height })?;
        }
        WindowEvent::Iconify(true) => engine.on_surface_destroyed(),
        WindowEvent::Iconify(false) => {
            let size = engine.context().framebuffer_size();
            engine.on_surface_available(size)?;
            if engine.context().window().is_focused() {
                engine.on_focus_gained();
            }
        }
        WindowEvent::Focus(true) => engine.on_focus_gained(),
        WindowEvent::Focus(false) => {
            engine.on_focus_lost()?;
        }
        other => {
            for gesture in pointer.gestures(&other) {
                engine.handle_gesture(gesture);
            }
        }
    }
    Ok(())
}

fn run_windowed(config: ApplicationConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (mut glfw, context, events): (glfw::Glfw, GlfwContext, Events) = GlfwContext::create(WINDOW_TITLE, 800, 600)?;
    let loader = FileCubemapLoader::from_config(&config.assets);
    let ui = TitleUi::new(WINDOW_TITLE);

    let mut engine = Engine::new(config, context, Box::new(loader))?.with_ui(Box::new(ui.clone()));
    let requests = engine.requests();
    let mut pointer = Pointer::default();

    let size = engine.context().framebuffer_size();
    engine.on_surface_available(size)?;
    engine.on_focus_gained();

    while !engine.context().window().should_close() {
        glfw.poll_events();
        for (_, event) in glfw::flush_messages(&events) {
            handle_event(&mut engine, &requests, &mut pointer, event)?;
        }

        if let Some(title) = ui.take_title() {
            engine.context_mut().window_mut().set_title(&title);
        }

        if engine.draw_frame()? == FrameOutcome::Skipped {
            glfw.wait_events_timeout(0.1);
        }
    }

    // GL objects must go before the window and its context
    engine.terminate();
    Ok(())
}

fn run_headless(config: ApplicationConfig, frames: u32) -> Result<(), Box<dyn std::error::Error>> {
    let loader = FileCubemapLoader::from_config(&config.assets);
    let mut engine = Engine::new(config, HeadlessContext::new(), Box::new(loader))?.with_ui(Box::new(LogUi));
    let requests = engine.requests();

    engine.on_surface_available(HeadlessSurface::new(800, 600))?;
    engine.on_focus_gained();

    for frame in 0..frames {
        if frame > 0 && frame % 60 == 0 {
            requests.material.cycle();
        }
        if frame > 0 && frame % 150 == 0 {
            requests.stage.cycle();
        }
        engine.draw_frame_at(f64::from(frame) / 60.0)?;
    }

    let report = engine.last_environment();
    let recorder = engine.context().recorder();
    log::info!(
        "Headless run: {} frames presented, {} draw calls, stage '{}' ({} of {} faces loaded)",
        engine.context().frames_presented(),
        recorder.draw_calls().len(),
        engine.current_stage().name,
        report.requested - report.failed,
        report.requested
    );

    engine.terminate();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = match parse_args(std::env::args_os()) {
        Ok(options) => options,
        Err(e) => e.exit(),
    };

    let config = match &options.config {
        Some(path) => ApplicationConfig::load_from_file(path)?,
        None => ApplicationConfig::default(),
    };

    teapot_engine::foundation::logging::init_with_level(&config.engine.log_level);

    log::info!("Starting teapot viewer");
    match options.headless_frames {
        Some(frames) => run_headless(config, frames),
        None => run_windowed(config),
    }
}
