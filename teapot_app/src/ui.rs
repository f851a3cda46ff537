//! Window-title readout
//!
//! The desktop has no on-screen buttons; keys write into the request handle
//! and the title bar shows the labels and FPS. The engine owns the window, so
//! the UI only composes the title and the main loop applies it.

use std::cell::RefCell;
use std::rc::Rc;

use teapot_engine::platform::UiLayer;
use teapot_engine::scene::RequestHandle;

#[derive(Debug, Default)]
struct TitleState {
    material: String,
    stage: String,
    fps: Option<f32>,
    paused: bool,
    dirty: bool,
}

/// UI layer rendering into the window title
#[derive(Debug, Clone)]
pub struct TitleUi {
    base: String,
    state: Rc<RefCell<TitleState>>,
}

impl TitleUi {
    /// A title UI whose text starts with `base`
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            state: Rc::default(),
        }
    }

    /// The new title, if anything changed since the last call
    pub fn take_title(&self) -> Option<String> {
        let mut state = self.state.borrow_mut();
        if !std::mem::take(&mut state.dirty) {
            return None;
        }

        let mut title = format!("{} - {} / {}", self.base, state.material, state.stage);
        if let Some(fps) = state.fps {
            title.push_str(&format!(" - {fps:.1} FPS"));
        }
        if state.paused {
            title.push_str(" (paused)");
        }
        Some(title)
    }

    fn edit(&self, apply: impl FnOnce(&mut TitleState)) {
        let mut state = self.state.borrow_mut();
        apply(&mut state);
        state.dirty = true;
    }
}

impl UiLayer for TitleUi {
    fn build(&mut self, material_label: &str, stage_label: &str, _requests: RequestHandle) {
        log::info!("Keys: M material, S stage, Up/Down roughness, R reload, L trim memory, Esc quit");
        self.edit(|s| {
            s.material = material_label.to_string();
            s.stage = stage_label.to_string();
        });
    }

    fn update_fps(&mut self, fps: f32) {
        self.edit(|s| s.fps = Some(fps));
    }

    fn set_material_label(&mut self, label: &str) {
        self.edit(|s| s.material = label.to_string());
    }

    fn set_stage_label(&mut self, label: &str) {
        self.edit(|s| s.stage = label.to_string());
    }

    fn suspend(&mut self) {
        self.edit(|s| s.paused = true);
    }

    fn resume(&mut self) {
        self.edit(|s| s.paused = false);
    }
}
