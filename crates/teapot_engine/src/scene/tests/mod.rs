//! Engine scenarios against the headless context
//!
//! Fixtures: a loader that records every face request (failing on the
//! `none` pattern), and a UI layer that records what it was shown.

mod lifecycle;

use std::cell::RefCell;
use std::rc::Rc;

use crate::assets::{AssetError, CubemapLoader, FaceLoadFlags, ImageData};
use crate::core::ApplicationConfig;
use crate::gpu::{CubeFace, GpuDevice, TextureId};
use crate::platform::{HeadlessContext, HeadlessSurface, UiLayer};
use crate::scene::{Engine, RequestHandle, StageLibrary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct FaceRequest {
    pub name: String,
    pub face: CubeFace,
    pub level: u32,
}

#[derive(Clone, Default)]
pub(super) struct RecordingLoader {
    pub requests: Rc<RefCell<Vec<FaceRequest>>>,
}

impl CubemapLoader for RecordingLoader {
    fn load_cubemap_face(
        &mut self,
        device: &mut dyn GpuDevice,
        texture: TextureId,
        resource_name: &str,
        face: CubeFace,
        mip_level: u32,
        flags: FaceLoadFlags,
    ) -> Result<(), AssetError> {
        self.requests.borrow_mut().push(FaceRequest {
            name: resource_name.to_string(),
            face,
            level: mip_level,
        });
        if resource_name == "none" {
            return Err(AssetError::NotFound(resource_name.to_string()));
        }
        let size = 128 >> mip_level.min(7);
        let image = ImageData::solid_color(size, size, [128, 128, 128, 255]);
        device
            .upload_cubemap_face(texture, face, mip_level, &image, flags.contains(FaceLoadFlags::SRGB))
            .map_err(|e| AssetError::LoadFailed(e.to_string()))
    }
}

#[derive(Debug, Default)]
pub(super) struct UiLog {
    pub built: Option<(String, String)>,
    pub fps: Vec<f32>,
    pub material_labels: Vec<String>,
    pub stage_labels: Vec<String>,
    pub suspended: u32,
    pub resumed: u32,
}

#[derive(Clone, Default)]
pub(super) struct RecordingUi {
    pub log: Rc<RefCell<UiLog>>,
}

impl UiLayer for RecordingUi {
    fn build(&mut self, material_label: &str, stage_label: &str, _requests: RequestHandle) {
        self.log.borrow_mut().built = Some((material_label.to_string(), stage_label.to_string()));
    }

    fn update_fps(&mut self, fps: f32) {
        self.log.borrow_mut().fps.push(fps);
    }

    fn set_material_label(&mut self, label: &str) {
        self.log.borrow_mut().material_labels.push(label.to_string());
    }

    fn set_stage_label(&mut self, label: &str) {
        self.log.borrow_mut().stage_labels.push(label.to_string());
    }

    fn suspend(&mut self) {
        self.log.borrow_mut().suspended += 1;
    }

    fn resume(&mut self) {
        self.log.borrow_mut().resumed += 1;
    }
}

pub(super) struct Harness {
    pub engine: Engine<HeadlessContext>,
    pub loader: RecordingLoader,
    pub ui: RecordingUi,
}

impl Harness {
    pub fn new() -> Self {
        let loader = RecordingLoader::default();
        let ui = RecordingUi::default();
        let engine = Engine::new(ApplicationConfig::default(), HeadlessContext::new(), Box::new(loader.clone()))
            .expect("default config is valid")
            .with_ui(Box::new(ui.clone()));
        Self { engine, loader, ui }
    }

    pub fn with_stages(stages: StageLibrary) -> Self {
        let Self { engine, loader, ui } = Self::new();
        Self {
            engine: engine.with_stages(stages),
            loader,
            ui,
        }
    }

    /// Surface up at `width` x `height` with focus held
    pub fn started(width: i32, height: i32) -> Self {
        let mut harness = Self::new();
        harness.start(width, height);
        harness
    }

    pub fn start(&mut self, width: i32, height: i32) {
        self.engine
            .on_surface_available(HeadlessSurface::new(width, height))
            .expect("first surface");
        self.engine.on_focus_gained();
    }

    pub fn face_requests(&self) -> Vec<FaceRequest> {
        self.loader.requests.borrow().clone()
    }

    pub fn clear_face_requests(&self) {
        self.loader.requests.borrow_mut().clear();
    }
}
