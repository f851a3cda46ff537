//! Scene coordination
//!
//! The [`Engine`] drives the surface lifecycle and the per-frame
//! update/render cycle over the teapot and skybox. Stage and material tables,
//! their cyclic selectors, and the request block UI callbacks write into live
//! here as well.

pub mod engine;
pub mod requests;
pub mod selector;
pub mod stage;

#[cfg(test)]
mod tests;

pub use engine::{DisplayState, Engine, EngineError, FrameOutcome};
pub use requests::{FrameRequests, PendingRoughness, PendingSelection, RequestHandle};
pub use selector::CyclicSelector;
pub use stage::{Stage, StageLibrary};
