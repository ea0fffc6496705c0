//! SkyInk Core Library
//!
//! Platform-agnostic scene model, editing, undo and animation for the SkyInk
//! sky editor. Rendering lives in `skyink-render`.

pub mod camera;
pub mod canvas;
pub mod codec;
pub mod color;
pub mod config;
pub mod editor;
pub mod gesture;
pub mod history;
pub mod orbit;
pub mod raster;
pub mod scene;
pub mod starfield;
pub mod storage;
pub mod strokes;

pub use camera::Camera;
pub use canvas::Canvas;
pub use codec::{CodecError, CodecResult, SceneDocument};
pub use color::Argb;
pub use config::{ConfigError, EditorConfig, ToolMode, ToolSettings};
pub use editor::SceneEditor;
pub use gesture::{DragTarget, GestureRouter, PointerEvent, PointerId};
pub use history::{Edit, History, UndoEntry};
pub use orbit::{OrbitIntegrator, OrbitState, PositionAnimator};
pub use raster::DustRaster;
pub use scene::{BodyKind, Link, Planet, Scene};
pub use starfield::Starfield;
pub use storage::{Storage, StorageError, StorageResult};
pub use strokes::{Stroke, StrokeLayer};
