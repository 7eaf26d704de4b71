//! Drizzle Render - collaborators consumed by the simulation core
//!
//! The core never touches GPU state directly. It talks to:
//! - `RainDrawer` / `RenderBackend` : one opaque render resource per drop
//! - `MaterialParams` / `ShaderType` : the per-instance shader inputs
//! - `Mesh` : ribbon and quad geometry streams
//! - `RainCamera` : orthographic/perspective viewport queries
//! - `FrictionMap` : grayscale pixel lookups for lateral drag
//!
//! `headless` provides a recording backend for hosts without a GPU and for tests.

pub mod camera;
pub mod drawer;
pub mod friction_map;
pub mod headless;
pub mod mesh;
pub mod shader;

pub use camera::RainCamera;
pub use drawer::{DrawerGeometry, DrawerKind, MaterialParams, RainDrawer, RenderBackend, TextureHandle};
pub use friction_map::FrictionMap;
pub use headless::{DrawerRecord, HeadlessBackend};
pub use mesh::{Mesh, QuadPlacement, TextureMode, TrailVertex};
pub use shader::ShaderType;
