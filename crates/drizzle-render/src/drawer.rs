//! Render-resource collaborator: one drawer per drop instance

use crate::mesh::{Mesh, QuadPlacement};
use crate::shader::ShaderType;
use drizzle_core::{Color, TOLERANCE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a texture asset owned by the host
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureHandle(pub String);

impl TextureHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextureHandle({})", self.0)
    }
}

/// Shader inputs for one drawer, recomputed every tick
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialParams {
    pub shader: ShaderType,
    pub render_queue: i32,
    pub normal_map: Option<TextureHandle>,
    pub overlay_texture: Option<TextureHandle>,
    pub overlay_color: Color,
    pub distortion: f32,
    pub relief: f32,
    pub blur: f32,
    pub bloom_texture: Option<TextureHandle>,
    pub bloom: f32,
    pub darkness: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            shader: ShaderType::Expensive,
            render_queue: 3000,
            normal_map: None,
            overlay_texture: None,
            overlay_color: Color::WHITE,
            distortion: 0.0,
            relief: 0.0,
            blur: 0.0,
            bloom_texture: None,
            bloom: 0.0,
            darkness: 0.0,
        }
    }
}

impl MaterialParams {
    /// True when the active variant would draw nothing visible, so the
    /// drawer can be hidden without touching render resources.
    pub fn is_invisible(&self) -> bool {
        match self.shader {
            ShaderType::Expensive => {
                (self.distortion + self.relief + self.overlay_color.a + self.blur) / 4.0 < TOLERANCE
            }
            ShaderType::Cheap => self.distortion.abs() < TOLERANCE,
            ShaderType::NoDistortion => {
                self.relief.abs() < TOLERANCE && self.overlay_color.a.abs() < TOLERANCE
            }
        }
    }

    /// Whether the blur shader keyword should be on
    pub fn blur_enabled(&self) -> bool {
        self.shader == ShaderType::Expensive && self.blur.abs() > TOLERANCE
    }
}

/// What shape of geometry a drawer renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawerKind {
    /// Ribbon mesh rebuilt from a path trail
    Trail,
    /// Single quad placed by a transform
    Quad,
}

/// Geometry handed to a drawer for the current frame
#[derive(Debug, Clone, Copy)]
pub enum DrawerGeometry<'a> {
    Ribbon(&'a Mesh),
    Quad(QuadPlacement),
}

/// One render-facing drop resource. Dropping the box releases it.
pub trait RainDrawer {
    /// Bind shader parameters
    fn apply(&mut self, params: &MaterialParams);

    /// Replace the drawn geometry
    fn set_geometry(&mut self, geometry: DrawerGeometry<'_>);

    fn show(&mut self);

    fn hide(&mut self);

    fn is_enabled(&self) -> bool;
}

/// Factory for drawers, owned by the host
pub trait RenderBackend {
    fn create_drawer(&mut self, kind: DrawerKind, label: &str) -> Box<dyn RainDrawer>;
}
