//! Per-frame inputs handed from the camera rig down to every controller

use drizzle_core::{Transform, Vec2, Vec3};
use drizzle_render::{RainCamera, ShaderType};

/// Rig-wide values a behaviour receives each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub shader: ShaderType,
    pub alpha: f32,
    /// Distance of the rain plane from the camera
    pub distance: f32,
    /// World gravity
    pub gravity: Vec3,
    pub vr_mode: bool,
    /// First render queue this behaviour may use
    pub render_queue: i32,
    pub global_wind: Vec2,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            shader: ShaderType::Expensive,
            alpha: 1.0,
            distance: 8.3,
            gravity: Vec3::NEG_Y,
            vr_mode: false,
            render_queue: 3000,
            global_wind: Vec2::ZERO,
        }
    }
}

/// Everything a controller reads during one tick
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub params: FrameParams,
    pub camera: &'a RainCamera,
    /// World transform of the behaviour; drop poses are local to it
    pub parent: Transform,
    pub dt: f32,
}

impl<'a> FrameContext<'a> {
    pub fn new(params: FrameParams, camera: &'a RainCamera, parent: Transform, dt: f32) -> Self {
        Self {
            params,
            camera,
            parent,
            dt,
        }
    }
}
