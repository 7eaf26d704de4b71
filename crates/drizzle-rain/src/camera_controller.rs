//! Camera rig: composes every rain behaviour under one camera

use crate::behaviour::{
    FlowRainBehaviour, FrictionFlowRainBehaviour, RainBehaviour, SimpleRainBehaviour, StaticRainBehaviour,
};
use crate::frame::FrameParams;
use crate::styles::FrictionFlowStyle;
use crate::variables::{BehaviourConfig, BehaviourStyle, CameraConfig, RainConfig};
use drizzle_core::{Result, Transform, Vec3};
use drizzle_render::{RainCamera, RenderBackend};
use drizzle_runtime::{FrameClock, RuntimeSystem};

/// Orthographic half height the rig resets to each frame
const BASE_ORTHOGRAPHIC_SIZE: f32 = 5.0;

const NEAR_CLIP: f32 = 0.01;

/// Owns the camera, the render backend and the behaviours drawn in front of
/// the camera. Each frame it lays the behaviours out by depth, hands each a
/// render-queue range and ticks it.
pub struct RainCameraController {
    camera: RainCamera,
    config: CameraConfig,
    behaviours: Vec<Box<dyn RainBehaviour>>,
    backend: Box<dyn RenderBackend>,
    clock: FrameClock,
    /// Playing (true) or editing: edit mode keeps behaviours at the camera
    play_mode: bool,
}

impl RainCameraController {
    pub fn new(config: CameraConfig, backend: Box<dyn RenderBackend>) -> Self {
        let camera = RainCamera {
            fov: config.fov,
            aspect: config.aspect,
            ..Default::default()
        };
        Self {
            camera,
            config,
            behaviours: Vec::new(),
            backend,
            clock: FrameClock::new(),
            play_mode: true,
        }
    }

    /// Build the rig described by a parsed config. Behaviours start stopped.
    pub fn from_config(config: &RainConfig, backend: Box<dyn RenderBackend>) -> Result<Self> {
        config.camera.validate()?;
        let mut controller = Self::new(config.camera.clone(), backend);
        for (index, behaviour) in config.behaviours.iter().enumerate() {
            let seed = config
                .camera
                .seed
                .wrapping_add((index as u32).wrapping_mul(0x9E37_79B9));
            controller.add_behaviour(build_behaviour(behaviour, config, seed));
        }
        log::info!(
            "[rain] camera rig with {} behaviour(s)",
            controller.behaviours.len()
        );
        Ok(controller)
    }

    pub fn add_behaviour(&mut self, behaviour: Box<dyn RainBehaviour>) {
        self.behaviours.push(behaviour);
    }

    pub fn camera(&self) -> &RainCamera {
        &self.camera
    }

    /// Move or rotate the camera; projection settings are reset every frame
    pub fn camera_mut(&mut self) -> &mut RainCamera {
        &mut self.camera
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CameraConfig {
        &mut self.config
    }

    pub fn set_play_mode(&mut self, play_mode: bool) {
        self.play_mode = play_mode;
    }

    pub fn behaviours(&self) -> impl Iterator<Item = &dyn RainBehaviour> {
        self.behaviours.iter().map(|b| b.as_ref())
    }

    pub fn behaviour(&self, name: &str) -> Option<&dyn RainBehaviour> {
        self.behaviours().find(|b| b.name() == name)
    }

    pub fn play(&mut self) {
        for b in &mut self.behaviours {
            b.start_rain(self.backend.as_mut());
        }
    }

    pub fn stop(&mut self) {
        for b in &mut self.behaviours {
            b.stop_rain();
        }
    }

    pub fn stop_immediate(&mut self) {
        for b in &mut self.behaviours {
            b.stop_rain_immediate(self.backend.as_mut());
        }
    }

    /// Hard-stop everything, then rebuild stopped controllers
    pub fn refresh(&mut self) {
        self.stop_immediate();
        for b in &mut self.behaviours {
            b.refresh(self.backend.as_mut());
        }
    }

    pub fn play_behaviour(&mut self, name: &str) -> bool {
        match self.behaviours.iter_mut().find(|b| b.name() == name) {
            Some(b) => {
                b.start_rain(self.backend.as_mut());
                true
            }
            None => false,
        }
    }

    pub fn stop_behaviour_immediate(&mut self, name: &str) -> bool {
        match self.behaviours.iter_mut().find(|b| b.name() == name) {
            Some(b) => {
                b.stop_rain_immediate(self.backend.as_mut());
                true
            }
            None => false,
        }
    }

    /// Reset the camera projection, lay out the behaviours and tick them
    pub fn update_frame(&mut self, dt: f32) -> Result<()> {
        let cfg = &self.config;
        self.camera.orthographic = !cfg.vr_mode;
        self.camera.orthographic_size = BASE_ORTHOGRAPHIC_SIZE;
        self.camera.near = NEAR_CLIP;
        self.camera.far = cfg.distance + NEAR_CLIP;
        self.camera.fov = cfg.fov;
        self.camera.aspect = cfg.aspect;

        let offset = if self.play_mode {
            if !self.behaviours.is_empty() {
                self.camera.orthographic_size = self.camera.frustum_height_at(cfg.distance) * 0.5;
            }
            Vec3::Z * cfg.distance
        } else {
            Vec3::ZERO
        };
        let parent = self.camera.transform.mul_transform(&Transform::from_position(offset));

        self.behaviours.sort_by_key(|b| b.depth());

        let mut queue_offset = 0i32;
        for b in &mut self.behaviours {
            b.apply_final_depth(cfg.render_queue + queue_offset);
            b.apply_global_wind(cfg.global_wind);
            let params = FrameParams {
                shader: cfg.shader,
                alpha: cfg.alpha,
                distance: cfg.distance,
                gravity: cfg.gravity,
                vr_mode: cfg.vr_mode,
                render_queue: cfg.render_queue + queue_offset,
                global_wind: cfg.global_wind,
            };
            queue_offset += b.max_draw_call() as i32;
            b.update(dt, Some(&self.camera), parent, params, self.backend.as_mut())?;
        }
        Ok(())
    }

    pub fn current_draw_call(&self) -> usize {
        self.behaviours.iter().map(|b| b.current_draw_call()).sum()
    }

    pub fn max_draw_call(&self) -> usize {
        self.behaviours.iter().map(|b| b.max_draw_call()).sum()
    }

    pub fn is_playing(&self) -> bool {
        self.behaviours.iter().any(|b| b.is_playing())
    }

    pub fn frame_count(&self) -> u64 {
        self.clock.frame_count
    }
}

impl RuntimeSystem for RainCameraController {
    fn initialize(&mut self) -> Result<()> {
        self.stop_immediate();
        for b in &mut self.behaviours {
            if b.auto_start() {
                b.start_rain(self.backend.as_mut());
            }
        }
        Ok(())
    }

    fn update(&mut self, dt: f64) -> Result<()> {
        let dt = self.clock.advance(dt);
        self.update_frame(dt as f32)
    }

    fn shutdown(&mut self) -> Result<()> {
        self.stop_immediate();
        log::info!("[rain] camera rig shut down");
        Ok(())
    }

    fn name(&self) -> &str {
        "rain_camera"
    }
}

/// Instantiate the behaviour a config table describes
pub fn build_behaviour(config: &BehaviourConfig, rig: &RainConfig, seed: u32) -> Box<dyn RainBehaviour> {
    let name = config.name.clone();
    let depth = config.depth;
    match &config.style {
        BehaviourStyle::Flow(v) => Box::new(FlowRainBehaviour::new(name, depth, v.clone(), seed)),
        BehaviourStyle::FrictionFlow(v) => {
            let style = FrictionFlowStyle::load(v.clone(), rig);
            Box::new(FrictionFlowRainBehaviour::new(name, depth, style, seed))
        }
        BehaviourStyle::Simple(v) => Box::new(SimpleRainBehaviour::new(name, depth, v.clone(), seed)),
        BehaviourStyle::Static(v) => Box::new(StaticRainBehaviour::new(name, depth, v.clone(), seed)),
    }
}
