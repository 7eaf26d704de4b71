//! Behaviour facade: the control surface of one rain style.
//!
//! A [`Behaviour`] owns the style's settings and, while rain is active, one
//! controller built from them. [`RainBehaviour`] erases the style so the
//! camera rig can hold a mixed list.

use crate::frame::{FrameContext, FrameParams};
use crate::scheduler::SpawnScheduler;
use crate::static_rain::StaticRainController;
use crate::styles::FrictionFlowStyle;
use crate::variables::{FlowRainVariables, SimpleRainVariables};
use drizzle_core::{DrizzleError, Result, Transform, Vec2, TOLERANCE};
use drizzle_render::{RainCamera, RenderBackend};

/// Settings of one style, live-editable between frames
pub trait RainSettings {
    fn style_name(&self) -> &'static str;

    /// Put inverted min/max pairs back in order
    fn repair(&mut self);

    fn auto_start(&self) -> bool;

    /// Drawers this style may use at once
    fn max_draw_call(&self) -> usize;
}

/// The per-style controller a [`Behaviour`] creates and destroys
pub trait RainController: Sized {
    type Settings: RainSettings;

    /// Whether a hard stop leaves a fresh, stopped controller behind
    const RECREATE_ON_HARD_STOP: bool = false;

    fn create(settings: &Self::Settings, backend: &mut dyn RenderBackend, seed: u32) -> Self;

    fn play(&mut self, settings: &Self::Settings);

    fn set_no_more_rain(&mut self, stop: bool);

    fn update_controller(
        &mut self,
        settings: &Self::Settings,
        frame: &FrameContext<'_>,
        backend: &mut dyn RenderBackend,
    ) -> Result<()>;

    fn hide_all(&mut self);

    fn is_playing(&self) -> bool;

    fn current_draw_call(&self) -> usize;
}

/// Style-independent control surface used by the camera rig
pub trait RainBehaviour {
    fn name(&self) -> &str;

    fn depth(&self) -> i32;

    fn style_name(&self) -> &'static str;

    /// Throw away the controller and build a stopped one
    fn refresh(&mut self, backend: &mut dyn RenderBackend);

    fn start_rain(&mut self, backend: &mut dyn RenderBackend);

    /// Stop spawning; drops in flight finish their lifetime
    fn stop_rain(&mut self);

    /// Release every drawer now
    fn stop_rain_immediate(&mut self, backend: &mut dyn RenderBackend);

    fn apply_final_depth(&mut self, render_queue: i32);

    fn apply_global_wind(&mut self, wind: Vec2);

    /// First render queue assigned by the rig
    fn render_queue(&self) -> i32;

    fn global_wind(&self) -> Vec2;

    /// Tick the controller. A missing camera hides everything.
    fn update(
        &mut self,
        dt: f32,
        camera: Option<&RainCamera>,
        parent: Transform,
        params: FrameParams,
        backend: &mut dyn RenderBackend,
    ) -> Result<()>;

    fn is_playing(&self) -> bool;

    /// Visible rain: non-zero alpha and at least one drawer shown
    fn is_enabled(&self) -> bool;

    fn current_draw_call(&self) -> usize;

    fn max_draw_call(&self) -> usize;

    fn auto_start(&self) -> bool;
}

pub struct Behaviour<C: RainController> {
    name: String,
    depth: i32,
    settings: C::Settings,
    controller: Option<C>,
    render_queue: i32,
    global_wind: Vec2,
    alpha: f32,
    seed: u32,
    generation: u32,
    camera_warned: bool,
}

pub type FlowRainBehaviour = Behaviour<SpawnScheduler<FlowRainVariables>>;
pub type FrictionFlowRainBehaviour = Behaviour<SpawnScheduler<FrictionFlowStyle>>;
pub type SimpleRainBehaviour = Behaviour<SpawnScheduler<SimpleRainVariables>>;
pub type StaticRainBehaviour = Behaviour<StaticRainController>;

impl<C: RainController> Behaviour<C> {
    pub fn new(name: impl Into<String>, depth: i32, settings: C::Settings, seed: u32) -> Self {
        Self {
            name: name.into(),
            depth,
            settings,
            controller: None,
            render_queue: 3000,
            global_wind: Vec2::ZERO,
            alpha: 0.0,
            seed,
            generation: 0,
            camera_warned: false,
        }
    }

    pub fn settings(&self) -> &C::Settings {
        &self.settings
    }

    /// Live edit; inverted ranges are repaired on the next update
    pub fn settings_mut(&mut self) -> &mut C::Settings {
        &mut self.settings
    }

    pub fn controller(&self) -> Option<&C> {
        self.controller.as_ref()
    }

    fn create_controller(&mut self, backend: &mut dyn RenderBackend) -> C {
        let seed = self.seed.wrapping_add(self.generation.wrapping_mul(0x9E37_79B9));
        self.generation = self.generation.wrapping_add(1);
        C::create(&self.settings, backend, seed)
    }
}

impl<C: RainController> RainBehaviour for Behaviour<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn depth(&self) -> i32 {
        self.depth
    }

    fn style_name(&self) -> &'static str {
        self.settings.style_name()
    }

    fn refresh(&mut self, backend: &mut dyn RenderBackend) {
        self.controller = None;
        let mut controller = self.create_controller(backend);
        controller.set_no_more_rain(true);
        self.controller = Some(controller);
        log::debug!("[rain] {}: refreshed", self.name);
    }

    fn start_rain(&mut self, backend: &mut dyn RenderBackend) {
        if self.controller.is_none() {
            let controller = self.create_controller(backend);
            self.controller = Some(controller);
        }
        if let Some(controller) = self.controller.as_mut() {
            controller.set_no_more_rain(false);
            controller.play(&self.settings);
        }
        log::info!("[rain] {}: start", self.name);
    }

    fn stop_rain(&mut self) {
        if let Some(controller) = self.controller.as_mut() {
            controller.set_no_more_rain(true);
            log::info!("[rain] {}: stop", self.name);
        }
    }

    fn stop_rain_immediate(&mut self, backend: &mut dyn RenderBackend) {
        if self.controller.take().is_none() {
            return;
        }
        log::info!("[rain] {}: stop immediate", self.name);
        if C::RECREATE_ON_HARD_STOP {
            self.refresh(backend);
        }
    }

    fn apply_final_depth(&mut self, render_queue: i32) {
        self.render_queue = render_queue;
    }

    fn apply_global_wind(&mut self, wind: Vec2) {
        self.global_wind = wind;
    }

    fn render_queue(&self) -> i32 {
        self.render_queue
    }

    fn global_wind(&self) -> Vec2 {
        self.global_wind
    }

    fn update(
        &mut self,
        dt: f32,
        camera: Option<&RainCamera>,
        parent: Transform,
        mut params: FrameParams,
        backend: &mut dyn RenderBackend,
    ) -> Result<()> {
        self.settings.repair();
        self.alpha = params.alpha;

        let Some(controller) = self.controller.as_mut() else {
            return Ok(());
        };
        let Some(camera) = camera else {
            if !self.camera_warned {
                log::error!("[rain] {}, rain hidden", DrizzleError::CameraMissing(self.name.clone()));
                self.camera_warned = true;
            }
            controller.hide_all();
            return Ok(());
        };
        self.camera_warned = false;

        params.render_queue = self.render_queue;
        params.global_wind = self.global_wind;
        let frame = FrameContext::new(params, camera, parent, dt);
        controller.update_controller(&self.settings, &frame, backend)
    }

    fn is_playing(&self) -> bool {
        self.controller.as_ref().is_some_and(C::is_playing)
    }

    fn is_enabled(&self) -> bool {
        self.alpha.abs() > TOLERANCE && self.current_draw_call() != 0
    }

    fn current_draw_call(&self) -> usize {
        self.controller.as_ref().map_or(0, C::current_draw_call)
    }

    fn max_draw_call(&self) -> usize {
        self.settings.max_draw_call()
    }

    fn auto_start(&self) -> bool {
        self.settings.auto_start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drizzle_core::Vec3;
    use drizzle_render::{HeadlessBackend, TextureHandle};

    fn simple(max: usize) -> SimpleRainBehaviour {
        let mut v = SimpleRainVariables::default();
        v.spawn.max_rain_spawn_count = max;
        v.spawn.duration = 1.0;
        v.spawn.emission_rate_min = 1000;
        v.spawn.emission_rate_max = 1000;
        v.spawn.lifetime_min = 2.0;
        v.spawn.lifetime_max = 2.0;
        v.shading.normal_map = Some(TextureHandle::new("drop_normal"));
        Behaviour::new("drops", 0, v, 17)
    }

    fn tick(b: &mut dyn RainBehaviour, camera: Option<&RainCamera>, backend: &mut HeadlessBackend) {
        b.update(
            0.1,
            camera,
            Transform::from_position(Vec3::Z * 8.3),
            FrameParams::default(),
            backend,
        )
        .unwrap();
    }

    #[test]
    fn start_creates_controller_and_spawns() {
        let camera = RainCamera::default();
        let mut backend = HeadlessBackend::new();
        let mut b = simple(4);
        assert!(b.controller().is_none());
        assert_eq!(b.max_draw_call(), 4);

        b.start_rain(&mut backend);
        tick(&mut b, Some(&camera), &mut backend);
        assert!(b.is_playing());
        assert!(b.is_enabled());
        assert_eq!(b.current_draw_call(), 4);
    }

    #[test]
    fn refresh_leaves_stopped_controller() {
        let camera = RainCamera::default();
        let mut backend = HeadlessBackend::new();
        let mut b = simple(4);
        b.refresh(&mut backend);
        assert!(b.controller().is_some());
        tick(&mut b, Some(&camera), &mut backend);
        assert!(!b.is_playing());
        assert_eq!(backend.live_count(), 4);
    }

    #[test]
    fn hard_stop_releases_everything() {
        let camera = RainCamera::default();
        let mut backend = HeadlessBackend::new();
        let mut b = simple(4);
        b.start_rain(&mut backend);
        tick(&mut b, Some(&camera), &mut backend);
        assert_eq!(backend.live_count(), 4);

        b.stop_rain_immediate(&mut backend);
        assert!(b.controller().is_none());
        assert!(!b.is_playing());
        assert_eq!(b.current_draw_call(), 0);
        assert_eq!(backend.live_count(), 0);

        // Stopping twice is harmless
        b.stop_rain_immediate(&mut backend);
        tick(&mut b, Some(&camera), &mut backend);
    }

    #[test]
    fn missing_camera_hides_drawers() {
        let camera = RainCamera::default();
        let mut backend = HeadlessBackend::new();
        let mut b = simple(3);
        b.start_rain(&mut backend);
        tick(&mut b, Some(&camera), &mut backend);
        assert_eq!(backend.visible_count(), 3);

        tick(&mut b, None, &mut backend);
        assert_eq!(backend.visible_count(), 0);
        assert!(!b.is_enabled());
    }

    #[test]
    fn live_edit_is_repaired_before_use() {
        let camera = RainCamera::default();
        let mut backend = HeadlessBackend::new();
        let mut b = simple(3);
        b.settings_mut().spawn.lifetime_min = 3.0;
        b.settings_mut().spawn.lifetime_max = 1.0;
        b.start_rain(&mut backend);
        tick(&mut b, Some(&camera), &mut backend);
        assert_eq!(b.settings().spawn.lifetime_min, 1.0);
        assert_eq!(b.settings().spawn.lifetime_max, 3.0);
    }

    #[test]
    fn depth_and_wind_are_kept_without_controller() {
        let mut b = simple(1);
        b.apply_final_depth(3010);
        b.apply_global_wind(Vec2::new(0.5, 0.0));
        assert_eq!(b.render_queue(), 3010);
        assert_eq!(b.global_wind(), Vec2::new(0.5, 0.0));
    }

    #[test]
    fn zero_alpha_is_not_enabled() {
        let camera = RainCamera::default();
        let mut backend = HeadlessBackend::new();
        let mut b = simple(2);
        b.start_rain(&mut backend);
        let params = FrameParams {
            alpha: 0.0,
            ..Default::default()
        };
        b.update(0.1, Some(&camera), Transform::IDENTITY, params, &mut backend)
            .unwrap();
        assert!(b.is_playing());
        assert!(!b.is_enabled());
    }
}
