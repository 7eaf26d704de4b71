//! Static rain: one overlay quad that fades in while raining and out after

use crate::behaviour::{RainController, RainSettings};
use crate::frame::FrameContext;
use crate::slot::{DrawState, DrawerSlot};
use crate::variables::StaticRainVariables;
use drizzle_core::{Quat, Result, Transform, Vec3, TOLERANCE};
use drizzle_render::{DrawerKind, MaterialParams, RenderBackend};

const LABEL: &str = "Static RainDrawer";

/// Extra scale that hides the quad's edges in stereo rendering
const VR_MARGIN: f32 = 0.02;

impl RainSettings for StaticRainVariables {
    fn style_name(&self) -> &'static str {
        "static"
    }

    /// No ranges to keep in order
    fn repair(&mut self) {}

    fn auto_start(&self) -> bool {
        self.auto_start
    }

    fn max_draw_call(&self) -> usize {
        1
    }
}

/// Drives the single overlay drawer. `elapsed` on the slot is the fade
/// clock, clamped to `[0, fade_time]`.
pub struct StaticRainController {
    slot: DrawerSlot,
    no_more_rain: bool,
}

impl StaticRainController {
    pub fn slot(&self) -> &DrawerSlot {
        &self.slot
    }

    /// Fade position in `[0, 1]`
    pub fn fade(&self, settings: &StaticRainVariables) -> f32 {
        if settings.fade_time <= 0.0 {
            1.0
        } else {
            self.slot.elapsed / settings.fade_time
        }
    }

    fn place(&mut self, settings: &StaticRainVariables, frame: &FrameContext<'_>) {
        if settings.full_screen {
            let (w, h) = frame.camera.orthographic_extent();
            let mut scale = Vec3::new(w / 2.0, h / 2.0, 0.0);
            if frame.params.vr_mode {
                scale += Vec3::splat(VR_MARGIN);
            }
            self.slot.local = Transform {
                position: Vec3::ZERO,
                rotation: Quat::IDENTITY,
                scale,
            };
        } else {
            let anchor = Vec3::new(0.5 - settings.spawn_offset_x, 0.5 - settings.spawn_offset_y, 0.0);
            let world = frame.camera.viewport_to_world(anchor);
            let mut position = frame.parent.inverse_transform_point(world);
            position.z = 0.0;
            self.slot.local = Transform {
                position,
                rotation: Quat::IDENTITY,
                scale: Vec3::new(settings.size_x, settings.size_y, 1.0),
            };
        }
    }

    fn material(&self, settings: &StaticRainVariables, frame: &FrameContext<'_>) -> MaterialParams {
        let alpha = frame.params.alpha;
        let fade = settings.fadein_curve.evaluate(self.fade(settings));
        MaterialParams {
            shader: frame.params.shader,
            render_queue: frame.params.render_queue,
            normal_map: settings.normal_map.clone(),
            overlay_texture: settings.overlay_texture.clone(),
            overlay_color: settings
                .overlay_color
                .with_alpha(settings.overlay_color.a * fade * alpha),
            distortion: settings.distortion_value * fade * alpha,
            relief: settings.relief_value * fade * alpha,
            blur: settings.blur * fade * alpha,
            bloom_texture: settings.bloom_texture.clone(),
            bloom: settings.bloom * fade * alpha,
            darkness: settings.darkness,
        }
    }
}

impl RainController for StaticRainController {
    type Settings = StaticRainVariables;

    const RECREATE_ON_HARD_STOP: bool = true;

    fn create(_settings: &StaticRainVariables, backend: &mut dyn RenderBackend, _seed: u32) -> Self {
        let drawer = backend.create_drawer(DrawerKind::Quad, LABEL);
        let mut slot = DrawerSlot::new(drawer, None, LABEL);
        slot.reset();
        Self {
            slot,
            no_more_rain: false,
        }
    }

    fn play(&mut self, _settings: &StaticRainVariables) {
        if self.slot.is_playing() {
            return;
        }
        self.slot.elapsed = 0.0;
        self.slot.hide();
    }

    fn set_no_more_rain(&mut self, stop: bool) {
        self.no_more_rain = stop;
    }

    fn update_controller(
        &mut self,
        settings: &StaticRainVariables,
        frame: &FrameContext<'_>,
        _backend: &mut dyn RenderBackend,
    ) -> Result<()> {
        let elapsed = self.slot.elapsed;
        self.slot.elapsed = if self.no_more_rain {
            (elapsed - frame.dt).max(0.0)
        } else {
            (elapsed + frame.dt).min(settings.fade_time)
        };

        if self.slot.elapsed.abs() < TOLERANCE {
            self.slot.hide();
            self.slot.state = DrawState::Disabled;
            return Ok(());
        }
        self.slot.state = DrawState::Playing;

        self.place(settings, frame);
        let material = self.material(settings, frame);
        self.slot.present_quad(&material);
        Ok(())
    }

    fn hide_all(&mut self) {
        self.slot.hide();
    }

    fn is_playing(&self) -> bool {
        self.slot.is_playing()
    }

    fn current_draw_call(&self) -> usize {
        usize::from(self.slot.is_enabled())
    }
}
