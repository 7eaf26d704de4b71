//! Simple rain: single quads that swell, slide a little and fade

use crate::behaviour::RainSettings;
use crate::frame::FrameContext;
use crate::motion::{apply_wind, gravity_on_screen};
use crate::rand::RainRng;
use crate::scheduler::DropStyle;
use crate::slot::DrawerSlot;
use crate::variables::{SimpleRainVariables, SpawnVariables};
use drizzle_core::{Result, Vec3};
use drizzle_render::DrawerKind;

/// Upper bound of the random roll added per spawn, in degrees
const MAX_SPAWN_ROLL: f32 = 179.9;

impl RainSettings for SimpleRainVariables {
    fn style_name(&self) -> &'static str {
        "simple"
    }

    fn repair(&mut self) {
        SimpleRainVariables::repair(self);
    }

    fn auto_start(&self) -> bool {
        self.spawn.auto_start
    }

    fn max_draw_call(&self) -> usize {
        self.spawn.max_rain_spawn_count
    }
}

impl DropStyle for SimpleRainVariables {
    const DRAWER_KIND: DrawerKind = DrawerKind::Quad;
    const LABEL: &'static str = "Simple RainDrawer";

    fn spawn_variables(&self) -> &SpawnVariables {
        &self.spawn
    }

    fn init_slot(&self, slot: &mut DrawerSlot, _frame: &FrameContext<'_>, rng: &mut RainRng) {
        slot.start_size = Vec3::new(
            rng.range(self.size_min_x, self.size_max_x),
            rng.range(self.size_min_y, self.size_max_y),
            1.0,
        );
        // Roll accumulates across respawns of the same slot
        if self.auto_rotate {
            slot.roll_degrees += rng.range(0.0, MAX_SPAWN_ROLL);
        }
    }

    fn update_slot(
        &self,
        slot: &mut DrawerSlot,
        index: usize,
        frame: &FrameContext<'_>,
        _now: f32,
        _rng: &mut RainRng,
    ) -> Result<()> {
        let params = &frame.params;
        let progress = slot.progress();

        slot.local.scale = slot.start_size * self.size_over_lifetime.evaluate(progress);

        let g = gravity_on_screen(params.gravity, &frame.camera.transform).normalize_or_zero();
        let slide = Vec3::new(-g.x, -g.y, 0.0) * (0.01 * self.pos_y_over_lifetime.evaluate(progress));
        let mut position = apply_wind(slot.local.position + slide, progress, params.global_wind);
        position.z = 0.0;
        slot.local.position = position;

        let material = self.shading.material_at(
            progress,
            params.alpha,
            params.shader,
            params.render_queue + index as i32,
        );
        slot.present_quad(&material);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviour::RainController;
    use crate::curves::RainCurve;
    use crate::frame::FrameParams;
    use crate::scheduler::SpawnScheduler;
    use drizzle_core::Transform;
    use drizzle_render::{HeadlessBackend, RainCamera, TextureHandle};

    fn variables() -> SimpleRainVariables {
        let mut v = SimpleRainVariables::default();
        v.spawn.max_rain_spawn_count = 2;
        v.spawn.duration = 1.0;
        v.spawn.emission_rate_min = 1000;
        v.spawn.emission_rate_max = 1000;
        v.spawn.lifetime_min = 2.0;
        v.spawn.lifetime_max = 2.0;
        v.shading.normal_map = Some(TextureHandle::new("drop_normal"));
        v
    }

    fn run(v: &SimpleRainVariables, ticks: usize) -> (SpawnScheduler<SimpleRainVariables>, HeadlessBackend) {
        let camera = RainCamera::default();
        let mut backend = HeadlessBackend::new();
        let mut scheduler = SpawnScheduler::with_seed(v, &mut backend, 44);
        scheduler.play(v);
        for _ in 0..ticks {
            let frame = FrameContext::new(
                FrameParams::default(),
                &camera,
                Transform::from_position(Vec3::Z * 8.3),
                0.1,
            );
            scheduler.update_controller(v, &frame, &mut backend).unwrap();
        }
        (scheduler, backend)
    }

    #[test]
    fn quads_scale_with_size_curve() {
        let mut v = variables();
        v.size_over_lifetime = RainCurve::constant(2.0);
        let (scheduler, backend) = run(&v, 3);
        for slot in scheduler.slots() {
            assert!(slot.start_size.x >= v.size_min_x && slot.start_size.x < v.size_max_x);
            assert!((slot.local.scale - slot.start_size * 2.0).length() < 1e-5);
        }
        assert_eq!(backend.visible_count(), 2);
        assert!(backend.records().iter().all(|r| r.placement.is_some()));
    }

    #[test]
    fn slide_runs_against_gravity() {
        let mut v = variables();
        v.pos_y_over_lifetime = RainCurve::constant(10.0);
        let (scheduler, _) = run(&v, 5);
        for slot in scheduler.slots() {
            // Offset is -gravity: 0.1 per tick up the screen
            assert!((slot.local.position.y - (slot.start_position.y + 0.5)).abs() < 1e-4);
            assert_eq!(slot.local.position.z, 0.0);
        }
    }

    #[test]
    fn roll_only_with_auto_rotate() {
        let mut v = variables();
        v.auto_rotate = false;
        let (scheduler, _) = run(&v, 2);
        assert!(scheduler.slots().iter().all(|s| s.roll_degrees == 0.0));

        v.auto_rotate = true;
        let (scheduler, _) = run(&v, 2);
        assert!(scheduler.slots().iter().any(|s| s.roll_degrees > 0.0));
    }

    #[test]
    fn missing_normal_map_keeps_quads_hidden() {
        let mut v = variables();
        v.shading.normal_map = None;
        let (scheduler, backend) = run(&v, 3);
        assert!(scheduler.is_playing());
        assert_eq!(backend.visible_count(), 0);
        assert_eq!(scheduler.current_draw_call(), 0);
    }
}
