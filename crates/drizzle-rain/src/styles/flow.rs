//! Flow rain: trails falling along projected gravity with a sideways wobble

use super::configure_trail;
use crate::behaviour::RainSettings;
use crate::frame::FrameContext;
use crate::motion::{apply_wind, flow_height, gravity_on_screen, slerp_vec3, trail_vertex_distance};
use crate::rand::RainRng;
use crate::scheduler::DropStyle;
use crate::slot::DrawerSlot;
use crate::variables::{FlowRainVariables, SpawnVariables};
use drizzle_core::{Result, Vec3};
use drizzle_render::DrawerKind;

/// Flow trails sit just off the behaviour plane
const FLOW_DEPTH: f32 = 0.001;

impl RainSettings for FlowRainVariables {
    fn style_name(&self) -> &'static str {
        "flow"
    }

    fn repair(&mut self) {
        FlowRainVariables::repair(self);
    }

    fn auto_start(&self) -> bool {
        self.spawn.auto_start
    }

    fn max_draw_call(&self) -> usize {
        self.spawn.max_rain_spawn_count
    }
}

impl DropStyle for FlowRainVariables {
    const DRAWER_KIND: DrawerKind = DrawerKind::Trail;
    const LABEL: &'static str = "Flow RainDrawer";

    fn spawn_variables(&self) -> &SpawnVariables {
        &self.spawn
    }

    fn init_slot(&self, slot: &mut DrawerSlot, frame: &FrameContext<'_>, rng: &mut RainRng) {
        slot.fluctuation_rate = rng.range(self.fluctuation_rate_min, self.fluctuation_rate_max);
        slot.acceleration = rng.range(self.acceleration_min, self.acceleration_max);

        let (_, ortho_height) = frame.camera.orthographic_extent();
        let width = rng.range(self.size_min_x, self.size_max_x);
        let vertex_distance = trail_vertex_distance(frame.params.distance, ortho_height, self.resolution);
        configure_trail(slot, &self.trail_width, width, vertex_distance);
    }

    fn update_slot(
        &self,
        slot: &mut DrawerSlot,
        index: usize,
        frame: &FrameContext<'_>,
        now: f32,
        rng: &mut RainRng,
    ) -> Result<()> {
        let t = slot.elapsed;
        let progress = slot.progress();
        let params = &frame.params;

        slot.fluctuation
            .step(frame.dt, self.amplitude, self.smooth, slot.fluctuation_rate, rng);

        let downward = -gravity_on_screen(params.gravity, &frame.camera.transform).normalize_or_zero();
        let local = slot.local.position;
        let x = slerp_vec3(local, local + downward * slot.fluctuation.offset, slot.fluctuation.blend).x;
        let y = flow_height(slot.start_position.y, downward.y, t, slot.acceleration, self.initial_velocity);
        slot.local.position = apply_wind(Vec3::new(x, y, FLOW_DEPTH), progress, params.global_wind);

        let material = self.shading.material_at(
            progress,
            params.alpha,
            params.shader,
            params.render_queue + index as i32,
        );
        slot.present_trail(now, &material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameParams;
    use crate::behaviour::RainController;
    use crate::scheduler::SpawnScheduler;
    use drizzle_core::{Transform, Vec2};
    use drizzle_render::{HeadlessBackend, RainCamera};

    fn variables() -> FlowRainVariables {
        let mut v = FlowRainVariables::default();
        v.spawn.max_rain_spawn_count = 1;
        v.spawn.duration = 1.0;
        v.spawn.emission_rate_min = 1000;
        v.spawn.emission_rate_max = 1000;
        v.spawn.lifetime_min = 4.0;
        v.spawn.lifetime_max = 4.0;
        v.acceleration_min = 2.0;
        v.acceleration_max = 2.0;
        v
    }

    fn run(v: &FlowRainVariables, params: FrameParams, ticks: usize) -> (SpawnScheduler<FlowRainVariables>, HeadlessBackend) {
        let camera = RainCamera::default();
        let mut backend = HeadlessBackend::new();
        let mut scheduler = SpawnScheduler::with_seed(v, &mut backend, 21);
        scheduler.play(v);
        for _ in 0..ticks {
            let frame = FrameContext::new(params, &camera, Transform::from_position(Vec3::Z * 8.3), 0.05);
            scheduler.update_controller(v, &frame, &mut backend).unwrap();
        }
        (scheduler, backend)
    }

    #[test]
    fn drops_fall_with_gravity() {
        let v = variables();
        let (scheduler, _) = run(&v, FrameParams::default(), 1);
        let start = scheduler.slots()[0].start_position;

        let (scheduler, _) = run(&v, FrameParams::default(), 20);
        let slot = &scheduler.slots()[0];
        assert_eq!(slot.start_position, start);
        assert!(slot.local.position.y < start.y);
        assert!((slot.local.position.z - FLOW_DEPTH).abs() < 1e-6);
    }

    #[test]
    fn inverted_gravity_rises() {
        let v = variables();
        let params = FrameParams {
            gravity: Vec3::Y,
            ..Default::default()
        };
        let (scheduler, _) = run(&v, params, 20);
        let slot = &scheduler.slots()[0];
        assert!(slot.local.position.y > slot.start_position.y);
    }

    #[test]
    fn wind_pushes_sideways() {
        let mut v = variables();
        v.amplitude = 0.0;
        let calm = run(&v, FrameParams::default(), 20).0.slots()[0].local.position;
        let windy = FrameParams {
            global_wind: Vec2::new(1.0, 0.0),
            ..Default::default()
        };
        let pushed = run(&v, windy, 20).0.slots()[0].local.position;
        // x carries last tick's drift, so the push sums progress over ticks:
        // 0.0125 * (1 + 2 + ... + 20)
        assert!((pushed.x - calm.x - 2.625).abs() < 1e-3, "{calm:?} {pushed:?}");
    }

    #[test]
    fn trails_are_configured_on_spawn() {
        let v = variables();
        let (scheduler, backend) = run(&v, FrameParams::default(), 10);
        let trail = scheduler.slots()[0].trail().unwrap();
        assert_eq!(trail.life_time, 4.0);
        assert_eq!(trail.angle_divisions, 20);
        assert!((trail.vertex_distance - 8.3 * 10.0 / (v.resolution * 10.0)).abs() < 1e-5);
        assert!(trail.node_count() >= 2);
        assert!(backend.records()[0].vertex_count >= 4);
    }
}
