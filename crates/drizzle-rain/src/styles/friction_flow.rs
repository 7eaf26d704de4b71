//! Friction flow rain: trails nudged sideways, optionally by a friction map

use super::configure_trail;
use crate::behaviour::RainSettings;
use crate::frame::FrameContext;
use crate::motion::{
    apply_wind, cheap_friction_step, fall_distance, friction_step, trail_vertex_distance, FrictionSampler,
};
use crate::rand::RainRng;
use crate::scheduler::DropStyle;
use crate::slot::DrawerSlot;
use crate::variables::{FrictionFlowRainVariables, RainConfig, SpawnVariables};
use drizzle_core::Result;
use drizzle_render::{DrawerKind, FrictionMap, ShaderType};

/// Sample threshold of a trail before its first move
const INITIAL_VERTEX_DISTANCE: f32 = 0.01;

/// Friction-flow variables plus the decoded friction map, if any
#[derive(Debug, Clone, Default)]
pub struct FrictionFlowStyle {
    pub variables: FrictionFlowRainVariables,
    pub friction_map: Option<FrictionMap>,
}

impl FrictionFlowStyle {
    pub fn new(variables: FrictionFlowRainVariables) -> Self {
        Self {
            variables,
            friction_map: None,
        }
    }

    pub fn with_friction_map(mut self, map: FrictionMap) -> Self {
        self.friction_map = Some(map);
        self
    }

    /// Decode the map named by `variables`, relative to the config file.
    /// A map that fails to load is logged and the style falls back to the
    /// cheap sideways step.
    pub fn load(variables: FrictionFlowRainVariables, config: &RainConfig) -> Self {
        let friction_map = variables.friction_map.as_ref().and_then(|path| {
            let path = config.resolve(path);
            match FrictionMap::open(&path) {
                Ok(map) => {
                    log::debug!("[rain] loaded friction map {} ({}x{})", path.display(), map.width(), map.height());
                    Some(map)
                }
                Err(e) => {
                    log::error!("[rain] friction map unavailable: {e}");
                    None
                }
            }
        });
        Self {
            variables,
            friction_map,
        }
    }

    /// Whether drops sample the friction map under `shader`
    pub fn samples_map(&self, shader: ShaderType) -> bool {
        self.friction_map.is_some() && shader == ShaderType::Expensive
    }
}

impl RainSettings for FrictionFlowStyle {
    fn style_name(&self) -> &'static str {
        "friction_flow"
    }

    fn repair(&mut self) {
        self.variables.repair();
    }

    fn auto_start(&self) -> bool {
        self.variables.spawn.auto_start
    }

    fn max_draw_call(&self) -> usize {
        self.variables.spawn.max_rain_spawn_count
    }
}

impl DropStyle for FrictionFlowStyle {
    const DRAWER_KIND: DrawerKind = DrawerKind::Trail;
    const LABEL: &'static str = "Friction Flow RainDrawer";

    fn spawn_variables(&self) -> &SpawnVariables {
        &self.variables.spawn
    }

    fn init_slot(&self, slot: &mut DrawerSlot, _frame: &FrameContext<'_>, rng: &mut RainRng) {
        let v = &self.variables;
        slot.acceleration = rng.range(v.acceleration_min, v.acceleration_max);
        let width = rng.range(v.size_min_x, v.size_max_x);
        configure_trail(slot, &v.trail_width, width, INITIAL_VERTEX_DISTANCE);
    }

    fn update_slot(
        &self,
        slot: &mut DrawerSlot,
        index: usize,
        frame: &FrameContext<'_>,
        now: f32,
        rng: &mut RainRng,
    ) -> Result<()> {
        let v = &self.variables;
        let params = &frame.params;
        let progress = slot.progress();
        let down_value = fall_distance(v.initial_velocity, slot.acceleration, slot.elapsed);
        let local = slot.local.position;

        let mut next = match &self.friction_map {
            Some(map) if params.shader == ShaderType::Expensive => {
                let sampler = FrictionSampler {
                    camera: frame.camera,
                    parent: frame.parent,
                    map,
                    gravity: params.gravity,
                };
                friction_step(&sampler, local, down_value, frame.dt, rng)
            }
            _ => cheap_friction_step(local, down_value, params.gravity, frame.dt, rng),
        };
        next = apply_wind(next, progress, params.global_wind);
        next.z = 0.0;

        let (_, ortho_height) = frame.camera.orthographic_extent();
        if let Some(trail) = slot.trail_mut() {
            trail.vertex_distance = trail_vertex_distance(params.distance, ortho_height, v.resolution as f32);
        }
        slot.local.position = next;

        let material = v.shading.material_at(
            progress,
            params.alpha,
            params.shader,
            params.render_queue + index as i32,
        );
        slot.present_trail(now, &material)
    }
}
