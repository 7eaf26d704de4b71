//! The streaming rain styles run by a [`SpawnScheduler`](crate::scheduler::SpawnScheduler)

mod flow;
mod friction_flow;
mod simple;

pub use friction_flow::FrictionFlowStyle;

use crate::curves::RainCurve;
use crate::slot::DrawerSlot;
use drizzle_render::TextureMode;

/// Turn resolution of drop trails, in degrees per inserted node
const TRAIL_ANGLE_DIVISIONS: i32 = 20;

/// Shape a freshly spawned drop's trail: it lives as long as the drop
fn configure_trail(slot: &mut DrawerSlot, width_curve: &RainCurve, width: f32, vertex_distance: f32) {
    let lifetime = slot.lifetime;
    if let Some(trail) = slot.trail_mut() {
        trail.life_time = lifetime;
        trail.angle_divisions = TRAIL_ANGLE_DIVISIONS;
        trail.width_curve = width_curve.clone();
        trail.width_multiplier = width;
        trail.texture_mode = TextureMode::Stretch;
        trail.vertex_distance = vertex_distance;
    }
}
