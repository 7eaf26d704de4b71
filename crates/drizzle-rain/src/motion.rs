//! Motion model: pure helpers that move drops across the screen plane.
//!
//! Positions are local to the owning behaviour. Gravity is given in world
//! space and projected onto the camera's axes before use.

use crate::rand::RainRng;
use drizzle_core::{Quat, Transform, Vec2, Vec3, TOLERANCE};
use drizzle_render::{FrictionMap, RainCamera};

/// Sub-step resolution of the friction samplers
pub const FRICTION_RESOLUTION: f32 = 150.0;

/// Lateral sampling resolution of the friction samplers
pub const FRICTION_WIDTH_RESOLUTION: i32 = 8;

/// Minimum wait (seconds) between fluctuation re-rolls
const FLUCTUATION_WAIT: f32 = 0.01;

/// Express `gravity` in the axes of `screen`.
///
/// Gravity is projected onto each screen axis, each projection is carried
/// into the screen's local space, and the matching component is kept.
pub fn gravity_on_screen(gravity: Vec3, screen: &Transform) -> Vec3 {
    let origin = screen.position;
    let along_x = screen.inverse_transform_point(origin + project(gravity, screen.right()));
    let along_y = screen.inverse_transform_point(origin + project(gravity, screen.up()));
    let along_z = screen.inverse_transform_point(origin + project(gravity, screen.forward()));
    Vec3::new(along_x.x, along_y.y, along_z.z)
}

fn project(v: Vec3, onto: Vec3) -> Vec3 {
    let len_sq = onto.length_squared();
    if len_sq < f32::EPSILON {
        Vec3::ZERO
    } else {
        onto * (v.dot(onto) / len_sq)
    }
}

/// Distance fallen after `t` seconds by a friction-flow drop
pub fn fall_distance(initial_velocity: f32, acceleration: f32, t: f32) -> f32 {
    0.5 * t * t * acceleration * 0.1 + initial_velocity * t * 0.01
}

/// Local height of a flow drop after `t` seconds
pub fn flow_height(start_y: f32, downward_y: f32, t: f32, acceleration: f32, initial_velocity: f32) -> f32 {
    start_y - downward_y * 0.5 * t * t * acceleration - initial_velocity * t
}

/// Sub-steps per tick for a sampler of the given resolution, in `[2, 5]`
pub fn sub_step_count(resolution: f32, dt: f32) -> i32 {
    (resolution * dt).clamp(2.0, 5.0) as i32
}

/// Candidate count of the lateral samplers
pub fn lateral_candidates(width_resolution: i32) -> i32 {
    (2 * width_resolution).clamp(2, 5)
}

/// Lateral width of one candidate step
pub fn lateral_step(down_value: f32, iterations: i32, width_resolution: i32) -> f32 {
    down_value * (1.0 / iterations as f32) * 3.0 / width_resolution as f32
}

/// Offset of candidate `j` out of `candidates`, centred around zero
pub fn lateral_offset(j: i32, step: f32, candidates: i32) -> f32 {
    j as f32 * step - candidates as f32 / 2.0 * step
}

/// Threshold below which a trail skips a sample
pub fn trail_vertex_distance(distance: f32, ortho_height: f32, resolution: f32) -> f32 {
    distance * ortho_height / (resolution * 10.0)
}

/// Slide along raw gravity and jitter sideways by a random candidate
pub fn cheap_friction_step(local: Vec3, down_value: f32, gravity: Vec3, dt: f32, rng: &mut RainRng) -> Vec3 {
    let iter = sub_step_count(FRICTION_RESOLUTION, dt);
    let step = lateral_step(down_value, iter, FRICTION_WIDTH_RESOLUTION);
    let candidates = lateral_candidates(FRICTION_WIDTH_RESOLUTION);

    let j = rng.range_int(0, candidates);
    let ww = lateral_offset(j, step, candidates);
    local + gravity * (down_value / iter as f32) + Vec3::new(ww, 0.0, 0.0)
}

/// Inputs of the map-sampling friction step
pub struct FrictionSampler<'a> {
    pub camera: &'a RainCamera,
    pub parent: Transform,
    pub map: &'a FrictionMap,
    pub gravity: Vec3,
}

/// Walk down the projected gravity in sub-steps, sampling a fan of lateral
/// candidates against the friction map, and return the weighted pick in
/// local space.
pub fn friction_step(sampler: &FrictionSampler<'_>, local: Vec3, down_value: f32, dt: f32, rng: &mut RainRng) -> Vec3 {
    let iter = sub_step_count(FRICTION_RESOLUTION, dt);
    let downward = gravity_on_screen(sampler.gravity, &sampler.camera.transform).normalize_or_zero();
    let heading = downward.y.atan2(downward.x).to_degrees() + 90.0;
    let heading = Quat::from_rotation_z(heading.to_radians());

    let step = lateral_step(down_value, iter, FRICTION_WIDTH_RESOLUTION);
    let candidates = lateral_candidates(FRICTION_WIDTH_RESOLUTION);
    let advance = Vec3::new(downward.x, downward.y, 0.0) * (down_value / iter as f32);
    let (tex_w, tex_h) = (sampler.map.width() as f32, sampler.map.height() as f32);

    let mut cursor = local;
    let mut positions: Vec<Vec3> = Vec::new();
    let mut weights: Vec<f32> = Vec::new();

    for _ in 0..iter {
        cursor += advance;
        for j in 0..=candidates {
            let ww = lateral_offset(j, step, candidates);
            let world = sampler.parent.transform_point(cursor + heading * Vec3::new(ww, 0.0, 0.0));
            let viewport = sampler.camera.world_to_viewport(world);
            let pixel = sampler
                .map
                .grayscale((tex_w * viewport.x) as i32, (tex_h * -viewport.y) as i32);

            if !positions.contains(&world) {
                positions.push(world);
                weights.push(1.0 - pixel);
            }
        }
    }

    match pick_weighted(&weights, rng) {
        Some(i) => sampler.parent.inverse_transform_point(positions[i]),
        None => cursor,
    }
}

/// Pick an index from `weights`.
///
/// When every weight matches the first (within tolerance) the choice is
/// uniform. Otherwise the weights are stably sorted ascending and the first
/// entry at the maximum wins.
pub fn pick_weighted(weights: &[f32], rng: &mut RainRng) -> Option<usize> {
    let first = *weights.first()?;
    let mut order: Vec<usize> = (0..weights.len()).collect();

    if weights.iter().all(|w| (w - first).abs() < TOLERANCE) {
        rng.shuffle(&mut order);
        return order.first().copied();
    }

    let max = weights.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    order.sort_by(|&a, &b| weights[a].partial_cmp(&weights[b]).unwrap_or(std::cmp::Ordering::Equal));
    order.into_iter().find(|&i| (weights[i] - max).abs() < TOLERANCE)
}

/// Spherical interpolation of two position vectors: direction by angle,
/// length linearly. `t` is clamped to `[0, 1]`.
pub fn slerp_vec3(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    let t = t.clamp(0.0, 1.0);
    let (len_a, len_b) = (from.length(), to.length());
    if len_a < f32::EPSILON || len_b < f32::EPSILON {
        return from.lerp(to, t);
    }

    let (dir_a, dir_b) = (from / len_a, to / len_b);
    let dot = dir_a.dot(dir_b).clamp(-1.0, 1.0);
    let ortho = dir_b - dir_a * dot;
    if ortho.length_squared() < 1e-12 {
        // parallel or opposite; no unique arc
        return from.lerp(to, t);
    }

    let theta = dot.acos() * t;
    let dir = dir_a * theta.cos() + ortho.normalize() * theta.sin();
    dir * (len_a + (len_b - len_a) * t)
}

/// Drift `position` with the global wind, scaled by drop progress
pub fn apply_wind(position: Vec3, progress: f32, wind: Vec2) -> Vec3 {
    position + Vec3::new(wind.x, wind.y, 0.0) * progress
}

/// Random point in the camera's orthographic view, in `parent`'s local space.
/// Offsets shift the point by a fraction of the view size.
pub fn spawn_local_position(
    camera: &RainCamera,
    parent: &Transform,
    offset_x: f32,
    offset_y: f32,
    rng: &mut RainRng,
) -> Vec3 {
    let (w, h) = camera.orthographic_extent();
    let p = Vec3::new(rng.range(-w / 2.0, w / 2.0), rng.range(-h / 2.0, h / 2.0), 0.0);

    let mut p = camera.transform.rotation * p + parent.position;
    p.x += w * offset_x;
    p.y += h * offset_y;
    parent.inverse_transform_point(p)
}

/// Sideways wobble of a flow drop.
///
/// `offset` is the current sideways target and `blend` how far the drop has
/// eased towards it. A re-roll timer picks a new target at random intervals.
#[derive(Debug, Clone, Default)]
pub struct Fluctuation {
    pub offset: f32,
    pub blend: f32,
    timer: Option<RerollTimer>,
}

impl Fluctuation {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance one tick. `rate` is the drop's fluctuation rate; higher
    /// rates re-roll more often.
    pub fn step(&mut self, dt: f32, amplitude: f32, smooth: f32, rate: f32, rng: &mut RainRng) {
        if self.timer.is_none() {
            self.timer = Some(RerollTimer::new(roll_max(rate)));
        }

        self.blend += 0.01 * smooth * dt;
        if self.offset.abs() < TOLERANCE {
            self.reroll(amplitude, rng);
        }

        let fired = self.timer.as_mut().is_some_and(|timer| timer.tick(dt, rng));
        if fired {
            self.reroll(amplitude, rng);
            self.timer = None;
        }
    }

    fn reroll(&mut self, amplitude: f32, rng: &mut RainRng) {
        self.offset = rng.range(-0.1 * amplitude, 0.1 * amplitude);
        self.blend = 0.0;
    }
}

/// One-in-`roll_max` chance to fire after each short wait
fn roll_max(rate: f32) -> i32 {
    (1.0 / rate * 100.0) as i32
}

#[derive(Debug, Clone)]
struct RerollTimer {
    elapsed: f32,
    roll_max: i32,
}

impl RerollTimer {
    fn new(roll_max: i32) -> Self {
        Self { elapsed: 0.0, roll_max }
    }

    fn tick(&mut self, dt: f32, rng: &mut RainRng) -> bool {
        if self.elapsed < FLUCTUATION_WAIT {
            self.elapsed += dt;
            return false;
        }
        if rng.range_int(0, self.roll_max) != 0 {
            self.elapsed = dt;
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn gravity_on_identity_screen_is_unchanged() {
        let g = Vec3::new(0.3, -1.0, 0.2);
        assert!(approx(gravity_on_screen(g, &Transform::IDENTITY), g));
    }

    #[test]
    fn gravity_on_rolled_screen() {
        // Screen rolled 90 degrees: world down points along screen -X
        let screen = Transform::IDENTITY.with_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let g = gravity_on_screen(Vec3::NEG_Y, &screen);
        assert!(approx(g, Vec3::new(-1.0, 0.0, 0.0)), "{g:?}");
    }

    #[test]
    fn fall_distance_scales() {
        assert!((fall_distance(0.0, 2.0, 1.0) - 0.1).abs() < 1e-6);
        assert!((fall_distance(10.0, 0.0, 2.0) - 0.2).abs() < 1e-6);
        assert_eq!(flow_height(1.0, 1.0, 0.0, 5.0, 3.0), 1.0);
        assert!((flow_height(1.0, 1.0, 2.0, 0.5, 0.0) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn sub_steps_clamped() {
        assert_eq!(sub_step_count(150.0, 0.001), 2);
        assert_eq!(sub_step_count(150.0, 1.0 / 60.0), 2);
        assert_eq!(sub_step_count(150.0, 0.025), 3);
        assert_eq!(sub_step_count(150.0, 1.0), 5);
        assert_eq!(lateral_candidates(8), 5);
        assert_eq!(lateral_candidates(0), 2);
    }

    #[test]
    fn lateral_offsets_straddle_zero() {
        let step = 0.1;
        let offsets: Vec<f32> = (0..=4).map(|j| lateral_offset(j, step, 4)).collect();
        assert!((offsets[0] + 0.2).abs() < 1e-6);
        assert!(offsets[2].abs() < 1e-6);
        assert!((offsets[4] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn cheap_step_moves_along_gravity() {
        let mut rng = RainRng::new(3);
        for _ in 0..50 {
            let p = cheap_friction_step(Vec3::ZERO, 1.0, Vec3::NEG_Y, 0.0, &mut rng);
            assert!((p.y + 0.5).abs() < 1e-5);
            // step = 1/2 * 3/8, offsets from -2.5 to +1.5 steps
            assert!(p.x >= -2.5 * 0.1875 - 1e-5 && p.x <= 1.5 * 0.1875 + 1e-5);
        }
    }

    #[test]
    fn weighted_pick_prefers_first_max_after_sort() {
        let mut rng = RainRng::new(1);
        assert_eq!(pick_weighted(&[0.1, 0.9, 0.5, 0.9], &mut rng), Some(1));
        assert_eq!(pick_weighted(&[0.9, 0.1], &mut rng), Some(0));
        assert_eq!(pick_weighted(&[], &mut rng), None);
    }

    #[test]
    fn weighted_pick_ties_are_uniform() {
        const N: usize = 5;
        const TRIALS: usize = 5000;
        let mut rng = RainRng::new(0x1234);
        let weights = [0.5f32; N];
        let mut counts = [0usize; N];
        for _ in 0..TRIALS {
            let i = pick_weighted(&weights, &mut rng).unwrap();
            counts[i] += 1;
        }

        let expected = TRIALS as f64 / N as f64;
        let chi_sq: f64 = counts
            .iter()
            .map(|&c| {
                let d = c as f64 - expected;
                d * d / expected
            })
            .sum();
        // 4 degrees of freedom, p = 0.001
        assert!(chi_sq < 18.47, "chi-square {chi_sq} counts {counts:?}");
    }

    #[test]
    fn friction_step_prefers_dark_pixels() {
        // Dark on the left half, bright on the right; weight is 1 - gray
        let map = FrictionMap::from_fn(64, 64, |x, _| if x < 32 { 0.0 } else { 1.0 }).unwrap();
        let camera = RainCamera::default();
        let sampler = FrictionSampler {
            camera: &camera,
            parent: Transform::from_position(Vec3::new(0.0, 0.0, 5.0)),
            map: &map,
            gravity: Vec3::NEG_Y,
        };
        let mut rng = RainRng::new(9);
        let next = friction_step(&sampler, Vec3::new(0.0, 2.0, 0.0), 2.0, 0.0, &mut rng);
        assert!(next.y < 2.0);
        assert!(next.x < 0.0, "{next:?}");
    }

    #[test]
    fn slerp_keeps_lengths_and_clamps() {
        let a = Vec3::new(2.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 4.0, 0.0);
        let mid = slerp_vec3(a, b, 0.5);
        assert!((mid.length() - 3.0).abs() < 1e-4);
        assert!((mid.x - mid.y).abs() < 1e-4);
        assert!(approx(slerp_vec3(a, b, 2.0), b));
        assert!(approx(slerp_vec3(a, a * 3.0, 0.5), a * 2.0));
    }

    #[test]
    fn wind_scales_with_progress() {
        let p = apply_wind(Vec3::ONE, 0.5, Vec2::new(2.0, -4.0));
        assert!(approx(p, Vec3::new(2.0, -1.0, 1.0)));
    }

    #[test]
    fn spawn_positions_stay_inside_view() {
        let camera = RainCamera::default();
        let (w, h) = camera.orthographic_extent();
        let parent = Transform::from_position(Vec3::new(0.0, 0.0, 8.3));
        let mut rng = RainRng::new(5);
        for _ in 0..200 {
            let p = spawn_local_position(&camera, &parent, 0.0, 0.2, &mut rng);
            assert!(p.x.abs() <= w / 2.0);
            assert!(p.y >= -h / 2.0 + 0.2 * h - 1e-4 && p.y <= h / 2.0 + 0.2 * h);
            assert!(p.z.abs() < 1e-5);
        }
    }

    #[test]
    fn fluctuation_rerolls_eventually() {
        let mut rng = RainRng::new(11);
        let mut f = Fluctuation::default();
        f.step(0.02, 5.0, 5.0, 5.0, &mut rng);
        assert!(f.offset.abs() <= 0.5);
        assert!(f.offset.abs() >= TOLERANCE);

        let first = f.offset;
        let mut changed = false;
        for _ in 0..2000 {
            f.step(0.02, 5.0, 5.0, 5.0, &mut rng);
            if f.offset != first {
                changed = true;
                break;
            }
        }
        assert!(changed);
    }
}
