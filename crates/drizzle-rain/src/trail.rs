//! Path trail: a decaying history of a drop's pose, drawn as a ribbon
//!
//! Nodes come from a thread-wide [`StackPool`] that exists while at least one
//! trail holds a [`NodePoolLease`]. The first lease creates the pool and the
//! last one to drop disposes it.

use crate::curves::RainCurve;
use drizzle_core::{DrizzleError, Quat, Result, StackPool, Vec3, TOLERANCE};
use drizzle_render::{Mesh, TextureMode, TrailVertex};
use glam::Mat3;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::marker::PhantomData;

const NODE_POOL_CAPACITY: usize = 64;

/// Narrowest half-width a ribbon segment may have
pub const MIN_HALF_WIDTH: f32 = 0.001;

thread_local! {
    static NODE_POOL: RefCell<Option<StackPool<PathNode>>> = const { RefCell::new(None) };
    static POOL_LEASES: Cell<usize> = const { Cell::new(0) };
}

/// One recorded pose
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathNode {
    pub position: Vec3,
    pub rotation: Quat,
    /// Trail clock time the node was recorded at
    pub created: f32,
}

/// Keeps the shared node pool alive. Not `Send`: the pool is per thread.
pub struct NodePoolLease {
    _not_send: PhantomData<*const ()>,
}

impl NodePoolLease {
    pub fn acquire() -> Self {
        POOL_LEASES.with(|leases| {
            let count = leases.get();
            if count == 0 {
                NODE_POOL.with(|pool| {
                    *pool.borrow_mut() =
                        Some(StackPool::with_factory(NODE_POOL_CAPACITY, PathNode::default));
                });
                log::debug!("[trail] node pool created");
            }
            leases.set(count + 1);
        });
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Drop for NodePoolLease {
    fn drop(&mut self) {
        let _ = POOL_LEASES.try_with(|leases| {
            let count = leases.get().saturating_sub(1);
            leases.set(count);
            if count == 0 {
                let _ = NODE_POOL.try_with(|pool| pool.borrow_mut().take());
                log::debug!("[trail] node pool disposed");
            }
        });
    }
}

/// Whether any lease currently keeps the node pool alive
pub fn node_pool_active() -> bool {
    NODE_POOL.with(|pool| pool.borrow().is_some())
}

/// Idle nodes waiting in the pool
pub fn pooled_node_count() -> usize {
    NODE_POOL.with(|pool| pool.borrow().as_ref().map_or(0, StackPool::available))
}

fn take_node(position: Vec3, rotation: Quat, created: f32) -> Result<PathNode> {
    NODE_POOL.with(|pool| -> Result<PathNode> {
        let mut pool = pool.borrow_mut();
        let pool = pool
            .as_mut()
            .ok_or(DrizzleError::PoolExhausted("path node pool is not leased"))?;
        let mut node = pool.get()?;
        node.position = position;
        node.rotation = rotation;
        node.created = created;
        Ok(node)
    })
}

fn return_node(node: PathNode) {
    let _ = NODE_POOL.try_with(|pool| {
        if let Ok(mut pool) = pool.try_borrow_mut() {
            if let Some(pool) = pool.as_mut() {
                pool.put(node);
            }
        }
    });
}

/// Rotation whose +Z points along `forward` with +Y as close to `up` as possible
fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let z = forward.normalize();
    let x = up.cross(z);
    if x.length_squared() < 1e-12 {
        return Quat::from_rotation_arc(Vec3::Z, z);
    }
    let x = x.normalize();
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

/// Orientation of a ribbon segment travelling along `direction`.
/// Rolled -90 degrees so the node's local Y spans the ribbon's width.
fn segment_rotation(direction: Vec3) -> Quat {
    let look = if direction.length() > TOLERANCE {
        look_rotation(direction, Vec3::Z)
    } else {
        Quat::IDENTITY
    };
    look * Quat::from_rotation_z((-90.0f32).to_radians())
}

/// Pose history of one moving drop. Newest node first.
pub struct PathTrail {
    /// Nodes older than this (seconds) are dropped
    pub life_time: f32,
    pub width_curve: RainCurve,
    pub width_multiplier: f32,
    /// Degrees of turn per extra interpolated node
    pub angle_divisions: i32,
    /// Squared distance the pose must move before a new node is recorded
    pub vertex_distance: f32,
    pub texture_mode: TextureMode,
    nodes: VecDeque<PathNode>,
    mesh: Mesh,
    _lease: NodePoolLease,
}

impl Default for PathTrail {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTrail {
    pub fn new() -> Self {
        Self {
            life_time: 3.0,
            width_curve: RainCurve::rise_and_fall(),
            width_multiplier: 0.5,
            angle_divisions: 10,
            vertex_distance: 0.5,
            texture_mode: TextureMode::Stretch,
            nodes: VecDeque::new(),
            mesh: Mesh::default(),
            _lease: NodePoolLease::acquire(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &PathNode> {
        self.nodes.iter()
    }

    /// Ribbon geometry, or `None` while there is nothing to draw
    pub fn mesh(&self) -> Option<&Mesh> {
        if self.nodes.len() <= 1 {
            None
        } else {
            Some(&self.mesh)
        }
    }

    /// Return every node to the pool
    pub fn clear(&mut self) {
        for node in self.nodes.drain(..) {
            return_node(node);
        }
        self.mesh.clear();
    }

    /// Record the pose at `now` and rebuild the ribbon
    pub fn update(&mut self, now: f32, position: Vec3, rotation: Quat) -> Result<()> {
        self.sample(now, position, rotation)?;
        self.rebuild_mesh();
        Ok(())
    }

    fn purge(&mut self, now: f32) {
        let mut kept = VecDeque::with_capacity(self.nodes.len());
        for node in self.nodes.drain(..) {
            if now - node.created >= self.life_time {
                return_node(node);
            } else {
                kept.push_back(node);
            }
        }
        self.nodes = kept;
    }

    fn sample(&mut self, now: f32, position: Vec3, rotation: Quat) -> Result<()> {
        self.purge(now);

        while self.nodes.len() < 2 {
            self.nodes.push_back(take_node(position, rotation, now)?);
        }

        let newest = self.nodes[0].position;
        if (newest - position).length_squared() < self.vertex_distance {
            return Ok(());
        }

        let previous_dir = newest - self.nodes[1].position;
        let current_dir = position - newest;
        let from = segment_rotation(previous_dir);
        let to = segment_rotation(current_dir);

        let cos = previous_dir.dot(current_dir) / (previous_dir.length() * current_dir.length());
        let angle = cos.acos().to_degrees();
        if !angle.is_nan() {
            let extra = angle as i32 / self.angle_divisions.max(1);
            for j in 0..extra {
                let q = from.slerp(to, j as f32 / extra as f32);
                let pos = self.nodes[0].position;
                self.nodes.push_front(take_node(pos, q, now)?);
            }
        }

        self.nodes.push_front(take_node(position, to, now)?);
        Ok(())
    }

    fn rebuild_mesh(&mut self) {
        self.mesh.clear();
        let count = self.nodes.len();
        if count <= 1 {
            return;
        }

        self.mesh.vertices.reserve(count * 2);
        self.mesh.indices.reserve((count - 1) * 6);

        for (i, node) in self.nodes.iter().enumerate() {
            let progress = i as f32 / count as f32;
            let half_width = (self.width_multiplier * self.width_curve.evaluate(progress) * 0.5)
                .max(MIN_HALF_WIDTH);
            let offset = node.rotation * Vec3::new(0.0, half_width, 0.0);
            let u = match self.texture_mode {
                TextureMode::Stretch => progress,
                TextureMode::Tile => i as f32,
            };

            self.mesh.vertices.push(TrailVertex::new(node.position + offset, [u, 0.0]));
            self.mesh.vertices.push(TrailVertex::new(node.position - offset, [u, 1.0]));

            if i > 0 {
                let v = i as u32 * 2;
                self.mesh
                    .indices
                    .extend_from_slice(&[v - 2, v - 1, v, v + 1, v, v - 1]);
            }
        }
    }
}

impl Drop for PathTrail {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trail() -> PathTrail {
        let mut t = PathTrail::new();
        t.vertex_distance = 0.01;
        t.angle_divisions = 20;
        t.life_time = 10.0;
        t
    }

    #[test]
    fn first_update_seeds_two_nodes() {
        let mut t = trail();
        let p = Vec3::new(1.0, 2.0, 0.0);
        t.update(0.0, p, Quat::IDENTITY).unwrap();
        assert_eq!(t.node_count(), 2);
        assert!(t.nodes().all(|n| n.position == p));

        let mesh = t.mesh().unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 2, 1]);
    }

    #[test]
    fn clear_then_update_reseeds_at_current_pose() {
        let mut t = trail();
        t.update(0.0, Vec3::ZERO, Quat::IDENTITY).unwrap();
        t.update(0.1, Vec3::new(0.0, -1.0, 0.0), Quat::IDENTITY).unwrap();
        assert_eq!(t.node_count(), 3);

        t.clear();
        assert!(t.mesh().is_none());
        let here = Vec3::new(3.0, 3.0, 0.0);
        t.update(0.2, here, Quat::IDENTITY).unwrap();
        assert_eq!(t.node_count(), 2);
        assert!(t.nodes().all(|n| n.position == here));
    }

    #[test]
    fn small_moves_are_skipped() {
        let mut t = trail();
        t.update(0.0, Vec3::ZERO, Quat::IDENTITY).unwrap();
        t.update(0.1, Vec3::new(0.05, 0.0, 0.0), Quat::IDENTITY).unwrap();
        assert_eq!(t.node_count(), 2);
    }

    #[test]
    fn sharp_turn_inserts_interpolated_nodes() {
        let mut t = trail();
        t.update(0.0, Vec3::ZERO, Quat::IDENTITY).unwrap();
        t.update(0.1, Vec3::new(0.0, -1.0, 0.0), Quat::IDENTITY).unwrap();
        // 90 degree turn with 20 degree divisions: 4 extra nodes plus the new pose
        t.update(0.2, Vec3::new(1.0, -1.0, 0.0), Quat::IDENTITY).unwrap();
        assert_eq!(t.node_count(), 8);

        let newest = t.nodes().next().unwrap();
        assert_eq!(newest.position, Vec3::new(1.0, -1.0, 0.0));
        let corner = Vec3::new(0.0, -1.0, 0.0);
        assert_eq!(t.nodes().filter(|n| n.position == corner).count(), 5);
    }

    #[test]
    fn straight_segment_faces_travel_direction() {
        let mut t = trail();
        t.update(0.0, Vec3::ZERO, Quat::IDENTITY).unwrap();
        t.update(0.1, Vec3::new(0.0, -1.0, 0.0), Quat::IDENTITY).unwrap();
        let newest = t.nodes().next().unwrap();
        // Width axis is perpendicular to the fall direction, in the screen plane
        let width_axis = newest.rotation * Vec3::Y;
        assert!(width_axis.dot(Vec3::NEG_Y).abs() < 1e-4);
        assert!(width_axis.z.abs() < 1e-4);
    }

    #[test]
    fn old_nodes_expire() {
        let mut t = trail();
        t.life_time = 0.5;
        t.update(0.0, Vec3::ZERO, Quat::IDENTITY).unwrap();
        t.update(0.4, Vec3::new(0.0, -1.0, 0.0), Quat::IDENTITY).unwrap();
        assert_eq!(t.node_count(), 3);
        // Seeds from t=0 are now 0.6s old; only the t=0.4 node survives, then
        // one more seed tops the trail back up to two
        t.update(0.6, Vec3::new(0.0, -1.0, 0.0), Quat::IDENTITY).unwrap();
        assert_eq!(t.node_count(), 2);
    }

    #[test]
    fn width_is_clamped_and_tiled_uvs_count_nodes() {
        let mut t = trail();
        t.width_curve = RainCurve::empty();
        t.texture_mode = TextureMode::Tile;
        t.update(0.0, Vec3::ZERO, Quat::IDENTITY).unwrap();
        t.update(0.1, Vec3::new(0.0, -1.0, 0.0), Quat::IDENTITY).unwrap();

        let mesh = t.mesh().unwrap();
        let top = Vec3::from_array(mesh.vertices[0].position);
        let bottom = Vec3::from_array(mesh.vertices[1].position);
        assert!(((top - bottom).length() - 2.0 * MIN_HALF_WIDTH).abs() < 1e-6);
        assert_eq!(mesh.vertices[4].uv, [2.0, 0.0]);
        assert_eq!(mesh.indices.len(), 12);
    }

    #[test]
    fn nodes_are_recycled_through_the_pool() {
        let mut t = trail();
        t.update(0.0, Vec3::ZERO, Quat::IDENTITY).unwrap();
        let before = pooled_node_count();
        t.clear();
        assert_eq!(pooled_node_count(), before + 2);
        t.update(0.1, Vec3::ONE, Quat::IDENTITY).unwrap();
        assert_eq!(pooled_node_count(), before);
    }

    #[test]
    fn pool_lives_as_long_as_a_lease() {
        std::thread::spawn(|| {
            assert!(!node_pool_active());
            let a = PathTrail::new();
            let b = PathTrail::new();
            assert!(node_pool_active());
            drop(a);
            assert!(node_pool_active());
            drop(b);
            assert!(!node_pool_active());
        })
        .join()
        .unwrap();
    }
}
