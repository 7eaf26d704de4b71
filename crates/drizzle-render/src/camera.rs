//! Rain camera: the view the drops are laid out against

use drizzle_core::{Transform, Vec3};

/// A camera looking down its local +Z axis.
///
/// Viewport coordinates run (0,0) bottom-left to (1,1) top-right, with `z`
/// holding the depth along the view axis.
#[derive(Debug, Clone, PartialEq)]
pub struct RainCamera {
    /// World transform of the camera
    pub transform: Transform,
    /// Use orthographic projection (true) or perspective (false)
    pub orthographic: bool,
    /// Half the orthographic view height
    pub orthographic_size: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
}

impl Default for RainCamera {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            orthographic: true,
            orthographic_size: 5.0,
            fov: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.01,
            far: 1000.0,
        }
    }
}

impl RainCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Width and height of the orthographic view volume
    pub fn orthographic_extent(&self) -> (f32, f32) {
        let h = self.orthographic_size * 2.0;
        (h * self.aspect, h)
    }

    /// Height of the perspective frustum slice at `distance` along the view axis
    pub fn frustum_height_at(&self, distance: f32) -> f32 {
        2.0 * distance * (self.fov.to_radians() * 0.5).tan()
    }

    /// Visible width and height of the plane at `depth`
    fn view_extent_at(&self, depth: f32) -> (f32, f32) {
        if self.orthographic {
            self.orthographic_extent()
        } else {
            let h = self.frustum_height_at(depth);
            (h * self.aspect, h)
        }
    }

    /// World point -> viewport coordinates
    pub fn world_to_viewport(&self, point: Vec3) -> Vec3 {
        let local = self.transform.inverse_transform_point(point);
        let (w, h) = self.view_extent_at(local.z);
        let vx = if w.abs() < f32::EPSILON { 0.5 } else { local.x / w + 0.5 };
        let vy = if h.abs() < f32::EPSILON { 0.5 } else { local.y / h + 0.5 };
        Vec3::new(vx, vy, local.z)
    }

    /// Viewport coordinates -> world point
    pub fn viewport_to_world(&self, viewport: Vec3) -> Vec3 {
        let (w, h) = self.view_extent_at(viewport.z);
        let local = Vec3::new((viewport.x - 0.5) * w, (viewport.y - 0.5) * h, viewport.z);
        self.transform.transform_point(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn orthographic_extent_follows_size_and_aspect() {
        let cam = RainCamera {
            aspect: 2.0,
            ..Default::default()
        };
        assert_eq!(cam.orthographic_extent(), (20.0, 10.0));
    }

    #[test]
    fn frustum_height_at_ninety_degrees() {
        let cam = RainCamera {
            fov: 90.0,
            ..Default::default()
        };
        assert!((cam.frustum_height_at(3.0) - 6.0).abs() < 1e-4);
    }

    #[test]
    fn viewport_center_and_corners() {
        let cam = RainCamera {
            aspect: 1.0,
            transform: Transform::from_position(Vec3::new(1.0, 2.0, 0.0)),
            ..Default::default()
        };
        let center = cam.world_to_viewport(Vec3::new(1.0, 2.0, 4.0));
        assert!(approx(center, Vec3::new(0.5, 0.5, 4.0)));

        let top_right = cam.world_to_viewport(Vec3::new(6.0, 7.0, 1.0));
        assert!(approx(top_right, Vec3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn perspective_round_trip() {
        let cam = RainCamera {
            orthographic: false,
            ..Default::default()
        };
        let world = Vec3::new(0.7, -0.3, 8.0);
        let back = cam.viewport_to_world(cam.world_to_viewport(world));
        assert!(approx(world, back));
    }
}
