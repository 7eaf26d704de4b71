//! Drawer slot: one drop's render resource plus its lifecycle state

use crate::motion::Fluctuation;
use crate::trail::PathTrail;
use drizzle_core::{DrizzleError, Result, Transform, Vec3};
use drizzle_render::{DrawerGeometry, MaterialParams, QuadPlacement, RainDrawer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawState {
    /// Idle; free to spawn into or to remove
    #[default]
    Disabled,
    /// Animating until `elapsed` reaches `lifetime`
    Playing,
}

/// One pooled drop.
///
/// After every scheduler tick `elapsed` stays within `[0, lifetime]` and the
/// slot is `Playing` only while `elapsed < lifetime`.
pub struct DrawerSlot {
    pub state: DrawState,
    pub elapsed: f32,
    pub lifetime: f32,
    /// Pose relative to the owning behaviour
    pub local: Transform,
    pub start_position: Vec3,
    pub start_size: Vec3,
    pub roll_degrees: f32,
    pub acceleration: f32,
    pub fluctuation_rate: f32,
    pub fluctuation: Fluctuation,
    trail: Option<PathTrail>,
    drawer: Box<dyn RainDrawer>,
    label: String,
    warned_missing_normal: bool,
}

impl DrawerSlot {
    pub fn new(drawer: Box<dyn RainDrawer>, trail: Option<PathTrail>, label: impl Into<String>) -> Self {
        Self {
            state: DrawState::Disabled,
            elapsed: 0.0,
            lifetime: 0.0,
            local: Transform::IDENTITY,
            start_position: Vec3::ZERO,
            start_size: Vec3::ONE,
            roll_degrees: 0.0,
            acceleration: 0.0,
            fluctuation_rate: 0.0,
            fluctuation: Fluctuation::default(),
            trail,
            drawer,
            label: label.into(),
            warned_missing_normal: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_playing(&self) -> bool {
        self.state == DrawState::Playing
    }

    /// `elapsed / lifetime`; a slot without a positive lifetime is finished
    pub fn progress(&self) -> f32 {
        if self.lifetime <= 0.0 {
            1.0
        } else {
            self.elapsed / self.lifetime
        }
    }

    /// Whether the drawer is currently shown
    pub fn is_enabled(&self) -> bool {
        self.drawer.is_enabled()
    }

    pub fn trail(&self) -> Option<&PathTrail> {
        self.trail.as_ref()
    }

    pub fn trail_mut(&mut self) -> Option<&mut PathTrail> {
        self.trail.as_mut()
    }

    /// Step the lifetime clock. Returns false (and retires the slot) once
    /// the drop has run its course.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed = (self.elapsed + dt).min(self.lifetime.max(0.0));
        if self.progress() >= 1.0 {
            self.retire();
            return false;
        }
        true
    }

    /// Back to a fresh idle slot
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.retire();
    }

    /// Stop drawing and forget the trail
    pub fn retire(&mut self) {
        self.state = DrawState::Disabled;
        if let Some(trail) = self.trail.as_mut() {
            trail.clear();
        }
        self.drawer.hide();
    }

    pub fn hide(&mut self) {
        self.drawer.hide();
    }

    /// Record the current pose in the trail and draw the ribbon.
    /// Invisible drops are hidden and their trail is left untouched.
    pub fn present_trail(&mut self, now: f32, params: &MaterialParams) -> Result<()> {
        if params.is_invisible() {
            self.drawer.hide();
            return Ok(());
        }
        let Some(trail) = self.trail.as_mut() else {
            self.drawer.hide();
            return Ok(());
        };

        trail.update(now, self.local.position, self.local.rotation)?;
        match trail.mesh() {
            Some(mesh) => {
                self.drawer.set_geometry(DrawerGeometry::Ribbon(mesh));
                self.drawer.apply(params);
                self.drawer.show();
            }
            None => self.drawer.hide(),
        }
        Ok(())
    }

    /// Draw the slot as a single quad at its local pose
    pub fn present_quad(&mut self, params: &MaterialParams) {
        if params.normal_map.is_none() {
            if !self.warned_missing_normal {
                let err = DrizzleError::MissingResource(format!("{}: normal map", self.label));
                log::error!("[rain] {err}, drop hidden");
                self.warned_missing_normal = true;
            }
            self.drawer.hide();
            return;
        }
        if params.is_invisible() {
            self.drawer.hide();
            return;
        }

        self.drawer.set_geometry(DrawerGeometry::Quad(QuadPlacement {
            position: self.local.position,
            roll_degrees: self.roll_degrees,
            scale: self.local.scale,
        }));
        self.drawer.apply(params);
        self.drawer.show();
    }
}

impl Drop for DrawerSlot {
    fn drop(&mut self) {
        self.drawer.hide();
    }
}
