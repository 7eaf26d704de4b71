//! Recording backend for hosts without a GPU
//!
//! Each drawer writes what it was last asked to draw into a shared
//! `DrawerRecord`. Dropping the drawer releases the record, so the live count
//! tracks how many render resources are still held.

use crate::drawer::{DrawerGeometry, DrawerKind, MaterialParams, RainDrawer, RenderBackend};
use crate::mesh::QuadPlacement;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Snapshot of one drawer's most recent state
#[derive(Debug, Clone, PartialEq)]
pub struct DrawerRecord {
    pub label: String,
    pub kind: DrawerKind,
    pub visible: bool,
    pub params: Option<MaterialParams>,
    pub vertex_count: usize,
    pub index_count: usize,
    pub placement: Option<QuadPlacement>,
    /// Number of hidden -> visible transitions
    pub show_count: u32,
}

impl DrawerRecord {
    fn new(kind: DrawerKind, label: &str) -> Self {
        Self {
            label: label.to_string(),
            kind,
            visible: false,
            params: None,
            vertex_count: 0,
            index_count: 0,
            placement: None,
            show_count: 0,
        }
    }
}

#[derive(Default)]
struct Registry {
    drawers: Vec<Weak<RefCell<DrawerRecord>>>,
    created: usize,
}

/// Cloneable handle; clones share one registry
#[derive(Clone, Default)]
pub struct HeadlessBackend {
    registry: Rc<RefCell<Registry>>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drawers created and not yet dropped
    pub fn live_count(&self) -> usize {
        self.registry
            .borrow()
            .drawers
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Live drawers currently shown
    pub fn visible_count(&self) -> usize {
        self.records().iter().filter(|r| r.visible).count()
    }

    /// Drawers ever created
    pub fn created_count(&self) -> usize {
        self.registry.borrow().created
    }

    /// Snapshots of all live drawers, in creation order
    pub fn records(&self) -> Vec<DrawerRecord> {
        self.registry
            .borrow()
            .drawers
            .iter()
            .filter_map(Weak::upgrade)
            .map(|r| r.borrow().clone())
            .collect()
    }

    /// Forget records of dropped drawers
    pub fn prune(&self) {
        self.registry
            .borrow_mut()
            .drawers
            .retain(|w| w.strong_count() > 0);
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_drawer(&mut self, kind: DrawerKind, label: &str) -> Box<dyn RainDrawer> {
        let record = Rc::new(RefCell::new(DrawerRecord::new(kind, label)));
        let mut registry = self.registry.borrow_mut();
        registry.drawers.push(Rc::downgrade(&record));
        registry.created += 1;
        Box::new(HeadlessDrawer { record })
    }
}

struct HeadlessDrawer {
    record: Rc<RefCell<DrawerRecord>>,
}

impl RainDrawer for HeadlessDrawer {
    fn apply(&mut self, params: &MaterialParams) {
        self.record.borrow_mut().params = Some(params.clone());
    }

    fn set_geometry(&mut self, geometry: DrawerGeometry<'_>) {
        let mut record = self.record.borrow_mut();
        match geometry {
            DrawerGeometry::Ribbon(mesh) => {
                record.vertex_count = mesh.vertices.len();
                record.index_count = mesh.indices.len();
            }
            DrawerGeometry::Quad(placement) => {
                record.vertex_count = 4;
                record.index_count = 6;
                record.placement = Some(placement);
            }
        }
    }

    fn show(&mut self) {
        let mut record = self.record.borrow_mut();
        if !record.visible {
            record.show_count += 1;
        }
        record.visible = true;
    }

    fn hide(&mut self) {
        self.record.borrow_mut().visible = false;
    }

    fn is_enabled(&self) -> bool {
        self.record.borrow().visible
    }
}
