//! Spawn scheduler: owns one behaviour's drop slots and drives their
//! lifecycle once per frame.
//!
//! Each tick runs, in order:
//! 1. the pending play delay, if any
//! 2. capacity reconciliation against `max_rain_spawn_count`
//! 3. spawn gating (stop flag, one-shot countdown, emission interval)
//! 4. advance of every playing slot

use crate::behaviour::{RainController, RainSettings};
use crate::frame::FrameContext;
use crate::motion::spawn_local_position;
use crate::rand::RainRng;
use crate::slot::{DrawState, DrawerSlot};
use crate::trail::PathTrail;
use crate::variables::SpawnVariables;
use drizzle_core::{Result, Transform, TOLERANCE};
use drizzle_render::{DrawerKind, RenderBackend};
use std::marker::PhantomData;

/// Per-style behaviour plugged into a [`SpawnScheduler`]
pub trait DropStyle: RainSettings {
    /// Geometry every slot of this style draws
    const DRAWER_KIND: DrawerKind;

    /// Prefix of drawer labels
    const LABEL: &'static str;

    fn spawn_variables(&self) -> &SpawnVariables;

    /// Roll the style's per-drop randoms. Lifetime and start position are
    /// already set and the trail is cleared.
    fn init_slot(&self, slot: &mut DrawerSlot, frame: &FrameContext<'_>, rng: &mut RainRng);

    /// Move a playing drop and push its material to the drawer
    fn update_slot(
        &self,
        slot: &mut DrawerSlot,
        index: usize,
        frame: &FrameContext<'_>,
        now: f32,
        rng: &mut RainRng,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PlayDelay {
    delay: f32,
    waited: f32,
}

pub struct SpawnScheduler<S> {
    slots: Vec<DrawerSlot>,
    time_elapsed: f32,
    interval: f32,
    one_shot: bool,
    one_shot_time_left: f32,
    pending: Option<PlayDelay>,
    no_more_rain: bool,
    clock: f32,
    total_spawned: usize,
    rng: RainRng,
    _style: PhantomData<fn(&S)>,
}

impl<S: DropStyle> SpawnScheduler<S> {
    /// Scheduler with `max_rain_spawn_count` idle slots
    pub fn with_seed(style: &S, backend: &mut dyn RenderBackend, seed: u32) -> Self {
        let mut scheduler = Self {
            slots: Vec::new(),
            time_elapsed: 0.0,
            interval: 0.0,
            one_shot: false,
            one_shot_time_left: 0.0,
            pending: None,
            no_more_rain: false,
            clock: 0.0,
            total_spawned: 0,
            rng: RainRng::new(seed),
            _style: PhantomData,
        };
        for _ in 0..style.spawn_variables().max_rain_spawn_count {
            scheduler.push_slot(backend);
        }
        scheduler
    }

    pub fn slots(&self) -> &[DrawerSlot] {
        &self.slots
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn playing_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_playing()).count()
    }

    /// Drops spawned since creation
    pub fn total_spawned(&self) -> usize {
        self.total_spawned
    }

    pub fn is_waiting_delay(&self) -> bool {
        self.pending.is_some()
    }

    pub fn no_more_rain(&self) -> bool {
        self.no_more_rain
    }

    fn push_slot(&mut self, backend: &mut dyn RenderBackend) {
        let label = format!("{} {}", S::LABEL, self.slots.len());
        let drawer = backend.create_drawer(S::DRAWER_KIND, &label);
        let trail = (S::DRAWER_KIND == DrawerKind::Trail).then(PathTrail::new);
        self.slots.push(DrawerSlot::new(drawer, trail, label));
    }

    /// Grow or shrink to `target` slots. Idle slots are removed before
    /// playing ones; removed drawers are released immediately.
    pub fn reconcile_capacity(&mut self, target: usize, backend: &mut dyn RenderBackend) {
        let len = self.slots.len();
        if target > len {
            for _ in len..target {
                self.push_slot(backend);
            }
            log::debug!("[rain] {}: grew pool {len} -> {target}", S::LABEL);
            return;
        }
        if target == len {
            return;
        }

        let remove = len - target;
        let mut doomed = vec![false; len];
        let mut marked = 0;
        for playing in [false, true] {
            for (i, slot) in self.slots.iter().enumerate() {
                if marked == remove {
                    break;
                }
                if slot.is_playing() == playing {
                    doomed[i] = true;
                    marked += 1;
                }
            }
        }

        let mut flags = doomed.into_iter();
        self.slots.retain(|_| !flags.next().unwrap_or(false));
        log::debug!("[rain] {}: shrank pool {len} -> {target}", S::LABEL);
    }

    fn resolve_delay(&mut self, style: &S, dt: f32) {
        let Some(mut pending) = self.pending else {
            return;
        };
        if pending.waited < pending.delay {
            pending.waited += dt;
            self.pending = Some(pending);
            return;
        }
        self.pending = None;

        // A run already in flight keeps its slots
        if self.slots.iter().any(DrawerSlot::is_playing) {
            return;
        }
        for slot in &mut self.slots {
            slot.reset();
        }

        let spawn = style.spawn_variables();
        self.one_shot = spawn.play_once;
        if self.one_shot {
            self.one_shot_time_left = spawn.duration;
        }
    }

    fn roll_interval(&mut self, spawn: &SpawnVariables) -> f32 {
        spawn.duration / self.rng.range_int(spawn.emission_rate_min, spawn.emission_rate_max) as f32
    }

    fn check_spawn_time(&mut self, style: &S, frame: &FrameContext<'_>) {
        let spawn = style.spawn_variables();
        if self.interval.abs() < TOLERANCE {
            self.interval = self.roll_interval(spawn);
        }

        self.time_elapsed += frame.dt;
        if self.time_elapsed < self.interval {
            return;
        }

        let room = spawn.max_rain_spawn_count.saturating_sub(self.playing_count());
        let count = (self.time_elapsed / self.interval).min(room as f32) as usize;
        for _ in 0..count {
            self.spawn_one(style, frame);
        }

        self.interval = self.roll_interval(spawn);
        self.time_elapsed = 0.0;
    }

    fn spawn_one(&mut self, style: &S, frame: &FrameContext<'_>) {
        let Some(slot) = self.slots.iter_mut().find(|s| !s.is_playing()) else {
            return;
        };
        let spawn = style.spawn_variables();

        slot.elapsed = 0.0;
        slot.lifetime = self.rng.range(spawn.lifetime_min, spawn.lifetime_max);
        let position = spawn_local_position(
            frame.camera,
            &frame.parent,
            0.0,
            spawn.spawn_offset_y,
            &mut self.rng,
        );
        slot.local = Transform::from_position(position);
        slot.start_position = position;
        slot.fluctuation.reset();
        if let Some(trail) = slot.trail_mut() {
            trail.clear();
        }
        slot.hide();

        style.init_slot(slot, frame, &mut self.rng);
        slot.state = DrawState::Playing;
        self.total_spawned += 1;
    }
}

impl<S: DropStyle> RainController for SpawnScheduler<S> {
    type Settings = S;

    fn create(settings: &S, backend: &mut dyn RenderBackend, seed: u32) -> Self {
        Self::with_seed(settings, backend, seed)
    }

    fn play(&mut self, settings: &S) {
        self.pending = Some(PlayDelay {
            delay: settings.spawn_variables().delay,
            waited: 0.0,
        });
    }

    fn set_no_more_rain(&mut self, stop: bool) {
        self.no_more_rain = stop;
    }

    fn update_controller(
        &mut self,
        settings: &S,
        frame: &FrameContext<'_>,
        backend: &mut dyn RenderBackend,
    ) -> Result<()> {
        let dt = frame.dt;
        self.clock += dt;

        self.resolve_delay(settings, dt);
        self.reconcile_capacity(settings.spawn_variables().max_rain_spawn_count, backend);

        if self.no_more_rain {
            self.time_elapsed = 0.0;
        } else if self.one_shot {
            self.one_shot_time_left -= dt;
            if self.one_shot_time_left > 0.0 {
                self.check_spawn_time(settings, frame);
            }
        } else if self.pending.is_none() {
            self.check_spawn_time(settings, frame);
        }

        let now = self.clock;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.is_playing() || !slot.advance(dt) {
                continue;
            }
            settings.update_slot(slot, index, frame, now, &mut self.rng)?;
        }
        Ok(())
    }

    fn hide_all(&mut self) {
        for slot in &mut self.slots {
            slot.hide();
        }
    }

    fn is_playing(&self) -> bool {
        self.slots.iter().any(DrawerSlot::is_playing)
    }

    fn current_draw_call(&self) -> usize {
        self.slots.iter().filter(|s| s.is_enabled()).count()
    }
}
