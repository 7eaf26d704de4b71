//! Runtime system trait

use drizzle_core::Result;

/// A system that can be ticked by the host frame loop
///
/// Everything runs on the host's update callback; no call ever blocks and two
/// updates never overlap.
pub trait RuntimeSystem {
    /// Called once when the system is first registered
    fn initialize(&mut self) -> Result<()>;

    /// Called once per frame with the frame's delta time in seconds
    fn update(&mut self, dt: f64) -> Result<()>;

    /// Called when the system is being shut down
    fn shutdown(&mut self) -> Result<()>;

    /// Human-readable name for this system
    fn name(&self) -> &str;
}
