//! Drizzle Runtime - Frame loop contract
//!
//! Provides the pieces a host needs to drive the effect once per frame:
//! - `FrameClock` : wall-clock or manually stepped frame timer
//! - `RuntimeSystem` : trait for systems ticked by the host loop

mod clock;
mod system;

pub use clock::FrameClock;
pub use system::RuntimeSystem;
