//! Drizzle Core - Foundational types for the rain-drop effect
//!
//! This crate provides the types that all other Drizzle crates depend on:
//! - `Transform`, `Color` - Spatial and colour value types
//! - `StackPool` - LIFO free-list pool for reusable value objects
//! - Error types and Result alias

mod error;
mod pool;
mod types;

pub use error::{DrizzleError, Result};
pub use pool::StackPool;
pub use types::{Color, Transform, TOLERANCE};

pub use glam::{Quat, Vec2, Vec3};
