//! Drizzle Rain - rain-drop spawn, lifecycle and motion simulation
//!
//! Provides the simulation core of the effect:
//! - Pooled drawer slots cycling Disabled -> Playing -> Disabled
//! - Emission-rate spawn throttling with one-shot, delay and graceful stop
//! - Elastic slot pools that follow live capacity edits
//! - Gravity-projected motion, friction-map lateral drag and pooled path trails
//! - Flow, friction-flow, simple and static styles under one camera rig

pub mod behaviour;
pub mod camera_controller;
pub mod curves;
pub mod frame;
pub mod motion;
pub mod rand;
pub mod scheduler;
pub mod slot;
pub mod static_rain;
pub mod styles;
pub mod trail;
pub mod variables;

pub use behaviour::{
    Behaviour, FlowRainBehaviour, FrictionFlowRainBehaviour, RainBehaviour, RainController, RainSettings,
    SimpleRainBehaviour, StaticRainBehaviour,
};
pub use camera_controller::{build_behaviour, RainCameraController};
pub use curves::{Keyframe, RainCurve};
pub use frame::{FrameContext, FrameParams};
pub use rand::RainRng;
pub use scheduler::{DropStyle, SpawnScheduler};
pub use slot::{DrawState, DrawerSlot};
pub use static_rain::StaticRainController;
pub use styles::FrictionFlowStyle;
pub use trail::{PathNode, PathTrail};
pub use variables::{
    BehaviourConfig, BehaviourStyle, CameraConfig, FlowRainVariables, FrictionFlowRainVariables, RainConfig,
    ShadingVariables, SimpleRainVariables, SpawnVariables, StaticRainVariables,
};
