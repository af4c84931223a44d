//! Scene transitions over a simulation kernel.
//!
//! A scene assigns every node a [`NodeRule`]; [`SceneEngine`] eases rendered
//! positions from one scene to the next while the kernel keeps running.

mod config;
mod easing;
mod engine;

pub use config::{NodeRule, SceneConfig};
pub use easing::Easing;
pub use engine::{Phase, SceneEngine, TargetSampling, TransitionOptions, TransitionState};
