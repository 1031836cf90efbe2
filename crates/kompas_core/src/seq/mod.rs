//! The rhythm sequencer: per-channel density tracking, pattern storage,
//! the regeneration algorithms and the per-sample engine that ties them
//! together.

pub mod density;
pub mod engine;
pub mod generator;
pub mod pattern;

pub use density::DensityTracker;
pub use engine::SequencerEngine;
pub use generator::{Band, FillContext};
pub use pattern::{PatternStore, StepPattern};
