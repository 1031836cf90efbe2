//! Kompas rhythm engine core library
//!
//! Generates three correlated 32-step gate patterns from a clock, a reset
//! and three density controls. The engine is processed one sample at a time
//! and never allocates or blocks, so it can be driven from an audio thread.
//! It is a pure library with no I/O; hosting, panels and persistence of the
//! surrounding module belong to the caller.

pub mod config;
pub mod dsp;
pub mod seq;
pub mod types;

// Re-export commonly used items
pub use config::{CvMode, CvRange, EngineConfig};
pub use seq::{SequencerEngine, StepPattern};
pub use types::{
    Channel, EngineInputs, EngineOutputs, FULL_SCALE, NUM_CHANNELS, PATTERN_LENGTH,
};

/// JSON schema of the persisted configuration.
pub fn config_schema() -> schemars::Schema {
    schemars::schema_for!(EngineConfig)
}
