//! Signal primitives shared by the sequencer: range mapping, gate edge
//! detection, one-shot pulses and indicator smoothing.

pub mod pulse;
pub mod utils;

pub use pulse::{PulseGenerator, SmoothLight};
pub use utils::{EdgeDetector, SchmittState, SchmittTrigger, clamp, rescale};
