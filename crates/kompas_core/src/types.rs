use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of steps in every channel's pattern.
pub const PATTERN_LENGTH: usize = 32;

/// Number of rhythm channels.
pub const NUM_CHANNELS: usize = 3;

/// Upper bound of the density dials.
pub const PARAM_MAX: f32 = 1023.0;

/// Voltage emitted for an active step while the clock is high.
pub const FULL_SCALE: f32 = 10.0;

/// Length of the "pattern changed" and reset indicator pulses, in seconds.
pub const INDICATOR_PULSE: f32 = 0.01;

/// The three rhythm channels.
///
/// A channel's role decides how its pattern is filled: `Primary` by direct
/// thresholding, `Secondary` through a Euclidean spacing filter, and
/// `Derived` from where the other two coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    Primary,
    Secondary,
    Derived,
}

impl Channel {
    pub const ALL: [Channel; NUM_CHANNELS] = [Channel::Primary, Channel::Secondary, Channel::Derived];

    /// Regeneration order within a tick. `Derived` reads the other two
    /// patterns and therefore always runs last.
    pub const FILL_ORDER: [Channel; NUM_CHANNELS] =
        [Channel::Secondary, Channel::Primary, Channel::Derived];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Channel::Primary => 0,
            Channel::Secondary => 1,
            Channel::Derived => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Primary => "primary",
            Channel::Secondary => "secondary",
            Channel::Derived => "derived",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Continuous input voltages for one sample.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct EngineInputs {
    /// Control voltage per channel, indexed by [`Channel::index`].
    pub cv: [f32; NUM_CHANNELS],
    pub reset: f32,
    pub clock: f32,
}

impl EngineInputs {
    pub fn clock(clock: f32) -> Self {
        Self {
            clock,
            ..Default::default()
        }
    }

    pub fn with_cv(mut self, channel: Channel, voltage: f32) -> Self {
        self.cv[channel.index()] = voltage;
        self
    }

    pub fn with_reset(mut self, reset: f32) -> Self {
        self.reset = reset;
        self
    }
}

/// Everything the engine emits for one sample.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct EngineOutputs {
    /// Step output per channel: 0V or [`FULL_SCALE`].
    pub steps: [f32; NUM_CHANNELS],
    /// Current-step brightness per channel.
    pub step_lights: [f32; NUM_CHANNELS],
    /// "Pattern changed" brightness per channel.
    pub changed_lights: [f32; NUM_CHANNELS],
    pub reset_light: f32,
    pub clock_light: f32,
}

impl EngineOutputs {
    #[inline]
    pub fn step(&self, channel: Channel) -> f32 {
        self.steps[channel.index()]
    }
}
