//! Persisted engine configuration.
//!
//! Stored as camelCase JSON. The two mode enums are written as plain
//! integers; unknown or malformed values read back as the default variant
//! instead of failing the whole load.

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{Channel, NUM_CHANNELS, PARAM_MAX};

/// How the per-channel control inputs are interpreted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CvMode {
    /// Control voltage is added to the dial value to form the density.
    #[default]
    Density = 0,
    /// Rising edges on a control input reset that channel's cursor; the
    /// voltage does not contribute to density.
    Reset = 1,
}

/// Voltage span of the control inputs in [`CvMode::Density`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CvRange {
    /// 0–10V maps onto the full dial range.
    Legacy = 0,
    /// 0–5V maps onto the full dial range.
    #[default]
    Revised = 1,
}

impl CvRange {
    pub fn max_voltage(self) -> f32 {
        match self {
            CvRange::Legacy => 10.0,
            CvRange::Revised => 5.0,
        }
    }
}

macro_rules! int_enum_serde {
    ($ty:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        impl $ty {
            pub fn from_int(value: i64) -> Option<Self> {
                match value {
                    $($value => Some($ty::$variant),)+
                    _ => None,
                }
            }

            pub fn as_int(self) -> i64 {
                self as i64
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_i64(self.as_int())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let value = serde_json::Value::deserialize(deserializer)?;
                let parsed = value.as_i64().and_then($ty::from_int);
                if parsed.is_none() {
                    tracing::warn!(%value, kind = stringify!($ty), "invalid config value, using default");
                }
                Ok(parsed.unwrap_or_default())
            }
        }
    };
}

int_enum_serde!(CvMode { Density = 0, Reset = 1 });
int_enum_serde!(CvRange { Legacy = 0, Revised = 1 });

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Density dial per channel (primary, secondary, derived), 0–1023
    pub params: [f32; NUM_CHANNELS],
    /// 0 = control inputs add to density, 1 = control inputs reset channels
    #[schemars(with = "i64")]
    pub cv_mode: CvMode,
    /// 0 = 0–10V control range, 1 = 0–5V control range
    #[schemars(with = "i64")]
    pub cv_range: CvRange,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            params: [0.0; NUM_CHANNELS],
            cv_mode: CvMode::default(),
            cv_range: CvRange::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: EngineConfig =
            serde_json::from_str(json).context("failed to parse engine config")?;
        config.sanitize();
        Ok(config)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let mut config: EngineConfig =
            serde_json::from_value(value).context("failed to parse engine config")?;
        config.sanitize();
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to serialize engine config")
    }

    pub fn param(&self, channel: Channel) -> f32 {
        self.params[channel.index()]
    }

    pub fn set_param(&mut self, channel: Channel, value: f32) {
        self.params[channel.index()] = sanitize_param(value);
    }

    fn sanitize(&mut self) {
        for p in self.params.iter_mut() {
            *p = sanitize_param(*p);
        }
    }
}

fn sanitize_param(value: f32) -> f32 {
    crate::dsp::clamp(value, 0.0, PARAM_MAX)
}
