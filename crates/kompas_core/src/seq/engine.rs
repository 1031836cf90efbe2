use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::density::{DensityTracker, rescale_cv};
use super::generator::{self, Band, FillContext, SATURATION, euclidean_spread};
use super::pattern::{PatternStore, StepPattern};
use crate::config::{CvMode, CvRange, EngineConfig};
use crate::dsp::utils::{GATE_HIGH_THRESHOLD, GATE_LOW_THRESHOLD};
use crate::dsp::{EdgeDetector, PulseGenerator, SmoothLight, rescale};
use crate::types::{
    Channel, EngineInputs, EngineOutputs, FULL_SCALE, INDICATOR_PULSE, NUM_CHANNELS,
};

#[derive(Debug, Clone, Default)]
struct ChannelState {
    store: PatternStore,
    density: DensityTracker,
    /// Only used in [`CvMode::Reset`].
    cv_trigger: EdgeDetector,
    changed_pulse: PulseGenerator,
    step_light: SmoothLight,
    changed_light: SmoothLight,
}

/// Three-channel rhythm generator, processed one sample at a time.
///
/// `process` never allocates and does a fixed amount of work per call, so it
/// can run directly inside an audio callback.
pub struct SequencerEngine<R: Rng = SmallRng> {
    config: EngineConfig,
    rng: R,
    channels: [ChannelState; NUM_CHANNELS],
    clock: EdgeDetector,
    reset: EdgeDetector,
    reset_pulse: PulseGenerator,
    reset_light: SmoothLight,
    spread: usize,
    outputs: EngineOutputs,
}

impl SequencerEngine<SmallRng> {
    /// Engine seeded from the operating system.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_rng(config, SmallRng::from_os_rng())
    }

    /// Deterministic engine, for tests and offline rendering.
    pub fn with_seed(config: EngineConfig, seed: u64) -> Self {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }
}

impl Default for SequencerEngine<SmallRng> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<R: Rng> SequencerEngine<R> {
    pub fn with_rng(config: EngineConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            channels: Default::default(),
            clock: EdgeDetector::default(),
            reset: EdgeDetector::default(),
            reset_pulse: PulseGenerator::default(),
            reset_light: SmoothLight::default(),
            spread: generator::MIN_SPREAD as usize,
            outputs: EngineOutputs::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.set_cv_mode(config.cv_mode);
        self.config = config;
    }

    pub fn set_param(&mut self, channel: Channel, value: f32) {
        self.config.set_param(channel, value);
    }

    /// Switching modes re-arms the per-channel triggers, so a voltage that
    /// is already high at the switch is not taken as a reset.
    pub fn set_cv_mode(&mut self, mode: CvMode) {
        if self.config.cv_mode != mode {
            for ch in self.channels.iter_mut() {
                ch.cv_trigger.reset();
            }
        }
        self.config.cv_mode = mode;
    }

    pub fn set_cv_range(&mut self, range: CvRange) {
        self.config.cv_range = range;
    }

    pub fn pattern(&self, channel: Channel) -> &StepPattern {
        &self.channels[channel.index()].store.pattern
    }

    pub fn cursor(&self, channel: Channel) -> usize {
        self.channels[channel.index()].store.cursor()
    }

    pub fn density(&self, channel: Channel) -> i32 {
        self.channels[channel.index()].density.density()
    }

    /// Euclidean spread derived from the secondary density on the last clock.
    pub fn spread(&self) -> usize {
        self.spread
    }

    pub fn clock_high(&self) -> bool {
        self.clock.is_high()
    }

    pub fn outputs(&self) -> &EngineOutputs {
        &self.outputs
    }

    /// Advance the engine by one sample.
    pub fn process(&mut self, inputs: &EngineInputs, sample_time: f32) -> &EngineOutputs {
        profiling::scope!("kompas_process");

        self.refresh_thresholds();

        if self.reset.detect(inputs.reset) {
            for ch in self.channels.iter_mut() {
                ch.store.rewind();
            }
            self.reset_pulse.trigger(INDICATOR_PULSE);
        }

        if self.config.cv_mode == CvMode::Reset {
            for (ch, &cv) in self.channels.iter_mut().zip(inputs.cv.iter()) {
                if ch.cv_trigger.detect(cv) {
                    ch.store.rewind();
                }
            }
        }

        if self.clock.detect(inputs.clock) {
            self.on_clock(inputs);
        }

        // Every channel regenerates before any output is written, so all
        // three outputs of a tick come from the same generation.
        self.regenerate();

        self.write_outputs(inputs, sample_time);
        &self.outputs
    }

    /// Draw thresholds for channels that regenerated on the previous tick.
    fn refresh_thresholds(&mut self) {
        for (channel, ch) in Channel::ALL.into_iter().zip(self.channels.iter_mut()) {
            if ch.store.needs_refresh() {
                tracing::trace!(%channel, "refreshing thresholds");
                ch.store.refresh_thresholds(&mut self.rng);
                ch.changed_pulse.trigger(INDICATOR_PULSE);
            }
        }
    }

    fn on_clock(&mut self, inputs: &EngineInputs) {
        let EngineConfig {
            params,
            cv_mode,
            cv_range,
        } = self.config;

        for (i, ch) in self.channels.iter_mut().enumerate() {
            ch.store.advance();
            let cv = rescale_cv(inputs.cv[i], cv_mode, cv_range);
            ch.density.read(params[i], cv);
        }

        self.spread = euclidean_spread(self.density(Channel::Secondary));

        tracing::trace!(
            cursor = self.cursor(Channel::Primary),
            primary = self.density(Channel::Primary),
            secondary = self.density(Channel::Secondary),
            derived = self.density(Channel::Derived),
            spread = self.spread,
            "clock"
        );
    }

    fn regenerate(&mut self) {
        for channel in Channel::FILL_ORDER {
            let i = channel.index();
            if !self.channels[i].density.is_dirty() {
                continue;
            }

            let ctx = FillContext {
                density: self.channels[i].density.density(),
                param: self.config.params[i],
                spread: self.spread,
                primary: self.channels[Channel::Primary.index()].store.pattern,
                secondary: self.channels[Channel::Secondary.index()].store.pattern,
            };

            let ch = &mut self.channels[i];
            ch.density.commit();
            let band = generator::regenerate(channel, &mut ch.store, &ctx, &mut self.rng);
            if channel == Channel::Primary && band == Band::Silence {
                ch.density.commit_baseline(0);
            }

            tracing::debug!(
                %channel,
                density = ctx.density,
                ?band,
                pattern = %ch.store.pattern,
                "regenerated pattern"
            );
        }
    }

    fn write_outputs(&mut self, inputs: &EngineInputs, sample_time: f32) {
        let clock_high = self.clock.is_high();
        let EngineConfig {
            cv_mode, cv_range, ..
        } = self.config;

        for (i, ch) in self.channels.iter_mut().enumerate() {
            // A control voltage at the top of its range turns the step on
            // regardless of the pattern.
            let cv_forced = rescale_cv(inputs.cv[i], cv_mode, cv_range) > SATURATION;
            let step = ch.store.current_step() || cv_forced;
            let gated = step && clock_high;

            self.outputs.steps[i] = if gated { FULL_SCALE } else { 0.0 };

            ch.step_light.set_smooth(if gated { 1.0 } else { 0.0 }, sample_time);
            let changed = ch.changed_pulse.process(sample_time);
            ch.changed_light.set_smooth(if changed { 1.0 } else { 0.0 }, sample_time);
            self.outputs.step_lights[i] = ch.step_light.value();
            self.outputs.changed_lights[i] = ch.changed_light.value();
        }

        let reset = self.reset_pulse.process(sample_time);
        self.reset_light.set_smooth(if reset { 1.0 } else { 0.0 }, sample_time);
        self.outputs.reset_light = self.reset_light.value();
        self.outputs.clock_light = rescale(
            inputs.clock,
            GATE_LOW_THRESHOLD,
            GATE_HIGH_THRESHOLD,
            0.0,
            1.0,
        )
        .clamp(0.0, 1.0);
    }
}
