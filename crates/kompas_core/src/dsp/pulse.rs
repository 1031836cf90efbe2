/// One-shot pulse that stays high for a fixed amount of time after being
/// triggered. Retriggering extends the pulse but never shortens it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PulseGenerator {
    remaining: f32,
}

impl PulseGenerator {
    pub fn trigger(&mut self, duration: f32) {
        if duration > self.remaining {
            self.remaining = duration;
        }
    }

    /// Advance by `delta_time` seconds; returns whether the pulse is high
    /// for this sample.
    pub fn process(&mut self, delta_time: f32) -> bool {
        if self.remaining > 0.0 {
            self.remaining -= delta_time;
            true
        } else {
            false
        }
    }
}

/// Decay time constant for indicator brightness, in seconds.
const LIGHT_DECAY_TIME: f32 = 0.1;

/// Indicator brightness in 0..=1 with an instant attack and an exponential
/// release, so single-sample pulses remain visible.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmoothLight {
    value: f32,
}

impl SmoothLight {
    pub fn set_smooth(&mut self, target: f32, delta_time: f32) {
        let target = target.clamp(0.0, 1.0);
        if target >= self.value {
            self.value = target;
        } else {
            let k = (delta_time / LIGHT_DECAY_TIME).min(1.0);
            self.value += (target - self.value) * k;
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 48_000.0;

    #[test]
    fn pulse_lasts_for_duration() {
        let mut p = PulseGenerator::default();
        assert!(!p.process(DT));

        p.trigger(0.01);
        let high = (0..1000).filter(|_| p.process(DT)).count();
        // 10ms at 48kHz
        assert!((480..=481).contains(&high), "pulse was high for {high} samples");
        assert!(!p.process(DT));
    }

    #[test]
    fn retrigger_does_not_shorten() {
        let mut p = PulseGenerator::default();
        p.trigger(0.01);
        p.trigger(0.001);
        let high = (0..1000).filter(|_| p.process(DT)).count();
        assert!(high >= 480);
    }

    #[test]
    fn light_attacks_instantly_and_decays() {
        let mut l = SmoothLight::default();
        l.set_smooth(1.0, DT);
        assert_eq!(l.value(), 1.0);

        l.set_smooth(0.0, DT);
        assert!(l.value() < 1.0 && l.value() > 0.9);

        for _ in 0..48_000 {
            l.set_smooth(0.0, DT);
        }
        assert!(l.value() < 1e-3);
    }

    #[test]
    fn light_is_clamped() {
        let mut l = SmoothLight::default();
        l.set_smooth(4.0, DT);
        assert_eq!(l.value(), 1.0);
        // a step longer than the decay time lands on the target
        l.set_smooth(-1.0, 1.0);
        assert_eq!(l.value(), 0.0);
    }
}
