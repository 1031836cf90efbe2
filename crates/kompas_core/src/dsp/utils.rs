/// Map a value from one range to another.
///
/// The input range must not be degenerate; callers only ever pass fixed,
/// non-empty ranges.
#[inline]
pub fn rescale(x: f32, x0: f32, x1: f32, y0: f32, y1: f32) -> f32 {
    let denom = x1 - x0;
    debug_assert!(denom.abs() >= f32::EPSILON, "degenerate input range");
    (x - x0) * (y1 - y0) / denom + y0
}

#[inline]
pub fn clamp(x: f32, lo: f32, hi: f32) -> f32 {
    // NaN collapses to the lower bound so a broken cable reads as 0V.
    if x.is_nan() {
        return lo;
    }
    x.max(lo).min(hi)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchmittState {
    Low,
    High,
    Uninitialized,
}

/// Reusable Schmitt trigger with hysteresis
#[derive(Debug, Clone, Copy)]
pub struct SchmittTrigger {
    pub state: SchmittState,
    low_threshold: f32,
    high_threshold: f32,
}

impl SchmittTrigger {
    /// Create a new Schmitt trigger with the given thresholds
    pub fn new(low_threshold: f32, high_threshold: f32) -> Self {
        Self {
            state: SchmittState::Uninitialized,
            low_threshold,
            high_threshold,
        }
    }

    /// Process a sample through the Schmitt trigger.
    /// Returns true if it toggled from low to high.
    ///
    /// The first sample only seeds the state, so a signal that is already
    /// high when processing starts does not count as an edge.
    pub fn process(&mut self, input: f32) -> bool {
        match self.state {
            SchmittState::Uninitialized => {
                if input >= self.high_threshold {
                    self.state = SchmittState::High;
                } else {
                    self.state = SchmittState::Low;
                }
            }
            SchmittState::High => {
                if input <= self.low_threshold {
                    self.state = SchmittState::Low;
                }
            }
            SchmittState::Low => {
                if input >= self.high_threshold {
                    self.state = SchmittState::High;
                    return true;
                }
            }
        }

        false
    }

    pub fn is_high(&self) -> bool {
        self.state == SchmittState::High
    }

    /// Reset state to Uninitialized
    pub fn reset(&mut self) {
        self.state = SchmittState::Uninitialized;
    }
}

/// Gate/trigger input thresholds, in volts.
pub const GATE_LOW_THRESHOLD: f32 = 0.1;
pub const GATE_HIGH_THRESHOLD: f32 = 2.0;

/// Rising-edge detector for clock, reset and trigger inputs.
///
/// Goes high at or above 2V and only re-arms once the input has dropped to
/// 0.1V or below, so noisy or slowly moving signals produce a single edge.
#[derive(Debug, Clone, Copy)]
pub struct EdgeDetector {
    trigger: SchmittTrigger,
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self {
            trigger: SchmittTrigger::new(GATE_LOW_THRESHOLD, GATE_HIGH_THRESHOLD),
        }
    }
}

impl EdgeDetector {
    #[inline]
    pub fn detect(&mut self, voltage: f32) -> bool {
        let voltage = if voltage.is_nan() { 0.0 } else { voltage };
        self.trigger.process(voltage)
    }

    #[inline]
    pub fn is_high(&self) -> bool {
        self.trigger.is_high()
    }

    pub fn reset(&mut self) {
        self.trigger.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescale() {
        assert!((rescale(0.5, 0.0, 1.0, -1.0, 1.0) - 0.0).abs() < 1e-6);
        assert!((rescale(5.0, 0.0, 10.0, 0.0, 1023.0) - 511.5).abs() < 1e-3);
        assert!((rescale(2.0, 0.1, 2.0, 0.0, 1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rescale_inverted_output() {
        assert!((rescale(0.25, 0.0, 1.0, 8.0, 0.0) - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-3.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(12.0, 0.0, 10.0), 10.0);
        assert_eq!(clamp(4.2, 0.0, 10.0), 4.2);
        assert_eq!(clamp(f32::NAN, 0.0, 5.0), 0.0);
    }

    #[test]
    fn schmitt_first_sample_seeds_state() {
        let mut t = SchmittTrigger::new(0.1, 2.0);
        assert!(!t.process(5.0));
        assert_eq!(t.state, SchmittState::High);
        assert!(!t.process(5.0));
    }

    #[test]
    fn schmitt_hysteresis() {
        let mut t = SchmittTrigger::new(0.1, 2.0);
        t.process(0.0);
        assert!(t.process(2.0));
        // Dipping into the dead zone does not re-arm
        assert!(!t.process(1.0));
        assert!(!t.process(3.0));
        assert!(!t.process(0.1));
        assert_eq!(t.state, SchmittState::Low);
        assert!(t.process(2.5));
    }

    #[test]
    fn edge_detector_fires_once_per_pulse() {
        let mut e = EdgeDetector::default();
        let signal = [0.0, 10.0, 10.0, 10.0, 0.0, 0.0, 10.0, 1.5, 10.0];
        let edges: Vec<bool> = signal.iter().map(|&v| e.detect(v)).collect();
        assert_eq!(
            edges,
            vec![false, true, false, false, false, false, true, false, false]
        );
    }

    #[test]
    fn edge_detector_ignores_chatter_below_threshold() {
        let mut e = EdgeDetector::default();
        e.detect(0.0);
        for v in [0.5, 1.9, 0.3, 1.99, 0.2] {
            assert!(!e.detect(v));
        }
        assert!(!e.is_high());
    }

    #[test]
    fn edge_detector_treats_nan_as_low() {
        let mut e = EdgeDetector::default();
        e.detect(0.0);
        assert!(e.detect(5.0));
        assert!(!e.detect(f32::NAN));
        assert!(!e.is_high());
    }
}
