use crate::config::{CvMode, CvRange};
use crate::dsp::{clamp, rescale};
use crate::types::PARAM_MAX;

/// Density must move strictly further than this from the baseline before a
/// channel regenerates.
pub const DEAD_BAND: i32 = 2;

/// Map a control voltage onto the 0–1023 dial domain.
///
/// In [`CvMode::Reset`] the inputs are triggers and contribute nothing.
#[inline]
pub fn rescale_cv(voltage: f32, mode: CvMode, range: CvRange) -> i32 {
    match mode {
        CvMode::Density => {
            let max = range.max_voltage();
            rescale(clamp(voltage, 0.0, max), 0.0, max, 0.0, PARAM_MAX) as i32
        }
        CvMode::Reset => 0,
    }
}

/// Per-channel density: the dial plus the rescaled control voltage, read on
/// every clock edge.
///
/// The baseline is the density recorded at the last regeneration. It only
/// moves when the caller commits, so hysteresis is measured against the
/// pattern that is actually playing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DensityTracker {
    density: i32,
    baseline: i32,
}

impl DensityTracker {
    /// Take a new reading. Returns the combined density.
    #[inline]
    pub fn read(&mut self, param: f32, rescaled_cv: i32) -> i32 {
        let param = clamp(param, 0.0, PARAM_MAX);
        self.density = (param + rescaled_cv as f32) as i32;
        self.density
    }

    #[inline]
    pub fn density(&self) -> i32 {
        self.density
    }

    #[inline]
    pub fn baseline(&self) -> i32 {
        self.baseline
    }

    /// True once the density has left the dead band around the baseline.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.density > self.baseline + DEAD_BAND || self.density < self.baseline - DEAD_BAND
    }

    /// Accept the current density as the new baseline.
    #[inline]
    pub fn commit(&mut self) {
        self.baseline = self.density;
    }

    /// Force the baseline to a specific value.
    #[inline]
    pub fn commit_baseline(&mut self, baseline: i32) {
        self.baseline = baseline;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cv_rescales_per_range() {
        assert_eq!(rescale_cv(10.0, CvMode::Density, CvRange::Legacy), 1023);
        assert_eq!(rescale_cv(5.0, CvMode::Density, CvRange::Legacy), 511);
        assert_eq!(rescale_cv(5.0, CvMode::Density, CvRange::Revised), 1023);
        assert_eq!(rescale_cv(2.5, CvMode::Density, CvRange::Revised), 511);
    }

    #[test]
    fn cv_is_clamped() {
        assert_eq!(rescale_cv(-4.0, CvMode::Density, CvRange::Legacy), 0);
        assert_eq!(rescale_cv(12.0, CvMode::Density, CvRange::Legacy), 1023);
        assert_eq!(rescale_cv(8.0, CvMode::Density, CvRange::Revised), 1023);
    }

    #[test]
    fn cv_ignored_in_reset_mode() {
        assert_eq!(rescale_cv(10.0, CvMode::Reset, CvRange::Legacy), 0);
    }

    #[test]
    fn density_is_param_plus_cv() {
        let mut d = DensityTracker::default();
        assert_eq!(d.read(300.7, 200), 500);
        assert_eq!(d.read(1023.0, 1023), 2046);
        // Dials outside their range are clamped before use
        assert_eq!(d.read(-50.0, 0), 0);
    }

    #[test]
    fn dead_band_is_strict() {
        let mut d = DensityTracker::default();
        d.read(100.0, 0);
        d.commit();

        for v in 98..=102 {
            d.read(v as f32, 0);
            assert!(!d.is_dirty(), "{v} should be inside the dead band");
        }
        d.read(103.0, 0);
        assert!(d.is_dirty());
        d.read(97.0, 0);
        assert!(d.is_dirty());
    }

    #[test]
    fn baseline_moves_only_on_commit() {
        let mut d = DensityTracker::default();
        d.read(400.0, 0);
        assert_eq!(d.baseline(), 0);
        assert!(d.is_dirty());
        d.commit();
        assert_eq!(d.baseline(), 400);
        assert!(!d.is_dirty());
        d.commit_baseline(0);
        assert!(d.is_dirty());
    }
}
