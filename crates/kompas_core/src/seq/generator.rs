//! Pattern regeneration.
//!
//! Every channel shares the same density banding:
//!
//! - `density <= 2` clears the pattern,
//! - `2 < density < 1011` runs the channel's fill algorithm,
//! - anything above leaves the pattern as it was.
//!
//! Independently of the band, a dial turned past 1011 forces every step on.
//! That check reads the dial alone, so a control voltage can never trigger it.

use rand::Rng;

use super::pattern::{PatternStore, StepPattern};
use crate::dsp::rescale;
use crate::types::{Channel, PATTERN_LENGTH};

/// At or below this density the pattern is silent.
pub const SILENCE_MAX: i32 = 2;
/// Densities from here up no longer run the fill algorithm.
pub const SATURATION: i32 = 1011;
/// Dial values strictly above this turn every step on.
pub const FORCE_ON_PARAM: f32 = 1011.0;

pub const MIN_SPREAD: i32 = 1;
pub const MAX_SPREAD: i32 = 8;

/// Which band a regeneration fell into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Silence,
    Fill,
    Saturated,
}

impl Band {
    pub fn of(density: i32) -> Band {
        if density <= SILENCE_MAX {
            Band::Silence
        } else if density < SATURATION {
            Band::Fill
        } else {
            Band::Saturated
        }
    }
}

/// Inputs a regeneration reads besides the channel's own store.
#[derive(Debug, Clone, Copy)]
pub struct FillContext {
    pub density: i32,
    /// Raw dial value, used only for the force-on check.
    pub param: f32,
    /// Euclidean spread for the secondary channel.
    pub spread: usize,
    /// Patterns of the other channels as they stand this tick.
    pub primary: StepPattern,
    pub secondary: StepPattern,
}

/// Number of Euclidean onsets per half pattern for a given density.
#[inline]
pub fn euclidean_spread(density: i32) -> usize {
    let spread = rescale(density as f32, 0.0, 1021.0, MIN_SPREAD as f32, MAX_SPREAD as f32) as i32;
    spread.clamp(MIN_SPREAD, MAX_SPREAD) as usize
}

/// Euclidean spacing test for one step.
///
/// The step index is used as-is against the half length, for both halves.
#[inline]
pub fn euclidean_admits(step: usize, spread: usize) -> bool {
    (step * spread) % (PATTERN_LENGTH / 2) < spread
}

/// Regenerate `channel`'s pattern in place. Returns the band the density
/// fell into; on [`Band::Fill`] the store is flagged for fresh thresholds.
pub fn regenerate<R: Rng>(
    channel: Channel,
    store: &mut PatternStore,
    ctx: &FillContext,
    rng: &mut R,
) -> Band {
    let band = Band::of(ctx.density);
    match band {
        Band::Silence => store.pattern.fill(false),
        Band::Fill => {
            store.request_refresh();
            match channel {
                Channel::Primary => {
                    fill_direct(&mut store.pattern, &store.thresholds, ctx.density, rng)
                }
                Channel::Secondary => fill_euclidean(
                    &mut store.pattern,
                    &store.thresholds,
                    ctx.density,
                    ctx.spread,
                ),
                Channel::Derived => fill_correlated(
                    &mut store.pattern,
                    &store.thresholds,
                    ctx.density,
                    &ctx.primary,
                    &ctx.secondary,
                ),
            }
        }
        Band::Saturated => {}
    }

    if ctx.param > FORCE_ON_PARAM {
        store.pattern.fill(true);
    }

    band
}

#[inline]
fn passes(thresholds: &[u16; PATTERN_LENGTH], step: usize, density: i32) -> bool {
    (thresholds[step] as i32) < density
}

/// Each step is on when its threshold is below the density. One random step
/// is then forced on so the pattern is never empty.
pub fn fill_direct<R: Rng>(
    pattern: &mut StepPattern,
    thresholds: &[u16; PATTERN_LENGTH],
    density: i32,
    rng: &mut R,
) {
    for i in 0..PATTERN_LENGTH {
        pattern[i] = passes(thresholds, i, density);
    }
    pattern[rng.random_range(0..PATTERN_LENGTH)] = true;
}

/// Step 0 is always on. Every other step must pass both the Euclidean
/// spacing test and the threshold test.
pub fn fill_euclidean(
    pattern: &mut StepPattern,
    thresholds: &[u16; PATTERN_LENGTH],
    density: i32,
    spread: usize,
) {
    pattern[0] = true;
    for i in 1..PATTERN_LENGTH {
        pattern[i] = euclidean_admits(i, spread) && passes(thresholds, i, density);
    }
}

/// Steps where primary and secondary agree are thresholded, steps where
/// they disagree are off. The first agreeing step is then forced on.
pub fn fill_correlated(
    pattern: &mut StepPattern,
    thresholds: &[u16; PATTERN_LENGTH],
    density: i32,
    primary: &StepPattern,
    secondary: &StepPattern,
) {
    for i in 0..PATTERN_LENGTH {
        pattern[i] = primary[i] == secondary[i] && passes(thresholds, i, density);
    }

    if let Some(first) = (0..PATTERN_LENGTH).find(|&i| primary[i] == secondary[i]) {
        pattern[first] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(0x6b6f6d70)
    }

    fn pattern_from(f: impl Fn(usize) -> bool) -> StepPattern {
        let mut p = StepPattern::default();
        for i in 0..PATTERN_LENGTH {
            p[i] = f(i);
        }
        p
    }

    fn context(density: i32, param: f32) -> FillContext {
        FillContext {
            density,
            param,
            spread: euclidean_spread(density),
            primary: StepPattern::default(),
            secondary: StepPattern::default(),
        }
    }

    #[test]
    fn bands() {
        assert_eq!(Band::of(-4), Band::Silence);
        assert_eq!(Band::of(2), Band::Silence);
        assert_eq!(Band::of(3), Band::Fill);
        assert_eq!(Band::of(1010), Band::Fill);
        assert_eq!(Band::of(1011), Band::Saturated);
    }

    #[test]
    fn spread_range() {
        assert_eq!(euclidean_spread(0), 1);
        assert_eq!(euclidean_spread(145), 1);
        assert_eq!(euclidean_spread(146), 2);
        assert_eq!(euclidean_spread(1010), 7);
        assert_eq!(euclidean_spread(1021), 8);
        assert_eq!(euclidean_spread(2046), 8);
        assert_eq!(euclidean_spread(-10), 1);
    }

    #[test]
    fn euclidean_admission_is_periodic_per_half() {
        // spread 4 over 16 steps: every fourth step
        let admitted: Vec<usize> = (0..PATTERN_LENGTH)
            .filter(|&i| euclidean_admits(i, 4))
            .collect();
        assert_eq!(admitted, vec![0, 4, 8, 12, 16, 20, 24, 28]);

        let admitted: Vec<usize> = (0..16).filter(|&i| euclidean_admits(i, 3)).collect();
        assert_eq!(admitted, vec![0, 6, 11]);
    }

    #[test]
    fn direct_fill_thresholds() {
        let mut thresholds = [1000u16; PATTERN_LENGTH];
        thresholds[3] = 10;
        thresholds[9] = 499;
        thresholds[10] = 500;

        let mut p = StepPattern::default();
        fill_direct(&mut p, &thresholds, 500, &mut rng());
        assert!(p[3] && p[9]);
        // threshold equal to density is off
        let on = p.active_count();
        assert!((2..=3).contains(&on), "got {on} active steps");
    }

    #[test]
    fn direct_fill_never_empty() {
        let thresholds = [1010u16; PATTERN_LENGTH];
        let mut r = rng();
        for _ in 0..200 {
            let mut p = StepPattern::default();
            fill_direct(&mut p, &thresholds, 3, &mut r);
            assert_eq!(p.active_count(), 1);
        }
    }

    #[test]
    fn euclidean_fill_requires_both_tests() {
        let mut thresholds = [0u16; PATTERN_LENGTH];
        // step 8 is admitted by spacing but fails the threshold
        thresholds[8] = 900;
        // step 5 passes the threshold but is not admitted
        thresholds[5] = 0;

        let mut p = pattern_from(|_| true);
        fill_euclidean(&mut p, &thresholds, 500, 4);

        let on: Vec<usize> = (0..PATTERN_LENGTH).filter(|&i| p[i]).collect();
        assert_eq!(on, vec![0, 4, 12, 16, 20, 24, 28]);
    }

    #[test]
    fn euclidean_fill_keeps_first_step() {
        let thresholds = [1010u16; PATTERN_LENGTH];
        let mut p = StepPattern::default();
        fill_euclidean(&mut p, &thresholds, 3, 1);
        assert!(p[0]);
        assert_eq!(p.active_count(), 1);
    }

    #[test]
    fn correlated_fill_only_where_parents_agree() {
        let primary = pattern_from(|i| i % 2 == 0);
        let secondary = pattern_from(|i| i % 4 == 0);
        let thresholds = [0u16; PATTERN_LENGTH];

        let mut p = StepPattern::default();
        fill_correlated(&mut p, &thresholds, 500, &primary, &secondary);

        for i in 0..PATTERN_LENGTH {
            assert_eq!(p[i], primary[i] == secondary[i], "step {i}");
        }
    }

    #[test]
    fn correlated_fill_forces_only_first_match() {
        let primary = pattern_from(|i| i >= 5);
        let secondary = pattern_from(|i| i >= 5 || i == 0);
        // everything fails the threshold
        let thresholds = [1010u16; PATTERN_LENGTH];

        let mut p = StepPattern::default();
        fill_correlated(&mut p, &thresholds, 3, &primary, &secondary);

        // step 0 disagrees, step 1 is the first agreement
        let on: Vec<usize> = (0..PATTERN_LENGTH).filter(|&i| p[i]).collect();
        assert_eq!(on, vec![1]);
    }

    #[test]
    fn correlated_fill_disjoint_parents_is_silent() {
        let primary = pattern_from(|i| i % 2 == 0);
        let secondary = pattern_from(|i| i % 2 == 1);
        let thresholds = [0u16; PATTERN_LENGTH];

        let mut p = pattern_from(|_| true);
        fill_correlated(&mut p, &thresholds, 1000, &primary, &secondary);
        assert_eq!(p.active_count(), 0);
    }

    #[test]
    fn silence_band_clears() {
        let mut store = PatternStore::default();
        store.pattern.fill(true);
        let band = regenerate(Channel::Primary, &mut store, &context(2, 2.0), &mut rng());
        assert_eq!(band, Band::Silence);
        assert_eq!(store.pattern.active_count(), 0);
    }

    #[test]
    fn fill_band_requests_fresh_thresholds() {
        let mut store = PatternStore::default();
        store.refresh_thresholds(&mut rng());
        assert!(!store.needs_refresh());

        let band = regenerate(Channel::Secondary, &mut store, &context(400, 400.0), &mut rng());
        assert_eq!(band, Band::Fill);
        assert!(store.needs_refresh());
        assert!(store.pattern[0]);
    }

    #[test]
    fn saturated_band_leaves_pattern() {
        let mut store = PatternStore::default();
        store.refresh_thresholds(&mut rng());
        store.pattern[7] = true;
        let before = store.pattern;
        // dial at 600 with a large control voltage on top
        let band = regenerate(Channel::Derived, &mut store, &context(1400, 600.0), &mut rng());
        assert_eq!(band, Band::Saturated);
        assert_eq!(store.pattern, before);
        assert!(!store.needs_refresh());
    }

    #[test]
    fn dial_past_limit_forces_every_step() {
        for channel in Channel::ALL {
            let mut store = PatternStore::default();
            regenerate(channel, &mut store, &context(1012, 1012.0), &mut rng());
            assert_eq!(store.pattern.active_count(), PATTERN_LENGTH, "{channel}");
        }
    }

    #[test]
    fn force_on_reads_the_dial_not_the_density() {
        let mut store = PatternStore::default();
        regenerate(Channel::Primary, &mut store, &context(1012, 1011.0), &mut rng());
        assert_eq!(store.pattern.active_count(), 0);
    }
}
