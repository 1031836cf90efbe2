use rand::Rng;
use std::fmt;
use std::ops::{Index, IndexMut};

use crate::types::PATTERN_LENGTH;

/// Exclusive upper bound of the random thresholds; draws are in 0..=1010.
pub const THRESHOLD_LIMIT: u16 = 1011;

/// A fixed-length on/off step pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPattern([bool; PATTERN_LENGTH]);

impl Default for StepPattern {
    fn default() -> Self {
        Self([false; PATTERN_LENGTH])
    }
}

impl StepPattern {
    #[inline]
    pub fn fill(&mut self, value: bool) {
        self.0 = [value; PATTERN_LENGTH];
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    pub fn active_count(&self) -> usize {
        self.0.iter().filter(|&&s| s).count()
    }
}

impl Index<usize> for StepPattern {
    type Output = bool;

    #[inline]
    fn index(&self, index: usize) -> &bool {
        &self.0[index]
    }
}

impl IndexMut<usize> for StepPattern {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut bool {
        &mut self.0[index]
    }
}

/// Renders as `1 0 0 1 ...`.
impl fmt::Display for StepPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(if *step { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Per-channel sequencing state: the active pattern, the thresholds the
/// next regeneration will read, and the step cursor.
#[derive(Debug, Clone)]
pub struct PatternStore {
    pub pattern: StepPattern,
    pub thresholds: [u16; PATTERN_LENGTH],
    cursor: usize,
    needs_refresh: bool,
}

impl Default for PatternStore {
    fn default() -> Self {
        Self {
            pattern: StepPattern::default(),
            thresholds: [0; PATTERN_LENGTH],
            cursor: 0,
            // Thresholds are drawn on the very first tick.
            needs_refresh: true,
        }
    }
}

impl PatternStore {
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % PATTERN_LENGTH;
    }

    /// Park the cursor on the last step so the next advance lands on step 0.
    #[inline]
    pub fn rewind(&mut self) {
        self.cursor = PATTERN_LENGTH - 1;
    }

    #[inline]
    pub fn current_step(&self) -> bool {
        self.pattern[self.cursor]
    }

    #[inline]
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    /// Ask for fresh thresholds before the next regeneration reads them.
    #[inline]
    pub fn request_refresh(&mut self) {
        self.needs_refresh = true;
    }

    /// Redraw every threshold uniformly in 0..=1010 and clear the request.
    pub fn refresh_thresholds<R: Rng>(&mut self, rng: &mut R) {
        for t in self.thresholds.iter_mut() {
            *t = rng.random_range(0..THRESHOLD_LIMIT);
        }
        self.needs_refresh = false;
    }
}
