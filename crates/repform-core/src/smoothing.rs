//! Exponential moving average over angle vectors.
//!
//! [`smooth`] is a pure function; the running state lives in a
//! [`SmoothedState`] owned by exactly one stream. Smoothing is only meaningful
//! when frames are fed in arrival order.

use crate::angles::{AngleLayout, AngleVector, ANGLE_COUNT};
use crate::error::{Error, Result};

/// Weight of the newest sample used by the live trainer
pub const DEFAULT_ALPHA: f64 = 0.2;

/// Blend `curr` into `prev`: `alpha * curr + (1 - alpha) * prev`.
///
/// With no previous value the current vector is returned unchanged. `alpha`
/// is clamped to [0, 1] so the result stays a convex combination of two
/// valid vectors and therefore valid itself.
pub fn smooth<L: AngleLayout>(
    prev: Option<AngleVector<L>>,
    curr: AngleVector<L>,
    alpha: f64,
) -> AngleVector<L> {
    let Some(prev) = prev else {
        return curr;
    };

    let alpha = if alpha.is_nan() { 1.0 } else { alpha.clamp(0.0, 1.0) };
    let p = prev.values();
    let c = curr.values();
    let mut out = [0.0; ANGLE_COUNT];
    for i in 0..ANGLE_COUNT {
        out[i] = (alpha * c[i] + (1.0 - alpha) * p[i]).clamp(0.0, 180.0);
    }
    AngleVector::new_unchecked(out)
}

/// Per-stream smoothing state
#[derive(Debug, Clone)]
pub struct SmoothedState<L: AngleLayout> {
    previous: Option<AngleVector<L>>,
    alpha: f64,
}

impl<L: AngleLayout> SmoothedState<L> {
    /// `alpha` must lie in (0, 1].
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::Config(format!(
                "smoothing alpha must be in (0, 1], got {}",
                alpha
            )));
        }
        Ok(Self {
            previous: None,
            alpha,
        })
    }

    /// Fold a new valid frame into the state and return the smoothed vector
    pub fn update(&mut self, curr: AngleVector<L>) -> AngleVector<L> {
        let next = smooth(self.previous, curr, self.alpha);
        self.previous = Some(next);
        next
    }

    pub fn current(&self) -> Option<AngleVector<L>> {
        self.previous
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

impl<L: AngleLayout> Default for SmoothedState<L> {
    fn default() -> Self {
        Self {
            previous: None,
            alpha: DEFAULT_ALPHA,
        }
    }
}
