//! Fixed-window running mean

use std::collections::VecDeque;

/// Mean over the most recent `window` samples
#[derive(Debug, Clone)]
pub struct RollingMean {
    samples: VecDeque<f64>,
    sum: f64,
    window: usize,
}

impl RollingMean {
    /// Empty accumulator over `window` samples
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(window + 1),
            sum: 0.0,
            window,
        }
    }

    /// Add a sample, evicting the oldest once the window is full
    pub fn push(&mut self, value: f64) {
        self.samples.push_back(value);
        self.sum += value;
        let evicted = if self.samples.len() > self.window {
            self.samples.pop_front()
        } else {
            None
        };
        if let Some(oldest) = evicted {
            self.sum -= oldest;
        }
    }

    /// Samples currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True before the first sample
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sum of the held samples
    #[must_use]
    pub const fn sum(&self) -> f64 {
        self.sum
    }

    /// Mean of the held samples
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> Option<f64> {
        (!self.samples.is_empty()).then(|| self.sum / self.samples.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_window_evicts_oldest() {
        let mut acc = RollingMean::new(3);
        assert_eq!(acc.mean(), None);
        for x in [1.0, 2.0, 3.0] {
            acc.push(x);
        }
        assert_approx_eq(acc.mean().unwrap_or_default(), 2.0, 1e-12);
        acc.push(10.0);
        assert_eq!(acc.len(), 3);
        assert_approx_eq(acc.sum(), 15.0, 1e-12);
        assert_approx_eq(acc.mean().unwrap_or_default(), 5.0, 1e-12);
    }
}
