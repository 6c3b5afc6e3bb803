/// Running statistics for one sampled quantity.
///
/// Only the count and the exact integer sums are stored; mean, variance and the normalized standard deviation are
/// recomputed from them whenever they are asked for, so they can never drift away from the samples.
///
/// The convergence statistic divides the standard deviation by the sample count itself rather than by its square
/// root. It is a stopping heuristic, not a standard error: it shrinks monotonically with the number of samples for a
/// stable process and so eventually drops below any positive precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Var {
    current: u64,
    count: u64,
    sum: u128,
    sum_of_squares: u128,
}

impl Var {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sample.
    pub fn record(&mut self, value: u64) {
        let wide = u128::from(value);
        self.current = value;
        self.count += 1;
        self.sum += wide;
        self.sum_of_squares += wide * wide;
    }

    /// Record the current working sample again.
    pub fn resample(&mut self) {
        self.record(self.current);
    }

    /// Replace the working sample without recording it.
    pub fn set_current(&mut self, value: u64) {
        self.current = value;
    }

    /// The latest observed (or working) value.
    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Arithmetic mean of every recorded sample, zero before the first one.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum as f64 / self.count as f64
    }

    /// Biased (population) variance. Cancellation can leave this marginally below zero.
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        self.sum_of_squares as f64 / self.count as f64 - mean * mean
    }

    /// `sqrt(|variance|) / count`, or infinity when nothing was recorded yet.
    pub fn normalized_std_dev(&self) -> f64 {
        if self.count == 0 {
            return f64::INFINITY;
        }
        self.variance().abs().sqrt() / self.count as f64
    }

    pub fn has_converged(&self, precision: f64) -> bool {
        self.normalized_std_dev() <= precision
    }
}
