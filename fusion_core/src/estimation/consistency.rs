// fusion_core/src/estimation/consistency.rs

//! Filter consistency bookkeeping based on the normalized innovation squared (NIS).
//!
//! For a consistent filter the NIS of an `m`-dimensional measurement follows a χ²
//! distribution with `m` degrees of freedom, so roughly 5 % of the samples should land
//! above the 95 % quantile. Many more means the noise is tuned too low; far fewer means
//! it is tuned too high.

/// The 95 % quantile of the χ² distribution for 1 to 5 degrees of freedom.
const CHI_SQUARE_95: [f64; 5] = [3.841, 5.991, 7.815, 9.488, 11.070];

/// Upper 95 % χ² bound for `dof` degrees of freedom, if tabulated.
pub fn chi_square_95(dof: usize) -> Option<f64> {
    dof.checked_sub(1).and_then(|i| CHI_SQUARE_95.get(i).copied())
}

/// Running NIS statistics for one sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct NisMonitor {
    dof: usize,
    latest: Option<f64>,
    count: usize,
    above_95: usize,
    sum: f64,
}

impl NisMonitor {
    pub fn new(dof: usize) -> Self {
        Self {
            dof,
            latest: None,
            count: 0,
            above_95: 0,
            sum: 0.0,
        }
    }

    pub fn record(&mut self, nis: f64) {
        self.latest = Some(nis);
        self.count += 1;
        self.sum += nis;
        if chi_square_95(self.dof).is_some_and(|bound| nis > bound) {
            self.above_95 += 1;
        }
    }

    pub fn dof(&self) -> usize {
        self.dof
    }

    /// The most recent NIS value.
    pub fn latest(&self) -> Option<f64> {
        self.latest
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Share of recorded samples above the 95 % χ² bound.
    pub fn fraction_above_95(&self) -> Option<f64> {
        (self.count > 0).then(|| self.above_95 as f64 / self.count as f64)
    }
}
