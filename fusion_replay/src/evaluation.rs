// fusion_replay/src/evaluation.rs

use nalgebra::Vector4;

/// Running root-mean-square error over `[px, py, vx, vy]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RmseAccumulator {
    sum_sq: Vector4<f64>,
    count: usize,
}

impl RmseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, estimate: &Vector4<f64>, truth: &Vector4<f64>) {
        let residual = estimate - truth;
        self.sum_sq += residual.component_mul(&residual);
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// `None` until at least one pair has been added.
    pub fn rmse(&self) -> Option<Vector4<f64>> {
        if self.count == 0 {
            return None;
        }
        Some((self.sum_sq / self.count as f64).map(f64::sqrt))
    }
}
