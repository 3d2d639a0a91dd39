use crate::{Mat, MimicError};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Running mean and variance of a stream of vectors.
///
/// Batches are merged with the parallel algorithm of Chan et al., so the result does
/// not depend on how the stream is split into batches.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RunningMeanStd {
    /// Mean of each dimension.
    pub mean: Vec<f64>,

    /// Variance of each dimension.
    pub var: Vec<f64>,

    /// The number of samples seen, starting from a small pseudo-count.
    pub count: f64,
}

impl RunningMeanStd {
    /// Zero mean, unit variance and a pseudo-count of `1e-4`.
    pub fn new(dim: usize) -> Self {
        Self {
            mean: vec![0f64; dim],
            var: vec![1f64; dim],
            count: 1e-4,
        }
    }

    /// The number of dimensions.
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Updates the statistics with a batch of samples, one per row.
    pub fn update(&mut self, batch: &Mat) -> Result<()> {
        if batch.cols() != self.dim() {
            return Err(MimicError::ShapeMismatch(format!(
                "batch with {} columns for statistics of dimension {}",
                batch.cols(),
                self.dim()
            ))
            .into());
        }
        if batch.rows() == 0 {
            return Ok(());
        }

        let n = batch.rows() as f64;
        let mut batch_mean = vec![0f64; self.dim()];
        for row in batch.iter_rows() {
            for (m, v) in batch_mean.iter_mut().zip(row.iter()) {
                *m += *v as f64 / n;
            }
        }
        let mut batch_var = vec![0f64; self.dim()];
        for row in batch.iter_rows() {
            for ((s, m), v) in batch_var.iter_mut().zip(batch_mean.iter()).zip(row.iter()) {
                *s += (*v as f64 - m).powi(2) / n;
            }
        }

        self.update_from_moments(&batch_mean, &batch_var, n);
        Ok(())
    }

    /// Merges the moments of a batch into the statistics.
    pub fn update_from_moments(&mut self, batch_mean: &[f64], batch_var: &[f64], batch_count: f64) {
        let tot_count = self.count + batch_count;
        for i in 0..self.dim() {
            let delta = batch_mean[i] - self.mean[i];
            let m_a = self.var[i] * self.count;
            let m_b = batch_var[i] * batch_count;
            let m2 = m_a + m_b + delta * delta * self.count * batch_count / tot_count;
            self.mean[i] += delta * batch_count / tot_count;
            self.var[i] = m2 / tot_count;
        }
        self.count = tot_count;
    }

    /// Standard deviation, `sqrt(var + epsilon)`.
    pub fn std(&self, epsilon: f64) -> Vec<f64> {
        self.var.iter().map(|v| (v + epsilon).sqrt()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_matches_batch_moments() -> Result<()> {
        let xs = Mat::from_rows(&[
            vec![1.0, 10.0],
            vec![2.0, 20.0],
            vec![3.0, 30.0],
            vec![4.0, 40.0],
        ]);
        let mut rms = RunningMeanStd::new(2);
        rms.update(&xs)?;

        // The pseudo-count slightly biases the moments.
        assert!((rms.mean[0] - 2.5).abs() < 1e-3);
        assert!((rms.mean[1] - 25.0).abs() < 1e-2);
        assert!((rms.var[0] - 1.25).abs() < 1e-3);
        assert!((rms.count - 4.0001).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_split_batches_agree() -> Result<()> {
        let rows: Vec<Vec<f32>> = (0..10).map(|i| vec![i as f32, (i * i) as f32]).collect();
        let mut whole = RunningMeanStd::new(2);
        whole.update(&Mat::from_rows(&rows))?;

        let mut split = RunningMeanStd::new(2);
        split.update(&Mat::from_rows(&rows[..3]))?;
        split.update(&Mat::from_rows(&rows[3..]))?;

        for i in 0..2 {
            assert!((whole.mean[i] - split.mean[i]).abs() < 1e-6);
            assert!((whole.var[i] - split.var[i]).abs() < 1e-4);
        }
        Ok(())
    }

    #[test]
    fn test_dim_mismatch() {
        let mut rms = RunningMeanStd::new(3);
        let err = rms.update(&Mat::zeros(2, 2)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MimicError>(),
            Some(MimicError::ShapeMismatch(_))
        ));
    }
}
