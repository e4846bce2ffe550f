// THEORY:
// The `metric` module defines the interchangeable distance strategies the
// clustering engine is parameterized by. The original design of this toolkit
// had one hand-rolled clustering loop per distance measure; here the loop
// lives once in `kmeans` and each measure is a small strategy object.
//
// Key architectural principles:
// 1.  **Two Hooks**: a metric exposes `prepare_pass`, called once at the top
//     of every assignment pass, and `distance`, called per sample/centroid
//     pair. The statistical metrics refresh their variance or covariance
//     state in `prepare_pass`; the geometric ones need no state at all.
// 2.  **Distinct Statistical Models**: `ScalarMahalanobis` estimates one
//     variance per cluster from the assignment as it stood at the end of the
//     previous pass (a deliberate one-pass lag), while `MahalanobisRgb`
//     re-estimates one covariance matrix over the whole population every
//     pass, ignoring cluster membership. The two are different models and are
//     kept separate on purpose.
// 3.  **Degenerate Statistics Recover Locally**: empty or one-member clusters
//     use the fallback variance, and a singular population covariance is
//     replaced by a fallback inverse. Neither condition is an error.

use crate::core_modules::covariance::{
    FALLBACK_VARIANCE, Matrix3, cluster_variance, covariance_matrix, determinant, invert_3x3,
};
use crate::core_modules::sample_space::{GraySample, RgbSample};
use tracing::debug;

/// A dissimilarity measure between a sample and a centroid.
///
/// `prepare_pass` runs once before each assignment pass; `distance` must
/// return a non-negative value. Ties between centroids are broken by the
/// engine, which scans them in index order with a strict `<` comparison.
pub trait DistanceMetric<S> {
    fn prepare_pass(&mut self, _samples: &[S], _centroids: &[S], _assignment: &[usize]) {}

    fn distance(&self, sample: &S, centroid: &S, cluster: usize) -> f64;
}

/// `|sample - centroid|` on gray levels.
pub struct AbsoluteIntensity;

impl DistanceMetric<GraySample> for AbsoluteIntensity {
    fn distance(&self, sample: &GraySample, centroid: &GraySample, _cluster: usize) -> f64 {
        (sample - centroid).abs() as f64
    }
}

/// Straight-line distance in RGB space.
pub struct EuclideanRgb;

impl DistanceMetric<RgbSample> for EuclideanRgb {
    fn distance(&self, sample: &RgbSample, centroid: &RgbSample, _cluster: usize) -> f64 {
        let mut sum = 0.0f64;
        for c in 0..3 {
            let diff = (sample[c] - centroid[c]) as f64;
            sum += diff * diff;
        }
        sum.sqrt()
    }
}

/// `|sample - centroid| / sqrt(cluster variance)` on gray levels.
///
/// The per-cluster variances are re-estimated at the start of every pass from
/// the previous pass's assignment, so the first pass (all samples still in
/// cluster 0) prices every other cluster at the fallback variance.
pub struct ScalarMahalanobis {
    variances: Vec<f64>,
}

impl ScalarMahalanobis {
    pub fn new() -> Self {
        Self { variances: Vec::new() }
    }
}

impl Default for ScalarMahalanobis {
    fn default() -> Self {
        Self::new()
    }
}

impl DistanceMetric<GraySample> for ScalarMahalanobis {
    fn prepare_pass(
        &mut self,
        samples: &[GraySample],
        centroids: &[GraySample],
        assignment: &[usize],
    ) {
        self.variances = centroids
            .iter()
            .enumerate()
            .map(|(cluster, &centroid)| cluster_variance(samples, assignment, cluster, centroid))
            .collect();
    }

    fn distance(&self, sample: &GraySample, centroid: &GraySample, cluster: usize) -> f64 {
        (sample - centroid).abs() as f64 / self.variances[cluster].sqrt()
    }
}

/// Full multivariate Mahalanobis distance in RGB space,
/// `sqrt(d^T * inverse_covariance * d)`.
///
/// The covariance is estimated over the entire sample population, not per
/// cluster, and refreshed every pass.
pub struct MahalanobisRgb {
    inverse: Matrix3,
}

impl MahalanobisRgb {
    pub fn new() -> Self {
        Self { inverse: fallback_inverse() }
    }
}

impl Default for MahalanobisRgb {
    fn default() -> Self {
        Self::new()
    }
}

/// Inverse substituted when the population covariance is singular:
/// a diagonal matrix pricing every channel at the fallback variance.
fn fallback_inverse() -> Matrix3 {
    let weight = 1.0 / FALLBACK_VARIANCE;
    [
        [weight, 0.0, 0.0],
        [0.0, weight, 0.0],
        [0.0, 0.0, weight],
    ]
}

impl DistanceMetric<RgbSample> for MahalanobisRgb {
    fn prepare_pass(&mut self, samples: &[RgbSample], _centroids: &[RgbSample], _assignment: &[usize]) {
        let covariance = covariance_matrix(samples);
        let det = determinant(&covariance);
        if det == 0.0 {
            debug!("singular population covariance, using fallback inverse");
            self.inverse = fallback_inverse();
        } else {
            self.inverse = invert_3x3(&covariance);
        }
    }

    fn distance(&self, sample: &RgbSample, centroid: &RgbSample, _cluster: usize) -> f64 {
        let diff = [
            (sample[0] - centroid[0]) as f64,
            (sample[1] - centroid[1]) as f64,
            (sample[2] - centroid[2]) as f64,
        ];

        let mut sum = 0.0f64;
        for row in 0..3 {
            for col in 0..3 {
                sum += diff[row] * self.inverse[row][col] * diff[col];
            }
        }
        sum.sqrt()
    }
}
