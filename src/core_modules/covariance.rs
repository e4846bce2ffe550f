// THEORY:
// The `covariance` module holds the second-moment statistics behind the
// Mahalanobis distance metrics: the sample covariance matrix of an RGB
// population, the scalar variance of one cluster's members, and the
// closed-form cofactor inverse of a 3x3 matrix.
//
// Key architectural principles:
// 1.  **Symmetry by Construction**: only the upper triangle of the covariance
//     matrix is accumulated; the lower triangle is mirrored from it
//     afterwards, so the result is symmetric regardless of floating-point
//     accumulation order.
// 2.  **Degenerate Statistics Never Crash**: a cluster with one member or
//     fewer reports the fallback variance instead of dividing by zero, and a
//     singular matrix passed to `invert_3x3` produces non-finite entries
//     rather than a panic. Callers that cannot tolerate non-finite output
//     check `determinant` first.

use crate::core_modules::sample_space::{GraySample, RgbSample};

/// A 3x3 matrix of real numbers, row-major.
pub type Matrix3 = [[f64; 3]; 3];

/// Variance substituted for clusters with one member or fewer.
pub const FALLBACK_VARIANCE: f64 = 1000.0;

/// Sample covariance (Bessel's correction) of an RGB population.
/// Populations of one sample or fewer have no spread; the zero matrix is
/// returned for them.
pub fn covariance_matrix(samples: &[RgbSample]) -> Matrix3 {
    let mut matrix = [[0.0f64; 3]; 3];
    let n = samples.len();
    if n <= 1 {
        return matrix;
    }

    let mut mean = [0.0f64; 3];
    for sample in samples {
        for c in 0..3 {
            mean[c] += sample[c] as f64;
        }
    }
    for c in 0..3 {
        mean[c] /= n as f64;
    }

    // Accumulate the upper triangle of the outer products of deviations.
    for sample in samples {
        let diff = [
            sample[0] as f64 - mean[0],
            sample[1] as f64 - mean[1],
            sample[2] as f64 - mean[2],
        ];
        for row in 0..3 {
            for col in row..3 {
                matrix[row][col] += diff[row] * diff[col];
            }
        }
    }

    for row in 0..3 {
        for col in row..3 {
            matrix[row][col] /= (n - 1) as f64;
        }
    }

    // Mirror the upper triangle into the lower triangle.
    matrix[1][0] = matrix[0][1];
    matrix[2][0] = matrix[0][2];
    matrix[2][1] = matrix[1][2];

    matrix
}

/// Scalar variance of one cluster's members around its centroid, with
/// Bessel's correction. Clusters with one member or fewer get
/// [`FALLBACK_VARIANCE`].
pub fn cluster_variance(
    samples: &[GraySample],
    assignment: &[usize],
    cluster: usize,
    centroid: GraySample,
) -> f64 {
    let mut sum_of_squares = 0.0f64;
    let mut members = 0usize;
    for (sample, &assigned) in samples.iter().zip(assignment) {
        if assigned == cluster {
            let diff = (sample - centroid) as f64;
            sum_of_squares += diff * diff;
            members += 1;
        }
    }

    if members > 1 {
        sum_of_squares / (members - 1) as f64
    } else {
        FALLBACK_VARIANCE
    }
}

/// Determinant via the standard 3x3 expansion.
pub fn determinant(m: &Matrix3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Closed-form cofactor inverse of a 3x3 matrix.
/// A singular input yields non-finite entries; it never panics.
pub fn invert_3x3(m: &Matrix3) -> Matrix3 {
    let inv_det = 1.0 / determinant(m);

    [
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    fn multiply(a: &Matrix3, b: &Matrix3) -> Matrix3 {
        let mut product = [[0.0f64; 3]; 3];
        for row in 0..3 {
            for col in 0..3 {
                for k in 0..3 {
                    product[row][col] += a[row][k] * b[k][col];
                }
            }
        }
        product
    }

    #[test]
    fn inverse_composes_to_identity() {
        let matrix: Matrix3 = [[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 2.0]];
        let product = multiply(&invert_3x3(&matrix), &matrix);
        for row in 0..3 {
            for col in 0..3 {
                let expected = if row == col { 1.0 } else { 0.0 };
                assert!((product[row][col] - expected).abs() < TOLERANCE);
            }
        }
    }

    #[test]
    fn covariance_is_symmetric() {
        let samples = vec![[0, 10, 200], [50, 60, 70], [255, 0, 128], [3, 99, 180]];
        let matrix = covariance_matrix(&samples);
        for row in 0..3 {
            for col in 0..3 {
                assert_eq!(matrix[row][col], matrix[col][row]);
            }
        }
    }

    #[test]
    fn covariance_of_two_samples_matches_hand_calculation() {
        // Deviations from the mean (5, 5, 5) are +/- (5, 5, 5); with n-1 = 1
        // every entry is 50.
        let samples = vec![[0, 0, 0], [10, 10, 10]];
        let matrix = covariance_matrix(&samples);
        for row in 0..3 {
            for col in 0..3 {
                assert!((matrix[row][col] - 50.0).abs() < TOLERANCE);
            }
        }
    }

    #[test]
    fn perfectly_correlated_population_is_singular() {
        let samples = vec![[0, 0, 0], [10, 10, 10], [20, 20, 20]];
        let matrix = covariance_matrix(&samples);
        assert!(determinant(&matrix).abs() < TOLERANCE);
    }

    #[test]
    fn tiny_population_has_zero_covariance() {
        assert_eq!(covariance_matrix(&[]), [[0.0; 3]; 3]);
        assert_eq!(covariance_matrix(&[[7, 8, 9]]), [[0.0; 3]; 3]);
    }

    #[test]
    fn lonely_cluster_falls_back_to_default_variance() {
        let samples = vec![0, 100, 200];
        let assignment = vec![0, 0, 1];
        assert_eq!(cluster_variance(&samples, &assignment, 1, 200), FALLBACK_VARIANCE);
        assert_eq!(cluster_variance(&samples, &assignment, 2, 0), FALLBACK_VARIANCE);
    }

    #[test]
    fn cluster_variance_uses_bessels_correction() {
        // Members 0 and 100 around centroid 50: (2500 + 2500) / (2 - 1).
        let samples = vec![0, 100, 200];
        let assignment = vec![0, 0, 1];
        assert_eq!(cluster_variance(&samples, &assignment, 0, 50), 5000.0);
    }
}
