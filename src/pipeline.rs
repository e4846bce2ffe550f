// THEORY:
// The `pipeline` module is the top-level API for the entire analysis toolkit.
// It exposes the eight image operations as plain functions over `RgbImage`
// buffers and packages their results — output image plus summary statistics —
// into report structs the presentation layer can render however it likes.
//
// Key architectural principles:
// 1.  **One Image In, One Image Out**: every operation reads a borrowed input
//     image and returns a newly allocated image of identical dimensions. The
//     input is never mutated, and no state survives between invocations.
// 2.  **Validate, Then Compute**: input constraints (cluster count, edge
//     threshold) are checked before any work starts; a rejected call produces
//     an error and nothing else. Degenerate statistics inside a computation
//     are recovered locally by the core modules and never surface here.
// 3.  **Structured Results, No Rendering**: clustering reports carry the
//     centroids, per-pixel assignment, per-cluster pixel counts, iteration
//     count, and (for the intensity modes) the 256-bin histogram. Drawing
//     them is someone else's job.

use crate::core_modules::histogram;
use crate::core_modules::kmeans::{KMeansEngine, KMeansOutcome};
use crate::core_modules::metric::{
    AbsoluteIntensity, DistanceMetric, EuclideanRgb, MahalanobisRgb, ScalarMahalanobis,
};
use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::sample_space::{self, GraySample, RgbSample};
use crate::core_modules::sobel;
use image::{Rgb, RgbImage};
use rand::Rng;
use thiserror::Error;
use tracing::debug;

// Re-export the types callers see in reports.
pub use crate::core_modules::histogram::Histogram;
pub use crate::core_modules::kmeans::MAX_ITERATIONS;
pub use crate::core_modules::sobel::MAX_EDGE_RESPONSE;

/// Rejected input. Raised before any computation begins; no partial output
/// accompanies it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("cluster count must be at least 1")]
    ClusterCountZero,
    #[error("cluster count {k} exceeds the pixel count {pixels}")]
    ClusterCountOutOfRange { k: usize, pixels: usize },
    #[error("edge threshold must be non-negative, got {0}")]
    NegativeThreshold(i32),
    #[error("analysis worker pool is no longer running")]
    WorkerPoolClosed,
}

/// Output of [`equalize_histogram`].
#[derive(Debug, Clone)]
pub struct EqualizationReport {
    pub image: RgbImage,
    /// Histogram of the input's gray levels, before equalization.
    pub histogram: Histogram,
}

/// Output of the intensity-based clustering operations.
#[derive(Debug, Clone)]
pub struct IntensityClusterReport {
    pub image: RgbImage,
    /// One gray-level centroid per cluster.
    pub centroids: Vec<GraySample>,
    /// Cluster index per pixel, row-major.
    pub assignment: Vec<usize>,
    pub iterations: u32,
    /// Pixel count per cluster.
    pub cluster_sizes: Vec<usize>,
    /// Histogram of the input's gray levels.
    pub histogram: Histogram,
}

/// Output of the RGB-space clustering operations.
#[derive(Debug, Clone)]
pub struct RgbClusterReport {
    pub image: RgbImage,
    /// One RGB centroid per cluster.
    pub centroids: Vec<RgbSample>,
    /// Cluster index per pixel, row-major.
    pub assignment: Vec<usize>,
    pub iterations: u32,
    /// Pixel count per cluster.
    pub cluster_sizes: Vec<usize>,
}

/// Grayscale via the plain channel average, (R + G + B) / 3.
pub fn grayscale_average(image: &RgbImage) -> RgbImage {
    map_to_gray(image, |pixel| pixel.average_level())
}

/// Grayscale via the luminance transform, Y = 0.299R + 0.587G + 0.114B.
pub fn grayscale_luminance(image: &RgbImage) -> RgbImage {
    map_to_gray(image, |pixel| pixel.luminance_level())
}

/// Contrast enhancement by histogram equalization of the luminance view.
pub fn equalize_histogram(image: &RgbImage) -> EqualizationReport {
    let levels = sample_space::luminance_levels(image);
    let (equalized, histogram) = histogram::equalize(&levels);
    EqualizationReport {
        image: gray_image_from_levels(&equalized, image.width(), image.height()),
        histogram,
    }
}

/// Binary edge map of the luminance view via the Sobel operator. The 1-pixel
/// border is left black. `threshold` must be non-negative; responses range up
/// to [`MAX_EDGE_RESPONSE`].
pub fn detect_edges(image: &RgbImage, threshold: i32) -> Result<RgbImage, AnalysisError> {
    if threshold < 0 {
        return Err(AnalysisError::NegativeThreshold(threshold));
    }

    let levels = sample_space::luminance_levels(image);
    let edges = sobel::detect_edges(&levels, image.width(), image.height(), threshold);
    Ok(gray_image_from_levels(&edges, image.width(), image.height()))
}

/// Segments the image into `k` clusters of similar luminance.
pub fn cluster_by_intensity(
    image: &RgbImage,
    k: usize,
) -> Result<IntensityClusterReport, AnalysisError> {
    cluster_by_intensity_with_rng(image, k, &mut rand::thread_rng())
}

/// Seeded twin of [`cluster_by_intensity`].
pub fn cluster_by_intensity_with_rng(
    image: &RgbImage,
    k: usize,
    rng: &mut impl Rng,
) -> Result<IntensityClusterReport, AnalysisError> {
    intensity_clustering(image, k, AbsoluteIntensity, rng)
}

/// Segments the image into `k` clusters by Euclidean distance in RGB space.
pub fn cluster_by_euclidean_rgb(
    image: &RgbImage,
    k: usize,
) -> Result<RgbClusterReport, AnalysisError> {
    cluster_by_euclidean_rgb_with_rng(image, k, &mut rand::thread_rng())
}

/// Seeded twin of [`cluster_by_euclidean_rgb`].
pub fn cluster_by_euclidean_rgb_with_rng(
    image: &RgbImage,
    k: usize,
    rng: &mut impl Rng,
) -> Result<RgbClusterReport, AnalysisError> {
    rgb_clustering(image, k, EuclideanRgb, rng)
}

/// Segments the image into `k` clusters of similar luminance, weighting each
/// distance by the receiving cluster's variance.
pub fn cluster_by_mahalanobis_scalar(
    image: &RgbImage,
    k: usize,
) -> Result<IntensityClusterReport, AnalysisError> {
    cluster_by_mahalanobis_scalar_with_rng(image, k, &mut rand::thread_rng())
}

/// Seeded twin of [`cluster_by_mahalanobis_scalar`].
pub fn cluster_by_mahalanobis_scalar_with_rng(
    image: &RgbImage,
    k: usize,
    rng: &mut impl Rng,
) -> Result<IntensityClusterReport, AnalysisError> {
    intensity_clustering(image, k, ScalarMahalanobis::new(), rng)
}

/// Segments the image into `k` clusters by full multivariate Mahalanobis
/// distance in RGB space, using the population covariance.
pub fn cluster_by_mahalanobis_rgb(
    image: &RgbImage,
    k: usize,
) -> Result<RgbClusterReport, AnalysisError> {
    cluster_by_mahalanobis_rgb_with_rng(image, k, &mut rand::thread_rng())
}

/// Seeded twin of [`cluster_by_mahalanobis_rgb`].
pub fn cluster_by_mahalanobis_rgb_with_rng(
    image: &RgbImage,
    k: usize,
    rng: &mut impl Rng,
) -> Result<RgbClusterReport, AnalysisError> {
    rgb_clustering(image, k, MahalanobisRgb::new(), rng)
}

fn intensity_clustering<M>(
    image: &RgbImage,
    k: usize,
    metric: M,
    rng: &mut impl Rng,
) -> Result<IntensityClusterReport, AnalysisError>
where
    M: DistanceMetric<GraySample>,
{
    let levels = sample_space::luminance_levels(image);
    validate_cluster_count(k, levels.len())?;

    let samples: Vec<GraySample> = levels.iter().map(|&v| GraySample::from(v)).collect();
    let outcome = KMeansEngine::new(metric).run_with_rng(&samples, k, rng);
    debug!(k, iterations = outcome.iterations, "intensity clustering finished");

    let rendered: Vec<u8> = outcome
        .assignment
        .iter()
        .map(|&cluster| outcome.centroids[cluster].clamp(0, 255) as u8)
        .collect();

    let cluster_sizes = outcome.cluster_sizes(k);
    let KMeansOutcome { centroids, assignment, iterations } = outcome;
    Ok(IntensityClusterReport {
        image: gray_image_from_levels(&rendered, image.width(), image.height()),
        centroids,
        assignment,
        iterations,
        cluster_sizes,
        histogram: histogram::build_histogram(&levels),
    })
}

fn rgb_clustering<M>(
    image: &RgbImage,
    k: usize,
    metric: M,
    rng: &mut impl Rng,
) -> Result<RgbClusterReport, AnalysisError>
where
    M: DistanceMetric<RgbSample>,
{
    let samples = sample_space::rgb_samples(image);
    validate_cluster_count(k, samples.len())?;

    let outcome = KMeansEngine::new(metric).run_with_rng(&samples, k, rng);
    debug!(k, iterations = outcome.iterations, "rgb clustering finished");

    let mut output = RgbImage::new(image.width(), image.height());
    for (pixel, &cluster) in output.pixels_mut().zip(&outcome.assignment) {
        let centroid = outcome.centroids[cluster];
        *pixel = Rgb([
            centroid[0].clamp(0, 255) as u8,
            centroid[1].clamp(0, 255) as u8,
            centroid[2].clamp(0, 255) as u8,
        ]);
    }

    let cluster_sizes = outcome.cluster_sizes(k);
    let KMeansOutcome { centroids, assignment, iterations } = outcome;
    Ok(RgbClusterReport { image: output, centroids, assignment, iterations, cluster_sizes })
}

fn validate_cluster_count(k: usize, pixels: usize) -> Result<(), AnalysisError> {
    if k == 0 {
        return Err(AnalysisError::ClusterCountZero);
    }
    if k > pixels {
        return Err(AnalysisError::ClusterCountOutOfRange { k, pixels });
    }
    Ok(())
}

fn map_to_gray(image: &RgbImage, level: impl Fn(&Pixel) -> u8) -> RgbImage {
    let mut output = RgbImage::new(image.width(), image.height());
    for (source, target) in image.pixels().zip(output.pixels_mut()) {
        let gray = level(&Pixel::new(source.0[0], source.0[1], source.0[2]));
        *target = Rgb([gray, gray, gray]);
    }
    output
}

/// Rebuilds an image from a row-major gray-level buffer, R=G=B. The buffer
/// order matches the sample-space extraction order, so index `i` lands back
/// on the pixel it came from.
fn gray_image_from_levels(levels: &[u8], width: u32, height: u32) -> RgbImage {
    let mut output = RgbImage::new(width, height);
    for (pixel, &level) in output.pixels_mut().zip(levels) {
        *pixel = Rgb([level, level, level]);
    }
    output
}
