// THEORY:
// The `histogram` module owns the 256-bin frequency view of a grayscale
// buffer and the contrast enhancement built on top of it. Equalization
// remaps gray levels through the cumulative distribution so that the levels
// actually present in the image spread across the full [0, 255] range.
//
// Key architectural principles:
// 1.  **Table-Driven Remap**: the CDF is collapsed into one 256-entry lookup
//     table before any pixel is touched, so the per-pixel work is a single
//     indexed load no matter how large the image is.
// 2.  **Guarded Degeneracy**: an image whose entire mass sits in its first
//     occupied bin (a constant image, or no pixels at all) has
//     `total == cdf_min` and no defined remap; such input is returned
//     unchanged instead of dividing by zero.

/// Number of distinct gray levels.
pub const GRAY_LEVELS: usize = 256;

/// Frequency count per gray level.
pub type Histogram = [u32; GRAY_LEVELS];

/// Builds the frequency histogram of a grayscale buffer.
pub fn build_histogram(levels: &[u8]) -> Histogram {
    let mut histogram = [0u32; GRAY_LEVELS];
    for &level in levels {
        histogram[level as usize] += 1;
    }
    histogram
}

/// Running cumulative sum over the histogram bins.
fn cumulative_distribution(histogram: &Histogram) -> [u64; GRAY_LEVELS] {
    let mut cdf = [0u64; GRAY_LEVELS];
    let mut running = 0u64;
    for (bin, &count) in histogram.iter().enumerate() {
        running += count as u64;
        cdf[bin] = running;
    }
    cdf
}

/// Equalizes a grayscale buffer, returning the remapped buffer and the
/// histogram of the input. For every level `v`,
/// `remap(v) = round((cdf[v] - cdf_min) / (total - cdf_min) * 255)` where
/// `cdf_min` is the smallest non-zero CDF value.
pub fn equalize(levels: &[u8]) -> (Vec<u8>, Histogram) {
    let histogram = build_histogram(levels);
    let cdf = cumulative_distribution(&histogram);

    let cdf_min = cdf.iter().copied().find(|&v| v > 0).unwrap_or(0);
    let total = levels.len() as u64;

    // A single occupied bin carries the whole distribution; the remap is
    // undefined, so the input passes through untouched.
    if total == cdf_min {
        return (levels.to_vec(), histogram);
    }

    let span = (total - cdf_min) as f64;
    let mut remap = [0u8; GRAY_LEVELS];
    for (level, entry) in remap.iter_mut().enumerate() {
        let scaled = (cdf[level] as f64 - cdf_min as f64) / span * 255.0;
        *entry = scaled.round().clamp(0.0, 255.0) as u8;
    }

    let equalized = levels.iter().map(|&v| remap[v as usize]).collect();
    (equalized, histogram)
}
