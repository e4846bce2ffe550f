// This file is an example of how to use the `lumen_vision` library.
// The main library entry point is `src/lib.rs`.

use image::{Rgb, RgbImage};
use lumen_vision::pipeline;

fn main() {
    tracing_subscriber::fmt::init();
    println!("Lumen Vision Toolkit - Example Runner");

    // A synthetic two-band image: a dark left half and a bright right half.
    let image = RgbImage::from_fn(64, 48, |x, _| {
        if x < 32 { Rgb([30, 40, 50]) } else { Rgb([200, 210, 220]) }
    });

    let gray = pipeline::grayscale_luminance(&image);
    println!("grayscale: {}x{}", gray.width(), gray.height());

    let equalized = pipeline::equalize_histogram(&image);
    let occupied_bins = equalized.histogram.iter().filter(|&&c| c > 0).count();
    println!("equalize: {occupied_bins} occupied histogram bins");

    match pipeline::detect_edges(&image, 128) {
        Ok(edges) => {
            let edge_pixels = edges.pixels().filter(|p| p.0[0] == 255).count();
            println!("edges: {edge_pixels} edge pixels at threshold 128");
        }
        Err(error) => println!("edges: {error}"),
    }

    match pipeline::cluster_by_intensity(&image, 2) {
        Ok(report) => {
            println!(
                "k-means (intensity, k=2): centroids {:?}, sizes {:?}, {} iterations",
                report.centroids, report.cluster_sizes, report.iterations
            );
        }
        Err(error) => println!("k-means: {error}"),
    }

    match pipeline::cluster_by_euclidean_rgb(&image, 2) {
        Ok(report) => {
            println!(
                "k-means (euclidean rgb, k=2): centroids {:?}, {} iterations",
                report.centroids, report.iterations
            );
        }
        Err(error) => println!("k-means: {error}"),
    }
}
