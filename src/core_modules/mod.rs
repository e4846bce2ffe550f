pub mod covariance;
pub mod histogram;
pub mod kmeans;
pub mod metric;
pub mod pixel;
pub mod sample_space;
pub mod sobel;
