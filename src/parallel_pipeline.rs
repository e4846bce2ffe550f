// THEORY:
// The `parallel_pipeline` module runs independent analysis requests
// concurrently. Each operation is a synchronous, single-invocation
// computation that owns all of its working state, so two requests on
// different images share nothing and need no locking — the natural unit of
// parallelism is the whole request.
//
// Key architectural principles:
// 1.  **Worker Pool**: a fixed set of worker tasks (one per CPU by default)
//     drains a shared queue. A dispatcher distributes requests round-robin so
//     no worker needs to know about the others.
// 2.  **Oneshot Replies**: every request carries its own reply channel; the
//     caller awaits exactly its own result and nothing else.
// 3.  **Synchronous Core, Async Shell**: the workers call straight into
//     `pipeline`; the core modules never see an executor.

use crate::pipeline::{
    self, AnalysisError, EqualizationReport, IntensityClusterReport, RgbClusterReport,
};
use futures::future::join_all;
use image::RgbImage;
use tokio::sync::{mpsc, oneshot};

/// One whole-image analysis request.
pub enum AnalysisRequest {
    GrayscaleAverage(RgbImage),
    GrayscaleLuminance(RgbImage),
    EqualizeHistogram(RgbImage),
    DetectEdges { image: RgbImage, threshold: i32 },
    ClusterByIntensity { image: RgbImage, k: usize },
    ClusterByEuclideanRgb { image: RgbImage, k: usize },
    ClusterByMahalanobisScalar { image: RgbImage, k: usize },
    ClusterByMahalanobisRgb { image: RgbImage, k: usize },
}

/// The result matching each request variant.
#[derive(Debug, Clone)]
pub enum AnalysisResponse {
    Image(RgbImage),
    Equalization(EqualizationReport),
    IntensityClusters(IntensityClusterReport),
    RgbClusters(RgbClusterReport),
}

struct AnalysisTask {
    request: AnalysisRequest,
    result_sender: oneshot::Sender<Result<AnalysisResponse, AnalysisError>>,
}

/// A pool of worker tasks executing analysis requests concurrently.
pub struct ParallelPipeline {
    task_sender: mpsc::UnboundedSender<AnalysisTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl ParallelPipeline {
    /// A pool with one worker per available CPU.
    pub fn new() -> Self {
        Self::with_workers(num_cpus::get().max(1))
    }

    pub fn with_workers(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<AnalysisTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<AnalysisTask>())
            .unzip();

        // Dispatcher: distribute incoming tasks round-robin.
        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        let mut workers = Vec::with_capacity(worker_count);
        for mut worker_receiver in worker_receivers {
            workers.push(tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let _ = task.result_sender.send(execute(task.request));
                }
            }));
        }

        Self { task_sender, workers }
    }

    /// Queues a request and awaits its result.
    pub async fn process(
        &self,
        request: AnalysisRequest,
    ) -> Result<AnalysisResponse, AnalysisError> {
        let (result_sender, result_receiver) = oneshot::channel();
        let task = AnalysisTask { request, result_sender };

        self.task_sender
            .send(task)
            .map_err(|_| AnalysisError::WorkerPoolClosed)?;

        result_receiver
            .await
            .map_err(|_| AnalysisError::WorkerPoolClosed)?
    }

    /// Closes the queue and waits for every worker to drain.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        join_all(self.workers).await;
    }
}

impl Default for ParallelPipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn execute(request: AnalysisRequest) -> Result<AnalysisResponse, AnalysisError> {
    match request {
        AnalysisRequest::GrayscaleAverage(image) => {
            Ok(AnalysisResponse::Image(pipeline::grayscale_average(&image)))
        }
        AnalysisRequest::GrayscaleLuminance(image) => {
            Ok(AnalysisResponse::Image(pipeline::grayscale_luminance(&image)))
        }
        AnalysisRequest::EqualizeHistogram(image) => {
            Ok(AnalysisResponse::Equalization(pipeline::equalize_histogram(&image)))
        }
        AnalysisRequest::DetectEdges { image, threshold } => {
            pipeline::detect_edges(&image, threshold).map(AnalysisResponse::Image)
        }
        AnalysisRequest::ClusterByIntensity { image, k } => {
            pipeline::cluster_by_intensity(&image, k).map(AnalysisResponse::IntensityClusters)
        }
        AnalysisRequest::ClusterByEuclideanRgb { image, k } => {
            pipeline::cluster_by_euclidean_rgb(&image, k).map(AnalysisResponse::RgbClusters)
        }
        AnalysisRequest::ClusterByMahalanobisScalar { image, k } => {
            pipeline::cluster_by_mahalanobis_scalar(&image, k)
                .map(AnalysisResponse::IntensityClusters)
        }
        AnalysisRequest::ClusterByMahalanobisRgb { image, k } => {
            pipeline::cluster_by_mahalanobis_rgb(&image, k).map(AnalysisResponse::RgbClusters)
        }
    }
}
