// THEORY:
// The `kmeans` module is the heart of the segmentation layer: one generic
// Lloyd's-algorithm driver that serves every distance metric. The engine
// alternates two phases — assign every sample to its nearest centroid, then
// move every centroid to the mean of its members — until an assignment pass
// changes nothing or the iteration cap is reached.
//
// Key architectural principles:
// 1.  **One Loop, Many Metrics**: the engine owns the iteration structure and
//     delegates all notion of "near" to its `DistanceMetric`. Adding a metric
//     never touches this file.
// 2.  **Honest Heuristic**: initial centroids are uniform random draws from
//     the sample array, with replacement; duplicate draws are possible and
//     not corrected. The result is a local minimum that depends on that
//     draw. Callers needing reproducibility pass their own generator.
// 3.  **Bounded, Never Failing**: the 100-pass cap is forced convergence, not
//     an error; the engine always returns its last computed state.

use crate::core_modules::metric::DistanceMetric;
use crate::core_modules::sample_space::{GraySample, RgbSample};
use rand::Rng;
use tracing::debug;

/// Hard cap on assignment/update passes.
pub const MAX_ITERATIONS: u32 = 100;

/// A sample type the engine can average into a centroid.
pub trait ClusterSample: Copy + PartialEq {
    type Accumulator: Default + Clone;

    fn accumulate(accumulator: &mut Self::Accumulator, sample: &Self);

    /// Per-channel mean with truncating integer division.
    fn mean(accumulator: &Self::Accumulator, count: usize) -> Self;
}

impl ClusterSample for GraySample {
    type Accumulator = i64;

    fn accumulate(accumulator: &mut Self::Accumulator, sample: &Self) {
        *accumulator += *sample as i64;
    }

    fn mean(accumulator: &Self::Accumulator, count: usize) -> Self {
        (accumulator / count as i64) as GraySample
    }
}

impl ClusterSample for RgbSample {
    type Accumulator = [i64; 3];

    fn accumulate(accumulator: &mut Self::Accumulator, sample: &Self) {
        for c in 0..3 {
            accumulator[c] += sample[c] as i64;
        }
    }

    fn mean(accumulator: &Self::Accumulator, count: usize) -> Self {
        [
            (accumulator[0] / count as i64) as i32,
            (accumulator[1] / count as i64) as i32,
            (accumulator[2] / count as i64) as i32,
        ]
    }
}

/// The final state of one clustering run.
#[derive(Debug, Clone)]
pub struct KMeansOutcome<S> {
    /// One centroid per cluster, in cluster-index order.
    pub centroids: Vec<S>,
    /// One cluster index per sample, each in `[0, k)`.
    pub assignment: Vec<usize>,
    /// Assignment passes performed, at most [`MAX_ITERATIONS`].
    pub iterations: u32,
}

impl<S> KMeansOutcome<S> {
    /// Member count per cluster.
    pub fn cluster_sizes(&self, k: usize) -> Vec<usize> {
        let mut sizes = vec![0usize; k];
        for &cluster in &self.assignment {
            sizes[cluster] += 1;
        }
        sizes
    }
}

/// Generic Lloyd's-algorithm driver, parameterized by a [`DistanceMetric`].
pub struct KMeansEngine<M> {
    metric: M,
}

impl<M> KMeansEngine<M> {
    pub fn new(metric: M) -> Self {
        Self { metric }
    }

    /// Clusters `samples` into `k` groups with fresh randomness.
    pub fn run<S>(&mut self, samples: &[S], k: usize) -> KMeansOutcome<S>
    where
        S: ClusterSample,
        M: DistanceMetric<S>,
    {
        self.run_with_rng(samples, k, &mut rand::thread_rng())
    }

    /// Clusters `samples` into `k` groups drawing initial centroids from the
    /// supplied generator. An empty sample population is a no-op returning
    /// empty results.
    pub fn run_with_rng<S, R>(&mut self, samples: &[S], k: usize, rng: &mut R) -> KMeansOutcome<S>
    where
        S: ClusterSample,
        M: DistanceMetric<S>,
        R: Rng,
    {
        if samples.is_empty() || k == 0 {
            return KMeansOutcome { centroids: Vec::new(), assignment: Vec::new(), iterations: 0 };
        }

        // Uniform draws with replacement; duplicate centroids are allowed.
        let mut centroids: Vec<S> = (0..k)
            .map(|_| samples[rng.gen_range(0..samples.len())])
            .collect();
        let mut assignment = vec![0usize; samples.len()];

        let mut iterations = 0u32;
        let mut changed = true;

        while changed && iterations < MAX_ITERATIONS {
            iterations += 1;
            changed = false;

            self.metric.prepare_pass(samples, &centroids, &assignment);

            // Assign: nearest centroid wins; ties go to the lowest index.
            for (i, sample) in samples.iter().enumerate() {
                let mut nearest = 0usize;
                let mut smallest = f64::MAX;
                for (cluster, centroid) in centroids.iter().enumerate() {
                    let distance = self.metric.distance(sample, centroid, cluster);
                    if distance < smallest {
                        smallest = distance;
                        nearest = cluster;
                    }
                }

                if assignment[i] != nearest {
                    assignment[i] = nearest;
                    changed = true;
                }
            }

            // Update: move each populated cluster to the mean of its members;
            // empty clusters keep their previous centroid.
            if changed {
                let mut accumulators = vec![S::Accumulator::default(); k];
                let mut counts = vec![0usize; k];
                for (i, sample) in samples.iter().enumerate() {
                    S::accumulate(&mut accumulators[assignment[i]], sample);
                    counts[assignment[i]] += 1;
                }

                for cluster in 0..k {
                    if counts[cluster] > 0 {
                        centroids[cluster] = S::mean(&accumulators[cluster], counts[cluster]);
                    }
                }
            }
        }

        debug!(k, iterations, "clustering finished");
        KMeansOutcome { centroids, assignment, iterations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::metric::{AbsoluteIntensity, EuclideanRgb, ScalarMahalanobis};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Replays the engine's initial centroid draws for a seed, so tests can
    /// skip the seeds whose uniform draws collide. Duplicate initial
    /// centroids can never separate under the strict `<` tie-break, which is
    /// inherent to the heuristic, not a defect.
    fn initial_draws(samples: &[GraySample], k: usize, seed: u64) -> Vec<GraySample> {
        let mut probe = StdRng::seed_from_u64(seed);
        (0..k).map(|_| samples[probe.gen_range(0..samples.len())]).collect()
    }

    #[test]
    fn two_tone_samples_split_into_their_buckets() {
        // The 2x2 black/white checkerboard scenario.
        let samples: Vec<GraySample> = vec![0, 255, 0, 255];

        let mut seeds_exercised = 0;
        for seed in 0..32 {
            let draws = initial_draws(&samples, 2, seed);
            if draws[0] == draws[1] {
                continue;
            }
            seeds_exercised += 1;

            let mut engine = KMeansEngine::new(AbsoluteIntensity);
            let outcome = engine.run_with_rng(&samples, 2, &mut StdRng::seed_from_u64(seed));

            let mut sorted = outcome.centroids.clone();
            sorted.sort();
            assert_eq!(sorted, vec![0, 255]);

            for (sample, &cluster) in samples.iter().zip(&outcome.assignment) {
                assert_eq!(outcome.centroids[cluster], *sample);
            }
        }
        assert!(seeds_exercised > 0);
    }

    #[test]
    fn outcome_shape_holds_for_every_k() {
        let samples: Vec<GraySample> = (0..64).map(|v| (v * 4) % 256).collect();
        for k in 1..=8 {
            let mut engine = KMeansEngine::new(AbsoluteIntensity);
            let outcome = engine.run_with_rng(&samples, k, &mut StdRng::seed_from_u64(k as u64));

            assert_eq!(outcome.centroids.len(), k);
            assert_eq!(outcome.assignment.len(), samples.len());
            assert!(outcome.assignment.iter().all(|&c| c < k));
            assert!(outcome.iterations <= MAX_ITERATIONS);
            assert_eq!(outcome.cluster_sizes(k).iter().sum::<usize>(), samples.len());
        }
    }

    #[test]
    fn converged_outcome_is_stable_under_one_more_pass() {
        let samples: Vec<GraySample> = vec![10, 12, 14, 200, 210, 220, 90, 95];
        let mut engine = KMeansEngine::new(AbsoluteIntensity);
        let outcome = engine.run_with_rng(&samples, 3, &mut StdRng::seed_from_u64(11));
        assert!(outcome.iterations < MAX_ITERATIONS);

        let metric = AbsoluteIntensity;
        for (sample, &assigned) in samples.iter().zip(&outcome.assignment) {
            let mut nearest = 0usize;
            let mut smallest = f64::MAX;
            for (cluster, centroid) in outcome.centroids.iter().enumerate() {
                let distance = metric.distance(sample, centroid, cluster);
                if distance < smallest {
                    smallest = distance;
                    nearest = cluster;
                }
            }
            assert_eq!(nearest, assigned);
        }
    }

    #[test]
    fn empty_population_is_a_no_op() {
        let mut engine = KMeansEngine::new(EuclideanRgb);
        let outcome = engine.run_with_rng(&[], 4, &mut StdRng::seed_from_u64(1));
        assert!(outcome.centroids.is_empty());
        assert!(outcome.assignment.is_empty());
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let samples: Vec<RgbSample> =
            (0..48).map(|v| [(v * 5) % 256, (v * 7) % 256, (v * 11) % 256]).collect();

        let mut first_engine = KMeansEngine::new(EuclideanRgb);
        let first = first_engine.run_with_rng(&samples, 4, &mut StdRng::seed_from_u64(99));
        let mut second_engine = KMeansEngine::new(EuclideanRgb);
        let second = second_engine.run_with_rng(&samples, 4, &mut StdRng::seed_from_u64(99));

        assert_eq!(first.centroids, second.centroids);
        assert_eq!(first.assignment, second.assignment);
        assert_eq!(first.iterations, second.iterations);
    }

    #[test]
    fn scalar_mahalanobis_clusters_bimodal_samples() {
        let samples: Vec<GraySample> = vec![5, 8, 11, 240, 245, 250];

        let mut seeds_exercised = 0;
        for seed in 0..32 {
            let draws = initial_draws(&samples, 2, seed);
            if draws[0] == draws[1] {
                continue;
            }
            seeds_exercised += 1;

            let mut engine = KMeansEngine::new(ScalarMahalanobis::new());
            let outcome = engine.run_with_rng(&samples, 2, &mut StdRng::seed_from_u64(seed));

            // Low samples share one cluster, high samples the other.
            let low = outcome.assignment[0];
            assert!(outcome.assignment[..3].iter().all(|&c| c == low));
            assert!(outcome.assignment[3..].iter().all(|&c| c != low));
        }
        assert!(seeds_exercised > 0);
    }
}
