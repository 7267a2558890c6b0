// src/rng.rs
//! Random deviate sources for the forward-rate simulation
//!
//! # Design
//!
//! The engine needs one vector of m independent standard-normal draws per
//! (path, step). Two properties matter:
//! 1. **Reproducibility**: same seed → same results, whatever the worker count
//! 2. **Parallel safety**: workers never share generator state
//!
//! Both come from deriving the stream for a path from `(seed, path_id)` alone.
//! A worker owns the streams of the paths in its block, so the draws a path
//! sees do not depend on how the paths were partitioned.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// Supplies independent standard-normal draws, one slice at a time.
pub trait DeviateSource {
    /// Overwrite `out` with independent N(0,1) draws.
    fn fill_deviates(&mut self, out: &mut [f64]);
}

/// Hands out one deviate stream per simulated path.
///
/// Implementations are shared read-only across workers.
pub trait DeviateStreams: Sync {
    type Stream: DeviateSource;

    fn stream_for_path(&self, path_id: u64) -> Self::Stream;
}

/// Seeded standard-normal stream backed by `StdRng`.
#[derive(Debug, Clone)]
pub struct NormalDeviates {
    rng: StdRng,
}

impl NormalDeviates {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: seed_rng_from_u64(seed),
        }
    }
}

impl DeviateSource for NormalDeviates {
    fn fill_deviates(&mut self, out: &mut [f64]) {
        for x in out.iter_mut() {
            *x = get_normal_draw(&mut self.rng);
        }
    }
}

/// RNG factory for reproducible parallel simulations
#[derive(Debug, Clone, Copy)]
pub struct RngFactory {
    base_seed: u64,
}

impl RngFactory {
    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    /// Create a standard RNG for a specific path
    pub fn create_std_rng(&self, path_id: u64) -> StdRng {
        StdRng::seed_from_u64(self.base_seed.wrapping_add(path_id))
    }
}

impl DeviateStreams for RngFactory {
    type Stream = NormalDeviates;

    fn stream_for_path(&self, path_id: u64) -> NormalDeviates {
        NormalDeviates {
            rng: self.create_std_rng(path_id),
        }
    }
}

/// Degenerate source that always draws zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroDeviates;

impl DeviateSource for ZeroDeviates {
    fn fill_deviates(&mut self, out: &mut [f64]) {
        out.fill(0.0);
    }
}

/// Streams of [`ZeroDeviates`], used to run the engine deterministically.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroStreams;

impl DeviateStreams for ZeroStreams {
    type Stream = ZeroDeviates;

    fn stream_for_path(&self, _path_id: u64) -> ZeroDeviates {
        ZeroDeviates
    }
}

pub fn seed_rng_from_u64(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn get_normal_draw<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_stream_reproducibility() {
        let factory = RngFactory::new(42);

        let mut s1 = factory.stream_for_path(7);
        let mut s2 = factory.stream_for_path(7);
        let mut a = vec![0.0; 16];
        let mut b = vec![0.0; 16];

        for _ in 0..10 {
            s1.fill_deviates(&mut a);
            s2.fill_deviates(&mut b);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_different_paths_differ() {
        let factory = RngFactory::new(42);

        let mut a = vec![0.0; 10];
        let mut b = vec![0.0; 10];
        factory.stream_for_path(0).fill_deviates(&mut a);
        factory.stream_for_path(1).fill_deviates(&mut b);

        assert_ne!(a, b);
    }

    #[test]
    fn test_normal_distribution() {
        let mut stream = NormalDeviates::new(42);
        let mut samples = vec![0.0; 20_000];
        stream.fill_deviates(&mut samples);

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance =
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;

        assert!(mean.abs() < 0.05, "Mean should be close to 0, got {}", mean);
        assert!(
            (variance - 1.0).abs() < 0.05,
            "Variance should be close to 1, got {}",
            variance
        );
    }

    #[test]
    fn test_zero_streams() {
        let mut out = vec![1.0; 5];
        ZeroStreams.stream_for_path(3).fill_deviates(&mut out);
        assert!(out.iter().all(|&x| x == 0.0));
    }
}
