// src/mc/mc_engine.rs
use crate::error::{validation::*, LfmError, LfmResult};
use crate::mc::accumulator::{PartialSums, SimulationResult};
use crate::mc::payoffs::{payer_swaption_value, SwapRateValuer};
use crate::models::correlation::{
    CorrelationDecomposer, CorrelationMatrix, Decomposition, DEFAULT_PSD_TOLERANCE,
};
use crate::models::lfm::{ForwardRatePath, ForwardRatePathSimulator};
use crate::models::volatility::{TenorSchedule, VolatilityCurve, VolatilitySpec};
use crate::rng::{DeviateStreams, RngFactory};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Every input of a swaption run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LfmConfig {
    pub correlation: CorrelationMatrix,
    /// Flat initial forward rate F₀, also used for the terminal discount
    pub initial_rate: f64,
    pub strike: f64,
    pub maturity: f64,
    pub paths: usize,
    pub steps: usize,
    /// Number of forward rates m; must match the correlation matrix
    pub rates: usize,
    /// Index n of the numeraire bond, `1 <= n < m`
    pub numeraire: usize,
    pub decomposition: Decomposition,
    pub volatility: VolatilitySpec,
    /// Accrual factor of every period after the anchor
    pub tenor: f64,
    pub seed: u64,
    /// Number of contiguous path blocks; 0 uses every available core
    pub workers: usize,
    pub psd_tolerance: f64,
}

impl LfmConfig {
    /// Validate the run configuration
    pub fn validate(&self) -> LfmResult<()> {
        validate_paths(self.paths)?;
        validate_steps(self.steps)?;
        validate_positive("initial_rate", self.initial_rate)?;
        validate_finite("initial_rate", self.initial_rate)?;
        validate_non_negative("strike", self.strike)?;
        validate_finite("strike", self.strike)?;
        validate_positive("maturity", self.maturity)?;
        validate_finite("maturity", self.maturity)?;
        validate_positive("tenor", self.tenor)?;
        validate_non_negative("psd_tolerance", self.psd_tolerance)?;
        validate_len("correlation matrix", self.rates, self.correlation.dim())?;
        validate_numeraire(self.numeraire, self.rates)?;

        if self.steps < self.rates {
            return Err(LfmError::DimensionMismatch {
                what: "steps (volatility curve and tenor schedule are indexed by rate)"
                    .to_string(),
                expected: self.rates,
                actual: self.steps,
            });
        }

        Ok(())
    }

    /// Worker count after resolving 0 to the number of cores
    pub fn resolved_workers(&self) -> usize {
        let workers = if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        };
        workers.clamp(1, self.paths.max(1))
    }
}

impl Default for LfmConfig {
    fn default() -> Self {
        LfmConfig {
            correlation: CorrelationMatrix::reference(),
            initial_rate: 0.05,
            strike: 0.065,
            maturity: 1.0,
            paths: 10_000,
            steps: 10,
            rates: 10,
            numeraire: 1,
            decomposition: Decomposition::Eigen,
            volatility: VolatilitySpec::default(),
            tenor: 0.5,
            seed: 12345,
            workers: 0,
            psd_tolerance: DEFAULT_PSD_TOLERANCE,
        }
    }
}

/// Monte Carlo swaption pricer under the LIBOR Market Model
///
/// # Algorithm
///
/// For every path the simulator produces N rows of forward rates. Each row
/// is turned into a swap rate S and annuity A, and the path contributes
/// ```text
/// x = Σ_l max(S_l − K, 0) · A_l
/// ```
/// The paths are split into `workers` contiguous blocks. Every block owns
/// its deviate streams (derived from the seed and path index) and its
/// partial sums; the partials are merged in block order, so a given
/// partition and seed always produce the same bits.
///
/// # Divergence
///
/// A path whose rates leave the log domain is dropped from the estimate and
/// counted in [`SimulationResult::excluded_paths`].
#[derive(Debug, Clone)]
pub struct LfmEngine {
    config: LfmConfig,
    simulator: ForwardRatePathSimulator,
}

impl LfmEngine {
    /// Validate the configuration and precompute the shared run state
    pub fn new(config: LfmConfig) -> LfmResult<Self> {
        config.validate()?;

        let decomposer = CorrelationDecomposer::new(
            &config.correlation,
            config.decomposition,
            config.psd_tolerance,
        )?;
        let volatility = VolatilityCurve::new(&config.volatility, config.steps, config.maturity)?;
        let tenors = TenorSchedule::constant(config.tenor, config.steps)?;
        let simulator = ForwardRatePathSimulator::new(
            config.correlation.clone(),
            decomposer,
            volatility,
            tenors,
            config.initial_rate,
            config.numeraire,
        )?;

        Ok(Self { config, simulator })
    }

    pub fn config(&self) -> &LfmConfig {
        &self.config
    }

    pub fn simulator(&self) -> &ForwardRatePathSimulator {
        &self.simulator
    }

    /// Price with the seeded normal streams of the configuration
    pub fn run(&self) -> LfmResult<SimulationResult> {
        self.run_with_streams(&RngFactory::new(self.config.seed), None)
    }

    /// Price with caller-supplied deviate streams.
    ///
    /// `cancel` is polled between paths; once set, the run stops with
    /// [`LfmError::Cancelled`].
    pub fn run_with_streams<D: DeviateStreams>(
        &self,
        streams: &D,
        cancel: Option<&AtomicBool>,
    ) -> LfmResult<SimulationResult> {
        let workers = self.config.resolved_workers();
        let blocks = partition(self.config.paths, workers);

        info!(
            paths = self.config.paths,
            steps = self.config.steps,
            rates = self.config.rates,
            numeraire = self.config.numeraire,
            decomposition = ?self.config.decomposition,
            workers,
            "starting LFM swaption simulation"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| LfmError::ConfigurationError {
                field: "workers".to_string(),
                reason: e.to_string(),
            })?;

        let partials: Vec<LfmResult<PartialSums>> = pool.install(|| {
            blocks
                .par_iter()
                .enumerate()
                .map(|(block, range)| self.run_block(block, range.clone(), streams, cancel))
                .collect()
        });

        let mut total = PartialSums::new();
        let mut completed = 0;
        let mut cancelled = false;
        for partial in partials {
            match partial {
                Ok(sums) => {
                    completed += sums.accepted + sums.excluded;
                    total.merge(sums);
                }
                Err(LfmError::Cancelled { completed_paths }) => {
                    completed += completed_paths;
                    cancelled = true;
                }
                Err(e) => return Err(e),
            }
        }
        if cancelled {
            warn!(completed, "simulation cancelled");
            return Err(LfmError::Cancelled {
                completed_paths: completed,
            });
        }

        let result = total.finalize(self.config.initial_rate, self.config.maturity)?;
        info!(
            price = result.price,
            standard_error = result.standard_error,
            excluded = result.excluded_paths,
            "simulation finished"
        );
        Ok(result)
    }

    /// One path with the configured seed, for inspection or export
    pub fn sample_path(&self, path_id: usize) -> LfmResult<ForwardRatePath> {
        let mut stream = RngFactory::new(self.config.seed).stream_for_path(path_id as u64);
        self.simulator.simulate_path(path_id, &mut stream)
    }

    fn run_block<D: DeviateStreams>(
        &self,
        block: usize,
        range: Range<usize>,
        streams: &D,
        cancel: Option<&AtomicBool>,
    ) -> LfmResult<PartialSums> {
        debug!(block, start = range.start, end = range.end, "worker block");

        let valuer = SwapRateValuer::new(self.simulator.tenors().accruals());
        let strike = self.config.strike;
        let mut sums = PartialSums::new();

        for path_id in range {
            if cancel.map_or(false, |flag| flag.load(Ordering::Relaxed)) {
                return Err(LfmError::Cancelled {
                    completed_paths: sums.accepted + sums.excluded,
                });
            }

            let mut stream = streams.stream_for_path(path_id as u64);
            match self.simulator.simulate_path(path_id, &mut stream) {
                Ok(path) => {
                    let total: f64 = path
                        .step_rows()
                        .map(|row| payer_swaption_value(&valuer.value(row), strike))
                        .sum();
                    sums.add_path(total);
                }
                Err(e @ LfmError::NumericalDivergence { .. }) => {
                    warn!(block, error = %e, "excluding diverged path");
                    sums.exclude(e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(sums)
    }
}

/// Split `0..paths` into `workers` contiguous, nearly equal blocks.
pub fn partition(paths: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    (0..workers)
        .map(|b| (b * paths / workers)..((b + 1) * paths / workers))
        .filter(|range| !range.is_empty())
        .collect()
}

/// Price a European payer swaption under the LIBOR Market Model
///
/// # Returns
///
/// Discounted price with its standard deviation and standard error.
///
/// # Errors
///
/// - `ConfigurationError` / `DimensionMismatch` / `InvalidParameters` for a bad configuration
/// - `InvalidMatrix` if the correlation matrix is not positive semi-definite
/// - `NumericalDivergence` if fewer than two paths stayed finite
pub fn price_swaption_lfm(cfg: &LfmConfig) -> LfmResult<SimulationResult> {
    LfmEngine::new(cfg.clone())?.run()
}
