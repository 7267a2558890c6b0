// src/solvers/euler_maruyama.rs
//! Euler-Maruyama Scheme for Diffusion Processes
//!
//! # Mathematical Framework
//!
//! For a one-dimensional diffusion:
//! ```text
//! dX_t = a(X_t, t) dt + b(X_t, t) dW_t
//! ```
//!
//! The Euler-Maruyama scheme provides the discretization:
//! ```text
//! X_{n+1} = X_n + a(X_n, t_n) Δt + b(X_n, t_n) √Δt Z_n
//! ```
//! with `Z_n ~ N(0,1)` independent.
//!
//! # Convergence Properties
//!
//! - **Strong convergence**: Order 0.5 in step size
//! - **Weak convergence**: Order 1.0 in step size

use crate::models::diffusion::DiffusionProcess;
use crate::rng;
use rand::Rng;

/// Euler-Maruyama numerical scheme for diffusion processes
#[derive(Debug, Clone, Copy, Default)]
pub struct EulerMaruyama;

impl EulerMaruyama {
    pub fn new() -> Self {
        EulerMaruyama
    }

    /// Single step driven by a given standard-normal draw `z`
    pub fn step_with_draw<P: DiffusionProcess + ?Sized>(
        process: &P,
        x: &mut f64,
        t: f64,
        dt: f64,
        z: f64,
    ) {
        let drift_term = process.drift(*x, t) * dt;
        let diffusion_term = process.diffusion(*x, t) * dt.sqrt() * z;
        *x += drift_term + diffusion_term;
    }

    /// Single Euler-Maruyama step
    ///
    /// # Parameters
    /// - `process`: diffusion providing drift and diffusion coefficients
    /// - `x`: Current state (modified in-place)
    /// - `t`: Current time
    /// - `dt`: Time step size
    /// - `rng`: Random number generator
    pub fn step<P: DiffusionProcess + ?Sized, R: Rng + ?Sized>(
        process: &P,
        x: &mut f64,
        t: f64,
        dt: f64,
        rng: &mut R,
    ) {
        let z = rng::get_normal_draw(rng);
        Self::step_with_draw(process, x, t, dt, z);
    }

    /// Path of `steps + 1` values starting from `process.x0()`
    pub fn simulate<P: DiffusionProcess + ?Sized, R: Rng + ?Sized>(
        process: &P,
        steps: usize,
        dt: f64,
        rng: &mut R,
    ) -> Vec<f64> {
        let mut path = Vec::with_capacity(steps + 1);
        let mut x = process.x0();
        path.push(x);
        for i in 0..steps {
            Self::step(process, &mut x, i as f64 * dt, dt, rng);
            path.push(x);
        }
        path
    }
}
