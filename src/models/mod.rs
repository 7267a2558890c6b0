// src/models/mod.rs
pub mod correlation;
pub mod diffusion;
pub mod lfm;
pub mod volatility;
