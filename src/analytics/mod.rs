// src/analytics/mod.rs
pub mod black76;
pub mod bs_analytic;
pub mod hull_white;
