// src/mc/mod.rs
pub mod accumulator;
pub mod mc_engine;
pub mod payoffs;
