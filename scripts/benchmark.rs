// scripts/benchmark.rs
use lfm_mc::analytics::black76::price_caps;
use lfm_mc::analytics::hull_white::{Bounds, HullWhiteCapModel, HullWhiteParams, NelderMeadOptions};
use lfm_mc::math_utils::Timer;
use lfm_mc::mc::mc_engine::{LfmConfig, LfmEngine};
use lfm_mc::models::correlation::Decomposition;
use serde::Serialize;
use std::env;
use std::fs::File;
use std::io::Write;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Serialize)]
struct SystemInfo {
    os: String,
    cpu_model: String,
    cpu_cores: usize,
    rustc_flags: String,
    rayon_threads: usize,
}

impl SystemInfo {
    fn gather() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            cpu_model: Self::get_cpu_model(),
            cpu_cores: num_cpus::get(),
            rustc_flags: env::var("RUSTFLAGS").unwrap_or_else(|_| "default".to_string()),
            rayon_threads: rayon::current_num_threads(),
        }
    }

    fn get_cpu_model() -> String {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|line| line.starts_with("model name"))
                    .and_then(|line| line.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
            .unwrap_or_else(|| "Unknown CPU".to_string())
    }
}

#[derive(Debug, Serialize)]
struct BenchmarkResult {
    name: String,
    paths: usize,
    workers: usize,
    time_ms: f64,
    throughput_paths_per_sec: f64,
    value: f64,
    standard_error: Option<f64>,
}

fn run_swaption_benchmarks() -> Result<Vec<BenchmarkResult>, Box<dyn std::error::Error>> {
    let mut results = Vec::new();
    let cores = num_cpus::get();

    for &paths in &[10_000, 100_000, 1_000_000] {
        println!("Running swaption benchmarks with {} paths...", paths);

        for decomposition in [Decomposition::Eigen, Decomposition::Cholesky] {
            for workers in [1, cores] {
                if paths == 1_000_000 && workers == 1 {
                    continue;
                }
                let engine = LfmEngine::new(LfmConfig {
                    paths,
                    workers,
                    decomposition,
                    seed: 42,
                    ..Default::default()
                })?;

                let mut timer = Timer::new();
                timer.start();
                let result = engine.run()?;
                let time_ms = timer.elapsed_ms();

                results.push(BenchmarkResult {
                    name: format!("LFM Swaption {:?}", decomposition),
                    paths,
                    workers,
                    time_ms,
                    throughput_paths_per_sec: paths as f64 / (time_ms / 1000.0),
                    value: result.price,
                    standard_error: Some(result.standard_error),
                });
            }
        }
    }

    Ok(results)
}

fn run_calibration_benchmark() -> Result<BenchmarkResult, Box<dyn std::error::Error>> {
    println!("Benchmarking Hull-White cap calibration...");

    let model = HullWhiteCapModel::from_zero_rates(
        vec![1.0, 2.0, 3.0, 4.0],
        &[0.01, 0.02, 0.03, 0.04],
        0.05,
        100.0,
    )?;
    let market = price_caps(model.discounts(), model.expiries(), 0.05, 100.0, &[0.5; 3])?;

    let mut timer = Timer::new();
    timer.start();
    let calibration = model.calibrate_to_caps(
        &market,
        HullWhiteParams { a: 0.05, sigma: 0.02 },
        &Bounds::hull_white(),
        NelderMeadOptions::default(),
    )?;
    let time_ms = timer.elapsed_ms();

    Ok(BenchmarkResult {
        name: "Hull-White Cap Calibration".to_string(),
        paths: 0,
        workers: 1,
        time_ms,
        throughput_paths_per_sec: 0.0,
        value: calibration.objective,
        standard_error: None,
    })
}

fn write_results_to_csv(
    results: &[BenchmarkResult],
    system_info: &SystemInfo,
    filename: &str,
) -> std::io::Result<()> {
    let mut file = File::create(filename)?;

    writeln!(file, "# System Information")?;
    writeln!(file, "# OS: {}", system_info.os)?;
    writeln!(file, "# CPU: {}", system_info.cpu_model)?;
    writeln!(file, "# CPU Cores: {}", system_info.cpu_cores)?;
    writeln!(file, "# RUSTFLAGS: {}", system_info.rustc_flags)?;
    writeln!(file, "# Rayon Threads: {}", system_info.rayon_threads)?;
    writeln!(
        file,
        "# Benchmark Date: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(file, "#")?;

    writeln!(
        file,
        "Benchmark,Paths,Workers,Time_ms,Throughput_paths_per_sec,Value,Standard_Error"
    )?;
    for result in results {
        writeln!(
            file,
            "{},{},{},{:.2},{:.0},{:.8},{}",
            result.name,
            result.paths,
            result.workers,
            result.time_ms,
            result.throughput_paths_per_sec,
            result.value,
            result
                .standard_error
                .map(|e| format!("{:.8}", e))
                .unwrap_or_else(|| "N/A".to_string())
        )?;
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lfm_mc=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("lfm-mc Benchmark Suite");
    println!("======================\n");

    let system_info = SystemInfo::gather();
    println!("System Information:");
    println!("{}\n", serde_json::to_string_pretty(&system_info)?);

    let mut all_results = run_swaption_benchmarks()?;
    all_results.push(run_calibration_benchmark()?);

    println!("\n{:=<96}", "");
    println!("BENCHMARK RESULTS");
    println!("{:=<96}", "");
    println!(
        "{:<30} {:>9} {:>8} {:>12} {:>15} {:>10} {:>10}",
        "Benchmark", "Paths", "Workers", "Time (ms)", "Throughput", "Value", "Std Err"
    );
    println!("{:-<96}", "");
    for result in &all_results {
        println!(
            "{:<30} {:>9} {:>8} {:>12.2} {:>15.0} {:>10.6} {:>10}",
            result.name,
            result.paths,
            result.workers,
            result.time_ms,
            result.throughput_paths_per_sec,
            result.value,
            result
                .standard_error
                .map(|e| format!("{:.6}", e))
                .unwrap_or_else(|| "N/A".to_string())
        );
    }
    println!("{:=<96}", "");

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("benchmark_results_{}.csv", timestamp);
    write_results_to_csv(&all_results, &system_info, &filename)?;
    std::fs::write(
        format!("benchmark_results_{}.json", timestamp),
        serde_json::to_string_pretty(&all_results)?,
    )?;

    println!("\nResults saved to: {}", filename);
    println!("Run: cargo run --bin benchmark --release");
    Ok(())
}
