// demos/swaption_demo.rs
use lfm_mc::analytics::black76::price_caps;
use lfm_mc::analytics::hull_white::{Bounds, HullWhiteCapModel, HullWhiteParams, NelderMeadOptions};
use lfm_mc::math_utils::Timer;
use lfm_mc::mc::mc_engine::{LfmConfig, LfmEngine};
use lfm_mc::models::correlation::Decomposition;
use lfm_mc::output;
use lfm_mc::LfmResult;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lfm_mc=info,swaption_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run() {
        error!("demo failed: {}", e);
        std::process::exit(1);
    }
}

fn load_config() -> Result<LfmConfig, Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args.get(i + 1).ok_or("--config needs a file argument")?;
            let text = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&text)?)
        }
        None => Ok(LfmConfig {
            paths: 100_000,
            ..Default::default()
        }),
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Running lfm-mc Swaption Demo\n");

    let config = load_config()?;
    println!("Configuration:\n{}\n", serde_json::to_string_pretty(&config)?);

    for decomposition in [Decomposition::Eigen, Decomposition::Cholesky] {
        let engine = LfmEngine::new(LfmConfig {
            decomposition,
            ..config.clone()
        })?;

        let mut timer = Timer::new();
        timer.start();
        let result = engine.run()?;
        let elapsed = timer.elapsed_ms();

        println!("--- {:?} decomposition ---", decomposition);
        println!("{}", serde_json::to_string_pretty(&result)?);
        println!(
            "Time: {:.2} ms ({:.0} paths/sec)\n",
            elapsed,
            result.paths as f64 / (elapsed / 1000.0)
        );

        if decomposition == Decomposition::Eigen {
            std::fs::create_dir_all("results")?;
            output::write_summary_to_csv("results/swaption_summary.csv", &result)?;
            output::write_forward_path_csv("results/forward_path_0.csv", &engine.sample_path(0)?)?;
            info!("wrote results/swaption_summary.csv and results/forward_path_0.csv");
        }
    }

    cap_calibration_demo()?;
    Ok(())
}

fn cap_calibration_demo() -> LfmResult<()> {
    println!("--- Hull-White calibration to Black-76 caps ---");

    let model = HullWhiteCapModel::from_zero_rates(
        vec![1.0, 2.0, 3.0, 4.0],
        &[0.01, 0.02, 0.03, 0.04],
        0.05,
        100.0,
    )?;
    let market = price_caps(model.discounts(), model.expiries(), 0.05, 100.0, &[0.5; 3])?;
    let calibration = model.calibrate_to_caps(
        &market,
        HullWhiteParams { a: 0.05, sigma: 0.02 },
        &Bounds::hull_white(),
        NelderMeadOptions::default(),
    )?;
    let fitted = model.caplet_prices(calibration.params)?;

    println!("{:>8} {:>12} {:>12}", "Caplet", "Black-76", "Hull-White");
    for (i, (m, f)) in market.iter().zip(fitted.iter()).enumerate() {
        println!("{:>8} {:>12.6} {:>12.6}", i + 1, m, f);
    }
    println!(
        "a = {:.6}, sigma = {:.6}, squared relative error = {:.6e} ({} iterations)",
        calibration.params.a, calibration.params.sigma, calibration.objective, calibration.iterations
    );
    Ok(())
}
