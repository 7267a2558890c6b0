// tests/correlation_test.rs
use lfm_mc::models::correlation::{
    CorrelationDecomposer, CorrelationMatrix, Decomposition, DEFAULT_PSD_TOLERANCE,
};
use lfm_mc::rng::{DeviateSource, DeviateStreams, NormalDeviates, RngFactory};

fn sample_covariance(decomposer: &CorrelationDecomposer, samples: usize, seed: u64) -> Vec<Vec<f64>> {
    let m = decomposer.dim();
    let mut stream = NormalDeviates::new(seed);
    let mut dw = vec![0.0; m];
    let mut z = vec![0.0; m];
    let mut cov = vec![vec![0.0; m]; m];

    for _ in 0..samples {
        stream.fill_deviates(&mut dw);
        decomposer.generate_into(&dw, &mut z);
        for i in 0..m {
            for j in 0..m {
                cov[i][j] += z[i] * z[j];
            }
        }
    }
    for row in cov.iter_mut() {
        for c in row.iter_mut() {
            *c /= samples as f64;
        }
    }
    cov
}

#[test]
fn test_single_rate_strategies_are_indistinguishable() {
    let matrix = CorrelationMatrix::identity(1).unwrap();
    let eigen = CorrelationDecomposer::eigen(&matrix, DEFAULT_PSD_TOLERANCE).unwrap();
    let cholesky = CorrelationDecomposer::cholesky(&matrix, DEFAULT_PSD_TOLERANCE).unwrap();

    let factory = RngFactory::new(17);
    let mut a = factory.stream_for_path(0);
    let mut b = factory.stream_for_path(0);
    let mut dw_a = [0.0];
    let mut dw_b = [0.0];
    let (mut sum_a, mut sum_b, mut sq_a, mut sq_b) = (0.0, 0.0, 0.0, 0.0);

    let n = 20_000;
    for _ in 0..n {
        a.fill_deviates(&mut dw_a);
        b.fill_deviates(&mut dw_b);
        let za = eigen.generate(&dw_a).unwrap()[0];
        let zb = cholesky.generate(&dw_b).unwrap()[0];
        assert!((za.abs() - zb.abs()).abs() < 1e-12);
        sum_a += za;
        sum_b += zb;
        sq_a += za * za;
        sq_b += zb * zb;
    }

    let var_a = sq_a / n as f64 - (sum_a / n as f64).powi(2);
    let var_b = sq_b / n as f64 - (sum_b / n as f64).powi(2);
    assert!((var_a - var_b).abs() < 1e-9);
    assert!((var_a - 1.0).abs() < 0.05);
}

#[test]
fn test_two_by_two_sample_correlation() {
    let rho = 0.6;
    let matrix = CorrelationMatrix::new(vec![vec![1.0, rho], vec![rho, 1.0]]).unwrap();

    for strategy in [Decomposition::Eigen, Decomposition::Cholesky] {
        let decomposer = CorrelationDecomposer::new(&matrix, strategy, DEFAULT_PSD_TOLERANCE).unwrap();
        let cov = sample_covariance(&decomposer, 50_000, 5);
        println!("\n{:?}: {:?}", strategy, cov);

        assert!((cov[0][0] - 1.0).abs() < 0.03, "{:?} var0 = {}", strategy, cov[0][0]);
        assert!((cov[1][1] - 1.0).abs() < 0.03, "{:?} var1 = {}", strategy, cov[1][1]);
        assert!((cov[0][1] - rho).abs() < 0.03, "{:?} cov = {}", strategy, cov[0][1]);
    }
}

#[test]
fn test_reference_matrix_sample_correlation() {
    let matrix = CorrelationMatrix::reference();
    for strategy in [Decomposition::Eigen, Decomposition::Cholesky] {
        let decomposer = CorrelationDecomposer::new(&matrix, strategy, DEFAULT_PSD_TOLERANCE).unwrap();
        let cov = sample_covariance(&decomposer, 40_000, 11);
        for i in 0..10 {
            for j in 0..10 {
                // rounding noise in the quoted matrix bounds the reproduction error
                assert!(
                    (cov[i][j] - matrix.get(i, j)).abs() < 0.05,
                    "{:?} ({}, {}): {} vs {}",
                    strategy,
                    i,
                    j,
                    cov[i][j],
                    matrix.get(i, j)
                );
            }
        }
    }
}
