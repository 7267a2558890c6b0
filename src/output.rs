// src/output.rs
use crate::mc::accumulator::SimulationResult;
use crate::models::lfm::ForwardRatePath;
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// One row per time step: `step,F0,F1,...`
pub fn write_forward_path_csv(filename: &str, path: &ForwardRatePath) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(filename)?);
    let header: Vec<String> = (0..path.rate_count()).map(|k| format!("F{}", k)).collect();
    writeln!(file, "step,{}", header.join(","))?;
    for (l, row) in path.as_array().outer_iter().enumerate() {
        let values: Vec<String> = row.iter().map(|f| f.to_string()).collect();
        writeln!(file, "{},{}", l, values.join(","))?;
    }
    file.flush()
}

pub fn write_summary_to_csv(filename: &str, result: &SimulationResult) -> io::Result<()> {
    let mut file = File::create(filename)?;
    writeln!(file, "price,{}", result.price)?;
    writeln!(file, "standard_deviation,{}", result.standard_deviation)?;
    writeln!(file, "standard_error,{}", result.standard_error)?;
    writeln!(file, "paths,{}", result.paths)?;
    writeln!(file, "excluded_paths,{}", result.excluded_paths)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mc::mc_engine::{LfmConfig, LfmEngine};

    #[test]
    fn test_write_forward_path_csv() {
        let engine = LfmEngine::new(LfmConfig {
            paths: 2,
            ..Default::default()
        })
        .unwrap();
        let path = engine.sample_path(0).unwrap();

        let filename = std::env::temp_dir().join("lfm_mc_path_test.csv");
        let filename = filename.to_string_lossy().to_string();
        write_forward_path_csv(&filename, &path).unwrap();

        let content = std::fs::read_to_string(&filename).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 12);
        assert!(lines[0].starts_with("step,F0,F1"));
        assert!(lines[1].starts_with("0,0.05,0.05"));
        let _ = std::fs::remove_file(&filename);
    }

    #[test]
    fn test_write_summary_to_csv() {
        let result = SimulationResult {
            price: 0.1,
            standard_deviation: 0.06,
            standard_error: 0.002,
            paths: 1000,
            excluded_paths: 0,
        };
        let filename = std::env::temp_dir().join("lfm_mc_summary_test.csv");
        let filename = filename.to_string_lossy().to_string();
        write_summary_to_csv(&filename, &result).unwrap();

        let content = std::fs::read_to_string(&filename).unwrap();
        assert!(content.contains("price,0.1"));
        assert!(content.contains("paths,1000"));
        let _ = std::fs::remove_file(&filename);
    }
}
