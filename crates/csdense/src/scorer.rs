//! Heuristic Scorer (C5): the gated density score for a (seed, candidate)
//! pair.
//!
//! Grounded on `original_source/src/srcreduce/main.py::heuristic`. The size
//! lookups are expressed over the `SizeSource` trait rather than calling
//! `crate::sizer` directly, so tests can stub source/binary sizes without a
//! C toolchain (per the fake-`Sizer` requirement).

use std::path::Path;

use crate::{config::RunConfig, error::SizeError, sizer};

/// Abstracts over `csdense::sizer` so the gate logic can be tested against
/// literal (source_bytes, text_bytes) pairs.
pub trait SizeSource {
    fn source_size(&self, path: &Path) -> Result<u64, SizeError>;
    fn binary_text_size(&self, path: &Path, config: &RunConfig) -> Result<u64, SizeError>;
}

/// The production `SizeSource`: compiles and measures via `csdense::sizer`.
pub struct RealSizer;

impl SizeSource for RealSizer {
    fn source_size(&self, path: &Path) -> Result<u64, SizeError> {
        sizer::source_size(path)
    }

    fn binary_text_size(&self, path: &Path, config: &RunConfig) -> Result<u64, SizeError> {
        sizer::binary_text_size(path, config)
    }
}

/// Gated density score (spec §4.5). Gates are applied in order; the first
/// one that fails yields `0.0` without evaluating the rest.
pub fn score<S: SizeSource>(
    sizer: &S,
    seed_path: &Path,
    cand_path: &Path,
    config: &RunConfig,
) -> Result<f64, SizeError> {
    let seed_source_bytes = sizer.source_size(seed_path)?;
    let cand_source_bytes = sizer.source_size(cand_path)?;

    // Gate 1: candidate must not have grown the source.
    if (seed_source_bytes as i128) - (cand_source_bytes as i128) < 0 {
        return Ok(0.0);
    }

    let seed_text_bytes = sizer.binary_text_size(seed_path, config)?;
    let cand_text_bytes = sizer.binary_text_size(cand_path, config)?;

    // Gate 2: candidate must not have shrunk the binary.
    if (seed_text_bytes as i128) - (cand_text_bytes as i128) > 0 {
        return Ok(0.0);
    }

    // Gate 3: degenerate (near-empty) source floor.
    if cand_source_bytes <= RunConfig::DEGENERATE_SOURCE_FLOOR {
        return Ok(0.0);
    }

    Ok(cand_text_bytes as f64 / cand_source_bytes as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, path::PathBuf, time::Duration};

    struct FakeSizer {
        sources: HashMap<PathBuf, u64>,
        texts: HashMap<PathBuf, u64>,
    }

    impl FakeSizer {
        fn new() -> Self {
            Self {
                sources: HashMap::new(),
                texts: HashMap::new(),
            }
        }

        fn with(mut self, path: &str, source: u64, text: u64) -> Self {
            self.sources.insert(PathBuf::from(path), source);
            self.texts.insert(PathBuf::from(path), text);
            self
        }
    }

    impl SizeSource for FakeSizer {
        fn source_size(&self, path: &Path) -> Result<u64, SizeError> {
            Ok(*self.sources.get(path).expect("unconfigured path"))
        }

        fn binary_text_size(&self, path: &Path, _config: &RunConfig) -> Result<u64, SizeError> {
            Ok(*self.texts.get(path).expect("unconfigured path"))
        }
    }

    fn dummy_config() -> RunConfig {
        RunConfig {
            generator: "/bin/true".into(),
            reducer: "/bin/true".into(),
            compiler: "/usr/bin/cc".into(),
            generator_include: "/usr/include".into(),
            opt_level: crate::config::OptLevel::O1,
            seed_source: crate::config::SeedSource::Example("/dev/null".into()),
            overall_timeout: Duration::from_secs(60),
            reducer_pass_timeout: Duration::from_secs(5),
            reducer_iteration_timeout: Duration::from_secs(5),
            max_iterations: 10,
            regenerate_on_empty: true,
            output_dir: "/tmp".into(),
        }
    }

    #[test]
    fn floor_gate_returns_zero_despite_favorable_ratio() {
        let sizer = FakeSizer::new()
            .with("seed.c", 100, 10)
            .with("cand.c", 400, 5000);
        let score = score(&sizer, Path::new("seed.c"), Path::new("cand.c"), &dummy_config())
            .unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn shrink_binary_gate_returns_zero() {
        let sizer = FakeSizer::new()
            .with("seed.c", 2000, 1000)
            .with("cand.c", 1500, 900);
        let score = score(&sizer, Path::new("seed.c"), Path::new("cand.c"), &dummy_config())
            .unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn positive_path_computes_density() {
        let sizer = FakeSizer::new()
            .with("seed.c", 2000, 1000)
            .with("cand.c", 1200, 1100);
        let score = score(&sizer, Path::new("seed.c"), Path::new("cand.c"), &dummy_config())
            .unwrap();
        assert!((score - (1100.0 / 1200.0)).abs() < 1e-9);
    }

    #[test]
    fn grown_source_gate_returns_zero() {
        let sizer = FakeSizer::new()
            .with("seed.c", 600, 1000)
            .with("cand.c", 900, 1200);
        let score = score(&sizer, Path::new("seed.c"), Path::new("cand.c"), &dummy_config())
            .unwrap();
        assert_eq!(score, 0.0);
    }
}
