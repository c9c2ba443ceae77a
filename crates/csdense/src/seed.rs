//! Seed Generator (C4): produce a fresh accepted C program, or read one from
//! disk when running in `--example` mode.
//!
//! Grounded on `original_source/src/srcreduce/main.py::new_seed`, which
//! shells out to the generator, rejection-samples against the sanitizer
//! gate, and writes the accepted program under `output_dir`.

use std::path::{Path, PathBuf};

use crate::{
    config::{GeneratorShape, RunConfig, SeedSource},
    error::SeedError,
    process::{self, Stdio},
    sanitizer,
};

/// Produce the next seed (spec §4.4): either a freshly generated, sanitizer
/// -accepted program written to `{output_dir}/init{seed_index}.c`, or the
/// configured example file (read once, unsanitized).
pub fn new_seed(config: &RunConfig, seed_index: u64) -> Result<PathBuf, SeedError> {
    match &config.seed_source {
        SeedSource::Example(path) => read_example(path),
        SeedSource::Random(shape) => generate_until_accepted(config, shape, seed_index),
    }
}

fn read_example(path: &Path) -> Result<PathBuf, SeedError> {
    if !path.exists() {
        return Err(SeedError::MissingExample(path.to_owned()));
    }
    // Reading validates the example is accessible; the returned path is
    // what callers actually use, per spec: examples bypass C3.
    std::fs::read(path).map_err(|source| SeedError::ReadExample {
        path: path.to_owned(),
        source,
    })?;
    Ok(path.to_owned())
}

fn generate_until_accepted(
    config: &RunConfig,
    shape: &GeneratorShape,
    seed_index: u64,
) -> Result<PathBuf, SeedError> {
    loop {
        let source_text = invoke_generator(config, shape)?;
        let candidate_path = config.output_dir.join(format!("init{seed_index}.c"));
        std::fs::write(&candidate_path, &source_text).map_err(|source| {
            SeedError::WriteSeed {
                path: candidate_path.clone(),
                source,
            }
        })?;

        if sanitizer::is_safe(&candidate_path, config)? {
            return Ok(candidate_path);
        }
        // Rejected: retry indefinitely (spec §4.4), overwriting the same
        // candidate path next pass.
    }
}

fn invoke_generator(config: &RunConfig, shape: &GeneratorShape) -> Result<String, SeedError> {
    let argv = [
        config.generator.as_os_str().to_owned(),
        format!("--max-expr-complexity={}", shape.max_expr_complexity).into(),
        format!("--max-block-depth={}", shape.max_block_depth).into(),
        format!("--stop-by-stmt={}", shape.stop_by_stmt).into(),
        format!("--seed={}", shape.seed).into(),
    ];
    let outcome = process::run(
        &argv,
        None,
        &[],
        config.reducer_pass_timeout,
        Stdio::Capture,
    )?;
    String::from_utf8(outcome.stdout).map_err(|_| SeedError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_example_is_an_error() {
        let err = read_example(Path::new("/no/such/example.c")).unwrap_err();
        assert!(matches!(err, SeedError::MissingExample(_)));
    }

    #[test]
    fn example_mode_returns_the_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let example = dir.path().join("example.c");
        std::fs::write(&example, "int main(void) { return 0; }\n").unwrap();
        let path = read_example(&example).unwrap();
        assert_eq!(path, example);
    }

    #[test]
    fn generator_output_is_written_under_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            generator: "/bin/echo".into(),
            reducer: "/bin/true".into(),
            compiler: "/usr/bin/cc".into(),
            generator_include: "/usr/include".into(),
            opt_level: crate::config::OptLevel::O1,
            seed_source: SeedSource::Random(GeneratorShape::default()),
            overall_timeout: Duration::from_secs(60),
            reducer_pass_timeout: Duration::from_secs(5),
            reducer_iteration_timeout: Duration::from_secs(5),
            max_iterations: 10,
            regenerate_on_empty: true,
            output_dir: dir.path().to_owned(),
        };
        let shape = GeneratorShape::default();
        let text = invoke_generator(&config, &shape).unwrap();
        assert!(text.starts_with("--max-expr-complexity="));
    }
}
