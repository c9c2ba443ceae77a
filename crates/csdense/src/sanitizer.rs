//! Sanitizer Gate (C3): reject sources whose behavior is not safely defined.
//!
//! Grounded on `original_source/src/srcreduce/main.py::is_valid_program`,
//! generalizing `diopter.sanitizer.Sanitizer.check_for_compiler_warnings`
//! and `check_for_ub_and_address_sanitizer_errors` into the two checks
//! required by SPEC_FULL.md §4.3: a warnings-enabled compile, and a
//! separate ASan/UBSan compile-and-run, both of which must come back clean.

use std::path::Path;

use tempfile::TempDir;

use crate::{
    config::RunConfig,
    error::SanitizeError,
    process::{self, Stdio},
};

/// Whether `source` is free of compiler warnings and of sanitizer-detected
/// undefined behavior (spec §4.3). A gate failure of any kind (compile
/// error, warnings, sanitizer trap, non-zero exit, timeout) is reported as
/// `Ok(false)`; only an inability to even attempt a check is an `Err`.
pub fn is_safe(source: &Path, config: &RunConfig) -> Result<bool, SanitizeError> {
    Ok(check_no_warnings(source, config)? && check_no_sanitizer_findings(source, config)?)
}

/// Check 1: compile with warnings enabled (no `-w`); clean iff exit 0 with
/// empty stderr.
fn check_no_warnings(source: &Path, config: &RunConfig) -> Result<bool, SanitizeError> {
    let scratch = TempDir::new().map_err(|source_err| SanitizeError::ReadSource {
        path: source.to_owned(),
        source: source_err,
    })?;
    let binary_path = scratch.path().join("warnings_check");

    let compile_argv = [
        config.compiler.as_os_str().to_owned(),
        source.as_os_str().to_owned(),
        "-o".into(),
        binary_path.as_os_str().to_owned(),
        "-Wall".into(),
        "-Wextra".into(),
        "-Werror".into(),
        format!("-I{}", config.generator_include.display()).into(),
    ];

    let compiled = process::run(
        &compile_argv,
        None,
        &[],
        config.reducer_pass_timeout,
        Stdio::Capture,
    );
    match compiled {
        Ok(outcome) => Ok(outcome.success() && outcome.stderr.is_empty()),
        Err(process::ProcessError::TimedOut(_)) => Ok(false),
        Err(other) => Err(SanitizeError::Process(other)),
    }
}

/// Check 2: compile with ASan/UBSan and run; clean iff the run exits 0 and
/// produces no sanitizer report on stderr.
fn check_no_sanitizer_findings(source: &Path, config: &RunConfig) -> Result<bool, SanitizeError> {
    let scratch = TempDir::new().map_err(|source_err| SanitizeError::ReadSource {
        path: source.to_owned(),
        source: source_err,
    })?;
    let binary_path = scratch.path().join("sanitized");

    let compile_argv = [
        config.compiler.as_os_str().to_owned(),
        source.as_os_str().to_owned(),
        "-o".into(),
        binary_path.as_os_str().to_owned(),
        "-w".into(),
        "-g".into(),
        "-O0".into(),
        "-fsanitize=address,undefined".into(),
        format!("-I{}", config.generator_include.display()).into(),
    ];

    let compiled = process::run(
        &compile_argv,
        None,
        &[],
        config.reducer_pass_timeout,
        Stdio::Discard,
    );
    let compiled = match compiled {
        Ok(outcome) => outcome,
        Err(process::ProcessError::TimedOut(_)) => return Ok(false),
        Err(other) => return Err(SanitizeError::Process(other)),
    };
    if !compiled.success() {
        return Ok(false);
    }

    let run_result = process::run(
        &[binary_path.as_os_str().to_owned()],
        None,
        &[("UBSAN_OPTIONS".to_string(), "halt_on_error=1".to_string())],
        config.reducer_pass_timeout,
        Stdio::Capture,
    );
    match run_result {
        Ok(outcome) => Ok(outcome.success() && outcome.stderr.is_empty()),
        Err(process::ProcessError::TimedOut(_)) => Ok(false),
        Err(other) => Err(SanitizeError::Process(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config_with_compiler(compiler: &str) -> RunConfig {
        RunConfig {
            generator: "/bin/true".into(),
            reducer: "/bin/true".into(),
            compiler: compiler.into(),
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
    fn rejects_when_compiler_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.c");
        std::fs::write(&src, "int main(void) { return 0; }\n").unwrap();
        let config = config_with_compiler("/no/such/compiler");
        let result = is_safe(&src, &config);
        assert!(result.is_err() || matches!(result, Ok(false)));
    }
}
