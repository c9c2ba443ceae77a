//! Reducer Driver (C7): stage a seed, invoke the reducer under the
//! interestingness predicate, and return the archive directory.
//!
//! Grounded on `original_source/src/srcreduce/main.py::reduce`.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::{
    config::RunConfig,
    error::ReducerError,
    predicate::{self, PredicateParams},
    process::{self, Stdio},
};

/// Per spec §4.7: stage the seed, emit the predicate, invoke the reducer,
/// and return the iteration's archive directory regardless of the
/// reducer's own exit status — the archive is authoritative, not the exit
/// code.
pub fn reduce(
    seed_path: &Path,
    iteration_index: u64,
    config: &RunConfig,
    cli_binary: &Path,
) -> Result<PathBuf, ReducerError> {
    let iteration_dir = config
        .output_dir
        .join(format!("iteration-{iteration_index}"));
    std::fs::create_dir_all(&iteration_dir).map_err(|source| {
        ReducerError::CreateIterationDir {
            path: iteration_dir.clone(),
            source,
        }
    })?;

    let staged_basename = format!("init_{iteration_index}.c");
    let staged_path = iteration_dir.join(&staged_basename);
    std::fs::copy(seed_path, &staged_path).map_err(ReducerError::StageSeed)?;

    let params = PredicateParams::from_config(
        config,
        seed_path,
        &staged_basename,
        &iteration_dir,
        cli_binary,
        config.opt_level.as_flag(),
    );
    let script_path = predicate::write_script(&iteration_dir, &params).map_err(|source| {
        ReducerError::WritePredicate {
            path: iteration_dir.join("interestingness_test.sh"),
            source,
        }
    })?;

    let reducer_argv = [
        config.reducer.as_os_str().to_owned(),
        script_path.as_os_str().to_owned(),
        staged_path.as_os_str().to_owned(),
        "--save-temps".into(),
        "--timeout".into(),
        config.reducer_pass_timeout.as_secs().to_string().into(),
    ];

    let invocation = process::run(
        &reducer_argv,
        Some(&iteration_dir),
        &[],
        config.reducer_iteration_timeout,
        Stdio::Discard,
    );

    match invocation {
        Ok(_) => {}
        Err(process::ProcessError::TimedOut(timeout)) => {
            warn!(
                iteration = iteration_index,
                ?timeout,
                "reducer invocation timed out; archive may still hold interesting candidates"
            );
        }
        Err(other) => return Err(ReducerError::Process(other)),
    }

    Ok(iteration_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config_in(output_dir: PathBuf) -> RunConfig {
        RunConfig {
            generator: "/bin/true".into(),
            reducer: "/bin/true".into(),
            compiler: "/usr/bin/cc".into(),
            generator_include: "/usr/include".into(),
            opt_level: crate::config::OptLevel::O1,
            seed_source: crate::config::SeedSource::Example("/dev/null".into()),
            overall_timeout: Duration::from_secs(60),
            reducer_pass_timeout: Duration::from_secs(1),
            reducer_iteration_timeout: Duration::from_secs(5),
            max_iterations: 10,
            regenerate_on_empty: true,
            output_dir,
        }
    }

    #[test]
    fn stages_seed_and_emits_predicate() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("seed.c");
        std::fs::write(&seed, "int main(void) { return 0; }\n").unwrap();

        let config = config_in(dir.path().join("out"));
        std::fs::create_dir_all(&config.output_dir).unwrap();

        let archive = reduce(&seed, 0, &config, Path::new("/usr/local/bin/csdense-cli")).unwrap();
        assert!(archive.join("init_0.c").exists());
        assert!(archive.join("interestingness_test.sh").exists());
    }
}
