//! Search Loop (C8): priority-queue-driven selection, iteration orchestration,
//! and global-best bookkeeping.
//!
//! Grounded on `original_source/src/srcreduce/main.py::new_run`, the
//! top-level loop that ties every other component together.

use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use tracing::info;

use crate::{
    config::RunConfig,
    error::SearchError,
    reducer,
    sanitizer,
    scorer::{self, SizeSource},
    seed,
};

/// One entry in the Frontier: a scored candidate plus the seed it was
/// measured against (spec §9, "seed-origin bookkeeping" — every candidate's
/// score must be recomputed against *its* seed, not the global best).
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub score: f64,
    pub source_path: PathBuf,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}
impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Scores are always finite (ratios of byte counts, or the literal
        // 0.0 gate value); a deterministic tie-break falls back to path so
        // identical scores still order consistently within one run.
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.source_path.cmp(&other.source_path))
    }
}

/// Max-score-first priority queue of scored candidates awaiting reduction
/// as future seeds (spec §3 `Frontier`).
#[derive(Debug, Default)]
pub struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
}

impl Frontier {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn push(&mut self, score: f64, source_path: PathBuf) {
        self.heap.push(FrontierEntry { score, source_path });
    }

    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// The best candidate seen across the whole search (spec §3 `GlobalBest`).
#[derive(Debug, Clone)]
pub struct GlobalBest {
    pub score: f64,
    pub source_path: PathBuf,
    pub originating_seed_path: PathBuf,
}

/// A record of one completed iteration (spec §3 `IterationRecord`).
#[derive(Debug, Clone)]
pub struct IterationRecord {
    pub index: u64,
    pub archive_dir: PathBuf,
    pub seed_path: PathBuf,
    pub archived_candidates: Vec<PathBuf>,
    pub best_this_iteration: Option<(f64, u64, u64)>,
}

/// Run the search to completion (spec §4.8). Returns the final
/// `GlobalBest`, if any candidate ever scored above the gates.
pub fn run<S: SizeSource>(
    sizer: &S,
    config: &RunConfig,
    cli_binary: &Path,
) -> Result<Option<GlobalBest>, SearchError> {
    prepare_output_dir(config)?;

    let mut frontier = Frontier::new();
    let mut global_best: Option<GlobalBest> = None;
    let mut seed_counter: u64 = 0;
    let mut iteration: u64 = 0;
    let start = Instant::now();

    let first_seed = seed::new_seed(config, seed_counter)?;
    seed_counter += 1;
    frontier.push(0.0, first_seed);

    while start.elapsed() < config.overall_timeout && iteration < config.max_iterations {
        if frontier.is_empty() {
            if config.regenerate_on_empty {
                let fresh = seed::new_seed(config, seed_counter)?;
                seed_counter += 1;
                frontier.push(0.0, fresh);
            } else {
                break;
            }
        }

        let popped = frontier.pop().expect("frontier just verified non-empty");
        let seed_path = popped.source_path;

        iteration += 1;
        let archive_dir = reducer::reduce(&seed_path, iteration, config, cli_binary)?;

        let mut iteration_best: Option<(f64, u64, u64)> = None;
        let mut iteration_best_path: Option<PathBuf> = None;
        let mut archived_candidates = Vec::new();

        for entry in read_archive(&archive_dir) {
            archived_candidates.push(entry.clone());

            let is_clean = match sanitizer::is_safe(&entry, config) {
                Ok(clean) => clean,
                Err(_) => continue,
            };
            if !is_clean {
                continue;
            }

            let score = match scorer::score(sizer, &seed_path, &entry, config) {
                Ok(score) => score,
                Err(_) => continue,
            };
            frontier.push(score, entry.clone());

            // A candidate only counts as "the iteration's best" once it has
            // cleared the scorer's gates (spec §8 scenario 6: last.c is
            // only ever written once something scored above zero).
            if score <= 0.0 {
                continue;
            }

            let source_bytes = sizer.source_size(&entry).unwrap_or(0);
            let text_bytes = sizer.binary_text_size(&entry, config).unwrap_or(0);

            let better = iteration_best.map(|(best, ..)| score > best).unwrap_or(true);
            if better {
                iteration_best = Some((score, source_bytes, text_bytes));
                iteration_best_path = Some(entry.clone());
            }
        }

        info!("Iteration {iteration}");
        if let (Some((score, source_bytes, text_bytes)), Some(path)) =
            (iteration_best, &iteration_best_path)
        {
            info!("Best candidate this iteration: {}", path.display());
            info!("Best candidate info: ({source_bytes}, {text_bytes})");
            info!("Best heuristic value this iteration: {score}");

            let is_new_best = global_best.as_ref().map(|g| score > g.score).unwrap_or(true);
            if is_new_best {
                global_best = Some(GlobalBest {
                    score,
                    source_path: path.clone(),
                    originating_seed_path: seed_path.clone(),
                });
            }
        }

        let _ = IterationRecord {
            index: iteration,
            archive_dir,
            seed_path,
            archived_candidates,
            best_this_iteration: iteration_best,
        };
    }

    if let Some(best) = &global_best {
        let dest = config.output_dir.join("last.c");
        std::fs::copy(&best.source_path, &dest).map_err(|source| SearchError::CopyBest {
            path: dest,
            source,
        })?;
    }

    Ok(global_best)
}

fn prepare_output_dir(config: &RunConfig) -> Result<(), SearchError> {
    if config.output_dir.exists() {
        std::fs::remove_dir_all(&config.output_dir).map_err(SearchError::OutputDir)?;
    }
    std::fs::create_dir_all(&config.output_dir).map_err(SearchError::OutputDir)?;
    Ok(())
}

/// Every `*.c` file in the iteration's archive directory (spec §4.8 step 4),
/// which includes both the reducer's `interesting_*.c` finds and the staged
/// `init_{i}.c` seed copy — all of it gets re-scored as a candidate.
fn read_archive(archive_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(archive_dir) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().and_then(|ext| ext.to_str()) == Some("c")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, time::Duration};

    #[test]
    fn frontier_pops_max_score_first() {
        let mut frontier = Frontier::new();
        frontier.push(0.3, PathBuf::from("a.c"));
        frontier.push(0.9, PathBuf::from("b.c"));
        frontier.push(0.5, PathBuf::from("c.c"));

        assert_eq!(frontier.pop().unwrap().source_path, PathBuf::from("b.c"));
        assert_eq!(frontier.pop().unwrap().source_path, PathBuf::from("c.c"));
        assert_eq!(frontier.pop().unwrap().source_path, PathBuf::from("a.c"));
        assert!(frontier.pop().is_none());
    }

    struct FakeSizer {
        sources: HashMap<PathBuf, u64>,
        texts: HashMap<PathBuf, u64>,
    }

    impl SizeSource for FakeSizer {
        fn source_size(&self, path: &Path) -> Result<u64, crate::error::SizeError> {
            Ok(*self.sources.get(path).unwrap_or(&0))
        }

        fn binary_text_size(
            &self,
            path: &Path,
            _config: &RunConfig,
        ) -> Result<u64, crate::error::SizeError> {
            Ok(*self.texts.get(path).unwrap_or(&0))
        }
    }

    fn config_in(output_dir: PathBuf, overall_timeout: Duration, max_iterations: u64) -> RunConfig {
        RunConfig {
            generator: "/bin/true".into(),
            reducer: "/bin/true".into(),
            compiler: "/usr/bin/cc".into(),
            generator_include: "/usr/include".into(),
            opt_level: crate::config::OptLevel::O1,
            seed_source: crate::config::SeedSource::Example(PathBuf::new()),
            overall_timeout,
            reducer_pass_timeout: Duration::from_millis(200),
            reducer_iteration_timeout: Duration::from_millis(200),
            max_iterations,
            regenerate_on_empty: false,
            output_dir,
        }
    }

    #[test]
    fn timeout_halts_loop_without_writing_last_c_when_nothing_scored() {
        let dir = tempfile::tempdir().unwrap();
        let example = dir.path().join("example.c");
        std::fs::write(&example, "int main(void) { return 0; }\n").unwrap();

        let mut config = config_in(
            dir.path().join("out"),
            Duration::from_millis(1),
            1_000_000,
        );
        config.seed_source = crate::config::SeedSource::Example(example);
        config.reducer = "/bin/true".into();

        let sizer = FakeSizer {
            sources: HashMap::new(),
            texts: HashMap::new(),
        };
        let result = run(&sizer, &config, Path::new("/usr/local/bin/csdense-cli")).unwrap();
        assert!(result.is_none());
        assert!(!config.output_dir.join("last.c").exists());
    }
}
