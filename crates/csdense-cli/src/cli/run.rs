use std::{path::PathBuf, time::Duration};

use anyhow::{Context, bail};
use csdense::{
    config::{GeneratorShape, OptLevel, RunConfig, SeedSource},
    scorer::RealSizer,
    search,
};
use tracing::info;

use super::GlobalOptions;

/// The shared argument set of `run` and `sweep`, mirroring `original_source`'s
/// `argparse` definitions used by both the normal and batch-measurement
/// paths.
#[derive(Debug, Clone, clap::Parser)]
pub struct SearchArgs {
    /// Output directory; wiped and recreated at startup.
    #[clap(long)]
    pub output: PathBuf,

    /// Overall wall-clock budget for the search, in seconds.
    #[clap(long, default_value = "3600")]
    pub timeout: u64,

    /// Per-pass timeout forwarded to the reducer, in seconds.
    #[clap(long = "timeout-creduce", default_value = "30")]
    pub timeout_creduce: u64,

    /// Wall-clock budget for one reducer invocation, in seconds.
    #[clap(long = "timeout-creduce-iteration", default_value = "300")]
    pub timeout_creduce_iteration: u64,

    /// Maximum number of search iterations.
    #[clap(long, default_value = "1000000")]
    pub max_iterations: u64,

    /// Use a freshly generated random seed (rejection-sampled against the
    /// sanitizer gate) instead of a fixed example file.
    #[clap(long, conflicts_with = "example")]
    pub random: bool,

    /// Use this file as the (unsanitized) initial seed instead of random
    /// generation.
    #[clap(long, conflicts_with = "random")]
    pub example: Option<PathBuf>,

    /// Path to the random C program generator.
    #[clap(long)]
    pub csmith: PathBuf,

    /// Include path for the generator's runtime headers.
    #[clap(long = "csmith-include")]
    pub csmith_include: PathBuf,

    /// Path to the reducer binary.
    #[clap(long)]
    pub creduce: PathBuf,

    /// Path to the C compiler.
    #[clap(long)]
    pub compiler: PathBuf,

    /// Optimization level passed to the compiler: one of
    /// `none, O0, O1, O2, O3`.
    #[clap(long = "compiler-flag", default_value = "O2", value_parser = parse_opt_level)]
    pub compiler_flag: OptLevel,

    /// Generator shape: maximum expression complexity.
    #[clap(long, default_value = "10")]
    pub max_expr_complexity: u32,

    /// Generator shape: maximum nested block depth.
    #[clap(long, default_value = "5")]
    pub max_block_depth: u32,

    /// Generator shape: statement count at which the generator stops.
    #[clap(long, default_value = "100")]
    pub stop_by_stmt: u32,

    /// Generator shape: the generator's own random seed.
    #[clap(long, default_value = "0")]
    pub seed: u64,

    /// When the Frontier empties, generate a fresh random seed instead of
    /// terminating.
    #[clap(long)]
    pub regenerate: bool,
}

fn parse_opt_level(s: &str) -> Result<OptLevel, anyhow::Error> {
    s.parse()
}

impl SearchArgs {
    /// A copy of these args pointed at a different output directory, used
    /// by the sweep command to run each repeat in its own scratch space.
    pub fn clone_with_output(&self, output: PathBuf) -> Self {
        let mut clone = self.clone();
        clone.output = output;
        clone
    }

    pub fn validate_seed_mode(&self) -> anyhow::Result<()> {
        if !self.random && self.example.is_none() {
            bail!("One of --random or --example PATH is required");
        }
        Ok(())
    }

    pub fn to_config(&self) -> RunConfig {
        let seed_source = match &self.example {
            Some(path) => SeedSource::Example(path.clone()),
            None => SeedSource::Random(GeneratorShape {
                max_expr_complexity: self.max_expr_complexity,
                max_block_depth: self.max_block_depth,
                stop_by_stmt: self.stop_by_stmt,
                seed: self.seed,
            }),
        };

        RunConfig {
            generator: self.csmith.clone(),
            reducer: self.creduce.clone(),
            compiler: self.compiler.clone(),
            generator_include: self.csmith_include.clone(),
            opt_level: self.compiler_flag,
            seed_source,
            overall_timeout: Duration::from_secs(self.timeout),
            reducer_pass_timeout: Duration::from_secs(self.timeout_creduce),
            reducer_iteration_timeout: Duration::from_secs(self.timeout_creduce_iteration),
            max_iterations: self.max_iterations,
            regenerate_on_empty: self.regenerate,
            output_dir: self.output.clone(),
        }
    }
}

/// Run a single density search: generate or read a seed, iteratively
/// reduce it with the configured reducer, and report the global best.
#[derive(Debug, clap::Parser)]
pub struct RunCommand {
    #[clap(flatten)]
    args: SearchArgs,
}

impl RunCommand {
    pub fn run(self, _global_options: GlobalOptions) -> anyhow::Result<()> {
        info!(?self, "Starting density search");
        self.args.validate_seed_mode()?;

        let config = self.args.to_config();
        let cli_binary = std::env::current_exe().context("Locating the running executable")?;

        let best = search::run(&RealSizer, &config, &cli_binary).context("Running search")?;

        match best {
            Some(best) => info!(
                score = best.score,
                path = %best.source_path.display(),
                seed = %best.originating_seed_path.display(),
                "Search finished with a global best"
            ),
            None => info!("Search finished without ever scoring a candidate above zero"),
        }

        Ok(())
    }
}
