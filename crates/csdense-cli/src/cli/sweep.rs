use std::{fs::OpenOptions, io::Write, path::PathBuf};

use anyhow::Context;
use csdense::scorer::RealSizer;
use tracing::info;

use super::{GlobalOptions, run::SearchArgs};

/// Batch-measurement wrapper: varies one axis of the search configuration
/// across several repeated runs and appends rows to a CSV, for the
/// downstream plotting scripts. A thin outer loop over `run`, per
/// `original_source`'s `--batch-measurements` branches.
#[derive(Debug, clap::Parser)]
pub struct SweepCommand {
    #[clap(flatten)]
    args: SearchArgs,

    /// Which axis to sweep.
    #[clap(long, value_enum)]
    mode: SweepMode,

    /// Where to append CSV rows (`type,size,category`).
    #[clap(long = "batch-output-csv", default_value = "data.csv")]
    batch_output_csv: PathBuf,

    /// Number of repeated runs per sweep point.
    #[clap(long, default_value = "10")]
    repeats: u32,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SweepMode {
    Complexity,
    Optimizations,
    Timeout,
    Single,
}

struct SweepPoint {
    category: String,
    expr_complexity: Option<u32>,
    block_depth: Option<u32>,
    stop_by_stmt: Option<u32>,
    compiler_flag: Option<csdense::config::OptLevel>,
    timeout_creduce: Option<u64>,
    timeout_creduce_iteration: Option<u64>,
}

impl SweepPoint {
    fn named(category: &str) -> Self {
        Self {
            category: category.to_owned(),
            expr_complexity: None,
            block_depth: None,
            stop_by_stmt: None,
            compiler_flag: None,
            timeout_creduce: None,
            timeout_creduce_iteration: None,
        }
    }
}

fn complexity_points() -> Vec<SweepPoint> {
    vec![
        SweepPoint {
            expr_complexity: Some(5),
            block_depth: Some(2),
            stop_by_stmt: Some(50),
            ..SweepPoint::named("Low")
        },
        SweepPoint {
            expr_complexity: Some(10),
            block_depth: Some(5),
            stop_by_stmt: Some(100),
            ..SweepPoint::named("Medium")
        },
        SweepPoint {
            expr_complexity: Some(15),
            block_depth: Some(8),
            stop_by_stmt: Some(150),
            ..SweepPoint::named("High")
        },
    ]
}

fn optimization_points() -> Vec<SweepPoint> {
    use csdense::config::OptLevel::*;
    [O0, O1, O2, O3]
        .into_iter()
        .map(|level| SweepPoint {
            compiler_flag: Some(level),
            ..SweepPoint::named(&level.to_string())
        })
        .collect()
}

fn timeout_points() -> Vec<SweepPoint> {
    [(5, 25), (10, 50), (15, 75), (20, 100), (25, 125)]
        .into_iter()
        .map(|(pass, iteration)| SweepPoint {
            timeout_creduce: Some(pass),
            timeout_creduce_iteration: Some(iteration),
            ..SweepPoint::named(&pass.to_string())
        })
        .collect()
}

impl SweepCommand {
    pub fn run(self, global_options: GlobalOptions) -> anyhow::Result<()> {
        self.args.validate_seed_mode()?;

        let points = match self.mode {
            SweepMode::Complexity => complexity_points(),
            SweepMode::Optimizations => optimization_points(),
            SweepMode::Timeout => timeout_points(),
            SweepMode::Single => vec![SweepPoint::named("single")],
        };

        let mut csv = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.batch_output_csv)
            .with_context(|| format!("Creating {}", self.batch_output_csv.display()))?;
        writeln!(csv, "type,size,category").context("Writing CSV header")?;

        let repeats = if matches!(self.mode, SweepMode::Single) {
            2
        } else {
            self.repeats
        };

        let output_base = self.args.output.clone();
        let mut run_index = 0u32;

        for point in &points {
            for _ in 0..repeats {
                run_index += 1;
                let mut args = self.args.clone_with_output(
                    output_base.join(format!("run-{run_index}")),
                );
                if let Some(v) = point.expr_complexity {
                    args.max_expr_complexity = v;
                }
                if let Some(v) = point.block_depth {
                    args.max_block_depth = v;
                }
                if let Some(v) = point.stop_by_stmt {
                    args.stop_by_stmt = v;
                }
                if let Some(v) = point.compiler_flag {
                    args.compiler_flag = v;
                }
                if let Some(v) = point.timeout_creduce {
                    args.timeout_creduce = v;
                }
                if let Some(v) = point.timeout_creduce_iteration {
                    args.timeout_creduce_iteration = v;
                }

                info!(category = %point.category, run_index, "Starting sweep point");
                let config = args.to_config();
                let cli_binary =
                    std::env::current_exe().context("Locating the running executable")?;
                let best = csdense::search::run(&RealSizer, &config, &cli_binary)
                    .with_context(|| format!("Running sweep point {}", point.category))?;

                if let Some(best) = best {
                    let source_bytes = csdense::sizer::source_size(&best.source_path)
                        .unwrap_or(0);
                    let text_bytes =
                        csdense::sizer::binary_text_size(&best.source_path, &config).unwrap_or(0);
                    writeln!(csv, "Source,{source_bytes},{}", point.category)
                        .context("Writing CSV row")?;
                    writeln!(csv, "Binary,{text_bytes},{}", point.category)
                        .context("Writing CSV row")?;
                }
            }
        }

        let _ = global_options;
        info!("Sweep finished");
        Ok(())
    }
}
