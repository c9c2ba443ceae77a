//! The immutable configuration for a single search run.

use std::{path::PathBuf, time::Duration};

/// Compiler optimization level, one of `{none, O0, O1, O2, O3}` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptLevel {
    None,
    O0,
    O1,
    O2,
    O3,
}

impl OptLevel {
    /// The compiler flag this level maps to, without the leading `-`.
    pub fn as_flag(self) -> &'static str {
        match self {
            OptLevel::None => "",
            OptLevel::O0 => "O0",
            OptLevel::O1 => "O1",
            OptLevel::O2 => "O2",
            OptLevel::O3 => "O3",
        }
    }

    pub const ALL: [OptLevel; 5] = [
        OptLevel::None,
        OptLevel::O0,
        OptLevel::O1,
        OptLevel::O2,
        OptLevel::O3,
    ];
}

impl std::fmt::Display for OptLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptLevel::None => write!(f, "none"),
            OptLevel::O0 => write!(f, "O0"),
            OptLevel::O1 => write!(f, "O1"),
            OptLevel::O2 => write!(f, "O2"),
            OptLevel::O3 => write!(f, "O3"),
        }
    }
}

impl std::str::FromStr for OptLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(OptLevel::None),
            "O0" | "o0" => Ok(OptLevel::O0),
            "O1" | "o1" => Ok(OptLevel::O1),
            "O2" | "o2" => Ok(OptLevel::O2),
            "O3" | "o3" => Ok(OptLevel::O3),
            other => anyhow::bail!("Invalid optimization level: {other}"),
        }
    }
}

/// Shape parameters forwarded verbatim to the random generator.
#[derive(Debug, Clone)]
pub struct GeneratorShape {
    pub max_expr_complexity: u32,
    pub max_block_depth: u32,
    pub stop_by_stmt: u32,
    pub seed: u64,
}

impl Default for GeneratorShape {
    fn default() -> Self {
        Self {
            max_expr_complexity: 10,
            max_block_depth: 5,
            stop_by_stmt: 100,
            seed: 0,
        }
    }
}

/// Where seeds come from: a random generator, rejection-sampled against the
/// sanitizer gate, or a single fixed example file (spec §4.4).
#[derive(Debug, Clone)]
pub enum SeedSource {
    Random(GeneratorShape),
    Example(PathBuf),
}

/// Immutable configuration for a search (spec §3 `RunConfig`).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub generator: PathBuf,
    pub reducer: PathBuf,
    pub compiler: PathBuf,
    pub generator_include: PathBuf,
    pub opt_level: OptLevel,
    pub seed_source: SeedSource,
    pub overall_timeout: Duration,
    pub reducer_pass_timeout: Duration,
    pub reducer_iteration_timeout: Duration,
    pub max_iterations: u64,
    pub regenerate_on_empty: bool,
    pub output_dir: PathBuf,
}

impl RunConfig {
    /// The minimum acceptable source size, in bytes (spec §4.5, gate 3).
    pub const DEGENERATE_SOURCE_FLOOR: u64 = 500;
}
