//! Per-component error types.
//!
//! Each boundary in the pipeline gets its own enum, the way the teacher
//! repo keeps one `thiserror::Error` per module instead of a single
//! crate-wide error type.

use std::path::PathBuf;

pub use crate::process::ProcessError;

#[derive(Debug, thiserror::Error)]
pub enum SizeError {
    #[error("Failed to read source file {path}: {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Compiling {path} failed")]
    CompileFailed { path: PathBuf },
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("Failed to run size reporter on {path}")]
    SizeReporterFailed { path: PathBuf },
    #[error("Could not parse size reporter output for {path}: {reason}")]
    ParseFailed { path: PathBuf, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("Failed to read source file {path}: {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),
    #[error("Failed to write seed file {path}: {source}")]
    WriteSeed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Generator produced output that is not valid UTF-8")]
    InvalidUtf8,
    #[error("Example file {0} does not exist")]
    MissingExample(PathBuf),
    #[error("Failed to read example file {path}: {source}")]
    ReadExample {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ReducerError {
    #[error("Failed to create iteration directory {path}: {source}")]
    CreateIterationDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to stage seed into iteration directory: {0}")]
    StageSeed(#[source] std::io::Error),
    #[error("Failed to write predicate script {path}: {source}")]
    WritePredicate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to mark predicate script executable: {0}")]
    MakeExecutable(#[source] std::io::Error),
    #[error(transparent)]
    Process(#[from] ProcessError),
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Output directory error: {0}")]
    OutputDir(#[source] std::io::Error),
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error(transparent)]
    Reducer(#[from] ReducerError),
    #[error("Failed to copy global best to {path}: {source}")]
    CopyBest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
