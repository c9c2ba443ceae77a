//! Sizer (C2): source byte count and compiled `.text` section size.
//!
//! Grounded on `original_source/src/srcreduce/main.py::calculate_source_and_binary_size`
//! and `calculate_size`. Per the Design Notes in SPEC_FULL.md §9, both this
//! module and the predicate emitter (`crate::predicate`) parse the `size`
//! reporter's output the same way: the first whitespace-separated field of
//! the second line.

use std::{
    path::Path,
    time::Duration,
};

use tempfile::TempDir;
use tracing::debug;

use crate::{
    config::RunConfig,
    error::SizeError,
    process::{self, Stdio},
};

/// Byte length of the file on disk (spec §4.2).
pub fn source_size(path: &Path) -> Result<u64, SizeError> {
    std::fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|source| SizeError::ReadSource {
            path: path.to_owned(),
            source,
        })
}

/// Compile `path` and report the size of its `.text` section (spec §4.2).
///
/// The object file is compiled into a scratch `TempDir` and deleted before
/// returning, matching `calculate_source_and_binary_size`'s use-and-remove
/// of `temp.o`.
pub fn binary_text_size(path: &Path, config: &RunConfig) -> Result<u64, SizeError> {
    let scratch = TempDir::new().map_err(|source| SizeError::ReadSource {
        path: path.to_owned(),
        source,
    })?;
    let object_path = scratch.path().join("temp.o");

    compile_to_object(path, &object_path, config)?;
    let text_size = text_section_size(&object_path)?;
    Ok(text_size)
}

fn compile_to_object(
    source: &Path,
    object: &Path,
    config: &RunConfig,
) -> Result<(), SizeError> {
    let mut argv: Vec<std::ffi::OsString> = vec![
        config.compiler.as_os_str().to_owned(),
        source.as_os_str().to_owned(),
        "-o".into(),
        object.as_os_str().to_owned(),
    ];
    if !config.opt_level.as_flag().is_empty() {
        argv.push(format!("-{}", config.opt_level.as_flag()).into());
    }
    argv.push("-w".into());
    argv.push(format!("-I{}", config.generator_include.display()).into());

    let outcome = process::run(
        &argv,
        None,
        &[],
        Duration::from_secs(30),
        Stdio::Discard,
    )?;

    if !outcome.success() {
        return Err(SizeError::CompileFailed {
            path: source.to_owned(),
        });
    }
    Ok(())
}

/// Invoke the `size` reporter on `object` and parse its `.text` field.
///
/// Per the convention fixed in SPEC_FULL.md §9: the first whitespace
/// separated field of the second (data) line of `size`'s output, which is
/// GNU `size`'s `.text` column for a single-object invocation.
pub fn text_section_size(object: &Path) -> Result<u64, SizeError> {
    let outcome = process::run(
        &["size", object.to_str().unwrap_or_default()],
        None,
        &[],
        Duration::from_secs(10),
        Stdio::Capture,
    )?;

    if !outcome.success() {
        return Err(SizeError::SizeReporterFailed {
            path: object.to_owned(),
        });
    }

    let stdout = String::from_utf8_lossy(&outcome.stdout);
    parse_size_output(&stdout).map_err(|reason| SizeError::ParseFailed {
        path: object.to_owned(),
        reason,
    })
}

fn parse_size_output(output: &str) -> Result<u64, String> {
    let data_line = output
        .lines()
        .nth(1)
        .ok_or_else(|| "output has fewer than two lines".to_owned())?;
    let first_field = data_line
        .split_whitespace()
        .next()
        .ok_or_else(|| "data line is empty".to_owned())?;
    let value = first_field
        .parse::<u64>()
        .map_err(|e| format!("field {first_field:?} is not an integer: {e}"))?;
    debug!(value, "parsed text section size");
    Ok(value)
}
