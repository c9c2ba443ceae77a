//! Interestingness Predicate Emitter (C6): the shell script handed to the
//! reducer.
//!
//! Grounded on `original_source/src/srcreduce/main.py::make_interestingness_test`
//! (the f-string shell template) and, for the Rust-side pattern of
//! generating a bash interestingness test that shells back into the host
//! binary for anything non-trivial, `other_examples/.../autocxx-reduce`'s
//! `create_interestingness_test`.
//!
//! Per SPEC_FULL.md §4.6, the emitted script parses `.text` sizes by
//! invoking `csdense-cli internal-text-size <obj>` rather than duplicating
//! the `size | awk | tail` parsing logic in shell, so there is exactly one
//! place (`crate::sizer::text_section_size`) that knows the convention.

use std::path::{Path, PathBuf};

use crate::config::RunConfig;

/// Parameters the predicate script is materialized against (spec §4.6).
pub struct PredicateParams<'a> {
    pub seed_path: &'a Path,
    pub candidate_basename: &'a str,
    pub compiler: &'a Path,
    pub opt_flag: &'a str,
    pub include_path: &'a Path,
    pub archive_dir: &'a Path,
    /// Path to the `csdense-cli` binary, used for the `internal-text-size`
    /// hidden subcommand.
    pub cli_binary: &'a Path,
}

impl<'a> PredicateParams<'a> {
    pub fn from_config(
        config: &'a RunConfig,
        seed_path: &'a Path,
        candidate_basename: &'a str,
        archive_dir: &'a Path,
        cli_binary: &'a Path,
        opt_flag: &'a str,
    ) -> Self {
        Self {
            seed_path,
            candidate_basename,
            compiler: &config.compiler,
            opt_flag,
            include_path: &config.generator_include,
            archive_dir,
            cli_binary,
        }
    }
}

/// Render the interestingness test (spec §4.6). The script:
/// 1. Compiles the seed to `orig.o` and the staged candidate to `tmp.o`.
/// 2. Runs `./tmp.o`; non-zero exit is not-interesting.
/// 3. Rejects sources shorter than the degenerate floor.
/// 4. Archives the candidate under `interesting_<random>.c` and exits 0
///    iff `tmp.o`'s `.text` is at least `orig.o`'s.
pub fn render(params: &PredicateParams) -> String {
    let opt_flag = if params.opt_flag.is_empty() {
        String::new()
    } else {
        format!("-{}", params.opt_flag)
    };

    format!(
        r#"#!/bin/sh
set -u

CC={compiler}
OPTFLAG={opt_flag}
INCLUDE={include}
SEED={seed}
CANDIDATE={candidate}
ARCHIVE_DIR={archive_dir}
CLI_BINARY={cli_binary}
TEXTSIZE="$CLI_BINARY internal-text-size"
FLOOR={floor}

"$CC" "$SEED" -o orig.o $OPTFLAG -w "-I$INCLUDE" 2>/dev/null
if [ $? -ne 0 ]; then exit 1; fi

"$CC" "$CANDIDATE" -o tmp.o $OPTFLAG -w "-I$INCLUDE" 2>/dev/null
if [ $? -ne 0 ]; then exit 1; fi

./tmp.o >/dev/null 2>&1
if [ $? -ne 0 ]; then exit 1; fi

candidate_bytes=$(wc -c < "$CANDIDATE")
if [ "$candidate_bytes" -le "$FLOOR" ]; then exit 1; fi

orig_text=$($TEXTSIZE orig.o)
tmp_text=$($TEXTSIZE tmp.o)

if [ "$tmp_text" -ge "$orig_text" ]; then
    name="interesting_$(od -An -N4 -tx4 /dev/urandom | tr -d ' \n').c"
    cp "$CANDIDATE" "$ARCHIVE_DIR/$name"
    exit 0
fi

exit 1
"#,
        compiler = shell_quote(&params.compiler.display().to_string()),
        opt_flag = opt_flag,
        include = shell_quote(&params.include_path.display().to_string()),
        seed = shell_quote(&params.seed_path.display().to_string()),
        candidate = shell_quote(params.candidate_basename),
        archive_dir = shell_quote(&params.archive_dir.display().to_string()),
        cli_binary = shell_quote(&params.cli_binary.display().to_string()),
        floor = RunConfig::DEGENERATE_SOURCE_FLOOR,
    )
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Write the rendered script to `dir/interestingness_test.sh` and mark it
/// executable (spec §4.7 step 2).
pub fn write_script(dir: &Path, params: &PredicateParams) -> Result<PathBuf, std::io::Error> {
    use std::os::unix::fs::PermissionsExt;

    let script_path = dir.join("interestingness_test.sh");
    std::fs::write(&script_path, render(params))?;

    let mut perms = std::fs::metadata(&script_path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script_path, perms)?;

    Ok(script_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_script_references_both_objects_and_archive_dir() {
        let params = PredicateParams {
            seed_path: Path::new("/work/init_0.c"),
            candidate_basename: "init_0.c",
            compiler: Path::new("/usr/bin/cc"),
            opt_flag: "O2",
            include_path: Path::new("/usr/include/csmith"),
            archive_dir: Path::new("/work/iteration-0"),
            cli_binary: Path::new("/usr/local/bin/csdense-cli"),
        };
        let script = render(&params);
        assert!(script.contains("orig.o"));
        assert!(script.contains("tmp.o"));
        assert!(script.contains("/work/iteration-0"));
        assert!(script.contains("internal-text-size"));
        assert!(script.contains("-O2"));
    }

    #[test]
    fn write_script_marks_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let params = PredicateParams {
            seed_path: Path::new("/work/init_0.c"),
            candidate_basename: "init_0.c",
            compiler: Path::new("/usr/bin/cc"),
            opt_flag: "",
            include_path: Path::new("/usr/include/csmith"),
            archive_dir: dir.path(),
            cli_binary: Path::new("/usr/local/bin/csdense-cli"),
        };
        let script_path = write_script(dir.path(), &params).unwrap();
        let mode = std::fs::metadata(&script_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
