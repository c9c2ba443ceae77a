//! Process Runner (C1): launch external tools with a wall-clock timeout.
//!
//! The search loop is single-threaded cooperative orchestration of blocking
//! subprocesses (spec §5), so this is a thin, synchronous wrapper around
//! `std::process::Command`, not an async executor. Timeout is enforced by
//! polling `try_wait` and killing the child's process group on expiry, the
//! way `reproduce_baseline::reproduce_baseline` does it for a single target
//! invocation, generalized here so every call site (generator, compiler,
//! sanitizer, reducer) shares one implementation.

use std::{
    ffi::OsStr,
    os::unix::process::CommandExt,
    path::Path,
    process::{Child, Command, ExitStatus, Stdio as StdStdio},
    time::{Duration, Instant},
};

use nix::{
    sys::signal::{self, Signal},
    unistd::Pid,
};

/// How a child's standard streams should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stdio {
    /// Capture stdout/stderr for the caller to inspect.
    Capture,
    /// Send stdout/stderr to `/dev/null`.
    Discard,
    /// Let the child share the parent's streams.
    Inherit,
}

/// The result of a completed (non-timed-out) process invocation.
#[derive(Debug)]
pub struct RunOutcome {
    pub status: ExitStatus,
    pub elapsed: Duration,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Process timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Failed to spawn process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Failed to wait for process: {0}")]
    Wait(#[source] std::io::Error),
}

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Run `argv[0]` with the remaining entries as arguments, with a wall-clock
/// timeout. On expiry, the child's process group is sent `SIGKILL` so that
/// any children it has forked (a reducer forking compilers, say) die with
/// it, which `Child::kill` alone does not guarantee.
pub fn run<S: AsRef<OsStr>>(
    argv: &[S],
    cwd: Option<&Path>,
    envs: &[(String, String)],
    timeout: Duration,
    stdio: Stdio,
) -> Result<RunOutcome, ProcessError> {
    let [program, args @ ..] = argv else {
        panic!("argv must contain at least a program name");
    };

    let mut command = Command::new(program);
    command.args(args.iter().map(AsRef::as_ref));
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    for (key, value) in envs {
        command.env(key, value);
    }
    match stdio {
        Stdio::Capture => {
            command.stdout(StdStdio::piped()).stderr(StdStdio::piped());
        }
        Stdio::Discard => {
            command.stdout(StdStdio::null()).stderr(StdStdio::null());
        }
        Stdio::Inherit => {
            command.stdout(StdStdio::inherit()).stderr(StdStdio::inherit());
        }
    }
    command.stdin(StdStdio::null());

    // SAFETY: setsid() is async-signal-safe and only affects the child
    // after fork, before exec; it gives us a process group we can kill as
    // a unit on timeout.
    unsafe {
        command.pre_exec(|| {
            nix::unistd::setsid().map_err(std::io::Error::from)?;
            Ok(())
        });
    }

    let started = Instant::now();
    let mut child = command.spawn().map_err(ProcessError::Spawn)?;

    // Drain stdout/stderr on their own threads, started before we wait: a
    // child that writes more than one pipe buffer (csmith routinely does)
    // would otherwise block in write() forever, since try_wait never sees
    // an exited child that's stuck writing to a pipe nobody is reading.
    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let status = wait_with_timeout(&mut child, timeout)?;
    let elapsed = started.elapsed();

    let stdout = join_reader(stdout_reader);
    let stderr = join_reader(stderr_reader);

    Ok(RunOutcome {
        status,
        elapsed,
        stdout,
        stderr,
    })
}

fn spawn_reader<R: std::io::Read + Send + 'static>(mut stream: R) -> std::thread::JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stream.read_to_end(&mut buf);
        buf
    })
}

fn join_reader(reader: Option<std::thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader.and_then(|handle| handle.join().ok()).unwrap_or_default()
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<ExitStatus, ProcessError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().map_err(ProcessError::Wait)? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            kill_process_group(child.id());
            // Reap the zombie; ignore the exit status, the caller only
            // learns that it timed out.
            let _ = child.wait();
            return Err(ProcessError::TimedOut(timeout));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn kill_process_group(pid: u32) {
    let pgid = Pid::from_raw(pid as i32);
    // Negative pid targets the whole process group in POSIX kill(2); nix
    // exposes this via `Pid::from_raw(-pgid)`.
    let _ = signal::kill(Pid::from_raw(-pgid.as_raw()), Signal::SIGKILL);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_true_succeeds() {
        let outcome = run(&["/bin/true"], None, &[], Duration::from_secs(5), Stdio::Discard)
            .expect("spawn /bin/true");
        assert!(outcome.success());
    }

    #[test]
    fn run_false_fails_without_error() {
        let outcome = run(&["/bin/false"], None, &[], Duration::from_secs(5), Stdio::Discard)
            .expect("spawn /bin/false");
        assert!(!outcome.success());
    }

    #[test]
    fn run_captures_stdout() {
        let outcome = run(
            &["/bin/sh", "-c", "echo hello"],
            None,
            &[],
            Duration::from_secs(5),
            Stdio::Capture,
        )
        .expect("spawn /bin/sh");
        assert_eq!(outcome.stdout, b"hello\n");
    }

    #[test]
    fn run_captures_output_larger_than_one_pipe_buffer() {
        // Regression test: a child writing more than a pipe buffer (~64
        // KiB) must not deadlock waiting for someone to drain it.
        let outcome = run(
            &["/bin/sh", "-c", "yes | head -c 200000"],
            None,
            &[],
            Duration::from_secs(10),
            Stdio::Capture,
        )
        .expect("spawn /bin/sh");
        assert!(outcome.success());
        assert_eq!(outcome.stdout.len(), 200_000);
    }

    #[test]
    fn run_times_out() {
        let err = run(
            &["/bin/sh", "-c", "sleep 5"],
            None,
            &[],
            Duration::from_millis(100),
            Stdio::Discard,
        )
        .expect_err("expected timeout");
        assert!(matches!(err, ProcessError::TimedOut(_)));
    }
}
