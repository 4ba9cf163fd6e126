//! External runner process supervision
//!
//! The child is owned by a [`ChildGuard`] for its whole life. Every exit path
//! (normal exit, timeout, or the caller dropping the future) ends with the
//! process, and on Unix its whole process group, killed and reaped.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use crate::common::{Error, Result};

/// A fully built runner command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    /// Build a `selenium-side-runner` invocation
    ///
    /// Produces `<program> [extra...] --server <grid> <scenario> --output-directory <dir>`.
    pub fn side_runner(
        program: &Path,
        extra_args: &[String],
        grid_url: &str,
        scenario: &Path,
        output_dir: &Path,
    ) -> Self {
        let mut args: Vec<OsString> = extra_args.iter().map(OsString::from).collect();
        args.push("--server".into());
        args.push(grid_url.into());
        args.push(scenario.as_os_str().to_os_string());
        args.push("--output-directory".into());
        args.push(output_dir.as_os_str().to_os_string());

        Self {
            program: program.to_path_buf(),
            args,
        }
    }

    /// Human-readable command line for logs
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command(&self) -> Command {
        let mut std_cmd = std::process::Command::new(&self.program);
        std_cmd
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group so a timeout can take down the runner's workers too
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }

        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(true);
        cmd
    }
}

/// Output of a process that exited on its own
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// How a supervised process finished
#[derive(Debug, Clone)]
pub enum Completion {
    Exited(ProcessOutput),
    TimedOut { elapsed: Duration },
}

/// Run `invocation` to completion, killing it once `limit` has elapsed
pub async fn run_with_timeout(invocation: &Invocation, limit: Duration) -> Result<Completion> {
    let mut guard = ChildGuard::spawn(invocation)?;
    let started = Instant::now();

    let stdout = guard.child.stdout.take();
    let stderr = guard.child.stderr.take();

    let waited = tokio::time::timeout(limit, async {
        tokio::try_join!(guard.child.wait(), read_pipe(stdout), read_pipe(stderr))
    })
    .await;

    match waited {
        Ok(Ok((status, stdout, stderr))) => Ok(Completion::Exited(ProcessOutput {
            exit_code: status.code(),
            success: status.success(),
            stdout,
            stderr,
            elapsed: started.elapsed(),
        })),
        Ok(Err(e)) => {
            guard.terminate().await;
            Err(Error::ProcessIo(e))
        }
        Err(_) => {
            tracing::warn!(
                pid = ?guard.pid,
                limit_secs = limit.as_secs_f64(),
                "Runner exceeded timeout, killing it"
            );
            guard.terminate().await;
            Ok(Completion::TimedOut {
                elapsed: started.elapsed(),
            })
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Owns a spawned child and guarantees it does not outlive the guard
struct ChildGuard {
    child: Child,
    pid: Option<u32>,
}

impl ChildGuard {
    fn spawn(invocation: &Invocation) -> Result<Self> {
        tracing::debug!(command = %invocation.command_line(), "Spawning runner");

        let child = invocation
            .command()
            .spawn()
            .map_err(|error| Error::SpawnFailed {
                program: invocation.program.clone(),
                error,
            })?;
        let pid = child.id();

        Ok(Self { child, pid })
    }

    /// Kill the process (and its group) and reap it
    async fn terminate(&mut self) {
        self.kill_group();
        if let Err(e) = self.child.kill().await {
            tracing::debug!(pid = ?self.pid, error = %e, "Runner kill failed");
        }
    }

    #[cfg(unix)]
    fn kill_group(&self) {
        if let Some(pid) = self.pid {
            // The child leads its own group (process_group(0)), so pgid == pid
            unsafe {
                libc::killpg(pid as libc::pid_t, libc::SIGKILL);
            }
        }
    }

    #[cfg(not(unix))]
    fn kill_group(&self) {}
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            tracing::debug!(pid = ?self.pid, "Runner still alive on drop, killing it");
            self.kill_group();
            let _ = self.child.start_kill();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> Invocation {
        Invocation {
            program: PathBuf::from("sh"),
            args: vec!["-c".into(), script.into()],
        }
    }

    #[test]
    fn test_side_runner_argument_order() {
        let invocation = Invocation::side_runner(
            Path::new("/usr/bin/selenium-side-runner"),
            &["--debug".to_string()],
            "http://grid:4444/wd/hub",
            Path::new("scenarios/login.side"),
            Path::new("reports/abc"),
        );
        assert_eq!(
            invocation.command_line(),
            "/usr/bin/selenium-side-runner --debug --server http://grid:4444/wd/hub \
             scenarios/login.side --output-directory reports/abc"
        );
    }

    #[tokio::test]
    async fn test_captures_output_and_exit_code() {
        let completion = run_with_timeout(
            &shell("echo out; echo err >&2; exit 4"),
            Duration::from_secs(10),
        )
        .await
        .unwrap();

        match completion {
            Completion::Exited(output) => {
                assert_eq!(output.exit_code, Some(4));
                assert!(!output.success);
                assert_eq!(output.stdout, "out\n");
                assert_eq!(output.stderr, "err\n");
            }
            Completion::TimedOut { .. } => panic!("unexpected timeout"),
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_process_group() {
        // The background sleep keeps stdout open; only a group kill frees it
        let completion = run_with_timeout(
            &shell("sleep 30 & sleep 30"),
            Duration::from_millis(200),
        )
        .await
        .unwrap();

        match completion {
            Completion::TimedOut { elapsed } => assert!(elapsed < Duration::from_secs(10)),
            Completion::Exited(output) => panic!("unexpected exit: {output:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_failure() {
        let invocation = Invocation {
            program: PathBuf::from("/nonexistent/selenium-side-runner"),
            args: Vec::new(),
        };
        let err = run_with_timeout(&invocation, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SpawnFailed { .. }));
    }
}
