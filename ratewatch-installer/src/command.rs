use crate::InstallError;
use std::io;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const WAIT_STEP: Duration = Duration::from_millis(50);

/// Captured result of an external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external programs. `Err` means the program could not be started.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;

    /// Like [`run`](Self::run), but gives up with `ErrorKind::TimedOut`
    /// once `limit` has passed. Meant for short probes with little output.
    fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _limit: Duration,
    ) -> io::Result<CommandOutput> {
        self.run(program, args)
    }
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        tracing::debug!(target: "installer.command", %program, ?args, "running");
        let output = Command::new(program).args(args).output()?;
        Ok(output.into())
    }

    fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        limit: Duration,
    ) -> io::Result<CommandOutput> {
        tracing::debug!(target: "installer.command", %program, ?args, ?limit, "running with time limit");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let deadline = Instant::now() + limit;
        while child.try_wait()?.is_none() {
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("{program} did not finish within {limit:?}"),
                ));
            }
            thread::sleep(WAIT_STEP);
        }
        Ok(child.wait_with_output()?.into())
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Run a command and turn a non-zero exit into [`InstallError::CommandFailed`].
pub(crate) fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
) -> Result<CommandOutput, InstallError> {
    let out = runner.run(program, args)?;
    if out.success {
        Ok(out)
    } else {
        Err(InstallError::CommandFailed {
            command: format!("{program} {}", args.join(" ")),
            stderr: out.stderr.trim().to_string(),
        })
    }
}
