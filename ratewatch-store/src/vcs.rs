//! Publishing the data directory through git.
//!
//! [`publish`] stages, commits and pushes; every failure is reported as a
//! [`PublishOutcome`] and never rolls back earlier steps.
use chrono::{DateTime, Local};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{error, info, warn};

/// Captured result of one version-control command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcsOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// The four version-control operations the publisher needs.
///
/// `Err` means the tool could not be run at all.
pub trait VcsClient {
    fn status(&self) -> io::Result<VcsOutput>;
    fn add(&self, path: &Path) -> io::Result<VcsOutput>;
    fn commit(&self, message: &str) -> io::Result<VcsOutput>;
    fn push(&self) -> io::Result<VcsOutput>;
}

/// [`VcsClient`] that shells out to the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_dir: PathBuf,
}

impl GitCli {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    fn run(&self, args: &[&str]) -> io::Result<VcsOutput> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()?;
        Ok(VcsOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl VcsClient for GitCli {
    fn status(&self) -> io::Result<VcsOutput> {
        self.run(&["status"])
    }

    fn add(&self, path: &Path) -> io::Result<VcsOutput> {
        let path = path.to_string_lossy();
        self.run(&["add", path.as_ref()])
    }

    fn commit(&self, message: &str) -> io::Result<VcsOutput> {
        self.run(&["commit", "-m", message])
    }

    fn push(&self) -> io::Result<VcsOutput> {
        self.run(&["push"])
    }
}

/// How a publish attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Committed and pushed.
    Pushed { message: String },
    /// Nothing was staged; counts as success.
    NothingToCommit,
    /// The working directory is not inside a repository.
    NotARepository,
    /// The version-control tool could not be launched.
    ToolUnavailable(String),
    StageFailed(String),
    CommitFailed(String),
    /// The commit exists locally but the push was rejected.
    PushFailed(String),
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PublishOutcome::Pushed { .. } | PublishOutcome::NothingToCommit)
    }
}

/// Commit message for a publish at local time `now`.
pub fn commit_message(now: DateTime<Local>) -> String {
    format!("Update CBUAE rates - {}", now.format("%Y-%m-%d %H:%M:%S"))
}

/// Stage `data_dir`, commit it and push.
pub fn publish<V: VcsClient + ?Sized>(vcs: &V, data_dir: &Path, now: DateTime<Local>) -> PublishOutcome {
    match vcs.status() {
        Ok(out) if out.success => {}
        Ok(_) => {
            error!(target: "store.publish", "Not in a Git repository. Run 'git init' and configure remote.");
            return PublishOutcome::NotARepository;
        }
        Err(e) => return tool_unavailable(e),
    }

    match vcs.add(data_dir) {
        Ok(out) if out.success => {}
        Ok(out) => {
            error!(target: "store.publish", stderr = %out.stderr.trim(), "Git add failed");
            return PublishOutcome::StageFailed(out.stderr);
        }
        Err(e) => return tool_unavailable(e),
    }

    let message = commit_message(now);
    match vcs.commit(&message) {
        Ok(out) if out.success => {
            info!(target: "store.publish", %message, "Committed changes");
        }
        Ok(out) if nothing_to_commit(&out) => {
            info!(target: "store.publish", "No changes to commit");
            return PublishOutcome::NothingToCommit;
        }
        Ok(out) => {
            error!(target: "store.publish", stderr = %out.stderr.trim(), "Git commit failed");
            return PublishOutcome::CommitFailed(out.stderr);
        }
        Err(e) => return tool_unavailable(e),
    }

    match vcs.push() {
        Ok(out) if out.success => {
            info!(target: "store.publish", "Changes pushed");
            PublishOutcome::Pushed { message }
        }
        Ok(out) => {
            error!(target: "store.publish", stderr = %out.stderr.trim(), "Git push failed");
            warn!(target: "store.publish", "HINT: Check if remote is configured and you have push access");
            PublishOutcome::PushFailed(out.stderr)
        }
        Err(e) => tool_unavailable(e),
    }
}

fn nothing_to_commit(out: &VcsOutput) -> bool {
    out.stdout.contains("nothing to commit") || out.stderr.contains("nothing to commit")
}

fn tool_unavailable(e: io::Error) -> PublishOutcome {
    error!(target: "store.publish", error = %e, "Git operation failed");
    PublishOutcome::ToolUnavailable(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::RefCell;

    struct FakeVcs {
        status_ok: bool,
        commit: VcsOutput,
        push_ok: bool,
        calls: RefCell<Vec<String>>,
    }

    impl FakeVcs {
        fn healthy() -> Self {
            Self {
                status_ok: true,
                commit: ok(""),
                push_ok: true,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    fn ok(stdout: &str) -> VcsOutput {
        VcsOutput {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    fn failed(stdout: &str, stderr: &str) -> VcsOutput {
        VcsOutput {
            success: false,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    impl VcsClient for FakeVcs {
        fn status(&self) -> io::Result<VcsOutput> {
            self.calls.borrow_mut().push("status".into());
            Ok(if self.status_ok { ok("") } else { failed("", "fatal: not a git repository") })
        }

        fn add(&self, path: &Path) -> io::Result<VcsOutput> {
            self.calls.borrow_mut().push(format!("add {}", path.display()));
            Ok(ok(""))
        }

        fn commit(&self, message: &str) -> io::Result<VcsOutput> {
            self.calls.borrow_mut().push(format!("commit {message}"));
            Ok(self.commit.clone())
        }

        fn push(&self) -> io::Result<VcsOutput> {
            self.calls.borrow_mut().push("push".into());
            Ok(if self.push_ok { ok("") } else { failed("", "rejected") })
        }
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 1, 9, 15, 0).unwrap()
    }

    #[test]
    fn commits_and_pushes() {
        let vcs = FakeVcs::healthy();
        let outcome = publish(&vcs, Path::new("data"), now());
        assert_eq!(
            outcome,
            PublishOutcome::Pushed {
                message: "Update CBUAE rates - 2025-03-01 09:15:00".into()
            }
        );
        assert_eq!(
            vcs.calls(),
            vec![
                "status",
                "add data",
                "commit Update CBUAE rates - 2025-03-01 09:15:00",
                "push"
            ]
        );
    }

    #[test]
    fn nothing_staged_is_success() {
        let vcs = FakeVcs {
            commit: failed("On branch main\nnothing to commit, working tree clean\n", ""),
            ..FakeVcs::healthy()
        };
        let outcome = publish(&vcs, Path::new("data"), now());
        assert_eq!(outcome, PublishOutcome::NothingToCommit);
        assert!(outcome.is_success());
        assert!(!vcs.calls().contains(&"push".to_string()));
    }

    #[test]
    fn outside_repository_stops_early() {
        let vcs = FakeVcs {
            status_ok: false,
            ..FakeVcs::healthy()
        };
        assert_eq!(publish(&vcs, Path::new("data"), now()), PublishOutcome::NotARepository);
        assert_eq!(vcs.calls(), vec!["status"]);
    }

    #[test]
    fn other_commit_failures_are_reported() {
        let vcs = FakeVcs {
            commit: failed("", "Please tell me who you are."),
            ..FakeVcs::healthy()
        };
        let outcome = publish(&vcs, Path::new("data"), now());
        assert!(matches!(outcome, PublishOutcome::CommitFailed(ref s) if s.contains("who you are")));
        assert!(!outcome.is_success());
    }

    #[test]
    fn push_failure_keeps_commit() {
        let vcs = FakeVcs {
            push_ok: false,
            ..FakeVcs::healthy()
        };
        let outcome = publish(&vcs, Path::new("data"), now());
        assert_eq!(outcome, PublishOutcome::PushFailed("rejected".into()));
        assert!(vcs.calls().iter().any(|c| c.starts_with("commit ")));
    }
}
