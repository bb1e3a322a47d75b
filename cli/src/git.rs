//! Git plumbing via the `git` binary.
//!
//! Query helpers surface command failures as errors instead of guessing a
//! fallback answer; only the well-known "no upstream configured" exit is
//! interpreted.

use std::path::Path;
use std::process::Output;

use tokio::process::Command;

use crate::error::CliError;

async fn run_git(dir: &Path, args: &[&str]) -> Result<Output, CliError> {
    tracing::debug!(?args, dir = %dir.display(), "running git");
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .map_err(|e| CliError::Git(format!("failed to run git {}: {e}", args.join(" "))))
}

fn expect_success(output: Output, what: &str) -> Result<String, CliError> {
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(CliError::Git(format!("{what}: {}", stderr.trim())))
    }
}

pub async fn is_repository(dir: &Path) -> bool {
    matches!(
        run_git(dir, &["rev-parse", "--is-inside-work-tree"]).await,
        Ok(output) if output.status.success()
    )
}

/// `git init` plus a best-effort initial commit. The commit is skipped with
/// a warning when it fails (e.g. no user identity configured) - a fresh
/// repository without a commit is still a usable result.
pub async fn init_repository(dir: &Path) -> Result<(), CliError> {
    expect_success(run_git(dir, &["init"]).await?, "git init")?;
    expect_success(run_git(dir, &["add", "-A"]).await?, "git add")?;
    let commit = run_git(dir, &["commit", "-m", "chore: initial commit from armature"]).await?;
    if !commit.status.success() {
        tracing::warn!(
            "initial commit skipped: {}",
            String::from_utf8_lossy(&commit.stderr).trim()
        );
    }
    Ok(())
}

pub async fn has_changes(dir: &Path) -> Result<bool, CliError> {
    let stdout = expect_success(
        run_git(dir, &["status", "--porcelain"]).await?,
        "git status",
    )?;
    Ok(!stdout.is_empty())
}

pub async fn stage_all(dir: &Path) -> Result<(), CliError> {
    expect_success(run_git(dir, &["add", "-A"]).await?, "git add").map(|_| ())
}

pub async fn commit(dir: &Path, message: &str) -> Result<(), CliError> {
    expect_success(run_git(dir, &["commit", "-m", message]).await?, "git commit").map(|_| ())
}

pub async fn current_branch(dir: &Path) -> Result<String, CliError> {
    expect_success(
        run_git(dir, &["rev-parse", "--abbrev-ref", "HEAD"]).await?,
        "git rev-parse",
    )
}

/// Whether the current branch tracks an upstream.
///
/// Only the explicit "no upstream configured" failure maps to `false`;
/// anything else (not a repository, detached head lookup errors) is
/// surfaced as an error rather than silently treated as "needs upstream".
pub async fn has_upstream(dir: &Path) -> Result<bool, CliError> {
    let output = run_git(
        dir,
        &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
    )
    .await?;
    if output.status.success() {
        return Ok(true);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.contains("no upstream") {
        Ok(false)
    } else {
        Err(CliError::Git(format!(
            "upstream lookup failed: {}",
            stderr.trim()
        )))
    }
}

/// Whether local commits exist that the upstream has not seen. Requires an
/// upstream; callers check `has_upstream` first.
pub async fn has_unpushed_commits(dir: &Path) -> Result<bool, CliError> {
    let stdout = expect_success(
        run_git(dir, &["rev-list", "@{u}..HEAD", "--count"]).await?,
        "git rev-list",
    )?;
    let count: u64 = stdout
        .parse()
        .map_err(|_| CliError::Git(format!("unexpected rev-list output: {stdout}")))?;
    Ok(count > 0)
}

pub async fn push(dir: &Path, set_upstream: bool, branch: &str) -> Result<(), CliError> {
    let output = if set_upstream {
        run_git(dir, &["push", "--set-upstream", "origin", branch]).await?
    } else {
        run_git(dir, &["push"]).await?
    };
    expect_success(output, "git push").map(|_| ())
}
