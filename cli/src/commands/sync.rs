//! `armature sync`: stage, commit, and push in one step.

use std::path::PathBuf;

use crate::commands::cli::SyncArgs;
use crate::error::CliError;
use crate::git;

const DEFAULT_MESSAGE: &str = "chore: sync via armature";

pub async fn handle_sync(args: &SyncArgs) -> Result<(), CliError> {
    let dir = resolve_dir(args)?;
    if !git::is_repository(&dir).await {
        return Err(CliError::Git(format!(
            "{} is not a git repository",
            dir.display()
        )));
    }

    if git::has_changes(&dir).await? {
        git::stage_all(&dir).await?;
        let message = args.message.as_deref().unwrap_or(DEFAULT_MESSAGE);
        git::commit(&dir, message).await?;
        println!("Committed local changes");
    } else {
        println!("Working tree clean");
    }

    let branch = git::current_branch(&dir).await?;
    let upstream = git::has_upstream(&dir).await?;
    if upstream && !git::has_unpushed_commits(&dir).await? {
        println!("Nothing to push");
        return Ok(());
    }

    git::push(&dir, !upstream, &branch).await?;
    if upstream {
        println!("Pushed {branch}");
    } else {
        println!("Pushed {branch} and set upstream");
    }
    Ok(())
}

fn resolve_dir(args: &SyncArgs) -> Result<PathBuf, CliError> {
    match &args.dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(std::env::current_dir()?),
    }
}
