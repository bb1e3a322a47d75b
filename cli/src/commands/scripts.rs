//! Delegation commands: `build`, `dev`, and `lint` run the matching entry
//! from the project manifest's script table through the shell.

use std::path::PathBuf;

use crate::commands::cli::ScriptArgs;
use crate::error::CliError;
use crate::project::{ProjectManifest, PROJECT_MANIFEST};

pub async fn handle_script(script: &str, args: &ScriptArgs) -> Result<i32, CliError> {
    let dir = resolve_dir(args)?;
    let manifest = ProjectManifest::load(&dir)?;

    let Some(command) = manifest.scripts.get(script) else {
        let available = if manifest.scripts.is_empty() {
            "none".to_string()
        } else {
            manifest.scripts.keys().cloned().collect::<Vec<_>>().join(", ")
        };
        return Err(CliError::Command(format!(
            "no '{script}' script in {PROJECT_MANIFEST}; available: {available}"
        )));
    };

    tracing::info!(script, command = command.as_str(), "delegating to script");
    println!("$ {command}");
    let status = shell(command)
        .current_dir(&dir)
        .status()
        .await
        .map_err(|e| CliError::Command(format!("failed to launch '{command}': {e}")))?;
    Ok(status.code().unwrap_or(1))
}

fn resolve_dir(args: &ScriptArgs) -> Result<PathBuf, CliError> {
    match &args.dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(std::env::current_dir()?),
    }
}

#[cfg(not(windows))]
fn shell(command: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
