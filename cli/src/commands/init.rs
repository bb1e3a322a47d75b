//! Non-interactive configuration bootstrap.

use crate::commands::cli::InitArgs;
use crate::config::{self, AppConfig};
use crate::error::CliError;

pub fn handle_init(args: &InitArgs) -> Result<(), CliError> {
    let dir = config::data_dir()?;
    let path = dir.join("config.toml");

    if path.exists() && !args.force {
        println!("Configuration file already exists at: {}", path.display());
        println!("Pass --force to overwrite it with the defaults.");
        return Ok(());
    }

    std::fs::create_dir_all(&dir)?;
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| CliError::Config(e.to_string()))?;
    std::fs::write(&path, content)?;

    println!("Wrote default configuration to {}", path.display());
    println!();
    println!("Next steps:");
    println!("  armature templates          # see what can be scaffolded");
    println!("  armature create my-app      # scaffold a project");
    Ok(())
}
