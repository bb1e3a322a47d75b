use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Name of the per-project manifest written by `armature create`.
pub const PROJECT_MANIFEST: &str = "armature.toml";

/// The project-level manifest: identity plus the script table the
/// delegation commands (`build`, `dev`, `lint`) dispatch through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Template the project was scaffolded from.
    #[serde(default)]
    pub template: Option<String>,

    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

impl ProjectManifest {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            template: Some(template.into()),
            scripts: BTreeMap::new(),
        }
    }

    /// Read `armature.toml` from a project directory.
    pub fn load(dir: &Path) -> Result<Self, CliError> {
        let path = dir.join(PROJECT_MANIFEST);
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            CliError::Command(format!(
                "no {PROJECT_MANIFEST} in {} ({e}); run this inside an armature project",
                dir.display()
            ))
        })?;
        toml::from_str(&raw).map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
    }

    pub fn save(&self, dir: &Path) -> Result<(), CliError> {
        let raw = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("serializing {PROJECT_MANIFEST}: {e}")))?;
        std::fs::write(dir.join(PROJECT_MANIFEST), raw)?;
        Ok(())
    }
}
