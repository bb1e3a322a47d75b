use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::TemplateError;

/// Parsed `template.toml`: what a template declares about itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateManifest {
    pub description: String,

    /// Alternative names matched during template auto-detection.
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Runtime packages resolved against the registry at create time.
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub dev_dependencies: Vec<String>,

    /// Script table copied into the generated project's `armature.toml`.
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

impl TemplateManifest {
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        toml::from_str(raw).map_err(|e| TemplateError::Manifest(e.to_string()))
    }

    /// True when `name` mentions this template's id or one of its aliases.
    pub fn matches_name(&self, id: &str, name: &str) -> bool {
        let name = name.to_lowercase();
        if name.contains(id) {
            return true;
        }
        self.aliases.iter().any(|alias| name.contains(alias.as_str()))
    }
}
