use thiserror::Error;

use crate::registry::RegistryError;
use crate::templates::TemplateError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("git error: {0}")]
    Git(String),
    #[error("executor error: {0}")]
    Executor(#[from] armature_core::ExecutorError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}
