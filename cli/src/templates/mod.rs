//! Project templates: discovery, manifests, rendering.
//!
//! A template is a `template.toml` manifest plus a `files/` tree. Files
//! ending in `.tera` are rendered with the project variables; everything
//! else is copied verbatim. Built-in templates are embedded in the binary;
//! user templates live under `~/.armature/templates/<id>/`.

mod manifest;
mod renderer;
mod store;

use thiserror::Error;

pub use manifest::TemplateManifest;
pub use renderer::{build_context, destination_path, is_template_file, render_str};
pub use store::{Template, TemplateFile, TemplateStore, TemplateSummary, DEFAULT_TEMPLATE};

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template manifest error: {0}")]
    Manifest(String),

    #[error("unknown template '{id}' (known: {known})")]
    NotFound { id: String, known: String },

    #[error("render error in {path}: {reason}")]
    Render { path: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
