use tera::{Context, Tera};

use crate::registry::ResolvedDependency;

use super::TemplateError;

/// Variables every template file renders against.
pub fn build_context(
    name: &str,
    version: &str,
    description: &str,
    dependencies: &[ResolvedDependency],
    dev_dependencies: &[ResolvedDependency],
) -> Context {
    let mut context = Context::new();
    context.insert("name", name);
    context.insert("version", version);
    context.insert("description", description);
    context.insert("dependencies", dependencies);
    context.insert("dev_dependencies", dev_dependencies);
    context
}

pub fn is_template_file(rel_path: &str) -> bool {
    rel_path.ends_with(".tera")
}

/// Render a single template file. Autoescape is off: generated sources
/// must come out verbatim.
pub fn render_str(template: &str, context: &Context, path: &str) -> Result<String, TemplateError> {
    Tera::one_off(template, context, false).map_err(|e| TemplateError::Render {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Rewrite a template-relative path into its project destination: the
/// `.tera` suffix is stripped, and a leading `_` in the file name becomes
/// a dot - templates carry `_gitignore` so the dotfile doesn't vanish
/// from the template tree itself.
pub fn destination_path(rel_path: &str) -> String {
    let stripped = rel_path.strip_suffix(".tera").unwrap_or(rel_path);
    match stripped.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/{}", undot(file)),
        None => undot(stripped),
    }
}

fn undot(file: &str) -> String {
    match file.strip_prefix('_') {
        Some(rest) => format!(".{rest}"),
        None => file.to_string(),
    }
}
