use std::path::{Path, PathBuf};

use super::{TemplateError, TemplateManifest};

pub const DEFAULT_TEMPLATE: &str = "webapp";

struct BuiltinTemplate {
    id: &'static str,
    manifest: &'static str,
    files: &'static [(&'static str, &'static str)],
}

const BUILTINS: &[BuiltinTemplate] = &[
    BuiltinTemplate {
        id: "webapp",
        manifest: include_str!("../../templates/webapp/template.toml"),
        files: &[
            (
                "package.json.tera",
                include_str!("../../templates/webapp/files/package.json.tera"),
            ),
            (
                "index.html.tera",
                include_str!("../../templates/webapp/files/index.html.tera"),
            ),
            (
                "src/main.js",
                include_str!("../../templates/webapp/files/src/main.js"),
            ),
            (
                "src/style.css",
                include_str!("../../templates/webapp/files/src/style.css"),
            ),
            (
                "README.md.tera",
                include_str!("../../templates/webapp/files/README.md.tera"),
            ),
            (
                "_gitignore",
                include_str!("../../templates/webapp/files/_gitignore"),
            ),
        ],
    },
    BuiltinTemplate {
        id: "lib",
        manifest: include_str!("../../templates/lib/template.toml"),
        files: &[
            (
                "package.json.tera",
                include_str!("../../templates/lib/files/package.json.tera"),
            ),
            (
                "src/index.js",
                include_str!("../../templates/lib/files/src/index.js"),
            ),
            (
                "README.md.tera",
                include_str!("../../templates/lib/files/README.md.tera"),
            ),
            (
                "_gitignore",
                include_str!("../../templates/lib/files/_gitignore"),
            ),
        ],
    },
];

/// One file carried by a template: path relative to the project root (before
/// `.tera`/`_` rewriting) plus raw contents.
#[derive(Debug, Clone)]
pub struct TemplateFile {
    pub rel_path: String,
    pub contents: String,
}

#[derive(Debug, Clone)]
pub struct TemplateSummary {
    pub id: String,
    pub description: String,
    pub aliases: Vec<String>,
    pub builtin: bool,
}

/// A resolved template ready to produce its file list.
#[derive(Debug)]
pub struct Template {
    pub id: String,
    pub manifest: TemplateManifest,
    source: Source,
}

#[derive(Debug)]
enum Source {
    Builtin(&'static [(&'static str, &'static str)]),
    Dir(PathBuf),
}

impl Template {
    pub fn files(&self) -> Result<Vec<TemplateFile>, TemplateError> {
        match &self.source {
            Source::Builtin(files) => Ok(files
                .iter()
                .map(|(path, contents)| TemplateFile {
                    rel_path: (*path).to_string(),
                    contents: (*contents).to_string(),
                })
                .collect()),
            Source::Dir(dir) => {
                let root = dir.join("files");
                let mut out = Vec::new();
                if root.is_dir() {
                    collect_files(&root, &root, &mut out)?;
                }
                out.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
                Ok(out)
            }
        }
    }
}

fn collect_files(
    root: &Path,
    current: &Path,
    out: &mut Vec<TemplateFile>,
) -> Result<(), TemplateError> {
    for entry in std::fs::read_dir(current)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else {
            let rel_path = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            let contents = std::fs::read_to_string(&path)?;
            out.push(TemplateFile { rel_path, contents });
        }
    }
    Ok(())
}

/// Finds templates by id or by project-name detection; built-ins first,
/// then the user template directory.
pub struct TemplateStore {
    user_dir: Option<PathBuf>,
}

impl TemplateStore {
    pub fn new(user_dir: Option<PathBuf>) -> Self {
        Self { user_dir }
    }

    pub fn list(&self) -> Result<Vec<TemplateSummary>, TemplateError> {
        let mut out = Vec::new();
        for builtin in BUILTINS {
            let manifest = TemplateManifest::parse(builtin.manifest)?;
            out.push(TemplateSummary {
                id: builtin.id.to_string(),
                description: manifest.description,
                aliases: manifest.aliases,
                builtin: true,
            });
        }
        if let Some(dir) = &self.user_dir {
            let mut user = Vec::new();
            if dir.is_dir() {
                for entry in std::fs::read_dir(dir)? {
                    let path = entry?.path();
                    let manifest_path = path.join("template.toml");
                    if !manifest_path.is_file() {
                        continue;
                    }
                    let id = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    let raw = std::fs::read_to_string(&manifest_path)?;
                    let manifest = TemplateManifest::parse(&raw)?;
                    user.push(TemplateSummary {
                        id,
                        description: manifest.description,
                        aliases: manifest.aliases,
                        builtin: false,
                    });
                }
            }
            user.sort_by(|a, b| a.id.cmp(&b.id));
            out.extend(user);
        }
        Ok(out)
    }

    pub fn get(&self, id: &str) -> Result<Template, TemplateError> {
        if let Some(builtin) = BUILTINS.iter().find(|b| b.id == id) {
            return Ok(Template {
                id: builtin.id.to_string(),
                manifest: TemplateManifest::parse(builtin.manifest)?,
                source: Source::Builtin(builtin.files),
            });
        }
        if let Some(dir) = &self.user_dir {
            let template_dir = dir.join(id);
            let manifest_path = template_dir.join("template.toml");
            if manifest_path.is_file() {
                let raw = std::fs::read_to_string(&manifest_path)?;
                return Ok(Template {
                    id: id.to_string(),
                    manifest: TemplateManifest::parse(&raw)?,
                    source: Source::Dir(template_dir),
                });
            }
        }
        let known = self
            .list()?
            .into_iter()
            .map(|s| s.id)
            .collect::<Vec<_>>()
            .join(", ");
        Err(TemplateError::NotFound {
            id: id.to_string(),
            known,
        })
    }

    /// Explicit id wins; otherwise the first template whose id or alias
    /// appears in the project name, falling back to the default.
    pub fn resolve(
        &self,
        explicit: Option<&str>,
        project_name: &str,
    ) -> Result<Template, TemplateError> {
        if let Some(id) = explicit {
            return self.get(id);
        }
        for summary in self.list()? {
            let template = self.get(&summary.id)?;
            if template.manifest.matches_name(&summary.id, project_name) {
                return Ok(template);
            }
        }
        self.get(DEFAULT_TEMPLATE)
    }
}
