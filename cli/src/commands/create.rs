//! The scaffolding builder behind `armature create`.
//!
//! Dependency resolution and file generation run through the task core as
//! two executor phases (groups `"deps"` and `"files"`), each reporting into
//! one shared progress manager.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use armature_core::{ExecutorConfig, ProgressManager, ProgressMode, TaskDescriptor, TaskExecutor};

use crate::commands::cli::CreateArgs;
use crate::config::{self, AppConfig};
use crate::error::CliError;
use crate::git;
use crate::project::ProjectManifest;
use crate::registry::{RegistryClient, ResolvedDependency};
use crate::templates::{self, Template, TemplateFile, TemplateStore};

const DEPS_GROUP: &str = "deps";
const FILES_GROUP: &str = "files";

pub struct CreateOptions {
    pub name: String,
    pub template: Option<String>,
    pub target_dir: PathBuf,
    pub force: bool,
    pub git: bool,
    pub offline: bool,
    pub progress_mode: ProgressMode,
    pub progress_enabled: bool,
}

#[derive(Debug)]
pub struct ScaffoldSummary {
    pub template_id: String,
    pub target: PathBuf,
    pub files_written: usize,
    pub dependencies: Vec<ResolvedDependency>,
    pub git_initialized: bool,
}

pub async fn handle_create(args: CreateArgs, cfg: &AppConfig, quiet: bool) -> Result<(), CliError> {
    let target_dir = args
        .directory
        .clone()
        .unwrap_or_else(|| PathBuf::from(&args.name));
    let store = TemplateStore::new(Some(config::templates_dir()?));
    let options = CreateOptions {
        name: args.name,
        template: args.template,
        target_dir,
        force: args.force,
        git: !args.no_git,
        offline: args.offline,
        progress_mode: args.progress.into(),
        progress_enabled: !quiet,
    };

    let summary = scaffold(options, cfg, &store).await?;

    println!();
    println!(
        "Created {} from the '{}' template",
        summary.target.display(),
        summary.template_id
    );
    println!("  files written: {}", summary.files_written);
    if !summary.dependencies.is_empty() {
        println!("  dependencies:");
        for dep in &summary.dependencies {
            println!("    {} {}", dep.name, dep.range);
        }
    }
    if summary.git_initialized {
        println!("  git repository initialized");
    }
    println!();
    println!("Next steps:");
    println!("  cd {}", summary.target.display());
    println!("  npm install");
    println!("  armature dev");
    Ok(())
}

pub async fn scaffold(
    options: CreateOptions,
    cfg: &AppConfig,
    store: &TemplateStore,
) -> Result<ScaffoldSummary, CliError> {
    validate_target(&options.target_dir, options.force)?;
    let template = store.resolve(options.template.as_deref(), &options.name)?;
    tracing::info!(
        template = template.id.as_str(),
        target = %options.target_dir.display(),
        "scaffolding project"
    );

    let progress = ProgressManager::new(options.progress_mode, options.progress_enabled);

    let (dependencies, dev_dependencies) =
        resolve_dependencies(&template, cfg, &options, &progress).await?;

    let context = templates::build_context(
        &options.name,
        "0.1.0",
        &template.manifest.description,
        &dependencies,
        &dev_dependencies,
    );
    let files = template.files()?;
    let files_written =
        write_project_files(&options.target_dir, files, context, cfg, &progress).await?;

    let mut manifest = ProjectManifest::new(options.name.as_str(), template.id.as_str());
    manifest.scripts = template.manifest.scripts.clone();
    manifest.save(&options.target_dir)?;

    let git_initialized = if options.git {
        match git::init_repository(&options.target_dir).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("git init skipped: {err}");
                false
            }
        }
    } else {
        false
    };

    let mut dependencies = dependencies;
    dependencies.extend(dev_dependencies);

    Ok(ScaffoldSummary {
        template_id: template.id,
        target: options.target_dir,
        files_written,
        dependencies,
        git_initialized,
    })
}

fn validate_target(target: &Path, force: bool) -> Result<(), CliError> {
    if target.is_file() {
        return Err(CliError::Command(format!(
            "target {} is an existing file",
            target.display()
        )));
    }
    if target.is_dir() {
        let occupied = target
            .read_dir()
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);
        if occupied && !force {
            return Err(CliError::Command(format!(
                "target directory {} is not empty (use --force to scaffold anyway)",
                target.display()
            )));
        }
    }
    Ok(())
}

/// Resolve every declared dependency's latest version through the
/// executor, bounded by the configured registry concurrency.
async fn resolve_dependencies(
    template: &Template,
    cfg: &AppConfig,
    options: &CreateOptions,
    progress: &ProgressManager,
) -> Result<(Vec<ResolvedDependency>, Vec<ResolvedDependency>), CliError> {
    let runtime = template.manifest.dependencies.clone();
    let development = template.manifest.dev_dependencies.clone();

    if options.offline {
        tracing::info!("offline mode: pinning dependencies to their dist-tag");
        return Ok((
            runtime
                .iter()
                .map(|name| ResolvedDependency::unresolved(name.as_str()))
                .collect(),
            development
                .iter()
                .map(|name| ResolvedDependency::unresolved(name.as_str()))
                .collect(),
        ));
    }

    let total = runtime.len() + development.len();
    if total == 0 {
        return Ok((Vec::new(), Vec::new()));
    }

    let client = RegistryClient::new(
        &cfg.registry.base_url,
        Duration::from_secs(cfg.registry.timeout_secs),
    )?;
    progress.handle(DEPS_GROUP).init(total as u64);

    // Dev dependencies are tagged in the label so the completion-ordered
    // results can be split back apart.
    let mut tasks = Vec::new();
    for (kind, names) in [("dep", &runtime), ("dev", &development)] {
        for name in names {
            let client = client.clone();
            let package = name.clone();
            tasks.push(
                TaskDescriptor::new(format!("{kind}:{package}"), move || {
                    let client = client.clone();
                    let package = package.clone();
                    async move { Ok(client.resolve(&package).await?) }
                })
                .in_group(DEPS_GROUP),
            );
        }
    }

    let tick = progress.handle(DEPS_GROUP);
    let executor_cfg = ExecutorConfig::new()
        .group_concurrency(DEPS_GROUP, cfg.executor.deps_concurrency)
        .max_retries(cfg.executor.max_retries)
        .retry_delay(Duration::from_millis(cfg.executor.retry_delay_ms))
        .timeout(Duration::from_secs(cfg.executor.task_timeout_secs))
        .on_complete(move |report| {
            if report.success {
                tick.increment();
            }
        });

    let executor = TaskExecutor::new(tasks, executor_cfg);
    let results = executor.run().await?;

    let mut runtime_resolved = Vec::new();
    let mut dev_resolved = Vec::new();
    let mut failures = Vec::new();
    for report in results {
        let is_dev = report.label.starts_with("dev:");
        match report.data {
            Some(dep) if is_dev => dev_resolved.push(dep),
            Some(dep) => runtime_resolved.push(dep),
            None => {
                let package = report
                    .label
                    .trim_start_matches("dep:")
                    .trim_start_matches("dev:")
                    .to_string();
                let reason = report
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown error".to_string());
                failures.push(format!("{package} ({reason})"));
            }
        }
    }

    if !failures.is_empty() {
        progress.fail(DEPS_GROUP, Some("version resolution failed"));
        return Err(CliError::Command(format!(
            "failed to resolve {} package(s): {} (use --offline to pin dist-tags instead)",
            failures.len(),
            failures.join(", ")
        )));
    }

    // Completion order is nondeterministic; keep the manifest stable.
    runtime_resolved.sort_by(|a, b| a.name.cmp(&b.name));
    dev_resolved.sort_by(|a, b| a.name.cmp(&b.name));
    Ok((runtime_resolved, dev_resolved))
}

/// Render and write every template file through the executor, failing fast:
/// a half-written project should not keep going.
async fn write_project_files(
    target: &Path,
    files: Vec<TemplateFile>,
    context: tera::Context,
    cfg: &AppConfig,
    progress: &ProgressManager,
) -> Result<usize, CliError> {
    tokio::fs::create_dir_all(target).await?;
    if files.is_empty() {
        return Ok(0);
    }

    progress.handle(FILES_GROUP).init(files.len() as u64);

    let target = target.to_path_buf();
    let context = Arc::new(context);
    let tasks: Vec<_> = files
        .into_iter()
        .map(|file| {
            let target = target.clone();
            let context = context.clone();
            let rel_path = file.rel_path.clone();
            let contents = Arc::new(file.contents);
            TaskDescriptor::new(rel_path.clone(), move || {
                let target = target.clone();
                let context = context.clone();
                let rel_path = rel_path.clone();
                let contents = contents.clone();
                async move {
                    let rendered = if templates::is_template_file(&rel_path) {
                        templates::render_str(&contents, &context, &rel_path)?
                    } else {
                        contents.to_string()
                    };
                    let dest = target.join(templates::destination_path(&rel_path));
                    if let Some(parent) = dest.parent() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                    tokio::fs::write(&dest, rendered).await?;
                    Ok(dest)
                }
            })
            .in_group(FILES_GROUP)
        })
        .collect();

    let tick = progress.handle(FILES_GROUP);
    let executor_cfg: ExecutorConfig<PathBuf> = ExecutorConfig::new()
        .group_concurrency(FILES_GROUP, cfg.executor.files_concurrency)
        .stop_on_error(true)
        .timeout(Duration::from_secs(cfg.executor.task_timeout_secs))
        .on_complete(move |report| {
            if report.success {
                tick.increment();
            }
        });

    let executor = TaskExecutor::new(tasks, executor_cfg);
    match executor.run().await {
        Ok(results) => Ok(results.iter().filter(|r| r.success).count()),
        Err(err) => {
            progress.fail(FILES_GROUP, Some("file generation failed"));
            Err(err.into())
        }
    }
}
