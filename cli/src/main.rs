use std::sync::OnceLock;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use armature_cli::commands::cli::{Args, Command};
use armature_cli::commands::{create, init, scripts, sync, templates};
use armature_cli::config::{self, LoggingConfig};
use armature_cli::error::CliError;
use armature_cli::templates::TemplateStore;

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = Args::parse();
    let cfg = config::load_default()?;
    init_tracing(args.quiet, args.verbose, &cfg.logging);

    let quiet = args.quiet;
    match args.command {
        Command::Create(create_args) => {
            create::handle_create(create_args, &cfg, quiet).await?;
            Ok(0)
        }
        Command::Templates => {
            let store = TemplateStore::new(Some(config::templates_dir()?));
            templates::handle_templates(&store)?;
            Ok(0)
        }
        Command::Init(init_args) => {
            init::handle_init(&init_args)?;
            Ok(0)
        }
        Command::Build(script_args) => scripts::handle_script("build", &script_args).await,
        Command::Dev(script_args) => scripts::handle_script("dev", &script_args).await,
        Command::Lint(script_args) => scripts::handle_script("lint", &script_args).await,
        Command::Sync(sync_args) => {
            sync::handle_sync(&sync_args).await?;
            Ok(0)
        }
    }
}

fn init_tracing(quiet: bool, verbose: bool, cfg: &LoggingConfig) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        cfg.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(directory) = &cfg.directory {
        let appender = tracing_appender::rolling::daily(directory, "armature.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn exit_code_for_error(error: &CliError) -> i32 {
    match error {
        CliError::Config(_) => 2,
        _ => 1,
    }
}
