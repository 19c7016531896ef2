use anyhow::{Context as AnyhowContext, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use codehealth_monitor::{builtin_monitors, HealthConfig, MonitorRegistry};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod commands;

/// Default location of the run-state file, relative to the project root
const DEFAULT_STATE_PATH: &str = ".codehealth/health_state.json";

#[derive(Parser)]
#[command(name = "codehealth")]
#[command(about = "Scheduled code health checks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root to check
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Run-state file (default: <root>/.codehealth/health_state.json)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Monitor configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered monitors with their schedules and run state
    List,

    /// Show which monitors are due
    Due(DueArgs),

    /// Run one monitor
    Run(RunArgs),

    /// Run every due monitor and record the runs
    #[command(name = "run-due")]
    RunDue(DueArgs),

    /// Count closed issues and commits toward event triggers
    Events(EventsArgs),

    /// Print persisted run state
    State(StateArgs),

    /// Write the default configuration file
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),
}

#[derive(Args)]
struct DueArgs {
    /// Evaluate schedules at this RFC3339 instant instead of now
    #[arg(long)]
    at: Option<DateTime<Utc>>,
}

#[derive(Args)]
struct RunArgs {
    /// Monitor name
    name: String,

    /// Record the run in the state file
    #[arg(long)]
    record: bool,

    /// Identifier of an issue filed from this run (repeatable)
    #[arg(long = "issue", requires = "record")]
    issues: Vec<String>,
}

#[derive(Args)]
struct EventsArgs {
    #[arg(long, default_value_t = 0)]
    issues_closed: u64,

    #[arg(long, default_value_t = 0)]
    commits: u64,
}

#[derive(Args)]
struct StateArgs {
    /// Only this monitor
    name: Option<String>,
}

#[derive(Args)]
struct InitConfigArgs {
    /// Destination path
    path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let open = || Session::open(&cli.root, cli.state.as_deref(), cli.config.as_deref());
    match cli.command {
        Commands::List => emit(&commands::list(&open()?.registry)),
        Commands::Due(ref args) => {
            let at = args.at.unwrap_or_else(Utc::now);
            emit(&commands::due(&open()?.registry, at))
        }
        Commands::Run(ref args) => {
            let Session { root, registry } = open()?;
            let name = args.name.clone();
            let (record, issues) = (args.record, args.issues.clone());
            let output = run_cancellable(move |cancel| {
                commands::run(&registry, &root, &cancel, &name, record, issues)
            })
            .await?;
            emit(&output)
        }
        Commands::RunDue(ref args) => {
            let Session { root, registry } = open()?;
            let now = args.at.unwrap_or_else(Utc::now);
            let output =
                run_cancellable(move |cancel| commands::run_due(&registry, &root, &cancel, now))
                    .await?;
            emit(&output)
        }
        Commands::Events(ref args) => emit(&commands::events(
            &open()?.registry,
            args.issues_closed,
            args.commits,
        )?),
        Commands::State(ref args) => emit(&commands::state(&open()?.registry, args.name.as_deref())?),
        Commands::InitConfig(ref args) => emit(&commands::init_config(&args.path)?),
    }
}

/// Resolved project root and its registry with the built-in monitors
struct Session {
    root: PathBuf,
    registry: Arc<MonitorRegistry>,
}

impl Session {
    fn open(root: &Path, state: Option<&Path>, config: Option<&Path>) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Invalid project root {}", root.display()))?;
        let config = load_config(config)?;
        let state_path = state.map_or_else(|| root.join(DEFAULT_STATE_PATH), Path::to_path_buf);
        let registry = Arc::new(open_registry(&root, &state_path, &config)?);
        Ok(Self { root, registry })
    }
}

fn load_config(path: Option<&Path>) -> Result<HealthConfig> {
    match path {
        Some(path) => HealthConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(HealthConfig::default()),
    }
}

fn open_registry(root: &Path, state_path: &Path, config: &HealthConfig) -> Result<MonitorRegistry> {
    let registry = MonitorRegistry::open(state_path)
        .with_context(|| format!("Failed to open state {}", state_path.display()))?;
    for monitor in builtin_monitors(root, config)? {
        registry.register(monitor)?;
    }
    Ok(registry)
}

/// Run blocking check work off the runtime; Ctrl-C cancels it through the token
async fn run_cancellable<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(CancellationToken) -> Result<T> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling in-flight check");
            watcher.cancel();
        }
    });

    let outcome = tokio::task::spawn_blocking(move || work(cancel))
        .await
        .context("Check worker panicked")?;
    interrupt.abort();
    outcome
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
