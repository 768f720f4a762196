//! Lanthorn CLI entry point.

use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lanthorn_engine::{EngineConfig, World};
use lanthorn_runtime::{Console, ScriptEditor, Session, load_files, save_to_file};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Run a Lanthorn world.
#[derive(Debug, Parser)]
#[command(name = "lanthorn", version, about)]
struct Cli {
    /// World files to load, in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Seed for the world's random numbers.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Evaluator steps a task may take before it must suspend.
    #[arg(long)]
    step_budget: Option<u64>,

    /// Maximum nesting of calls and dispatches.
    #[arg(long)]
    max_call_depth: Option<usize>,

    /// Log every dispatch step (needs `--log-level trace`).
    #[arg(long)]
    trace_dispatch: bool,

    /// Log filter, e.g. `debug` or `lanthorn_engine=trace`. Overrides `RUST_LOG`.
    #[arg(long)]
    log_level: Option<String>,

    /// Prototype to play. Without it the world runs unattended.
    #[arg(long)]
    actor: Option<String>,

    /// Location the avatar starts in.
    #[arg(long)]
    start: Option<String>,

    /// Ticks to run before play starts, or in total when unattended.
    #[arg(long, default_value_t = 0)]
    ticks: u64,

    /// Read commands from standard input instead of a terminal.
    #[arg(long)]
    batch: bool,

    /// Write a snapshot here on exit.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default()
            .with_seed(self.seed)
            .with_trace_dispatch(self.trace_dispatch);
        if let Some(budget) = self.step_budget {
            config = config.with_step_budget(budget);
        }
        if let Some(depth) = self.max_call_depth {
            config = config.with_max_call_depth(depth);
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (mut world, skipped) = match load_files(&cli.files, cli.engine_config()) {
        Ok(loaded) => loaded,
        Err(lanthorn_runtime::SourceError::Load(errors)) => {
            for error in errors.errors() {
                eprintln!("{}", describe(error));
            }
            return Err(format!("world failed to load ({} errors)", errors.errors().len()).into());
        }
        Err(e) => return Err(e.into()),
    };
    for skip in &skipped {
        warn!(path = %skip.path.display(), "skipped: {}", describe(&skip.error));
    }

    let Some(actor) = &cli.actor else {
        run_unattended(&mut world, cli.ticks);
        return finish(&world, cli.snapshot.as_ref());
    };

    let mut session = Session::join(world, actor, cli.start.as_deref())?;
    let warmup = session.advance(cli.ticks);
    for line in warmup {
        println!("{line}");
    }

    let stdout = io::stdout().lock();
    let session = if cli.batch || !io::stdin().is_terminal() {
        let editor = ScriptEditor::new(BufReader::new(io::stdin().lock()));
        let mut console = Console::with_editor(editor, session, stdout);
        console.run()?;
        console.into_session()
    } else {
        let mut console = Console::interactive(session, stdout)?;
        console.run()?;
        console.into_session()
    };
    finish(session.world(), cli.snapshot.as_ref())
}

/// Runs the clock with nobody playing, logging what scripts say.
fn run_unattended(world: &mut World, ticks: u64) {
    for _ in 0..ticks {
        for update in world.advance_tick() {
            if let Some(text) = update.text() {
                info!(tick = world.tick(), "{text}");
            }
        }
    }
    info!(tick = world.tick(), tasks = world.task_count(), "run finished");
}

fn finish(world: &World, snapshot: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = snapshot {
        save_to_file(&world.snapshot(), path)?;
    }
    Ok(())
}

fn describe(error: &lanthorn_foundation::Error) -> String {
    match &error.context {
        Some(ctx) => match (ctx.line, ctx.column) {
            (Some(line), Some(column)) => format!("{line}:{column}: {error}"),
            _ => error.to_string(),
        },
        None => error.to_string(),
    }
}
