use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sartori::handlers::{JsonLinesHandler, LogHandler, MidiHandler, TraceMidiOutput};
use sartori::inspect::{evaluate_pattern, parse_pattern};
use sartori::{Compiler, Diagnostics, RandomSource, Settings};
use sartori_scheduler::{Clock, ManualTimeSource, Player, Scheduler, SystemTimeSource};

#[derive(Parser, Debug)]
#[command(name = "sartori")]
#[command(about = "Live-coding pattern sequencer", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for the random source, overriding the settings file
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a script in real time, printing events as JSON lines
    Run {
        file: PathBuf,

        /// Stop after this many seconds (default: run until killed)
        #[arg(short, long)]
        seconds: Option<f64>,

        /// Re-evaluate the script whenever the file changes
        #[arg(short, long, default_value = "false")]
        watch: bool,

        #[command(flatten)]
        outputs: Outputs,
    },

    /// Render a number of cycles as fast as possible
    Render {
        file: PathBuf,

        #[arg(short = 'n', long, default_value = "4")]
        cycles: f64,

        #[command(flatten)]
        outputs: Outputs,
    },

    /// Query a mini-notation pattern
    Eval {
        pattern: String,

        #[arg(long, default_value = "0")]
        from: f64,

        #[arg(short, long, default_value = "1")]
        duration: f64,

        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,
    },

    /// Evaluate a script and report errors without playing
    Check { file: PathBuf },
}

#[derive(clap::Args, Debug)]
struct Outputs {
    /// Also log every event through tracing
    #[arg(long, default_value = "false")]
    log_events: bool,

    /// Map events with a `midi` parameter to MIDI messages (logged)
    #[arg(long, default_value = "false")]
    midi: bool,

    /// Suppress the JSON lines on stdout
    #[arg(short, long, default_value = "false")]
    quiet: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Format {
    Json,
    Debug,
    Ast,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let random = match cli.seed.or(settings.seed) {
        Some(seed) => RandomSource::seeded(seed),
        None => RandomSource::from_entropy(),
    };

    match cli.command {
        Command::Run {
            file,
            seconds,
            watch,
            outputs,
        } => run(&file, seconds, watch, &outputs, &settings, random),
        Command::Render {
            file,
            cycles,
            outputs,
        } => render(&file, cycles, &outputs, &settings, random),
        Command::Eval {
            pattern,
            from,
            duration,
            format,
        } => eval(&pattern, from, duration, format, random),
        Command::Check { file } => check(&file, &settings, random),
    }
}

fn read_script(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn compiler(path: &Path, settings: &Settings, random: RandomSource) -> Result<Compiler> {
    let source = read_script(path)?;
    let mut compiler = Compiler::new(settings.pool(), random, Diagnostics::new());
    compiler
        .evaluate(&source)
        .with_context(|| format!("in {}", path.display()))?;
    Ok(compiler)
}

fn scheduler(compiler: Compiler, outputs: &Outputs, settings: &Settings) -> Result<Scheduler<Compiler>> {
    let diagnostics = compiler.diagnostics().clone();
    let mut scheduler = Scheduler::new(compiler, settings.scheduler)?;
    if !outputs.quiet {
        scheduler.add_handler(Box::new(JsonLinesHandler::new(std::io::stdout())));
    }
    if outputs.log_events {
        scheduler.add_handler(Box::new(LogHandler));
    }
    if outputs.midi {
        let output = TraceMidiOutput {
            name: "default".to_string(),
        };
        scheduler.add_handler(Box::new(MidiHandler::new("default", Box::new(output))));
    }
    scheduler.set_error_sink(Box::new(move |err| diagnostics.warning(err.to_string())));
    Ok(scheduler)
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

fn run(
    path: &Path,
    seconds: Option<f64>,
    watch: bool,
    outputs: &Outputs,
    settings: &Settings,
    random: RandomSource,
) -> Result<()> {
    let compiler = compiler(path, settings, random)?;
    let scheduler = scheduler(compiler, outputs, settings)?;
    let mut player = Player::new(scheduler, Arc::new(SystemTimeSource::new()));
    player.play();

    let poll = Duration::from_millis(250);
    let deadline = seconds.map(|s| std::time::Instant::now() + Duration::from_secs_f64(s.max(0.0)));
    let mut last_modified = modified(path);

    loop {
        if deadline.is_some_and(|deadline| std::time::Instant::now() >= deadline) {
            break;
        }
        thread::sleep(poll);

        if !watch {
            continue;
        }
        let current = modified(path);
        if current == last_modified {
            continue;
        }
        last_modified = current;
        match read_script(path) {
            Ok(source) => {
                // errors are broadcast by the compiler, which keeps the last good program
                if player.with_source(|compiler| compiler.evaluate(&source)).is_ok() {
                    info!(path = %path.display(), "reloaded");
                }
            }
            Err(err) => warn!("{err:#}"),
        }
    }

    player.stop();
    Ok(())
}

fn render(path: &Path, cycles: f64, outputs: &Outputs, settings: &Settings, random: RandomSource) -> Result<()> {
    let compiler = compiler(path, settings, random)?;
    let scheduler = Arc::new(Mutex::new(scheduler(compiler, outputs, settings)?));
    scheduler.lock().play(0.0);

    let ticking = Arc::clone(&scheduler);
    let clock = Clock::start(Arc::new(ManualTimeSource::new(0.0)), 0.0, move |now| {
        let mut scheduler = ticking.lock();
        if scheduler.phase() >= cycles {
            return None;
        }
        scheduler.tick(now).map(|report| report.next_tick)
    });
    clock.join();

    let mut scheduler = scheduler.lock();
    scheduler.stop();
    info!(cycles = scheduler.phase(), "rendered");
    Ok(())
}

fn eval(pattern: &str, from: f64, duration: f64, format: Format, random: RandomSource) -> Result<()> {
    let report = |err: sartori::inspect::InspectError| match &err.location {
        Some(location) => anyhow::anyhow!("{}:{}: {}", location.line, location.column, err.message),
        None => anyhow::anyhow!(err.message),
    };

    match format {
        Format::Ast => {
            let node = parse_pattern(pattern).map_err(report)?;
            println!("{}", serde_json::to_string_pretty(&node)?);
        }
        Format::Json => {
            let haps = evaluate_pattern(pattern, from, duration, random).map_err(report)?;
            println!("{}", serde_json::to_string_pretty(&haps)?);
        }
        Format::Debug => {
            for hap in evaluate_pattern(pattern, from, duration, random).map_err(report)? {
                println!("[{} -> {}) {}", hap.from, hap.to, hap.value);
            }
        }
    }
    Ok(())
}

fn check(path: &Path, settings: &Settings, random: RandomSource) -> Result<()> {
    let source = read_script(path)?;
    let mut compiler = Compiler::new(settings.pool(), random, Diagnostics::new());
    if let Err(err) = compiler.evaluate(&source) {
        let position = err.position();
        anyhow::bail!("{}:{}:{}: {}", path.display(), position.line, position.column, err);
    }

    let pool = compiler.pool();
    for stream in pool.streams().chain(std::iter::once(pool.global())) {
        if stream.is_empty() {
            continue;
        }
        let keys: Vec<&str> = stream.keys().collect();
        println!("{}: {}", stream.id(), keys.join(", "));
    }
    println!("ok");
    Ok(())
}
