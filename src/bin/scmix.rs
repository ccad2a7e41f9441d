use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
#[cfg(feature = "debug-draw")]
use std::thread;
#[cfg(feature = "debug-draw")]
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use soundclass_mixer::commands::CommandRegistry;
use soundclass_mixer::config::MixerConfig;
use soundclass_mixer::dsp::FadeCurve;
use soundclass_mixer::error::log_command_error;
use soundclass_mixer::handle::MixerHandle;
use soundclass_mixer::mixer::{BusKind, BusSnapshot};
use tokio::sync::broadcast;

#[derive(Parser, Debug)]
#[command(
    name = "scmix",
    about = "Control-rate volume automation for named audio buses"
)]
struct Cli {
    /// Override the mixer configuration file (defaults to assets/mixer.json)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the buses gathered from configuration
    Classes,
    /// Simulate a fade offline and print one JSON sample per tick
    Fade {
        #[arg(long)]
        bus: String,
        #[arg(long)]
        level: f32,
        /// Fade duration in seconds (defaults to the configured duration)
        #[arg(long)]
        duration: Option<f32>,
        /// Fade curve: linear, s_curve, sin or logarithmic
        #[arg(long)]
        curve: Option<FadeCurve>,
        /// Target a submix instead of a sound class
        #[arg(long)]
        submix: bool,
        /// Simulated tick rate (defaults to the configured rate)
        #[arg(long)]
        tick_hz: Option<f32>,
    },
    /// Set a bus volume immediately
    Set {
        #[arg(long)]
        bus: String,
        #[arg(long)]
        level: f32,
        #[arg(long)]
        submix: bool,
    },
    /// Print the current and target volume of a bus
    Get {
        #[arg(long)]
        bus: String,
        #[arg(long)]
        submix: bool,
    },
    /// Interactive console driving a live ticker
    Console,
    /// Run the ticker and print the volume table until the deadline
    #[cfg(feature = "debug-draw")]
    Watch {
        /// How long to watch, in seconds
        #[arg(long, default_value_t = 5.0)]
        duration: f32,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => MixerConfig::load_from_file(path),
        None => MixerConfig::load(),
    };
    let handle = MixerHandle::new(config);

    match cli.command {
        Commands::Classes => run_classes(&handle),
        Commands::Fade {
            bus,
            level,
            duration,
            curve,
            submix,
            tick_hz,
        } => run_fade(&handle, &bus, level, duration, curve, submix, tick_hz),
        Commands::Set { bus, level, submix } => run_set(&handle, &bus, level, submix),
        Commands::Get { bus, submix } => run_get(&handle, &bus, submix),
        Commands::Console => run_console(Arc::new(handle)),
        #[cfg(feature = "debug-draw")]
        Commands::Watch { duration } => run_watch(handle, duration),
    }
}

fn bus_kind(submix: bool) -> BusKind {
    if submix {
        BusKind::Submix
    } else {
        BusKind::SoundClass
    }
}

fn run_classes(handle: &MixerHandle) -> Result<ExitCode> {
    let rows = handle.snapshot()?;
    if rows.is_empty() {
        println!("No buses configured");
        return Ok(ExitCode::SUCCESS);
    }

    for row in rows {
        println!("{} {} {:.4}", row.kind, row.name, row.volume);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_fade(
    handle: &MixerHandle,
    bus: &str,
    level: f32,
    duration: Option<f32>,
    curve: Option<FadeCurve>,
    submix: bool,
    tick_hz: Option<f32>,
) -> Result<ExitCode> {
    let kind = bus_kind(submix);
    let duration = duration.unwrap_or(handle.config().fade.default_duration);
    let curve = curve.unwrap_or(handle.config().fade.default_curve);
    let tick_hz = tick_hz.unwrap_or(handle.config().engine.tick_hz).max(1.0);
    let step = 1.0 / tick_hz;

    let mut events = handle.subscribe();
    handle.fade_to(kind, bus, level, duration, curve)?;

    let mut elapsed = 0.0f32;
    emit_sample(elapsed, handle.volume(kind, bus)?)?;
    while bus_row(handle, kind, bus)?.fading {
        handle.update(step)?;
        elapsed += step;
        emit_sample(elapsed, handle.volume(kind, bus)?)?;
    }

    loop {
        match events.try_recv() {
            Ok(event) => println!("{}", serde_json::to_string(&event)?),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_set(handle: &MixerHandle, bus: &str, level: f32, submix: bool) -> Result<ExitCode> {
    let kind = bus_kind(submix);
    handle.set_volume(kind, bus, level)?;
    println!("{} {:.4}", bus, handle.volume(kind, bus)?);
    Ok(ExitCode::SUCCESS)
}

fn run_get(handle: &MixerHandle, bus: &str, submix: bool) -> Result<ExitCode> {
    let kind = bus_kind(submix);
    let volume = handle.volume(kind, bus)?;
    let target = handle.target_volume(kind, bus)?;
    println!("{} {:.4} -> {:.4}", bus, volume, target);
    Ok(ExitCode::SUCCESS)
}

fn run_console(handle: Arc<MixerHandle>) -> Result<ExitCode> {
    handle.start()?;
    let mut registry = CommandRegistry::new(Arc::clone(&handle));
    println!("SoundClass mixer console. Type 'help' for commands, 'quit' to leave.");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed == "quit" || trimmed == "exit" {
            break;
        }

        match registry.dispatch(trimmed) {
            Ok(output) => {
                for entry in output {
                    println!("{entry}");
                }
            }
            Err(err) => {
                log_command_error(&err, trimmed);
                eprintln!("{err}");
            }
        }

        #[cfg(feature = "debug-draw")]
        if registry.debug_draw_enabled() {
            for row in registry.render_overlay()? {
                println!("{row}");
            }
        }
    }

    handle.stop()?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "debug-draw")]
fn run_watch(handle: MixerHandle, duration: f32) -> Result<ExitCode> {
    use soundclass_mixer::overlay::VolumeTable;

    let mut events = handle.subscribe();
    handle.start()?;

    let printer = thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to create Tokio runtime for event printer");

        rt.block_on(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let Ok(json) = serde_json::to_string(&event) {
                            println!("{json}");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        eprintln!("[scmix] Event printer lagged, skipped {skipped} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    });

    let deadline = Instant::now() + Duration::from_secs_f32(duration.max(0.1));
    while Instant::now() < deadline {
        for row in VolumeTable::from_snapshots(&handle.snapshot()?).render() {
            println!("{row}");
        }
        thread::sleep(Duration::from_millis(500));
    }

    handle.stop()?;
    drop(handle);
    if printer.join().is_err() {
        eprintln!("[scmix] Event printer thread panicked");
    }
    Ok(ExitCode::SUCCESS)
}

fn bus_row(handle: &MixerHandle, kind: BusKind, bus: &str) -> Result<BusSnapshot> {
    let rows = handle.snapshot()?;
    rows.into_iter()
        .find(|row| row.kind == kind && row.name == bus)
        .ok_or_else(|| anyhow::anyhow!("bus {} disappeared from the snapshot", bus))
}

fn emit_sample(elapsed: f32, volume: f32) -> Result<()> {
    let sample = TickSample { elapsed, volume };
    println!("{}", serde_json::to_string(&sample)?);
    Ok(())
}

#[derive(Serialize)]
struct TickSample {
    elapsed: f32,
    volume: f32,
}
