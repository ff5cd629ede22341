use std::env;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use contracts::SimConfig;
use hearth_core::{World, WorldError};
use log::{info, warn};

const CONFIG_ENV: &str = "HEARTH_CONFIG";
const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, thiserror::Error)]
enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn print_usage() {
    println!("hearth <command>");
    println!("commands:");
    println!("  play [config.json] [--hotel]");
    println!("    interactive session; type `verb [object]` lines, `quit` to leave");
    println!("  simulate <seconds> [seed] [--hotel]");
    println!("    runs headless and prints everything the player perceives");
    println!("  config [config.json]");
    println!("    prints the effective configuration as JSON");
    println!("config path falls back to ${CONFIG_ENV}, then built-in defaults");
}

fn load_config(path: Option<&str>) -> Result<SimConfig, ConfigError> {
    let path = path
        .map(PathBuf::from)
        .or_else(|| {
            env::var(CONFIG_ENV)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
        });
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    read_config(&path)
}

fn read_config(path: &Path) -> Result<SimConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!("loaded config from {}", path.display());
    Ok(config)
}

fn build_world(config: SimConfig, hotel: bool) -> Result<World, WorldError> {
    if hotel {
        World::hotel(config)
    } else {
        World::demo(config)
    }
}

/// Split positional arguments from `--flags`.
fn split_args(args: &[String]) -> (Vec<&str>, Vec<&str>) {
    args.iter()
        .map(String::as_str)
        .partition(|arg| !arg.starts_with("--"))
}

fn parse_seconds(value: Option<&&str>) -> Result<f64, String> {
    let raw = value.ok_or_else(|| "missing seconds".to_string())?;
    raw.parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s >= 0.0)
        .ok_or_else(|| format!("invalid seconds: {raw}"))
}

fn parse_seed(value: Option<&&str>) -> Result<Option<u64>, String> {
    value
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|_| format!("invalid seed: {raw}"))
        })
        .transpose()
}

/// Lines typed by the user, read on a separate thread so the loop never blocks.
fn spawn_input() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn split_command(line: &str) -> Option<(&str, Option<&str>)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((verb, object)) => Some((verb, Some(object.trim()))),
        None => Some((line, None)),
    }
}

fn run_play(args: &[String]) -> Result<(), String> {
    let (positional, flags) = split_args(args);
    let config = load_config(positional.first().copied()).map_err(|err| err.to_string())?;
    let mut world =
        build_world(config, flags.contains(&"--hotel")).map_err(|err| err.to_string())?;

    println!("It is {}.", world.clock().display());
    if let Ok(action) = world.submit_command("look", None) {
        info!("opening with {action:?}");
    }

    let input = spawn_input();
    let start = Instant::now();
    loop {
        match input.try_recv() {
            Ok(line) => match split_command(&line) {
                Some(("quit" | "exit", _)) => break,
                Some(("time", _)) => println!("It is {}.", world.clock().display()),
                Some((verb, object)) => {
                    if let Err(err) = world.submit_command(verb, object) {
                        println!("{err}");
                    }
                }
                None => {}
            },
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break,
        }

        for line in world.frame(start.elapsed()) {
            println!("{line}");
        }
        thread::sleep(FRAME);
    }

    if let Err(problem) = world.verify() {
        warn!("world ended inconsistent: {problem}");
    }
    Ok(())
}

fn run_simulation(args: &[String]) -> Result<(), String> {
    let (positional, flags) = split_args(args);
    let seconds = parse_seconds(positional.first())?;
    let mut config = load_config(None).map_err(|err| err.to_string())?;
    if let Some(seed) = parse_seed(positional.get(1))? {
        config.seed = seed;
    }
    let seed = config.seed;
    let mut world =
        build_world(config, flags.contains(&"--hotel")).map_err(|err| err.to_string())?;

    let start = world.clock().display();
    let results = world.run_for(seconds);
    for line in world.report(&results) {
        println!("{line}");
    }
    world.verify()?;
    println!(
        "simulated seed={} from={} to={} actions={}",
        seed,
        start,
        world.clock().display(),
        results.len()
    );
    Ok(())
}

fn run_config(args: &[String]) -> Result<(), String> {
    let (positional, _) = split_args(args);
    let config = load_config(positional.first().copied()).map_err(|err| err.to_string())?;
    let json = serde_json::to_string_pretty(&config).map_err(|err| err.to_string())?;
    println!("{json}");
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);
    let rest = args.get(2..).unwrap_or_default();

    let outcome = match command {
        Some("play") => run_play(rest),
        Some("simulate") => run_simulation(rest),
        Some("config") => run_config(rest),
        _ => {
            print_usage();
            return;
        }
    };

    if let Err(err) = outcome {
        eprintln!("error: {err}");
        print_usage();
        std::process::exit(2);
    }
}
