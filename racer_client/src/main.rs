//! Standalone client binary.
//!
//! Usage:
//!   cargo run -p racer_client -- [--config race.json] [--catalog tracks.json]
//!       [--track 0] [--frames 3600] [--seed 42] [--script "120:A,30:AR"]
//!       [--unpaced]
//!
//! Without `--script` the autopilot drives. The run ends when the race is
//! complete, the frame limit is hit, or `quit` is typed; a JSON summary is
//! printed on exit.
//!
//! Console commands:
//!   status         - Show race status
//!   tracks         - List the catalog
//!   track <index>  - Start a track
//!   next           - Start the next track
//!   restart        - Restart the current track
//!   pause          - Pause or resume
//!   stop           - Return to the title state
//!   quit           - Exit client

use std::env;
use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::Context;
use racer_client::client::{GameClient, LoopOptions};
use racer_client::input::{Autopilot, InputSource, ScriptedInput};
use racer_shared::{catalog::TrackCatalog, config::RaceConfig};
use tokio::sync::mpsc;
use tracing::info;

#[derive(Debug, Default)]
struct ClientArgs {
    config: Option<String>,
    catalog: Option<String>,
    track: usize,
    frames: Option<u64>,
    seed: Option<u64>,
    script: Option<String>,
    unpaced: bool,
}

fn parse_args() -> anyhow::Result<ClientArgs> {
    let mut out = ClientArgs::default();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                out.config = Some(args[i + 1].clone());
                i += 2;
            }
            "--catalog" if i + 1 < args.len() => {
                out.catalog = Some(args[i + 1].clone());
                i += 2;
            }
            "--track" if i + 1 < args.len() => {
                out.track = args[i + 1].parse().context("--track")?;
                i += 2;
            }
            "--frames" if i + 1 < args.len() => {
                out.frames = Some(args[i + 1].parse().context("--frames")?);
                i += 2;
            }
            "--seed" if i + 1 < args.len() => {
                out.seed = Some(args[i + 1].parse().context("--seed")?);
                i += 2;
            }
            "--script" if i + 1 < args.len() => {
                out.script = Some(args[i + 1].clone());
                i += 2;
            }
            "--unpaced" => {
                out.unpaced = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    Ok(out)
}

fn load_config(args: &ClientArgs) -> anyhow::Result<RaceConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
            RaceConfig::from_json_str(&text).with_context(|| format!("parse {path}"))?
        }
        None => RaceConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.race.seed = seed;
    }
    Ok(config)
}

fn load_catalog(args: &ClientArgs) -> anyhow::Result<TrackCatalog> {
    match &args.catalog {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
            TrackCatalog::from_json_str(&text).with_context(|| format!("parse {path}"))
        }
        None => Ok(TrackCatalog::builtin()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args()?;
    let config = load_config(&args)?;
    let catalog = load_catalog(&args)?;
    info!(
        tracks = catalog.len(),
        track = args.track,
        seed = config.race.seed,
        tick_hz = config.race.tick_hz,
        "Starting client"
    );

    let tick_hz = config.race.tick_hz.max(1);
    let mut client = GameClient::new(config, catalog);
    client.start(args.track)?;

    let mut input: Box<dyn InputSource> = match &args.script {
        Some(script) => Box::new(ScriptedInput::parse(script).context("--script")?),
        None => Box::new(Autopilot::default()),
    };

    // Set up console input channel.
    let (console_tx, console_rx) = mpsc::channel::<String>(32);

    // Spawn stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!("Race started. Type 'status' for info, 'quit' to exit.");
    println!();

    let opts = LoopOptions {
        max_frames: args.frames,
        pace: (!args.unpaced).then(|| Duration::from_secs_f64(1.0 / f64::from(tick_hz))),
        exit_on_finish: true,
    };
    let summary = client.run(input.as_mut(), Some(console_rx), opts).await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
