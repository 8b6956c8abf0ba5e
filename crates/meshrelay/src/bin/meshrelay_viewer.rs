//! # Headless Relay Driver
//!
//! Runs the full pipeline without a renderer: the mesh lives in owned
//! buffers that grow to fit the producer's frames.
//!
//! ```text
//! meshrelay_viewer [config.toml]
//!
//! stdin:  <enter> | t   toggle streaming
//!         s             sync once
//!         q             quit
//! ```

use std::io::BufRead;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use meshrelay::{telemetry, CycleOutcome, MeshRelay, PollLoop, RelayConfig};
use meshrelay_core::MeshBuffers;
use meshrelay_ipc::SharedRegion;
use meshrelay_networking::{NotifierState, RemoteNotifier};

/// How long startup waits for the WebSocket handshake.
const HANDSHAKE_WAIT: Duration = Duration::from_secs(2);

/// Idle wait while streaming is off.
const IDLE_WAIT: Duration = Duration::from_millis(250);

/// Cycles between stats lines.
const STATS_EVERY: u64 = 150;

/// Operator command read from stdin.
#[derive(Clone, Copy, Debug)]
enum Command {
    Toggle,
    SyncOnce,
    Quit,
}

fn main() -> ExitCode {
    let config = match std::env::args().nth(1) {
        Some(path) => match RelayConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("meshrelay_viewer: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => RelayConfig::default(),
    };
    telemetry::init(&config.log_level);

    tracing::info!(
        "meshrelay_viewer starting: segment {}, remote {}, {} Hz",
        config.region.path().display(),
        config.remote.url,
        config.poll.rate_hz
    );

    let region = SharedRegion::open(config.region.clone());
    let notifier = match RemoteNotifier::connect(config.remote.clone()) {
        Ok(notifier) => notifier,
        Err(e) => {
            tracing::error!("cannot start notifier: {e}");
            return ExitCode::FAILURE;
        }
    };
    if notifier.wait_for_handshake(HANDSHAKE_WAIT) != NotifierState::Connected {
        tracing::warn!("remote endpoint not connected, snapshots will be dropped");
    }

    let poll = PollLoop::new(config.poll.interval());
    let mut relay = MeshRelay::with_poll(region, notifier, MeshBuffers::growable(), poll);
    if config.poll.start_streaming {
        relay.toggle_streaming();
    }

    let commands = spawn_stdin_reader();
    run(&mut relay, &commands);

    tracing::info!("meshrelay_viewer exiting after {} cycles", relay.stats().cycles);
    ExitCode::SUCCESS
}

type Viewer = MeshRelay<SharedRegion, RemoteNotifier, MeshBuffers>;

fn run(relay: &mut Viewer, commands: &Receiver<Command>) {
    loop {
        if let Some(outcome) = relay.pump() {
            log_cycle(relay, outcome);
        }

        let wait = relay.poll().time_until_next().unwrap_or(IDLE_WAIT);
        match commands.recv_timeout(wait) {
            Ok(Command::Toggle) => {
                relay.toggle_streaming();
            }
            Ok(Command::SyncOnce) => {
                let outcome = relay.sync_once();
                tracing::info!("manual sync: {outcome:?}");
            }
            Ok(Command::Quit) => return,
            Err(RecvTimeoutError::Timeout) => {}
            // stdin closed: keep streaming with no operator
            Err(RecvTimeoutError::Disconnected) => {
                if !relay.is_streaming() {
                    return;
                }
                thread::sleep(wait);
            }
        }
    }
}

fn log_cycle(relay: &Viewer, outcome: CycleOutcome) {
    let stats = relay.stats();
    tracing::trace!("cycle {}: {outcome:?}", stats.cycles);
    if stats.cycles % STATS_EVERY == 0 {
        tracing::info!(
            cycles = stats.cycles,
            skipped = stats.skipped,
            sent = stats.snapshots_sent,
            dropped = stats.snapshots_dropped,
            vertices = relay.target().vertex_count(),
            triangles = relay.target().triangle_count(),
            "relay stats"
        );
    }
}

fn spawn_stdin_reader() -> Receiver<Command> {
    let (tx, rx) = bounded(8);
    let spawned = thread::Builder::new()
        .name("meshrelay-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let command = match line.trim() {
                    "" | "t" => Command::Toggle,
                    "s" => Command::SyncOnce,
                    "q" => Command::Quit,
                    other => {
                        tracing::warn!("unknown command `{other}` (t, s, q)");
                        continue;
                    }
                };
                if tx.send(command).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::warn!("no stdin control: {e}");
    }
    rx
}
