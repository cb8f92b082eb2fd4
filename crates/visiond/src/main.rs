//! NeuroVision Daemon - hosts training rounds for display clients
//!
//! The daemon owns everything a client should not have to re-implement:
//! - The live round and its timers
//! - Result history and user settings
//! - The 20-20-20 break reminder
//! - IPC server (line-delimited JSON over TCP)
//!
//! Storage locations:
//! - Linux: ~/.local/share/neurovision/
//! - Windows: %APPDATA%\neurovision\
//! - MacOS: ~/Library/Application Support/neurovision/

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio::time;
use tracing::{error, info, warn};
use vision_games::time::FrameClock;

mod cues;
mod error;
mod history_file;
mod paths;
mod protocol;
mod session;
mod settings;
mod state;

use paths::AppPaths;
use protocol::{Request, Response};
use state::DaemonState;

const LISTEN_ADDR: &str = "127.0.0.1:9877";

async fn write_response(
    writer: &mut tokio::net::tcp::OwnedWriteHalf,
    response: &Response,
) -> Result<(), Box<dyn std::error::Error>> {
    writer
        .write_all(serde_json::to_string(response)?.as_bytes())
        .await?;
    writer.write_all(b"\n").await?;
    Ok(())
}

async fn handle_client(
    stream: TcpStream,
    state: Arc<RwLock<DaemonState>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let request: Request = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                let resp = Response::error(format!("Invalid request: {}", e));
                write_response(&mut writer, &resp).await?;
                continue;
            }
        };

        let shutting_down = matches!(request, Request::Shutdown);
        let response = {
            let mut s = state.write().await;
            s.handle(request)
        };
        write_response(&mut writer, &response).await?;

        if shutting_down && matches!(response, Response::Success { .. }) {
            info!("Shutdown requested; state saved");
            tokio::spawn(async {
                // Give the response a moment to flush before exiting.
                time::sleep(Duration::from_millis(50)).await;
                std::process::exit(0);
            });
        }
    }

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// Main
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Setup application paths
    let paths = AppPaths::new()?;
    info!("Persistence initialized ({})", paths.data_dir().display());

    let state = Arc::new(RwLock::new(DaemonState::new(paths)));

    // Save on Ctrl-C so the running round and settings persist.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let mut s = state.write().await;
                if let Some(summary) = s.stop_round() {
                    info!("Ctrl-C: recorded {}", summary.payload.label());
                }
                if let Err(e) = s.save() {
                    error!("Ctrl-C save failed: {}", e);
                } else {
                    info!("Ctrl-C: state saved");
                }
                std::process::exit(0);
            }
        });
    }

    let listener = TcpListener::bind(LISTEN_ADDR).await?;
    info!("NeuroVision daemon listening on {}", LISTEN_ADDR);

    // Round loop task
    let state_clone = Arc::clone(&state);
    tokio::spawn(async move {
        let mut clock = FrameClock::new();
        loop {
            let target_fps = {
                let s = state_clone.read().await;
                s.target_fps()
            };
            let frame_millis = (1000 / target_fps.max(1)).max(1) as u64;
            time::sleep(Duration::from_millis(frame_millis)).await;

            let dt = clock.tick();
            let mut s = state_clone.write().await;
            s.tick(dt);
        }
    });

    // Accept client connections
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Accept failed: {}", e);
                continue;
            }
        };
        info!("Client connected: {}", addr);
        let state_clone = Arc::clone(&state);

        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, state_clone).await {
                error!("Client handler error: {}", e);
            }
        });
    }
}
