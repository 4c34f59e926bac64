//! NPC Vibes Engine - Main entry point.
//!
//! Loads a scene document, then reads one JSON object per line from stdin:
//! host events (`{"event": ...}`) and UI commands (`{"action": ...}`).
//! Command responses are written to stdout, one per line.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use npcvibes_engine::api::{self, HostEvent};
use npcvibes_engine::infrastructure::{
    broadcast::BroadcastBus,
    canvas::InMemoryCanvas,
    clock::{SystemClock, SystemRandom},
    messaging::TracingMessenger,
    ports::ClockPort,
    presentation::TracingPresenter,
    settings::{SqliteSettingsRepo, MODULE_NAMESPACE},
};
use npcvibes_engine::{App, AppPorts};
use npcvibes_shared::{ErrorCode, ResponseResult, UiCommand};

/// How often buffered ledger writes and stale sight answers are checked
const HOUSEKEEPING_TICK: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "npcvibes_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting NPC Vibes Engine");

    // Load configuration
    let db_path = std::env::var("VIBES_DB_PATH").unwrap_or_else(|_| "world.db".into());
    let scene_path = std::env::var("VIBES_SCENE_PATH").unwrap_or_else(|_| "scene.json".into());
    let process_id = std::env::var("VIBES_PROCESS_ID").unwrap_or_else(|_| "local".into());

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
    let settings_repo =
        Arc::new(SqliteSettingsRepo::new(&db_path, MODULE_NAMESPACE, clock.clone()).await?);

    tracing::info!(path = %scene_path, "Loading scene");
    let scene_json = tokio::fs::read_to_string(&scene_path).await?;
    let canvas = Arc::new(InMemoryCanvas::from_json(&scene_json)?);

    let bus = BroadcastBus::new();
    let broadcast = Arc::new(bus.handle(process_id.clone()));
    let mut subscription = broadcast.subscribe();

    let app = Arc::new(App::new(AppPorts {
        settings_repo,
        canvas,
        messaging: Arc::new(TracingMessenger::new()),
        broadcast,
        presentation: Arc::new(TracingPresenter::new()),
        clock,
        random: Arc::new(SystemRandom::new()),
    }));

    // A corrupt document must not stop the session; start empty and say so.
    if let Err(e) = app.load().await {
        tracing::error!(error = %e, "Failed to load vibe data, starting empty");
        app.ports
            .messaging
            .alert(&format!("Failed to load vibe data: {e}"))
            .await
            .ok();
    }

    api::handle_host_event(&app, HostEvent::CanvasReady).await;

    // Input lines, peer messages and housekeeping share one loop so a
    // process handles a single event at a time.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut ticker = tokio::time::interval(HOUSEKEEPING_TICK);
    let mut socket_open = true;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Some(response) = handle_input_line(&app, &line).await {
                    let mut out = serde_json::to_vec(&response)?;
                    out.push(b'\n');
                    stdout.write_all(&out).await?;
                    stdout.flush().await?;
                }
            }
            message = subscription.recv(), if socket_open => match message {
                Some(message) => api::handle_socket_message(&app, message).await,
                None => {
                    tracing::info!("Socket bus closed");
                    socket_open = false;
                }
            },
            _ = ticker.tick() => {
                app.tick().await;
            }
        }
    }

    app.shutdown().await?;
    tracing::info!("NPC Vibes Engine stopped");
    Ok(())
}

/// Handle one JSON line: host events produce no output, UI commands
/// produce a response.
async fn handle_input_line(app: &App, line: &str) -> Option<ResponseResult> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping unreadable input line");
            return None;
        }
    };

    if value.get("event").is_some() {
        match serde_json::from_value::<HostEvent>(value) {
            Ok(event) => {
                let rolled = api::handle_host_event(app, event).await;
                tracing::debug!(rolled, "Host event handled");
            }
            Err(e) => tracing::warn!(error = %e, "Skipping malformed host event"),
        }
        return None;
    }

    Some(match serde_json::from_value::<UiCommand>(value) {
        Ok(command) => api::handle_command(app, command).await,
        Err(e) => ResponseResult::error(ErrorCode::BadRequest, e.to_string()),
    })
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
