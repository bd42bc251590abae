// Statline entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Build the stats source and ranking service
// 4. Seed from saved rankings, if any
// 5. Create mpsc channels
// 6. Spawn refresh scheduler
// 7. Spawn WebSocket query server
// 8. Spawn app logic task
// 9. Run the TUI until the user quits
// 10. Cleanup on exit

use std::sync::Arc;

use statline_tui::app;
use statline_tui::config;
use statline_tui::scheduler::{self, Schedule};
use statline_tui::service::RankingService;
use statline_tui::source;
use statline_tui::tui;
use statline_tui::ws_server;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Statline starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} via {:?} at {}, refresh every {}h",
        config.window(),
        config.source.kind,
        config.source.location,
        config.refresh.interval_hours
    );

    // 3. Source and service
    let stats_source =
        source::build_source(&config).context("failed to build stats source")?;
    let service = Arc::new(RankingService::from_config(&config, stats_source));

    // 4. Warm start from the last written artifacts
    match service.seed_from_artifacts() {
        Ok(true) => info!("Serving saved rankings until the first refresh"),
        Ok(false) => info!("No saved rankings; waiting for first refresh"),
        Err(e) => warn!("Ignoring unreadable saved rankings: {}", e),
    }

    // 5. Channels between the app loop and the TUI
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    // 6. Refresh scheduler
    let scheduler_handle = scheduler::spawn(
        Arc::clone(&service),
        Schedule::from(&config.refresh),
    );

    // 7. WebSocket query server
    let ws_port = config.server.port;
    let ws_service = Arc::clone(&service);
    let ws_handle = tokio::spawn(async move {
        if let Err(e) = ws_server::run(ws_port, ws_service).await {
            error!("WebSocket server error on port {}: {}", ws_port, e);
        }
    });

    // 8. App logic task
    let app_service = Arc::clone(&service);
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(app_service, cmd_rx, ui_tx).await {
            error!("Application loop error: {}", e);
        }
    });

    // 9. TUI (blocks until the user presses 'q' or Ctrl+C)
    info!("Application ready. Query server on 127.0.0.1:{}", ws_port);
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {}", e);
    }

    // 10. Cleanup: wait for app task to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    // Both loop forever.
    scheduler_handle.abort();
    ws_handle.abort();

    info!("Statline shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("statline.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("statline_tui=info,statline_engine=info,warn")
            }),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
