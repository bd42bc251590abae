// Orchestration loop between the ranking service and the TUI.
//
// Forwards every published snapshot and refresh-state change to the render
// loop, and turns user commands into service calls.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::protocol::{UiUpdate, UserCommand};
use crate::service::RankingService;

/// Run until `UserCommand::Quit` arrives or the command channel closes.
///
/// Listens on three sources using `tokio::select!`: the snapshot watch, the
/// refresh-state watch, and the TUI command channel. The current state of
/// both watches is pushed once at startup so a seeded snapshot shows
/// immediately.
pub async fn run(
    service: Arc<RankingService>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    let mut snapshot_rx = service.subscribe();
    let mut refresh_rx = service.subscribe_refresh();

    let current = snapshot_rx.borrow_and_update().clone();
    if let Some(snapshot) = current {
        let _ = ui_tx.send(UiUpdate::Snapshot(snapshot)).await;
    }
    let state = refresh_rx.borrow_and_update().clone();
    let _ = ui_tx.send(UiUpdate::Refresh(state)).await;

    let mut refresh_task: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            // --- Published snapshots ---
            changed = snapshot_rx.changed() => {
                if changed.is_err() {
                    info!("Snapshot channel closed, shutting down");
                    break;
                }
                let latest = snapshot_rx.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    debug!("Forwarding snapshot updated at {}", snapshot.updated_at);
                    let _ = ui_tx.send(UiUpdate::Snapshot(snapshot)).await;
                }
            }

            // --- Refresh progress ---
            changed = refresh_rx.changed() => {
                if changed.is_err() {
                    info!("Refresh-state channel closed, shutting down");
                    break;
                }
                let state = refresh_rx.borrow_and_update().clone();
                let _ = ui_tx.send(UiUpdate::Refresh(state)).await;
            }

            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(UserCommand::Refresh) => {
                        if refresh_task.as_ref().is_some_and(|t| !t.is_finished()) {
                            debug!("Refresh already in progress; ignoring request");
                            continue;
                        }
                        info!("Manual refresh requested");
                        let service = Arc::clone(&service);
                        refresh_task = Some(tokio::spawn(async move {
                            if let Err(e) = service.refresh().await {
                                warn!("Manual refresh failed: {}", e);
                            }
                        }));
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    if let Some(task) = refresh_task {
        task.abort();
    }
    Ok(())
}
