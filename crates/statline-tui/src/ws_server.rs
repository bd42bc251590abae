// WebSocket query server: one JSON request per text frame, one response each.

use std::sync::Arc;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};

use crate::protocol::{ErrorCode, Request, Response};
use crate::service::RankingService;

/// Run the query server on `127.0.0.1:{port}`.
///
/// Each accepted connection is served on its own task, so a slow client or a
/// long refresh never blocks other clients. Runs until the task is cancelled.
pub async fn run(port: u16, service: Arc<RankingService>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    let local_addr = listener.local_addr()?;
    info!("Query server listening on {local_addr}");

    loop {
        let (stream, addr) = listener.accept().await?;
        let service = Arc::clone(&service);
        tokio::spawn(serve_connection(stream, addr.to_string(), service));
    }
}

async fn serve_connection(stream: TcpStream, addr: String, service: Arc<RankingService>) {
    info!("Accepted TCP connection from {addr}");
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed for {addr}: {e}");
            return;
        }
    };
    let (mut write, read) = ws_stream.split();
    if let Err(e) = serve_stream(read, &mut write, &service, &addr).await {
        warn!("Failed to reply to {addr}: {e}");
    }
    info!("Client {addr} disconnected");
}

/// Answer every text frame from `stream` on `sink` until close or error.
///
/// Generic over both ends so it can be driven by in-memory streams.
pub async fn serve_stream<St, Si>(
    mut stream: St,
    sink: &mut Si,
    service: &RankingService,
    addr: &str,
) -> Result<(), Si::Error>
where
    St: Stream<Item = Result<Message, WsError>> + Unpin,
    Si: Sink<Message> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                let reply = handle_text(service, text.as_str()).await;
                sink.send(Message::Text(reply.into())).await?;
            }
            Ok(Message::Close(_)) => {
                info!("Client {addr} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
            _ => {
                // Binary, Ping, Pong and raw frames carry no requests.
            }
        }
    }
    Ok(())
}

/// Parse, dispatch and serialize one request. Never fails: parse errors become
/// a `BAD_REQUEST` response.
pub async fn handle_text(service: &RankingService, text: &str) -> String {
    let response = match serde_json::from_str::<Request>(text) {
        Ok(request) => {
            debug!("Request: {:?}", request);
            dispatch(service, request).await
        }
        Err(e) => Response::error(ErrorCode::BadRequest, format!("invalid request: {e}")),
    };
    serde_json::to_string(&response).unwrap_or_else(|e| {
        format!(r#"{{"type":"ERROR","code":"BAD_REQUEST","message":"failed to encode response: {e}"}}"#)
    })
}

pub async fn dispatch(service: &RankingService, request: Request) -> Response {
    match request {
        Request::GetPitchers { limit } => into_response(service.ranked_pitchers(limit)),
        Request::GetHitters { limit } => into_response(service.ranked_hitters(limit)),
        Request::GetPlayer { name } => into_response(service.player(&name)),
        Request::GetTeam { team } => into_response(service.team(&team)),
        Request::Refresh => match service.refresh().await {
            Ok(summary) => Response::Refreshed { summary },
            Err(e) => e.into(),
        },
        Request::FilterStats {
            season,
            timeframe,
            player_type,
        } => into_response(
            service
                .filter_stats(season, &timeframe, &player_type)
                .await,
        ),
        Request::Status => Response::Status {
            status: service.status(),
        },
    }
}

fn into_response<T, E>(result: Result<T, E>) -> Response
where
    T: Into<Response>,
    E: Into<Response>,
{
    match result {
        Ok(v) => v.into(),
        Err(e) => e.into(),
    }
}
