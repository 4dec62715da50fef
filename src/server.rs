//! WebSocket host for the session gateway.
//!
//! Each socket becomes one peer. Requests from all sockets are applied to the
//! gateway under a single lock, and the resulting messages are queued on the
//! recipients' outboxes before the lock is released, so every peer sees
//! events in the order the gateway produced them. Outboxes are bounded, and a
//! peer that stops reading is disconnected once its outbox fills.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::gateway::SessionGateway;
use crate::protocol::{ClientMessage, Outbound, Recipient, ServerMessage};
use crate::state::PeerId;

/// Default number of events a peer may fall behind before it is cut off.
pub const OUTBOX_CAPACITY: usize = 256;

/// Per-peer queue of outbound events.
pub type Outbox = mpsc::Sender<ServerMessage>;

struct HubInner {
    gateway: SessionGateway,
    outboxes: HashMap<PeerId, Outbox>,
}

impl HubInner {
    /// Queue events for their recipients.
    ///
    /// A peer whose outbox is full loses it: the socket task then sees its
    /// queue close and disconnects the peer.
    fn deliver(&mut self, out: Vec<Outbound>) {
        let mut lagging = Vec::new();
        for Outbound { to, message } in out {
            match to {
                Recipient::Peer(peer) => {
                    if let Some(tx) = self.outboxes.get(&peer) {
                        if !push(peer, tx, message) {
                            lagging.push(peer);
                        }
                    }
                }
                Recipient::All => {
                    for (peer, tx) in &self.outboxes {
                        if !push(*peer, tx, message.clone()) {
                            lagging.push(*peer);
                        }
                    }
                }
            }
        }

        for peer in lagging {
            if self.outboxes.remove(&peer).is_some() {
                warn!(peer, "outbox full, dropping slow peer");
            }
        }
    }
}

/// Returns `false` only when the peer has fallen too far behind.
fn push(peer: PeerId, tx: &Outbox, message: ServerMessage) -> bool {
    match tx.try_send(message) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => false,
        Err(TrySendError::Closed(_)) => {
            debug!(peer, "outbox closed");
            true
        }
    }
}

/// Shared state behind the HTTP router.
pub struct Hub {
    inner: Mutex<HubInner>,
    next_peer: AtomicU64,
    outbox_capacity: usize,
}

impl Hub {
    pub fn new(gateway: SessionGateway) -> Self {
        Self::with_outbox_capacity(gateway, OUTBOX_CAPACITY)
    }

    pub fn with_outbox_capacity(gateway: SessionGateway, outbox_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(HubInner {
                gateway,
                outboxes: HashMap::new(),
            }),
            next_peer: AtomicU64::new(1),
            outbox_capacity: outbox_capacity.max(1),
        }
    }

    /// Register a new peer. Returns its id and the receiving end of its outbox.
    pub async fn connect(&self) -> (PeerId, mpsc::Receiver<ServerMessage>) {
        let peer = self.next_peer.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.outbox_capacity);

        let mut inner = self.inner.lock().await;
        inner.outboxes.insert(peer, tx);
        let out = inner.gateway.connect(peer);
        inner.deliver(out);

        (peer, rx)
    }

    pub async fn handle(&self, peer: PeerId, msg: ClientMessage) {
        let mut inner = self.inner.lock().await;
        let out = inner.gateway.handle(peer, msg);
        inner.deliver(out);
    }

    /// Answer an unparseable frame.
    pub async fn reject(&self, peer: PeerId, reason: String) {
        let mut inner = self.inner.lock().await;
        inner.deliver(vec![Outbound::to_peer(peer, ServerMessage::error(reason))]);
    }

    pub async fn disconnect(&self, peer: PeerId) {
        let mut inner = self.inner.lock().await;
        let out = inner.gateway.disconnect(peer);
        inner.outboxes.remove(&peer);
        inner.deliver(out);
    }

    pub async fn health(&self) -> serde_json::Value {
        self.inner.lock().await.gateway.to_json()
    }
}

/// HTTP routes: `/ws` for play, `/health` for a status snapshot.
pub fn router(hub: Arc<Hub>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(hub)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig) -> anyhow::Result<()> {
    let hub = Arc::new(Hub::with_outbox_capacity(
        SessionGateway::new(config.gateway_options()),
        config.server.outbox_capacity,
    ));

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(
        addr = %listener.local_addr()?,
        echo_to_sender = config.relay.echo_to_sender,
        "listening"
    );

    axum::serve(listener, router(hub))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutting down");
}

async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<Hub>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(hub, socket))
}

async fn health_handler(State(hub): State<Arc<Hub>>) -> Json<serde_json::Value> {
    Json(hub.health().await)
}

/// Pump one socket until either side closes.
async fn handle_socket(hub: Arc<Hub>, mut socket: WebSocket) {
    let (peer, mut rx) = hub.connect().await;
    debug!(peer, "socket opened");

    loop {
        tokio::select! {
            queued = rx.recv() => {
                // Closed when the hub cut this peer off.
                let Some(msg) = queued else { break };
                let json = match msg.to_json() {
                    Ok(json) => json,
                    Err(err) => {
                        warn!(peer, %err, "failed to encode event");
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            frame = socket.recv() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match ClientMessage::from_json(text.as_str()) {
                        Ok(msg) => hub.handle(peer, msg).await,
                        Err(err) => {
                            warn!(peer, %err, "malformed frame");
                            hub.reject(peer, format!("Invalid message: {}", err)).await;
                        }
                    },
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                }
            }
        }
    }

    hub.disconnect(peer).await;
    debug!(peer, "socket closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayOptions;
    use crate::state::{LeaderboardSnapshot, Role, RoomManager};

    fn hub() -> Hub {
        Hub::new(SessionGateway::with_rooms(
            RoomManager::with_seed(11),
            GatewayOptions::default(),
        ))
    }

    #[tokio::test]
    async fn test_connect_greets_with_leaderboard() {
        let hub = hub();
        let (peer, mut rx) = hub.connect().await;
        assert_eq!(peer, 1);
        assert_eq!(
            rx.recv().await,
            Some(ServerMessage::UpdateLeaderboard(LeaderboardSnapshot::default()))
        );
    }

    #[tokio::test]
    async fn test_events_reach_both_sockets() {
        let hub = hub();
        let (p1, mut rx1) = hub.connect().await;
        let (p2, mut rx2) = hub.connect().await;
        rx1.recv().await;
        rx2.recv().await;

        hub.handle(p1, ClientMessage::CreateRoom).await;
        let Some(ServerMessage::RoomCreated { room_id, player }) = rx1.recv().await else {
            panic!("expected roomCreated");
        };
        assert_eq!(player, Role::PlayerOne);

        hub.handle(p2, ClientMessage::JoinRoom { room_id: room_id.clone() }).await;
        assert_eq!(
            rx1.recv().await,
            Some(ServerMessage::StartGame { room_id: room_id.clone() })
        );
        assert!(matches!(rx2.recv().await, Some(ServerMessage::RoomJoined { .. })));
        assert!(matches!(rx2.recv().await, Some(ServerMessage::StartGame { .. })));

        hub.disconnect(p2).await;
        assert_eq!(rx1.recv().await, Some(ServerMessage::OpponentLeft));
    }

    #[tokio::test]
    async fn test_leaderboard_broadcast_reaches_idle_peers() {
        let hub = hub();
        let (p1, mut rx1) = hub.connect().await;
        let (p2, mut rx2) = hub.connect().await;
        let (_idle, mut rx3) = hub.connect().await;
        for rx in [&mut rx1, &mut rx2, &mut rx3] {
            rx.recv().await;
        }

        hub.handle(p1, ClientMessage::CreateRoom).await;
        let Some(ServerMessage::RoomCreated { room_id, .. }) = rx1.recv().await else {
            panic!("expected roomCreated");
        };
        hub.handle(p2, ClientMessage::JoinRoom { room_id }).await;
        hub.handle(p1, ClientMessage::ReportWin { winner: Role::PlayerOne }).await;

        assert_eq!(
            rx3.recv().await,
            Some(ServerMessage::UpdateLeaderboard(LeaderboardSnapshot {
                p1_wins: 1,
                p2_wins: 0,
                matches_played: 1,
            }))
        );
    }

    #[tokio::test]
    async fn test_reject_sends_error() {
        let hub = hub();
        let (peer, mut rx) = hub.connect().await;
        rx.recv().await;

        hub.reject(peer, "Invalid message: nope".to_string()).await;
        assert_eq!(
            rx.recv().await,
            Some(ServerMessage::error("Invalid message: nope"))
        );
    }

    #[tokio::test]
    async fn test_slow_peer_is_cut_off() {
        let hub = Hub::with_outbox_capacity(
            SessionGateway::with_rooms(RoomManager::with_seed(11), GatewayOptions::default()),
            1,
        );
        let (peer, mut rx) = hub.connect().await;

        // The greeting fills the queue; the next event overflows it.
        hub.reject(peer, "Invalid message: nope".to_string()).await;

        assert_eq!(
            rx.recv().await,
            Some(ServerMessage::UpdateLeaderboard(LeaderboardSnapshot::default()))
        );
        assert_eq!(rx.recv().await, None);

        // Other peers are unaffected.
        let (_other, mut other_rx) = hub.connect().await;
        assert!(other_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_health_counts_peers() {
        let hub = hub();
        let (peer, _rx) = hub.connect().await;
        assert_eq!(hub.health().await["peers"].as_u64(), Some(1));
        hub.disconnect(peer).await;
        assert_eq!(hub.health().await["peers"].as_u64(), Some(0));
    }
}
