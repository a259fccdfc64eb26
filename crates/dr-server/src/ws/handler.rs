//! Per-agent WebSocket handler.
//!
//! Each accepted socket gets its own task running an [`AgentSession`].
//! The connecting phase is the pending upgrade future in
//! [`agent_ws_handler`]; a session only exists once the handshake has
//! succeeded, so a failed upgrade never touches the registry. A session is
//! `Established` while reads succeed and `Closed` on the first read
//! failure, close frame or end of stream. `Closed` is terminal.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;

use super::registry::{AgentConnection, ConnectionId};
use crate::AppState;

// ─── Upgrade handler ─────────────────────────────────────────

/// Agent WebSocket upgrade. Any peer is accepted.
pub async fn agent_ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!(%peer, "Connection attempt");
    ws.on_failed_upgrade(move |e| {
        tracing::error!(%peer, error = %e, "WebSocket upgrade failed");
    })
    .on_upgrade(move |socket| handle_agent_socket(socket, peer, state))
}

async fn handle_agent_socket(socket: WebSocket, peer: SocketAddr, state: Arc<AppState>) {
    let (mut ws_sender, ws_receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // Forward channel → WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = ws_sender.send(msg).await {
                tracing::warn!(%peer, error = %e, "Agent write failed");
                break;
            }
        }
    });

    let mut session = AgentSession::establish(&state, AgentConnection::new(peer, tx));
    let reason = session.run(ws_receiver).await;
    session.close(&reason);

    send_task.abort();
}

// ─── Session state machine ───────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Established,
    Closed,
}

/// Why a receive loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    PeerClosed,
    StreamEnded,
    ReadError(String),
}

pub struct AgentSession<'a> {
    app: &'a AppState,
    id: ConnectionId,
    peer: SocketAddr,
    state: ConnectionState,
}

impl<'a> AgentSession<'a> {
    /// Register the connection and enter `Established`.
    pub fn establish(app: &'a AppState, conn: AgentConnection) -> Self {
        let session = Self {
            app,
            id: conn.id,
            peer: conn.peer,
            state: ConnectionState::Established,
        };
        app.registry.register(conn);
        tracing::info!(conn_id = %session.id, peer = %session.peer, "Connection established");
        app.router.presenter().agent_connected(session.peer);
        session
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Route inbound frames in arrival order until the first read failure.
    pub async fn run<S, E>(&mut self, mut frames: S) -> CloseReason
    where
        S: Stream<Item = Result<Message, E>> + Unpin,
        E: std::fmt::Display,
    {
        if self.state != ConnectionState::Established {
            return CloseReason::StreamEnded;
        }

        while let Some(frame) = frames.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    tracing::debug!(conn_id = %self.id, bytes = text.as_str().len(), "Text frame received");
                    self.app.router.route(self.peer, text.as_str().as_bytes());
                }
                Ok(Message::Binary(data)) => {
                    tracing::debug!(conn_id = %self.id, bytes = data.len(), "Binary frame received");
                    self.app.router.route(self.peer, &data);
                }
                // Pongs are written by the protocol layer.
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Close(_)) => return CloseReason::PeerClosed,
                Err(e) => return CloseReason::ReadError(e.to_string()),
            }
        }
        CloseReason::StreamEnded
    }

    /// Enter `Closed`, unregistering exactly once.
    pub fn close(&mut self, reason: &CloseReason) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.state = ConnectionState::Closed;
        self.app.registry.unregister(&self.id);

        match reason {
            CloseReason::ReadError(error) => {
                tracing::warn!(conn_id = %self.id, peer = %self.peer, %error, "Connection lost");
            }
            _ => {
                tracing::info!(conn_id = %self.id, peer = %self.peer, ?reason, "Connection closed");
            }
        }
        self.app.router.presenter().agent_disconnected(self.peer);
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use axum::body::Bytes;
    use futures_util::stream;

    use super::*;
    use crate::ws::registry::tests::test_connection;
    use crate::ws::router::tests::{Presented, RecordingPresenter};

    fn app() -> (AppState, Arc<RecordingPresenter>) {
        let presenter = Arc::new(RecordingPresenter::default());
        let app = AppState::new(Default::default(), presenter.clone());
        (app, presenter)
    }

    fn read_error() -> axum::Error {
        axum::Error::new(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"))
    }

    #[tokio::test]
    async fn test_establish_registers() {
        let (app, presenter) = app();
        let (conn, _rx) = test_connection();
        let session = AgentSession::establish(&app, conn);

        assert_eq!(session.state(), ConnectionState::Established);
        assert!(app.registry.contains(&session.id()));
        assert_eq!(presenter.take(), vec![Presented::Connected]);
    }

    #[tokio::test]
    async fn test_frames_are_routed_in_order_until_error() {
        let (app, presenter) = app();
        let (conn, _rx) = test_connection();
        let mut session = AgentSession::establish(&app, conn);
        presenter.take();

        let frames = stream::iter(vec![
            Ok(Message::Text("first".into())),
            Ok(Message::Binary(Bytes::from_static(
                br#"{"type":"plugin_status","data":{"status":"deactivated"}}"#,
            ))),
            Ok(Message::Text("third".into())),
            Err(read_error()),
            Ok(Message::Text("never routed".into())),
        ]);
        let reason = session.run(frames).await;

        assert!(matches!(reason, CloseReason::ReadError(ref e) if e.contains("reset by peer")));
        assert_eq!(
            presenter.take(),
            vec![
                Presented::Generic("first".into()),
                Presented::Plugin(dr_protocol::PluginEvent::Deactivated),
                Presented::Generic("third".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_message_keeps_connection_open() {
        let (app, presenter) = app();
        let (conn, _rx) = test_connection();
        let mut session = AgentSession::establish(&app, conn);
        presenter.take();

        let frames = stream::iter(vec![
            Ok::<_, axum::Error>(Message::Text(r#"{"type":"dom_info","data":"bad"}"#.into())),
            Ok(Message::Text(r#"{"type":"dom_info","data":{"id":"ok"}}"#.into())),
        ]);
        assert_eq!(session.run(frames).await, CloseReason::StreamEnded);

        let calls = presenter.take();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], Presented::DomInfo(info) if info.id == "ok"));
        assert!(app.registry.contains(&session.id()));
    }

    #[tokio::test]
    async fn test_close_unregisters_exactly_once() {
        let (app, presenter) = app();
        let (conn, _rx) = test_connection();
        let mut session = AgentSession::establish(&app, conn);
        let id = session.id();

        let frames = stream::iter(vec![Ok::<_, axum::Error>(Message::Close(None))]);
        let reason = session.run(frames).await;
        assert_eq!(reason, CloseReason::PeerClosed);

        session.close(&reason);
        session.close(&CloseReason::StreamEnded);

        assert_eq!(session.state(), ConnectionState::Closed);
        assert!(!app.registry.contains(&id));
        let disconnects = presenter
            .take()
            .into_iter()
            .filter(|c| *c == Presented::Disconnected)
            .count();
        assert_eq!(disconnects, 1);
    }

    #[tokio::test]
    async fn test_closed_session_does_not_resume() {
        let (app, presenter) = app();
        let (conn, _rx) = test_connection();
        let mut session = AgentSession::establish(&app, conn);
        session.close(&CloseReason::StreamEnded);
        presenter.take();

        let frames = stream::iter(vec![Ok::<_, axum::Error>(Message::Text("late".into()))]);
        session.run(frames).await;
        assert!(presenter.take().is_empty());
        assert_eq!(session.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_control_frames_are_not_routed() {
        let (app, presenter) = app();
        let (conn, mut rx) = test_connection();
        let mut session = AgentSession::establish(&app, conn);
        presenter.take();

        let frames = stream::iter(vec![
            Ok::<_, axum::Error>(Message::Ping(Bytes::from_static(b"hb"))),
            Ok(Message::Pong(Bytes::from_static(b"hb"))),
        ]);
        assert_eq!(session.run(frames).await, CloseReason::StreamEnded);

        assert!(presenter.take().is_empty());
        assert!(rx.try_recv().is_err(), "no frame is queued for the agent");
        assert_eq!(session.state(), ConnectionState::Established);
    }
}
