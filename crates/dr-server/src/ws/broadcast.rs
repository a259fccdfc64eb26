//! Best-effort fan-out of operator payloads to every connected agent.

use axum::extract::ws::{Message, Utf8Bytes};

use super::registry::ConnectionRegistry;

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Send `payload` as a text frame to every registered agent.
///
/// A failed write is logged and counted; it never stops delivery to the
/// remaining agents, and nothing is retried. Failed agents stay registered
/// until their own handler observes the close.
pub fn broadcast(registry: &ConnectionRegistry, payload: &str) -> BroadcastReport {
    if registry.is_empty() {
        tracing::info!("No agents connected; message not sent");
        return BroadcastReport::default();
    }

    let members = registry.snapshot();
    let frame = Utf8Bytes::from(payload);
    let mut report = BroadcastReport {
        attempted: members.len(),
        ..Default::default()
    };

    tracing::info!(agents = members.len(), bytes = payload.len(), "Broadcasting message");

    for conn in &members {
        if !conn.is_open() {
            report.failed += 1;
            tracing::warn!(conn_id = %conn.id, peer = %conn.peer, "Agent writer closed; message not sent");
            continue;
        }
        match conn.send(Message::Text(frame.clone())) {
            Ok(()) => {
                report.delivered += 1;
                tracing::debug!(conn_id = %conn.id, peer = %conn.peer, "Message queued for agent");
            }
            Err(_) => {
                report.failed += 1;
                tracing::warn!(conn_id = %conn.id, peer = %conn.peer, "Failed to send message to agent");
            }
        }
    }

    if report.failed > 0 {
        tracing::warn!(
            delivered = report.delivered,
            failed = report.failed,
            "Broadcast partially failed"
        );
    }
    report
}
