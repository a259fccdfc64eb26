//! Classification and dispatch of inbound agent frames.

use std::net::SocketAddr;
use std::sync::Arc;

use dr_protocol::{classify, DomInfo, Inbound, PluginEvent};

/// Receiver of everything the relay surfaces to the operator.
pub trait Presenter: Send + Sync {
    fn dom_info(&self, peer: SocketAddr, info: &DomInfo);
    fn plugin_event(&self, peer: SocketAddr, event: PluginEvent);
    fn generic(&self, peer: SocketAddr, text: &str);
    fn agent_connected(&self, peer: SocketAddr);
    fn agent_disconnected(&self, peer: SocketAddr);
}

/// What [`MessageRouter::route`] did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    DomInfo,
    Plugin(PluginEvent),
    Ignored,
    Generic,
    /// Recognised variant with an undecodable payload.
    Dropped,
}

#[derive(Clone)]
pub struct MessageRouter {
    presenter: Arc<dyn Presenter>,
}

impl MessageRouter {
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self { presenter }
    }

    pub fn presenter(&self) -> &dyn Presenter {
        self.presenter.as_ref()
    }

    /// Classify one inbound payload and hand it to the presenter.
    /// Never fails: malformed input is logged and dropped.
    pub fn route(&self, peer: SocketAddr, payload: &[u8]) -> RouteOutcome {
        match classify(payload) {
            Ok(Inbound::DomInfo(info)) => {
                tracing::info!(
                    %peer,
                    element = %info.label(),
                    url = %info.url,
                    "Processing DOM info"
                );
                self.presenter.dom_info(peer, &info);
                RouteOutcome::DomInfo
            }
            Ok(Inbound::Plugin(event)) => {
                tracing::info!(%peer, status = event.as_str(), "Plugin status changed");
                self.presenter.plugin_event(peer, event);
                RouteOutcome::Plugin(event)
            }
            Ok(Inbound::Ignored) => {
                tracing::debug!(%peer, "Ignoring plugin_status without a known status");
                RouteOutcome::Ignored
            }
            Ok(Inbound::Generic(text)) => {
                tracing::info!(%peer, message = %text, "Received general message");
                self.presenter.generic(peer, &text);
                RouteOutcome::Generic
            }
            Err(e) => {
                tracing::warn!(%peer, error = %e, "Dropping malformed message");
                RouteOutcome::Dropped
            }
        }
    }
}
