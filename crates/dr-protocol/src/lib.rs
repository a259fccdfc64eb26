//! # dr-protocol
//!
//! Wire schema shared between the relay and browser agents.
//! Every frame is a JSON object `{"type": <string>, "data": <any>}`.

pub mod classify;
pub mod dom;
pub mod envelope;

pub use classify::{classify, DecodeError, Inbound, PluginEvent};
pub use dom::{BoundingBox, DomInfo};
pub use envelope::{CommandEnvelope, Envelope};

/// Discriminant of an agent's DOM element observation.
pub const TYPE_DOM_INFO: &str = "dom_info";

/// Discriminant of an agent's plugin lifecycle report.
pub const TYPE_PLUGIN_STATUS: &str = "plugin_status";

/// Discriminant of an operator command sent to agents.
pub const TYPE_COMMAND: &str = "command";
