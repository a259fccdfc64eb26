//! Tagged-variant decoding of inbound agent frames.
//!
//! Only the `type` discriminant is read up front. It selects a decoder from
//! [`DECODERS`]; anything that is not a JSON object, has no string `type`,
//! or names an unknown variant is surfaced as [`Inbound::Generic`].

use serde_json::Value;

use crate::{DomInfo, TYPE_DOM_INFO, TYPE_PLUGIN_STATUS};

/// Failure to decode a recognised variant's payload.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid dom_info payload: {0}")]
    DomInfo(#[source] serde_json::Error),
}

/// Plugin lifecycle transition reported by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginEvent {
    Activated,
    Deactivated,
}

impl PluginEvent {
    pub fn from_status(status: &str) -> Option<Self> {
        match status {
            "activated" => Some(Self::Activated),
            "deactivated" => Some(Self::Deactivated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activated => "activated",
            Self::Deactivated => "deactivated",
        }
    }
}

/// Classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    DomInfo(DomInfo),
    Plugin(PluginEvent),
    /// A recognised variant that carries nothing to act on
    /// (e.g. a `plugin_status` with an unknown status).
    Ignored,
    /// Opaque text, shown verbatim.
    Generic(String),
}

type Decoder = fn(Value) -> Result<Inbound, DecodeError>;

const DECODERS: &[(&str, Decoder)] = &[
    (TYPE_DOM_INFO, decode_dom_info),
    (TYPE_PLUGIN_STATUS, decode_plugin_status),
];

/// Classify a raw inbound payload.
///
/// Only a recognised variant with a malformed payload yields an error;
/// every other shape of input falls through to [`Inbound::Generic`].
pub fn classify(payload: &[u8]) -> Result<Inbound, DecodeError> {
    let Ok(Value::Object(mut fields)) = serde_json::from_slice::<Value>(payload) else {
        return Ok(generic(payload));
    };

    let decoder = fields
        .get("type")
        .and_then(Value::as_str)
        .and_then(|kind| DECODERS.iter().find(|(name, _)| *name == kind))
        .map(|(_, decoder)| *decoder);

    match decoder {
        Some(decode) => decode(fields.remove("data").unwrap_or(Value::Null)),
        None => Ok(generic(payload)),
    }
}

fn generic(payload: &[u8]) -> Inbound {
    Inbound::Generic(String::from_utf8_lossy(payload).into_owned())
}

fn decode_dom_info(data: Value) -> Result<Inbound, DecodeError> {
    // An absent payload is an element with every field at its zero value.
    if data.is_null() {
        return Ok(Inbound::DomInfo(DomInfo::default()));
    }
    serde_json::from_value(data)
        .map(Inbound::DomInfo)
        .map_err(DecodeError::DomInfo)
}

fn decode_plugin_status(data: Value) -> Result<Inbound, DecodeError> {
    Ok(data
        .get("status")
        .and_then(Value::as_str)
        .and_then(PluginEvent::from_status)
        .map_or(Inbound::Ignored, Inbound::Plugin))
}
