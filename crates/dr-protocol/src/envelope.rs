use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DomInfo, TYPE_COMMAND, TYPE_DOM_INFO};

/// Generic `{type, data}` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl Envelope {
    /// Wrap a DOM observation the way agents send it.
    pub fn dom_info(info: &DomInfo) -> serde_json::Result<Self> {
        Ok(Self {
            kind: TYPE_DOM_INFO.to_string(),
            data: serde_json::to_value(info)?,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Structured operator command: `{"type":"command","command":..,"params":..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl CommandEnvelope {
    pub fn new(command: impl Into<String>, params: Value) -> Self {
        Self {
            kind: TYPE_COMMAND.to_string(),
            command: command.into(),
            params,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_envelope_omits_empty_parts() {
        let bare = CommandEnvelope::new("reload", Value::Null).to_json().unwrap();
        assert_eq!(bare, r#"{"type":"command","command":"reload"}"#);

        let with_params = CommandEnvelope::new("scroll", json!({ "y": 200 }));
        let value: Value = serde_json::from_str(&with_params.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({ "type": "command", "command": "scroll", "params": { "y": 200 } }));
    }

    #[test]
    fn test_dom_info_envelope() {
        let info = DomInfo {
            url: "https://example.com".into(),
            tag_name: "button".into(),
            ..Default::default()
        };
        let json = Envelope::dom_info(&info).unwrap().to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "dom_info");
        assert_eq!(value["data"]["url"], "https://example.com");
        assert_eq!(value["data"]["tagName"], "button");
    }
}
