//! Framed gateway protocol: `{op, d, t}` envelopes, shared by the upstream
//! presence client and the browser-facing relay.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Operation codes on the wire.
pub mod opcode {
    /// Server -> client: named event in `t`, payload in `d`.
    pub const EVENT: u8 = 0;
    /// Server -> client: ready, heartbeat interval in `d`.
    pub const HELLO: u8 = 1;
    /// Client -> server: subscribe to one identity.
    pub const SUBSCRIBE: u8 = 2;
    /// Client -> server: keep-alive.
    pub const HEARTBEAT: u8 = 3;
}

/// Event names carried by `op = 0` frames.
pub const INIT_STATE: &str = "INIT_STATE";
pub const PRESENCE_UPDATE: &str = "PRESENCE_UPDATE";

/// Used when HELLO does not advertise an interval.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// A decoded gateway frame. `t` and `d` are only meaningful for some opcodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayFrame {
    pub op: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

impl GatewayFrame {
    /// Heartbeat interval advertised by a HELLO frame, if any.
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.d
            .as_ref()?
            .get("heartbeat_interval")?
            .as_u64()
            .map(Duration::from_millis)
    }
}

/// `{op: 2, d: {subscribe_to_id}}`, sent immediately after open.
pub fn subscribe_frame(identity: &str) -> String {
    json!({ "op": opcode::SUBSCRIBE, "d": { "subscribe_to_id": identity } }).to_string()
}

/// `{op: 3}` keep-alive.
pub fn heartbeat_frame() -> String {
    json!({ "op": opcode::HEARTBEAT }).to_string()
}

/// `{op: 1, d: {heartbeat_interval}}`, sent by the relay to browsers.
pub fn hello_frame(interval: Duration) -> String {
    json!({ "op": opcode::HELLO, "d": { "heartbeat_interval": interval.as_millis() as u64 } })
        .to_string()
}

/// `{op: 0, t, d}` named event with payload.
pub fn event_frame(t: &str, d: Value) -> String {
    json!({ "op": opcode::EVENT, "t": t, "d": d }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_event_frame() {
        let frame: GatewayFrame =
            serde_json::from_str(r#"{"op":0,"t":"PRESENCE_UPDATE","d":{"discord_status":"idle"}}"#)
                .unwrap();
        assert_eq!(frame.op, opcode::EVENT);
        assert_eq!(frame.t.as_deref(), Some(PRESENCE_UPDATE));
        assert!(frame.d.is_some());
    }

    #[test]
    fn hello_interval_with_default_fallback() {
        let hello: GatewayFrame =
            serde_json::from_str(r#"{"op":1,"d":{"heartbeat_interval":30000}}"#).unwrap();
        assert_eq!(hello.heartbeat_interval(), Some(Duration::from_secs(30)));

        let bare: GatewayFrame = serde_json::from_str(r#"{"op":1}"#).unwrap();
        assert_eq!(bare.heartbeat_interval(), None);
    }

    #[test]
    fn outbound_frames_match_wire_shape() {
        let sub: serde_json::Value = serde_json::from_str(&subscribe_frame("81")).unwrap();
        assert_eq!(sub["op"], 2);
        assert_eq!(sub["d"]["subscribe_to_id"], "81");

        let beat: serde_json::Value = serde_json::from_str(&heartbeat_frame()).unwrap();
        assert_eq!(beat["op"], 3);
        assert!(beat.get("d").is_none());
    }
}
