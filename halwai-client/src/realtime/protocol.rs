//! Engine.IO v4 / Socket.IO v5 text codec
//!
//! Every WebSocket text frame is one Engine.IO packet: a one-digit type
//! followed by its data. Engine.IO `message` packets carry Socket.IO packets:
//!
//! ```text
//! <type>[<nsp>,][<ack id>][<json>]
//! 40                      namespace connect (client -> server)
//! 40{"sid":"..."}         connect ack
//! 42["new-order",{...}]   event
//! 42/admin,7["x",1]       event on /admin expecting ack 7
//! ```
//!
//! Binary attachments are not used by the admin backend and are rejected.

use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("empty packet")]
    Empty,

    #[error("unknown {layer} packet type {ty:?}")]
    UnknownType { layer: &'static str, ty: char },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary packets are not supported")]
    Binary,

    #[error("malformed {0} packet")]
    Malformed(&'static str),
}

/// Upper bound for the ping watchdog, whatever the server announces
pub const MAX_PING_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Engine.IO open packet payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPayload {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// ms
    pub ping_interval: u64,
    /// ms
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

impl OpenPayload {
    /// How long to wait for the next server ping before giving up
    pub fn ping_window(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
            .min(MAX_PING_WINDOW)
    }
}

/// Engine.IO packet
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenPayload),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let mut chars = frame.chars();
        let ty = chars.next().ok_or(ProtocolError::Empty)?;
        let data = chars.as_str();

        Ok(match ty {
            '0' => Self::Open(serde_json::from_str(data)?),
            '1' => Self::Close,
            '2' => Self::Ping(data.to_string()),
            '3' => Self::Pong(data.to_string()),
            '4' => Self::Message(data.to_string()),
            '5' => Self::Upgrade,
            '6' => Self::Noop,
            other => {
                return Err(ProtocolError::UnknownType {
                    layer: "engine",
                    ty: other,
                });
            }
        })
    }

    pub fn encode(&self) -> String {
        match self {
            // the client never sends an open packet; encode for test servers
            Self::Open(open) => format!(
                "0{}",
                serde_json::json!({
                    "sid": open.sid,
                    "upgrades": open.upgrades,
                    "pingInterval": open.ping_interval,
                    "pingTimeout": open.ping_timeout,
                    "maxPayload": open.max_payload,
                })
            ),
            Self::Close => "1".to_string(),
            Self::Ping(data) => format!("2{data}"),
            Self::Pong(data) => format!("3{data}"),
            Self::Message(data) => format!("4{data}"),
            Self::Upgrade => "5".to_string(),
            Self::Noop => "6".to_string(),
        }
    }
}

/// Socket.IO packet (inside an Engine.IO message)
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        nsp: String,
        data: Option<Value>,
    },
    Disconnect {
        nsp: String,
    },
    Event {
        nsp: String,
        id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        nsp: String,
        id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        nsp: String,
        data: Value,
    },
}

impl SocketPacket {
    pub fn nsp(&self) -> &str {
        match self {
            Self::Connect { nsp, .. }
            | Self::Disconnect { nsp }
            | Self::Event { nsp, .. }
            | Self::Ack { nsp, .. }
            | Self::ConnectError { nsp, .. } => nsp,
        }
    }

    pub fn decode(payload: &str) -> Result<Self, ProtocolError> {
        let mut chars = payload.chars();
        let ty = chars.next().ok_or(ProtocolError::Empty)?;
        let mut rest = chars.as_str();

        if matches!(ty, '5' | '6') {
            return Err(ProtocolError::Binary);
        }

        let nsp = if rest.starts_with('/') {
            let end = rest.find(',').unwrap_or(rest.len());
            let nsp = rest[..end].to_string();
            rest = rest.get(end + 1..).unwrap_or("");
            nsp
        } else {
            "/".to_string()
        };

        let digits = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
        let id = if digits > 0 {
            Some(
                rest[..digits]
                    .parse::<u64>()
                    .map_err(|_| ProtocolError::Malformed("ack id"))?,
            )
        } else {
            None
        };
        rest = &rest[digits..];

        let data: Option<Value> = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str(rest)?)
        };

        match ty {
            '0' => Ok(Self::Connect { nsp, data }),
            '1' => Ok(Self::Disconnect { nsp }),
            '2' => {
                let Some(Value::Array(mut items)) = data else {
                    return Err(ProtocolError::Malformed("event"));
                };
                if items.is_empty() {
                    return Err(ProtocolError::Malformed("event"));
                }
                let Value::String(name) = items.remove(0) else {
                    return Err(ProtocolError::Malformed("event"));
                };
                Ok(Self::Event {
                    nsp,
                    id,
                    name,
                    args: items,
                })
            }
            '3' => {
                let id = id.ok_or(ProtocolError::Malformed("ack"))?;
                let args = match data {
                    Some(Value::Array(items)) => items,
                    None => Vec::new(),
                    Some(_) => return Err(ProtocolError::Malformed("ack")),
                };
                Ok(Self::Ack { nsp, id, args })
            }
            '4' => Ok(Self::ConnectError {
                nsp,
                data: data.unwrap_or(Value::Null),
            }),
            other => Err(ProtocolError::UnknownType {
                layer: "socket",
                ty: other,
            }),
        }
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        let (ty, nsp) = match self {
            Self::Connect { nsp, .. } => ('0', nsp),
            Self::Disconnect { nsp } => ('1', nsp),
            Self::Event { nsp, .. } => ('2', nsp),
            Self::Ack { nsp, .. } => ('3', nsp),
            Self::ConnectError { nsp, .. } => ('4', nsp),
        };
        out.push(ty);
        if nsp != "/" {
            out.push_str(nsp);
            out.push(',');
        }

        match self {
            Self::Connect { data, .. } => {
                if let Some(data) = data {
                    out.push_str(&data.to_string());
                }
            }
            Self::Disconnect { .. } => {}
            Self::Event { id, name, args, .. } => {
                if let Some(id) = id {
                    out.push_str(&id.to_string());
                }
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                out.push_str(&Value::Array(items).to_string());
            }
            Self::Ack { id, args, .. } => {
                out.push_str(&id.to_string());
                out.push_str(&Value::Array(args.clone()).to_string());
            }
            Self::ConnectError { data, .. } => out.push_str(&data.to_string()),
        }
        out
    }

    /// Wrap in an Engine.IO message frame
    pub fn to_frame(&self) -> String {
        EnginePacket::Message(self.encode()).encode()
    }
}

/// Error message carried by a connect error packet
pub fn connect_error_message(data: &Value) -> String {
    data.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| data.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_engine_open() {
        let frame = concat!(
            r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"#,
            r#""pingTimeout":20000,"maxPayload":1000000}"#
        );
        let EnginePacket::Open(open) = EnginePacket::decode(frame).unwrap() else {
            panic!("expected open packet");
        };
        assert_eq!(open.sid, "abc");
        assert_eq!(open.ping_window(), Duration::from_secs(45));
    }

    #[test]
    fn test_oversized_ping_values_are_capped() {
        let frame = format!(
            r#"0{{"sid":"abc","pingInterval":{max},"pingTimeout":{max}}}"#,
            max = u64::MAX
        );
        let EnginePacket::Open(open) = EnginePacket::decode(&frame).unwrap() else {
            panic!("expected open packet");
        };
        assert_eq!(open.ping_window(), MAX_PING_WINDOW);
    }

    #[test]
    fn test_engine_control_packets() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping(String::new()));
        assert_eq!(
            EnginePacket::decode("2probe").unwrap(),
            EnginePacket::Ping("probe".into())
        );
        assert_eq!(EnginePacket::decode("1").unwrap(), EnginePacket::Close);
        assert_eq!(EnginePacket::Pong(String::new()).encode(), "3");
        assert!(matches!(EnginePacket::decode(""), Err(ProtocolError::Empty)));
        assert!(matches!(
            EnginePacket::decode("9"),
            Err(ProtocolError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_namespace_connect_frame() {
        let connect = SocketPacket::Connect {
            nsp: "/".into(),
            data: None,
        };
        assert_eq!(connect.to_frame(), "40");

        let admin = SocketPacket::Connect {
            nsp: "/admin".into(),
            data: None,
        };
        assert_eq!(admin.to_frame(), "40/admin,");
    }

    #[test]
    fn test_decode_connect_ack() {
        let packet = SocketPacket::decode(r#"0{"sid":"xyz"}"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Connect {
                nsp: "/".into(),
                data: Some(json!({"sid": "xyz"}))
            }
        );
    }

    #[test]
    fn test_decode_event() {
        let packet = SocketPacket::decode(r#"2["new-order",{"_id":"o1"}]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                nsp: "/".into(),
                id: None,
                name: "new-order".into(),
                args: vec![json!({"_id": "o1"})],
            }
        );
    }

    #[test]
    fn test_decode_event_with_namespace_and_ack_id() {
        let packet = SocketPacket::decode(r#"2/admin,12["shop-updated"]"#).unwrap();
        let SocketPacket::Event { nsp, id, name, args } = packet else {
            panic!("expected event");
        };
        assert_eq!(nsp, "/admin");
        assert_eq!(id, Some(12));
        assert_eq!(name, "shop-updated");
        assert!(args.is_empty());
    }

    #[test]
    fn test_event_encode_decode() {
        let packet = SocketPacket::Event {
            nsp: "/".into(),
            id: Some(3),
            name: "admin-order-cancelled".into(),
            args: vec![json!("o1")],
        };
        let encoded = packet.encode();
        assert_eq!(encoded, r#"23["admin-order-cancelled","o1"]"#);
        assert_eq!(SocketPacket::decode(&encoded).unwrap(), packet);
    }

    #[test]
    fn test_ack_encode() {
        let ack = SocketPacket::Ack {
            nsp: "/".into(),
            id: 7,
            args: vec![],
        };
        assert_eq!(ack.to_frame(), "437[]");
    }

    #[test]
    fn test_malformed_packets() {
        assert!(matches!(
            SocketPacket::decode("2{}"),
            Err(ProtocolError::Malformed("event"))
        ));
        assert!(matches!(
            SocketPacket::decode("2[1,2]"),
            Err(ProtocolError::Malformed("event"))
        ));
        assert!(matches!(
            SocketPacket::decode(r#"51-["x",{"_placeholder":true,"num":0}]"#),
            Err(ProtocolError::Binary)
        ));
        assert!(matches!(
            SocketPacket::decode("2[\"x\""),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn test_connect_error_message() {
        let packet = SocketPacket::decode(r#"4{"message":"Not authorized"}"#).unwrap();
        let SocketPacket::ConnectError { data, .. } = packet else {
            panic!("expected connect error");
        };
        assert_eq!(connect_error_message(&data), "Not authorized");
    }
}
