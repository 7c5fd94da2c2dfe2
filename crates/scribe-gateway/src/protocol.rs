//! Gateway-level wire protocol: JSON frames on the WebSocket, with channel
//! endpoints represented by numeric IDs. Each side allocates IDs for the
//! endpoints it creates; an ID only ever appears in the direction its
//! endpoint was transferred.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames the guest sends.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundFrame {
    /// The frame finished downloading (transport-level, not a bridge action).
    FrameLoad,
    /// A window-level message. `ports` are guest-allocated endpoint IDs
    /// transferred to the host with this message.
    Window {
        data: Value,
        #[serde(default)]
        ports: Vec<u64>,
    },
    /// A message posted into an endpoint the host transferred earlier.
    Port {
        port: u64,
        data: Value,
        #[serde(default)]
        ports: Vec<u64>,
    },
    #[serde(other)]
    Unknown,
}

/// Frames the host sends.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundFrame {
    /// A window-level post with host-allocated transferred endpoint IDs.
    Window { data: Value, ports: Vec<u64> },
    /// A one-shot delivery into a guest-allocated endpoint.
    Port { port: u64, data: Value },
    /// The host side of a guest-allocated endpoint closed.
    PortClose { port: u64 },
    /// Hard top-level navigation requested by the host.
    Navigate { url: String },
}
