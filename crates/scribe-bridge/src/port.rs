//! Transferable channel endpoints.
//!
//! A `Port` is the sending half of a point-to-point, in-order pipe. Whoever
//! creates the pipe keeps the `PortReceiver`; the `Port` is what crosses the
//! bridge boundary, and ownership moves with it. Messages can themselves
//! carry further ports, which is how reply channels are opened.
//!
//! Posting never fails: a closed port (or one whose receiver is gone)
//! swallows the message and logs at debug.

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

/// One message on a port: a JSON payload plus any transferred endpoints.
#[derive(Debug)]
pub struct PortMessage {
    pub data: Value,
    pub ports: Vec<Port>,
}

impl PortMessage {
    /// A payload-only message with no transferred ports.
    pub fn data(data: Value) -> Self {
        Self {
            data,
            ports: Vec::new(),
        }
    }
}

/// Sending half of a pipe. Explicitly closeable; post-after-close is a no-op.
#[derive(Debug)]
pub struct Port {
    tx: Option<mpsc::UnboundedSender<PortMessage>>,
}

/// Receiving half of a pipe. Stays with the side that created the channel.
#[derive(Debug)]
pub struct PortReceiver {
    rx: mpsc::UnboundedReceiver<PortMessage>,
}

/// Create a new pipe: keep the receiver, transfer the port.
pub fn channel() -> (Port, PortReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Port { tx: Some(tx) }, PortReceiver { rx })
}

impl Port {
    /// Post a payload-only message.
    pub fn post(&mut self, data: Value) {
        self.post_message(PortMessage::data(data));
    }

    /// Post a message, possibly transferring further ports with it.
    pub fn post_message(&mut self, msg: PortMessage) {
        match &self.tx {
            Some(tx) => {
                if tx.send(msg).is_err() {
                    debug!("port post dropped: receiver gone");
                }
            }
            None => debug!("port post dropped: port closed"),
        }
    }

    /// Close the port. Idempotent; later posts are no-ops.
    pub fn close(&mut self) {
        self.tx = None;
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }
}

impl PortReceiver {
    /// Non-blocking receive; `None` when empty or the port side is gone.
    pub fn try_recv(&mut self) -> Option<PortMessage> {
        self.rx.try_recv().ok()
    }

    /// Await the next message; `None` once every port handle is closed.
    pub async fn recv(&mut self) -> Option<PortMessage> {
        self.rx.recv().await
    }
}
