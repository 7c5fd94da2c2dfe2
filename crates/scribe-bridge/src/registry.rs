//! Captured-port registry: one slot per logical feature channel.
//!
//! Channel-opening actions park their reply ports here until the host-side
//! flow completes or is dismissed. Ports are expendable, sessions are not:
//! every operation on a missing or already-used slot is a logged no-op.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::port::Port;

/// Logical feature channels a guest can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelName {
    MediaSelect,
    MediaCancel,
    Checkout,
    Revisions,
    DraftId,
}

impl ChannelName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelName::MediaSelect => "media-select",
            ChannelName::MediaCancel => "media-cancel",
            ChannelName::Checkout => "checkout",
            ChannelName::Revisions => "revisions",
            ChannelName::DraftId => "draft-id",
        }
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns captured one-shot ports, keyed by channel.
///
/// Capturing over an occupied slot closes the displaced port: the newest
/// request wins and the stale endpoint can never receive a confused reply.
#[derive(Debug, Default)]
pub struct PortRegistry {
    slots: HashMap<ChannelName, Port>,
}

impl PortRegistry {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Store a port, closing any previous occupant of the slot.
    pub fn capture(&mut self, name: ChannelName, port: Port) {
        if let Some(mut old) = self.slots.insert(name, port) {
            old.close();
            debug!(channel = %name, "displaced previously captured port");
        }
    }

    /// Post one message to the captured port, then close and clear the slot.
    /// No-op if the slot is empty.
    pub fn reply(&mut self, name: ChannelName, data: Value) {
        match self.slots.remove(&name) {
            Some(mut port) => {
                port.post(data);
                port.close();
            }
            None => debug!(channel = %name, "reply dropped: no captured port"),
        }
    }

    /// Close and clear the slot without posting. No-op if the slot is empty.
    pub fn cancel(&mut self, name: ChannelName) {
        match self.slots.remove(&name) {
            Some(mut port) => port.close(),
            None => debug!(channel = %name, "cancel on empty slot"),
        }
    }

    /// Whether a channel currently holds a captured port.
    pub fn contains(&self, name: ChannelName) -> bool {
        self.slots.contains_key(&name)
    }

    /// Close every captured port. Used during session teardown.
    pub fn close_all(&mut self) {
        for (_, mut port) in self.slots.drain() {
            port.close();
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
