//! Host↔guest message bridge for an embedded, sandboxed editor frame.
//!
//! The host shell mounts a cross-origin guest editor and exchanges a closed
//! vocabulary of actions with it. The guest bootstraps with a window-level
//! `loaded` message; the host answers by transferring one end of a dedicated
//! channel; everything afterwards flows over that channel, with request/reply
//! sub-protocols multiplexed on transferred one-shot ports.

pub mod events;
pub mod host;
pub mod liveness;
pub mod port;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod session;

#[cfg(test)]
mod tests;

pub use events::BridgeEvent;
pub use host::{DirtyState, EditorDispatch, GuestWindow, HostStatus, Navigator};
pub use liveness::{LivenessWatchdog, WatchdogState};
pub use port::{channel, Port, PortMessage, PortReceiver};
pub use protocol::{ActionKind, WindowMessage, MESSAGE_SENTINEL};
pub use registry::{ChannelName, PortRegistry};
pub use session::{BridgeConfig, BridgeSession, HostHandles};
