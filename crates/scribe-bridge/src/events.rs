//! Bridge event types.
//!
//! Channel-opening guest requests surface here for the embedding shell to
//! act on; the shell later resolves them through the session's completion
//! API. Events are pushed to a sink and drained from the host loop.

use serde_json::Value;

/// A decoded guest request awaiting a host-side flow.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    /// Guest wants the host media picker. The reply ports are already
    /// captured; `multiple` decides the reply shape at completion time.
    MediaModalRequested {
        allowed_types: Vec<String>,
        multiple: bool,
    },
    /// Guest wants the host checkout overlay. Payload is opaque to the
    /// bridge and passed through for the shell to interpret.
    CheckoutModalRequested { payload: Value },
    /// Guest wants the revision browser.
    RevisionsRequested,
    /// Guest is editing a fresh draft and wants its assigned ID.
    DraftIdRequested,
    /// Legacy window-level media request from a classic-block editor.
    ClassicMediaModalRequested {
        editor_id: String,
        image_id: Option<u64>,
    },
}
