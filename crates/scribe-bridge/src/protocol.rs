//! Wire protocol: envelope sentinel, the closed action vocabulary, and the
//! typed payload/reply shapes.
//!
//! Everything on the wire is JSON except the transferred endpoints, which
//! ride alongside a message rather than inside it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::port::Port;

/// Envelope marker every window-level bridge message must carry in
/// `data.type`. Anything else on the window is unrelated traffic.
pub const MESSAGE_SENTINEL: &str = "gutenbergIframeMessage";

/// Action of the host's bootstrap reply, posted window-level with the
/// transferred channel endpoint.
pub const INIT_PORT_ACTION: &str = "initPort";

/// A message arriving on the host window: sender origin, JSON payload, and
/// any endpoints transferred with it.
#[derive(Debug)]
pub struct WindowMessage {
    pub origin: String,
    pub data: Value,
    pub ports: Vec<Port>,
}

// =============================================================================
// ACTION VOCABULARY
// =============================================================================

/// Every action a guest can send. Closed enumeration: anything the host does
/// not recognize decodes to `Unknown` and is ignored, which keeps older
/// hosts forward-compatible with newer guest builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    // -- Bootstrap (window-level) --
    #[serde(rename = "loaded")]
    Loaded,
    #[serde(rename = "classicBlockOpenMediaModal")]
    ClassicBlockOpenMediaModal,

    // -- Request/reply: answered synchronously on ports[0] --
    GetCheckoutModalStatus,
    GetCloseButtonUrl,
    GetGutenboardingStatus,
    GetNavSidebarLabels,
    GetCalypsoUrlInfo,
    GetIsAppBannerVisible,

    // -- Channel-opening: ports captured for a later one-shot reply --
    OpenMediaModal,
    OpenCheckoutModal,
    OpenRevisions,
    DraftIdAssignment,

    // -- Commands: invoke a host collaborator, no reply --
    TrashPost,
    ViewPost,
    OpenCustomizer,
    GoToPatterns,
    NavigateToHome,
    CloseEditor,
    PostStatusChange,
    PerformanceMark,

    /// Catch-all produced by `decode_action` for unrecognized names.
    #[serde(skip_deserializing)]
    Unknown,
}

/// Decode the `action` field of a message. `None` when the field is missing
/// or not a string; `Some(Unknown)` for a well-formed but unrecognized name.
pub fn decode_action(data: &Value) -> Option<ActionKind> {
    let action = data.get("action")?.as_str()?;
    Some(serde_json::from_value(Value::String(action.into())).unwrap_or(ActionKind::Unknown))
}

/// Decode a typed payload. `None` (logged) when the shape doesn't match;
/// the caller treats that as a per-message no-op.
pub fn decode_payload<T: serde::de::DeserializeOwned>(
    action: ActionKind,
    payload: &Value,
) -> Option<T> {
    match serde_json::from_value(payload.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(action = ?action, error = %e, "malformed payload, ignoring message");
            None
        }
    }
}

// =============================================================================
// GUEST → HOST PAYLOADS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaModalPayload {
    #[serde(default)]
    pub allowed_types: Vec<String>,
    #[serde(default)]
    pub multiple: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashPostPayload {
    pub post_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPostPayload {
    pub post_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenCustomizerPayload {
    pub customizer_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStatusPayload {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMarkPayload {
    pub mark_name: String,
}

// =============================================================================
// HOST → GUEST REPLIES
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutStatusReply {
    pub is_checkout_overlay_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseButtonReply {
    pub close_url: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GutenboardingStatusReply {
    pub is_gutenboarding: bool,
    pub current_calypso_url: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavSidebarReply {
    pub all_posts_labels: std::collections::HashMap<String, String>,
    pub create_post_labels: std::collections::HashMap<String, String>,
    pub list_headings: std::collections::HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlInfoReply {
    pub origin: String,
    pub site_slug: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppBannerReply {
    pub is_app_banner_visible: bool,
    pub has_app_banner_been_dismissed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionReply {
    pub title: String,
    pub excerpt: String,
    pub content: String,
}
