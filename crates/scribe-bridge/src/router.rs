//! Envelope validation and action dispatch.
//!
//! Nothing in this module returns an error: transport noise is dropped,
//! unknown actions are ignored, and a malformed payload no-ops that single
//! message. The session outlives anything a guest can send it.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::events::BridgeEvent;
use crate::port::{channel, Port, PortMessage};
use crate::protocol::{
    decode_action, decode_payload, ActionKind, MediaModalPayload, OpenCustomizerPayload,
    PerformanceMarkPayload, PostStatusPayload, TrashPostPayload, ViewPostPayload, WindowMessage,
    INIT_PORT_ACTION, MESSAGE_SENTINEL,
};
use crate::registry::ChannelName;
use crate::session::BridgeSession;

// =============================================================================
// ORIGIN CHECK
// =============================================================================

/// An inbound origin is trusted iff the registered guest admin URL starts
/// with it. Origins never carry a path, the admin URL does, so the prefix
/// relation runs in this direction. Empty origins are never trusted.
pub fn origin_allowed(admin_url: &str, origin: &str) -> bool {
    !origin.is_empty() && admin_url.starts_with(origin)
}

// =============================================================================
// WINDOW-LEVEL ROUTING
// =============================================================================

impl BridgeSession {
    /// Route one window-level message. Drops silently unless the envelope
    /// carries the bridge sentinel and the sender origin is trusted.
    pub fn handle_window_message(&mut self, msg: WindowMessage) {
        let sentinel = msg.data.get("type").and_then(Value::as_str);
        if sentinel != Some(MESSAGE_SENTINEL) {
            debug!("ignoring window message without bridge sentinel");
            return;
        }

        if !origin_allowed(&self.config.admin_url, &msg.origin) {
            warn!(origin = %msg.origin, "dropping message from untrusted origin");
            return;
        }

        let Some(action) = decode_action(&msg.data) else {
            debug!("window message without action field");
            return;
        };

        match action {
            ActionKind::Loaded => self.bootstrap(),
            ActionKind::ClassicBlockOpenMediaModal => self.classic_media_modal(&msg.data),
            other => {
                // Port-level actions have no business on the window.
                debug!(action = ?other, "unexpected window-level action");
            }
        }
    }

    /// The guest app is interactive: disarm the watchdog, open the
    /// dedicated channel, and transfer one end back through the window.
    /// This is the only host message that travels outside a port: no port
    /// exists until it does.
    fn bootstrap(&mut self) {
        self.disarm_watchdog();
        self.loaded = true;

        if self.control.take().is_some() {
            debug!("re-bootstrap: previous control channel torn down");
        }

        let (guest_end, host_end) = channel();
        self.control = Some(host_end);
        self.hosts
            .window
            .post(json!({ "action": INIT_PORT_ACTION }), vec![guest_end]);
        info!("guest bootstrapped, dedicated channel established");
    }

    fn classic_media_modal(&mut self, data: &Value) {
        let Some(editor_id) = data.get("editorId").and_then(Value::as_str) else {
            warn!("classic media request without editorId, ignoring");
            return;
        };
        let image_id = data.get("imageId").and_then(Value::as_u64);
        self.events.push(BridgeEvent::ClassicMediaModalRequested {
            editor_id: editor_id.to_string(),
            image_id,
        });
    }

    // =========================================================================
    // PORT-LEVEL ROUTING
    // =========================================================================

    /// Route one message from the dedicated channel.
    pub(crate) fn handle_port_message(&mut self, msg: PortMessage) {
        let Some(action) = decode_action(&msg.data) else {
            debug!("port message without action field");
            return;
        };
        let payload = msg.data.get("payload").cloned().unwrap_or(Value::Null);
        let ports = msg.ports;

        debug!(action = ?action, ports = ports.len(), "guest action");

        match action {
            // -- Request/reply --
            ActionKind::GetCheckoutModalStatus => {
                self.reply_on_first_port(ports, &self.hosts.status.checkout_status());
            }
            ActionKind::GetCloseButtonUrl => {
                self.reply_on_first_port(ports, &self.hosts.status.close_button());
            }
            ActionKind::GetGutenboardingStatus => {
                self.reply_on_first_port(ports, &self.hosts.status.gutenboarding_status());
            }
            ActionKind::GetNavSidebarLabels => {
                self.reply_on_first_port(ports, &self.hosts.status.nav_sidebar_labels());
            }
            ActionKind::GetCalypsoUrlInfo => {
                self.reply_on_first_port(ports, &self.hosts.status.url_info());
            }
            ActionKind::GetIsAppBannerVisible => {
                self.reply_on_first_port(ports, &self.hosts.status.app_banner());
            }

            // -- Channel-opening --
            ActionKind::OpenMediaModal => self.open_media_modal(&payload, ports),
            ActionKind::OpenCheckoutModal => self.open_checkout_modal(payload, ports),
            ActionKind::OpenRevisions => self.open_revisions(ports),
            ActionKind::DraftIdAssignment => self.open_draft_id(ports),

            // -- Commands --
            ActionKind::TrashPost => {
                if let Some(p) = decode_payload::<TrashPostPayload>(action, &payload) {
                    self.hosts.dispatch.trash_post(p.post_id);
                }
            }
            ActionKind::ViewPost => {
                if let Some(p) = decode_payload::<ViewPostPayload>(action, &payload) {
                    self.hosts.navigator.navigate(&p.post_url);
                }
            }
            ActionKind::OpenCustomizer => {
                if let Some(p) = decode_payload::<OpenCustomizerPayload>(action, &payload) {
                    self.hosts.navigator.navigate(&p.customizer_url);
                }
            }
            ActionKind::GoToPatterns => {
                let slug = self.hosts.status.url_info().site_slug;
                self.hosts.navigator.navigate(&format!("/patterns/{slug}"));
            }
            ActionKind::NavigateToHome => {
                let slug = self.hosts.status.url_info().site_slug;
                self.hosts.navigator.navigate(&format!("/home/{slug}"));
            }
            ActionKind::CloseEditor => {
                let close_url = self.hosts.status.close_button().close_url;
                self.hosts.navigator.navigate(&close_url);
            }
            ActionKind::PostStatusChange => {
                if let Some(p) = decode_payload::<PostStatusPayload>(action, &payload) {
                    self.hosts.dirty.mark_saved();
                    self.hosts.dispatch.post_status_changed(&p.status);
                }
            }
            ActionKind::PerformanceMark => {
                if let Some(p) = decode_payload::<PerformanceMarkPayload>(action, &payload) {
                    self.hosts.dispatch.performance_mark(&p.mark_name);
                }
            }

            // -- Everything else --
            ActionKind::Loaded | ActionKind::ClassicBlockOpenMediaModal => {
                debug!(action = ?action, "window-level action on port, ignoring");
            }
            ActionKind::Unknown => {
                debug!("unknown action, ignoring");
            }
        }
    }

    /// Answer a request/reply action on its first transferred port and
    /// close it. The port is never retained.
    fn reply_on_first_port<T: serde::Serialize>(&self, ports: Vec<Port>, reply: &T) {
        let Some(mut port) = ports.into_iter().next() else {
            debug!("request without a reply port, ignoring");
            return;
        };
        match serde_json::to_value(reply) {
            Ok(data) => port.post(data),
            Err(e) => debug!(error = %e, "reply not serializable"),
        }
        port.close();
    }

    fn open_media_modal(&mut self, payload: &Value, ports: Vec<Port>) {
        // Absent or null payload means defaults; a present-but-wrong shape
        // still no-ops the message.
        let parsed = if payload.is_null() {
            MediaModalPayload::default()
        } else {
            match decode_payload::<MediaModalPayload>(ActionKind::OpenMediaModal, payload) {
                Some(p) => p,
                None => return,
            }
        };

        let mut ports = ports.into_iter();
        let Some(select) = ports.next() else {
            warn!("media modal request without a reply port, ignoring");
            return;
        };
        self.ports.capture(ChannelName::MediaSelect, select);
        if let Some(cancel) = ports.next() {
            self.ports.capture(ChannelName::MediaCancel, cancel);
        }

        self.media_multiple = parsed.multiple;
        self.events.push(BridgeEvent::MediaModalRequested {
            allowed_types: parsed.allowed_types,
            multiple: parsed.multiple,
        });
    }

    fn open_checkout_modal(&mut self, payload: Value, ports: Vec<Port>) {
        let Some(port) = ports.into_iter().next() else {
            warn!("checkout request without a reply port, ignoring");
            return;
        };
        self.ports.capture(ChannelName::Checkout, port);
        self.events.push(BridgeEvent::CheckoutModalRequested { payload });
    }

    fn open_revisions(&mut self, ports: Vec<Port>) {
        let Some(port) = ports.into_iter().next() else {
            warn!("revisions request without a reply port, ignoring");
            return;
        };
        self.ports.capture(ChannelName::Revisions, port);
        self.events.push(BridgeEvent::RevisionsRequested);
    }

    fn open_draft_id(&mut self, ports: Vec<Port>) {
        let Some(port) = ports.into_iter().next() else {
            warn!("draft-id request without a reply port, ignoring");
            return;
        };
        self.ports.capture(ChannelName::DraftId, port);
        // A fresh draft in flight counts as unsaved content.
        self.hosts.dirty.mark_changed();
        self.events.push(BridgeEvent::DraftIdRequested);
    }
}

// =============================================================================
// TESTS
// =============================================================================
