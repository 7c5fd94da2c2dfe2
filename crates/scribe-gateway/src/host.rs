//! Concrete collaborator implementations for the gateway shell.
//!
//! A full host application would back these with its own navigation and
//! app state; the gateway backs them with wire frames and logging.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use scribe_bridge::protocol::{
    AppBannerReply, CheckoutStatusReply, CloseButtonReply, GutenboardingStatusReply,
    NavSidebarReply, UrlInfoReply,
};
use scribe_bridge::{DirtyState, EditorDispatch, GuestWindow, HostStatus, Navigator, Port, PortMessage};
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

use crate::protocol::OutboundFrame;

// =============================================================================
// PORT TABLE
// =============================================================================

/// Host-allocated endpoints held locally on behalf of the remote guest.
/// The guest posts into them by ID; the table routes the post into the
/// actual pipe.
#[derive(Debug, Default)]
pub struct PortTable {
    next_id: AtomicU64,
    ports: Mutex<HashMap<u64, Port>>,
}

impl PortTable {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ports: Mutex::new(HashMap::new()),
        }
    }

    /// Park a transferred endpoint and return its wire ID.
    pub fn register(&self, port: Port) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.ports.lock().unwrap().insert(id, port);
        id
    }

    /// Post into a parked endpoint. `false` when the ID is unknown.
    pub fn post(&self, id: u64, msg: PortMessage) -> bool {
        match self.ports.lock().unwrap().get_mut(&id) {
            Some(port) => {
                port.post_message(msg);
                true
            }
            None => false,
        }
    }

    /// Close every parked endpoint. Used at connection teardown.
    pub fn close_all(&self) {
        for (_, mut port) in self.ports.lock().unwrap().drain() {
            port.close();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ports.lock().unwrap().is_empty()
    }
}

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Navigator that surfaces navigations as wire frames.
pub struct FrameNavigator {
    out: UnboundedSender<OutboundFrame>,
}

impl FrameNavigator {
    pub fn new(out: UnboundedSender<OutboundFrame>) -> Self {
        Self { out }
    }
}

impl Navigator for FrameNavigator {
    fn navigate(&self, url: &str) {
        tracing::info!(url = %url, "top-level navigation");
        let _ = self.out.send(OutboundFrame::Navigate { url: url.into() });
    }
}

/// Window-level post into the guest: parks transferred endpoints in the
/// table and ships their IDs with the frame.
pub struct FrameWindow {
    out: UnboundedSender<OutboundFrame>,
    table: std::sync::Arc<PortTable>,
}

impl FrameWindow {
    pub fn new(out: UnboundedSender<OutboundFrame>, table: std::sync::Arc<PortTable>) -> Self {
        Self { out, table }
    }
}

impl GuestWindow for FrameWindow {
    fn post(&self, data: serde_json::Value, ports: Vec<Port>) {
        let ids: Vec<u64> = ports.into_iter().map(|p| self.table.register(p)).collect();
        let _ = self.out.send(OutboundFrame::Window { data, ports: ids });
    }
}

/// Dirty-state tracker backed by a flag and the log.
#[derive(Debug, Default)]
pub struct LoggedDirtyState {
    dirty: AtomicBool,
}

impl LoggedDirtyState {
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }
}

impl DirtyState for LoggedDirtyState {
    fn mark_changed(&self) {
        if !self.dirty.swap(true, Ordering::SeqCst) {
            tracing::debug!("guest content marked changed");
        }
    }

    fn mark_saved(&self) {
        if self.dirty.swap(false, Ordering::SeqCst) {
            tracing::debug!("guest content marked saved");
        }
    }
}

/// Mutation surface that records intent in the log.
#[derive(Debug, Default)]
pub struct LoggedDispatch;

impl EditorDispatch for LoggedDispatch {
    fn trash_post(&self, post_id: u64) {
        tracing::info!(post_id, "guest requested post trash");
    }

    fn post_status_changed(&self, status: &str) {
        tracing::info!(status = %status, "guest post status changed");
    }

    fn performance_mark(&self, mark_name: &str) {
        tracing::debug!(mark = %mark_name, "guest performance mark");
    }
}

/// Status provider derived from configuration at connection time.
#[derive(Debug, Clone)]
pub struct StaticHostStatus {
    host_origin: String,
    site_slug: String,
    current_url: String,
}

impl StaticHostStatus {
    /// Derive the site slug from the guest admin URL's host.
    pub fn new(admin_url: &str, host_origin: &str) -> Self {
        let site_slug = Url::parse(admin_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "unknown-site".into());
        let current_url = format!("{host_origin}/post/{site_slug}");
        Self {
            host_origin: host_origin.to_string(),
            site_slug,
            current_url,
        }
    }
}

impl HostStatus for StaticHostStatus {
    fn checkout_status(&self) -> CheckoutStatusReply {
        CheckoutStatusReply {
            is_checkout_overlay_enabled: true,
        }
    }

    fn close_button(&self) -> CloseButtonReply {
        CloseButtonReply {
            close_url: format!("/posts/{}", self.site_slug),
            label: "View Posts".into(),
        }
    }

    fn gutenboarding_status(&self) -> GutenboardingStatusReply {
        GutenboardingStatusReply {
            is_gutenboarding: false,
            current_calypso_url: self.current_url.clone(),
        }
    }

    fn nav_sidebar_labels(&self) -> NavSidebarReply {
        NavSidebarReply::default()
    }

    fn url_info(&self) -> UrlInfoReply {
        UrlInfoReply {
            origin: self.host_origin.clone(),
            site_slug: self.site_slug.clone(),
        }
    }

    fn app_banner(&self) -> AppBannerReply {
        AppBannerReply {
            is_app_banner_visible: false,
            has_app_banner_been_dismissed: false,
        }
    }
}
