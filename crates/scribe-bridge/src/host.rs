//! Host collaborator seams.
//!
//! The bridge does not render UI, mutate business data, or own navigation;
//! it decodes guest traffic and hands intent to these interfaces. The
//! embedding shell provides the implementations.

use serde_json::Value;

use crate::port::Port;
use crate::protocol::{
    AppBannerReply, CheckoutStatusReply, CloseButtonReply, GutenboardingStatusReply,
    NavSidebarReply, UrlInfoReply,
};

/// Hard top-level navigation. Used by the watchdog fallback and by the
/// navigation-shaped command actions.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str);
}

/// Unsaved-edit tracker for the content being edited in the guest.
pub trait DirtyState: Send + Sync {
    fn mark_changed(&self);
    fn mark_saved(&self);
}

/// Mutation surface for post/media/site state owned by the host.
pub trait EditorDispatch: Send + Sync {
    fn trash_post(&self, post_id: u64);
    fn post_status_changed(&self, status: &str);
    fn performance_mark(&self, mark_name: &str);
}

/// Live host state backing the synchronous request/reply actions.
pub trait HostStatus: Send + Sync {
    fn checkout_status(&self) -> CheckoutStatusReply;
    fn close_button(&self) -> CloseButtonReply;
    fn gutenboarding_status(&self) -> GutenboardingStatusReply;
    fn nav_sidebar_labels(&self) -> NavSidebarReply;
    fn url_info(&self) -> UrlInfoReply;
    fn app_banner(&self) -> AppBannerReply;
}

/// Window-level post into the guest frame, with a transfer list. The bridge
/// uses this exactly once per bootstrap, to hand over the channel endpoint.
pub trait GuestWindow: Send + Sync {
    fn post(&self, data: Value, ports: Vec<Port>);
}
