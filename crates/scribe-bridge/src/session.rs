//! Per-mount bridge session: owns the control channel, the captured ports,
//! the liveness watchdog, and the redirect-suppression flag.
//!
//! One session per mounted guest frame. Construction arms the watchdog;
//! teardown closes every endpoint so a dead mount cannot keep guest
//! resources alive or deliver stale replies to a UI that no longer exists.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::events::BridgeEvent;
use crate::host::{DirtyState, EditorDispatch, GuestWindow, HostStatus, Navigator};
use crate::liveness::{fallback_url, LivenessWatchdog, WatchdogState};
use crate::port::PortReceiver;
use crate::protocol::RevisionReply;
use crate::registry::{ChannelName, PortRegistry};

/// Session parameters, usually mapped from the config file.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Full URL of the guest admin page; inbound origins are prefix-checked
    /// against it and it is the fallback navigation target.
    pub admin_url: String,
    /// One-time auth query parameter stripped from the fallback target.
    pub auth_param: String,
    pub stage1_timeout: Duration,
    pub stage2_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            admin_url: "https://example.wordpress.com/wp-admin/post-new.php".into(),
            auth_param: "frame-nonce".into(),
            stage1_timeout: Duration::from_millis(25_000),
            stage2_timeout: Duration::from_millis(6_000),
        }
    }
}

/// The collaborator set a session drives.
#[derive(Clone)]
pub struct HostHandles {
    pub navigator: Arc<dyn Navigator>,
    pub dirty: Arc<dyn DirtyState>,
    pub dispatch: Arc<dyn EditorDispatch>,
    pub status: Arc<dyn HostStatus>,
    pub window: Arc<dyn GuestWindow>,
}

/// One mounted guest frame's half of the bridge.
pub struct BridgeSession {
    pub(crate) config: BridgeConfig,
    pub(crate) hosts: HostHandles,
    /// Receiving end of the dedicated channel. Exclusive: re-bootstrapping
    /// tears down the previous one before a new one exists.
    pub(crate) control: Option<PortReceiver>,
    pub(crate) ports: PortRegistry,
    watchdog: LivenessWatchdog,
    redirects_disabled: bool,
    pub(crate) loaded: bool,
    /// Reply shape recorded when the media modal was opened.
    pub(crate) media_multiple: bool,
    pub(crate) events: Vec<BridgeEvent>,
}

impl BridgeSession {
    /// Mount: arms the stage-1 watchdog immediately.
    pub fn new(config: BridgeConfig, hosts: HostHandles) -> Self {
        let watchdog =
            LivenessWatchdog::arm(Instant::now(), config.stage1_timeout, config.stage2_timeout);
        info!(admin_url = %config.admin_url, "bridge session mounted");
        Self {
            config,
            hosts,
            control: None,
            ports: PortRegistry::new(),
            watchdog,
            redirects_disabled: false,
            loaded: false,
            media_multiple: false,
            events: Vec::new(),
        }
    }

    /// The guest frame finished downloading. Re-arms the short deadline:
    /// bytes on disk prove nothing about the app inside them.
    pub fn frame_loaded(&mut self) {
        self.watchdog.frame_loaded(Instant::now());
    }

    /// Permanently suppress the fallback-navigation edge. One-directional:
    /// there is no re-enable for the rest of the session's lifetime.
    pub fn disable_redirects(&mut self) {
        if !self.redirects_disabled {
            debug!("fallback redirects disabled for this session");
        }
        self.redirects_disabled = true;
    }

    pub fn redirects_disabled(&self) -> bool {
        self.redirects_disabled
    }

    /// Drive the session: drain guest traffic from the control channel and
    /// check the watchdog deadline.
    pub fn poll(&mut self) {
        self.poll_at(Instant::now());
    }

    /// `poll` with an explicit timestamp.
    pub fn poll_at(&mut self, now: Instant) {
        // Drain first so a bootstrap already sitting in the queue disarms
        // the watchdog before the deadline check.
        let mut pending = Vec::new();
        if let Some(control) = self.control.as_mut() {
            while let Some(msg) = control.try_recv() {
                pending.push(msg);
            }
        }
        for msg in pending {
            self.handle_port_message(msg);
        }

        if self.watchdog.poll(now, self.redirects_disabled) {
            let url = fallback_url(&self.config.admin_url, &self.config.auth_param);
            self.hosts.navigator.navigate(&url);
        }
    }

    pub(crate) fn disarm_watchdog(&mut self) {
        self.watchdog.disarm();
    }

    pub fn watchdog_state(&self) -> WatchdogState {
        self.watchdog.state()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Drain decoded guest requests for the embedding shell.
    pub fn drain_events(&mut self) -> Vec<BridgeEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // COMPLETION API: resolves channels opened by the guest
    // =========================================================================

    /// Media picker finished. Reply shape follows the `multiple` flag
    /// recorded at open time: one bare object, or an array. Both media
    /// ports are released either way.
    pub fn complete_media_selection(&mut self, items: Vec<Value>) {
        let data = if self.media_multiple {
            Value::Array(items)
        } else {
            items.into_iter().next().unwrap_or(Value::Null)
        };
        self.ports.reply(ChannelName::MediaSelect, data);
        self.ports.cancel(ChannelName::MediaCancel);
    }

    /// Media picker dismissed with no selection: the cancel port gets a
    /// boolean, the main port closes unposted.
    pub fn dismiss_media_modal(&mut self) {
        self.ports.reply(ChannelName::MediaCancel, Value::Bool(true));
        self.ports.cancel(ChannelName::MediaSelect);
    }

    /// Checkout overlay completed.
    pub fn complete_checkout(&mut self) {
        self.ports.reply(ChannelName::Checkout, json!("checkout complete"));
    }

    /// A revision was chosen in the host revision browser.
    pub fn load_revision(&mut self, revision: RevisionReply) {
        match serde_json::to_value(&revision) {
            Ok(data) => self.ports.reply(ChannelName::Revisions, data),
            Err(e) => debug!(error = %e, "revision reply not serializable"),
        }
    }

    /// The draft the guest is editing received its permanent ID.
    pub fn assign_draft_id(&mut self, post_id: u64) {
        self.ports.reply(ChannelName::DraftId, json!(post_id));
    }

    /// Unmount: close every captured port, drop the control channel, and
    /// silence the watchdog.
    pub fn shutdown(&mut self) {
        self.ports.close_all();
        if self.control.take().is_some() {
            debug!("control channel dropped");
        }
        self.watchdog.disarm();
    }
}

impl Drop for BridgeSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
