//! End-to-end bridge scenarios: a scripted guest on one side, recording
//! collaborator doubles on the other.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{json, Value};

use crate::events::BridgeEvent;
use crate::host::{DirtyState, EditorDispatch, GuestWindow, HostStatus, Navigator};
use crate::liveness::WatchdogState;
use crate::port::{channel, Port, PortMessage, PortReceiver};
use crate::protocol::{
    AppBannerReply, CheckoutStatusReply, CloseButtonReply, GutenboardingStatusReply,
    NavSidebarReply, RevisionReply, UrlInfoReply,
};
use crate::registry::ChannelName;
use crate::session::{BridgeConfig, BridgeSession, HostHandles};

const ADMIN_URL: &str = "https://site.example.com/wp-admin/post-new.php?frame-nonce=abc123";
const ORIGIN: &str = "https://site.example.com";

// =============================================================================
// COLLABORATOR DOUBLES
// =============================================================================

#[derive(Default)]
struct RecordingNavigator {
    urls: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &str) {
        self.urls.lock().unwrap().push(url.to_string());
    }
}

#[derive(Default)]
struct RecordingWindow {
    posts: Mutex<Vec<(Value, Vec<Port>)>>,
}

impl GuestWindow for RecordingWindow {
    fn post(&self, data: Value, ports: Vec<Port>) {
        self.posts.lock().unwrap().push((data, ports));
    }
}

#[derive(Default)]
struct RecordingDirty {
    changed: AtomicUsize,
    saved: AtomicUsize,
}

impl DirtyState for RecordingDirty {
    fn mark_changed(&self) {
        self.changed.fetch_add(1, Ordering::SeqCst);
    }
    fn mark_saved(&self) {
        self.saved.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct RecordingDispatch {
    trashed: Mutex<Vec<u64>>,
    statuses: Mutex<Vec<String>>,
    marks: Mutex<Vec<String>>,
}

impl EditorDispatch for RecordingDispatch {
    fn trash_post(&self, post_id: u64) {
        self.trashed.lock().unwrap().push(post_id);
    }
    fn post_status_changed(&self, status: &str) {
        self.statuses.lock().unwrap().push(status.to_string());
    }
    fn performance_mark(&self, mark_name: &str) {
        self.marks.lock().unwrap().push(mark_name.to_string());
    }
}

struct CannedStatus;

impl HostStatus for CannedStatus {
    fn checkout_status(&self) -> CheckoutStatusReply {
        CheckoutStatusReply {
            is_checkout_overlay_enabled: true,
        }
    }
    fn close_button(&self) -> CloseButtonReply {
        CloseButtonReply {
            close_url: "/posts/site.example.com".into(),
            label: "View Posts".into(),
        }
    }
    fn gutenboarding_status(&self) -> GutenboardingStatusReply {
        GutenboardingStatusReply {
            is_gutenboarding: false,
            current_calypso_url: "https://host.example/post/site.example.com".into(),
        }
    }
    fn nav_sidebar_labels(&self) -> NavSidebarReply {
        NavSidebarReply::default()
    }
    fn url_info(&self) -> UrlInfoReply {
        UrlInfoReply {
            origin: "https://host.example".into(),
            site_slug: "site.example.com".into(),
        }
    }
    fn app_banner(&self) -> AppBannerReply {
        AppBannerReply {
            is_app_banner_visible: true,
            has_app_banner_been_dismissed: false,
        }
    }
}

// =============================================================================
// TEST RIG
// =============================================================================

struct Rig {
    session: BridgeSession,
    navigator: Arc<RecordingNavigator>,
    window: Arc<RecordingWindow>,
    dirty: Arc<RecordingDirty>,
    dispatch: Arc<RecordingDispatch>,
}

fn rig() -> Rig {
    let navigator = Arc::new(RecordingNavigator::default());
    let window = Arc::new(RecordingWindow::default());
    let dirty = Arc::new(RecordingDirty::default());
    let dispatch = Arc::new(RecordingDispatch::default());

    let hosts = HostHandles {
        navigator: navigator.clone(),
        dirty: dirty.clone(),
        dispatch: dispatch.clone(),
        status: Arc::new(CannedStatus),
        window: window.clone(),
    };
    let config = BridgeConfig {
        admin_url: ADMIN_URL.into(),
        ..BridgeConfig::default()
    };

    Rig {
        session: BridgeSession::new(config, hosts),
        navigator,
        window,
        dirty,
        dispatch,
    }
}

impl Rig {
    /// Post the bootstrap action and return the guest's end of the
    /// dedicated channel.
    fn bootstrap(&mut self) -> Port {
        self.session.handle_window_message(window_msg(
            ORIGIN,
            json!({"type": "gutenbergIframeMessage", "action": "loaded"}),
            vec![],
        ));
        let (data, mut ports) = self.window.posts.lock().unwrap().pop().unwrap();
        assert_eq!(data, json!({"action": "initPort"}));
        assert_eq!(ports.len(), 1);
        ports.pop().unwrap()
    }

    /// Send an action over an established control port and let the session
    /// process it.
    fn send(&mut self, control: &mut Port, data: Value, ports: Vec<Port>) {
        control.post_message(PortMessage { data, ports });
        self.session.poll();
    }

    fn navigations(&self) -> Vec<String> {
        self.navigator.urls.lock().unwrap().clone()
    }
}

fn window_msg(origin: &str, data: Value, ports: Vec<Port>) -> crate::protocol::WindowMessage {
    crate::protocol::WindowMessage {
        origin: origin.to_string(),
        data,
        ports,
    }
}

fn reply_of(rx: &mut PortReceiver) -> Value {
    rx.try_recv().expect("expected a reply").data
}

// =============================================================================
// BOOTSTRAP & ENVELOPE VALIDATION
// =============================================================================

#[test]
fn loaded_establishes_channel_and_disarms_watchdog() {
    let mut rig = rig();
    assert_eq!(rig.session.watchdog_state(), WatchdogState::ArmedStage1);

    let _control = rig.bootstrap();

    assert!(rig.session.is_loaded());
    assert_eq!(rig.session.watchdog_state(), WatchdogState::Disarmed);
    // No fallback ever fires for this session, even far in the future.
    rig.session.poll_at(Instant::now() + Duration::from_secs(3_600));
    assert!(rig.navigations().is_empty());
}

#[test]
fn wrong_sentinel_has_no_observable_effect() {
    let mut rig = rig();
    rig.session.handle_window_message(window_msg(
        ORIGIN,
        json!({"type": "somethingElse", "action": "loaded"}),
        vec![],
    ));

    assert!(!rig.session.is_loaded());
    assert_eq!(rig.session.watchdog_state(), WatchdogState::ArmedStage1);
    assert!(rig.window.posts.lock().unwrap().is_empty());
}

#[test]
fn untrusted_origin_is_dropped_even_with_valid_action() {
    let mut rig = rig();
    for origin in ["https://evil.example.net", "https://site.example.com.evil.net", ""] {
        rig.session.handle_window_message(window_msg(
            origin,
            json!({"type": "gutenbergIframeMessage", "action": "loaded"}),
            vec![],
        ));
    }

    assert!(!rig.session.is_loaded());
    assert!(rig.window.posts.lock().unwrap().is_empty());
}

#[test]
fn rebootstrap_tears_down_previous_control_channel() {
    let mut rig = rig();
    let mut first = rig.bootstrap();
    let mut second = rig.bootstrap();

    // Traffic on the displaced channel goes nowhere.
    let (port, mut rx) = channel();
    rig.send(
        &mut first,
        json!({"action": "GetCheckoutModalStatus"}),
        vec![port],
    );
    assert!(rx.try_recv().is_none());

    // The fresh channel works.
    let (port, mut rx) = channel();
    rig.send(
        &mut second,
        json!({"action": "GetCheckoutModalStatus"}),
        vec![port],
    );
    assert_eq!(reply_of(&mut rx), json!({"isCheckoutOverlayEnabled": true}));
}

#[test]
fn legacy_classic_media_request_routes_as_event() {
    let mut rig = rig();
    rig.session.handle_window_message(window_msg(
        ORIGIN,
        json!({
            "type": "gutenbergIframeMessage",
            "action": "classicBlockOpenMediaModal",
            "editorId": "classic-3",
            "imageId": 88
        }),
        vec![],
    ));

    let events = rig.session.drain_events();
    assert!(matches!(
        &events[..],
        [BridgeEvent::ClassicMediaModalRequested { editor_id, image_id: Some(88) }]
            if editor_id == "classic-3"
    ));
}

// =============================================================================
// LIVENESS
// =============================================================================

#[test]
fn stage1_timeout_navigates_to_stripped_url_once() {
    let mut rig = rig();
    let later = Instant::now() + Duration::from_secs(60);

    rig.session.poll_at(later);
    rig.session.poll_at(later + Duration::from_secs(60));

    assert_eq!(
        rig.navigations(),
        vec!["https://site.example.com/wp-admin/post-new.php".to_string()]
    );
    assert_eq!(rig.session.watchdog_state(), WatchdogState::Disarmed);
}

#[test]
fn frame_load_rearms_short_deadline() {
    let mut rig = rig();
    rig.session.frame_loaded();
    assert_eq!(rig.session.watchdog_state(), WatchdogState::ArmedStage2);

    rig.session.poll_at(Instant::now() + Duration::from_secs(7));
    assert_eq!(rig.navigations().len(), 1);
}

#[test]
fn disabled_redirects_suppress_stale_timer() {
    let mut rig = rig();
    rig.session.disable_redirects();

    rig.session.poll_at(Instant::now() + Duration::from_secs(60));

    assert!(rig.navigations().is_empty());
    assert_eq!(rig.session.watchdog_state(), WatchdogState::Disarmed);
}

// =============================================================================
// REQUEST/REPLY ACTIONS
// =============================================================================

#[test]
fn checkout_status_query_replies_synchronously_and_retains_nothing() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    let (port, mut rx) = channel();
    rig.send(
        &mut control,
        json!({"action": "GetCheckoutModalStatus"}),
        vec![port],
    );

    assert_eq!(reply_of(&mut rx), json!({"isCheckoutOverlayEnabled": true}));
    assert!(rig.session.ports.is_empty());
    // One-shot: the endpoint is closed after the answer.
    assert!(rx.try_recv().is_none());
}

#[test]
fn each_query_answers_its_own_shape() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    let (port, mut rx) = channel();
    rig.send(&mut control, json!({"action": "GetCloseButtonUrl"}), vec![port]);
    assert_eq!(
        reply_of(&mut rx),
        json!({"closeUrl": "/posts/site.example.com", "label": "View Posts"})
    );

    let (port, mut rx) = channel();
    rig.send(&mut control, json!({"action": "GetCalypsoUrlInfo"}), vec![port]);
    assert_eq!(
        reply_of(&mut rx),
        json!({"origin": "https://host.example", "siteSlug": "site.example.com"})
    );

    let (port, mut rx) = channel();
    rig.send(&mut control, json!({"action": "GetIsAppBannerVisible"}), vec![port]);
    assert_eq!(
        reply_of(&mut rx),
        json!({"isAppBannerVisible": true, "hasAppBannerBeenDismissed": false})
    );

    let (port, mut rx) = channel();
    rig.send(&mut control, json!({"action": "GetGutenboardingStatus"}), vec![port]);
    let value = reply_of(&mut rx);
    assert_eq!(value["isGutenboarding"], json!(false));

    let (port, mut rx) = channel();
    rig.send(&mut control, json!({"action": "GetNavSidebarLabels"}), vec![port]);
    let value = reply_of(&mut rx);
    assert!(value.get("allPostsLabels").is_some());
    assert!(value.get("createPostLabels").is_some());
    assert!(value.get("listHeadings").is_some());
}

#[test]
fn query_without_reply_port_is_a_noop() {
    let mut rig = rig();
    let mut control = rig.bootstrap();
    rig.send(&mut control, json!({"action": "GetCheckoutModalStatus"}), vec![]);
    assert!(rig.session.ports.is_empty());
}

// =============================================================================
// MEDIA MODAL CHANNEL
// =============================================================================

#[test]
fn media_modal_captures_both_ports_and_records_multiple() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    let (select, _select_rx) = channel();
    let (cancel, _cancel_rx) = channel();
    rig.send(
        &mut control,
        json!({
            "action": "OpenMediaModal",
            "payload": {"allowedTypes": ["image"], "multiple": false}
        }),
        vec![select, cancel],
    );

    assert!(rig.session.ports.contains(ChannelName::MediaSelect));
    assert!(rig.session.ports.contains(ChannelName::MediaCancel));

    let events = rig.session.drain_events();
    assert!(matches!(
        &events[..],
        [BridgeEvent::MediaModalRequested { allowed_types, multiple: false }]
            if allowed_types == &["image".to_string()]
    ));
}

#[test]
fn single_selection_replies_with_bare_object_and_closes_both_ports() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    let (select, mut select_rx) = channel();
    let (cancel, mut cancel_rx) = channel();
    rig.send(
        &mut control,
        json!({"action": "OpenMediaModal", "payload": {"allowedTypes": ["image"], "multiple": false}}),
        vec![select, cancel],
    );

    rig.session
        .complete_media_selection(vec![json!({"ID": 9, "URL": "https://cdn.example/9.jpg"})]);

    let selected = reply_of(&mut select_rx);
    assert!(!selected.is_array());
    assert_eq!(selected["ID"], json!(9));
    assert!(cancel_rx.try_recv().is_none());
    assert!(rig.session.ports.is_empty());
}

#[test]
fn multiple_selection_replies_with_array() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    let (select, mut select_rx) = channel();
    rig.send(
        &mut control,
        json!({"action": "OpenMediaModal", "payload": {"multiple": true}}),
        vec![select],
    );

    rig.session
        .complete_media_selection(vec![json!({"ID": 1}), json!({"ID": 2})]);

    let selected = reply_of(&mut select_rx);
    assert_eq!(selected, json!([{"ID": 1}, {"ID": 2}]));
}

#[test]
fn dismissal_posts_boolean_on_cancel_port_only() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    let (select, mut select_rx) = channel();
    let (cancel, mut cancel_rx) = channel();
    rig.send(
        &mut control,
        json!({"action": "OpenMediaModal", "payload": {}}),
        vec![select, cancel],
    );

    rig.session.dismiss_media_modal();

    assert!(select_rx.try_recv().is_none());
    assert_eq!(reply_of(&mut cancel_rx), json!(true));
    assert!(rig.session.ports.is_empty());
}

#[test]
fn reopening_media_modal_abandons_first_port_pair() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    let (select_a, mut rx_a) = channel();
    rig.send(
        &mut control,
        json!({"action": "OpenMediaModal", "payload": {"multiple": false}}),
        vec![select_a],
    );
    let (select_b, mut rx_b) = channel();
    rig.send(
        &mut control,
        json!({"action": "OpenMediaModal", "payload": {"multiple": false}}),
        vec![select_b],
    );

    rig.session.complete_media_selection(vec![json!({"ID": 5})]);

    assert!(rx_a.try_recv().is_none());
    assert_eq!(reply_of(&mut rx_b)["ID"], json!(5));
}

// =============================================================================
// OTHER CHANNELS
// =============================================================================

#[test]
fn checkout_channel_gets_literal_completion_string() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    let (port, mut rx) = channel();
    rig.send(
        &mut control,
        json!({"action": "OpenCheckoutModal", "payload": {"cartItems": []}}),
        vec![port],
    );
    assert!(matches!(
        &rig.session.drain_events()[..],
        [BridgeEvent::CheckoutModalRequested { .. }]
    ));

    rig.session.complete_checkout();
    assert_eq!(reply_of(&mut rx), json!("checkout complete"));

    // A second completion is delivered nowhere.
    rig.session.complete_checkout();
    assert!(rx.try_recv().is_none());
}

#[test]
fn revisions_channel_gets_revision_fields() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    let (port, mut rx) = channel();
    rig.send(&mut control, json!({"action": "OpenRevisions"}), vec![port]);

    rig.session.load_revision(RevisionReply {
        title: "Draft title".into(),
        excerpt: "".into(),
        content: "<p>hello</p>".into(),
    });

    assert_eq!(
        reply_of(&mut rx),
        json!({"title": "Draft title", "excerpt": "", "content": "<p>hello</p>"})
    );
}

#[test]
fn draft_id_assignment_marks_dirty_and_replies_later() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    let (port, mut rx) = channel();
    rig.send(&mut control, json!({"action": "DraftIdAssignment"}), vec![port]);

    assert_eq!(rig.dirty.changed.load(Ordering::SeqCst), 1);
    assert!(matches!(
        &rig.session.drain_events()[..],
        [BridgeEvent::DraftIdRequested]
    ));

    rig.session.assign_draft_id(4312);
    assert_eq!(reply_of(&mut rx), json!(4312));
}

// =============================================================================
// COMMANDS
// =============================================================================

#[test]
fn trash_post_reaches_dispatch() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    rig.send(
        &mut control,
        json!({"action": "TrashPost", "payload": {"postId": 77}}),
        vec![],
    );
    assert_eq!(*rig.dispatch.trashed.lock().unwrap(), vec![77]);
}

#[test]
fn navigation_commands_use_the_navigator() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    rig.send(
        &mut control,
        json!({"action": "ViewPost", "payload": {"postUrl": "https://site.example.com/?p=7"}}),
        vec![],
    );
    rig.send(&mut control, json!({"action": "CloseEditor"}), vec![]);
    rig.send(&mut control, json!({"action": "GoToPatterns"}), vec![]);
    rig.send(&mut control, json!({"action": "NavigateToHome"}), vec![]);

    assert_eq!(
        rig.navigations(),
        vec![
            "https://site.example.com/?p=7".to_string(),
            "/posts/site.example.com".to_string(),
            "/patterns/site.example.com".to_string(),
            "/home/site.example.com".to_string(),
        ]
    );
}

#[test]
fn post_status_change_marks_saved() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    rig.send(
        &mut control,
        json!({"action": "PostStatusChange", "payload": {"status": "publish"}}),
        vec![],
    );

    assert_eq!(rig.dirty.saved.load(Ordering::SeqCst), 1);
    assert_eq!(*rig.dispatch.statuses.lock().unwrap(), vec!["publish"]);
}

#[test]
fn performance_mark_reaches_dispatch() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    rig.send(
        &mut control,
        json!({"action": "PerformanceMark", "payload": {"markName": "editor-interactive"}}),
        vec![],
    );
    assert_eq!(*rig.dispatch.marks.lock().unwrap(), vec!["editor-interactive"]);
}

// =============================================================================
// ROBUSTNESS
// =============================================================================

#[test]
fn unknown_action_is_ignored_and_session_survives() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    rig.send(&mut control, json!({"action": "BrandNewThing", "payload": 1}), vec![]);

    // The session still answers the next well-formed message.
    let (port, mut rx) = channel();
    rig.send(&mut control, json!({"action": "GetCheckoutModalStatus"}), vec![port]);
    assert_eq!(reply_of(&mut rx), json!({"isCheckoutOverlayEnabled": true}));
}

#[test]
fn malformed_payload_noops_that_message_only() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    // postId missing: the handler must not fire and must not tear anything down.
    rig.send(&mut control, json!({"action": "TrashPost", "payload": {}}), vec![]);
    assert!(rig.dispatch.trashed.lock().unwrap().is_empty());

    rig.send(
        &mut control,
        json!({"action": "TrashPost", "payload": {"postId": 3}}),
        vec![],
    );
    assert_eq!(*rig.dispatch.trashed.lock().unwrap(), vec![3]);
}

#[test]
fn message_without_action_field_is_dropped() {
    let mut rig = rig();
    let mut control = rig.bootstrap();
    rig.send(&mut control, json!({"payload": {"postId": 3}}), vec![]);
    assert!(rig.dispatch.trashed.lock().unwrap().is_empty());
}

#[test]
fn shutdown_closes_captured_ports_and_control() {
    let mut rig = rig();
    let mut control = rig.bootstrap();

    let (select, mut select_rx) = channel();
    rig.send(
        &mut control,
        json!({"action": "OpenMediaModal", "payload": {}}),
        vec![select],
    );

    rig.session.shutdown();

    // Stale completions after teardown deliver nothing.
    rig.session.complete_media_selection(vec![json!({"ID": 1})]);
    assert!(select_rx.try_recv().is_none());
}
