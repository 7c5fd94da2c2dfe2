//! Liveness watchdog: detects a guest frame that never becomes interactive.
//!
//! Two armed stages, one terminal state. Stage 1 covers the whole mount; a
//! frame-load event re-arms with the short stage-2 deadline, because onload
//! only proves the bytes arrived, not that the guest app executed. The
//! bootstrap action disarms for good: a guest that proved liveness is never
//! force-navigated later, no matter what the transport does afterwards.

use std::time::{Duration, Instant};

use tracing::{debug, info};
use url::Url;

/// Watchdog state. `Disarmed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    ArmedStage1,
    ArmedStage2,
    Disarmed,
}

/// Deadline-based watchdog, polled from the host loop.
#[derive(Debug)]
pub struct LivenessWatchdog {
    state: WatchdogState,
    deadline: Option<Instant>,
    stage2_timeout: Duration,
}

impl LivenessWatchdog {
    /// Arm stage 1. Called once, when the session becomes eligible to load.
    pub fn arm(now: Instant, stage1_timeout: Duration, stage2_timeout: Duration) -> Self {
        Self {
            state: WatchdogState::ArmedStage1,
            deadline: Some(now + stage1_timeout),
            stage2_timeout,
        }
    }

    /// Frame finished downloading: re-arm with the short stage-2 deadline.
    /// Ignored once disarmed.
    pub fn frame_loaded(&mut self, now: Instant) {
        if self.state == WatchdogState::Disarmed {
            return;
        }
        self.state = WatchdogState::ArmedStage2;
        self.deadline = Some(now + self.stage2_timeout);
        debug!("watchdog re-armed for stage 2");
    }

    /// The guest proved itself interactive. Terminal: never re-arms.
    pub fn disarm(&mut self) {
        if self.state != WatchdogState::Disarmed {
            debug!(state = ?self.state, "watchdog disarmed");
        }
        self.state = WatchdogState::Disarmed;
        self.deadline = None;
    }

    /// Check the deadline. Returns `true` exactly once per session, when an
    /// armed deadline has elapsed and redirects are still allowed; the
    /// caller must then perform the fallback navigation. Either way an
    /// elapsed deadline collapses the machine to `Disarmed`.
    pub fn poll(&mut self, now: Instant, redirects_disabled: bool) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        if now < deadline {
            return false;
        }

        let stage = self.state;
        self.state = WatchdogState::Disarmed;
        self.deadline = None;

        if redirects_disabled {
            debug!(stage = ?stage, "watchdog expired but redirects are disabled");
            return false;
        }
        info!(stage = ?stage, "guest never became interactive, falling back");
        true
    }

    pub fn state(&self) -> WatchdogState {
        self.state
    }

    pub fn is_disarmed(&self) -> bool {
        self.state == WatchdogState::Disarmed
    }
}

/// Build the fallback navigation target: the guest URL with the transient
/// one-time auth query parameter removed. A URL that fails to parse is
/// returned unchanged.
pub fn fallback_url(guest_url: &str, auth_param: &str) -> String {
    let Ok(mut url) = Url::parse(guest_url) else {
        return guest_url.to_string();
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != auth_param)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url.to_string()
}
