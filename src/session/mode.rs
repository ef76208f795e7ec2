//! Mode State Machine
//!
//! Two states, [`SessionMode::WebView`] (initial) and [`SessionMode::Immersive`].
//! The visible effects of a mode are published together as one [`ModeView`]
//! snapshot, so a reader never observes orbit controls enabled together with an
//! eligible cursor.
//!
//! Starting a session suspends twice (capability check, session request). A
//! toggle arriving in between is coalesced, and a start whose session was ended
//! or cancelled before the start resumed is discarded.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::errors::{PlacementError, Result};
use crate::session::environment::{SessionId, XrSession, XrSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    #[default]
    WebView,
    Immersive,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebView => f.write_str("WebView"),
            Self::Immersive => f.write_str("Immersive"),
        }
    }
}

/// Everything the current mode decides about the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeView {
    pub mode: SessionMode,
    /// Orbit-style camera controls enabled
    pub orbit_controls: bool,
    /// Desktop-only controls shown
    pub desktop_chrome: bool,
    /// The cursor may become visible
    pub cursor_eligible: bool,
    pub session: Option<SessionId>,
}

impl ModeView {
    #[must_use]
    pub const fn web_view() -> Self {
        Self {
            mode: SessionMode::WebView,
            orbit_controls: true,
            desktop_chrome: true,
            cursor_eligible: false,
            session: None,
        }
    }

    #[must_use]
    pub const fn immersive(session: SessionId) -> Self {
        Self {
            mode: SessionMode::Immersive,
            orbit_controls: false,
            desktop_chrome: false,
            cursor_eligible: true,
            session: Some(session),
        }
    }
}

impl Default for ModeView {
    fn default() -> Self {
        Self::web_view()
    }
}

/// Result of a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    Entered(ModeView),
    Exited(ModeView),
    /// Nothing changed: coalesced, stale or discarded
    Unchanged,
}

struct ModeInner {
    view: ModeView,
    session: Option<Arc<dyn XrSession>>,
    starting: bool,
    start_ticket: u64,
    /// Sessions reported ended before their start resumed
    ended_early: FxHashSet<SessionId>,
}

impl ModeInner {
    /// Settles the pending start, whatever its outcome.
    fn finish_start(&mut self) {
        self.starting = false;
        self.ended_early.clear();
    }
}

pub struct ModeStateMachine {
    inner: Mutex<ModeInner>,
}

impl Default for ModeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ModeInner {
                view: ModeView::web_view(),
                session: None,
                starting: false,
                start_ticket: 0,
                ended_early: FxHashSet::default(),
            }),
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// WebView → Immersive.
    ///
    /// Refused with [`PlacementError::CapabilityUnavailable`] when the capability
    /// check fails, and with [`PlacementError::Session`] when the runtime refuses
    /// the session. Both leave the mode untouched.
    pub async fn request_immersive(&self, system: &dyn XrSystem) -> Result<ModeChange> {
        let ticket = {
            let mut inner = self.inner.lock();
            if inner.view.mode == SessionMode::Immersive {
                return Ok(ModeChange::Unchanged);
            }
            if inner.starting {
                log::warn!("Immersive start already pending, toggle ignored");
                return Ok(ModeChange::Unchanged);
            }
            inner.starting = true;
            inner.start_ticket += 1;
            inner.start_ticket
        };

        let supported = system.is_immersive_supported().await;
        if !self.start_is_current(ticket) {
            log::warn!("Immersive start cancelled during capability check");
            return Ok(ModeChange::Unchanged);
        }
        if !supported {
            self.inner.lock().finish_start();
            log::warn!("Immersive mode refused: surface tracking unsupported");
            return Err(PlacementError::CapabilityUnavailable(
                "immersive surface tracking is not supported on this device".to_string(),
            ));
        }

        let session = match system.request_session().await {
            Ok(session) => session,
            Err(err) => {
                let mut inner = self.inner.lock();
                if inner.starting && inner.start_ticket == ticket {
                    inner.finish_start();
                }
                drop(inner);
                log::warn!("Immersive session request failed: {err}");
                return Err(PlacementError::Session(err.0));
            }
        };

        let mut inner = self.inner.lock();
        let ended = inner.ended_early.remove(&session.id());
        let current = inner.starting && inner.start_ticket == ticket;
        if current {
            inner.finish_start();
        }
        if !current || ended {
            drop(inner);
            log::warn!("Discarding {} started after its request was cancelled", session.id());
            if !ended {
                session.end();
            }
            return Ok(ModeChange::Unchanged);
        }

        let id = session.id();
        let view = ModeView::immersive(id);
        inner.view = view;
        inner.session = Some(session);
        log::info!("Entered immersive mode ({id})");
        Ok(ModeChange::Entered(view))
    }

    /// Immersive → WebView, on the runtime's session-ended notification.
    ///
    /// Notifications for any other session are ignored.
    pub fn end_session(&self, id: SessionId) -> ModeChange {
        let mut inner = self.inner.lock();
        if inner.view.session != Some(id) {
            if inner.starting {
                inner.ended_early.insert(id);
            }
            log::warn!("Ignoring end of stale {id}");
            return ModeChange::Unchanged;
        }

        inner.session = None;
        inner.view = ModeView::web_view();
        log::info!("Exited immersive mode ({id})");
        ModeChange::Exited(inner.view)
    }

    /// Asks the active session to end. The mode changes once the runtime
    /// reports the end through [`end_session`](Self::end_session).
    pub fn request_exit(&self) -> bool {
        let session = self.inner.lock().session.clone();
        match session {
            Some(session) => {
                log::info!("Requesting end of {}", session.id());
                session.end();
                true
            }
            None => false,
        }
    }

    /// Abandons a pending start; its result will be discarded.
    pub fn cancel_start(&self) {
        let mut inner = self.inner.lock();
        if inner.starting {
            inner.finish_start();
            inner.start_ticket += 1;
            log::info!("Pending immersive start cancelled");
        }
    }

    fn start_is_current(&self, ticket: u64) -> bool {
        let inner = self.inner.lock();
        inner.starting && inner.start_ticket == ticket
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn view(&self) -> ModeView {
        self.inner.lock().view
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.inner.lock().view.mode
    }

    #[must_use]
    pub fn session(&self) -> Option<Arc<dyn XrSession>> {
        self.inner.lock().session.clone()
    }

    #[must_use]
    pub fn is_starting(&self) -> bool {
        self.inner.lock().starting
    }
}
