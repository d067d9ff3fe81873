//! Session state registry
//!
//! The only process-wide mutable state besides attribution: per-session
//! captured flags and surface bookkeeping. Injected into services as an
//! explicit container rather than ambient globals so tests can build
//! isolated instances.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::orchestrator::SurfaceKind;

/// Mutable per-session state shared across services
#[derive(Debug, Default)]
pub struct SessionState {
    /// Set once any lead submission for this session has been accepted.
    /// Suppresses every further automatic lead surface.
    captured: AtomicBool,
    /// An automatic surface has already been presented this session
    presented: AtomicBool,
    /// Currently open surface, if any
    open_surface: Mutex<Option<SurfaceKind>>,
}

impl SessionState {
    /// Idempotent: re-setting an already captured session has no
    /// observable effect beyond the first call.
    ///
    /// Returns true only on the transition.
    pub fn mark_captured(&self) -> bool {
        !self.captured.swap(true, Ordering::SeqCst)
    }

    pub fn is_captured(&self) -> bool {
        self.captured.load(Ordering::SeqCst)
    }

    /// Try to claim the one automatic surface slot for this session.
    /// First caller wins; racing triggers after it are rejected.
    pub fn try_open_surface(&self, surface: SurfaceKind) -> bool {
        let mut open = self.open_surface.lock();
        if open.is_some() || self.presented.load(Ordering::SeqCst) {
            return false;
        }
        *open = Some(surface);
        self.presented.store(true, Ordering::SeqCst);
        true
    }

    /// Close the open surface (dismiss or capture). The presented flag
    /// stays set: one automatic surface per session.
    pub fn close_surface(&self) -> Option<SurfaceKind> {
        self.open_surface.lock().take()
    }

    pub fn open_surface(&self) -> Option<SurfaceKind> {
        *self.open_surface.lock()
    }

    pub fn surface_presented(&self) -> bool {
        self.presented.load(Ordering::SeqCst)
    }
}

/// Registry of all sessions the gateway has seen
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<SessionState>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the state for a session id
    pub fn state(&self, session_id: &str) -> Arc<SessionState> {
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Mark a session captured, creating it if unseen.
    /// Returns true on the first transition only.
    pub fn mark_captured(&self, session_id: &str) -> bool {
        let transitioned = self.state(session_id).mark_captured();
        if transitioned {
            debug!("Session {} marked captured", session_id);
        }
        transitioned
    }

    pub fn is_captured(&self, session_id: &str) -> bool {
        self.sessions
            .get(session_id)
            .map(|s| s.is_captured())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
