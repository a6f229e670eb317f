//! Messages dispatched by the application lifecycle
//!
//! Hosts translate their native notifications into [`AppEvent`]s; the
//! window controller queues [`AppEvent::SaveAppStatus`] requests. Everything
//! is handled on one thread, one event at a time.

use crate::window::{WindowEvent, WindowId};

/// Lifecycle notifications emitted by the host runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// Start-up finished; the first window may be created
    Ready,
    /// The user re-activated the application
    Activate,
    /// The last window was closed
    WindowAllClosed,
    /// The host is about to terminate the process
    WillQuit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Host(HostEvent),
    Window { id: WindowId, event: WindowEvent },
    /// Capture window geometry; `flush` also writes the snapshot file
    SaveAppStatus { flush: bool },
    /// Termination requested from outside the host (SIGINT/SIGTERM)
    QuitRequested,
}
