//! Owner of the single main window
//!
//! The window is created from the restored snapshot, at most once at a time.
//! Geometry notifications refresh the cached state and queue a memory-only
//! save request for the lifecycle; the snapshot reaches disk only when the
//! lifecycle flushes it.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use tracing::{debug, info, warn};

use crate::constants::geometry::{DEFAULT_HEIGHT, DEFAULT_LEFT, DEFAULT_TOP, DEFAULT_WIDTH};
use crate::events::AppEvent;
use crate::host::HostRuntime;
use crate::persistence::{SnapshotKey, SnapshotStore, WindowGeometrySnapshot};
use crate::types::{Dimensions, Position, WindowGeometry};
use crate::window::{WindowEvent, WindowId, WindowOptions, WindowResource};

pub struct WindowController<W: WindowResource> {
    window: Option<W>,
    snapshot: SnapshotStore,
    /// Position seen the last time the window was visible
    last_position: Position,
    document: PathBuf,
    options: WindowOptions,
    requests: Sender<AppEvent>,
}

impl<W: WindowResource> WindowController<W> {
    pub fn new(
        snapshot: SnapshotStore,
        document: PathBuf,
        options: WindowOptions,
        requests: Sender<AppEvent>,
    ) -> Self {
        Self {
            window: None,
            snapshot,
            last_position: Position::default(),
            document,
            options,
            requests,
        }
    }

    /// Create the window unless one is already open; returns its id either way
    pub fn create_window<H>(&mut self, host: &mut H) -> Result<WindowId>
    where
        H: HostRuntime<Window = W>,
    {
        if let Some(window) = &self.window {
            debug!(window = window.id(), "Window already open, reusing it");
            return Ok(window.id());
        }

        let geometry = self.initial_geometry();
        info!(geometry = ?geometry, options = ?self.options, "Creating main window");

        let mut window = host
            .create_window(&geometry, &self.options)
            .context("Failed to create main window")?;

        if !self.document.exists() {
            warn!(document = %self.document.display(), "Document not found, loading it anyway");
        }
        window
            .load_document(&self.document)
            .context(format!("Failed to load document {}", self.document.display()))?;
        window
            .subscribe(&WindowEvent::ALL)
            .context("Failed to subscribe to window notifications")?;

        let id = window.id();
        self.last_position = geometry.position;
        self.window = Some(window);
        info!(window = id, "Main window open");
        Ok(id)
    }

    /// Restored geometry, with defaults for anything missing or unusable
    fn initial_geometry(&self) -> WindowGeometry {
        let width = u32::try_from(self.snapshot.get_number(SnapshotKey::Width))
            .ok()
            .filter(|w| *w > 0)
            .unwrap_or(DEFAULT_WIDTH);
        let height = u32::try_from(self.snapshot.get_number(SnapshotKey::Height))
            .ok()
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_HEIGHT);
        let left = i32::try_from(self.snapshot.get_number(SnapshotKey::Left)).unwrap_or(DEFAULT_LEFT);
        let top = i32::try_from(self.snapshot.get_number(SnapshotKey::Top)).unwrap_or(DEFAULT_TOP);

        WindowGeometry {
            position: Position::new(left, top),
            dimensions: Dimensions::new(width, height),
            fullscreen: self.snapshot.get_boolean(SnapshotKey::Fullscreen),
        }
    }

    /// React to a notification from the host for window `id`
    pub fn handle_event(&mut self, id: WindowId, event: WindowEvent) -> Result<()> {
        if self.window_id() != Some(id) {
            debug!(window = id, event = ?event, "Ignoring event for unknown window");
            return Ok(());
        }

        match event {
            WindowEvent::Closed => self.close(),
            _ => {
                // Refresh the cached position while the window can still be queried
                self.current_window_state()?;
                if self.requests.send(AppEvent::SaveAppStatus { flush: false }).is_err() {
                    warn!(event = ?event, "Lifecycle no longer listening, save request dropped");
                }
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(window) = self.window.take() {
            info!(window = window.id(), "Main window closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.window.is_some()
    }

    pub fn window_id(&self) -> Option<WindowId> {
        self.window.as_ref().map(WindowResource::id)
    }

    pub fn is_visible(&self) -> Result<bool> {
        match &self.window {
            Some(window) => window.is_visible(),
            None => Ok(false),
        }
    }

    /// Live geometry of the window, or an empty state when it is closed
    ///
    /// The position is only read while the window is visible; otherwise the
    /// last position seen while visible is reported.
    pub fn current_window_state(&mut self) -> Result<WindowGeometrySnapshot> {
        let mut state = WindowGeometrySnapshot::default();
        let Some(window) = &self.window else {
            return Ok(state);
        };

        let size = window.content_size().context("Failed to read window size")?;
        if window.is_visible().context("Failed to read window visibility")? {
            self.last_position = window.position().context("Failed to read window position")?;
        }
        let fullscreen = window
            .is_full_screen()
            .context("Failed to read window fullscreen state")?;

        state.set(SnapshotKey::Width, size.width.to_string());
        state.set(SnapshotKey::Height, size.height.to_string());
        state.set(SnapshotKey::Left, self.last_position.x.to_string());
        state.set(SnapshotKey::Top, self.last_position.y.to_string());
        state.set(SnapshotKey::Fullscreen, fullscreen.to_string());
        Ok(state)
    }

    /// Copy the current geometry into the snapshot, only while visible
    ///
    /// Returns whether anything was captured.
    pub fn capture_state(&mut self) -> Result<bool> {
        if !self.is_visible()? {
            debug!("Window not visible, keeping last captured geometry");
            return Ok(false);
        }

        let state = self.current_window_state()?;
        for key in SnapshotKey::ALL {
            if let Some(value) = state.get(key) {
                self.snapshot.set(key, value);
            }
        }
        Ok(true)
    }

    /// Write the in-memory snapshot to disk
    pub fn flush_snapshot(&self) -> Result<()> {
        self.snapshot.save()
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> &SnapshotStore {
        &self.snapshot
    }
}
