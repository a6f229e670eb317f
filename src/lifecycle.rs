//! Application lifecycle
//!
//! Host events drive the state machine below. The lifecycle owns the host
//! and the window controller, and is the only place that writes the window
//! snapshot to disk.
//!
//! ```text
//! Uninitialized --Ready--> Ready --Activate--> Running
//!        Ready/Running --WindowAllClosed / quit()--> Quitting --WillQuit--> Terminated
//! ```

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use tracing::{debug, error, info, warn};

use crate::events::{AppEvent, HostEvent};
use crate::host::HostRuntime;
use crate::persistence::SnapshotStore;
use crate::window::{WindowController, WindowOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Ready,
    Running,
    Quitting,
    Terminated,
}

/// What closing the last window means on this platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformConvention {
    /// The process stays alive without windows until explicitly quit (macOS)
    StayResident,
    /// Closing the last window quits the application
    QuitOnLastClose,
}

impl PlatformConvention {
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            PlatformConvention::StayResident
        } else {
            PlatformConvention::QuitOnLastClose
        }
    }
}

pub struct AppLifecycle<H: HostRuntime> {
    host: H,
    window: WindowController<H::Window>,
    requests: Receiver<AppEvent>,
    state: LifecycleState,
    convention: PlatformConvention,
}

impl<H: HostRuntime> AppLifecycle<H> {
    pub fn new(
        host: H,
        snapshot: SnapshotStore,
        document: PathBuf,
        options: WindowOptions,
        convention: PlatformConvention,
    ) -> Self {
        let (requests_tx, requests) = mpsc::channel();
        Self {
            host,
            window: WindowController::new(snapshot, document, options, requests_tx),
            requests,
            state: LifecycleState::Uninitialized,
            convention,
        }
    }

    /// Dispatch host events until the lifecycle terminates or the host runs dry
    pub fn run(&mut self) -> Result<()> {
        info!(convention = ?self.convention, "Application lifecycle started");
        while self.state != LifecycleState::Terminated {
            let Some(event) = self.host.next_event().context("Failed to receive host event")? else {
                warn!(state = ?self.state, "Host event stream ended before termination");
                break;
            };
            self.dispatch(event)?;
        }
        info!(state = ?self.state, "Application lifecycle finished");
        Ok(())
    }

    /// Handle one event to completion, including the save requests it queued
    pub fn dispatch(&mut self, event: AppEvent) -> Result<()> {
        self.handle(event)?;
        while let Ok(request) = self.requests.try_recv() {
            self.handle(request)?;
        }
        Ok(())
    }

    fn handle(&mut self, event: AppEvent) -> Result<()> {
        if self.state == LifecycleState::Terminated {
            debug!(event = ?event, "Lifecycle terminated, ignoring event");
            return Ok(());
        }

        match event {
            AppEvent::Host(HostEvent::Ready) => self.on_ready(),
            AppEvent::Host(HostEvent::Activate) => self.on_activate(),
            AppEvent::Host(HostEvent::WindowAllClosed) => self.on_window_all_closed(),
            AppEvent::Host(HostEvent::WillQuit) => self.on_will_quit(),
            AppEvent::Window { id, event } => self.window.handle_event(id, event),
            AppEvent::SaveAppStatus { flush } => self.save_app_status(flush),
            AppEvent::QuitRequested => match self.state {
                LifecycleState::Ready | LifecycleState::Running => self.quit(),
                _ => {
                    debug!(state = ?self.state, "Quit request ignored");
                    Ok(())
                }
            },
        }
    }

    fn on_ready(&mut self) -> Result<()> {
        debug!("<ready>");
        if self.state != LifecycleState::Uninitialized {
            warn!(state = ?self.state, "Duplicate ready signal ignored");
            return Ok(());
        }
        self.window.create_window(&mut self.host)?;
        self.state = LifecycleState::Ready;
        Ok(())
    }

    fn on_activate(&mut self) -> Result<()> {
        debug!("<activate>");
        match self.state {
            LifecycleState::Ready | LifecycleState::Running => {
                if !self.window.is_open() {
                    self.window.create_window(&mut self.host)?;
                }
                self.state = LifecycleState::Running;
            }
            state => debug!(state = ?state, "Activation ignored"),
        }
        Ok(())
    }

    fn on_window_all_closed(&mut self) -> Result<()> {
        debug!("<window-all-closed>");
        match (self.state, self.convention) {
            (LifecycleState::Ready | LifecycleState::Running, PlatformConvention::StayResident) => {
                info!("All windows closed, staying resident");
                Ok(())
            }
            (LifecycleState::Ready | LifecycleState::Running, PlatformConvention::QuitOnLastClose) => {
                self.quit()
            }
            (state, _) => {
                debug!(state = ?state, "All-windows-closed ignored");
                Ok(())
            }
        }
    }

    fn on_will_quit(&mut self) -> Result<()> {
        debug!("<will-quit>");
        if matches!(self.state, LifecycleState::Ready | LifecycleState::Running) {
            warn!(state = ?self.state, "Host terminating without a quit request, saving state");
            if let Err(e) = self.save_app_status(true) {
                error!(error = %format!("{e:#}"), "Failed to save window state before termination");
            }
        }
        self.state = LifecycleState::Terminated;
        Ok(())
    }

    /// Record the window geometry; with `flush`, also write it to disk
    ///
    /// Geometry is captured only while the window is visible so a minimized
    /// or hidden window never overwrites the last good position.
    pub fn save_app_status(&mut self, flush: bool) -> Result<()> {
        self.window.capture_state()?;
        if flush {
            self.window
                .flush_snapshot()
                .context("Failed to persist window state")?;
        }
        Ok(())
    }

    /// Persist the final window state, then ask the host to terminate
    pub fn quit(&mut self) -> Result<()> {
        info!("<quit>");
        if matches!(self.state, LifecycleState::Quitting | LifecycleState::Terminated) {
            debug!(state = ?self.state, "Already quitting");
            return Ok(());
        }
        self.save_app_status(true)?;
        self.host.quit().context("Failed to request host termination")?;
        self.state = LifecycleState::Quitting;
        Ok(())
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[cfg(test)]
    pub fn window(&self) -> &WindowController<H::Window> {
        &self.window
    }

    #[cfg(test)]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[cfg(test)]
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::SnapshotKey;
    use crate::testing::MockHost;
    use crate::types::{Dimensions, Position};
    use crate::window::WindowEvent;
    use std::fs;
    use tempfile::TempDir;

    fn lifecycle_with(
        dir: &TempDir,
        host: MockHost,
        convention: PlatformConvention,
    ) -> AppLifecycle<MockHost> {
        AppLifecycle::new(
            host,
            SnapshotStore::load(snapshot_path(dir)),
            dir.path().join("index.html"),
            WindowOptions::default(),
            convention,
        )
    }

    fn snapshot_path(dir: &TempDir) -> PathBuf {
        dir.path().join("conf").join("snapshot.json")
    }

    fn ready(dir: &TempDir, convention: PlatformConvention) -> AppLifecycle<MockHost> {
        let mut lifecycle = lifecycle_with(dir, MockHost::new(), convention);
        lifecycle.dispatch(AppEvent::Host(HostEvent::Ready)).unwrap();
        lifecycle
    }

    #[test]
    fn test_ready_creates_window() {
        let dir = TempDir::new().unwrap();
        let lifecycle = ready(&dir, PlatformConvention::QuitOnLastClose);

        assert_eq!(lifecycle.state(), LifecycleState::Ready);
        assert!(lifecycle.window().is_open());
        assert_eq!(lifecycle.host().create_count(), 1);
    }

    #[test]
    fn test_duplicate_ready_ignored() {
        let dir = TempDir::new().unwrap();
        let mut lifecycle = ready(&dir, PlatformConvention::QuitOnLastClose);

        lifecycle.dispatch(AppEvent::Host(HostEvent::Ready)).unwrap();
        assert_eq!(lifecycle.host().create_count(), 1);
    }

    #[test]
    fn test_activate_reuses_open_window() {
        let dir = TempDir::new().unwrap();
        let mut lifecycle = ready(&dir, PlatformConvention::StayResident);

        lifecycle.dispatch(AppEvent::Host(HostEvent::Activate)).unwrap();
        lifecycle.dispatch(AppEvent::Host(HostEvent::Activate)).unwrap();

        assert_eq!(lifecycle.state(), LifecycleState::Running);
        assert_eq!(lifecycle.host().create_count(), 1);
    }

    #[test]
    fn test_activate_before_ready_ignored() {
        let dir = TempDir::new().unwrap();
        let mut lifecycle = lifecycle_with(&dir, MockHost::new(), PlatformConvention::StayResident);

        lifecycle.dispatch(AppEvent::Host(HostEvent::Activate)).unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Uninitialized);
        assert_eq!(lifecycle.host().create_count(), 0);
    }

    #[test]
    fn test_stay_resident_keeps_running_and_reopens() {
        let dir = TempDir::new().unwrap();
        let mut lifecycle = ready(&dir, PlatformConvention::StayResident);
        lifecycle.dispatch(AppEvent::Host(HostEvent::Activate)).unwrap();
        let id = lifecycle.window().window_id().unwrap();

        lifecycle.dispatch(AppEvent::Window { id, event: WindowEvent::Closed }).unwrap();
        lifecycle.dispatch(AppEvent::Host(HostEvent::WindowAllClosed)).unwrap();

        assert_eq!(lifecycle.state(), LifecycleState::Running);
        assert!(!lifecycle.host().calls().iter().any(|c| c.starts_with("quit")));

        lifecycle.dispatch(AppEvent::Host(HostEvent::Activate)).unwrap();
        assert!(lifecycle.window().is_open());
        assert_eq!(lifecycle.host().create_count(), 2);
    }

    #[test]
    fn test_last_close_quits_elsewhere() {
        let dir = TempDir::new().unwrap();
        let mut lifecycle = ready(&dir, PlatformConvention::QuitOnLastClose);
        lifecycle.dispatch(AppEvent::Host(HostEvent::Activate)).unwrap();
        let id = lifecycle.window().window_id().unwrap();

        lifecycle.dispatch(AppEvent::Window { id, event: WindowEvent::Closed }).unwrap();
        lifecycle.dispatch(AppEvent::Host(HostEvent::WindowAllClosed)).unwrap();

        assert_eq!(lifecycle.state(), LifecycleState::Quitting);
        assert_eq!(lifecycle.host().calls().last().map(String::as_str), Some("quit"));
    }

    #[test]
    fn test_quit_persists_before_terminating() {
        let dir = TempDir::new().unwrap();
        let mut host = MockHost::new();
        host.snapshot_probe = Some(snapshot_path(&dir));
        let mut lifecycle = lifecycle_with(&dir, host, PlatformConvention::QuitOnLastClose);
        lifecycle.dispatch(AppEvent::Host(HostEvent::Ready)).unwrap();
        lifecycle.host().last_window().borrow_mut().size = Dimensions::new(1024, 700);

        lifecycle.quit().unwrap();

        assert_eq!(
            lifecycle.host().calls(),
            vec!["create(101)".to_string(), "quit(snapshot_on_disk=true)".to_string()]
        );
        let saved = SnapshotStore::load(snapshot_path(&dir));
        assert_eq!(saved.get(SnapshotKey::Width), Some("1024"));
        assert_eq!(saved.get(SnapshotKey::Height), Some("700"));

        lifecycle.dispatch(AppEvent::Host(HostEvent::WillQuit)).unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Terminated);
    }

    #[test]
    fn test_quit_persist_failure_skips_termination() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("conf"), "blocks the snapshot directory").unwrap();
        let mut lifecycle = ready(&dir, PlatformConvention::QuitOnLastClose);

        assert!(lifecycle.quit().is_err());
        assert!(!lifecycle.host().calls().iter().any(|c| c.starts_with("quit")));
        assert_eq!(lifecycle.state(), LifecycleState::Ready);
    }

    #[test]
    fn test_geometry_changes_stay_in_memory_until_quit() {
        let dir = TempDir::new().unwrap();
        let mut lifecycle = ready(&dir, PlatformConvention::QuitOnLastClose);
        let id = lifecycle.window().window_id().unwrap();
        let window = lifecycle.host().last_window();

        window.borrow_mut().position = Position::new(300, 200);
        lifecycle.dispatch(AppEvent::Window { id, event: WindowEvent::Move }).unwrap();
        window.borrow_mut().size = Dimensions::new(1440, 900);
        lifecycle.dispatch(AppEvent::Window { id, event: WindowEvent::WillResize }).unwrap();

        let snapshot = lifecycle.window().snapshot();
        assert_eq!(snapshot.get(SnapshotKey::Left), Some("300"));
        assert_eq!(snapshot.get(SnapshotKey::Width), Some("1440"));
        assert!(!snapshot_path(&dir).exists());

        lifecycle.dispatch(AppEvent::QuitRequested).unwrap();
        assert_eq!(SnapshotStore::load(snapshot_path(&dir)).get(SnapshotKey::Left), Some("300"));
    }

    #[test]
    fn test_save_while_hidden_keeps_position() {
        let dir = TempDir::new().unwrap();
        let mut lifecycle = ready(&dir, PlatformConvention::QuitOnLastClose);
        let window = lifecycle.host().last_window();

        window.borrow_mut().position = Position::new(42, 24);
        lifecycle.save_app_status(false).unwrap();

        {
            let mut w = window.borrow_mut();
            w.visible = false;
            w.position = Position::new(-32000, -32000);
        }
        lifecycle.save_app_status(false).unwrap();

        let snapshot = lifecycle.window().snapshot();
        assert_eq!(snapshot.get(SnapshotKey::Left), Some("42"));
        assert_eq!(snapshot.get(SnapshotKey::Top), Some("24"));
    }

    #[test]
    fn test_closed_window_state_survives_quit() {
        let dir = TempDir::new().unwrap();
        let mut lifecycle = ready(&dir, PlatformConvention::QuitOnLastClose);
        let id = lifecycle.window().window_id().unwrap();
        lifecycle.host().last_window().borrow_mut().size = Dimensions::new(640, 480);
        lifecycle.dispatch(AppEvent::Window { id, event: WindowEvent::WillResize }).unwrap();

        lifecycle.dispatch(AppEvent::Window { id, event: WindowEvent::Closed }).unwrap();
        lifecycle.dispatch(AppEvent::Host(HostEvent::WindowAllClosed)).unwrap();

        let saved = SnapshotStore::load(snapshot_path(&dir));
        assert_eq!(saved.get(SnapshotKey::Width), Some("640"));
    }

    #[test]
    fn test_terminated_ignores_further_events() {
        let dir = TempDir::new().unwrap();
        let mut lifecycle = ready(&dir, PlatformConvention::QuitOnLastClose);
        lifecycle.quit().unwrap();
        lifecycle.dispatch(AppEvent::Host(HostEvent::WillQuit)).unwrap();

        lifecycle.dispatch(AppEvent::Host(HostEvent::Activate)).unwrap();
        lifecycle.dispatch(AppEvent::QuitRequested).unwrap();

        assert_eq!(lifecycle.state(), LifecycleState::Terminated);
        assert_eq!(lifecycle.host().calls().iter().filter(|c| c.starts_with("quit")).count(), 1);
    }

    #[test]
    fn test_unrequested_will_quit_saves_state() {
        let dir = TempDir::new().unwrap();
        let mut lifecycle = ready(&dir, PlatformConvention::QuitOnLastClose);

        lifecycle.dispatch(AppEvent::Host(HostEvent::WillQuit)).unwrap();

        assert_eq!(lifecycle.state(), LifecycleState::Terminated);
        assert!(snapshot_path(&dir).exists());
    }

    #[test]
    fn test_run_drives_host_events_to_termination() {
        let dir = TempDir::new().unwrap();
        let host = MockHost::with_events([
            AppEvent::Host(HostEvent::Ready),
            AppEvent::Window { id: 101, event: WindowEvent::Move },
            AppEvent::Window { id: 101, event: WindowEvent::Closed },
            AppEvent::Host(HostEvent::WindowAllClosed),
            AppEvent::Host(HostEvent::WillQuit),
            AppEvent::Host(HostEvent::Activate),
        ]);
        let mut lifecycle = lifecycle_with(&dir, host, PlatformConvention::QuitOnLastClose);

        lifecycle.run().unwrap();

        assert_eq!(lifecycle.state(), LifecycleState::Terminated);
        assert!(snapshot_path(&dir).exists());
        // The trailing activation is never pulled from the host
        assert_eq!(lifecycle.host_mut().events.len(), 1);
    }

    #[test]
    fn test_run_stops_when_host_runs_dry() {
        let dir = TempDir::new().unwrap();
        let host = MockHost::with_events([AppEvent::Host(HostEvent::Ready)]);
        let mut lifecycle = lifecycle_with(&dir, host, PlatformConvention::QuitOnLastClose);

        lifecycle.run().unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Ready);
    }
}
