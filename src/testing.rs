//! Recording host and window used by controller and lifecycle tests

use anyhow::{Result, bail};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::events::AppEvent;
use crate::host::HostRuntime;
use crate::types::{Dimensions, Position, WindowGeometry};
use crate::window::{WindowEvent, WindowId, WindowOptions, WindowResource};

#[derive(Debug)]
pub struct MockWindowState {
    pub id: WindowId,
    pub size: Dimensions,
    pub position: Position,
    pub fullscreen: bool,
    pub visible: bool,
    pub document: Option<PathBuf>,
    pub subscribed: Vec<WindowEvent>,
}

pub type SharedWindow = Rc<RefCell<MockWindowState>>;

pub type CallLog = Rc<RefCell<Vec<String>>>;

pub struct MockWindow {
    state: SharedWindow,
}

impl WindowResource for MockWindow {
    fn id(&self) -> WindowId {
        self.state.borrow().id
    }

    fn load_document(&mut self, document: &Path) -> Result<()> {
        self.state.borrow_mut().document = Some(document.to_path_buf());
        Ok(())
    }

    fn subscribe(&mut self, events: &[WindowEvent]) -> Result<()> {
        self.state.borrow_mut().subscribed.extend_from_slice(events);
        Ok(())
    }

    fn content_size(&self) -> Result<Dimensions> {
        Ok(self.state.borrow().size)
    }

    fn position(&self) -> Result<Position> {
        Ok(self.state.borrow().position)
    }

    fn is_full_screen(&self) -> Result<bool> {
        Ok(self.state.borrow().fullscreen)
    }

    fn is_visible(&self) -> Result<bool> {
        Ok(self.state.borrow().visible)
    }
}

/// Host that replays queued events and records every call it receives
#[derive(Default)]
pub struct MockHost {
    pub calls: CallLog,
    pub windows: Vec<SharedWindow>,
    pub created_with: Vec<(WindowGeometry, WindowOptions)>,
    pub events: VecDeque<AppEvent>,
    /// When set, `quit` records whether this file exists at that moment
    pub snapshot_probe: Option<PathBuf>,
    pub fail_create: bool,
    next_id: WindowId,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            next_id: 100,
            ..Self::default()
        }
    }

    pub fn with_events(events: impl IntoIterator<Item = AppEvent>) -> Self {
        let mut host = Self::new();
        host.events.extend(events);
        host
    }

    pub fn last_window(&self) -> SharedWindow {
        Rc::clone(self.windows.last().expect("no window created"))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn create_count(&self) -> usize {
        self.created_with.len()
    }
}

impl HostRuntime for MockHost {
    type Window = MockWindow;

    fn create_window(
        &mut self,
        geometry: &WindowGeometry,
        options: &WindowOptions,
    ) -> Result<MockWindow> {
        if self.fail_create {
            bail!("window creation refused");
        }
        self.next_id += 1;
        self.calls.borrow_mut().push(format!("create({})", self.next_id));
        self.created_with.push((*geometry, *options));

        let state = Rc::new(RefCell::new(MockWindowState {
            id: self.next_id,
            size: geometry.dimensions,
            position: geometry.position,
            fullscreen: geometry.fullscreen,
            visible: true,
            document: None,
            subscribed: Vec::new(),
        }));
        self.windows.push(Rc::clone(&state));
        Ok(MockWindow { state })
    }

    fn next_event(&mut self) -> Result<Option<AppEvent>> {
        Ok(self.events.pop_front())
    }

    fn quit(&mut self) -> Result<()> {
        let entry = match &self.snapshot_probe {
            Some(path) => format!("quit(snapshot_on_disk={})", path.exists()),
            None => "quit".to_string(),
        };
        self.calls.borrow_mut().push(entry);
        Ok(())
    }
}
