//! X11 host runtime
//!
//! Creates the main window as a plain top-level X11 window and turns the
//! connection's notifications, plus process signals, into lifecycle events.
//! Nothing is drawn; the document only names the window.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::properties::{WmSizeHints, WmSizeHintsSpecification};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperExt;

use crate::constants::x11::{EVENT_POLL_INTERVAL_MS, TITLE_PREFIX, WM_CLASS};
use crate::event_handler::{handle_event, TrackedWindow};
use crate::events::{AppEvent, HostEvent};
use crate::host::HostRuntime;
use crate::signals::SignalFlags;
use crate::types::{Dimensions, Position, WindowGeometry};
use crate::window::{WindowEvent, WindowId, WindowOptions, WindowResource};
use crate::x11_utils::{
    clamp_coordinate, clamp_extent, has_fullscreen_state, is_viewable, root_position, window_size,
    CachedAtoms,
};

/// Handle to the main X11 window
pub struct X11Window {
    conn: Rc<RustConnection>,
    atoms: Rc<CachedAtoms>,
    root: Window,
    id: Window,
}

impl WindowResource for X11Window {
    fn id(&self) -> WindowId {
        self.id
    }

    fn load_document(&mut self, document: &Path) -> Result<()> {
        let name = document
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| document.display().to_string());
        let title = format!("{TITLE_PREFIX} - {name}");

        self.conn
            .change_property8(PropMode::REPLACE, self.id, AtomEnum::WM_NAME, AtomEnum::STRING, title.as_bytes())
            .context(format!("Failed to set WM_NAME for window {}", self.id))?;
        self.conn
            .change_property8(
                PropMode::REPLACE,
                self.id,
                self.atoms.net_wm_name,
                self.atoms.utf8_string,
                title.as_bytes(),
            )
            .context(format!("Failed to set _NET_WM_NAME for window {}", self.id))?;
        self.conn.flush().context("Failed to flush X11 connection after setting title")?;
        info!(window = self.id, document = %document.display(), "Document attached");
        Ok(())
    }

    fn subscribe(&mut self, events: &[WindowEvent]) -> Result<()> {
        let mut mask = EventMask::NO_EVENT;
        for event in events {
            mask = mask
                | match event {
                    WindowEvent::Closed | WindowEvent::WillResize | WindowEvent::Move => {
                        EventMask::STRUCTURE_NOTIFY
                    }
                    WindowEvent::EnterFullScreen | WindowEvent::LeaveFullScreen => {
                        EventMask::PROPERTY_CHANGE
                    }
                };
        }
        self.conn
            .change_window_attributes(self.id, &ChangeWindowAttributesAux::new().event_mask(mask))
            .context(format!("Failed to select events for window {}", self.id))?;

        if events.contains(&WindowEvent::Closed) {
            // Let the window manager ask us to close instead of killing the client
            self.conn
                .change_property32(
                    PropMode::REPLACE,
                    self.id,
                    self.atoms.wm_protocols,
                    AtomEnum::ATOM,
                    &[self.atoms.wm_delete_window],
                )
                .context(format!("Failed to set WM_PROTOCOLS for window {}", self.id))?;
        }
        self.conn.flush().context("Failed to flush X11 connection after subscribing")?;
        debug!(window = self.id, ?events, "Subscribed to window notifications");
        Ok(())
    }

    fn content_size(&self) -> Result<Dimensions> {
        window_size(&self.conn, self.id)
    }

    fn position(&self) -> Result<Position> {
        root_position(&self.conn, self.id, self.root)
    }

    fn is_full_screen(&self) -> Result<bool> {
        has_fullscreen_state(&self.conn, self.id, &self.atoms)
    }

    fn is_visible(&self) -> Result<bool> {
        is_viewable(&self.conn, self.id)
    }
}

pub struct X11Host {
    conn: Rc<RustConnection>,
    atoms: Rc<CachedAtoms>,
    screen_num: usize,
    tracked: Option<TrackedWindow>,
    pending: VecDeque<AppEvent>,
    signals: SignalFlags,
    quit_requested: bool,
    will_quit_sent: bool,
}

impl X11Host {
    /// Connect to the display named by `DISPLAY`; the first event delivered is `Ready`
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X11 display")?;
        {
            let screen = &conn.setup().roots[screen_num];
            info!(
                "successfully connected to x11: screen={screen_num}, dimensions={}x{}",
                screen.width_in_pixels, screen.height_in_pixels
            );
        }
        let atoms = CachedAtoms::new(&conn)?;
        let signals = SignalFlags::register()?;

        Ok(Self {
            conn: Rc::new(conn),
            atoms: Rc::new(atoms),
            screen_num,
            tracked: None,
            pending: VecDeque::from([AppEvent::Host(HostEvent::Ready)]),
            signals,
            quit_requested: false,
            will_quit_sent: false,
        })
    }
}

/// Normal hints that place the client area at `position`
///
/// Saved positions are client origins (see `root_position`), so gravity is
/// static: the window manager moves the frame around the client instead of
/// putting the frame's corner at the requested point. Placement is honored
/// only for user-specified hints.
fn placement_hints(position: Position, width: u16, height: u16) -> WmSizeHints {
    WmSizeHints {
        position: Some((WmSizeHintsSpecification::UserSpecified, position.x, position.y)),
        size: Some((WmSizeHintsSpecification::UserSpecified, width.into(), height.into())),
        win_gravity: Some(Gravity::STATIC),
        ..WmSizeHints::default()
    }
}

impl HostRuntime for X11Host {
    type Window = X11Window;

    fn create_window(&mut self, geometry: &WindowGeometry, options: &WindowOptions) -> Result<X11Window> {
        if options.open_dev_tools {
            warn!("Developer tools requested, but the X11 host has none; ignoring");
        }

        let screen = &self.conn.setup().roots[self.screen_num];
        let (root, root_depth, root_visual, white_pixel) =
            (screen.root, screen.root_depth, screen.root_visual, screen.white_pixel);

        let id = self.conn.generate_id().context("Failed to generate X11 window ID")?;
        let width = clamp_extent(geometry.dimensions.width);
        let height = clamp_extent(geometry.dimensions.height);
        self.conn
            .create_window(
                root_depth,
                id,
                root,
                clamp_coordinate(geometry.position.x),
                clamp_coordinate(geometry.position.y),
                width,
                height,
                0,
                WindowClass::INPUT_OUTPUT,
                root_visual,
                &CreateWindowAux::new()
                    .background_pixel(white_pixel)
                    .event_mask(EventMask::STRUCTURE_NOTIFY),
            )
            .context("Failed to create main window")?;

        self.conn
            .change_property8(PropMode::REPLACE, id, AtomEnum::WM_CLASS, AtomEnum::STRING, WM_CLASS)
            .context("Failed to set WM_CLASS for main window")?;

        placement_hints(geometry.position, width, height)
            .set_normal_hints(&*self.conn, id)
            .context("Failed to set WM_NORMAL_HINTS for main window")?;

        if geometry.fullscreen {
            self.conn
                .change_property32(
                    PropMode::REPLACE,
                    id,
                    self.atoms.net_wm_state,
                    AtomEnum::ATOM,
                    &[self.atoms.net_wm_state_fullscreen],
                )
                .context("Failed to request fullscreen for main window")?;
        }

        self.conn.map_window(id).context("Failed to map main window")?;
        self.conn.flush().context("Failed to flush X11 connection after creating window")?;
        info!(window = id, ?geometry, "Mapped main window");

        self.tracked = Some(TrackedWindow {
            id,
            root,
            position: geometry.position,
            dimensions: Dimensions::new(width.into(), height.into()),
            fullscreen: geometry.fullscreen,
        });

        Ok(X11Window {
            conn: Rc::clone(&self.conn),
            atoms: Rc::clone(&self.atoms),
            root,
            id,
        })
    }

    fn next_event(&mut self) -> Result<Option<AppEvent>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }

            if self.quit_requested {
                if self.will_quit_sent {
                    return Ok(None);
                }
                self.will_quit_sent = true;
                return Ok(Some(AppEvent::Host(HostEvent::WillQuit)));
            }

            if self.signals.take_quit() {
                info!("Termination signal received");
                return Ok(Some(AppEvent::QuitRequested));
            }
            if self.signals.take_activate() {
                info!("Activation signal received");
                return Ok(Some(AppEvent::Host(HostEvent::Activate)));
            }

            match self.conn.poll_for_event().context("Failed to poll X11 connection")? {
                Some(event) => {
                    let translated = handle_event(&self.conn, &self.atoms, &mut self.tracked, event)?;
                    self.pending.extend(translated);
                }
                None => std::thread::sleep(Duration::from_millis(EVENT_POLL_INTERVAL_MS)),
            }
        }
    }

    fn quit(&mut self) -> Result<()> {
        info!("Host termination requested");
        self.quit_requested = true;
        self.conn.flush().context("Failed to flush X11 connection before quitting")?;
        Ok(())
    }
}
