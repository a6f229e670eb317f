//! Translation of X11 notifications into lifecycle events

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event::{self, ClientMessage, ConfigureNotify, DestroyNotify, PropertyNotify};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::events::{AppEvent, HostEvent};
use crate::types::{Dimensions, Position};
use crate::window::WindowEvent;
use crate::x11_utils::{has_fullscreen_state, root_position, CachedAtoms};

/// Last geometry reported for the main window, used to tell moves from resizes
#[derive(Debug, Clone, Copy)]
pub struct TrackedWindow {
    pub id: Window,
    pub root: Window,
    pub position: Position,
    pub dimensions: Dimensions,
    pub fullscreen: bool,
}

pub fn handle_event(
    conn: &RustConnection,
    atoms: &CachedAtoms,
    tracked: &mut Option<TrackedWindow>,
    event: Event,
) -> Result<Vec<AppEvent>> {
    let mut events = Vec::new();
    let Some(window) = tracked.as_mut() else {
        return Ok(events);
    };

    match event {
        ConfigureNotify(event) if event.window == window.id => {
            let dimensions = Dimensions::new(event.width.into(), event.height.into());
            let position = root_position(conn, window.id, window.root)
                .inspect_err(|e| warn!(window = window.id, error = ?e, "Failed to read window position, keeping last known"))
                .unwrap_or(window.position);

            if dimensions != window.dimensions {
                debug!(window = window.id, ?dimensions, "Window resized");
                window.dimensions = dimensions;
                events.push(AppEvent::Window { id: window.id, event: WindowEvent::WillResize });
            }
            if position != window.position {
                debug!(window = window.id, ?position, "Window moved");
                window.position = position;
                events.push(AppEvent::Window { id: window.id, event: WindowEvent::Move });
            }
        }
        PropertyNotify(event) if event.window == window.id && event.atom == atoms.net_wm_state => {
            let fullscreen = has_fullscreen_state(conn, window.id, atoms)?;
            if fullscreen != window.fullscreen {
                window.fullscreen = fullscreen;
                let change = if fullscreen {
                    WindowEvent::EnterFullScreen
                } else {
                    WindowEvent::LeaveFullScreen
                };
                debug!(window = window.id, ?change, "Fullscreen state changed");
                events.push(AppEvent::Window { id: window.id, event: change });
            }
        }
        ClientMessage(event)
            if event.window == window.id
                && event.type_ == atoms.wm_protocols
                && event.data.as_data32()[0] == atoms.wm_delete_window =>
        {
            info!(window = window.id, "Close requested by window manager");
            conn.destroy_window(window.id)
                .context(format!("Failed to destroy window {}", window.id))?;
            conn.flush().context("Failed to flush X11 connection after destroying window")?;
        }
        DestroyNotify(event) if event.window == window.id => {
            let id = window.id;
            *tracked = None;
            events.push(AppEvent::Window { id, event: WindowEvent::Closed });
            // Single window: its destruction closes the last one
            events.push(AppEvent::Host(HostEvent::WindowAllClosed));
        }
        _ => {}
    }

    Ok(events)
}
