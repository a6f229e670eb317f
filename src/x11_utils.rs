use anyhow::{Context, Result};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::types::{Dimensions, Position};

/// Pre-cached X11 atoms to avoid repeated roundtrips
#[derive(Debug)]
pub struct CachedAtoms {
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
    pub net_wm_name: Atom,
    pub utf8_string: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_fullscreen: Atom,
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        // Do all intern_atom roundtrips once at startup
        Ok(Self {
            wm_protocols: intern(conn, b"WM_PROTOCOLS")?,
            wm_delete_window: intern(conn, b"WM_DELETE_WINDOW")?,
            net_wm_name: intern(conn, b"_NET_WM_NAME")?,
            utf8_string: intern(conn, b"UTF8_STRING")?,
            net_wm_state: intern(conn, b"_NET_WM_STATE")?,
            net_wm_state_fullscreen: intern(conn, b"_NET_WM_STATE_FULLSCREEN")?,
        })
    }
}

fn intern(conn: &RustConnection, name: &[u8]) -> Result<Atom> {
    let label = String::from_utf8_lossy(name);
    Ok(conn
        .intern_atom(false, name)
        .context(format!("Failed to intern {label} atom"))?
        .reply()
        .context(format!("Failed to get reply for {label} atom"))?
        .atom)
}

/// Window origin in root coordinates (independent of WM reparenting)
pub fn root_position(conn: &RustConnection, window: Window, root: Window) -> Result<Position> {
    let reply = conn
        .translate_coordinates(window, root, 0, 0)
        .context(format!("Failed to translate coordinates for window {}", window))?
        .reply()
        .context(format!("Failed to get translated coordinates for window {}", window))?;
    Ok(Position::new(reply.dst_x.into(), reply.dst_y.into()))
}

pub fn window_size(conn: &RustConnection, window: Window) -> Result<Dimensions> {
    let reply = conn
        .get_geometry(window)
        .context(format!("Failed to query geometry for window {}", window))?
        .reply()
        .context(format!("Failed to get geometry reply for window {}", window))?;
    Ok(Dimensions::new(reply.width.into(), reply.height.into()))
}

pub fn is_viewable(conn: &RustConnection, window: Window) -> Result<bool> {
    let reply = conn
        .get_window_attributes(window)
        .context(format!("Failed to query attributes for window {}", window))?
        .reply()
        .context(format!("Failed to get attributes reply for window {}", window))?;
    Ok(reply.map_state == MapState::VIEWABLE)
}

/// Whether `_NET_WM_STATE` lists `_NET_WM_STATE_FULLSCREEN`
pub fn has_fullscreen_state(conn: &RustConnection, window: Window, atoms: &CachedAtoms) -> Result<bool> {
    let reply = conn
        .get_property(false, window, atoms.net_wm_state, AtomEnum::ATOM, 0, 1024)
        .context(format!("Failed to query _NET_WM_STATE for window {}", window))?
        .reply()
        .context(format!("Failed to get _NET_WM_STATE reply for window {}", window))?;
    Ok(reply
        .value32()
        .map(|mut atoms_iter| atoms_iter.any(|atom| atom == atoms.net_wm_state_fullscreen))
        .unwrap_or(false))
}

pub fn clamp_coordinate(value: i32) -> i16 {
    value.clamp(i16::MIN.into(), i16::MAX.into()) as i16
}

/// X11 sizes are 16-bit and must be non-zero
pub fn clamp_extent(value: u32) -> u16 {
    value.clamp(1, u16::MAX.into()) as u16
}
