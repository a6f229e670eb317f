//! The main window: resource seam and controller

pub mod controller;

use anyhow::Result;
use std::path::Path;

use crate::types::{Dimensions, Position};

pub use controller::WindowController;

/// Host-assigned window identifier
pub type WindowId = u32;

/// Notifications a window delivers after [`WindowResource::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    Closed,
    WillResize,
    Move,
    EnterFullScreen,
    LeaveFullScreen,
}

impl WindowEvent {
    pub const ALL: [WindowEvent; 5] = [
        WindowEvent::Closed,
        WindowEvent::WillResize,
        WindowEvent::Move,
        WindowEvent::EnterFullScreen,
        WindowEvent::LeaveFullScreen,
    ];
}

/// Presentation options forwarded to the host when the window is created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowOptions {
    pub open_dev_tools: bool,
}

/// Opaque handle to a native window
pub trait WindowResource {
    fn id(&self) -> WindowId;

    /// Attach the document the window presents
    fn load_document(&mut self, document: &Path) -> Result<()>;

    /// Start delivering the given notifications for this window
    fn subscribe(&mut self, events: &[WindowEvent]) -> Result<()>;

    fn content_size(&self) -> Result<Dimensions>;

    fn position(&self) -> Result<Position>;

    fn is_full_screen(&self) -> Result<bool>;

    fn is_visible(&self) -> Result<bool>;
}
