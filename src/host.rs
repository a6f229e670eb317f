//! Host runtime seam
//!
//! The lifecycle drives any host that can create the main window, deliver
//! events in order and terminate on request.

use anyhow::Result;

use crate::events::AppEvent;
use crate::types::WindowGeometry;
use crate::window::{WindowOptions, WindowResource};

pub trait HostRuntime {
    type Window: WindowResource;

    /// Create and show a window with the given geometry
    fn create_window(
        &mut self,
        geometry: &WindowGeometry,
        options: &WindowOptions,
    ) -> Result<Self::Window>;

    /// Block until the next event; `None` once the host has nothing more to deliver
    fn next_event(&mut self) -> Result<Option<AppEvent>>;

    /// Ask the host to terminate. The host answers with [`crate::events::HostEvent::WillQuit`].
    fn quit(&mut self) -> Result<()>;
}
