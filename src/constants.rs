//! Application-wide constants
//!
//! File locations, default geometry and option names used across the shell.

/// File locations, relative to the application root
pub mod paths {
    /// Directory holding both the settings document and the window snapshot
    pub const CONF_DIR: &str = "conf";

    /// Settings document (TOML, `[settings]` table)
    pub const SETTINGS_FILE: &str = "settings.toml";

    /// Window geometry snapshot (JSON)
    pub const SNAPSHOT_FILE: &str = ".application-settings-snapshot.json";

    /// Plain-text log appended by the file layer
    pub const LOG_FILE: &str = "app-shell.log";

    /// Document loaded into the window when no `document` setting is given
    pub const DEFAULT_DOCUMENT: &str = "index.html";

    /// Per-user data directory name under the platform data dir
    pub const APP_DIR: &str = "app-shell";
}

/// Geometry used when the snapshot has no usable value
pub mod geometry {
    pub const DEFAULT_WIDTH: u32 = 800;
    pub const DEFAULT_HEIGHT: u32 = 600;
    pub const DEFAULT_LEFT: i32 = 0;
    pub const DEFAULT_TOP: i32 = 0;
}

/// Start-up argument syntax
pub mod options {
    /// Every option token starts with this prefix; the prefix alone is a separator
    pub const PREFIX: &str = "--";

    /// Splits `--name=value` tokens
    pub const VALUE_SEPARATOR: char = '=';
}

/// Setting names understood by the shell itself
///
/// Any of these may come from the settings file or from `--name` on the command line.
pub mod settings {
    pub const OPEN_DEVTOOLS: &str = "open-devtools";
    pub const STAY_RESIDENT: &str = "stay-resident";
    pub const DOCUMENT: &str = "document";

    pub const KNOWN: [&str; 3] = [OPEN_DEVTOOLS, STAY_RESIDENT, DOCUMENT];

    /// Read from the command line only, before the settings file is loaded
    pub const LOG_LEVEL_OPTION: &str = "--log-level";
}

/// X11 window properties
pub mod x11 {
    /// WM_CLASS value (instance and class, NUL separated)
    pub const WM_CLASS: &[u8] = b"app-shell\0app-shell\0";

    /// Title prefix, followed by the loaded document name
    pub const TITLE_PREFIX: &str = "app-shell";

    /// Poll interval while waiting for X11 events or signals
    pub const EVENT_POLL_INTERVAL_MS: u64 = 16;
}
