//! File locations derived from the application root

use std::path::{Path, PathBuf};

use crate::constants::paths::*;

/// Every file the shell reads or writes, resolved once at start-up
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub settings: PathBuf,
    pub snapshot: PathBuf,
    pub log: PathBuf,
    /// Per-user data directory; reported, not written to
    pub user_data: PathBuf,
}

impl AppPaths {
    /// Lay out the fixed relative paths under `root`
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let conf = root.join(CONF_DIR);
        let mut user_data = dirs::data_dir().unwrap_or_else(|| root.clone());
        user_data.push(APP_DIR);

        Self {
            settings: conf.join(SETTINGS_FILE),
            snapshot: conf.join(SNAPSHOT_FILE),
            log: root.join(LOG_FILE),
            user_data,
            root,
        }
    }

    /// Paths relative to the current working directory
    pub fn from_current_dir() -> Self {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_root(root)
    }

    /// Resolve the document to load; relative names are taken from the root
    pub fn document(&self, name: Option<&str>) -> PathBuf {
        let name = name.filter(|n| !n.is_empty()).unwrap_or(DEFAULT_DOCUMENT);
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
