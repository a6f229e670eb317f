//! Window geometry snapshot
//!
//! The last known geometry of the main window, restored at start-up and
//! written back when the application quits. Values are kept as text and
//! converted on read; a missing or malformed value reads as `0` / `false`.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Case-insensitive `"true"` or `"1"`
pub fn is_truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

/// The closed set of snapshot keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKey {
    Width,
    Height,
    Left,
    Top,
    Fullscreen,
}

impl SnapshotKey {
    pub const ALL: [SnapshotKey; 5] = [
        SnapshotKey::Width,
        SnapshotKey::Height,
        SnapshotKey::Left,
        SnapshotKey::Top,
        SnapshotKey::Fullscreen,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SnapshotKey::Width => "width",
            SnapshotKey::Height => "height",
            SnapshotKey::Left => "left",
            SnapshotKey::Top => "top",
            SnapshotKey::Fullscreen => "fullscreen",
        }
    }

    /// Text written for a key that was never set
    fn default_text(self) -> &'static str {
        match self {
            SnapshotKey::Fullscreen => "false",
            _ => "0",
        }
    }
}

/// Geometry record, one optional text value per key
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WindowGeometrySnapshot {
    #[serde(deserialize_with = "deserialize_scalar")]
    width: Option<String>,
    #[serde(deserialize_with = "deserialize_scalar")]
    height: Option<String>,
    #[serde(deserialize_with = "deserialize_scalar")]
    left: Option<String>,
    #[serde(deserialize_with = "deserialize_scalar")]
    top: Option<String>,
    #[serde(deserialize_with = "deserialize_scalar")]
    fullscreen: Option<String>,
}

/// Accepts strings, numbers and booleans, keeping their text form
fn deserialize_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(s) => s,
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

impl WindowGeometrySnapshot {
    fn slot(&self, key: SnapshotKey) -> &Option<String> {
        match key {
            SnapshotKey::Width => &self.width,
            SnapshotKey::Height => &self.height,
            SnapshotKey::Left => &self.left,
            SnapshotKey::Top => &self.top,
            SnapshotKey::Fullscreen => &self.fullscreen,
        }
    }

    fn slot_mut(&mut self, key: SnapshotKey) -> &mut Option<String> {
        match key {
            SnapshotKey::Width => &mut self.width,
            SnapshotKey::Height => &mut self.height,
            SnapshotKey::Left => &mut self.left,
            SnapshotKey::Top => &mut self.top,
            SnapshotKey::Fullscreen => &mut self.fullscreen,
        }
    }

    pub fn get(&self, key: SnapshotKey) -> Option<&str> {
        self.slot(key).as_deref()
    }

    /// Integer value; missing or unparsable reads as 0
    pub fn get_number(&self, key: SnapshotKey) -> i64 {
        let Some(raw) = self.get(key) else {
            return 0;
        };
        let raw = raw.trim();
        raw.parse::<i64>()
            .ok()
            .or_else(|| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
            .unwrap_or(0)
    }

    pub fn get_boolean(&self, key: SnapshotKey) -> bool {
        self.get(key).is_some_and(is_truthy)
    }

    pub fn set(&mut self, key: SnapshotKey, value: impl Into<String>) {
        *self.slot_mut(key) = Some(value.into());
    }

    /// True when no key holds a value
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        SnapshotKey::ALL.iter().all(|key| self.get(*key).is_none())
    }

    /// Full key set as a JSON object; unset keys get their typed default
    fn to_json(&self) -> serde_json::Value {
        let map = SnapshotKey::ALL
            .iter()
            .map(|key| {
                let text = self.get(*key).unwrap_or(key.default_text());
                (key.name().to_string(), serde_json::Value::String(text.to_string()))
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// Snapshot bound to its backing file
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    snapshot: WindowGeometrySnapshot,
}

impl SnapshotStore {
    /// Read the snapshot file, falling back to an empty snapshot on any failure
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let snapshot = match Self::read(&path) {
            Ok(snapshot) => {
                debug!(path = %path.display(), snapshot = ?snapshot, "Loaded window snapshot");
                snapshot
            }
            Err(e) => {
                info!(path = %path.display(), error = %format!("{e:#}"), "Window snapshot unavailable, using defaults");
                WindowGeometrySnapshot::default()
            }
        };
        Self { path, snapshot }
    }

    fn read(path: &Path) -> Result<WindowGeometrySnapshot> {
        let contents = fs::read_to_string(path)
            .context(format!("Failed to read snapshot file {}", path.display()))?;
        serde_json::from_str(&contents)
            .context(format!("Failed to parse snapshot file {}", path.display()))
    }

    /// Write every key to the backing file, replacing its previous contents
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .context(format!("Failed to create snapshot directory: {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(&self.snapshot.to_json())
            .context("Failed to serialize window snapshot to JSON")?;
        fs::write(&self.path, contents)
            .context(format!("Failed to write snapshot file to {}", self.path.display()))?;
        info!(path = %self.path.display(), "Saved window snapshot");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> &WindowGeometrySnapshot {
        &self.snapshot
    }

    #[cfg(test)]
    pub fn get(&self, key: SnapshotKey) -> Option<&str> {
        self.snapshot.get(key)
    }

    pub fn get_number(&self, key: SnapshotKey) -> i64 {
        self.snapshot.get_number(key)
    }

    pub fn get_boolean(&self, key: SnapshotKey) -> bool {
        self.snapshot.get_boolean(key)
    }

    pub fn set(&mut self, key: SnapshotKey, value: impl Into<String>) {
        let value = value.into();
        if self.snapshot.get(key) != Some(value.as_str()) {
            debug!(key = key.name(), value = %value, "Snapshot value updated");
        }
        self.snapshot.set(key, value);
    }
}
