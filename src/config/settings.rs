//! Layered settings
//!
//! The base layer is the `[settings]` table of a TOML document. Any recognized
//! setting given on the command line as `--name` replaces the file value.
//! A missing or broken settings file is not fatal: the shell starts with an
//! empty base layer.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::args::ParsedArguments;
use crate::constants::options::PREFIX;
use crate::constants::settings::KNOWN;
use crate::persistence::is_truthy;

#[derive(Debug, Default, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    settings: toml::Table,
}

/// Setting name → value after CLI overrides; never changes once built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    values: BTreeMap<String, String>,
}

impl ResolvedConfig {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name).is_some_and(is_truthy)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolves the settings once and hands out the cached result afterwards
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    resolved: OnceCell<ResolvedConfig>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            resolved: OnceCell::new(),
        }
    }

    /// First call reads the file and applies `args`; later calls return the same config
    pub fn resolve(&self, args: &ParsedArguments) -> &ResolvedConfig {
        self.resolved.get_or_init(|| {
            debug!(path = %self.path.display(), "Resolving settings");
            let base = match Self::read_base(&self.path) {
                Ok(Some(values)) => values,
                Ok(None) => {
                    info!(path = %self.path.display(), "No settings file, starting with empty settings");
                    BTreeMap::new()
                }
                Err(e) => {
                    error!(path = %self.path.display(), error = %format!("{e:#}"), "Settings unavailable, starting with empty settings");
                    BTreeMap::new()
                }
            };
            let resolved = Self::overlay(base, args);
            info!(count = resolved.len(), "Settings resolved");
            resolved
        })
    }

    /// File values as text; `None` when the file does not exist
    fn read_base(path: &Path) -> Result<Option<BTreeMap<String, String>>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).context(format!("Failed to read settings file {}", path.display()));
            }
        };
        let document = toml::from_str::<SettingsDocument>(&contents)
            .context(format!("Failed to parse settings file {}", path.display()))?;

        let mut values = BTreeMap::new();
        for (name, value) in document.settings {
            let text = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Datetime(d) => d.to_string(),
                toml::Value::Array(_) | toml::Value::Table(_) => {
                    warn!(setting = %name, "Ignoring non-scalar setting");
                    continue;
                }
            };
            values.insert(name, text);
        }
        Ok(Some(values))
    }

    /// Apply `--name` options for every recognized setting
    fn overlay(mut values: BTreeMap<String, String>, args: &ParsedArguments) -> ResolvedConfig {
        let recognized = values
            .keys()
            .cloned()
            .chain(KNOWN.iter().map(|name| name.to_string()))
            .collect::<Vec<_>>();

        for name in recognized {
            if let Some(value) = args.get(&format!("{PREFIX}{name}")) {
                debug!(setting = %name, value = %value.as_str(), "Command line overrides setting");
                values.insert(name, value.as_str().to_string());
            }
        }

        ResolvedConfig { values }
    }
}
