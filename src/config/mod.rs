//! Configuration for the application shell
//!
//! - **settings**: layered settings document (file values, CLI overrides on top)
//! - **paths**: where the settings, snapshot, document and log live

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::ConfigStore;
