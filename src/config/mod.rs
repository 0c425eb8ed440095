//! Configuration module for the voice assistant.
//!
//! Provides `AppConfig` (top-level settings), the provider and session
//! sub-configs, `AppPaths` for the platform config directory, and TOML
//! persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, BusyPolicy, LlmConfig, LlmProvider, SessionConfig};
