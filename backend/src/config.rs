//! Runtime configuration.
//!
//! Values come from an optional YAML file (path in `CLINIC_CONFIG`, default
//! `clinic.yaml`) and are then overridden by `CLINIC_*` environment
//! variables. A missing file means defaults.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::Deserialize;
use tracing::info;

pub const CONFIG_PATH_VAR: &str = "CLINIC_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "clinic.yaml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// sqlx SQLite URL, or `memory` for a private in-memory database
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Origin allowed by the CORS layer
    pub cors_origin: String,
    /// Offset from UTC used when rendering times in notification text
    pub display_utc_offset_minutes: i32,
    /// Default filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:clinic.db".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_origin: "http://localhost:5173".to_string(),
            display_utc_offset_minutes: 0,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the configured file and the process environment
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.display_offset()?;
        Ok(config)
    }

    /// Read a YAML file. A file that does not exist yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply `CLINIC_*` overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CLINIC_DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(addr) = lookup("CLINIC_BIND_ADDR") {
            self.bind_addr = addr
                .parse()
                .with_context(|| format!("Invalid CLINIC_BIND_ADDR: {}", addr))?;
        }
        if let Some(origin) = lookup("CLINIC_CORS_ORIGIN") {
            self.cors_origin = origin;
        }
        if let Some(offset) = lookup("CLINIC_DISPLAY_UTC_OFFSET_MINUTES") {
            self.display_utc_offset_minutes = offset
                .trim()
                .parse()
                .with_context(|| format!("Invalid CLINIC_DISPLAY_UTC_OFFSET_MINUTES: {}", offset))?;
        }
        if let Some(level) = lookup("CLINIC_LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }

    pub fn display_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.display_utc_offset_minutes * 60).with_context(|| {
            format!(
                "display_utc_offset_minutes out of range: {}",
                self.display_utc_offset_minutes
            )
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.eq_ignore_ascii_case("memory")
    }
}
