//! Service configuration.
//!
//! Read from a YAML file (path in `JUKIR_CONFIG`, default `jukir.yaml`). A
//! missing file means defaults. `JUKIR_BIND_ADDRESS` and `JUKIR_DATABASE_URL`
//! override the file.

use anyhow::{bail, Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::event_broadcaster::DEFAULT_QUEUE_CAPACITY;
use crate::domain::proximity::DEFAULT_MAX_DISTANCE_METERS;
use crate::storage::connection::DEFAULT_DATABASE_URL;

pub const CONFIG_PATH_VAR: &str = "JUKIR_CONFIG";
pub const BIND_ADDRESS_VAR: &str = "JUKIR_BIND_ADDRESS";
pub const DATABASE_URL_VAR: &str = "JUKIR_DATABASE_URL";
pub const DEFAULT_CONFIG_PATH: &str = "jukir.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_address: String,
    pub database_url: String,
    /// Dashboard origin allowed by CORS
    pub cors_origin: String,
    pub geofence_radius_meters: f64,
    /// Per-attendant notification queue length
    pub event_queue_capacity: usize,
    /// Offset used for calendar days, weeks and months (UTC+7 is WIB)
    pub utc_offset_hours: i32,
    /// `tracing_subscriber::EnvFilter` directive, `RUST_LOG` wins when set
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            cors_origin: "http://localhost:8080".to_string(),
            geofence_radius_meters: DEFAULT_MAX_DISTANCE_METERS,
            event_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            utc_offset_hours: 7,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the file named by `JUKIR_CONFIG` and apply env overrides
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML file; a missing file yields the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let yaml_content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        let config: AppConfig = serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("invalid config file {:?}", path))?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind_address) = lookup(BIND_ADDRESS_VAR).filter(|v| !v.trim().is_empty()) {
            self.bind_address = bind_address;
        }
        if let Some(database_url) = lookup(DATABASE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            self.database_url = database_url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.geofence_radius_meters.is_finite() || self.geofence_radius_meters <= 0.0 {
            bail!(
                "geofence_radius_meters must be positive, got {}",
                self.geofence_radius_meters
            );
        }
        if self.event_queue_capacity == 0 {
            bail!("event_queue_capacity must be at least 1");
        }
        if !(-14..=14).contains(&self.utc_offset_hours) {
            bail!(
                "utc_offset_hours must be within -14..=14, got {}",
                self.utc_offset_hours
            );
        }
        Ok(())
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .with_context(|| format!("invalid utc_offset_hours {}", self.utc_offset_hours))
    }
}
