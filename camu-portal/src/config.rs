//! Portal configuration
//!
//! TOML file in the OS config directory (`camu-portal/config.toml`), or any
//! path given on the command line. A missing file means defaults.

use crate::models::{present, ProgressionRecord};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

const APP_DIR: &str = "camu-portal";

/// Progression-record field that may carry the academic year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcademicYearField {
    AcYr,
    YrOfAdm,
    /// The record's own `_id`. Only used when listed explicitly.
    RecordId,
}

impl AcademicYearField {
    fn read(self, record: &ProgressionRecord) -> Option<&str> {
        match self {
            AcademicYearField::AcYr => present(&record.academic_year),
            AcademicYearField::YrOfAdm => present(&record.year_of_admission),
            AcademicYearField::RecordId => Some(record.id.as_str()).filter(|id| !id.is_empty()),
        }
    }
}

/// First field in `fields` that is set on `record`.
pub fn resolve_academic_year(fields: &[AcademicYearField], record: &ProgressionRecord) -> Option<String> {
    fields.iter().find_map(|field| {
        let value = field.read(record)?;
        if *field == AcademicYearField::RecordId {
            warn!(record = %record.id, "academic year taken from the progression record id");
        }
        Some(value.to_string())
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Base URL of the running camu-gateway.
    pub gateway_url: String,
    pub store_path: PathBuf,
    /// Sent as `dtype` on login.
    pub device_type: String,
    /// Tried in order when a call needs the academic year.
    pub academic_year_fields: Vec<AcademicYearField>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:3000".to_string(),
            store_path: Self::default_store_path(),
            device_type: "w".to_string(),
            academic_year_fields: vec![AcademicYearField::AcYr, AcademicYearField::YrOfAdm],
        }
    }
}

impl PortalConfig {
    /// Loads `path`, or the OS-specific location when `None`.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_file_path()?,
        };

        if !path.exists() {
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let config = toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub async fn save(&self, path: Option<&Path>) -> Result<()> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_file_path()?,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(&path, content).await?;
        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        path.push(APP_DIR);
        path.push("config.toml");
        Ok(path)
    }

    fn default_store_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("session.json")
    }
}
