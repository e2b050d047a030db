use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::path::{get_database_path, get_settings_path};

/// Systemkonfiguration (singleton). Synkas med fjärrdokumentet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    pub church_name: String,
    pub meeting_name: String,
    pub admin_password: String,
    #[serde(default)]
    pub grades: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_cloud_sync: Option<String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            church_name: "Ärkeängeln Rafaels kyrka".into(),
            meeting_name: "Gymnasiemötet".into(),
            admin_password: "admin".into(),
            grades: vec!["Årskurs 1".into(), "Årskurs 2".into(), "Årskurs 3".into()],
            last_cloud_sync: None,
        }
    }
}

impl SystemConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.church_name.trim().is_empty() {
            return Err(ConfigValidationError::MissingChurchName);
        }
        if self.admin_password.is_empty() {
            return Err(ConfigValidationError::EmptyPassword);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("Kyrkans namn krävs")]
    MissingChurchName,
    #[error("Adminlösenordet får inte vara tomt")]
    EmptyPassword,
}

/// Utseende, lagras lokalt och synkas inte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Språk, lagras lokalt och synkas inte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Ar,
    En,
}

/// Applikationsinställningar från `settings.toml`. Sparas inte i databasen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Fjärrdokumentets adress (GET hämtar, POST ersätter)
    pub remote_endpoint: String,
    pub database_path: PathBuf,
    pub request_timeout_secs: u64,
    /// trace, debug, info, warn eller error
    pub log_level: String,
    /// Inga mötesdatum före detta visas
    pub system_start_date: NaiveDate,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            remote_endpoint: "http://localhost:3000/api/data".into(),
            database_path: get_database_path(),
            request_timeout_secs: 30,
            log_level: "info".into(),
            system_start_date: NaiveDate::from_ymd_opt(2026, 2, 20).unwrap_or_default(),
        }
    }
}

impl AppSettings {
    /// Ladda från standardsökvägen, eller defaults om filen saknas
    pub fn load() -> Self {
        Self::load_from(&get_settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("Ogiltig inställningsfil {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}
