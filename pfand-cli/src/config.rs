//! TOML configuration for `pfaendungsrechner`.
//!
//! Every section and key is optional; a missing file means defaults.
//!
//! ```toml
//! [database]
//! backend = "sqlite"
//! connection_string = "pfand.db"
//!
//! [logging]
//! level = "info"
//! file = "pfand.log"
//!
//! [schedule]
//! step = "10.00"
//! accrual_rates = ["7.00", "5.00", "4.00", "3.00", "2.00", "1.00"]
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pfand_core::db::DbConfig;
use pfand_core::{DEPENDENT_COLUMNS, GarnishmentSchedule, ScheduleError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid [schedule] section: {0}")]
    Schedule(#[from] ScheduleError),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DbConfig,
    pub logging: LoggingConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Bare level or full `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Log file opened in append mode, in addition to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// `[schedule]` section; omitted keys keep the statutory values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub step: Decimal,
    pub accrual_rates: [Decimal; DEPENDENT_COLUMNS],
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let GarnishmentSchedule {
            step,
            accrual_rates,
        } = GarnishmentSchedule::default();
        Self {
            step,
            accrual_rates,
        }
    }
}

impl ScheduleConfig {
    pub fn to_schedule(&self) -> GarnishmentSchedule {
        GarnishmentSchedule {
            step: self.step,
            accrual_rates: self.accrual_rates,
        }
    }
}

impl AppConfig {
    /// Loads `path`, or defaults when no path is given or the file is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is not valid TOML,
    /// or carries an invalid schedule.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            debug!(path = %path.display(), "config file not found; using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.schedule.to_schedule().validate()?;
        Ok(config)
    }

    /// Applies command-line overrides on top of file values.
    pub fn with_overrides(
        mut self,
        backend: Option<String>,
        connection_string: Option<String>,
    ) -> Self {
        if let Some(backend) = backend {
            self.database.backend = backend;
        }
        if let Some(connection_string) = connection_string {
            self.database.connection_string = connection_string;
        }
        self
    }
}
