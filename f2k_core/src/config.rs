//! # Configuration
//!
//! TOML configuration for interchange sessions. Every field has a default,
//! so an empty file (or no file at all) is a valid configuration.
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [session]
//! dialect = "legacy"
//! point_tolerance = 0.01
//! reserved_id_base = 1000000
//! model_units = { force = "N", length = "mm" }
//! file_units = { force = "KN", length = "m" }
//! point_tables = ["POINT COORDINATES"]
//! stamp_header = false
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::errors::{InterchangeError, InterchangeResult};
use crate::points::DEFAULT_RESERVED_BASE;
use crate::units::UnitPair;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "F2K_CONFIG";

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "f2k.toml";

/// Default point matching tolerance, in file length units
pub const DEFAULT_POINT_TOLERANCE: f64 = 0.001;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterchangeConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl InterchangeConfig {
    /// Load configuration from an explicit path.
    pub fn from_file(path: impl AsRef<Path>) -> InterchangeResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|source| InterchangeError::io("read config", path, source))?;
        toml::from_str(&content).map_err(|source| InterchangeError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find configuration: `F2K_CONFIG` if set, otherwise `./f2k.toml`,
    /// otherwise defaults.
    pub fn discover() -> InterchangeResult<Self> {
        if let Some(path) = env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join(DEFAULT_CONFIG_FILE))
            .map_err(|source| InterchangeError::io("resolve working directory", ".", source))?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Log filter used by binaries when `RUST_LOG` is not set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// Per-session policy. Each value is fixed for the whole session rather
/// than chosen per producer call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Dialect used to parse and serialize
    pub dialect: Dialect,

    /// Point matching tolerance in file length units, used when a producer
    /// does not pass its own
    pub point_tolerance: f64,

    /// New point ids start above this value
    pub reserved_id_base: u64,

    /// Units producers work in
    pub model_units: UnitPair,

    /// Units used when the file declares none (or for write-only sessions)
    pub file_units: Option<UnitPair>,

    /// Tables seeded as point registries; empty means the dialect default
    pub point_tables: Vec<String>,

    /// Prefix modern-dialect output with a "saved on" banner
    pub stamp_header: bool,
}

impl SessionConfig {
    /// Default config for `dialect`
    pub fn for_dialect(dialect: Dialect) -> Self {
        SessionConfig {
            dialect,
            ..Self::default()
        }
    }

    /// Point tables to seed, resolving the dialect default
    pub fn resolved_point_tables(&self) -> Vec<String> {
        if self.point_tables.is_empty() {
            vec![self.dialect.codec().default_point_table().to_string()]
        } else {
            self.point_tables.clone()
        }
    }

    /// Reject values that would make point matching meaningless
    pub fn validate(&self) -> InterchangeResult<()> {
        if !(self.point_tolerance.is_finite() && self.point_tolerance >= 0.0) {
            return Err(InterchangeError::invalid_input(
                "point_tolerance",
                self.point_tolerance.to_string(),
                "Tolerance must be a non-negative number",
            ));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            dialect: Dialect::Modern,
            point_tolerance: DEFAULT_POINT_TOLERANCE,
            reserved_id_base: DEFAULT_RESERVED_BASE,
            model_units: UnitPair::default(),
            file_units: None,
            point_tables: Vec::new(),
            stamp_header: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{ForceUnit, LengthUnit};
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = InterchangeConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.session.dialect, Dialect::Modern);
        assert_eq!(cfg.session.point_tolerance, DEFAULT_POINT_TOLERANCE);
        assert_eq!(cfg.session.reserved_id_base, 1000);
        assert!(cfg.session.file_units.is_none());
        assert_eq!(
            cfg.session.resolved_point_tables(),
            vec!["OBJECT GEOMETRY - POINT COORDINATES".to_string()]
        );
    }

    #[test]
    fn test_legacy_default_point_table() {
        let cfg = SessionConfig::for_dialect(Dialect::Legacy);
        assert_eq!(cfg.resolved_point_tables(), vec!["POINT COORDINATES".to_string()]);
    }

    #[test]
    fn test_load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [session]
            dialect = "b"
            point_tolerance = 0.5
            reserved_id_base = 1000000
            file_units = {{ force = "tonf", length = "m" }}
            "#
        )
        .unwrap();

        let cfg = InterchangeConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.session.dialect, Dialect::Legacy);
        assert_eq!(cfg.session.point_tolerance, 0.5);
        assert_eq!(cfg.session.reserved_id_base, 1_000_000);
        assert_eq!(cfg.session.file_units, Some(UnitPair::new(ForceUnit::Tonf, LengthUnit::M)));
        // untouched fields keep their defaults
        assert_eq!(cfg.session.model_units, UnitPair::default());
        assert!(!cfg.session.stamp_header);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[session]\ndialect = 42").unwrap();
        let err = InterchangeConfig::from_file(file.path()).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_negative_tolerance_is_rejected() {
        let cfg = SessionConfig {
            point_tolerance: -0.1,
            ..SessionConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
