//! Settings
//!
//! Priority order (highest to lowest):
//! 1. Environment variables with the `TRACKER_` prefix
//! 2. The TOML settings file (`settings.toml`, or the path given on the command line)
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "TRACKER_";
pub const DEFAULT_SETTINGS_FILE: &str = "settings.toml";

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("IO error reading {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("TOML error in {path}: {source}")]
	Toml {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid value for {key}: {reason}")]
	InvalidValue { key: String, reason: String },
}

/// Project settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Address the server binds to
	pub bind_addr: SocketAddr,
	/// sqlx connection string
	pub database_url: String,
	pub max_connections: u32,
	/// `tracing-subscriber` filter directive used when `RUST_LOG` is unset
	pub log_filter: String,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
			database_url: "sqlite://tracker.db?mode=rwc".to_string(),
			max_connections: 5,
			log_filter: "info".to_string(),
		}
	}
}

impl Settings {
	/// Load settings from defaults, the settings file and the environment.
	///
	/// An explicit `path` must exist; the default `settings.toml` is optional.
	pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
		let mut settings = match path {
			Some(path) => Self::from_file(path)?,
			None => {
				let default = Path::new(DEFAULT_SETTINGS_FILE);
				if default.exists() {
					Self::from_file(default)?
				} else {
					Self::default()
				}
			}
		};

		settings.apply_env(std::env::vars())?;
		Ok(settings)
	}

	pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
		let raw = fs::read_to_string(path).map_err(|source| SettingsError::Io {
			path: path.to_path_buf(),
			source,
		})?;

		toml::from_str(&raw).map_err(|source| SettingsError::Toml {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Override fields from `TRACKER_*` variables
	pub fn apply_env<I>(&mut self, vars: I) -> Result<(), SettingsError>
	where
		I: IntoIterator<Item = (String, String)>,
	{
		for (key, value) in vars {
			let Some(name) = key.strip_prefix(ENV_PREFIX) else {
				continue;
			};

			let invalid = |reason: String| SettingsError::InvalidValue {
				key: key.clone(),
				reason,
			};

			match name.to_lowercase().as_str() {
				"bind_addr" => {
					self.bind_addr = value.trim().parse().map_err(|e| invalid(format!("{}", e)))?;
				}
				"database_url" => self.database_url = value,
				"max_connections" => {
					self.max_connections =
						value.trim().parse().map_err(|e| invalid(format!("{}", e)))?;
				}
				"log_filter" => self.log_filter = value,
				_ => tracing::debug!(%key, "ignoring unknown settings variable"),
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::io::Write;

	fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[rstest]
	fn test_defaults() {
		let settings = Settings::default();

		assert_eq!(settings.bind_addr.to_string(), "127.0.0.1:8000");
		assert_eq!(settings.max_connections, 5);
		assert_eq!(settings.log_filter, "info");
	}

	#[rstest]
	fn test_file_overrides_defaults_partially() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "bind_addr = \"0.0.0.0:9000\"\nmax_connections = 2").unwrap();

		let settings = Settings::from_file(file.path()).unwrap();

		assert_eq!(settings.bind_addr.to_string(), "0.0.0.0:9000");
		assert_eq!(settings.max_connections, 2);
		assert_eq!(settings.database_url, Settings::default().database_url);
	}

	#[rstest]
	fn test_invalid_toml_is_reported() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "max_connections = \"many\"").unwrap();

		assert!(matches!(
			Settings::from_file(file.path()),
			Err(SettingsError::Toml { .. })
		));
	}

	#[rstest]
	fn test_missing_explicit_file_is_error() {
		let result = Settings::load(Some(Path::new("/definitely/not/here.toml")));
		assert!(matches!(result, Err(SettingsError::Io { .. })));
	}

	#[rstest]
	fn test_env_overrides() {
		let mut settings = Settings::default();
		settings
			.apply_env(vars(&[
				("TRACKER_DATABASE_URL", "sqlite::memory:"),
				("TRACKER_MAX_CONNECTIONS", "2"),
				("TRACKER_LOG_FILTER", "tracker=debug"),
				("UNRELATED", "x"),
			]))
			.unwrap();

		assert_eq!(settings.database_url, "sqlite::memory:");
		assert_eq!(settings.max_connections, 2);
		assert_eq!(settings.log_filter, "tracker=debug");
	}

	#[rstest]
	#[case("TRACKER_BIND_ADDR", "not-an-addr")]
	#[case("TRACKER_MAX_CONNECTIONS", "-1")]
	fn test_invalid_env_values(#[case] key: &str, #[case] value: &str) {
		let mut settings = Settings::default();
		let result = settings.apply_env(vars(&[(key, value)]));

		assert!(matches!(result, Err(SettingsError::InvalidValue { .. })));
	}
}
