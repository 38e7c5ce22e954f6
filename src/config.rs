use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::clock::Viewport;
use crate::storage::DEFAULT_STORAGE_KEY;

const APP_DIR: &str = "daybar";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_TICK_MILLIS: u64 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config {path}: {source}")]
	Io {
		path: PathBuf,
		source: std::io::Error,
	},
	#[error("failed to parse config {path}: {source}")]
	Parse {
		path: PathBuf,
		source: toml::de::Error,
	},
	#[error("viewport start must be 0 or 6 hours, got {0}")]
	Viewport(u32),
	#[error("storage key must be a non-empty file name, got {0:?}")]
	StorageKey(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
	viewport_start_hours: Option<u32>,
	storage_key: Option<String>,
	tick_millis: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	pub state_dir: PathBuf,
	pub viewport: Viewport,
	pub storage_key: String,
	pub tick: Duration,
}

/// Overrides collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	pub state_dir: Option<PathBuf>,
	pub config_path: Option<PathBuf>,
	pub viewport_start_hours: Option<u32>,
}

pub fn load_config(overrides: Overrides) -> Result<Config, ConfigError> {
	let environment = Environment::from_process();
	let config_path = resolve_config_path(overrides.config_path.clone(), &environment);
	let file = read_config_file(&config_path)?;
	build_config(file, overrides, &environment)
}

#[derive(Debug, Clone, Default)]
struct Environment {
	state_dir: Option<OsString>,
	config: Option<OsString>,
	xdg_state_home: Option<OsString>,
	xdg_config_home: Option<OsString>,
	#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
	local_app_data: Option<OsString>,
	#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
	app_data: Option<OsString>,
	home: Option<OsString>,
}

impl Environment {
	fn from_process() -> Self {
		Self {
			state_dir: env::var_os("DAYBAR_STATE_DIR"),
			config: env::var_os("DAYBAR_CONFIG"),
			xdg_state_home: env::var_os("XDG_STATE_HOME"),
			xdg_config_home: env::var_os("XDG_CONFIG_HOME"),
			local_app_data: env::var_os("LOCALAPPDATA"),
			app_data: env::var_os("APPDATA"),
			home: env::var_os("HOME"),
		}
	}
}

fn non_empty(value: &Option<OsString>) -> Option<PathBuf> {
	value
		.as_ref()
		.filter(|value| !value.is_empty())
		.map(PathBuf::from)
}

fn build_config(file: ConfigFile, overrides: Overrides, environment: &Environment) -> Result<Config, ConfigError> {
	let hours = overrides
		.viewport_start_hours
		.or(file.viewport_start_hours)
		.unwrap_or(0);
	let viewport = Viewport::from_hours(hours).ok_or(ConfigError::Viewport(hours))?;

	let storage_key = file
		.storage_key
		.unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());
	let valid_key = !storage_key.is_empty()
		&& storage_key
			.chars()
			.all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
	if !valid_key {
		return Err(ConfigError::StorageKey(storage_key));
	}

	let state_dir = match overrides.state_dir {
		Some(path) => path,
		None => resolve_state_dir(environment),
	};

	Ok(Config {
		state_dir,
		viewport,
		storage_key,
		tick: Duration::from_millis(file.tick_millis.unwrap_or(DEFAULT_TICK_MILLIS).max(1)),
	})
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ConfigFile::default()),
		Err(source) => {
			return Err(ConfigError::Io {
				path: path.to_path_buf(),
				source,
			});
		}
	};

	toml::from_str(&raw).map_err(|source| ConfigError::Parse {
		path: path.to_path_buf(),
		source,
	})
}

fn resolve_config_path(cli_path: Option<PathBuf>, environment: &Environment) -> PathBuf {
	if let Some(path) = cli_path {
		return path;
	}

	if let Some(path) = non_empty(&environment.config) {
		return path;
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = non_empty(&environment.app_data) {
			return path.join(APP_DIR).join(CONFIG_FILE);
		}
	}

	if let Some(path) = non_empty(&environment.xdg_config_home) {
		return path.join(APP_DIR).join(CONFIG_FILE);
	}

	if let Some(path) = non_empty(&environment.home) {
		return path.join(".config").join(APP_DIR).join(CONFIG_FILE);
	}

	PathBuf::from(format!(".{APP_DIR}")).join(CONFIG_FILE)
}

fn resolve_state_dir(environment: &Environment) -> PathBuf {
	if let Some(path) = non_empty(&environment.state_dir) {
		return path;
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = non_empty(&environment.local_app_data) {
			return path.join(APP_DIR);
		}
	}

	if let Some(path) = non_empty(&environment.xdg_state_home) {
		return path.join(APP_DIR);
	}

	if let Some(path) = non_empty(&environment.home) {
		return path.join(".local").join("state").join(APP_DIR);
	}

	PathBuf::from(format!(".{APP_DIR}"))
}
