use std::env;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";
const APP_DIR: &str = "chronos_tally";

#[derive(Debug)]
pub enum ConfigError {
	Io(std::io::Error),
	TomlDecode(toml::de::Error),
}

impl Display for ConfigError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ConfigError::Io(err) => write!(f, "failed to read config: {err}"),
			ConfigError::TomlDecode(err) => write!(f, "failed to parse config: {err}"),
		}
	}
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	pub state_dir: Option<PathBuf>,
	pub notifications: bool,
	pub tick_millis: u64,
	pub log_level: String,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			state_dir: None,
			notifications: true,
			tick_millis: 250,
			log_level: "info".to_string(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct Settings {
	pub state_dir: PathBuf,
	pub config: Config,
}

/// Resolves where state lives and reads the config file found there.
///
/// `--state-dir` wins over the config's own `state_dir`.
pub fn load_settings(cli_state_dir: Option<PathBuf>) -> Result<Settings, ConfigError> {
	let from_cli = cli_state_dir.is_some();
	let base_dir = cli_state_dir.map(absolutize).unwrap_or_else(default_state_dir);
	let config = load_config(&config_path(&base_dir))?;

	let state_dir = match (&config.state_dir, from_cli) {
		(Some(dir), false) => absolutize(dir.clone()),
		_ => base_dir,
	};

	Ok(Settings { state_dir, config })
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Config::default()),
		Err(err) => return Err(ConfigError::Io(err)),
	};

	toml::from_str(&raw).map_err(ConfigError::TomlDecode)
}

fn config_path(state_dir: &Path) -> PathBuf {
	if let Some(path) = env::var_os("CHRONOS_TALLY_CONFIG") {
		let path = PathBuf::from(path);
		if !path.as_os_str().is_empty() {
			return path;
		}
	}

	state_dir.join(CONFIG_FILE)
}

fn default_state_dir() -> PathBuf {
	if let Some(path) = env::var_os("CHRONOS_TALLY_STATE_DIR") {
		return PathBuf::from(path);
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path).join(".local").join("state").join(APP_DIR);
	}

	PathBuf::from(".chronos_tally")
}

fn absolutize(path: PathBuf) -> PathBuf {
	if path.is_absolute() {
		return path;
	}

	match env::current_dir() {
		Ok(cwd) => cwd.join(path),
		Err(_) => path,
	}
}

#[cfg(test)]
mod tests {
	use std::fs;
	use std::path::PathBuf;

	use super::{Config, ConfigError, load_config, load_settings};

	#[test]
	fn partial_file_keeps_defaults() {
		let config: Config = toml::from_str("tick_millis = 100\n").expect("config should parse");
		assert_eq!(config.tick_millis, 100);
		assert!(config.notifications);
		assert_eq!(config.log_level, "info");
		assert_eq!(config.state_dir, None);
	}

	#[test]
	fn missing_file_is_default() {
		let path = temp_dir("chronos_tally_missing_config").join("config.toml");
		assert_eq!(load_config(&path).expect("load should succeed"), Config::default());
	}

	#[test]
	fn bad_file_is_reported() {
		let dir = temp_dir("chronos_tally_bad_config");
		fs::create_dir_all(&dir).expect("dir should be created");
		let path = dir.join("config.toml");
		fs::write(&path, "notifications = \"sometimes\"\n").expect("write should succeed");
		assert!(matches!(load_config(&path), Err(ConfigError::TomlDecode(_))));
		let _ = fs::remove_dir_all(dir);
	}

	#[test]
	fn cli_state_dir_reads_its_config() {
		let dir = temp_dir("chronos_tally_cli_state_dir");
		fs::create_dir_all(&dir).expect("dir should be created");
		fs::write(
			dir.join("config.toml"),
			"notifications = false\nstate_dir = \"/somewhere/else\"\n",
		)
		.expect("write should succeed");

		let settings = load_settings(Some(dir.clone())).expect("settings should load");
		assert_eq!(settings.state_dir, dir);
		assert!(!settings.config.notifications);
		let _ = fs::remove_dir_all(dir);
	}

	fn temp_dir(name: &str) -> PathBuf {
		let mut path = std::env::temp_dir();
		path.push(format!("{}_{}", name, std::process::id()));
		path
	}
}
