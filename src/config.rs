use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::i18n::Lang;

/// Fixed bind address of the dashboard. Not a config key.
pub const DASHBOARD_HOST: &str = "localhost";
pub const DASHBOARD_PORT: u16 = 8501;

pub const APP_NAME: &str = "dashboard-launcher";

pub fn dashboard_url() -> String {
    format!("http://{}:{}", DASHBOARD_HOST, DASHBOARD_PORT)
}

#[cfg(not(windows))]
const DEFAULT_INTERPRETERS: &[&str] = &["python3", "python"];
#[cfg(windows)]
const DEFAULT_INTERPRETERS: &[&str] = &["python", "python3"];

#[cfg(not(windows))]
const DEFAULT_PACKAGE_MANAGERS: &[&str] = &["pip3", "pip"];
#[cfg(windows)]
const DEFAULT_PACKAGE_MANAGERS: &[&str] = &["pip", "pip3"];

const DEFAULT_REQUIRED_LIBRARY: &str = "streamlit";
const DEFAULT_DASHBOARD_MODULE: &str = "streamlit";
const DEFAULT_MANIFEST: &str = "requirements.txt";
const DEFAULT_ENTRY_FILE: &str = "app.py";
const DEFAULT_MIN_INTERPRETER_VERSION: &str = "3.8.0";

// On-disk shape. Every key is optional; absent keys fall back to the defaults above.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub launcher: RawLauncherConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawLauncherConfig {
    #[serde(default)]
    pub interpreters: Option<Vec<String>>,
    #[serde(default)]
    pub package_managers: Option<Vec<String>>,
    #[serde(default)]
    pub required_library: Option<String>,
    #[serde(default)]
    pub dashboard_module: Option<String>,
    #[serde(default)]
    pub manifest: Option<PathBuf>,
    #[serde(default)]
    pub entry_file: Option<PathBuf>,
    #[serde(default)]
    pub min_interpreter_version: Option<String>,
    #[serde(default)]
    pub lang: Option<Lang>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LauncherConfig {
    /// Probed in order; the first one that answers `--version` wins.
    pub interpreters: Vec<String>,
    pub package_managers: Vec<String>,
    pub required_library: String,
    pub dashboard_module: String,
    pub manifest: PathBuf,
    pub entry_file: PathBuf,
    pub min_interpreter_version: semver::Version,
    pub lang: Option<Lang>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            interpreters: DEFAULT_INTERPRETERS.iter().map(|s| s.to_string()).collect(),
            package_managers: DEFAULT_PACKAGE_MANAGERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            required_library: DEFAULT_REQUIRED_LIBRARY.to_string(),
            dashboard_module: DEFAULT_DASHBOARD_MODULE.to_string(),
            manifest: PathBuf::from(DEFAULT_MANIFEST),
            entry_file: PathBuf::from(DEFAULT_ENTRY_FILE),
            min_interpreter_version: semver::Version::new(3, 8, 0),
            lang: None,
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let proj = directories::ProjectDirs::from("", "", APP_NAME)
        .context("could not determine config directory")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// A missing file is not an error: the launcher runs with built-in defaults.
pub fn load_config_or_default(path: &Path, debug: bool) -> Result<LauncherConfig> {
    if !path.exists() {
        if debug {
            eprintln!(
                "[debug] config: {} not found, using defaults",
                path.display()
            );
        }
        return Ok(LauncherConfig::default());
    }
    if debug {
        eprintln!("[debug] config: loading {}", path.display());
    }
    load_config(path)
}

pub fn load_config(path: &Path) -> Result<LauncherConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config from {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config at {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<LauncherConfig> {
    let raw: ConfigFile = toml::from_str(contents).context("failed to parse config TOML")?;
    let raw = raw.launcher;
    let defaults = LauncherConfig::default();

    let interpreters = candidate_list("interpreters", raw.interpreters, defaults.interpreters)?;
    let package_managers = candidate_list(
        "package_managers",
        raw.package_managers,
        defaults.package_managers,
    )?;
    let required_library = non_empty(
        "required_library",
        raw.required_library,
        defaults.required_library,
    )?;
    let dashboard_module = non_empty(
        "dashboard_module",
        raw.dashboard_module,
        defaults.dashboard_module,
    )?;

    let manifest = raw.manifest.unwrap_or(defaults.manifest);
    if manifest.as_os_str().is_empty() {
        bail!("manifest must not be empty");
    }
    let entry_file = raw.entry_file.unwrap_or(defaults.entry_file);
    if entry_file.as_os_str().is_empty() {
        bail!("entry_file must not be empty");
    }

    let version_text = raw
        .min_interpreter_version
        .unwrap_or_else(|| DEFAULT_MIN_INTERPRETER_VERSION.to_string());
    let min_interpreter_version = crate::probe::parse_version(&version_text)
        .with_context(|| format!("min_interpreter_version {:?} is not a version", version_text))?;

    Ok(LauncherConfig {
        interpreters,
        package_managers,
        required_library,
        dashboard_module,
        manifest,
        entry_file,
        min_interpreter_version,
        lang: raw.lang,
    })
}

fn candidate_list(
    key: &str,
    value: Option<Vec<String>>,
    default: Vec<String>,
) -> Result<Vec<String>> {
    let list = value.unwrap_or(default);
    if list.is_empty() {
        bail!("{} must list at least one command", key);
    }
    if list.iter().any(|c| c.trim().is_empty()) {
        bail!("{} contains an empty command name", key);
    }
    Ok(list)
}

fn non_empty(key: &str, value: Option<String>, default: String) -> Result<String> {
    let value = value.unwrap_or(default);
    if value.trim().is_empty() {
        bail!("{} must not be empty", key);
    }
    Ok(value)
}
