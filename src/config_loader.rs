use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Settings file looked up when QUADRELAY_CONFIG is not set
pub const DEFAULT_CONFIG_PATH: &str = "/etc/quadrelay.yaml";
pub const CONFIG_ENV: &str = "QUADRELAY_CONFIG";

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// /sys/class/gpio attribute files
    #[default]
    Sysfs,
    /// GPIO character device, needs the `gpiod` feature
    Gpiod,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub backend: Backend,
    pub sysfs_root: PathBuf,
    pub chip: PathBuf,
    pub consumer: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: Backend::Sysfs,
            sysfs_root: PathBuf::from("/sys/class/gpio"),
            chip: PathBuf::from("/dev/gpiochip0"),
            consumer: "quadrelay".to_string(),
        }
    }
}

/// Load settings from the file named by QUADRELAY_CONFIG, or from
/// /etc/quadrelay.yaml when present. Neither existing means defaults.
pub fn load_settings() -> Result<Settings> {
    match env::var_os(CONFIG_ENV) {
        Some(path) => load_settings_from(Path::new(&path)),
        None => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                load_settings_from(path)
            } else {
                log::debug!(target: "config_loader", "no {} found, using defaults", DEFAULT_CONFIG_PATH);
                Ok(Settings::default())
            }
        }
    }
}

/// Load settings from an explicit path. The file must exist and parse.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let file = File::open(path)
        .map_err(|e| anyhow!("Missing settings file at {:?}: {}", path, e))?;
    // An empty document deserializes to null; treat it as "all defaults"
    let value: serde_yaml::Value = serde_yaml::from_reader(file)
        .with_context(|| format!("Invalid YAML in {:?}", path))?;
    if value.is_null() {
        return Ok(Settings::default());
    }
    let settings: Settings = serde_yaml::from_value(value)
        .with_context(|| format!("Invalid settings in {:?}", path))?;

    log::info!(target: "config_loader", "Settings: backend={:?}, sysfs_root={:?}, chip={:?} (from {:?})",
               settings.backend, settings.sysfs_root, settings.chip, path);

    Ok(settings)
}
