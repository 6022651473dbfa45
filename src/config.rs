use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{ConsoleError, Result};

pub const DEFAULT_AMS_NET_ID: &str = "127.0.0.1.1.1";
pub const DEFAULT_ADS_PORT: u16 = 851;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_ams_net_id")]
    pub ams_net_id: String,
    #[serde(default = "default_ads_port")]
    pub ads_port: u16,
    #[serde(default)]
    pub paths: Paths,
}

/// Locations of every file the console persists state into. All defaults
/// resolve relative to the working directory so a bare `adscope` run keeps
/// its lists next to the binary, matching the controller-cabinet workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub ignore_list: PathBuf,
    pub watchlist: PathBuf,
    pub notification_list: PathBuf,
    pub hint_list: PathBuf,
    pub notification_log: PathBuf,
    pub rpc_definitions: PathBuf,
    pub rpc_schema_out: PathBuf,
    pub recipe: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ams_net_id: default_ams_net_id(),
            ads_port: default_ads_port(),
            paths: Paths::default(),
        }
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            ignore_list: PathBuf::from("ignore_ads_symbols.txt"),
            watchlist: PathBuf::from("watchlist.txt"),
            notification_list: PathBuf::from("notification_list.txt"),
            hint_list: PathBuf::from("symbol_hints.txt"),
            notification_log: PathBuf::from("ads_notifications.csv"),
            rpc_definitions: PathBuf::from("rpc_definitions.json"),
            rpc_schema_out: PathBuf::from("rpc_definitions_schema.json"),
            recipe: PathBuf::from("recipe.json"),
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let mut path = env::current_dir().map_err(|err| ConsoleError::Config(err.to_string()))?;
    path.push("adscope.toml");
    Ok(path)
}

/// Loads the configuration, writing a default file on first run so the user
/// has something to edit.
pub fn load_or_default(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let config_path = if let Some(path) = path {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        path
    } else {
        default_config_path()?
    };

    if config_path.exists() {
        let contents = fs::read_to_string(&config_path)?;
        let cfg: Config = toml::from_str(&contents)?;
        Ok((cfg, config_path))
    } else {
        let cfg = Config::default();
        cfg.save(&config_path)?;
        Ok((cfg, config_path))
    }
}

impl Config {
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

fn default_ams_net_id() -> String {
    DEFAULT_AMS_NET_ID.to_string()
}

fn default_ads_port() -> u16 {
    DEFAULT_ADS_PORT
}
