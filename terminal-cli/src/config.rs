//! Layered settings: YAML file, then `DICE_*` environment variables, then flags.

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use dice_execution::DEFAULT_RESOLVE_DELAY;
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

const ENV_BASE_URL: &str = "DICE_BASE_URL";
const ENV_ROLL_DELAY_MS: &str = "DICE_ROLL_DELAY_MS";
const ENV_PLAYER: &str = "DICE_PLAYER";
const ENV_STORE: &str = "DICE_STORE";

/// CLI flags (override the config file and environment)
#[derive(Parser, Debug, Default)]
#[command(name = "dice", about = "Pick a face, roll three dice, chase the best score")]
pub struct Args {
    /// YAML config file (defaults to config.yaml in the platform config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the leaderboard and score services
    #[arg(long)]
    pub base_url: Option<String>,

    /// Wallet address scores are saved under
    #[arg(long)]
    pub player: Option<String>,

    /// Roll animation length in milliseconds
    #[arg(long)]
    pub roll_delay_ms: Option<u64>,

    /// Best score store: memory, file[:path] or sqlite[:path]
    #[arg(long)]
    pub store: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    pub log_json: bool,

    /// Log file (defaults to dice.log in the platform data dir)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Seed the dice for a reproducible session
    #[arg(long)]
    pub seed: Option<u64>,

    /// Game id forwarded to the leaderboard service
    #[arg(long)]
    pub game_id: Option<u64>,
}

/// Contents of the YAML config file. Every field is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub player: Option<String>,
    pub roll_delay_ms: Option<u64>,
    pub store: Option<String>,
    pub log_level: Option<String>,
    pub log_json: Option<bool>,
    pub log_file: Option<PathBuf>,
    pub seed: Option<u64>,
    pub game_id: Option<u64>,
}

impl FileConfig {
    pub fn parse(contents: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty mapping.
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).context("parse config file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::parse(&contents)
    }
}

/// Where the best score lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreSpec {
    Memory,
    File(Option<PathBuf>),
    Sqlite(Option<PathBuf>),
}

impl FromStr for StoreSpec {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let (kind, path) = match value.split_once(':') {
            Some((kind, path)) if !path.is_empty() => (kind, Some(PathBuf::from(path))),
            Some((kind, _)) => (kind, None),
            None => (value, None),
        };
        match (kind.trim().to_ascii_lowercase().as_str(), path) {
            ("memory", None) => Ok(StoreSpec::Memory),
            ("memory", Some(_)) => bail!("memory store takes no path"),
            ("file", path) => Ok(StoreSpec::File(path)),
            ("sqlite", path) => Ok(StoreSpec::Sqlite(path)),
            (other, _) => Err(anyhow!("unknown store kind {other:?} (expected memory, file or sqlite)")),
        }
    }
}

/// Fully resolved settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub base_url: Option<String>,
    pub player: Option<String>,
    pub roll_delay: Duration,
    pub store: StoreSpec,
    pub log_level: String,
    pub log_json: bool,
    pub log_file: Option<PathBuf>,
    pub seed: Option<u64>,
    pub game_id: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: None,
            player: None,
            roll_delay: DEFAULT_RESOLVE_DELAY,
            store: StoreSpec::File(None),
            log_level: "info".to_string(),
            log_json: false,
            log_file: None,
            seed: None,
            game_id: None,
        }
    }
}

impl Settings {
    /// Load the config file named by `args` (or the default one, if present)
    /// and layer the process environment and `args` over it.
    pub fn load(args: &Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => match project_dirs().map(|dirs| dirs.config_dir().join("config.yaml")) {
                Some(path) if path.exists() => FileConfig::load(&path)?,
                _ => FileConfig::default(),
            },
        };
        Self::resolve(file, |key| std::env::var(key).ok(), args)
    }

    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        args: &Args,
    ) -> Result<Self> {
        let mut settings = Settings::default();

        // Config file
        if let Some(base_url) = file.base_url {
            settings.base_url = Some(base_url);
        }
        if let Some(player) = file.player {
            settings.player = Some(player);
        }
        if let Some(ms) = file.roll_delay_ms {
            settings.roll_delay = Duration::from_millis(ms);
        }
        if let Some(store) = file.store {
            settings.store = store.parse().context("config file store")?;
        }
        if let Some(level) = file.log_level {
            settings.log_level = level;
        }
        if let Some(json) = file.log_json {
            settings.log_json = json;
        }
        settings.log_file = file.log_file;
        settings.seed = file.seed;
        settings.game_id = file.game_id;

        // Environment
        if let Some(base_url) = env(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            settings.base_url = Some(base_url);
        }
        if let Some(player) = env(ENV_PLAYER).filter(|v| !v.is_empty()) {
            settings.player = Some(player);
        }
        if let Some(ms) = env(ENV_ROLL_DELAY_MS).filter(|v| !v.is_empty()) {
            let ms = ms
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ENV_ROLL_DELAY_MS}={ms:?} is not a number"))?;
            settings.roll_delay = Duration::from_millis(ms);
        }
        if let Some(store) = env(ENV_STORE).filter(|v| !v.is_empty()) {
            settings.store = store.parse().with_context(|| format!("{ENV_STORE}={store:?}"))?;
        }

        // Flags
        if let Some(base_url) = &args.base_url {
            settings.base_url = Some(base_url.clone());
        }
        if let Some(player) = &args.player {
            settings.player = Some(player.clone());
        }
        if let Some(ms) = args.roll_delay_ms {
            settings.roll_delay = Duration::from_millis(ms);
        }
        if let Some(store) = &args.store {
            settings.store = store.parse().context("--store")?;
        }
        if let Some(level) = &args.log_level {
            settings.log_level = level.clone();
        }
        if args.log_json {
            settings.log_json = true;
        }
        if let Some(path) = &args.log_file {
            settings.log_file = Some(path.clone());
        }
        if let Some(seed) = args.seed {
            settings.seed = Some(seed);
        }
        if let Some(game_id) = args.game_id {
            settings.game_id = Some(game_id);
        }

        Ok(settings)
    }

    /// Log file, falling back to the platform data dir.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().join("dice.log")))
    }
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "dice", "dice-cli")
}

/// Default location of a store of the given kind.
pub fn default_store_path(file_name: &str) -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(FileConfig::default(), env(&[]), &Args::default()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.roll_delay, Duration::from_millis(2_500));
        assert_eq!(settings.store, StoreSpec::File(None));
    }

    #[test]
    fn test_parse_file() {
        let file = FileConfig::parse(
            "base_url: https://dice.example.com\nroll_delay_ms: 500\nstore: sqlite:/tmp/dice.db\nlog_json: true\n",
        )
        .unwrap();
        assert_eq!(file.base_url.as_deref(), Some("https://dice.example.com"));
        assert_eq!(file.roll_delay_ms, Some(500));
        assert_eq!(file.log_json, Some(true));

        assert_eq!(FileConfig::parse("").unwrap(), FileConfig::default());
        assert!(FileConfig::parse("colour: blue\n").is_err());
    }

    #[test]
    fn test_layering_order() {
        let file = FileConfig {
            base_url: Some("https://file.example.com".to_string()),
            player: Some("0xfile".to_string()),
            roll_delay_ms: Some(100),
            store: Some("memory".to_string()),
            ..FileConfig::default()
        };
        let env = env(&[
            (ENV_BASE_URL, "https://env.example.com"),
            (ENV_ROLL_DELAY_MS, "200"),
            (ENV_STORE, "sqlite"),
        ]);
        let args = Args {
            roll_delay_ms: Some(300),
            ..Args::default()
        };

        let settings = Settings::resolve(file, env, &args).unwrap();
        assert_eq!(settings.base_url.as_deref(), Some("https://env.example.com"));
        assert_eq!(settings.player.as_deref(), Some("0xfile"));
        assert_eq!(settings.roll_delay, Duration::from_millis(300));
        assert_eq!(settings.store, StoreSpec::Sqlite(None));
    }

    #[test]
    fn test_bad_env_is_an_error() {
        let err = Settings::resolve(
            FileConfig::default(),
            env(&[(ENV_ROLL_DELAY_MS, "soon")]),
            &Args::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains(ENV_ROLL_DELAY_MS));

        assert!(Settings::resolve(
            FileConfig::default(),
            env(&[(ENV_STORE, "redis")]),
            &Args::default(),
        )
        .is_err());
    }

    #[test]
    fn test_store_spec() {
        assert_eq!("memory".parse::<StoreSpec>().unwrap(), StoreSpec::Memory);
        assert_eq!("FILE".parse::<StoreSpec>().unwrap(), StoreSpec::File(None));
        assert_eq!(
            "file:/var/dice/best".parse::<StoreSpec>().unwrap(),
            StoreSpec::File(Some(PathBuf::from("/var/dice/best")))
        );
        assert_eq!("sqlite:".parse::<StoreSpec>().unwrap(), StoreSpec::Sqlite(None));
        assert!("memory:/tmp/x".parse::<StoreSpec>().is_err());
        assert!("redis".parse::<StoreSpec>().is_err());
    }
}
