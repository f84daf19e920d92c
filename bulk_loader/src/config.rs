use project_root::get_project_root;

use clap::Parser;
use figment::{
    Figment,
    providers::{Format, Toml},
};

use mappings_model::tables::{DEFAULT_KEYSPACE, PROFILES_TTL, SEGMENTS_TTL};
use mappings_sstable::rocks::DEFAULT_BUFFER_SIZE_MB;

use std::path::PathBuf;
use std::time::Duration;

use crate::serde_duration;

/// A single, unified struct holding all application settings.
/// It is deserialized from the TOML file.
#[derive(serde::Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
    pub bulk_loader: BulkLoaderConfig,
    pub tables: TablesConfig,
}

#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PathsConfig {
    /// Tables are written to `<output_dir>/<keyspace>/<table>/`.
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BulkLoaderConfig {
    pub keyspace: String,
    /// Reject rows that arrive out of key order instead of buffering them.
    /// Only for input already sorted by row key; off by default.
    pub sorted: bool,
    pub buffer_size_mb: usize,
}

impl Default for BulkLoaderConfig {
    fn default() -> Self {
        Self {
            keyspace: DEFAULT_KEYSPACE.to_string(),
            sorted: false,
            buffer_size_mb: DEFAULT_BUFFER_SIZE_MB,
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TablesConfig {
    #[serde(deserialize_with = "serde_duration::deserialize")]
    pub profiles_ttl: Duration,
    #[serde(deserialize_with = "serde_duration::deserialize")]
    pub segments_ttl: Duration,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            profiles_ttl: PROFILES_TTL,
            segments_ttl: SEGMENTS_TTL,
        }
    }
}

/// Parses command-line arguments using the clap derive macro.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Input files of JSON lines; `-` reads standard input. Reads standard
    /// input when none are given.
    pub inputs: Vec<PathBuf>,

    /// Settings file, `config/settings.toml` under the project root by default.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    #[arg(short, long)]
    pub keyspace: Option<String>,

    /// Require input rows in key order instead of buffering and sorting them.
    #[arg(long)]
    pub sorted: bool,

    #[arg(long)]
    pub buffer_size_mb: Option<usize>,

    #[arg(short, long)]
    pub log_level: Option<String>,
}

fn default_config_path() -> PathBuf {
    let relative = PathBuf::from("config/settings.toml");
    match get_project_root() {
        Ok(root) => root.join(relative),
        Err(_) => relative,
    }
}

/// Loads configuration from the TOML file and merges it with CLI arguments.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut figment = Figment::new().merge(Toml::file(config_path));

    if let Some(output_dir) = &cli.output_dir {
        figment = figment.merge(("paths.output_dir", output_dir));
    }
    if let Some(keyspace) = &cli.keyspace {
        figment = figment.merge(("bulk_loader.keyspace", keyspace));
    }
    if cli.sorted {
        figment = figment.merge(("bulk_loader.sorted", true));
    }
    if let Some(buffer_size_mb) = cli.buffer_size_mb {
        figment = figment.merge(("bulk_loader.buffer_size_mb", buffer_size_mb));
    }
    if let Some(level) = &cli.log_level {
        figment = figment.merge(("logging.level", level));
    }

    let config: Config = figment.extract()?;

    if config.bulk_loader.keyspace.is_empty() {
        anyhow::bail!("keyspace must not be empty");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("bulk_loader").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = get_config(&cli(&["--config", path.to_str().unwrap()])).unwrap();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.paths.output_dir, PathBuf::from("./data"));
        assert_eq!(config.bulk_loader.keyspace, "mappings");
        assert!(!config.bulk_loader.sorted);
        assert_eq!(config.bulk_loader.buffer_size_mb, 128);
        assert_eq!(config.tables.profiles_ttl, Duration::from_secs(2_592_000));
        assert_eq!(config.tables.segments_ttl, Duration::from_secs(7_776_000));
    }

    #[test]
    fn file_values_are_read_and_cli_overrides_them() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
[logging]
level = "debug"

[paths]
output_dir = "/srv/out"

[bulk_loader]
keyspace = "staging"
buffer_size_mb = 8

[tables]
profiles_ttl = 60
"#,
        )
        .unwrap();
        let path = path.to_str().unwrap();

        let config = get_config(&cli(&["--config", path])).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.paths.output_dir, PathBuf::from("/srv/out"));
        assert_eq!(config.bulk_loader.keyspace, "staging");
        assert_eq!(config.bulk_loader.buffer_size_mb, 8);
        assert!(!config.bulk_loader.sorted);
        assert_eq!(config.tables.profiles_ttl, Duration::from_secs(60));
        assert_eq!(config.tables.segments_ttl, SEGMENTS_TTL);

        let config = get_config(&cli(&[
            "--config",
            path,
            "--output-dir",
            "/tmp/elsewhere",
            "--sorted",
            "--buffer-size-mb",
            "1",
            "-k",
            "prod",
            "events.jsonl",
        ]))
        .unwrap();
        assert_eq!(config.paths.output_dir, PathBuf::from("/tmp/elsewhere"));
        assert!(config.bulk_loader.sorted);
        assert_eq!(config.bulk_loader.buffer_size_mb, 1);
        assert_eq!(config.bulk_loader.keyspace, "prod");
    }

    #[test]
    fn inputs_are_positional() {
        let cli = cli(&["a.jsonl", "-", "b.jsonl"]);
        assert_eq!(
            cli.inputs,
            [
                PathBuf::from("a.jsonl"),
                PathBuf::from("-"),
                PathBuf::from("b.jsonl")
            ]
        );
    }

    #[test]
    fn empty_keyspace_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let result = get_config(&cli(&["--config", path.to_str().unwrap(), "-k", ""]));
        assert!(result.is_err());
    }
}
