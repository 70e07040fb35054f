//! CLI argument definitions for the ragchat server.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// ragchat - a conversational API over retrieval-augmented generation.
#[derive(Parser, Debug)]
#[command(name = "ragchat", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// API server bind address.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Directory holding the documents to index.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level or filter directive (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > RAGCHAT_CONFIG env var > ./config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_with(std::env::var("RAGCHAT_CONFIG").ok())
    }

    fn resolve_config_path_with(&self, env_value: Option<String>) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = env_value.filter(|p| !p.trim().is_empty()) {
            return PathBuf::from(p);
        }
        PathBuf::from("config.toml")
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > RAGCHAT_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        self.resolve_port_with(std::env::var("RAGCHAT_PORT").ok(), config_port)
    }

    fn resolve_port_with(&self, env_value: Option<String>, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Some(p) = env_value.and_then(|v| v.trim().parse::<u16>().ok()) {
            return p;
        }
        config_port
    }

    /// Bind address override, if given.
    pub fn resolve_host(&self) -> Option<String> {
        self.host.clone()
    }

    /// Data directory override, if given.
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("ragchat").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = parse(&[
            "--config", "custom.toml", "--port", "9000", "--host", "0.0.0.0", "--data-dir",
            "/srv/docs", "--log-level", "debug",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.resolve_host().as_deref(), Some("0.0.0.0"));
        assert_eq!(cli.resolve_data_dir().as_deref(), Some("/srv/docs"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_config_path_priority() {
        let cli = parse(&["-c", "flag.toml"]);
        assert_eq!(
            cli.resolve_config_path_with(Some("env.toml".into())),
            PathBuf::from("flag.toml")
        );

        let cli = parse(&[]);
        assert_eq!(
            cli.resolve_config_path_with(Some("env.toml".into())),
            PathBuf::from("env.toml")
        );
        assert_eq!(cli.resolve_config_path_with(None), PathBuf::from("config.toml"));
    }

    #[test]
    fn test_port_priority() {
        let cli = parse(&["-p", "7000"]);
        assert_eq!(cli.resolve_port_with(Some("7100".into()), 8000), 7000);

        let cli = parse(&[]);
        assert_eq!(cli.resolve_port_with(Some("7100".into()), 8000), 7100);
        assert_eq!(cli.resolve_port_with(Some("not-a-port".into()), 8000), 8000);
        assert_eq!(cli.resolve_port_with(None, 8000), 8000);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(CliArgs::try_parse_from(["ragchat", "--port", "99999"]).is_err());
    }
}
