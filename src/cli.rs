//! Command-line interface.

use std::path::PathBuf;

use bomb_gomoku::config::{ConfigError, LogFormat, ServerConfig};
use clap::Parser;

/// Bomb Gomoku - two-player five-in-a-row session server
#[derive(Parser, Debug)]
#[command(name = "bomb-gomoku")]
#[command(about = "Room server for two-player five-in-a-row with bombs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// TOML config file
    #[arg(short, long, env = "BOMB_GOMOKU_CONFIG")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long, env = "BOMB_GOMOKU_HOST")]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long, env = "BOMB_GOMOKU_PORT")]
    pub port: Option<u16>,

    /// Log filter, e.g. `debug` or `bomb_gomoku=trace`
    #[arg(long, env = "BOMB_GOMOKU_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log line format
    #[arg(long, value_enum, env = "BOMB_GOMOKU_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Echo moves back to the peer that made them
    #[arg(long, env = "BOMB_GOMOKU_ECHO_MOVES")]
    pub echo_moves: bool,
}

impl Cli {
    /// Load the config file (if any) and apply command-line overrides.
    pub fn resolve(self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };

        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if self.echo_moves {
            config.relay.echo_to_sender = true;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_flags() {
        let cli = Cli::try_parse_from(["bomb-gomoku"]).unwrap();
        assert_eq!(cli.resolve().unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_flags_override() {
        let cli = Cli::try_parse_from([
            "bomb-gomoku",
            "--port",
            "4000",
            "--host",
            "127.0.0.1",
            "--log-format",
            "json",
            "--echo-moves",
        ])
        .unwrap();
        let config = cli.resolve().unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:4000");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.relay.echo_to_sender);
    }

    #[test]
    fn test_bad_port_rejected() {
        assert!(Cli::try_parse_from(["bomb-gomoku", "--port", "99999"]).is_err());
    }
}
