use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Destination address (sender) or bind address (listener)
    pub target: String,

    /// Destination or bind port
    pub port: u16,

    /// Accept inbound connections instead of connecting out
    pub listen: bool,

    /// Serve an interactive command shell per connection
    pub shell: bool,

    /// Command executed once per connection, output returned to the peer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execute: Option<String>,

    /// Destination path for bytes uploaded by the peer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<PathBuf>,

    /// Bound on command execution, in seconds (absent = wait forever)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec_timeout_secs: Option<u64>,
}

/// What a handler does with one accepted connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode<'a> {
    Execute(&'a str),
    Upload(&'a Path),
    Shell,
    Relay,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: "192.168.1.203".to_string(),
            port: 5555,
            listen: false,
            shell: false,
            execute: None,
            upload: None,
            exec_timeout_secs: None,
        }
    }
}

impl Config {
    /// Per-connection behavior. First match wins: execute, then
    /// upload, then shell; with none set the handler just closes.
    pub fn mode(&self) -> Mode<'_> {
        if let Some(command) = &self.execute {
            Mode::Execute(command)
        } else if let Some(path) = &self.upload {
            Mode::Upload(path)
        } else if self.shell {
            Mode::Shell
        } else {
            Mode::Relay
        }
    }

    pub fn exec_timeout(&self) -> Option<Duration> {
        self.exec_timeout_secs.map(Duration::from_secs)
    }

    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::RcatError::Config(e.to_string()))?;
        if config.port == 0 {
            return Err(crate::RcatError::Config("port must be 1-65535".into()));
        }
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> crate::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::RcatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_classic_ones() {
        let config = Config::default();
        assert_eq!(config.port, 5555);
        assert!(!config.listen);
        assert_eq!(config.mode(), Mode::Relay);
    }

    #[test]
    fn execute_wins_over_upload_and_shell() {
        let config = Config {
            execute: Some("id".into()),
            upload: Some("/tmp/drop".into()),
            shell: true,
            ..Config::default()
        };
        assert_eq!(config.mode(), Mode::Execute("id"));
    }

    #[test]
    fn upload_wins_over_shell() {
        let config = Config {
            upload: Some("/tmp/drop".into()),
            shell: true,
            ..Config::default()
        };
        assert_eq!(config.mode(), Mode::Upload(Path::new("/tmp/drop")));
    }

    #[test]
    fn shell_comes_last() {
        let config = Config {
            shell: true,
            ..Config::default()
        };
        assert_eq!(config.mode(), Mode::Shell);
    }

    #[test]
    fn file_with_port_zero_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rcat.toml");
        std::fs::write(&path, "port = 0\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, crate::RcatError::Config(_)));
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rcat.toml");

        let config = Config {
            listen: true,
            execute: Some("uname -a".into()),
            ..Config::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.port, config.port);
        assert!(loaded.listen);
        assert_eq!(loaded.execute.as_deref(), Some("uname -a"));
        assert_eq!(loaded.mode(), Mode::Execute("uname -a"));
    }
}
