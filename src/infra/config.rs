// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "minseek.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub runs: RunDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

/// Fallbacks applied when a run request leaves a knob unset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RunDefaults {
    pub max_iter: u32,
    pub eps: f64,
    pub sample_points: usize,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            max_iter: 200,
            eps: 1e-5,
            sample_points: 400,
        }
    }
}

impl Config {
    /// Load config from `./minseek.toml`, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.server.host, "127.0.0.1");
        assert_eq!(c.server.port, 8080);
        assert_eq!(c.runs.max_iter, 200);
        assert!((c.runs.eps - 1e-5).abs() < 1e-12);
        assert_eq!(c.runs.sample_points, 400);
    }

    #[test]
    fn test_partial_toml_fills_missing_sections() {
        let c: Config = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(c.server.port, 9000);
        assert_eq!(c.server.host, "127.0.0.1");
        assert_eq!(c.runs.max_iter, 200);
    }

    #[test]
    fn test_runs_section_overrides() {
        let c: Config = toml::from_str("[runs]\nmax_iter = 50\neps = 0.001\n").unwrap();
        assert_eq!(c.runs.max_iter, 50);
        assert!((c.runs.eps - 0.001).abs() < 1e-12);
        assert_eq!(c.runs.sample_points, 400);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nhost = \"0.0.0.0\"\nport = 3000").unwrap();
        let c = Config::load_from(file.path()).unwrap();
        assert_eq!(c.server.host, "0.0.0.0");
        assert_eq!(c.server.port, 3000);
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = oops").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }
}
