use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_DATA_PATH: &str = "./data/student_data.csv";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// Startup settings, read once from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// CSV file holding the student table (`STUDENT_DATA_PATH`).
    pub data_path: PathBuf,
    /// `HOST`
    pub host: String,
    /// `PORT`
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source; unset keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_path = lookup("STUDENT_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got '{raw}'"))?,
            None => DEFAULT_PORT,
        };
        Ok(Config {
            data_path,
            host,
            port,
        })
    }

    /// `host:port`, resolved when the listener binds.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
    }

    #[test]
    fn overrides_from_environment() {
        let config = Config::from_lookup(lookup(&[
            ("STUDENT_DATA_PATH", "/srv/students.csv"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
        ]))
        .unwrap();
        assert_eq!(config.data_path, PathBuf::from("/srv/students.csv"));
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(Config::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
        assert!(Config::from_lookup(lookup(&[("PORT", "70000")])).is_err());
    }
}
