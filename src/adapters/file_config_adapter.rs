//! INI file configuration adapter.

use crate::domain::error::SmacrossError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;
use std::str::FromStr;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SmacrossError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| SmacrossError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, SmacrossError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SmacrossError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_value<T: FromStr>(
        &self,
        section: &str,
        key: &str,
        default: T,
        kind: &str,
    ) -> Result<T, SmacrossError> {
        match self.config.get(section, key) {
            Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| {
                SmacrossError::invalid(section, key, format!("expected {kind}, got '{raw}'"))
            }),
            _ => Ok(default),
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, SmacrossError> {
        self.parse_value(section, key, default, "an integer")
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SmacrossError> {
        self.parse_value(section, key, default, "a number")
    }
}
