//! Configuration access port trait.

use crate::domain::error::SmacrossError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Integer value, or `default` when the key is absent or blank. A value
    /// that is present but not an integer is `ConfigInvalid`.
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, SmacrossError>;

    /// Like [`ConfigPort::get_int`] for floating-point keys.
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SmacrossError>;

    /// Non-blank string value, or `default`.
    fn get_string_or(&self, section: &str, key: &str, default: &str) -> String {
        self.get_string(section, key)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }
}
