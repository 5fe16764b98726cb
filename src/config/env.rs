// Environment variable helpers.

use std::num::ParseIntError;

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("ENV variable with key='{0}' not set")]
    Missing(String),

    #[error("ENV variable with key='{key}' can not be parsed to integer: {source}")]
    NotInteger {
        key: String,
        #[source]
        source: ParseIntError,
    },
}

/// Value of `key`, or `default` when unset.
pub fn get_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn get_required(key: &str) -> Result<String, EnvError> {
    std::env::var(key).map_err(|_| EnvError::Missing(key.to_string()))
}

/// Integer value of `key`, or `default` when unset or not an integer.
pub fn get_int_or(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub fn get_int_required(key: &str) -> Result<i64, EnvError> {
    let raw = get_required(key)?;
    raw.trim().parse().map_err(|source| EnvError::NotInteger {
        key: key.to_string(),
        source,
    })
}
