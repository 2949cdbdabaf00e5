use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

use grin_api::upload::CleanupPolicy;
use grin_db::clock::DEFAULT_UTC_OFFSET_HOURS;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub images_dir: PathBuf,
    pub static_dir: PathBuf,
    pub model_path: PathBuf,
    pub max_upload_bytes: usize,
    pub cleanup: CleanupPolicy,
    pub utc_offset_hours: i32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let cleanup = if parse_bool(&string("GRIN_CLEANUP_ON_FAILURE", "false"))
            .context("GRIN_CLEANUP_ON_FAILURE")?
        {
            CleanupPolicy::DeleteOnFailure
        } else {
            CleanupPolicy::Keep
        };

        let utc_offset_hours: i32 = parse(&lookup, "GRIN_UTC_OFFSET_HOURS", DEFAULT_UTC_OFFSET_HOURS)?;
        if !(-23..=23).contains(&utc_offset_hours) {
            bail!("GRIN_UTC_OFFSET_HOURS must be between -23 and 23, got {}", utc_offset_hours);
        }

        Ok(Self {
            host: string("GRIN_HOST", "0.0.0.0"),
            port: parse(&lookup, "GRIN_PORT", 8000)?,
            db_path: string("GRIN_DB_PATH", "grin.db").into(),
            images_dir: string("GRIN_IMAGES_DIR", "images").into(),
            static_dir: string("GRIN_STATIC_DIR", "static").into(),
            model_path: string("GRIN_MODEL_PATH", "my_model.onnx").into(),
            max_upload_bytes: parse(&lookup, "GRIN_MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            cleanup,
            utc_offset_hours,
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.images_dir, PathBuf::from("images"));
        assert_eq!(config.model_path, PathBuf::from("my_model.onnx"));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.cleanup, CleanupPolicy::Keep);
        assert_eq!(config.utc_offset_hours, 6);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("GRIN_PORT", "9090"),
            ("GRIN_CLEANUP_ON_FAILURE", "yes"),
            ("GRIN_UTC_OFFSET_HOURS", "-3"),
            ("GRIN_DB_PATH", "/tmp/h.db"),
        ])
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.cleanup, CleanupPolicy::DeleteOnFailure);
        assert_eq!(config.utc_offset_hours, -3);
        assert_eq!(config.db_path, PathBuf::from("/tmp/h.db"));
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(config_from(&[("GRIN_PORT", "eighty")]).is_err());
        assert!(config_from(&[("GRIN_CLEANUP_ON_FAILURE", "maybe")]).is_err());
        assert!(config_from(&[("GRIN_UTC_OFFSET_HOURS", "40")]).is_err());
    }
}
