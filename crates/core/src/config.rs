//! Layered configuration: defaults <- home `~/.gamesmith.toml` <- local
//! `./.gamesmith.toml` <- `GAMESMITH_*` environment variables. The API
//! credential never lives in a config file; only the name of the env var it
//! is read from does.

use crate::types::AppConfig;
use std::fs;
use std::path::{Path, PathBuf};
use toml::Value;

pub const LOCAL_CONFIG_FILE: &str = ".gamesmith.toml";

/// Resolves the effective configuration from config files and the process
/// environment.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let home = match home_config_path() {
        Some(path) => read_config_value(&path)?,
        None => None,
    };
    let local = read_config_value(Path::new(LOCAL_CONFIG_FILE))?;
    resolve_config(home, local, |k| std::env::var(k).ok())
}

fn home_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(LOCAL_CONFIG_FILE))
}

fn resolve_config<F>(
    home: Option<Value>,
    local: Option<Value>,
    env_get: F,
) -> anyhow::Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut merged = Value::try_from(AppConfig::default())?;
    if let Some(home_value) = home {
        merge_toml(&mut merged, home_value);
    }
    if let Some(local_value) = local {
        merge_toml(&mut merged, local_value);
    }

    let mut cfg: AppConfig = merged.try_into()?;
    apply_env_overrides(&mut cfg, env_get);
    Ok(cfg)
}

fn read_config_value(path: &Path) -> anyhow::Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    let parsed = raw.parse::<Value>()?;
    Ok(Some(parsed))
}

fn merge_toml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_map), Value::Table(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(base_value) = base_map.get_mut(&key) {
                    merge_toml(base_value, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn apply_env_overrides<F>(cfg: &mut AppConfig, env_get: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = env_get("GAMESMITH_MODEL") {
        cfg.llm.model = v;
    }
    if let Some(v) = env_get("GAMESMITH_ENDPOINT") {
        cfg.llm.endpoint = v;
    }
    if let Some(v) = env_get("GAMESMITH_TEMPERATURE").and_then(|v| v.parse::<f32>().ok()) {
        cfg.llm.temperature = v;
    }
    if let Some(v) = env_get("GAMESMITH_MAX_TOKENS").and_then(|v| v.parse::<u32>().ok()) {
        cfg.llm.max_tokens = v;
    }
    if let Some(v) = env_get("GAMESMITH_API_KEY_ENV_VAR") {
        cfg.llm.api_key_env_var = v;
    }
    if let Some(v) = env_get("GAMESMITH_MAX_RETRIES").and_then(|v| v.parse::<u32>().ok()) {
        cfg.retry.max_retries = v;
    }
    if let Some(v) = env_get("GAMESMITH_ALLOW_SAME_ORIGIN").and_then(|v| parse_bool(&v)) {
        cfg.preview.allow_same_origin = v;
    }
    if let Some(v) = env_get("GAMESMITH_ALLOW_POINTER_LOCK").and_then(|v| parse_bool(&v)) {
        cfg.preview.allow_pointer_lock = v;
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
