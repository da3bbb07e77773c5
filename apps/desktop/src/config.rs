use std::{fs, path::Path, path::PathBuf, time::Duration};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: String,
    pub max_spp: String,
    pub output_dir: PathBuf,
    pub connect_timeout_secs: u64,
    pub log_filter: String,
    pub save_on_complete: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8030".into(),
            max_spp: String::new(),
            output_dir: PathBuf::from("."),
            connect_timeout_secs: 10,
            log_filter: "info".into(),
            save_on_complete: false,
        }
    }
}

impl Settings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    endpoint: Option<String>,
    max_spp: Option<String>,
    output_dir: Option<PathBuf>,
    connect_timeout_secs: Option<u64>,
    log_filter: Option<String>,
    save_on_complete: Option<bool>,
}

/// Defaults, then `path` if it exists, then `APP__*` environment variables.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.endpoint {
        settings.endpoint = v;
    }
    if let Some(v) = file_cfg.max_spp {
        settings.max_spp = v;
    }
    if let Some(v) = file_cfg.output_dir {
        settings.output_dir = v;
    }
    if let Some(v) = file_cfg.connect_timeout_secs {
        settings.connect_timeout_secs = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    if let Some(v) = file_cfg.save_on_complete {
        settings.save_on_complete = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("APP__ENDPOINT") {
        settings.endpoint = v;
    }
    if let Some(v) = lookup("APP__MAX_SPP") {
        settings.max_spp = v;
    }
    if let Some(v) = lookup("APP__OUTPUT_DIR") {
        settings.output_dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("APP__CONNECT_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.connect_timeout_secs = parsed;
        }
    }
    if let Some(v) = lookup("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
