use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use notifier::{utc_offset_from_hours, PushConfig, PushCredentials, LINE_PUSH_ENDPOINT};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub catalog_path: Option<String>,
    pub line_channel_access_token: Option<String>,
    pub line_user_id: Option<String>,
    pub push_endpoint: String,
    pub dispatch_timeout_secs: u64,
    pub utc_offset_hours: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3000".into(),
            catalog_path: None,
            line_channel_access_token: None,
            line_user_id: None,
            push_endpoint: LINE_PUSH_ENDPOINT.into(),
            dispatch_timeout_secs: 10,
            utc_offset_hours: 8,
        }
    }
}

impl Settings {
    pub fn push_config(&self) -> anyhow::Result<PushConfig> {
        let endpoint = Url::parse(&self.push_endpoint)
            .with_context(|| format!("invalid push endpoint '{}'", self.push_endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            anyhow::bail!("push endpoint must be http(s): '{endpoint}'");
        }

        Ok(PushConfig {
            endpoint: endpoint.to_string(),
            credentials: PushCredentials::from_parts(
                self.line_channel_access_token.clone(),
                self.line_user_id.clone(),
            ),
            timeout: Duration::from_secs(self.dispatch_timeout_secs.max(1)),
            utc_offset: utc_offset_from_hours(self.utc_offset_hours),
        })
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    apply_file(&mut settings, Path::new("server.toml"));
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    match toml::from_str::<HashMap<String, String>>(&raw) {
        Ok(file_cfg) => apply_file_values(settings, &file_cfg),
        Err(error) => tracing::warn!(path = %path.display(), %error, "ignoring malformed config file"),
    }
}

fn apply_file_values(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("catalog_path") {
        settings.catalog_path = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("line_channel_access_token") {
        settings.line_channel_access_token = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("line_user_id") {
        settings.line_user_id = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("push_endpoint") {
        settings.push_endpoint = v.clone();
    }
    if let Some(parsed) = file_cfg.get("dispatch_timeout_secs").and_then(|v| v.parse().ok()) {
        settings.dispatch_timeout_secs = parsed;
    }
    if let Some(parsed) = file_cfg.get("utc_offset_hours").and_then(|v| v.parse().ok()) {
        settings.utc_offset_hours = parsed;
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = var("CATALOG_PATH") {
        settings.catalog_path = Some(v);
    }
    if let Some(v) = var("APP__CATALOG_PATH") {
        settings.catalog_path = Some(v);
    }

    if let Some(v) = var("LINE_CHANNEL_ACCESS_TOKEN") {
        settings.line_channel_access_token = Some(v);
    }
    if let Some(v) = var("APP__LINE_CHANNEL_ACCESS_TOKEN") {
        settings.line_channel_access_token = Some(v);
    }

    if let Some(v) = var("LINE_USER_ID") {
        settings.line_user_id = Some(v);
    }
    if let Some(v) = var("APP__LINE_USER_ID") {
        settings.line_user_id = Some(v);
    }

    if let Some(v) = var("APP__PUSH_ENDPOINT") {
        settings.push_endpoint = v;
    }

    if let Some(v) = var("APP__DISPATCH_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.dispatch_timeout_secs = parsed;
        }
    }
    if let Some(v) = var("APP__UTC_OFFSET_HOURS") {
        if let Ok(parsed) = v.parse::<i32>() {
            settings.utc_offset_hours = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
