use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 8080 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
    /// Sent to Telegram as `secret_token` and required back on every webhook call.
    #[serde(default)]
    pub webhook_secret: Option<String>,
    #[serde(default)]
    pub admin_id: Option<i64>,
    #[serde(default)]
    pub enable_whitelist: bool,
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            webhook_url: String::new(),
            webhook_path: default_webhook_path(),
            webhook_secret: None,
            admin_id: None,
            enable_whitelist: false,
            debug_mode: false,
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    #[serde(default = "default_whitelist_path")]
    pub whitelist_path: PathBuf,
    #[serde(default = "default_messages_path")]
    pub messages_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            whitelist_path: default_whitelist_path(),
            messages_path: default_messages_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

fn default_webhook_path() -> String { "/".into() }
fn default_api_base_url() -> String { "https://api.telegram.org".into() }
fn default_request_timeout() -> u64 { 30 }
fn default_data_path() -> PathBuf { PathBuf::from("data/data.json") }
fn default_whitelist_path() -> PathBuf { PathBuf::from("configs/whitelist.json") }
fn default_messages_path() -> PathBuf { PathBuf::from("configs/messages.json") }
fn default_log_format() -> String { "compact".into() }

/// Load `CONFIG_PATH` (default `config.toml`); a missing file yields defaults.
pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    match std::fs::metadata(&path) {
        Ok(_) => load_from_file(&path),
        Err(_) => Ok(AppConfig::default()),
    }
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

/// Parse boolean flags the way `ENABLE_WHITELIST=1` style env vars are usually written.
/// Anything unrecognised is `false`.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "t" | "true"
    )
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())?;
        self.validate()
    }

    /// Overlay values from the environment. `lookup` is injected so tests never touch process env.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| anyhow!("SERVER_PORT is not a valid port: {port}"))?;
        }
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.bot.token = token;
        }
        if let Some(url) = lookup("WEBHOOK_URL") {
            self.bot.webhook_url = url;
        }
        if let Some(path) = lookup("WEBHOOK_PATH") {
            self.bot.webhook_path = path;
        }
        if let Some(secret) = lookup("WEBHOOK_SECRET") {
            self.bot.webhook_secret = Some(secret);
        }
        if let Some(admin) = lookup("ADMIN_ID") {
            let id = admin
                .trim()
                .parse::<i64>()
                .map_err(|_| anyhow!("ADMIN_ID is not an integer: {admin}"))?;
            self.bot.admin_id = Some(id);
        }
        if let Some(flag) = lookup("ENABLE_WHITELIST") {
            self.bot.enable_whitelist = parse_flag(&flag);
        }
        if let Some(flag) = lookup("DEBUG_MODE") {
            self.bot.debug_mode = parse_flag(&flag);
        }
        if let Some(url) = lookup("TELEGRAM_API_URL") {
            self.bot.api_base_url = url;
        }
        if let Some(path) = lookup("STORAGE_FILE_PATH").filter(|p| !p.trim().is_empty()) {
            self.storage.data_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("WHITELIST_PATH").filter(|p| !p.trim().is_empty()) {
            self.storage.whitelist_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("MESSAGES_PATH").filter(|p| !p.trim().is_empty()) {
            self.storage.messages_path = PathBuf::from(path);
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.log.format = format;
        }
        Ok(())
    }

    pub fn validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.bot.normalize_and_validate()
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "0.0.0.0".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host.trim(), self.port)
    }
}

impl BotConfig {
    fn normalize_and_validate(&mut self) -> Result<()> {
        self.token = self.token.trim().to_string();
        self.webhook_url = self.webhook_url.trim().to_string();
        self.webhook_path = self.webhook_path.trim().to_string();
        self.api_base_url = self.api_base_url.trim().trim_end_matches('/').to_string();

        if self.token.is_empty() {
            return Err(anyhow!("bot.token is empty; set it in config.toml or TELEGRAM_BOT_TOKEN"));
        }
        if self.webhook_url.is_empty() {
            return Err(anyhow!("bot.webhook_url is empty; set it in config.toml or WEBHOOK_URL"));
        }
        if self.admin_id.is_none() {
            return Err(anyhow!("bot.admin_id is not set; set it in config.toml or ADMIN_ID"));
        }
        if !self.webhook_path.starts_with('/') {
            return Err(anyhow!("bot.webhook_path must start with '/'"));
        }
        if self.webhook_path == "/health" {
            return Err(anyhow!("bot.webhook_path must not shadow /health"));
        }
        self.webhook_secret = self
            .webhook_secret
            .take()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(secret) = &self.webhook_secret {
            // Telegram accepts 1-256 characters from A-Z, a-z, 0-9, _ and -
            let valid = secret.len() <= 256
                && secret.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if !valid {
                return Err(anyhow!("bot.webhook_secret must be 1-256 characters of A-Z, a-z, 0-9, _ or -"));
            }
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("WEBHOOK_URL", "https://example.com/hook"),
            ("ADMIN_ID", "42"),
        ]
    }

    #[test]
    fn defaults_are_filled() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.bot.webhook_path, "/");
        assert_eq!(cfg.storage.data_path, PathBuf::from("data/data.json"));
        assert_eq!(cfg.log.format, "compact");
    }

    #[test]
    fn env_overrides_and_validates() -> Result<()> {
        let mut pairs = required();
        pairs.push(("STORAGE_FILE_PATH", "/tmp/notes.json"));
        pairs.push(("ENABLE_WHITELIST", "TRUE"));
        pairs.push(("SERVER_PORT", "9000"));
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&pairs))?;
        cfg.validate()?;
        assert_eq!(cfg.bot.admin_id, Some(42));
        assert!(cfg.bot.enable_whitelist);
        assert!(!cfg.bot.debug_mode);
        assert_eq!(cfg.server.bind_addr(), "0.0.0.0:9000");
        assert_eq!(cfg.storage.data_path, PathBuf::from("/tmp/notes.json"));
        Ok(())
    }

    #[test]
    fn empty_storage_path_keeps_default() -> Result<()> {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[("STORAGE_FILE_PATH", "  ")]))?;
        assert_eq!(cfg.storage.data_path, PathBuf::from("data/data.json"));
        Ok(())
    }

    #[test]
    fn missing_required_values_fail() -> Result<()> {
        for missing in ["TELEGRAM_BOT_TOKEN", "WEBHOOK_URL", "ADMIN_ID"] {
            let pairs: Vec<_> = required().into_iter().filter(|(k, _)| *k != missing).collect();
            let mut cfg = AppConfig::default();
            cfg.apply_env(env(&pairs))?;
            assert!(cfg.validate().is_err(), "{missing} should be required");
        }
        Ok(())
    }

    #[test]
    fn webhook_path_is_checked() -> Result<()> {
        for bad in ["hook", "/health"] {
            let mut pairs = required();
            pairs.push(("WEBHOOK_PATH", bad));
            let mut cfg = AppConfig::default();
            cfg.apply_env(env(&pairs))?;
            assert!(cfg.validate().is_err(), "{bad} should be rejected");
        }
        Ok(())
    }

    #[test]
    fn webhook_secret_is_optional_and_checked() -> Result<()> {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&required()))?;
        cfg.validate()?;
        assert_eq!(cfg.bot.webhook_secret, None);

        let mut pairs = required();
        pairs.push(("WEBHOOK_SECRET", " s3cret_token-1 "));
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&pairs))?;
        cfg.validate()?;
        assert_eq!(cfg.bot.webhook_secret.as_deref(), Some("s3cret_token-1"));

        let mut pairs = required();
        pairs.push(("WEBHOOK_SECRET", "not allowed!"));
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&pairs))?;
        assert!(cfg.validate().is_err());
        Ok(())
    }

    #[test]
    fn bad_admin_id_is_rejected() {
        let mut cfg = AppConfig::default();
        assert!(cfg.apply_env(env(&[("ADMIN_ID", "admin")])).is_err());
    }

    #[test]
    fn flags_parse_loosely() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" true "));
        assert!(parse_flag("T"));
        assert!(!parse_flag("yes"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn toml_file_is_read() -> Result<()> {
        let path = std::env::temp_dir().join(format!("configs_{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "[server]\nhost = \"127.0.0.1\"\nport = 8443\n\n[bot]\ntoken = \"t\"\nwebhook_url = \"https://h\"\nadmin_id = 7\nwebhook_path = \"/hook\"\n",
        )?;
        let mut cfg = load_from_file(path.to_str().ok_or_else(|| anyhow!("non-utf8 temp path"))?)?;
        cfg.validate()?;
        assert_eq!(cfg.server.bind_addr(), "127.0.0.1:8443");
        assert_eq!(cfg.bot.admin_id, Some(7));
        assert_eq!(cfg.bot.webhook_path, "/hook");
        assert_eq!(cfg.storage.messages_path, PathBuf::from("configs/messages.json"));
        let _ = std::fs::remove_file(&path);
        Ok(())
    }
}
