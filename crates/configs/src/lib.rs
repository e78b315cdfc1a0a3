use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub services: ServicesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Allowed CORS origins; empty means permissive.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4), cors_origins: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    /// Shared secret expected in the `X-Admin-Secret` header.
    #[serde(default)]
    pub secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    #[serde(default)]
    pub compressor_url: String,
    #[serde(default)]
    pub schedule_url: String,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self { compressor_url: String::new(), schedule_url: String::new(), probe_timeout_secs: default_probe_timeout() }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 5 }
fn default_idle_timeout() -> u64 { 45 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_probe_timeout() -> u64 { 5 }
fn default_true() -> bool { true }

pub const DEFAULT_COMPRESSOR_URL: &str = "http://localhost:5000";
pub const DEFAULT_SCHEDULE_URL: &str = "http://localhost:3000";

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to defaults when no file
    /// exists, then fill blanks from the environment and validate.
    pub fn load_and_validate() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.admin.normalize_from_env();
        self.admin.validate()?;
        self.services.normalize_from_env();
        self.services.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            if !host.trim().is_empty() { self.host = host; }
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AdminConfig {
    pub fn normalize_from_env(&mut self) {
        if self.secret.is_empty() {
            if let Ok(secret) = std::env::var("ADMIN_SECRET") {
                self.secret = secret;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.secret.trim().is_empty() {
            return Err(anyhow!("admin.secret is empty; set it in config.toml or ADMIN_SECRET"));
        }
        Ok(())
    }
}

impl ServicesConfig {
    pub fn normalize_from_env(&mut self) {
        fill_url(&mut self.compressor_url, "COMPRESSOR_URL", DEFAULT_COMPRESSOR_URL);
        fill_url(&mut self.schedule_url, "SCHEDULE_URL", DEFAULT_SCHEDULE_URL);
    }

    pub fn validate(&self) -> Result<()> {
        for (name, url) in [("compressor_url", &self.compressor_url), ("schedule_url", &self.schedule_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow!("services.{name} must start with http:// or https://"));
            }
        }
        if self.probe_timeout_secs == 0 {
            return Err(anyhow!("services.probe_timeout_secs must be >= 1"));
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.probe_timeout_secs)
    }
}

fn fill_url(slot: &mut String, var: &str, fallback: &str) {
    if slot.trim().is_empty() {
        *slot = std::env::var(var).unwrap_or_else(|_| fallback.to_string());
    }
    while slot.ends_with('/') {
        slot.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [database]
        url = "postgres://admin:pw@db:5432/console"

        [admin]
        secret = "s3cret"

        [services]
        compressor_url = "http://compressor:5000/"
        schedule_url = "https://schedule.example.com"
        probe_timeout_secs = 3
    "#;

    #[test]
    fn parses_full_file_and_normalizes_urls() {
        let mut cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.database.max_connections, 10);
        assert!(cfg.database.run_migrations);
        assert_eq!(cfg.services.compressor_url, "http://compressor:5000");
        assert_eq!(cfg.services.probe_timeout(), std::time::Duration::from_secs(3));
    }

    #[test]
    fn rejects_non_postgres_url() {
        let db = DatabaseConfig { url: "mongodb://localhost".into(), ..Default::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_blank_admin_secret() {
        let admin = AdminConfig { secret: "  ".into() };
        assert!(admin.validate().is_err());
    }

    #[test]
    fn rejects_non_http_service_url() {
        let services = ServicesConfig {
            compressor_url: "ftp://compressor".into(),
            schedule_url: DEFAULT_SCHEDULE_URL.into(),
            probe_timeout_secs: 5,
        };
        assert!(services.validate().is_err());
    }

    #[test]
    fn default_probe_timeout_is_five_seconds() {
        assert_eq!(ServicesConfig::default().probe_timeout_secs, 5);
    }
}
