use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// Monitoring-platform integration settings consumed by the menu service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Platform origin deep links point at, e.g. `https://monitor.example.com`.
    pub app_origin: String,
    /// Business identifier appended to every deep link (`bizId` parameter).
    pub biz_id: String,
    /// Native datasource plugin ids whose targets are always queryable.
    pub queryable_datasources: Vec<String>,
    /// Function ids stripped from normalized output.
    pub excluded_functions: Vec<String>,
    /// Minimum raw-source length before template re-expansion applies.
    pub source_min_len: usize,
    /// Data-retrieval/related-alarms entries require at least one target
    /// with structured metric configs.
    pub require_metric_configs: bool,
}

impl Config {
    /// Load configuration with environment variable override support
    ///
    /// Loading order:
    /// 1. Load from config.toml file
    /// 2. Override with environment variables (prefixed with APP_)
    /// 3. Validate the final configuration
    pub fn load() -> Result<Self, anyhow::Error> {
        Self::load_from(None)
    }

    /// Load configuration from an explicit path (CLI override) or the
    /// default search locations.
    pub fn load_from(path: Option<&str>) -> Result<Self, anyhow::Error> {
        let resolved = path.map(str::to_string).or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = resolved {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_SERVER_HOST: Server host (default: 0.0.0.0)
    /// - APP_SERVER_PORT: Server port (default: 8080)
    /// - APP_LOG_LEVEL: Logging level (e.g., "info,monitor_panel_menu=debug")
    /// - APP_MONITOR_ORIGIN: Monitoring platform origin for deep links
    /// - APP_MONITOR_BIZ_ID: Business identifier for deep links
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Ok(port) = std::env::var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Ok(origin) = std::env::var("APP_MONITOR_ORIGIN") {
            self.monitor.app_origin = origin;
            tracing::info!("Override monitor.app_origin from env: {}", self.monitor.app_origin);
        }

        if let Ok(biz_id) = std::env::var("APP_MONITOR_BIZ_ID") {
            self.monitor.biz_id = biz_id;
            tracing::info!("Override monitor.biz_id from env: {}", self.monitor.biz_id);
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.monitor.app_origin.is_empty() {
            anyhow::bail!("monitor.app_origin cannot be empty");
        }
        if self.monitor.app_origin.ends_with('/') {
            anyhow::bail!("monitor.app_origin must not end with a slash");
        }

        if self.monitor.biz_id.is_empty() {
            anyhow::bail!("monitor.biz_id cannot be empty");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,monitor_panel_menu=debug".to_string(),
            file: Some("logs/monitor-panel-menu.log".to_string()),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            app_origin: "http://localhost".to_string(),
            biz_id: "2".to_string(),
            queryable_datasources: vec![
                "bkmonitor-timeseries-datasource".to_string(),
                "bkmonitor-event-datasource".to_string(),
            ],
            excluded_functions: vec![
                "top".to_string(),
                "bottom".to_string(),
                "time_shift".to_string(),
            ],
            source_min_len: 0,
            require_metric_configs: true,
        }
    }
}
