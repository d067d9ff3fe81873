use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub attribution: AttributionConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub triggers: TriggerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// CRM capture endpoint the gateway forwards accepted leads to
    #[serde(default = "default_capture_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_capture_timeout_secs")]
    pub timeout_secs: u64,
    /// When true, delivery failures are returned to the caller instead of
    /// being absorbed (soft-fail is the default funnel behaviour)
    #[serde(default)]
    pub strict: bool,
    /// Value reported as `source` when the caller does not supply one
    #[serde(default = "default_capture_source")]
    pub default_source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionConfig {
    /// Optional JSON snapshot file for first-touch records
    #[serde(default)]
    pub snapshot_file: Option<String>,
    /// In-memory retention for first-touch records, in days
    #[serde(default = "default_attribution_ttl_days")]
    pub ttl_days: u64,
    #[serde(default = "default_attribution_capacity")]
    pub max_sessions: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    #[serde(default = "default_journal_file")]
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Seconds on page before the time trigger may fire
    #[serde(default = "default_trigger_time_secs")]
    pub time_delay_secs: u64,
    /// Scroll depth percentage before the scroll trigger may fire
    #[serde(default = "default_trigger_scroll_pct")]
    pub scroll_depth_pct: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub admin_token: String,
    #[serde(default)]
    pub health_token: String,
    #[serde(default = "default_admin_prefix")]
    pub admin_prefix: String,
    #[serde(default = "default_health_prefix")]
    pub health_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub enable_rotation: bool,
    #[serde(default = "default_log_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_capture_endpoint() -> String {
    "http://127.0.0.1:8000/api/leads/capture/".to_string()
}

fn default_capture_timeout_secs() -> u64 {
    5
}

fn default_capture_source() -> String {
    "website".to_string()
}

fn default_attribution_ttl_days() -> u64 {
    30
}

fn default_attribution_capacity() -> u64 {
    100_000
}

fn default_journal_file() -> String {
    "leads.json".to_string()
}

fn default_trigger_time_secs() -> u64 {
    8
}

fn default_trigger_scroll_pct() -> u8 {
    35
}

fn default_admin_prefix() -> String {
    "/admin".to_string()
}

fn default_health_prefix() -> String {
    "/health".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_max_backups() -> u32 {
    7
}

fn default_log_format() -> String {
    "plain".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            capture: CaptureConfig::default(),
            attribution: AttributionConfig::default(),
            journal: JournalConfig::default(),
            triggers: TriggerConfig::default(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            endpoint: default_capture_endpoint(),
            timeout_secs: default_capture_timeout_secs(),
            strict: false,
            default_source: default_capture_source(),
        }
    }
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            snapshot_file: None,
            ttl_days: default_attribution_ttl_days(),
            max_sessions: default_attribution_capacity(),
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            file: default_journal_file(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            time_delay_secs: default_trigger_time_secs(),
            scroll_depth_pct: default_trigger_scroll_pct(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            admin_token: String::new(),
            health_token: String::new(),
            admin_prefix: default_admin_prefix(),
            health_prefix: default_health_prefix(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            enable_rotation: false,
            max_backups: default_log_max_backups(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file with environment variable fallback
    pub fn load() -> Self {
        let mut config = Self::load_from_file();
        config.override_with_env();
        config
    }

    /// Load configuration from TOML file
    fn load_from_file() -> Self {
        let config_paths = [
            "config.toml",
            "leadgate.toml",
            "config/config.toml",
            "/etc/leadgate/config.toml",
        ];

        for path in &config_paths {
            if Path::new(path).exists() {
                debug!("Loading config from: {}", path);
                match fs::read_to_string(path) {
                    Ok(content) => match toml::from_str::<Config>(&content) {
                        Ok(config) => {
                            debug!("Successfully loaded config from: {}", path);
                            return config;
                        }
                        Err(e) => {
                            warn!("Failed to parse config file {}: {}", path, e);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config file {}: {}", path, e);
                    }
                }
            }
        }

        debug!("No config file found, using defaults");
        Self::default()
    }

    /// Override configuration with environment variables
    fn override_with_env(&mut self) {
        // Server config
        if let Ok(host) = env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("SERVER_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(cpu_count) = env::var("CPU_COUNT") {
            if let Ok(count) = cpu_count.parse() {
                self.server.cpu_count = count;
            }
        }

        // Capture config
        if let Ok(endpoint) = env::var("CAPTURE_ENDPOINT") {
            self.capture.endpoint = endpoint;
        }
        if let Ok(timeout) = env::var("CAPTURE_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse() {
                self.capture.timeout_secs = timeout;
            }
        }
        if let Ok(strict) = env::var("CAPTURE_STRICT") {
            self.capture.strict = strict == "true";
        }
        if let Ok(source) = env::var("CAPTURE_DEFAULT_SOURCE") {
            self.capture.default_source = source;
        }

        // Attribution config
        if let Ok(snapshot) = env::var("ATTRIBUTION_FILE") {
            self.attribution.snapshot_file = Some(snapshot);
        }
        if let Ok(ttl) = env::var("ATTRIBUTION_TTL_DAYS") {
            if let Ok(ttl) = ttl.parse() {
                self.attribution.ttl_days = ttl;
            }
        }

        // Journal config
        if let Ok(file) = env::var("JOURNAL_FILE") {
            self.journal.file = file;
        }

        // Trigger config
        if let Ok(secs) = env::var("TRIGGER_TIME_SECS") {
            if let Ok(secs) = secs.parse() {
                self.triggers.time_delay_secs = secs;
            }
        }
        if let Ok(pct) = env::var("TRIGGER_SCROLL_PCT") {
            if let Ok(pct) = pct.parse() {
                self.triggers.scroll_depth_pct = pct;
            }
        }

        // API config
        if let Ok(admin_token) = env::var("ADMIN_TOKEN") {
            self.api.admin_token = admin_token;
        }
        if let Ok(health_token) = env::var("HEALTH_TOKEN") {
            self.api.health_token = health_token;
        }
        if let Ok(admin_prefix) = env::var("ADMIN_ROUTE_PREFIX") {
            self.api.admin_prefix = admin_prefix;
        }
        if let Ok(health_prefix) = env::var("HEALTH_ROUTE_PREFIX") {
            self.api.health_prefix = health_prefix;
        }

        // Logging config
        if let Ok(log_level) = env::var("RUST_LOG") {
            self.logging.level = log_level;
        }
        if let Ok(log_file) = env::var("LOG_FILE") {
            self.logging.file = Some(log_file);
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Generate a sample TOML configuration file
    pub fn generate_sample_config() -> String {
        let sample_config = Config::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// Save current configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> crate::errors::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::errors::LeadgateError::serialization(e.to_string()))?;
        fs::write(path, content)
            .map_err(|e| crate::errors::LeadgateError::config_load(e.to_string()))?;
        Ok(())
    }
}

// Global configuration instance
use std::sync::OnceLock;
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration instance
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::load)
}

/// Initialize the global configuration
pub fn init_config() {
    CONFIG.get_or_init(Config::load);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.triggers.time_delay_secs, 8);
        assert_eq!(config.triggers.scroll_depth_pct, 35);
        assert!(!config.capture.strict);
        assert_eq!(config.attribution.ttl_days, 30);
    }

    #[test]
    fn test_sample_config_roundtrip() {
        let sample = Config::generate_sample_config();
        let parsed: Config = toml::from_str(&sample).expect("sample config must parse");
        assert_eq!(parsed.server.host, "127.0.0.1");
        assert_eq!(parsed.journal.file, "leads.json");
    }
}
