use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Configuration {
    #[serde(default)]
    pub server: ServerConfiguration,
    #[serde(default)]
    pub twitter: TwitterConfiguration,
    #[serde(default)]
    pub database: DatabaseConfiguration,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfiguration {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL of this deployment, used to build OAuth callback URLs.
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Lifetime of a pending authorization, in seconds.
    #[serde(default = "default_state_ttl")]
    pub state_ttl_seconds: u64,

    /// Interval between sweeps of expired pending authorizations.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TwitterConfiguration {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,

    /// Force demo mode even when API credentials are configured.
    #[serde(default)]
    pub demo_mode: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfiguration {
    #[serde(default = "default_database_path")]
    pub path: String,

    /// 64 hex chars (32 bytes) used to encrypt stored account credentials.
    /// When absent an ephemeral key is generated at startup.
    pub encryption_key: Option<String>,
}

/// Which OAuth path the process runs, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthMode {
    Demo,
    Live,
}

impl TwitterConfiguration {
    pub fn has_credentials(&self) -> bool {
        matches!((&self.api_key, &self.api_secret), (Some(k), Some(s)) if !k.is_empty() && !s.is_empty())
    }

    /// Demo when explicitly requested or when credentials are missing,
    /// live otherwise.
    pub fn oauth_mode(&self) -> OAuthMode {
        if self.demo_mode || !self.has_credentials() {
            OAuthMode::Demo
        } else {
            OAuthMode::Live
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_state_ttl() -> u64 {
    600
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_database_path() -> String {
    "mythos.db".to_string()
}

impl Default for ServerConfiguration {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
            state_ttl_seconds: default_state_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl Default for DatabaseConfiguration {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            encryption_key: None,
        }
    }
}

impl Configuration {
    pub fn new() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(config::File::with_name("config"));
        }

        builder = builder.add_source(config::Environment::with_prefix("MYTHOS").separator("__"));

        builder.build()?.try_deserialize()
    }
}
