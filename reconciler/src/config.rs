use std::{collections::HashSet, fmt, fs, path::Path, time::Duration};

use glow_client::{api::GlowEndpoint, domain::TrackedResource};
use serde::Deserialize;

use crate::reconcile::Cadence;

pub const CONFIG_PATH_ENV: &str = "RECONCILER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "reconciler.toml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub startup_delay_secs: u64,
    pub catchup_delay_secs: u64,
    pub catchup_grace_secs: u64,
    pub jitter: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            startup_delay_secs: 15,
            catchup_delay_secs: 120,
            catchup_grace_secs: 300,
            jitter: 0.3,
        }
    }
}

impl ScheduleConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }

    pub fn cadence(&self) -> Cadence {
        Cadence {
            catchup_delay: Duration::from_secs(self.catchup_delay_secs),
            catchup_grace: Duration::from_secs(self.catchup_grace_secs),
            jitter: self.jitter,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlowConfig {
    pub base_url: String,
    pub application_id: String,
}

impl Default for GlowConfig {
    fn default() -> Self {
        let endpoint = GlowEndpoint::default();
        Self {
            base_url: endpoint.base_url,
            application_id: endpoint.application_id,
        }
    }
}

impl GlowConfig {
    pub fn endpoint(&self) -> GlowEndpoint {
        GlowEndpoint {
            base_url: self.base_url.clone(),
            application_id: self.application_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    QuestdbIlp,
    QuestdbHttp,
    InfluxHttp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub kind: StoreKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub resources: Vec<TrackedResource>,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub glow: GlowConfig,
    pub store: StoreConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        use std::env;

        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(path)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().display().to_string();
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let cfg: AppConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.resources.is_empty() {
            return Err(ConfigError::Invalid("at least one resource must be tracked".to_string()));
        }

        let mut names = HashSet::new();
        for resource in &self.resources {
            if resource.name.is_empty() {
                return Err(ConfigError::Invalid("resource names must not be empty".to_string()));
            }
            if !names.insert(resource.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate resource name {:?}", resource.name)));
            }
        }

        if !(0.0..1.0).contains(&self.schedule.jitter) {
            return Err(ConfigError::Invalid(format!(
                "schedule.jitter must be in [0, 1), got {}",
                self.schedule.jitter
            )));
        }

        Ok(())
    }
}

pub struct GlowCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for GlowCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum StoreConnection {
    /// `addr` is the `host:port` of the ILP/TCP listener; `http_url` serves
    /// table setup.
    QuestDbIlp {
        addr: String,
        http_url: String,
    },
    QuestDbHttp {
        http_url: String,
    },
    InfluxHttp {
        host: String,
        token: String,
        org: String,
        bucket: String,
    },
}

impl fmt::Debug for StoreConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuestDbIlp { addr, http_url } => f
                .debug_struct("QuestDbIlp")
                .field("addr", addr)
                .field("http_url", http_url)
                .finish(),
            Self::QuestDbHttp { http_url } => f.debug_struct("QuestDbHttp").field("http_url", http_url).finish(),
            Self::InfluxHttp { host, org, bucket, .. } => f
                .debug_struct("InfluxHttp")
                .field("host", host)
                .field("org", org)
                .field("bucket", bucket)
                .finish_non_exhaustive(),
        }
    }
}

/// Credentials and store connection parameters, read from the environment.
#[derive(Debug)]
pub struct Secrets {
    pub glow: GlowCredentials,
    pub store: StoreConnection,
}

impl Secrets {
    pub fn from_env(kind: StoreKind) -> Result<Self, ConfigError> {
        Self::from_lookup(kind, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(kind: StoreKind, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingEnv(key))
        };

        let glow = GlowCredentials {
            username: required("GLOW_USERNAME")?,
            password: required("GLOW_PASSWORD")?,
        };

        let store = match kind {
            StoreKind::QuestdbIlp => {
                let addr = required("QUESTDB_ILP_ADDR")?;
                if !addr.contains(':') {
                    return Err(ConfigError::Invalid(format!("QUESTDB_ILP_ADDR must be host:port, got {addr:?}")));
                }
                StoreConnection::QuestDbIlp {
                    addr,
                    http_url: required("QUESTDB_HTTP_URL")?,
                }
            }
            StoreKind::QuestdbHttp => StoreConnection::QuestDbHttp {
                http_url: required("QUESTDB_HTTP_URL")?,
            },
            StoreKind::InfluxHttp => StoreConnection::InfluxHttp {
                host: required("INFLUX_HOST")?,
                token: required("INFLUX_TOKEN")?,
                org: required("INFLUX_ORG")?,
                bucket: required("INFLUX_BUCKET")?,
            },
        };

        Ok(Self { glow, store })
    }
}
