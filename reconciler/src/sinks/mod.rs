pub mod influx_http;
pub mod line_protocol;
pub mod questdb_ilp;
pub mod questdb_schema;

pub use influx_http::InfluxHttpStore;
pub use questdb_ilp::QuestDbIlpStore;

use crate::{config::StoreConnection, reconcile::ReconcileError, transform::OutputPoint};

/// Batched write into the time-series store.
///
/// Implementations must overwrite any existing point with the same
/// measurement, tag set and timestamp; the engine rewrites its whole lookback
/// window every cycle.
#[async_trait::async_trait]
pub trait StoreClient: Send + Sync {
    /// All-or-nothing from the engine's point of view; no retries.
    async fn write_batch(&self, points: Vec<OutputPoint>) -> Result<(), ReconcileError>;
}

pub enum Store {
    QuestDbIlp(QuestDbIlpStore),
    InfluxHttp(InfluxHttpStore),
}

impl Store {
    /// Builds the configured backend. For QuestDB this first creates the
    /// tables with upsert keys; a failed setup is returned as an error.
    pub async fn connect(connection: &StoreConnection) -> Result<Self, ReconcileError> {
        Ok(match connection {
            StoreConnection::QuestDbIlp { addr, http_url } => {
                questdb_schema::ensure_tables(http_url).await?;
                Self::QuestDbIlp(QuestDbIlpStore::new(addr.as_str()))
            }
            StoreConnection::QuestDbHttp { http_url } => {
                questdb_schema::ensure_tables(http_url).await?;
                Self::InfluxHttp(InfluxHttpStore::questdb(http_url)?)
            }
            StoreConnection::InfluxHttp {
                host,
                token,
                org,
                bucket,
            } => Self::InfluxHttp(InfluxHttpStore::new(host, token.clone(), org.clone(), bucket.clone())?),
        })
    }
}

#[async_trait::async_trait]
impl StoreClient for Store {
    async fn write_batch(&self, points: Vec<OutputPoint>) -> Result<(), ReconcileError> {
        match self {
            Self::QuestDbIlp(s) => s.write_batch(points).await,
            Self::InfluxHttp(s) => s.write_batch(points).await,
        }
    }
}
