use tokio::{io::AsyncWriteExt, net::TcpStream};

use super::{line_protocol, StoreClient};
use crate::{reconcile::ReconcileError, transform::OutputPoint};

/// Writes batches to QuestDB over ILP/TCP.
///
/// Overwrites on duplicate (measurement, tags, timestamp) only when the
/// target tables carry upsert keys; [`super::Store::connect`] sets them up.
///
/// ILP/TCP never acknowledges a write. QuestDB drops the connection on a line
/// it cannot parse, which the writer does not observe, so only connection and
/// socket failures surface as errors. The `questdb_http` store kind writes to
/// the same tables through the HTTP endpoint and reports rejected batches.
pub struct QuestDbIlpStore {
    addr: String,
}

impl QuestDbIlpStore {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    async fn connect(&self) -> Result<TcpStream, ReconcileError> {
        let stream = TcpStream::connect(self.addr.as_str())
            .await
            .map_err(|e| ReconcileError::Store(format!("failed to connect to QuestDB ILP: {e}")))?;
        let _ = stream.set_nodelay(true);
        Ok(stream)
    }
}

#[async_trait::async_trait]
impl StoreClient for QuestDbIlpStore {
    async fn write_batch(&self, points: Vec<OutputPoint>) -> Result<(), ReconcileError> {
        if points.is_empty() {
            return Ok(());
        }

        let payload = line_protocol::encode_batch(&points).into_bytes();
        let mut stream = self.connect().await?;

        if let Err(e) = stream.write_all(&payload).await {
            tracing::error!(error = %e, "QuestDB ILP write failed");
            metrics::counter!("questdb_ilp_sink_errors_total").increment(1);
            return Err(ReconcileError::Store(format!("ilp write failed: {e}")));
        }
        stream
            .shutdown()
            .await
            .map_err(|e| ReconcileError::Store(format!("ilp flush failed: {e}")))?;

        metrics::counter!("store_points_written_total").increment(points.len() as u64);
        metrics::counter!("questdb_ilp_bytes_total").increment(payload.len() as u64);
        Ok(())
    }
}
