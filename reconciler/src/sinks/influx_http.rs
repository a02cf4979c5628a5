use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use super::{line_protocol, StoreClient};
use crate::{reconcile::ReconcileError, transform::OutputPoint};

const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Writes batches through the InfluxDB v2 HTTP write API, which QuestDB also
/// serves on its HTTP port. Both replace points that share measurement, tag
/// set and timestamp (QuestDB once its tables carry upsert keys), and both
/// answer a bad batch with an error status.
pub struct InfluxHttpStore {
    http: reqwest::Client,
    write_url: String,
    token: Option<String>,
    params: Vec<(&'static str, String)>,
}

impl InfluxHttpStore {
    pub fn new(host: &str, token: String, org: String, bucket: String) -> Result<Self, ReconcileError> {
        Self::build(host, Some(token), vec![("org", org), ("bucket", bucket)])
    }

    /// QuestDB ignores org and bucket and needs no token by default.
    pub fn questdb(http_url: &str) -> Result<Self, ReconcileError> {
        Self::build(http_url, None, Vec::new())
    }

    fn build(host: &str, token: Option<String>, mut params: Vec<(&'static str, String)>) -> Result<Self, ReconcileError> {
        let http = reqwest::Client::builder()
            .timeout(WRITE_TIMEOUT)
            .build()
            .map_err(|e| ReconcileError::Store(format!("failed to build line protocol http client: {e}")))?;
        params.push(("precision", "ns".to_string()));
        Ok(Self {
            http,
            write_url: format!("{}/api/v2/write", host.trim_end_matches('/')),
            token,
            params,
        })
    }
}

#[async_trait::async_trait]
impl StoreClient for InfluxHttpStore {
    async fn write_batch(&self, points: Vec<OutputPoint>) -> Result<(), ReconcileError> {
        if points.is_empty() {
            return Ok(());
        }

        let body = line_protocol::encode_batch(&points);
        let mut request = self
            .http
            .post(&self.write_url)
            .query(&self.params)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Token {token}"));
        }
        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| ReconcileError::Store(format!("influx write failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(http_status = status.as_u16(), body = %body, "line protocol write rejected");
            metrics::counter!("influx_http_sink_errors_total").increment(1);
            return Err(ReconcileError::Store(format!("write rejected with http status {status}: {body}")));
        }

        metrics::counter!("store_points_written_total").increment(points.len() as u64);
        Ok(())
    }
}
