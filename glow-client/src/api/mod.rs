//! Glowmarkt resource API.
//!
//! See <https://api.glowmarkt.com/api-docs/v0-1/resourcesys/#/>.

pub mod error;
pub mod glow_time;
pub mod models;

use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use time::OffsetDateTime;

use crate::domain::{Reading, ResourceId, Tariff};

pub use error::GlowError;
pub use models::{AggregationFunction, AggregationPeriod, ReadingsQuery};

use models::{
    AuthRequest, AuthResponse, CatchupData, DataEnvelope, FirstTimeData, LastTimeData, ReadingsResponse,
    TariffEntry,
};

pub const DEFAULT_BASE_URL: &str = "https://api.glowmarkt.com/api/v0-1";
pub const DEFAULT_APPLICATION_ID: &str = "b0f1b774-a586-4f72-9edd-27ead8aa7a8d";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Where the API lives and which application we identify as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlowEndpoint {
    pub base_url: String,
    pub application_id: String,
}

impl Default for GlowEndpoint {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            application_id: DEFAULT_APPLICATION_ID.to_string(),
        }
    }
}

impl GlowEndpoint {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// An authenticated session. The token is held for the lifetime of the value
/// and never refreshed.
pub struct GlowApi {
    http: reqwest::Client,
    endpoint: GlowEndpoint,
    token: String,
}

impl GlowApi {
    #[tracing::instrument(skip_all, fields(base_url = %endpoint.base_url))]
    pub async fn authenticate(endpoint: GlowEndpoint, username: &str, password: &str) -> Result<Self, GlowError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| GlowError::Transport {
                endpoint: "client".to_string(),
                source,
            })?;

        let request = http.post(endpoint.url("/auth")).json(&AuthRequest {
            username,
            password,
            application_id: &endpoint.application_id,
        });
        let response: AuthResponse = send(request, "auth").await?;
        if !response.valid {
            return Err(GlowError::NotValid {
                endpoint: "auth".to_string(),
            });
        }
        tracing::info!(account_id = ?response.account_id, "authenticated with glow");

        Ok(Self {
            http,
            endpoint,
            token: response.token,
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(self.endpoint.url(path))
            .header(CONTENT_TYPE, "application/json")
            .header("token", &self.token)
            .header("applicationId", &self.endpoint.application_id)
    }

    /// Asks the provider to pull the latest half-hour readings from the DCC.
    ///
    /// The refresh happens asynchronously and routinely fails; callers treat
    /// it as a hint.
    pub async fn request_catchup(&self, id: &ResourceId) -> Result<(), GlowError> {
        let endpoint = format!("resource/{id}/catchup");
        let response: DataEnvelope<CatchupData> = send(self.get(&format!("/resource/{id}/catchup")), &endpoint).await?;
        if !response.data.valid {
            return Err(GlowError::NotValid { endpoint });
        }
        Ok(())
    }

    pub async fn first_time(&self, id: &ResourceId) -> Result<OffsetDateTime, GlowError> {
        let endpoint = format!("resource/{id}/first-time");
        let response: DataEnvelope<FirstTimeData> =
            send(self.get(&format!("/resource/{id}/first-time")), &endpoint).await?;
        let ts = response.data.first_ts.ok_or_else(|| GlowError::NoData(id.clone()))?;
        from_unix(ts)
    }

    /// Timestamp of the most recent available sample.
    pub async fn last_time(&self, id: &ResourceId) -> Result<OffsetDateTime, GlowError> {
        let endpoint = format!("resource/{id}/last-time");
        let response: DataEnvelope<LastTimeData> =
            send(self.get(&format!("/resource/{id}/last-time")), &endpoint).await?;
        let ts = response.data.last_ts.ok_or_else(|| GlowError::NoData(id.clone()))?;
        from_unix(ts)
    }

    pub async fn readings(&self, query: &ReadingsQuery<'_>) -> Result<Vec<Reading>, GlowError> {
        let endpoint = format!("resource/{}/readings", query.id);
        let from = glow_time::format(query.from).map_err(|e| GlowError::Timestamp(e.to_string()))?;
        let to = glow_time::format(query.to).map_err(|e| GlowError::Timestamp(e.to_string()))?;

        let request = self.get(&format!("/resource/{}/readings", query.id)).query(&[
            ("period", query.period.as_str()),
            ("function", query.function.as_str()),
            ("from", from.as_str()),
            ("to", to.as_str()),
        ]);
        let response: ReadingsResponse = send(request, &endpoint).await?;
        tracing::debug!(resource_id = %query.id, units = ?response.units, count = response.data.len(), "got readings");

        response
            .data
            .into_iter()
            .map(|[ts, value]| reading_ts(ts).map(|ts| Reading::new(ts, value)))
            .collect()
    }

    /// All published tariff entries, in provider order.
    pub async fn tariffs(&self, id: &ResourceId) -> Result<Vec<Tariff>, GlowError> {
        let endpoint = format!("resource/{id}/tariff");
        let response: DataEnvelope<Vec<TariffEntry>> = send(self.get(&format!("/resource/{id}/tariff")), &endpoint).await?;
        Ok(response.data.into_iter().map(Tariff::from).collect())
    }

    /// The entry with the latest `effective_from`.
    pub async fn current_tariff(&self, id: &ResourceId) -> Result<Tariff, GlowError> {
        latest_tariff(self.tariffs(id).await?).ok_or_else(|| GlowError::NoTariff(id.clone()))
    }
}

fn latest_tariff(tariffs: Vec<Tariff>) -> Option<Tariff> {
    tariffs.into_iter().max_by_key(|t| t.effective_from)
}

fn from_unix(ts: i64) -> Result<OffsetDateTime, GlowError> {
    OffsetDateTime::from_unix_timestamp(ts).map_err(|e| GlowError::Timestamp(format!("{ts}: {e}")))
}

/// Readings carry their timestamps as JSON numbers; only whole seconds are valid.
fn reading_ts(ts: f64) -> Result<OffsetDateTime, GlowError> {
    if !ts.is_finite() || ts.fract() != 0.0 {
        return Err(GlowError::Timestamp(format!("{ts} is not a whole number of seconds")));
    }
    from_unix(ts as i64)
}

async fn send<T: DeserializeOwned>(request: RequestBuilder, endpoint: &str) -> Result<T, GlowError> {
    let transport = |source| GlowError::Transport {
        endpoint: endpoint.to_string(),
        source,
    };

    let response = request.send().await.map_err(transport)?;
    let status = response.status();
    let body = response.text().await.map_err(transport)?;

    if status != StatusCode::OK {
        tracing::warn!(endpoint, http_status = status.as_u16(), body = %body, "glow request rejected");
        return Err(GlowError::Rejected {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|source| GlowError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}
