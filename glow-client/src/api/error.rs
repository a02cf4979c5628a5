use crate::domain::ResourceId;

#[derive(thiserror::Error, Debug)]
pub enum GlowError {
    #[error("transport error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} rejected with http status {status}")]
    Rejected { endpoint: String, status: u16, body: String },
    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{endpoint} responded without valid=true")]
    NotValid { endpoint: String },
    #[error("resource {0} has no available data")]
    NoData(ResourceId),
    #[error("resource {0} has no tariff entries")]
    NoTariff(ResourceId),
    #[error("invalid timestamp: {0}")]
    Timestamp(String),
}
