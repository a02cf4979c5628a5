use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::{ResourceId, Tariff};

/// Aggregation period of a readings query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationPeriod {
    HalfHour,
    Hour,
    Day,
}

impl AggregationPeriod {
    /// ISO 8601 duration understood by the provider.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HalfHour => "PT30M",
            Self::Hour => "PT1H",
            Self::Day => "P1D",
        }
    }
}

/// Aggregation function of a readings query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationFunction {
    Sum,
    Average,
}

impl AggregationFunction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Average => "avg",
        }
    }
}

/// Readings over `[from, to]`; both ends are inclusive on the provider side.
#[derive(Debug, Clone)]
pub struct ReadingsQuery<'a> {
    pub id: &'a ResourceId,
    pub period: AggregationPeriod,
    pub function: AggregationFunction,
    pub from: OffsetDateTime,
    pub to: OffsetDateTime,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub application_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthResponse {
    pub valid: bool,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub account_id: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Deserialize)]
pub(crate) struct CatchupData {
    pub valid: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FirstTimeData {
    pub first_ts: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LastTimeData {
    pub last_ts: Option<i64>,
}

#[derive(Deserialize)]
pub(crate) struct ReadingsResponse {
    pub data: Vec<[f64; 2]>,
    #[serde(default)]
    pub units: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TariffEntry {
    #[serde(deserialize_with = "super::glow_time::deserialize")]
    pub from: OffsetDateTime,
    pub current_rates: CurrentRates,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CurrentRates {
    pub rate: f64,
    pub standing_charge: f64,
}

impl From<TariffEntry> for Tariff {
    fn from(entry: TariffEntry) -> Self {
        Tariff {
            effective_from: entry.from,
            rate: entry.current_rates.rate,
            standing_charge: entry.current_rates.standing_charge,
        }
    }
}
