//! Point builder: turns validated reading pairs and a tariff snapshot into
//! store-ready points.

use std::collections::BTreeMap;

use glow_client::domain::{ReadingPair, TariffSnapshot, TrackedResource};
use time::OffsetDateTime;

pub const TAG_RESOURCE: &str = "resource";
pub const TAG_PERIOD: &str = "period";

/// Aggregation period tag value of every usage point.
pub const USAGE_PERIOD: &str = "30m";

pub const FIELD_QUANTITY: &str = "quantity";
pub const FIELD_COST: &str = "cost";
pub const FIELD_RATE: &str = "rate";
pub const FIELD_STANDING_CHARGE: &str = "standingCharge";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Measurement {
    EnergyUsage,
    EnergyTariff,
}

impl Measurement {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnergyUsage => "energy_usage",
            Self::EnergyTariff => "energy_tariff",
        }
    }
}

/// A single time-series point. Tags and fields are kept sorted so equal
/// points always encode to the same line.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPoint {
    pub measurement: Measurement,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, f64>,
    pub ts: OffsetDateTime,
}

impl OutputPoint {
    fn new(measurement: Measurement, ts: OffsetDateTime) -> Self {
        Self {
            measurement,
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            ts,
        }
    }

    fn tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    fn field(mut self, key: &str, value: f64) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }
}

/// The tariff point is stamped with the time it was observed, not with the
/// tariff's effective date.
pub fn tariff_point(resource: &TrackedResource, tariff: &TariffSnapshot) -> OutputPoint {
    OutputPoint::new(Measurement::EnergyTariff, tariff.observed_at)
        .tag(TAG_RESOURCE, &resource.name)
        .field(FIELD_RATE, tariff.rate)
        .field(FIELD_STANDING_CHARGE, tariff.standing_charge)
}

pub fn usage_point(resource: &TrackedResource, pair: &ReadingPair) -> OutputPoint {
    OutputPoint::new(Measurement::EnergyUsage, pair.ts)
        .tag(TAG_RESOURCE, &resource.name)
        .tag(TAG_PERIOD, USAGE_PERIOD)
        .field(FIELD_QUANTITY, pair.quantity)
        .field(FIELD_COST, pair.cost)
}

/// All points for one resource in one cycle: the tariff point followed by one
/// usage point per pair, in pair order.
pub fn resource_points(resource: &TrackedResource, tariff: &TariffSnapshot, pairs: &[ReadingPair]) -> Vec<OutputPoint> {
    let mut points = Vec::with_capacity(pairs.len() + 1);
    points.push(tariff_point(resource, tariff));
    points.extend(pairs.iter().map(|pair| usage_point(resource, pair)));
    points
}
