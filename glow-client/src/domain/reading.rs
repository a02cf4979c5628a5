use time::OffsetDateTime;

/// A single aggregated sample of one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub ts: OffsetDateTime,
    pub value: f64,
}

impl Reading {
    pub fn new(ts: OffsetDateTime, value: f64) -> Self {
        Self { ts, value }
    }
}

/// Quantity and cost readings sharing the same timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingPair {
    pub ts: OffsetDateTime,
    pub quantity: f64,
    pub cost: f64,
}
