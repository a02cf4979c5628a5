use time::OffsetDateTime;

/// One tariff entry as published by the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tariff {
    pub effective_from: OffsetDateTime,
    pub rate: f64,
    pub standing_charge: f64,
}

/// The tariff active at `observed_at`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TariffSnapshot {
    pub observed_at: OffsetDateTime,
    pub rate: f64,
    pub standing_charge: f64,
}

impl TariffSnapshot {
    pub fn observe(tariff: &Tariff, observed_at: OffsetDateTime) -> Self {
        Self {
            observed_at,
            rate: tariff.rate,
            standing_charge: tariff.standing_charge,
        }
    }
}
