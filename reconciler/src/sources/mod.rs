pub mod glow;

use glow_client::{
    domain::{Reading, ResourceId, Tariff},
    GlowError,
};
use time::OffsetDateTime;

/// The meter-data provider operations the reconciliation cycle depends on.
#[async_trait::async_trait]
pub trait SourceApi: Send + Sync {
    /// Best-effort hint to refresh the provider's cache.
    async fn request_catchup(&self, id: &ResourceId) -> Result<(), GlowError>;

    async fn last_time(&self, id: &ResourceId) -> Result<OffsetDateTime, GlowError>;

    /// 30-minute summed readings over `[from, to]`, ascending by timestamp.
    async fn half_hourly_sums(
        &self,
        id: &ResourceId,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<Reading>, GlowError>;

    async fn current_tariff(&self, id: &ResourceId) -> Result<Tariff, GlowError>;
}
