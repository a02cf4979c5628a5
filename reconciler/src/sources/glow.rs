use glow_client::{
    api::{AggregationFunction, AggregationPeriod, ReadingsQuery},
    domain::{Reading, ResourceId, Tariff},
    GlowApi, GlowError,
};
use time::OffsetDateTime;

use super::SourceApi;

#[async_trait::async_trait]
impl SourceApi for GlowApi {
    async fn request_catchup(&self, id: &ResourceId) -> Result<(), GlowError> {
        GlowApi::request_catchup(self, id).await
    }

    async fn last_time(&self, id: &ResourceId) -> Result<OffsetDateTime, GlowError> {
        GlowApi::last_time(self, id).await
    }

    async fn half_hourly_sums(
        &self,
        id: &ResourceId,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<Reading>, GlowError> {
        self.readings(&ReadingsQuery {
            id,
            period: AggregationPeriod::HalfHour,
            function: AggregationFunction::Sum,
            from,
            to,
        })
        .await
    }

    async fn current_tariff(&self, id: &ResourceId) -> Result<Tariff, GlowError> {
        GlowApi::current_tariff(self, id).await
    }
}
