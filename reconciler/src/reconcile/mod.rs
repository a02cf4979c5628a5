//! The reconciliation cycle: catch-up hints, per-resource window resolution,
//! paired fetch, point building and a single batch write per half-hour slot.

pub mod pairing;
pub mod schedule;
pub mod window;

use std::{convert::Infallible, time::Duration};

use glow_client::{
    domain::{TariffSnapshot, TrackedResource},
    GlowError,
};
use time::OffsetDateTime;
use tokio::time::{sleep, Instant};

use crate::{
    sinks::StoreClient,
    sources::SourceApi,
    transform::{self, OutputPoint},
};

pub use pairing::{fetch_pairs, pair_readings, IntegrityError};
pub use window::{resolve_window, Window, LOOKBACK};

#[derive(thiserror::Error, Debug)]
pub enum ReconcileError {
    #[error("source error: {0}")]
    Source(#[from] GlowError),
    #[error("integrity error: {0}")]
    Integrity(#[from] IntegrityError),
    #[error("store error: {0}")]
    Store(String),
}

/// Delays inside one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cadence {
    /// Jittered pause before the catch-up requests go out.
    pub catchup_delay: Duration,
    /// Fixed pause between the catch-up requests and the first read.
    pub catchup_grace: Duration,
    pub jitter: f64,
}

impl Cadence {
    pub const IMMEDIATE: Self = Self {
        catchup_delay: Duration::ZERO,
        catchup_grace: Duration::ZERO,
        jitter: 0.0,
    };
}

pub struct Reconciler<S, K> {
    source: S,
    store: K,
    resources: Vec<TrackedResource>,
    cadence: Cadence,
    clock: fn() -> OffsetDateTime,
}

impl<S, K> Reconciler<S, K>
where
    S: SourceApi,
    K: StoreClient,
{
    pub fn new(source: S, store: K, resources: Vec<TrackedResource>, cadence: Cadence) -> Self {
        Self {
            source,
            store,
            resources,
            cadence,
            clock: OffsetDateTime::now_utc,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Runs one cycle per half-hour slot until a cycle fails.
    pub async fn run_forever(&self) -> Result<Infallible, ReconcileError> {
        loop {
            self.run_cycle().await?;

            let now = (self.clock)();
            let wait = schedule::wait_until_next_slot(now);
            tracing::info!(
                wait_secs = wait.as_secs(),
                until = %(now + wait),
                "waiting for the next slot"
            );
            sleep(wait).await;
        }
    }

    /// Catch-up phase followed by [`Self::reconcile`]. Returns the number of
    /// points written.
    pub async fn run_cycle(&self) -> Result<usize, ReconcileError> {
        sleep(schedule::jittered(self.cadence.catchup_delay, self.cadence.jitter)).await;
        self.request_catchups().await;

        tracing::info!(grace_secs = self.cadence.catchup_grace.as_secs(), "waiting for catch-up to settle");
        sleep(self.cadence.catchup_grace).await;

        self.reconcile().await
    }

    /// Fetches, pairs and writes every tracked resource as one batch.
    pub async fn reconcile(&self) -> Result<usize, ReconcileError> {
        let started = Instant::now();

        let batch = self.build_batch().await?;
        let written = batch.len();
        self.store.write_batch(batch).await?;

        metrics::counter!("reconcile_cycles_total").increment(1);
        metrics::histogram!("reconcile_cycle_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(points = written, "batch written");
        Ok(written)
    }

    /// Failures are logged and otherwise ignored.
    pub async fn request_catchups(&self) {
        for id in self.resources.iter().flat_map(TrackedResource::resource_ids) {
            match self.source.request_catchup(id).await {
                Ok(()) => tracing::info!(resource_id = %id, "requested resource catchup"),
                Err(e) => {
                    metrics::counter!("glow_catchup_failures_total").increment(1);
                    tracing::warn!(resource_id = %id, error = %e, "resource catchup failed");
                }
            }
        }
    }

    pub async fn build_batch(&self) -> Result<Vec<OutputPoint>, ReconcileError> {
        let mut batch = Vec::new();
        for resource in &self.resources {
            batch.extend(self.reconcile_resource(resource).await?);
        }
        Ok(batch)
    }

    async fn reconcile_resource(&self, resource: &TrackedResource) -> Result<Vec<OutputPoint>, ReconcileError> {
        // Both series are queried over the quantity series' window.
        let window = resolve_window(&self.source, &resource.quantity_id).await?;
        tracing::info!(resource = %resource.name, from = %window.from, to = %window.to, "resolved window");

        let pairs = fetch_pairs(&self.source, resource, window).await?;

        let tariff = self.source.current_tariff(&resource.quantity_id).await?;
        let snapshot = TariffSnapshot::observe(&tariff, (self.clock)());

        Ok(transform::resource_points(resource, &snapshot, &pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::{FakeSource, RecordingStore},
        transform::Measurement,
    };
    use glow_client::domain::{Reading, ResourceId, Tariff};
    use std::collections::BTreeMap;
    use time::macros::datetime;

    const T: OffsetDateTime = datetime!(2024-06-10 13:30:00 UTC);
    const T0: OffsetDateTime = datetime!(2024-06-10 14:05:00 UTC);

    fn fixed_clock() -> OffsetDateTime {
        T0
    }

    fn tariff(rate: f64, standing_charge: f64) -> Tariff {
        Tariff {
            effective_from: datetime!(2024-04-01 00:00:00 UTC),
            rate,
            standing_charge,
        }
    }

    fn gas_source() -> FakeSource {
        FakeSource::default()
            .with_last_time("Q1", T)
            .with_readings(
                "Q1",
                vec![
                    Reading::new(T - time::Duration::minutes(60), 1.2),
                    Reading::new(T - time::Duration::minutes(30), 1.5),
                ],
            )
            .with_readings(
                "C1",
                vec![
                    Reading::new(T - time::Duration::minutes(60), 24.0),
                    Reading::new(T - time::Duration::minutes(30), 30.0),
                ],
            )
            .with_tariff("Q1", tariff(5.0, 20.0))
    }

    fn gas() -> Vec<TrackedResource> {
        vec![TrackedResource::new("gas", "Q1", "C1")]
    }

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[tokio::test]
    async fn end_to_end_gas_cycle() {
        let reconciler = Reconciler::new(gas_source(), RecordingStore::default(), gas(), Cadence::IMMEDIATE)
            .with_clock(fixed_clock);

        let written = reconciler.run_cycle().await.unwrap();
        assert_eq!(written, 3);

        let store = &reconciler.store;
        assert_eq!(store.batches(), 1);

        let tariff_fields = store
            .get(Measurement::EnergyTariff, &tags(&[("resource", "gas")]), T0)
            .unwrap();
        assert_eq!(tariff_fields["rate"], 5.0);
        assert_eq!(tariff_fields["standingCharge"], 20.0);

        let usage_tags = tags(&[("resource", "gas"), ("period", "30m")]);
        let first = store
            .get(Measurement::EnergyUsage, &usage_tags, T - time::Duration::minutes(60))
            .unwrap();
        assert_eq!((first["quantity"], first["cost"]), (1.2, 24.0));
        let second = store
            .get(Measurement::EnergyUsage, &usage_tags, T - time::Duration::minutes(30))
            .unwrap();
        assert_eq!((second["quantity"], second["cost"]), (1.5, 30.0));

        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn queries_the_lookback_window() {
        let reconciler = Reconciler::new(gas_source(), RecordingStore::default(), gas(), Cadence::IMMEDIATE);
        reconciler.reconcile().await.unwrap();

        let queries = reconciler.source.readings_queries();
        assert_eq!(
            queries,
            vec![
                (ResourceId::from("Q1"), T - LOOKBACK, T),
                (ResourceId::from("C1"), T - LOOKBACK, T),
            ]
        );
    }

    #[tokio::test]
    async fn catchup_failures_do_not_stop_the_cycle() {
        let source = gas_source().failing_catchups();
        let reconciler = Reconciler::new(source, RecordingStore::default(), gas(), Cadence::IMMEDIATE);

        assert_eq!(reconciler.run_cycle().await.unwrap(), 3);
        assert_eq!(
            reconciler.source.catchups(),
            vec![ResourceId::from("Q1"), ResourceId::from("C1")]
        );
    }

    #[tokio::test]
    async fn misaligned_series_write_nothing() {
        let source = gas_source().with_readings("C1", vec![Reading::new(T, 30.0)]);
        let reconciler = Reconciler::new(source, RecordingStore::default(), gas(), Cadence::IMMEDIATE);

        let res = reconciler.run_cycle().await;
        assert!(matches!(res, Err(ReconcileError::Integrity(_))));
        assert_eq!(reconciler.store.batches(), 0);
        assert_eq!(reconciler.store.len(), 0);
    }

    #[tokio::test]
    async fn tariff_failure_is_fatal_for_the_whole_batch() {
        let mut resources = gas();
        resources.push(TrackedResource::new("electricity", "Q2", "C2"));
        let source = gas_source()
            .with_last_time("Q2", T)
            .with_readings("Q2", vec![Reading::new(T, 0.4)])
            .with_readings("C2", vec![Reading::new(T, 9.6)]);
        let reconciler = Reconciler::new(source, RecordingStore::default(), resources, Cadence::IMMEDIATE);

        let res = reconciler.reconcile().await;
        assert!(matches!(res, Err(ReconcileError::Source(GlowError::NoTariff(_)))));
        assert_eq!(reconciler.store.batches(), 0);
    }

    #[tokio::test]
    async fn store_failure_is_surfaced() {
        let reconciler = Reconciler::new(gas_source(), RecordingStore::failing(), gas(), Cadence::IMMEDIATE);
        assert!(matches!(reconciler.reconcile().await, Err(ReconcileError::Store(_))));
    }

    #[tokio::test]
    async fn rewriting_the_same_window_is_idempotent() {
        let reconciler = Reconciler::new(gas_source(), RecordingStore::default(), gas(), Cadence::IMMEDIATE)
            .with_clock(fixed_clock);

        reconciler.reconcile().await.unwrap();
        let once = reconciler.store.snapshot();
        reconciler.reconcile().await.unwrap();

        assert_eq!(reconciler.store.batches(), 2);
        assert_eq!(reconciler.store.snapshot(), once);
    }

    #[tokio::test]
    async fn resources_are_batched_in_configuration_order() {
        let mut resources = gas();
        resources.push(TrackedResource::new("electricity", "Q2", "C2"));
        let source = gas_source()
            .with_last_time("Q2", T)
            .with_readings("Q2", vec![Reading::new(T, 0.4)])
            .with_readings("C2", vec![Reading::new(T, 9.6)])
            .with_tariff("Q2", tariff(24.5, 60.0));
        let reconciler = Reconciler::new(source, RecordingStore::default(), resources, Cadence::IMMEDIATE)
            .with_clock(fixed_clock);

        let batch = reconciler.build_batch().await.unwrap();
        let names: Vec<_> = batch.iter().map(|p| p.tags["resource"].as_str()).collect();
        assert_eq!(names, ["gas", "gas", "gas", "electricity", "electricity"]);
    }
}
