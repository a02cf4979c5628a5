//! In-memory collaborators for engine tests.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex,
};

use glow_client::{
    domain::{Reading, ResourceId, Tariff},
    GlowError,
};
use time::OffsetDateTime;

use crate::{
    reconcile::ReconcileError,
    sinks::StoreClient,
    sources::SourceApi,
    transform::{Measurement, OutputPoint},
};

#[derive(Default)]
pub struct FakeSource {
    last_times: HashMap<ResourceId, OffsetDateTime>,
    readings: HashMap<ResourceId, Vec<Reading>>,
    tariffs: HashMap<ResourceId, Tariff>,
    fail_catchups: bool,
    catchups: Mutex<Vec<ResourceId>>,
    readings_queries: Mutex<Vec<(ResourceId, OffsetDateTime, OffsetDateTime)>>,
}

impl FakeSource {
    pub fn with_last_time(mut self, id: &str, ts: OffsetDateTime) -> Self {
        self.last_times.insert(id.into(), ts);
        self
    }

    pub fn with_readings(mut self, id: &str, readings: Vec<Reading>) -> Self {
        self.readings.insert(id.into(), readings);
        self
    }

    pub fn with_tariff(mut self, id: &str, tariff: Tariff) -> Self {
        self.tariffs.insert(id.into(), tariff);
        self
    }

    pub fn failing_catchups(mut self) -> Self {
        self.fail_catchups = true;
        self
    }

    pub fn catchups(&self) -> Vec<ResourceId> {
        self.catchups.lock().unwrap().clone()
    }

    pub fn readings_queries(&self) -> Vec<(ResourceId, OffsetDateTime, OffsetDateTime)> {
        self.readings_queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SourceApi for FakeSource {
    async fn request_catchup(&self, id: &ResourceId) -> Result<(), GlowError> {
        self.catchups.lock().unwrap().push(id.clone());
        if self.fail_catchups {
            return Err(GlowError::Rejected {
                endpoint: format!("resource/{id}/catchup"),
                status: 500,
                body: "internal error".to_string(),
            });
        }
        Ok(())
    }

    async fn last_time(&self, id: &ResourceId) -> Result<OffsetDateTime, GlowError> {
        self.last_times.get(id).copied().ok_or_else(|| GlowError::NoData(id.clone()))
    }

    async fn half_hourly_sums(
        &self,
        id: &ResourceId,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<Reading>, GlowError> {
        self.readings_queries.lock().unwrap().push((id.clone(), from, to));
        self.readings.get(id).cloned().ok_or_else(|| GlowError::Rejected {
            endpoint: format!("resource/{id}/readings"),
            status: 404,
            body: String::new(),
        })
    }

    async fn current_tariff(&self, id: &ResourceId) -> Result<Tariff, GlowError> {
        self.tariffs.get(id).copied().ok_or_else(|| GlowError::NoTariff(id.clone()))
    }
}

pub type PointKey = (Measurement, BTreeMap<String, String>, OffsetDateTime);

/// Last-write-wins store keyed by measurement, tag set and timestamp.
#[derive(Default)]
pub struct RecordingStore {
    fail: bool,
    points: Mutex<HashMap<PointKey, BTreeMap<String, f64>>>,
    batches: Mutex<usize>,
}

impl RecordingStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn batches(&self) -> usize {
        *self.batches.lock().unwrap()
    }

    pub fn len(&self) -> usize {
        self.points.lock().unwrap().len()
    }

    pub fn get(
        &self,
        measurement: Measurement,
        tags: &BTreeMap<String, String>,
        ts: OffsetDateTime,
    ) -> Option<BTreeMap<String, f64>> {
        self.points
            .lock()
            .unwrap()
            .get(&(measurement, tags.clone(), ts))
            .cloned()
    }

    pub fn snapshot(&self) -> HashMap<PointKey, BTreeMap<String, f64>> {
        self.points.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl StoreClient for RecordingStore {
    async fn write_batch(&self, points: Vec<OutputPoint>) -> Result<(), ReconcileError> {
        if self.fail {
            return Err(ReconcileError::Store("connection refused".to_string()));
        }
        let mut stored = self.points.lock().unwrap();
        for point in points {
            stored.insert((point.measurement, point.tags, point.ts), point.fields);
        }
        *self.batches.lock().unwrap() += 1;
        Ok(())
    }
}
