use glow_client::domain::ResourceId;
use time::{Duration, OffsetDateTime};

use super::ReconcileError;
use crate::sources::SourceApi;

/// How far back a single cycle ever queries. Older history is never
/// backfilled.
pub const LOOKBACK: Duration = Duration::days(8);

/// Query range for one cycle. `to` is the latest available sample and is
/// inclusive on the provider side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: OffsetDateTime,
    pub to: OffsetDateTime,
}

impl Window {
    pub fn ending_at(to: OffsetDateTime) -> Self {
        Self { from: to - LOOKBACK, to }
    }
}

/// Fails if the provider cannot report a last-available timestamp, including
/// when the resource has no data at all.
pub async fn resolve_window<S>(source: &S, id: &ResourceId) -> Result<Window, ReconcileError>
where
    S: SourceApi + ?Sized,
{
    let last_available = source.last_time(id).await?;
    Ok(Window::ending_at(last_available))
}
