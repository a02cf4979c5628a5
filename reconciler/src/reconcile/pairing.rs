use glow_client::domain::{Reading, ReadingPair, TrackedResource};
use time::OffsetDateTime;

use super::{window::Window, ReconcileError};
use crate::sources::SourceApi;

/// The quantity and cost series of one resource have desynchronized.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum IntegrityError {
    #[error("{resource}: quantity series has {quantity} readings but cost series has {cost}")]
    LengthMismatch {
        resource: String,
        quantity: usize,
        cost: usize,
    },
    #[error("{resource}: reading {index} is at {quantity_ts} in the quantity series but at {cost_ts} in the cost series")]
    TimestampMismatch {
        resource: String,
        index: usize,
        quantity_ts: OffsetDateTime,
        cost_ts: OffsetDateTime,
    },
    /// Checked after the timestamps are known to match, so it holds for both series.
    #[error("{resource}: series are not strictly ascending at reading {index}")]
    OutOfOrder { resource: String, index: usize },
}

/// Zips two positionally aligned series.
///
/// Both series must have the same length and identical timestamps at every
/// index, ascending. Any violation rejects the whole series; nothing is
/// paired on a best-effort basis.
pub fn pair_readings(resource: &str, quantity: &[Reading], cost: &[Reading]) -> Result<Vec<ReadingPair>, IntegrityError> {
    if quantity.len() != cost.len() {
        return Err(IntegrityError::LengthMismatch {
            resource: resource.to_string(),
            quantity: quantity.len(),
            cost: cost.len(),
        });
    }

    if let Some((index, (q, c))) = quantity.iter().zip(cost).enumerate().find(|(_, (q, c))| q.ts != c.ts) {
        return Err(IntegrityError::TimestampMismatch {
            resource: resource.to_string(),
            index,
            quantity_ts: q.ts,
            cost_ts: c.ts,
        });
    }

    // Timestamps are identical past this point, so checking one series covers both.
    if let Some(index) = quantity.windows(2).position(|w| w[0].ts >= w[1].ts) {
        return Err(IntegrityError::OutOfOrder {
            resource: resource.to_string(),
            index: index + 1,
        });
    }

    Ok(quantity
        .iter()
        .zip(cost)
        .map(|(q, c)| ReadingPair {
            ts: q.ts,
            quantity: q.value,
            cost: c.value,
        })
        .collect())
}

/// Fetches both series of `resource` over the same window and pairs them.
pub async fn fetch_pairs<S>(source: &S, resource: &TrackedResource, window: Window) -> Result<Vec<ReadingPair>, ReconcileError>
where
    S: SourceApi + ?Sized,
{
    let quantity = source
        .half_hourly_sums(&resource.quantity_id, window.from, window.to)
        .await?;
    let cost = source.half_hourly_sums(&resource.cost_id, window.from, window.to).await?;
    tracing::info!(
        resource = %resource.name,
        quantity_readings = quantity.len(),
        cost_readings = cost.len(),
        "got resource readings"
    );

    Ok(pair_readings(&resource.name, &quantity, &cost)?)
}
