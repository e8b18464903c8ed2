//! Statistics query handlers.

use std::{collections::BTreeMap, num::NonZeroU64};

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use super::{ApiState, error::ApiError};
use crate::models::{IntervalStat, PrettyStat};

/// Query parameters of `GET /all`.
#[derive(Debug, Default, Deserialize)]
pub struct AllStatsParams {
    from: Option<String>,
    bin: Option<String>,
}

/// Query parameters of `GET /latest`.
#[derive(Debug, Default, Deserialize)]
pub struct LatestStatsParams {
    count: Option<String>,
}

/// Parses an optional numeric parameter. Empty values count as absent.
fn parse_param(raw: Option<&str>, name: &str) -> Result<Option<u64>, ApiError> {
    match raw.filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid `{name}` value"))),
    }
}

/// Per-block statistics from `from` on, or binned when `bin` is given.
pub async fn all_stats(
    State(state): State<ApiState>,
    Query(params): Query<AllStatsParams>,
) -> Result<Json<BTreeMap<u64, PrettyStat>>, ApiError> {
    let from_block = parse_param(params.from.as_deref(), "from")?.unwrap_or(0);

    let stats = match parse_param(params.bin.as_deref(), "bin")? {
        None => state.handle.all_block_stats(from_block).await?,
        Some(bin) => {
            let bin_size = NonZeroU64::new(bin)
                .ok_or_else(|| ApiError::BadRequest("Invalid `bin` value".into()))?;
            state.handle.binned_stats(from_block, bin_size).await?
        }
    };

    Ok(Json(stats))
}

/// Summary of the latest `count` blocks, one aggregation window by default.
pub async fn latest_stats(
    State(state): State<ApiState>,
    Query(params): Query<LatestStatsParams>,
) -> Result<Json<IntervalStat>, ApiError> {
    let window = state.config.aggregate_block_amount;

    let count = match parse_param(params.count.as_deref(), "count")? {
        None => window,
        Some(count) if state.config.purge_old_blocks && count > window.saturating_mul(2) => {
            return Err(ApiError::BadRequest(
                "`count` too large; purgeOldBlocks is set to true".into(),
            ));
        }
        Some(count) => count,
    };

    Ok(Json(state.handle.latest_interval_stats(count).await?))
}
