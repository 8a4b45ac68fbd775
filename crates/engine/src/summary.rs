//! Weekly position breakdown per asset
//!
//! Latest-vs-previous detail behind the per-market tables: long, short and
//! net counts with their week-over-week changes, plus the long share of each
//! category's open interest.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CotError, CotResult};
use crate::types::{AssetSeries, Positions, ScanConfig};

/// Week-over-week change detail for one trader category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub long: i64,
    pub long_change: i64,
    pub short: i64,
    pub short_change: i64,
    pub net: i64,
    pub net_change: i64,
    /// Long contracts as a share of the category total, in percent
    pub long_share_pct: f64,
    pub long_share_change_pct: f64,
}

/// Weekly detail for one asset
#[derive(Debug, Clone, Serialize)]
pub struct WeeklySummary {
    pub asset_id: String,
    pub latest_date: NaiveDate,
    pub stale: bool,
    pub speculative: CategoryBreakdown,
    pub commercial: CategoryBreakdown,
    /// Present only when both weeks carry retail data
    pub retail: Option<CategoryBreakdown>,
}

/// Latest-vs-previous breakdown across all trader categories.
///
/// Fails with `InsufficientHistory` when the series has fewer than two
/// reports; corrupt counts surface as errors.
pub fn weekly_summary(
    series: &AssetSeries,
    config: &ScanConfig,
    today: NaiveDate,
) -> CotResult<WeeklySummary> {
    let (Some(latest), Some(previous)) = (series.latest(), series.previous()) else {
        return Err(CotError::InsufficientHistory {
            have: series.len(),
            need: 2,
        });
    };

    let retail = match (latest.retail, previous.retail) {
        (Some(latest_retail), Some(previous_retail)) => {
            Some(breakdown(&latest_retail, &previous_retail)?)
        }
        _ => None,
    };

    Ok(WeeklySummary {
        asset_id: series.asset_id.clone(),
        latest_date: latest.date,
        stale: (today - latest.date).num_days() > config.freshness_threshold_days,
        speculative: breakdown(&latest.speculative, &previous.speculative)?,
        commercial: breakdown(&latest.commercial, &previous.commercial)?,
        retail,
    })
}

fn breakdown(latest: &Positions, previous: &Positions) -> CotResult<CategoryBreakdown> {
    let net = latest.net()?;
    let previous_net = previous.net()?;
    let share = long_share_pct(latest);
    let previous_share = long_share_pct(previous);

    Ok(CategoryBreakdown {
        long: latest.long,
        long_change: latest.long - previous.long,
        short: latest.short,
        short_change: latest.short - previous.short,
        net,
        net_change: net - previous_net,
        long_share_pct: share,
        long_share_change_pct: share - previous_share,
    })
}

fn long_share_pct(positions: &Positions) -> f64 {
    let total = positions.long + positions.short;
    if total > 0 {
        positions.long as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}
