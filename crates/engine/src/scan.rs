//! Universe scanner — ranks assets by COT positioning scores
//!
//! Three scan modes replace the near-duplicate scan scripts of the source
//! dashboards: Divergence (speculators vs commercials), Flow (z-score of the
//! weekly speculative net change) and Reversal (speculators vs retail).
//! Assets with too little history are omitted from the result, never an
//! error; corrupt position counts always surface.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CotError, CotResult};
use crate::indicators::{changes, flow_stats, latest_index};
use crate::types::{AssetSeries, ScanConfig, TraderCategory};

// ============================================================================
// Types
// ============================================================================

/// Scoring rule applied to every asset in a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Speculative index minus commercial index
    Divergence,
    /// Z-score of the latest week-over-week speculative net change
    Flow,
    /// Speculative index minus retail index
    Reversal,
}

impl ScanMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Divergence => "Divergence",
            Self::Flow => "Flow",
            Self::Reversal => "Reversal",
        }
    }
}

/// Ranking key for scan results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Descending by absolute score
    #[default]
    AbsScore,
    /// Descending by signed score
    RawScore,
}

/// Supporting values behind one scan entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScanDetail {
    Divergence {
        speculative_index: f64,
        commercial_index: f64,
    },
    Flow {
        latest_change: f64,
        change_mean: f64,
        change_std: f64,
    },
    Reversal {
        speculative_index: f64,
        retail_index: f64,
    },
}

/// One ranked row of a scan result
#[derive(Debug, Clone, Serialize)]
pub struct ScanEntry {
    pub asset_id: String,
    pub latest_date: NaiveDate,
    /// True when the latest report is older than the freshness threshold
    pub stale: bool,
    pub score: f64,
    pub detail: ScanDetail,
}

// ============================================================================
// Scan
// ============================================================================

/// Score every asset in the universe and rank the results.
///
/// `today` is caller-supplied so staleness checks stay deterministic and
/// testable. Ties rank by asset id ascending.
pub fn scan(
    universe: &[AssetSeries],
    mode: ScanMode,
    config: &ScanConfig,
    sort_key: SortKey,
    today: NaiveDate,
) -> CotResult<Vec<ScanEntry>> {
    if config.lookback == 0 {
        return Err(CotError::InvalidLookback(0));
    }

    info!(
        mode = mode.label(),
        assets = universe.len(),
        lookback = config.lookback,
        "Scanning universe"
    );

    let mut entries = Vec::with_capacity(universe.len());
    for series in universe {
        let Some(latest) = series.latest() else {
            debug!(asset = %series.asset_id, "Skipping empty series");
            continue;
        };
        let Some((score, detail)) = score_asset(series, mode, config.lookback)? else {
            debug!(
                asset = %series.asset_id,
                have = series.len(),
                need = config.lookback,
                "Skipping asset with insufficient history"
            );
            continue;
        };

        entries.push(ScanEntry {
            asset_id: series.asset_id.clone(),
            latest_date: latest.date,
            stale: (today - latest.date).num_days() > config.freshness_threshold_days,
            score,
            detail,
        });
    }

    sort_entries(&mut entries, sort_key);
    Ok(entries)
}

/// Score one asset, or `None` when it lacks the history the mode requires.
fn score_asset(
    series: &AssetSeries,
    mode: ScanMode,
    lookback: usize,
) -> CotResult<Option<(f64, ScanDetail)>> {
    match mode {
        ScanMode::Divergence => {
            let speculative = series.net_series(TraderCategory::Speculative)?;
            let commercial = series.net_series(TraderCategory::Commercial)?;
            let (Some(speculative_index), Some(commercial_index)) = (
                latest_index(&speculative, lookback),
                latest_index(&commercial, lookback),
            ) else {
                return Ok(None);
            };
            Ok(Some((
                speculative_index - commercial_index,
                ScanDetail::Divergence {
                    speculative_index,
                    commercial_index,
                },
            )))
        }
        ScanMode::Flow => {
            let speculative = series.net_series(TraderCategory::Speculative)?;
            let Some(stats) = flow_stats(&changes(&speculative), lookback) else {
                return Ok(None);
            };
            Ok(Some((
                stats.z_score,
                ScanDetail::Flow {
                    latest_change: stats.latest_change,
                    change_mean: stats.change_mean,
                    change_std: stats.change_std,
                },
            )))
        }
        ScanMode::Reversal => {
            let speculative = series.net_series(TraderCategory::Speculative)?;
            let retail = series.net_series(TraderCategory::Retail)?;
            let (Some(speculative_index), Some(retail_index)) = (
                latest_index(&speculative, lookback),
                latest_index(&retail, lookback),
            ) else {
                return Ok(None);
            };
            Ok(Some((
                speculative_index - retail_index,
                ScanDetail::Reversal {
                    speculative_index,
                    retail_index,
                },
            )))
        }
    }
}

fn sort_entries(entries: &mut [ScanEntry], sort_key: SortKey) {
    entries.sort_by(|a, b| {
        let (key_a, key_b) = match sort_key {
            SortKey::AbsScore => (a.score.abs(), b.score.abs()),
            SortKey::RawScore => (a.score, b.score),
        };
        key_b
            .partial_cmp(&key_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.asset_id.cmp(&b.asset_id))
    });
}
