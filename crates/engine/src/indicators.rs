//! Rolling positioning index and flow statistics
//!
//! The COT index is a min-max normalization of a net-position series against
//! its own trailing window, scaled to [0, 100]: 0 means the weakest reading
//! of the window, 100 the strongest. The flow z-score measures how unusual
//! the latest week-over-week net change is against its trailing window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ta::indicators::{Maximum, Minimum};
use ta::Next;

use crate::types::SeriesPoint;

/// One point of a rolling index series
///
/// `None` means the window was incomplete or flat, not zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Rolling min-max index over a trailing `lookback` window, scaled to [0, 100].
///
/// The value at position `i` is defined once `i + 1 >= lookback` and the
/// window is not flat (max > min). The window includes the current point, so
/// defined values always land in [0, 100]. Output depends only on the window
/// contents, never on older history.
pub fn cot_index(series: &[SeriesPoint], lookback: usize) -> Vec<IndexPoint> {
    if lookback == 0 {
        // A zero-width window can never be formed
        return series
            .iter()
            .map(|point| IndexPoint {
                date: point.date,
                value: None,
            })
            .collect();
    }

    let mut rolling_max = Maximum::new(lookback).expect("lookback is non-zero");
    let mut rolling_min = Minimum::new(lookback).expect("lookback is non-zero");

    series
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let max = rolling_max.next(point.value);
            let min = rolling_min.next(point.value);

            let value = if i + 1 < lookback {
                None
            } else if (max - min).abs() < f64::EPSILON {
                // Flat window: the index is undefined, not a fabricated midpoint
                None
            } else {
                Some((point.value - min) / (max - min) * 100.0)
            };

            IndexPoint {
                date: point.date,
                value,
            }
        })
        .collect()
}

/// Index value of the most recent observation, if defined.
pub fn latest_index(series: &[SeriesPoint], lookback: usize) -> Option<f64> {
    cot_index(series, lookback).last().and_then(|point| point.value)
}

/// First differences of a series (week-over-week changes), dated at the
/// later observation of each pair.
pub fn changes(series: &[SeriesPoint]) -> Vec<SeriesPoint> {
    series
        .windows(2)
        .map(|pair| SeriesPoint {
            date: pair[1].date,
            value: pair[1].value - pair[0].value,
        })
        .collect()
}

/// Flow statistics for the most recent change against its trailing window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowStats {
    pub latest_change: f64,
    pub change_mean: f64,
    pub change_std: f64,
    pub z_score: f64,
}

/// Z-score of the latest change against the trailing `lookback` changes
/// (window includes the latest change).
///
/// Returns `None` when fewer than `lookback` changes exist. A zero standard
/// deviation maps to a z-score of exactly 0, never NaN.
pub fn flow_stats(changes: &[SeriesPoint], lookback: usize) -> Option<FlowStats> {
    if lookback == 0 || changes.len() < lookback {
        return None;
    }

    let window: Vec<f64> = changes[changes.len() - lookback..]
        .iter()
        .map(|point| point.value)
        .collect();
    let latest_change = *window.last()?;
    let change_mean = mean(&window);
    let change_std = sample_std(&window);
    let z_score = if change_std == 0.0 {
        0.0
    } else {
        (latest_change - change_mean) / change_std
    };

    Some(FlowStats {
        latest_change,
        change_mean,
        change_std,
        z_score,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 divisor); 0 when fewer than 2 values.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
