//! Currency-pair normalization and pairwise positioning scores
//!
//! A pair of assets is resolved to market-convention base/quote order via a
//! fixed currency hierarchy; price series quoted in the caller's order are
//! reciprocal-inverted when that order disagrees with convention. Pairwise
//! scores subtract the quote asset's rolling index from the base asset's:
//! positive favors the base, negative the quote.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CotError, CotResult};
use crate::indicators::{cot_index, latest_index};
use crate::types::{PriceBar, SeriesPoint};

// ============================================================================
// Currency hierarchy
// ============================================================================

/// Fixed precedence order over currency codes
///
/// Earlier codes are quoted as the base of a pair by market convention (not
/// alphabetically).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyHierarchy {
    order: Vec<String>,
}

impl CurrencyHierarchy {
    pub fn new<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order: order.into_iter().map(Into::into).collect(),
        }
    }

    /// Position of a code in the hierarchy; lower rank means higher
    /// precedence as base.
    pub fn rank(&self, code: &str) -> Option<usize> {
        self.order.iter().position(|c| c == code)
    }
}

impl Default for CurrencyHierarchy {
    /// Market-convention ordering for the majors
    fn default() -> Self {
        Self::new(["EUR", "GBP", "AUD", "USD", "CAD", "CHF", "JPY"])
    }
}

/// A pair resolved to market-convention order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPair {
    pub base: String,
    pub quote: String,
    /// True when the caller's first operand is not the conventional base, so
    /// price series quoted in the caller's order need reciprocal inversion
    pub inverted: bool,
}

/// Resolve two currency codes to conventional base/quote order.
pub fn normalize(
    ccy_a: &str,
    ccy_b: &str,
    hierarchy: &CurrencyHierarchy,
) -> CotResult<NormalizedPair> {
    let rank_a = hierarchy
        .rank(ccy_a)
        .ok_or_else(|| CotError::UnknownCurrency(ccy_a.to_string()))?;
    let rank_b = hierarchy
        .rank(ccy_b)
        .ok_or_else(|| CotError::UnknownCurrency(ccy_b.to_string()))?;

    if rank_b < rank_a {
        Ok(NormalizedPair {
            base: ccy_b.to_string(),
            quote: ccy_a.to_string(),
            inverted: true,
        })
    } else {
        Ok(NormalizedPair {
            base: ccy_a.to_string(),
            quote: ccy_b.to_string(),
            inverted: false,
        })
    }
}

// ============================================================================
// Price inversion
// ============================================================================

/// Reciprocal-invert one OHLC bar (`x -> 1/x`).
///
/// Inversion reverses ordering, so the old low becomes the new high and vice
/// versa; open and close transform directly. Volume is preserved.
pub fn invert_bar(bar: &PriceBar) -> CotResult<PriceBar> {
    if bar.open <= Decimal::ZERO
        || bar.high <= Decimal::ZERO
        || bar.low <= Decimal::ZERO
        || bar.close <= Decimal::ZERO
    {
        return Err(CotError::NonPositivePrice(bar.date));
    }

    Ok(PriceBar {
        date: bar.date,
        open: Decimal::ONE / bar.open,
        high: Decimal::ONE / bar.low,
        low: Decimal::ONE / bar.high,
        close: Decimal::ONE / bar.close,
        volume: bar.volume,
    })
}

/// Reciprocal-invert a whole bar series.
pub fn invert_bars(bars: &[PriceBar]) -> CotResult<Vec<PriceBar>> {
    bars.iter().map(invert_bar).collect()
}

// ============================================================================
// Pair scoring
// ============================================================================

/// Latest pairwise positioning snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairSnapshot {
    pub base_index: f64,
    pub quote_index: f64,
    /// `base_index - quote_index`; positive favors the base asset
    pub score: f64,
}

/// Score the latest observation of a pair.
///
/// Fails with `InsufficientHistory` when either series is shorter than
/// `lookback` or its latest index value is undefined (flat window).
pub fn score_snapshot(
    base_series: &[SeriesPoint],
    quote_series: &[SeriesPoint],
    lookback: usize,
) -> CotResult<PairSnapshot> {
    if lookback == 0 {
        return Err(CotError::InvalidLookback(0));
    }
    for series in [base_series, quote_series] {
        if series.len() < lookback {
            return Err(CotError::InsufficientHistory {
                have: series.len(),
                need: lookback,
            });
        }
    }

    let base_index = latest_index(base_series, lookback).ok_or(CotError::InsufficientHistory {
        have: base_series.len(),
        need: lookback,
    })?;
    let quote_index =
        latest_index(quote_series, lookback).ok_or(CotError::InsufficientHistory {
            have: quote_series.len(),
            need: lookback,
        })?;

    Ok(PairSnapshot {
        base_index,
        quote_index,
        score: base_index - quote_index,
    })
}

/// One row of a pairwise score history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairScorePoint {
    pub date: NaiveDate,
    pub score: f64,
    /// Change from the previous row; `None` on the first row
    pub delta: Option<f64>,
}

/// Score a pair across its full joint history.
///
/// Positioning reports can follow different publication calendars per asset,
/// so the two index series are inner-joined: only dates where both indices
/// are defined produce a row, with no forward-fill across the series
/// boundary. A join of fewer than two rows yields an empty history (the first
/// difference needs two rows).
pub fn score_history(
    base_series: &[SeriesPoint],
    quote_series: &[SeriesPoint],
    lookback: usize,
) -> CotResult<Vec<PairScorePoint>> {
    if lookback == 0 {
        return Err(CotError::InvalidLookback(0));
    }

    let quote_by_date: BTreeMap<NaiveDate, f64> = cot_index(quote_series, lookback)
        .into_iter()
        .filter_map(|point| point.value.map(|value| (point.date, value)))
        .collect();

    let mut joined: Vec<(NaiveDate, f64)> = Vec::new();
    for point in cot_index(base_series, lookback) {
        let Some(base_value) = point.value else {
            continue;
        };
        let Some(&quote_value) = quote_by_date.get(&point.date) else {
            continue;
        };
        joined.push((point.date, base_value - quote_value));
    }

    if joined.len() < 2 {
        return Ok(Vec::new());
    }

    Ok(joined
        .iter()
        .enumerate()
        .map(|(i, &(date, score))| PairScorePoint {
            date,
            score,
            delta: (i > 0).then(|| score - joined[i - 1].1),
        })
        .collect())
}

/// Score history joined with the pair's closing price, for chart overlays
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricedScorePoint {
    pub date: NaiveDate,
    pub score: f64,
    pub delta: Option<f64>,
    pub close: Decimal,
}

/// Score history restricted to dates that also have a price bar.
pub fn score_history_with_prices(
    base_series: &[SeriesPoint],
    quote_series: &[SeriesPoint],
    lookback: usize,
    bars: &[PriceBar],
) -> CotResult<Vec<PricedScorePoint>> {
    let history = score_history(base_series, quote_series, lookback)?;
    let close_by_date: BTreeMap<NaiveDate, Decimal> =
        bars.iter().map(|bar| (bar.date, bar.close)).collect();

    Ok(history
        .into_iter()
        .filter_map(|point| {
            close_by_date.get(&point.date).map(|&close| PricedScorePoint {
                date: point.date,
                score: point.score,
                delta: point.delta,
                close,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        // Day offset from a fixed base so values past the end of January
        // (e.g. 36) still yield valid, distinct, order-preserving dates.
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(day as i64 - 1)
    }

    fn make_points(dates_and_values: &[(u32, f64)]) -> Vec<SeriesPoint> {
        dates_and_values
            .iter()
            .map(|&(day, value)| SeriesPoint {
                date: date(day),
                value,
            })
            .collect()
    }

    fn make_bar(day: u32, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> PriceBar {
        PriceBar {
            date: date(day),
            open,
            high,
            low,
            close,
            volume: dec!(1000),
        }
    }

    fn assert_close(a: Decimal, b: Decimal) {
        assert!((a - b).abs() < dec!(0.000000001), "{} != {}", a, b);
    }

    #[test]
    fn test_normalize_follows_hierarchy() {
        let hierarchy = CurrencyHierarchy::default();

        let pair = normalize("USD", "JPY", &hierarchy).unwrap();
        assert_eq!(pair.base, "USD");
        assert_eq!(pair.quote, "JPY");
        assert!(!pair.inverted);

        let pair = normalize("JPY", "USD", &hierarchy).unwrap();
        assert_eq!(pair.base, "USD");
        assert_eq!(pair.quote, "JPY");
        assert!(pair.inverted);

        let pair = normalize("GBP", "EUR", &hierarchy).unwrap();
        assert_eq!(pair.base, "EUR");
        assert_eq!(pair.quote, "GBP");
        assert!(pair.inverted);
    }

    #[test]
    fn test_normalize_unknown_currency() {
        let hierarchy = CurrencyHierarchy::default();
        assert_eq!(
            normalize("USD", "XAU", &hierarchy).unwrap_err(),
            CotError::UnknownCurrency("XAU".to_string())
        );
        assert!(normalize("ZZZ", "USD", &hierarchy).is_err());
    }

    #[test]
    fn test_normalize_same_code_keeps_order() {
        let hierarchy = CurrencyHierarchy::default();
        let pair = normalize("USD", "USD", &hierarchy).unwrap();
        assert_eq!(pair.base, "USD");
        assert!(!pair.inverted);
    }

    #[test]
    fn test_invert_bar_swaps_high_and_low() {
        let bar = make_bar(1, dec!(2), dec!(4), dec!(1), dec!(2.5));
        let inverted = invert_bar(&bar).unwrap();
        assert_eq!(inverted.open, dec!(0.5));
        assert_eq!(inverted.high, dec!(1)); // 1 / old low
        assert_eq!(inverted.low, dec!(0.25)); // 1 / old high
        assert_eq!(inverted.close, dec!(0.4));
        assert_eq!(inverted.volume, bar.volume);
        assert!(inverted.low <= inverted.open && inverted.open <= inverted.high);
    }

    #[test]
    fn test_invert_bar_round_trip() {
        let bar = make_bar(1, dec!(3), dec!(7), dec!(1.5), dec!(6));
        let round_tripped = invert_bar(&invert_bar(&bar).unwrap()).unwrap();
        assert_close(round_tripped.open, bar.open);
        assert_close(round_tripped.high, bar.high);
        assert_close(round_tripped.low, bar.low);
        assert_close(round_tripped.close, bar.close);
    }

    #[test]
    fn test_invert_bar_rejects_non_positive_price() {
        let bar = make_bar(1, dec!(0), dec!(4), dec!(1), dec!(2));
        assert_eq!(
            invert_bar(&bar).unwrap_err(),
            CotError::NonPositivePrice(date(1))
        );
    }

    #[test]
    fn test_snapshot_score_is_index_difference() {
        // Both windows span [0, 100], so the latest values map to their own
        // percentile: 80 and 20
        let base = make_points(&[(1, 0.0), (8, 100.0), (15, 40.0), (22, 60.0), (29, 80.0)]);
        let quote = make_points(&[(1, 0.0), (8, 100.0), (15, 40.0), (22, 60.0), (29, 20.0)]);

        let snapshot = score_snapshot(&base, &quote, 5).unwrap();
        assert_eq!(snapshot.base_index, 80.0);
        assert_eq!(snapshot.quote_index, 20.0);
        assert_eq!(snapshot.score, 60.0);
    }

    #[test]
    fn test_snapshot_insufficient_history() {
        let base = make_points(&[(1, 1.0), (8, 2.0)]);
        let quote = make_points(&[(1, 5.0), (8, 4.0), (15, 3.0)]);
        assert_eq!(
            score_snapshot(&base, &quote, 3).unwrap_err(),
            CotError::InsufficientHistory { have: 2, need: 3 }
        );
    }

    #[test]
    fn test_snapshot_flat_series_is_insufficient() {
        let base = make_points(&[(1, 1.0), (8, 2.0), (15, 3.0)]);
        let flat = make_points(&[(1, 5.0), (8, 5.0), (15, 5.0)]);
        assert!(score_snapshot(&base, &flat, 3).is_err());
    }

    #[test]
    fn test_snapshot_zero_lookback() {
        let series = make_points(&[(1, 1.0)]);
        assert_eq!(
            score_snapshot(&series, &series, 0).unwrap_err(),
            CotError::InvalidLookback(0)
        );
    }

    #[test]
    fn test_history_inner_joins_on_date() {
        // With lookback 2 the index is defined from the second observation
        // on; defined dates are {8, 15, 22, 36} vs {8, 15, 29, 36}
        let base = make_points(&[(1, 1.0), (8, 2.0), (15, 3.0), (22, 4.0), (36, 5.0)]);
        let quote = make_points(&[(1, 5.0), (8, 4.0), (15, 3.0), (29, 2.0), (36, 1.0)]);

        let history = score_history(&base, &quote, 2).unwrap();
        let dates: Vec<NaiveDate> = history.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date(8), date(15), date(36)]);

        // Rising base vs falling quote: every joined score is 100 - 0
        for point in &history {
            assert_eq!(point.score, 100.0);
        }
        assert_eq!(history[0].delta, None);
        assert_eq!(history[1].delta, Some(0.0));
        assert_eq!(history[2].delta, Some(0.0));
    }

    #[test]
    fn test_history_single_joined_row_is_empty() {
        let base = make_points(&[(1, 1.0), (8, 2.0), (15, 3.0)]);
        let quote = make_points(&[(8, 4.0), (15, 3.0)]);
        // Quote is only defined at date 15, so the join has one row
        assert!(score_history(&base, &quote, 2).unwrap().is_empty());
    }

    #[test]
    fn test_history_with_prices_keeps_priced_dates() {
        let base = make_points(&[(1, 1.0), (8, 2.0), (15, 3.0), (22, 4.0)]);
        let quote = make_points(&[(1, 5.0), (8, 4.0), (15, 3.0), (22, 2.0)]);
        let bars = vec![
            make_bar(8, dec!(1.1), dec!(1.2), dec!(1.0), dec!(1.15)),
            make_bar(22, dec!(1.2), dec!(1.3), dec!(1.1), dec!(1.25)),
        ];

        let history = score_history_with_prices(&base, &quote, 2, &bars).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, date(8));
        assert_eq!(history[0].close, dec!(1.15));
        assert_eq!(history[1].date, date(22));
        assert_eq!(history[1].close, dec!(1.25));
    }
}
