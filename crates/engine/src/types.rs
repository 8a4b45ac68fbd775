//! Core data model for COT positioning analysis

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CotError, CotResult};

/// Trader category in the CFTC legacy report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraderCategory {
    /// Non-commercial (large speculators)
    Speculative,
    /// Commercial hedgers
    Commercial,
    /// Non-reportable (small traders)
    Retail,
}

impl TraderCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Speculative => "Speculative",
            Self::Commercial => "Commercial",
            Self::Retail => "Retail",
        }
    }

    pub fn all() -> &'static [TraderCategory] {
        &[Self::Speculative, Self::Commercial, Self::Retail]
    }
}

/// Long/short contract counts reported for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Positions {
    pub long: i64,
    pub short: i64,
}

impl Positions {
    pub fn new(long: i64, short: i64) -> Self {
        Self { long, short }
    }

    /// Net position (long minus short). Reported counts are never negative,
    /// so a negative input is upstream corruption and must not flow into a
    /// net calculation.
    pub fn net(&self) -> CotResult<i64> {
        if self.long < 0 || self.short < 0 {
            return Err(CotError::InvalidPositionData {
                long: self.long,
                short: self.short,
            });
        }
        Ok(self.long - self.short)
    }
}

/// One weekly report row for a single asset
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionRecord {
    pub date: NaiveDate,
    pub speculative: Positions,
    pub commercial: Positions,
    /// Absent in datasets that do not break out non-reportable positions
    pub retail: Option<Positions>,
}

impl PositionRecord {
    pub fn positions(&self, category: TraderCategory) -> Option<Positions> {
        match category {
            TraderCategory::Speculative => Some(self.speculative),
            TraderCategory::Commercial => Some(self.commercial),
            TraderCategory::Retail => self.retail,
        }
    }
}

/// One observation of a derived numeric series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Weekly report history for one asset, strictly increasing by date
#[derive(Debug, Clone, Serialize)]
pub struct AssetSeries {
    pub asset_id: String,
    records: Vec<PositionRecord>,
}

impl AssetSeries {
    /// Build a series from raw rows. Rows are sorted by date; when the same
    /// date appears more than once the last row wins.
    pub fn new(asset_id: impl Into<String>, records: Vec<PositionRecord>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, PositionRecord> = BTreeMap::new();
        for record in records {
            by_date.insert(record.date, record);
        }
        Self {
            asset_id: asset_id.into(),
            records: by_date.into_values().collect(),
        }
    }

    pub fn records(&self) -> &[PositionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent report
    pub fn latest(&self) -> Option<&PositionRecord> {
        self.records.last()
    }

    /// Report before the most recent one
    pub fn previous(&self) -> Option<&PositionRecord> {
        self.records.len().checked_sub(2).map(|i| &self.records[i])
    }

    /// Net-position series for one category. Rows without retail data are
    /// skipped for the retail category; negative counts surface as errors.
    pub fn net_series(&self, category: TraderCategory) -> CotResult<Vec<SeriesPoint>> {
        let mut points = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let Some(positions) = record.positions(category) else {
                continue;
            };
            points.push(SeriesPoint {
                date: record.date,
                value: positions.net()? as f64,
            });
        }
        Ok(points)
    }
}

/// A single OHLCV price bar
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Scanner configuration
///
/// Replaces the module-level constants of the source dashboards with explicit
/// per-call parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Rolling normalization window, in reporting periods (weeks)
    pub lookback: usize,
    /// Reports older than this many days are flagged stale
    pub freshness_threshold_days: i64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            lookback: 26,
            freshness_threshold_days: 9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn make_record(day: u32, spec_long: i64, spec_short: i64) -> PositionRecord {
        PositionRecord {
            date: date(day),
            speculative: Positions::new(spec_long, spec_short),
            commercial: Positions::new(10, 20),
            retail: None,
        }
    }

    #[test]
    fn test_net_is_long_minus_short() {
        assert_eq!(Positions::new(120, 45).net().unwrap(), 75);
        assert_eq!(Positions::new(45, 120).net().unwrap(), -75);
        assert_eq!(Positions::new(0, 0).net().unwrap(), 0);
    }

    #[test]
    fn test_net_rejects_negative_counts() {
        let err = Positions::new(-1, 5).net().unwrap_err();
        assert_eq!(err, CotError::InvalidPositionData { long: -1, short: 5 });
        assert!(Positions::new(5, -1).net().is_err());
    }

    #[test]
    fn test_series_sorts_records_by_date() {
        let series = AssetSeries::new(
            "EUR",
            vec![make_record(15, 3, 0), make_record(1, 1, 0), make_record(8, 2, 0)],
        );
        let dates: Vec<NaiveDate> = series.records().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(1), date(8), date(15)]);
    }

    #[test]
    fn test_series_dedup_last_write_wins() {
        let series = AssetSeries::new(
            "EUR",
            vec![make_record(1, 100, 0), make_record(8, 5, 0), make_record(8, 7, 0)],
        );
        assert_eq!(series.len(), 2);
        assert_eq!(series.latest().unwrap().speculative.long, 7);
    }

    #[test]
    fn test_latest_and_previous() {
        let series = AssetSeries::new("EUR", vec![make_record(1, 1, 0), make_record(8, 2, 0)]);
        assert_eq!(series.latest().unwrap().date, date(8));
        assert_eq!(series.previous().unwrap().date, date(1));

        let single = AssetSeries::new("EUR", vec![make_record(1, 1, 0)]);
        assert!(single.previous().is_none());
        assert!(AssetSeries::new("EUR", vec![]).latest().is_none());
    }

    #[test]
    fn test_net_series_values() {
        let series = AssetSeries::new("EUR", vec![make_record(1, 30, 10), make_record(8, 10, 30)]);
        let nets = series.net_series(TraderCategory::Speculative).unwrap();
        assert_eq!(nets.len(), 2);
        assert_eq!(nets[0].value, 20.0);
        assert_eq!(nets[1].value, -20.0);
    }

    #[test]
    fn test_net_series_skips_missing_retail() {
        let mut with_retail = make_record(8, 1, 0);
        with_retail.retail = Some(Positions::new(40, 15));
        let series = AssetSeries::new("EUR", vec![make_record(1, 1, 0), with_retail]);

        let retail = series.net_series(TraderCategory::Retail).unwrap();
        assert_eq!(retail.len(), 1);
        assert_eq!(retail[0].date, date(8));
        assert_eq!(retail[0].value, 25.0);
    }

    #[test]
    fn test_net_series_propagates_corrupt_counts() {
        let series = AssetSeries::new("EUR", vec![make_record(1, -3, 0)]);
        assert!(series.net_series(TraderCategory::Speculative).is_err());
    }

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.lookback, 26);
        assert_eq!(config.freshness_threshold_days, 9);
    }
}
