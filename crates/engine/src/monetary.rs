//! Dollar-value flow scan
//!
//! Position changes measured in contracts are not comparable across markets;
//! converting the weekly net change into USD through per-market contract
//! specifications makes them so. Prices are supplied by the caller — this
//! module never fetches anything.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CotResult;
use crate::types::AssetSeries;

/// How a market's quoted price converts to a USD contract value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractQuote {
    /// Quoted directly in USD per unit
    Usd,
    /// Index points times a fixed dollar multiplier
    IndexPoint,
    /// Bond-style USD price on a notional face value
    UsdPrice,
    /// Quoted as JPY per USD; contract value is unit / price
    JpyPerUsd,
    /// Quoted in JPY, converted through the USD/JPY rate
    Jpy,
}

/// Contract size and quote convention for one market
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContractSpec {
    pub unit: Decimal,
    pub quote: ContractQuote,
}

/// USD value of one contract at the given price.
///
/// Returns `None` for non-positive prices, or for JPY-quoted contracts
/// without a usable USD/JPY rate.
pub fn contract_value_usd(
    spec: &ContractSpec,
    price: Decimal,
    usd_jpy: Option<Decimal>,
) -> Option<Decimal> {
    if price <= Decimal::ZERO {
        return None;
    }

    match spec.quote {
        ContractQuote::Usd | ContractQuote::IndexPoint | ContractQuote::UsdPrice => {
            Some(spec.unit * price)
        }
        ContractQuote::JpyPerUsd => Some(spec.unit / price),
        ContractQuote::Jpy => match usd_jpy {
            Some(rate) if rate > Decimal::ZERO => Some(spec.unit * price / rate),
            _ => None,
        },
    }
}

/// One ranked row of a monetary flow scan
#[derive(Debug, Clone, Serialize)]
pub struct MonetaryFlowEntry {
    pub asset_id: String,
    pub latest_date: NaiveDate,
    pub price: Decimal,
    pub contract_value_usd: Decimal,
    pub speculative_flow_usd: Decimal,
    pub commercial_flow_usd: Decimal,
}

/// Convert every asset's latest weekly net change into USD and rank by
/// absolute speculative flow.
///
/// Assets without two weeks of data, a contract specification or a usable
/// price are omitted; corrupt position counts surface as errors.
pub fn scan_monetary_flow(
    universe: &[AssetSeries],
    specs: &HashMap<String, ContractSpec>,
    prices: &HashMap<String, Decimal>,
    usd_jpy: Option<Decimal>,
) -> CotResult<Vec<MonetaryFlowEntry>> {
    let mut entries = Vec::new();

    for series in universe {
        let (Some(latest), Some(previous)) = (series.latest(), series.previous()) else {
            debug!(asset = %series.asset_id, "Skipping asset without two weeks of data");
            continue;
        };
        let Some(spec) = specs.get(&series.asset_id) else {
            debug!(asset = %series.asset_id, "Skipping asset without a contract specification");
            continue;
        };
        let Some(&price) = prices.get(&series.asset_id) else {
            debug!(asset = %series.asset_id, "Skipping asset without a price");
            continue;
        };
        let Some(value) = contract_value_usd(spec, price, usd_jpy) else {
            debug!(asset = %series.asset_id, %price, "Skipping asset without a usable contract value");
            continue;
        };

        let speculative_change = latest.speculative.net()? - previous.speculative.net()?;
        let commercial_change = latest.commercial.net()? - previous.commercial.net()?;

        entries.push(MonetaryFlowEntry {
            asset_id: series.asset_id.clone(),
            latest_date: latest.date,
            price,
            contract_value_usd: value,
            speculative_flow_usd: Decimal::from(speculative_change) * value,
            commercial_flow_usd: Decimal::from(commercial_change) * value,
        });
    }

    entries.sort_by(|a, b| {
        b.speculative_flow_usd
            .abs()
            .cmp(&a.speculative_flow_usd.abs())
            .then_with(|| a.asset_id.cmp(&b.asset_id))
    });
    Ok(entries)
}
