//! COT Positioning Engine — rolling indices, pair scores and universe scans
//!
//! Deduplicated core behind a set of COT dashboard pages. Provides:
//! - rolling positioning index ([0, 100] min-max normalization)
//! - net-position derivation per trader category
//! - currency-pair normalization with OHLC price inversion
//! - pairwise positioning scores (snapshot, history, price-synced history)
//! - universe scans ranked by divergence, flow z-score or reversal
//! - dollar-value flow conversion via contract specifications
//!
//! Every operation is a synchronous pure function over immutable inputs;
//! data retrieval, caching and rendering live outside this crate.

pub mod error;
pub mod indicators;
pub mod monetary;
pub mod pairs;
pub mod scan;
pub mod summary;
pub mod types;

// Re-exports for convenience
pub use error::{CotError, CotResult};
pub use indicators::{changes, cot_index, flow_stats, latest_index, FlowStats, IndexPoint};
pub use monetary::{
    contract_value_usd, scan_monetary_flow, ContractQuote, ContractSpec, MonetaryFlowEntry,
};
pub use pairs::{
    invert_bar, invert_bars, normalize, score_history, score_history_with_prices, score_snapshot,
    CurrencyHierarchy, NormalizedPair, PairScorePoint, PairSnapshot, PricedScorePoint,
};
pub use scan::{scan, ScanDetail, ScanEntry, ScanMode, SortKey};
pub use summary::{weekly_summary, CategoryBreakdown, WeeklySummary};
pub use types::*;
