use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Percent, Symbol};

/// Per-asset market data used to annotate quotes. Every field may be
/// missing; the engine never substitutes values for absent data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default, alias = "put_iv_3m")]
    pub put_implied_vol_3m: Option<Percent>,
    #[serde(default, alias = "vol_90d")]
    pub historical_vol_90d: Option<Percent>,
    /// Initial fixing of the note, when the quote is for a live position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_price: Option<Decimal>,
}

impl AssetSnapshot {
    /// Current price as percent of the initial fixing. Without a reference
    /// price the note is being struck today, i.e. 100%.
    pub fn current_price_pct(&self) -> Percent {
        match (self.price, self.reference_price) {
            (Some(price), Some(reference)) if reference > Decimal::ZERO => {
                price * dec!(100) / reference
            }
            _ => dec!(100),
        }
    }

    /// Field-wise merge: values present in `self` win over `fallback`.
    pub fn or(&self, fallback: &AssetSnapshot) -> AssetSnapshot {
        AssetSnapshot {
            price: self.price.or(fallback.price),
            put_implied_vol_3m: self.put_implied_vol_3m.or(fallback.put_implied_vol_3m),
            historical_vol_90d: self.historical_vol_90d.or(fallback.historical_vol_90d),
            reference_price: self.reference_price.or(fallback.reference_price),
        }
    }
}

/// Market-wide parameters shown alongside a batch. Null until loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketParameters {
    #[serde(default, alias = "SOFR_RATE")]
    pub risk_free_rate_pct: Option<Percent>,
    #[serde(default, alias = "VIX_INDEX")]
    pub volatility_index: Option<Decimal>,
}

/// Everything the volatility/pool data collaborator supplies for one
/// pricing date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub pricing_date: NaiveDate,
    #[serde(default)]
    pub market_parameters: MarketParameters,
    #[serde(default)]
    pub assets: BTreeMap<Symbol, AssetSnapshot>,
}

impl MarketData {
    /// Market data with no asset annotations.
    pub fn empty(pricing_date: NaiveDate) -> Self {
        Self {
            pricing_date,
            market_parameters: MarketParameters::default(),
            assets: BTreeMap::new(),
        }
    }

    pub fn snapshot(&self, symbol: &str) -> AssetSnapshot {
        self.assets.get(symbol).cloned().unwrap_or_default()
    }
}
