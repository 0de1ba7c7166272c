//! Boundary to the external pricing oracle.
//!
//! The engine never prices baskets itself in batch mode: every combination
//! is sent through [`PricingOracle`], which in production wraps the trained
//! model behind a network call. [`HeuristicOracle`] is the local stand-in
//! used for previews and tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::OracleError;
use crate::fcn::market::AssetSnapshot;
use crate::fcn::params::{BarrierType, FcnParameters};
use crate::types::{Percent, Symbol};

#[cfg(feature = "preview")]
use crate::fcn::heuristic::{self, FixedFactor, UniformNoise, VolatilityNoise};
#[cfg(feature = "preview")]
use rand::rngs::StdRng;
#[cfg(feature = "preview")]
use std::sync::Mutex;

/// Terms sent to the oracle for one basket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleRequest {
    pub assets: Vec<Symbol>,
    pub basket_size: usize,
    pub strike_price: Percent,
    pub knock_out_barrier: Percent,
    pub knock_in_barrier: Percent,
    pub barrier_type: BarrierType,
    pub tenor_months: u32,
    pub non_call_periods: u32,
    pub cost_pct: Percent,
    pub pricing_date: NaiveDate,
}

impl OracleRequest {
    /// Request for `assets` on the terms of `params`.
    pub fn for_assets(params: &FcnParameters, assets: Vec<Symbol>, pricing_date: NaiveDate) -> Self {
        Self {
            basket_size: assets.len(),
            assets,
            strike_price: params.strike_price,
            knock_out_barrier: params.knock_out_barrier,
            knock_in_barrier: params.knock_in_barrier,
            barrier_type: params.barrier_type,
            tenor_months: params.tenor_months,
            non_call_periods: params.protection_period_months,
            cost_pct: params.issue_price,
            pricing_date,
        }
    }

    /// The note terms as engine parameters for this basket.
    pub fn to_parameters(&self) -> FcnParameters {
        FcnParameters {
            underlying_assets: self.assets.clone(),
            strike_price: self.strike_price,
            knock_out_barrier: self.knock_out_barrier,
            knock_in_barrier: self.knock_in_barrier,
            barrier_type: self.barrier_type,
            issue_price: self.cost_pct,
            tenor_months: self.tenor_months,
            protection_period_months: self.non_call_periods,
        }
    }
}

/// Oracle answer for one basket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleQuote {
    pub coupon_rate_pct: Percent,
    /// Market data the oracle priced with, keyed by asset.
    #[serde(default)]
    pub market_snapshot: BTreeMap<Symbol, AssetSnapshot>,
}

#[async_trait]
pub trait PricingOracle: Send + Sync {
    async fn quote(&self, request: &OracleRequest) -> Result<OracleQuote, OracleError>;
}

#[async_trait]
impl<T: PricingOracle + ?Sized> PricingOracle for std::sync::Arc<T> {
    async fn quote(&self, request: &OracleRequest) -> Result<OracleQuote, OracleError> {
        (**self).quote(request).await
    }
}

// ---------------------------------------------------------------------------
// Local heuristic stand-in
// ---------------------------------------------------------------------------

/// Prices baskets with the local coupon heuristic. Carries no market data.
#[cfg(feature = "preview")]
pub struct HeuristicOracle<N> {
    noise: Mutex<N>,
}

#[cfg(feature = "preview")]
impl<N: VolatilityNoise> HeuristicOracle<N> {
    pub fn new(noise: N) -> Self {
        Self {
            noise: Mutex::new(noise),
        }
    }
}

#[cfg(feature = "preview")]
impl HeuristicOracle<FixedFactor> {
    /// Volatility factor pinned to 1.0.
    pub fn deterministic() -> Self {
        Self::new(FixedFactor(rust_decimal::Decimal::ONE))
    }
}

#[cfg(feature = "preview")]
impl HeuristicOracle<UniformNoise<StdRng>> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(UniformNoise::seeded(seed))
    }
}

#[cfg(feature = "preview")]
#[async_trait]
impl<N: VolatilityNoise + Send> PricingOracle for HeuristicOracle<N> {
    async fn quote(&self, request: &OracleRequest) -> Result<OracleQuote, OracleError> {
        let factor = {
            let mut noise = self
                .noise
                .lock()
                .map_err(|_| OracleError::Failure("volatility factor source poisoned".into()))?;
            noise.volatility_factor()
        };
        let quote = heuristic::price(&request.to_parameters(), &mut FixedFactor(factor));
        Ok(OracleQuote {
            coupon_rate_pct: quote.annualized_coupon_pct,
            market_snapshot: BTreeMap::new(),
        })
    }
}
