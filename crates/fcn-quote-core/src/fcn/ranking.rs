//! Batch quote generation: enumerate baskets, price each through the
//! oracle, annotate with market-derived metrics and rank.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::{EngineConfig, QuoteLimits};
use crate::error::{FcnError, OracleError};
use crate::fcn::combinations::{enumerate, Combination};
use crate::fcn::market::{AssetSnapshot, MarketData, MarketParameters};
use crate::fcn::oracle::{OracleQuote, OracleRequest, PricingOracle};
use crate::fcn::params::{AssetScope, FcnParameters};
use crate::fcn::risk::{classify_risk, RiskLevel};
use crate::types::{with_metadata, ComputationOutput, Percent, Symbol};
use crate::FcnResult;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Note terms plus the basket sizes to draw from `underlying_assets`,
/// which acts as the candidate pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchQuoteRequest {
    #[serde(flatten)]
    pub parameters: FcnParameters,
    pub basket_sizes: Vec<usize>,
}

/// A priced basket. Built once, never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcnQuote {
    pub id: String,
    pub assets: Vec<Symbol>,
    pub basket_size: usize,
    pub coupon_rate_pct: Percent,
    pub distance_to_knock_in_pct: Percent,
    pub max_implied_vol_pct: Option<Percent>,
    pub yield_boost_pct: Option<Percent>,
    pub risk_level: RiskLevel,
    pub market_snapshot: BTreeMap<Symbol, AssetSnapshot>,
    pub enumeration_index: usize,
}

/// Request terms echoed back with the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EchoedParameters {
    #[serde(flatten)]
    pub parameters: FcnParameters,
    pub basket_sizes: Vec<usize>,
    pub no_knock_out: bool,
}

/// A basket the oracle could not price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationFailure {
    pub assets: Vec<Symbol>,
    pub error: OracleError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchQuoteResult {
    /// Ranked: coupon descending, then distance to knock-in descending,
    /// then enumeration order.
    pub quotes: Vec<FcnQuote>,
    /// Successfully priced baskets only.
    pub total_count: usize,
    pub failed_count: usize,
    pub failures: Vec<CombinationFailure>,
    pub pricing_date: NaiveDate,
    pub parameters: EchoedParameters,
    pub market_parameters: MarketParameters,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Quote before the batch-relative yield boost is known.
struct ScoredBasket {
    combination: Combination,
    coupon_rate_pct: Percent,
    distance_to_knock_in_pct: Percent,
    max_implied_vol_pct: Option<Percent>,
    risk_level: RiskLevel,
    market_snapshot: BTreeMap<Symbol, AssetSnapshot>,
}

fn score_basket(
    params: &FcnParameters,
    combination: Combination,
    quote: OracleQuote,
    market: &MarketData,
) -> ScoredBasket {
    let market_snapshot: BTreeMap<Symbol, AssetSnapshot> = combination
        .assets
        .iter()
        .map(|asset| {
            let pool = market.snapshot(asset);
            let merged = match quote.market_snapshot.get(asset) {
                Some(from_oracle) => from_oracle.or(&pool),
                None => pool,
            };
            (asset.clone(), merged)
        })
        .collect();

    // Worst-of: the basket is as close to knock-in as its weakest asset.
    let worst_price_pct = market_snapshot
        .values()
        .map(AssetSnapshot::current_price_pct)
        .min()
        .unwrap_or(dec!(100));
    let distance = worst_price_pct - params.knock_in_barrier;

    let max_implied_vol = market_snapshot
        .values()
        .map(|s| s.put_implied_vol_3m)
        .collect::<Option<Vec<_>>>()
        .and_then(|vols| vols.into_iter().max())
        .map(|v| v.round_dp(1));

    let shift = dec!(100) - worst_price_pct;
    let risk_level = classify_risk(params.strike_price + shift, dec!(100) - distance);

    ScoredBasket {
        combination,
        coupon_rate_pct: quote.coupon_rate_pct.round_dp(2),
        distance_to_knock_in_pct: distance.round_dp(1),
        max_implied_vol_pct: max_implied_vol,
        risk_level,
        market_snapshot,
    }
}

/// Coupon of the single-asset quote on the lowest-volatility asset.
fn baseline_coupon(scored: &[ScoredBasket]) -> Option<Percent> {
    scored
        .iter()
        .filter(|s| s.combination.basket_size == 1)
        .filter_map(|s| {
            let asset = s.combination.assets.first()?;
            let vol = s.market_snapshot.get(asset)?.put_implied_vol_3m?;
            Some((vol, s.combination.index, s.coupon_rate_pct))
        })
        .min_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, _, coupon)| coupon)
}

fn finalise(scored: Vec<ScoredBasket>) -> Vec<FcnQuote> {
    let baseline = baseline_coupon(&scored);
    scored
        .into_iter()
        .map(|s| FcnQuote {
            id: format!("quote-{}", s.combination.index),
            basket_size: s.combination.basket_size,
            enumeration_index: s.combination.index,
            assets: s.combination.assets,
            coupon_rate_pct: s.coupon_rate_pct,
            distance_to_knock_in_pct: s.distance_to_knock_in_pct,
            max_implied_vol_pct: s.max_implied_vol_pct,
            yield_boost_pct: baseline.map(|b| (s.coupon_rate_pct - b).round_dp(2)),
            risk_level: s.risk_level,
            market_snapshot: s.market_snapshot,
        })
        .collect()
}

/// Sorts quotes into their final order. The key is total, so the result
/// does not depend on the incoming order.
pub fn rank_quotes(quotes: &mut [FcnQuote]) {
    quotes.sort_by(|a, b| {
        b.coupon_rate_pct
            .cmp(&a.coupon_rate_pct)
            .then_with(|| b.distance_to_knock_in_pct.cmp(&a.distance_to_knock_in_pct))
            .then_with(|| a.enumeration_index.cmp(&b.enumeration_index))
    });
}

/// Scores and ranks already-priced baskets. Pure; the batch entry point
/// delegates here once every oracle call has returned.
pub fn score_and_rank(
    params: &FcnParameters,
    priced: Vec<(Combination, OracleQuote)>,
    market: &MarketData,
) -> Vec<FcnQuote> {
    let scored: Vec<ScoredBasket> = priced
        .into_iter()
        .map(|(combination, quote)| score_basket(params, combination, quote, market))
        .collect();
    let mut quotes = finalise(scored);
    rank_quotes(&mut quotes);
    quotes
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Prices a single note through the oracle. Oracle failures are returned
/// unchanged as `FcnError::Oracle`.
pub async fn quote_note<O: PricingOracle + ?Sized>(
    params: &FcnParameters,
    market: &MarketData,
    oracle: &O,
    limits: &QuoteLimits,
) -> FcnResult<ComputationOutput<FcnQuote>> {
    let start = Instant::now();
    params.validate(AssetScope::SingleNote, limits)?;

    let combination = Combination {
        index: 0,
        basket_size: params.asset_count(),
        assets: params.underlying_assets.clone(),
    };
    let request =
        OracleRequest::for_assets(params, combination.assets.clone(), market.pricing_date);
    let quote = oracle.quote(&request).await?;

    let scored = score_basket(params, combination, quote, market);
    let Some(output) = finalise(vec![scored]).pop() else {
        return Err(FcnError::InvalidRequest("no quote produced".into()));
    };

    let mut warnings = Vec::new();
    if params.no_knock_out() {
        warnings.push("Non-call period covers the full tenor; no early redemption".into());
    }

    let assumptions = serde_json::json!({
        "pricing_date": market.pricing_date.to_string(),
        "barrier_type": params.barrier_type.code(),
        "distance_reference": "worst-of current price vs knock-in barrier",
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Oracle coupon with worst-of market annotations",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Enumerates every requested basket from the pool, prices them through
/// `oracle` with at most `config.batch.concurrency_limit` calls in flight,
/// and returns the ranked quotes.
///
/// Results are reassembled in enumeration order before ranking, so network
/// timing never affects the output. Baskets whose oracle call fails are
/// left out and listed in `failures`. Dropping the returned future
/// abandons any calls still in flight.
pub async fn generate_quotes<O: PricingOracle + ?Sized>(
    request: &BatchQuoteRequest,
    market: &MarketData,
    oracle: &O,
    config: &EngineConfig,
) -> FcnResult<ComputationOutput<BatchQuoteResult>> {
    let start = Instant::now();
    config.validate()?;
    let params = &request.parameters;
    params.validate(AssetScope::Pool, &config.limits)?;

    let enumeration = enumerate(
        &params.underlying_assets,
        &request.basket_sizes,
        &config.limits,
    )?;
    let requested = enumeration.combinations.len();
    debug!(
        combinations = requested,
        concurrency = config.batch.concurrency_limit,
        "dispatching oracle calls"
    );

    let outcomes: Vec<(Combination, Result<OracleQuote, OracleError>)> =
        stream::iter(enumeration.combinations)
            .map(|combination| async move {
                let oracle_request = OracleRequest::for_assets(
                    params,
                    combination.assets.clone(),
                    market.pricing_date,
                );
                let outcome = oracle.quote(&oracle_request).await;
                (combination, outcome)
            })
            .buffered(config.batch.concurrency_limit)
            .collect()
            .await;

    let mut priced = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (combination, outcome) in outcomes {
        match outcome {
            Ok(quote) => priced.push((combination, quote)),
            Err(error) => {
                warn!(assets = ?combination.assets, %error, "oracle call failed; basket excluded");
                failures.push(CombinationFailure {
                    assets: combination.assets,
                    error,
                });
            }
        }
    }

    let quotes = score_and_rank(params, priced, market);

    let mut warnings: Vec<String> = enumeration
        .skipped_sizes
        .iter()
        .map(|k| {
            format!(
                "Basket size {k} exceeds pool size {}; no combinations generated",
                params.asset_count()
            )
        })
        .collect();
    for failure in &failures {
        warnings.push(format!(
            "{} not priced: {}",
            failure.assets.join("/"),
            failure.error
        ));
    }
    if !failures.is_empty() {
        warnings.push(format!(
            "{} of {requested} combinations priced",
            quotes.len()
        ));
    }

    let assumptions = serde_json::json!({
        "pool_size": params.asset_count(),
        "basket_sizes": request.basket_sizes,
        "combinations_requested": requested,
        "concurrency_limit": config.batch.concurrency_limit,
        "ranking": "coupon desc, distance to knock-in desc, enumeration order",
        "yield_boost_baseline": "single-asset quote with the lowest 3M put implied vol",
    });

    let result = BatchQuoteResult {
        total_count: quotes.len(),
        failed_count: failures.len(),
        quotes,
        failures,
        pricing_date: market.pricing_date,
        parameters: EchoedParameters {
            parameters: params.clone(),
            basket_sizes: request.basket_sizes.clone(),
            no_knock_out: params.no_knock_out(),
        },
        market_parameters: market.market_parameters.clone(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Worst-of basket enumeration priced by external oracle, ranked by coupon",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fcn::params::BarrierType;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn params(pool: &[&str]) -> FcnParameters {
        FcnParameters {
            underlying_assets: pool.iter().map(|s| s.to_string()).collect(),
            strike_price: dec!(85),
            knock_out_barrier: dec!(105),
            knock_in_barrier: dec!(70),
            barrier_type: BarrierType::EuropeanKi,
            issue_price: dec!(99),
            tenor_months: 6,
            protection_period_months: 1,
        }
    }

    fn combo(index: usize, assets: &[&str]) -> Combination {
        Combination {
            index,
            basket_size: assets.len(),
            assets: assets.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn priced(coupon: Decimal) -> OracleQuote {
        OracleQuote {
            coupon_rate_pct: coupon,
            market_snapshot: BTreeMap::new(),
        }
    }

    fn snapshot(iv: Option<Decimal>) -> AssetSnapshot {
        AssetSnapshot {
            price: Some(dec!(100)),
            put_implied_vol_3m: iv,
            historical_vol_90d: None,
            reference_price: None,
        }
    }

    fn market(entries: &[(&str, Option<Decimal>)]) -> MarketData {
        let mut m = MarketData::empty(NaiveDate::from_ymd_opt(2025, 7, 10).unwrap());
        for (asset, iv) in entries {
            m.assets.insert(asset.to_string(), snapshot(*iv));
        }
        m
    }

    #[test]
    fn test_rank_by_coupon_then_distance_then_index() {
        let p = params(&["A", "B", "C"]);
        let mut m = market(&[("A", None), ("B", None), ("C", None)]);
        // C trades below its fixing, so its baskets sit closer to knock-in.
        m.assets.get_mut("C").unwrap().reference_price = Some(dec!(110));
        let quotes = score_and_rank(
            &p,
            vec![
                (combo(0, &["A"]), priced(dec!(10))),
                (combo(1, &["B"]), priced(dec!(12))),
                (combo(2, &["C"]), priced(dec!(12))),
                (combo(3, &["A", "B"]), priced(dec!(10))),
            ],
            &m,
        );
        let ids: Vec<&str> = quotes.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["quote-1", "quote-2", "quote-0", "quote-3"]);
    }

    #[test]
    fn test_distance_uses_worst_asset() {
        let p = params(&["A", "B"]);
        let mut m = market(&[("A", Some(dec!(30))), ("B", Some(dec!(45)))]);
        m.assets.get_mut("B").unwrap().reference_price = Some(dec!(125));
        let quotes = score_and_rank(&p, vec![(combo(0, &["A", "B"]), priced(dec!(14)))], &m);
        // B at 80% of fixing: 80 - 70
        assert_eq!(quotes[0].distance_to_knock_in_pct, dec!(10));
        assert_eq!(quotes[0].max_implied_vol_pct, Some(dec!(45)));
    }

    #[test]
    fn test_max_implied_vol_null_when_any_missing() {
        let p = params(&["A", "B"]);
        let m = market(&[("A", Some(dec!(30)))]);
        let quotes = score_and_rank(&p, vec![(combo(0, &["A", "B"]), priced(dec!(14)))], &m);
        assert_eq!(quotes[0].max_implied_vol_pct, None);
        assert_eq!(quotes[0].market_snapshot["B"], AssetSnapshot::default());
    }

    #[test]
    fn test_yield_boost_against_lowest_vol_single() {
        let p = params(&["A", "B"]);
        let m = market(&[("A", Some(dec!(40))), ("B", Some(dec!(25)))]);
        let quotes = score_and_rank(
            &p,
            vec![
                (combo(0, &["A"]), priced(dec!(11))),
                (combo(1, &["B"]), priced(dec!(9.5))),
                (combo(2, &["A", "B"]), priced(dec!(14.25))),
            ],
            &m,
        );
        let boost: Vec<(String, Option<Decimal>)> = quotes
            .iter()
            .map(|q| (q.id.clone(), q.yield_boost_pct))
            .collect();
        assert_eq!(
            boost,
            vec![
                ("quote-2".to_string(), Some(dec!(4.75))),
                ("quote-0".to_string(), Some(dec!(1.5))),
                ("quote-1".to_string(), Some(dec!(0))),
            ]
        );
    }

    #[test]
    fn test_yield_boost_null_without_single_asset_quotes() {
        let p = params(&["A", "B", "C"]);
        let m = market(&[("A", Some(dec!(40))), ("B", Some(dec!(25))), ("C", Some(dec!(30)))]);
        let quotes = score_and_rank(
            &p,
            vec![
                (combo(0, &["A", "B"]), priced(dec!(12))),
                (combo(1, &["A", "C"]), priced(dec!(13))),
            ],
            &m,
        );
        assert!(quotes.iter().all(|q| q.yield_boost_pct.is_none()));
    }

    #[test]
    fn test_oracle_snapshot_overrides_pool_data() {
        let p = params(&["A"]);
        let m = market(&[("A", Some(dec!(40)))]);
        let mut quote = priced(dec!(9));
        quote.market_snapshot.insert(
            "A".into(),
            AssetSnapshot {
                put_implied_vol_3m: Some(dec!(44.44)),
                ..Default::default()
            },
        );
        let quotes = score_and_rank(&p, vec![(combo(0, &["A"]), quote)], &m);
        assert_eq!(quotes[0].max_implied_vol_pct, Some(dec!(44.4)));
        assert_eq!(quotes[0].market_snapshot["A"].price, Some(dec!(100)));
    }

    #[test]
    fn test_coupon_rounded_to_cents() {
        let p = params(&["A"]);
        let quotes = score_and_rank(
            &p,
            vec![(combo(0, &["A"]), priced(dec!(12.34567)))],
            &market(&[]),
        );
        assert_eq!(quotes[0].coupon_rate_pct, dec!(12.35));
    }

    #[test]
    fn test_risk_at_par_matches_parameter_tiers() {
        let p = params(&["A"]);
        let quotes = score_and_rank(&p, vec![(combo(0, &["A"]), priced(dec!(9)))], &market(&[]));
        assert_eq!(quotes[0].risk_level, classify_risk(dec!(85), dec!(70)));
        assert_eq!(quotes[0].distance_to_knock_in_pct, dec!(30));
    }

    #[test]
    fn test_risk_shifts_with_worst_performer() {
        let mut p = params(&["A"]);
        p.strike_price = dec!(88);
        p.knock_in_barrier = dec!(78);
        let mut m = market(&[("A", None)]);
        // A at 97.5% of fixing shifts both levels up by 2.5 points
        let a = m.assets.get_mut("A").unwrap();
        a.price = Some(dec!(97.5));
        a.reference_price = Some(dec!(100));
        let at_par = score_and_rank(&p, vec![(combo(0, &["A"]), priced(dec!(9)))], &market(&[]));
        assert_eq!(at_par[0].risk_level, RiskLevel::Medium);
        let shifted = score_and_rank(&p, vec![(combo(0, &["A"]), priced(dec!(9)))], &m);
        assert_eq!(shifted[0].risk_level, RiskLevel::Low);
    }
}
