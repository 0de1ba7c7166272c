//! Local coupon heuristic used for instant previews.
//!
//! Linear adjustments around an 8% base coupon, scaled by a volatility
//! factor drawn from [0.95, 1.05] and clamped to [4%, 25%]. The factor
//! source is injected so callers can pin it for reproducible output.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::QuoteLimits;
use crate::error::FcnError;
use crate::fcn::params::{AssetScope, BarrierType, FcnParameters};
use crate::fcn::risk::{classify_risk, RiskLevel};
use crate::types::{with_metadata, ComputationOutput, Percent};
use crate::FcnResult;

const BASE_COUPON: Decimal = dec!(8.0);
const MIN_COUPON: Decimal = dec!(4);
const MAX_COUPON: Decimal = dec!(25);
const MIN_VOLATILITY_FACTOR: Decimal = dec!(0.95);
const MAX_VOLATILITY_FACTOR: Decimal = dec!(1.05);

// ---------------------------------------------------------------------------
// Volatility factor sources
// ---------------------------------------------------------------------------

/// Source of the multiplicative noise term applied to the raw coupon.
pub trait VolatilityNoise {
    fn volatility_factor(&mut self) -> Decimal;
}

/// Always returns the same factor. `FixedFactor(Decimal::ONE)` turns the
/// heuristic into a deterministic function.
#[derive(Debug, Clone, Copy)]
pub struct FixedFactor(pub Decimal);

impl VolatilityNoise for FixedFactor {
    fn volatility_factor(&mut self) -> Decimal {
        self.0
    }
}

/// Uniform draw from [0.95, 1.05] at basis-point resolution.
#[derive(Debug, Clone)]
pub struct UniformNoise<R: Rng> {
    rng: R,
}

impl<R: Rng> UniformNoise<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl UniformNoise<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> VolatilityNoise for UniformNoise<R> {
    fn volatility_factor(&mut self) -> Decimal {
        let bps: i64 = self.rng.gen_range(9_500..=10_500);
        Decimal::new(bps, 4)
    }
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Indicative quote for a single note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteResult {
    pub annualized_coupon_pct: Percent,
    pub risk_level: RiskLevel,
    pub worst_case_return_pct: Percent,
    pub best_case_return_pct: Percent,
}

/// Individual coupon adjustments before the volatility factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponBreakdown {
    pub base: Percent,
    pub strike_adjustment: Percent,
    pub knock_in_adjustment: Percent,
    pub knock_out_adjustment: Percent,
    pub tenor_adjustment: Percent,
    pub asset_count_adjustment: Percent,
    pub barrier_type_adjustment: Percent,
}

impl CouponBreakdown {
    pub fn total(&self) -> Percent {
        self.base
            + self.strike_adjustment
            + self.knock_in_adjustment
            + self.knock_out_adjustment
            + self.tenor_adjustment
            + self.asset_count_adjustment
            + self.barrier_type_adjustment
    }
}

/// Request for a validated preview quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewInput {
    #[serde(flatten)]
    pub parameters: FcnParameters,
    /// Seed for the volatility factor draw.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Pins the volatility factor; takes precedence over `seed`.
    #[serde(default)]
    pub volatility_factor: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewOutput {
    pub quote: QuoteResult,
    pub breakdown: CouponBreakdown,
    pub volatility_factor: Decimal,
    pub raw_coupon_pct: Percent,
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

pub fn coupon_breakdown(params: &FcnParameters) -> CouponBreakdown {
    let hundred = dec!(100);
    let asset_count = Decimal::from(params.asset_count().max(1) as u64);
    CouponBreakdown {
        base: BASE_COUPON,
        strike_adjustment: (hundred - params.strike_price) * dec!(0.15),
        knock_in_adjustment: (hundred - params.knock_in_barrier) * dec!(0.12),
        knock_out_adjustment: (params.knock_out_barrier - hundred) * dec!(0.1),
        tenor_adjustment: (Decimal::from(params.tenor_months) - dec!(6)) * dec!(0.3),
        asset_count_adjustment: (asset_count - Decimal::ONE) * dec!(1.5),
        barrier_type_adjustment: match params.barrier_type {
            BarrierType::AmericanKi => dec!(1.2),
            BarrierType::EuropeanKi => Decimal::ZERO,
        },
    }
}

fn quote_from_coupon(params: &FcnParameters, raw_coupon: Decimal) -> QuoteResult {
    let coupon = raw_coupon.clamp(MIN_COUPON, MAX_COUPON);
    let best_case = coupon * Decimal::from(params.tenor_months) / dec!(12);
    QuoteResult {
        annualized_coupon_pct: coupon,
        risk_level: classify_risk(params.strike_price, params.knock_in_barrier),
        worst_case_return_pct: -(dec!(100) - best_case),
        best_case_return_pct: best_case,
    }
}

/// Prices already-validated parameters. Draws exactly one volatility factor
/// from `noise`.
pub fn price(params: &FcnParameters, noise: &mut impl VolatilityNoise) -> QuoteResult {
    let raw_coupon = coupon_breakdown(params).total() * noise.volatility_factor();
    quote_from_coupon(params, raw_coupon)
}

/// Validates the parameters and prices them, reporting the coupon
/// breakdown alongside the quote.
pub fn preview_quote(
    input: &PreviewInput,
    limits: &QuoteLimits,
) -> FcnResult<ComputationOutput<PreviewOutput>> {
    let start = Instant::now();
    input.parameters.validate(AssetScope::SingleNote, limits)?;

    let factor = match (input.volatility_factor, input.seed) {
        (Some(f), _) => {
            if f < MIN_VOLATILITY_FACTOR || f > MAX_VOLATILITY_FACTOR {
                return Err(FcnError::InvalidInput {
                    field: "volatility_factor".into(),
                    reason: format!(
                        "must be between {MIN_VOLATILITY_FACTOR} and {MAX_VOLATILITY_FACTOR}"
                    ),
                });
            }
            f
        }
        (None, Some(seed)) => UniformNoise::seeded(seed).volatility_factor(),
        (None, None) => UniformNoise::from_entropy().volatility_factor(),
    };

    let breakdown = coupon_breakdown(&input.parameters);
    let raw_coupon = breakdown.total() * factor;
    let quote = quote_from_coupon(&input.parameters, raw_coupon);

    let mut warnings = Vec::new();
    if raw_coupon != quote.annualized_coupon_pct {
        warnings.push(format!(
            "Raw coupon {raw_coupon} clamped to {}",
            quote.annualized_coupon_pct
        ));
    }

    let assumptions = serde_json::json!({
        "underlying_assets": input.parameters.underlying_assets,
        "barrier_type": input.parameters.barrier_type.code(),
        "tenor_months": input.parameters.tenor_months,
        "volatility_factor_source": match (input.volatility_factor, input.seed) {
            (Some(_), _) => "fixed",
            (None, Some(_)) => "seeded",
            (None, None) => "entropy",
        },
        "coupon_bounds_pct": [MIN_COUPON.to_string(), MAX_COUPON.to_string()],
    });

    let output = PreviewOutput {
        quote,
        breakdown,
        volatility_factor: factor,
        raw_coupon_pct: raw_coupon,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Linear coupon heuristic with bounded volatility factor (indicative only)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fcn::params::BarrierType;

    fn example_params() -> FcnParameters {
        FcnParameters {
            underlying_assets: vec!["A".into(), "B".into()],
            strike_price: dec!(85),
            knock_out_barrier: dec!(105),
            knock_in_barrier: dec!(70),
            barrier_type: BarrierType::EuropeanKi,
            issue_price: dec!(99),
            tenor_months: 6,
            protection_period_months: 1,
        }
    }

    #[test]
    fn test_worked_example_with_unit_factor() {
        let quote = price(&example_params(), &mut FixedFactor(Decimal::ONE));
        assert_eq!(quote.annualized_coupon_pct, dec!(15.85));
        assert_eq!(quote.risk_level, RiskLevel::Medium);
        assert_eq!(quote.best_case_return_pct, dec!(7.925));
        assert_eq!(quote.worst_case_return_pct, dec!(-92.075));
    }

    #[test]
    fn test_breakdown_terms() {
        let b = coupon_breakdown(&example_params());
        assert_eq!(b.base, dec!(8));
        assert_eq!(b.strike_adjustment, dec!(2.25));
        assert_eq!(b.knock_in_adjustment, dec!(3.6));
        assert_eq!(b.knock_out_adjustment, dec!(0.5));
        assert_eq!(b.tenor_adjustment, dec!(0));
        assert_eq!(b.asset_count_adjustment, dec!(1.5));
        assert_eq!(b.barrier_type_adjustment, dec!(0));
        assert_eq!(b.total(), dec!(15.85));
    }

    #[test]
    fn test_american_barrier_adds_premium() {
        let mut p = example_params();
        p.barrier_type = BarrierType::AmericanKi;
        let quote = price(&p, &mut FixedFactor(Decimal::ONE));
        assert_eq!(quote.annualized_coupon_pct, dec!(17.05));
    }

    #[test]
    fn test_coupon_clamped_high() {
        let p = FcnParameters {
            underlying_assets: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            strike_price: dec!(50),
            knock_out_barrier: dec!(150),
            knock_in_barrier: dec!(50),
            barrier_type: BarrierType::AmericanKi,
            issue_price: dec!(95),
            tenor_months: 12,
            protection_period_months: 1,
        };
        let quote = price(&p, &mut FixedFactor(dec!(1.05)));
        assert_eq!(quote.annualized_coupon_pct, dec!(25));
        assert_eq!(quote.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_coupon_clamped_low() {
        let p = FcnParameters {
            underlying_assets: vec!["A".into()],
            strike_price: dec!(100),
            knock_out_barrier: dec!(101),
            knock_in_barrier: dec!(95),
            barrier_type: BarrierType::EuropeanKi,
            issue_price: dec!(100),
            tenor_months: 2,
            protection_period_months: 1,
        };
        // 8 + 0 + 0.6 + 0.1 - 1.2 = 7.5: valid parameters never reach the
        // floor, so the clamp itself is exercised directly below.
        let quote = price(&p, &mut FixedFactor(dec!(0.95)));
        assert_eq!(quote.annualized_coupon_pct, dec!(7.125));
        assert_eq!(quote.risk_level, RiskLevel::Low);

        let floor = quote_from_coupon(&p, dec!(1.5));
        assert_eq!(floor.annualized_coupon_pct, dec!(4));
    }

    #[test]
    fn test_seeded_noise_is_reproducible_and_bounded() {
        let mut a = UniformNoise::seeded(42);
        let mut b = UniformNoise::seeded(42);
        for _ in 0..200 {
            let fa = a.volatility_factor();
            assert_eq!(fa, b.volatility_factor());
            assert!(fa >= dec!(0.95) && fa <= dec!(1.05), "factor {fa} out of bounds");
        }
    }

    #[test]
    fn test_preview_quote_with_fixed_factor() {
        let input = PreviewInput {
            parameters: example_params(),
            seed: Some(7),
            volatility_factor: Some(Decimal::ONE),
        };
        let out = preview_quote(&input, &QuoteLimits::default()).unwrap();
        assert_eq!(out.result.quote.annualized_coupon_pct, dec!(15.85));
        assert_eq!(out.result.volatility_factor, Decimal::ONE);
        assert!(out.warnings.is_empty());
        assert_eq!(out.assumptions["volatility_factor_source"], "fixed");
    }

    #[test]
    fn test_preview_quote_rejects_invalid_parameters() {
        let mut params = example_params();
        params.knock_in_barrier = dec!(90);
        let input = PreviewInput {
            parameters: params,
            seed: None,
            volatility_factor: Some(Decimal::ONE),
        };
        let err = preview_quote(&input, &QuoteLimits::default()).unwrap_err();
        assert!(matches!(err, FcnError::InvalidInput { .. }));
    }

    #[test]
    fn test_preview_quote_rejects_factor_out_of_band() {
        let input = PreviewInput {
            parameters: example_params(),
            seed: None,
            volatility_factor: Some(dec!(1.2)),
        };
        match preview_quote(&input, &QuoteLimits::default()) {
            Err(FcnError::InvalidInput { field, .. }) => assert_eq!(field, "volatility_factor"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_preview_clamp_emits_warning() {
        let input = PreviewInput {
            parameters: FcnParameters {
                underlying_assets: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                strike_price: dec!(55),
                knock_out_barrier: dec!(150),
                knock_in_barrier: dec!(50),
                barrier_type: BarrierType::AmericanKi,
                issue_price: dec!(99),
                tenor_months: 12,
                protection_period_months: 3,
            },
            seed: None,
            volatility_factor: Some(Decimal::ONE),
        };
        let out = preview_quote(&input, &QuoteLimits::default()).unwrap();
        assert_eq!(out.result.quote.annualized_coupon_pct, dec!(25));
        assert_eq!(out.warnings.len(), 1);
    }
}
