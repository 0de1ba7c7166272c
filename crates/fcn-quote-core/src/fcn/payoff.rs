use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::QuoteLimits;
use crate::error::FcnError;
use crate::fcn::params::{AssetScope, FcnParameters};
use crate::types::{with_metadata, ComputationOutput, Percent};
use crate::FcnResult;

/// Performance grid: 0%, 2%, ..., 130%.
const SAMPLE_STEP: u32 = 2;
const SAMPLE_MAX: u32 = 130;

/// Partial-protection slope between knock-in and strike.
const PROTECTION_SLOPE: Decimal = dec!(0.5);

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffPoint {
    pub underlying_performance_pct: Percent,
    pub redemption_pct: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffInput {
    #[serde(flatten)]
    pub parameters: FcnParameters,
    /// Coupon earned over the life of the note, in percent of notional.
    pub coupon_return_pct: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffOutput {
    pub points: Vec<PayoffPoint>,
    pub strike_price: Percent,
    pub knock_in_barrier: Percent,
    pub knock_out_barrier: Percent,
    pub min_redemption_pct: Percent,
    pub max_redemption_pct: Percent,
}

// ---------------------------------------------------------------------------
// Curve
// ---------------------------------------------------------------------------

/// Redemption at maturity, in percent of notional, for a worst-of
/// performance `performance_pct`.
pub fn redemption_at(
    params: &FcnParameters,
    performance_pct: Percent,
    coupon_return_pct: Percent,
) -> Percent {
    let hundred = dec!(100);
    let redemption = if performance_pct >= params.knock_out_barrier
        || performance_pct >= params.strike_price
    {
        hundred + coupon_return_pct
    } else if performance_pct >= params.knock_in_barrier {
        hundred - (params.strike_price - performance_pct) * PROTECTION_SLOPE + coupon_return_pct
    } else {
        performance_pct * hundred / params.strike_price + coupon_return_pct
    };
    redemption.max(Decimal::ZERO)
}

/// Lazily samples the payoff on the fixed performance grid. Each call
/// starts a fresh sequence.
pub fn payoff_points(
    params: &FcnParameters,
    coupon_return_pct: Percent,
) -> impl Iterator<Item = PayoffPoint> + '_ {
    (0..=SAMPLE_MAX)
        .step_by(SAMPLE_STEP as usize)
        .map(move |p| {
            let performance = Decimal::from(p);
            PayoffPoint {
                underlying_performance_pct: performance,
                redemption_pct: redemption_at(params, performance, coupon_return_pct),
            }
        })
}

/// The full 66-point payoff curve.
pub fn payoff_curve(params: &FcnParameters, coupon_return_pct: Percent) -> Vec<PayoffPoint> {
    payoff_points(params, coupon_return_pct).collect()
}

/// Validates the parameters and builds the payoff curve with its summary.
pub fn payoff_profile(
    input: &PayoffInput,
    limits: &QuoteLimits,
) -> FcnResult<ComputationOutput<PayoffOutput>> {
    let start = Instant::now();
    let params = &input.parameters;
    params.validate(AssetScope::SingleNote, limits)?;

    if input.coupon_return_pct < Decimal::ZERO {
        return Err(FcnError::InvalidInput {
            field: "coupon_return_pct".into(),
            reason: "must be non-negative".into(),
        });
    }

    let points = payoff_curve(params, input.coupon_return_pct);
    let min_redemption = points
        .iter()
        .map(|p| p.redemption_pct)
        .min()
        .unwrap_or(Decimal::ZERO);
    let max_redemption = points
        .iter()
        .map(|p| p.redemption_pct)
        .max()
        .unwrap_or(Decimal::ZERO);

    let mut warnings = Vec::new();
    if params.no_knock_out() {
        warnings.push(
            "Non-call period covers the full tenor; the note cannot knock out early".into(),
        );
    }

    let assumptions = serde_json::json!({
        "sample_step_pct": SAMPLE_STEP,
        "sample_max_pct": SAMPLE_MAX,
        "protection_slope": PROTECTION_SLOPE.to_string(),
        "coupon_return_pct": input.coupon_return_pct.to_string(),
        "settlement_below_knock_in": "physical delivery at performance / strike",
    });

    let output = PayoffOutput {
        points,
        strike_price: params.strike_price,
        knock_in_barrier: params.knock_in_barrier,
        knock_out_barrier: params.knock_out_barrier,
        min_redemption_pct: min_redemption,
        max_redemption_pct: max_redemption,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Piecewise worst-of redemption at maturity",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
