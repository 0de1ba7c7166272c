use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::QuoteLimits;
use crate::error::FcnError;
use crate::types::{Percent, Symbol};
use crate::FcnResult;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Knock-in observation style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarrierType {
    /// Knock-in observed at maturity only.
    #[serde(rename = "EuropeanKI", alias = "EKI")]
    EuropeanKi,
    /// Knock-in observed continuously over the life of the note.
    #[serde(rename = "AmericanKI", alias = "AKI")]
    AmericanKi,
}

impl BarrierType {
    /// Short desk code used by the pricing backend.
    pub fn code(&self) -> &'static str {
        match self {
            BarrierType::EuropeanKi => "EKI",
            BarrierType::AmericanKi => "AKI",
        }
    }
}

impl std::fmt::Display for BarrierType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BarrierType::EuropeanKi => write!(f, "European knock-in"),
            BarrierType::AmericanKi => write!(f, "American knock-in"),
        }
    }
}

/// Which asset-count ceiling applies to `underlying_assets`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetScope {
    /// A single note on a worst-of basket.
    SingleNote,
    /// A candidate pool that combinations are drawn from.
    Pool,
}

impl AssetScope {
    fn max_assets(&self, limits: &QuoteLimits) -> usize {
        match self {
            AssetScope::SingleNote => limits.max_single_assets,
            AssetScope::Pool => limits.max_pool_assets,
        }
    }
}

/// Structuring parameters of a Fixed Coupon Note. All levels are percent of
/// the initial fixing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcnParameters {
    pub underlying_assets: Vec<Symbol>,
    pub strike_price: Percent,
    pub knock_out_barrier: Percent,
    pub knock_in_barrier: Percent,
    pub barrier_type: BarrierType,
    #[serde(default = "default_issue_price")]
    pub issue_price: Percent,
    pub tenor_months: u32,
    #[serde(default = "default_protection_period")]
    pub protection_period_months: u32,
}

fn default_issue_price() -> Percent {
    dec!(99)
}

fn default_protection_period() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn check_range(field: &str, value: Decimal, min: Decimal, max: Decimal) -> FcnResult<()> {
    if value < min || value > max {
        return Err(FcnError::InvalidInput {
            field: field.into(),
            reason: format!("must be between {min} and {max}, got {value}"),
        });
    }
    Ok(())
}

impl FcnParameters {
    /// Checks every range and the barrier ordering. Never modifies the
    /// parameters; callers re-run this after any edit.
    pub fn validate(&self, scope: AssetScope, limits: &QuoteLimits) -> FcnResult<()> {
        validate_assets(&self.underlying_assets, scope.max_assets(limits))?;

        check_range("strike_price", self.strike_price, dec!(50), dec!(100))?;
        check_range("knock_out_barrier", self.knock_out_barrier, dec!(90), dec!(150))?;
        check_range("knock_in_barrier", self.knock_in_barrier, dec!(50), dec!(95))?;
        check_range("issue_price", self.issue_price, dec!(95), dec!(100))?;

        if !(2..=12).contains(&self.tenor_months) {
            return Err(FcnError::InvalidInput {
                field: "tenor_months".into(),
                reason: format!("must be between 2 and 12, got {}", self.tenor_months),
            });
        }
        if self.protection_period_months < 1 || self.protection_period_months > self.tenor_months
        {
            return Err(FcnError::InvalidInput {
                field: "protection_period_months".into(),
                reason: format!(
                    "must be between 1 and tenor_months ({}), got {}",
                    self.tenor_months, self.protection_period_months
                ),
            });
        }

        if self.knock_in_barrier >= self.strike_price {
            return Err(FcnError::InvalidInput {
                field: "knock_in_barrier".into(),
                reason: format!(
                    "must be below strike_price ({}), got {}",
                    self.strike_price, self.knock_in_barrier
                ),
            });
        }
        if self.knock_out_barrier <= self.strike_price {
            return Err(FcnError::InvalidInput {
                field: "knock_out_barrier".into(),
                reason: format!(
                    "must be above strike_price ({}), got {}",
                    self.strike_price, self.knock_out_barrier
                ),
            });
        }
        Ok(())
    }

    pub fn asset_count(&self) -> usize {
        self.underlying_assets.len()
    }

    /// True when the non-call period covers the whole tenor, so the note
    /// can never knock out.
    pub fn no_knock_out(&self) -> bool {
        self.protection_period_months == self.tenor_months
    }

    // -----------------------------------------------------------------------
    // Editing helpers (form-level conveniences, not validation)
    // -----------------------------------------------------------------------

    /// Replaces the strike. When the knock-in no longer sits below the new
    /// strike it is pulled down to five points under it.
    pub fn with_strike_price(&self, strike_price: Percent) -> Self {
        let mut next = self.clone();
        next.strike_price = strike_price;
        if next.knock_in_barrier >= strike_price {
            next.knock_in_barrier = strike_price - dec!(5);
        }
        next
    }

    /// Replaces the tenor, shortening the protection period to fit.
    pub fn with_tenor_months(&self, tenor_months: u32) -> Self {
        let mut next = self.clone();
        next.tenor_months = tenor_months;
        next.protection_period_months = next.protection_period_months.min(tenor_months);
        next
    }
}

/// Validates an asset list: non-empty, at most `max_assets`, no duplicates.
pub fn validate_assets(assets: &[Symbol], max_assets: usize) -> FcnResult<()> {
    if assets.is_empty() {
        return Err(FcnError::InvalidInput {
            field: "underlying_assets".into(),
            reason: "at least one asset is required".into(),
        });
    }
    if assets.len() > max_assets {
        return Err(FcnError::InvalidInput {
            field: "underlying_assets".into(),
            reason: format!("at most {max_assets} assets allowed, got {}", assets.len()),
        });
    }
    let mut seen = HashSet::with_capacity(assets.len());
    for asset in assets {
        if asset.trim().is_empty() {
            return Err(FcnError::InvalidInput {
                field: "underlying_assets".into(),
                reason: "asset symbols must not be blank".into(),
            });
        }
        if !seen.insert(asset.as_str()) {
            return Err(FcnError::InvalidInput {
                field: "underlying_assets".into(),
                reason: format!("duplicate asset '{asset}'"),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn base_params() -> FcnParameters {
        FcnParameters {
            underlying_assets: vec!["NVDA".into(), "TSLA".into()],
            strike_price: dec!(85),
            knock_out_barrier: dec!(105),
            knock_in_barrier: dec!(70),
            barrier_type: BarrierType::EuropeanKi,
            issue_price: dec!(99),
            tenor_months: 6,
            protection_period_months: 1,
        }
    }

    fn rejected_field(result: FcnResult<()>) -> String {
        match result {
            Err(FcnError::InvalidInput { field, .. }) => field,
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_parameters_pass() {
        let limits = QuoteLimits::default();
        assert!(base_params()
            .validate(AssetScope::SingleNote, &limits)
            .is_ok());
    }

    #[test]
    fn test_barrier_ordering_enforced() {
        let limits = QuoteLimits::default();

        let mut p = base_params();
        p.knock_in_barrier = dec!(85);
        assert_eq!(
            rejected_field(p.validate(AssetScope::SingleNote, &limits)),
            "knock_in_barrier"
        );

        let mut p = base_params();
        p.strike_price = dec!(100);
        p.knock_out_barrier = dec!(100);
        assert_eq!(
            rejected_field(p.validate(AssetScope::SingleNote, &limits)),
            "knock_out_barrier"
        );
    }

    #[test]
    fn test_out_of_range_fields_rejected() {
        let limits = QuoteLimits::default();
        let scope = AssetScope::SingleNote;

        let mut p = base_params();
        p.strike_price = dec!(49.5);
        assert_eq!(rejected_field(p.validate(scope, &limits)), "strike_price");

        let mut p = base_params();
        p.knock_out_barrier = dec!(151);
        assert_eq!(rejected_field(p.validate(scope, &limits)), "knock_out_barrier");

        let mut p = base_params();
        p.issue_price = dec!(94.99);
        assert_eq!(rejected_field(p.validate(scope, &limits)), "issue_price");

        let mut p = base_params();
        p.tenor_months = 13;
        assert_eq!(rejected_field(p.validate(scope, &limits)), "tenor_months");

        let mut p = base_params();
        p.protection_period_months = 7;
        assert_eq!(
            rejected_field(p.validate(scope, &limits)),
            "protection_period_months"
        );

        let mut p = base_params();
        p.protection_period_months = 0;
        assert_eq!(
            rejected_field(p.validate(scope, &limits)),
            "protection_period_months"
        );
    }

    #[test]
    fn test_asset_limits_depend_on_scope() {
        let limits = QuoteLimits::default();
        let mut p = base_params();
        p.underlying_assets = (0..5).map(|i| format!("A{i}")).collect();

        assert_eq!(
            rejected_field(p.validate(AssetScope::SingleNote, &limits)),
            "underlying_assets"
        );
        assert!(p.validate(AssetScope::Pool, &limits).is_ok());

        p.underlying_assets = (0..21).map(|i| format!("A{i}")).collect();
        assert!(p.validate(AssetScope::Pool, &limits).is_err());
    }

    #[test]
    fn test_empty_and_duplicate_assets_rejected() {
        let limits = QuoteLimits::default();

        let mut p = base_params();
        p.underlying_assets.clear();
        assert!(p.validate(AssetScope::SingleNote, &limits).is_err());

        let mut p = base_params();
        p.underlying_assets = vec!["AAPL".into(), "AAPL".into()];
        assert!(p.validate(AssetScope::SingleNote, &limits).is_err());
    }

    #[test]
    fn test_with_strike_price_pulls_knock_in_down() {
        let p = base_params().with_strike_price(dec!(65));
        assert_eq!(p.strike_price, dec!(65));
        assert_eq!(p.knock_in_barrier, dec!(60));

        let untouched = base_params().with_strike_price(dec!(90));
        assert_eq!(untouched.knock_in_barrier, dec!(70));
    }

    #[test]
    fn test_with_tenor_months_shortens_protection() {
        let mut p = base_params();
        p.protection_period_months = 6;
        let p = p.with_tenor_months(3);
        assert_eq!(p.protection_period_months, 3);
        assert!(p.no_knock_out());
    }

    #[test]
    fn test_editing_helpers_do_not_validate() {
        // Strike below the allowed range still yields an edited copy; the
        // subsequent validate call is what rejects it.
        let p = base_params().with_strike_price(dec!(40));
        assert_eq!(p.knock_in_barrier, dec!(35));
        assert!(p
            .validate(AssetScope::SingleNote, &QuoteLimits::default())
            .is_err());
    }

    #[test]
    fn test_barrier_type_accepts_desk_codes() {
        let json = r#"{
            "underlying_assets": ["AAPL"],
            "strike_price": "90",
            "knock_out_barrier": "110",
            "knock_in_barrier": "70",
            "barrier_type": "AKI",
            "tenor_months": 9
        }"#;
        let p: FcnParameters = serde_json::from_str(json).unwrap();
        assert_eq!(p.barrier_type, BarrierType::AmericanKi);
        assert_eq!(p.issue_price, dec!(99));
        assert_eq!(p.protection_period_months, 1);
        assert_eq!(p.barrier_type.code(), "AKI");
    }
}
