use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Percent;

/// Three-tier risk label shown next to every quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Static thresholds, checked in order: low, then high, else medium.
pub fn classify_risk(strike_price: Percent, knock_in_barrier: Percent) -> RiskLevel {
    if strike_price >= dec!(90) && knock_in_barrier >= dec!(80) {
        RiskLevel::Low
    } else if strike_price <= dec!(70) || knock_in_barrier <= dec!(60) {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_requires_both_conditions() {
        assert_eq!(classify_risk(dec!(90), dec!(80)), RiskLevel::Low);
        assert_eq!(classify_risk(dec!(95), dec!(79)), RiskLevel::Medium);
        assert_eq!(classify_risk(dec!(89), dec!(85)), RiskLevel::Medium);
    }

    #[test]
    fn test_high_on_either_condition() {
        assert_eq!(classify_risk(dec!(70), dec!(65)), RiskLevel::High);
        assert_eq!(classify_risk(dec!(85), dec!(60)), RiskLevel::High);
    }

    #[test]
    fn test_low_takes_priority() {
        // Low is evaluated first, so nothing that satisfies it can be High.
        assert_eq!(classify_risk(dec!(100), dec!(95)), RiskLevel::Low);
    }

    #[test]
    fn test_serialises_lowercase() {
        assert_eq!(
            serde_json::to_string(&RiskLevel::Medium).unwrap(),
            "\"medium\""
        );
    }
}
