use serde::{Deserialize, Serialize};

use crate::error::FcnError;
use crate::FcnResult;

/// Upper bounds applied when validating requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteLimits {
    /// Maximum underlyings on a single note.
    pub max_single_assets: usize,
    /// Maximum assets in a candidate pool for batch generation.
    pub max_pool_assets: usize,
    /// Largest basket size a batch may request.
    pub max_basket_size: usize,
}

impl Default for QuoteLimits {
    fn default() -> Self {
        Self {
            max_single_assets: 4,
            max_pool_assets: 20,
            max_basket_size: 4,
        }
    }
}

/// Settings for batch quote generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Maximum number of oracle calls in flight at once.
    pub concurrency_limit: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            concurrency_limit: 8,
        }
    }
}

/// Engine configuration. Every section falls back to its defaults when
/// omitted from a config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub limits: QuoteLimits,
    pub batch: BatchSettings,
}

impl EngineConfig {
    pub fn validate(&self) -> FcnResult<()> {
        if self.limits.max_single_assets == 0 {
            return Err(FcnError::InvalidInput {
                field: "limits.max_single_assets".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.limits.max_pool_assets < self.limits.max_single_assets {
            return Err(FcnError::InvalidInput {
                field: "limits.max_pool_assets".into(),
                reason: "must be at least max_single_assets".into(),
            });
        }
        if self.limits.max_basket_size == 0 || self.limits.max_basket_size > 4 {
            return Err(FcnError::InvalidInput {
                field: "limits.max_basket_size".into(),
                reason: "must be between 1 and 4".into(),
            });
        }
        if self.batch.concurrency_limit == 0 {
            return Err(FcnError::InvalidInput {
                field: "batch.concurrency_limit".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
