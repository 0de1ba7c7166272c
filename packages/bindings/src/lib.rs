use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use fcn_quote_core::fcn::combinations::{self, CombinationInput};
use fcn_quote_core::fcn::heuristic::{self, PreviewInput};
use fcn_quote_core::fcn::market::MarketData;
use fcn_quote_core::fcn::oracle::HeuristicOracle;
use fcn_quote_core::fcn::payoff::{self, PayoffInput};
use fcn_quote_core::fcn::ranking::{self, BatchQuoteRequest};
use fcn_quote_core::EngineConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn engine_config(config_json: Option<String>) -> NapiResult<EngineConfig> {
    let config = match config_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error)?,
        None => EngineConfig::default(),
    };
    config.validate().map_err(to_napi_error)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Single note
// ---------------------------------------------------------------------------

#[napi]
pub fn preview_quote(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let config = engine_config(config_json)?;
    let input: PreviewInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = heuristic::preview_quote(&input, &config.limits).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn payoff_curve(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let config = engine_config(config_json)?;
    let input: PayoffInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = payoff::payoff_profile(&input, &config.limits).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Baskets
// ---------------------------------------------------------------------------

#[napi]
pub fn enumerate_combinations(
    input_json: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let config = engine_config(config_json)?;
    let input: CombinationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        combinations::generate_combinations(&input, &config.limits).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Batch request plus the market data to annotate quotes with.
#[derive(Deserialize)]
struct HeuristicBatchInput {
    #[serde(flatten)]
    request: BatchQuoteRequest,
    market: MarketData,
    #[serde(default)]
    seed: Option<u64>,
}

/// Ranked batch quotes priced by the local heuristic. Without a seed the
/// volatility factor is pinned to 1.0.
#[napi]
pub fn heuristic_batch_quotes(
    input_json: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let config = engine_config(config_json)?;
    let input: HeuristicBatchInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = match input.seed {
        Some(seed) => futures::executor::block_on(ranking::generate_quotes(
            &input.request,
            &input.market,
            &HeuristicOracle::seeded(seed),
            &config,
        )),
        None => futures::executor::block_on(ranking::generate_quotes(
            &input.request,
            &input.market,
            &HeuristicOracle::deterministic(),
            &config,
        )),
    }
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
