use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use fcn_quote_core::fcn::market::{MarketData, MarketParameters};
use fcn_quote_core::fcn::oracle::{HeuristicOracle, PricingOracle};
use fcn_quote_core::fcn::ranking::{self, BatchQuoteRequest};
use fcn_quote_core::EngineConfig;

use crate::input;
use crate::oracle::HttpPricingOracle;

/// Arguments for ranked batch quotes
#[derive(Args)]
pub struct BatchArgs {
    /// Path to JSON batch request (terms, pool and basket sizes)
    #[arg(long)]
    pub input: Option<String>,

    /// Market data file (YAML or JSON): pricing date, SOFR/VIX and per-asset snapshots
    #[arg(long)]
    pub market: Option<String>,

    /// Pricing date (YYYY-MM-DD); overrides the market file
    #[arg(long)]
    pub pricing_date: Option<NaiveDate>,

    /// Base URL of the pricing backend. Without it the local heuristic prices each basket.
    #[arg(long)]
    pub oracle_url: Option<String>,

    /// Per-request timeout for the pricing backend, in seconds
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    /// Seed for the heuristic volatility factor (heuristic pricing only)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum oracle calls in flight; overrides the config file
    #[arg(long)]
    pub concurrency: Option<usize>,
}

pub fn run_batch(
    args: BatchArgs,
    mut config: EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request: BatchQuoteRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_request()? {
        request
    } else {
        return Err("--input <file.json> or stdin required for batch quotes".into());
    };

    if let Some(limit) = args.concurrency {
        config.batch.concurrency_limit = limit;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(price_batch(args, request, config))
}

async fn price_batch(
    args: BatchArgs,
    request: BatchQuoteRequest,
    config: EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut market: MarketData = match args.market {
        Some(ref path) => input::file::read_structured(path)?,
        None => MarketData::empty(
            args.pricing_date
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
        ),
    };
    if let Some(date) = args.pricing_date {
        market.pricing_date = date;
    }

    let oracle: Box<dyn PricingOracle> = match args.oracle_url {
        Some(ref url) => {
            let http = HttpPricingOracle::new(url, Duration::from_secs(args.timeout_secs))?;
            if market.market_parameters == MarketParameters::default() {
                match http.market_parameters().await {
                    Ok(params) => market.market_parameters = params,
                    Err(e) => warn!(error = %e, "market parameters unavailable"),
                }
            }
            Box::new(http)
        }
        None => match args.seed {
            Some(seed) => Box::new(HeuristicOracle::seeded(seed)),
            None => Box::new(HeuristicOracle::deterministic()),
        },
    };

    info!(
        pool = request.parameters.underlying_assets.len(),
        sizes = ?request.basket_sizes,
        pricing_date = %market.pricing_date,
        "generating batch quotes"
    );

    tokio::select! {
        output = ranking::generate_quotes(&request, &market, oracle.as_ref(), &config) => {
            Ok(serde_json::to_value(output?)?)
        }
        _ = tokio::signal::ctrl_c() => {
            Err("interrupted; outstanding oracle calls cancelled".into())
        }
    }
}
