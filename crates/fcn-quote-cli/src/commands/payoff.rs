use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fcn_quote_core::fcn::heuristic::{self, FixedFactor};
use fcn_quote_core::fcn::params::AssetScope;
use fcn_quote_core::fcn::payoff::{self, PayoffInput};
use fcn_quote_core::EngineConfig;

use super::NoteArgs;
use crate::input;

/// Arguments for a payoff curve
#[derive(Args)]
pub struct PayoffArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub note: NoteArgs,

    /// Coupon earned over the note's life, %. Defaults to the heuristic
    /// best case at a unit volatility factor.
    #[arg(long)]
    pub coupon_return: Option<Decimal>,
}

pub fn run_payoff(
    args: PayoffArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let payoff_input: PayoffInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_request()? {
        request
    } else {
        let parameters = args.note.to_parameters()?;
        let coupon_return_pct = match args.coupon_return {
            Some(c) => c,
            None => {
                parameters.validate(AssetScope::SingleNote, &config.limits)?;
                heuristic::price(&parameters, &mut FixedFactor(Decimal::ONE)).best_case_return_pct
            }
        };
        PayoffInput {
            parameters,
            coupon_return_pct,
        }
    };

    let result = payoff::payoff_profile(&payoff_input, &config.limits)?;
    Ok(serde_json::to_value(result)?)
}
