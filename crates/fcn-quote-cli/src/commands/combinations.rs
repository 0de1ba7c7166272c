use clap::Args;
use serde_json::Value;

use fcn_quote_core::fcn::combinations::{self, CombinationInput};
use fcn_quote_core::EngineConfig;

use crate::input;

/// Arguments for basket enumeration
#[derive(Args)]
pub struct CombinationsArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Stock pool (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub pool: Option<Vec<String>>,

    /// Basket sizes (comma-separated, e.g. "1,2,3")
    #[arg(long, value_delimiter = ',')]
    pub sizes: Option<Vec<usize>>,
}

pub fn run_combinations(
    args: CombinationsArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let combination_input: CombinationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_request()? {
        request
    } else {
        CombinationInput {
            pool: args.pool.ok_or("--pool is required (or provide --input)")?,
            basket_sizes: args.sizes.ok_or("--sizes is required (or provide --input)")?,
        }
    };

    let result = combinations::generate_combinations(&combination_input, &config.limits)?;
    Ok(serde_json::to_value(result)?)
}
