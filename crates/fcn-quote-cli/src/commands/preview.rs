use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fcn_quote_core::fcn::heuristic::{self, PreviewInput};
use fcn_quote_core::EngineConfig;

use super::NoteArgs;
use crate::input;

/// Arguments for a heuristic preview quote
#[derive(Args)]
pub struct PreviewArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub note: NoteArgs,

    /// Seed for the volatility factor draw
    #[arg(long)]
    pub seed: Option<u64>,

    /// Pin the volatility factor (0.95 to 1.05)
    #[arg(long)]
    pub volatility_factor: Option<Decimal>,
}

pub fn run_preview(
    args: PreviewArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut preview_input: PreviewInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_request()? {
        request
    } else {
        PreviewInput {
            parameters: args.note.to_parameters()?,
            seed: None,
            volatility_factor: None,
        }
    };

    if args.seed.is_some() {
        preview_input.seed = args.seed;
    }
    if args.volatility_factor.is_some() {
        preview_input.volatility_factor = args.volatility_factor;
    }

    let result = heuristic::preview_quote(&preview_input, &config.limits)?;
    Ok(serde_json::to_value(result)?)
}
