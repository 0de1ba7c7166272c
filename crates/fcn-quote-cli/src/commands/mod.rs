pub mod batch;
pub mod combinations;
pub mod payoff;
pub mod preview;

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;

use fcn_quote_core::fcn::params::{BarrierType, FcnParameters};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BarrierArg {
    /// European knock-in, observed at maturity
    Eki,
    /// American knock-in, observed daily
    Aki,
}

impl From<BarrierArg> for BarrierType {
    fn from(arg: BarrierArg) -> Self {
        match arg {
            BarrierArg::Eki => BarrierType::EuropeanKi,
            BarrierArg::Aki => BarrierType::AmericanKi,
        }
    }
}

/// Note terms given as flags instead of an input file.
#[derive(Args, Debug, Clone)]
pub struct NoteArgs {
    /// Underlying assets (comma-separated, e.g. "NVDA,TSLA")
    #[arg(long, value_delimiter = ',')]
    pub assets: Option<Vec<String>>,

    /// Strike price, % of initial fixing
    #[arg(long)]
    pub strike: Option<Decimal>,

    /// Knock-out barrier, % of initial fixing
    #[arg(long)]
    pub knock_out: Option<Decimal>,

    /// Knock-in barrier, % of initial fixing
    #[arg(long)]
    pub knock_in: Option<Decimal>,

    /// Knock-in observation style
    #[arg(long, value_enum, default_value = "eki")]
    pub barrier_type: BarrierArg,

    /// Issue price / cost, %
    #[arg(long, default_value = "99")]
    pub issue_price: Decimal,

    /// Tenor in months
    #[arg(long)]
    pub tenor: Option<u32>,

    /// Non-call period in months
    #[arg(long, default_value = "1")]
    pub protection_period: u32,
}

impl NoteArgs {
    pub fn to_parameters(&self) -> Result<FcnParameters, Box<dyn std::error::Error>> {
        Ok(FcnParameters {
            underlying_assets: self
                .assets
                .clone()
                .ok_or("--assets is required (or provide --input)")?,
            strike_price: self
                .strike
                .ok_or("--strike is required (or provide --input)")?,
            knock_out_barrier: self
                .knock_out
                .ok_or("--knock-out is required (or provide --input)")?,
            knock_in_barrier: self
                .knock_in
                .ok_or("--knock-in is required (or provide --input)")?,
            barrier_type: self.barrier_type.into(),
            issue_price: self.issue_price,
            tenor_months: self.tenor.ok_or("--tenor is required (or provide --input)")?,
            protection_period_months: self.protection_period,
        })
    }
}
