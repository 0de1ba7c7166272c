pub mod combinations;
pub mod market;
pub mod params;
pub mod payoff;
pub mod risk;

#[cfg(feature = "preview")]
pub mod heuristic;

#[cfg(feature = "batch")]
pub mod oracle;

#[cfg(feature = "batch")]
pub mod ranking;
