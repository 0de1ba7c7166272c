pub mod http;

pub use http::HttpPricingOracle;
