//! Pricing oracle backed by the FCN model service over HTTP.
//!
//! Each basket is one `POST /api/fcn/calculate`. Error bodies follow the
//! service's `{"detail": ...}` convention: a list of field errors for
//! request validation, a plain message for everything else.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use fcn_quote_core::error::FieldError;
use fcn_quote_core::fcn::market::{AssetSnapshot, MarketParameters};
use fcn_quote_core::fcn::oracle::{OracleQuote, OracleRequest, PricingOracle};
use fcn_quote_core::OracleError;

const CALCULATE_PATH: &str = "/api/fcn/calculate";
const MARKET_PARAMS_PATH: &str = "/api/market/params";

pub struct HttpPricingOracle {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateRequest<'a> {
    stocks: &'a [String],
    period: u32,
    #[serde(with = "rust_decimal::serde::float")]
    strike_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    knock_out_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    knock_in_price: Decimal,
    ki_type: &'static str,
    #[serde(with = "rust_decimal::serde::float")]
    custom_fee_rate: Decimal,
    non_call_periods: u32,
    /// YYYYMMDD
    pricing_date: String,
}

impl<'a> From<&'a OracleRequest> for CalculateRequest<'a> {
    fn from(req: &'a OracleRequest) -> Self {
        Self {
            stocks: &req.assets,
            period: req.tenor_months,
            strike_price: req.strike_price,
            knock_out_price: req.knock_out_barrier,
            knock_in_price: req.knock_in_barrier,
            ki_type: req.barrier_type.code(),
            custom_fee_rate: req.cost_pct,
            non_call_periods: req.non_call_periods,
            pricing_date: req.pricing_date.format("%Y%m%d").to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CalculateResponse {
    annualized_yield: Decimal,
    #[serde(default)]
    stock_info: BTreeMap<String, AssetSnapshot>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Fields(Vec<DetailItem>),
    Message(String),
}

#[derive(Debug, Deserialize)]
struct DetailItem {
    #[serde(default)]
    loc: Vec<serde_json::Value>,
    msg: String,
}

impl DetailItem {
    /// `["body", "strikePrice"]` becomes `strikePrice`.
    fn field(&self) -> String {
        self.loc
            .iter()
            .filter(|part| part.as_str() != Some("body"))
            .map(|part| match part {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Maps a non-success response to the oracle error taxonomy.
fn error_from_body(status: StatusCode, body: &str) -> OracleError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: ErrorDetail::Fields(items),
        }) => OracleError::Validation(
            items
                .into_iter()
                .map(|item| FieldError {
                    field: item.field(),
                    message: item.msg,
                })
                .collect(),
        ),
        Ok(ErrorBody {
            detail: ErrorDetail::Message(message),
        }) => OracleError::Failure(message),
        Err(_) => OracleError::Failure(format!("pricing service returned {status}")),
    }
}

impl HttpPricingOracle {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// SOFR and VIX for the service's latest pricing date.
    pub async fn market_parameters(&self) -> Result<MarketParameters, OracleError> {
        let url = format!("{}{}", self.base_url, MARKET_PARAMS_PATH);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OracleError::Failure(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OracleError::Failure(e.to_string()))?;
        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }
        serde_json::from_str(&body).map_err(|e| OracleError::Failure(e.to_string()))
    }
}

#[async_trait]
impl PricingOracle for HttpPricingOracle {
    async fn quote(&self, request: &OracleRequest) -> Result<OracleQuote, OracleError> {
        let url = format!("{}{}", self.base_url, CALCULATE_PATH);
        let payload = CalculateRequest::from(request);
        debug!(stocks = ?payload.stocks, "requesting quote");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| OracleError::Failure(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OracleError::Failure(e.to_string()))?;
        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }

        let parsed: CalculateResponse = serde_json::from_str(&body)
            .map_err(|e| OracleError::Failure(format!("malformed quote response: {e}")))?;
        Ok(OracleQuote {
            coupon_rate_pct: parsed.annualized_yield,
            market_snapshot: parsed.stock_info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fcn_quote_core::fcn::params::{BarrierType, FcnParameters};
    use rust_decimal_macros::dec;

    fn request() -> OracleRequest {
        let params = FcnParameters {
            underlying_assets: vec!["NVDA".into(), "TSLA".into()],
            strike_price: dec!(85),
            knock_out_barrier: dec!(105),
            knock_in_barrier: dec!(70),
            barrier_type: BarrierType::AmericanKi,
            issue_price: dec!(98.5),
            tenor_months: 6,
            protection_period_months: 2,
        };
        OracleRequest::for_assets(
            &params,
            params.underlying_assets.clone(),
            NaiveDate::from_ymd_opt(2025, 7, 10).unwrap(),
        )
    }

    #[test]
    fn test_request_body_uses_service_field_names() {
        let req = request();
        let body = serde_json::to_value(CalculateRequest::from(&req)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "stocks": ["NVDA", "TSLA"],
                "period": 6,
                "strikePrice": 85.0,
                "knockOutPrice": 105.0,
                "knockInPrice": 70.0,
                "kiType": "AKI",
                "customFeeRate": 98.5,
                "nonCallPeriods": 2,
                "pricingDate": "20250710"
            })
        );
    }

    #[test]
    fn test_response_with_missing_market_fields() {
        let body = r#"{
            "annualized_yield": 14.237,
            "model_used": "gbm",
            "stock_info": {
                "NVDA": {"price": 164.1, "put_iv_3m": 48.2, "vol_90d": null}
            }
        }"#;
        let parsed: CalculateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.annualized_yield, dec!(14.237));
        let nvda = &parsed.stock_info["NVDA"];
        assert_eq!(nvda.put_implied_vol_3m, Some(dec!(48.2)));
        assert_eq!(nvda.historical_vol_90d, None);
    }

    #[test]
    fn test_validation_detail_becomes_field_errors() {
        let body = r#"{"detail": [
            {"loc": ["body", "strikePrice"], "msg": "ensure this value is less than or equal to 100", "type": "value_error"},
            {"loc": ["body", "stocks", 0], "msg": "field required"}
        ]}"#;
        let err = error_from_body(StatusCode::UNPROCESSABLE_ENTITY, body);
        match err {
            OracleError::Validation(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].field, "strikePrice");
                assert_eq!(fields[1].field, "stocks.0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_message_detail_becomes_failure() {
        let err = error_from_body(StatusCode::NOT_FOUND, r#"{"detail": "no IV data for 20250710"}"#);
        assert_eq!(err, OracleError::Failure("no IV data for 20250710".into()));
    }

    #[test]
    fn test_unparseable_body_reports_status() {
        let err = error_from_body(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(
            err,
            OracleError::Failure("pricing service returned 502 Bad Gateway".into())
        );
    }
}
