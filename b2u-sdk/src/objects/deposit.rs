//! Wallet deposit request and the checkout-URL extraction rules for its
//! response.
//!
//! The deposit endpoint has returned the hosted checkout URL in several
//! shapes over time. Rather than chaining optional lookups, the accepted
//! shapes are listed in [`CHECKOUT_URL_STRATEGIES`] and tried in order; the
//! first one that yields a non-empty string wins.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::PaymentMethod;

/// Request body for `POST /wallets/{id}/deposit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    /// Amount in minor currency units.
    pub amount: u64,
    pub payment_method: PaymentMethod,
}

/// One accepted location of the checkout URL inside a deposit response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutUrlStrategy {
    pub name: &'static str,
    pub path: &'static [&'static str],
}

impl CheckoutUrlStrategy {
    const fn new(name: &'static str, path: &'static [&'static str]) -> Self {
        Self { name, path }
    }

    /// Follow `path` through nested objects and return the string at the end,
    /// if it is present and not blank.
    pub fn extract<'a>(&self, body: &'a Value) -> Option<&'a str> {
        let mut cursor = body;
        for key in self.path {
            cursor = cursor.get(*key)?;
        }
        cursor.as_str().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Checkout URL locations, in the order they are tried.
pub const CHECKOUT_URL_STRATEGIES: &[CheckoutUrlStrategy] = &[
    CheckoutUrlStrategy::new("url", &["url"]),
    CheckoutUrlStrategy::new("payUrl", &["payUrl"]),
    CheckoutUrlStrategy::new("paymentResponse.payUrl", &["paymentResponse", "payUrl"]),
    CheckoutUrlStrategy::new("paymentResponse.url", &["paymentResponse", "url"]),
    CheckoutUrlStrategy::new("paymentResponse.shortLink", &["paymentResponse", "shortLink"]),
    CheckoutUrlStrategy::new("data.url", &["data", "url"]),
    CheckoutUrlStrategy::new("data.payUrl", &["data", "payUrl"]),
    CheckoutUrlStrategy::new("data.paymentResponse.payUrl", &["data", "paymentResponse", "payUrl"]),
    CheckoutUrlStrategy::new("data.paymentResponse.url", &["data", "paymentResponse", "url"]),
    CheckoutUrlStrategy::new(
        "data.paymentResponse.shortLink",
        &["data", "paymentResponse", "shortLink"],
    ),
];

/// Raw response of the deposit endpoint.
///
/// Kept as loose JSON because the checkout URL location varies; use
/// [`checkout_url`](Self::checkout_url) to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepositResponse(pub Value);

impl DepositResponse {
    /// The checkout URL together with the name of the strategy that found it.
    pub fn checkout_url_with_source(&self) -> Option<(&'static str, &str)> {
        CHECKOUT_URL_STRATEGIES
            .iter()
            .find_map(|strategy| strategy.extract(&self.0).map(|url| (strategy.name, url)))
    }

    /// The first non-empty checkout URL, if any strategy yields one.
    pub fn checkout_url(&self) -> Option<&str> {
        self.checkout_url_with_source().map(|(_, url)| url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_top_level_url_wins() {
        let resp = DepositResponse(json!({
            "url": "https://pay.vnpay.vn/a",
            "payUrl": "https://pay.vnpay.vn/b",
        }));
        assert_eq!(resp.checkout_url(), Some("https://pay.vnpay.vn/a"));
    }

    #[test]
    fn test_blank_values_fall_through() {
        let resp = DepositResponse(json!({
            "url": "  ",
            "payUrl": "",
            "paymentResponse": { "payUrl": null, "shortLink": "https://momo.vn/s/xyz" },
        }));
        assert_eq!(
            resp.checkout_url_with_source(),
            Some(("paymentResponse.shortLink", "https://momo.vn/s/xyz"))
        );
    }

    #[test]
    fn test_data_envelope() {
        let resp = DepositResponse(json!({
            "statusCode": 201,
            "data": { "paymentResponse": { "url": "https://test-payment.momo.vn/pay" } },
        }));
        assert_eq!(
            resp.checkout_url_with_source(),
            Some(("data.paymentResponse.url", "https://test-payment.momo.vn/pay"))
        );
    }

    #[test]
    fn test_no_url_anywhere() {
        let resp = DepositResponse(json!({ "data": { "amount": 50000 }, "url": 42 }));
        assert_eq!(resp.checkout_url(), None);
        assert_eq!(DepositResponse(json!(null)).checkout_url(), None);
    }

    #[test]
    fn test_request_wire_format() {
        let req = DepositRequest {
            amount: 500_000,
            payment_method: PaymentMethod::VnPay,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "amount": 500000, "paymentMethod": "vnpay" })
        );
    }
}
