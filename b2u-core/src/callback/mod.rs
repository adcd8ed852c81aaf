//! Classification of URLs observed by the embedded checkout browser.
//!
//! [`classify`] is a pure function from a URL to a [`CallbackEvent`]; the
//! stateful [`NavigationGate`] builds on it to decide whether a URL may load
//! and whether its callback still needs to be acted upon.

mod gate;

pub use gate::{GateDecision, GateRoute, NavigationGate, NavigationPhase};

use b2u_sdk::objects::PaymentMethod;
use url::Url;

use crate::config::TrustPolicy;

/// VNPay return path marker.
pub const VNPAY_RETURN_PATH: &str = "/vnpay/return";
/// MoMo redirect path markers.
pub const MOMO_RETURN_PATHS: &[&str] = &["momo/redirect", "momo/return"];
/// Path of the backend's own "payment success" page.
pub const PAYMENT_SUCCESS_PATH: &str = "payment-success";

const VNP_RESPONSE_CODE: &str = "vnp_ResponseCode";
const VNP_TRANSACTION_STATUS: &str = "vnp_TransactionStatus";
const VNP_TXN_REF: &str = "vnp_TxnRef";
const VNP_SUCCESS: &str = "00";
const MOMO_RESULT_CODE: &str = "resultCode";
const MOMO_ORDER_ID: &str = "orderId";
const MOMO_SUCCESS: &str = "0";
const TXN_REF: &str = "txnRef";

/// Payment outcome carried by a callback URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackOutcome {
    Success,
    Failure,
    /// Not a callback, or a callback that must not be acted upon.
    Indeterminate,
}

/// Which callback shape a URL matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackMarker {
    /// A provider return URL (`/vnpay/return`, `momo/return`, or their query parameters).
    ProviderReturn,
    /// The backend's `payment-success` page.
    SuccessPage,
    None,
}

/// Logical identity of a callback within one session.
pub type CallbackKey = (CallbackMarker, Option<PaymentMethod>, CallbackOutcome);

/// An immutable record derived from a single navigated-to URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEvent {
    pub raw_url: String,
    pub provider: Option<PaymentMethod>,
    pub outcome: CallbackOutcome,
    pub marker: CallbackMarker,
    /// The URL's host is allowed to report an outcome.
    pub trusted: bool,
    /// `vnp_ResponseCode` or `resultCode`, when present.
    pub response_code: Option<String>,
    /// Provider or backend transaction reference, when present.
    pub txn_ref: Option<String>,
    /// This logical callback was already acted upon in the current session.
    pub already_processed: bool,
}

impl CallbackEvent {
    fn indeterminate(raw_url: &str) -> Self {
        Self {
            raw_url: raw_url.to_owned(),
            provider: None,
            outcome: CallbackOutcome::Indeterminate,
            marker: CallbackMarker::None,
            trusted: false,
            response_code: None,
            txn_ref: None,
            already_processed: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome != CallbackOutcome::Indeterminate
    }

    pub fn key(&self) -> CallbackKey {
        (self.marker, self.provider, self.outcome)
    }
}

/// Classify a URL string. Never fails: anything unparseable is indeterminate.
pub fn classify(raw_url: &str, policy: &TrustPolicy) -> CallbackEvent {
    match Url::parse(raw_url) {
        Ok(url) => classify_url(&url, raw_url, policy),
        Err(_) => CallbackEvent::indeterminate(raw_url),
    }
}

pub(crate) fn classify_url(url: &Url, raw_url: &str, policy: &TrustPolicy) -> CallbackEvent {
    let path = url.path();
    let response_code = query_param(url, VNP_RESPONSE_CODE);
    let result_code = query_param(url, MOMO_RESULT_CODE);

    let is_vnpay = path.contains(VNPAY_RETURN_PATH) || response_code.is_some();
    let is_momo =
        MOMO_RETURN_PATHS.iter().any(|marker| path.contains(marker)) || result_code.is_some();

    let (marker, provider, outcome, code, txn_ref) = if path.contains(PAYMENT_SUCCESS_PATH) {
        let provider = if is_vnpay {
            Some(PaymentMethod::VnPay)
        } else if is_momo {
            Some(PaymentMethod::MoMo)
        } else {
            None
        };
        // Provider codes carried by the page take precedence over its path.
        let declined = response_code.as_deref().is_some_and(|code| code != VNP_SUCCESS)
            || query_param(url, VNP_TRANSACTION_STATUS)
                .is_some_and(|status| status != VNP_SUCCESS)
            || result_code.as_deref().is_some_and(|code| code != MOMO_SUCCESS);
        let outcome = if declined {
            CallbackOutcome::Failure
        } else {
            CallbackOutcome::Success
        };
        (
            CallbackMarker::SuccessPage,
            provider,
            outcome,
            response_code.or(result_code),
            query_param(url, TXN_REF),
        )
    } else if is_vnpay {
        let status = query_param(url, VNP_TRANSACTION_STATUS);
        let outcome = if response_code.as_deref() == Some(VNP_SUCCESS)
            && status.as_deref() == Some(VNP_SUCCESS)
        {
            CallbackOutcome::Success
        } else {
            CallbackOutcome::Failure
        };
        (
            CallbackMarker::ProviderReturn,
            Some(PaymentMethod::VnPay),
            outcome,
            response_code,
            query_param(url, VNP_TXN_REF),
        )
    } else if is_momo {
        let outcome = if result_code.as_deref() == Some(MOMO_SUCCESS) {
            CallbackOutcome::Success
        } else {
            CallbackOutcome::Failure
        };
        (
            CallbackMarker::ProviderReturn,
            Some(PaymentMethod::MoMo),
            outcome,
            result_code,
            query_param(url, MOMO_ORDER_ID),
        )
    } else {
        return CallbackEvent::indeterminate(raw_url);
    };

    // The loopback success page is a development redirect target; its
    // success is still confirmed against the ledger before it is shown.
    let trusted = policy.is_trusted(url)
        || (marker == CallbackMarker::SuccessPage && policy.is_loopback(url));

    CallbackEvent {
        raw_url: raw_url.to_owned(),
        provider,
        outcome: if trusted {
            outcome
        } else {
            CallbackOutcome::Indeterminate
        },
        marker,
        trusted,
        response_code: code,
        txn_ref,
        already_processed: false,
    }
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
