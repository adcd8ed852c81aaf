//! Load gating for the embedded checkout browser.
//!
//! Every navigation hook (will-load, did-finish-load, and the page shown when
//! the back button is pressed) goes through [`NavigationGate::inspect`],
//! which owns the set of callbacks already seen in the current session.

use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;
use url::Url;

use super::{classify_url, CallbackEvent, CallbackKey, CallbackMarker};
use crate::config::TrustPolicy;

/// Which browser hook observed the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPhase {
    /// The browser is about to load the URL; the answer decides whether it may.
    WillLoad,
    /// The browser finished loading the URL. Never a primary trigger.
    DidFinishLoad,
}

/// What the controller should do with the classified event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRoute {
    Ignore,
    /// Act on the callback now.
    Dispatch,
    /// Remember the callback and act on it after the delay, or on manual close.
    Defer(Duration),
    /// Remember the callback and act on it only on manual close.
    Capture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub allow_load: bool,
    pub event: CallbackEvent,
    pub route: GateRoute,
}

impl GateDecision {
    fn pass_through(event: CallbackEvent) -> Self {
        Self {
            allow_load: true,
            event,
            route: GateRoute::Ignore,
        }
    }
}

pub struct NavigationGate {
    policy: TrustPolicy,
    success_page_delay: Duration,
    checkout: Option<Url>,
    processed: HashSet<CallbackKey>,
}

impl NavigationGate {
    pub fn new(policy: TrustPolicy, success_page_delay: Duration) -> Self {
        Self {
            policy,
            success_page_delay,
            checkout: None,
            processed: HashSet::new(),
        }
    }

    /// Start over for a new session opened at `checkout`.
    pub fn reset(&mut self, checkout: Option<Url>) {
        self.checkout = checkout;
        self.processed.clear();
    }

    pub fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    /// Classify `raw_url` and decide whether the browser may load it.
    pub fn inspect(&mut self, raw_url: &str, phase: NavigationPhase) -> GateDecision {
        let Ok(url) = Url::parse(raw_url) else {
            return GateDecision::pass_through(CallbackEvent::indeterminate(raw_url));
        };

        if self.is_checkout_page(&url) {
            return GateDecision::pass_through(CallbackEvent::indeterminate(raw_url));
        }

        let mut event = classify_url(&url, raw_url, &self.policy);
        let allow_load = !self.policy.is_loopback(&url);

        if !event.is_terminal() {
            if !allow_load {
                debug!(url = raw_url, "Blocked loopback navigation");
            }
            return GateDecision {
                allow_load,
                event,
                route: GateRoute::Ignore,
            };
        }

        if !self.processed.insert(event.key()) {
            debug!(url = raw_url, ?phase, "Suppressed repeated callback");
            event.already_processed = true;
            return GateDecision {
                allow_load: false,
                event,
                route: GateRoute::Ignore,
            };
        }

        let route = match phase {
            NavigationPhase::DidFinishLoad => GateRoute::Capture,
            NavigationPhase::WillLoad
                if allow_load && event.marker == CallbackMarker::SuccessPage =>
            {
                GateRoute::Defer(self.success_page_delay)
            }
            NavigationPhase::WillLoad => GateRoute::Dispatch,
        };

        GateDecision {
            allow_load,
            event,
            route,
        }
    }

    /// The checkout URL itself, or a page on its origin under its path.
    fn is_checkout_page(&self, url: &Url) -> bool {
        let Some(checkout) = &self.checkout else {
            return false;
        };
        url.origin() == checkout.origin() && url.path().starts_with(checkout.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::CallbackOutcome;

    const CHECKOUT: &str =
        "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html?vnp_Amount=50000000&vnp_TxnRef=T1";
    const VNPAY_OK: &str =
        "https://backend.example.com/vnpay/return?vnp_ResponseCode=00&vnp_TransactionStatus=00";

    fn gate() -> NavigationGate {
        let mut gate = NavigationGate::new(
            TrustPolicy::new(["backend.example.com"]),
            Duration::from_millis(1500),
        );
        gate.reset(Url::parse(CHECKOUT).ok());
        gate
    }

    #[test]
    fn test_checkout_page_always_loads() {
        let mut gate = gate();
        let decision = gate.inspect(CHECKOUT, NavigationPhase::WillLoad);
        assert!(decision.allow_load);
        assert_eq!(decision.route, GateRoute::Ignore);

        // Same origin and path prefix, even when shaped like a callback.
        let decision = gate.inspect(
            "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html?vnp_ResponseCode=00",
            NavigationPhase::WillLoad,
        );
        assert!(decision.allow_load);
        assert_eq!(decision.event.outcome, CallbackOutcome::Indeterminate);
    }

    #[test]
    fn test_trusted_callback_loads_once() {
        let mut gate = gate();
        let first = gate.inspect(VNPAY_OK, NavigationPhase::WillLoad);
        assert!(first.allow_load);
        assert_eq!(first.route, GateRoute::Dispatch);
        assert!(!first.event.already_processed);

        let again = gate.inspect(VNPAY_OK, NavigationPhase::WillLoad);
        assert!(!again.allow_load);
        assert_eq!(again.route, GateRoute::Ignore);
        assert!(again.event.already_processed);

        let loaded = gate.inspect(VNPAY_OK, NavigationPhase::DidFinishLoad);
        assert!(loaded.event.already_processed);
        assert_eq!(loaded.route, GateRoute::Ignore);
    }

    #[test]
    fn test_finish_load_only_captures() {
        let mut gate = gate();
        let decision = gate.inspect(
            "https://backend.example.com/momo/return?resultCode=1006",
            NavigationPhase::DidFinishLoad,
        );
        assert_eq!(decision.route, GateRoute::Capture);
        assert_eq!(decision.event.outcome, CallbackOutcome::Failure);
    }

    #[test]
    fn test_loopback_success_page_dispatches_without_loading() {
        let mut gate = gate();
        let decision = gate.inspect(
            "http://localhost:3000/payment-success?txnRef=DEP-1",
            NavigationPhase::WillLoad,
        );
        assert!(!decision.allow_load);
        assert_eq!(decision.route, GateRoute::Dispatch);
        assert_eq!(decision.event.txn_ref.as_deref(), Some("DEP-1"));
    }

    #[test]
    fn test_loopback_is_blocked() {
        let mut gate = gate();
        let decision = gate.inspect("http://10.0.2.2:3000/wallet", NavigationPhase::WillLoad);
        assert!(!decision.allow_load);
        assert_eq!(decision.route, GateRoute::Ignore);
    }

    #[test]
    fn test_trusted_success_page_is_deferred() {
        let mut gate = gate();
        let decision = gate.inspect(
            "https://backend.example.com/payment-success?txnRef=DEP-2",
            NavigationPhase::WillLoad,
        );
        assert!(decision.allow_load);
        assert_eq!(decision.route, GateRoute::Defer(Duration::from_millis(1500)));
    }

    #[test]
    fn test_untrusted_callback_passes_through() {
        let mut gate = gate();
        let decision = gate.inspect(
            "https://evil.example.com/vnpay/return?vnp_ResponseCode=00&vnp_TransactionStatus=00",
            NavigationPhase::WillLoad,
        );
        assert!(decision.allow_load);
        assert_eq!(decision.route, GateRoute::Ignore);
        assert_eq!(decision.event.outcome, CallbackOutcome::Indeterminate);
    }

    #[test]
    fn test_reset_forgets_processed_callbacks() {
        let mut gate = gate();
        gate.inspect(VNPAY_OK, NavigationPhase::WillLoad);
        gate.reset(None);
        let decision = gate.inspect(VNPAY_OK, NavigationPhase::WillLoad);
        assert_eq!(decision.route, GateRoute::Dispatch);
    }
}
