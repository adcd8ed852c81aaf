//! Event type definitions for the deposit flow.

use b2u_sdk::objects::PaymentMethod;
use rust_decimal::Decimal;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::callback::NavigationPhase;
use crate::processors::VerificationOutcome;

/// Instructions for the host UI.
///
/// Exactly one of `StartFailed`, `PaymentSucceeded`, `PaymentFailed`,
/// `StillProcessing` and `Abandoned` is emitted per session; see
/// [`UiEvent::is_outcome`].
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Open the embedded browser at the checkout URL.
    OpenBrowser {
        session_id: Uuid,
        checkout_url: String,
    },
    /// Close the embedded browser.
    CloseBrowser { session_id: Uuid },
    /// No checkout URL could be obtained. Shown as a blocking alert.
    StartFailed { session_id: Uuid, reason: String },
    /// The deposit is confirmed by the ledger.
    PaymentSucceeded {
        session_id: Uuid,
        provider: PaymentMethod,
        amount: Decimal,
    },
    /// The provider reported a failed or cancelled payment.
    PaymentFailed {
        session_id: Uuid,
        provider: Option<PaymentMethod>,
        response_code: Option<String>,
    },
    /// The ledger did not confirm the deposit in time. Never phrased as a failure.
    StillProcessing { session_id: Uuid, amount: Decimal },
    /// The user left the checkout before any payment result was seen.
    Abandoned { session_id: Uuid },
    /// Wallet data was reloaded after a terminal outcome.
    WalletRefreshed {
        balance: Option<Decimal>,
        transactions: Option<usize>,
    },
}

impl UiEvent {
    /// Whether this event is the terminal outcome of a session.
    pub fn is_outcome(&self) -> bool {
        matches!(
            self,
            UiEvent::StartFailed { .. }
                | UiEvent::PaymentSucceeded { .. }
                | UiEvent::PaymentFailed { .. }
                | UiEvent::StillProcessing { .. }
                | UiEvent::Abandoned { .. }
        )
    }
}

/// Final result of one verification run, tagged with its session.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    pub session_id: Uuid,
    pub outcome: VerificationOutcome,
}

/// Background signals addressed to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSignal {
    Verification(VerificationReport),
    /// A deferred callback's display delay elapsed.
    CallbackDue { session_id: Uuid },
}

/// Commands from the host to a running controller.
#[derive(Debug)]
pub enum SessionCommand {
    Start {
        amount: u64,
        provider: PaymentMethod,
    },
    /// A browser navigation hook fired; the reply carries the allow-load decision.
    Navigated {
        url: String,
        phase: NavigationPhase,
        reply: oneshot::Sender<bool>,
    },
    /// The user dismissed the browser while it showed `current_url`.
    ManualClose { current_url: Option<String> },
}
