//! Session state machine.
//!
//! Every transition of a checkout session goes through [`reduce`]. The
//! reducer is pure: it returns the next state plus the [`Effect`]s the
//! controller must perform, or `None` when the input does not apply to the
//! current state. Returning `None` for repeated or late inputs is what makes
//! callback handling at-most-once.

use b2u_sdk::objects::PaymentMethod;
use rust_decimal::Decimal;
use std::time::Duration;

use crate::callback::{CallbackEvent, CallbackOutcome};
use crate::processors::VerificationOutcome;

/// Why a session ended in [`SessionState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No checkout URL could be obtained.
    StartFailed { reason: String },
    /// The provider reported a failed or cancelled payment.
    ProviderDeclined { response_code: Option<String> },
    /// The ledger never confirmed the deposit. Shown as "still processing".
    Unconfirmed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    AwaitingRedirect,
    /// A terminal callback was seen but not acted upon yet.
    CallbackReceived { event: CallbackEvent },
    Verifying { event: CallbackEvent },
    Succeeded { amount: Decimal },
    Failed(FailureReason),
    Abandoned,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingRedirect => "awaiting_redirect",
            SessionState::CallbackReceived { .. } => "callback_received",
            SessionState::Verifying { .. } => "verifying",
            SessionState::Succeeded { .. } => "succeeded",
            SessionState::Failed(_) => "failed",
            SessionState::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Succeeded { .. } | SessionState::Failed(_) | SessionState::Abandoned
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs of the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    CheckoutOpened { checkout_url: String },
    CheckoutFailed { reason: String },
    /// Act on a callback now.
    Callback(CallbackEvent),
    /// Remember a callback; act on it after `delay` or on manual close.
    CallbackCaptured {
        event: CallbackEvent,
        delay: Option<Duration>,
    },
    /// The delay of a captured callback elapsed.
    CallbackDue,
    ManualClose,
    VerificationFinished(VerificationOutcome),
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    OpenBrowser { checkout_url: String },
    CloseBrowser,
    StartVerification { expected_amount: Decimal },
    ScheduleCallback { delay: Duration },
    ShowStartFailed { reason: String },
    ShowSuccess { amount: Decimal },
    ShowFailure {
        provider: Option<PaymentMethod>,
        response_code: Option<String>,
    },
    ShowStillProcessing { amount: Decimal },
    ShowAbandoned,
    RefreshWallet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: SessionState, effects: Vec<Effect>) -> Option<Self> {
        Some(Self { state, effects })
    }
}

/// Compute the transition for `input` in `state`. `amount` is the session's
/// requested amount.
pub fn reduce(state: &SessionState, amount: Decimal, input: SessionInput) -> Option<Transition> {
    use SessionState as S;

    match (state, input) {
        (S::Idle, SessionInput::CheckoutOpened { checkout_url }) => Transition::to(
            S::AwaitingRedirect,
            vec![Effect::OpenBrowser { checkout_url }],
        ),
        (S::Idle, SessionInput::CheckoutFailed { reason }) => Transition::to(
            S::Failed(FailureReason::StartFailed {
                reason: reason.clone(),
            }),
            vec![Effect::ShowStartFailed { reason }],
        ),

        (S::AwaitingRedirect | S::CallbackReceived { .. }, SessionInput::Callback(event)) => {
            act_on_callback(event, amount)
        }

        (S::AwaitingRedirect, SessionInput::CallbackCaptured { event, delay })
            if event.is_terminal() && !event.already_processed =>
        {
            let effects = delay
                .map(|delay| vec![Effect::ScheduleCallback { delay }])
                .unwrap_or_default();
            Transition::to(S::CallbackReceived { event }, effects)
        }

        (S::CallbackReceived { event }, SessionInput::CallbackDue | SessionInput::ManualClose) => {
            act_on_callback(event.clone(), amount)
        }

        (S::Idle, SessionInput::ManualClose) => {
            Transition::to(S::Abandoned, vec![Effect::ShowAbandoned])
        }
        (S::AwaitingRedirect, SessionInput::ManualClose) => Transition::to(
            S::Abandoned,
            vec![Effect::CloseBrowser, Effect::ShowAbandoned],
        ),

        (S::Verifying { .. }, SessionInput::VerificationFinished(outcome)) => match outcome {
            VerificationOutcome::Confirmed { transaction, .. } => Transition::to(
                S::Succeeded {
                    amount: transaction.amount,
                },
                vec![
                    Effect::ShowSuccess {
                        amount: transaction.amount,
                    },
                    Effect::RefreshWallet,
                ],
            ),
            VerificationOutcome::Exhausted { .. } => Transition::to(
                S::Failed(FailureReason::Unconfirmed),
                vec![Effect::ShowStillProcessing { amount }, Effect::RefreshWallet],
            ),
        },

        _ => None,
    }
}

fn act_on_callback(event: CallbackEvent, amount: Decimal) -> Option<Transition> {
    if event.already_processed {
        return None;
    }
    match event.outcome {
        CallbackOutcome::Success => Transition::to(
            SessionState::Verifying { event },
            vec![
                Effect::CloseBrowser,
                Effect::StartVerification {
                    expected_amount: amount,
                },
            ],
        ),
        CallbackOutcome::Failure => {
            let effects = vec![
                Effect::CloseBrowser,
                Effect::ShowFailure {
                    provider: event.provider,
                    response_code: event.response_code.clone(),
                },
            ];
            Transition::to(
                SessionState::Failed(FailureReason::ProviderDeclined {
                    response_code: event.response_code,
                }),
                effects,
            )
        }
        CallbackOutcome::Indeterminate => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::classify;
    use crate::config::TrustPolicy;
    use b2u_sdk::objects::{Transaction, TransactionDirection, TransactionStatus};

    const AMOUNT: i64 = 500_000;

    fn event(url: &str) -> CallbackEvent {
        classify(url, &TrustPolicy::new(["backend.example.com"]))
    }

    fn vnpay_ok() -> CallbackEvent {
        event("https://backend.example.com/vnpay/return?vnp_ResponseCode=00&vnp_TransactionStatus=00")
    }

    fn vnpay_declined() -> CallbackEvent {
        event("https://backend.example.com/vnpay/return?vnp_ResponseCode=24&vnp_TransactionStatus=02")
    }

    fn step(state: &SessionState, input: SessionInput) -> Option<Transition> {
        reduce(state, Decimal::from(AMOUNT), input)
    }

    #[test]
    fn test_open_and_start_failure() {
        let t = step(
            &SessionState::Idle,
            SessionInput::CheckoutOpened {
                checkout_url: "https://pay.vnpay.vn/x".to_owned(),
            },
        )
        .unwrap();
        assert_eq!(t.state, SessionState::AwaitingRedirect);
        assert_eq!(
            t.effects,
            vec![Effect::OpenBrowser {
                checkout_url: "https://pay.vnpay.vn/x".to_owned()
            }]
        );

        let t = step(
            &SessionState::Idle,
            SessionInput::CheckoutFailed {
                reason: "no url".to_owned(),
            },
        )
        .unwrap();
        assert_eq!(t.state.name(), "failed");
        assert!(t.state.is_terminal());
    }

    #[test]
    fn test_success_callback_starts_verification_once() {
        let t = step(&SessionState::AwaitingRedirect, SessionInput::Callback(vnpay_ok())).unwrap();
        assert_eq!(t.state.name(), "verifying");
        assert_eq!(
            t.effects,
            vec![
                Effect::CloseBrowser,
                Effect::StartVerification {
                    expected_amount: Decimal::from(AMOUNT)
                }
            ]
        );
        // Same callback again: no transition.
        assert!(step(&t.state, SessionInput::Callback(vnpay_ok())).is_none());
        assert!(step(&t.state, SessionInput::ManualClose).is_none());
    }

    #[test]
    fn test_failure_callback_is_trusted_without_polling() {
        let t = step(&SessionState::AwaitingRedirect, SessionInput::Callback(vnpay_declined()))
            .unwrap();
        assert_eq!(
            t.state,
            SessionState::Failed(FailureReason::ProviderDeclined {
                response_code: Some("24".to_owned())
            })
        );
        assert!(!t
            .effects
            .iter()
            .any(|e| matches!(e, Effect::StartVerification { .. })));
    }

    #[test]
    fn test_indeterminate_and_processed_callbacks_are_ignored() {
        let state = SessionState::AwaitingRedirect;
        assert!(step(&state, SessionInput::Callback(event("https://sandbox.provider.com/checkout/abc123"))).is_none());

        let mut processed = vnpay_ok();
        processed.already_processed = true;
        assert!(step(&state, SessionInput::Callback(processed)).is_none());
    }

    #[test]
    fn test_manual_close_replays_captured_callback() {
        let t = step(
            &SessionState::AwaitingRedirect,
            SessionInput::CallbackCaptured {
                event: vnpay_declined(),
                delay: None,
            },
        )
        .unwrap();
        assert_eq!(t.state.name(), "callback_received");
        assert!(t.effects.is_empty());

        let t = step(&t.state, SessionInput::ManualClose).unwrap();
        assert_eq!(t.state.name(), "failed");
        assert_eq!(t.effects[0], Effect::CloseBrowser);
    }

    #[test]
    fn test_deferred_capture_schedules_and_fires() {
        let delay = Duration::from_millis(1500);
        let t = step(
            &SessionState::AwaitingRedirect,
            SessionInput::CallbackCaptured {
                event: vnpay_ok(),
                delay: Some(delay),
            },
        )
        .unwrap();
        assert_eq!(t.effects, vec![Effect::ScheduleCallback { delay }]);

        let t = step(&t.state, SessionInput::CallbackDue).unwrap();
        assert_eq!(t.state.name(), "verifying");
    }

    #[test]
    fn test_manual_close_without_callback_abandons() {
        let t = step(&SessionState::AwaitingRedirect, SessionInput::ManualClose).unwrap();
        assert_eq!(t.state, SessionState::Abandoned);
        assert_eq!(t.effects, vec![Effect::CloseBrowser, Effect::ShowAbandoned]);
        assert!(step(&t.state, SessionInput::ManualClose).is_none());

        let t = step(&SessionState::Idle, SessionInput::ManualClose).unwrap();
        assert_eq!(t.state, SessionState::Abandoned);
        assert_eq!(t.effects, vec![Effect::ShowAbandoned]);
    }

    #[test]
    fn test_verification_results() {
        let verifying = SessionState::Verifying { event: vnpay_ok() };
        let transaction = Transaction {
            id: Some("t1".to_owned()),
            amount: Decimal::from(AMOUNT),
            direction: TransactionDirection::In,
            status: TransactionStatus::Completed,
            transaction_type: None,
            description: None,
            reference_id: None,
            created_at: None,
        };

        let t = step(
            &verifying,
            SessionInput::VerificationFinished(VerificationOutcome::Confirmed {
                attempts: 2,
                transaction,
            }),
        )
        .unwrap();
        assert_eq!(
            t.state,
            SessionState::Succeeded {
                amount: Decimal::from(AMOUNT)
            }
        );
        assert!(t.effects.contains(&Effect::RefreshWallet));

        let t = step(
            &verifying,
            SessionInput::VerificationFinished(VerificationOutcome::Exhausted { attempts: 15 }),
        )
        .unwrap();
        assert_eq!(t.state, SessionState::Failed(FailureReason::Unconfirmed));
        assert_eq!(
            t.effects,
            vec![
                Effect::ShowStillProcessing {
                    amount: Decimal::from(AMOUNT)
                },
                Effect::RefreshWallet
            ]
        );
    }

    #[test]
    fn test_terminal_states_ignore_everything() {
        for state in [
            SessionState::Succeeded {
                amount: Decimal::from(AMOUNT),
            },
            SessionState::Failed(FailureReason::Unconfirmed),
            SessionState::Abandoned,
        ] {
            assert!(step(&state, SessionInput::Callback(vnpay_ok())).is_none());
            assert!(step(&state, SessionInput::ManualClose).is_none());
            assert!(step(&state, SessionInput::CallbackDue).is_none());
            assert!(step(
                &state,
                SessionInput::VerificationFinished(VerificationOutcome::Exhausted { attempts: 1 })
            )
            .is_none());
        }
    }
}
