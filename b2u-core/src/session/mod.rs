//! Checkout sessions and the controller driving them.

mod controller;
mod state;

pub use controller::{ControllerError, GatewaySessionController};
pub use state::{reduce, Effect, FailureReason, SessionInput, SessionState, Transition};

use b2u_sdk::objects::PaymentMethod;
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

/// One attempt to fund the wallet through a hosted checkout page.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    id: Uuid,
    amount: u64,
    provider: PaymentMethod,
    checkout_url: Option<String>,
    state: SessionState,
}

impl CheckoutSession {
    pub fn new(amount: u64, provider: PaymentMethod) -> Self {
        Self {
            id: Uuid::now_v7(),
            amount,
            provider,
            checkout_url: None,
            state: SessionState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn provider(&self) -> PaymentMethod {
        self.provider
    }

    pub fn checkout_url(&self) -> Option<&str> {
        self.checkout_url.as_deref()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Feed `input` through the reducer, returning the effects to perform.
    ///
    /// Inputs that do not apply to the current state leave it untouched and
    /// yield no effects.
    pub fn apply(&mut self, input: SessionInput) -> Vec<Effect> {
        let opened_url = match &input {
            SessionInput::CheckoutOpened { checkout_url } => Some(checkout_url.clone()),
            _ => None,
        };

        let Some(transition) = reduce(&self.state, Decimal::from(self.amount), input) else {
            debug!(session_id = %self.id, state = %self.state, "Input ignored");
            return Vec::new();
        };

        debug!(
            session_id = %self.id,
            from = %self.state,
            to = %transition.state,
            "Session transition"
        );
        if opened_url.is_some() {
            self.checkout_url = opened_url;
        }
        self.state = transition.state;
        transition.effects
    }
}
