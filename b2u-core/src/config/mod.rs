//! Runtime configuration of the deposit reconciliation flow.
//!
//! These are the validated values the flow runs with. Loading them from a
//! file is the binary's job.

mod trust;

pub use trust::{TrustPolicy, DEFAULT_LOOPBACK_HOSTS};

use rust_decimal::Decimal;
use std::time::Duration;

/// Fixed spacing between two ledger polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Number of ledger polls before the poller gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;

/// Allowed difference, in minor units, between the requested amount and the
/// ledger amount.
// TODO: confirm with the payment-backend owners whether this absorbs gateway
// fee rounding or can be tightened to an exact match.
pub const DEFAULT_AMOUNT_TOLERANCE: i64 = 100;

/// How long a trusted payment-success page stays visible before it is acted on.
pub const DEFAULT_SUCCESS_PAGE_DELAY: Duration = Duration::from_millis(1500);

/// Bounded-retry settings of the verification poller.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
    pub amount_tolerance: Decimal,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            amount_tolerance: Decimal::from(DEFAULT_AMOUNT_TOLERANCE),
        }
    }
}

/// Everything the session controller needs besides the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowConfig {
    pub trust: TrustPolicy,
    pub poll: PollSettings,
    pub success_page_delay: Duration,
    /// Wallet type used to filter the transaction list (`customer`/`business`).
    pub wallet_type: String,
    /// Page size of the transaction list fetched on every poll.
    pub page_limit: u32,
}

impl FlowConfig {
    pub fn new(trust: TrustPolicy) -> Self {
        Self {
            trust,
            poll: PollSettings::default(),
            success_page_delay: DEFAULT_SUCCESS_PAGE_DELAY,
            wallet_type: "customer".to_owned(),
            page_limit: 20,
        }
    }
}
