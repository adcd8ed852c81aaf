//! VerificationPoller processor.
//!
//! The VerificationPoller is responsible for:
//! - Polling the wallet transaction list at a fixed interval
//! - Matching a completed inbound transaction against the expected amount
//! - Giving up after a fixed number of attempts
//! - Reporting its single result back to the controller as a `SessionSignal`
//!
//! Polls are strictly sequential: the next tick is only awaited after the
//! previous fetch resolved, and ticks missed while a fetch was slow are
//! skipped rather than fired in a burst.

use crate::backend::WalletBackend;
use crate::config::PollSettings;
use crate::events::{SessionSignal, SessionSignalSender, VerificationReport};
use b2u_sdk::objects::{Transaction, TransactionQuery};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Terminal state of one verification run.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    /// The ledger shows the deposit.
    Confirmed {
        attempts: u32,
        transaction: Transaction,
    },
    /// All attempts were used without a match. Means "unconfirmed", not "denied".
    Exhausted { attempts: u32 },
}

impl VerificationOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, VerificationOutcome::Confirmed { .. })
    }
}

/// Find a completed inbound transaction within `tolerance` of `expected`.
pub fn find_match<'a>(
    transactions: &'a [Transaction],
    expected: Decimal,
    tolerance: Decimal,
) -> Option<&'a Transaction> {
    transactions
        .iter()
        .find(|tx| tx.is_completed_inbound() && (tx.amount - expected).abs() < tolerance)
}

/// Bounded-retry confirmation of a deposit against the backend ledger.
pub struct VerificationPoller {
    backend: Arc<dyn WalletBackend>,
    settings: PollSettings,
    query: TransactionQuery,
}

impl VerificationPoller {
    pub fn new(
        backend: Arc<dyn WalletBackend>,
        settings: PollSettings,
        query: TransactionQuery,
    ) -> Self {
        Self {
            backend,
            settings,
            query,
        }
    }

    /// Spawn the poll loop for `session_id`.
    ///
    /// The report is sent exactly once when the loop terminates. Dropping
    /// the returned handle aborts the loop and no report is sent.
    pub fn spawn(
        self,
        session_id: Uuid,
        expected_amount: Decimal,
        signal_tx: SessionSignalSender,
    ) -> PollerHandle {
        let handle = tokio::spawn(async move {
            let outcome = self.run(session_id, expected_amount).await;
            let report = VerificationReport {
                session_id,
                outcome,
            };
            if let Err(e) = signal_tx.send(SessionSignal::Verification(report)).await {
                warn!(%session_id, error = %e, "Failed to deliver VerificationReport, controller dropped");
            }
        });

        PollerHandle { session_id, handle }
    }

    /// Run the poll loop to completion.
    pub async fn run(&self, session_id: Uuid, expected_amount: Decimal) -> VerificationOutcome {
        let period = self.settings.interval;
        let max_attempts = self.settings.max_attempts;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(%session_id, %expected_amount, max_attempts, "Verification polling started");

        for attempt in 1..=max_attempts {
            ticker.tick().await;

            match self.backend.list_transactions(&self.query).await {
                Ok(transactions) => {
                    if let Some(tx) =
                        find_match(&transactions, expected_amount, self.settings.amount_tolerance)
                    {
                        info!(
                            %session_id,
                            attempt,
                            amount = %tx.amount,
                            transaction_id = tx.id.as_deref().unwrap_or("-"),
                            "Deposit confirmed by ledger"
                        );
                        return VerificationOutcome::Confirmed {
                            attempts: attempt,
                            transaction: tx.clone(),
                        };
                    }
                    debug!(
                        %session_id,
                        attempt,
                        scanned = transactions.len(),
                        "No matching transaction yet"
                    );
                }
                // A failed fetch only costs this attempt.
                Err(e) => {
                    warn!(%session_id, attempt, error = %e, "Failed to fetch transactions");
                }
            }
        }

        info!(%session_id, attempts = max_attempts, "Verification polling exhausted");
        VerificationOutcome::Exhausted {
            attempts: max_attempts,
        }
    }
}

/// Owned handle of a running poll loop. Aborts the loop when dropped.
#[derive(Debug)]
pub struct PollerHandle {
    session_id: Uuid,
    handle: JoinHandle<()>,
}

impl PollerHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the loop; its report will not be delivered.
    pub fn cancel(self) {
        debug!(session_id = %self.session_id, "Cancelling verification poller");
        drop(self);
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
