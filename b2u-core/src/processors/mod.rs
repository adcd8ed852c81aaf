//! Background processors of the deposit flow.
//!
//! - `VerificationPoller`: polls the ledger after a provider-reported success
//!   and reports `VerificationReport` back to the controller.

pub mod verification_poller;

pub use verification_poller::{find_match, PollerHandle, VerificationOutcome, VerificationPoller};
