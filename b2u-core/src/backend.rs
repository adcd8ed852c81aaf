//! The backend seam of the deposit flow.
//!
//! The controller and the poller only see [`WalletBackend`]; production code
//! plugs in [`WalletClient`], tests plug in a scripted in-memory backend.

use async_trait::async_trait;
use b2u_sdk::client::{ClientError, WalletClient};
use b2u_sdk::objects::{DepositRequest, DepositResponse, Transaction, TransactionQuery, Wallet};
use thiserror::Error;

/// Errors surfaced by a [`WalletBackend`].
#[derive(Debug, Error)]
pub enum BackendError {
    /// The HTTP client failed (transport, status or body).
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Any other backend failure (used by alternative implementations).
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Backend calls the deposit flow depends on.
#[async_trait]
pub trait WalletBackend: Send + Sync {
    /// Open a hosted checkout session for a deposit.
    async fn create_deposit(&self, request: &DepositRequest) -> Result<DepositResponse, BackendError>;

    /// Fetch the latest wallet transactions.
    async fn list_transactions(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, BackendError>;

    /// Fetch the current wallet balance.
    async fn get_wallet(&self) -> Result<Wallet, BackendError>;
}

#[async_trait]
impl WalletBackend for WalletClient {
    async fn create_deposit(&self, request: &DepositRequest) -> Result<DepositResponse, BackendError> {
        Ok(self.deposit(request).await?)
    }

    async fn list_transactions(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, BackendError> {
        Ok(WalletClient::list_transactions(self, query).await?)
    }

    async fn get_wallet(&self) -> Result<Wallet, BackendError> {
        Ok(WalletClient::get_wallet(self).await?)
    }
}
