//! Wallet transaction history types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of money relative to the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionDirection {
    In,
    Out,
    #[serde(other)]
    Unknown,
}

/// Ledger status of a wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Processing => write!(f, "processing"),
            TransactionStatus::Completed => write!(f, "completed"),
            TransactionStatus::Failed => write!(f, "failed"),
            TransactionStatus::Cancelled => write!(f, "cancelled"),
            TransactionStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// A single entry of the wallet transaction list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub amount: Decimal,
    pub direction: TransactionDirection,
    pub status: TransactionStatus,
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Transaction {
    pub fn is_completed_inbound(&self) -> bool {
        self.status == TransactionStatus::Completed && self.direction == TransactionDirection::In
    }
}

/// Query string for `GET /wallet-transactions/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub wallet_type: String,
    pub type_group: String,
    pub page: u32,
    pub limit: u32,
}

impl TransactionQuery {
    /// Personal transactions of the given wallet type, newest page first.
    pub fn personal(wallet_type: impl Into<String>, limit: u32) -> Self {
        Self {
            wallet_type: wallet_type.into(),
            type_group: "personal".to_owned(),
            page: 1,
            limit,
        }
    }
}

/// Accepted response shapes of the transaction list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TransactionList {
    Bare(Vec<Transaction>),
    Enveloped { data: Vec<Transaction> },
    Paged { data: PagedItems },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagedItems {
    pub items: Vec<Transaction>,
}

impl TransactionList {
    pub fn into_items(self) -> Vec<Transaction> {
        match self {
            TransactionList::Bare(items) => items,
            TransactionList::Enveloped { data } => data,
            TransactionList::Paged { data } => data.items,
        }
    }
}
