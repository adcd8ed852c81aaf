use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Wallet balance snapshot returned by `GET /wallets/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    #[serde(alias = "_id")]
    pub id: String,
    pub balance: Decimal,
    #[serde(default)]
    pub wallet_type: Option<String>,
}

/// The wallet endpoint answers either with the wallet itself or wrapped in
/// a `data` envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WalletEnvelope {
    Enveloped { data: Wallet },
    Bare(Wallet),
}

impl WalletEnvelope {
    pub fn into_wallet(self) -> Wallet {
        match self {
            WalletEnvelope::Enveloped { data } => data,
            WalletEnvelope::Bare(wallet) => wallet,
        }
    }
}
