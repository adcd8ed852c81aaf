#![allow(dead_code)]

use async_trait::async_trait;
use b2u_core::backend::{BackendError, WalletBackend};
use b2u_core::config::{FlowConfig, TrustPolicy};
use b2u_core::events::{UiEvent, UiEventReceiver};
use b2u_sdk::objects::{
    DepositRequest, DepositResponse, Transaction, TransactionDirection, TransactionQuery,
    TransactionStatus, Wallet,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const BACKEND_HOST: &str = "backend.example.com";
pub const CHECKOUT_URL: &str =
    "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html?vnp_Amount=50000000&vnp_TxnRef=DEP1";
pub const VNPAY_SUCCESS: &str =
    "https://backend.example.com/vnpay/return?vnp_ResponseCode=00&vnp_TransactionStatus=00";
pub const MOMO_DECLINED: &str = "https://backend.example.com/momo/return?resultCode=1006";

/// In-memory backend answering from a script.
///
/// Ledger responses are consumed one per `list_transactions` call; once the
/// script is empty the last successful response keeps being returned.
pub struct ScriptedBackend {
    deposit: Mutex<Result<Value, String>>,
    ledger: Mutex<VecDeque<Result<Vec<Transaction>, String>>>,
    ledger_tail: Mutex<Vec<Transaction>>,
    balance: Decimal,
    latency: Duration,
    in_flight: AtomicU32,
    pub max_in_flight: AtomicU32,
    pub deposit_requests: Mutex<Vec<DepositRequest>>,
    pub list_calls: AtomicU32,
    pub wallet_calls: AtomicU32,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            deposit: Mutex::new(Ok(json!({ "data": { "paymentResponse": { "payUrl": CHECKOUT_URL } } }))),
            ledger: Mutex::new(VecDeque::new()),
            ledger_tail: Mutex::new(Vec::new()),
            balance: Decimal::from(1_500_000),
            latency: Duration::ZERO,
            in_flight: AtomicU32::new(0),
            max_in_flight: AtomicU32::new(0),
            deposit_requests: Mutex::new(Vec::new()),
            list_calls: AtomicU32::new(0),
            wallet_calls: AtomicU32::new(0),
        }
    }

    pub fn with_deposit_response(self, body: Value) -> Self {
        *self.deposit.lock().unwrap() = Ok(body);
        self
    }

    pub fn with_deposit_error(self, reason: &str) -> Self {
        *self.deposit.lock().unwrap() = Err(reason.to_owned());
        self
    }

    pub fn then_ledger(self, transactions: Vec<Transaction>) -> Self {
        self.ledger.lock().unwrap().push_back(Ok(transactions));
        self
    }

    pub fn then_ledger_error(self, reason: &str) -> Self {
        self.ledger.lock().unwrap().push_back(Err(reason.to_owned()));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn deposit_calls(&self) -> usize {
        self.deposit_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl WalletBackend for ScriptedBackend {
    async fn create_deposit(&self, request: &DepositRequest) -> Result<DepositResponse, BackendError> {
        self.deposit_requests.lock().unwrap().push(request.clone());
        let scripted = self.deposit.lock().unwrap().clone();
        scripted
            .map(DepositResponse)
            .map_err(BackendError::Unavailable)
    }

    async fn list_transactions(
        &self,
        _query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let next = self.ledger.lock().unwrap().pop_front();
        match next {
            Some(Ok(transactions)) => {
                *self.ledger_tail.lock().unwrap() = transactions.clone();
                Ok(transactions)
            }
            Some(Err(reason)) => Err(BackendError::Unavailable(reason)),
            None => Ok(self.ledger_tail.lock().unwrap().clone()),
        }
    }

    async fn get_wallet(&self) -> Result<Wallet, BackendError> {
        self.wallet_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Wallet {
            id: "wallet-1".to_owned(),
            balance: self.balance,
            wallet_type: Some("customer".to_owned()),
        })
    }
}

pub fn transaction(
    amount: i64,
    direction: TransactionDirection,
    status: TransactionStatus,
) -> Transaction {
    Transaction {
        id: Some(format!("tx-{amount}")),
        amount: Decimal::from(amount),
        direction,
        status,
        transaction_type: Some("deposit".to_owned()),
        description: None,
        reference_id: None,
        created_at: Some("2024-10-01T08:00:00.000Z".to_owned()),
    }
}

pub fn completed_deposit(amount: i64) -> Transaction {
    transaction(amount, TransactionDirection::In, TransactionStatus::Completed)
}

pub fn flow_config() -> FlowConfig {
    FlowConfig::new(TrustPolicy::new([BACKEND_HOST]))
}

/// Everything currently queued on the UI channel.
pub fn drain(rx: &mut UiEventReceiver) -> Vec<UiEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn outcomes(events: &[UiEvent]) -> Vec<&UiEvent> {
    events.iter().filter(|e| e.is_outcome()).collect()
}
