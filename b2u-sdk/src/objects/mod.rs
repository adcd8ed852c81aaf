pub mod deposit;
pub mod payment_methods;
pub mod transaction;
pub mod wallet;

pub use deposit::{CheckoutUrlStrategy, DepositRequest, DepositResponse, CHECKOUT_URL_STRATEGIES};
pub use payment_methods::{PaymentMethod, UnknownPaymentMethod};
pub use transaction::{
    Transaction, TransactionDirection, TransactionList, TransactionQuery, TransactionStatus,
};
pub use wallet::{Wallet, WalletEnvelope};
