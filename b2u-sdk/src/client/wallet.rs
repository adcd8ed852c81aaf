//! Wallet API client (mobile app → Back2Use backend).
//!
//! Requests carry a bearer token when one is configured. The wallet id is
//! fixed per client because the deposit flow only ever touches the signed-in
//! user's own wallet.

use reqwest::{Client, RequestBuilder};
use url::Url;

use super::{parse_response, ClientError};
use crate::objects::{
    DepositRequest, DepositResponse, Transaction, TransactionList, TransactionQuery, Wallet,
    WalletEnvelope,
};

/// Typed HTTP client for the wallet endpoints used by the deposit flow.
#[derive(Debug, Clone)]
pub struct WalletClient {
    http: Client,
    base_url: Url,
    wallet_id: String,
    access_token: Option<String>,
}

impl WalletClient {
    /// Create a new `WalletClient`.
    ///
    /// * `base_url` – root URL of the backend (e.g. `https://api.back2use.vn`).
    /// * `wallet_id` – the wallet deposits are credited to.
    pub fn new(base_url: Url, wallet_id: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            wallet_id: wallet_id.into(),
            access_token: None,
        }
    }

    /// Authenticate every request with `Authorization: Bearer {token}`.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn wallet_id(&self) -> &str {
        &self.wallet_id
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// `POST /wallets/{id}/deposit` – open a hosted checkout session.
    ///
    /// The checkout URL is read from the returned body with
    /// [`DepositResponse::checkout_url`].
    pub async fn deposit(&self, request: &DepositRequest) -> Result<DepositResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/wallets/{}/deposit", self.wallet_id))?;

        let resp = self
            .authorize(self.http.post(url))
            .json(request)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /wallet-transactions/me` – list the user's wallet transactions.
    pub async fn list_transactions(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, ClientError> {
        let url = self.base_url.join("/wallet-transactions/me")?;

        let resp = self
            .authorize(self.http.get(url))
            .query(query)
            .send()
            .await?;

        parse_response::<TransactionList>(resp)
            .await
            .map(TransactionList::into_items)
    }

    /// `GET /wallets/{id}` – current wallet balance.
    pub async fn get_wallet(&self) -> Result<Wallet, ClientError> {
        let url = self
            .base_url
            .join(&format!("/wallets/{}", self.wallet_id))?;

        let resp = self.authorize(self.http.get(url)).send().await?;

        parse_response::<WalletEnvelope>(resp)
            .await
            .map(WalletEnvelope::into_wallet)
    }
}
