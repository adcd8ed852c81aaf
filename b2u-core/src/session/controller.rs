//! GatewaySessionController.
//!
//! The controller is responsible for:
//! - Opening a hosted checkout session through the backend
//! - Routing every browser navigation through the `NavigationGate`
//! - Interpreting the effects of each session transition (browser, poller,
//!   timers, UI events, wallet refresh)
//! - Dropping signals that belong to a session it no longer owns
//!
//! It owns exactly one `CheckoutSession` at a time. Starting a new session
//! aborts the previous session's poller and deferred-callback timer.

use std::sync::Arc;

use b2u_sdk::objects::{DepositRequest, PaymentMethod, TransactionQuery};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::{CheckoutSession, Effect, SessionInput, SessionState};
use crate::backend::WalletBackend;
use crate::callback::{CallbackEvent, GateRoute, NavigationGate, NavigationPhase};
use crate::config::FlowConfig;
use crate::events::{
    session_signal_channel, SessionCommand, SessionCommandReceiver, SessionSignal,
    SessionSignalReceiver, SessionSignalSender, UiEvent, UiEventSender, VerificationReport,
};
use crate::processors::{PollerHandle, VerificationPoller};

/// Errors returned to the caller of [`GatewaySessionController::start`].
///
/// Backend failures are not errors here: they end the session in
/// `failed` and are reported as a [`UiEvent::StartFailed`].
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("deposit amount must be greater than zero")]
    InvalidAmount,
}

/// Drives one checkout session from "amount confirmed" to a terminal outcome.
pub struct GatewaySessionController {
    backend: Arc<dyn WalletBackend>,
    config: FlowConfig,
    gate: NavigationGate,
    session: Option<CheckoutSession>,
    poller: Option<PollerHandle>,
    deferred: Option<JoinHandle<()>>,
    signal_tx: SessionSignalSender,
    signal_rx: SessionSignalReceiver,
    ui_tx: UiEventSender,
}

impl GatewaySessionController {
    /// Create a new controller.
    ///
    /// # Arguments
    ///
    /// * `backend` - Wallet backend used for deposits and verification
    /// * `config` - Flow configuration (trust policy, poll settings)
    /// * `ui_tx` - Sender for UiEvent events
    pub fn new(backend: Arc<dyn WalletBackend>, config: FlowConfig, ui_tx: UiEventSender) -> Self {
        let (signal_tx, signal_rx) = session_signal_channel();
        let gate = NavigationGate::new(config.trust.clone(), config.success_page_delay);
        Self {
            backend,
            config,
            gate,
            session: None,
            poller: None,
            deferred: None,
            signal_tx,
            signal_rx,
            ui_tx,
        }
    }

    pub fn session(&self) -> Option<&CheckoutSession> {
        self.session.as_ref()
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.session.as_ref().map(CheckoutSession::state)
    }

    /// Whether a verification poller is currently running.
    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Run the controller until shutdown is signaled or the command channel
    /// closes.
    pub async fn run(
        mut self,
        mut shutdown_rx: watch::Receiver<bool>,
        mut command_rx: SessionCommandReceiver,
    ) {
        info!("GatewaySessionController started");

        loop {
            tokio::select! {
                biased;

                // Shutdown has highest priority.
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("GatewaySessionController received shutdown signal");
                        break;
                    }
                }

                // Poller reports and deferred callbacks.
                Some(signal) = self.signal_rx.recv() => {
                    self.on_signal(signal).await;
                }

                command = command_rx.recv() => {
                    match command {
                        Some(command) => self.on_command(command).await,
                        None => {
                            info!("SessionCommand channel closed");
                            break;
                        }
                    }
                }
            }
        }

        self.cancel_background();
        info!("GatewaySessionController shutdown complete");
    }

    async fn on_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Start { amount, provider } => {
                if let Err(e) = self.start(amount, provider).await {
                    warn!(amount, %provider, error = %e, "Rejected deposit request");
                }
            }
            SessionCommand::Navigated { url, phase, reply } => {
                let allow = self.handle_navigated_url(&url, phase).await;
                if reply.send(allow).is_err() {
                    debug!(url = %url, "Navigation reply receiver dropped");
                }
            }
            SessionCommand::ManualClose { current_url } => {
                self.on_back(current_url.as_deref()).await
            }
        }
    }

    /// Start a new checkout session.
    ///
    /// Returns the new session id. The session ends up either in
    /// `awaiting_redirect` (browser opened) or in `failed` (start failure
    /// reported to the UI).
    pub async fn start(
        &mut self,
        amount: u64,
        provider: PaymentMethod,
    ) -> Result<Uuid, ControllerError> {
        if amount == 0 {
            return Err(ControllerError::InvalidAmount);
        }

        self.cancel_background();
        if let Some(previous) = self.session.take() {
            if !previous.state().is_terminal() {
                info!(
                    session_id = %previous.id(),
                    state = %previous.state(),
                    "Abandoning previous checkout session"
                );
            }
        }
        self.gate.reset(None);

        let mut session = CheckoutSession::new(amount, provider);
        let session_id = session.id();
        info!(%session_id, amount, %provider, "Starting checkout session");

        let request = DepositRequest {
            amount,
            payment_method: provider,
        };
        let input = match self.backend.create_deposit(&request).await {
            Ok(response) => match response.checkout_url_with_source() {
                Some((source, url)) => {
                    debug!(%session_id, source, "Checkout URL extracted");
                    SessionInput::CheckoutOpened {
                        checkout_url: url.to_owned(),
                    }
                }
                None => {
                    warn!(%session_id, "Deposit response carried no checkout URL");
                    SessionInput::CheckoutFailed {
                        reason: "no checkout URL returned".to_owned(),
                    }
                }
            },
            Err(e) => {
                warn!(%session_id, error = %e, "Failed to open checkout session");
                SessionInput::CheckoutFailed {
                    reason: e.to_string(),
                }
            }
        };

        if let SessionInput::CheckoutOpened { checkout_url } = &input {
            self.gate.reset(Url::parse(checkout_url).ok());
        }

        let effects = session.apply(input);
        self.session = Some(session);
        self.perform(effects).await;
        Ok(session_id)
    }

    /// Single entry point for every browser navigation hook.
    ///
    /// Returns whether the browser may load `url`.
    pub async fn handle_navigated_url(&mut self, url: &str, phase: NavigationPhase) -> bool {
        let decision = self.gate.inspect(url, phase);
        if self.session.is_none() {
            return decision.allow_load;
        }

        match decision.route {
            GateRoute::Ignore => {}
            GateRoute::Dispatch => self.on_callback(decision.event).await,
            GateRoute::Defer(delay) => {
                self.apply(SessionInput::CallbackCaptured {
                    event: decision.event,
                    delay: Some(delay),
                })
                .await
            }
            GateRoute::Capture => {
                self.apply(SessionInput::CallbackCaptured {
                    event: decision.event,
                    delay: None,
                })
                .await
            }
        }

        decision.allow_load
    }

    /// Act on a classified callback. Repeated callbacks are a no-op.
    pub async fn on_callback(&mut self, event: CallbackEvent) {
        if event.already_processed || !event.is_terminal() {
            debug!(url = %event.raw_url, outcome = ?event.outcome, "Callback not actionable");
            return;
        }
        info!(
            url = %event.raw_url,
            provider = ?event.provider,
            outcome = ?event.outcome,
            "Payment callback received"
        );
        self.apply(SessionInput::Callback(event)).await;
    }

    /// The back button: the page the browser was showing goes through the
    /// same gate as every other navigation, then the browser is dismissed.
    pub async fn on_back(&mut self, current_url: Option<&str>) {
        if let Some(url) = current_url {
            self.handle_navigated_url(url, NavigationPhase::DidFinishLoad)
                .await;
        }
        self.on_manual_close().await;
    }

    /// The user dismissed the browser.
    pub async fn on_manual_close(&mut self) {
        self.apply(SessionInput::ManualClose).await;
    }

    pub async fn on_signal(&mut self, signal: SessionSignal) {
        match signal {
            SessionSignal::Verification(report) => self.on_verification_result(report).await,
            SessionSignal::CallbackDue { session_id } => {
                if self.current_id() != Some(session_id) {
                    debug!(%session_id, "Dropping stale deferred callback");
                    return;
                }
                self.deferred = None;
                self.apply(SessionInput::CallbackDue).await;
            }
        }
    }

    pub async fn on_verification_result(&mut self, report: VerificationReport) {
        if self.current_id() != Some(report.session_id) {
            debug!(session_id = %report.session_id, "Dropping stale VerificationReport");
            return;
        }
        self.poller = None;
        self.apply(SessionInput::VerificationFinished(report.outcome))
            .await;
    }

    /// Wait for the next background signal (poller report or deferred callback).
    pub async fn next_signal(&mut self) -> Option<SessionSignal> {
        self.signal_rx.recv().await
    }

    /// Abort the poller and the deferred-callback timer.
    pub fn cancel_background(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
        self.cancel_deferred();
    }

    fn cancel_deferred(&mut self) {
        if let Some(timer) = self.deferred.take() {
            timer.abort();
        }
    }

    fn current_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(CheckoutSession::id)
    }

    fn transaction_query(&self) -> TransactionQuery {
        TransactionQuery::personal(self.config.wallet_type.clone(), self.config.page_limit)
    }

    async fn apply(&mut self, input: SessionInput) {
        let Some(session) = self.session.as_mut() else {
            debug!("No active checkout session");
            return;
        };
        let effects = session.apply(input);
        self.perform(effects).await;
    }

    async fn perform(&mut self, effects: Vec<Effect>) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let session_id = session.id();
        let provider = session.provider();

        for effect in effects {
            match effect {
                Effect::OpenBrowser { checkout_url } => {
                    self.emit(UiEvent::OpenBrowser {
                        session_id,
                        checkout_url,
                    })
                    .await
                }
                Effect::CloseBrowser => {
                    self.cancel_deferred();
                    self.emit(UiEvent::CloseBrowser { session_id }).await
                }
                Effect::StartVerification { expected_amount } => {
                    let poller = VerificationPoller::new(
                        Arc::clone(&self.backend),
                        self.config.poll.clone(),
                        self.transaction_query(),
                    );
                    self.poller =
                        Some(poller.spawn(session_id, expected_amount, self.signal_tx.clone()));
                }
                Effect::ScheduleCallback { delay } => {
                    self.cancel_deferred();
                    let signal_tx = self.signal_tx.clone();
                    self.deferred = Some(tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        if signal_tx
                            .send(SessionSignal::CallbackDue { session_id })
                            .await
                            .is_err()
                        {
                            debug!(%session_id, "Deferred callback dropped, controller gone");
                        }
                    }));
                }
                Effect::ShowStartFailed { reason } => {
                    self.emit(UiEvent::StartFailed { session_id, reason }).await
                }
                Effect::ShowSuccess { amount } => {
                    info!(%session_id, %amount, "Deposit succeeded");
                    self.emit(UiEvent::PaymentSucceeded {
                        session_id,
                        provider,
                        amount,
                    })
                    .await
                }
                Effect::ShowFailure {
                    provider: reported,
                    response_code,
                } => {
                    info!(%session_id, ?response_code, "Deposit declined by provider");
                    self.emit(UiEvent::PaymentFailed {
                        session_id,
                        provider: reported.or(Some(provider)),
                        response_code,
                    })
                    .await
                }
                Effect::ShowStillProcessing { amount } => {
                    info!(%session_id, %amount, "Deposit not confirmed yet, still processing");
                    self.emit(UiEvent::StillProcessing { session_id, amount })
                        .await
                }
                Effect::ShowAbandoned => {
                    info!(%session_id, "Checkout abandoned before a payment result");
                    self.emit(UiEvent::Abandoned { session_id }).await
                }
                Effect::RefreshWallet => self.refresh_wallet().await,
            }
        }
    }

    async fn refresh_wallet(&self) {
        let balance = match self.backend.get_wallet().await {
            Ok(wallet) => Some(wallet.balance),
            Err(e) => {
                warn!(error = %e, "Failed to refresh wallet balance");
                None
            }
        };
        let transactions = match self
            .backend
            .list_transactions(&self.transaction_query())
            .await
        {
            Ok(list) => Some(list.len()),
            Err(e) => {
                warn!(error = %e, "Failed to refresh wallet transactions");
                None
            }
        };
        self.emit(UiEvent::WalletRefreshed {
            balance,
            transactions,
        })
        .await;
    }

    async fn emit(&self, event: UiEvent) {
        if let Err(e) = self.ui_tx.send(event).await {
            debug!(event = ?e.0, "UiEvent receiver dropped");
        }
    }
}

impl Drop for GatewaySessionController {
    fn drop(&mut self) {
        self.cancel_background();
    }
}
