//! Terminal stand-in for the embedded checkout browser.
//!
//! Browser hooks are typed on stdin, one per line:
//!
//! ```text
//! nav <url>      the browser is about to load <url>; prints allow/block
//! loaded <url>   the browser finished loading <url>
//! back [<url>]   the user dismissed the browser, optionally while on <url>
//! quit           leave without waiting for an outcome
//! ```

use crate::shutdown::shutdown_signal;
use b2u_core::backend::WalletBackend;
use b2u_core::callback::NavigationPhase;
use b2u_core::config::FlowConfig;
use b2u_core::events::{SessionCommand, UiEvent, session_command_channel, ui_event_channel};
use b2u_core::session::GatewaySessionController;
use b2u_sdk::objects::PaymentMethod;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{oneshot, watch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserInput {
    Navigate(String),
    Loaded(String),
    Back(Option<String>),
    Quit,
}

/// Parse one stdin line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<BrowserInput>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match (word.to_ascii_lowercase().as_str(), rest) {
        ("nav", url) if !url.is_empty() => BrowserInput::Navigate(url.to_string()),
        ("loaded", url) if !url.is_empty() => BrowserInput::Loaded(url.to_string()),
        ("back", "") => BrowserInput::Back(None),
        ("back", url) => BrowserInput::Back(Some(url.to_string())),
        ("quit", "") => BrowserInput::Quit,
        _ => return Err(format!("unrecognized input: {line}")),
    };
    Ok(Some(input))
}

/// Drive one deposit from start to its outcome.
///
/// Returns the outcome event, or `None` when the user quit, stdin closed or
/// a shutdown signal arrived first.
pub async fn run_deposit(
    backend: Arc<dyn WalletBackend>,
    flow: FlowConfig,
    amount: u64,
    provider: PaymentMethod,
) -> anyhow::Result<Option<UiEvent>> {
    anyhow::ensure!(amount > 0, "deposit amount must be greater than zero");

    let (ui_tx, mut ui_rx) = ui_event_channel();
    let (command_tx, command_rx) = session_command_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let controller = GatewaySessionController::new(backend, flow, ui_tx);
    let controller_task = tokio::spawn(controller.run(shutdown_rx, command_rx));

    command_tx
        .send(SessionCommand::Start { amount, provider })
        .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut outcome: Option<UiEvent> = None;
    loop {
        tokio::select! {
            biased;

            result = &mut shutdown => {
                result?;
                break;
            }

            event = ui_rx.recv() => {
                let Some(event) = event else { break };
                print_event(&event);
                let done = ends_session(&event, outcome.is_some());
                if event.is_outcome() {
                    outcome = Some(event);
                }
                if done {
                    break;
                }
            }

            line = lines.next_line(), if outcome.is_none() => {
                let Some(line) = line? else {
                    tracing::info!("stdin closed");
                    break;
                };
                match parse_line(&line) {
                    Ok(Some(BrowserInput::Navigate(url))) => {
                        let allow = navigate(&command_tx, url, NavigationPhase::WillLoad).await?;
                        println!("{}", if allow { "allow" } else { "block" });
                    }
                    Ok(Some(BrowserInput::Loaded(url))) => {
                        navigate(&command_tx, url, NavigationPhase::DidFinishLoad).await?;
                    }
                    Ok(Some(BrowserInput::Back(current_url))) => {
                        command_tx.send(SessionCommand::ManualClose { current_url }).await?;
                    }
                    Ok(Some(BrowserInput::Quit)) => break,
                    Ok(None) => {}
                    Err(e) => eprintln!("{e}"),
                }
            }
        }
    }

    // A shutdown send only fails once the controller already stopped.
    let _ = shutdown_tx.send(true);
    controller_task.await?;
    Ok(outcome)
}

/// Whether the driver can stop after printing `event`.
fn ends_session(event: &UiEvent, outcome_seen: bool) -> bool {
    match event {
        // A refresh follows these two outcomes; wait for it.
        UiEvent::PaymentSucceeded { .. } | UiEvent::StillProcessing { .. } => false,
        UiEvent::WalletRefreshed { .. } => outcome_seen,
        other => other.is_outcome(),
    }
}

async fn navigate(
    command_tx: &b2u_core::events::SessionCommandSender,
    url: String,
    phase: NavigationPhase,
) -> anyhow::Result<bool> {
    let (reply, allowed) = oneshot::channel();
    command_tx
        .send(SessionCommand::Navigated { url, phase, reply })
        .await?;
    Ok(allowed.await?)
}

fn print_event(event: &UiEvent) {
    match event {
        UiEvent::OpenBrowser { checkout_url, .. } => {
            println!("Open checkout: {checkout_url}");
        }
        UiEvent::CloseBrowser { .. } => println!("Checkout closed"),
        UiEvent::StartFailed { reason, .. } => {
            println!("Could not start the payment: {reason}");
        }
        UiEvent::PaymentSucceeded {
            provider, amount, ..
        } => {
            println!("Deposit of {amount} VND via {provider} confirmed");
        }
        UiEvent::PaymentFailed {
            provider,
            response_code,
            ..
        } => {
            let provider = provider.map(|p| p.to_string()).unwrap_or_else(|| "provider".to_string());
            match response_code {
                Some(code) => println!("Payment failed at {provider} (code {code})"),
                None => println!("Payment failed at {provider}"),
            }
        }
        UiEvent::StillProcessing { amount, .. } => {
            println!(
                "Deposit of {amount} VND is still processing. Your balance will update once it is confirmed."
            );
        }
        UiEvent::Abandoned { .. } => println!("Payment cancelled, nothing was charged"),
        UiEvent::WalletRefreshed {
            balance,
            transactions,
        } => {
            if let Some(balance) = balance {
                println!("Balance: {balance} VND");
            }
            if let Some(count) = transactions {
                println!("Recent transactions: {count}");
            }
        }
    }
}
