//! Event channel factories and handles.

use super::types::{SessionCommand, SessionSignal, UiEvent};
use tokio::sync::mpsc;

/// Default buffer size for event channels.
pub const DEFAULT_CHANNEL_BUFFER: usize = 64;

/// Sender handle for UiEvent events.
pub type UiEventSender = mpsc::Sender<UiEvent>;
/// Receiver handle for UiEvent events.
pub type UiEventReceiver = mpsc::Receiver<UiEvent>;

/// Sender handle for SessionSignal events.
pub type SessionSignalSender = mpsc::Sender<SessionSignal>;
/// Receiver handle for SessionSignal events.
pub type SessionSignalReceiver = mpsc::Receiver<SessionSignal>;

/// Sender handle for SessionCommand events.
pub type SessionCommandSender = mpsc::Sender<SessionCommand>;
/// Receiver handle for SessionCommand events.
pub type SessionCommandReceiver = mpsc::Receiver<SessionCommand>;

/// Create a new UiEvent channel.
pub fn ui_event_channel() -> (UiEventSender, UiEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a new SessionSignal channel.
///
/// The controller keeps the receiver; pollers and timers get clones of the sender.
pub fn session_signal_channel() -> (SessionSignalSender, SessionSignalReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a new SessionCommand channel.
pub fn session_command_channel() -> (SessionCommandSender, SessionCommandReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
