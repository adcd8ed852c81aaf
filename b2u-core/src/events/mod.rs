//! Event system of the deposit flow.
//!
//! # Event Flow
//!
//! 1. The host sends `SessionCommand`s (start, navigation, manual close)
//!    to the `GatewaySessionController`.
//! 2. The controller emits `UiEvent`s for the host to render.
//! 3. The `VerificationPoller` and deferred-callback timers report back to
//!    the controller through `SessionSignal`s tagged with the session id, so
//!    signals from an abandoned session are recognised and dropped.

pub mod channels;
pub mod types;

pub use channels::{
    session_command_channel, session_signal_channel, ui_event_channel, SessionCommandReceiver,
    SessionCommandSender, SessionSignalReceiver, SessionSignalSender, UiEventReceiver,
    UiEventSender, DEFAULT_CHANNEL_BUFFER,
};

pub use types::{SessionCommand, SessionSignal, UiEvent, VerificationReport};
