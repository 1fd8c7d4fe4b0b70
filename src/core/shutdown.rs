//! # OS termination signals.
//!
//! [`wait_for_signal`] completes when the process receives a termination signal
//! and reports which one, so the server can log why it is closing.
//!
//! - **Unix:** `SIGINT`, `SIGTERM`, `SIGQUIT`
//! - **Other platforms:** Ctrl-C via [`tokio::signal::ctrl_c`]

use std::fmt;

/// Signal that triggered shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
    Quit,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Quit => "SIGQUIT",
        })
    }
}

/// Waits for a termination signal.
///
/// Returns `Err` if signal handlers cannot be registered.
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<Signal> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let sig = tokio::select! {
        _ = sigint.recv()  => Signal::Interrupt,
        _ = sigterm.recv() => Signal::Terminate,
        _ = sigquit.recv() => Signal::Quit,
    };
    Ok(sig)
}

/// Waits for a termination signal.
///
/// Returns `Err` if the Ctrl-C handler cannot be registered.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<Signal> {
    tokio::signal::ctrl_c().await?;
    Ok(Signal::Interrupt)
}
