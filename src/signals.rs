//! Unix signals the supervisor reacts to

use std::io;
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Stream of SIGHUP notifications
pub struct Hangups {
    inner: Signal,
}

impl Hangups {
    /// Waits for the next SIGHUP; `None` once no more can be received
    pub async fn recv(&mut self) -> Option<()> {
        self.inner.recv().await
    }
}

/// Registers a SIGHUP listener for the whole process
pub fn hangups() -> io::Result<Hangups> {
    Ok(Hangups {
        inner: signal(SignalKind::hangup())?,
    })
}
