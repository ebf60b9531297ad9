//! Single-slot pause signal from the connection manager to the relay pump.
//!
//! The producer never blocks: if a signal is already pending, or the pump is
//! gone, the new one is dropped. The pump polls between lines.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Create a linked sender/receiver pair with room for one pending signal.
pub fn channel() -> (BackpressureSender, BackpressureReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (BackpressureSender { tx }, BackpressureReceiver { rx })
}

#[derive(Clone, Debug)]
pub struct BackpressureSender {
    tx: mpsc::Sender<Duration>,
}

impl BackpressureSender {
    /// Ask the pump to pause for `wait`. Returns whether the signal was queued.
    pub fn signal(&self, wait: Duration) -> bool {
        match self.tx.try_send(wait) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "Backpressure signal dropped");
                false
            }
        }
    }
}

#[derive(Debug)]
pub struct BackpressureReceiver {
    rx: mpsc::Receiver<Duration>,
}

impl BackpressureReceiver {
    /// Take the pending signal, if any, without waiting.
    pub fn poll(&mut self) -> Option<Duration> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_then_poll() {
        let (tx, mut rx) = channel();
        assert!(rx.poll().is_none());
        assert!(tx.signal(Duration::from_secs(30)));
        assert_eq!(rx.poll(), Some(Duration::from_secs(30)));
        assert!(rx.poll().is_none());
    }

    #[test]
    fn test_second_signal_is_dropped_while_pending() {
        let (tx, mut rx) = channel();
        assert!(tx.signal(Duration::from_secs(30)));
        assert!(!tx.signal(Duration::from_secs(5)));
        assert_eq!(rx.poll(), Some(Duration::from_secs(30)));
        assert!(rx.poll().is_none());
    }

    #[test]
    fn test_signal_without_receiver_does_not_block() {
        let (tx, rx) = channel();
        drop(rx);
        assert!(!tx.signal(Duration::from_secs(30)));
    }
}
