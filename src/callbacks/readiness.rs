use super::error::ReadinessError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// A one-shot "first activity observed" signal.
///
/// Firing is a single compare-and-swap from armed to fired. Any number of
/// concurrent [`fire`](Self::fire) calls result in exactly one transition; the
/// losers get `false` back and nothing else happens.
pub struct ReadinessSignal {
    fired: AtomicBool,
    tx: watch::Sender<bool>,
}

impl ReadinessSignal {
    /// Creates an armed signal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            fired: AtomicBool::new(false),
            tx,
        }
    }

    /// Fires the signal. Returns `true` only for the call that performed the
    /// transition.
    pub fn fire(&self) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.tx.send_replace(true);
        true
    }

    /// Returns `true` once the signal has fired.
    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Returns a handle observing the signal. Subscribing after the signal fired
    /// yields a handle that is already ready.
    pub fn subscribe(&self) -> Readiness {
        Readiness {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for ReadinessSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReadinessSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessSignal")
            .field("fired", &self.is_fired())
            .finish()
    }
}

/// Observer side of a [`ReadinessSignal`].
#[derive(Clone, Debug)]
pub struct Readiness {
    rx: watch::Receiver<bool>,
}

impl Readiness {
    /// Returns `true` once the signal has fired.
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until the signal fires. Returns immediately if it already has.
    ///
    /// # Errors
    ///
    /// Returns [`ReadinessError::Closed`] if the signal is dropped unfired.
    pub async fn wait(&mut self) -> Result<(), ReadinessError> {
        self.rx
            .wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| ReadinessError::Closed)
    }
}
