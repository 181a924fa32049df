use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::error::CoordinatorResult;

/// Cooperative stop request for the tick loop.
///
/// Raising it also wakes a thread parked in [`ExitSignal::wait_timeout`],
/// so the loop never sleeps out the rest of an interval after a stop.
#[derive(Clone)]
pub struct ExitSignal {
    flag: Arc<AtomicBool>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl ExitSignal {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self { flag: Arc::new(AtomicBool::new(false)), wake_tx, wake_rx }
    }

    #[inline]
    pub fn request_exit(&self) {
        self.flag.store(true, Ordering::Release);
        let _ = self.wake_tx.try_send(());
    }

    #[inline]
    pub fn is_exit_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Sleeps up to `timeout`. Returns `true` if exit was requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_exit_requested() || timeout.is_zero() {
            return self.is_exit_requested();
        }
        let _ = self.wake_rx.recv_timeout(timeout);
        self.is_exit_requested()
    }

    pub fn install_ctrlc_handler(&self) -> CoordinatorResult<()> {
        let s = self.clone();
        ctrlc::set_handler(move || s.request_exit())?;
        Ok(())
    }
}

impl Default for ExitSignal {
    fn default() -> Self {
        Self::new()
    }
}
