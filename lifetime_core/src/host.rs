use crate::{client::ClientDescriptor, error::HostError};

/// Process state as seen by the host's process table.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ProcessStatus {
    Running,
    /// `code` is `None` when the process was terminated by a signal.
    Exited { code: Option<i32> },
}

impl ProcessStatus {
    #[inline]
    pub fn exited_cleanly(self) -> bool {
        matches!(self, ProcessStatus::Exited { code: Some(0) })
    }
}

/// Capability that actually launches and terminates client processes.
///
/// Calls run on the scheduler thread. A slow call stalls every client's
/// bookkeeping, so implementations should hand off long work and return.
/// The host only borrows descriptors for the duration of a call.
pub trait LifetimeHost: Send {
    fn start_client(&mut self, client: &ClientDescriptor) -> Result<(), HostError>;

    fn stop_client(&mut self, client: &ClientDescriptor) -> Result<(), HostError>;

    /// Process-table lookup, used only by the health-gated promotion policy.
    fn active_process(&mut self, _name: &str) -> Option<ProcessStatus> {
        None
    }

    fn remove_active_process(&mut self, _name: &str) {}
}
