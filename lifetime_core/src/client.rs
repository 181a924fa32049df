use std::fmt;

use uuid::Uuid;

use crate::time::Timestamp;

/// One simulated client, as tracked by the scheduler.
///
/// `end_at` is only set while the client sits in the running list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDescriptor {
    name: String,
    auth_token: String,
    target_deployment: String,
    start_at: Timestamp,
    end_at: Option<Timestamp>,
    launch_failed: bool,
}

impl ClientDescriptor {
    pub fn new(
        name: impl Into<String>,
        auth_token: impl Into<String>,
        target_deployment: impl Into<String>,
        start_at: Timestamp,
    ) -> Self {
        Self {
            name: name.into(),
            auth_token: auth_token.into(),
            target_deployment: target_deployment.into(),
            start_at,
            end_at: None,
            launch_failed: false,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    #[inline]
    pub fn target_deployment(&self) -> &str {
        &self.target_deployment
    }

    #[inline]
    pub fn start_at(&self) -> Timestamp {
        self.start_at
    }

    #[inline]
    pub fn end_at(&self) -> Option<Timestamp> {
        self.end_at
    }

    /// Whether the last `start_client` call for this client returned an error.
    #[inline]
    pub fn launch_failed(&self) -> bool {
        self.launch_failed
    }

    pub(crate) fn set_launch_failed(&mut self, failed: bool) {
        self.launch_failed = failed;
    }

    pub(crate) fn mark_running(&mut self, end_at: Timestamp) {
        self.end_at = Some(end_at);
    }

    pub(crate) fn mark_waiting(&mut self, start_at: Timestamp) {
        self.start_at = start_at;
        self.end_at = None;
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }
}

impl fmt::Display for ClientDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "name={} start_at={}", self.name, self.start_at)?;
        match self.end_at {
            Some(end) => write!(f, " end_at={end}"),
            None => write!(f, " end_at=-"),
        }
    }
}

/// New client identity: `prefix` followed by a random v4 uuid.
pub fn fresh_client_name(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4())
}
