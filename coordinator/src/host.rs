use std::{
    collections::HashMap,
    process::{Child, Command, Stdio},
};

use lifetime_core::{config::HostConfig, ClientDescriptor, HostError, LifetimeHost, ProcessStatus};
use log::{debug, info, warn};

/// Launches one OS process per client and owns the resulting process table.
pub struct CommandHost {
    program: String,
    args: Vec<String>,
    children: HashMap<String, Child>,
}

impl CommandHost {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args, children: HashMap::new() }
    }

    /// `None` when no program is configured (dry run).
    pub fn from_config(cfg: &HostConfig) -> Option<Self> {
        let program = cfg.program.as_deref()?.trim();
        if program.is_empty() {
            return None;
        }
        Some(Self::new(program, cfg.args.clone()))
    }

    #[inline]
    pub fn tracked(&self) -> usize {
        self.children.len()
    }

    fn expand_args(&self, client: &ClientDescriptor) -> Vec<String> {
        self.args
            .iter()
            .map(|a| {
                a.replace("{name}", client.name())
                    .replace("{auth_token}", client.auth_token())
                    .replace("{target_deployment}", client.target_deployment())
            })
            .collect()
    }

    fn kill_and_reap(name: &str, child: &mut Child) -> Result<(), HostError> {
        if let Ok(Some(status)) = child.try_wait() {
            debug!("client {name} already exited ({status})");
            return Ok(());
        }
        child
            .kill()
            .and_then(|_| child.wait())
            .map(|status| debug!("client {name} stopped ({status})"))
            .map_err(|source| HostError::Stop { name: name.to_string(), source })
    }
}

impl LifetimeHost for CommandHost {
    fn start_client(&mut self, client: &ClientDescriptor) -> Result<(), HostError> {
        if let Some(mut stale) = self.children.remove(client.name()) {
            warn!("client {} still had a process, replacing it", client.name());
            Self::kill_and_reap(client.name(), &mut stale)?;
        }

        let child = Command::new(&self.program)
            .args(self.expand_args(client))
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| HostError::Spawn { name: client.name().to_string(), source })?;

        info!("spawned client {} pid={}", client.name(), child.id());
        self.children.insert(client.name().to_string(), child);
        Ok(())
    }

    fn stop_client(&mut self, client: &ClientDescriptor) -> Result<(), HostError> {
        match self.children.remove(client.name()) {
            Some(mut child) => Self::kill_and_reap(client.name(), &mut child),
            None => {
                debug!("client {} has no tracked process", client.name());
                Ok(())
            }
        }
    }

    fn active_process(&mut self, name: &str) -> Option<ProcessStatus> {
        let child = self.children.get_mut(name)?;
        match child.try_wait() {
            Ok(None) => Some(ProcessStatus::Running),
            Ok(Some(status)) => Some(ProcessStatus::Exited { code: status.code() }),
            Err(e) => {
                warn!("process state query failed for {name}: {e}");
                None
            }
        }
    }

    /// Forgets the process, killing and reaping it first if it is still alive.
    fn remove_active_process(&mut self, name: &str) {
        if let Some(mut child) = self.children.remove(name) {
            if let Err(e) = Self::kill_and_reap(name, &mut child) {
                warn!("{e}");
            }
        }
    }
}

impl Drop for CommandHost {
    fn drop(&mut self) {
        for (name, mut child) in self.children.drain() {
            if let Err(e) = Self::kill_and_reap(&name, &mut child) {
                warn!("{e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use lifetime_core::Timestamp;

    use super::*;

    fn client(name: &str) -> ClientDescriptor {
        ClientDescriptor::new(name, "tok", "dep", Timestamp::ZERO)
    }

    #[test]
    fn no_program_means_dry_run() {
        assert!(CommandHost::from_config(&HostConfig::default()).is_none());
        let blank = HostConfig { program: Some("  ".into()), args: Vec::new() };
        assert!(CommandHost::from_config(&blank).is_none());
    }

    #[test]
    fn placeholders_are_expanded() {
        let host = CommandHost::new(
            "client",
            vec!["+name={name}".into(), "{auth_token}".into(), "-d".into(), "{target_deployment}".into()],
        );
        assert_eq!(
            host.expand_args(&client("p1")),
            vec!["+name=p1", "tok", "-d", "dep"]
        );
    }

    #[test]
    fn spawn_failure_is_reported() {
        let mut host = CommandHost::new("/nonexistent/client-binary", Vec::new());
        let err = host.start_client(&client("p1")).unwrap_err();
        assert!(matches!(err, HostError::Spawn { .. }));
        assert_eq!(host.tracked(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn reports_exit_code_then_forgets() {
        let mut host = CommandHost::new("sh", vec!["-c".into(), "exit 3".into()]);
        host.start_client(&client("p1")).unwrap();

        let mut status = host.active_process("p1");
        for _ in 0..200 {
            if status != Some(ProcessStatus::Running) {
                break;
            }
            thread::sleep(Duration::from_millis(10));
            status = host.active_process("p1");
        }
        assert_eq!(status, Some(ProcessStatus::Exited { code: Some(3) }));

        host.remove_active_process("p1");
        assert_eq!(host.active_process("p1"), None);
    }

    #[cfg(unix)]
    #[test]
    fn removing_live_process_kills_it() {
        let mut host = CommandHost::new("sleep", vec!["30".into()]);
        host.start_client(&client("p1")).unwrap();
        let pid = host.children["p1"].id();

        host.remove_active_process("p1");
        assert_eq!(host.tracked(), 0);

        let alive = Command::new("kill")
            .args(["-0", pid.to_string().as_str()])
            .stderr(Stdio::null())
            .status()
            .unwrap();
        assert!(!alive.success(), "pid {pid} still running after removal");
    }

    #[cfg(unix)]
    #[test]
    fn stop_kills_running_process() {
        let mut host = CommandHost::new("sleep", vec!["30".into()]);
        let c = client("p1");
        host.start_client(&c).unwrap();
        assert_eq!(host.active_process("p1"), Some(ProcessStatus::Running));

        host.stop_client(&c).unwrap();
        assert_eq!(host.tracked(), 0);

        // stopping an untracked client is a no-op
        host.stop_client(&c).unwrap();
    }
}
