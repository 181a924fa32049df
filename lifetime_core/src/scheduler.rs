use std::{
    mem,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use rand::{rngs::StdRng, RngCore, SeedableRng};

use crate::{
    client::{fresh_client_name, ClientDescriptor},
    config::{LifetimeConfig, PromotionPolicy},
    error::{CoordinatorResult, HostError},
    host::{LifetimeHost, ProcessStatus},
    lifetime::LifetimeBounds,
    phase::TickPhase,
    signals::ExitSignal,
    telemetry::{ListSizes, TickTelemetry},
    time::{Clock, SystemClock, Timestamp},
};

/// Outcome of checking a client in the starting list.
enum Gate {
    Promote,
    Hold,
    /// Back to waiting, keeping `start_at`.
    Retry,
    /// Back to waiting after the restart delay; nothing was launched.
    Relaunch,
}

/// Moves clients waiting -> starting -> running -> waiting on a fixed tick.
///
/// Each tick reads the clock once, then runs [`TickPhase::ALL`] in order,
/// every phase seeing the lists as left by the phases before it. A client is
/// therefore touched by at most one transition per phase per tick. Clients
/// launched in a tick are not promoted in the same tick.
pub struct LifetimeScheduler {
    bounds: LifetimeBounds,
    use_new_simulated_player: bool,
    promotion: PromotionPolicy,
    tick_interval: Duration,
    restart_delay: Duration,
    identity_prefix: String,

    host: Option<Box<dyn LifetimeHost>>,
    clock: Box<dyn Clock>,
    rng: Box<dyn RngCore + Send>,

    waiting: Vec<ClientDescriptor>,
    starting: Vec<ClientDescriptor>,
    running: Vec<ClientDescriptor>,

    telemetry: TickTelemetry,
}

impl LifetimeScheduler {
    /// `Ok(None)` means lifetime management is off (`max_lifetime <= 0`).
    pub fn from_config(cfg: &LifetimeConfig) -> CoordinatorResult<Option<Self>> {
        let Some(bounds) = LifetimeBounds::from_config(cfg)? else {
            return Ok(None);
        };

        let mut telemetry = TickTelemetry::new();
        telemetry.configure_summary(Duration::from_secs(cfg.stats_period_secs));

        info!(
            "lifetime management on: lifetime=[{}, {}) min restart_delay={}s fresh_identity={} promotion={:?}",
            bounds.min_minutes(),
            bounds.max_minutes(),
            cfg.restart_delay_secs,
            cfg.use_new_simulated_player(),
            cfg.promotion
        );

        Ok(Some(Self {
            bounds,
            use_new_simulated_player: cfg.use_new_simulated_player(),
            promotion: cfg.promotion,
            tick_interval: cfg.tick_interval(),
            restart_delay: cfg.restart_delay(),
            identity_prefix: cfg.identity_prefix.clone(),

            host: None,
            clock: Box::new(SystemClock::new()),
            rng: Box::new(StdRng::from_entropy()),

            waiting: Vec::new(),
            starting: Vec::new(),
            running: Vec::new(),

            telemetry,
        }))
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Binds the host, replacing any previous one.
    pub fn set_host(&mut self, host: impl LifetimeHost + 'static) {
        self.host = Some(Box::new(host));
    }

    /// Unbinds the host. Start/stop become no-ops; lists keep moving.
    pub fn clear_host(&mut self) -> Option<Box<dyn LifetimeHost>> {
        self.host.take()
    }

    #[inline]
    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }

    pub fn add_client(&mut self, client: ClientDescriptor) {
        info!("add client {client} now={}", self.clock.now());
        self.waiting.push(client);
    }

    #[inline]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    #[inline]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    #[inline]
    pub fn waiting(&self) -> &[ClientDescriptor] {
        &self.waiting
    }

    #[inline]
    pub fn starting(&self) -> &[ClientDescriptor] {
        &self.starting
    }

    #[inline]
    pub fn running(&self) -> &[ClientDescriptor] {
        &self.running
    }

    #[inline]
    pub fn sizes(&self) -> ListSizes {
        ListSizes {
            waiting: self.waiting.len(),
            starting: self.starting.len(),
            running: self.running.len(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sizes().total()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn telemetry(&self) -> &TickTelemetry {
        &self.telemetry
    }

    /// Blocks, ticking once per interval until `exit` is raised.
    ///
    /// The time a tick took is subtracted from the following sleep; an
    /// overrun re-ticks immediately. Host calls have no timeout, so a hung
    /// host stalls this loop.
    pub fn run(&mut self, exit: &ExitSignal) {
        info!(
            "scheduler loop started: interval={}ms clients={}",
            self.tick_interval.as_millis(),
            self.len()
        );

        while !exit.is_exit_requested() {
            let t0 = Instant::now();
            self.tick();

            let remaining = self.tick_interval.saturating_sub(t0.elapsed());
            if exit.wait_timeout(remaining) {
                break;
            }
        }

        let sizes = self.sizes();
        info!(
            "scheduler loop stopped: ticks={} wait={} start={} run={}",
            self.telemetry.ticks, sizes.waiting, sizes.starting, sizes.running
        );
    }

    pub fn tick(&mut self) {
        let t0 = Instant::now();
        let now = self.clock.now();
        let before = self.sizes();

        debug!(
            "tick now={now} wait={} start={} run={}",
            before.waiting, before.starting, before.running
        );

        for phase in TickPhase::ALL {
            self.run_phase(phase, now);
        }

        let after = self.sizes();
        debug_assert_eq!(before.total(), after.total(), "tick must conserve clients");

        self.telemetry.tick_finished(t0.elapsed(), self.tick_interval, after);
    }

    fn run_phase(&mut self, phase: TickPhase, now: Timestamp) {
        let t0 = Instant::now();
        match phase {
            TickPhase::Expire => self.expire(now),
            TickPhase::Promote => self.promote(now),
            TickPhase::Launch => self.launch(now),
        }
        self.telemetry.record_scope(phase, t0.elapsed());
    }

    fn expire(&mut self, now: Timestamp) {
        let (expired, alive): (Vec<_>, Vec<_>) = mem::take(&mut self.running)
            .into_iter()
            .partition(|c| c.end_at().map_or(true, |end| end <= now));
        self.running = alive;

        for mut client in expired {
            if let Some(host) = self.host.as_mut() {
                if let Err(e) = host.stop_client(&client) {
                    report_host_failure(&mut self.telemetry, "stop", &client, &e);
                }
            }
            info!("end client {client} now={now}");

            client.mark_waiting(now + self.restart_delay);
            if self.use_new_simulated_player {
                client.rename(fresh_client_name(&self.identity_prefix));
            }

            info!("move to waiting list {client} now={now}");
            self.telemetry.record_transition(TickPhase::Expire);
            self.waiting.push(client);
        }
    }

    fn promote(&mut self, now: Timestamp) {
        for mut client in mem::take(&mut self.starting) {
            match self.gate(&client) {
                Gate::Promote => {
                    let lifetime = self.bounds.draw(&mut self.rng);
                    client.mark_running(now + lifetime);

                    info!("move to running list {client} now={now}");
                    self.telemetry.record_transition(TickPhase::Promote);
                    self.running.push(client);
                }
                Gate::Retry => {
                    info!("move back to waiting list {client} now={now}");
                    self.waiting.push(client);
                }
                Gate::Relaunch => {
                    client.mark_waiting(now + self.restart_delay);
                    info!("launch failed, move back to waiting list {client} now={now}");
                    self.waiting.push(client);
                }
                Gate::Hold => self.starting.push(client),
            }
        }
    }

    fn gate(&mut self, client: &ClientDescriptor) -> Gate {
        if self.promotion == PromotionPolicy::Unconditional {
            return Gate::Promote;
        }
        // no host to ask: behave like a dry run
        let Some(host) = self.host.as_mut() else {
            return Gate::Promote;
        };

        match host.active_process(client.name()) {
            None if client.launch_failed() => Gate::Relaunch,
            None => {
                debug!("no active process for {}, holding in starting", client.name());
                Gate::Hold
            }
            Some(ProcessStatus::Running) => Gate::Hold,
            Some(status) => {
                host.remove_active_process(client.name());
                if status.exited_cleanly() {
                    Gate::Promote
                } else {
                    warn!("client {} exited abnormally ({status:?}), retrying", client.name());
                    Gate::Retry
                }
            }
        }
    }

    fn launch(&mut self, now: Timestamp) {
        let (due, pending): (Vec<_>, Vec<_>) = mem::take(&mut self.waiting)
            .into_iter()
            .partition(|c| c.start_at() <= now);
        self.waiting = pending;

        for mut client in due {
            client.set_launch_failed(false);
            if let Some(host) = self.host.as_mut() {
                if let Err(e) = host.start_client(&client) {
                    report_host_failure(&mut self.telemetry, "start", &client, &e);
                    client.set_launch_failed(true);
                }
            }

            info!("move to starting list {client} now={now}");
            self.telemetry.record_transition(TickPhase::Launch);
            self.starting.push(client);
        }
    }
}

/// Host failures never block a transition; they are logged and counted.
fn report_host_failure(
    telemetry: &mut TickTelemetry,
    action: &str,
    client: &ClientDescriptor,
    err: &HostError,
) {
    telemetry.record_host_failure();
    warn!("host {action} failed for {}: {err}", client.name());
}
