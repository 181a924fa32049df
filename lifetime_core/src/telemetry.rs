use std::time::{Duration, Instant};

use log::{info, warn};

use crate::phase::TickPhase;

/// Sizes of the three scheduler lists at a point in time.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ListSizes {
    pub waiting: usize,
    pub starting: usize,
    pub running: usize,
}

impl ListSizes {
    #[inline]
    pub fn total(&self) -> usize {
        self.waiting + self.starting + self.running
    }
}

pub struct TickTelemetry {
    pub ticks: u64,
    pub last_tick: Duration,
    pub overruns: u64,
    pub host_failures: u64,

    transitions: [u64; 3],
    phase_time: [Duration; 3],

    summary_last: Instant,
    summary_period: Duration,
    summary_enabled: bool,
}

impl TickTelemetry {
    pub fn new() -> Self {
        Self {
            ticks: 0,
            last_tick: Duration::ZERO,
            overruns: 0,
            host_failures: 0,
            transitions: [0; 3],
            phase_time: [Duration::ZERO; 3],
            summary_last: Instant::now(),
            summary_period: Duration::from_secs(30),
            summary_enabled: true,
        }
    }

    /// A zero period turns the summary line off.
    pub fn configure_summary(&mut self, period: Duration) {
        self.summary_enabled = !period.is_zero();
        self.summary_period = period;
    }

    #[inline]
    pub fn record_transition(&mut self, phase: TickPhase) {
        self.transitions[phase.index()] += 1;
    }

    #[inline]
    pub fn record_host_failure(&mut self) {
        self.host_failures += 1;
    }

    #[inline]
    pub fn record_scope(&mut self, phase: TickPhase, dur: Duration) {
        self.phase_time[phase.index()] += dur;
    }

    /// Transitions performed by `phase` since startup.
    #[inline]
    pub fn transitions(&self, phase: TickPhase) -> u64 {
        self.transitions[phase.index()]
    }

    /// Cumulative time spent in `phase`.
    #[inline]
    pub fn phase_time(&self, phase: TickPhase) -> Duration {
        self.phase_time[phase.index()]
    }

    /// `Expire=0.4ms Promote=0.1ms Launch=1.2ms`, cumulative per phase.
    pub fn phase_summary(&self) -> String {
        TickPhase::ALL
            .iter()
            .map(|p| format!("{}={:.1}ms", p.as_str(), self.phase_time(*p).as_secs_f64() * 1000.0))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn tick_finished(&mut self, dur: Duration, interval: Duration, sizes: ListSizes) {
        self.ticks += 1;
        self.last_tick = dur;

        if dur > interval {
            self.overruns += 1;
            warn!(
                "tick overran interval: took={:.1}ms interval={}ms (host calls too slow?)",
                dur.as_secs_f64() * 1000.0,
                interval.as_millis()
            );
        }

        if !self.summary_enabled || self.summary_last.elapsed() < self.summary_period {
            return;
        }

        info!(
            "ticks={} wait={} start={} run={} expired={} promoted={} launched={} overruns={} host_failures={} last_tick_ms={:.2} phases: {}",
            self.ticks,
            sizes.waiting,
            sizes.starting,
            sizes.running,
            self.transitions(TickPhase::Expire),
            self.transitions(TickPhase::Promote),
            self.transitions(TickPhase::Launch),
            self.overruns,
            self.host_failures,
            self.last_tick.as_secs_f64() * 1000.0,
            self.phase_summary(),
        );
        self.summary_last = Instant::now();
    }
}

impl Default for TickTelemetry {
    fn default() -> Self {
        Self::new()
    }
}
