mod host;

use std::time::Duration;

use anyhow::{Context, Result};
use lifetime_core::{
    fresh_client_name,
    log::{init_console_logger, ConsoleLoggerConfig},
    ClientDescriptor, Clock, CoordinatorConfig, ExitSignal, LifetimeHost, LifetimeScheduler,
    SystemClock, Timestamp,
};
use log::{info, warn};

use crate::host::CommandHost;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut cfg = match config_path(&args) {
        Some(path) => CoordinatorConfig::load_toml(path)
            .with_context(|| format!("loading coordinator config '{path}'"))?,
        None => CoordinatorConfig::default(),
    };
    let overrides = cfg.lifetime.apply_args(&args)?;

    init_console_logger(&ConsoleLoggerConfig::resolve(&cfg.log))?;
    info!("coordinator boot: {overrides} lifetime option(s) from arguments");

    let exit = ExitSignal::new();
    exit.install_ctrlc_handler()?;

    let clock = SystemClock::new();
    let clients = initial_clients(&cfg, clock.now());
    let host = CommandHost::from_config(&cfg.host);
    if host.is_none() {
        warn!("no [host] program configured, running dry");
    }

    match LifetimeScheduler::from_config(&cfg.lifetime)? {
        Some(scheduler) => {
            let mut scheduler = scheduler.with_clock(clock);
            if let Some(host) = host {
                scheduler.set_host(host);
            }
            for c in clients {
                scheduler.add_client(c);
            }
            scheduler.run(&exit);
        }
        None => {
            info!("lifetime management disabled (no positive max_lifetime)");
            run_unmanaged(host, clients, &clock, &exit);
        }
    }

    info!("shutdown");
    Ok(())
}

fn config_path(args: &[String]) -> Option<&str> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == "--config" {
            return it.next().map(String::as_str);
        }
        if let Some(p) = a.strip_prefix("--config=") {
            return Some(p);
        }
    }
    None
}

/// Staggered initial population, one fresh identity per client.
fn initial_clients(cfg: &CoordinatorConfig, now: Timestamp) -> Vec<ClientDescriptor> {
    let stagger = Duration::from_secs(cfg.clients.start_interval_secs);
    (0..cfg.clients.count)
        .map(|i| {
            ClientDescriptor::new(
                fresh_client_name(&cfg.lifetime.identity_prefix),
                cfg.clients.auth_token.clone(),
                cfg.clients.target_deployment.clone(),
                now + stagger * i,
            )
        })
        .collect()
}

/// Without lifetime management every client is started once and left alone.
fn run_unmanaged(
    mut host: Option<CommandHost>,
    clients: Vec<ClientDescriptor>,
    clock: &SystemClock,
    exit: &ExitSignal,
) {
    for c in &clients {
        if exit.wait_timeout(c.start_at().saturating_since(clock.now())) {
            return;
        }
        if let Some(host) = host.as_mut() {
            if let Err(e) = host.start_client(c) {
                warn!("host start failed for {}: {e}", c.name());
            }
        }
        info!("started client {c}");
    }

    while !exit.wait_timeout(Duration::from_secs(1)) {}
}
