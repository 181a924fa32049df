use std::time::Duration;

use lifetime_core::{
    ClientDescriptor, LifetimeConfig, LifetimeScheduler, ManualClock, Timestamp,
};
use rand::{rngs::StdRng, SeedableRng};

#[test]
fn client_cycles_back_to_waiting_under_fresh_identity() {
    let cfg = LifetimeConfig {
        max_lifetime: 8,
        min_lifetime: Some(2),
        use_new_simulated_player: 1,
        tick_interval_ms: 1000,
        stats_period_secs: 0,
        ..LifetimeConfig::default()
    };

    let clock = ManualClock::new(Timestamp::from_millis(1_000_000));
    let mut scheduler = LifetimeScheduler::from_config(&cfg)
        .unwrap()
        .expect("max_lifetime > 0 enables the scheduler")
        .with_clock(clock.clone())
        .with_rng(StdRng::seed_from_u64(2024));

    let t0 = scheduler.now();
    scheduler.add_client(ClientDescriptor::new("SimulatedPlayer-a", "dev-token", "sim_deployment", t0));

    let mut promoted_at = None;
    for _ in 0..3 {
        scheduler.tick();
        if promoted_at.is_none() && !scheduler.running().is_empty() {
            promoted_at = Some(scheduler.now());
        }
        clock.advance(scheduler.tick_interval());
    }

    assert_eq!(scheduler.running().len(), 1);
    let promoted_at = promoted_at.unwrap();
    let running = scheduler.running()[0].clone();
    let end_at = running.end_at().unwrap();
    assert!(end_at >= promoted_at + Duration::from_secs(2 * 60));
    assert!(end_at < promoted_at + Duration::from_secs(8 * 60));

    // jump past the end of the lifetime
    clock.set(end_at + Duration::from_millis(1));
    let expiry = scheduler.now();
    scheduler.tick();

    assert!(scheduler.running().is_empty());
    assert!(scheduler.starting().is_empty());
    assert_eq!(scheduler.waiting().len(), 1);

    let restarted = &scheduler.waiting()[0];
    assert_ne!(restarted.name(), running.name());
    assert!(restarted.name().starts_with("SimulatedPlayer"));
    assert_eq!(restarted.start_at(), expiry + Duration::from_secs(10));
    assert_eq!(restarted.auth_token(), "dev-token");
    assert_eq!(restarted.target_deployment(), "sim_deployment");

    // relaunched once the restart delay has elapsed, not before
    clock.advance(Duration::from_secs(9));
    scheduler.tick();
    assert_eq!(scheduler.waiting().len(), 1);

    clock.advance(Duration::from_secs(1));
    scheduler.tick();
    assert_eq!(scheduler.starting().len(), 1);
}
