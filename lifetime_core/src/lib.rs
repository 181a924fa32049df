//! Lifetime scheduler for simulated load-test clients.
//!
//! Clients cycle waiting -> starting -> running -> waiting. A host
//! capability does the real process work; the scheduler only keeps the books.

pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod lifetime;
pub mod log;
pub mod phase;
pub mod scheduler;
pub mod signals;
pub mod telemetry;
pub mod time;

pub use client::{fresh_client_name, ClientDescriptor};
pub use config::{CoordinatorConfig, LifetimeConfig, PromotionPolicy};
pub use error::{CoordinatorError, CoordinatorResult, HostError};
pub use host::{LifetimeHost, ProcessStatus};
pub use scheduler::LifetimeScheduler;
pub use signals::ExitSignal;
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
