use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{CoordinatorError, CoordinatorResult};

pub const MAX_LIFETIME_ARG: &str = "max_lifetime";
pub const MIN_LIFETIME_ARG: &str = "min_lifetime";
pub const USE_NEW_SIMULATED_PLAYER_ARG: &str = "use_new_simulated_player";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    #[serde(default)]
    pub lifetime: LifetimeConfig,
    #[serde(default)]
    pub clients: ClientsConfig,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl CoordinatorConfig {
    pub fn load_toml(path: impl AsRef<Path>) -> CoordinatorResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CoordinatorError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| CoordinatorError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// How a client leaves the starting list.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionPolicy {
    /// Promote after exactly one tick in starting, whatever the process does.
    #[default]
    Unconditional,
    /// Promote only once the host reports a clean exit of the launched
    /// process; a failed exit sends the client back to waiting.
    HealthGated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifetimeConfig {
    /// Minutes. Zero or negative disables lifetime management.
    #[serde(default)]
    pub max_lifetime: i64,
    /// Minutes. Falls back to `max_lifetime` (fixed lifetime).
    #[serde(default)]
    pub min_lifetime: Option<i64>,
    /// Integer flag, > 0 means restart under a fresh name.
    #[serde(default)]
    pub use_new_simulated_player: i64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,
    #[serde(default)]
    pub promotion: PromotionPolicy,
    #[serde(default = "default_identity_prefix")]
    pub identity_prefix: String,
    /// Period of the telemetry summary line. Zero turns it off.
    #[serde(default = "default_stats_period_secs")]
    pub stats_period_secs: u64,
}

fn default_tick_interval_ms() -> u64 { 1000 }
fn default_restart_delay_secs() -> u64 { 10 }
fn default_identity_prefix() -> String { "SimulatedPlayer".to_string() }
fn default_stats_period_secs() -> u64 { 30 }

impl Default for LifetimeConfig {
    fn default() -> Self {
        Self {
            max_lifetime: 0,
            min_lifetime: None,
            use_new_simulated_player: 0,
            tick_interval_ms: default_tick_interval_ms(),
            restart_delay_secs: default_restart_delay_secs(),
            promotion: PromotionPolicy::default(),
            identity_prefix: default_identity_prefix(),
            stats_period_secs: default_stats_period_secs(),
        }
    }
}

impl LifetimeConfig {
    #[inline]
    pub fn enabled(&self) -> bool {
        self.max_lifetime > 0
    }

    #[inline]
    pub fn effective_min_lifetime(&self) -> i64 {
        self.min_lifetime.unwrap_or(self.max_lifetime)
    }

    #[inline]
    pub fn use_new_simulated_player(&self) -> bool {
        self.use_new_simulated_player > 0
    }

    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    #[inline]
    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    /// Applies CLI-style overrides for the three lifetime options.
    ///
    /// Accepts `--key value`, `--key=value` and `key=value`. Unknown arguments
    /// are skipped. Returns how many recognized options were applied.
    pub fn apply_args<S: AsRef<str>>(&mut self, args: &[S]) -> CoordinatorResult<usize> {
        let mut applied = 0usize;
        let mut i = 0usize;

        while i < args.len() {
            let raw = args[i].as_ref();
            i += 1;

            let flag = raw.starts_with('-');
            let body = raw.trim_start_matches('-');
            let (key, inline) = match body.split_once('=') {
                Some((k, v)) => (k, Some(v)),
                None => (body, None),
            };

            let Some(key) = recognized_key(key) else { continue };

            let value = match inline {
                Some(v) => v,
                None if flag => {
                    let Some(next) = args.get(i) else {
                        return Err(CoordinatorError::MissingArgumentValue(key));
                    };
                    i += 1;
                    next.as_ref()
                }
                None => continue,
            };

            let parsed: i64 = value.trim().parse().map_err(|_| CoordinatorError::InvalidArgument {
                key,
                value: value.to_string(),
            })?;

            match key {
                MAX_LIFETIME_ARG => self.max_lifetime = parsed,
                MIN_LIFETIME_ARG => self.min_lifetime = Some(parsed),
                _ => self.use_new_simulated_player = parsed,
            }
            applied += 1;
        }

        Ok(applied)
    }
}

fn recognized_key(key: &str) -> Option<&'static str> {
    [MAX_LIFETIME_ARG, MIN_LIFETIME_ARG, USE_NEW_SIMULATED_PLAYER_ARG]
        .into_iter()
        .find(|k| *k == key)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientsConfig {
    #[serde(default = "default_client_count")]
    pub count: u32,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub target_deployment: String,
    /// Stagger between the initial start of consecutive clients.
    #[serde(default = "default_start_interval_secs")]
    pub start_interval_secs: u64,
}

fn default_client_count() -> u32 { 1 }
fn default_start_interval_secs() -> u64 { 1 }

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            count: default_client_count(),
            auth_token: String::new(),
            target_deployment: String::new(),
            start_interval_secs: default_start_interval_secs(),
        }
    }
}

/// Process launched per client. No program means dry run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub program: Option<String>,
    /// `{name}`, `{auth_token}` and `{target_deployment}` are substituted.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Overridden by the `COORDINATOR_LOG*` environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub colors: Option<bool>,
    #[serde(default)]
    pub include_module: Option<bool>,
}
