use std::time::Duration;

use rand::Rng;

use crate::{
    config::LifetimeConfig,
    error::{CoordinatorError, CoordinatorResult},
};

/// Whole-minute range a running client's lifetime is drawn from: `[min, max)`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LifetimeBounds {
    min_minutes: u32,
    max_minutes: u32,
}

impl LifetimeBounds {
    pub fn new(min_minutes: i64, max_minutes: i64) -> CoordinatorResult<Self> {
        let invalid = || CoordinatorError::InvalidLifetimeBounds { min: min_minutes, max: max_minutes };

        let min = u32::try_from(min_minutes).map_err(|_| invalid())?;
        let max = u32::try_from(max_minutes).map_err(|_| invalid())?;
        if max == 0 || min > max {
            return Err(invalid());
        }

        Ok(Self { min_minutes: min, max_minutes: max })
    }

    /// `None` when the config leaves lifetime management off.
    pub fn from_config(cfg: &LifetimeConfig) -> CoordinatorResult<Option<Self>> {
        if !cfg.enabled() {
            return Ok(None);
        }
        Self::new(cfg.effective_min_lifetime(), cfg.max_lifetime).map(Some)
    }

    #[inline]
    pub fn min_minutes(&self) -> u32 {
        self.min_minutes
    }

    #[inline]
    pub fn max_minutes(&self) -> u32 {
        self.max_minutes
    }

    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.min_minutes == self.max_minutes
    }

    pub fn draw<R: Rng>(&self, rng: &mut R) -> Duration {
        let minutes = if self.is_fixed() {
            self.min_minutes
        } else {
            rng.gen_range(self.min_minutes..self.max_minutes)
        };
        Duration::from_secs(u64::from(minutes) * 60)
    }
}
