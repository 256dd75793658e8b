use crate::adapters::clock::SystemClock;
use crate::domain::model::Coordinates;
use crate::domain::ports::{Clock, DeviceLocator, PositionOptions};
use crate::utils::error::{LeadError, Result};
use async_trait::async_trait;

/// A device without any positioning support.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLocator;

#[async_trait]
impl DeviceLocator for UnavailableLocator {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Coordinates> {
        Err(LeadError::LocationError {
            message: "geolocation is not supported on this device".to_string(),
        })
    }
}

/// A known fix taken at `captured_at_ms`, e.g. from `--gps lat,lng`.
/// Fixes older than the request's `maximum_age` are refused.
#[derive(Debug, Clone)]
pub struct FixedLocator<C: Clock = SystemClock> {
    fix: Coordinates,
    captured_at_ms: i64,
    clock: C,
}

impl FixedLocator<SystemClock> {
    pub fn fresh(fix: Coordinates) -> Self {
        Self::with_clock(fix, SystemClock.now_ms(), SystemClock)
    }
}

impl<C: Clock> FixedLocator<C> {
    pub fn with_clock(fix: Coordinates, captured_at_ms: i64, clock: C) -> Self {
        Self {
            fix,
            captured_at_ms,
            clock,
        }
    }
}

#[async_trait]
impl<C: Clock> DeviceLocator for FixedLocator<C> {
    async fn current_position(&self, options: &PositionOptions) -> Result<Coordinates> {
        let age_ms = self.clock.now_ms().saturating_sub(self.captured_at_ms);
        let max_age_ms = i64::try_from(options.maximum_age.as_millis()).unwrap_or(i64::MAX);
        if age_ms > max_age_ms {
            return Err(LeadError::LocationError {
                message: format!("cached fix is {} ms old (max {} ms)", age_ms, max_age_ms),
            });
        }
        Ok(self.fix)
    }
}
