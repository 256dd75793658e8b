use crate::domain::model::{Coordinates, PersistOutcome, SubmissionRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Free-text address to coordinates. Failures are reported as `None`, never as errors.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &str) -> Option<Coordinates>;
}

/// Durable storage for accepted submissions.
///
/// `Ok(PersistOutcome::Rejected)` covers expected failures (validation, database refusal);
/// `Err` is reserved for anything unexpected and is downgraded by the caller.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn submit(&self, record: &SubmissionRecord) -> Result<PersistOutcome>;
}

/// Device-local key-value memory. Both operations may fail; callers must not propagate that.
pub trait LocalMemory: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(60),
        }
    }
}

/// 裝置定位，對應瀏覽器的 geolocation API
#[async_trait]
pub trait DeviceLocator: Send + Sync {
    async fn current_position(&self, options: &PositionOptions) -> Result<Coordinates>;
}

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

#[async_trait]
impl<T: Geocoder + ?Sized> Geocoder for Arc<T> {
    async fn resolve(&self, address: &str) -> Option<Coordinates> {
        (**self).resolve(address).await
    }
}

#[async_trait]
impl<T: LeadStore + ?Sized> LeadStore for Arc<T> {
    async fn submit(&self, record: &SubmissionRecord) -> Result<PersistOutcome> {
        (**self).submit(record).await
    }
}

impl<T: LocalMemory + ?Sized> LocalMemory for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}
