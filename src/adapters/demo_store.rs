use crate::adapters::clock::SystemClock;
use crate::adapters::supabase::MISSING_FIELDS_MESSAGE;
use crate::domain::model::{PersistOutcome, StoredLead, SubmissionRecord};
use crate::domain::ports::{Clock, LeadStore};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};

/// Stand-in store used until a real database is configured; it logs the payload and
/// pretends the insert succeeded.
#[derive(Debug, Clone, Default)]
pub struct DemoLeadStore<C: Clock = SystemClock> {
    clock: C,
}

impl<C: Clock> DemoLeadStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl<C: Clock> LeadStore for DemoLeadStore<C> {
    async fn submit(&self, record: &SubmissionRecord) -> Result<PersistOutcome> {
        if !record.has_required_fields() {
            return Ok(PersistOutcome::Rejected {
                reason: MISSING_FIELDS_MESSAGE.to_string(),
            });
        }

        tracing::warn!("[DEV] Lead store is not configured, simulating a successful insert");
        tracing::info!("[DEV] Payload: {}", serde_json::to_string(record)?);

        let now = self.clock.now_ms();
        Ok(PersistOutcome::Accepted(StoredLead {
            id: format!("demo-{}", now),
            created_at: Utc.timestamp_millis_opt(now).single(),
            status: record.status,
        }))
    }
}
