use crate::domain::model::{PersistOutcome, StoredLead, SubmissionRecord};
use crate::domain::ports::LeadStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const MISSING_FIELDS_MESSAGE: &str = "Required fields are missing.";
pub const UNCONFIRMED_LEAD_ID: &str = "unconfirmed";
pub const DATABASE_FAILURE_MESSAGE: &str = "Saving to the database failed. Please try again.";

/// Lead store writing to a Supabase (PostgREST) table, `leads` by default.
///
/// Row level security is expected to allow anonymous inserts only, so the anon key is
/// enough here.
#[derive(Debug, Clone)]
pub struct SupabaseLeadStore {
    base_url: String,
    anon_key: String,
    table: String,
    client: Client,
}

impl SupabaseLeadStore {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        table: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            table: table.into(),
            client,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

#[async_trait]
impl LeadStore for SupabaseLeadStore {
    async fn submit(&self, record: &SubmissionRecord) -> Result<PersistOutcome> {
        if !record.has_required_fields() {
            return Ok(PersistOutcome::Rejected {
                reason: MISSING_FIELDS_MESSAGE.to_string(),
            });
        }

        let url = self.table_url();
        tracing::debug!("Inserting lead into {}", url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Prefer", "return=representation")
            .json(&[record])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("❌ Supabase insert failed ({}): {}", status, body);
            return Ok(PersistOutcome::Rejected {
                reason: DATABASE_FAILURE_MESSAGE.to_string(),
            });
        }

        // 2xx 代表資料列已寫入；回傳內容讀不懂時仍視為成功，避免重送造成重複
        let body = response.text().await.unwrap_or_default();
        let lead = match serde_json::from_str::<Vec<StoredLead>>(&body) {
            Ok(mut rows) if !rows.is_empty() => rows.swap_remove(0),
            Ok(_) => {
                tracing::warn!("⚠️ Supabase insert returned no rows, using a placeholder lead");
                unconfirmed_lead(record)
            }
            Err(e) => {
                tracing::warn!("⚠️ Could not decode Supabase insert response: {}", e);
                unconfirmed_lead(record)
            }
        };
        tracing::debug!("Supabase stored lead {}", lead.id);
        Ok(PersistOutcome::Accepted(lead))
    }
}

/// Stands in for the stored row when the insert succeeded but the row was not returned.
fn unconfirmed_lead(record: &SubmissionRecord) -> StoredLead {
    StoredLead {
        id: UNCONFIRMED_LEAD_ID.to_string(),
        created_at: None,
        status: record.status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{BusinessId, Field, FormDraft, LeadStatus, ResolvedLocation};
    use crate::utils::error::LeadError;
    use httpmock::prelude::*;

    fn record() -> SubmissionRecord {
        let mut draft = FormDraft::new();
        draft.set(Field::Title, "Roof repair");
        draft.set(Field::Description, "Leak near chimney");
        draft.set(Field::ContactName, "Anna");
        SubmissionRecord::from_draft(
            &draft,
            &BusinessId::new("3f2504e0-4f89-41d3-9a0c-0305e82c3301"),
            &ResolvedLocation::None,
            false,
        )
    }

    fn store(server: &MockServer) -> SupabaseLeadStore {
        SupabaseLeadStore::new(server.base_url(), "anon-key", "leads", Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_returns_stored_row() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/leads")
                .header("apikey", "anon-key")
                .header("authorization", "Bearer anon-key")
                .header("prefer", "return=representation")
                .body_contains("\"status\":\"new\"")
                .body_contains("\"name\":\"Anna\"");
            then.status(201)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([{
                    "id": "6a1f0c2e-0000-4000-8000-000000000001",
                    "created_at": "2026-10-18T09:30:00+00:00",
                    "status": "new",
                    "title": "Roof repair"
                }]));
        });

        let outcome = store(&server).submit(&record()).await.unwrap();

        api_mock.assert();
        match outcome {
            PersistOutcome::Accepted(lead) => {
                assert_eq!(lead.id, "6a1f0c2e-0000-4000-8000-000000000001");
                assert_eq!(lead.status, LeadStatus::New);
                assert!(lead.created_at.is_some());
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_database_error_is_a_rejection() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/rest/v1/leads");
            then.status(400)
                .json_body(serde_json::json!({"message": "violates check constraint"}));
        });

        let outcome = store(&server).submit(&record()).await.unwrap();
        assert_eq!(
            outcome,
            PersistOutcome::Rejected {
                reason: DATABASE_FAILURE_MESSAGE.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_fields_are_rejected_without_request() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/rest/v1/leads");
            then.status(201);
        });

        let mut incomplete = record();
        incomplete.title.clear();

        let outcome = store(&server).submit(&incomplete).await.unwrap();
        assert_eq!(
            outcome,
            PersistOutcome::Rejected {
                reason: MISSING_FIELDS_MESSAGE.to_string()
            }
        );
        api_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_success_with_unreadable_body_is_still_accepted() {
        for body in ["<html>ok</html>", "[]", ""] {
            let server = MockServer::start();
            let api_mock = server.mock(|when, then| {
                when.method(POST).path("/rest/v1/leads");
                then.status(201).body(body);
            });

            let outcome = store(&server).submit(&record()).await.unwrap();

            api_mock.assert();
            assert_eq!(
                outcome,
                PersistOutcome::Accepted(StoredLead {
                    id: UNCONFIRMED_LEAD_ID.to_string(),
                    created_at: None,
                    status: LeadStatus::New,
                }),
                "body: {:?}",
                body
            );
        }
    }

    #[tokio::test]
    async fn test_unreachable_store_is_an_error() {
        let store = SupabaseLeadStore::new(
            "http://127.0.0.1:9",
            "anon-key",
            "leads",
            Duration::from_millis(500),
        )
        .unwrap();
        assert!(matches!(
            store.submit(&record()).await,
            Err(LeadError::ApiError(_))
        ));
    }
}
