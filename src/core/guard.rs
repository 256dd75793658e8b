use crate::core::submit_error::SubmitError;
use crate::domain::model::FormDraft;
use crate::domain::ports::LocalMemory;

pub const RATE_LIMIT_STORAGE_KEY: &str = "quoteFlow:lastSubmitAt";
pub const DEFAULT_RATE_LIMIT_WINDOW_MS: i64 = 10_000;

/// Last accepted submission time, kept in device-local memory.
///
/// Reads and writes never fail the caller: an unavailable memory behaves like
/// "no prior submission" and a failed write is only logged.
pub struct RateLimitMemory<M: LocalMemory> {
    memory: M,
    key: String,
}

impl<M: LocalMemory> RateLimitMemory<M> {
    pub fn new(memory: M, key: impl Into<String>) -> Self {
        Self {
            memory,
            key: key.into(),
        }
    }

    pub fn last_accepted_at(&self) -> Option<i64> {
        match self.memory.get(&self.key) {
            Ok(Some(raw)) => match raw.trim().parse::<i64>() {
                Ok(ts) if ts > 0 => Some(ts),
                Ok(_) => None,
                Err(_) => {
                    tracing::debug!("Ignoring unreadable rate limit value: {:?}", raw);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("⚠️ Local memory unavailable, skipping rate limit: {}", e);
                None
            }
        }
    }

    pub fn record_accepted(&self, timestamp_ms: i64) {
        if let Err(e) = self.memory.set(&self.key, &timestamp_ms.to_string()) {
            // 寫入失敗時就不記錄速率限制
            tracing::warn!("⚠️ Could not remember submission time: {}", e);
        }
    }
}

pub fn check_honeypot(draft: &FormDraft) -> Result<(), SubmitError> {
    if draft.honeypot.trim().is_empty() {
        Ok(())
    } else {
        Err(SubmitError::AbuseSuspected)
    }
}

pub fn check_rate_limit(
    last_accepted_at: Option<i64>,
    now_ms: i64,
    window_ms: i64,
) -> Result<(), SubmitError> {
    let Some(last) = last_accepted_at else {
        return Ok(());
    };

    let elapsed = now_ms.saturating_sub(last);
    if elapsed < window_ms {
        let remaining = window_ms.saturating_sub(elapsed);
        // ceil(remaining / 1000)，remaining 必為正數
        let seconds_left = remaining.saturating_add(999) / 1000;
        return Err(SubmitError::RateLimited { seconds_left });
    }

    Ok(())
}

/// Honeypot first, then rate limit; both run before any field validation.
/// `last_accepted_at` is only consulted once the honeypot passed, so a bot
/// submission never touches local memory.
pub fn run_guards<F>(
    draft: &FormDraft,
    last_accepted_at: F,
    now_ms: i64,
    window_ms: i64,
) -> Result<(), SubmitError>
where
    F: FnOnce() -> Option<i64>,
{
    check_honeypot(draft)?;
    check_rate_limit(last_accepted_at(), now_ms, window_ms)
}
