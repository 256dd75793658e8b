use crate::core::display::DisplayState;
use crate::core::guard::{self, RateLimitMemory, DEFAULT_RATE_LIMIT_WINDOW_MS, RATE_LIMIT_STORAGE_KEY};
use crate::core::location::{self, default_cities, LocationSession};
use crate::core::submit_error::{
    SubmitError, GENERIC_PERSISTENCE_MESSAGE, UNEXPECTED_FAILURE_MESSAGE,
};
use crate::core::validation::{self, FieldErrors, FieldSet};
use crate::domain::model::{
    BusinessId, City, Field, FormDraft, PersistOutcome, StoredLead, SubmissionRecord,
};
use crate::domain::ports::{Clock, Geocoder, LeadStore, LocalMemory, PositionOptions};

pub const REQUIRED_FIELDS_HINT: &str = "Fill in all required fields to continue.";
pub const INVALID_BUSINESS_ID_HINT: &str = "Business ID is not a valid UUID.";

#[derive(Debug, Clone, PartialEq)]
pub struct FormSettings {
    pub require_email: bool,
    pub check_business_id: bool,
    pub rate_limit_window_ms: i64,
    pub rate_limit_key: String,
    pub position: PositionOptions,
    pub cities: Vec<City>,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            require_email: true,
            check_business_id: true,
            rate_limit_window_ms: DEFAULT_RATE_LIMIT_WINDOW_MS,
            rate_limit_key: RATE_LIMIT_STORAGE_KEY.to_string(),
            position: PositionOptions::default(),
            cities: default_cities(),
        }
    }
}

impl FormSettings {
    pub fn field_set(&self) -> FieldSet {
        FieldSet {
            require_email: self.require_email,
        }
    }
}

/// Drives one form instance from editing to a success or error view.
///
/// Every async operation takes `&mut self`, so one instance never has two
/// submissions in flight.
pub struct SubmissionController<G, S, M, C>
where
    G: Geocoder,
    S: LeadStore,
    M: LocalMemory,
    C: Clock,
{
    business_id: BusinessId,
    settings: FormSettings,
    draft: FormDraft,
    submit_attempted: bool,
    display: DisplayState,
    location: LocationSession,
    geocoder: G,
    store: S,
    rate_limit: RateLimitMemory<M>,
    clock: C,
}

impl<G, S, M, C> SubmissionController<G, S, M, C>
where
    G: Geocoder,
    S: LeadStore,
    M: LocalMemory,
    C: Clock,
{
    pub fn new(
        business_id: BusinessId,
        settings: FormSettings,
        geocoder: G,
        store: S,
        memory: M,
        clock: C,
    ) -> Self {
        let location = LocationSession::new(settings.cities.clone(), settings.position);
        let rate_limit = RateLimitMemory::new(memory, settings.rate_limit_key.clone());
        Self {
            business_id,
            settings,
            draft: FormDraft::new(),
            submit_attempted: false,
            display: DisplayState::Editing,
            location,
            geocoder,
            store,
            rate_limit,
            clock,
        }
    }

    pub fn business_id(&self) -> &BusinessId {
        &self.business_id
    }

    pub fn settings(&self) -> &FormSettings {
        &self.settings
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn display_state(&self) -> &DisplayState {
        &self.display
    }

    pub fn location(&self) -> &LocationSession {
        &self.location
    }

    pub fn location_mut(&mut self) -> &mut LocationSession {
        &mut self.location
    }

    pub fn submit_attempted(&self) -> bool {
        self.submit_attempted
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.draft.set(field, value);
    }

    pub fn blur(&mut self, field: Field) {
        self.draft.mark_touched(field);
    }

    pub fn field_errors(&self) -> FieldErrors {
        validation::validate(&self.draft, &self.settings.field_set())
    }

    pub fn is_form_valid(&self) -> bool {
        self.field_errors().is_empty()
    }

    /// 錯誤一律即時計算，但只有欄位失焦過或已嘗試送出後才顯示
    pub fn visible_error(&self, field: Field) -> Option<&'static str> {
        if !self.draft.is_touched(field) && !self.submit_attempted {
            return None;
        }
        self.field_errors().get(field)
    }

    pub fn is_business_id_acceptable(&self) -> bool {
        !self.settings.check_business_id || self.business_id.is_valid_uuid()
    }

    pub fn submit_enabled(&self) -> bool {
        matches!(self.display, DisplayState::Editing)
            && self.is_form_valid()
            && self.is_business_id_acceptable()
            && !self.location.is_requesting()
    }

    pub fn form_hint(&self) -> Option<&'static str> {
        if !self.is_form_valid() && self.submit_attempted {
            Some(REQUIRED_FIELDS_HINT)
        } else if !self.is_business_id_acceptable() {
            Some(INVALID_BUSINESS_ID_HINT)
        } else {
            None
        }
    }

    /// Runs one submission attempt through guards, validation, location
    /// resolution and persistence, in that order.
    pub async fn submit(&mut self) -> Result<StoredLead, SubmitError> {
        if !matches!(self.display, DisplayState::Editing) || self.location.is_requesting() {
            tracing::debug!(
                "Submit ignored (display: {}, location: {})",
                self.display.name(),
                self.location.status()
            );
            return Err(SubmitError::Busy);
        }

        self.submit_attempted = true;
        self.display.transition(DisplayState::Submitting);

        // 快照：之後的 await 期間草稿不會影響這次送出
        let snapshot = self.draft.clone();
        let now = self.clock.now_ms();

        let rate_limit = &self.rate_limit;
        if let Err(e) = guard::run_guards(
            &snapshot,
            || rate_limit.last_accepted_at(),
            now,
            self.settings.rate_limit_window_ms,
        ) {
            tracing::info!("🛑 Submission rejected by guard: {:?}", e);
            return Err(self.fail(e));
        }

        let errors = validation::validate(&snapshot, &self.settings.field_set());
        if !errors.is_empty() {
            tracing::debug!("Submission blocked, invalid fields: {}", errors);
            self.display.transition(DisplayState::Editing);
            return Err(SubmitError::ValidationFailed(errors));
        }

        if !self.is_business_id_acceptable() {
            tracing::warn!("🛑 Invalid business id: {}", self.business_id);
            return Err(self.fail(SubmitError::InvalidBusinessIdentifier));
        }

        let strategies = self.location.strategies(&snapshot.address);
        let resolved = location::resolve_location(strategies, &self.geocoder).await;
        tracing::debug!("Location resolved from {}", resolved.source());

        let record = SubmissionRecord::from_draft(
            &snapshot,
            &self.business_id,
            &resolved,
            self.settings.require_email,
        );

        let outcome = self.store.submit(&record).await;
        match outcome {
            Ok(PersistOutcome::Accepted(lead)) => {
                tracing::info!("✅ Quote request stored: {}", lead.id);
                self.rate_limit.record_accepted(now);
                self.display.transition(DisplayState::Success { lead: lead.clone() });
                Ok(lead)
            }
            Ok(PersistOutcome::Rejected { reason }) => {
                tracing::warn!("❌ Lead store rejected submission: {}", reason);
                let reason = if reason.trim().is_empty() {
                    GENERIC_PERSISTENCE_MESSAGE.to_string()
                } else {
                    reason
                };
                Err(self.fail(SubmitError::PersistenceFailed { reason }))
            }
            Err(e) => {
                tracing::error!(
                    "❌ Unexpected error while storing submission: {} (Category: {:?})",
                    e,
                    e.category()
                );
                Err(self.fail(SubmitError::PersistenceFailed {
                    reason: UNEXPECTED_FAILURE_MESSAGE.to_string(),
                }))
            }
        }
    }

    /// Back to the editable form; entered values are kept.
    pub fn return_to_form(&mut self) {
        if self.display.is_terminal() {
            self.display.transition(DisplayState::Editing);
        }
    }

    /// Discards the draft and location choices for a fresh request.
    pub fn start_new_draft(&mut self) {
        if matches!(self.display, DisplayState::Submitting) {
            return;
        }
        self.return_to_form();
        self.draft = FormDraft::new();
        self.submit_attempted = false;
        self.location = LocationSession::new(self.settings.cities.clone(), self.settings.position);
    }

    fn fail(&mut self, error: SubmitError) -> SubmitError {
        self.display.transition(DisplayState::Error {
            message: error.to_string(),
        });
        error
    }
}
