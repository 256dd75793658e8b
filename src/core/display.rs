use crate::domain::model::StoredLead;

/// What the visitor sees: the editable form, a pending submit, or one of the two result views.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DisplayState {
    #[default]
    Editing,
    Submitting,
    Success { lead: StoredLead },
    Error { message: String },
}

impl DisplayState {
    pub fn name(&self) -> &'static str {
        match self {
            DisplayState::Editing => "editing",
            DisplayState::Submitting => "submitting",
            DisplayState::Success { .. } => "success",
            DisplayState::Error { .. } => "error",
        }
    }

    pub fn can_transition_to(&self, next: &DisplayState) -> bool {
        matches!(
            (self, next),
            (DisplayState::Editing, DisplayState::Submitting)
                | (DisplayState::Submitting, DisplayState::Editing)
                | (DisplayState::Submitting, DisplayState::Success { .. })
                | (DisplayState::Submitting, DisplayState::Error { .. })
                | (DisplayState::Success { .. }, DisplayState::Editing)
                | (DisplayState::Error { .. }, DisplayState::Editing)
        )
    }

    /// Applies `next` if the transition is allowed; returns whether it was applied.
    pub fn transition(&mut self, next: DisplayState) -> bool {
        if !self.can_transition_to(&next) {
            tracing::warn!(
                "Ignoring display transition {} -> {}",
                self.name(),
                next.name()
            );
            return false;
        }
        tracing::debug!("Display state {} -> {}", self.name(), next.name());
        *self = next;
        true
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            DisplayState::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DisplayState::Success { .. } | DisplayState::Error { .. })
    }
}
