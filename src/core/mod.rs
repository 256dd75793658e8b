pub mod controller;
pub mod display;
pub mod guard;
pub mod location;
pub mod submit_error;
pub mod validation;

pub use crate::domain::model::{
    BusinessId, City, Coordinates, Field, FormDraft, LeadStatus, PersistOutcome,
    ResolvedLocation, StoredLead, SubmissionRecord,
};
pub use crate::domain::ports::{Clock, DeviceLocator, Geocoder, LeadStore, LocalMemory, PositionOptions};
pub use crate::utils::error::Result;
