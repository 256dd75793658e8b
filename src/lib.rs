pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use core::controller::{FormSettings, SubmissionController};
pub use core::display::DisplayState;
pub use core::location::{LocationSession, LocationStatus};
pub use core::submit_error::SubmitError;
pub use utils::error::{LeadError, Result};
