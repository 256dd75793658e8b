use crate::domain::model::{BusinessId, Coordinates, Field};
use crate::utils::error::{LeadError, Result};
use crate::utils::validation::{validate_range, Validate};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "lead-intake")]
#[command(about = "Submit a quote request to a business, the way the public form does")]
pub struct CliConfig {
    /// Business identifier (UUID) the request is addressed to
    #[arg(long)]
    pub business_id: Option<String>,

    /// Form route such as /form/<business-id>; used when --business-id is absent
    #[arg(long)]
    pub route: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, default_value = "")]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value = "")]
    pub name: String,

    #[arg(long, default_value = "")]
    pub email: String,

    #[arg(long, default_value = "")]
    pub phone: String,

    #[arg(long, default_value = "")]
    pub address: String,

    #[arg(long, default_value = "", hide = true)]
    pub honeypot: String,

    /// Device GPS fix as "lat,lng"
    #[arg(long)]
    pub gps: Option<String>,

    /// Age of the --gps fix in milliseconds
    #[arg(long, default_value = "0")]
    pub gps_age_ms: u64,

    /// Decline sharing the device location
    #[arg(long)]
    pub decline_gps: bool,

    /// Pick a city from the catalog (implies declining GPS when no --gps is given)
    #[arg(long)]
    pub city: Option<String>,

    /// Override the local memory file from the configuration
    #[arg(long)]
    pub memory_path: Option<String>,

    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    pub fn business_id(&self) -> BusinessId {
        match (&self.business_id, &self.route) {
            (Some(id), _) => BusinessId::new(id.trim()),
            (None, Some(route)) => BusinessId::from_route(route),
            (None, None) => BusinessId::new(""),
        }
    }

    pub fn field_values(&self) -> [(Field, &str); 7] {
        [
            (Field::Title, self.title.as_str()),
            (Field::Description, self.description.as_str()),
            (Field::ContactName, self.name.as_str()),
            (Field::ContactEmail, self.email.as_str()),
            (Field::Phone, self.phone.as_str()),
            (Field::Address, self.address.as_str()),
            (Field::Honeypot, self.honeypot.as_str()),
        ]
    }

    pub fn gps_fix(&self) -> Result<Option<Coordinates>> {
        let Some(raw) = &self.gps else {
            return Ok(None);
        };

        let invalid = |reason: &str| LeadError::InvalidConfigValueError {
            field: "gps".to_string(),
            value: raw.clone(),
            reason: reason.to_string(),
        };

        let (lat, lng) = raw
            .split_once(',')
            .ok_or_else(|| invalid("expected \"lat,lng\""))?;
        let lat: f64 = lat.trim().parse().map_err(|_| invalid("latitude is not a number"))?;
        let lng: f64 = lng.trim().parse().map_err(|_| invalid("longitude is not a number"))?;
        Ok(Some(Coordinates::new(lat, lng)))
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(fix) = self.gps_fix()? {
            validate_range("gps.lat", fix.lat, -90.0, 90.0)?;
            validate_range("gps.lng", fix.lng, -180.0, 180.0)?;
        }
        if self.gps.is_some() && self.decline_gps {
            return Err(LeadError::ConfigError {
                message: "--gps and --decline-gps cannot be combined".to_string(),
            });
        }
        Ok(())
    }
}
