use crate::domain::model::{City, Coordinates, ResolvedLocation};
use crate::domain::ports::{DeviceLocator, Geocoder, PositionOptions};
use crate::utils::error::Result;
use std::fmt;
use thiserror::Error;

/// 預設城市清單：芬蘭十大城市
pub fn default_cities() -> Vec<City> {
    [
        ("Helsinki", 60.1699, 24.9384),
        ("Espoo", 60.2052, 24.6522),
        ("Tampere", 61.4981, 23.7608),
        ("Vantaa", 60.2934, 25.0378),
        ("Oulu", 65.0121, 25.4651),
        ("Turku", 60.4518, 22.2666),
        ("Jyväskylä", 62.2426, 25.7473),
        ("Lahti", 60.9827, 25.6612),
        ("Kuopio", 62.8924, 27.6770),
        ("Kouvola", 60.8682, 26.7042),
    ]
    .into_iter()
    .map(|(name, lat, lng)| City {
        name: name.to_string(),
        lat,
        lng,
    })
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationStatus {
    Idle,
    Requesting,
    Granted(Coordinates),
    Denied,
    Error,
}

impl LocationStatus {
    fn name(&self) -> &'static str {
        match self {
            LocationStatus::Idle => "idle",
            LocationStatus::Requesting => "requesting",
            LocationStatus::Granted(_) => "granted",
            LocationStatus::Denied => "denied",
            LocationStatus::Error => "error",
        }
    }
}

impl fmt::Display for LocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationTransitionError {
    #[error("cannot {action} while location is {status}")]
    NotAllowed {
        action: &'static str,
        status: LocationStatus,
    },

    #[error("unknown city: {0}")]
    UnknownCity(String),
}

/// One attempt in the fallback chain, in precedence order.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationStrategy {
    Gps(Coordinates),
    City(City),
    Geocode(String),
}

/// GPS consent and manual city choice for one form session.
#[derive(Debug, Clone)]
pub struct LocationSession {
    status: LocationStatus,
    selected_city: Option<City>,
    catalog: Vec<City>,
    options: PositionOptions,
}

impl LocationSession {
    pub fn new(catalog: Vec<City>, options: PositionOptions) -> Self {
        Self {
            status: LocationStatus::Idle,
            selected_city: None,
            catalog,
            options,
        }
    }

    pub fn status(&self) -> LocationStatus {
        self.status
    }

    pub fn is_requesting(&self) -> bool {
        matches!(self.status, LocationStatus::Requesting)
    }

    pub fn gps_fix(&self) -> Option<Coordinates> {
        match self.status {
            LocationStatus::Granted(coords) => Some(coords),
            _ => None,
        }
    }

    pub fn selected_city(&self) -> Option<&City> {
        self.selected_city.as_ref()
    }

    pub fn catalog(&self) -> &[City] {
        &self.catalog
    }

    pub fn options(&self) -> &PositionOptions {
        &self.options
    }

    /// The city list is offered once GPS was declined or failed.
    pub fn offers_city_choice(&self) -> bool {
        matches!(self.status, LocationStatus::Denied | LocationStatus::Error)
    }

    pub fn begin_gps_request(&mut self) -> std::result::Result<(), LocationTransitionError> {
        match self.status {
            LocationStatus::Idle | LocationStatus::Denied | LocationStatus::Error => {
                self.status = LocationStatus::Requesting;
                Ok(())
            }
            status => Err(LocationTransitionError::NotAllowed {
                action: "request GPS",
                status,
            }),
        }
    }

    pub fn complete_gps_request(
        &mut self,
        result: Result<Coordinates>,
    ) -> std::result::Result<(), LocationTransitionError> {
        if !self.is_requesting() {
            return Err(LocationTransitionError::NotAllowed {
                action: "complete a GPS request",
                status: self.status,
            });
        }

        self.status = match result {
            Ok(coords) => {
                tracing::debug!("📍 GPS fix received: ({})", coords);
                LocationStatus::Granted(coords)
            }
            Err(e) => {
                tracing::info!("GPS location unavailable: {}", e);
                LocationStatus::Error
            }
        };
        Ok(())
    }

    /// Ask the device for a fix, bounded by the configured timeout.
    pub async fn request_gps<L: DeviceLocator + ?Sized>(
        &mut self,
        locator: &L,
    ) -> std::result::Result<LocationStatus, LocationTransitionError> {
        self.begin_gps_request()?;

        let options = self.options;
        let result =
            match tokio::time::timeout(options.timeout, locator.current_position(&options)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("⏱️ GPS request timed out after {:?}", options.timeout);
                    Err(crate::utils::error::LeadError::LocationError {
                        message: "timed out".to_string(),
                    })
                }
            };

        self.complete_gps_request(result)?;
        Ok(self.status)
    }

    pub fn decline_gps(&mut self) -> std::result::Result<(), LocationTransitionError> {
        match self.status {
            LocationStatus::Idle => {
                self.status = LocationStatus::Denied;
                Ok(())
            }
            status => Err(LocationTransitionError::NotAllowed {
                action: "decline GPS",
                status,
            }),
        }
    }

    pub fn clear_gps(&mut self) -> std::result::Result<(), LocationTransitionError> {
        match self.status {
            LocationStatus::Granted(_) => {
                self.status = LocationStatus::Idle;
                Ok(())
            }
            status => Err(LocationTransitionError::NotAllowed {
                action: "clear the GPS fix",
                status,
            }),
        }
    }

    /// Back from the city list to the GPS offer; drops the city choice.
    pub fn retry_gps(&mut self) -> std::result::Result<(), LocationTransitionError> {
        match self.status {
            LocationStatus::Denied | LocationStatus::Error => {
                self.status = LocationStatus::Idle;
                self.selected_city = None;
                Ok(())
            }
            status => Err(LocationTransitionError::NotAllowed {
                action: "retry GPS",
                status,
            }),
        }
    }

    pub fn select_city(&mut self, name: &str) -> std::result::Result<&City, LocationTransitionError> {
        let city = self
            .catalog
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or_else(|| LocationTransitionError::UnknownCity(name.to_string()))?;
        Ok(self.selected_city.insert(city))
    }

    pub fn clear_city(&mut self) {
        self.selected_city = None;
    }

    /// Ordered resolver attempts for a submit: GPS fix, then city, then the address.
    pub fn strategies(&self, address: &str) -> Vec<LocationStrategy> {
        let mut strategies = Vec::with_capacity(3);
        if let Some(coords) = self.gps_fix() {
            strategies.push(LocationStrategy::Gps(coords));
        }
        if let Some(city) = &self.selected_city {
            strategies.push(LocationStrategy::City(city.clone()));
        }
        let address = address.trim();
        if !address.is_empty() {
            strategies.push(LocationStrategy::Geocode(address.to_string()));
        }
        strategies
    }
}

/// Walks the strategies in order and stops at the first one that yields coordinates.
/// A failed geocode is not an error; the submission simply carries no coordinates.
pub async fn resolve_location<G: Geocoder + ?Sized>(
    strategies: Vec<LocationStrategy>,
    geocoder: &G,
) -> ResolvedLocation {
    for strategy in strategies {
        match strategy {
            LocationStrategy::Gps(coords) => return ResolvedLocation::Gps(coords),
            LocationStrategy::City(city) => {
                return ResolvedLocation::City {
                    coordinates: city.coordinates(),
                    city_name: city.name,
                }
            }
            LocationStrategy::Geocode(address) => match geocoder.resolve(&address).await {
                Some(coords) => return ResolvedLocation::Geocoded(coords),
                None => {
                    tracing::warn!(
                        "⚠️ Address could not be converted to coordinates, continuing without"
                    );
                }
            },
        }
    }
    ResolvedLocation::None
}
