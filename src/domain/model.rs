use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

static UUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("UUID pattern is a valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// 表單上可編輯的欄位
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Description,
    ContactName,
    ContactEmail,
    Phone,
    Address,
    Honeypot,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::ContactName => "contact_name",
            Field::ContactEmail => "contact_email",
            Field::Phone => "phone",
            Field::Address => "address",
            Field::Honeypot => "honeypot",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 進行中的表單草稿，每次欄位編輯都會改動
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormDraft {
    pub title: String,
    pub description: String,
    pub contact_name: String,
    pub contact_email: String,
    pub phone: String,
    pub address: String,
    pub honeypot: String,
    touched: BTreeSet<Field>,
}

impl FormDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Description => &self.description,
            Field::ContactName => &self.contact_name,
            Field::ContactEmail => &self.contact_email,
            Field::Phone => &self.phone,
            Field::Address => &self.address,
            Field::Honeypot => &self.honeypot,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Title => self.title = value,
            Field::Description => self.description = value,
            Field::ContactName => self.contact_name = value,
            Field::ContactEmail => self.contact_email = value,
            Field::Phone => self.phone = value,
            Field::Address => self.address = value,
            Field::Honeypot => self.honeypot = value,
        }
    }

    /// 欄位失去焦點
    pub fn mark_touched(&mut self, field: Field) {
        self.touched.insert(field);
    }

    pub fn is_touched(&self, field: Field) -> bool {
        self.touched.contains(&field)
    }
}

/// Opaque identifier of the business a lead is addressed to, as supplied by the route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessId(String);

impl BusinessId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// 從 `/form/<id>` 或 `/<id>` 形式的路徑取出最後一段
    pub fn from_route(path: &str) -> Self {
        let segment = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        Self(segment.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid_uuid(&self) -> bool {
        UUID_PATTERN.is_match(&self.0)
    }
}

impl fmt::Display for BusinessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("unknown")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// An entry of the manual city catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl City {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedLocation {
    Gps(Coordinates),
    City {
        coordinates: Coordinates,
        city_name: String,
    },
    Geocoded(Coordinates),
    None,
}

impl ResolvedLocation {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            ResolvedLocation::Gps(c) | ResolvedLocation::Geocoded(c) => Some(*c),
            ResolvedLocation::City { coordinates, .. } => Some(*coordinates),
            ResolvedLocation::None => None,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            ResolvedLocation::Gps(_) => "gps",
            ResolvedLocation::City { .. } => "city",
            ResolvedLocation::Geocoded(_) => "geocoded",
            ResolvedLocation::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Quoted,
    Accepted,
    Rejected,
}

/// Immutable snapshot handed to the lead store exactly once per attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionRecord {
    pub business_id: BusinessId,
    pub title: String,
    pub description: String,
    #[serde(rename = "name")]
    pub contact_name: String,
    #[serde(rename = "email", skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: LeadStatus,
}

impl SubmissionRecord {
    /// 以送出當下的草稿建立快照，字串欄位一律 trim，空白的選填欄位存成 None
    pub fn from_draft(
        draft: &FormDraft,
        business_id: &BusinessId,
        location: &ResolvedLocation,
        include_email: bool,
    ) -> Self {
        let coordinates = location.coordinates();
        Self {
            business_id: business_id.clone(),
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            contact_name: draft.contact_name.trim().to_string(),
            contact_email: if include_email {
                non_blank(&draft.contact_email)
            } else {
                None
            },
            phone: non_blank(&draft.phone),
            address: non_blank(&draft.address),
            latitude: coordinates.map(|c| c.lat),
            longitude: coordinates.map(|c| c.lng),
            status: LeadStatus::New,
        }
    }

    /// Store-side sanity check; the controller validates before building a record.
    pub fn has_required_fields(&self) -> bool {
        !self.business_id.as_str().is_empty()
            && !self.title.is_empty()
            && !self.description.is_empty()
            && !self.contact_name.is_empty()
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLead {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: LeadStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    Accepted(StoredLead),
    Rejected { reason: String },
}
