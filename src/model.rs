//! Place and Trip entities plus their create/patch payloads.
//!
//! Entities are stored verbatim as JSON documents, camelCase on the wire.
//! Updates are shallow merges: fields present in the patch overwrite, absent
//! fields stay untouched, `updatedAt` is refreshed on every mutation.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::AppError;

pub const MAX_IMAGES: usize = 5;
pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 10_000;

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Readable random id: a slug of the title plus a random suffix. Uniqueness
/// within a prefix namespace comes from the suffix.
pub fn slug_id(title: &str) -> String {
    let mut slug = String::new();
    for c in title.chars().flat_map(char::to_lowercase) {
        if slug.len() >= 40 {
            break;
        }
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    let suffix = Uuid::new_v4().simple().to_string();
    if slug.is_empty() {
        suffix[..12].to_string()
    } else {
        format!("{slug}-{}", &suffix[..8])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Historical,
    Cultural,
    Religious,
    /// Canonical stored form; the singular `"memorial"` is accepted on input
    /// and always written back as `"memorials"`.
    #[serde(alias = "memorial")]
    Memorials,
    Park,
    Museum,
    Nature,
    Monument,
}

impl Category {
    /// Case-sensitive parse sharing the serde definition, so the
    /// `memorial` -> `memorials` rule cannot drift between call sites.
    pub fn parse(raw: &str) -> Option<Category> {
        serde_json::from_value(serde_json::Value::String(raw.to_string())).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Tet,
    Pt,
    En,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Published,
    Draft,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    fn validate(&self) -> Result<(), AppError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(invalid("lat must be within [-90, 90]"));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(invalid("lng must be within [-180, 180]"));
        }
        Ok(())
    }
}

/// Historical period. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub municipality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suco: Option<String>,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    pub languages: Vec<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub featured: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlace {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub municipality: String,
    #[serde(default)]
    pub suco: Option<String>,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    pub languages: Vec<Language>,
    #[serde(default)]
    pub period: Option<Period>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub featured: bool,
}

/// Partial update. A present field overwrites, an absent one is left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub municipality: Option<String>,
    pub suco: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub images: Option<Vec<String>>,
    pub sources: Option<Vec<String>>,
    pub languages: Option<Vec<Language>>,
    pub period: Option<Period>,
    pub status: Option<Status>,
    pub featured: Option<bool>,
}

impl Place {
    /// Builds the stored representation for a create request: fresh id, both
    /// timestamps stamped to now. Category canonicalization already happened
    /// during payload deserialization.
    pub fn create(new: NewPlace) -> Place {
        let now = now_ms();
        Place {
            id: slug_id(&new.title),
            title: new.title,
            description: new.description,
            category: new.category,
            municipality: new.municipality,
            suco: new.suco,
            coordinates: new.coordinates,
            images: new.images,
            sources: new.sources,
            languages: new.languages,
            period: new.period,
            status: new.status,
            featured: new.featured,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: PlacePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(municipality) = patch.municipality {
            self.municipality = municipality;
        }
        if let Some(suco) = patch.suco {
            self.suco = Some(suco);
        }
        if let Some(coordinates) = patch.coordinates {
            self.coordinates = coordinates;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(sources) = patch.sources {
            self.sources = sources;
        }
        if let Some(languages) = patch.languages {
            self.languages = languages;
        }
        if let Some(period) = patch.period {
            self.period = Some(period);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        self.updated_at = now_ms();
    }

    /// Rejects the whole document before anything is written.
    pub fn validate(&self) -> Result<(), AppError> {
        let title_chars = self.title.chars().count();
        if !(3..=MAX_TITLE_CHARS).contains(&title_chars) {
            return Err(invalid(format!(
                "title must be 3 to {MAX_TITLE_CHARS} characters"
            )));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(invalid(format!(
                "description must be at most {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
        if self.municipality.trim().is_empty() {
            return Err(invalid("municipality must not be empty"));
        }
        self.coordinates.validate()?;
        if self.images.len() > MAX_IMAGES {
            return Err(invalid(format!("at most {MAX_IMAGES} images allowed")));
        }
        for source in &self.sources {
            if Url::parse(source).is_err() {
                return Err(invalid(format!("source is not a valid URL: {source}")));
            }
        }
        if self.languages.is_empty() {
            return Err(invalid("at least one language is required"));
        }
        if let Some(period) = &self.period {
            if let (Some(from), Some(to)) = (period.from_year, period.to_year) {
                if from > to {
                    return Err(invalid("period fromYear must not exceed toYear"));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Car,
    Motorbike,
    Bus,
    Walking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadCondition {
    Good,
    Mixed,
    Rough,
}

/// One stop on a trip. Carries a coordinate snapshot so a deleted place does
/// not break the trip; a dangling `placeId` is tolerated by design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripStop {
    pub place_id: String,
    pub title: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub stops: Vec<TripStop>,
    #[serde(default)]
    pub public: bool,
    pub transport_mode: TransportMode,
    pub road_condition: RoadCondition,
    /// Manual overrides for the computed estimates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub stops: Vec<TripStop>,
    #[serde(default)]
    pub public: bool,
    pub transport_mode: TransportMode,
    pub road_condition: RoadCondition,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub duration_hours: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub stops: Option<Vec<TripStop>>,
    pub public: Option<bool>,
    pub transport_mode: Option<TransportMode>,
    pub road_condition: Option<RoadCondition>,
    pub distance_km: Option<f64>,
    pub duration_hours: Option<f64>,
}

impl Trip {
    pub fn create(new: NewTrip) -> Trip {
        let now = now_ms();
        Trip {
            id: slug_id(&new.name),
            name: new.name,
            description: new.description,
            stops: new.stops,
            public: new.public,
            transport_mode: new.transport_mode,
            road_condition: new.road_condition,
            distance_km: new.distance_km,
            duration_hours: new.duration_hours,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: TripPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(stops) = patch.stops {
            self.stops = stops;
        }
        if let Some(public) = patch.public {
            self.public = public;
        }
        if let Some(transport_mode) = patch.transport_mode {
            self.transport_mode = transport_mode;
        }
        if let Some(road_condition) = patch.road_condition {
            self.road_condition = road_condition;
        }
        if let Some(distance_km) = patch.distance_km {
            self.distance_km = Some(distance_km);
        }
        if let Some(duration_hours) = patch.duration_hours {
            self.duration_hours = Some(duration_hours);
        }
        self.updated_at = now_ms();
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let name_chars = self.name.chars().count();
        if !(1..=MAX_TITLE_CHARS).contains(&name_chars) {
            return Err(invalid(format!(
                "name must be 1 to {MAX_TITLE_CHARS} characters"
            )));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(invalid(format!(
                "description must be at most {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
        for stop in &self.stops {
            stop.coordinates.validate()?;
        }
        for (field, value) in [
            ("distanceKm", self.distance_km),
            ("durationHours", self.duration_hours),
        ] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(invalid(format!("{field} must be a non-negative number")));
                }
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Validation(message.into())
}
