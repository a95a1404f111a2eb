//! In-memory filtering and sorting of place collections.
//!
//! The whole collection is fetched and filtered per request; this stage never
//! fails, unknown or missing filter inputs degrade to no-ops rather than
//! errors. Free-text search (`q`) is a separate upstream retrieval concern
//! and is deliberately not applied here.

use std::str::FromStr;

use serde::Deserialize;

use crate::model::{Category, Period, Place};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Leaves the input order untouched.
    #[default]
    Relevance,
    Newest,
    Oldest,
    Title,
}

impl SortBy {
    pub fn parse(raw: &str) -> Option<SortBy> {
        serde_json::from_value(serde_json::Value::String(raw.to_string())).ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlaceFilter {
    pub query: Option<String>,
    /// `Some` whenever the client supplied a non-empty categories parameter,
    /// even if none of its entries named a real category: a filter set that
    /// nothing can belong to matches nothing, it does not turn itself off.
    pub categories: Option<Vec<Category>>,
    pub municipalities: Vec<String>,
    pub featured: Option<bool>,
    pub has_images: Option<bool>,
    pub year_range: Option<(i32, i32)>,
    pub sort: SortBy,
}

impl PlaceFilter {
    pub fn apply(&self, places: Vec<Place>) -> Vec<Place> {
        let mut kept: Vec<Place> = places.into_iter().filter(|p| self.keeps(p)).collect();

        // All sorts are stable, so ties keep their input order.
        match self.sort {
            SortBy::Relevance => {}
            SortBy::Newest => kept.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
            SortBy::Oldest => kept.sort_by(|a, b| a.updated_at.cmp(&b.updated_at)),
            SortBy::Title => kept.sort_by_key(|p| p.title.to_lowercase()),
        }

        kept
    }

    fn keeps(&self, place: &Place) -> bool {
        if let Some(categories) = &self.categories {
            if !categories.contains(&place.category) {
                return false;
            }
        }
        if !self.municipalities.is_empty() {
            // Unicode-aware: municipality names here are full of accents
            // (Lautém, Liquiçá).
            let municipality = place.municipality.to_lowercase();
            if !self
                .municipalities
                .iter()
                .any(|m| m.to_lowercase() == municipality)
            {
                return false;
            }
        }
        if self.featured == Some(true) && !place.featured {
            return false;
        }
        if self.has_images == Some(true) && place.images.is_empty() {
            return false;
        }
        if let Some((from, to)) = self.year_range {
            if !overlaps(place.period.as_ref(), from, to) {
                return false;
            }
        }
        true
    }
}

/// A missing bound (or a missing period altogether) is unbounded on that side
/// and passes.
fn overlaps(period: Option<&Period>, from: i32, to: i32) -> bool {
    let Some(period) = period else {
        return true;
    };
    period.from_year.map_or(true, |f| f <= to) && period.to_year.map_or(true, |t| t >= from)
}

/// Wire form of the filter as `GET /places` query parameters. Everything is
/// accepted as a string and parsed leniently: a value that does not parse is
/// treated as absent instead of failing the request. List-valued fields are
/// comma-separated.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceQuery {
    pub q: Option<String>,
    pub categories: Option<String>,
    pub municipalities: Option<String>,
    pub featured: Option<String>,
    pub has_images: Option<String>,
    pub from_year: Option<String>,
    pub to_year: Option<String>,
    pub sort: Option<String>,
}

fn lenient<T: FromStr>(raw: &Option<String>) -> Option<T> {
    raw.as_deref().and_then(|v| v.trim().parse().ok())
}

impl PlaceQuery {
    pub fn into_filter(self) -> PlaceFilter {
        let categories = self
            .categories
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                raw.split(',')
                    .filter_map(|c| Category::parse(c.trim()))
                    .collect()
            });
        let municipalities = self
            .municipalities
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let from_year = lenient::<i32>(&self.from_year);
        let to_year = lenient::<i32>(&self.to_year);
        let year_range = match (from_year, to_year) {
            (None, None) => None,
            (from, to) => Some((from.unwrap_or(i32::MIN), to.unwrap_or(i32::MAX))),
        };

        PlaceFilter {
            query: self.q,
            categories,
            municipalities,
            featured: lenient(&self.featured),
            has_images: lenient(&self.has_images),
            year_range,
            sort: self
                .sort
                .as_deref()
                .and_then(SortBy::parse)
                .unwrap_or_default(),
        }
    }
}
