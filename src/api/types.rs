// Backend API types.
// Structs for the restaurants and reviews resources, tolerant of the loose
// encodings the backend uses for flags, ids, and timestamps.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Display order for operating hours.
const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Geographic coordinates of a restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A restaurant as served by `GET /restaurants`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latlng: Option<LatLng>,
    #[serde(default)]
    pub cuisine_type: String,
    #[serde(default, deserialize_with = "loose::opt_string")]
    pub photograph: Option<String>,
    #[serde(default)]
    pub operating_hours: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "loose::flag")]
    pub is_favorite: bool,
}

impl Restaurant {
    /// Operating hours in weekday order, unknown day names last.
    pub fn ordered_hours(&self) -> Vec<(&str, &str)> {
        let mut hours: Vec<(&str, &str)> = self
            .operating_hours
            .iter()
            .map(|(day, time)| (day.as_str(), time.as_str()))
            .collect();
        hours.sort_by_key(|(day, _)| {
            WEEKDAYS
                .iter()
                .position(|d| d.eq_ignore_ascii_case(day))
                .unwrap_or(WEEKDAYS.len())
        });
        hours
    }
}

/// A review as served by `GET /reviews/` and returned by `POST /reviews`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(deserialize_with = "loose::number")]
    pub restaurant_id: u64,
    pub name: String,
    #[serde(deserialize_with = "loose::rating")]
    pub rating: u8,
    #[serde(default)]
    pub comments: String,
    #[serde(rename = "createdAt", default, deserialize_with = "loose::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, deserialize_with = "loose::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Date line shown under the reviewer name, e.g. "Wed Oct 26 2016".
    pub fn display_date(&self) -> String {
        self.updated_at
            .or(self.created_at)
            .map(|dt| dt.format("%a %b %d %Y").to_string())
            .unwrap_or_else(|| "Pending".to_string())
    }
}

/// Body of `POST /reviews`, also the shape of an offline-pending review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub restaurant_id: u64,
    pub name: String,
    pub rating: u8,
    pub comments: String,
}

impl NewReview {
    pub fn new(
        restaurant_id: u64,
        name: impl Into<String>,
        rating: u8,
        comments: impl Into<String>,
    ) -> Result<Self> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::InvalidReview(format!(
                "rating must be between 1 and 5, got {}",
                rating
            )));
        }
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::InvalidReview("name is required".to_string()));
        }
        let comments = comments.into();
        if comments.trim().is_empty() {
            return Err(AppError::InvalidReview("review text is required".to_string()));
        }
        Ok(Self {
            restaurant_id,
            name,
            rating,
            comments,
        })
    }
}

/// Deserializers for fields the backend encodes inconsistently.
mod loose {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Bool(bool),
        Int(u64),
        Float(f64),
        Text(String),
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match Option::<Scalar>::deserialize(d)? {
            None => Ok(false),
            Some(Scalar::Bool(b)) => Ok(b),
            Some(Scalar::Text(s)) => match s.trim() {
                "true" => Ok(true),
                "false" | "" => Ok(false),
                other => Err(D::Error::custom(format!("invalid flag: {other}"))),
            },
            Some(Scalar::Int(n)) => Ok(n != 0),
            Some(Scalar::Float(_)) => Err(D::Error::custom("invalid flag: float")),
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        match Scalar::deserialize(d)? {
            Scalar::Int(n) => Ok(n),
            Scalar::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid number: {s}"))),
            _ => Err(D::Error::custom("expected a number")),
        }
    }

    pub fn rating<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
        let n = number(d)?;
        u8::try_from(n).map_err(|_| D::Error::custom(format!("rating out of range: {n}")))
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Scalar>::deserialize(d)? {
            Some(Scalar::Text(s)) if !s.is_empty() => Some(s),
            Some(Scalar::Int(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn timestamp<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<Scalar>::deserialize(d)? {
            None => Ok(None),
            Some(Scalar::Int(ms)) => Ok(i64::try_from(ms)
                .ok()
                .and_then(DateTime::from_timestamp_millis)),
            Some(Scalar::Float(ms)) => Ok(DateTime::from_timestamp_millis(ms as i64)),
            Some(Scalar::Text(s)) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(|e| D::Error::custom(format!("invalid timestamp {s}: {e}"))),
            Some(Scalar::Bool(_)) => Err(D::Error::custom("invalid timestamp")),
        }
    }
}
