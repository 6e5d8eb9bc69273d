//! Rider-side persistence: profile, saved places and trip history in one
//! JSON document, rewritten on each change.

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Location;

/// Highest star rating a rider can give.
pub const MAX_RATING: u8 = 5;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to access history file: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt history file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no trip at history index {0}")]
    UnknownTrip(usize),
    #[error("trip {0} was cancelled and cannot be rated")]
    NotRateable(usize),
    #[error("rating must be between 0 and 5, got {0}")]
    InvalidRating(u8),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub avatar_url: String,
    #[serde(default)]
    pub total_rides: u32,
    #[serde(default)]
    pub rating: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceKind {
    Home,
    Work,
    Pin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlace {
    pub id: String,
    pub label: String,
    pub kind: PlaceKind,
    pub location: Location,
}

impl SavedPlace {
    /// New place with a timestamp id.
    pub fn new(label: impl Into<String>, kind: PlaceKind, location: Location) -> Self {
        Self {
            id: Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
            label: label.into(),
            kind,
            location,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub pickup: String,
    pub dropoff: String,
    pub ride_id: String,
    pub fare: f64,
    pub driver_name: String,
    pub outcome: TripOutcome,
    pub finished_at: DateTime<Utc>,
    /// Stars given after the ride; `None` until rated or when skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    user: Option<UserProfile>,
    #[serde(default)]
    places: Vec<SavedPlace>,
    #[serde(default)]
    trips: Vec<TripRecord>,
}

#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    data: StoreData,
}

impl LocalStore {
    /// Opens the store at `path`. A missing file is an empty store; it is
    /// created on the first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let data = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => StoreData::default(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(
            "opened history at {} ({} trips, {} places)",
            path.display(),
            data.trips.len(),
            data.places.len()
        );
        Ok(Self { path, data })
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.data.user.as_ref()
    }

    pub fn save_user(&mut self, user: UserProfile) -> Result<(), StorageError> {
        self.data.user = Some(user);
        self.flush()
    }

    pub fn saved_places(&self) -> &[SavedPlace] {
        &self.data.places
    }

    /// Adds `place`, or replaces the place with the same id.
    pub fn save_place(&mut self, place: SavedPlace) -> Result<(), StorageError> {
        match self.data.places.iter_mut().find(|p| p.id == place.id) {
            Some(existing) => *existing = place,
            None => self.data.places.push(place),
        }
        self.flush()
    }

    /// Returns whether a place with `id` existed.
    pub fn remove_place(&mut self, id: &str) -> Result<bool, StorageError> {
        let before = self.data.places.len();
        self.data.places.retain(|p| p.id != id);
        if self.data.places.len() == before {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    /// Trips in the order they were recorded.
    pub fn trips(&self) -> &[TripRecord] {
        &self.data.trips
    }

    /// Appends a finished trip and returns its index. A completed trip also
    /// counts towards the rider's total.
    pub fn record_trip(&mut self, record: TripRecord) -> Result<usize, StorageError> {
        if record.outcome == TripOutcome::Completed {
            if let Some(user) = self.data.user.as_mut() {
                user.total_rides += 1;
            }
        }
        self.data.trips.push(record);
        self.flush()?;
        Ok(self.data.trips.len() - 1)
    }

    /// Attaches the post-ride rating. A rating of 0 means the rider skipped
    /// the stars; empty feedback is dropped.
    pub fn rate_trip(&mut self, index: usize, rating: u8, feedback: &str) -> Result<(), StorageError> {
        if rating > MAX_RATING {
            return Err(StorageError::InvalidRating(rating));
        }
        let trip = self
            .data
            .trips
            .get_mut(index)
            .ok_or(StorageError::UnknownTrip(index))?;
        if trip.outcome != TripOutcome::Completed {
            return Err(StorageError::NotRateable(index));
        }
        trip.rating = (rating > 0).then_some(rating);
        let feedback = feedback.trim();
        trip.feedback = (!feedback.is_empty()).then(|| feedback.to_string());
        self.flush()
    }

    /// Forgets the profile, saved places and the whole history.
    pub fn clear_all(&mut self) -> Result<(), StorageError> {
        self.data = StoreData::default();
        self.flush()
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(&self.data)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
