use thiserror::Error;

use crate::models::Coordinate;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to build GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
    #[error("invalid coordinate ({}, {})", .0.lat, .0.lon)]
    InvalidCoordinate(Coordinate),
    #[error("invalid trip duration: {0} minutes")]
    InvalidDuration(f64),
    #[error("unknown ride option: {0}")]
    UnknownRide(String),
}

impl SimError {
    /// Whether the caller sent bad input, as opposed to a failure on our side.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, SimError::Gpx(_))
    }
}
