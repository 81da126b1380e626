//! Error types for filter and load operations.
//!
//! The `Display` text of [`FilterError`] is the message shown to the user.

use thiserror::Error;

pub const MSG_MISSING_DATES: &str = "Please select both a start and an end date.";
pub const MSG_INVALID_RADIUS_INPUT: &str = "Please enter a valid address and radius.";
pub const MSG_LOCATION_NOT_FOUND: &str = "Unable to find location. Please try another address.";
pub const MSG_GEOCODING_ERROR: &str = "An error occurred while geocoding the address.";

/// Failure of a single geocode lookup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeocodeError {
    /// The service answered but had no result for the address.
    #[error("Unable to find location. Please try another address.")]
    NotFound,

    /// Transport, status or decoding failure. The detail goes to the log only.
    #[error("An error occurred while geocoding the address.")]
    Service(String),
}

/// Errors surfaced to the user by the filter controller and the loader.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    GeocodeFailure(#[from] GeocodeError),

    #[error("Error loading event data: {0}")]
    DataLoadFailure(String),
}

impl FilterError {
    pub(crate) fn missing_dates() -> Self {
        FilterError::InvalidInput(MSG_MISSING_DATES.to_string())
    }

    pub(crate) fn invalid_radius_input() -> Self {
        FilterError::InvalidInput(MSG_INVALID_RADIUS_INPUT.to_string())
    }
}

/// Result type alias for event map operations.
pub type Result<T> = std::result::Result<T, FilterError>;
