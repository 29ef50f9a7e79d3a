use thiserror::Error;

#[derive(Error, Debug)]
pub enum NestwatchError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Geocoder error: {0}")]
    Geocode(String),

    /// The geocoder is over its request quota. A task failing with this
    /// error is redelivered by the queue after a backoff interval.
    #[error("Geocoder quota exceeded")]
    GeocoderQuota,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
