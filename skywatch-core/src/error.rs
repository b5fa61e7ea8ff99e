use thiserror::Error;

/// Failure of a single round trip to the weather provider.
///
/// Messages are kept as strings so the error can be cloned into observable
/// session state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeatherError {
    /// The request never produced a response (DNS, TLS, connection reset, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("Provider returned status {status}: {message}")]
    Provider { status: u16, message: String },

    /// The response body could not be mapped to the internal schema.
    #[error("Failed to decode provider response: {0}")]
    Decode(String),
}

impl WeatherError {
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    /// Short text suitable for showing next to the failed widget.
    pub fn user_message(&self) -> String {
        match self {
            WeatherError::Network(_) => {
                "Unable to reach the weather service. Please check your internet connection."
                    .to_string()
            }
            WeatherError::Provider { message, .. } => message.clone(),
            WeatherError::Decode(_) => {
                "The weather service sent an unexpected response.".to_string()
            }
        }
    }
}

/// Why the device could not tell us where it is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Geolocation permission denied")]
    Denied,

    #[error("Geolocation is not supported on this device")]
    Unsupported,

    #[error("Geolocation unavailable: {0}")]
    Unavailable(String),
}

/// Failure of an explicit "use my location" request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocateError {
    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    #[error("Failed to resolve device position: {0}")]
    Provider(#[from] WeatherError),
}

impl LocateError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LocateError::Geolocation(GeolocationError::Denied) => {
                "Location access denied. Please search manually."
            }
            LocateError::Geolocation(GeolocationError::Unsupported) => {
                "Geolocation is not supported on this device."
            }
            LocateError::Geolocation(GeolocationError::Unavailable(_))
            | LocateError::Provider(_) => {
                "Failed to get your location. Please try searching manually."
            }
        }
    }
}

/// Failure reading or writing the durable key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize stored value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What a session exposes when its latest request failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub error: WeatherError,
    /// User-facing text for this failure.
    pub message: String,
}

impl Failure {
    pub fn new(error: WeatherError, message: impl Into<String>) -> Self {
        Self { error, message: message.into() }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.error)
    }
}
