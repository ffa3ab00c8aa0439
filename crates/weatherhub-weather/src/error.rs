//! Weather fetch error types.

use thiserror::Error;

/// Failure of a single weather fetch.
///
/// Every variant is recoverable: the client returns it to the caller and
/// never retries on its own.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Timeout, DNS failure, refused connection.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx status other than 404.
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// Provider answered 404, or reported a `cod` other than 200.
    #[error("City not found: {0}")]
    CityNotFound(String),

    /// Body was not JSON, or required fields were missing or implausible.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    /// User-friendly message for display in the dashboard.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "Unable to reach the weather service. Check your connection.".to_string()
            }
            Self::Http { status: 401, .. } => {
                "Weather API key is invalid. Check settings.".to_string()
            }
            Self::Http { status, .. } if *status >= 500 => {
                "The weather service is experiencing issues. Please try again later.".to_string()
            }
            Self::Http { status, .. } => format!("Weather request failed (HTTP {}).", status),
            Self::CityNotFound(city) if city.is_empty() => {
                "Enter a city name to see its weather.".to_string()
            }
            Self::CityNotFound(city) => {
                format!("City \"{}\" not found. Check the spelling and try again.", city)
            }
            Self::MalformedResponse(_) => {
                "Received unexpected weather data. Please try again.".to_string()
            }
        }
    }

    /// Whether the provider could not resolve the requested city.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CityNotFound(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL carries the API key
        let e = e.without_url();
        if e.is_timeout() {
            Self::Network("request timed out".to_string())
        } else if e.is_connect() {
            Self::Network(format!("connection failed: {}", e))
        } else if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Http {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_not_found_message_names_city() {
        let err = FetchError::CityNotFound("Atlantis".into());
        assert!(err.user_message().contains("Atlantis"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_empty_city_message() {
        let err = FetchError::CityNotFound(String::new());
        assert!(err.user_message().contains("Enter a city"));
    }

    #[test]
    fn test_http_messages() {
        let unauthorized = FetchError::Http {
            status: 401,
            message: "Invalid API key".into(),
        };
        assert!(unauthorized.user_message().contains("API key"));

        let server = FetchError::Http {
            status: 503,
            message: String::new(),
        };
        assert!(server.user_message().contains("try again later"));

        let other = FetchError::Http {
            status: 429,
            message: String::new(),
        };
        assert!(other.user_message().contains("429"));
        assert!(!other.is_not_found());
    }

    #[test]
    fn test_display_keeps_cause() {
        let err = FetchError::MalformedResponse("missing field `main`".into());
        assert_eq!(err.to_string(), "Malformed response: missing field `main`");
    }
}
