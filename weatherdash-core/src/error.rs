use reqwest::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;

/// Failure category of a weather request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No API key configured.
    Configuration,
    /// Empty city or missing coordinates; rejected before any request.
    Validation,
    NotFound,
    Unauthorized,
    ServiceUnavailable,
    /// The provider never answered.
    Network,
    /// The request could not be built or dispatched.
    RequestSetup,
    /// Any other non-2xx answer.
    Provider,
    /// 2xx answer whose body could not be decoded.
    InvalidResponse,
}

/// The only error the weather client returns.
///
/// `status` is the HTTP status, or 0 when no response was received. `data`
/// carries the provider's error body, or a `{"message": ...}` object for
/// failures that happened on this side.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct WeatherApiError {
    pub kind: ErrorKind,
    pub status: u16,
    pub message: String,
    pub data: Value,
}

/// What a request asked for; picks the fallback wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Weather,
    Forecast,
}

impl Resource {
    fn noun(&self) -> &'static str {
        match self {
            Resource::Weather => "weather",
            Resource::Forecast => "forecast",
        }
    }
}

/// Who a request was about; picks the 404 wording.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    City(&'a str),
    Coordinates,
}

/// Maximum length for error response bodies kept in `data` when the body is
/// not JSON.
const MAX_ERROR_BODY_LENGTH: usize = 200;

impl WeatherApiError {
    fn new(kind: ErrorKind, status: u16, message: impl Into<String>, data: Value) -> Self {
        Self { kind, status, message: message.into(), data }
    }

    pub fn missing_api_key() -> Self {
        Self::new(
            ErrorKind::Configuration,
            401,
            "Weather API key is missing. Please check your environment variables.",
            json!({ "message": "API key missing" }),
        )
    }

    pub fn city_required() -> Self {
        Self::validation("City name is required")
    }

    pub fn coordinates_required() -> Self {
        Self::validation("Latitude and longitude are required")
    }

    fn validation(message: &str) -> Self {
        Self::new(ErrorKind::Validation, 400, message, json!({ "message": message }))
    }

    pub fn network() -> Self {
        Self::new(
            ErrorKind::Network,
            0,
            "Network error. No response received from weather service.",
            json!({ "message": "Network error" }),
        )
    }

    /// Classify a transport failure raised before any response arrived.
    pub fn from_transport(err: &reqwest::Error, resource: Resource) -> Self {
        if err.is_builder() {
            let cause = err.to_string();
            Self::new(
                ErrorKind::RequestSetup,
                0,
                format!("Error setting up {} request: {cause}", resource.noun()),
                json!({ "message": cause }),
            )
        } else {
            Self::network()
        }
    }

    /// Map a non-2xx provider response.
    pub fn from_status(
        status: StatusCode,
        body: &str,
        target: Target<'_>,
        resource: Resource,
    ) -> Self {
        let data = parse_error_body(body);
        let code = status.as_u16();

        let (kind, message) = match code {
            404 => (
                ErrorKind::NotFound,
                match target {
                    Target::City(city) => format!("City \"{city}\" not found"),
                    Target::Coordinates => "Location not found".to_string(),
                },
            ),
            401 => (ErrorKind::Unauthorized, "Invalid API key".to_string()),
            500..=599 => (
                ErrorKind::ServiceUnavailable,
                "Weather service is temporarily unavailable".to_string(),
            ),
            _ => (
                ErrorKind::Provider,
                data.get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Error fetching {} data", resource.noun())),
            ),
        };

        Self::new(kind, code, message, data)
    }

    pub fn invalid_response(status: StatusCode, cause: &serde_json::Error) -> Self {
        let cause = cause.to_string();
        Self::new(
            ErrorKind::InvalidResponse,
            status.as_u16(),
            format!("Unexpected response from weather service: {cause}"),
            json!({ "message": cause }),
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

fn parse_error_body(body: &str) -> Value {
    match serde_json::from_str::<Value>(body) {
        Ok(value @ Value::Object(_)) => value,
        _ if body.trim().is_empty() => json!({}),
        _ => json!({ "body": truncate_body(body) }),
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
