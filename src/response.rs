//! Response normalization.
//!
//! Every backend reply uses the same envelope: `{ success, message | error,
//! data, ... }`. This module converts raw envelopes and pipeline errors into
//! a single [`ApiOutcome`] shape so callers never see a transport-specific
//! failure.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ApiError;

/// Fixed message used for every failure without an HTTP response.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

/// Message used when a 401 body carries no usable text.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

/// Uniform result of every facade method.
///
/// `payload` is `Some` exactly when `success` is true and the endpoint's
/// typed payload could be read from the response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiOutcome<T> {
    pub success: bool,
    pub message: String,
    pub payload: Option<T>,
}

impl<T> ApiOutcome<T> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            payload: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn into_payload(self) -> Option<T> {
        self.payload
    }
}

/// Payload for endpoints that acknowledge without returning data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ack {}

/// The wire envelope, before any per-endpoint typing.
///
/// `data` holds the endpoint payload; a few endpoints (model-status) put
/// payload fields next to `success` instead, which `flatten` captures in
/// `rest`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawEnvelope {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl RawEnvelope {
    /// Backend-declared failure text, preferring `message` over `error`.
    pub fn declared_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|m| !m.is_empty())
    }

    /// Collapse the envelope into a single payload object.
    ///
    /// Top-level extras come first, then the `data` object is merged over
    /// them, reproducing the original client's "flatten `data` to the top
    /// level" contract with explicit precedence.
    pub fn payload_value(self) -> Value {
        let mut merged = self.rest;
        match self.data {
            Value::Object(data) => {
                for (key, value) in data {
                    merged.insert(key, value);
                }
                Value::Object(merged)
            }
            Value::Null => Value::Object(merged),
            other => other,
        }
    }
}

/// Convert a pipeline result into the uniform outcome shape.
///
/// `fallback` is the caller-supplied default message used when neither the
/// backend nor the transport provides one.
pub(crate) fn normalize<T: DeserializeOwned>(
    result: Result<RawEnvelope, ApiError>,
    fallback: &str,
) -> ApiOutcome<T> {
    match result {
        Ok(envelope) if envelope.success => {
            let message = envelope.message.clone().unwrap_or_default();
            match serde_json::from_value::<T>(envelope.payload_value()) {
                Ok(payload) => ApiOutcome {
                    success: true,
                    message,
                    payload: Some(payload),
                },
                Err(e) => {
                    warn!(error = %e, "payload did not match the expected shape");
                    ApiOutcome::failure(fallback)
                }
            }
        }
        Ok(envelope) => {
            ApiOutcome::failure(envelope.declared_message().unwrap_or(fallback).to_string())
        }
        Err(ApiError::Network(e)) => {
            warn!(error = %e, "request failed without a response");
            ApiOutcome::failure(NETWORK_ERROR_MESSAGE)
        }
        Err(ApiError::Unauthorized(message)) => ApiOutcome::failure(message),
        Err(e) => {
            warn!(error = %e, "unexpected failure normalized at facade boundary");
            ApiOutcome::failure(fallback)
        }
    }
}
