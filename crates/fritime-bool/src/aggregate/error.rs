//! Error types for timetable aggregation.

use reqwest::StatusCode;
use thiserror::Error;

use super::UserId;

/// Errors that abort an aggregation.
#[derive(Debug, Error, Clone)]
pub enum AggregateError {
    /// The timetable service answered with a non-success status
    #[error("Timetable service returned {status} for user {user_id}")]
    Upstream { user_id: UserId, status: StatusCode },

    /// The request did not complete within the configured timeout
    #[error("Timetable request for user {user_id} timed out")]
    Timeout { user_id: UserId },

    /// Network/HTTP request failed
    #[error("Network error for user {user_id}: {message}")]
    Network { user_id: UserId, message: String },

    /// The response body did not decode into well-formed terms
    #[error("Malformed term data for user {user_id}: {message}")]
    MalformedTerms { user_id: UserId, message: String },

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {message}")]
    Client { message: String },
}

impl AggregateError {
    /// Classifies a transport error raised while fetching `user_id`'s timetable.
    pub fn from_transport(user_id: UserId, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AggregateError::Timeout { user_id }
        } else {
            AggregateError::Network {
                user_id,
                message: err.to_string(),
            }
        }
    }

    /// Returns the user whose fetch failed, if the error is tied to one.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            AggregateError::Upstream { user_id, .. }
            | AggregateError::Timeout { user_id }
            | AggregateError::Network { user_id, .. }
            | AggregateError::MalformedTerms { user_id, .. } => Some(*user_id),
            AggregateError::Client { .. } => None,
        }
    }
}
