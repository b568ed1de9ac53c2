//! Endpoint merging the timetables of several users.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::aggregate::{AggregateError, UserId};
use crate::server::types::ApiErrorType;
use crate::types::ServiceState;

/// Body of a combined timetable request.
#[derive(Debug, Deserialize)]
pub struct CombinedRequest {
    pub user_ids: Vec<UserId>,
}

/// Converts AggregateError to API response.
fn aggregate_error_to_response(error: AggregateError) -> Response {
    let (status, message) = match &error {
        AggregateError::Upstream { status, .. } => (*status, "Error fetching data."),
        AggregateError::Timeout { .. } => (
            StatusCode::GATEWAY_TIMEOUT,
            "Timetable service did not respond in time.",
        ),
        AggregateError::Network { .. } => (StatusCode::BAD_GATEWAY, "Error fetching data."),
        AggregateError::MalformedTerms { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "Malformed term data.")
        }
        AggregateError::Client { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch timetables",
        ),
    };

    // transport errors name the timetable service's address
    let context = match &error {
        AggregateError::Network { .. } | AggregateError::Client { .. } => None,
        _ => Some(error.to_string()),
    };

    ApiErrorType::from((status, message, context)).into_response()
}

/// POST /bool/ (GET is accepted as well)
///
/// Fetches the timetables of all listed users and returns their merged terms.
///
/// Body:
/// - `user_ids`: list of timetable user identifiers
pub async fn post_combined(
    method: Method,
    State(s): State<Arc<ServiceState>>,
    payload: Result<Json<CombinedRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("{} /bool/ - Rejected request body: {}", method, rejection.body_text());
            return ApiErrorType::from((
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid request body",
                Some(rejection.body_text()),
            ))
            .into_response();
        }
    };

    info!(
        "{} /bool/ - Merging timetables for {} users",
        method,
        request.user_ids.len()
    );

    match s.upstream.aggregate(&request.user_ids).await {
        Ok(terms) => (StatusCode::OK, Json(terms)).into_response(),
        Err(e) => {
            error!(user_id = ?e.user_id(), "Failed to merge timetables: {}", e);
            aggregate_error_to_response(e)
        }
    }
}
