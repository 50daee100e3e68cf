//! services/api/src/web/activity.rs
//!
//! Axum handlers for logging reading activity and reading back the
//! derived streak. The streak is never stored; every GET recomputes it
//! from the full activity log.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{NaiveDate, Utc};
use reading_tracker_core::domain::ReadingActivity;
use reading_tracker_core::streak;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RecordActivityRequest {
    /// Defaults to today (UTC) when omitted.
    pub activity_date: Option<NaiveDate>,
    // Signed on the wire so that negative values produce a 400 rather
    // than a deserialization error.
    pub pages_read: i64,
    pub minutes_read: i64,
}

#[derive(Serialize, ToSchema)]
pub struct ActivityResponse {
    pub id: Uuid,
    pub activity_date: NaiveDate,
    pub pages_read: u32,
    pub minutes_read: u32,
}

impl ActivityResponse {
    fn from_domain(activity: ReadingActivity) -> Self {
        ActivityResponse {
            id: activity.id,
            activity_date: activity.activity_date,
            pages_read: activity.pages_read,
            minutes_read: activity.minutes_read,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StreakResponse {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_active_date: Option<NaiveDate>,
    pub is_at_risk: bool,
    pub message: String,
}

/// Upper bound for counts, matching the INT columns they land in.
const MAX_COUNT: i64 = i32::MAX as i64;

/// Checks an activity payload before it reaches the core: counts must
/// be non-negative, within column range, and at least one of them
/// positive. The calculator itself assumes validated records.
fn validate_counts(pages_read: i64, minutes_read: i64) -> Result<(u32, u32), String> {
    if pages_read < 0 || minutes_read < 0 {
        return Err("Pages and minutes must be non-negative".to_string());
    }
    if pages_read > MAX_COUNT || minutes_read > MAX_COUNT {
        return Err(format!("Pages and minutes must be at most {}", MAX_COUNT));
    }
    if pages_read == 0 && minutes_read == 0 {
        return Err("Log at least one page or one minute of reading".to_string());
    }
    Ok((pages_read as u32, minutes_read as u32))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Log a reading session.
#[utoipa::path(
    post,
    path = "/activity",
    request_body = RecordActivityRequest,
    responses(
        (status = 201, description = "Activity recorded", body = ActivityResponse),
        (status = 400, description = "Invalid counts"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn record_activity_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<RecordActivityRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (pages_read, minutes_read) = validate_counts(req.pages_read, req.minutes_read)
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    let activity_date = req.activity_date.unwrap_or_else(|| Utc::now().date_naive());

    let activity = state
        .db
        .record_activity(user_id, activity_date, pages_read, minutes_read)
        .await
        .map_err(|e| {
            error!("Failed to record activity: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to record activity".to_string(),
            )
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ActivityResponse::from_domain(activity)),
    ))
}

/// List the user's reading activity.
#[utoipa::path(
    get,
    path = "/activity",
    responses(
        (status = 200, description = "The user's activity log", body = [ActivityResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_activity_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let activities = state
        .db
        .get_activities_by_user(user_id)
        .await
        .map_err(|e| {
            error!("Failed to list activity: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list activity".to_string(),
            )
        })?;

    let response: Vec<ActivityResponse> = activities
        .into_iter()
        .map(ActivityResponse::from_domain)
        .collect();
    Ok(Json(response))
}

/// The user's current reading streak, computed from the activity log.
#[utoipa::path(
    get,
    path = "/streak",
    responses(
        (status = 200, description = "The computed streak", body = StreakResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_streak_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let activities = state
        .db
        .get_activities_by_user(user_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch activity for streak: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to compute streak".to_string(),
            )
        })?;

    let computed = streak::compute(&activities, Utc::now().date_naive());
    Ok(Json(StreakResponse {
        current_streak: computed.current_streak,
        longest_streak: computed.longest_streak,
        last_active_date: computed.last_active_date,
        is_at_risk: computed.is_at_risk,
        message: computed.message,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_counts_pass_validation() {
        assert_eq!(validate_counts(12, 0), Ok((12, 0)));
        assert_eq!(validate_counts(0, 30), Ok((0, 30)));
        assert_eq!(validate_counts(5, 45), Ok((5, 45)));
    }

    #[test]
    fn negative_counts_are_rejected() {
        assert!(validate_counts(-1, 30).is_err());
        assert!(validate_counts(10, -5).is_err());
    }

    #[test]
    fn all_zero_counts_are_rejected() {
        assert!(validate_counts(0, 0).is_err());
    }

    #[test]
    fn counts_beyond_the_column_range_are_rejected_not_truncated() {
        // 2^32 would truncate to 0 and 2^32 + 4 to 4 under a plain
        // `as u32` cast; both must be 400s instead.
        assert!(validate_counts(4_294_967_296, 0).is_err());
        assert!(validate_counts(4_294_967_300, 1).is_err());
        assert!(validate_counts(0, i64::from(i32::MAX) + 1).is_err());
        assert_eq!(
            validate_counts(i64::from(i32::MAX), 0),
            Ok((i32::MAX as u32, 0))
        );
    }
}
