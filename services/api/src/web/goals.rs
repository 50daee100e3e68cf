//! services/api/src/web/goals.rs
//!
//! Axum handlers for reading goals. `completed` and `bonus_count` in
//! responses are always derived from the stored progress, never stored
//! themselves.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::NaiveDate;
use reading_tracker_core::domain::Goal;
use reading_tracker_core::ports::PortError;
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
pub struct CreateGoalRequest {
    pub title: String,
    pub description: Option<String>,
    // Signed on the wire so that out-of-range values produce a 400.
    pub target_books: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct GoalResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_books: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub current_books: u32,
    pub completed: bool,
    pub bonus_count: u32,
}

impl GoalResponse {
    fn from_domain(goal: Goal) -> Self {
        GoalResponse {
            completed: goal.completed(),
            bonus_count: goal.bonus_count(),
            id: goal.id,
            title: goal.title,
            description: goal.description,
            target_books: goal.target_books,
            start_date: goal.start_date,
            end_date: goal.end_date,
            current_books: goal.current_books,
        }
    }
}

/// Upper bound for the target, matching the INT column it lands in.
const MAX_TARGET: i64 = i32::MAX as i64;

/// Checks a goal payload before it is persisted: the target must be at
/// least one book, within column range, and the window must not be
/// inverted.
fn validate_goal(title: &str, target_books: i64, start: NaiveDate, end: NaiveDate) -> Result<u32, String> {
    if title.trim().is_empty() {
        return Err("Title is required".to_string());
    }
    if target_books < 1 {
        return Err("Target must be at least one book".to_string());
    }
    if target_books > MAX_TARGET {
        return Err(format!("Target must be at most {}", MAX_TARGET));
    }
    if start > end {
        return Err("Start date must not be after end date".to_string());
    }
    Ok(target_books as u32)
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Create a reading goal.
#[utoipa::path(
    post,
    path = "/goals",
    request_body = CreateGoalRequest,
    responses(
        (status = 201, description = "Goal created", body = GoalResponse),
        (status = 400, description = "Invalid target or window"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_goal_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateGoalRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let target_books = validate_goal(&req.title, req.target_books, req.start_date, req.end_date)
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    let goal = state
        .db
        .create_goal(
            user_id,
            req.title.trim(),
            req.description.as_deref(),
            target_books,
            req.start_date,
            req.end_date,
        )
        .await
        .map_err(|e| {
            error!("Failed to create goal: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create goal".to_string(),
            )
        })?;

    Ok((StatusCode::CREATED, Json(GoalResponse::from_domain(goal))))
}

/// List the user's goals with derived completion state.
#[utoipa::path(
    get,
    path = "/goals",
    responses(
        (status = 200, description = "The user's goals", body = [GoalResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_goals_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let goals = state.db.list_goals_by_user(user_id).await.map_err(|e| {
        error!("Failed to list goals: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to list goals".to_string(),
        )
    })?;

    let response: Vec<GoalResponse> = goals.into_iter().map(GoalResponse::from_domain).collect();
    Ok(Json(response))
}

/// Delete a goal.
#[utoipa::path(
    delete,
    path = "/goals/{id}",
    params(("id" = Uuid, Path, description = "The goal to delete")),
    responses(
        (status = 204, description = "Goal deleted"),
        (status = 404, description = "Goal not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_goal_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(goal_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let goal = state.db.get_goal_by_id(goal_id).await.map_err(|e| match e {
        PortError::NotFound(_) => (StatusCode::NOT_FOUND, "Goal not found".to_string()),
        _ => {
            error!("Failed to fetch goal: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch goal".to_string(),
            )
        }
    })?;

    if goal.user_id != user_id {
        return Err((StatusCode::NOT_FOUND, "Goal not found".to_string()));
    }

    state.db.delete_goal(goal_id).await.map_err(|e| {
        error!("Failed to delete goal: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to delete goal".to_string(),
        )
    })?;

    Ok(StatusCode::NO_CONTENT)
}
