//! services/api/src/web/books.rs
//!
//! Axum handlers for the book catalog. A status change to or from
//! `Completed` is where goal progress gets reconciled: the handler
//! derives a `BookCompletionEvent` from the transition, applies the
//! goal tracker to every goal whose window contains the event date, and
//! persists the returned goals.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, NaiveDate, Utc};
use reading_tracker_core::domain::{
    Book, BookCompletionEvent, BookStatus, CompletionDirection,
};
use reading_tracker_core::goals;
use reading_tracker_core::ports::{DatabaseService, PortError, PortResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateBookStatusRequest {
    /// One of `want_to_read`, `reading`, `completed`.
    pub status: String,
    /// Calendar date the book was finished; defaults to today (UTC)
    /// when moving to `completed`.
    pub completed_date: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub status: String,
    pub completed_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl BookResponse {
    fn from_domain(book: Book) -> Self {
        BookResponse {
            id: book.id,
            title: book.title,
            author: book.author,
            status: book.status.as_str().to_string(),
            completed_date: book.completed_date,
            created_at: book.created_at,
        }
    }
}

//=========================================================================================
// Completion Event Derivation
//=========================================================================================

/// Derives the goal-relevant events (if any) from a status transition.
///
/// Moving onto the `Completed` shelf emits a completion dated by the
/// request (or today); moving off it emits an un-completion dated by
/// the book's original completion date, so the same goals that counted
/// the book are the ones that un-count it. Re-dating an already
/// completed book emits an un-completion for the old date followed by
/// a completion for the new one, moving the count between windows.
/// Transitions that stay on one side of the `Completed` boundary with
/// an unchanged date emit nothing.
fn completion_events_for(
    book: &Book,
    new_status: BookStatus,
    requested_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Vec<BookCompletionEvent> {
    let was_completed = book.status == BookStatus::Completed;
    let is_completed = new_status == BookStatus::Completed;
    let old_date = book.completed_date.unwrap_or(today);

    let event = |completion_date, direction| BookCompletionEvent {
        user_id: book.user_id,
        book_id: book.id,
        completion_date,
        direction,
    };

    match (was_completed, is_completed) {
        (false, true) => vec![event(
            requested_date.unwrap_or(today),
            CompletionDirection::Completed,
        )],
        (true, false) => vec![event(old_date, CompletionDirection::Uncompleted)],
        (true, true) => {
            let new_date = requested_date.unwrap_or(old_date);
            if new_date == old_date {
                return Vec::new();
            }
            vec![
                event(old_date, CompletionDirection::Uncompleted),
                event(new_date, CompletionDirection::Completed),
            ]
        }
        (false, false) => Vec::new(),
    }
}

/// Applies one completion event to every goal of the user whose window
/// contains the event date, persisting each updated goal and its
/// counted-book junction row. No-op updates are skipped.
async fn reconcile_goals(
    db: &Arc<dyn DatabaseService>,
    event: &BookCompletionEvent,
) -> PortResult<()> {
    let affected = db
        .list_goals_in_window(event.user_id, event.completion_date)
        .await?;

    for goal in affected {
        let goal_id = goal.id;
        let counted: HashSet<Uuid> = db.get_counted_books(goal_id).await?.into_iter().collect();

        let update = goals::apply_completion_event(goal, &counted, event);
        if let Some(membership) = update.membership {
            // One transactional write per goal: a partial persist here
            // would defeat the membership check on a client retry.
            db.apply_goal_update(goal_id, update.goal.current_books, membership)
                .await?;
        }
    }

    Ok(())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Add a book to the catalog.
#[utoipa::path(
    post,
    path = "/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateBookRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".to_string()));
    }

    let book = state
        .db
        .create_book(user_id, req.title.trim(), req.author.trim())
        .await
        .map_err(|e| {
            error!("Failed to create book: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create book".to_string(),
            )
        })?;

    Ok((StatusCode::CREATED, Json(BookResponse::from_domain(book))))
}

/// List the user's books.
#[utoipa::path(
    get,
    path = "/books",
    responses(
        (status = 200, description = "The user's books", body = [BookResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_books_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let books = state.db.list_books_by_user(user_id).await.map_err(|e| {
        error!("Failed to list books: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to list books".to_string(),
        )
    })?;

    let response: Vec<BookResponse> = books.into_iter().map(BookResponse::from_domain).collect();
    Ok(Json(response))
}

/// Move a book between shelves.
///
/// Transitions to or from `completed` reconcile the user's goals whose
/// window contains the completion date.
#[utoipa::path(
    put,
    path = "/books/{id}/status",
    request_body = UpdateBookStatusRequest,
    params(("id" = Uuid, Path, description = "The book to update")),
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Book not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_book_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<UpdateBookStatusRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let new_status = BookStatus::parse(&req.status).ok_or((
        StatusCode::BAD_REQUEST,
        format!("Unknown book status '{}'", req.status),
    ))?;

    let book = fetch_owned_book(&state, book_id, user_id).await?;

    let today = Utc::now().date_naive();
    let events = completion_events_for(&book, new_status, req.completed_date, today);

    // The stored completion date follows the shelf: set while completed
    // (the request date, falling back to the existing one, then today),
    // cleared otherwise.
    let completed_date = match new_status {
        BookStatus::Completed => Some(req.completed_date.or(book.completed_date).unwrap_or(today)),
        _ => None,
    };

    state
        .db
        .update_book_status(book_id, new_status, completed_date)
        .await
        .map_err(|e| {
            error!("Failed to update book status: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update book".to_string(),
            )
        })?;

    for event in &events {
        reconcile_goals(&state.db, event).await.map_err(|e| {
            error!("Failed to reconcile goals for book {}: {:?}", book_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update goals".to_string(),
            )
        })?;
    }

    let updated = Book {
        status: new_status,
        completed_date,
        ..book
    };
    Ok(Json(BookResponse::from_domain(updated)))
}

/// Remove a book from the catalog.
#[utoipa::path(
    delete,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "The book to delete")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(book_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    fetch_owned_book(&state, book_id, user_id).await?;

    state.db.delete_book(book_id).await.map_err(|e| {
        error!("Failed to delete book: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to delete book".to_string(),
        )
    })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Fetches a book and verifies it belongs to the requesting user.
/// Another user's book reads as not found rather than forbidden.
async fn fetch_owned_book(
    state: &Arc<AppState>,
    book_id: Uuid,
    user_id: Uuid,
) -> Result<Book, (StatusCode, String)> {
    let book = state.db.get_book_by_id(book_id).await.map_err(|e| match e {
        PortError::NotFound(_) => (StatusCode::NOT_FOUND, "Book not found".to_string()),
        _ => {
            error!("Failed to fetch book: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch book".to_string(),
            )
        }
    })?;

    if book.user_id != user_id {
        return Err((StatusCode::NOT_FOUND, "Book not found".to_string()));
    }
    Ok(book)
}
