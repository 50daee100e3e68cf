//! crates/reading_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{Book, BookStatus, Goal, ReadingActivity, User, UserCredentials};
use crate::goals::MembershipChange;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth Methods ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Book Catalog ---
    async fn create_book(&self, user_id: Uuid, title: &str, author: &str) -> PortResult<Book>;

    async fn get_book_by_id(&self, book_id: Uuid) -> PortResult<Book>;

    async fn list_books_by_user(&self, user_id: Uuid) -> PortResult<Vec<Book>>;

    async fn update_book_status(
        &self,
        book_id: Uuid,
        status: BookStatus,
        completed_date: Option<NaiveDate>,
    ) -> PortResult<()>;

    async fn delete_book(&self, book_id: Uuid) -> PortResult<()>;

    // --- Reading Activity ---
    async fn record_activity(
        &self,
        user_id: Uuid,
        activity_date: NaiveDate,
        pages_read: u32,
        minutes_read: u32,
    ) -> PortResult<ReadingActivity>;

    async fn get_activities_by_user(&self, user_id: Uuid) -> PortResult<Vec<ReadingActivity>>;

    // --- Goals ---
    async fn create_goal(
        &self,
        user_id: Uuid,
        title: &str,
        description: Option<&str>,
        target_books: u32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> PortResult<Goal>;

    async fn get_goal_by_id(&self, goal_id: Uuid) -> PortResult<Goal>;

    async fn list_goals_by_user(&self, user_id: Uuid) -> PortResult<Vec<Goal>>;

    /// Goals of `user_id` whose `[start_date, end_date]` window contains
    /// `date`. This is the set a completion event is reconciled against.
    async fn list_goals_in_window(&self, user_id: Uuid, date: NaiveDate) -> PortResult<Vec<Goal>>;

    async fn delete_goal(&self, goal_id: Uuid) -> PortResult<()>;

    // --- Goal/Book Junction (counted books) ---
    /// Book ids already counted toward the goal; the membership set the
    /// tracker dedupes against.
    async fn get_counted_books(&self, goal_id: Uuid) -> PortResult<Vec<Uuid>>;

    /// Persists one tracker result: the new progress and the junction
    /// row change, atomically. Either both land or neither does, so a
    /// failed write can be retried without double counting.
    async fn apply_goal_update(
        &self,
        goal_id: Uuid,
        current_books: u32,
        membership: MembershipChange,
    ) -> PortResult<()>;
}
