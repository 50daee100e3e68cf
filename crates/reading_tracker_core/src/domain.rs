//! crates/reading_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// The shelf a book sits on. Moving a book to `Completed` (or off it)
/// is what drives goal progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookStatus {
    WantToRead,
    Reading,
    Completed,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::WantToRead => "want_to_read",
            BookStatus::Reading => "reading",
            BookStatus::Completed => "completed",
        }
    }

    /// Parses the wire/database representation. Returns `None` for
    /// anything that is not one of the three known statuses.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "want_to_read" => Some(BookStatus::WantToRead),
            "reading" => Some(BookStatus::Reading),
            "completed" => Some(BookStatus::Completed),
            _ => None,
        }
    }
}

/// A book in a user's catalog.
#[derive(Debug, Clone)]
pub struct Book {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub author: String,
    pub status: BookStatus,
    /// Set while `status == Completed`; the calendar date the book was
    /// finished, which is the date goal windows are matched against.
    pub completed_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// One logged reading session. Multiple records may exist for the same
/// date; the streak calculator collapses them to "active that day".
#[derive(Debug, Clone)]
pub struct ReadingActivity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_date: NaiveDate,
    pub pages_read: u32,
    pub minutes_read: u32,
}

/// Derived streak summary. Never persisted; recomputed from the
/// activity log on every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingStreak {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_active_date: Option<NaiveDate>,
    pub is_at_risk: bool,
    pub message: String,
}

/// A time-boxed reading goal.
///
/// Only `current_books` is stored; `completed` and the bonus count are
/// derived from it so they can never drift out of sync with progress.
#[derive(Debug, Clone)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_books: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub current_books: u32,
}

impl Goal {
    /// A goal is completed exactly while progress meets the target.
    /// Un-completing a counted book can flip this back to false.
    pub fn completed(&self) -> bool {
        self.current_books >= self.target_books
    }

    /// Books finished beyond the target, still inside the window.
    pub fn bonus_count(&self) -> u32 {
        self.current_books.saturating_sub(self.target_books)
    }

    /// Whether a completion on `date` falls inside this goal's window.
    pub fn window_contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Direction of a book status change relevant to goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionDirection {
    Completed,
    Uncompleted,
}

/// The signal emitted when a book transitions to or from `Completed`.
/// Derived from the status change; not persisted as its own entity.
#[derive(Debug, Clone)]
pub struct BookCompletionEvent {
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub completion_date: NaiveDate,
    pub direction: CompletionDirection,
}
