//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reading_tracker_core::domain::{
    Book, BookStatus, Goal, ReadingActivity, User, UserCredentials,
};
use reading_tracker_core::goals::MembershipChange;
use reading_tracker_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or(e: sqlx::Error, what: &str) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what.to_string()),
        _ => unexpected(e),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: Some(self.email),
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct BookRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    author: String,
    status: String,
    completed_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}
impl BookRecord {
    fn to_domain(self) -> PortResult<Book> {
        let status = BookStatus::parse(&self.status).ok_or_else(|| {
            PortError::Unexpected(format!("Unknown book status '{}' in database", self.status))
        })?;
        Ok(Book {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            author: self.author,
            status,
            completed_date: self.completed_date,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ActivityRecord {
    id: Uuid,
    user_id: Uuid,
    activity_date: NaiveDate,
    pages_read: i32,
    minutes_read: i32,
}
impl ActivityRecord {
    fn to_domain(self) -> ReadingActivity {
        ReadingActivity {
            id: self.id,
            user_id: self.user_id,
            activity_date: self.activity_date,
            pages_read: self.pages_read.max(0) as u32,
            minutes_read: self.minutes_read.max(0) as u32,
        }
    }
}

#[derive(FromRow)]
struct GoalRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: Option<String>,
    target_books: i32,
    start_date: NaiveDate,
    end_date: NaiveDate,
    current_books: i32,
}
impl GoalRecord {
    fn to_domain(self) -> Goal {
        Goal {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            target_books: self.target_books.max(0) as u32,
            start_date: self.start_date,
            end_date: self.end_date,
            current_books: self.current_books.max(0) as u32,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, &format!("User with email {} not found", email)))?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row = sqlx::query(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => unexpected(e),
        })?;
        row.try_get("user_id").map_err(unexpected)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_book(&self, user_id: Uuid, title: &str, author: &str) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(
            "INSERT INTO books (id, user_id, title, author, status) \
             VALUES ($1, $2, $3, $4, 'want_to_read') \
             RETURNING id, user_id, title, author, status, completed_date, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .bind(author)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_book_by_id(&self, book_id: Uuid) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(
            "SELECT id, user_id, title, author, status, completed_date, created_at \
             FROM books WHERE id = $1",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, &format!("Book {} not found", book_id)))?;
        record.to_domain()
    }

    async fn list_books_by_user(&self, user_id: Uuid) -> PortResult<Vec<Book>> {
        let records = sqlx::query_as::<_, BookRecord>(
            "SELECT id, user_id, title, author, status, completed_date, created_at \
             FROM books WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_book_status(
        &self,
        book_id: Uuid,
        status: BookStatus,
        completed_date: Option<NaiveDate>,
    ) -> PortResult<()> {
        sqlx::query("UPDATE books SET status = $1, completed_date = $2 WHERE id = $3")
            .bind(status.as_str())
            .bind(completed_date)
            .bind(book_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_book(&self, book_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn record_activity(
        &self,
        user_id: Uuid,
        activity_date: NaiveDate,
        pages_read: u32,
        minutes_read: u32,
    ) -> PortResult<ReadingActivity> {
        let record = sqlx::query_as::<_, ActivityRecord>(
            "INSERT INTO reading_activities (id, user_id, activity_date, pages_read, minutes_read) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, activity_date, pages_read, minutes_read",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(activity_date)
        .bind(pages_read as i32)
        .bind(minutes_read as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_activities_by_user(&self, user_id: Uuid) -> PortResult<Vec<ReadingActivity>> {
        let records = sqlx::query_as::<_, ActivityRecord>(
            "SELECT id, user_id, activity_date, pages_read, minutes_read \
             FROM reading_activities WHERE user_id = $1 ORDER BY activity_date ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_goal(
        &self,
        user_id: Uuid,
        title: &str,
        description: Option<&str>,
        target_books: u32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> PortResult<Goal> {
        let record = sqlx::query_as::<_, GoalRecord>(
            "INSERT INTO goals (id, user_id, title, description, target_books, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, user_id, title, description, target_books, start_date, end_date, current_books",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(target_books as i32)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_goal_by_id(&self, goal_id: Uuid) -> PortResult<Goal> {
        let record = sqlx::query_as::<_, GoalRecord>(
            "SELECT id, user_id, title, description, target_books, start_date, end_date, current_books \
             FROM goals WHERE id = $1",
        )
        .bind(goal_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, &format!("Goal {} not found", goal_id)))?;
        Ok(record.to_domain())
    }

    async fn list_goals_by_user(&self, user_id: Uuid) -> PortResult<Vec<Goal>> {
        let records = sqlx::query_as::<_, GoalRecord>(
            "SELECT id, user_id, title, description, target_books, start_date, end_date, current_books \
             FROM goals WHERE user_id = $1 ORDER BY start_date ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_goals_in_window(&self, user_id: Uuid, date: NaiveDate) -> PortResult<Vec<Goal>> {
        let records = sqlx::query_as::<_, GoalRecord>(
            "SELECT id, user_id, title, description, target_books, start_date, end_date, current_books \
             FROM goals WHERE user_id = $1 AND start_date <= $2 AND end_date >= $2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn delete_goal(&self, goal_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM goals WHERE id = $1")
            .bind(goal_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn get_counted_books(&self, goal_id: Uuid) -> PortResult<Vec<Uuid>> {
        let rows = sqlx::query("SELECT book_id FROM goal_books WHERE goal_id = $1")
            .bind(goal_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        rows.into_iter()
            .map(|row| row.try_get("book_id").map_err(unexpected))
            .collect()
    }

    async fn apply_goal_update(
        &self,
        goal_id: Uuid,
        current_books: u32,
        membership: MembershipChange,
    ) -> PortResult<()> {
        // Progress and junction row move together; a partial write
        // would let a retried event be counted twice.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query("UPDATE goals SET current_books = $1 WHERE id = $2")
            .bind(current_books as i32)
            .bind(goal_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        match membership {
            MembershipChange::Add(book_id) => {
                // ON CONFLICT keeps redelivered events idempotent at
                // the storage level as well.
                sqlx::query(
                    "INSERT INTO goal_books (goal_id, book_id) VALUES ($1, $2) \
                     ON CONFLICT DO NOTHING",
                )
                .bind(goal_id)
                .bind(book_id)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
            }
            MembershipChange::Remove(book_id) => {
                sqlx::query("DELETE FROM goal_books WHERE goal_id = $1 AND book_id = $2")
                    .bind(goal_id)
                    .bind(book_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(unexpected)?;
            }
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }
}
