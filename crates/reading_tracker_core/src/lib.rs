pub mod domain;
pub mod goals;
pub mod ports;
pub mod streak;

pub use domain::{
    AuthSession, Book, BookCompletionEvent, BookStatus, CompletionDirection, Goal,
    ReadingActivity, ReadingStreak, User, UserCredentials,
};
pub use goals::{GoalUpdate, MembershipChange};
pub use ports::{DatabaseService, PortError, PortResult};
