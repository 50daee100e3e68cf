pub mod activity;
pub mod auth;
pub mod books;
pub mod goals;
pub mod middleware;
pub mod rest;
pub mod state;

// Re-export the pieces the server binary wires together.
pub use middleware::require_auth;
pub use rest::ApiDoc;
