//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, collecting the
//! paths and schemas from all handler modules.

use utoipa::OpenApi;

use crate::web::activity::{ActivityResponse, RecordActivityRequest, StreakResponse};
use crate::web::auth::{AuthResponse, LoginRequest, SignupRequest};
use crate::web::books::{BookResponse, CreateBookRequest, UpdateBookStatusRequest};
use crate::web::goals::{CreateGoalRequest, GoalResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::books::create_book_handler,
        crate::web::books::list_books_handler,
        crate::web::books::update_book_status_handler,
        crate::web::books::delete_book_handler,
        crate::web::activity::record_activity_handler,
        crate::web::activity::list_activity_handler,
        crate::web::activity::get_streak_handler,
        crate::web::goals::create_goal_handler,
        crate::web::goals::list_goals_handler,
        crate::web::goals::delete_goal_handler,
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            AuthResponse,
            CreateBookRequest,
            UpdateBookStatusRequest,
            BookResponse,
            RecordActivityRequest,
            ActivityResponse,
            StreakResponse,
            CreateGoalRequest,
            GoalResponse,
        )
    ),
    tags(
        (name = "Reading Tracker API", description = "API endpoints for cataloging books, logging reading activity, and tracking goals and streaks.")
    )
)]
pub struct ApiDoc;
