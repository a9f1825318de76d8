// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    docs,
    handlers::{auth, health, profile, quiz},
    state::AppState,
    utils::jwt::{auth_middleware, identify_middleware, staff_middleware},
};

/// Assembles the main application router.
///
/// * Public: health, question listing, registration/login, profile lookup, API docs.
/// * Identity required: submissions, `/api/auth/me`, own score updates.
/// * Staff required: question creation, profile listing.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let require_identity = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/validate", get(auth::validate))
        .route("/me", get(auth::me).route_layer(require_identity.clone()));

    let quiz_routes = Router::new()
        .route(
            "/questions",
            get(quiz::list_questions).merge(
                post(quiz::create_question)
                    .route_layer(middleware::from_fn(staff_middleware))
                    .route_layer(require_identity.clone()),
            ),
        )
        // Identity is checked after the batch itself, so it is resolved but not required here.
        .route(
            "/submit",
            post(quiz::submit).route_layer(middleware::from_fn_with_state(
                state.clone(),
                identify_middleware,
            )),
        )
        .route(
            "/submissions/latest",
            get(quiz::latest_submission).route_layer(require_identity.clone()),
        );

    let profile_routes = Router::new()
        .route(
            "/users",
            get(profile::list_users)
                .route_layer(middleware::from_fn(staff_middleware))
                .route_layer(require_identity.clone()),
        )
        .route("/users/{username}", get(profile::get_user))
        .route(
            "/users/{username}/score",
            post(profile::update_score).route_layer(require_identity),
        );

    Router::new()
        .route("/health", get(health::health))
        .route("/api-docs/openapi.json", get(docs::openapi))
        .nest("/api/auth", auth_routes)
        .merge(quiz_routes)
        .merge(profile_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
