use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, request_deadline};
use crate::state::AppState;

/// Full application router
pub fn app(state: AppState, security: &SecurityConfig) -> Router {
    Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(from_fn_with_state(state.clone(), request_deadline))
        .layer(cors_layer(security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/login", post(auth::login_post))
        .route("/api/users/register", post(auth::register_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(project_routes())
        .merge(todo_list_routes())
        .merge(task_routes())
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn auth_routes() -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/api/auth/me", get(auth::session_me))
        .route("/api/auth/session", axum::routing::delete(auth::session_logout))
}

fn project_routes() -> Router<AppState> {
    use protected::projects;

    Router::new()
        .route("/api/projects", post(projects::create).get(projects::list))
        .route(
            "/api/projects/:project_id",
            get(projects::get).put(projects::update).delete(projects::delete),
        )
}

fn todo_list_routes() -> Router<AppState> {
    use protected::todo_lists;

    Router::new()
        .route(
            "/api/projects/:project_id/todolists",
            post(todo_lists::create).get(todo_lists::list),
        )
        .route(
            "/api/projects/:project_id/todolists/:todo_list_id",
            get(todo_lists::get).put(todo_lists::update).delete(todo_lists::delete),
        )
}

fn task_routes() -> Router<AppState> {
    use protected::tasks;

    const TASKS: &str = "/api/projects/:project_id/todolists/:todo_list_id/tasks";

    Router::new()
        .route(TASKS, post(tasks::create).get(tasks::list))
        .route(&format!("{}/reorder", TASKS), patch(tasks::reorder))
        .route(
            &format!("{}/:task_id", TASKS),
            get(tasks::get).put(tasks::update).delete(tasks::delete),
        )
        .route(&format!("{}/:task_id/status", TASKS), patch(tasks::set_status))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
