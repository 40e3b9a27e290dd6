use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::{
    handler::*,
    middleware::{require_auth, require_session},
    AppState,
};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let todo_routes = Router::new()
        .route("/todos", get(get_todos))
        .route("/todos/", get(get_todos))
        .route("/todos/todo", post(create_todo))
        .route(
            "/todos/todo/:id",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_auth));

    let user_routes = Router::new()
        .route(
            "/users/edit-password",
            get(edit_password_page).post(change_password),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_session));

    Router::new()
        .route("/", get(health_checker_handler))
        .route("/auth", get(login_page).post(login))
        .route("/auth/", get(login_page).post(login))
        .route("/auth/logout", get(logout))
        .route("/auth/register", get(register_page).post(register))
        .merge(todo_routes)
        .merge(user_routes)
        .with_state(app_state)
}
