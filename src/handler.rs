use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        Path, State,
    },
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    model::CurrentUser,
    password::{hash_password, verify_password},
    schema::{ChangePasswordSchema, CreateTodoSchema, LoginSchema, RegisterSchema, UpdateTodoSchema},
    session, store, view, AppState,
};

const INVALID_LOGIN: &str = "Incorrect username or password";
const INVALID_PASSWORD_CHANGE: &str = "Invalid username or password";

// Handler for the health checker route
pub async fn health_checker_handler() -> impl IntoResponse {
    const MESSAGE: &str = "Todo app with accounts, built on Rust, SQLx, SQLite and Axum";

    Json(json!({
        "status": "success",
        "message": MESSAGE
    }))
}

// ---- authentication ----

pub async fn login_page() -> impl IntoResponse {
    view::login(None)
}

pub async fn login(
    State(data): State<Arc<AppState>>,
    form: Result<Form<LoginSchema>, FormRejection>,
) -> AppResult<Response> {
    let Ok(Form(body)) = form else {
        let page = view::login(Some("Username and password are required"));
        return Ok((StatusCode::BAD_REQUEST, page).into_response());
    };

    let user = match store::find_user_by_username(&data.db, &body.username).await? {
        Some(user) if user.is_active => user,
        _ => {
            tracing::info!(username = %body.username, "login rejected");
            return Ok((StatusCode::UNAUTHORIZED, view::login(Some(INVALID_LOGIN))).into_response());
        }
    };

    if !verify_password(&body.password, &user.hashed_password)? {
        tracing::info!(username = %body.username, "login rejected");
        return Ok((StatusCode::UNAUTHORIZED, view::login(Some(INVALID_LOGIN))).into_response());
    }

    let ttl = data.tokens.default_ttl();
    let token = data.tokens.issue(&user.username, user.id, &user.role, Some(ttl))?;
    let cookie = session::session_cookie(&token, ttl, data.cookie_secure)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = user.id, role = %user.role, "login succeeded");
    Ok(([(SET_COOKIE, cookie)], Redirect::to("/todos")).into_response())
}

pub async fn logout() -> impl IntoResponse {
    ([(SET_COOKIE, session::cleared_cookie())], view::logout())
}

pub async fn register_page() -> impl IntoResponse {
    view::register(None)
}

pub async fn register(
    State(data): State<Arc<AppState>>,
    form: Result<Form<RegisterSchema>, FormRejection>,
) -> AppResult<Response> {
    let Ok(Form(body)) = form else {
        let page = view::register(Some("All fields are required"));
        return Ok((StatusCode::BAD_REQUEST, page).into_response());
    };

    let required = [&body.email, &body.username, &body.firstname, &body.lastname, &body.password];
    if required.iter().any(|field| field.trim().is_empty()) {
        let page = view::register(Some("All fields are required"));
        return Ok((StatusCode::BAD_REQUEST, page).into_response());
    }

    if body.password != body.password2 {
        let page = view::register(Some("Passwords do not match"));
        return Ok((StatusCode::BAD_REQUEST, page).into_response());
    }

    if store::username_or_email_taken(&data.db, &body.username, &body.email).await? {
        tracing::info!(username = %body.username, "registration rejected: duplicate");
        let page = view::register(Some("Username or email already exists"));
        return Ok((StatusCode::CONFLICT, page).into_response());
    }

    let hashed_password = hash_password(&body.password)?;
    let new_user = store::NewUser {
        username: &body.username,
        email: &body.email,
        first_name: &body.firstname,
        last_name: &body.lastname,
        hashed_password: &hashed_password,
        role: "user",
    };

    match store::insert_user(&data.db, new_user).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, "user registered");
            let page = view::login(Some("User successfully created"));
            Ok((StatusCode::CREATED, page).into_response())
        }
        Err(AppError::Conflict(message)) => {
            let page = view::register(Some(message.as_str()));
            Ok((StatusCode::CONFLICT, page).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn edit_password_page() -> impl IntoResponse {
    view::edit_password(None)
}

// Existing sessions stay valid after a change; tokens are stateless.
pub async fn change_password(
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    form: Result<Form<ChangePasswordSchema>, FormRejection>,
) -> AppResult<Response> {
    let rejected = || {
        (
            StatusCode::BAD_REQUEST,
            view::edit_password(Some(INVALID_PASSWORD_CHANGE)),
        )
            .into_response()
    };

    let Ok(Form(body)) = form else {
        return Ok(rejected());
    };

    if body.username != current.username || body.password2.is_empty() {
        return Ok(rejected());
    }

    let Some(user) = store::find_user_by_username(&data.db, &body.username).await? else {
        return Ok(rejected());
    };

    if !verify_password(&body.password, &user.hashed_password)? {
        tracing::info!(user_id = user.id, "password change rejected");
        return Ok(rejected());
    }

    let hashed_password = hash_password(&body.password2)?;
    store::update_password(&data.db, user.id, &hashed_password).await?;

    tracing::info!(user_id = user.id, "password updated");
    Ok(view::edit_password(Some("Password updated")).into_response())
}

// ---- todos ----

// Handler for getting the caller's Todo items
pub async fn get_todos(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let todos = store::list_todos(&data.db, user.id).await?;

    Ok(Json(json!({
        "status": "success",
        "results": todos.len(),
        "todos": todos
    })))
}

// Handler for creating a new Todo owned by the caller
pub async fn create_todo(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    body: Result<Json<CreateTodoSchema>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(body) = body?;
    body.validate()?;

    let todo = store::insert_todo(&data.db, user.id, &body).await?;
    tracing::debug!(todo_id = todo.id, user_id = user.id, "todo created");

    Ok((
        StatusCode::CREATED,
        Json(json!({"status": "success", "data": {"todo": todo}})),
    ))
}

// Handler for getting a specific Todo by ID
pub async fn get_todo(
    Path(id): Path<i64>,
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let todo = store::find_owned(&data.db, id, user.id).await?;

    Ok(Json(json!({"status": "success", "data": {"todo": todo}})))
}

// Handler for updating a Todo by ID
pub async fn update_todo(
    Path(id): Path<i64>,
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    body: Result<Json<UpdateTodoSchema>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(body) = body?;
    body.validate()?;

    store::update_owned(&data.db, id, user.id, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Handler for deleting a Todo by ID
pub async fn delete_todo(
    Path(id): Path<i64>,
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<StatusCode> {
    store::delete_owned(&data.db, id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
