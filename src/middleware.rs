use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::SET_COOKIE, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    error::AppError,
    session::{self, Identity},
    AppState,
};

/// Guard for the JSON API: anonymous or invalid callers get 401 before any
/// handler (and therefore any query) runs. An invalid cookie is also cleared.
pub async fn require_auth<B>(
    State(state): State<Arc<AppState>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Response {
    match session::resolve(request.headers(), &state.tokens) {
        Identity::Authenticated(user) => {
            tracing::debug!(user_id = user.id, role = %user.role, "authenticated request");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Identity::Anonymous => {
            tracing::warn!(path = %request.uri().path(), "unauthenticated request");
            AppError::Unauthorized.into_response()
        }
        Identity::Invalid => {
            tracing::warn!(path = %request.uri().path(), "invalid session token");
            let mut response = AppError::Unauthorized.into_response();
            response
                .headers_mut()
                .insert(SET_COOKIE, session::cleared_cookie());
            response
        }
    }
}

/// Guard for server-rendered pages: callers without a usable session are sent
/// to the login page.
pub async fn require_session<B>(
    State(state): State<Arc<AppState>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Response {
    match session::resolve(request.headers(), &state.tokens) {
        Identity::Authenticated(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Identity::Anonymous => Redirect::to("/auth/").into_response(),
        Identity::Invalid => {
            let mut response = Redirect::to("/auth/").into_response();
            response
                .headers_mut()
                .insert(SET_COOKIE, session::cleared_cookie());
            response
        }
    }
}
